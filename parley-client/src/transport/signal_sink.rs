use crate::error::SessionError;
use async_trait::async_trait;
use parley_core::ClientSignal;

/// Outbound half of the signaling channel. Sends are ordered per sink.
#[async_trait]
pub trait SignalSink: Send + Sync {
    async fn send(&self, signal: ClientSignal) -> Result<(), SessionError>;
}
