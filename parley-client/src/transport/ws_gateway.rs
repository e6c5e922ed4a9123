use crate::error::SessionError;
use crate::transport::{SignalSink, TransportEvent};
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use parley_core::{ClientSignal, ServerSignal};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

/// Sink feeding the WebSocket writer task.
#[derive(Debug, Clone)]
pub struct WsSignalSink {
    tx: mpsc::UnboundedSender<Message>,
}

#[async_trait]
impl SignalSink for WsSignalSink {
    async fn send(&self, signal: ClientSignal) -> Result<(), SessionError> {
        let json = serde_json::to_string(&signal)
            .map_err(|e| SessionError::Transport(format!("serialize: {}", e)))?;
        self.tx
            .send(Message::Text(json.into()))
            .map_err(|_| SessionError::Transport("signaling connection closed".into()))
    }
}

/// Opens the signaling socket and spawns its reader and writer tasks.
///
/// Server signals arrive on the returned receiver in socket order, followed by a
/// single `TransportEvent::Disconnected` when the socket ends.
pub async fn connect(
    url: &str,
) -> Result<(WsSignalSink, mpsc::UnboundedReceiver<TransportEvent>), SessionError> {
    let (socket, _) = connect_async(url)
        .await
        .map_err(|e| SessionError::Transport(format!("failed to connect to {}: {}", url, e)))?;
    info!("Connected to signaling server at {}", url);

    let (mut ws_sender, mut ws_receiver) = socket.split();
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Message>();
    let (event_tx, event_rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Some(msg) = out_rx.recv().await {
            if let Err(e) = ws_sender.send(msg).await {
                error!("Failed to write to signaling socket: {}", e);
                break;
            }
        }
        let _ = ws_sender.close().await;
    });

    tokio::spawn(async move {
        while let Some(msg) = ws_receiver.next().await {
            match msg {
                Ok(Message::Text(text)) => match serde_json::from_str::<ServerSignal>(text.as_str()) {
                    Ok(signal) => {
                        if event_tx.send(TransportEvent::Signal(signal)).is_err() {
                            return;
                        }
                    }
                    Err(e) => warn!("Ignoring malformed server message: {}", e),
                },
                Ok(Message::Close(frame)) => {
                    debug!("Signaling socket closed by server: {:?}", frame);
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("Signaling socket error: {}", e);
                    break;
                }
            }
        }
        let _ = event_tx.send(TransportEvent::Disconnected);
    });

    Ok((WsSignalSink { tx: out_tx }, event_rx))
}
