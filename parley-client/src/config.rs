use crate::sdp_filter::CodecPreference;
use parley_core::IceServerConfig;
use parley_core::utils::default_ice_servers;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// WebSocket endpoint of the signaling server, e.g. `ws://127.0.0.1:3000/ws`.
    pub server_url: String,
    /// Used until the server pushes its own `ice-config`.
    pub ice_servers: Vec<IceServerConfig>,
    /// How long a troubled media path may go without viability evidence
    /// before the call is reported as failed.
    pub loss_grace: Duration,
    pub health_check_interval: Duration,
    /// `None` keeps a stalled negotiation open until the user hangs up.
    pub negotiation_timeout: Option<Duration>,
    pub codec_preference: Option<CodecPreference>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: "ws://127.0.0.1:3000/ws".to_string(),
            ice_servers: default_ice_servers(),
            loss_grace: Duration::from_secs(5),
            health_check_interval: Duration::from_secs(1),
            negotiation_timeout: None,
            codec_preference: Some(CodecPreference::default()),
        }
    }
}

impl ClientConfig {
    pub fn with_server_url(mut self, url: impl Into<String>) -> Self {
        self.server_url = url.into();
        self
    }
}
