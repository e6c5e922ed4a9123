use parley_core::IceServerConfig;
use parley_core::utils::default_ice_servers;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid bind address: {0}")]
    InvalidBindAddr(String),
    #[error("invalid setting: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: Option<String>,
    pub host: String,
    pub port: u16,
    pub log_format: LogFormat,
    /// STUN/TURN servers pushed to every client right after it connects.
    pub ice_servers: Vec<IceServerConfig>,
    /// Depth of the relay command queue shared by all connections.
    pub command_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: None,
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_format: LogFormat::Compact,
            ice_servers: default_ice_servers(),
            command_capacity: 256,
        }
    }
}

impl ServerConfig {
    const ENV_PREFIX: &'static str = "PARLEY_SERVER";

    /// Layers `config/server.*`, `config/server.local.*` and `PARLEY_SERVER__*`
    /// environment variables over the defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let defaults = ServerConfig::default();

        let builder = config::Config::builder()
            .add_source(config::File::with_name("config/server").required(false))
            .add_source(config::File::with_name("config/server.local").required(false))
            .add_source(
                config::Environment::with_prefix(Self::ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .set_default("host", defaults.host.clone())?
            .set_default("port", defaults.port as i64)?
            .set_default("log_format", defaults.log_format.as_str())?
            .set_default("command_capacity", defaults.command_capacity as i64)?;

        let mut settings: ServerConfig = builder.build()?.try_deserialize()?;
        if settings.ice_servers.is_empty() {
            settings.ice_servers = defaults.ice_servers;
        }
        settings.validate()?;
        Ok(settings)
    }

    pub fn listener_addr(&self) -> Result<SocketAddr, ConfigError> {
        if let Some(addr) = &self.bind_addr {
            return addr
                .parse()
                .map_err(|_| ConfigError::InvalidBindAddr(addr.clone()));
        }

        let addr = format!("{}:{}", self.host, self.port);
        addr.parse().map_err(|_| ConfigError::InvalidBindAddr(addr))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 && self.bind_addr.is_none() {
            return Err(ConfigError::InvalidBindAddr("port cannot be zero".into()));
        }
        if self.command_capacity == 0 {
            return Err(ConfigError::Invalid(
                "command_capacity must be positive".into(),
            ));
        }
        self.listener_addr()?;
        Ok(())
    }
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Compact => "compact",
            LogFormat::Json => "json",
        }
    }
}
