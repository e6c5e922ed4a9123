mod agent;
mod config;
mod error;
pub mod media;
pub mod sdp_filter;
pub mod session;
pub mod transport;

pub use agent::*;
pub use config::ClientConfig;
pub use error::{CaptureFailure, SessionError};
pub use sdp_filter::CodecPreference;
pub use session::*;
