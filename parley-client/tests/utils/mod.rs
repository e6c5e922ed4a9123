pub mod mock_media;
pub mod test_session;

pub use mock_media::*;
pub use recording_sink::*;
pub use test_session::*;
