mod coordinator;
mod negotiation;
mod state;
mod status;
mod viability;

pub use coordinator::*;
pub use negotiation::*;
pub use state::*;
pub use status::*;
pub use viability::*;
