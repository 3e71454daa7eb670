//! Domain model types

pub mod plate;
pub mod session_state;

pub use plate::normalize_plate;
pub use session_state::SessionState;
