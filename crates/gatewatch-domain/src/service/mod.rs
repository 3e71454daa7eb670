//! Domain services

pub mod session_tracker;

pub use session_tracker::{SessionOutcome, SessionTracker};
