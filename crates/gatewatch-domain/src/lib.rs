//! Domain layer - access session rules and collaborator contracts

pub mod clock;
pub mod model;
pub mod repository;
pub mod service;
pub mod source;

pub use clock::{Clock, ManualClock, SystemClock};
pub use repository::{AccessLedger, VehicleRegistry};
pub use service::{SessionOutcome, SessionTracker};
pub use source::{CameraSession, FrameSource};
