//! Capture loops driving the decision engine from a frame source

mod alerts;
mod concurrent;
mod latest_frame;
mod polling;
mod stats;

pub use alerts::AlertThrottle;
pub use concurrent::{run_concurrent, ConcurrentOptions};
pub use latest_frame::LatestFrameSlot;
pub use polling::run_polling;
pub use stats::LoopStats;
