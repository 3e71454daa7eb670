//! Application service layer - config, decision engine, capture loops

pub mod config;
pub mod engine;
pub mod repository;
pub mod runner;

pub use config::Config;
pub use engine::{AccessDecisionEngine, FrameVerdict};
pub use runner::{run_concurrent, run_polling, AlertThrottle, ConcurrentOptions, LatestFrameSlot, LoopStats};
