//! Fixed-tick polling loop

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use log::{error, info};

use gatewatch_domain::{CameraSession, FrameSource};
use gatewatch_types::{DecisionEvent, Result};

use crate::engine::AccessDecisionEngine;

use super::LoopStats;

/// Pull one frame per tick, decide, and pass every event to `on_event`.
///
/// Runs until `stop` is set or the source reports it is finished. A slow
/// tick only delays the next poll. Registry and ledger errors end the loop;
/// the source is released on every exit path.
pub fn run_polling<S, F>(
    engine: &AccessDecisionEngine,
    source: &mut S,
    tick: Duration,
    stop: &AtomicBool,
    mut on_event: F,
) -> Result<LoopStats>
where
    S: FrameSource + ?Sized,
    F: FnMut(&DecisionEvent),
{
    let mut session = CameraSession::open(source);
    let mut stats = LoopStats::default();
    info!("polling loop started (tick {:?})", tick);

    while !stop.load(Ordering::Acquire) && !session.is_finished() {
        let started = Instant::now();

        if let Some(frame) = session.acquire() {
            stats.frames += 1;
            let verdict = engine.decide_frame(&frame).inspect_err(|e| {
                error!("polling loop aborted: {}", e);
            })?;
            stats.record(&verdict);
            on_event(&verdict.event);
        }

        if let Some(rest) = tick.checked_sub(started.elapsed()) {
            thread::sleep(rest);
        }
    }

    info!("polling loop finished: {}", stats);
    Ok(stats)
}
