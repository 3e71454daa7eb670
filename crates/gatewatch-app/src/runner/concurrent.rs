//! Acquisition thread plus a pool of recognition workers

use std::panic;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, error, info};

use gatewatch_domain::{CameraSession, FrameSource};
use gatewatch_types::{DecisionEvent, Error, Result};

use crate::engine::{AccessDecisionEngine, FrameVerdict};

use super::{LatestFrameSlot, LoopStats};

const WORKER_POLL: Duration = Duration::from_millis(20);

#[derive(Debug, Clone)]
pub struct ConcurrentOptions {
    /// Acquisition tick
    pub tick: Duration,
    /// Recognition workers (0 = CPU count)
    pub workers: usize,
}

impl Default for ConcurrentOptions {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(15),
            workers: 0,
        }
    }
}

impl ConcurrentOptions {
    fn worker_count(&self) -> usize {
        if self.workers == 0 {
            num_cpus::get().max(1)
        } else {
            self.workers
        }
    }
}

/// Raises a flag when dropped, so threads waiting on it also see an unwind
struct RaiseOnDrop<'a> {
    flag: &'a AtomicBool,
    unwind_only: bool,
}

impl<'a> RaiseOnDrop<'a> {
    fn always(flag: &'a AtomicBool) -> Self {
        Self {
            flag,
            unwind_only: false,
        }
    }

    fn on_unwind(flag: &'a AtomicBool) -> Self {
        Self {
            flag,
            unwind_only: true,
        }
    }
}

impl Drop for RaiseOnDrop<'_> {
    fn drop(&mut self) {
        if !self.unwind_only || thread::panicking() {
            self.flag.store(true, Ordering::Release);
        }
    }
}

/// Run acquisition and recognition on separate threads.
///
/// One thread polls the source every tick and publishes into a
/// `LatestFrameSlot`; workers take the newest frame and call the engine.
/// Events are handed to `on_event` on the calling thread. The first
/// registry or ledger error stops every thread and is returned; a panic on
/// any thread stops the others and is re-raised here.
pub fn run_concurrent<S, F>(
    engine: &AccessDecisionEngine,
    source: &mut S,
    options: &ConcurrentOptions,
    stop: &AtomicBool,
    mut on_event: F,
) -> Result<LoopStats>
where
    S: FrameSource + ?Sized,
    F: FnMut(&DecisionEvent),
{
    let workers = options.worker_count();
    let tick = options.tick;
    let slot = LatestFrameSlot::new();
    let halt = AtomicBool::new(false);
    let acquisition_done = AtomicBool::new(false);
    let failure: Mutex<Option<Error>> = Mutex::new(None);
    let mut stats = LoopStats::default();

    info!("concurrent loop started ({} workers, tick {:?})", workers, tick);

    let (slot, halt, acquisition_done, failure) = (&slot, &halt, &acquisition_done, &failure);

    thread::scope(|scope| {
        let acquirer = scope.spawn(move || {
            let _done = RaiseOnDrop::always(acquisition_done);
            let mut session = CameraSession::open(source);
            let mut frames = 0u64;
            while !stop.load(Ordering::Acquire) && !halt.load(Ordering::Acquire) && !session.is_finished() {
                let started = Instant::now();
                if let Some(frame) = session.acquire() {
                    frames += 1;
                    slot.publish(frame);
                }
                if let Some(rest) = tick.checked_sub(started.elapsed()) {
                    thread::sleep(rest);
                }
            }
            frames
        });

        let (event_tx, event_rx) = crossbeam_channel::unbounded::<FrameVerdict>();
        for id in 0..workers {
            let event_tx = event_tx.clone();
            scope.spawn(move || {
                let _halt_on_panic = RaiseOnDrop::on_unwind(halt);
                loop {
                    if halt.load(Ordering::Acquire) {
                        break;
                    }
                    let frame = match slot.take(WORKER_POLL) {
                        Some(frame) => frame,
                        None if acquisition_done.load(Ordering::Acquire) => match slot.try_take() {
                            Some(frame) => frame,
                            None => break,
                        },
                        None => continue,
                    };
                    match engine.decide_frame(&frame) {
                        Ok(verdict) => {
                            if event_tx.send(verdict).is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            error!("worker {} stopped the loop: {}", id, e);
                            failure
                                .lock()
                                .unwrap_or_else(PoisonError::into_inner)
                                .get_or_insert(e);
                            halt.store(true, Ordering::Release);
                            break;
                        }
                    }
                }
                debug!("worker {} finished", id);
            });
        }
        drop(event_tx);

        for verdict in event_rx.iter() {
            stats.record(&verdict);
            on_event(&verdict.event);
        }

        match acquirer.join() {
            Ok(frames) => stats.frames = frames,
            Err(payload) => panic::resume_unwind(payload),
        }
    });

    stats.dropped_frames = slot.dropped();

    if let Some(e) = failure.lock().unwrap_or_else(PoisonError::into_inner).take() {
        return Err(e);
    }
    info!("concurrent loop finished: {}", stats);
    Ok(stats)
}
