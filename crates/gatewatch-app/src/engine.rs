//! Access decision engine
//!
//! Turns a frame (or an already known plate) into one `DecisionEvent`:
//! recognize, look the plate up, and let the session tracker decide entry or
//! exit for vehicles that may pass.

use chrono::NaiveDateTime;
use log::{debug, info, trace, warn};

use gatewatch_domain::model::normalize_plate;
use gatewatch_domain::{Clock, SessionOutcome, SessionTracker, VehicleRegistry};
use gatewatch_types::{ConfigError, DecisionEvent, Frame, Result, VehicleStatus};
use gatewatch_vision::RecognitionPipeline;

/// Outcome of one frame, with enough detail for loop statistics
#[derive(Debug, Clone, PartialEq)]
pub struct FrameVerdict {
    pub event: DecisionEvent,
    /// A plate was read from the frame
    pub observed: bool,
    /// Recognition failed and was recovered as "no observation"
    pub faulted: bool,
}

pub struct AccessDecisionEngine {
    pipeline: Option<RecognitionPipeline>,
    registry: Box<dyn VehicleRegistry>,
    tracker: SessionTracker,
    clock: Box<dyn Clock>,
}

impl AccessDecisionEngine {
    /// Engine for operator-supplied plates; add a pipeline to decide frames
    pub fn new(registry: Box<dyn VehicleRegistry>, tracker: SessionTracker, clock: Box<dyn Clock>) -> Self {
        Self {
            pipeline: None,
            registry,
            tracker,
            clock,
        }
    }

    pub fn with_pipeline(mut self, pipeline: RecognitionPipeline) -> Self {
        self.pipeline = Some(pipeline);
        self
    }

    pub fn tracker(&self) -> &SessionTracker {
        &self.tracker
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Decide what a frame means for the gate.
    ///
    /// Vision faults are logged and reported as `NoObservation`; registry and
    /// ledger errors are returned.
    pub fn decide(&self, frame: &Frame) -> Result<DecisionEvent> {
        self.decide_frame(frame).map(|verdict| verdict.event)
    }

    /// Same as `decide`, keeping track of whether a plate was read or
    /// recognition failed
    pub fn decide_frame(&self, frame: &Frame) -> Result<FrameVerdict> {
        let pipeline = self.pipeline.as_ref().ok_or_else(|| {
            ConfigError::Invalid("no OCR command configured; frames cannot be read".to_string())
        })?;

        let observation = match pipeline.observe(frame) {
            Ok(Some(observation)) => observation,
            Ok(None) => {
                trace!("no plate in frame");
                return Ok(FrameVerdict {
                    event: DecisionEvent::NoObservation,
                    observed: false,
                    faulted: false,
                });
            }
            Err(fault) => {
                warn!("recognition failed, frame skipped: {}", fault);
                return Ok(FrameVerdict {
                    event: DecisionEvent::NoObservation,
                    observed: false,
                    faulted: true,
                });
            }
        };

        debug!(
            "read plate {} (confidence {:.2})",
            observation.text, observation.confidence
        );
        let event = self.decide_at(&observation.text, self.clock.now())?;
        Ok(FrameVerdict {
            event,
            observed: true,
            faulted: false,
        })
    }

    /// Decide for a plate that was recognized elsewhere or typed in
    pub fn decide_plate(&self, plate: &str) -> Result<DecisionEvent> {
        self.decide_at(plate, self.clock.now())
    }

    fn decide_at(&self, plate: &str, now: NaiveDateTime) -> Result<DecisionEvent> {
        let plate = normalize_plate(plate);
        if plate.is_empty() {
            return Ok(DecisionEvent::NoObservation);
        }

        let Some(vehicle) = self.registry.find(&plate)? else {
            info!("new visitor: {} is not registered", plate);
            return Ok(DecisionEvent::UnknownVehicle { plate });
        };

        if vehicle.status == VehicleStatus::Blocked {
            if vehicle.note.is_empty() {
                warn!("BLOCKED vehicle at the gate: {}", plate);
            } else {
                warn!("BLOCKED vehicle at the gate: {} ({})", plate, vehicle.note);
            }
            return Ok(DecisionEvent::BlockedAlert { plate });
        }
        if vehicle.status == VehicleStatus::Suspect {
            debug!("suspect vehicle {} handled as authorized", plate);
        }

        let event = match self.tracker.observe(&plate, now)? {
            SessionOutcome::Entry { .. } => DecisionEvent::Entry { plate, time: now },
            SessionOutcome::Exit { dwell, .. } => DecisionEvent::Exit {
                plate,
                time: now,
                dwell,
            },
            SessionOutcome::DuplicateIgnored => DecisionEvent::DuplicateIgnored { plate },
        };
        Ok(event)
    }
}
