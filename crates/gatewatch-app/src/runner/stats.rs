//! Counters collected while a capture loop runs

use serde::Serialize;

use gatewatch_types::DecisionEvent;

use crate::engine::FrameVerdict;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoopStats {
    /// Frames taken from the source
    pub frames: u64,
    /// Frames a plate was read from
    pub observations: u64,
    /// Frames lost to recognition faults
    pub faults: u64,
    /// Frames overwritten before a worker took them
    pub dropped_frames: u64,
    pub entries: u64,
    pub exits: u64,
    pub duplicates: u64,
    pub unknown_vehicles: u64,
    pub blocked_alerts: u64,
}

impl LoopStats {
    pub fn record(&mut self, verdict: &FrameVerdict) {
        if verdict.observed {
            self.observations += 1;
        }
        if verdict.faulted {
            self.faults += 1;
        }
        match verdict.event {
            DecisionEvent::NoObservation => {}
            DecisionEvent::UnknownVehicle { .. } => self.unknown_vehicles += 1,
            DecisionEvent::BlockedAlert { .. } => self.blocked_alerts += 1,
            DecisionEvent::Entry { .. } => self.entries += 1,
            DecisionEvent::Exit { .. } => self.exits += 1,
            DecisionEvent::DuplicateIgnored { .. } => self.duplicates += 1,
        }
    }

    /// Decisions other than "no observation"
    pub fn decisions(&self) -> u64 {
        self.entries + self.exits + self.duplicates + self.unknown_vehicles + self.blocked_alerts
    }
}

impl std::fmt::Display for LoopStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "frames={} observed={} faults={} dropped={} entry={} exit={} duplicate={} unknown={} blocked={}",
            self.frames,
            self.observations,
            self.faults,
            self.dropped_frames,
            self.entries,
            self.exits,
            self.duplicates,
            self.unknown_vehicles,
            self.blocked_alerts
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_counts_by_kind() {
        let mut stats = LoopStats::default();
        stats.record(&FrameVerdict {
            event: DecisionEvent::NoObservation,
            observed: false,
            faulted: true,
        });
        stats.record(&FrameVerdict {
            event: DecisionEvent::UnknownVehicle { plate: "ZZZ0000".to_string() },
            observed: true,
            faulted: false,
        });
        stats.record(&FrameVerdict {
            event: DecisionEvent::DuplicateIgnored { plate: "ABC1234".to_string() },
            observed: true,
            faulted: false,
        });

        assert_eq!(stats.faults, 1);
        assert_eq!(stats.observations, 2);
        assert_eq!(stats.unknown_vehicles, 1);
        assert_eq!(stats.duplicates, 1);
        assert_eq!(stats.decisions(), 2);
    }
}
