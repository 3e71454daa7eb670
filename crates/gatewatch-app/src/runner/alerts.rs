//! Quieting repeated alerts for a vehicle that stays in front of the camera

use std::collections::HashMap;
use std::time::{Duration, Instant};

use gatewatch_types::DecisionEvent;

const PRUNE_THRESHOLD: usize = 256;

/// Lets the first UNKNOWN or BLOCKED alert for a plate through, then holds
/// back repeats of the same kind until the plate has been quiet for `window`.
///
/// Every other event passes untouched.
#[derive(Debug)]
pub struct AlertThrottle {
    window: Duration,
    last_seen: HashMap<(&'static str, String), Instant>,
}

impl AlertThrottle {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_seen: HashMap::new(),
        }
    }

    /// Whether `event` should be reported, given it was produced at `now`
    pub fn admit(&mut self, event: &DecisionEvent, now: Instant) -> bool {
        let plate = match event {
            DecisionEvent::UnknownVehicle { plate } | DecisionEvent::BlockedAlert { plate } => plate,
            _ => return true,
        };

        if self.last_seen.len() > PRUNE_THRESHOLD {
            let window = self.window;
            self.last_seen
                .retain(|_, seen| now.saturating_duration_since(*seen) < window);
        }

        // Each repeat extends the quiet period, so a parked vehicle alerts once
        let previous = self.last_seen.insert((event.kind(), plate.clone()), now);
        match previous {
            Some(seen) => now.saturating_duration_since(seen) >= self.window,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn blocked(plate: &str) -> DecisionEvent {
        DecisionEvent::BlockedAlert { plate: plate.to_string() }
    }

    fn unknown(plate: &str) -> DecisionEvent {
        DecisionEvent::UnknownVehicle { plate: plate.to_string() }
    }

    #[test]
    fn test_repeats_are_held_back_while_vehicle_stays() {
        let mut throttle = AlertThrottle::new(Duration::from_secs(30));
        let start = Instant::now();

        assert!(throttle.admit(&blocked("XYZ9K88"), start));
        for tick in 1..=120u64 {
            let now = start + Duration::from_millis(tick * 500);
            assert!(!throttle.admit(&blocked("XYZ9K88"), now));
        }
    }

    #[test]
    fn test_alert_repeats_after_quiet_window() {
        let mut throttle = AlertThrottle::new(Duration::from_secs(30));
        let start = Instant::now();

        assert!(throttle.admit(&unknown("ZZZ0000"), start));
        assert!(!throttle.admit(&unknown("ZZZ0000"), start + Duration::from_secs(29)));
        assert!(throttle.admit(&unknown("ZZZ0000"), start + Duration::from_secs(59)));
    }

    #[test]
    fn test_plates_and_kinds_are_throttled_separately() {
        let mut throttle = AlertThrottle::new(Duration::from_secs(30));
        let now = Instant::now();

        assert!(throttle.admit(&blocked("XYZ9K88"), now));
        assert!(throttle.admit(&blocked("QWE5678"), now));
        assert!(throttle.admit(&unknown("XYZ9K88"), now));
        assert!(!throttle.admit(&blocked("XYZ9K88"), now));
    }

    #[test]
    fn test_gate_events_always_pass() {
        let mut throttle = AlertThrottle::new(Duration::from_secs(30));
        let now = Instant::now();
        let time = NaiveDate::from_ymd_opt(2024, 3, 4)
            .unwrap()
            .and_hms_opt(8, 5, 0)
            .unwrap();
        let entry = DecisionEvent::Entry { plate: "ABC1234".to_string(), time };
        let duplicate = DecisionEvent::DuplicateIgnored { plate: "ABC1234".to_string() };

        for _ in 0..3 {
            assert!(throttle.admit(&entry, now));
            assert!(throttle.admit(&duplicate, now));
            assert!(throttle.admit(&DecisionEvent::NoObservation, now));
        }
    }
}
