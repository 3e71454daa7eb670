//! Entry/exit session state machine
//!
//! Per (plate, date) a vehicle is either ABSENT (no open event today) or
//! PRESENT (one open event). A qualifying observation toggles between the
//! two; a repeat observation inside the debounce window is ignored.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{NaiveDateTime, TimeDelta};
use log::{debug, info};

use gatewatch_types::{AccessEvent, Result};

use crate::model::SessionState;
use crate::repository::AccessLedger;

/// Lock table size above which idle per-plate locks are dropped
const LOCK_TABLE_SOFT_LIMIT: usize = 256;

/// Result of feeding one observation to the tracker
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    Entry { event: AccessEvent },
    Exit { event: AccessEvent, dwell: Duration },
    DuplicateIgnored,
}

pub struct SessionTracker {
    ledger: Box<dyn AccessLedger>,
    debounce: TimeDelta,
    state: Mutex<SessionState>,
    plate_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl SessionTracker {
    pub fn new(ledger: Box<dyn AccessLedger>, debounce: Duration) -> Self {
        Self {
            ledger,
            debounce: TimeDelta::from_std(debounce).unwrap_or(TimeDelta::MAX),
            state: Mutex::new(SessionState::new()),
            plate_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn debounce(&self) -> TimeDelta {
        self.debounce
    }

    pub fn ledger(&self) -> &dyn AccessLedger {
        self.ledger.as_ref()
    }

    /// Decide ENTRY, EXIT or DUPLICATE_IGNORED for an eligible plate.
    ///
    /// Decisions for the same plate are serialized; different plates do not
    /// wait on each other. Ledger errors are returned as-is and leave the
    /// debounce memory untouched.
    pub fn observe(&self, plate: &str, now: NaiveDateTime) -> Result<SessionOutcome> {
        let plate_lock = self.plate_lock(plate);
        let _in_flight = plate_lock.lock().unwrap_or_else(PoisonError::into_inner);

        if self.state().is_debounced(plate, now, self.debounce) {
            debug!("{}: seen again within {}s, ignoring", plate, self.debounce.num_seconds());
            return Ok(SessionOutcome::DuplicateIgnored);
        }

        let date = now.date();
        let time = now.time();

        let outcome = match self.ledger.find_open(plate, date)? {
            None => {
                let event = self.ledger.create(plate, date, time)?;
                info!("{}: entry at {}", plate, time.format("%H:%M:%S"));
                SessionOutcome::Entry { event }
            }
            Some(open) => {
                self.ledger.close(open.id, time)?;
                let event = AccessEvent {
                    exit_time: Some(time),
                    ..open
                };
                let dwell = event.dwell().unwrap_or_default();
                info!("{}: exit at {} after {}s", plate, time.format("%H:%M:%S"), dwell.as_secs());
                SessionOutcome::Exit { event, dwell }
            }
        };

        let mut state = self.state();
        state.record(plate, now);
        state.prune(now, self.debounce);

        Ok(outcome)
    }

    /// When `plate` was last decided, if still remembered
    pub fn last_decided(&self, plate: &str) -> Option<NaiveDateTime> {
        self.state().last_decided(plate)
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn plate_lock(&self, plate: &str) -> Arc<Mutex<()>> {
        let mut locks = self.plate_locks.lock().unwrap_or_else(PoisonError::into_inner);
        if locks.len() > LOCK_TABLE_SOFT_LIMIT {
            // Only the table holds an idle lock, and nobody can clone it while we hold the table.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        }
        locks
            .entry(plate.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};
    use gatewatch_types::Error;
    use std::thread;

    #[derive(Default)]
    struct VecLedger {
        events: Mutex<Vec<AccessEvent>>,
    }

    impl VecLedger {
        fn snapshot(&self) -> Vec<AccessEvent> {
            self.events.lock().unwrap().clone()
        }
    }

    impl AccessLedger for VecLedger {
        fn find_open(&self, plate: &str, date: NaiveDate) -> Result<Option<AccessEvent>> {
            let events = self.events.lock().unwrap();
            let open: Vec<_> = events
                .iter()
                .filter(|e| e.plate == plate && e.date == date && e.is_open())
                .collect();
            if open.len() > 1 {
                return Err(Error::InvariantViolation {
                    plate: plate.to_string(),
                    date,
                    open: open.len(),
                });
            }
            Ok(open.first().map(|e| (*e).clone()))
        }

        fn create(&self, plate: &str, date: NaiveDate, entry_time: NaiveTime) -> Result<AccessEvent> {
            // Deliberately slow to widen any race window.
            thread::sleep(Duration::from_millis(2));
            let mut events = self.events.lock().unwrap();
            let event = AccessEvent {
                id: events.len() as u64 + 1,
                plate: plate.to_string(),
                date,
                entry_time,
                exit_time: None,
            };
            events.push(event.clone());
            Ok(event)
        }

        fn close(&self, event_id: u64, exit_time: NaiveTime) -> Result<()> {
            let mut events = self.events.lock().unwrap();
            let event = events
                .iter_mut()
                .find(|e| e.id == event_id)
                .ok_or_else(|| Error::Ledger(format!("no event {}", event_id)))?;
            event.exit_time = Some(exit_time);
            Ok(())
        }
    }

    struct FailingLedger;

    impl AccessLedger for FailingLedger {
        fn find_open(&self, _plate: &str, _date: NaiveDate) -> Result<Option<AccessEvent>> {
            Err(Error::Ledger("disk unavailable".to_string()))
        }

        fn create(&self, _plate: &str, _date: NaiveDate, _entry_time: NaiveTime) -> Result<AccessEvent> {
            Err(Error::Ledger("disk unavailable".to_string()))
        }

        fn close(&self, _event_id: u64, _exit_time: NaiveTime) -> Result<()> {
            Err(Error::Ledger("disk unavailable".to_string()))
        }
    }

    fn at(day: u32, h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn tracker() -> (Arc<VecLedger>, SessionTracker) {
        let ledger = Arc::new(VecLedger::default());
        let tracker = SessionTracker::new(Box::new(ledger.clone()), Duration::from_secs(5));
        (ledger, tracker)
    }

    #[test]
    fn test_entry_duplicate_exit_cycle() {
        let (ledger, tracker) = tracker();

        let entry = tracker.observe("ABC1234", at(4, 8, 5, 0)).unwrap();
        assert!(matches!(entry, SessionOutcome::Entry { .. }));

        let dup = tracker.observe("ABC1234", at(4, 8, 5, 2)).unwrap();
        assert_eq!(dup, SessionOutcome::DuplicateIgnored);
        assert_eq!(ledger.snapshot().len(), 1);

        match tracker.observe("ABC1234", at(4, 9, 0, 0)).unwrap() {
            SessionOutcome::Exit { event, dwell } => {
                assert_eq!(dwell, Duration::from_secs(55 * 60));
                assert_eq!(event.exit_time, NaiveTime::from_hms_opt(9, 0, 0));
            }
            other => panic!("expected exit, got {:?}", other),
        }

        let events = ledger.snapshot();
        assert_eq!(events.len(), 1);
        assert!(!events[0].is_open());
    }

    #[test]
    fn test_cycle_restarts_after_exit() {
        let (ledger, tracker) = tracker();
        tracker.observe("ABC1234", at(4, 8, 0, 0)).unwrap();
        tracker.observe("ABC1234", at(4, 9, 0, 0)).unwrap();
        let again = tracker.observe("ABC1234", at(4, 10, 0, 0)).unwrap();

        assert!(matches!(again, SessionOutcome::Entry { .. }));
        let events = ledger.snapshot();
        assert_eq!(events.len(), 2);
        assert_eq!(events.iter().filter(|e| e.is_open()).count(), 1);
    }

    #[test]
    fn test_duplicate_does_not_extend_window() {
        let (_ledger, tracker) = tracker();
        tracker.observe("ABC1234", at(4, 8, 0, 0)).unwrap();
        tracker.observe("ABC1234", at(4, 8, 0, 3)).unwrap();

        assert_eq!(tracker.last_decided("ABC1234"), Some(at(4, 8, 0, 0)));
        let exit = tracker.observe("ABC1234", at(4, 8, 0, 6)).unwrap();
        assert!(matches!(exit, SessionOutcome::Exit { .. }));
    }

    #[test]
    fn test_new_day_leaves_yesterday_open() {
        let (ledger, tracker) = tracker();
        tracker.observe("ABC1234", at(4, 23, 50, 0)).unwrap();
        let next_day = tracker.observe("ABC1234", at(5, 0, 10, 0)).unwrap();

        assert!(matches!(next_day, SessionOutcome::Entry { .. }));
        let events = ledger.snapshot();
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.is_open()));
    }

    #[test]
    fn test_plates_are_independent() {
        let (ledger, tracker) = tracker();
        tracker.observe("ABC1234", at(4, 8, 0, 0)).unwrap();
        let other = tracker.observe("XYZ9876", at(4, 8, 0, 1)).unwrap();

        assert!(matches!(other, SessionOutcome::Entry { .. }));
        assert_eq!(ledger.snapshot().len(), 2);
    }

    #[test]
    fn test_ledger_failure_propagates_and_keeps_state() {
        let tracker = SessionTracker::new(Box::new(FailingLedger), Duration::from_secs(5));
        let err = tracker.observe("ABC1234", at(4, 8, 0, 0)).unwrap_err();

        assert!(matches!(err, Error::Ledger(_)));
        assert!(tracker.last_decided("ABC1234").is_none());
    }

    #[test]
    fn test_concurrent_same_plate_opens_once() {
        let (ledger, tracker) = tracker();
        let now = at(4, 8, 0, 0);

        let outcomes: Vec<SessionOutcome> = thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| s.spawn(|| tracker.observe("ABC1234", now).unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let entries = outcomes
            .iter()
            .filter(|o| matches!(o, SessionOutcome::Entry { .. }))
            .count();
        assert_eq!(entries, 1);
        assert_eq!(outcomes.len() - entries, 7);
        assert_eq!(ledger.snapshot().len(), 1);
    }
}
