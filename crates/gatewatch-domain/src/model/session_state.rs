//! Debounce memory for recently decided plates

use std::collections::HashMap;

use chrono::{NaiveDateTime, TimeDelta};

/// When each plate was last decided (ENTRY or EXIT).
///
/// Lives only as long as the engine; entries older than the debounce window
/// carry no information and are dropped by `prune`.
#[derive(Debug, Default)]
pub struct SessionState {
    last_decided: HashMap<String, NaiveDateTime>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_decided(&self, plate: &str) -> Option<NaiveDateTime> {
        self.last_decided.get(plate).copied()
    }

    /// True if `plate` was decided less than `window` before `now`.
    /// A timestamp in the future (clock stepped back) also counts as recent.
    pub fn is_debounced(&self, plate: &str, now: NaiveDateTime, window: TimeDelta) -> bool {
        match self.last_decided.get(plate) {
            Some(last) => now.signed_duration_since(*last) < window,
            None => false,
        }
    }

    pub fn record(&mut self, plate: &str, now: NaiveDateTime) {
        self.last_decided.insert(plate.to_string(), now);
    }

    /// Forget plates whose window has already elapsed
    pub fn prune(&mut self, now: NaiveDateTime, window: TimeDelta) {
        self.last_decided
            .retain(|_, last| now.signed_duration_since(*last) < window);
    }

    pub fn len(&self) -> usize {
        self.last_decided.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_decided.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 4)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn test_window_is_exclusive() {
        let mut state = SessionState::new();
        let window = TimeDelta::seconds(5);
        state.record("ABC1234", at(8, 0, 0));

        assert!(state.is_debounced("ABC1234", at(8, 0, 4), window));
        assert!(!state.is_debounced("ABC1234", at(8, 0, 5), window));
        assert!(!state.is_debounced("XYZ9876", at(8, 0, 1), window));
    }

    #[test]
    fn test_prune_drops_expired_plates() {
        let mut state = SessionState::new();
        let window = TimeDelta::seconds(5);
        state.record("OLD0001", at(8, 0, 0));
        state.record("NEW0002", at(8, 0, 8));

        state.prune(at(8, 0, 10), window);

        assert_eq!(state.len(), 1);
        assert!(state.last_decided("OLD0001").is_none());
        assert!(state.last_decided("NEW0002").is_some());
    }
}
