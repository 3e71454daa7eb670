//! Ledger bookkeeping shared by the in-memory and file stores

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use gatewatch_types::{AccessEvent, Error, Result};

/// All access events plus the next id to hand out
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct LedgerBook {
    next_id: u64,
    events: Vec<AccessEvent>,
}

impl LedgerBook {
    pub(crate) fn events(&self) -> &[AccessEvent] {
        &self.events
    }

    pub(crate) fn find_open(&self, plate: &str, date: NaiveDate) -> Result<Option<AccessEvent>> {
        let open: Vec<&AccessEvent> = self
            .events
            .iter()
            .filter(|e| e.plate == plate && e.date == date && e.is_open())
            .collect();
        match open.as_slice() {
            [] => Ok(None),
            [event] => Ok(Some((*event).clone())),
            many => Err(Error::InvariantViolation {
                plate: plate.to_string(),
                date,
                open: many.len(),
            }),
        }
    }

    pub(crate) fn create(&mut self, plate: &str, date: NaiveDate, entry_time: NaiveTime) -> Result<AccessEvent> {
        if self.find_open(plate, date)?.is_some() {
            return Err(Error::InvariantViolation {
                plate: plate.to_string(),
                date,
                open: 2,
            });
        }
        let id = self.next_id.max(self.max_id()) + 1;
        self.next_id = id;
        let event = AccessEvent {
            id,
            plate: plate.to_string(),
            date,
            entry_time,
            exit_time: None,
        };
        self.events.push(event.clone());
        Ok(event)
    }

    pub(crate) fn close(&mut self, event_id: u64, exit_time: NaiveTime) -> Result<()> {
        let event = self
            .events
            .iter_mut()
            .find(|e| e.id == event_id)
            .ok_or_else(|| Error::Ledger(format!("no access event with id {}", event_id)))?;
        if !event.is_open() {
            return Err(Error::Ledger(format!(
                "access event {} for {} is already closed",
                event_id, event.plate
            )));
        }
        event.exit_time = Some(exit_time);
        Ok(())
    }

    fn max_id(&self) -> u64 {
        self.events.iter().map(|e| e.id).max().unwrap_or(0)
    }
}
