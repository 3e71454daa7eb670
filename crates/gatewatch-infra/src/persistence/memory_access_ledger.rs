//! In-memory access ledger (replays, dry runs, tests)

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{NaiveDate, NaiveTime};

use gatewatch_domain::repository::AccessLedger;
use gatewatch_types::{AccessEvent, Result};

use super::ledger_book::LedgerBook;

#[derive(Debug, Default)]
pub struct InMemoryAccessLedger {
    book: Mutex<LedgerBook>,
}

impl InMemoryAccessLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// All events in creation order
    pub fn events(&self) -> Vec<AccessEvent> {
        self.book().events().to_vec()
    }

    fn book(&self) -> MutexGuard<'_, LedgerBook> {
        self.book.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl AccessLedger for InMemoryAccessLedger {
    fn find_open(&self, plate: &str, date: NaiveDate) -> Result<Option<AccessEvent>> {
        self.book().find_open(plate, date)
    }

    fn create(&self, plate: &str, date: NaiveDate, entry_time: NaiveTime) -> Result<AccessEvent> {
        self.book().create(plate, date, entry_time)
    }

    fn close(&self, event_id: u64, exit_time: NaiveTime) -> Result<()> {
        self.book().close(event_id, exit_time)
    }
}
