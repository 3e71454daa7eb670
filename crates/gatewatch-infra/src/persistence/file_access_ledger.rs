//! File-based access ledger
//!
//! Stores every access event in a JSON file on disk. Each mutation rewrites
//! the whole file through a temporary sibling and a rename, so a crash leaves
//! either the old or the new ledger, never half a record.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{NaiveDate, NaiveTime};
use log::debug;

use gatewatch_domain::repository::AccessLedger;
use gatewatch_types::{AccessEvent, Result};

use super::ledger_book::LedgerBook;

pub struct FileAccessLedger {
    store_path: PathBuf,
    book: Mutex<LedgerBook>,
}

impl FileAccessLedger {
    /// Create or load the ledger in `store_dir`
    pub fn open(store_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&store_dir)?;
        let store_path = store_dir.join("access_log.json");

        // Unlike a cache, a ledger that fails to parse is an error, not a fresh start.
        let book = if store_path.exists() {
            let file = File::open(&store_path)?;
            let reader = BufReader::new(file);
            serde_json::from_reader(reader)?
        } else {
            LedgerBook::default()
        };

        Ok(Self {
            store_path,
            book: Mutex::new(book),
        })
    }

    pub fn store_path(&self) -> &Path {
        &self.store_path
    }

    /// All events in creation order
    pub fn events(&self) -> Vec<AccessEvent> {
        self.book().events().to_vec()
    }

    fn book(&self) -> MutexGuard<'_, LedgerBook> {
        self.book.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self, book: &LedgerBook) -> Result<()> {
        let tmp_path = self.store_path.with_extension("json.tmp");
        {
            let file = File::create(&tmp_path)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, book)?;
            writer.flush()?;
        }
        fs::rename(&tmp_path, &self.store_path)?;
        debug!("ledger saved to {}", self.store_path.display());
        Ok(())
    }

    /// Apply a mutation and persist it; on a failed write the in-memory book
    /// is rolled back so memory and disk stay in step.
    fn mutate<T>(&self, change: impl FnOnce(&mut LedgerBook) -> Result<T>) -> Result<T> {
        let mut book = self.book();
        let mut updated = book.clone();
        let value = change(&mut updated)?;
        self.persist(&updated)?;
        *book = updated;
        Ok(value)
    }
}

impl AccessLedger for FileAccessLedger {
    fn find_open(&self, plate: &str, date: NaiveDate) -> Result<Option<AccessEvent>> {
        self.book().find_open(plate, date)
    }

    fn create(&self, plate: &str, date: NaiveDate, entry_time: NaiveTime) -> Result<AccessEvent> {
        self.mutate(|book| book.create(plate, date, entry_time))
    }

    fn close(&self, event_id: u64, exit_time: NaiveTime) -> Result<()> {
        self.mutate(|book| book.close(event_id, exit_time))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatewatch_types::Error;
    use tempfile::tempdir;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_events_survive_reopen() {
        let dir = tempdir().unwrap();
        let event_id = {
            let ledger = FileAccessLedger::open(dir.path().to_path_buf()).unwrap();
            let event = ledger.create("ABC1234", day(), time(8, 5)).unwrap();
            event.id
        };

        let ledger = FileAccessLedger::open(dir.path().to_path_buf()).unwrap();
        let open = ledger.find_open("ABC1234", day()).unwrap().expect("open event");
        assert_eq!(open.id, event_id);

        ledger.close(event_id, time(9, 0)).unwrap();
        let reopened = FileAccessLedger::open(dir.path().to_path_buf()).unwrap();
        assert!(reopened.find_open("ABC1234", day()).unwrap().is_none());
        assert_eq!(reopened.events()[0].exit_time, Some(time(9, 0)));
    }

    #[test]
    fn test_corrupt_ledger_is_an_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("access_log.json"), "{ not json").unwrap();

        assert!(matches!(
            FileAccessLedger::open(dir.path().to_path_buf()),
            Err(Error::Json(_))
        ));
    }

    #[test]
    fn test_rejected_mutation_leaves_file_unchanged() {
        let dir = tempdir().unwrap();
        let ledger = FileAccessLedger::open(dir.path().to_path_buf()).unwrap();
        ledger.create("ABC1234", day(), time(8, 5)).unwrap();
        let before = fs::read_to_string(ledger.store_path()).unwrap();

        assert!(ledger.create("ABC1234", day(), time(8, 6)).is_err());
        assert!(ledger.close(42, time(9, 0)).is_err());

        assert_eq!(fs::read_to_string(ledger.store_path()).unwrap(), before);
        assert_eq!(ledger.events().len(), 1);
    }
}
