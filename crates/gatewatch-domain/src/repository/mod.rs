//! Repository trait definitions for the registry and the access ledger

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};

use gatewatch_types::Result;
use gatewatch_types::{AccessEvent, VehicleRecord};

/// Read-only lookup of registered vehicles
pub trait VehicleRegistry: Send + Sync {
    /// Find a vehicle by its normalized plate
    fn find(&self, plate: &str) -> Result<Option<VehicleRecord>>;
}

/// Ledger of campus visits.
///
/// Storage failures must surface as errors. At most one open event may exist
/// per (plate, date); implementations report a breach as
/// `Error::InvariantViolation` instead of picking one.
pub trait AccessLedger: Send + Sync {
    /// Find the open event for a plate on a date
    fn find_open(&self, plate: &str, date: NaiveDate) -> Result<Option<AccessEvent>>;

    /// Open a new event
    fn create(&self, plate: &str, date: NaiveDate, entry_time: NaiveTime) -> Result<AccessEvent>;

    /// Close an open event
    fn close(&self, event_id: u64, exit_time: NaiveTime) -> Result<()>;
}

impl<T: VehicleRegistry + ?Sized> VehicleRegistry for Arc<T> {
    fn find(&self, plate: &str) -> Result<Option<VehicleRecord>> {
        (**self).find(plate)
    }
}

impl<T: AccessLedger + ?Sized> AccessLedger for Arc<T> {
    fn find_open(&self, plate: &str, date: NaiveDate) -> Result<Option<AccessEvent>> {
        (**self).find_open(plate, date)
    }

    fn create(&self, plate: &str, date: NaiveDate, entry_time: NaiveTime) -> Result<AccessEvent> {
        (**self).create(plate, date, entry_time)
    }

    fn close(&self, event_id: u64, exit_time: NaiveTime) -> Result<()> {
        (**self).close(event_id, exit_time)
    }
}
