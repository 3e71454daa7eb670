//! Persistence implementations
//!
//! File-based and in-memory implementations of the repository traits.

mod file_access_ledger;
mod file_vehicle_registry;
mod ledger_book;
mod memory_access_ledger;

pub use file_access_ledger::FileAccessLedger;
pub use file_vehicle_registry::FileVehicleRegistry;
pub use memory_access_ledger::InMemoryAccessLedger;
