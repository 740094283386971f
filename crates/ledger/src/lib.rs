//! On-disk stores for the options position tracker: the append-only CSV
//! ledgers (master and per-month) and the JSON state snapshot.
//!
//! The CSV files keep the legacy column names and value formatting so
//! existing ledger files written over the years remain readable and new
//! rows remain diffable against them.

pub mod entry;
pub mod error;
mod file;
pub mod master;
pub mod monthly;
pub mod snapshot;

pub use entry::LedgerEntry;
pub use error::{LedgerError, PersistenceError};
pub use master::MasterLedger;
pub use monthly::MonthLedger;
pub use snapshot::{PersistedState, SnapshotStore};
