//! The master ledger: one append-only CSV spanning the whole tracking
//! lifetime, with a `Month` column tagging each row's contract month.
//!
//! The file name derives from the configured tracking start date
//! (`option_ledger_20250602.csv`), so changing the start date begins a
//! fresh recording cycle without touching earlier files.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::debug;

use otm_tracker_core::Month;

use crate::entry::{LedgerEntry, MASTER_HEADERS};
use crate::error::LedgerError;
use crate::file::{append_row, read_rows};

#[derive(Debug, Clone)]
pub struct MasterLedger {
    path: PathBuf,
}

impl MasterLedger {
    #[must_use]
    pub fn new(data_dir: &Path, start_date: NaiveDate) -> Self {
        let path = data_dir.join(format!(
            "option_ledger_{}.csv",
            start_date.format("%Y%m%d")
        ));
        Self { path }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Appends one row (open-append-flush-close). Writes the header first
    /// when the file is new or empty.
    pub fn append(&self, entry: &LedgerEntry) -> Result<(), LedgerError> {
        append_row(&self.path, &MASTER_HEADERS, &entry.to_record(true))?;
        debug!(
            path = %self.path.display(),
            timestamp = %entry.timestamp,
            total_return = entry.total_return,
            "Appended master ledger row"
        );
        Ok(())
    }

    /// Every parseable row, sorted by timestamp. Missing file reads as
    /// empty; malformed trailing rows are skipped.
    pub fn read_all(&self) -> Result<Vec<LedgerEntry>, LedgerError> {
        read_rows(&self.path, true)
    }

    /// Rows tagged with `month`, in timestamp order.
    pub fn entries_for_month(&self, month: Month) -> Result<Vec<LedgerEntry>, LedgerError> {
        let mut entries = self.read_all()?;
        entries.retain(|e| e.month == Some(month));
        Ok(entries)
    }

    /// The latest row tagged with `month`, if any.
    pub fn last_entry_for_month(&self, month: Month) -> Result<Option<LedgerEntry>, LedgerError> {
        Ok(self.entries_for_month(month)?.pop())
    }
}
