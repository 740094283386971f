//! The per-month ledger: same row shape as the master ledger minus the
//! `Month` column, one file per contract month
//! (`option_ledger_202506.csv`).

use std::path::{Path, PathBuf};

use otm_tracker_core::Month;

use crate::entry::{LedgerEntry, MONTH_HEADERS};
use crate::error::LedgerError;
use crate::file::{append_row, read_rows};

#[derive(Debug, Clone)]
pub struct MonthLedger {
    month: Month,
    path: PathBuf,
}

impl MonthLedger {
    #[must_use]
    pub fn new(data_dir: &Path, month: Month) -> Self {
        let path = data_dir.join(format!("option_ledger_{month}.csv"));
        Self { month, path }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn month(&self) -> Month {
        self.month
    }

    pub fn append(&self, entry: &LedgerEntry) -> Result<(), LedgerError> {
        append_row(&self.path, &MONTH_HEADERS, &entry.to_record(false))
    }

    /// Every parseable row, stamped with this ledger's month.
    pub fn read_all(&self) -> Result<Vec<LedgerEntry>, LedgerError> {
        let mut entries = read_rows(&self.path, false)?;
        for entry in &mut entries {
            entry.month = Some(self.month);
        }
        Ok(entries)
    }
}
