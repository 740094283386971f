//! State snapshots for surviving restarts.
//!
//! The tracker writes its whole state to `tracker_state_<YYYYMM>.json`
//! after every change, and the reconciler reads it back on startup as the
//! first (most-trusted) recovery source. A snapshot is advisory: missing
//! or corrupt files load as `None` and the reconciler falls through to the
//! ledger-based strategies.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use otm_tracker_core::{ContractLeg, Month};

use crate::error::PersistenceError;

/// The on-disk snapshot format.
///
/// Leg and cost fields are optional because a snapshot may be taken
/// mid-initialization, after strikes are chosen but before quantities are
/// fixed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    /// Contract month this snapshot belongs to.
    pub month: Month,

    /// Underlying price recorded at position inception.
    pub reference_price: Option<Decimal>,

    pub call: Option<ContractLeg>,
    pub put: Option<ContractLeg>,
    pub call_quantity: Option<u32>,
    pub put_quantity: Option<u32>,

    /// Premiums at the moment quantities were fixed (audit only).
    pub entry_call_price: Option<Decimal>,
    pub entry_put_price: Option<Decimal>,

    /// Budget left over after quantity fixing, in whole yuan. Never
    /// recomputed once set.
    pub month_residual_cost: Option<i64>,

    /// Cumulative invested cost across all tracked months, in whole yuan.
    pub cumulative_cost: i64,

    /// Previous month's closing total return, carried as this month's
    /// return baseline.
    pub carried_baseline: i64,

    /// Date this month's tracking began.
    pub start_date: Option<NaiveDate>,

    /// Whether today's initiation work already ran.
    pub processed_today: bool,

    /// A month switch was decided but the new position is not yet fixed.
    pub roll_in_progress: bool,

    /// The month whose budget has been added to `cumulative_cost`; guards
    /// against applying the same month's budget twice across restarts.
    pub budget_applied_for: Option<Month>,

    /// Timestamp when this snapshot was written.
    pub saved_at: DateTime<Utc>,
}

impl PersistedState {
    /// A blank state for a month with nothing recorded yet.
    #[must_use]
    pub fn empty(month: Month) -> Self {
        Self {
            month,
            reference_price: None,
            call: None,
            put: None,
            call_quantity: None,
            put_quantity: None,
            entry_call_price: None,
            entry_put_price: None,
            month_residual_cost: None,
            cumulative_cost: 0,
            carried_baseline: 0,
            start_date: None,
            processed_today: false,
            roll_in_progress: false,
            budget_applied_for: None,
            saved_at: Utc::now(),
        }
    }

    /// True once both legs, both quantities and the residual are known.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.call.is_some()
            && self.put.is_some()
            && self.call_quantity.is_some()
            && self.put_quantity.is_some()
            && self.month_residual_cost.is_some()
    }
}

/// Reads and writes month snapshots under the data directory.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    data_dir: PathBuf,
}

impl SnapshotStore {
    #[must_use]
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    #[must_use]
    pub fn path_for(&self, month: Month) -> PathBuf {
        self.data_dir.join(format!("tracker_state_{month}.json"))
    }

    /// Writes the snapshot wholesale, creating the data dir if needed.
    pub fn save(&self, state: &PersistedState) -> Result<(), PersistenceError> {
        if !self.data_dir.exists() {
            fs::create_dir_all(&self.data_dir)?;
        }

        let path = self.path_for(state.month);
        let file = File::create(&path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, state)?;

        debug!(
            path = %path.display(),
            month = %state.month,
            initialized = state.is_initialized(),
            "Saved state snapshot"
        );
        Ok(())
    }

    /// Loads the snapshot for `month`.
    ///
    /// Missing and corrupt files both load as `None`; a corrupt file is
    /// logged, since it usually means a crash mid-write.
    pub fn load(&self, month: Month) -> Result<Option<PersistedState>, PersistenceError> {
        let path = self.path_for(month);
        if !path.exists() {
            return Ok(None);
        }

        let file = File::open(&path)?;
        let reader = BufReader::new(file);
        match serde_json::from_reader::<_, PersistedState>(reader) {
            Ok(state) => Ok(Some(state)),
            Err(error) => {
                warn!(
                    path = %path.display(),
                    error = %error,
                    "Snapshot unreadable, falling back to ledger recovery"
                );
                Ok(None)
            }
        }
    }

    #[must_use]
    pub fn exists(&self, month: Month) -> bool {
        self.path_for(month).exists()
    }

    /// Deletes the snapshot for `month` if present.
    pub fn clear(&self, month: Month) -> Result<(), PersistenceError> {
        let path = self.path_for(month);
        if path.exists() {
            fs::remove_file(&path)?;
            debug!(path = %path.display(), "Cleared state snapshot");
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
