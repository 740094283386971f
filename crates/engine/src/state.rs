//! Runtime tracker state and its snapshot conversions.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;

use otm_tracker_core::{ContractLeg, Month, Position};
use otm_tracker_ledger::PersistedState;

/// The tracker's in-memory state for the current contract month.
///
/// Mirrors [`PersistedState`] minus the save timestamp; the service
/// snapshots it wholesale after every change.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackerState {
    pub month: Month,
    pub reference_price: Option<Decimal>,
    pub call: Option<ContractLeg>,
    pub put: Option<ContractLeg>,
    pub call_quantity: Option<u32>,
    pub put_quantity: Option<u32>,
    pub entry_call_price: Option<Decimal>,
    pub entry_put_price: Option<Decimal>,
    pub month_residual_cost: Option<i64>,
    pub cumulative_cost: i64,
    pub carried_baseline: i64,
    pub start_date: Option<NaiveDate>,
    pub processed_today: bool,
    pub roll_in_progress: bool,
    pub budget_applied_for: Option<Month>,
}

impl TrackerState {
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
        }
    }

    /// True once both legs, quantities and the residual are all fixed.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.call.is_some()
            && self.put.is_some()
            && self.call_quantity.is_some()
            && self.put_quantity.is_some()
            && self.month_residual_cost.is_some()
    }

    /// The fully-formed [`Position`], or `None` while mid-initialization.
    #[must_use]
    pub fn position(&self) -> Option<Position> {
        Some(Position {
            month: self.month,
            reference_price: self.reference_price?,
            call: self.call.clone()?,
            put: self.put.clone()?,
            call_quantity: self.call_quantity?,
            put_quantity: self.put_quantity?,
            entry_call_price: self.entry_call_price?,
            entry_put_price: self.entry_put_price?,
            start_date: self.start_date?,
        })
    }

    /// Adds the monthly budget to the cumulative cost, at most once per
    /// month. Returns whether the budget was applied now.
    pub fn apply_budget_once(&mut self, monthly_budget: i64) -> bool {
        if self.budget_applied_for == Some(self.month) {
            return false;
        }
        self.cumulative_cost += monthly_budget;
        self.budget_applied_for = Some(self.month);
        true
    }

    /// Moves to the next contract month, carrying costs forward and
    /// clearing all per-month fields. `closing_return` is the finished
    /// month's last total return; it becomes the new month's baseline.
    pub fn roll_to(&mut self, next: Month, closing_return: i64) {
        *self = Self {
            month: next,
            cumulative_cost: self.cumulative_cost,
            carried_baseline: closing_return,
            roll_in_progress: true,
            budget_applied_for: self.budget_applied_for,
            ..Self::empty(next)
        };
    }

    #[must_use]
    pub fn to_persisted(&self) -> PersistedState {
        PersistedState {
            month: self.month,
            reference_price: self.reference_price,
            call: self.call.clone(),
            put: self.put.clone(),
            call_quantity: self.call_quantity,
            put_quantity: self.put_quantity,
            entry_call_price: self.entry_call_price,
            entry_put_price: self.entry_put_price,
            month_residual_cost: self.month_residual_cost,
            cumulative_cost: self.cumulative_cost,
            carried_baseline: self.carried_baseline,
            start_date: self.start_date,
            processed_today: self.processed_today,
            roll_in_progress: self.roll_in_progress,
            budget_applied_for: self.budget_applied_for,
            saved_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn from_persisted(persisted: PersistedState) -> Self {
        Self {
            month: persisted.month,
            reference_price: persisted.reference_price,
            call: persisted.call,
            put: persisted.put,
            call_quantity: persisted.call_quantity,
            put_quantity: persisted.put_quantity,
            entry_call_price: persisted.entry_call_price,
            entry_put_price: persisted.entry_put_price,
            month_residual_cost: persisted.month_residual_cost,
            cumulative_cost: persisted.cumulative_cost,
            carried_baseline: persisted.carried_baseline,
            start_date: persisted.start_date,
            processed_today: persisted.processed_today,
            roll_in_progress: persisted.roll_in_progress,
            budget_applied_for: persisted.budget_applied_for,
        }
    }
}
