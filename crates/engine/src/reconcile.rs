//! Startup state reconciliation.
//!
//! After any restart the tracker must agree with its own paper trail. The
//! reconciler takes the three evidence sources — the JSON snapshot, the
//! master ledger rows, and the live contract universe — and resolves them
//! into one [`TrackerState`], in strict precedence order:
//!
//! 1. a valid snapshot, cross-checked against the ledger (ledger wins on
//!    any mismatch),
//! 2. rebuild from this month's ledger rows,
//! 3. carry the previous month's closing figures as a baseline,
//! 4. cold start.
//!
//! The function is pure: the same evidence triple always resolves to the
//! same state, and every correction is returned (and logged) as an
//! inconsistency for the audit trail.

use rust_decimal::Decimal;
use tracing::{info, warn};

use otm_tracker_core::config::TrackerConfig;
use otm_tracker_core::types::{plausible_premium, plausible_underlying_price};
use otm_tracker_core::{ContractLeg, Month, OptionRight};
use otm_tracker_ledger::{LedgerEntry, PersistedState};

use crate::select::on_canonical_grid;
use crate::state::TrackerState;

/// Entry premiums drift by feed rounding; anything worse is a real
/// mismatch.
const PREMIUM_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 3);

/// Strikes from different endpoints agree to a ten-thousandth.
const STRIKE_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 4);

/// Carried baselines legitimately differ by a few yuan of rounding
/// between the snapshot and a ledger-derived value.
const BASELINE_TOLERANCE: i64 = 100;

/// Which evidence source produced the resolved state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoverySource {
    /// Snapshot accepted with no ledger rows to check against.
    Snapshot,
    /// Snapshot accepted after cross-checking against ledger rows.
    SnapshotCrossChecked,
    /// No usable snapshot; state rebuilt entirely from ledger rows.
    RebuiltFromLedger,
    /// No rows for this month; previous month's closing figures carried.
    CarriedBaseline,
    /// Nothing on disk at all.
    ColdStart,
}

/// The live contract universe, pre-fetched by the caller so resolution
/// itself stays synchronous and deterministic.
#[derive(Debug, Clone, Default)]
pub struct LiveContracts {
    pub calls: Vec<ContractLeg>,
    pub puts: Vec<ContractLeg>,
}

impl LiveContracts {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone)]
pub struct RecoveryOutcome {
    pub state: TrackerState,
    pub source: RecoverySource,
    /// Human-readable record of every correction made, ledger-wins order.
    pub inconsistencies: Vec<String>,
}

pub struct Reconciler<'a> {
    config: &'a TrackerConfig,
    /// The first month of this tracking lifetime; months before it have
    /// no baseline to carry.
    first_month: Month,
}

impl<'a> Reconciler<'a> {
    #[must_use]
    pub fn new(config: &'a TrackerConfig, first_month: Month) -> Self {
        Self {
            config,
            first_month,
        }
    }

    /// Resolves the tracker state for `month` from the available evidence.
    pub fn resolve(
        &self,
        month: Month,
        snapshot: Option<PersistedState>,
        master_rows: &[LedgerEntry],
        live: &LiveContracts,
    ) -> RecoveryOutcome {
        let month_rows: Vec<&LedgerEntry> = master_rows
            .iter()
            .filter(|e| e.month == Some(month))
            .collect();

        if let Some(snap) = snapshot {
            match self.vet_snapshot(month, &snap, live) {
                Ok(()) => return self.resolve_from_snapshot(snap, &month_rows, master_rows, live),
                Err(reason) => {
                    warn!(month = %month, reason, "Discarding snapshot");
                }
            }
        }

        if !month_rows.is_empty() {
            return self.rebuild_from_rows(month, &month_rows, master_rows, live);
        }

        if month != self.first_month {
            if let Some(prev) = last_row_before(month, master_rows) {
                return self.carry_baseline(month, prev);
            }
        }

        info!(month = %month, "No prior state found, cold start");
        RecoveryOutcome {
            state: TrackerState::empty(month),
            source: RecoverySource::ColdStart,
            inconsistencies: Vec::new(),
        }
    }

    /// Semantic validation: a snapshot that fails any of these checks is
    /// not merely stale, it is wrong, and the ledger strategies take over.
    fn vet_snapshot(
        &self,
        month: Month,
        snap: &PersistedState,
        live: &LiveContracts,
    ) -> Result<(), String> {
        if snap.month != month {
            return Err(format!("snapshot is for {}, expected {month}", snap.month));
        }
        for (side, quantity) in [
            (OptionRight::Call, snap.call_quantity),
            (OptionRight::Put, snap.put_quantity),
        ] {
            if let Some(q) = quantity {
                if q > self.config.max_contracts {
                    return Err(format!("{side} quantity {q} exceeds ceiling"));
                }
            }
        }
        for (side, leg, universe) in [
            (OptionRight::Call, &snap.call, &live.calls),
            (OptionRight::Put, &snap.put, &live.puts),
        ] {
            if let Some(leg) = leg {
                let live_match = universe
                    .iter()
                    .any(|c| (c.strike - leg.strike).abs() <= STRIKE_TOLERANCE);
                if !live_match && !on_canonical_grid(leg.strike) {
                    return Err(format!(
                        "{side} strike {} is on no known grid",
                        leg.strike
                    ));
                }
            }
        }
        if let Some(price) = snap.reference_price {
            if !plausible_underlying_price(price) {
                return Err(format!("implausible reference price {price}"));
            }
        }
        for premium in [snap.entry_call_price, snap.entry_put_price]
            .into_iter()
            .flatten()
        {
            if !plausible_premium(premium) {
                return Err(format!("implausible entry premium {premium}"));
            }
        }
        if let Some(residual) = snap.month_residual_cost {
            if residual < 0 || residual > self.config.monthly_budget {
                return Err(format!("residual {residual} outside the budget"));
            }
        }
        Ok(())
    }

    /// Snapshot tentatively trusted; every field is cross-checked against
    /// the ledger and the ledger wins each disagreement.
    fn resolve_from_snapshot(
        &self,
        snap: PersistedState,
        month_rows: &[&LedgerEntry],
        master_rows: &[LedgerEntry],
        live: &LiveContracts,
    ) -> RecoveryOutcome {
        let mut state = TrackerState::from_persisted(snap);

        let (Some(first), Some(last)) = (month_rows.first(), month_rows.last()) else {
            info!(month = %state.month, "Recovered from snapshot (no ledger rows this month)");
            return RecoveryOutcome {
                state,
                source: RecoverySource::Snapshot,
                inconsistencies: Vec::new(),
            };
        };

        let mut issues = Vec::new();

        check_decimal(
            &mut issues,
            "reference price",
            &mut state.reference_price,
            first.etf_price,
            Decimal::ZERO,
        );
        self.check_leg(
            &mut issues,
            OptionRight::Call,
            &mut state.call,
            first.call_strike,
            &live.calls,
        );
        self.check_leg(
            &mut issues,
            OptionRight::Put,
            &mut state.put,
            first.put_strike,
            &live.puts,
        );
        check_decimal(
            &mut issues,
            "entry call premium",
            &mut state.entry_call_price,
            first.call_price,
            PREMIUM_TOLERANCE,
        );
        check_decimal(
            &mut issues,
            "entry put premium",
            &mut state.entry_put_price,
            first.put_price,
            PREMIUM_TOLERANCE,
        );
        check_exact(
            &mut issues,
            "call quantity",
            &mut state.call_quantity,
            last.call_qty,
        );
        check_exact(
            &mut issues,
            "put quantity",
            &mut state.put_quantity,
            last.put_qty,
        );
        check_exact(
            &mut issues,
            "residual cost",
            &mut state.month_residual_cost,
            first.remainder_cost,
        );
        if state.cumulative_cost != last.total_cost {
            issues.push(format!(
                "cumulative cost: snapshot {} vs ledger {}",
                state.cumulative_cost, last.total_cost
            ));
            state.cumulative_cost = last.total_cost;
        }
        let ledger_start = first.timestamp.date();
        if state.start_date != Some(ledger_start) {
            issues.push(format!(
                "start date: snapshot {:?} vs ledger {ledger_start}",
                state.start_date
            ));
            state.start_date = Some(ledger_start);
        }
        if let Some(prev) = last_row_before(state.month, master_rows) {
            if (state.carried_baseline - prev.total_return).abs() > BASELINE_TOLERANCE {
                issues.push(format!(
                    "carried baseline: snapshot {} vs ledger {}",
                    state.carried_baseline, prev.total_return
                ));
                state.carried_baseline = prev.total_return;
            }
        }
        // Rows only exist after fixing, so the month's budget is in.
        if state.budget_applied_for != Some(state.month) {
            issues.push("budget marker missing despite ledger rows".to_string());
            state.budget_applied_for = Some(state.month);
        }

        for issue in &issues {
            warn!(month = %state.month, issue, "Snapshot disagrees with ledger, ledger wins");
        }
        info!(
            month = %state.month,
            corrections = issues.len(),
            "Recovered from snapshot, cross-checked against ledger"
        );

        RecoveryOutcome {
            state,
            source: RecoverySource::SnapshotCrossChecked,
            inconsistencies: issues,
        }
    }

    fn check_leg(
        &self,
        issues: &mut Vec<String>,
        side: OptionRight,
        leg: &mut Option<ContractLeg>,
        ledger_strike: Decimal,
        universe: &[ContractLeg],
    ) {
        let agrees = leg
            .as_ref()
            .is_some_and(|l| (l.strike - ledger_strike).abs() <= STRIKE_TOLERANCE);
        if agrees {
            return;
        }
        if let Some(existing) = leg.as_ref() {
            issues.push(format!(
                "{side} strike: snapshot {} vs ledger {ledger_strike}",
                existing.strike
            ));
        } else {
            issues.push(format!(
                "{side} leg missing from snapshot, ledger strike {ledger_strike}"
            ));
        }
        *leg = Some(match_live_contract(side, ledger_strike, universe, issues));
    }

    /// No snapshot, but this month already has ledger rows: the first row
    /// fixes inception facts, the last row fixes current totals.
    fn rebuild_from_rows(
        &self,
        month: Month,
        month_rows: &[&LedgerEntry],
        master_rows: &[LedgerEntry],
        live: &LiveContracts,
    ) -> RecoveryOutcome {
        // Guarded by the caller; month_rows is never empty here.
        let first = month_rows[0];
        let last = month_rows[month_rows.len() - 1];
        let mut issues = Vec::new();

        let call = match_live_contract(OptionRight::Call, first.call_strike, &live.calls, &mut issues);
        let put = match_live_contract(OptionRight::Put, first.put_strike, &live.puts, &mut issues);

        let state = TrackerState {
            month,
            reference_price: Some(first.etf_price),
            call: Some(call),
            put: Some(put),
            call_quantity: Some(last.call_qty),
            put_quantity: Some(last.put_qty),
            entry_call_price: Some(first.call_price),
            entry_put_price: Some(first.put_price),
            month_residual_cost: Some(first.remainder_cost),
            cumulative_cost: last.total_cost,
            carried_baseline: last_row_before(month, master_rows)
                .map_or(0, |prev| prev.total_return),
            start_date: Some(first.timestamp.date()),
            processed_today: false,
            roll_in_progress: false,
            budget_applied_for: Some(month),
        };

        for issue in &issues {
            warn!(month = %month, issue, "Ledger rebuild anomaly");
        }
        info!(
            month = %month,
            rows = month_rows.len(),
            start_date = %first.timestamp.date(),
            "Rebuilt state from ledger rows"
        );

        RecoveryOutcome {
            state,
            source: RecoverySource::RebuiltFromLedger,
            inconsistencies: issues,
        }
    }

    /// First sight of a new month: the previous month's closing return
    /// becomes the baseline and its total cost seeds the cumulative cost.
    /// The new month's budget is applied later, at quantity fixing.
    fn carry_baseline(&self, month: Month, prev: &LedgerEntry) -> RecoveryOutcome {
        let mut state = TrackerState::empty(month);
        state.carried_baseline = prev.total_return;
        state.cumulative_cost = prev.total_cost;
        state.budget_applied_for = prev.month;

        info!(
            month = %month,
            baseline = state.carried_baseline,
            cumulative_cost = state.cumulative_cost,
            from_month = ?prev.month,
            "Carried previous month's closing figures"
        );

        RecoveryOutcome {
            state,
            source: RecoverySource::CarriedBaseline,
            inconsistencies: Vec::new(),
        }
    }
}

fn check_decimal(
    issues: &mut Vec<String>,
    name: &str,
    field: &mut Option<Decimal>,
    ledger: Decimal,
    tolerance: Decimal,
) {
    match *field {
        Some(value) if (value - ledger).abs() <= tolerance => {}
        Some(value) => {
            issues.push(format!("{name}: snapshot {value} vs ledger {ledger}"));
            *field = Some(ledger);
        }
        None => {
            issues.push(format!("{name} missing from snapshot, ledger {ledger}"));
            *field = Some(ledger);
        }
    }
}

fn check_exact<T>(issues: &mut Vec<String>, name: &str, field: &mut Option<T>, ledger: T)
where
    T: PartialEq + Copy + std::fmt::Display,
{
    match *field {
        Some(value) if value == ledger => {}
        Some(value) => {
            issues.push(format!("{name}: snapshot {value} vs ledger {ledger}"));
            *field = Some(ledger);
        }
        None => {
            issues.push(format!("{name} missing from snapshot, ledger {ledger}"));
            *field = Some(ledger);
        }
    }
}

/// The ledger contract matching `strike`, or a synthetic placeholder leg
/// when the strike no longer trades (recorded as an anomaly, not an
/// error).
fn match_live_contract(
    side: OptionRight,
    strike: Decimal,
    universe: &[ContractLeg],
    issues: &mut Vec<String>,
) -> ContractLeg {
    let matched = universe
        .iter()
        .find(|c| (c.strike - strike).abs() <= STRIKE_TOLERANCE);
    match matched {
        Some(contract) => contract.clone(),
        None => {
            issues.push(format!("{side} strike {strike} matches no live contract"));
            ContractLeg::placeholder(side, strike)
        }
    }
}

/// The latest row of the latest month strictly before `month`.
fn last_row_before(month: Month, master_rows: &[LedgerEntry]) -> Option<&LedgerEntry> {
    master_rows
        .iter()
        .filter(|e| e.month.is_some_and(|m| m < month))
        .max_by_key(|e| (e.month, e.timestamp))
}

// =============================================================================
// Tests
// =============================================================================
