//! Historical reference-row lookup for mid-month restarts.
//!
//! When the tracker comes up mid-month without a usable snapshot, the row
//! written closest to the month's recording start carries the inception
//! facts. A row's remaining days are computed from the month's cached
//! expiry date minus the row date, never re-queried live: the answer for
//! a past row must not change with the day the question is asked.

use chrono::NaiveDate;
use tracing::debug;

use otm_tracker_core::{RolloverSchedule, TradingCalendar};
use otm_tracker_ledger::LedgerEntry;

/// How the reference row was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoricalBasis {
    /// A row written exactly `start_dte` days before expiry.
    ExactStart,
    /// No row at the start day; the closest row with more remaining days.
    ClosestEarlier,
}

/// Finds the row that best represents the month's recording start.
///
/// Preference order: an in-session row at exactly `start_dte` remaining
/// days (earliest wins, so a morning-session row beats an afternoon one),
/// then any row at that day, then the closest row with more remaining
/// days. `None` means the caller should estimate fresh from the live
/// price.
pub fn find_reference_row<'a>(
    rows: &'a [LedgerEntry],
    expiry: NaiveDate,
    schedule: &RolloverSchedule,
    calendar: &TradingCalendar,
) -> Option<(&'a LedgerEntry, HistoricalBasis)> {
    let dte_of = |row: &LedgerEntry| (expiry - row.timestamp.date()).num_days();

    let at_start: Vec<&LedgerEntry> = rows
        .iter()
        .filter(|r| dte_of(r) == schedule.start_dte)
        .collect();
    if !at_start.is_empty() {
        let chosen = at_start
            .iter()
            .filter(|r| calendar.in_session(r.timestamp.time()))
            .min_by_key(|r| r.timestamp)
            .or_else(|| at_start.iter().min_by_key(|r| r.timestamp))
            .copied()?;
        debug!(timestamp = %chosen.timestamp, "Found exact start-day reference row");
        return Some((chosen, HistoricalBasis::ExactStart));
    }

    let earlier = rows
        .iter()
        .filter(|r| dte_of(r) > schedule.start_dte)
        .min_by_key(|r| (dte_of(r), r.timestamp))?;
    debug!(
        timestamp = %earlier.timestamp,
        days_to_expiry = dte_of(earlier),
        "No start-day row, using closest earlier reference row"
    );
    Some((earlier, HistoricalBasis::ClosestEarlier))
}
