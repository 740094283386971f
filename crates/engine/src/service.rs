//! The tracker service loop.
//!
//! One long-lived task polls the market once a minute during trading
//! sessions: roll the contract month when the schedule says so, initiate
//! the month's position on its first eligible day, and append one
//! observation row per poll afterwards. Non-trading days sleep an hour,
//! everything else a minute; a failed iteration is logged and retried on
//! the next poll without touching persisted state.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate, NaiveDateTime};
use tracing::{debug, info, warn};

use otm_tracker_core::config::AppConfig;
use otm_tracker_core::types::{plausible_premium, plausible_underlying_price};
use otm_tracker_core::valuation::{
    annualized_return, master_total_return, monthly_total_return, position_value,
};
use otm_tracker_core::{ContractLeg, Month, RolloverSchedule, TradingCalendar};
use otm_tracker_ledger::{LedgerEntry, MasterLedger, MonthLedger, SnapshotStore};
use otm_tracker_market_data::{MarketData, MarketDataError};

use crate::history::find_reference_row;
use crate::reconcile::{LiveContracts, Reconciler, RecoveryOutcome};
use crate::select::select_legs;
use crate::sizing::fix_quantities;
use crate::state::TrackerState;

pub struct TrackerService<M: MarketData> {
    config: AppConfig,
    market: M,
    calendar: TradingCalendar,
    schedule: RolloverSchedule,
    master: MasterLedger,
    snapshots: SnapshotStore,
    state: TrackerState,
    current_day: NaiveDate,
}

impl<M: MarketData> TrackerService<M> {
    /// Builds the service: determines the active contract month, runs
    /// startup reconciliation against the on-disk stores, and rewrites
    /// the snapshot with the resolved state.
    pub async fn start(config: AppConfig, market: M, today: NaiveDate) -> Result<Self> {
        let (outcome, snapshot_day) = resolve_startup_state(&config, &market, today).await?;
        let mut state = outcome.state;

        info!(
            month = %state.month,
            source = ?outcome.source,
            corrections = outcome.inconsistencies.len(),
            "Tracker state resolved"
        );

        // Yesterday's "already processed" flag does not survive the date.
        if snapshot_day != Some(today) {
            state.processed_today = false;
        }

        let snapshots = SnapshotStore::new(config.storage.data_dir.clone());
        snapshots
            .save(&state.to_persisted())
            .context("rewriting reconciled snapshot")?;

        Ok(Self {
            calendar: config.calendar.calendar(),
            schedule: config.tracker.schedule(),
            master: MasterLedger::new(&config.storage.data_dir, config.storage.start_date),
            snapshots,
            state,
            current_day: today,
            config,
            market,
        })
    }

    #[must_use]
    pub fn state(&self) -> &TrackerState {
        &self.state
    }

    /// Runs the loop forever.
    pub async fn run(&mut self) -> Result<()> {
        info!(
            month = %self.state.month,
            underlying = %self.config.tracker.underlying,
            poll_secs = self.config.tracker.poll_interval_secs,
            start_dte = self.schedule.start_dte,
            stop_dte = self.schedule.stop_dte,
            "Tracker started"
        );

        loop {
            let now = Local::now().naive_local();
            let delay = self.tick(now).await;
            tokio::time::sleep(delay).await;
        }
    }

    /// One scheduling step: decides whether to poll at `now` and returns
    /// how long to sleep before the next step.
    pub async fn tick(&mut self, now: NaiveDateTime) -> Duration {
        let tracker = &self.config.tracker;

        if !self.calendar.is_trading_day(now.date()) {
            debug!(date = %now.date(), "Non-trading day");
            return Duration::from_secs(tracker.off_day_interval_secs);
        }

        if self.current_day != now.date() {
            self.state.processed_today = false;
            self.current_day = now.date();
        }

        if !self.calendar.in_session(now.time()) {
            return Duration::from_secs(tracker.off_session_interval_secs);
        }

        if let Err(error) = self.poll_once(now).await {
            warn!(error = %error, "Poll iteration failed");
        }
        Duration::from_secs(self.config.tracker.poll_interval_secs)
    }

    /// One in-session poll: month switch, initiation, observation.
    pub async fn poll_once(&mut self, now: NaiveDateTime) -> Result<()> {
        let current = self.market.expiry(self.state.month).await.ok();
        let next = self.market.expiry(self.state.month.next()).await.ok();
        let current_dte = current.as_ref().map(|i| i.days_remaining);
        let next_dte = next.as_ref().map(|i| i.days_remaining);

        if self
            .schedule
            .should_switch_to_next_month(current_dte, next_dte)
        {
            return self.roll();
        }

        if !self.state.is_initialized() {
            if !self.schedule.should_start_recording(current_dte, next_dte) {
                debug!(month = %self.state.month, ?current_dte, "Too early to record");
                return Ok(());
            }
            if self.state.processed_today {
                return Ok(());
            }
            self.initiate(now, current_dte, current.map(|i| i.expire_day))
                .await?;
        }

        if self.state.is_initialized() && !self.schedule.should_stop_recording(current_dte) {
            self.record_observation(now).await?;
        }
        Ok(())
    }

    /// Moves to the next contract month. The finished month's last ledger
    /// row closes it out and becomes the new month's return baseline.
    fn roll(&mut self) -> Result<()> {
        let month = self.state.month;
        let closing = self
            .master
            .last_entry_for_month(month)?
            .map_or(self.state.carried_baseline, |e| e.total_return);
        let next = month.next();
        info!(from = %month, to = %next, closing_return = closing, "Switching contract month");

        self.state.roll_to(next, closing);
        self.snapshots
            .save(&self.state.to_persisted())
            .context("saving post-roll snapshot")?;
        Ok(())
    }

    /// Initiates the month's position: select legs, fix quantities, apply
    /// the budget. Any validation failure aborts the iteration before
    /// state is touched.
    async fn initiate(
        &mut self,
        now: NaiveDateTime,
        current_dte: Option<i64>,
        expire_day: Option<NaiveDate>,
    ) -> Result<()> {
        let month = self.state.month;

        let underlying = self
            .market
            .underlying_price()
            .await
            .context("fetching underlying price")?;
        if !plausible_underlying_price(underlying) {
            bail!("implausible underlying price {underlying}");
        }

        let live = fetch_live_contracts(&self.market, month)
            .await
            .context("fetching contract universe")?;
        if live.calls.is_empty() || live.puts.is_empty() {
            bail!("no live contracts for {month}");
        }

        // Starting days after the schedule said to: reconstruct the
        // reference price from the recording-start row when one exists.
        // A forced roll always prices fresh.
        let mut reference = underlying;
        let started_late = current_dte.is_some_and(|d| d < self.schedule.start_dte);
        if started_late && !self.state.roll_in_progress {
            if let Some(expire_day) = expire_day {
                let rows = self.master.entries_for_month(month)?;
                if let Some((row, basis)) =
                    find_reference_row(&rows, expire_day, &self.schedule, &self.calendar)
                {
                    info!(?basis, reference = %row.etf_price, "Using historical reference price");
                    reference = row.etf_price;
                }
            }
        }

        let legs = select_legs(reference, &live.calls, &live.puts, &self.config.tracker)?;
        let call_quote = self.market.option_quote(&legs.call.code).await?;
        let put_quote = self.market.option_quote(&legs.put.code).await?;
        for quote in [&call_quote, &put_quote] {
            if !plausible_premium(quote.latest) {
                bail!("implausible premium {} for {}", quote.latest, quote.code);
            }
        }

        let fixed = fix_quantities(call_quote.latest, put_quote.latest, &self.config.tracker)?;

        let state = &mut self.state;
        state.reference_price = Some(reference);
        state.call = Some(legs.call);
        state.put = Some(legs.put);
        state.call_quantity = Some(fixed.call_quantity);
        state.put_quantity = Some(fixed.put_quantity);
        state.entry_call_price = Some(call_quote.latest);
        state.entry_put_price = Some(put_quote.latest);
        // The residual is fixed once per month and survives re-initiation.
        if state.month_residual_cost.is_none() {
            state.month_residual_cost = Some(fixed.residual);
        }
        if state.start_date.is_none() {
            state.start_date = Some(now.date());
        }
        if state.apply_budget_once(self.config.tracker.monthly_budget) {
            info!(
                month = %month,
                cumulative_cost = state.cumulative_cost,
                "Applied monthly budget"
            );
        }
        state.processed_today = true;
        state.roll_in_progress = false;

        self.snapshots
            .save(&self.state.to_persisted())
            .context("saving post-initiation snapshot")?;

        info!(
            month = %month,
            reference = %reference,
            call_quantity = fixed.call_quantity,
            put_quantity = fixed.put_quantity,
            residual = fixed.residual,
            "Position initiated"
        );
        Ok(())
    }

    /// Appends one observation row to both ledgers.
    async fn record_observation(&mut self, now: NaiveDateTime) -> Result<()> {
        let Some(position) = self.state.position() else {
            return Ok(());
        };
        if position.call.is_placeholder() || position.put.is_placeholder() {
            warn!(month = %position.month, "Position has placeholder legs, cannot quote");
            return Ok(());
        }

        let underlying = self
            .market
            .underlying_price()
            .await
            .context("fetching underlying price")?;
        if !plausible_underlying_price(underlying) {
            bail!("implausible underlying price {underlying}");
        }
        let call_quote = self.market.option_quote(&position.call.code).await?;
        let put_quote = self.market.option_quote(&position.put.code).await?;
        for quote in [&call_quote, &put_quote] {
            if !plausible_premium(quote.latest) {
                bail!("implausible premium {} for {}", quote.latest, quote.code);
            }
        }

        let tracker = &self.config.tracker;
        let residual = self.state.month_residual_cost.unwrap_or(0);
        let value = position_value(
            position.call_quantity,
            call_quote.latest,
            position.put_quantity,
            put_quote.latest,
            tracker.contract_multiplier,
        );
        let monthly_return = monthly_total_return(value, residual);
        let master_return = master_total_return(value, residual, self.state.carried_baseline);
        // Each ledger annualizes over its own horizon: the master over the
        // whole tracking lifetime, the per-month file over this month only.
        let month_days = position.days_running(now.date());
        let tracking_days =
            ((now.date() - self.config.storage.start_date).num_days() + 1).max(1);

        let master_entry = LedgerEntry {
            timestamp: now,
            etf_price: underlying,
            call_strike: position.call.strike,
            put_strike: position.put.strike,
            call_price: call_quote.latest,
            put_price: put_quote.latest,
            call_qty: position.call_quantity,
            put_qty: position.put_quantity,
            remainder_cost: residual,
            total_cost: self.state.cumulative_cost,
            total_return: master_return,
            annual_return: annualized_return(
                master_return,
                self.state.cumulative_cost,
                tracking_days,
            ),
            month: Some(position.month),
        };
        self.master
            .append(&master_entry)
            .context("appending master ledger row")?;

        // The per-month ledger measures the month in isolation: cost is
        // the month's budget, return excludes the carried baseline.
        let monthly_entry = LedgerEntry {
            total_cost: tracker.monthly_budget,
            total_return: monthly_return,
            annual_return: annualized_return(monthly_return, tracker.monthly_budget, month_days),
            ..master_entry.clone()
        };
        MonthLedger::new(&self.config.storage.data_dir, position.month)
            .append(&monthly_entry)
            .context("appending month ledger row")?;

        self.snapshots
            .save(&self.state.to_persisted())
            .context("saving post-observation snapshot")?;

        info!(
            month = %position.month,
            value,
            total_return = master_return,
            monthly_return,
            "Recorded observation"
        );
        Ok(())
    }
}

/// Startup reconciliation against the on-disk stores. Returns the
/// resolved outcome and the day the snapshot (if any) was last saved.
pub async fn resolve_startup_state<M: MarketData>(
    config: &AppConfig,
    market: &M,
    today: NaiveDate,
) -> Result<(RecoveryOutcome, Option<NaiveDate>)> {
    let first_month = first_record_month(market, config.storage.start_date).await;
    let month = active_month(market, today, first_month).await;

    let live = match fetch_live_contracts(market, month).await {
        Ok(live) => live,
        Err(error) => {
            warn!(month = %month, error = %error, "Contract universe unavailable, reconciling without it");
            LiveContracts::empty()
        }
    };

    let snapshots = SnapshotStore::new(config.storage.data_dir.clone());
    let snapshot = snapshots
        .load(month)
        .context("loading state snapshot")?;
    let snapshot_day = snapshot.as_ref().map(|s| s.saved_at.date_naive());

    let master = MasterLedger::new(&config.storage.data_dir, config.storage.start_date);
    let rows = master.read_all().context("reading master ledger")?;

    let reconciler = Reconciler::new(&config.tracker, first_month);
    Ok((reconciler.resolve(month, snapshot, &rows, &live), snapshot_day))
}

/// The first month of this tracking lifetime. A start date after that
/// month's expiry day belongs to the following contract month; if the
/// expiry service is down, the start date's own month is assumed.
async fn first_record_month<M: MarketData>(market: &M, start_date: NaiveDate) -> Month {
    let month = Month::from_date(start_date);
    match market.expiry(month).await {
        Ok(info) if start_date > info.expire_day => {
            info!(
                start_date = %start_date,
                expire_day = %info.expire_day,
                first_month = %month.next(),
                "Start date falls after expiry, first month pushed out"
            );
            month.next()
        }
        Ok(_) => month,
        Err(error) => {
            warn!(month = %month, error = %error, "Expiry lookup failed, assuming start month");
            month
        }
    }
}

/// The month the tracker should be working at `today`: the calendar
/// month, pushed to the next one once its contracts have expired, and
/// never before the first tracked month.
async fn active_month<M: MarketData>(market: &M, today: NaiveDate, first_month: Month) -> Month {
    let month = Month::from_date(today).max(first_month);
    match market.expiry(month).await {
        Ok(info) if info.days_remaining < 0 || today > info.expire_day => month.next(),
        _ => month,
    }
}

/// Fetches the tradeable contract universe (codes with strikes) for one
/// month.
async fn fetch_live_contracts<M: MarketData>(
    market: &M,
    month: Month,
) -> Result<LiveContracts, MarketDataError> {
    let codes = market.contract_codes(month).await?;
    let mut calls = Vec::with_capacity(codes.calls.len());
    for code in &codes.calls {
        calls.push(ContractLeg::new(code.clone(), market.strike_price(code).await?));
    }
    let mut puts = Vec::with_capacity(codes.puts.len());
    for code in &codes.puts {
        puts.push(ContractLeg::new(code.clone(), market.strike_price(code).await?));
    }
    Ok(LiveContracts { calls, puts })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;
    use tempfile::TempDir;

    use otm_tracker_ledger::PersistedState;
    use otm_tracker_market_data::{ContractCodes, ExpiryInfo, OptionQuote};

    /// Canned market: strikes 2.55–2.95 on both sides, fixed premiums.
    struct FakeMarket {
        underlying: Decimal,
        strikes: HashMap<String, Decimal>,
        premiums: HashMap<String, Decimal>,
        expiries: HashMap<Month, ExpiryInfo>,
        calls: Vec<String>,
        puts: Vec<String>,
    }

    impl FakeMarket {
        fn new(days_remaining: i64) -> Self {
            let mut strikes = HashMap::new();
            let mut premiums = HashMap::new();
            let mut calls = Vec::new();
            let mut puts = Vec::new();
            for i in 0..9u32 {
                let strike = dec!(2.55) + Decimal::new(5, 2) * Decimal::from(i);
                let call_code = format!("1000910{i}");
                let put_code = format!("1000920{i}");
                strikes.insert(call_code.clone(), strike);
                strikes.insert(put_code.clone(), strike);
                premiums.insert(call_code.clone(), dec!(0.0095));
                premiums.insert(put_code.clone(), dec!(0.0046));
                calls.push(call_code);
                puts.push(put_code);
            }
            let mut expiries = HashMap::new();
            expiries.insert(
                "202506".parse().unwrap(),
                ExpiryInfo {
                    expire_day: NaiveDate::from_ymd_opt(2025, 6, 25).unwrap(),
                    days_remaining,
                },
            );
            Self {
                underlying: dec!(2.731),
                strikes,
                premiums,
                expiries,
                calls,
                puts,
            }
        }
    }

    #[async_trait]
    impl MarketData for FakeMarket {
        async fn underlying_price(&self) -> Result<Decimal, MarketDataError> {
            Ok(self.underlying)
        }

        async fn contract_codes(&self, _month: Month) -> Result<ContractCodes, MarketDataError> {
            Ok(ContractCodes {
                calls: self.calls.clone(),
                puts: self.puts.clone(),
            })
        }

        async fn option_quote(&self, code: &str) -> Result<OptionQuote, MarketDataError> {
            let latest = *self
                .premiums
                .get(code)
                .ok_or_else(|| MarketDataError::Unavailable(code.to_string()))?;
            Ok(OptionQuote {
                code: code.to_string(),
                latest,
                bid: latest,
                ask: latest,
                strike: self.strikes[code],
                days_to_expiry: 19,
            })
        }

        async fn strike_price(&self, code: &str) -> Result<Decimal, MarketDataError> {
            self.strikes
                .get(code)
                .copied()
                .ok_or_else(|| MarketDataError::Unavailable(code.to_string()))
        }

        async fn expiry(&self, month: Month) -> Result<ExpiryInfo, MarketDataError> {
            self.expiries
                .get(&month)
                .copied()
                .ok_or_else(|| MarketDataError::Unavailable(month.to_string()))
        }
    }

    fn config(dir: &TempDir) -> AppConfig {
        let mut config = AppConfig::default();
        config.storage.data_dir = dir.path().to_path_buf();
        config.storage.start_date = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        config
    }

    fn session_time(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, day)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    #[tokio::test]
    async fn first_poll_initiates_and_records() {
        let dir = TempDir::new().unwrap();
        let today = NaiveDate::from_ymd_opt(2025, 6, 6).unwrap();
        let mut service = TrackerService::start(config(&dir), FakeMarket::new(19), today)
            .await
            .unwrap();

        service.poll_once(session_time(6)).await.unwrap();

        let state = service.state();
        assert!(state.is_initialized());
        assert_eq!(state.call_quantity, Some(5));
        assert_eq!(state.put_quantity, Some(10));
        assert_eq!(state.month_residual_cost, Some(65));
        assert_eq!(state.cumulative_cost, 1000);
        assert_eq!(state.call.as_ref().unwrap().strike, dec!(2.85));
        assert_eq!(state.put.as_ref().unwrap().strike, dec!(2.65));

        // One row in each ledger: value 935 + residual 65 = 1000.
        let master = MasterLedger::new(dir.path(), NaiveDate::from_ymd_opt(2025, 6, 2).unwrap());
        let rows = master.read_all().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].total_return, 1000);
        assert_eq!(rows[0].total_cost, 1000);
        assert_eq!(rows[0].month, Some("202506".parse().unwrap()));

        let monthly = MonthLedger::new(dir.path(), "202506".parse().unwrap());
        assert_eq!(monthly.read_all().unwrap().len(), 1);

        // The snapshot was written alongside.
        let snapshots = SnapshotStore::new(dir.path());
        assert!(snapshots.exists("202506".parse().unwrap()));
    }

    #[tokio::test]
    async fn repeat_polls_record_without_refixing() {
        let dir = TempDir::new().unwrap();
        let today = NaiveDate::from_ymd_opt(2025, 6, 6).unwrap();
        let mut service = TrackerService::start(config(&dir), FakeMarket::new(19), today)
            .await
            .unwrap();

        service.poll_once(session_time(6)).await.unwrap();
        service.poll_once(session_time(6)).await.unwrap();

        assert_eq!(service.state().month_residual_cost, Some(65));
        let master = MasterLedger::new(dir.path(), NaiveDate::from_ymd_opt(2025, 6, 2).unwrap());
        assert_eq!(master.read_all().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn too_early_polls_do_nothing() {
        let dir = TempDir::new().unwrap();
        let today = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        // 23 days out, above the 19-day start threshold.
        let mut service = TrackerService::start(config(&dir), FakeMarket::new(23), today)
            .await
            .unwrap();

        service.poll_once(session_time(2)).await.unwrap();

        assert!(!service.state().is_initialized());
        let master = MasterLedger::new(dir.path(), NaiveDate::from_ymd_opt(2025, 6, 2).unwrap());
        assert!(master.read_all().unwrap().is_empty());
    }

    #[tokio::test]
    async fn restart_recovers_the_fixed_position_from_disk() {
        let dir = TempDir::new().unwrap();
        let today = NaiveDate::from_ymd_opt(2025, 6, 6).unwrap();

        {
            let mut service = TrackerService::start(config(&dir), FakeMarket::new(19), today)
                .await
                .unwrap();
            service.poll_once(session_time(6)).await.unwrap();
        }

        let service = TrackerService::start(config(&dir), FakeMarket::new(19), today)
            .await
            .unwrap();
        let state = service.state();
        assert!(state.is_initialized());
        assert_eq!(state.call_quantity, Some(5));
        assert_eq!(state.cumulative_cost, 1000);
        // Budget marker survived; re-initiation would not double-count.
        assert_eq!(state.budget_applied_for, Some("202506".parse().unwrap()));
    }

    #[tokio::test]
    async fn master_annualizes_over_tracking_days_monthly_over_month_days() {
        let dir = TempDir::new().unwrap();
        let mut config = config(&dir);
        // Tracking began 2025-04-29; the current month started 2025-06-02.
        config.storage.start_date = NaiveDate::from_ymd_opt(2025, 4, 29).unwrap();

        let seeded = PersistedState {
            reference_price: Some(dec!(2.731)),
            call: Some(ContractLeg::new("10009106", dec!(2.85))),
            put: Some(ContractLeg::new("10009202", dec!(2.65))),
            call_quantity: Some(5),
            put_quantity: Some(10),
            entry_call_price: Some(dec!(0.0095)),
            entry_put_price: Some(dec!(0.0046)),
            month_residual_cost: Some(100),
            cumulative_cost: 1000,
            carried_baseline: 1065,
            start_date: NaiveDate::from_ymd_opt(2025, 6, 2),
            budget_applied_for: Some("202506".parse().unwrap()),
            ..PersistedState::empty("202506".parse().unwrap())
        };
        SnapshotStore::new(dir.path()).save(&seeded).unwrap();

        let today = NaiveDate::from_ymd_opt(2025, 6, 6).unwrap();
        let mut service = TrackerService::start(config, FakeMarket::new(19), today)
            .await
            .unwrap();
        service.poll_once(session_time(6)).await.unwrap();

        // Master: value 935 + residual 100 + baseline 1065 = 2100 over
        // 39 days of tracking: (2100/1000 − 1)/39 × 365 × 100.
        let master = MasterLedger::new(dir.path(), NaiveDate::from_ymd_opt(2025, 4, 29).unwrap());
        let rows = master.read_all().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].total_return, 2100);
        assert_eq!(rows[0].annual_return, dec!(1029.4872));

        // Monthly: value 935 + residual 100 = 1035 over the month's own
        // 5 days: (1035/1000 − 1)/5 × 365 × 100.
        let monthly = MonthLedger::new(dir.path(), "202506".parse().unwrap());
        let month_rows = monthly.read_all().unwrap();
        assert_eq!(month_rows.len(), 1);
        assert_eq!(month_rows[0].total_return, 1035);
        assert_eq!(month_rows[0].annual_return, dec!(255.5));
    }

    #[tokio::test]
    async fn tick_sleeps_long_on_non_trading_days() {
        let dir = TempDir::new().unwrap();
        let today = NaiveDate::from_ymd_opt(2025, 6, 6).unwrap();
        let mut service = TrackerService::start(config(&dir), FakeMarket::new(19), today)
            .await
            .unwrap();

        // Saturday.
        let saturday = NaiveDate::from_ymd_opt(2025, 6, 7)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        assert_eq!(service.tick(saturday).await, Duration::from_secs(3600));

        // Lunch break on a weekday.
        let lunch = NaiveDate::from_ymd_opt(2025, 6, 6)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        assert_eq!(service.tick(lunch).await, Duration::from_secs(60));
        assert!(!service.state().is_initialized());
    }
}
