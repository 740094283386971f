//! Application configuration.
//!
//! Defaults reproduce the strategy constants the tracker has always run
//! with: 1000 yuan monthly budget split 500/500 across the legs, two
//! out-of-the-money steps per side, recording from 19 days before expiry
//! until the day before.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calendar::{TradingCalendar, TradingSession};
use crate::retry::RetryPolicy;
use crate::schedule::RolloverSchedule;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub tracker: TrackerConfig,
    pub market_data: MarketDataConfig,
    pub storage: StorageConfig,
    pub calendar: CalendarConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Exchange code of the tracked underlying.
    pub underlying: String,
    /// Total notional invested each contract month, in yuan.
    pub monthly_budget: i64,
    pub call_budget: i64,
    pub put_budget: i64,
    /// Strike-grid steps above/below at-the-money for leg selection.
    pub call_otm_level: usize,
    pub put_otm_level: usize,
    pub start_dte: i64,
    pub stop_dte: i64,
    /// Underlying units per contract.
    pub contract_multiplier: Decimal,
    /// Official strike-grid step used to filter non-standard
    /// (post-adjustment) strikes.
    pub standard_strike_step: Decimal,
    /// Below this many standard strikes per side, fall back to the
    /// unfiltered list.
    pub min_standard_strikes: usize,
    /// Sanity ceiling on per-leg contract counts.
    pub max_contracts: u32,
    pub poll_interval_secs: u64,
    pub off_session_interval_secs: u64,
    pub off_day_interval_secs: u64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            underlying: "510050".to_string(),
            monthly_budget: 1000,
            call_budget: 500,
            put_budget: 500,
            call_otm_level: 2,
            put_otm_level: 2,
            start_dte: 19,
            stop_dte: 1,
            contract_multiplier: Decimal::from(10_000),
            standard_strike_step: Decimal::new(5, 2),
            min_standard_strikes: 5,
            max_contracts: 10_000,
            poll_interval_secs: 60,
            off_session_interval_secs: 60,
            off_day_interval_secs: 3600,
        }
    }
}

impl TrackerConfig {
    #[must_use]
    pub fn schedule(&self) -> RolloverSchedule {
        RolloverSchedule {
            start_dte: self.start_dte,
            stop_dte: self.stop_dte,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketDataConfig {
    /// Base URL of the quote (hq list) service.
    pub quote_base_url: String,
    /// Base URL of the expiry-calendar service.
    pub expiry_base_url: String,
    /// Referer header the quote service requires.
    pub referer: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub retry_delay_secs: u64,
}

impl Default for MarketDataConfig {
    fn default() -> Self {
        Self {
            quote_base_url: "http://hq.sinajs.cn".to_string(),
            expiry_base_url: "http://stock.finance.sina.com.cn".to_string(),
            referer: "http://finance.sina.com.cn/".to_string(),
            timeout_secs: 10,
            max_retries: 3,
            retry_delay_secs: 2,
        }
    }
}

impl MarketDataConfig {
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, Duration::from_secs(self.retry_delay_secs))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding ledgers and state snapshots.
    pub data_dir: PathBuf,
    /// Tracking start date; the master ledger file name derives from it,
    /// so changing it begins a fresh recording cycle.
    pub start_date: NaiveDate,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            start_date: Utc::now().date_naive(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    /// Exchange holiday dates (weekends are excluded implicitly).
    pub holidays: Vec<NaiveDate>,
    pub sessions: Vec<TradingSession>,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            holidays: Vec::new(),
            sessions: vec![
                session(9, 40, 11, 30),
                session(13, 10, 15, 0),
            ],
        }
    }
}

impl CalendarConfig {
    #[must_use]
    pub fn calendar(&self) -> TradingCalendar {
        TradingCalendar::new(self.holidays.iter().copied(), self.sessions.clone())
    }
}

fn session(open_h: u32, open_m: u32, close_h: u32, close_m: u32) -> TradingSession {
    TradingSession {
        open: NaiveTime::from_hms_opt(open_h, open_m, 0).unwrap_or_default(),
        close: NaiveTime::from_hms_opt(close_h, close_m, 0).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn defaults_match_strategy_constants() {
        let config = TrackerConfig::default();
        assert_eq!(config.monthly_budget, 1000);
        assert_eq!(config.call_budget + config.put_budget, config.monthly_budget);
        assert_eq!(config.call_otm_level, 2);
        assert_eq!(config.contract_multiplier, dec!(10000));
        assert_eq!(config.standard_strike_step, dec!(0.05));
        assert_eq!(config.schedule().start_dte, 19);
        assert_eq!(config.schedule().stop_dte, 1);
    }

    #[test]
    fn default_calendar_has_two_sessions() {
        let calendar = CalendarConfig::default();
        assert_eq!(calendar.sessions.len(), 2);
        let cal = calendar.calendar();
        assert!(cal.in_session(NaiveTime::from_hms_opt(10, 0, 0).unwrap()));
        assert!(!cal.in_session(NaiveTime::from_hms_opt(12, 0, 0).unwrap()));
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: AppConfig = toml_from_str(
            r#"
            [tracker]
            monthly_budget = 2000
            call_budget = 1000
            put_budget = 1000
            "#,
        );
        assert_eq!(config.tracker.monthly_budget, 2000);
        assert_eq!(config.tracker.call_otm_level, 2);
        assert_eq!(config.market_data.timeout_secs, 10);
    }

    fn toml_from_str(s: &str) -> AppConfig {
        use figment::providers::Format;
        figment::Figment::new()
            .merge(figment::providers::Toml::string(s))
            .extract()
            .unwrap()
    }
}
