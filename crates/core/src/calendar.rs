//! Trading-calendar gate: pure decisions about whether "now" is a time to
//! poll and record.

use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

/// One intraday trading window, bounds inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradingSession {
    pub open: NaiveTime,
    pub close: NaiveTime,
}

/// Static trading calendar: holiday dates plus intraday session windows.
///
/// All methods are pure functions of the supplied instant; missing data
/// (no sessions configured, say) simply yields "not trading" and the
/// caller sleeps.
#[derive(Debug, Clone, Default)]
pub struct TradingCalendar {
    holidays: BTreeSet<NaiveDate>,
    sessions: Vec<TradingSession>,
}

impl TradingCalendar {
    #[must_use]
    pub fn new(holidays: impl IntoIterator<Item = NaiveDate>, sessions: Vec<TradingSession>) -> Self {
        Self {
            holidays: holidays.into_iter().collect(),
            sessions,
        }
    }

    /// Weekday and not a listed holiday.
    #[must_use]
    pub fn is_trading_day(&self, date: NaiveDate) -> bool {
        let weekday = date.weekday();
        if weekday == Weekday::Sat || weekday == Weekday::Sun {
            return false;
        }
        !self.holidays.contains(&date)
    }

    /// Inside any configured trading window.
    #[must_use]
    pub fn in_session(&self, time: NaiveTime) -> bool {
        self.sessions
            .iter()
            .any(|s| s.open <= time && time <= s.close)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cny_sessions() -> Vec<TradingSession> {
        vec![
            TradingSession {
                open: NaiveTime::from_hms_opt(9, 40, 0).unwrap(),
                close: NaiveTime::from_hms_opt(11, 30, 0).unwrap(),
            },
            TradingSession {
                open: NaiveTime::from_hms_opt(13, 10, 0).unwrap(),
                close: NaiveTime::from_hms_opt(15, 0, 0).unwrap(),
            },
        ]
    }

    fn calendar() -> TradingCalendar {
        let holidays = vec![NaiveDate::from_ymd_opt(2025, 5, 1).unwrap()];
        TradingCalendar::new(holidays, cny_sessions())
    }

    #[test]
    fn weekends_are_not_trading_days() {
        let cal = calendar();
        // 2025-06-07 is a Saturday, 2025-06-08 a Sunday.
        assert!(!cal.is_trading_day(NaiveDate::from_ymd_opt(2025, 6, 7).unwrap()));
        assert!(!cal.is_trading_day(NaiveDate::from_ymd_opt(2025, 6, 8).unwrap()));
        assert!(cal.is_trading_day(NaiveDate::from_ymd_opt(2025, 6, 9).unwrap()));
    }

    #[test]
    fn holidays_are_not_trading_days() {
        let cal = calendar();
        // 2025-05-01 is a Thursday but listed as a holiday.
        assert!(!cal.is_trading_day(NaiveDate::from_ymd_opt(2025, 5, 1).unwrap()));
    }

    #[test]
    fn session_bounds_are_inclusive() {
        let cal = calendar();
        assert!(cal.in_session(NaiveTime::from_hms_opt(9, 40, 0).unwrap()));
        assert!(cal.in_session(NaiveTime::from_hms_opt(11, 30, 0).unwrap()));
        assert!(!cal.in_session(NaiveTime::from_hms_opt(11, 31, 0).unwrap()));
        assert!(cal.in_session(NaiveTime::from_hms_opt(14, 0, 0).unwrap()));
        assert!(!cal.in_session(NaiveTime::from_hms_opt(12, 0, 0).unwrap()));
    }

    #[test]
    fn empty_calendar_is_never_in_session() {
        let cal = TradingCalendar::default();
        assert!(!cal.in_session(NaiveTime::from_hms_opt(10, 0, 0).unwrap()));
    }
}
