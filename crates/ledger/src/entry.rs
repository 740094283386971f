//! A single ledger row in the legacy column layout.
//!
//! Both ledgers share the same row shape; the master ledger carries one
//! extra trailing `Month` column. Formatting must reproduce the historical
//! files byte for byte: timestamps as `%Y-%m-%d %H:%M:%S`, prices with
//! their original scale, the annualized return with a trailing `%`.

use chrono::NaiveDateTime;
use csv::StringRecord;
use rust_decimal::Decimal;

use otm_tracker_core::Month;

use crate::error::LedgerError;

pub(crate) const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Column names of a per-month ledger.
pub const MONTH_HEADERS: [&str; 12] = [
    "Date",
    "ETF Price",
    "Call Strike",
    "Put Strike",
    "Call Price",
    "Put Price",
    "Call Qty",
    "Put Qty",
    "Remainder Cost",
    "Total Cost",
    "Total Return",
    "Annual Return",
];

/// Column names of the master ledger (per-month columns plus `Month`).
pub const MASTER_HEADERS: [&str; 13] = [
    "Date",
    "ETF Price",
    "Call Strike",
    "Put Strike",
    "Call Price",
    "Put Price",
    "Call Qty",
    "Put Qty",
    "Remainder Cost",
    "Total Cost",
    "Total Return",
    "Annual Return",
    "Month",
];

/// One immutable observation row.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerEntry {
    pub timestamp: NaiveDateTime,
    pub etf_price: Decimal,
    pub call_strike: Decimal,
    pub put_strike: Decimal,
    pub call_price: Decimal,
    pub put_price: Decimal,
    pub call_qty: u32,
    pub put_qty: u32,
    /// Budget left over after quantities were fixed, in whole yuan.
    pub remainder_cost: i64,
    /// Cumulative invested cost across all tracked months, in whole yuan.
    pub total_cost: i64,
    pub total_return: i64,
    /// Annualized return in percent (the `%` sign is added on disk).
    pub annual_return: Decimal,
    /// Contract month; present in master-ledger rows only.
    pub month: Option<Month>,
}

impl LedgerEntry {
    /// The row as CSV fields, with or without the trailing month column.
    #[must_use]
    pub fn to_record(&self, include_month: bool) -> Vec<String> {
        let mut fields = vec![
            self.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            self.etf_price.to_string(),
            self.call_strike.to_string(),
            self.put_strike.to_string(),
            self.call_price.to_string(),
            self.put_price.to_string(),
            self.call_qty.to_string(),
            self.put_qty.to_string(),
            self.remainder_cost.to_string(),
            self.total_cost.to_string(),
            self.total_return.to_string(),
            format!("{}%", self.annual_return),
        ];
        if include_month {
            fields.push(self.month.map(|m| m.to_string()).unwrap_or_default());
        }
        fields
    }

    /// Parses one CSV record. `has_month` selects the master-ledger layout.
    pub fn parse_record(record: &StringRecord, has_month: bool) -> Result<Self, LedgerError> {
        let expected = if has_month { 13 } else { 12 };
        if record.len() != expected {
            return Err(LedgerError::Malformed(format!(
                "expected {expected} fields, got {}",
                record.len()
            )));
        }

        let month = if has_month {
            let raw = field(record, 12)?;
            if raw.is_empty() {
                None
            } else {
                Some(
                    raw.parse::<Month>()
                        .map_err(|e| LedgerError::Malformed(e.to_string()))?,
                )
            }
        } else {
            None
        };

        Ok(Self {
            timestamp: NaiveDateTime::parse_from_str(field(record, 0)?, TIMESTAMP_FORMAT)
                .map_err(|e| LedgerError::Malformed(format!("bad timestamp: {e}")))?,
            etf_price: decimal(record, 1, "ETF Price")?,
            call_strike: decimal(record, 2, "Call Strike")?,
            put_strike: decimal(record, 3, "Put Strike")?,
            call_price: decimal(record, 4, "Call Price")?,
            put_price: decimal(record, 5, "Put Price")?,
            call_qty: integer(record, 6, "Call Qty")?,
            put_qty: integer(record, 7, "Put Qty")?,
            remainder_cost: integer(record, 8, "Remainder Cost")?,
            total_cost: integer(record, 9, "Total Cost")?,
            total_return: integer(record, 10, "Total Return")?,
            annual_return: parse_percent(field(record, 11)?)?,
            month,
        })
    }
}

fn field<'r>(record: &'r StringRecord, index: usize) -> Result<&'r str, LedgerError> {
    record
        .get(index)
        .map(str::trim)
        .ok_or_else(|| LedgerError::Malformed(format!("missing field {index}")))
}

fn decimal(record: &StringRecord, index: usize, name: &str) -> Result<Decimal, LedgerError> {
    let raw = field(record, index)?;
    raw.parse::<Decimal>()
        .map_err(|_| LedgerError::Malformed(format!("bad {name}: {raw:?}")))
}

fn integer<T: std::str::FromStr>(
    record: &StringRecord,
    index: usize,
    name: &str,
) -> Result<T, LedgerError> {
    let raw = field(record, index)?;
    raw.parse::<T>()
        .map_err(|_| LedgerError::Malformed(format!("bad {name}: {raw:?}")))
}

/// Annualized return is written as `12.3456%`; older hand-edited rows
/// occasionally miss the sign, so it is optional on the way in.
fn parse_percent(raw: &str) -> Result<Decimal, LedgerError> {
    let stripped = raw.strip_suffix('%').unwrap_or(raw);
    stripped
        .parse::<Decimal>()
        .map_err(|_| LedgerError::Malformed(format!("bad Annual Return: {raw:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn sample() -> LedgerEntry {
        LedgerEntry {
            timestamp: NaiveDate::from_ymd_opt(2025, 6, 2)
                .unwrap()
                .and_hms_opt(9, 41, 0)
                .unwrap(),
            etf_price: dec!(2.731),
            call_strike: dec!(2.85),
            put_strike: dec!(2.65),
            call_price: dec!(0.0095),
            put_price: dec!(0.0046),
            call_qty: 5,
            put_qty: 10,
            remainder_cost: 65,
            total_cost: 1000,
            total_return: 935,
            annual_return: dec!(-2.3729),
            month: Some("202506".parse().unwrap()),
        }
    }

    #[test]
    fn round_trip_reproduces_every_field() {
        let entry = sample();
        let record = StringRecord::from(entry.to_record(true));
        let parsed = LedgerEntry::parse_record(&record, true).unwrap();
        assert_eq!(parsed, entry);

        let mut monthly = entry.clone();
        monthly.month = None;
        let record = StringRecord::from(monthly.to_record(false));
        assert_eq!(LedgerEntry::parse_record(&record, false).unwrap(), monthly);
    }

    #[test]
    fn annual_return_carries_a_percent_sign() {
        let fields = sample().to_record(true);
        assert_eq!(fields[11], "-2.3729%");
        assert_eq!(fields[0], "2025-06-02 09:41:00");
        assert_eq!(fields[12], "202506");
    }

    #[test]
    fn percent_sign_is_optional_on_parse() {
        assert_eq!(parse_percent("12.3456%").unwrap(), dec!(12.3456));
        assert_eq!(parse_percent("12.3456").unwrap(), dec!(12.3456));
        assert!(parse_percent("n/a").is_err());
    }

    #[test]
    fn truncated_record_is_malformed() {
        let record = StringRecord::from(vec!["2025-06-02 09:41:00", "2.731"]);
        assert!(LedgerEntry::parse_record(&record, false).is_err());
    }
}
