//! HTTP client for the Sina-style quote and expiry-calendar endpoints.
//!
//! The quote service answers with a JavaScript assignment whose value is a
//! comma-separated field list inside double quotes; fields are positional.
//! The expiry calendar is a JSON endpoint. Both are treated as opaque
//! remote collaborators: bounded timeout, shared retry policy, and full
//! parsing/validation at this boundary so the rest of the tracker only
//! ever sees typed records.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;

use otm_tracker_core::config::MarketDataConfig;
use otm_tracker_core::types::{plausible_premium, plausible_underlying_price};
use otm_tracker_core::{Month, RetryPolicy};

use crate::client::{ContractCodes, ExpiryInfo, MarketData, OptionQuote};
use crate::error::MarketDataError;

// Positional indexes in the CON_OP_ quote field list.
const QUOTE_FIELD_BID: usize = 1;
const QUOTE_FIELD_LATEST: usize = 2;
const QUOTE_FIELD_ASK: usize = 3;
const QUOTE_FIELD_STRIKE: usize = 7;
const QUOTE_FIELD_DTE: usize = 47;

// Strike index in the CON_SO_ field list.
const STRIKE_FIELD: usize = 13;

/// Market-data client for the Sina endpoints.
pub struct SinaMarketData {
    http: reqwest::Client,
    quote_base: String,
    expiry_base: String,
    referer: String,
    underlying: String,
    retry: RetryPolicy,
}

impl SinaMarketData {
    pub fn new(config: &MarketDataConfig, underlying: &str) -> Result<Self, MarketDataError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .no_proxy()
            .build()?;
        Ok(Self {
            http,
            quote_base: config.quote_base_url.trim_end_matches('/').to_string(),
            expiry_base: config.expiry_base_url.trim_end_matches('/').to_string(),
            referer: config.referer.clone(),
            underlying: underlying.to_string(),
            retry: config.retry_policy(),
        })
    }

    async fn fetch_text(&self, url: &str) -> Result<String, MarketDataError> {
        let response = self
            .http
            .get(url)
            .header(reqwest::header::REFERER, &self.referer)
            .header(reqwest::header::CONNECTION, "close")
            .send()
            .await?
            .error_for_status()?;
        // The service answers in GBK; every field the tracker reads is
        // ASCII, so a lossy UTF-8 view keeps them intact.
        let bytes = response.bytes().await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    async fn fetch_underlying(&self) -> Result<Decimal, MarketDataError> {
        let url = format!("{}/list=s_sh{}", self.quote_base, self.underlying);
        let payload = self.fetch_text(&url).await?;
        parse_underlying_payload(&payload)
    }

    async fn fetch_codes(&self, month: Month) -> Result<ContractCodes, MarketDataError> {
        let suffix = month_code_suffix(month);
        let up_url = format!("{}/list=OP_UP_{}{}", self.quote_base, self.underlying, suffix);
        let down_url = format!("{}/list=OP_DOWN_{}{}", self.quote_base, self.underlying, suffix);
        let codes = ContractCodes {
            calls: parse_codes_payload(&self.fetch_text(&up_url).await?),
            puts: parse_codes_payload(&self.fetch_text(&down_url).await?),
        };
        debug!(
            month = %month,
            calls = codes.calls.len(),
            puts = codes.puts.len(),
            "Fetched contract codes"
        );
        // Both sides are needed; a one-sided answer is retried like an
        // empty one.
        if codes.is_empty() {
            return Err(MarketDataError::Unavailable(format!(
                "contract codes for {month}"
            )));
        }
        Ok(codes)
    }

    async fn fetch_quote(&self, code: &str) -> Result<OptionQuote, MarketDataError> {
        let url = format!("{}/list=CON_OP_{}", self.quote_base, code);
        let payload = self.fetch_text(&url).await?;
        parse_quote_payload(code, &payload)
    }

    async fn fetch_strike(&self, code: &str) -> Result<Decimal, MarketDataError> {
        let url = format!("{}/list=CON_SO_{}", self.quote_base, code);
        let payload = self.fetch_text(&url).await?;
        parse_strike_payload(&payload)
    }

    async fn fetch_expiry(&self, month: Month) -> Result<ExpiryInfo, MarketDataError> {
        let info = self.fetch_expiry_for_category(month, "50ETF").await?;
        // A negative remainder means the plain category already expired and
        // the month trades under the dividend-adjusted (XD) category.
        if info.days_remaining < 0 {
            return self.fetch_expiry_for_category(month, "XD50ETF").await;
        }
        Ok(info)
    }

    async fn fetch_expiry_for_category(
        &self,
        month: Month,
        category: &str,
    ) -> Result<ExpiryInfo, MarketDataError> {
        let url = format!(
            "{}/futures/api/openapi.php/StockOptionService.getRemainderDay?exchange=null&cate={}&date={:04}-{:02}",
            self.expiry_base,
            category,
            month.year(),
            month.month()
        );
        let response: RemainderDayResponse = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        parse_expiry_data(month, &response.result.data)
    }
}

#[async_trait]
impl MarketData for SinaMarketData {
    async fn underlying_price(&self) -> Result<Decimal, MarketDataError> {
        self.retry
            .run("underlying_price", || self.fetch_underlying())
            .await
    }

    async fn contract_codes(&self, month: Month) -> Result<ContractCodes, MarketDataError> {
        self.retry
            .run("contract_codes", || self.fetch_codes(month))
            .await
    }

    async fn option_quote(&self, code: &str) -> Result<OptionQuote, MarketDataError> {
        self.retry
            .run("option_quote", || self.fetch_quote(code))
            .await
    }

    async fn strike_price(&self, code: &str) -> Result<Decimal, MarketDataError> {
        self.retry
            .run("strike_price", || self.fetch_strike(code))
            .await
    }

    async fn expiry(&self, month: Month) -> Result<ExpiryInfo, MarketDataError> {
        self.retry.run("expiry", || self.fetch_expiry(month)).await
    }
}

#[derive(Debug, Deserialize)]
struct RemainderDayResponse {
    result: RemainderDayResult,
}

#[derive(Debug, Deserialize)]
struct RemainderDayResult {
    data: RemainderDayData,
}

#[derive(Debug, Deserialize)]
struct RemainderDayData {
    #[serde(rename = "expireDay")]
    expire_day: serde_json::Value,
    #[serde(rename = "remainderDays")]
    remainder_days: serde_json::Value,
}

/// The code-list suffix is the last four digits of `YYYYMM` (`2506` for
/// June 2025).
fn month_code_suffix(month: Month) -> String {
    let full = month.to_string();
    full[2..].to_string()
}

/// The value between the first and last double quote of a hq payload.
fn quoted_section(payload: &str) -> Result<&str, MarketDataError> {
    let start = payload.find('"');
    let end = payload.rfind('"');
    match (start, end) {
        (Some(s), Some(e)) if e > s => Ok(&payload[s + 1..e]),
        _ => Err(MarketDataError::malformed("hq list", "no quoted section")),
    }
}

fn decimal_field(
    fields: &[&str],
    index: usize,
    name: &'static str,
) -> Result<Decimal, MarketDataError> {
    let raw = fields
        .get(index)
        .ok_or_else(|| MarketDataError::malformed("hq list", format!("missing field {name}")))?;
    raw.trim()
        .parse::<Decimal>()
        .map_err(|_| MarketDataError::malformed("hq list", format!("bad {name}: {raw:?}")))
}

fn parse_underlying_payload(payload: &str) -> Result<Decimal, MarketDataError> {
    let fields: Vec<&str> = quoted_section(payload)?.split(',').collect();
    let price = decimal_field(&fields, 1, "underlying price")?;
    // The feed occasionally answers with a zeroed or garbage price; the
    // retry wrapper treats it like any other bad response.
    if !plausible_underlying_price(price) {
        return Err(MarketDataError::OutOfRange {
            field: "underlying price",
            value: price.to_string(),
        });
    }
    Ok(price)
}

fn parse_codes_payload(payload: &str) -> Vec<String> {
    payload
        .replace('"', ",")
        .split(',')
        .filter_map(|token| token.trim().strip_prefix("CON_OP_").map(str::to_string))
        .filter(|code| !code.is_empty())
        .collect()
}

fn parse_quote_payload(code: &str, payload: &str) -> Result<OptionQuote, MarketDataError> {
    let fields: Vec<&str> = quoted_section(payload)?.split(',').collect();
    let days_to_expiry = fields
        .get(QUOTE_FIELD_DTE)
        .and_then(|raw| raw.trim().parse::<i64>().ok())
        .unwrap_or(0);
    let latest = decimal_field(&fields, QUOTE_FIELD_LATEST, "latest price")?;
    if !plausible_premium(latest) {
        return Err(MarketDataError::OutOfRange {
            field: "latest premium",
            value: latest.to_string(),
        });
    }
    Ok(OptionQuote {
        code: code.to_string(),
        latest,
        bid: decimal_field(&fields, QUOTE_FIELD_BID, "bid price")?,
        ask: decimal_field(&fields, QUOTE_FIELD_ASK, "ask price")?,
        strike: decimal_field(&fields, QUOTE_FIELD_STRIKE, "strike price")?,
        days_to_expiry,
    })
}

fn parse_strike_payload(payload: &str) -> Result<Decimal, MarketDataError> {
    let fields: Vec<&str> = quoted_section(payload)?.split(',').collect();
    decimal_field(&fields, STRIKE_FIELD, "strike price")
}

fn parse_expiry_data(month: Month, data: &RemainderDayData) -> Result<ExpiryInfo, MarketDataError> {
    let days_remaining = match &data.remainder_days {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
    .ok_or_else(|| {
        MarketDataError::malformed("getRemainderDay", format!("bad remainderDays: {:?}", data.remainder_days))
    })?;

    // `expireDay` arrives either as a day-of-month number or a full date.
    let expire_day = match &data.expire_day {
        serde_json::Value::Number(n) => n
            .as_u64()
            .and_then(|d| NaiveDate::from_ymd_opt(month.year(), month.month(), d as u32)),
        serde_json::Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.contains('-') {
                NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").ok()
            } else {
                trimmed
                    .parse::<u32>()
                    .ok()
                    .and_then(|d| NaiveDate::from_ymd_opt(month.year(), month.month(), d))
            }
        }
        _ => None,
    }
    .ok_or_else(|| {
        MarketDataError::malformed("getRemainderDay", format!("bad expireDay: {:?}", data.expire_day))
    })?;

    Ok(ExpiryInfo {
        expire_day,
        days_remaining,
    })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn underlying_payload_takes_second_field() {
        let payload = r#"var hq_str_s_sh510050="50ETF,2.731,0.012,0.44,652133,178329";"#;
        assert_eq!(parse_underlying_payload(payload).unwrap(), dec!(2.731));
    }

    #[test]
    fn underlying_payload_without_quotes_is_malformed() {
        assert!(parse_underlying_payload("var hq_str_s_sh510050=;").is_err());
    }

    #[test]
    fn zeroed_underlying_price_is_out_of_range() {
        let payload = r#"var hq_str_s_sh510050="50ETF,0.000,0.012,0.44,652133,178329";"#;
        assert!(matches!(
            parse_underlying_payload(payload),
            Err(MarketDataError::OutOfRange { .. })
        ));
    }

    #[test]
    fn codes_payload_strips_the_contract_prefix() {
        let payload = r#"var hq_str_OP_UP_5100502506="CON_OP_10009231,CON_OP_10009232,CON_OP_10009233";"#;
        let codes = parse_codes_payload(payload);
        assert_eq!(codes, vec!["10009231", "10009232", "10009233"]);
    }

    #[test]
    fn codes_payload_without_contracts_is_empty() {
        assert!(parse_codes_payload(r#"var hq_str_OP_UP_5100502506="";"#).is_empty());
    }

    #[test]
    fn quote_payload_maps_positional_fields() {
        // 51 positional fields; only the handful the tracker reads are
        // populated here.
        let mut fields = vec!["0"; 51];
        fields[QUOTE_FIELD_BID] = "0.0094";
        fields[QUOTE_FIELD_LATEST] = "0.0095";
        fields[QUOTE_FIELD_ASK] = "0.0096";
        fields[QUOTE_FIELD_STRIKE] = "2.85";
        fields[QUOTE_FIELD_DTE] = "15";
        let payload = format!(r#"var hq_str_CON_OP_10009231="{}";"#, fields.join(","));

        let quote = parse_quote_payload("10009231", &payload).unwrap();
        assert_eq!(quote.latest, dec!(0.0095));
        assert_eq!(quote.bid, dec!(0.0094));
        assert_eq!(quote.ask, dec!(0.0096));
        assert_eq!(quote.strike, dec!(2.85));
        assert_eq!(quote.days_to_expiry, 15);
    }

    #[test]
    fn zeroed_premium_is_out_of_range() {
        let mut fields = vec!["0"; 51];
        fields[QUOTE_FIELD_BID] = "0.0094";
        fields[QUOTE_FIELD_ASK] = "0.0096";
        fields[QUOTE_FIELD_STRIKE] = "2.85";
        let payload = format!(r#"var hq_str_CON_OP_10009231="{}";"#, fields.join(","));
        assert!(matches!(
            parse_quote_payload("10009231", &payload),
            Err(MarketDataError::OutOfRange { .. })
        ));
    }

    #[test]
    fn truncated_quote_payload_is_malformed() {
        let payload = r#"var hq_str_CON_OP_10009231="1,0.0094,0.0095";"#;
        assert!(parse_quote_payload("10009231", &payload).is_err());
    }

    #[test]
    fn strike_payload_takes_field_thirteen() {
        let mut fields = vec!["x"; 20];
        fields[STRIKE_FIELD] = "2.85";
        let payload = format!(r#"var hq_str_CON_SO_10009231="{}";"#, fields.join(","));
        assert_eq!(parse_strike_payload(&payload).unwrap(), dec!(2.85));
    }

    #[test]
    fn expiry_data_accepts_day_of_month_or_full_date() {
        let month: Month = "202506".parse().unwrap();

        let numeric = RemainderDayData {
            expire_day: serde_json::json!(25),
            remainder_days: serde_json::json!(15),
        };
        let info = parse_expiry_data(month, &numeric).unwrap();
        assert_eq!(info.expire_day, NaiveDate::from_ymd_opt(2025, 6, 25).unwrap());
        assert_eq!(info.days_remaining, 15);

        let dated = RemainderDayData {
            expire_day: serde_json::json!("2025-06-25"),
            remainder_days: serde_json::json!("15"),
        };
        let info = parse_expiry_data(month, &dated).unwrap();
        assert_eq!(info.expire_day, NaiveDate::from_ymd_opt(2025, 6, 25).unwrap());
    }

    #[test]
    fn month_suffix_is_last_four_digits() {
        let month: Month = "202506".parse().unwrap();
        assert_eq!(month_code_suffix(month), "2506");
    }
}
