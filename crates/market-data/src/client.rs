//! The market-data seam: everything the tracker needs from the outside
//! world, as one async trait with typed responses.

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use otm_tracker_core::Month;

use crate::error::MarketDataError;

/// Live contract codes for one underlying and month, split by side.
#[derive(Debug, Clone, Default)]
pub struct ContractCodes {
    pub calls: Vec<String>,
    pub puts: Vec<String>,
}

impl ContractCodes {
    /// True when either side has no contracts; both are required for a
    /// usable universe.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.calls.is_empty() || self.puts.is_empty()
    }
}

/// Expiry-calendar answer for one contract month.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ExpiryInfo {
    pub expire_day: NaiveDate,
    pub days_remaining: i64,
}

/// A single option quote with the fields the tracker consumes. Field
/// presence, numeric shape, and the latest premium's plausibility are
/// validated once at the implementation boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionQuote {
    pub code: String,
    pub latest: Decimal,
    pub bid: Decimal,
    pub ask: Decimal,
    pub strike: Decimal,
    pub days_to_expiry: i64,
}

/// Remote market-data operations, all with bounded timeout and retry
/// behind the implementation.
#[async_trait]
pub trait MarketData: Send + Sync {
    /// Latest price of the tracked underlying.
    async fn underlying_price(&self) -> Result<Decimal, MarketDataError>;

    /// Live option contract codes for the underlying and month.
    async fn contract_codes(&self, month: Month) -> Result<ContractCodes, MarketDataError>;

    /// Full quote for a contract code.
    async fn option_quote(&self, code: &str) -> Result<OptionQuote, MarketDataError>;

    /// Strike price for a contract code (cheaper than a full quote).
    async fn strike_price(&self, code: &str) -> Result<Decimal, MarketDataError>;

    /// Expiry day and days-remaining for a contract month.
    async fn expiry(&self, month: Month) -> Result<ExpiryInfo, MarketDataError>;
}
