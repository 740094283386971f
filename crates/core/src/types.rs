//! Domain types for the tracked synthetic options pair.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::month::Month;

/// Call or put side of the pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptionRight {
    Call,
    Put,
}

impl std::fmt::Display for OptionRight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Call => write!(f, "call"),
            Self::Put => write!(f, "put"),
        }
    }
}

/// A selected contract: exchange code plus its strike price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractLeg {
    pub code: String,
    pub strike: Decimal,
}

impl ContractLeg {
    #[must_use]
    pub fn new(code: impl Into<String>, strike: Decimal) -> Self {
        Self {
            code: code.into(),
            strike,
        }
    }

    /// Synthetic placeholder leg used when a recovered strike no longer
    /// matches any live contract code. A reportable anomaly, not an error.
    #[must_use]
    pub fn placeholder(right: OptionRight, strike: Decimal) -> Self {
        Self {
            code: format!("strike_{strike}_{right}"),
            strike,
        }
    }

    /// True for legs produced by [`ContractLeg::placeholder`].
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.code.starts_with("strike_")
    }
}

/// The fully-initialized tracked position for one contract month.
///
/// Quantities and entry premiums are frozen at the first observation on the
/// initiation day; later polls only refresh current premiums.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub month: Month,
    /// Underlying price recorded at position inception.
    pub reference_price: Decimal,
    pub call: ContractLeg,
    pub put: ContractLeg,
    pub call_quantity: u32,
    pub put_quantity: u32,
    /// Premiums at the moment quantities were fixed. Audit only; never
    /// used for valuation.
    pub entry_call_price: Decimal,
    pub entry_put_price: Decimal,
    pub start_date: NaiveDate,
}

impl Position {
    /// Days elapsed since this month's tracking began, counting the start
    /// day itself (never below 1).
    #[must_use]
    pub fn days_running(&self, today: NaiveDate) -> i64 {
        ((today - self.start_date).num_days() + 1).max(1)
    }
}

/// Sanity bounds on the underlying's price. The tracked ETF has traded
/// between 2 and 4 yuan for years; anything outside (1, 5) is a bad quote.
#[must_use]
pub fn plausible_underlying_price(price: Decimal) -> bool {
    price > Decimal::ONE && price < Decimal::from(5)
}

/// Sanity bounds on an option premium: positive and below the underlying's
/// own plausible range.
#[must_use]
pub fn plausible_premium(premium: Decimal) -> bool {
    premium >= Decimal::new(1, 4) && premium < Decimal::from(5)
}
