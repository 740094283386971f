//! Quantity and cost-basis fixing at position inception.
//!
//! Each leg buys as many contracts as its half of the monthly budget
//! affords at the observed premium; whatever the two legs leave unspent
//! becomes the month's residual cost. Residual and spent amounts are
//! integer-truncated yuan, matching the ledger's historical convention.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::info;

use otm_tracker_core::config::TrackerConfig;
use otm_tracker_core::valuation::truncate_to_yuan;
use otm_tracker_core::OptionRight;

#[derive(Error, Debug)]
pub enum SizingError {
    /// A premium at or below zero cannot price a position.
    #[error("non-positive {side} premium: {premium}")]
    BadPremium { side: OptionRight, premium: Decimal },

    /// The computed count breached the per-leg sanity ceiling.
    #[error("{side} quantity {quantity} exceeds ceiling {ceiling}")]
    QuantityOutOfBounds {
        side: OptionRight,
        quantity: u64,
        ceiling: u32,
    },
}

/// The frozen outcome of quantity fixing. Pure function of the premiums
/// and budgets, so refixing with equal inputs yields equal output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedQuantities {
    pub call_quantity: u32,
    pub put_quantity: u32,
    /// Budget left unspent after both legs, in whole yuan.
    pub residual: i64,
}

/// Fixes both leg quantities and the month's residual cost.
pub fn fix_quantities(
    call_premium: Decimal,
    put_premium: Decimal,
    config: &TrackerConfig,
) -> Result<FixedQuantities, SizingError> {
    let call_quantity = leg_quantity(
        OptionRight::Call,
        config.call_budget,
        call_premium,
        config,
    )?;
    let put_quantity = leg_quantity(OptionRight::Put, config.put_budget, put_premium, config)?;

    let spent = Decimal::from(call_quantity) * call_premium * config.contract_multiplier
        + Decimal::from(put_quantity) * put_premium * config.contract_multiplier;
    let residual = config.monthly_budget - truncate_to_yuan(spent);

    info!(
        call_quantity,
        put_quantity,
        residual,
        call_premium = %call_premium,
        put_premium = %put_premium,
        "Fixed position quantities"
    );

    Ok(FixedQuantities {
        call_quantity,
        put_quantity,
        residual,
    })
}

/// `floor(budget / (premium × multiplier))`, bounded by the sanity ceiling.
fn leg_quantity(
    side: OptionRight,
    budget: i64,
    premium: Decimal,
    config: &TrackerConfig,
) -> Result<u32, SizingError> {
    if premium <= Decimal::ZERO {
        return Err(SizingError::BadPremium { side, premium });
    }

    let per_contract = premium * config.contract_multiplier;
    let quantity = (Decimal::from(budget) / per_contract)
        .floor()
        .to_u64()
        .unwrap_or(u64::MAX);

    if quantity > u64::from(config.max_contracts) {
        return Err(SizingError::QuantityOutOfBounds {
            side,
            quantity,
            ceiling: config.max_contracts,
        });
    }

    // Ceiling fits in u32, so the cast is lossless.
    Ok(quantity as u32)
}
