//! Valuation and return arithmetic.
//!
//! All monetary aggregates are integer yuan, truncated (not rounded) at
//! each step. The legacy ledger files were written with exactly this
//! convention and recovered state is compared against them, so the
//! truncation points must not move.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Truncate a monetary amount to whole yuan.
#[must_use]
pub fn truncate_to_yuan(value: Decimal) -> i64 {
    value.trunc().to_i64().unwrap_or(0)
}

/// Current market value of both legs: Σ(quantity × premium × multiplier),
/// truncated once over the sum.
#[must_use]
pub fn position_value(
    call_quantity: u32,
    call_premium: Decimal,
    put_quantity: u32,
    put_premium: Decimal,
    multiplier: Decimal,
) -> i64 {
    let call = Decimal::from(call_quantity) * call_premium * multiplier;
    let put = Decimal::from(put_quantity) * put_premium * multiplier;
    truncate_to_yuan(call + put)
}

/// Per-month figure: leg value plus the month's residual cost. No carry
/// from prior months.
#[must_use]
pub const fn monthly_total_return(position_value: i64, residual_cost: i64) -> i64 {
    position_value + residual_cost
}

/// Master-ledger figure: adds the carried baseline from the previous
/// month's final valuation, producing a continuous equity curve.
#[must_use]
pub const fn master_total_return(
    position_value: i64,
    residual_cost: i64,
    carried_baseline: i64,
) -> i64 {
    position_value + residual_cost + carried_baseline
}

/// Annualized return in percent, rounded to 4 decimal places:
/// `((total_return / cost) − 1) / days × 365 × 100`.
///
/// Zero when cost or elapsed days are not positive.
#[must_use]
pub fn annualized_return(total_return: i64, cost: i64, days: i64) -> Decimal {
    if cost <= 0 || days <= 0 {
        return Decimal::ZERO;
    }
    let ratio = Decimal::from(total_return) / Decimal::from(cost) - Decimal::ONE;
    (ratio / Decimal::from(days) * Decimal::from(365) * Decimal::from(100)).round_dp(4)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn position_value_truncates_the_sum() {
        // 5 × 0.0095 × 10000 = 475, 10 × 0.0046 × 10000 = 460.
        assert_eq!(position_value(5, dec!(0.0095), 10, dec!(0.0046), dec!(10000)), 935);
        // Fractional products truncate rather than round.
        assert_eq!(position_value(3, dec!(0.00333), 0, dec!(0), dec!(10000)), 99);
    }

    #[test]
    fn monthly_and_master_returns_compose() {
        let value = position_value(5, dec!(0.0100), 10, dec!(0.0050), dec!(10000));
        assert_eq!(value, 1000);
        assert_eq!(monthly_total_return(value, 65), 1065);
        assert_eq!(master_total_return(value, 65, 93), 1158);
    }

    #[test]
    fn annualized_return_matches_legacy_formula() {
        // (1100/1000 − 1) / 10 × 365 × 100 = 365%.
        assert_eq!(annualized_return(1100, 1000, 10), dec!(365.0000));
        assert_eq!(annualized_return(1000, 1000, 10), Decimal::ZERO);
        // Losing positions annualize negative.
        assert!(annualized_return(900, 1000, 10) < Decimal::ZERO);
    }

    #[test]
    fn annualized_return_guards_degenerate_inputs() {
        assert_eq!(annualized_return(1100, 0, 10), Decimal::ZERO);
        assert_eq!(annualized_return(1100, 1000, 0), Decimal::ZERO);
    }

    #[test]
    fn truncation_never_rounds_up() {
        assert_eq!(truncate_to_yuan(dec!(64.999)), 64);
        assert_eq!(truncate_to_yuan(dec!(-0.5)), 0);
    }
}
