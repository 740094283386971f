//! Strike-grid construction and out-of-the-money leg selection.
//!
//! The tradeable strikes arrive as live contract codes with their strike
//! prices. Selection builds a sorted distinct grid per side, filters out
//! non-standard (post-dividend-adjustment) strikes, locates at-the-money,
//! and steps the configured number of grid positions outward to find each
//! leg's target strike.

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{debug, warn};

use otm_tracker_core::config::TrackerConfig;
use otm_tracker_core::{ContractLeg, OptionRight};

/// Strike comparisons tolerate feed rounding up to one ten-thousandth.
const STRIKE_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 4);

#[derive(Error, Debug)]
pub enum SelectionError {
    /// No tradeable contracts on one side at all.
    #[error("no {0} strikes available")]
    NoStrikes(OptionRight),

    /// At-the-money plus the configured step count runs off the grid.
    #[error("grid too short to step {steps} out-of-the-money from index {atm} ({side}, {available} strikes)")]
    InsufficientStrikes {
        side: OptionRight,
        atm: usize,
        steps: usize,
        available: usize,
    },
}

/// Both chosen legs plus the grid targets they were matched against.
#[derive(Debug, Clone)]
pub struct SelectedLegs {
    pub call: ContractLeg,
    pub put: ContractLeg,
    pub call_target: Decimal,
    pub put_target: Decimal,
}

/// True when `strike` sits on the official grid: an integer multiple of
/// `step` within tolerance.
#[must_use]
pub fn is_standard_strike(strike: Decimal, step: Decimal) -> bool {
    if step <= Decimal::ZERO {
        return false;
    }
    let nearest = (strike / step).round() * step;
    (strike - nearest).abs() <= STRIKE_TOLERANCE
}

/// The exchange's full strike grid for the underlying: 0.05 spacing up to
/// 3 yuan, 0.10 up to 5, 0.25 up to 10. Used to sanity-check recovered
/// strikes.
#[must_use]
pub fn canonical_grid() -> Vec<Decimal> {
    let mut grid = Vec::new();
    let mut strike = Decimal::ONE;
    while strike <= Decimal::from(3) {
        grid.push(strike);
        strike += Decimal::new(5, 2);
    }
    let mut strike = Decimal::from(3) + Decimal::new(10, 2);
    while strike <= Decimal::from(5) {
        grid.push(strike);
        strike += Decimal::new(10, 2);
    }
    let mut strike = Decimal::from(5) + Decimal::new(25, 2);
    while strike <= Decimal::from(10) {
        grid.push(strike);
        strike += Decimal::new(25, 2);
    }
    grid
}

/// True when `strike` is within tolerance of some canonical grid point.
#[must_use]
pub fn on_canonical_grid(strike: Decimal) -> bool {
    canonical_grid()
        .iter()
        .any(|g| (strike - g).abs() <= STRIKE_TOLERANCE)
}

/// Picks both out-of-the-money legs around `reference`.
///
/// The call steps `call_otm_level` grid positions above at-the-money, the
/// put `put_otm_level` below, each on its own side's grid. A chosen
/// contract further than one grid step from its target is logged but
/// accepted.
pub fn select_legs(
    reference: Decimal,
    calls: &[ContractLeg],
    puts: &[ContractLeg],
    config: &TrackerConfig,
) -> Result<SelectedLegs, SelectionError> {
    let (call, call_target) =
        select_side(reference, calls, OptionRight::Call, config.call_otm_level, config)?;
    let (put, put_target) =
        select_side(reference, puts, OptionRight::Put, config.put_otm_level, config)?;
    debug!(
        reference = %reference,
        call_code = %call.code,
        call_strike = %call.strike,
        put_code = %put.code,
        put_strike = %put.strike,
        "Selected out-of-the-money legs"
    );
    Ok(SelectedLegs {
        call,
        put,
        call_target,
        put_target,
    })
}

fn select_side(
    reference: Decimal,
    contracts: &[ContractLeg],
    side: OptionRight,
    steps: usize,
    config: &TrackerConfig,
) -> Result<(ContractLeg, Decimal), SelectionError> {
    let grid = strike_grid(contracts, config);
    if grid.is_empty() {
        return Err(SelectionError::NoStrikes(side));
    }

    let atm = atm_index(&grid, reference);
    let target_index = match side {
        OptionRight::Call => atm.checked_add(steps).filter(|i| *i < grid.len()),
        OptionRight::Put => atm.checked_sub(steps),
    }
    .ok_or(SelectionError::InsufficientStrikes {
        side,
        atm,
        steps,
        available: grid.len(),
    })?;
    let target = grid[target_index];

    // Nearest tradeable contract to the target strike; ties keep the
    // first listed code.
    let chosen = contracts
        .iter()
        .min_by_key(|c| (c.strike - target).abs())
        .ok_or(SelectionError::NoStrikes(side))?
        .clone();

    let deviation = (chosen.strike - target).abs();
    if deviation > config.standard_strike_step {
        warn!(
            side = %side,
            target = %target,
            chosen = %chosen.strike,
            code = %chosen.code,
            "Chosen contract deviates more than one grid step from target"
        );
    }

    Ok((chosen, target))
}

/// The sorted distinct strike grid for one side. Non-standard strikes are
/// dropped unless that leaves fewer than `min_standard_strikes`, in which
/// case the unfiltered list is used (a heavily-adjusted month is better
/// tracked than not tracked).
fn strike_grid(contracts: &[ContractLeg], config: &TrackerConfig) -> Vec<Decimal> {
    let mut all: Vec<Decimal> = contracts.iter().map(|c| c.strike).collect();
    all.sort();
    all.dedup();

    let standard: Vec<Decimal> = all
        .iter()
        .copied()
        .filter(|s| is_standard_strike(*s, config.standard_strike_step))
        .collect();

    if standard.len() >= config.min_standard_strikes {
        standard
    } else {
        all
    }
}

/// Index of the strike closest to `reference`; ties keep the lower strike.
fn atm_index(grid: &[Decimal], reference: Decimal) -> usize {
    let mut best = 0;
    let mut best_distance = (grid[0] - reference).abs();
    for (index, strike) in grid.iter().enumerate().skip(1) {
        let distance = (strike - reference).abs();
        if distance < best_distance {
            best = index;
            best_distance = distance;
        }
    }
    best
}
