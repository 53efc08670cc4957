//! Asset ↔ share conversion against a pool's totals.
//!
//! Total assets are always `reserve_a + reserve_b` (see [`Market::total_assets`]);
//! deposits convert with [`Rounding::Down`] on shares, redemptions with
//! [`Rounding::Up`] on shares, so conversions never favour the caller.
//!
//! [`Market::total_assets`]: crate::state::Market::total_assets

use crate::{
    error::{require, PoolError, Result},
    math::{mul_div, Rounding},
};

/// Shares worth `assets`. An empty pool (`total_shares == 0`) converts 1:1,
/// so the first deposit sets the exchange rate.
pub fn to_shares(
    assets: u128,
    total_assets: u128,
    total_shares: u128,
    rounding: Rounding,
) -> Result<u128> {
    if total_shares == 0 {
        return Ok(assets);
    }
    mul_div(assets, total_shares, total_assets, rounding)
}

/// Assets claimed by `shares`. Fails when no shares exist.
pub fn to_assets(
    shares: u128,
    total_assets: u128,
    total_shares: u128,
    rounding: Rounding,
) -> Result<u128> {
    require!(total_shares != 0, PoolError::InsufficientShares);
    mul_div(shares, total_assets, total_shares, rounding)
}
