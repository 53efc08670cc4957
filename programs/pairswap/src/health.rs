//! Liquidity-health oracle.
//!
//! One rule per market, chosen by its params: markets with a rate model ask
//! the model; markets without one use the fixed band
//! `0.5 ≤ reserve_b · price / reserve_a ≤ 2` with both reserves non-zero.

use tracing::debug;

use crate::{
    constants::{HEALTH_RATIO_MAX_WAD, HEALTH_RATIO_MIN_WAD},
    error::{PoolError, Result},
    math::{cross_le, mul_div, Rounding},
    rate_model::RateModel,
    state::{Market, MarketParams},
};

/// `reserve_b · price / reserve_a`, WAD-scaled. `None` when `reserve_a` is
/// zero or the ratio does not fit in 128 bits.
pub fn ratio_wad(market: &Market, price: u128) -> Option<u128> {
    if market.reserve_a == 0 {
        return None;
    }
    mul_div(market.reserve_b, price, market.reserve_a, Rounding::Down).ok()
}

/// Band membership, decided on exact cross products so no rounding of the
/// ratio can pull a market back inside either bound.
pub fn within_band(market: &Market, price: u128) -> bool {
    let Market { reserve_a, reserve_b, .. } = *market;
    reserve_a > 0
        && reserve_b > 0
        && cross_le(HEALTH_RATIO_MIN_WAD, reserve_a, reserve_b, price)
        && cross_le(reserve_b, price, HEALTH_RATIO_MAX_WAD, reserve_a)
}

/// How far the ratio sits outside the band; zero inside it. Never zero for
/// a market outside the band.
pub fn distance_from_band(market: &Market, price: u128) -> u128 {
    if within_band(market, price) {
        return 0;
    }
    match ratio_wad(market, price) {
        None => u128::MAX,
        Some(ratio) if ratio < HEALTH_RATIO_MIN_WAD => HEALTH_RATIO_MIN_WAD - ratio,
        Some(_) => match mul_div(market.reserve_b, price, market.reserve_a, Rounding::Up) {
            Ok(ratio) => ratio.saturating_sub(HEALTH_RATIO_MAX_WAD).max(1),
            Err(_) => u128::MAX,
        },
    }
}

pub fn is_healthy(params: &MarketParams, market: &Market, model: Option<&dyn RateModel>) -> bool {
    match model {
        Some(model) => model.is_healthy(params, market),
        None => within_band(market, params.reference_price),
    }
}

pub fn imbalance(params: &MarketParams, market: &Market, model: Option<&dyn RateModel>) -> Option<u128> {
    match model {
        Some(model) => model.imbalance(params, market),
        None => Some(distance_from_band(market, params.reference_price)),
    }
}

/// Gate a state transition. An unhealthy result is rejected unless the market
/// was already unhealthy and the transition strictly reduces its imbalance.
pub fn check_transition(
    params: &MarketParams,
    before: &Market,
    after: &Market,
    model: Option<&dyn RateModel>,
) -> Result<()> {
    if is_healthy(params, after, model) {
        return Ok(());
    }
    if !is_healthy(params, before, model) {
        if let (Some(prev), Some(next)) = (imbalance(params, before, model), imbalance(params, after, model)) {
            if next < prev {
                debug!(market = %params.id(), prev, next, "unhealthy market moving back toward band");
                return Ok(());
            }
        }
    }
    debug!(
        market = %params.id(),
        reserve_a = after.reserve_a,
        reserve_b = after.reserve_b,
        "rejecting unhealthy transition"
    );
    Err(PoolError::LiquidityUnhealthy)
}

/// Gate a supply or withdrawal. Moving liquidity proportionally cannot fix
/// an unhealthy market, so one that is already unhealthy is left alone; a
/// healthy one must stay healthy unless the change empties it.
pub fn check_liquidity_change(
    params: &MarketParams,
    before: &Market,
    after: &Market,
    model: Option<&dyn RateModel>,
) -> Result<()> {
    if after.total_shares == 0 || !is_healthy(params, before, model) || is_healthy(params, after, model) {
        return Ok(());
    }
    debug!(
        market = %params.id(),
        reserve_a = after.reserve_a,
        reserve_b = after.reserve_b,
        "rejecting liquidity change that leaves the band"
    );
    Err(PoolError::LiquidityUnhealthy)
}
