//! Pluggable swap-rate models.
//!
//! A market names its model by address in [`MarketParams::rate_model`]; the
//! owner maps that address to an implementation with `enable_rate_model`.
//! Markets without a model price at the fixed reference price.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::{
    constants::WAD,
    health,
    math::{self, Rounding},
    state::{Market, MarketId, MarketParams},
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct RateModelError(pub String);

impl RateModelError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

/// Exchange-rate and health collaborator.
///
/// Rates are WAD-scaled units of the output asset per unit of the input
/// asset. `swap_rate_in` prices asset A in / asset B out; `swap_rate_out`
/// prices the B paid per unit of A received.
pub trait RateModel: Send + Sync {
    fn swap_rate_in(
        &self,
        params: &MarketParams,
        market: &Market,
        amount_in: u128,
    ) -> Result<u128, RateModelError>;

    fn swap_rate_out(
        &self,
        params: &MarketParams,
        market: &Market,
        amount_out: u128,
    ) -> Result<u128, RateModelError>;

    /// Non-mutating variant used by quotes.
    fn swap_rate_in_view(
        &self,
        params: &MarketParams,
        market: &Market,
        amount_in: u128,
    ) -> Result<u128, RateModelError> {
        self.swap_rate_in(params, market, amount_in)
    }

    /// Non-mutating variant used by quotes.
    fn swap_rate_out_view(
        &self,
        params: &MarketParams,
        market: &Market,
        amount_out: u128,
    ) -> Result<u128, RateModelError> {
        self.swap_rate_out(params, market, amount_out)
    }

    fn is_healthy(&self, params: &MarketParams, market: &Market) -> bool;

    /// Distance from health, when the model can measure it. Lets a swap out
    /// of an unhealthy market through if it reduces the imbalance.
    fn imbalance(&self, _params: &MarketParams, _market: &Market) -> Option<u128> {
        None
    }

    /// Executed-trade notification. Best effort: the engine logs and ignores
    /// failures.
    fn update_price(
        &self,
        params: &MarketParams,
        market: &Market,
        amount_in: u128,
        amount_out: u128,
        is_swap_in: bool,
    ) -> Result<(), RateModelError>;
}

// ─── Constant product ──────────────────────────────────────────────────────
// x · y = k pricing against the market's own reserves, with health measured
// against an anchor price that follows executed trades.
#[derive(Debug, Default)]
pub struct ConstantProduct {
    /// Last execution price per market (B valued in A, WAD-scaled)
    anchors: Mutex<HashMap<MarketId, u128>>,
}

impl ConstantProduct {
    pub fn new() -> Self {
        Self::default()
    }

    /// Anchor price for a market: the last execution price, or the market's
    /// reference price before its first trade.
    pub fn anchor(&self, params: &MarketParams) -> u128 {
        self.anchors
            .lock()
            .get(&params.id())
            .copied()
            .unwrap_or(params.reference_price)
    }
}

impl RateModel for ConstantProduct {
    fn swap_rate_in(
        &self,
        _params: &MarketParams,
        market: &Market,
        amount_in: u128,
    ) -> Result<u128, RateModelError> {
        if market.reserve_a == 0 || market.reserve_b == 0 {
            return Err(RateModelError::new("empty reserves"));
        }
        // out = y · dx / (x + dx)  ⇒  rate = y · WAD / (x + dx)
        let denominator = market
            .reserve_a
            .checked_add(amount_in)
            .ok_or_else(|| RateModelError::new("reserve overflow"))?;
        math::mul_div(market.reserve_b, WAD, denominator, Rounding::Down)
            .map_err(|e| RateModelError::new(e.to_string()))
    }

    fn swap_rate_out(
        &self,
        _params: &MarketParams,
        market: &Market,
        amount_out: u128,
    ) -> Result<u128, RateModelError> {
        if amount_out >= market.reserve_a {
            return Err(RateModelError::new("output exceeds reserve"));
        }
        // in = y · dx / (x − dx)  ⇒  rate = y · WAD / (x − dx), rounded up
        math::mul_div(market.reserve_b, WAD, market.reserve_a - amount_out, Rounding::Up)
            .map_err(|e| RateModelError::new(e.to_string()))
    }

    fn is_healthy(&self, params: &MarketParams, market: &Market) -> bool {
        health::within_band(market, self.anchor(params))
    }

    fn imbalance(&self, params: &MarketParams, market: &Market) -> Option<u128> {
        Some(health::distance_from_band(market, self.anchor(params)))
    }

    fn update_price(
        &self,
        params: &MarketParams,
        _market: &Market,
        amount_in: u128,
        amount_out: u128,
        is_swap_in: bool,
    ) -> Result<(), RateModelError> {
        // A paid per B: swap-in pays A for B, swap-out pays B for A
        let (a_leg, b_leg) = if is_swap_in {
            (amount_in, amount_out)
        } else {
            (amount_out, amount_in)
        };
        let price = math::div_down(a_leg, b_leg).map_err(|e| RateModelError::new(e.to_string()))?;
        if price == 0 {
            return Err(RateModelError::new("execution price rounds to zero"));
        }
        self.anchors.lock().insert(params.id(), price);
        Ok(())
    }
}
