//! Swap simulation and liquidity previews.
//!
//! Every figure comes from the engine's own functions, run against a
//! snapshot instead of a live pool, so estimates match execution exactly.

use pairswap::{
    health,
    instructions::{
        supply::{self, DepositPlan},
        swap_in, swap_out,
        swap_math::SwapAmounts,
        withdraw,
    },
    math, Liquidity, Market, PoolError, SupplyReceipt, WithdrawReceipt,
};

use crate::error::{Error, Result};
use crate::state::MarketSnapshot;
use crate::types::{SimulateResult, SwapKind};

// ─── Swaps ────────────────────────────────────────────────────────────────────

/// Simulate `exact_swap_in` on a fixed-price market.
pub fn simulate_swap_in(snapshot: &MarketSnapshot, amount_in: u128, min_amount_out: u128) -> Result<SimulateResult> {
    fixed_price_only(snapshot)?;
    let (swap, after) = swap_in::price(&snapshot.params, &snapshot.market, None, amount_in, min_amount_out, true)?;
    finish(snapshot, SwapKind::ExactIn, swap, after)
}

/// Simulate `exact_swap_out` on a fixed-price market.
pub fn simulate_swap_out(snapshot: &MarketSnapshot, amount_out: u128, max_amount_in: u128) -> Result<SimulateResult> {
    fixed_price_only(snapshot)?;
    let (swap, after) = swap_out::price(&snapshot.params, &snapshot.market, None, amount_out, max_amount_in, true)?;
    finish(snapshot, SwapKind::ExactOut, swap, after)
}

fn fixed_price_only(snapshot: &MarketSnapshot) -> Result<()> {
    match snapshot.params.rate_model {
        Some(_) => Err(Error::RateModelMarket(snapshot.id)),
        None => Ok(()),
    }
}

fn finish(snapshot: &MarketSnapshot, kind: SwapKind, swap: SwapAmounts, after: Market) -> Result<SimulateResult> {
    let params = &snapshot.params;
    let effective_rate = if swap.amount_in == 0 {
        0.0
    } else {
        swap.amount_out as f64 / swap.amount_in as f64
    };

    Ok(SimulateResult {
        market: snapshot.id,
        kind,
        amount_in: swap.amount_in,
        gross_out: swap.gross_out,
        fee: swap.fee,
        amount_out: swap.amount_out,
        fee_rate_wad: snapshot.market.fee_rate_wad,
        effective_rate,
        reserve_a_after: after.reserve_a,
        reserve_b_after: after.reserve_b,
        healthy_after: health::within_band(&after, params.reference_price),
    })
}

// ─── Liquidity ────────────────────────────────────────────────────────────────

/// Shares and asset legs a supply would produce.
///
/// Fixed-price markets are also health-checked the way the engine checks
/// them; for rate-model markets that check needs live model state and is
/// skipped.
pub fn preview_supply(snapshot: &MarketSnapshot, liquidity: Liquidity) -> Result<SupplyReceipt> {
    let market = snapshot.market;
    let DepositPlan { assets_a, assets_b, minted, fee_shares } = supply::plan(&market, liquidity)?;

    if snapshot.params.rate_model.is_none() {
        let after = Market {
            reserve_a: math::add(market.reserve_a, assets_a)?,
            reserve_b: math::add(market.reserve_b, assets_b)?,
            total_shares: math::add(market.total_shares, minted)?,
            ..market
        };
        if market.total_shares == 0 {
            if !health::within_band(&after, snapshot.params.reference_price) {
                return Err(PoolError::LiquidityUnhealthy.into());
            }
        } else {
            health::check_liquidity_change(&snapshot.params, &market, &after, None)?;
        }
    }

    Ok(SupplyReceipt {
        shares: minted - fee_shares,
        fee_shares,
        assets_a,
        assets_b,
    })
}

/// Shares burned and assets paid by a withdrawal. Health is checked for
/// fixed-price markets only, as with supplies.
pub fn preview_withdraw(snapshot: &MarketSnapshot, liquidity: Liquidity) -> Result<WithdrawReceipt> {
    let market = snapshot.market;
    let plan = withdraw::plan(&market, liquidity)?;
    if snapshot.params.rate_model.is_none() {
        let after = Market {
            reserve_a: math::sub(market.reserve_a, plan.assets_a)?,
            reserve_b: math::sub(market.reserve_b, plan.assets_b)?,
            total_shares: math::sub(market.total_shares, plan.shares)?,
            ..market
        };
        health::check_liquidity_change(&snapshot.params, &market, &after, None)?;
    }
    Ok(WithdrawReceipt {
        shares: plan.shares,
        assets_a: plan.assets_a,
        assets_b: plan.assets_b,
    })
}
