use tracing::info;

use crate::{
    error::{require, PoolError, Result},
    health,
    instructions::swap_math::{compute_swap_in, fixed_rate, SwapAmounts},
    ledger::TokenLedger,
    math::{self, Rounding},
    rate_model::RateModel,
    state::{Address, Market, MarketId, MarketParams, MarketRecord, SwapReceipt},
    Pool,
};

/// Price an exact-input swap and the market it leaves behind, rejecting it
/// if it would break the market's health. `view` selects the rate model's
/// read-only quote; nothing is written either way.
pub fn price(
    params: &MarketParams,
    market: &Market,
    model: Option<&dyn RateModel>,
    amount_in: u128,
    min_amount_out: u128,
    view: bool,
) -> Result<(SwapAmounts, Market)> {
    require!(amount_in > 0, PoolError::ZeroAmount);
    let rate = match model {
        Some(model) if view => model.swap_rate_in_view(params, market, amount_in)?,
        Some(model) => model.swap_rate_in(params, market, amount_in)?,
        None => fixed_rate(params.reference_price, Rounding::Down)?,
    };
    let swap = compute_swap_in(amount_in, rate, market.fee_rate_wad, market.reserve_b, min_amount_out)?;

    let mut next = *market;
    next.reserve_a = math::add(market.reserve_a, swap.amount_in)?;
    next.reserve_b = math::sub(market.reserve_b, swap.amount_out)?;
    health::check_transition(params, market, &next, model)?;
    Ok((swap, next))
}

/// Sell exactly `amount_in` of asset A for asset B.
pub fn handler<L: TokenLedger>(
    pool: &mut Pool<L>,
    caller: &Address,
    market_id: &MarketId,
    amount_in: u128,
    min_amount_out: u128,
    receiver: &Address,
) -> Result<SwapReceipt> {
    require!(!receiver.is_zero(), PoolError::ZeroAddress);

    let MarketRecord { params, market } = pool.record(market_id)?;
    let model = pool.rate_model_for(&params)?;
    let (swap, mut next) = price(&params, &market, model.as_deref(), amount_in, min_amount_out, false)?;
    next.last_update = pool.now();

    pool.store_market(market_id, next)?;
    pool.pull(caller, &params.asset_a, swap.amount_in)?;
    pool.push(receiver, &params.asset_b, swap.amount_out)?;

    if let Some(model) = model {
        pool.queue_price_update(model, market_id, &params, &next, swap.amount_in, swap.amount_out, true);
    }

    info!(
        market = %market_id,
        amount_in = swap.amount_in,
        amount_out = swap.amount_out,
        fee = swap.fee,
        "exact swap in"
    );
    Ok(swap.into())
}

/// Outcome of `handler` against the current state, without executing it.
pub fn quote<L: TokenLedger>(pool: &Pool<L>, market_id: &MarketId, amount_in: u128) -> Result<SwapReceipt> {
    let MarketRecord { params, market } = pool.record(market_id)?;
    let model = pool.rate_model_for(&params)?;
    let (swap, _) = price(&params, &market, model.as_deref(), amount_in, 0, true)?;
    Ok(swap.into())
}
