use tracing::info;

use crate::{
    error::{require, PoolError, Result},
    health,
    instructions::swap_math::{compute_swap_out, fixed_rate, SwapAmounts},
    ledger::TokenLedger,
    math::{self, Rounding},
    rate_model::RateModel,
    state::{Address, Market, MarketId, MarketParams, MarketRecord, SwapReceipt},
    Pool,
};

/// Exact-output counterpart of [`super::swap_in::price`].
pub fn price(
    params: &MarketParams,
    market: &Market,
    model: Option<&dyn RateModel>,
    amount_out: u128,
    max_amount_in: u128,
    view: bool,
) -> Result<(SwapAmounts, Market)> {
    require!(amount_out > 0, PoolError::ZeroAmount);
    let rate = match model {
        Some(model) if view => model.swap_rate_out_view(params, market, amount_out)?,
        Some(model) => model.swap_rate_out(params, market, amount_out)?,
        None => fixed_rate(params.reference_price, Rounding::Up)?,
    };
    let swap = compute_swap_out(amount_out, rate, market.fee_rate_wad, market.reserve_a, max_amount_in)?;

    let mut next = *market;
    next.reserve_a = math::sub(market.reserve_a, swap.amount_out)?;
    next.reserve_b = math::add(market.reserve_b, swap.amount_in)?;
    health::check_transition(params, market, &next, model)?;
    Ok((swap, next))
}

/// Buy exactly `amount_out` of asset A with asset B.
pub fn handler<L: TokenLedger>(
    pool: &mut Pool<L>,
    caller: &Address,
    market_id: &MarketId,
    amount_out: u128,
    max_amount_in: u128,
    receiver: &Address,
) -> Result<SwapReceipt> {
    require!(!receiver.is_zero(), PoolError::ZeroAddress);

    let MarketRecord { params, market } = pool.record(market_id)?;
    let model = pool.rate_model_for(&params)?;
    let (swap, mut next) = price(&params, &market, model.as_deref(), amount_out, max_amount_in, false)?;
    next.last_update = pool.now();

    pool.store_market(market_id, next)?;
    pool.pull(caller, &params.asset_b, swap.amount_in)?;
    pool.push(receiver, &params.asset_a, swap.amount_out)?;

    if let Some(model) = model {
        pool.queue_price_update(model, market_id, &params, &next, swap.amount_in, swap.amount_out, false);
    }

    info!(
        market = %market_id,
        amount_in = swap.amount_in,
        amount_out = swap.amount_out,
        fee = swap.fee,
        "exact swap out"
    );
    Ok(swap.into())
}

pub fn quote<L: TokenLedger>(pool: &Pool<L>, market_id: &MarketId, amount_out: u128) -> Result<SwapReceipt> {
    let MarketRecord { params, market } = pool.record(market_id)?;
    let model = pool.rate_model_for(&params)?;
    let (swap, _) = price(&params, &market, model.as_deref(), amount_out, u128::MAX, true)?;
    Ok(swap.into())
}
