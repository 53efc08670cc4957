use tracing::info;

use crate::{
    callbacks::SupplyCallback,
    error::{require, PoolError, Result},
    health,
    ledger::TokenLedger,
    math::{self, mul_div, Rounding},
    shares::to_shares,
    state::{Address, Liquidity, Market, MarketId, MarketRecord, SupplyReceipt},
    Pool,
};

/// Assets a deposit takes and the shares it mints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepositPlan {
    pub assets_a: u128,
    pub assets_b: u128,
    /// Total shares minted, fee shares included
    pub minted: u128,
    /// Part of `minted` credited to the fee recipient
    pub fee_shares: u128,
}

/// Price a deposit against the current market state.
///
/// An empty market takes both amounts as given and mints their sum, so the
/// first depositor sets the asset ratio. Otherwise the deposit is clamped to
/// the reserve ratio: the limiting side is used in full and the other side is
/// reduced to the proportional amount, rounded up; shares are minted on the
/// combined amount, rounded down.
pub fn plan(market: &Market, liquidity: Liquidity) -> Result<DepositPlan> {
    let (assets_a, assets_b, minted) = if market.total_shares == 0 {
        let Liquidity::Assets { amount_a, amount_b } = liquidity else {
            return Err(PoolError::InconsistentInput(
                "an empty market needs both assets to set its price",
            ));
        };
        require!(amount_a > 0 && amount_b > 0, PoolError::ZeroAmount);
        let value = math::add(amount_a, amount_b)?;
        let minted = to_shares(value, market.total_assets()?, 0, Rounding::Down)?;
        (amount_a, amount_b, minted)
    } else {
        let (reserve_a, reserve_b) = (market.reserve_a, market.reserve_b);
        let total_shares = market.total_shares;
        match liquidity {
            Liquidity::Assets { amount_a, amount_b } => {
                require!(amount_a > 0 || amount_b > 0, PoolError::ZeroAmount);
                // A limits when amount_a / reserve_a <= amount_b / reserve_b
                let (used_a, used_b) = if math::cross_le(amount_a, reserve_b, amount_b, reserve_a) {
                    (amount_a, mul_div(amount_a, reserve_b, reserve_a, Rounding::Up)?)
                } else {
                    (mul_div(amount_b, reserve_a, reserve_b, Rounding::Up)?, amount_b)
                };
                let minted = to_shares(
                    math::add(used_a, used_b)?,
                    market.total_assets()?,
                    total_shares,
                    Rounding::Down,
                )?;
                (used_a, used_b, minted)
            }
            Liquidity::Shares(amount) => {
                require!(amount > 0, PoolError::ZeroAmount);
                (
                    mul_div(amount, reserve_a, total_shares, Rounding::Up)?,
                    mul_div(amount, reserve_b, total_shares, Rounding::Up)?,
                    amount,
                )
            }
        }
    };
    require!(minted > 0, PoolError::ZeroAmount);

    Ok(DepositPlan {
        assets_a,
        assets_b,
        minted,
        fee_shares: math::mul_down(minted, market.fee_rate_wad)?,
    })
}

/// Add liquidity for `on_behalf`, paid by `caller`.
///
/// Order: shares and totals are written first, then the optional callback
/// runs (it may source the funds or re-enter the pool), then assets are
/// pulled.
#[allow(clippy::too_many_arguments)]
pub fn handler<L: TokenLedger>(
    pool: &mut Pool<L>,
    caller: &Address,
    market_id: &MarketId,
    liquidity: Liquidity,
    on_behalf: &Address,
    data: &[u8],
    callback: Option<&mut dyn SupplyCallback<L>>,
) -> Result<SupplyReceipt> {
    require!(!on_behalf.is_zero(), PoolError::ZeroAddress);
    require!(
        data.is_empty() || callback.is_some(),
        PoolError::InconsistentInput("callback data without a callback")
    );

    let MarketRecord { params, market } = pool.record(market_id)?;
    let plan = plan(&market, liquidity)?;
    let fee_recipient = pool.state.fee_recipient;
    require!(
        plan.fee_shares == 0 || !fee_recipient.is_zero(),
        PoolError::ZeroAddress
    );

    let mut next = market;
    next.reserve_a = math::add(market.reserve_a, plan.assets_a)?;
    next.reserve_b = math::add(market.reserve_b, plan.assets_b)?;
    next.total_shares = math::add(market.total_shares, plan.minted)?;
    next.last_update = pool.now();

    // The first deposit sets the ratio; it must start out healthy
    let model = pool.rate_model_for(&params)?;
    if market.total_shares == 0 {
        require!(
            health::is_healthy(&params, &next, model.as_deref()),
            PoolError::LiquidityUnhealthy
        );
    } else {
        health::check_liquidity_change(&params, &market, &next, model.as_deref())?;
    }

    let shares = plan.minted - plan.fee_shares;
    pool.store_market(market_id, next)?;
    pool.credit_shares(market_id, on_behalf, shares)?;
    if plan.fee_shares > 0 {
        pool.credit_shares(market_id, &fee_recipient, plan.fee_shares)?;
    }

    if let Some(callback) = callback {
        if !data.is_empty() {
            callback.on_supply(pool, plan.assets_a, plan.assets_b, data)?;
        }
    }

    pool.pull(caller, &params.asset_a, plan.assets_a)?;
    pool.pull(caller, &params.asset_b, plan.assets_b)?;

    info!(
        market = %market_id,
        on_behalf = %on_behalf,
        shares,
        fee_shares = plan.fee_shares,
        a = plan.assets_a,
        b = plan.assets_b,
        "liquidity supplied"
    );
    Ok(SupplyReceipt {
        shares,
        fee_shares: plan.fee_shares,
        assets_a: plan.assets_a,
        assets_b: plan.assets_b,
    })
}
