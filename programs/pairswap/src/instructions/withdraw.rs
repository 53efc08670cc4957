use tracing::info;

use crate::{
    error::{require, PoolError, Result},
    health,
    ledger::TokenLedger,
    math::{self, mul_div, Rounding},
    shares::to_assets,
    state::{Address, Liquidity, Market, MarketId, MarketRecord, WithdrawReceipt},
    Pool,
};

/// Shares a redemption burns and the assets it pays out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedemptionPlan {
    pub shares: u128,
    pub assets_a: u128,
    pub assets_b: u128,
}

/// Price a redemption against the current market state.
///
/// Share-denominated redemptions pay each leg rounded down. Asset-denominated
/// ones are clamped to the reserve ratio the way deposits are: the leg asking
/// for the smaller fraction of its reserve is paid in full, the other leg is
/// the proportional amount rounded down, and the shares burned are rounded
/// up. A zero leg is derived from the other. Burning every outstanding share
/// always pays out the whole reserves so no assets are left without an owner.
pub fn plan(market: &Market, liquidity: Liquidity) -> Result<RedemptionPlan> {
    let total_shares = market.total_shares;
    require!(total_shares > 0, PoolError::InsufficientShares);

    let (shares, assets_a, assets_b) = match liquidity {
        Liquidity::Shares(shares) => {
            require!(shares > 0, PoolError::ZeroAmount);
            require!(shares <= total_shares, PoolError::InsufficientShares);
            (
                shares,
                to_assets(shares, market.reserve_a, total_shares, Rounding::Down)?,
                to_assets(shares, market.reserve_b, total_shares, Rounding::Down)?,
            )
        }
        Liquidity::Assets { amount_a, amount_b } => {
            require!(amount_a > 0 || amount_b > 0, PoolError::ZeroAmount);
            require!(
                amount_a <= market.reserve_a && amount_b <= market.reserve_b,
                PoolError::InsufficientLiquidity
            );
            let (reserve_a, reserve_b) = (market.reserve_a, market.reserve_b);
            // A limits when amount_a / reserve_a <= amount_b / reserve_b
            let a_limits = amount_b == 0 || (amount_a > 0 && math::cross_le(amount_a, reserve_b, amount_b, reserve_a));
            if a_limits {
                (
                    mul_div(amount_a, total_shares, reserve_a, Rounding::Up)?,
                    amount_a,
                    mul_div(amount_a, reserve_b, reserve_a, Rounding::Down)?,
                )
            } else {
                (
                    mul_div(amount_b, total_shares, reserve_b, Rounding::Up)?,
                    mul_div(amount_b, reserve_a, reserve_b, Rounding::Down)?,
                    amount_b,
                )
            }
        }
    };

    if shares == total_shares {
        return Ok(RedemptionPlan {
            shares,
            assets_a: market.reserve_a,
            assets_b: market.reserve_b,
        });
    }
    Ok(RedemptionPlan { shares, assets_a, assets_b })
}

/// Burn shares of `on_behalf` and pay `receiver`. A withdrawal may not take
/// a healthy market out of its band unless it empties the market.
pub fn handler<L: TokenLedger>(
    pool: &mut Pool<L>,
    caller: &Address,
    market_id: &MarketId,
    liquidity: Liquidity,
    on_behalf: &Address,
    receiver: &Address,
) -> Result<WithdrawReceipt> {
    require!(!receiver.is_zero(), PoolError::ZeroAddress);
    require!(pool.is_authorized(on_behalf, caller), PoolError::Unauthorized(*caller));

    let MarketRecord { params, market } = pool.record(market_id)?;
    let plan = plan(&market, liquidity)?;

    pool.debit_shares(market_id, on_behalf, plan.shares)?;
    let mut next = market;
    next.reserve_a = math::sub(market.reserve_a, plan.assets_a)?;
    next.reserve_b = math::sub(market.reserve_b, plan.assets_b)?;
    next.total_shares = market
        .total_shares
        .checked_sub(plan.shares)
        .ok_or(PoolError::InsufficientShares)?;
    next.last_update = pool.now();
    let model = pool.rate_model_for(&params)?;
    health::check_liquidity_change(&params, &market, &next, model.as_deref())?;
    pool.store_market(market_id, next)?;

    pool.push(receiver, &params.asset_a, plan.assets_a)?;
    pool.push(receiver, &params.asset_b, plan.assets_b)?;

    info!(
        market = %market_id,
        on_behalf = %on_behalf,
        shares = plan.shares,
        a = plan.assets_a,
        b = plan.assets_b,
        "liquidity withdrawn"
    );
    Ok(WithdrawReceipt {
        shares: plan.shares,
        assets_a: plan.assets_a,
        assets_b: plan.assets_b,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn market(reserve_a: u128, reserve_b: u128, total_shares: u128) -> Market {
        Market { reserve_a, reserve_b, total_shares, ..Market::default() }
    }

    #[test]
    fn share_redemption_rounds_legs_down() {
        let p = plan(&market(10, 20, 30), Liquidity::Shares(4)).unwrap();
        // 4·10/30 = 1.33, 4·20/30 = 2.67
        assert_eq!(p, RedemptionPlan { shares: 4, assets_a: 1, assets_b: 2 });
    }

    #[test]
    fn asset_redemption_is_clamped_to_the_reserve_ratio() {
        // 1 B is the smaller fraction: pays ⌊1·10/20⌋ = 0 A for ⌈30/20⌉ = 2 shares
        let p = plan(&market(10, 20, 30), Liquidity::Assets { amount_a: 1, amount_b: 1 }).unwrap();
        assert_eq!(p, RedemptionPlan { shares: 2, assets_a: 0, assets_b: 1 });

        let p = plan(&market(10, 20, 30), Liquidity::Assets { amount_a: 0, amount_b: 1 }).unwrap();
        assert_eq!(p, RedemptionPlan { shares: 2, assets_a: 0, assets_b: 1 });

        // 1 A drags 2 B along and costs ⌈30/10⌉ = 3 shares
        let p = plan(&market(10, 20, 30), Liquidity::Assets { amount_a: 1, amount_b: 0 }).unwrap();
        assert_eq!(p, RedemptionPlan { shares: 3, assets_a: 1, assets_b: 2 });
    }

    #[test]
    fn burning_everything_empties_the_reserves() {
        let p = plan(&market(10, 20, 30), Liquidity::Shares(30)).unwrap();
        assert_eq!((p.assets_a, p.assets_b), (10, 20));

        let p = plan(&market(10, 20, 30), Liquidity::Assets { amount_a: 10, amount_b: 0 }).unwrap();
        assert_eq!(p, RedemptionPlan { shares: 30, assets_a: 10, assets_b: 20 });
    }

    #[test]
    fn rejects_out_of_range_requests() {
        assert_eq!(plan(&market(10, 20, 30), Liquidity::Shares(31)), Err(PoolError::InsufficientShares));
        assert_eq!(plan(&market(0, 0, 0), Liquidity::Shares(1)), Err(PoolError::InsufficientShares));
        assert_eq!(
            plan(&market(10, 20, 30), Liquidity::Assets { amount_a: 11, amount_b: 0 }),
            Err(PoolError::InsufficientLiquidity)
        );
        assert_eq!(plan(&market(10, 20, 30), Liquidity::Shares(0)), Err(PoolError::ZeroAmount));
    }
}
