use tracing::info;

use crate::{
    error::{require, PoolError, Result},
    ledger::TokenLedger,
    state::{Address, Market, MarketId, MarketParams, MarketRecord},
    Pool,
};

/// Register a market under the hash of its params. Permissionless.
/// The market starts empty, stamped with the current time and the pool's
/// default fee.
pub fn handler<L: TokenLedger>(
    pool: &mut Pool<L>,
    caller: &Address,
    params: MarketParams,
) -> Result<MarketId> {
    require!(
        !params.asset_a.is_zero() && !params.asset_b.is_zero(),
        PoolError::ZeroAddress
    );
    require!(
        params.asset_a != params.asset_b,
        PoolError::InconsistentInput("market assets must differ")
    );
    require!(params.reference_price > 0, PoolError::ZeroAmount);
    if let Some(model) = params.rate_model {
        require!(
            pool.state.rate_models.contains_key(&model),
            PoolError::RateModelNotEnabled(model)
        );
    }

    let id = params.id();
    require!(
        !pool.state.markets.contains_key(&id),
        PoolError::MarketAlreadyExists(id)
    );

    let market = Market {
        last_update: pool.now(),
        fee_rate_wad: pool.state.default_fee_wad,
        ..Market::default()
    };
    pool.insert_market(id, MarketRecord { params, market });

    info!(
        market = %id,
        creator = %caller,
        asset_a = %params.asset_a,
        asset_b = %params.asset_b,
        reference_price = params.reference_price,
        "market created"
    );
    Ok(id)
}
