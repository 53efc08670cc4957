//! Owner-gated configuration.

use std::sync::Arc;

use tracing::info;

use crate::{
    constants::MAX_FEE_WAD,
    error::{require, PoolError, Result},
    ledger::TokenLedger,
    rate_model::RateModel,
    state::{Address, MarketId},
    Pool,
};

/// Bind `address` to a rate model implementation. Re-enabling an address
/// replaces the implementation for every market naming it.
pub fn enable_rate_model<L: TokenLedger>(
    pool: &mut Pool<L>,
    caller: &Address,
    address: &Address,
    model: Arc<dyn RateModel>,
) -> Result<()> {
    pool.owner_only(caller)?;
    require!(!address.is_zero(), PoolError::ZeroAddress);
    pool.enable_model(address, model);
    info!(rate_model = %address, "rate model enabled");
    Ok(())
}

pub fn set_fee<L: TokenLedger>(
    pool: &mut Pool<L>,
    caller: &Address,
    market_id: &MarketId,
    fee_rate_wad: u128,
) -> Result<()> {
    pool.owner_only(caller)?;
    require!(fee_rate_wad <= MAX_FEE_WAD, PoolError::FeeTooHigh(fee_rate_wad));
    require!(
        fee_rate_wad == 0 || !pool.state.fee_recipient.is_zero(),
        PoolError::ZeroAddress
    );

    let mut market = pool.record(market_id)?.market;
    market.fee_rate_wad = fee_rate_wad;
    market.last_update = pool.now();
    pool.store_market(market_id, market)?;
    info!(market = %market_id, fee_rate_wad, "fee set");
    Ok(())
}

/// Clearing the recipient is only allowed while no market charges a fee.
pub fn set_fee_recipient<L: TokenLedger>(
    pool: &mut Pool<L>,
    caller: &Address,
    recipient: &Address,
) -> Result<()> {
    pool.owner_only(caller)?;
    if recipient.is_zero() {
        let charging = pool
            .state
            .markets
            .values()
            .any(|record| record.market.fee_rate_wad > 0);
        require!(!charging && pool.state.default_fee_wad == 0, PoolError::ZeroAddress);
    }
    pool.replace_fee_recipient(recipient);
    info!(recipient = %recipient, "fee recipient set");
    Ok(())
}

pub fn set_owner<L: TokenLedger>(pool: &mut Pool<L>, caller: &Address, owner: &Address) -> Result<()> {
    pool.owner_only(caller)?;
    require!(!owner.is_zero(), PoolError::ZeroAddress);
    pool.replace_owner(owner);
    info!(owner = %owner, "owner set");
    Ok(())
}
