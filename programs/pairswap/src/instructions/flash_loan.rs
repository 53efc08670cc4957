use tracing::info;

use crate::{
    callbacks::FlashLoanCallback,
    error::{require, PoolError, Result},
    ledger::TokenLedger,
    state::Address,
    Pool,
};

/// Lend `amount` of `token` out of custody for the duration of `callback`.
///
/// Fee-free. The loan is repaid by pulling `amount` back from the caller once
/// the callback returns; if the caller cannot cover it the whole operation
/// fails and nothing moves.
pub fn handler<L: TokenLedger>(
    pool: &mut Pool<L>,
    caller: &Address,
    token: &Address,
    amount: u128,
    data: &[u8],
    callback: &mut dyn FlashLoanCallback<L>,
) -> Result<()> {
    require!(amount > 0, PoolError::ZeroAmount);
    require!(!caller.is_zero(), PoolError::ZeroAddress);

    pool.push(caller, token, amount)?;
    callback.on_flash_loan(pool, token, amount, data)?;
    pool.pull(caller, token, amount)?;

    info!(token = %token, borrower = %caller, amount, "flash loan repaid");
    Ok(())
}
