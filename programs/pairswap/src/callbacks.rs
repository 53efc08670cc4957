//! Caller-side hooks invoked synchronously in the middle of an operation.
//!
//! Hooks receive the pool mutably: by the time they run, the operation's own
//! effects are already written, so re-entrant calls see consistent state. A
//! hook's only contract is to make the required funds available before the
//! pool pulls them.

use crate::{error::Result, ledger::TokenLedger, state::Address, Pool};

pub trait SupplyCallback<L: TokenLedger> {
    /// Called after shares are credited and before `assets_a` / `assets_b`
    /// are pulled from the caller.
    fn on_supply(
        &mut self,
        pool: &mut Pool<L>,
        assets_a: u128,
        assets_b: u128,
        data: &[u8],
    ) -> Result<()>;
}

pub trait FlashLoanCallback<L: TokenLedger> {
    /// Called while the caller holds the loan; `amount` of `token` is pulled
    /// back right after this returns.
    fn on_flash_loan(
        &mut self,
        pool: &mut Pool<L>,
        token: &Address,
        amount: u128,
        data: &[u8],
    ) -> Result<()>;
}
