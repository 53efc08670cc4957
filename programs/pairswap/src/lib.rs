//! Pairswap — two-asset liquidity pool with an integrated swap engine.
//!
//! Entry points:
//!   create_market              — register a market under the hash of its params
//!   supply / withdraw          — add or remove proportional liquidity for shares
//!   exact_swap_in              — fixed amount of asset A in, asset B out
//!   exact_swap_out             — fixed amount of asset A out, asset B in
//!   flash_loan                 — single-operation uncollateralized loan
//!   set_authorization[_with_sig] — delegate withdrawals to another address
//!   enable_rate_model, set_fee, set_fee_recipient, set_owner — owner-gated
//!
//! Every mutating entry point runs atomically: on error every write it made,
//! token balances included, is undone. Rate models hear about a swap only
//! once the outermost entry point that executed it has succeeded.

pub mod auth;
pub mod callbacks;
pub mod clock;
pub mod config;
pub mod constants;
pub mod error;
pub mod health;
pub mod instructions;
mod journal;
pub mod ledger;
pub mod math;
pub mod rate_model;
pub mod shares;
pub mod state;

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

pub use auth::Authorization;
pub use callbacks::{FlashLoanCallback, SupplyCallback};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::PoolConfig;
pub use constants::*;
pub use error::{PoolError, Result};
pub use ledger::{InMemoryLedger, TokenLedger, TransferError};
pub use rate_model::{ConstantProduct, RateModel, RateModelError};
pub use state::*;

use error::require;
use journal::{Journal, PriceUpdate, Undo};
use tracing::warn;

// ─── Pool state ────────────────────────────────────────────────────────────
// Everything an operation may mutate. Handlers write through the journaled
// helpers on `Pool` so a failed entry point can undo exactly what it touched.
pub(crate) struct PoolState<L> {
    pub(crate) markets: HashMap<MarketId, MarketRecord>,
    pub(crate) positions: HashMap<(MarketId, Address), Position>,
    /// (authorizer, authorized) pairs currently granted
    pub(crate) authorizations: HashSet<(Address, Address)>,
    pub(crate) nonces: auth::NonceRegistry,
    pub(crate) rate_models: HashMap<Address, Arc<dyn RateModel>>,
    pub(crate) owner: Address,
    pub(crate) fee_recipient: Address,
    pub(crate) default_fee_wad: u128,
    pub(crate) ledger: L,
}

pub struct Pool<L: TokenLedger = InMemoryLedger> {
    pub(crate) state: PoolState<L>,
    journal: Journal,
    clock: Arc<dyn Clock>,
    chain_id: u64,
    /// Ledger account holding every market's reserves
    custody: Address,
}

impl<L: TokenLedger> Pool<L> {
    pub fn new(config: PoolConfig, ledger: L, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;
        let custody = Address::derive(&[CUSTODY_SEED, &config.chain_id.to_le_bytes()]);
        Ok(Self {
            state: PoolState {
                markets: HashMap::new(),
                positions: HashMap::new(),
                authorizations: HashSet::new(),
                nonces: auth::NonceRegistry::default(),
                rate_models: HashMap::new(),
                owner: config.owner,
                fee_recipient: config.fee_recipient,
                default_fee_wad: config.default_fee_wad,
                ledger,
            },
            journal: Journal::default(),
            clock,
            chain_id: config.chain_id,
            custody,
        })
    }

    // ── Registry ─────────────────────────────────────────────────────────────

    /// Register a market. Permissionless; fails if the id already exists.
    pub fn create_market(&mut self, caller: &Address, params: MarketParams) -> Result<MarketId> {
        self.atomically(|pool| instructions::create_market::handler(pool, caller, params))
    }

    // ── Liquidity ────────────────────────────────────────────────────────────

    /// Add liquidity for `on_behalf`. When `data` is non-empty, `callback`
    /// runs after shares are credited and before assets are pulled from
    /// `caller`.
    pub fn supply(
        &mut self,
        caller: &Address,
        market_id: &MarketId,
        liquidity: Liquidity,
        on_behalf: &Address,
        data: &[u8],
        callback: Option<&mut dyn SupplyCallback<L>>,
    ) -> Result<SupplyReceipt> {
        self.atomically(|pool| {
            instructions::supply::handler(pool, caller, market_id, liquidity, on_behalf, data, callback)
        })
    }

    /// Burn shares of `on_behalf` and send the assets to `receiver`. The
    /// caller must be `on_behalf` or authorized by it.
    pub fn withdraw(
        &mut self,
        caller: &Address,
        market_id: &MarketId,
        liquidity: Liquidity,
        on_behalf: &Address,
        receiver: &Address,
    ) -> Result<WithdrawReceipt> {
        self.atomically(|pool| {
            instructions::withdraw::handler(pool, caller, market_id, liquidity, on_behalf, receiver)
        })
    }

    // ── Swaps ────────────────────────────────────────────────────────────────

    /// Sell exactly `amount_in` of asset A for at least `min_amount_out` of B.
    pub fn exact_swap_in(
        &mut self,
        caller: &Address,
        market_id: &MarketId,
        amount_in: u128,
        min_amount_out: u128,
        receiver: &Address,
    ) -> Result<SwapReceipt> {
        self.atomically(|pool| {
            instructions::swap_in::handler(pool, caller, market_id, amount_in, min_amount_out, receiver)
        })
    }

    /// Buy exactly `amount_out` of asset A for at most `max_amount_in` of B.
    pub fn exact_swap_out(
        &mut self,
        caller: &Address,
        market_id: &MarketId,
        amount_out: u128,
        max_amount_in: u128,
        receiver: &Address,
    ) -> Result<SwapReceipt> {
        self.atomically(|pool| {
            instructions::swap_out::handler(pool, caller, market_id, amount_out, max_amount_in, receiver)
        })
    }

    /// What `exact_swap_in` would pay right now. Does not mutate anything.
    pub fn quote_swap_in(&self, market_id: &MarketId, amount_in: u128) -> Result<SwapReceipt> {
        instructions::swap_in::quote(self, market_id, amount_in)
    }

    /// What `exact_swap_out` would charge right now. Does not mutate anything.
    pub fn quote_swap_out(&self, market_id: &MarketId, amount_out: u128) -> Result<SwapReceipt> {
        instructions::swap_out::quote(self, market_id, amount_out)
    }

    // ── Flash loans ──────────────────────────────────────────────────────────

    pub fn flash_loan(
        &mut self,
        caller: &Address,
        token: &Address,
        amount: u128,
        data: &[u8],
        callback: &mut dyn FlashLoanCallback<L>,
    ) -> Result<()> {
        self.atomically(|pool| instructions::flash_loan::handler(pool, caller, token, amount, data, callback))
    }

    // ── Authorization ────────────────────────────────────────────────────────

    pub fn set_authorization(&mut self, caller: &Address, authorized: &Address, is_granted: bool) -> Result<()> {
        self.atomically(|pool| instructions::authorize::handler(pool, caller, authorized, is_granted))
    }

    pub fn set_authorization_with_sig(&mut self, grant: &Authorization, signature: &[u8; 64]) -> Result<()> {
        self.atomically(|pool| instructions::authorize::with_sig_handler(pool, grant, signature))
    }

    // ── Administration ───────────────────────────────────────────────────────

    pub fn enable_rate_model(
        &mut self,
        caller: &Address,
        address: &Address,
        model: Arc<dyn RateModel>,
    ) -> Result<()> {
        self.atomically(|pool| instructions::admin::enable_rate_model(pool, caller, address, model))
    }

    pub fn set_fee(&mut self, caller: &Address, market_id: &MarketId, fee_rate_wad: u128) -> Result<()> {
        self.atomically(|pool| instructions::admin::set_fee(pool, caller, market_id, fee_rate_wad))
    }

    pub fn set_fee_recipient(&mut self, caller: &Address, recipient: &Address) -> Result<()> {
        self.atomically(|pool| instructions::admin::set_fee_recipient(pool, caller, recipient))
    }

    pub fn set_owner(&mut self, caller: &Address, owner: &Address) -> Result<()> {
        self.atomically(|pool| instructions::admin::set_owner(pool, caller, owner))
    }

    // ── Views ────────────────────────────────────────────────────────────────

    pub fn market(&self, market_id: &MarketId) -> Option<&Market> {
        self.state.markets.get(market_id).map(|record| &record.market)
    }

    /// Params of a market, looked up by id alone.
    pub fn id_to_market_params(&self, market_id: &MarketId) -> Option<&MarketParams> {
        self.state.markets.get(market_id).map(|record| &record.params)
    }

    pub fn markets(&self) -> impl Iterator<Item = (&MarketId, &MarketRecord)> {
        self.state.markets.iter()
    }

    /// Shares held by `owner` in a market; zero for unknown positions.
    pub fn position(&self, market_id: &MarketId, owner: &Address) -> u128 {
        self.state
            .positions
            .get(&(*market_id, *owner))
            .map(|p| p.shares)
            .unwrap_or(0)
    }

    pub fn positions(&self) -> impl Iterator<Item = (&(MarketId, Address), &Position)> {
        self.state.positions.iter()
    }

    /// Health of a market as judged by its oracle.
    pub fn is_healthy(&self, market_id: &MarketId) -> Result<bool> {
        let record = self.record(market_id)?;
        let model = self.rate_model_for(&record.params)?;
        Ok(health::is_healthy(&record.params, &record.market, model.as_deref()))
    }

    /// Self-authorization always holds.
    pub fn is_authorized(&self, authorizer: &Address, authorized: &Address) -> bool {
        authorizer == authorized || self.state.authorizations.contains(&(*authorizer, *authorized))
    }

    pub fn nonce(&self, authorizer: &Address) -> u64 {
        self.state.nonces.current(authorizer)
    }

    pub fn domain_separator(&self) -> [u8; 32] {
        auth::domain_separator(self.chain_id, &self.custody)
    }

    pub fn custody(&self) -> Address {
        self.custody
    }

    pub fn owner(&self) -> Address {
        self.state.owner
    }

    pub fn fee_recipient(&self) -> Address {
        self.state.fee_recipient
    }

    pub fn now(&self) -> u64 {
        self.clock.now()
    }

    pub fn ledger(&self) -> &L {
        &self.state.ledger
    }

    /// Direct ledger access for hosts funding accounts. Not rolled back
    /// outside of entry points.
    pub fn ledger_mut(&mut self) -> &mut L {
        &mut self.state.ledger
    }

    // ── Internals shared by the instruction handlers ─────────────────────────

    /// Run `op` so that either all of its writes land or none do. Entry
    /// points nest through callbacks; each level undoes only its own writes.
    pub(crate) fn atomically<T>(&mut self, op: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let mark = self.journal.begin();
        self.state.ledger.savepoint();
        let result = op(self);
        if result.is_ok() {
            self.state.ledger.release();
            let updates = self.journal.commit();
            self.deliver(updates);
        } else {
            self.state.ledger.rollback();
            for undo in self.journal.rewind(mark) {
                self.revert(undo);
            }
        }
        result
    }

    fn revert(&mut self, undo: Undo) {
        let state = &mut self.state;
        match undo {
            Undo::Market(id, Some(record)) => {
                state.markets.insert(id, record);
            }
            Undo::Market(id, None) => {
                state.markets.remove(&id);
            }
            Undo::Position(key, Some(position)) => {
                state.positions.insert(key, position);
            }
            Undo::Position(key, None) => {
                state.positions.remove(&key);
            }
            Undo::Authorization(pair, true) => {
                state.authorizations.insert(pair);
            }
            Undo::Authorization(pair, false) => {
                state.authorizations.remove(&pair);
            }
            Undo::Nonce(authorizer, value) => state.nonces.restore(&authorizer, value),
            Undo::RateModel(address, Some(model)) => {
                state.rate_models.insert(address, model);
            }
            Undo::RateModel(address, None) => {
                state.rate_models.remove(&address);
            }
            Undo::Owner(owner) => state.owner = owner,
            Undo::FeeRecipient(recipient) => state.fee_recipient = recipient,
        }
    }

    /// Report committed swaps to their rate models. A model that rejects an
    /// update keeps its previous price; the swap stands.
    fn deliver(&self, updates: Vec<PriceUpdate>) {
        for update in updates {
            let PriceUpdate { model, market_id, params, market, amount_in, amount_out, is_swap_in } = update;
            if let Err(err) = model.update_price(&params, &market, amount_in, amount_out, is_swap_in) {
                warn!(market = %market_id, error = %err, "rate model price update failed");
            }
        }
    }

    pub(crate) fn record(&self, market_id: &MarketId) -> Result<MarketRecord> {
        self.state
            .markets
            .get(market_id)
            .copied()
            .ok_or(PoolError::MarketNotFound(*market_id))
    }

    pub(crate) fn insert_market(&mut self, market_id: MarketId, record: MarketRecord) {
        let previous = self.state.markets.insert(market_id, record);
        self.journal.record(Undo::Market(market_id, previous));
    }

    pub(crate) fn store_market(&mut self, market_id: &MarketId, market: Market) -> Result<()> {
        let record = self
            .state
            .markets
            .get_mut(market_id)
            .ok_or(PoolError::MarketNotFound(*market_id))?;
        let previous = *record;
        record.market = market;
        self.journal.record(Undo::Market(*market_id, Some(previous)));
        Ok(())
    }

    pub(crate) fn rate_model_for(&self, params: &MarketParams) -> Result<Option<Arc<dyn RateModel>>> {
        match params.rate_model {
            None => Ok(None),
            Some(address) => self
                .state
                .rate_models
                .get(&address)
                .cloned()
                .map(Some)
                .ok_or(PoolError::RateModelNotEnabled(address)),
        }
    }

    /// Tell `model` about an executed swap once the outermost entry point
    /// commits. Dropped if any enclosing entry point fails.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn queue_price_update(
        &mut self,
        model: Arc<dyn RateModel>,
        market_id: &MarketId,
        params: &MarketParams,
        market: &Market,
        amount_in: u128,
        amount_out: u128,
        is_swap_in: bool,
    ) {
        self.journal.queue(PriceUpdate {
            model,
            market_id: *market_id,
            params: *params,
            market: *market,
            amount_in,
            amount_out,
            is_swap_in,
        });
    }

    pub(crate) fn credit_shares(&mut self, market_id: &MarketId, owner: &Address, shares: u128) -> Result<()> {
        require!(!owner.is_zero(), PoolError::ZeroAddress);
        let key = (*market_id, *owner);
        let previous = self.state.positions.get(&key).copied();
        let held = previous.map(|p| p.shares).unwrap_or(0);
        let next = Position { shares: math::add(held, shares)? };
        self.state.positions.insert(key, next);
        self.journal.record(Undo::Position(key, previous));
        Ok(())
    }

    pub(crate) fn debit_shares(&mut self, market_id: &MarketId, owner: &Address, shares: u128) -> Result<()> {
        let key = (*market_id, *owner);
        let position = self.state.positions.get_mut(&key).ok_or(PoolError::InsufficientShares)?;
        let previous = *position;
        position.shares = position
            .shares
            .checked_sub(shares)
            .ok_or(PoolError::InsufficientShares)?;
        self.journal.record(Undo::Position(key, Some(previous)));
        Ok(())
    }

    pub(crate) fn set_authorization_pair(&mut self, authorizer: &Address, authorized: &Address, is_granted: bool) {
        let pair = (*authorizer, *authorized);
        let was_granted = if is_granted {
            !self.state.authorizations.insert(pair)
        } else {
            self.state.authorizations.remove(&pair)
        };
        self.journal.record(Undo::Authorization(pair, was_granted));
    }

    /// Consume `nonce` for `authorizer` if it is the next one expected.
    pub(crate) fn consume_nonce(&mut self, authorizer: &Address, nonce: u64) -> Result<()> {
        self.state.nonces.compare_and_increment(authorizer, nonce)?;
        self.journal.record(Undo::Nonce(*authorizer, nonce));
        Ok(())
    }

    pub(crate) fn enable_model(&mut self, address: &Address, model: Arc<dyn RateModel>) {
        let previous = self.state.rate_models.insert(*address, model);
        self.journal.record(Undo::RateModel(*address, previous));
    }

    pub(crate) fn replace_owner(&mut self, owner: &Address) {
        let previous = std::mem::replace(&mut self.state.owner, *owner);
        self.journal.record(Undo::Owner(previous));
    }

    pub(crate) fn replace_fee_recipient(&mut self, recipient: &Address) {
        let previous = std::mem::replace(&mut self.state.fee_recipient, *recipient);
        self.journal.record(Undo::FeeRecipient(previous));
    }

    /// Move `amount` of `token` from `from` into custody.
    pub(crate) fn pull(&mut self, from: &Address, token: &Address, amount: u128) -> Result<()> {
        let custody = self.custody;
        self.state.ledger.transfer(token, from, &custody, amount)?;
        Ok(())
    }

    /// Move `amount` of `token` out of custody to `to`.
    pub(crate) fn push(&mut self, to: &Address, token: &Address, amount: u128) -> Result<()> {
        let custody = self.custody;
        self.state.ledger.transfer(token, &custody, to, amount)?;
        Ok(())
    }

    pub(crate) fn owner_only(&self, caller: &Address) -> Result<()> {
        require!(*caller == self.state.owner, PoolError::Unauthorized(*caller));
        Ok(())
    }
}
