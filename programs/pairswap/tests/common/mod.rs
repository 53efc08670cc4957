#![allow(dead_code)]

use std::sync::Arc;

use parking_lot::Mutex;
use pairswap::{
    health,
    instructions::swap_math::fixed_rate,
    math::Rounding,
    Address, InMemoryLedger, Liquidity, ManualClock, Market, MarketId, MarketParams, Pool, PoolConfig, RateModel,
    RateModelError, SupplyReceipt, TokenLedger,
};

pub const START: u64 = 1_700_000_000;

pub struct Harness {
    pub pool: Pool,
    pub clock: ManualClock,
    pub owner: Address,
    pub treasury: Address,
    pub asset_a: Address,
    pub asset_b: Address,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_default_fee(0)
    }

    /// Pool whose markets start at `fee_rate_wad`, paying fee shares to
    /// `treasury`.
    pub fn with_default_fee(fee_rate_wad: u128) -> Self {
        let owner = Address::from_label("owner");
        let treasury = Address::from_label("treasury");
        let mut config = PoolConfig::new(owner);
        config.fee_recipient = treasury;
        config.default_fee_wad = fee_rate_wad;
        Self::with_config(config)
    }

    pub fn with_config(config: PoolConfig) -> Self {
        let clock = ManualClock::new(START);
        let owner = config.owner;
        let treasury = config.fee_recipient;
        let pool = Pool::new(config, InMemoryLedger::new(), Arc::new(clock.clone())).unwrap();
        Self {
            pool,
            clock,
            owner,
            treasury,
            asset_a: Address::from_label("asset-a"),
            asset_b: Address::from_label("asset-b"),
        }
    }

    pub fn params(&self, reference_price: u128) -> MarketParams {
        MarketParams {
            asset_a: self.asset_a,
            asset_b: self.asset_b,
            rate_model: None,
            reference_price,
        }
    }

    /// Market priced by `model`, enabled by the owner under `label`.
    pub fn model_market(&mut self, label: &str, model: Arc<dyn RateModel>) -> MarketId {
        let address = Address::from_label(label);
        let owner = self.owner;
        self.pool.enable_rate_model(&owner, &address, model).unwrap();
        let params = MarketParams { rate_model: Some(address), ..self.params(pairswap::WAD) };
        self.pool.create_market(&Address::from_label("creator"), params).unwrap()
    }

    pub fn market(&mut self, reference_price: u128) -> MarketId {
        let params = self.params(reference_price);
        let creator = Address::from_label("creator");
        self.pool.create_market(&creator, params).unwrap()
    }

    pub fn fund(&mut self, who: &Address, amount_a: u128, amount_b: u128) {
        let (asset_a, asset_b) = (self.asset_a, self.asset_b);
        let ledger = self.pool.ledger_mut();
        ledger.mint(&asset_a, who, amount_a).unwrap();
        ledger.mint(&asset_b, who, amount_b).unwrap();
    }

    /// Fund `who` and supply both amounts for them.
    pub fn seed(&mut self, market_id: &MarketId, who: &Address, amount_a: u128, amount_b: u128) -> SupplyReceipt {
        self.fund(who, amount_a, amount_b);
        self.pool
            .supply(who, market_id, Liquidity::Assets { amount_a, amount_b }, who, &[], None)
            .unwrap()
    }

    pub fn balances(&self, who: &Address) -> (u128, u128) {
        let ledger = self.pool.ledger();
        (ledger.balance_of(&self.asset_a, who), ledger.balance_of(&self.asset_b, who))
    }

    pub fn reserves(&self, market_id: &MarketId) -> (u128, u128) {
        let market = self.pool.market(market_id).unwrap();
        (market.reserve_a, market.reserve_b)
    }

    /// Shares add up to the market total and custody holds exactly the
    /// reserves. Assumes `market_id` is the only market holding these assets.
    pub fn assert_conserved(&self, market_id: &MarketId) {
        let market = self.pool.market(market_id).unwrap();
        let shares: u128 = self
            .pool
            .positions()
            .filter(|((id, _), _)| id == market_id)
            .map(|(_, position)| position.shares)
            .sum();
        assert_eq!(shares, market.total_shares, "share conservation");
        assert_eq!(
            self.balances(&self.pool.custody()),
            (market.reserve_a, market.reserve_b),
            "custody matches reserves"
        );
    }
}

pub fn alice() -> Address {
    Address::from_label("alice")
}

pub fn bob() -> Address {
    Address::from_label("bob")
}

/// Fixed-band pricing and health against a price the test can move, standing
/// in for an oracle that reprices a market under its liquidity.
pub struct Pegged {
    peg: Mutex<u128>,
}

impl Pegged {
    pub fn new(peg: u128) -> Self {
        Self { peg: Mutex::new(peg) }
    }

    pub fn set(&self, peg: u128) {
        *self.peg.lock() = peg;
    }

    fn rate(&self, rounding: Rounding) -> Result<u128, RateModelError> {
        fixed_rate(*self.peg.lock(), rounding).map_err(|err| RateModelError::new(err.to_string()))
    }
}

impl RateModel for Pegged {
    fn swap_rate_in(&self, _: &MarketParams, _: &Market, _: u128) -> Result<u128, RateModelError> {
        self.rate(Rounding::Down)
    }

    fn swap_rate_out(&self, _: &MarketParams, _: &Market, _: u128) -> Result<u128, RateModelError> {
        self.rate(Rounding::Up)
    }

    fn is_healthy(&self, _: &MarketParams, market: &Market) -> bool {
        health::within_band(market, *self.peg.lock())
    }

    fn imbalance(&self, _: &MarketParams, market: &Market) -> Option<u128> {
        Some(health::distance_from_band(market, *self.peg.lock()))
    }

    fn update_price(&self, _: &MarketParams, _: &Market, _: u128, _: u128, _: bool) -> Result<(), RateModelError> {
        Ok(())
    }
}
