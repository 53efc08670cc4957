//! Scenario replay.
//!
//! A scenario is a JSON document describing a pool and a list of steps. Steps
//! run in order against an in-memory pool driven by a manual clock; the run
//! stops at the first failing step. Accounts are written either as base-58
//! addresses or as `@label`, which derives a stable address from the label.
//!
//! ```json
//! {
//!   "pool": { "owner": "@owner", "fee_recipient": "@treasury" },
//!   "steps": [
//!     { "mint": { "token": "@usd", "to": "@alice", "amount": 1000 } },
//!     { "mint": { "token": "@eur", "to": "@alice", "amount": 1000 } },
//!     { "create": { "asset_a": "@usd", "asset_b": "@eur", "reference_price": 1000000000000000000 } },
//!     { "supply": { "caller": "@alice", "market": 0, "liquidity": { "assets": { "amount_a": 500, "amount_b": 500 } } } },
//!     { "swap_in": { "caller": "@alice", "market": 0, "amount_in": 100 } }
//!   ]
//! }
//! ```

use std::{str::FromStr, sync::Arc};

use pairswap::{
    Address, InMemoryLedger, Liquidity, ManualClock, MarketId, MarketParams, Pool, PoolConfig, PoolError,
    SupplyReceipt, SwapReceipt, WithdrawReceipt, DEFAULT_CHAIN_ID,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    error::{Error, Result},
    state::PoolSnapshot,
};

// ─── Accounts ─────────────────────────────────────────────────────────────────

/// `@label` or a base-58 address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Account(pub String);

impl Account {
    pub fn resolve(&self) -> Result<Address> {
        match self.0.strip_prefix('@') {
            Some(label) if !label.is_empty() => Ok(Address::from_label(label)),
            Some(_) => Err(Error::InvalidArgument("empty account label".into())),
            None => Address::from_str(&self.0).map_err(|e| Error::InvalidArgument(e.to_string())),
        }
    }
}

impl From<&str> for Account {
    fn from(s: &str) -> Self {
        Account(s.to_string())
    }
}

// ─── Document ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioPool {
    #[serde(default = "default_owner")]
    pub owner: Account,
    #[serde(default)]
    pub fee_recipient: Option<Account>,
    #[serde(default)]
    pub default_fee_wad: u128,
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
    /// Initial clock reading
    #[serde(default)]
    pub start_time: u64,
}

fn default_owner() -> Account {
    Account::from("@owner")
}

fn default_chain_id() -> u64 {
    DEFAULT_CHAIN_ID
}

impl Default for ScenarioPool {
    fn default() -> Self {
        Self {
            owner: default_owner(),
            fee_recipient: None,
            default_fee_wad: 0,
            chain_id: DEFAULT_CHAIN_ID,
            start_time: 0,
        }
    }
}

impl ScenarioPool {
    pub fn to_config(&self) -> Result<PoolConfig> {
        let config = PoolConfig {
            owner: self.owner.resolve()?,
            fee_recipient: match &self.fee_recipient {
                Some(account) => account.resolve()?,
                None => Address::ZERO,
            },
            default_fee_wad: self.default_fee_wad,
            chain_id: self.chain_id,
        };
        config.validate()?;
        Ok(config)
    }
}

/// One operation. Markets are referred to by their creation order within the
/// scenario; omitted beneficiaries and receivers default to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub enum Step {
    /// Credit tokens out of nothing.
    Mint { token: Account, to: Account, amount: u128 },
    Create {
        asset_a: Account,
        asset_b: Account,
        reference_price: u128,
        #[serde(default)]
        creator: Option<Account>,
    },
    Supply {
        caller: Account,
        market: usize,
        liquidity: Liquidity,
        #[serde(default)]
        on_behalf: Option<Account>,
    },
    Withdraw {
        caller: Account,
        market: usize,
        liquidity: Liquidity,
        #[serde(default)]
        on_behalf: Option<Account>,
        #[serde(default)]
        receiver: Option<Account>,
    },
    SwapIn {
        caller: Account,
        market: usize,
        amount_in: u128,
        #[serde(default)]
        min_amount_out: u128,
        #[serde(default)]
        receiver: Option<Account>,
    },
    SwapOut {
        caller: Account,
        market: usize,
        amount_out: u128,
        #[serde(default)]
        max_amount_in: Option<u128>,
        #[serde(default)]
        receiver: Option<Account>,
    },
    /// Owner-signed fee change.
    SetFee { market: usize, fee_rate_wad: u128 },
    Authorize { caller: Account, authorized: Account, is_granted: bool },
    /// Move the clock forward.
    Advance { seconds: u64 },
}

impl Step {
    pub fn kind(&self) -> &'static str {
        match self {
            Step::Mint { .. } => "mint",
            Step::Create { .. } => "create",
            Step::Supply { .. } => "supply",
            Step::Withdraw { .. } => "withdraw",
            Step::SwapIn { .. } => "swap_in",
            Step::SwapOut { .. } => "swap_out",
            Step::SetFee { .. } => "set_fee",
            Step::Authorize { .. } => "authorize",
            Step::Advance { .. } => "advance",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    #[serde(default)]
    pub pool: ScenarioPool,
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

// ─── Outcome ──────────────────────────────────────────────────────────────────

/// What a step produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepOutcome {
    Done,
    Created(MarketId),
    Supplied(SupplyReceipt),
    Withdrawn(WithdrawReceipt),
    Swapped(SwapReceipt),
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioOutcome {
    pub steps: Vec<StepOutcome>,
    pub snapshot: PoolSnapshot,
}

// ─── Runner ───────────────────────────────────────────────────────────────────

struct Runner {
    pool: Pool,
    clock: ManualClock,
    markets: Vec<MarketId>,
}

impl Runner {
    fn market(&self, index: usize) -> Result<MarketId> {
        self.markets.get(index).copied().ok_or_else(|| {
            Error::InvalidArgument(format!(
                "market #{index} does not exist ({} created so far)",
                self.markets.len()
            ))
        })
    }

    fn step(&mut self, step: &Step) -> Result<StepOutcome> {
        let outcome = match step {
            Step::Mint { token, to, amount } => {
                self.pool
                    .ledger_mut()
                    .mint(&token.resolve()?, &to.resolve()?, *amount)
                    .map_err(PoolError::from)?;
                StepOutcome::Done
            }
            Step::Create { asset_a, asset_b, reference_price, creator } => {
                let params = MarketParams {
                    asset_a: asset_a.resolve()?,
                    asset_b: asset_b.resolve()?,
                    rate_model: None,
                    reference_price: *reference_price,
                };
                let creator = match creator {
                    Some(account) => account.resolve()?,
                    None => self.pool.owner(),
                };
                let id = self.pool.create_market(&creator, params)?;
                self.markets.push(id);
                StepOutcome::Created(id)
            }
            Step::Supply { caller, market, liquidity, on_behalf } => {
                let caller = caller.resolve()?;
                let on_behalf = or_caller(on_behalf, caller)?;
                let id = self.market(*market)?;
                StepOutcome::Supplied(self.pool.supply(&caller, &id, *liquidity, &on_behalf, &[], None)?)
            }
            Step::Withdraw { caller, market, liquidity, on_behalf, receiver } => {
                let caller = caller.resolve()?;
                let on_behalf = or_caller(on_behalf, caller)?;
                let receiver = or_caller(receiver, caller)?;
                let id = self.market(*market)?;
                StepOutcome::Withdrawn(self.pool.withdraw(&caller, &id, *liquidity, &on_behalf, &receiver)?)
            }
            Step::SwapIn { caller, market, amount_in, min_amount_out, receiver } => {
                let caller = caller.resolve()?;
                let receiver = or_caller(receiver, caller)?;
                let id = self.market(*market)?;
                StepOutcome::Swapped(self.pool.exact_swap_in(&caller, &id, *amount_in, *min_amount_out, &receiver)?)
            }
            Step::SwapOut { caller, market, amount_out, max_amount_in, receiver } => {
                let caller = caller.resolve()?;
                let receiver = or_caller(receiver, caller)?;
                let id = self.market(*market)?;
                let max_amount_in = max_amount_in.unwrap_or(u128::MAX);
                StepOutcome::Swapped(self.pool.exact_swap_out(&caller, &id, *amount_out, max_amount_in, &receiver)?)
            }
            Step::SetFee { market, fee_rate_wad } => {
                let id = self.market(*market)?;
                let owner = self.pool.owner();
                self.pool.set_fee(&owner, &id, *fee_rate_wad)?;
                StepOutcome::Done
            }
            Step::Authorize { caller, authorized, is_granted } => {
                self.pool
                    .set_authorization(&caller.resolve()?, &authorized.resolve()?, *is_granted)?;
                StepOutcome::Done
            }
            Step::Advance { seconds } => {
                self.clock.advance(*seconds);
                StepOutcome::Done
            }
        };
        Ok(outcome)
    }
}

fn or_caller(account: &Option<Account>, caller: Address) -> Result<Address> {
    match account {
        Some(account) => account.resolve(),
        None => Ok(caller),
    }
}

/// Replay `scenario` against a fresh in-memory pool. `config` overrides the
/// scenario's own pool settings.
pub fn run(scenario: &Scenario, config: Option<PoolConfig>) -> Result<ScenarioOutcome> {
    let config = match config {
        Some(config) => config,
        None => scenario.pool.to_config()?,
    };
    let clock = ManualClock::new(scenario.pool.start_time);
    let pool = Pool::new(config, InMemoryLedger::new(), Arc::new(clock.clone()))?;
    let mut runner = Runner { pool, clock, markets: Vec::new() };

    let mut outcomes = Vec::with_capacity(scenario.steps.len());
    for (index, step) in scenario.steps.iter().enumerate() {
        debug!(step = index, kind = step.kind(), "replaying");
        let outcome = runner.step(step).map_err(|err| match err {
            Error::Pool(source) => Error::Step { step: index, kind: step.kind(), source },
            other => other,
        })?;
        outcomes.push(outcome);
    }

    Ok(ScenarioOutcome {
        steps: outcomes,
        snapshot: PoolSnapshot::capture(&runner.pool),
    })
}

#[cfg(test)]
mod tests {
    use pairswap::WAD;

    use super::*;

    const SCENARIO: &str = r#"{
        "pool": { "owner": "@owner", "fee_recipient": "@treasury", "default_fee_wad": 10000000000000000 },
        "steps": [
            { "mint": { "token": "@usd", "to": "@alice", "amount": 1000 } },
            { "mint": { "token": "@eur", "to": "@alice", "amount": 1000 } },
            { "mint": { "token": "@usd", "to": "@bob", "amount": 500 } },
            { "create": { "asset_a": "@usd", "asset_b": "@eur", "reference_price": 1000000000000000000 } },
            { "supply": { "caller": "@alice", "market": 0, "liquidity": { "assets": { "amount_a": 400, "amount_b": 600 } } } },
            { "advance": { "seconds": 30 } },
            { "swap_in": { "caller": "@bob", "market": 0, "amount_in": 100, "receiver": "@carol" } },
            { "withdraw": { "caller": "@alice", "market": 0, "liquidity": { "shares": 99 } } }
        ]
    }"#;

    #[test]
    fn replays_a_scenario() {
        let scenario = Scenario::from_json(SCENARIO).unwrap();
        let outcome = run(&scenario, None).unwrap();

        let id = match outcome.steps[3] {
            StepOutcome::Created(id) => id,
            ref other => panic!("expected a created market, got {other:?}"),
        };
        assert!(matches!(
            outcome.steps[4],
            StepOutcome::Supplied(SupplyReceipt { shares: 990, fee_shares: 10, .. })
        ));
        assert!(matches!(
            outcome.steps[6],
            StepOutcome::Swapped(SwapReceipt { gross_out: 100, fee: 1, amount_out: 99, .. })
        ));

        let snapshot = &outcome.snapshot;
        assert_eq!(snapshot.captured_at, 30);
        assert_eq!(snapshot.shares_of(&id, &Address::from_label("alice")), 891);
        assert_eq!(snapshot.shares_of(&id, &Address::from_label("treasury")), 10);
        assert_eq!(snapshot.market(&id).unwrap().market.fee_rate_wad, WAD / 100);
    }

    #[test]
    fn failing_step_is_reported_with_its_index() {
        let scenario = Scenario::from_json(
            r#"{ "steps": [
                { "create": { "asset_a": "@usd", "asset_b": "@eur", "reference_price": 1000000000000000000 } },
                { "supply": { "caller": "@alice", "market": 0, "liquidity": { "shares": 5 } } }
            ] }"#,
        )
        .unwrap();

        match run(&scenario, None) {
            Err(Error::Step { step: 1, kind: "supply", source: PoolError::InconsistentInput(_) }) => {}
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn accounts_resolve_labels_and_addresses() {
        let alice = Address::from_label("alice");
        assert_eq!(Account::from("@alice").resolve().unwrap(), alice);
        assert_eq!(Account(alice.to_string()).resolve().unwrap(), alice);
        assert!(Account::from("@").resolve().is_err());
        assert!(Account::from("not-base58-0OIl").resolve().is_err());
    }

    #[test]
    fn unknown_market_index_is_an_input_error() {
        let scenario = Scenario {
            pool: ScenarioPool::default(),
            steps: vec![Step::SetFee { market: 3, fee_rate_wad: 0 }],
        };
        assert!(matches!(run(&scenario, None), Err(Error::InvalidArgument(_))));
    }
}
