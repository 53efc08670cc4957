//! Serialisable pool snapshots.
//!
//! A snapshot freezes every market and position of a pool at one clock
//! reading. Markets and positions are sorted by id so two captures of the
//! same state serialise identically.

use pairswap::{Address, Market, MarketId, MarketParams, Pool, TokenLedger};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ─── Pool ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSnapshot {
    pub owner: Address,
    pub fee_recipient: Address,
    /// Ledger account holding the reserves
    pub custody: Address,
    /// Clock reading at capture
    pub captured_at: u64,
    pub markets: Vec<MarketSnapshot>,
    #[serde(default)]
    pub positions: Vec<PositionSnapshot>,
}

impl PoolSnapshot {
    pub fn capture<L: TokenLedger>(pool: &Pool<L>) -> Self {
        let mut markets: Vec<MarketSnapshot> = pool
            .markets()
            .map(|(id, record)| MarketSnapshot {
                id: *id,
                params: record.params,
                market: record.market,
                // a market whose model was never enabled cannot exist
                healthy: pool.is_healthy(id).unwrap_or(false),
            })
            .collect();
        markets.sort_by_key(|m| m.id);

        let mut positions: Vec<PositionSnapshot> = pool
            .positions()
            .map(|((market, owner), position)| PositionSnapshot {
                market: *market,
                owner: *owner,
                shares: position.shares,
            })
            .collect();
        positions.sort_by_key(|p| (p.market, p.owner));

        Self {
            owner: pool.owner(),
            fee_recipient: pool.fee_recipient(),
            custody: pool.custody(),
            captured_at: pool.now(),
            markets,
            positions,
        }
    }

    pub fn market(&self, id: &MarketId) -> Result<&MarketSnapshot> {
        self.markets
            .iter()
            .find(|m| m.id == *id)
            .ok_or(Error::MarketNotFound(*id))
    }

    /// Shares `owner` holds in `market`; zero when absent.
    pub fn shares_of(&self, market: &MarketId, owner: &Address) -> u128 {
        self.positions
            .iter()
            .find(|p| p.market == *market && p.owner == *owner)
            .map(|p| p.shares)
            .unwrap_or(0)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

// ─── Market ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub id: MarketId,
    pub params: MarketParams,
    pub market: Market,
    /// Health as judged by the market's oracle at capture
    pub healthy: bool,
}

// ─── Position ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionSnapshot {
    pub market: MarketId,
    pub owner: Address,
    pub shares: u128,
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pairswap::{InMemoryLedger, Liquidity, ManualClock, PoolConfig, WAD};

    use super::*;

    #[test]
    fn capture_survives_json() {
        let owner = Address::from_label("owner");
        let alice = Address::from_label("alice");
        let mut pool = Pool::new(PoolConfig::new(owner), InMemoryLedger::new(), Arc::new(ManualClock::new(42))).unwrap();
        let params = MarketParams {
            asset_a: Address::from_label("a"),
            asset_b: Address::from_label("b"),
            rate_model: None,
            reference_price: WAD,
        };
        let id = pool.create_market(&alice, params).unwrap();
        pool.ledger_mut().mint(&params.asset_a, &alice, 100).unwrap();
        pool.ledger_mut().mint(&params.asset_b, &alice, 150).unwrap();
        pool.supply(&alice, &id, Liquidity::Assets { amount_a: 100, amount_b: 150 }, &alice, &[], None)
            .unwrap();

        let snapshot = PoolSnapshot::capture(&pool);
        assert_eq!(snapshot.captured_at, 42);
        assert_eq!(snapshot.shares_of(&id, &alice), 250);
        assert!(snapshot.market(&id).unwrap().healthy);

        let back = PoolSnapshot::from_json(&snapshot.to_json_pretty().unwrap()).unwrap();
        assert_eq!(back, snapshot);
        assert!(matches!(back.market(&MarketId([0; 32])), Err(Error::MarketNotFound(_))));
    }
}
