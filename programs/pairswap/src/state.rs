use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{
    constants::{LABEL_SEED, MARKET_SEED},
    error::Result,
    math,
};

// ─── Address ───────────────────────────────────────────────────────────────
// 32-byte account key. An account's address is its Ed25519 public key, so a
// signed authorization can be checked against the authorizer directly.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Address(pub [u8; 32]);

impl Address {
    pub const ZERO: Address = Address([0u8; 32]);

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// Deterministic address from a list of seeds (SHA-256 over the seeds).
    pub fn derive(seeds: &[&[u8]]) -> Address {
        let mut hasher = Sha256::new();
        for seed in seeds {
            hasher.update(seed);
        }
        Address(hasher.finalize().into())
    }

    /// Address for a human-readable label, e.g. in scenario files.
    pub fn from_label(label: &str) -> Address {
        Self::derive(&[LABEL_SEED, label.as_bytes()])
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid address '{input}': {reason}")]
pub struct ParseAddressError {
    pub input: String,
    pub reason: String,
}

impl FromStr for Address {
    type Err = ParseAddressError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let bytes = bs58::decode(s).into_vec().map_err(|e| ParseAddressError {
            input: s.to_string(),
            reason: e.to_string(),
        })?;
        let bytes: [u8; 32] = bytes.try_into().map_err(|v: Vec<u8>| ParseAddressError {
            input: s.to_string(),
            reason: format!("decoded to {} bytes; expected 32", v.len()),
        })?;
        Ok(Address(bytes))
    }
}

impl From<Address> for String {
    fn from(address: Address) -> String {
        address.to_string()
    }
}

impl TryFrom<String> for Address {
    type Error = ParseAddressError;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        s.parse()
    }
}

// ─── MarketId ──────────────────────────────────────────────────────────────
// Content hash of MarketParams; the only key markets are stored under.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct MarketId(pub [u8; 32]);

impl fmt::Display for MarketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for MarketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MarketId({self})")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid market id '{0}': expected 64 hex characters")]
pub struct ParseMarketIdError(pub String);

impl FromStr for MarketId {
    type Err = ParseMarketIdError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let bytes = hex::decode(s.trim_start_matches("0x"))
            .map_err(|_| ParseMarketIdError(s.to_string()))?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| ParseMarketIdError(s.to_string()))?;
        Ok(MarketId(bytes))
    }
}

impl From<MarketId> for String {
    fn from(id: MarketId) -> String {
        id.to_string()
    }
}

impl TryFrom<String> for MarketId {
    type Error = ParseMarketIdError;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        s.parse()
    }
}

// ─── MarketParams ──────────────────────────────────────────────────────────
/// Immutable market definition.
///
/// `reference_price` is WAD-scaled: one unit of asset B is worth
/// `reference_price / WAD` units of asset A. Without a rate model, a swap of
/// A for B pays `WAD² / reference_price` B per A, and the market is healthy
/// while `reserve_b · reference_price / reserve_a` stays within `[0.5, 2]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MarketParams {
    pub asset_a: Address,
    pub asset_b: Address,
    #[serde(default)]
    pub rate_model: Option<Address>,
    pub reference_price: u128,
}

impl MarketParams {
    /// Canonical encoding: `asset_a ‖ asset_b ‖ flag ‖ rate_model ‖ price_le`.
    pub fn id(&self) -> MarketId {
        let mut hasher = Sha256::new();
        hasher.update(MARKET_SEED);
        hasher.update(self.asset_a.0);
        hasher.update(self.asset_b.0);
        match self.rate_model {
            Some(model) => {
                hasher.update([1u8]);
                hasher.update(model.0);
            }
            None => hasher.update([0u8]),
        }
        hasher.update(self.reference_price.to_le_bytes());
        MarketId(hasher.finalize().into())
    }
}

// ─── Market ────────────────────────────────────────────────────────────────
/// Mutable pool state of one market.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Market {
    pub reserve_a: u128,
    pub reserve_b: u128,
    /// Sum of every position's shares in this market
    pub total_shares: u128,
    /// Clock reading of the last mutation (creation included)
    pub last_update: u64,
    /// Fee on supplied shares and on swap output, WAD-scaled
    pub fee_rate_wad: u128,
}

impl Market {
    /// Combined value of both reserves under the unit-value policy.
    pub fn total_assets(&self) -> Result<u128> {
        math::add(self.reserve_a, self.reserve_b)
    }
}

/// A created market: its parameters and current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketRecord {
    pub params: MarketParams,
    pub market: Market,
}

// ─── Position ──────────────────────────────────────────────────────────────
/// One owner's claim on one market.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub shares: u128,
}

// ─── Requests and receipts ─────────────────────────────────────────────────

/// Primary input of a supply or withdrawal: either asset amounts (shares are
/// derived) or a share amount (assets are derived).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Liquidity {
    Assets { amount_a: u128, amount_b: u128 },
    Shares(u128),
}

impl Liquidity {
    /// Build from the flat `(amount_a, amount_b, shares)` form, where exactly
    /// one of the asset pair or the share amount must be non-zero.
    pub fn from_parts(amount_a: u128, amount_b: u128, shares: u128) -> Result<Liquidity> {
        use crate::error::PoolError::InconsistentInput;
        let has_assets = amount_a > 0 || amount_b > 0;
        match (has_assets, shares > 0) {
            (true, false) => Ok(Liquidity::Assets { amount_a, amount_b }),
            (false, true) => Ok(Liquidity::Shares(shares)),
            (true, true) => Err(InconsistentInput("pass either assets or shares, not both")),
            (false, false) => Err(InconsistentInput("pass either assets or shares")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplyReceipt {
    /// Shares credited to the beneficiary
    pub shares: u128,
    /// Shares credited to the fee recipient
    pub fee_shares: u128,
    pub assets_a: u128,
    pub assets_b: u128,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawReceipt {
    pub shares: u128,
    pub assets_a: u128,
    pub assets_b: u128,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapReceipt {
    pub amount_in: u128,
    /// Output before the fee
    pub gross_out: u128,
    /// Output retained in the reserve as fee
    pub fee: u128,
    pub amount_out: u128,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PoolError;

    fn params() -> MarketParams {
        MarketParams {
            asset_a: Address::from_label("token-a"),
            asset_b: Address::from_label("token-b"),
            rate_model: None,
            reference_price: 1_000_000_000_000_000_000,
        }
    }

    #[test]
    fn market_id_is_deterministic() {
        assert_eq!(params().id(), params().id());
    }

    #[test]
    fn market_id_changes_with_every_field() {
        let base = params().id();
        let mut p = params();
        p.asset_a = Address::from_label("other");
        assert_ne!(p.id(), base);
        let mut p = params();
        p.asset_b = Address::from_label("other");
        assert_ne!(p.id(), base);
        let mut p = params();
        p.rate_model = Some(Address::ZERO);
        assert_ne!(p.id(), base);
        let mut p = params();
        p.reference_price += 1;
        assert_ne!(p.id(), base);
    }

    #[test]
    fn address_base58_round_trip() {
        let addr = Address::from_label("alice");
        let parsed: Address = addr.to_string().parse().unwrap();
        assert_eq!(parsed, addr);
        assert!("not-base58!".parse::<Address>().is_err());
        // valid base58 but wrong width
        assert!("3mJr7AoUXx2Wqd".parse::<Address>().is_err());
    }

    #[test]
    fn market_id_hex_round_trip() {
        let id = params().id();
        assert_eq!(id.to_string().parse::<MarketId>().unwrap(), id);
        assert_eq!(format!("0x{id}").parse::<MarketId>().unwrap(), id);
    }

    #[test]
    fn params_serialize_addresses_as_strings() {
        let json = serde_json::to_value(params()).unwrap();
        assert_eq!(json["asset_a"], Address::from_label("token-a").to_string());
        let back: MarketParams = serde_json::from_value(json).unwrap();
        assert_eq!(back, params());
    }

    #[test]
    fn liquidity_requires_exactly_one_input() {
        assert_eq!(
            Liquidity::from_parts(1, 2, 0).unwrap(),
            Liquidity::Assets { amount_a: 1, amount_b: 2 }
        );
        assert_eq!(Liquidity::from_parts(0, 0, 5).unwrap(), Liquidity::Shares(5));
        assert!(matches!(
            Liquidity::from_parts(1, 0, 5),
            Err(PoolError::InconsistentInput(_))
        ));
        assert!(matches!(
            Liquidity::from_parts(0, 0, 0),
            Err(PoolError::InconsistentInput(_))
        ));
    }
}
