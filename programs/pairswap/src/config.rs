use serde::{Deserialize, Serialize};

use crate::{
    constants::{DEFAULT_CHAIN_ID, MAX_FEE_WAD},
    error::{require, PoolError},
    state::Address,
};

/// Pool-wide settings fixed at construction. Owner, fee recipient and fees
/// can be changed afterwards through the owner-gated admin operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PoolConfig {
    pub owner: Address,
    /// Receives fee shares minted on supply
    #[serde(default)]
    pub fee_recipient: Address,
    /// Fee rate new markets start with, WAD-scaled
    #[serde(default)]
    pub default_fee_wad: u128,
    /// Bound into the authorization domain separator
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
}

fn default_chain_id() -> u64 {
    DEFAULT_CHAIN_ID
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(#[from] PoolError),
}

impl PoolConfig {
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            fee_recipient: Address::ZERO,
            default_fee_wad: 0,
            chain_id: DEFAULT_CHAIN_ID,
        }
    }

    pub fn validate(&self) -> Result<(), PoolError> {
        require!(!self.owner.is_zero(), PoolError::ZeroAddress);
        require!(
            self.default_fee_wad <= MAX_FEE_WAD,
            PoolError::FeeTooHigh(self.default_fee_wad)
        );
        require!(
            self.default_fee_wad == 0 || !self.fee_recipient.is_zero(),
            PoolError::ZeroAddress
        );
        Ok(())
    }

    /// Parse and validate a JSON config document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: PoolConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
}
