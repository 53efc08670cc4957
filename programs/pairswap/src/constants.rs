/// Fixed-point scale for prices, rates and fees (1e18)
pub const WAD: u128 = 1_000_000_000_000_000_000;

/// Upper bound on a market's fee rate: 25 %
pub const MAX_FEE_WAD: u128 = WAD / 4;

/// Health band on `reserve_b * price / reserve_a`, inclusive at both ends
pub const HEALTH_RATIO_MIN_WAD: u128 = WAD / 2;
pub const HEALTH_RATIO_MAX_WAD: u128 = 2 * WAD;

/// Address derivation seeds
pub const CUSTODY_SEED: &[u8] = b"pool_custody";
pub const LABEL_SEED: &[u8] = b"label";
pub const MARKET_SEED: &[u8] = b"market";

/// Chain id used when the config does not name one
pub const DEFAULT_CHAIN_ID: u64 = 1;

/// Typed-data schemas for signed authorizations
pub const DOMAIN_TYPE: &str = "EIP712Domain(uint256 chainId,address verifyingContract)";
pub const AUTHORIZATION_TYPE: &str =
    "Authorization(address authorizer,address authorized,bool isAuthorized,uint256 nonce,uint256 deadline)";
