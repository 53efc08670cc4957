use crate::{
    ledger::TransferError,
    rate_model::RateModelError,
    state::{Address, MarketId},
};

/// Every failure an engine entry point can report. All of them abort the
/// whole operation; pool state is left exactly as it was before the call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    // ── Registry ─────────────────────────────────────────────────────────────
    #[error("Market {0} not found")]
    MarketNotFound(MarketId),

    #[error("Market {0} already exists")]
    MarketAlreadyExists(MarketId),

    #[error("Rate model {0} is not enabled")]
    RateModelNotEnabled(Address),

    // ── Input validation ─────────────────────────────────────────────────────
    #[error("Address must not be the zero address")]
    ZeroAddress,

    #[error("Amount must be greater than zero")]
    ZeroAmount,

    #[error("Inconsistent input: {0}")]
    InconsistentInput(&'static str),

    #[error("Fee rate {0} exceeds the maximum")]
    FeeTooHigh(u128),

    // ── Liquidity ────────────────────────────────────────────────────────────
    #[error("Pool has insufficient liquidity")]
    InsufficientLiquidity,

    #[error("Insufficient shares")]
    InsufficientShares,

    #[error("Slippage exceeded: amount={actual}, limit={limit}")]
    SlippageExceeded { actual: u128, limit: u128 },

    #[error("Operation would leave the market's liquidity unhealthy")]
    LiquidityUnhealthy,

    // ── Authorization ────────────────────────────────────────────────────────
    #[error("{0} is not authorized for this operation")]
    Unauthorized(Address),

    #[error("Invalid signature or nonce")]
    InvalidSignatureOrNonce,

    #[error("Signature expired")]
    SignatureExpired,

    // ── Arithmetic ───────────────────────────────────────────────────────────
    #[error("Math overflow")]
    Overflow,

    #[error("Math underflow")]
    Underflow,

    #[error("Division by zero")]
    DivisionByZero,

    // ── Collaborators ────────────────────────────────────────────────────────
    #[error("Rate model failed: {0}")]
    RateModel(#[from] RateModelError),

    #[error("Token transfer failed: {0}")]
    Transfer(#[from] TransferError),

    #[error("Callback failed: {0}")]
    Callback(String),
}

/// Convenience alias so every module can write `Result<T>`.
pub type Result<T> = std::result::Result<T, PoolError>;

/// Return early with `$err` unless `$cond` holds.
macro_rules! require {
    ($cond:expr, $err:expr $(,)?) => {
        if !($cond) {
            return Err($err.into());
        }
    };
}
pub(crate) use require;
