//! SDK error type.

use pairswap::{config::ConfigError, MarketId, PoolError};

/// All errors returned by the Pairswap SDK.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    // ── Engine ───────────────────────────────────────────────────────────────
    /// The engine arithmetic rejected the operation, exactly as the pool would.
    #[error("{0}")]
    Pool(#[from] PoolError),

    /// A scenario step failed inside the pool.
    #[error("step {step} ({kind}) failed: {source}")]
    Step {
        step: usize,
        kind: &'static str,
        #[source]
        source: PoolError,
    },

    // ── Snapshots ────────────────────────────────────────────────────────────
    #[error("Market {0} is not in the snapshot")]
    MarketNotFound(MarketId),

    /// Rate-model markets price through live model state the snapshot does
    /// not carry.
    #[error("Market {0} prices through a rate model; only fixed-price markets can be simulated")]
    RateModelMarket(MarketId),

    // ── Input ────────────────────────────────────────────────────────────────
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Convenience alias so every module can write `Result<T>`.
pub type Result<T> = std::result::Result<T, Error>;
