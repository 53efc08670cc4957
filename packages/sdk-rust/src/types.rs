//! Public result types.

use pairswap::MarketId;
use serde::{Deserialize, Serialize};

/// Which side of a swap the caller fixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapKind {
    /// Exact A in, B out
    ExactIn,
    /// B in, exact A out
    ExactOut,
}

/// Full fee breakdown of a hypothetical swap, as the engine would execute it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulateResult {
    pub market: MarketId,
    pub kind: SwapKind,
    pub amount_in: u128,
    /// Output before the fee
    pub gross_out: u128,
    /// Part of the gross output kept in the reserve
    pub fee: u128,
    pub amount_out: u128,
    pub fee_rate_wad: u128,
    /// `amount_out / amount_in`
    pub effective_rate: f64,
    pub reserve_a_after: u128,
    pub reserve_b_after: u128,
    /// Health of the market after the trade. Can be false when the trade
    /// moves an already unhealthy market back toward the band.
    pub healthy_after: bool,
}
