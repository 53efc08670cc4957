//! Pairswap Rust SDK
//!
//! Off-engine tooling around a [`pairswap::Pool`]: serialisable snapshots of
//! pool state, swap and liquidity previews that run the engine's own
//! arithmetic, and a JSON scenario runner for replaying operation sequences
//! against an in-memory pool.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use pairswap_sdk::{scenario::Scenario, simulate_swap_in, PoolSnapshot};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let scenario = Scenario::from_json(&std::fs::read_to_string("scenario.json")?)?;
//!     let outcome = pairswap_sdk::scenario::run(&scenario, None)?;
//!
//!     let snapshot: &PoolSnapshot = &outcome.snapshot;
//!     let market = &snapshot.markets[0];
//!     let sim = simulate_swap_in(market, 1_000, 0)?;
//!     println!("1000 A buys {} B (fee {})", sim.amount_out, sim.fee);
//!     Ok(())
//! }
//! ```
//!
//! # Feature Overview
//!
//! | Function | Description |
//! |----------|-------------|
//! | [`PoolSnapshot::capture`] | Freeze markets and positions of a live pool |
//! | [`simulate_swap_in`] / [`simulate_swap_out`] | Fee breakdown and post-trade health |
//! | [`preview_supply`] / [`preview_withdraw`] | Shares and asset legs of a liquidity change |
//! | [`scenario::run`] | Replay a JSON list of operations |

pub mod error;
pub mod math;
pub mod scenario;
pub mod state;
pub mod types;

pub use error::{Error, Result};
pub use math::{preview_supply, preview_withdraw, simulate_swap_in, simulate_swap_out};
pub use state::{MarketSnapshot, PoolSnapshot, PositionSnapshot};
pub use types::*;
