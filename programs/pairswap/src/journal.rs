//! Undo log behind `Pool::atomically`.
//!
//! Each write to pool state records the value it replaced. A failed operation
//! replays its own records in reverse; when the outermost operation succeeds
//! the log is dropped. Only what an operation touches is copied, so markets
//! an operation does not touch cost it nothing.
//!
//! Rate-model notifications are queued here too and delivered only once the
//! outermost operation commits, so a swap that is rolled back never moves a
//! model's price.

use std::sync::Arc;

use crate::{
    rate_model::RateModel,
    state::{Address, Market, MarketId, MarketParams, MarketRecord, Position},
};

/// The value a single write replaced.
pub(crate) enum Undo {
    Market(MarketId, Option<MarketRecord>),
    Position((MarketId, Address), Option<Position>),
    Authorization((Address, Address), bool),
    Nonce(Address, u64),
    RateModel(Address, Option<Arc<dyn RateModel>>),
    Owner(Address),
    FeeRecipient(Address),
}

/// An executed swap waiting to be reported to its market's rate model.
pub(crate) struct PriceUpdate {
    pub(crate) model: Arc<dyn RateModel>,
    pub(crate) market_id: MarketId,
    pub(crate) params: MarketParams,
    pub(crate) market: Market,
    pub(crate) amount_in: u128,
    pub(crate) amount_out: u128,
    pub(crate) is_swap_in: bool,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Mark {
    undo: usize,
    price_updates: usize,
}

#[derive(Default)]
pub(crate) struct Journal {
    undo: Vec<Undo>,
    price_updates: Vec<PriceUpdate>,
    depth: usize,
}

impl Journal {
    pub(crate) fn begin(&mut self) -> Mark {
        self.depth += 1;
        Mark {
            undo: self.undo.len(),
            price_updates: self.price_updates.len(),
        }
    }

    pub(crate) fn record(&mut self, undo: Undo) {
        if self.depth > 0 {
            self.undo.push(undo);
        }
    }

    pub(crate) fn queue(&mut self, update: PriceUpdate) {
        self.price_updates.push(update);
    }

    /// Close the innermost open operation. Returns the queued notifications
    /// once the outermost operation commits.
    pub(crate) fn commit(&mut self) -> Vec<PriceUpdate> {
        self.depth = self.depth.saturating_sub(1);
        if self.depth > 0 {
            return Vec::new();
        }
        self.undo.clear();
        std::mem::take(&mut self.price_updates)
    }

    /// Abandon the operation opened at `mark`: drop its notifications and
    /// hand back its writes, newest first.
    pub(crate) fn rewind(&mut self, mark: Mark) -> Vec<Undo> {
        self.depth = self.depth.saturating_sub(1);
        self.price_updates.truncate(mark.price_updates);
        let mut undone = self.undo.split_off(mark.undo);
        undone.reverse();
        undone
    }
}
