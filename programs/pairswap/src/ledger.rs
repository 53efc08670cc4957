//! Token transfer collaborator.
//!
//! The engine only assumes exact-amount transfers: no fee-on-transfer, no
//! re-entrancy from the token itself. Ledgers take part in the pool's
//! rollback through nested savepoints, so a failed operation also undoes its
//! transfers, including any a callback made through `Pool::ledger_mut`.

use std::collections::HashMap;

use crate::state::Address;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransferError {
    #[error("{owner} holds {available} of token {token}; needs {required}")]
    InsufficientBalance {
        token: Address,
        owner: Address,
        available: u128,
        required: u128,
    },

    #[error("balance overflow for token {0}")]
    Overflow(Address),
}

pub trait TokenLedger {
    /// Move `amount` of `token` from `from` to `to`. Zero-amount transfers
    /// succeed without effect.
    fn transfer(
        &mut self,
        token: &Address,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<(), TransferError>;

    fn balance_of(&self, token: &Address, owner: &Address) -> u128;

    /// Open a savepoint. Savepoints nest.
    fn savepoint(&mut self);

    /// Close the innermost savepoint, keeping its changes.
    fn release(&mut self);

    /// Undo every change since the innermost savepoint and close it.
    fn rollback(&mut self);
}

type Key = (Address, Address);

/// Balance map keyed by `(token, owner)`.
///
/// While a savepoint is open every write records the balance it replaced;
/// rolling back replays those records in reverse.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    balances: HashMap<Key, u128>,
    undo: Vec<(Key, Option<u128>)>,
    savepoints: Vec<usize>,
}

impl PartialEq for InMemoryLedger {
    fn eq(&self, other: &Self) -> bool {
        self.balances == other.balances
    }
}

impl Eq for InMemoryLedger {}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit `amount` of `token` to `owner` out of nothing.
    pub fn mint(&mut self, token: &Address, owner: &Address, amount: u128) -> Result<(), TransferError> {
        let balance = self
            .balance_of(token, owner)
            .checked_add(amount)
            .ok_or(TransferError::Overflow(*token))?;
        self.write((*token, *owner), balance);
        Ok(())
    }

    fn write(&mut self, key: Key, balance: u128) {
        let previous = self.balances.insert(key, balance);
        if !self.savepoints.is_empty() {
            self.undo.push((key, previous));
        }
    }

    /// Total supply of `token` across all owners.
    pub fn supply_of(&self, token: &Address) -> u128 {
        self.balances
            .iter()
            .filter(|((t, _), _)| t == token)
            .map(|(_, amount)| *amount)
            .sum()
    }
}

impl TokenLedger for InMemoryLedger {
    fn transfer(
        &mut self,
        token: &Address,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<(), TransferError> {
        if amount == 0 || from == to {
            return Ok(());
        }
        let available = self.balance_of(token, from);
        if available < amount {
            return Err(TransferError::InsufficientBalance {
                token: *token,
                owner: *from,
                available,
                required: amount,
            });
        }
        let credited = self
            .balance_of(token, to)
            .checked_add(amount)
            .ok_or(TransferError::Overflow(*token))?;
        self.write((*token, *from), available - amount);
        self.write((*token, *to), credited);
        Ok(())
    }

    fn balance_of(&self, token: &Address, owner: &Address) -> u128 {
        self.balances.get(&(*token, *owner)).copied().unwrap_or(0)
    }

    fn savepoint(&mut self) {
        self.savepoints.push(self.undo.len());
    }

    fn release(&mut self) {
        self.savepoints.pop();
        if self.savepoints.is_empty() {
            self.undo.clear();
        }
    }

    fn rollback(&mut self) {
        let mark = self.savepoints.pop().unwrap_or(0);
        for (key, previous) in self.undo.drain(mark..).rev() {
            match previous {
                Some(balance) => self.balances.insert(key, balance),
                None => self.balances.remove(&key),
            };
        }
    }
}
