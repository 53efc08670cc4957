//! Delegated permissions.
//!
//! An authorizer may let another address withdraw on their behalf, either by
//! calling `set_authorization` directly or by signing an [`Authorization`]
//! that anyone can submit. Signed grants are bound to the pool by a domain
//! separator and consumed through a per-authorizer nonce.

use std::collections::HashMap;

use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{
    constants::{AUTHORIZATION_TYPE, DOMAIN_TYPE},
    error::{require, PoolError, Result},
    state::Address,
};

/// Off-chain signed permission grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authorization {
    pub authorizer: Address,
    pub authorized: Address,
    pub is_granted: bool,
    pub nonce: u64,
    /// Last clock reading (inclusive) at which the grant may be submitted
    pub deadline: u64,
}

impl Authorization {
    pub fn struct_hash(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(Sha256::digest(AUTHORIZATION_TYPE.as_bytes()));
        hasher.update(self.authorizer.0);
        hasher.update(self.authorized.0);
        hasher.update([self.is_granted as u8]);
        hasher.update(self.nonce.to_le_bytes());
        hasher.update(self.deadline.to_le_bytes());
        hasher.finalize().into()
    }

    /// `SHA-256(0x19 ‖ 0x01 ‖ domain_separator ‖ struct_hash)`
    pub fn digest(&self, domain_separator: &[u8; 32]) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update([0x19, 0x01]);
        hasher.update(domain_separator);
        hasher.update(self.struct_hash());
        hasher.finalize().into()
    }

    /// Sign with the authorizer's key. The key must belong to `authorizer`
    /// for the signature to verify.
    pub fn sign(&self, key: &SigningKey, domain_separator: &[u8; 32]) -> [u8; 64] {
        key.sign(&self.digest(domain_separator)).to_bytes()
    }
}

pub fn domain_separator(chain_id: u64, verifying_contract: &Address) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(Sha256::digest(DOMAIN_TYPE.as_bytes()));
    hasher.update(chain_id.to_le_bytes());
    hasher.update(verifying_contract.0);
    hasher.finalize().into()
}

/// Strict Ed25519 verification of `signature` over `digest` by `signer`.
pub fn verify(signer: &Address, digest: &[u8; 32], signature: &[u8; 64]) -> bool {
    let Ok(key) = VerifyingKey::from_bytes(&signer.0) else {
        return false;
    };
    key.verify_strict(digest, &Signature::from_bytes(signature)).is_ok()
}

impl From<VerifyingKey> for Address {
    fn from(key: VerifyingKey) -> Self {
        Address(key.to_bytes())
    }
}

impl From<&SigningKey> for Address {
    fn from(key: &SigningKey) -> Self {
        key.verifying_key().into()
    }
}

// ─── Nonces ────────────────────────────────────────────────────────────────
/// Per-authorizer counters that only move forward through
/// [`compare_and_increment`](Self::compare_and_increment).
///
/// The check and the increment happen under one lock, so a registry shared
/// between threads still hands out each nonce once.
#[derive(Debug, Default)]
pub struct NonceRegistry {
    counters: Mutex<HashMap<Address, u64>>,
}

impl NonceRegistry {
    pub fn current(&self, authorizer: &Address) -> u64 {
        self.counters.lock().get(authorizer).copied().unwrap_or(0)
    }

    /// Consume `expected` if it is the current nonce; returns the next one.
    pub fn compare_and_increment(&self, authorizer: &Address, expected: u64) -> Result<u64> {
        let mut counters = self.counters.lock();
        let counter = counters.entry(*authorizer).or_default();
        require!(*counter == expected, PoolError::InvalidSignatureOrNonce);
        *counter = counter.checked_add(1).ok_or(PoolError::Overflow)?;
        Ok(*counter)
    }

    /// Put a counter back to `value` when the operation that consumed it is
    /// rolled back.
    pub(crate) fn restore(&self, authorizer: &Address, value: u64) {
        let mut counters = self.counters.lock();
        if value == 0 {
            counters.remove(authorizer);
        } else {
            counters.insert(*authorizer, value);
        }
    }
}
