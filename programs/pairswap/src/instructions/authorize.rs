use tracing::info;

use crate::{
    auth::{self, Authorization},
    error::{require, PoolError, Result},
    ledger::TokenLedger,
    state::Address,
    Pool,
};

fn apply<L: TokenLedger>(pool: &mut Pool<L>, authorizer: &Address, authorized: &Address, is_granted: bool) {
    pool.set_authorization_pair(authorizer, authorized, is_granted);
    info!(authorizer = %authorizer, authorized = %authorized, is_granted, "authorization set");
}

/// Grant or revoke `authorized`'s right to withdraw on the caller's behalf.
pub fn handler<L: TokenLedger>(
    pool: &mut Pool<L>,
    caller: &Address,
    authorized: &Address,
    is_granted: bool,
) -> Result<()> {
    require!(!caller.is_zero() && !authorized.is_zero(), PoolError::ZeroAddress);
    apply(pool, caller, authorized, is_granted);
    Ok(())
}

/// Apply a grant signed by its authorizer. Anyone may submit it.
///
/// Checked in order: deadline, signature, nonce. The nonce is consumed only
/// when the grant is applied.
pub fn with_sig_handler<L: TokenLedger>(
    pool: &mut Pool<L>,
    grant: &Authorization,
    signature: &[u8; 64],
) -> Result<()> {
    require!(pool.now() <= grant.deadline, PoolError::SignatureExpired);
    require!(
        !grant.authorizer.is_zero() && !grant.authorized.is_zero(),
        PoolError::ZeroAddress
    );

    let digest = grant.digest(&pool.domain_separator());
    require!(
        auth::verify(&grant.authorizer, &digest, signature),
        PoolError::InvalidSignatureOrNonce
    );
    pool.consume_nonce(&grant.authorizer, grant.nonce)?;

    apply(pool, &grant.authorizer, &grant.authorized, grant.is_granted);
    Ok(())
}
