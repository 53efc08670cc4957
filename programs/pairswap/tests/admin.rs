mod common;

use std::sync::Arc;

use common::{alice, Harness};
use pairswap::{Address, ConstantProduct, PoolConfig, PoolError, MAX_FEE_WAD, WAD};

#[test]
fn admin_operations_are_owner_only() {
    let mut h = Harness::new();
    let id = h.market(WAD);
    let intruder = alice();

    assert_eq!(h.pool.set_fee(&intruder, &id, 1), Err(PoolError::Unauthorized(intruder)));
    assert_eq!(h.pool.set_owner(&intruder, &intruder), Err(PoolError::Unauthorized(intruder)));
    assert_eq!(
        h.pool.set_fee_recipient(&intruder, &intruder),
        Err(PoolError::Unauthorized(intruder))
    );
    assert_eq!(
        h.pool.enable_rate_model(&intruder, &Address::from_label("cp"), Arc::new(ConstantProduct::new())),
        Err(PoolError::Unauthorized(intruder))
    );
}

#[test]
fn fee_is_capped_and_needs_a_recipient() {
    let mut h = Harness::with_config(PoolConfig::new(Address::from_label("owner")));
    let id = h.market(WAD);
    let owner = h.owner;

    assert_eq!(h.pool.set_fee(&owner, &id, WAD / 100), Err(PoolError::ZeroAddress));

    let treasury = Address::from_label("treasury");
    h.pool.set_fee_recipient(&owner, &treasury).unwrap();
    assert_eq!(
        h.pool.set_fee(&owner, &id, MAX_FEE_WAD + 1),
        Err(PoolError::FeeTooHigh(MAX_FEE_WAD + 1))
    );
    h.pool.set_fee(&owner, &id, MAX_FEE_WAD).unwrap();
    assert_eq!(h.pool.market(&id).unwrap().fee_rate_wad, MAX_FEE_WAD);

    // the recipient cannot be cleared while a market charges a fee
    assert_eq!(h.pool.set_fee_recipient(&owner, &Address::ZERO), Err(PoolError::ZeroAddress));
    h.pool.set_fee(&owner, &id, 0).unwrap();
    h.pool.set_fee_recipient(&owner, &Address::ZERO).unwrap();
}

#[test]
fn ownership_can_be_handed_over() {
    let mut h = Harness::new();
    let owner = h.owner;
    let next = Address::from_label("next-owner");

    assert_eq!(h.pool.set_owner(&owner, &Address::ZERO), Err(PoolError::ZeroAddress));
    h.pool.set_owner(&owner, &next).unwrap();
    assert_eq!(h.pool.owner(), next);
    assert_eq!(h.pool.set_owner(&owner, &owner), Err(PoolError::Unauthorized(owner)));
}

#[test]
fn market_creation_validates_params() {
    let mut h = Harness::new();
    let id = h.market(WAD);

    let (again, free) = (h.params(WAD), h.params(0));
    assert_eq!(h.pool.create_market(&alice(), again), Err(PoolError::MarketAlreadyExists(id)));
    assert_eq!(h.pool.create_market(&alice(), free), Err(PoolError::ZeroAmount));

    let same = pairswap::MarketParams { asset_b: h.asset_a, ..h.params(WAD) };
    assert!(matches!(h.pool.create_market(&alice(), same), Err(PoolError::InconsistentInput(_))));

    let zero = pairswap::MarketParams { asset_a: Address::ZERO, ..h.params(WAD) };
    assert_eq!(h.pool.create_market(&alice(), zero), Err(PoolError::ZeroAddress));
}

#[test]
fn markets_are_found_by_id() {
    let mut h = Harness::with_default_fee(WAD / 200);
    let id = h.market(WAD);
    let other = h.market(2 * WAD);

    assert_ne!(id, other);
    assert_eq!(h.pool.id_to_market_params(&id), Some(&h.params(WAD)));
    assert_eq!(h.pool.market(&other).unwrap().fee_rate_wad, WAD / 200);
    assert_eq!(h.pool.markets().count(), 2);
    assert_eq!(h.params(WAD).id(), id);
}

#[test]
fn invalid_config_is_refused() {
    let mut config = PoolConfig::new(Address::from_label("owner"));
    config.default_fee_wad = WAD / 100;
    let err = pairswap::Pool::new(
        config,
        pairswap::InMemoryLedger::new(),
        Arc::new(pairswap::ManualClock::new(0)),
    )
    .err();
    assert_eq!(err, Some(PoolError::ZeroAddress));
}
