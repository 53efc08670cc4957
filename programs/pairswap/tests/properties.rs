mod common;

use common::{alice, Harness};
use pairswap::{Address, Liquidity, MarketId, WAD};
use proptest::prelude::*;

const FUNDING: u128 = 1_000_000_000_000;

#[derive(Debug, Clone)]
enum Op {
    Supply { who: usize, amount_a: u128, amount_b: u128 },
    SupplyShares { who: usize, shares: u128 },
    Withdraw { who: usize, permille: u128 },
    WithdrawAssets { who: usize, amount_a: u128, amount_b: u128 },
    SwapIn { amount: u128 },
    SwapOut { amount: u128 },
}

fn user(who: usize) -> Address {
    Address::from_label(&format!("user-{who}"))
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..3usize, 1..50_000u128, 1..50_000u128)
            .prop_map(|(who, amount_a, amount_b)| Op::Supply { who, amount_a, amount_b }),
        (0..3usize, 1..10_000u128).prop_map(|(who, shares)| Op::SupplyShares { who, shares }),
        (0..3usize, 1..=1_000u128).prop_map(|(who, permille)| Op::Withdraw { who, permille }),
        (0..3usize, 0..2_000u128, 0..2_000u128)
            .prop_map(|(who, amount_a, amount_b)| Op::WithdrawAssets { who, amount_a, amount_b }),
        (1..20_000u128).prop_map(|amount| Op::SwapIn { amount }),
        (1..20_000u128).prop_map(|amount| Op::SwapOut { amount }),
    ]
}

/// Fee-charging market at `price` with three funded users and a trader.
fn setup(price: u128, fee_rate_wad: u128) -> (Harness, MarketId) {
    let mut h = Harness::with_default_fee(fee_rate_wad);
    let id = h.market(price);
    for who in 0..3 {
        h.fund(&user(who), FUNDING, FUNDING);
    }
    h.fund(&Address::from_label("trader"), FUNDING, FUNDING);
    (h, id)
}

fn apply(h: &mut Harness, id: &MarketId, op: &Op) {
    let trader = Address::from_label("trader");
    // failures are expected and must leave no trace; the caller checks that
    let _ = match *op {
        Op::Supply { who, amount_a, amount_b } => h
            .pool
            .supply(&user(who), id, Liquidity::Assets { amount_a, amount_b }, &user(who), &[], None)
            .map(|_| ()),
        Op::SupplyShares { who, shares } => h
            .pool
            .supply(&user(who), id, Liquidity::Shares(shares), &user(who), &[], None)
            .map(|_| ()),
        Op::Withdraw { who, permille } => {
            let shares = h.pool.position(id, &user(who)) * permille / 1_000;
            h.pool
                .withdraw(&user(who), id, Liquidity::Shares(shares), &user(who), &user(who))
                .map(|_| ())
        }
        Op::WithdrawAssets { who, amount_a, amount_b } => h
            .pool
            .withdraw(&user(who), id, Liquidity::Assets { amount_a, amount_b }, &user(who), &user(who))
            .map(|_| ()),
        Op::SwapIn { amount } => h.pool.exact_swap_in(&trader, id, amount, 0, &trader).map(|_| ()),
        Op::SwapOut { amount } => h
            .pool
            .exact_swap_out(&trader, id, amount, u128::MAX, &trader)
            .map(|_| ()),
    };
}

proptest! {
    #[test]
    fn accounting_is_conserved(
        price in prop_oneof![Just(WAD), Just(WAD / 2), Just(3 * WAD / 2)],
        fee in 0..=WAD / 20,
        ops in prop::collection::vec(op(), 1..40),
    ) {
        let (mut h, id) = setup(price, fee);
        for op in &ops {
            apply(&mut h, &id, op);
            h.assert_conserved(&id);
            let market = h.pool.market(&id).unwrap();
            // no reserves without shareholders
            if market.total_shares == 0 {
                prop_assert_eq!((market.reserve_a, market.reserve_b), (0, 0));
            }
        }
    }

    #[test]
    fn healthy_markets_stay_healthy(
        price in prop_oneof![Just(WAD), Just(WAD / 2), Just(3 * WAD / 2)],
        fee in 0..=WAD / 20,
        ops in prop::collection::vec(op(), 1..40),
    ) {
        let (mut h, id) = setup(price, fee);
        for op in &ops {
            let was_healthy = h.pool.is_healthy(&id).unwrap();
            apply(&mut h, &id, op);
            let market = *h.pool.market(&id).unwrap();
            if was_healthy && market.total_shares > 0 {
                prop_assert!(h.pool.is_healthy(&id).unwrap(), "{:?} left the band: {:?}", op, market);
            }
        }
    }

    #[test]
    fn supply_then_withdraw_never_gains(
        seed_a in 1_000..1_000_000u128,
        ratio_permille in 600..1_900u128,
        amount_a in 1..100_000u128,
        amount_b in 1..100_000u128,
    ) {
        let (mut h, id) = setup(WAD, 0);
        let seed_b = seed_a * ratio_permille / 1_000;
        h.seed(&id, &alice(), seed_a, seed_b);

        let bob = user(1);
        let supplied = h.pool
            .supply(&bob, &id, Liquidity::Assets { amount_a, amount_b }, &bob, &[], None);
        prop_assume!(supplied.is_ok());
        let supplied = supplied.unwrap();

        let returned = h.pool
            .withdraw(&bob, &id, Liquidity::Shares(supplied.shares), &bob, &bob)
            .unwrap();
        prop_assert!(returned.assets_a + returned.assets_b <= supplied.assets_a + supplied.assets_b);
        h.assert_conserved(&id);
    }

    #[test]
    fn swap_output_grows_with_input(
        fee in 0..=WAD / 4,
        smaller in 1..100_000_000u128,
        extra in 0..100_000_000u128,
    ) {
        let (mut h, id) = setup(WAD, fee);
        h.seed(&id, &alice(), 1_000_000_000, 1_000_000_000);

        let low = h.pool.quote_swap_in(&id, smaller);
        let high = h.pool.quote_swap_in(&id, smaller + extra);
        if let (Ok(low), Ok(high)) = (low, high) {
            prop_assert!(low.amount_out <= high.amount_out);
            // never better than the reference price
            prop_assert!(high.amount_out <= high.amount_in);
        }
    }

    #[test]
    fn swap_out_never_undercharges(
        price in prop_oneof![Just(WAD), Just(2 * WAD), Just(WAD / 3)],
        fee in 0..=WAD / 4,
        amount_out in 1..1_000_000u128,
    ) {
        let (mut h, id) = setup(price, fee);
        let reserve_b = 1_000_000_000 * WAD / price;
        h.seed(&id, &alice(), 1_000_000_000, reserve_b);

        if let Ok(quote) = h.pool.quote_swap_out(&id, amount_out) {
            // value paid in A terms covers the value taken out
            let paid_in_a = pairswap::math::mul_div(quote.amount_in, price, WAD, pairswap::math::Rounding::Up).unwrap();
            prop_assert!(paid_in_a >= quote.amount_out);
            prop_assert!(quote.gross_out >= quote.amount_out);
        }
    }
}
