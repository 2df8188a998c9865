use itch_market_data::{Ladder, Side};
use proptest::prelude::*;

fn any_side() -> impl Strategy<Value = Side> {
    prop_oneof![Just(Side::Buy), Just(Side::Sell)]
}

fn assert_sorted(ladder: &Ladder) {
    let prices: Vec<u32> = ladder.levels().iter().map(|l| l.price).collect();
    for pair in prices.windows(2) {
        // Strictly improving toward the tail, which also rules out duplicates
        assert!(ladder.side().is_better(pair[1], pair[0]), "{:?}", prices);
    }
    if let Some(best) = ladder.best_price() {
        let expected = match ladder.side() {
            Side::Buy => prices.iter().max(),
            Side::Sell => prices.iter().min(),
        };
        assert_eq!(Some(&best), expected);
    }
    assert!(ladder.levels().iter().all(|l| l.quantity > 0));
}

proptest! {
    #[test]
    fn inserts_keep_ladder_ordered(
        side in any_side(),
        orders in prop::collection::vec((900u32..1100, 1u32..1000), 1..200),
    ) {
        let mut ladder = Ladder::new(side);
        for (price, qty) in &orders {
            ladder.insert(*price, *qty);
        }
        assert_sorted(&ladder);

        let total: u64 = orders.iter().map(|(_, q)| *q as u64).sum();
        prop_assert_eq!(ladder.total_quantity(), total);
    }

    #[test]
    fn insert_then_matching_reduce_restores_ladder(
        side in any_side(),
        base in prop::collection::vec((900u32..1100, 1u32..1000), 0..50),
        price in 900u32..1100,
        qty in 1u32..1000,
    ) {
        let mut ladder = Ladder::new(side);
        for (p, q) in &base {
            ladder.insert(*p, *q);
        }
        let before = ladder.levels().to_vec();
        let best_before = ladder.best_price();

        ladder.insert(price, qty);
        prop_assert!(ladder.reduce(price, qty));

        prop_assert_eq!(ladder.levels(), before.as_slice());
        prop_assert_eq!(ladder.best_price(), best_before);
    }

    #[test]
    fn mixed_operations_preserve_invariants(
        side in any_side(),
        ops in prop::collection::vec((any::<bool>(), 950u32..1050, 1u32..500), 1..500),
    ) {
        let mut ladder = Ladder::new(side);
        for (is_insert, price, qty) in ops {
            if is_insert {
                ladder.insert(price, qty);
            } else {
                ladder.reduce(price, qty);
            }
            assert_sorted(&ladder);
        }
    }
}
