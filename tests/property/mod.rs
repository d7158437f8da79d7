//! Property-based testing for seedpath
//!
//! Uses proptest to check the combinator and similarity invariants across
//! randomly generated inputs.

use ::seedpath::similarity::PathMatcher;
use ::seedpath::*;
use proptest::prelude::*;
use std::collections::BTreeSet;

/// Key names and item counts, at least one item per key
fn lengths_strategy() -> impl Strategy<Value = Vec<usize>> {
    prop::collection::vec(1usize..4, 0..5)
}

fn combinator_for(lengths: &[usize]) -> Combinator<String, usize> {
    Combinator::new(
        lengths
            .iter()
            .enumerate()
            .map(|(k, &len)| (format!("k{k}"), (0..len).collect())),
    )
}

fn values(assignment: &[(String, usize)]) -> Vec<usize> {
    assignment.iter().map(|(_, v)| *v).collect()
}

proptest! {
    #[test]
    fn prop_yields_full_product_without_repeats(lengths in lengths_strategy()) {
        let all: Vec<Vec<usize>> = combinator_for(&lengths).map(|a| values(&a)).collect();

        let expected: usize = lengths.iter().product();
        prop_assert_eq!(all.len(), expected);

        let unique: BTreeSet<&Vec<usize>> = all.iter().collect();
        prop_assert_eq!(unique.len(), all.len());

        // Odometer order is lexicographic order of the cursors
        let mut sorted = all.clone();
        sorted.sort();
        prop_assert_eq!(sorted, all);
    }

    #[test]
    fn prop_keys_keep_registration_order(lengths in lengths_strategy()) {
        let keys: Vec<String> = (0..lengths.len()).map(|k| format!("k{k}")).collect();
        for assignment in combinator_for(&lengths) {
            let names: Vec<String> = assignment.into_iter().map(|(k, _)| k).collect();
            prop_assert_eq!(&names, &keys);
        }
    }

    #[test]
    fn prop_empty_item_list_empties_product(
        lengths in lengths_strategy(),
        position in any::<prop::sample::Index>()
    ) {
        let mut lengths = lengths;
        let index = position.index(lengths.len() + 1);
        lengths.insert(index, 0);
        prop_assert_eq!(combinator_for(&lengths).count(), 0);
    }

    #[test]
    fn prop_locked_keys_keep_their_value(
        lengths in prop::collection::vec(1usize..4, 1..5),
        skip in 0usize..6,
        lock_mask in prop::collection::vec(any::<bool>(), 5)
    ) {
        let mut combinator = combinator_for(&lengths);
        let total: usize = lengths.iter().product();
        let skip = skip.min(total - 1);

        let mut seen: Vec<Vec<usize>> = Vec::new();
        for _ in 0..=skip {
            seen.push(values(&combinator.next().unwrap()));
        }
        let current = seen.last().unwrap().clone();

        let locked: Vec<String> = (0..lengths.len())
            .filter(|&k| lock_mask[k])
            .map(|k| format!("k{k}"))
            .collect();
        combinator.lock(&locked).unwrap();
        prop_assert_eq!(combinator.locked_count(), locked.len());

        for assignment in combinator.by_ref() {
            let assignment = values(&assignment);
            for k in (0..lengths.len()).filter(|&k| lock_mask[k]) {
                prop_assert_eq!(assignment[k], current[k]);
            }
            prop_assert!(!seen.contains(&assignment));
            seen.push(assignment);
        }
        prop_assert!(combinator.is_exhausted());
        prop_assert_eq!(combinator.next(), None);
    }

    #[test]
    fn prop_lock_with_unknown_key_changes_nothing(lengths in prop::collection::vec(1usize..4, 1..5)) {
        let mut combinator = combinator_for(&lengths);
        let keys = vec!["k0".to_string(), "nope".to_string()];
        let err = combinator.lock(&keys).unwrap_err();
        prop_assert!(matches!(err, SeedpathError::UnknownKey(ref key) if key == "nope"));
        prop_assert_eq!(combinator.locked_count(), 0);
        prop_assert_eq!(combinator.count(), lengths.iter().product::<usize>());
    }

    #[test]
    fn prop_similarity_is_a_ratio(a in "[a-z./ ]{0,20}", b in "[a-z./ ]{0,20}") {
        let ratio = PathMatcher::new(&a).ratio(&b);
        prop_assert!((0.0..=1.0).contains(&ratio));
        if !a.is_empty() {
            prop_assert_eq!(PathMatcher::new(&a).ratio(&a), 1.0);
        }
    }
}
