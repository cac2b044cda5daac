//! Property-based tests for option tree merging
//!
//! Merging is left-biased per key at every depth: keys only in the base keep
//! their value, later scalar overrides win, and nested mappings are combined
//! rather than replaced.

use generic_api::{recursive_merge, RequestOptions, Value};
use proptest::prelude::*;

/// Strategy for leaf values (everything except mappings)
fn leaf_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        "[a-z]{0,8}".prop_map(Value::String),
        prop::collection::vec(any::<u8>().prop_map(Value::from), 0..4).prop_map(Value::Array),
    ]
}

/// Strategy for option trees up to three levels deep
fn value_strategy() -> impl Strategy<Value = Value> {
    leaf_strategy().prop_recursive(3, 24, 4, |inner| {
        prop::collection::btree_map("[a-d]", inner, 0..4)
            .prop_map(|map| Value::Object(map.into_iter().collect()))
    })
}

fn mapping_strategy() -> impl Strategy<Value = RequestOptions> {
    prop::collection::btree_map("[a-d]", value_strategy(), 0..5)
        .prop_map(|map| map.into_iter().collect())
}

/// Reference check of one merge step, key by key
fn check_merged(base: &RequestOptions, insert: &RequestOptions, merged: &RequestOptions) {
    for (key, value) in base {
        if !insert.contains_key(key) {
            assert_eq!(merged.get(key), Some(value), "base-only key `{key}` changed");
        }
    }

    for (key, value) in insert {
        match (base.get(key), value) {
            (Some(Value::Object(existing)), Value::Object(nested)) => {
                let Some(Value::Object(out)) = merged.get(key) else {
                    panic!("nested mapping `{key}` was replaced");
                };
                check_merged(existing, nested, out);
            }
            _ => assert_eq!(merged.get(key), Some(value), "override `{key}` lost"),
        }
    }

    for key in merged.keys() {
        assert!(
            base.contains_key(key) || insert.contains_key(key),
            "merge invented key `{key}`"
        );
    }
}

proptest! {
    /// Property: one merge step matches the per-key reference rules
    #[test]
    fn prop_single_merge_follows_key_rules(
        base in mapping_strategy(),
        insert in mapping_strategy(),
    ) {
        let merged = recursive_merge(base.clone(), &[Value::Object(insert.clone())]);
        check_merged(&base, &insert, &merged);
    }

    /// Property: merging several overrides equals merging them one at a time
    #[test]
    fn prop_merge_is_left_to_right(
        base in mapping_strategy(),
        overrides in prop::collection::vec(mapping_strategy(), 0..4),
    ) {
        let values: Vec<Value> = overrides.into_iter().map(Value::Object).collect();

        let at_once = recursive_merge(base.clone(), &values);
        let stepwise = values
            .iter()
            .fold(base, |acc, v| recursive_merge(acc, std::iter::once(v)));

        prop_assert_eq!(at_once, stepwise);
    }

    /// Property: the last scalar written to a key wins
    #[test]
    fn prop_last_scalar_wins(
        base in mapping_strategy(),
        first in leaf_strategy(),
        last in leaf_strategy(),
    ) {
        let mut a = RequestOptions::new();
        a.insert("k".to_string(), first);
        let mut b = RequestOptions::new();
        b.insert("k".to_string(), last.clone());

        let merged = recursive_merge(base, &[Value::Object(a), Value::Object(b)]);
        prop_assert_eq!(merged.get("k"), Some(&last));
    }

    /// Property: non-mapping overrides leave the base untouched
    #[test]
    fn prop_non_mapping_overrides_skipped(
        base in mapping_strategy(),
        junk in prop::collection::vec(leaf_strategy(), 0..4),
    ) {
        let merged = recursive_merge(base.clone(), &junk);
        prop_assert_eq!(merged, base);
    }

    /// Property: merging an empty mapping is the identity
    #[test]
    fn prop_empty_override_is_identity(base in mapping_strategy()) {
        let merged = recursive_merge(base.clone(), &[Value::Object(RequestOptions::new())]);
        prop_assert_eq!(merged, base);
    }
}
