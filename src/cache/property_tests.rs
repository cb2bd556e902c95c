//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the key codec, matcher and store against arbitrary
//! filter sets.

use std::time::Duration;

use proptest::prelude::*;
use serde_json::json;

use crate::cache::matcher::IDENTICAL_SCORE;
use crate::cache::{
    canonicalize, evaluate, CacheStore, FieldKind, FilterField, FilterSet, FilterValue,
    SearchPayload,
};

// == Test Configuration ==
const DAY: Duration = Duration::from_secs(86_400);

// == Strategies ==
/// Generates a value valid for the given field kind
fn value_strategy(field: FilterField) -> BoxedStrategy<FilterValue> {
    match field.kind() {
        FieldKind::Exact => prop_oneof![
            prop::sample::select(vec!["instagram", "tiktok", "youtube", "US", "fitness"])
                .prop_map(FilterValue::from),
            (1u32..50).prop_map(FilterValue::from),
        ]
        .boxed(),
        FieldKind::RangeMin | FieldKind::RangeMax => {
            (0u32..2_000_000).prop_map(FilterValue::from).boxed()
        }
    }
}

/// Generates (field, value) pairs with distinct fields
fn pairs_strategy() -> impl Strategy<Value = Vec<(FilterField, FilterValue)>> {
    prop::sample::subsequence(FilterField::ALL.to_vec(), 0..=FilterField::ALL.len())
        .prop_flat_map(|fields| {
            fields
                .into_iter()
                .map(|f| value_strategy(f).prop_map(move |v| (f, v)))
                .collect::<Vec<_>>()
        })
}

fn filter_set_strategy() -> impl Strategy<Value = FilterSet> {
    pairs_strategy().prop_map(|pairs| pairs.into_iter().collect())
}

fn range_field_strategy(kind: FieldKind) -> impl Strategy<Value = FilterField> {
    prop::sample::select(FilterField::of_kind(kind).collect::<Vec<_>>())
}

fn build(pairs: &[(FilterField, FilterValue)]) -> FilterSet {
    let mut filters = FilterSet::new();
    for (field, value) in pairs {
        filters.insert(*field, value.clone());
    }
    filters
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    // Canonical key ignores insertion order.
    #[test]
    fn prop_canonicalize_permutation_invariant(
        (pairs, shuffled) in pairs_strategy().prop_flat_map(|pairs| {
            let shuffled = Just(pairs.clone()).prop_shuffle();
            (Just(pairs), shuffled)
        })
    ) {
        let a = canonicalize(&build(&pairs)).unwrap();
        let b = canonicalize(&build(&shuffled)).unwrap();
        prop_assert_eq!(a, b);
    }

    // Distinct filter sets get distinct keys.
    #[test]
    fn prop_canonicalize_distinguishes(a in filter_set_strategy(), b in filter_set_strategy()) {
        let ka = canonicalize(&a).unwrap();
        let kb = canonicalize(&b).unwrap();
        prop_assert_eq!(a == b, ka == kb);
    }

    // A filter set always matches itself with the identical score.
    #[test]
    fn prop_self_match_is_maximal(filters in filter_set_strategy()) {
        let result = evaluate(&filters, &filters.clone());
        prop_assert!(result.is_compatible);
        prop_assert_eq!(result.score, IDENTICAL_SCORE);
    }

    // Range-min: compatible exactly when the cached floor is not above the request.
    #[test]
    fn prop_range_min_subsumption(
        field in range_field_strategy(FieldKind::RangeMin),
        requested in 0u32..1_000_000,
        cached in 0u32..1_000_000,
    ) {
        let req = FilterSet::new().with(field, requested);
        let cand = FilterSet::new().with(field, cached);
        let result = evaluate(&req, &cand);

        prop_assert_eq!(result.is_compatible, cached <= requested);
        if result.is_compatible && cached != requested {
            prop_assert_eq!(result.score, 3);
        }
    }

    // Range-max: compatible exactly when the cached ceiling is not below the request.
    #[test]
    fn prop_range_max_subsumption(
        field in range_field_strategy(FieldKind::RangeMax),
        requested in 0u32..1_000_000,
        cached in 0u32..1_000_000,
    ) {
        let req = FilterSet::new().with(field, requested);
        let cand = FilterSet::new().with(field, cached);

        prop_assert_eq!(evaluate(&req, &cand).is_compatible, cached >= requested);
    }

    // Differing exact values always reject, whatever else matches.
    #[test]
    fn prop_exact_mismatch_rejects(filters in filter_set_strategy()) {
        let requested = filters.clone().with(FilterField::Platform, "instagram");
        let candidate = filters.with(FilterField::Platform, "tiktok");

        let result = evaluate(&requested, &candidate);
        prop_assert!(!result.is_compatible);
        prop_assert_eq!(result.score, 0);
    }

    // Widening any range bound of a cached search keeps it compatible.
    #[test]
    fn prop_widening_keeps_compatibility(filters in filter_set_strategy()) {
        let mut wider = filters.clone();
        for field in FilterField::ALL {
            let bound = filters.get(field).and_then(FilterValue::as_number);
            let widened = match (field.kind(), bound) {
                (FieldKind::RangeMin, Some(n)) => n / 2.0,
                (FieldKind::RangeMax, Some(n)) => n * 2.0,
                _ => continue,
            };
            wider.insert(field, widened);
        }

        prop_assert!(evaluate(&filters, &wider).is_compatible);
    }

    // put followed by get returns the stored payload.
    #[test]
    fn prop_roundtrip_storage(filters in filter_set_strategy(), count in 0u64..10_000) {
        let mut store = CacheStore::in_memory();
        let key = canonicalize(&filters).unwrap();
        let payload = SearchPayload::new(vec![json!({"count": count})], count);

        prop_assert!(store.put(&key, filters.clone(), payload.clone(), DAY).is_stored());

        let entry = store.get(&key).unwrap();
        prop_assert_eq!(entry.payload, payload);
        prop_assert_eq!(entry.filters, filters);
    }

    // Expired entries vanish from get and scan and are physically removed.
    #[test]
    fn prop_zero_ttl_never_served(sets in prop::collection::vec(filter_set_strategy(), 1..10)) {
        let mut store = CacheStore::in_memory();
        for filters in &sets {
            let key = canonicalize(filters).unwrap();
            store.put(&key, filters.clone(), SearchPayload::new(vec![], 0), Duration::ZERO);
        }
        let before = store.stats().total_entries;
        prop_assert!(before >= 1);

        let first = canonicalize(&sets[0]).unwrap();
        prop_assert!(store.get(&first).is_none());
        prop_assert_eq!(store.stats().total_entries, before - 1);

        prop_assert_eq!(store.scan_live().count(), 0);
        prop_assert_eq!(store.stats().total_entries, 0);
    }
}
