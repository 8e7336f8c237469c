// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]
use std::convert::Infallible;
use std::sync::{Arc, RwLock};

use merge_view::{Arity, MergeError, MergeView, Sequence, Snapshot};

mod common;
use common::{init_tracing, keep_first_flagged, rec, same_id, Calls, Rec};

// ── 1. zero inputs ──────────────────────────────────────────────────────

#[test]
fn zero_sources_is_empty() {
    init_tracing();
    let view = MergeView::take_first(same_id, Vec::<Vec<Rec>>::new());
    assert_eq!(view.len().unwrap(), 0);
    assert!(view.is_empty().unwrap());
    assert_eq!(view.iter().unwrap().count(), 0);
}

// ── 2. single source passes through untouched ───────────────────────────

#[test]
fn single_source_never_calls_strategy() {
    init_tracing();
    let predicate_calls = Calls::default();
    let merge_calls = Calls::default();
    let only = vec![rec(1, "a"), rec(1, "b"), rec(2, "c")];
    let view = MergeView::pairwise(
        |a: &Rec, b: &Rec| {
            predicate_calls.hit();
            same_id(a, b)
        },
        |a: Rec, b: Rec| {
            merge_calls.hit();
            keep_first_flagged(a, b)
        },
        [only.as_slice()],
    );
    let out: Vec<Rec> = view.iter().unwrap().collect();
    assert_eq!(out, only);
    assert_eq!(predicate_calls.get(), 0);
    assert_eq!(merge_calls.get(), 0);
}

// ── 3. two inputs, one match ────────────────────────────────────────────

#[test]
fn two_sources_one_match_orders_by_first_occurrence() {
    init_tracing();
    let left = vec![rec(1, "a"), rec(2, "b")];
    let right = vec![rec(1, "c")];
    let view = MergeView::pairwise(same_id, keep_first_flagged, [&left, &right]);
    assert_eq!(view.len().unwrap(), 2);
    assert_eq!(
        view.at(0).unwrap(),
        Rec {
            id: 1,
            v: "a".to_owned(),
            merged: true
        }
    );
    assert_eq!(view.at(1).unwrap(), rec(2, "b"));
}

// ── 4. chained merge folds left to right ────────────────────────────────

#[test]
fn three_matches_merge_exactly_twice_in_supply_order() {
    init_tracing();
    let calls = RwLock::new(Vec::new());
    let sources = [vec![rec(7, "x")], vec![rec(7, "y")], vec![rec(7, "z")]];
    let view = MergeView::pairwise(
        same_id,
        |acc: Rec, next: Rec| {
            calls
                .write()
                .unwrap()
                .push((acc.v.clone(), next.v.clone()));
            Rec {
                v: format!("{}{}", acc.v, next.v),
                ..acc
            }
        },
        &sources,
    );
    assert_eq!(view.at(0).unwrap().v, "xyz");
    assert_eq!(
        *calls.read().unwrap(),
        vec![
            ("x".to_owned(), "y".to_owned()),
            ("xy".to_owned(), "z".to_owned())
        ]
    );
}

// ── 5. take-first vs take-last ──────────────────────────────────────────

#[test]
fn take_first_and_take_last_pick_by_supply_order() {
    init_tracing();
    let earlier = vec![rec(1, "a"), rec(2, "b")];
    let later = vec![rec(1, "c")];

    let first = MergeView::take_first(same_id, [&earlier, &later]);
    let last = MergeView::take_last(same_id, [&earlier, &later]);

    assert_eq!(first.at(0).unwrap(), rec(1, "a"));
    assert_eq!(last.at(0).unwrap(), rec(1, "c"));
    assert_eq!(first.at(1).unwrap(), last.at(1).unwrap());
}

// ── 6. cache stability and invalidation ─────────────────────────────────

#[test]
fn cache_ignores_mutation_until_invalidated() {
    init_tracing();
    let left = Arc::new(RwLock::new(vec![rec(1, "a")]));
    let right = Arc::new(RwLock::new(vec![rec(2, "b")]));
    let view = MergeView::take_last(same_id, [Arc::clone(&left), Arc::clone(&right)]);

    let before = view.snapshot().unwrap();
    right.write().unwrap().push(rec(1, "z"));

    let again = view.snapshot().unwrap();
    assert!(Snapshot::ptr_eq(&before, &again));
    assert_eq!(view.len().unwrap(), 2);
    assert_eq!(view.at(0).unwrap(), rec(1, "a"));

    view.invalidate();
    let after = view.snapshot().unwrap();
    assert!(!Snapshot::ptr_eq(&before, &after));
    assert_eq!(after.as_slice(), &[rec(1, "z"), rec(2, "b")]);
    // The old snapshot is still readable.
    assert_eq!(before.as_slice(), &[rec(1, "a"), rec(2, "b")]);
}

#[test]
fn iteration_is_restartable_over_one_materialization() {
    init_tracing();
    let merges = Calls::default();
    let view = MergeView::pairwise(
        same_id,
        |a: Rec, b: Rec| {
            merges.hit();
            keep_first_flagged(a, b)
        },
        [vec![rec(1, "a")], vec![rec(1, "b"), rec(3, "c")]],
    );
    let first: Vec<Rec> = view.iter().unwrap().collect();
    let second: Vec<Rec> = view.iter().unwrap().collect();
    assert_eq!(first, second);
    assert_eq!(merges.get(), 1);
}

// ── 7. out-of-range access ──────────────────────────────────────────────

#[test]
fn negative_and_past_end_indices_are_rejected() {
    init_tracing();
    let view = MergeView::take_first(same_id, [vec![rec(1, "a")], vec![rec(2, "b")]]);
    let len = view.len().unwrap();

    assert_eq!(
        view.at(-1).unwrap_err(),
        MergeError::IndexOutOfRange { index: -1, len: 2 }
    );
    assert_eq!(
        view.at(len).unwrap_err(),
        MergeError::IndexOutOfRange { index: 2, len: 2 }
    );
    assert!(view.at(len - 1).is_ok());
    assert_eq!(
        view.at(-1_i64).unwrap_err().to_string(),
        "[MERGE_INDEX_OUT_OF_RANGE] index -1 outside merged view of length 2"
    );
}

// ── 8. idempotent invalidation ──────────────────────────────────────────

#[test]
fn invalidating_cold_view_is_noop() {
    init_tracing();
    let view = MergeView::take_first(same_id, [vec![rec(1, "a")]]);
    view.invalidate();
    view.invalidate();
    assert!(!view.is_materialized());
    assert_eq!(view.len().unwrap(), 1);
    view.invalidate();
    view.invalidate();
    assert!(!view.is_materialized());
}

// ── 9. propagated strategy failures are not cached ──────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
struct Conflict(u32);

#[test]
fn strategy_failure_propagates_and_retries() {
    init_tracing();
    let fail = RwLock::new(true);
    let view = MergeView::try_pairwise(
        |a: &Rec, b: &Rec| Ok(same_id(a, b)),
        |a: Rec, b: Rec| {
            if *fail.read().unwrap() {
                Err(Conflict(a.id))
            } else {
                Ok(Rec { v: b.v, ..a })
            }
        },
        [vec![rec(4, "old")], vec![rec(4, "new")]],
    );

    let err = view.len().unwrap_err();
    assert_eq!(err.into_propagated(), Some(Conflict(4)));
    assert!(!view.is_materialized());

    *fail.write().unwrap() = false;
    assert_eq!(view.at(0).unwrap().v, "new");
    assert!(view.is_materialized());
}

// ── 10. by-key constructors ─────────────────────────────────────────────

#[test]
fn by_key_variants_agree() {
    init_tracing();
    let left = vec![(1u32, 10u32), (2, 20)];
    let right = vec![(2u32, 5u32), (3, 1), (1, 1)];
    let key = |r: &(u32, u32)| r.0;
    let sum = |a: (u32, u32), b: (u32, u32)| (a.0, a.1 + b.1);

    let plain = MergeView::by_key(key, sum, [&left, &right]);
    let with = MergeView::by_key_with(key, |a: &u32, b: &u32| a == b, sum, [&left, &right]);
    let hashed = MergeView::by_key_hashed(key, sum, [&left, &right]);

    let expected = vec![(1, 11), (2, 25), (3, 1)];
    assert_eq!(plain.snapshot().unwrap().as_slice(), expected.as_slice());
    assert_eq!(with.snapshot().unwrap().as_slice(), expected.as_slice());
    assert_eq!(hashed.snapshot().unwrap().as_slice(), expected.as_slice());
}

// ── 11. heterogeneous source shapes ─────────────────────────────────────

#[test]
fn boxed_sources_of_different_shapes_merge() {
    init_tracing();
    let arity: Arity<u8> = [1, 2].into_iter().collect();
    let shared: Arc<[u8]> = Arc::from(vec![2, 3]);
    let sources: Vec<Box<dyn Sequence<u8>>> = vec![
        Box::new(arity),
        Box::new(Arity::One(3u8)),
        Box::new(shared),
        Box::new(Arity::<u8>::Empty),
    ];
    let view = MergeView::take_first(|a: &u8, b: &u8| a == b, sources);
    let out: Vec<u8> = view.iter().unwrap().collect();
    assert_eq!(out, vec![1, 2, 3]);
    assert_eq!(view.source_count(), 4);
}

// ── 12. error display codes ─────────────────────────────────────────────

#[test]
fn error_messages_carry_codes() {
    let invalid: MergeError<Infallible> = MergeError::InvalidArgument("merge function");
    assert_eq!(
        invalid.to_string(),
        "[MERGE_INVALID_ARGUMENT] merge function is required"
    );
    let failed: MergeError<String> = MergeError::Propagated("boom".to_owned());
    assert_eq!(failed.to_string(), "[MERGE_STRATEGY_FAILED] boom");
    assert_eq!(invalid.into_propagated(), None);
}
