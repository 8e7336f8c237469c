// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Merge strategies: the equivalence predicate and fold a view is built from.
//!
//! Every strategy folds through [`pairwise_fold`] unless it overrides
//! [`MergeStrategy::fold`]. [`HashedByKey`] is the only override.

use std::collections::hash_map::Entry;
use std::convert::Infallible;
use std::hash::Hash;

use rustc_hash::FxHashMap;

/// Decides which records collapse together and how.
///
/// `should_merge` is asked with the running accumulator of a class on the left
/// and a later, still unconsumed record on the right. `merge` is only called
/// after `should_merge` accepted the same pair.
///
/// Neither transitivity, symmetry nor reflexivity is assumed. The scan order
/// documented on [`pairwise_fold`] is the tie-break for predicates that lack them.
pub trait MergeStrategy<T> {
    /// Error raised by the callbacks. Use [`Infallible`] when they cannot fail.
    type Error;

    /// Whether `candidate` belongs to the class currently folded into `acc`.
    fn should_merge(&self, acc: &T, candidate: &T) -> Result<bool, Self::Error>;

    /// Fold `candidate` into `acc`.
    fn merge(&self, acc: T, candidate: T) -> Result<T, Self::Error>;

    /// Partition `scratch` into classes and fold each one.
    ///
    /// Overrides must produce exactly what [`pairwise_fold`] would.
    fn fold(&self, scratch: Vec<T>) -> Result<Vec<T>, Self::Error> {
        pairwise_fold(self, scratch)
    }
}

/// The reference O(n²) scan.
///
/// For each unconsumed position `i`, ascending: take `scratch[i]` as the
/// accumulator, then visit every unconsumed `j > i`, ascending, folding in each
/// record the strategy accepts. The finished accumulator is appended. Output
/// order is the position of each class's first member.
///
/// On error the partially folded scratch is dropped.
pub fn pairwise_fold<T, M>(strategy: &M, scratch: Vec<T>) -> Result<Vec<T>, M::Error>
where
    M: MergeStrategy<T> + ?Sized,
{
    // `None` marks a consumed position.
    let mut slots: Vec<Option<T>> = scratch.into_iter().map(Some).collect();
    let mut out = Vec::new();
    for i in 0..slots.len() {
        let (head, tail) = slots.split_at_mut(i + 1);
        let Some(mut acc) = head.last_mut().and_then(Option::take) else {
            continue;
        };
        for slot in tail.iter_mut() {
            let accepted = match slot.as_ref() {
                Some(candidate) => strategy.should_merge(&acc, candidate)?,
                None => false,
            };
            if accepted {
                if let Some(candidate) = slot.take() {
                    acc = strategy.merge(acc, candidate)?;
                }
            }
        }
        out.push(acc);
    }
    Ok(out)
}

/// Infallible predicate + merge closure pair.
#[derive(Clone, Copy, Debug)]
pub struct Pairwise<P, F> {
    should_merge: P,
    merge: F,
}

impl<P, F> Pairwise<P, F> {
    /// Pair a predicate with a merge function.
    pub fn new(should_merge: P, merge: F) -> Self {
        Self {
            should_merge,
            merge,
        }
    }
}

impl<T, P, F> MergeStrategy<T> for Pairwise<P, F>
where
    P: Fn(&T, &T) -> bool,
    F: Fn(T, T) -> T,
{
    type Error = Infallible;

    fn should_merge(&self, acc: &T, candidate: &T) -> Result<bool, Infallible> {
        Ok((self.should_merge)(acc, candidate))
    }

    fn merge(&self, acc: T, candidate: T) -> Result<T, Infallible> {
        Ok((self.merge)(acc, candidate))
    }
}

/// Predicate + merge closure pair whose callbacks may fail with `E`.
///
/// The first error aborts materialization and reaches the caller unchanged
/// inside [`MergeError::Propagated`](crate::MergeError::Propagated).
#[derive(Clone, Copy, Debug)]
pub struct Fallible<P, F> {
    should_merge: P,
    merge: F,
}

impl<P, F> Fallible<P, F> {
    /// Pair a fallible predicate with a fallible merge function.
    pub fn new(should_merge: P, merge: F) -> Self {
        Self {
            should_merge,
            merge,
        }
    }
}

impl<T, E, P, F> MergeStrategy<T> for Fallible<P, F>
where
    P: Fn(&T, &T) -> Result<bool, E>,
    F: Fn(T, T) -> Result<T, E>,
{
    type Error = E;

    fn should_merge(&self, acc: &T, candidate: &T) -> Result<bool, E> {
        (self.should_merge)(acc, candidate)
    }

    fn merge(&self, acc: T, candidate: T) -> Result<T, E> {
        (self.merge)(acc, candidate)
    }
}

/// Keeps the earliest record of each class; later matches are discarded.
#[derive(Clone, Copy, Debug)]
pub struct TakeFirst<P>(pub P);

impl<T, P> MergeStrategy<T> for TakeFirst<P>
where
    P: Fn(&T, &T) -> bool,
{
    type Error = Infallible;

    fn should_merge(&self, acc: &T, candidate: &T) -> Result<bool, Infallible> {
        Ok((self.0)(acc, candidate))
    }

    fn merge(&self, acc: T, _candidate: T) -> Result<T, Infallible> {
        Ok(acc)
    }
}

/// Keeps the most recently scanned record of each class.
///
/// The predicate keeps seeing the latest winner as its accumulator.
#[derive(Clone, Copy, Debug)]
pub struct TakeLast<P>(pub P);

impl<T, P> MergeStrategy<T> for TakeLast<P>
where
    P: Fn(&T, &T) -> bool,
{
    type Error = Infallible;

    fn should_merge(&self, acc: &T, candidate: &T) -> Result<bool, Infallible> {
        Ok((self.0)(acc, candidate))
    }

    fn merge(&self, _acc: T, candidate: T) -> Result<T, Infallible> {
        Ok(candidate)
    }
}

/// Records match when `key_eq(key(a), key(b))` holds.
#[derive(Clone, Copy, Debug)]
pub struct ByKey<K, Q, F> {
    key: K,
    key_eq: Q,
    merge: F,
}

impl<K, Q, F> ByKey<K, Q, F> {
    /// Derive the predicate from a key extractor and a key comparison.
    pub fn new(key: K, key_eq: Q, merge: F) -> Self {
        Self { key, key_eq, merge }
    }
}

impl<T, Key, K, Q, F> MergeStrategy<T> for ByKey<K, Q, F>
where
    K: Fn(&T) -> Key,
    Q: Fn(&Key, &Key) -> bool,
    F: Fn(T, T) -> T,
{
    type Error = Infallible;

    fn should_merge(&self, acc: &T, candidate: &T) -> Result<bool, Infallible> {
        Ok((self.key_eq)(&(self.key)(acc), &(self.key)(candidate)))
    }

    fn merge(&self, acc: T, candidate: T) -> Result<T, Infallible> {
        Ok((self.merge)(acc, candidate))
    }
}

/// By-key matching over a hashable key, folded in one pass.
///
/// Agrees with [`pairwise_fold`] as long as `merge` returns a record with the
/// same key as its accumulator. A merge that rewrites keys must use [`ByKey`].
#[derive(Clone, Copy, Debug)]
pub struct HashedByKey<K, F> {
    key: K,
    merge: F,
}

impl<K, F> HashedByKey<K, F> {
    /// Derive the predicate from a hashable key extractor.
    pub fn new(key: K, merge: F) -> Self {
        Self { key, merge }
    }
}

impl<T, Key, K, F> MergeStrategy<T> for HashedByKey<K, F>
where
    K: Fn(&T) -> Key,
    Key: Hash + Eq,
    F: Fn(T, T) -> T,
{
    type Error = Infallible;

    fn should_merge(&self, acc: &T, candidate: &T) -> Result<bool, Infallible> {
        Ok((self.key)(acc) == (self.key)(candidate))
    }

    fn merge(&self, acc: T, candidate: T) -> Result<T, Infallible> {
        Ok((self.merge)(acc, candidate))
    }

    fn fold(&self, scratch: Vec<T>) -> Result<Vec<T>, Infallible> {
        let mut first_seen: FxHashMap<Key, usize> = FxHashMap::default();
        let mut classes: Vec<Option<T>> = Vec::new();
        for record in scratch {
            match first_seen.entry((self.key)(&record)) {
                Entry::Occupied(entry) => {
                    if let Some(slot) = classes.get_mut(*entry.get()) {
                        if let Some(acc) = slot.take() {
                            *slot = Some((self.merge)(acc, record));
                        }
                    }
                }
                Entry::Vacant(entry) => {
                    entry.insert(classes.len());
                    classes.push(Some(record));
                }
            }
        }
        Ok(classes.into_iter().flatten().collect())
    }
}
