// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The memoized merge view.

use std::fmt;
use std::hash::Hash;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, trace};

use crate::snapshot::{Iter, Snapshot};
use crate::strategy::{ByKey, Fallible, HashedByKey, MergeStrategy, Pairwise, TakeFirst, TakeLast};
use crate::{MergeError, Sequence};

/// Lazily materialized merge of N ordered sources.
///
/// The view holds its sources and a strategy, and nothing else until the first
/// read. Reads share one published [`Snapshot`] until [`invalidate`] resets the
/// cache; the view never notices source mutation on its own.
///
/// # Concurrency
///
/// First access is serialized behind a write lock and re-checked, so concurrent
/// readers of a cold view trigger exactly one materialization and never see a
/// partial result. A failed materialization publishes nothing.
///
/// [`invalidate`]: MergeView::invalidate
pub struct MergeView<T, S, M> {
    strategy: M,
    sources: Vec<S>,
    cache: RwLock<Option<Arc<[T]>>>,
}

impl<T, S, M> MergeView<T, S, M>
where
    S: Sequence<T>,
    M: MergeStrategy<T>,
{
    /// Build a view from an explicit strategy. Sources are not read.
    ///
    /// An empty `sources` is a valid zero-input view.
    pub fn new(strategy: M, sources: impl IntoIterator<Item = S>) -> Self {
        Self {
            strategy,
            sources: sources.into_iter().collect(),
            cache: RwLock::new(None),
        }
    }

    /// Current materialization, computing it first if the cache is cold.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::Propagated`] if the strategy fails. The cache stays
    /// cold and the next read retries from scratch.
    pub fn snapshot(&self) -> Result<Snapshot<T>, MergeError<M::Error>> {
        if let Some(items) = self.cached() {
            return Ok(Snapshot::new(items));
        }
        let mut slot = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        // Another reader may have published while we waited for the lock.
        if let Some(items) = slot.as_ref() {
            return Ok(Snapshot::new(Arc::clone(items)));
        }
        let items: Arc<[T]> = self.materialize().map_err(MergeError::Propagated)?.into();
        *slot = Some(Arc::clone(&items));
        Ok(Snapshot::new(items))
    }

    /// Number of merged records.
    ///
    /// # Errors
    ///
    /// Same as [`snapshot`](MergeView::snapshot).
    pub fn len(&self) -> Result<usize, MergeError<M::Error>> {
        Ok(self.snapshot()?.len())
    }

    /// Returns `true` if the merged view holds no records.
    ///
    /// # Errors
    ///
    /// Same as [`snapshot`](MergeView::snapshot).
    pub fn is_empty(&self) -> Result<bool, MergeError<M::Error>> {
        Ok(self.snapshot()?.is_empty())
    }

    /// Merged record at `index`.
    ///
    /// Accepts any primitive integer so that negative requests are reported
    /// rather than wrapped.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::IndexOutOfRange`] for `index < 0` or
    /// `index >= len()`, or whatever [`snapshot`](MergeView::snapshot) returns.
    pub fn at<I>(&self, index: I) -> Result<T, MergeError<M::Error>>
    where
        I: TryInto<usize> + TryInto<i128> + Copy,
        T: Clone,
    {
        let items = self.snapshot()?;
        <I as TryInto<usize>>::try_into(index)
            .ok()
            .and_then(|position| items.get(position))
            .cloned()
            .ok_or_else(|| MergeError::IndexOutOfRange {
                index: <I as TryInto<i128>>::try_into(index).unwrap_or(i128::MAX),
                len: items.len(),
            })
    }

    /// Fresh iterator over the current materialization.
    ///
    /// Each call restarts from the first record and shares the cached result.
    ///
    /// # Errors
    ///
    /// Same as [`snapshot`](MergeView::snapshot).
    #[allow(clippy::iter_not_returning_iterator)] // fallible, Ok wraps an iterator
    pub fn iter(&self) -> Result<Iter<T>, MergeError<M::Error>>
    where
        T: Clone,
    {
        Ok(self.snapshot()?.into_iter())
    }

    /// Drop the cached materialization. Sources are untouched.
    ///
    /// The next read recomputes from the sources' current contents. Calling this
    /// on a cold view is a no-op. Snapshots already handed out stay valid.
    pub fn invalidate(&self) {
        let mut slot = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        if slot.take().is_some() {
            trace!("merge view invalidated");
        }
    }

    /// Returns `true` if a materialization is currently cached.
    pub fn is_materialized(&self) -> bool {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// The sources, in supply order.
    pub fn sources(&self) -> &[S] {
        &self.sources
    }

    /// Number of sources supplied at construction.
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// The strategy this view folds with.
    pub fn strategy(&self) -> &M {
        &self.strategy
    }

    /// Consume the view and hand the sources back.
    pub fn into_sources(self) -> Vec<S> {
        self.sources
    }

    fn cached(&self) -> Option<Arc<[T]>> {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn materialize(&self) -> Result<Vec<T>, M::Error> {
        match self.sources.as_slice() {
            [] => {
                trace!("merge view has no sources");
                Ok(Vec::new())
            }
            // A lone source is never folded, even if its own records would match.
            [only] => {
                let mut out = Vec::with_capacity(only.len());
                only.append_to(&mut out);
                trace!(len = out.len(), "merge view passed single source through");
                Ok(out)
            }
            sources => {
                let total = sources.iter().map(S::len).sum();
                let mut scratch = Vec::with_capacity(total);
                for source in sources {
                    source.append_to(&mut scratch);
                }
                let scratch_len = scratch.len();
                let merged = self.strategy.fold(scratch)?;
                debug!(
                    sources = sources.len(),
                    scratch_len,
                    merged_len = merged.len(),
                    "merge view materialized"
                );
                Ok(merged)
            }
        }
    }
}

impl<T, S, P, F> MergeView<T, S, Pairwise<P, F>>
where
    S: Sequence<T>,
    P: Fn(&T, &T) -> bool,
    F: Fn(T, T) -> T,
{
    /// Merge records for which `should_merge` holds, folding them with `merge`.
    pub fn pairwise(should_merge: P, merge: F, sources: impl IntoIterator<Item = S>) -> Self {
        Self::new(Pairwise::new(should_merge, merge), sources)
    }
}

impl<T, E, S, P, F> MergeView<T, S, Fallible<P, F>>
where
    S: Sequence<T>,
    P: Fn(&T, &T) -> Result<bool, E>,
    F: Fn(T, T) -> Result<T, E>,
{
    /// Like [`pairwise`](MergeView::pairwise), with callbacks that may fail.
    ///
    /// Failures surface from the read that triggered materialization as
    /// [`MergeError::Propagated`].
    pub fn try_pairwise(should_merge: P, merge: F, sources: impl IntoIterator<Item = S>) -> Self {
        Self::new(Fallible::new(should_merge, merge), sources)
    }
}

impl<T, S, P> MergeView<T, S, TakeFirst<P>>
where
    S: Sequence<T>,
    P: Fn(&T, &T) -> bool,
{
    /// Keep the earliest record of each class in concatenation order.
    pub fn take_first(should_merge: P, sources: impl IntoIterator<Item = S>) -> Self {
        Self::new(TakeFirst(should_merge), sources)
    }
}

impl<T, S, P> MergeView<T, S, TakeLast<P>>
where
    S: Sequence<T>,
    P: Fn(&T, &T) -> bool,
{
    /// Keep the most recently scanned record of each class.
    pub fn take_last(should_merge: P, sources: impl IntoIterator<Item = S>) -> Self {
        Self::new(TakeLast(should_merge), sources)
    }
}

impl<T, Key, S, K, Q, F> MergeView<T, S, ByKey<K, Q, F>>
where
    S: Sequence<T>,
    K: Fn(&T) -> Key,
    Q: Fn(&Key, &Key) -> bool,
    F: Fn(T, T) -> T,
{
    /// Records match when `key_eq` holds on their extracted keys.
    pub fn by_key_with(key: K, key_eq: Q, merge: F, sources: impl IntoIterator<Item = S>) -> Self {
        Self::new(ByKey::new(key, key_eq, merge), sources)
    }
}

impl<T, Key, S, K, F> MergeView<T, S, ByKey<K, fn(&Key, &Key) -> bool, F>>
where
    S: Sequence<T>,
    K: Fn(&T) -> Key,
    Key: PartialEq,
    F: Fn(T, T) -> T,
{
    /// Records match when their extracted keys are equal.
    pub fn by_key(key: K, merge: F, sources: impl IntoIterator<Item = S>) -> Self {
        let key_eq: fn(&Key, &Key) -> bool = <Key as PartialEq>::eq;
        Self::new(ByKey::new(key, key_eq, merge), sources)
    }
}

impl<T, Key, S, K, F> MergeView<T, S, HashedByKey<K, F>>
where
    S: Sequence<T>,
    K: Fn(&T) -> Key,
    Key: Hash + Eq,
    F: Fn(T, T) -> T,
{
    /// Key-equality merge folded in a single hashed pass.
    ///
    /// `merge` must return a record whose key equals its first argument's;
    /// under that condition the result matches [`by_key`](MergeView::by_key).
    pub fn by_key_hashed(key: K, merge: F, sources: impl IntoIterator<Item = S>) -> Self {
        Self::new(HashedByKey::new(key, merge), sources)
    }
}

impl<T, S, M> fmt::Debug for MergeView<T, S, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let materialized_len = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_deref()
            .map(<[T]>::len);
        f.debug_struct("MergeView")
            .field("sources", &self.sources.len())
            .field("materialized_len", &materialized_len)
            .finish_non_exhaustive()
    }
}
