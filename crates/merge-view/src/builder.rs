// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Validating, dynamically typed construction of a [`MergeView`].

use std::convert::Infallible;
use std::fmt;

use crate::strategy::Pairwise;
use crate::{MergeError, MergeView, Sequence};

/// Boxed equivalence predicate used by [`MergeViewBuilder`].
pub type Predicate<T> = Box<dyn Fn(&T, &T) -> bool + Send + Sync>;

/// Boxed merge function used by [`MergeViewBuilder`].
pub type MergeFn<T> = Box<dyn Fn(T, T) -> T + Send + Sync>;

/// Assembles a [`MergeView`] whose predicate and merge function are decided at
/// runtime.
///
/// Both callbacks are required; [`build`](MergeViewBuilder::build) rejects a
/// builder missing either one before any source is read. Sources are optional
/// and default to none.
///
/// The predicate always sees the running accumulator, so a merge function
/// that keeps the key keeps each class stable.
///
/// ```
/// use merge_view::MergeViewBuilder;
///
/// let view = MergeViewBuilder::new()
///     .key(|n: &i32| n % 3)
///     .merge(|a, b| a.max(b))
///     .source(vec![1, 2, 3])
///     .source(vec![4, 5])
///     .build()
///     .unwrap();
/// assert_eq!(view.iter().unwrap().collect::<Vec<_>>(), vec![4, 5, 3]);
/// ```
pub struct MergeViewBuilder<T, S> {
    should_merge: Option<Predicate<T>>,
    merge: Option<MergeFn<T>>,
    sources: Vec<S>,
}

impl<T, S> MergeViewBuilder<T, S> {
    /// Empty builder: no callbacks, no sources.
    pub fn new() -> Self {
        Self {
            should_merge: None,
            merge: None,
            sources: Vec::new(),
        }
    }

    /// Set the equivalence predicate.
    pub fn should_merge(
        mut self,
        should_merge: impl Fn(&T, &T) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.should_merge = Some(Box::new(should_merge));
        self
    }

    /// Set the merge function.
    pub fn merge(mut self, merge: impl Fn(T, T) -> T + Send + Sync + 'static) -> Self {
        self.merge = Some(Box::new(merge));
        self
    }

    /// Derive the predicate from key equality.
    pub fn key<K: PartialEq>(self, key: impl Fn(&T) -> K + Send + Sync + 'static) -> Self
    where
        T: 'static,
    {
        self.should_merge(move |a, b| key(a) == key(b))
    }

    /// Merge keeps the earliest record of each class.
    pub fn keep_first(self) -> Self
    where
        T: 'static,
    {
        self.merge(|acc, _candidate| acc)
    }

    /// Merge keeps the most recently scanned record of each class.
    pub fn keep_last(self) -> Self
    where
        T: 'static,
    {
        self.merge(|_acc, candidate| candidate)
    }

    /// Append one source after those already supplied.
    pub fn source(mut self, source: S) -> Self {
        self.sources.push(source);
        self
    }

    /// Append several sources, in iteration order.
    pub fn sources(mut self, sources: impl IntoIterator<Item = S>) -> Self {
        self.sources.extend(sources);
        self
    }

    /// Finish construction. Sources are not read.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::InvalidArgument`] if the predicate or the merge
    /// function was never set.
    pub fn build(
        self,
    ) -> Result<MergeView<T, S, Pairwise<Predicate<T>, MergeFn<T>>>, MergeError<Infallible>>
    where
        S: Sequence<T>,
    {
        let should_merge = self
            .should_merge
            .ok_or(MergeError::InvalidArgument("equivalence predicate"))?;
        let merge = self
            .merge
            .ok_or(MergeError::InvalidArgument("merge function"))?;
        Ok(MergeView::new(Pairwise::new(should_merge, merge), self.sources))
    }
}

impl<T, S> Default for MergeViewBuilder<T, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, S> fmt::Debug for MergeViewBuilder<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MergeViewBuilder")
            .field("should_merge", &self.should_merge.is_some())
            .field("merge", &self.merge.is_some())
            .field("sources", &self.sources.len())
            .finish()
    }
}
