// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Published materializations and iteration over them.

use std::iter::FusedIterator;
use std::ops::Deref;
use std::sync::Arc;

/// One published materialization of a [`MergeView`](crate::MergeView).
///
/// Cheap to clone. A snapshot outlives invalidation of the view it came from;
/// it simply stops being the view's current materialization.
#[derive(Debug)]
pub struct Snapshot<T> {
    items: Arc<[T]>,
}

impl<T> Snapshot<T> {
    pub(crate) fn new(items: Arc<[T]>) -> Self {
        Self { items }
    }

    /// Returns `true` if both snapshots are the same materialization.
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        Arc::ptr_eq(&this.items, &other.items)
    }

    /// Borrow the merged records.
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }
}

impl<T> Clone for Snapshot<T> {
    fn clone(&self) -> Self {
        Self {
            items: Arc::clone(&self.items),
        }
    }
}

impl<T> Deref for Snapshot<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.items
    }
}

impl<T> AsRef<[T]> for Snapshot<T> {
    fn as_ref(&self) -> &[T] {
        &self.items
    }
}

impl<'a, T> IntoIterator for &'a Snapshot<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T: Clone> IntoIterator for Snapshot<T> {
    type Item = T;
    type IntoIter = Iter<T>;

    fn into_iter(self) -> Iter<T> {
        Iter::new(self.items)
    }
}

/// Owning forward iterator over one materialization, yielding clones.
///
/// Holds its snapshot alive, so invalidating the view mid-iteration is safe.
#[derive(Debug, Clone)]
pub struct Iter<T> {
    items: Arc<[T]>,
    front: usize,
    back: usize,
}

impl<T> Iter<T> {
    fn new(items: Arc<[T]>) -> Self {
        let back = items.len();
        Self {
            items,
            front: 0,
            back,
        }
    }
}

impl<T: Clone> Iterator for Iter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.front == self.back {
            return None;
        }
        let item = self.items.get(self.front).cloned();
        self.front += 1;
        item
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back - self.front;
        (remaining, Some(remaining))
    }
}

impl<T: Clone> DoubleEndedIterator for Iter<T> {
    fn next_back(&mut self) -> Option<T> {
        if self.front == self.back {
            return None;
        }
        self.back -= 1;
        self.items.get(self.back).cloned()
    }
}

impl<T: Clone> ExactSizeIterator for Iter<T> {}

impl<T: Clone> FusedIterator for Iter<T> {}
