// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Append-only source builder that avoids allocating for zero or one record.

use std::sync::Arc;

use crate::Sequence;

/// Append-only container with distinct shapes for zero, one and many records.
///
/// Most merge sources in practice hold zero or one record; only the `Many`
/// shape allocates. Push records, then either hand the `Arity` to a view
/// directly or [`freeze`](Arity::freeze) it into a shared slice.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Arity<T> {
    /// No records.
    Empty,
    /// Exactly one record, stored inline.
    One(T),
    /// Two or more records.
    Many(Vec<T>),
}

impl<T> Arity<T> {
    /// An empty container.
    pub fn new() -> Self {
        Self::Empty
    }

    /// Append `item`, promoting the shape as needed.
    pub fn push(&mut self, item: T) {
        *self = match std::mem::take(self) {
            Self::Empty => Self::One(item),
            Self::One(first) => Self::Many(vec![first, item]),
            Self::Many(mut items) => {
                items.push(item);
                Self::Many(items)
            }
        };
    }

    /// Number of records held.
    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    /// Returns `true` if no records are held.
    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }

    /// Borrow the records in push order.
    pub fn as_slice(&self) -> &[T] {
        match self {
            Self::Empty => &[],
            Self::One(item) => std::slice::from_ref(item),
            Self::Many(items) => items,
        }
    }

    /// Iterate the records in push order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.as_slice().iter()
    }

    /// Take the records out as a `Vec`.
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::Empty => Vec::new(),
            Self::One(item) => vec![item],
            Self::Many(items) => items,
        }
    }

    /// Freeze into an immutable shared slice.
    pub fn freeze(self) -> Arc<[T]> {
        self.into_vec().into()
    }
}

impl<T> Default for Arity<T> {
    fn default() -> Self {
        Self::Empty
    }
}

impl<T> FromIterator<T> for Arity<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut arity = Self::new();
        arity.extend(iter);
        arity
    }
}

impl<T> Extend<T> for Arity<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.push(item);
        }
    }
}

impl<'a, T> IntoIterator for &'a Arity<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: Clone> Sequence<T> for Arity<T> {
    fn len(&self) -> usize {
        self.as_slice().len()
    }

    fn get(&self, index: usize) -> Option<T> {
        self.as_slice().get(index).cloned()
    }

    fn append_to(&self, out: &mut Vec<T>) {
        out.extend_from_slice(self.as_slice());
    }
}
