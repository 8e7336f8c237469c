// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Read-only input contract for merge sources.

use std::sync::{Arc, Mutex, PoisonError, RwLock};

/// An ordered, finite, read-only sequence of records.
///
/// The view only reads sources, and only during materialization. Sources that
/// live behind a lock ([`RwLock`], [`Mutex`]) are read under a single guard per
/// materialization so each one contributes a consistent snapshot.
///
/// Records are yielded by value; sources hand out clones.
pub trait Sequence<T> {
    /// Number of records currently in the sequence.
    fn len(&self) -> usize;

    /// Returns `true` if the sequence holds no records.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Record at `index`, or `None` past the end.
    fn get(&self, index: usize) -> Option<T>;

    /// Append every record, in order, to `out`.
    fn append_to(&self, out: &mut Vec<T>) {
        out.extend((0..self.len()).map_while(|index| self.get(index)));
    }
}

impl<T: Clone> Sequence<T> for [T] {
    fn len(&self) -> usize {
        <[T]>::len(self)
    }

    fn get(&self, index: usize) -> Option<T> {
        <[T]>::get(self, index).cloned()
    }

    fn append_to(&self, out: &mut Vec<T>) {
        out.extend_from_slice(self);
    }
}

impl<T: Clone> Sequence<T> for Vec<T> {
    fn len(&self) -> usize {
        self.as_slice().len()
    }

    fn get(&self, index: usize) -> Option<T> {
        self.as_slice().get(index).cloned()
    }

    fn append_to(&self, out: &mut Vec<T>) {
        out.extend_from_slice(self);
    }
}

impl<T, S: Sequence<T> + ?Sized> Sequence<T> for &S {
    fn len(&self) -> usize {
        (**self).len()
    }

    fn get(&self, index: usize) -> Option<T> {
        (**self).get(index)
    }

    fn append_to(&self, out: &mut Vec<T>) {
        (**self).append_to(out);
    }
}

impl<T, S: Sequence<T> + ?Sized> Sequence<T> for Box<S> {
    fn len(&self) -> usize {
        (**self).len()
    }

    fn get(&self, index: usize) -> Option<T> {
        (**self).get(index)
    }

    fn append_to(&self, out: &mut Vec<T>) {
        (**self).append_to(out);
    }
}

impl<T, S: Sequence<T> + ?Sized> Sequence<T> for Arc<S> {
    fn len(&self) -> usize {
        (**self).len()
    }

    fn get(&self, index: usize) -> Option<T> {
        (**self).get(index)
    }

    fn append_to(&self, out: &mut Vec<T>) {
        (**self).append_to(out);
    }
}

// Poisoned guards are recovered; sources are only ever read here.
impl<T, S: Sequence<T> + ?Sized> Sequence<T> for RwLock<S> {
    fn len(&self) -> usize {
        self.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn get(&self, index: usize) -> Option<T> {
        self.read().unwrap_or_else(PoisonError::into_inner).get(index)
    }

    fn append_to(&self, out: &mut Vec<T>) {
        self.read()
            .unwrap_or_else(PoisonError::into_inner)
            .append_to(out);
    }
}

impl<T, S: Sequence<T> + ?Sized> Sequence<T> for Mutex<S> {
    fn len(&self) -> usize {
        self.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn get(&self, index: usize) -> Option<T> {
        self.lock().unwrap_or_else(PoisonError::into_inner).get(index)
    }

    fn append_to(&self, out: &mut Vec<T>) {
        self.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .append_to(out);
    }
}
