// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Lazily materialized merge view over ordered record sequences.
//!
//! `merge-view` provides [`MergeView`], a read-through cache over N input
//! [`Sequence`]s. Records that a [`MergeStrategy`] considers equivalent are folded
//! into one output record; everything else passes through untouched.
//!
//! # Ordering Contract
//!
//! Materialization concatenates every source in supply order into one scratch
//! sequence and scans it left to right. Each unconsumed record opens an
//! equivalence class and absorbs every later unconsumed record the predicate
//! accepts, in ascending position. The output therefore lists one record per
//! class, ordered by the position of the class's first member.
//!
//! With exactly one source the records pass through unchanged and the strategy
//! is never consulted, even when two records of that source would match.
//!
//! # Caching Contract
//!
//! Construction never reads the sources. The first read publishes an immutable
//! [`Snapshot`]; later reads share it until [`MergeView::invalidate`] is called.
//! The view never observes source mutation on its own.
//!
//! ```
//! use merge_view::MergeView;
//!
//! let left = vec![(1, 'a'), (2, 'b')];
//! let right = vec![(1, 'c')];
//! let view = MergeView::take_first(
//!     |a: &(i32, char), b: &(i32, char)| a.0 == b.0,
//!     [left.as_slice(), right.as_slice()],
//! );
//! let merged: Vec<_> = view.iter().unwrap().collect();
//! assert_eq!(merged, vec![(1, 'a'), (2, 'b')]);
//! ```
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::missing_const_for_fn,
    clippy::redundant_pub_crate,
    clippy::module_name_repetitions,
    clippy::use_self,
    clippy::option_if_let_else,
    clippy::significant_drop_tightening,
    clippy::type_complexity,
    clippy::missing_errors_doc,
    clippy::doc_markdown
)]

mod arity;
mod builder;
mod sequence;
mod snapshot;
mod strategy;
mod view;

pub use arity::Arity;
pub use builder::{MergeFn, MergeViewBuilder, Predicate};
pub use sequence::Sequence;
pub use snapshot::{Iter, Snapshot};
pub use strategy::{
    pairwise_fold, ByKey, Fallible, HashedByKey, MergeStrategy, Pairwise, TakeFirst, TakeLast,
};
pub use view::MergeView;

/// Errors surfaced by [`MergeView`] construction and reads.
///
/// `E` is the strategy's own error type; infallible strategies use
/// [`std::convert::Infallible`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MergeError<E> {
    /// A required constructor argument was never supplied.
    #[error("[MERGE_INVALID_ARGUMENT] {0} is required")]
    InvalidArgument(&'static str),
    /// Indexed access outside `0..len`.
    #[error("[MERGE_INDEX_OUT_OF_RANGE] index {index} outside merged view of length {len}")]
    IndexOutOfRange {
        /// The requested index, widened so negative requests survive intact.
        index: i128,
        /// Length of the materialization the index was checked against.
        len: usize,
    },
    /// The strategy failed during materialization. Nothing was cached.
    #[error("[MERGE_STRATEGY_FAILED] {0}")]
    Propagated(E),
}

impl<E> MergeError<E> {
    /// Recover the strategy's error, if this is a propagated failure.
    pub fn into_propagated(self) -> Option<E> {
        match self {
            Self::Propagated(err) => Some(err),
            Self::InvalidArgument(_) | Self::IndexOutOfRange { .. } => None,
        }
    }
}
