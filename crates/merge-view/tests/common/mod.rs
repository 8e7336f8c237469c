// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

/// Install a test subscriber once; honours `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rec {
    pub id: u32,
    pub v: String,
    pub merged: bool,
}

pub fn rec(id: u32, v: &str) -> Rec {
    Rec {
        id,
        v: v.to_owned(),
        merged: false,
    }
}

pub fn same_id(a: &Rec, b: &Rec) -> bool {
    a.id == b.id
}

/// Keep the accumulator's value but flag that a merge happened.
pub fn keep_first_flagged(acc: Rec, _candidate: Rec) -> Rec {
    Rec {
        merged: true,
        ..acc
    }
}

/// Counts invocations across threads.
#[derive(Debug, Default)]
pub struct Calls(AtomicUsize);

impl Calls {
    pub fn hit(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}
