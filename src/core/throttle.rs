//! Time-keyed throttle

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use std::time::{Duration, Instant};

static GLOBAL: Lazy<Throttle> = Lazy::new(Throttle::new);

/// Runs a closure at most once per interval for each key
#[derive(Debug, Default)]
pub struct Throttle {
    records: DashMap<String, Instant>,
}

impl Throttle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide instance
    pub fn global() -> &'static Throttle {
        &GLOBAL
    }

    /// Run `f` unless it already ran for `key` within `interval`.
    ///
    /// Returns `Some` with the closure result when it ran.
    pub fn run<R, F>(&self, key: &str, interval: Duration, f: F) -> Option<R>
    where
        F: FnOnce() -> R,
    {
        let now = Instant::now();
        // Entry guards hold the shard lock and are dropped before `f` runs
        match self.records.entry(key.to_string()) {
            Entry::Occupied(mut last) => {
                if now.duration_since(*last.get()) < interval {
                    tracing::debug!(key, "throttled");
                    return None;
                }
                last.insert(now);
            }
            Entry::Vacant(slot) => {
                slot.insert(now);
            }
        }
        Some(f())
    }

    /// Forget the last run of `key`
    pub fn reset(&self, key: &str) {
        self.records.remove(key);
    }
}
