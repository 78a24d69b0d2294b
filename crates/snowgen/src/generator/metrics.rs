use std::collections::BTreeMap;

use portable_atomic::{AtomicU64, Ordering};

/// Point-in-time copy of a generator's counters.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub enabled: bool,
    pub id_count: u64,
    pub sequence_overflow_count: u64,
    pub clock_backward_count: u64,
    pub wait_count: u64,
    pub total_wait_time_ns: u64,
}

impl MetricsSnapshot {
    /// Mean time spent per wait, in nanoseconds. Zero when nothing waited.
    pub fn avg_wait_time_ns(&self) -> u64 {
        self.total_wait_time_ns
            .checked_div(self.wait_count)
            .unwrap_or(0)
    }

    /// Flattens the snapshot into the exported key set.
    ///
    /// A disabled snapshot only carries `metrics_enabled = 0`.
    pub fn to_map(&self) -> BTreeMap<&'static str, u64> {
        let mut map = BTreeMap::new();
        if !self.enabled {
            map.insert("metrics_enabled", 0);
            return map;
        }
        map.insert("metrics_enabled", 1);
        map.insert("id_count", self.id_count);
        map.insert("sequence_overflow", self.sequence_overflow_count);
        map.insert("clock_backward", self.clock_backward_count);
        map.insert("wait_count", self.wait_count);
        map.insert("avg_wait_time_ns", self.avg_wait_time_ns());
        map
    }
}

/// Atomic counters owned by a generator.
///
/// Counters are updated with relaxed atomics and may be read at any time
/// without taking the generator's lock. When disabled every `record_*` call is
/// a no-op.
#[derive(Debug)]
pub struct Metrics {
    enabled: bool,
    id_count: AtomicU64,
    sequence_overflow_count: AtomicU64,
    clock_backward_count: AtomicU64,
    wait_count: AtomicU64,
    total_wait_time_ns: AtomicU64,
}

impl Metrics {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            id_count: AtomicU64::new(0),
            sequence_overflow_count: AtomicU64::new(0),
            clock_backward_count: AtomicU64::new(0),
            wait_count: AtomicU64::new(0),
            total_wait_time_ns: AtomicU64::new(0),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub(crate) fn record_ids(&self, n: u64) {
        if self.enabled {
            self.id_count.fetch_add(n, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_sequence_overflow(&self) {
        if self.enabled {
            self.sequence_overflow_count.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_clock_backward(&self) {
        if self.enabled {
            self.clock_backward_count.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_wait(&self, waited_ns: u64) {
        if self.enabled {
            self.wait_count.fetch_add(1, Ordering::Relaxed);
            self.total_wait_time_ns
                .fetch_add(waited_ns, Ordering::Relaxed);
        }
    }

    /// Number of IDs issued since construction or the last reset.
    pub fn id_count(&self) -> u64 {
        self.id_count.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        if !self.enabled {
            return MetricsSnapshot::default();
        }
        MetricsSnapshot {
            enabled: true,
            id_count: self.id_count.load(Ordering::Relaxed),
            sequence_overflow_count: self.sequence_overflow_count.load(Ordering::Relaxed),
            clock_backward_count: self.clock_backward_count.load(Ordering::Relaxed),
            wait_count: self.wait_count.load(Ordering::Relaxed),
            total_wait_time_ns: self.total_wait_time_ns.load(Ordering::Relaxed),
        }
    }

    /// Zeroes every counter. Counters are reset one at a time, so a snapshot
    /// taken concurrently may observe a partial reset.
    pub fn reset(&self) {
        self.id_count.store(0, Ordering::Relaxed);
        self.sequence_overflow_count.store(0, Ordering::Relaxed);
        self.clock_backward_count.store(0, Ordering::Relaxed);
        self.wait_count.store(0, Ordering::Relaxed);
        self.total_wait_time_ns.store(0, Ordering::Relaxed);
    }
}
