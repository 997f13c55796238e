//! Transmit Statistics
//!
//! Per-context counters for templated frames. A context only ever writes its
//! own record; readers on other threads see relaxed, eventually consistent
//! values.

use crate::context::{ContextId, PerContext};
use std::ops::{Add, AddAssign};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Per-context stats
#[derive(Debug, Default)]
pub struct ContextStats {
    pub tx_packets: AtomicU64,
    pub tx_bytes: AtomicU64,
    pub aborted: AtomicU64,
}

impl ContextStats {
    /// Count one transmitted frame of `bytes` bytes
    #[inline(always)]
    pub fn record_tx(&self, bytes: u64) {
        self.tx_packets.fetch_add(1, Ordering::Relaxed);
        self.tx_bytes.fetch_add(bytes, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn record_abort(&self) {
        self.aborted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            tx_packets: self.tx_packets.load(Ordering::Relaxed),
            tx_bytes: self.tx_bytes.load(Ordering::Relaxed),
            aborted: self.aborted.load(Ordering::Relaxed),
        }
    }

    pub fn reset(&self) {
        self.tx_packets.store(0, Ordering::Relaxed);
        self.tx_bytes.store(0, Ordering::Relaxed);
        self.aborted.store(0, Ordering::Relaxed);
    }
}

/// Stats snapshot (non-atomic)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub tx_packets: u64,
    pub tx_bytes: u64,
    pub aborted: u64,
}

impl StatsSnapshot {
    pub fn throughput_mbps(&self, elapsed_secs: f64) -> f64 {
        if elapsed_secs <= 0.0 { return 0.0; }
        (self.tx_bytes as f64 * 8.0) / (elapsed_secs * 1_000_000.0)
    }

    pub fn packet_rate_pps(&self, elapsed_secs: f64) -> f64 {
        if elapsed_secs <= 0.0 { return 0.0; }
        self.tx_packets as f64 / elapsed_secs
    }

    /// Counter growth since `earlier`
    pub fn delta(&self, earlier: &StatsSnapshot) -> StatsSnapshot {
        StatsSnapshot {
            tx_packets: self.tx_packets.wrapping_sub(earlier.tx_packets),
            tx_bytes: self.tx_bytes.wrapping_sub(earlier.tx_bytes),
            aborted: self.aborted.wrapping_sub(earlier.aborted),
        }
    }
}

impl Add for StatsSnapshot {
    type Output = StatsSnapshot;

    fn add(mut self, rhs: StatsSnapshot) -> StatsSnapshot {
        self += rhs;
        self
    }
}

impl AddAssign for StatsSnapshot {
    fn add_assign(&mut self, rhs: StatsSnapshot) {
        self.tx_packets = self.tx_packets.wrapping_add(rhs.tx_packets);
        self.tx_bytes = self.tx_bytes.wrapping_add(rhs.tx_bytes);
        self.aborted = self.aborted.wrapping_add(rhs.aborted);
    }
}

/// Statistics store: one record per execution context
#[derive(Debug)]
pub struct StatsStore {
    contexts: PerContext<ContextStats>,
}

impl StatsStore {
    pub fn new(num_contexts: usize) -> Self {
        Self {
            contexts: PerContext::new(num_contexts),
        }
    }

    /// Record for `ctx`, if provisioned
    #[inline(always)]
    pub fn get(&self, ctx: ContextId) -> Option<&ContextStats> {
        self.contexts.get(ctx)
    }

    /// Count a transmitted frame on `ctx`.
    ///
    /// Returns `false` when `ctx` has no record.
    #[inline(always)]
    pub fn record(&self, ctx: ContextId, bytes: u64) -> bool {
        match self.contexts.get(ctx) {
            Some(stats) => {
                stats.record_tx(bytes);
                true
            }
            None => false,
        }
    }

    pub fn contexts(&self) -> usize {
        self.contexts.len()
    }

    pub fn snapshots(&self) -> Vec<(ContextId, StatsSnapshot)> {
        self.contexts.iter().map(|(id, s)| (id, s.snapshot())).collect()
    }

    /// Aggregate across all contexts
    pub fn total(&self) -> StatsSnapshot {
        self.contexts
            .iter()
            .fold(StatsSnapshot::default(), |acc, (_, s)| acc + s.snapshot())
    }

    pub fn reset(&self) {
        for (_, stats) in self.contexts.iter() {
            stats.reset();
        }
    }
}

/// Interval rate
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rate {
    pub pps: f64,
    pub mbps: f64,
}

/// Turns successive totals into per-second rates
#[derive(Debug, Clone)]
pub struct RateMeter {
    prev: StatsSnapshot,
    prev_at: Instant,
}

impl RateMeter {
    pub fn new(start: StatsSnapshot, at: Instant) -> Self {
        Self {
            prev: start,
            prev_at: at,
        }
    }

    /// Rate since the previous sample
    pub fn sample(&mut self, current: StatsSnapshot, at: Instant) -> Rate {
        let elapsed = at.saturating_duration_since(self.prev_at).as_secs_f64();
        let delta = current.delta(&self.prev);
        self.prev = current;
        self.prev_at = at;
        Rate {
            pps: delta.packet_rate_pps(elapsed),
            mbps: delta.throughput_mbps(elapsed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_context_stats() {
        let stats = ContextStats::default();
        stats.record_tx(1500);
        stats.record_tx(64);
        stats.record_abort();

        let snap = stats.snapshot();
        assert_eq!(snap.tx_packets, 2);
        assert_eq!(snap.tx_bytes, 1564);
        assert_eq!(snap.aborted, 1);
    }

    #[test]
    fn test_store_isolation() {
        let store = StatsStore::new(4);
        assert!(store.record(ContextId(0), 1000));
        assert!(store.record(ContextId(1), 2000));
        assert!(!store.record(ContextId(4), 10));

        assert_eq!(store.get(ContextId(0)).unwrap().snapshot().tx_bytes, 1000);
        assert_eq!(store.get(ContextId(2)).unwrap().snapshot(), StatsSnapshot::default());

        let total = store.total();
        assert_eq!(total.tx_packets, 2);
        assert_eq!(total.tx_bytes, 3000);

        store.reset();
        assert_eq!(store.total(), StatsSnapshot::default());
    }

    #[test]
    fn test_rate_meter() {
        let t0 = Instant::now();
        let mut meter = RateMeter::new(StatsSnapshot::default(), t0);

        let current = StatsSnapshot {
            tx_packets: 2_000,
            tx_bytes: 250_000,
            aborted: 0,
        };
        let rate = meter.sample(current, t0 + Duration::from_secs(2));
        assert_eq!(rate.pps, 1_000.0);
        assert_eq!(rate.mbps, 1.0);

        let idle = meter.sample(current, t0 + Duration::from_secs(3));
        assert_eq!(idle.pps, 0.0);
    }

    #[test]
    fn test_zero_elapsed() {
        let snap = StatsSnapshot {
            tx_packets: 10,
            tx_bytes: 10,
            aborted: 0,
        };
        assert_eq!(snap.packet_rate_pps(0.0), 0.0);
        assert_eq!(snap.throughput_mbps(0.0), 0.0);
    }
}
