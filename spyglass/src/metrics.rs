//! # metrics — session counters
//!
//! Counters live behind a trait so the pipeline can be exercised in tests
//! without inspecting log output. The default sink is plain atomics; there
//! is no export surface, the periodic reporter just logs a snapshot.

use std::sync::atomic::{AtomicU64, Ordering};

pub trait MetricsSink: Send + Sync {
    fn message_seen(&self);
    fn signal_found(&self);
    fn signal_delivered(&self);
    fn delivery_failed(&self);
    fn snapshot(&self) -> MetricsSnapshot;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub messages_seen:     u64,
    pub signals_found:     u64,
    pub signals_delivered: u64,
    pub deliveries_failed: u64,
}

#[derive(Default)]
pub struct AtomicMetrics {
    messages_seen:     AtomicU64,
    signals_found:     AtomicU64,
    signals_delivered: AtomicU64,
    deliveries_failed: AtomicU64,
}

impl MetricsSink for AtomicMetrics {
    fn message_seen(&self) {
        self.messages_seen.fetch_add(1, Ordering::Relaxed);
    }
    fn signal_found(&self) {
        self.signals_found.fetch_add(1, Ordering::Relaxed);
    }
    fn signal_delivered(&self) {
        self.signals_delivered.fetch_add(1, Ordering::Relaxed);
    }
    fn delivery_failed(&self) {
        self.deliveries_failed.fetch_add(1, Ordering::Relaxed);
    }
    fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            messages_seen:     self.messages_seen.load(Ordering::Relaxed),
            signals_found:     self.signals_found.load(Ordering::Relaxed),
            signals_delivered: self.signals_delivered.load(Ordering::Relaxed),
            deliveries_failed: self.deliveries_failed.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate_independently() {
        let metrics = AtomicMetrics::default();
        metrics.message_seen();
        metrics.message_seen();
        metrics.signal_found();
        metrics.signal_delivered();

        let snap = metrics.snapshot();
        assert_eq!(snap.messages_seen, 2);
        assert_eq!(snap.signals_found, 1);
        assert_eq!(snap.signals_delivered, 1);
        assert_eq!(snap.deliveries_failed, 0);
    }
}
