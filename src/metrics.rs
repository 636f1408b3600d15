//! Lightweight global metrics for snapshot parsing.
//!
//! Потокобезопасные атомарные счётчики (только статистика, на разбор не влияют):
//! - snapshots parsed / failed
//! - clusters allocated
//! - objects assigned by clusters
//! - bytes consumed by the main stream

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

static SNAPSHOTS_PARSED: AtomicU64 = AtomicU64::new(0);
static SNAPSHOTS_FAILED: AtomicU64 = AtomicU64::new(0);
static CLUSTERS_ALLOCATED: AtomicU64 = AtomicU64::new(0);
static OBJECTS_ASSIGNED: AtomicU64 = AtomicU64::new(0);
static BYTES_CONSUMED: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Default, Serialize)]
pub struct MetricsSnapshot {
    pub snapshots_parsed: u64,
    pub snapshots_failed: u64,
    pub clusters_allocated: u64,
    pub objects_assigned: u64,
    pub bytes_consumed: u64,
}

impl MetricsSnapshot {
    pub fn avg_objects_per_cluster(&self) -> f64 {
        if self.clusters_allocated == 0 {
            0.0
        } else {
            self.objects_assigned as f64 / self.clusters_allocated as f64
        }
    }
}

#[inline]
pub fn record_snapshot_parsed(bytes: u64) {
    SNAPSHOTS_PARSED.fetch_add(1, Ordering::Relaxed);
    BYTES_CONSUMED.fetch_add(bytes, Ordering::Relaxed);
}

#[inline]
pub fn record_snapshot_failed() {
    SNAPSHOTS_FAILED.fetch_add(1, Ordering::Relaxed);
}

#[inline]
pub fn record_cluster_allocated(objects: u64) {
    CLUSTERS_ALLOCATED.fetch_add(1, Ordering::Relaxed);
    OBJECTS_ASSIGNED.fetch_add(objects, Ordering::Relaxed);
}

pub fn snapshot() -> MetricsSnapshot {
    MetricsSnapshot {
        snapshots_parsed: SNAPSHOTS_PARSED.load(Ordering::Relaxed),
        snapshots_failed: SNAPSHOTS_FAILED.load(Ordering::Relaxed),
        clusters_allocated: CLUSTERS_ALLOCATED.load(Ordering::Relaxed),
        objects_assigned: OBJECTS_ASSIGNED.load(Ordering::Relaxed),
        bytes_consumed: BYTES_CONSUMED.load(Ordering::Relaxed),
    }
}

pub fn reset() {
    SNAPSHOTS_PARSED.store(0, Ordering::Relaxed);
    SNAPSHOTS_FAILED.store(0, Ordering::Relaxed);
    CLUSTERS_ALLOCATED.store(0, Ordering::Relaxed);
    OBJECTS_ASSIGNED.store(0, Ordering::Relaxed);
    BYTES_CONSUMED.store(0, Ordering::Relaxed);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn averages_handle_zero() {
        let m = MetricsSnapshot::default();
        assert_eq!(m.avg_objects_per_cluster(), 0.0);
        let m = MetricsSnapshot {
            clusters_allocated: 4,
            objects_assigned: 10,
            ..Default::default()
        };
        assert_eq!(m.avg_objects_per_cluster(), 2.5);
    }
}
