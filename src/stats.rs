//! # Aggregate statistics (spec.md §4.6 "Resource discipline")
//!
//! Per-worker counters reconciled at join, rather than one shared
//! `Mutex<HashMap>` every processor contends on. The teacher's own comment
//! in `bin/ConSTRain.rs` weighs exactly this tradeoff (`Arc<RwLock<HashMap>>`
//! vs. sharding) for its per-thread partition map; here it's resolved in
//! favor of sharding since every counter this module tracks is either a
//! running min/max or a running sum, both trivially mergeable.
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// One worker's local view of the run's counters. Cheap to update (no
/// contention across workers), merged into a [`RunStats`] snapshot at join.
#[derive(Debug, Clone, Default)]
pub struct WorkerStats {
    pub reads_processed: u64,
    pub reads_mapped: u64,
    pub reads_denovo: u64,
    pub min_read_len: Option<usize>,
    pub max_read_len: Option<usize>,
    pub total_read_len: u64,
}

impl WorkerStats {
    pub fn record_read_len(&mut self, len: usize) {
        self.min_read_len = Some(self.min_read_len.map_or(len, |m| m.min(len)));
        self.max_read_len = Some(self.max_read_len.map_or(len, |m| m.max(len)));
        self.total_read_len += len as u64;
        self.reads_processed += 1;
    }

    pub fn record_hit(&mut self) {
        self.reads_mapped += 1;
    }

    pub fn record_denovo(&mut self) {
        self.reads_denovo += 1;
    }

    fn merge_into(&self, into: &mut RunStats) {
        into.reads_processed.fetch_add(self.reads_processed, Ordering::Relaxed);
        into.reads_mapped.fetch_add(self.reads_mapped, Ordering::Relaxed);
        into.reads_denovo.fetch_add(self.reads_denovo, Ordering::Relaxed);
        into.total_read_len.fetch_add(self.total_read_len, Ordering::Relaxed);
        if let Some(min) = self.min_read_len {
            into.min_read_len.fetch_min(min as u64, Ordering::Relaxed);
        }
        if let Some(max) = self.max_read_len {
            into.max_read_len.fetch_max(max as u64, Ordering::Relaxed);
        }
    }
}

/// The run-wide accumulator, shared by `Arc` and updated only through
/// `merge` calls at worker join (never contended mid-run).
#[derive(Debug)]
pub struct RunStats {
    reads_processed: AtomicU64,
    reads_mapped: AtomicU64,
    reads_denovo: AtomicU64,
    min_read_len: AtomicU64,
    max_read_len: AtomicU64,
    total_read_len: AtomicU64,
}

impl Default for RunStats {
    fn default() -> Self {
        RunStats {
            reads_processed: AtomicU64::new(0),
            reads_mapped: AtomicU64::new(0),
            reads_denovo: AtomicU64::new(0),
            min_read_len: AtomicU64::new(u64::MAX),
            max_read_len: AtomicU64::new(0),
            total_read_len: AtomicU64::new(0),
        }
    }
}

/// A shared handle a processor thread clones and merges its local
/// [`WorkerStats`] into at join.
pub type StatsHandle = Arc<RunStats>;

impl RunStats {
    pub fn shared() -> StatsHandle {
        Arc::new(RunStats::default())
    }

    pub fn merge(&self, worker: &WorkerStats) {
        worker.merge_into(self);
    }

    pub fn reads_processed(&self) -> u64 {
        self.reads_processed.load(Ordering::Relaxed)
    }

    pub fn reads_mapped(&self) -> u64 {
        self.reads_mapped.load(Ordering::Relaxed)
    }

    pub fn reads_denovo(&self) -> u64 {
        self.reads_denovo.load(Ordering::Relaxed)
    }

    pub fn min_read_len(&self) -> Option<u64> {
        let v = self.min_read_len.load(Ordering::Relaxed);
        (v != u64::MAX).then_some(v)
    }

    pub fn max_read_len(&self) -> Option<u64> {
        let v = self.max_read_len.load(Ordering::Relaxed);
        (v != 0).then_some(v)
    }

    pub fn mean_read_len(&self) -> f64 {
        let processed = self.reads_processed();
        if processed == 0 {
            0.0
        } else {
            self.total_read_len.load(Ordering::Relaxed) as f64 / processed as f64
        }
    }

    pub fn mapped_pct(&self) -> f64 {
        let processed = self.reads_processed();
        if processed == 0 {
            0.0
        } else {
            100.0 * self.reads_mapped() as f64 / processed as f64
        }
    }
}
