//! The snapshot data model and the single handoff point between the
//! sampler and the renderer.

use chrono::{DateTime, Local};
use std::sync::{Arc, RwLock};

/// Immutable bundle of the latest sampled metrics.
///
/// Built by the sampler once per tick and published whole; the renderer
/// only ever reads it. All numeric fields are non-negative.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Heuristic logs-per-second estimate derived from log file growth.
    pub throughput_logs_per_sec: u64,
    /// CPU consumed by the benchmark process since the previous read.
    pub cpu_percent: f64,
    /// Resident set size of the benchmark process.
    pub memory_mb: f64,
    /// System-wide disk write rate.
    pub disk_write_kbps: f64,
    /// Test identifier from the benchmark command line.
    pub test_name: String,
    /// Seconds since the benchmark process started.
    pub elapsed_secs: f64,
    /// Aggregate size of recognized log files.
    pub log_size_mb: f64,
    pub last_update: DateTime<Local>,
}

impl Snapshot {
    /// Placeholder shown until the first sample lands.
    pub fn initial() -> Self {
        Self {
            throughput_logs_per_sec: 0,
            cpu_percent: 0.0,
            memory_mb: 0.0,
            disk_write_kbps: 0.0,
            test_name: "Unknown".to_string(),
            elapsed_secs: 0.0,
            log_size_mb: 0.0,
            last_update: Local::now(),
        }
    }
}

/// Single-writer/single-reader handoff cell for the current snapshot.
///
/// The sampler swaps in a complete new `Arc<Snapshot>` under a short write
/// lock, so readers always observe either the fully-old or the fully-new
/// snapshot, never a partial update. No further locking is needed for
/// cross-field consistency because a snapshot is never mutated after
/// publication.
pub struct SharedSnapshot {
    current: RwLock<Arc<Snapshot>>,
}

impl SharedSnapshot {
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(Snapshot::initial())),
        }
    }

    /// Publishes a new snapshot, replacing the previous one. History is
    /// not retained; the old snapshot is dropped when its last reader
    /// releases it.
    pub fn publish(&self, snapshot: Snapshot) {
        let mut guard = self.current.write().expect("snapshot lock poisoned");
        *guard = Arc::new(snapshot);
    }

    /// Returns the most recently published snapshot.
    pub fn current(&self) -> Arc<Snapshot> {
        self.current.read().expect("snapshot lock poisoned").clone()
    }
}

impl Default for SharedSnapshot {
    fn default() -> Self {
        Self::new()
    }
}
