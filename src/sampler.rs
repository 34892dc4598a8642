//! Background metric sampling.
//!
//! Once per interval the sampler derives the disk-write rate from the
//! cumulative diskstats counter, scans the log directory, estimates
//! throughput from active-log growth, reads the benchmark process's CPU
//! and memory, and publishes a fresh snapshot. All derivative state lives
//! in `TickState`, owned by the sampler alone and threaded explicitly
//! through each tick.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Local;
use tokio::time::interval;
use tracing::{debug, error, warn};

use crate::logs;
use crate::process::{self, ProcessHandle};
use crate::snapshot::{SharedSnapshot, Snapshot};
use crate::system;

/// Assumed average log record size in bytes for the throughput estimate.
///
/// The benchmark's actual record size varies with its configured message
/// size, so throughput derived from file growth divided by this constant
/// is a rough estimate, not a measured count.
pub const AVG_RECORD_BYTES: f64 = 100.0;

/// Intervals shorter than this are skipped for the disk-rate derivative;
/// dividing by a near-zero elapsed time makes the estimate unstable.
const MIN_DISK_RATE_INTERVAL_SECS: f64 = 0.1;

/// Consecutive transient failures before the sampler escalates its log
/// level once.
const FAILURE_ESCALATION_THRESHOLD: u32 = 5;

/// Sampler configuration.
#[derive(Debug, Clone)]
pub struct SamplerConfig {
    pub log_dir: PathBuf,
    pub process_pattern: String,
    pub interval: Duration,
    /// Process table root, overridable for tests.
    pub proc_root: PathBuf,
    /// Disk counter source, overridable for tests.
    pub diskstats_path: PathBuf,
}

impl SamplerConfig {
    pub fn new(log_dir: PathBuf, process_pattern: String, interval: Duration) -> Self {
        Self {
            log_dir,
            process_pattern,
            interval,
            proc_root: PathBuf::from("/proc"),
            diskstats_path: PathBuf::from("/proc/diskstats"),
        }
    }
}

/// Outcome classification for a single sampling tick.
#[derive(Debug)]
pub enum SampleError {
    /// The tick failed for a reason expected to clear on its own; the
    /// previous snapshot stays current and sampling resumes next interval.
    Transient(io::Error),
    /// The sampling environment is unusable; the sampler stops.
    Fatal(String),
}

impl fmt::Display for SampleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleError::Transient(e) => write!(f, "transient sampling failure: {}", e),
            SampleError::Fatal(msg) => write!(f, "fatal sampling failure: {}", msg),
        }
    }
}

impl std::error::Error for SampleError {}

struct CounterSample {
    bytes: u64,
    at: Instant,
}

struct LogSample {
    size_bytes: u64,
    at: Instant,
}

struct CpuSample {
    pid: u32,
    cpu_time_secs: f64,
    at: Instant,
}

/// Per-tick derivative state. The disk-rate, throughput, and CPU numbers
/// are all first-order derivatives, so each needs its previous sample.
pub struct TickState {
    prev_disk: Option<CounterSample>,
    prev_log: Option<LogSample>,
    prev_cpu: Option<CpuSample>,
    last: Snapshot,
    consecutive_failures: u32,
}

impl TickState {
    pub fn new() -> Self {
        Self {
            prev_disk: None,
            prev_log: None,
            prev_cpu: None,
            last: Snapshot::initial(),
            consecutive_failures: 0,
        }
    }
}

impl Default for TickState {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs one sampling pass and builds the next snapshot.
///
/// On success the snapshot is also remembered in `state` so later ticks
/// can retain values for sources that go quiet (process gone, log file
/// not yet created).
pub fn tick(cfg: &SamplerConfig, state: &mut TickState) -> Result<Snapshot, SampleError> {
    let now = Instant::now();
    let mut next = state.last.clone();

    // Disk-write rate from the cumulative counter delta.
    let disk_bytes =
        system::read_disk_write_bytes_from(&cfg.diskstats_path).map_err(classify_disk_error)?;
    match &state.prev_disk {
        Some(prev) => {
            let elapsed = now.duration_since(prev.at).as_secs_f64();
            next.disk_write_kbps = disk_rate_kbps(
                disk_bytes.saturating_sub(prev.bytes),
                elapsed,
                state.last.disk_write_kbps,
            );
            if elapsed >= MIN_DISK_RATE_INTERVAL_SECS {
                state.prev_disk = Some(CounterSample {
                    bytes: disk_bytes,
                    at: now,
                });
            }
        }
        None => {
            state.prev_disk = Some(CounterSample {
                bytes: disk_bytes,
                at: now,
            });
        }
    }

    // Log directory scan and the throughput estimate derived from it.
    let scan = logs::scan_log_dir(&cfg.log_dir).map_err(SampleError::Transient)?;
    next.log_size_mb = scan.total_bytes as f64 / (1024.0 * 1024.0);
    if let Some(active) = &scan.active {
        let (prev_size, elapsed) = match &state.prev_log {
            Some(prev) => (prev.size_bytes, now.duration_since(prev.at).as_secs_f64()),
            // First observation: no earlier size on record, so the whole
            // file counts as growth over one nominal interval.
            None => (0, cfg.interval.as_secs_f64()),
        };
        next.throughput_logs_per_sec = estimate_throughput(
            active.size_bytes,
            prev_size,
            elapsed,
            state.last.throughput_logs_per_sec,
        );
        state.prev_log = Some(LogSample {
            size_bytes: active.size_bytes,
            at: now,
        });
    }

    // Per-process metrics; absence retains the previous values.
    match process::locate(&cfg.proc_root, &cfg.process_pattern) {
        Some(handle) => sample_process(&handle, now, state, &mut next),
        None => debug!(
            pattern = %cfg.process_pattern,
            "benchmark process not found; retaining previous process metrics"
        ),
    }

    next.last_update = Local::now();
    state.last = next.clone();
    Ok(next)
}

/// Reads CPU, memory, elapsed time, and the test name from the located
/// process. A process can exit between locating it and reading its
/// files; those reads failing is an ordinary race, not a tick failure.
fn sample_process(handle: &ProcessHandle, now: Instant, state: &mut TickState, next: &mut Snapshot) {
    match handle.cpu_time_seconds() {
        Ok(cpu_time) => {
            if let Some(prev) = &state.prev_cpu {
                if prev.pid == handle.pid {
                    let dt = now.duration_since(prev.at).as_secs_f64();
                    let delta = cpu_time - prev.cpu_time_secs;
                    if dt > 0.0 && delta >= 0.0 {
                        next.cpu_percent = delta / dt * 100.0;
                    }
                }
            }
            state.prev_cpu = Some(CpuSample {
                pid: handle.pid,
                cpu_time_secs: cpu_time,
                at: now,
            });
        }
        Err(e) => debug!(pid = handle.pid, "failed to read cpu time: {}", e),
    }

    match handle.rss_bytes() {
        Ok(rss) => next.memory_mb = rss as f64 / (1024.0 * 1024.0),
        Err(e) => debug!(pid = handle.pid, "failed to read rss: {}", e),
    }

    match handle.elapsed_seconds() {
        Ok(secs) => next.elapsed_secs = secs,
        Err(e) => debug!(pid = handle.pid, "failed to read start time: {}", e),
    }

    if let Some(name) = handle.test_name() {
        next.test_name = name.to_string();
    }
}

/// Disk-rate derivative: (delta / 1024) / elapsed. Elapsed times below
/// the stability floor keep the previous value.
fn disk_rate_kbps(delta_bytes: u64, elapsed_secs: f64, previous_kbps: f64) -> f64 {
    if elapsed_secs < MIN_DISK_RATE_INTERVAL_SECS {
        previous_kbps
    } else {
        (delta_bytes as f64 / 1024.0) / elapsed_secs
    }
}

/// Throughput heuristic: growth of the active log divided by the assumed
/// record size over elapsed time, floored. Shrinking files (rotation)
/// clamp to zero rather than going negative.
fn estimate_throughput(size: u64, prev_size: u64, elapsed_secs: f64, previous: u64) -> u64 {
    if elapsed_secs <= 0.0 {
        return previous;
    }
    let grown = size.saturating_sub(prev_size) as f64;
    (grown / AVG_RECORD_BYTES / elapsed_secs).floor() as u64
}

/// A missing diskstats file on a system without /proc cannot recover;
/// anything else is assumed transient.
fn classify_disk_error(err: io::Error) -> SampleError {
    if err.kind() == io::ErrorKind::NotFound && !Path::new("/proc").exists() {
        SampleError::Fatal(
            "cannot read /proc; this dashboard requires a Linux /proc filesystem".to_string(),
        )
    } else {
        SampleError::Transient(err)
    }
}

/// Runs the sampling loop until stopped or fatally failed.
pub async fn run(
    cfg: SamplerConfig,
    shared: Arc<SharedSnapshot>,
    stop: Arc<AtomicBool>,
    mut state: TickState,
) {
    let mut ticker = interval(cfg.interval);
    debug!(
        "sampler started with {}ms interval",
        cfg.interval.as_millis()
    );

    loop {
        ticker.tick().await;
        if stop.load(Ordering::Relaxed) {
            debug!("sampler stop flag set; exiting");
            return;
        }
        match tick(&cfg, &mut state) {
            Ok(snapshot) => {
                state.consecutive_failures = 0;
                shared.publish(snapshot);
            }
            Err(SampleError::Transient(e)) => {
                state.consecutive_failures += 1;
                if state.consecutive_failures == FAILURE_ESCALATION_THRESHOLD {
                    warn!(
                        "{} consecutive sampling failures; dashboard data is going stale (latest: {})",
                        state.consecutive_failures, e
                    );
                } else {
                    debug!("sampling tick skipped: {}", e);
                }
            }
            Err(err @ SampleError::Fatal(_)) => {
                error!("{}", err);
                return;
            }
        }
    }
}
