//! Dashboard rendering.
//!
//! The renderer reads the most recent snapshot on its own cadence and
//! draws gauges, bars, and a footer through the terminal capability
//! trait. Every write is clipped against the current terminal size, so a
//! resize between draw calls can never crash the loop.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use tokio::time::interval;
use tracing::debug;

use crate::snapshot::{SharedSnapshot, Snapshot};
use crate::term::{Terminal, TextStyle};

/// Title drawn centered in the top row.
const TITLE: &str = " Benchmark Performance Monitor ";

/// One cell of the throughput bar represents this many logs per second.
const THROUGHPUT_PER_CELL: u64 = 1000;

/// The memory bar is drawn as a share of this many MB.
const MEMORY_BAR_FULL_MB: f64 = 500.0;

/// A snapshot older than this is flagged in the footer instead of being
/// presented as current data.
const STALE_AFTER_SECS: i64 = 5;

/// Maps a gauge value onto its color band. Bands are half-open: values
/// below `warn` are green, `[warn, crit)` yellow, `crit` and above red.
pub fn threshold_style(value: f64, warn: f64, crit: f64) -> TextStyle {
    if value < warn {
        TextStyle::Green
    } else if value < crit {
        TextStyle::Yellow
    } else {
        TextStyle::Red
    }
}

pub fn throughput_style(logs_per_sec: u64) -> TextStyle {
    threshold_style(logs_per_sec as f64, 50_000.0, 100_000.0)
}

pub fn cpu_style(percent: f64) -> TextStyle {
    threshold_style(percent, 50.0, 80.0)
}

pub fn memory_style(mb: f64) -> TextStyle {
    threshold_style(mb, 100.0, 500.0)
}

pub fn disk_style(kbps: f64) -> TextStyle {
    threshold_style(kbps, 5_000.0, 20_000.0)
}

pub fn log_size_style(mb: f64) -> TextStyle {
    threshold_style(mb, 50.0, 200.0)
}

/// Load bars use percent bands regardless of the underlying unit.
fn percent_style(percent: f64) -> TextStyle {
    threshold_style(percent, 50.0, 80.0)
}

/// Formats elapsed seconds as MM:SS.
pub fn format_elapsed(secs: f64) -> String {
    let whole = secs.max(0.0) as u64;
    format!("{:02}:{:02}", whole / 60, whole % 60)
}

/// Formats an integer with thousands separators ("1,234,567").
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Renders an ASCII bar of `filled` cells inside a `width`-cell track.
fn bar(filled: usize, width: usize) -> String {
    let filled = filled.min(width);
    format!("[{}{}]", "=".repeat(filled), " ".repeat(width - filled))
}

/// Draws the dashboard for whatever snapshot is current.
pub struct Renderer<T: Terminal> {
    term: T,
}

impl<T: Terminal> Renderer<T> {
    pub fn new(term: T) -> Self {
        Self { term }
    }

    /// Polls the quit key. Only `q` has an effect; other keys are
    /// reserved for future commands.
    pub fn wants_quit(&mut self) -> io::Result<bool> {
        Ok(matches!(self.term.poll_key()?, Some('q')))
    }

    /// Draws one full frame from `snapshot`.
    pub fn draw(&mut self, snapshot: &Snapshot) -> io::Result<()> {
        let frame = self.term.dimensions()?;
        let (width, height) = frame;
        if width < 4 || height < 3 {
            // Nothing sensible fits; leave the screen alone until resized.
            return Ok(());
        }
        self.term.clear()?;

        let w = width as usize;

        // Title bar with right-aligned clock.
        let title_col = w.saturating_sub(TITLE.len()) / 2;
        self.put(frame, 0, title_col as u16, TITLE, TextStyle::Green)?;
        let clock = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        let clock_col = w.saturating_sub(clock.len() + 1);
        self.put(frame, 0, clock_col as u16, &clock, TextStyle::Cyan)?;

        self.put(frame, 1, 0, &"=".repeat(w.saturating_sub(1)), TextStyle::Green)?;

        // Test identity and run time.
        self.put(frame, 2, 2, "Current test:", TextStyle::Bold)?;
        self.put(frame, 2, 16, &snapshot.test_name, TextStyle::Plain)?;
        let elapsed = format!("Run time: {}", format_elapsed(snapshot.elapsed_secs));
        let elapsed_col = w.saturating_sub(elapsed.len() + 2);
        self.put(frame, 2, elapsed_col as u16, &elapsed, TextStyle::Cyan)?;

        self.put(frame, 4, 2, "Performance metrics", TextStyle::Bold)?;

        // Gauges, colored by their threshold bands.
        let throughput = format!("{} logs/s", format_count(snapshot.throughput_logs_per_sec));
        self.put(frame, 6, 4, "Throughput:", TextStyle::Plain)?;
        self.put(
            frame,
            6,
            18,
            &throughput,
            throughput_style(snapshot.throughput_logs_per_sec),
        )?;

        self.put(frame, 7, 4, "CPU usage:", TextStyle::Plain)?;
        self.put(
            frame,
            7,
            18,
            &format!("{:.1}%", snapshot.cpu_percent),
            cpu_style(snapshot.cpu_percent),
        )?;

        self.put(frame, 8, 4, "Memory:", TextStyle::Plain)?;
        self.put(
            frame,
            8,
            18,
            &format!("{:.1} MB", snapshot.memory_mb),
            memory_style(snapshot.memory_mb),
        )?;

        self.put(frame, 9, 4, "Disk write:", TextStyle::Plain)?;
        self.put(
            frame,
            9,
            18,
            &format!("{:.1} KB/s", snapshot.disk_write_kbps),
            disk_style(snapshot.disk_write_kbps),
        )?;

        self.put(frame, 10, 4, "Log size:", TextStyle::Plain)?;
        self.put(
            frame,
            10,
            18,
            &format!("{:.1} MB", snapshot.log_size_mb),
            log_size_style(snapshot.log_size_mb),
        )?;

        // Throughput bar with its scale line.
        let graph_width = w.saturating_sub(20).max(1);
        self.put(frame, 12, 2, "Throughput graph:", TextStyle::Bold)?;
        let scale_end = format_count(graph_width as u64 * THROUGHPUT_PER_CELL);
        let pad = graph_width.saturating_sub(scale_end.len() + 1);
        self.put(
            frame,
            13,
            4,
            &format!("0{}{}", " ".repeat(pad), scale_end),
            TextStyle::Plain,
        )?;
        let cells = (snapshot.throughput_logs_per_sec / THROUGHPUT_PER_CELL) as usize;
        self.put(frame, 14, 4, &bar(cells, graph_width), TextStyle::Green)?;

        // CPU and memory load bars.
        self.put(frame, 16, 2, "System load:", TextStyle::Bold)?;
        let cpu_cells = (snapshot.cpu_percent / 100.0 * graph_width as f64) as usize;
        self.put(frame, 17, 4, "CPU:", TextStyle::Plain)?;
        self.put(
            frame,
            17,
            9,
            &bar(cpu_cells, graph_width),
            percent_style(snapshot.cpu_percent),
        )?;

        let mem_percent = (snapshot.memory_mb / MEMORY_BAR_FULL_MB * 100.0).min(100.0);
        let mem_cells = (mem_percent / 100.0 * graph_width as f64) as usize;
        self.put(frame, 18, 4, "Mem:", TextStyle::Plain)?;
        self.put(frame, 18, 9, &bar(mem_cells, graph_width), percent_style(mem_percent))?;

        // Footer: last update, staleness, quit hint.
        let footer_row = height - 2;
        let mut status = format!("Last update: {}", snapshot.last_update.format("%H:%M:%S"));
        if is_stale(snapshot) {
            status.push_str("  [no fresh data]");
        }
        self.put(frame, footer_row, 2, &status, TextStyle::Cyan)?;
        let hint = "Press 'q' to quit";
        let hint_col = w.saturating_sub(hint.len() + 2);
        self.put(frame, footer_row, hint_col as u16, hint, TextStyle::Yellow)?;

        self.term.flush()
    }

    /// Writes `text` clipped to the current frame; out-of-frame rows and
    /// columns are dropped rather than wrapped.
    fn put(
        &mut self,
        (width, height): (u16, u16),
        row: u16,
        col: u16,
        text: &str,
        style: TextStyle,
    ) -> io::Result<()> {
        if row >= height || col >= width {
            return Ok(());
        }
        let avail = (width - col) as usize;
        let clipped: String = text.chars().take(avail).collect();
        if clipped.is_empty() {
            return Ok(());
        }
        self.term.write_at(row, col, &clipped, style)
    }
}

/// True when the snapshot has not been refreshed recently enough to be
/// presented as live data.
fn is_stale(snapshot: &Snapshot) -> bool {
    (Local::now() - snapshot.last_update).num_seconds() > STALE_AFTER_SECS
}

/// Drives the render loop until the quit key or the stop flag.
///
/// The loop always reads the latest snapshot; it may redraw the same one
/// more than once and may skip snapshots entirely, both fine for a
/// latest-known-state display.
pub async fn run<T: Terminal>(
    mut renderer: Renderer<T>,
    state: Arc<SharedSnapshot>,
    period: Duration,
    stop: Arc<AtomicBool>,
) -> io::Result<()> {
    let mut ticker = interval(period);

    loop {
        ticker.tick().await;
        if stop.load(Ordering::Relaxed) {
            debug!("render loop stopping on external signal");
            return Ok(());
        }
        if renderer.wants_quit()? {
            debug!("quit key pressed");
            stop.store(true, Ordering::Relaxed);
            return Ok(());
        }
        let snapshot = state.current();
        renderer.draw(&snapshot)?;
    }
}
