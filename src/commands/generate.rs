//! Synthetic log generation subcommand.
//!
//! Writes severity-suffixed log files shaped like a benchmark run's
//! output, so the dashboard can be exercised without a real run. Repeated
//! invocations with `--append` simulate a live, growing log directory.

use chrono::Local;
use rand::Rng;
use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Severity names paired with their share of generated records, roughly
/// matching a benchmark run's output mix.
const SEVERITIES: [(&str, u32); 3] = [("INFO", 90), ("WARN", 8), ("ERROR", 2)];

/// Writes synthetic log files into `dir`.
pub fn command_gen_logs(
    dir: PathBuf,
    records: usize,
    record_bytes: usize,
    append: bool,
) -> anyhow::Result<()> {
    fs::create_dir_all(&dir)?;
    let mut rng = rand::thread_rng();
    let counts = write_records(&dir, records, record_bytes, append, &mut rng)?;

    println!(
        "✅ Wrote {} records ({} INFO, {} WARN, {} ERROR) to {}",
        records,
        counts[0],
        counts[1],
        counts[2],
        dir.display()
    );
    Ok(())
}

/// Writes `records` randomized records across the three severity files.
/// Returns per-severity record counts.
fn write_records(
    dir: &Path,
    records: usize,
    record_bytes: usize,
    append: bool,
    rng: &mut impl Rng,
) -> io::Result<[usize; 3]> {
    let mut writers = Vec::with_capacity(SEVERITIES.len());
    for (severity, _) in SEVERITIES {
        let path = dir.join(format!("perf_test.{severity}"));
        let file = OpenOptions::new()
            .create(true)
            .append(append)
            .write(true)
            .truncate(!append)
            .open(&path)?;
        debug!("writing synthetic records to {}", path.display());
        writers.push(BufWriter::new(file));
    }

    let mut counts = [0usize; 3];
    for i in 0..records {
        let idx = pick_severity(rng.gen_range(0..100));
        let payload = random_payload(rng, record_bytes);
        writeln!(
            writers[idx],
            "{} [{}] record {}: {}",
            Local::now().format("%H:%M:%S%.3f"),
            SEVERITIES[idx].0,
            i,
            payload
        )?;
        counts[idx] += 1;
    }

    for mut writer in writers {
        writer.flush()?;
    }

    Ok(counts)
}

/// Maps a 0..100 draw onto a severity index by cumulative share.
fn pick_severity(draw: u32) -> usize {
    let mut cumulative = 0;
    for (idx, (_, share)) in SEVERITIES.iter().enumerate() {
        cumulative += share;
        if draw < cumulative {
            return idx;
        }
    }
    SEVERITIES.len() - 1
}

fn random_payload(rng: &mut impl Rng, len: usize) -> String {
    (0..len)
        .map(|_| rng.sample(rand::distributions::Alphanumeric) as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logs;

    #[test]
    fn test_pick_severity_shares() {
        assert_eq!(pick_severity(0), 0);
        assert_eq!(pick_severity(89), 0);
        assert_eq!(pick_severity(90), 1);
        assert_eq!(pick_severity(97), 1);
        assert_eq!(pick_severity(98), 2);
        assert_eq!(pick_severity(99), 2);
    }

    #[test]
    fn test_write_records_produces_recognized_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut rng = rand::thread_rng();

        let counts = write_records(dir.path(), 500, 100, false, &mut rng).unwrap();
        assert_eq!(counts.iter().sum::<usize>(), 500);

        let scan = logs::scan_log_dir(dir.path()).unwrap();
        assert!(scan.total_bytes > 0);
        assert!(scan.active.is_some());
    }

    #[test]
    fn test_append_grows_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut rng = rand::thread_rng();

        write_records(dir.path(), 200, 100, false, &mut rng).unwrap();
        let first = logs::scan_log_dir(dir.path()).unwrap().total_bytes;

        write_records(dir.path(), 200, 100, true, &mut rng).unwrap();
        let second = logs::scan_log_dir(dir.path()).unwrap().total_bytes;
        assert!(second > first);
    }

    #[test]
    fn test_truncate_resets_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut rng = rand::thread_rng();

        write_records(dir.path(), 400, 100, false, &mut rng).unwrap();
        let first = logs::scan_log_dir(dir.path()).unwrap().total_bytes;

        write_records(dir.path(), 100, 100, false, &mut rng).unwrap();
        let second = logs::scan_log_dir(dir.path()).unwrap().total_bytes;
        assert!(second < first);
    }
}
