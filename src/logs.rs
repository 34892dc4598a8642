//! Log directory scanning.
//!
//! The benchmark writes severity-suffixed log files into a single
//! directory. Each sampling tick needs the aggregate size of the
//! recognized files and the most recently modified one, whose growth
//! drives the throughput estimate.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// File name suffixes recognized as benchmark log output.
pub const LOG_SUFFIXES: [&str; 3] = [".INFO", ".WARN", ".ERROR"];

/// The most recently modified recognized log file.
#[derive(Debug, Clone)]
pub struct ActiveLog {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub modified: SystemTime,
}

/// Result of one scan over the log directory.
#[derive(Debug, Clone, Default)]
pub struct LogScan {
    pub total_bytes: u64,
    pub active: Option<ActiveLog>,
}

/// Scans `dir` for recognized log files, summing their sizes and tracking
/// the newest by modification time.
///
/// Files that vanish between listing and stat are skipped; the benchmark
/// rotates logs while this runs.
pub fn scan_log_dir(dir: &Path) -> io::Result<LogScan> {
    let mut scan = LogScan::default();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let file_name = entry.file_name();
        let name = match file_name.to_str() {
            Some(v) => v,
            None => continue,
        };
        if !is_log_file(name) {
            continue;
        }

        let meta = match entry.metadata() {
            Ok(m) => m,
            Err(_) => continue,
        };
        if !meta.is_file() {
            continue;
        }
        scan.total_bytes += meta.len();

        let modified = match meta.modified() {
            Ok(t) => t,
            Err(_) => continue,
        };
        let newer = match &scan.active {
            Some(active) => modified > active.modified,
            None => true,
        };
        if newer {
            scan.active = Some(ActiveLog {
                path: entry.path(),
                size_bytes: meta.len(),
                modified,
            });
        }
    }

    Ok(scan)
}

/// True when the file name carries one of the recognized severity suffixes.
fn is_log_file(name: &str) -> bool {
    LOG_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use std::thread::sleep;
    use std::time::Duration;

    fn write_file(dir: &Path, name: &str, bytes: usize) -> PathBuf {
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(&vec![b'x'; bytes]).unwrap();
        path
    }

    #[test]
    fn test_is_log_file() {
        assert!(is_log_file("perf_test.20260805.INFO"));
        assert!(is_log_file("perf_test.WARN"));
        assert!(is_log_file("perf_test.ERROR"));
        assert!(!is_log_file("perf_test.log"));
        assert!(!is_log_file("perf_test.INFO.old"));
        assert!(!is_log_file("results.csv"));
    }

    #[test]
    fn test_scan_sums_recognized_files_only() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "a.INFO", 100);
        write_file(dir.path(), "b.WARN", 200);
        write_file(dir.path(), "c.ERROR", 300);
        write_file(dir.path(), "ignored.txt", 4000);

        let scan = scan_log_dir(dir.path()).unwrap();
        assert_eq!(scan.total_bytes, 600);
    }

    #[test]
    fn test_scan_tracks_newest_file() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "old.INFO", 50);
        sleep(Duration::from_millis(30));
        let newest = write_file(dir.path(), "new.ERROR", 75);

        let scan = scan_log_dir(dir.path()).unwrap();
        let active = scan.active.expect("active log file");
        assert_eq!(active.path, newest);
        assert_eq!(active.size_bytes, 75);
    }

    #[test]
    fn test_scan_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let scan = scan_log_dir(dir.path()).unwrap();
        assert_eq!(scan.total_bytes, 0);
        assert!(scan.active.is_none());
    }

    #[test]
    fn test_scan_missing_directory_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("not_there");
        assert!(scan_log_dir(&missing).is_err());
    }
}
