//! Benchmark process discovery and per-process metrics from /proc.
//!
//! The dashboard tracks a single externally started process, found by
//! substring match against its name or command line. All file content
//! parsing is split into `&str` helpers so tests can feed literal /proc
//! contents.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::system;

/// Handle to a located benchmark process.
#[derive(Debug, Clone)]
pub struct ProcessHandle {
    pub pid: u32,
    pub name: String,
    pub cmdline: String,
    proc_path: PathBuf,
}

/// Scans the process table under `proc_root` for the first process whose
/// name or command line contains `pattern` as a substring.
///
/// Directory iteration order over /proc is not defined, so when several
/// processes match, which one is returned is not stable across runs.
/// Returns `None` when nothing matches; the benchmark may simply not have
/// started yet.
pub fn locate(proc_root: &Path, pattern: &str) -> Option<ProcessHandle> {
    let entries = fs::read_dir(proc_root).ok()?;

    for entry in entries.flatten() {
        let p = entry.path();
        let name = match p.file_name().and_then(|s| s.to_str()) {
            Some(v) => v,
            None => continue,
        };
        if !name.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }
        let pid: u32 = match name.parse() {
            Ok(v) => v,
            Err(_) => continue,
        };

        let comm = read_comm(&p).unwrap_or_default();
        let cmdline = read_cmdline(&p).unwrap_or_default();
        if comm.contains(pattern) || cmdline.contains(pattern) {
            return Some(ProcessHandle {
                pid,
                name: comm,
                cmdline,
                proc_path: p,
            });
        }
    }

    None
}

impl ProcessHandle {
    /// Extracts the test identifier from a `--test=<identifier>` flag on
    /// the process command line.
    pub fn test_name(&self) -> Option<&str> {
        test_name_from_cmdline(&self.cmdline)
    }

    /// Total CPU time (user + system) consumed so far, in seconds.
    pub fn cpu_time_seconds(&self) -> io::Result<f64> {
        let content = fs::read_to_string(self.proc_path.join("stat"))?;
        parse_cpu_time_seconds(&content, clock_ticks_per_second())
            .ok_or_else(|| io::Error::other("invalid stat format"))
    }

    /// Resident set size in bytes, from the VmRSS line of status.
    pub fn rss_bytes(&self) -> io::Result<u64> {
        let content = fs::read_to_string(self.proc_path.join("status"))?;
        parse_rss_bytes(&content).ok_or_else(|| io::Error::other("no VmRSS in status"))
    }

    /// Seconds since the process started: system uptime minus the process
    /// start time (stat field 22, in clock ticks since boot).
    pub fn elapsed_seconds(&self) -> io::Result<f64> {
        let content = fs::read_to_string(self.proc_path.join("stat"))?;
        let start_ticks = parse_start_time_ticks(&content)
            .ok_or_else(|| io::Error::other("invalid stat format"))?;
        let uptime = system::read_uptime_seconds()?;
        Ok((uptime - start_ticks / clock_ticks_per_second()).max(0.0))
    }
}

/// Reads the short process name from /proc/<pid>/comm.
fn read_comm(proc_path: &Path) -> Option<String> {
    let content = fs::read_to_string(proc_path.join("comm")).ok()?;
    let trimmed = content.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Reads the full command line, NUL separators replaced with spaces.
fn read_cmdline(proc_path: &Path) -> Option<String> {
    let content = fs::read(proc_path.join("cmdline")).ok()?;
    if content.is_empty() {
        return None;
    }
    let parts: Vec<&str> = content
        .split(|&b| b == 0u8)
        .filter_map(|s| std::str::from_utf8(s).ok())
        .filter(|s| !s.is_empty())
        .collect();
    Some(parts.join(" "))
}

/// Extracts the identifier from a `--test=<identifier>` flag, if present.
/// Identifier characters are ASCII alphanumerics and underscore.
pub fn test_name_from_cmdline(cmdline: &str) -> Option<&str> {
    let start = cmdline.find("--test=")? + "--test=".len();
    let rest = &cmdline[start..];
    let end = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(rest.len());
    if end == 0 {
        None
    } else {
        Some(&rest[..end])
    }
}

/// Splits /proc/<pid>/stat into the fields after the parenthesized comm.
/// The comm itself may contain spaces, so fields are counted from the
/// last closing parenthesis.
fn stat_fields_after_comm(content: &str) -> Option<Vec<&str>> {
    let close = content.rfind(')')?;
    Some(content[close + 1..].split_whitespace().collect())
}

/// Parses total CPU time (utime + stime, stat fields 14 and 15) in seconds.
fn parse_cpu_time_seconds(content: &str, ticks_per_sec: f64) -> Option<f64> {
    let fields = stat_fields_after_comm(content)?;
    if fields.len() <= 12 {
        return None;
    }
    let utime: f64 = fields[11].parse().ok()?;
    let stime: f64 = fields[12].parse().ok()?;
    Some((utime + stime) / ticks_per_sec)
}

/// Parses the process start time (stat field 22) in clock ticks since boot.
fn parse_start_time_ticks(content: &str) -> Option<f64> {
    let fields = stat_fields_after_comm(content)?;
    if fields.len() <= 19 {
        return None;
    }
    fields[19].parse().ok()
}

/// Parses the VmRSS line of /proc/<pid>/status into bytes.
fn parse_rss_bytes(content: &str) -> Option<u64> {
    for line in content.lines() {
        if let Some(v) = line.strip_prefix("VmRSS:") {
            return parse_kb_value(v).map(|kb| kb * 1024);
        }
    }
    None
}

/// Parses kilobyte values from status file lines ("    1234 kB").
fn parse_kb_value(v: &str) -> Option<u64> {
    v.split_whitespace().next()?.parse().ok()
}

/// Clock ticks per second for converting stat jiffies.
fn clock_ticks_per_second() -> f64 {
    let ticks = unsafe { libc::sysconf(libc::_SC_CLK_TCK) };
    if ticks > 0 {
        ticks as f64
    } else {
        100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    // pid (comm) state ppid pgrp session tty tpgid flags minflt cminflt
    // majflt cmajflt utime stime ... starttime is the 22nd field.
    const STAT: &str = "4242 (performance_test) S 1 4242 4242 0 -1 4194304 \
        100 0 0 0 250 150 0 0 20 0 9 0 56789 123456789 2048 \
        18446744073709551615 1 1 0 0 0 0 0 0 0 0 0 0 17 3 0 0 0 0 0";

    #[test]
    fn test_parse_cpu_time_seconds() {
        // utime 250 + stime 150 at 100 Hz.
        assert_eq!(parse_cpu_time_seconds(STAT, 100.0), Some(4.0));
    }

    #[test]
    fn test_parse_cpu_time_handles_spaces_in_comm() {
        let stat = "77 (tmux: server) S 1 77 77 0 -1 0 0 0 0 0 30 70 0 0 \
            20 0 1 0 999 0 0 0 0 0 0 0 0 0 0 0 0 0 17 3 0 0 0 0 0";
        assert_eq!(parse_cpu_time_seconds(stat, 100.0), Some(1.0));
    }

    #[test]
    fn test_parse_cpu_time_invalid() {
        assert_eq!(parse_cpu_time_seconds("not a stat line", 100.0), None);
        assert_eq!(parse_cpu_time_seconds("1 (x) S 2 3", 100.0), None);
    }

    #[test]
    fn test_parse_start_time_ticks() {
        assert_eq!(parse_start_time_ticks(STAT), Some(56789.0));
    }

    #[test]
    fn test_parse_rss_bytes() {
        let status = "Name:\tperformance_test\nVmPeak:\t  300000 kB\nVmRSS:\t  204800 kB\nThreads:\t8\n";
        assert_eq!(parse_rss_bytes(status), Some(204800 * 1024));
        assert_eq!(parse_rss_bytes("Name:\tfoo\n"), None);
    }

    #[test]
    fn test_test_name_from_cmdline() {
        assert_eq!(
            test_name_from_cmdline("./performance_test --test=throughput_small --threads=8"),
            Some("throughput_small")
        );
        assert_eq!(
            test_name_from_cmdline("./performance_test --test=latency"),
            Some("latency")
        );
        assert_eq!(test_name_from_cmdline("./performance_test --threads=8"), None);
        assert_eq!(test_name_from_cmdline("./performance_test --test="), None);
    }

    fn fake_proc_entry(root: &Path, pid: u32, comm: &str, cmdline_parts: &[&str]) {
        let dir = root.join(pid.to_string());
        std::fs::create_dir(&dir).unwrap();
        std::fs::write(dir.join("comm"), format!("{comm}\n")).unwrap();
        let mut f = std::fs::File::create(dir.join("cmdline")).unwrap();
        for part in cmdline_parts {
            f.write_all(part.as_bytes()).unwrap();
            f.write_all(&[0]).unwrap();
        }
    }

    #[test]
    fn test_locate_matches_comm_substring() {
        let root = tempfile::tempdir().unwrap();
        fake_proc_entry(root.path(), 10, "bash", &["bash"]);
        fake_proc_entry(
            root.path(),
            20,
            "performance_test",
            &["./performance_test", "--test=burst"],
        );

        let handle = locate(root.path(), "performance_test").expect("match");
        assert_eq!(handle.pid, 20);
        assert_eq!(handle.test_name(), Some("burst"));
    }

    #[test]
    fn test_locate_matches_cmdline_substring() {
        let root = tempfile::tempdir().unwrap();
        fake_proc_entry(
            root.path(),
            30,
            "sh",
            &["sh", "-c", "exec ./performance_test --test=mixed"],
        );

        let handle = locate(root.path(), "performance_test").expect("match");
        assert_eq!(handle.pid, 30);
    }

    #[test]
    fn test_locate_no_match() {
        let root = tempfile::tempdir().unwrap();
        fake_proc_entry(root.path(), 40, "bash", &["bash"]);
        assert!(locate(root.path(), "performance_test").is_none());
    }
}
