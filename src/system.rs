//! System-wide counters from the /proc filesystem.
//!
//! This module provides the cumulative disk-write counter used for the
//! dashboard's disk-rate estimate and the system uptime used to derive
//! how long the benchmark process has been running.

use std::fs;
use std::io;
use std::path::Path;

/// Reads cumulative bytes written across all whole-disk devices from
/// /proc/diskstats.
pub fn read_disk_write_bytes() -> io::Result<u64> {
    read_disk_write_bytes_from(Path::new("/proc/diskstats"))
}

/// Reads the cumulative write counter from a diskstats-format file.
pub fn read_disk_write_bytes_from(path: &Path) -> io::Result<u64> {
    let content = fs::read_to_string(path)?;
    Ok(parse_disk_write_bytes(&content))
}

/// Reads system uptime in seconds from /proc/uptime.
///
/// Format: "12345.67 23456.78" (uptime, idle time).
pub fn read_uptime_seconds() -> io::Result<f64> {
    let content = fs::read_to_string("/proc/uptime")?;
    parse_uptime_seconds(&content).ok_or_else(|| io::Error::other("invalid /proc/uptime format"))
}

/// Sums sectors-written (field 10 of each diskstats line) times the fixed
/// 512-byte sector unit over whole-disk devices.
///
/// Partitions and stacked virtual devices are skipped so a write is not
/// counted once for the partition and again for its parent disk.
fn parse_disk_write_bytes(content: &str) -> u64 {
    let mut total: u64 = 0;

    for line in content.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 10 {
            continue;
        }
        if !is_whole_disk(parts[2]) {
            continue;
        }
        let sectors: u64 = parts[9].parse().unwrap_or(0);
        total += sectors * 512;
    }

    total
}

/// True for device names that represent a whole physical disk.
fn is_whole_disk(name: &str) -> bool {
    for prefix in ["loop", "ram", "zram", "fd", "sr", "dm-", "md"] {
        if name.starts_with(prefix) {
            return false;
        }
    }
    // nvme0n1 is a disk, nvme0n1p1 a partition; same for mmcblk.
    if let Some(rest) = name.strip_prefix("nvme") {
        return !rest.contains('p');
    }
    if let Some(rest) = name.strip_prefix("mmcblk") {
        return !rest.contains('p');
    }
    // sda is a disk, sda1 a partition.
    !name.ends_with(|c: char| c.is_ascii_digit())
}

fn parse_uptime_seconds(content: &str) -> Option<f64> {
    content.split_whitespace().next()?.parse().ok()
}
