//! System check subcommand.
//!
//! Validates that the machine can actually feed the dashboard before a
//! benchmark run: /proc readability, the disk counter, the process table,
//! the log directory, and the effective configuration.

use std::path::{Path, PathBuf};

use crate::config::{self, Config};
use crate::{logs, process, system};

/// Validates system requirements and configuration.
pub fn command_check(proc: bool, logs_flag: bool, all: bool, config: &Config) -> anyhow::Result<()> {
    println!("🔍 perf-monitor - System Check");
    println!("==============================");

    // Bare `check` behaves like `check --all`.
    let everything = all || (!proc && !logs_flag);
    let mut all_ok = true;

    if proc || everything {
        println!("\n📁 Checking /proc filesystem...");
        if Path::new("/proc").exists() {
            println!("   ✅ /proc filesystem accessible");

            match system::read_disk_write_bytes() {
                Ok(bytes) => println!(
                    "   ✅ Disk write counter readable ({} MB written since boot)",
                    bytes / 1024 / 1024
                ),
                Err(e) => {
                    println!("   ❌ Cannot read disk counters: {}", e);
                    all_ok = false;
                }
            }

            let pattern = config
                .process_pattern
                .clone()
                .unwrap_or_else(|| config::DEFAULT_PROCESS_PATTERN.to_string());
            match process::locate(Path::new("/proc"), &pattern) {
                Some(handle) => println!(
                    "   ✅ Benchmark process found: {} (PID {})",
                    handle.name, handle.pid
                ),
                None => println!(
                    "   ⚠️  No process matching '{}' is running (start the benchmark first)",
                    pattern
                ),
            }
        } else {
            println!("   ❌ /proc filesystem not found");
            all_ok = false;
        }
    }

    if logs_flag || everything {
        println!("\n📄 Checking log directory...");
        let log_dir = config
            .log_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(config::DEFAULT_LOG_DIR));
        if log_dir.exists() {
            match logs::scan_log_dir(&log_dir) {
                Ok(scan) => {
                    println!(
                        "   ✅ {} readable, {:.1} MB of recognized log files",
                        log_dir.display(),
                        scan.total_bytes as f64 / (1024.0 * 1024.0)
                    );
                    match scan.active {
                        Some(active) => {
                            println!("   ✅ Active log file: {}", active.path.display())
                        }
                        None => println!("   ⚠️  No .INFO/.WARN/.ERROR files yet"),
                    }
                }
                Err(e) => {
                    println!("   ❌ Cannot scan {}: {}", log_dir.display(), e);
                    all_ok = false;
                }
            }
        } else {
            println!(
                "   ⚠️  {} does not exist yet (the benchmark creates it on start)",
                log_dir.display()
            );
        }
    }

    println!("\n⚙️  Checking configuration...");
    match config::validate_effective_config(config) {
        Ok(_) => println!("   ✅ Configuration is valid"),
        Err(e) => {
            println!("   ❌ Configuration invalid: {}", e);
            all_ok = false;
        }
    }

    println!("\n📋 Summary:");
    if all_ok {
        println!("   ✅ All checks passed - system is ready");
        Ok(())
    } else {
        println!("   ❌ Some checks failed - please review warnings");
        std::process::exit(1);
    }
}
