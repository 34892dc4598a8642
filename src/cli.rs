//! CLI arguments and subcommands for perf-monitor.
//!
//! This module defines the command-line interface structure using the
//! clap library, including all flags, options, and subcommands.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Log level options for CLI parsing
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Configuration format options for output
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

/// Main CLI arguments structure
#[derive(Parser, Debug)]
#[command(
    name = "perf-monitor",
    about = "Live terminal dashboard for log-throughput benchmark runs",
    long_about = "Live terminal dashboard for log-throughput benchmark runs.\n\n\
                  Watches the benchmark process and its log directory, estimates \
                  throughput from log growth, and renders CPU, memory, disk, and \
                  log-size gauges with threshold coloring. Press 'q' to quit.",
    version = "0.1.0",
    propagate_version = true
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Directory the benchmark writes its log files into
    #[arg(short = 'd', long)]
    pub log_dir: Option<PathBuf>,

    /// Substring that identifies the benchmark process
    #[arg(long)]
    pub pattern: Option<String>,

    /// Sampling interval in milliseconds
    #[arg(long)]
    pub sample_interval_ms: Option<u64>,

    /// Render interval in milliseconds
    #[arg(long)]
    pub render_interval_ms: Option<u64>,

    /// Log level
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Structured log output file (keeps events off the dashboard screen)
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Config file (YAML/JSON/TOML)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Disable all config file loading
    #[arg(long)]
    pub no_config: bool,

    /// Print effective merged config and exit
    #[arg(long)]
    pub show_config: bool,

    /// Output format for --show-config
    #[arg(long, value_enum, default_value = "yaml")]
    pub config_format: ConfigFormat,

    /// Validate config and exit (return code 1 on error)
    #[arg(long)]
    pub check_config: bool,
}

/// Subcommands for additional functionality
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate system requirements for the dashboard
    Check {
        /// Check the /proc filesystem
        #[arg(long)]
        proc: bool,

        /// Check the log directory
        #[arg(long)]
        logs: bool,

        /// Check all requirements
        #[arg(long)]
        all: bool,
    },

    /// Generate a starter configuration file
    Config {
        /// Output file path ("-" for stdout)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "yaml")]
        format: ConfigFormat,

        /// Include comments and examples
        #[arg(long)]
        commented: bool,
    },

    /// Write synthetic log files for exercising the dashboard
    GenLogs {
        /// Target directory (defaults to the configured log directory)
        #[arg(short = 'o', long)]
        dir: Option<PathBuf>,

        /// Number of records to write
        #[arg(short = 'n', long, default_value_t = 100_000)]
        records: usize,

        /// Record payload size in bytes
        #[arg(long, default_value_t = 100)]
        record_bytes: usize,

        /// Append to existing files instead of truncating
        #[arg(long)]
        append: bool,
    },
}
