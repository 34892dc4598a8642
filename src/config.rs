//! Configuration loading and resolution.
//!
//! Settings merge with the precedence CLI > config file > defaults,
//! matching what `--show-config` prints. Config files may be YAML, JSON,
//! or TOML, selected by extension.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::cli::{Args, ConfigFormat};

/// Default location of the benchmark's log output.
pub const DEFAULT_LOG_DIR: &str = "./perf_logs";
/// Default substring used to find the benchmark process.
pub const DEFAULT_PROCESS_PATTERN: &str = "performance_test";
pub const DEFAULT_SAMPLE_INTERVAL_MS: u64 = 1000;
pub const DEFAULT_RENDER_INTERVAL_MS: u64 = 500;
/// Default destination for structured log output in dashboard mode.
pub const DEFAULT_LOG_FILE: &str = "perf-monitor.log";

/// Effective monitor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub log_dir: Option<PathBuf>,
    pub process_pattern: Option<String>,
    pub sample_interval_ms: Option<u64>,
    pub render_interval_ms: Option<u64>,
    pub log_level: Option<String>,
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_dir: Some(PathBuf::from(DEFAULT_LOG_DIR)),
            process_pattern: Some(DEFAULT_PROCESS_PATTERN.to_string()),
            sample_interval_ms: Some(DEFAULT_SAMPLE_INTERVAL_MS),
            render_interval_ms: Some(DEFAULT_RENDER_INTERVAL_MS),
            log_level: Some("info".to_string()),
            log_file: Some(PathBuf::from(DEFAULT_LOG_FILE)),
        }
    }
}

/// Resolves configuration from CLI args, config file, and defaults.
/// Precedence: CLI (if provided) > config file > default.
pub fn resolve_config(args: &Args) -> anyhow::Result<Config> {
    let mut config = if args.no_config {
        Config::default()
    } else {
        load_config(args.config.as_deref())?
    };

    if let Some(dir) = &args.log_dir {
        config.log_dir = Some(dir.clone());
    }
    if let Some(pattern) = &args.pattern {
        config.process_pattern = Some(pattern.clone());
    }
    if let Some(ms) = args.sample_interval_ms {
        config.sample_interval_ms = Some(ms);
    }
    if let Some(ms) = args.render_interval_ms {
        config.render_interval_ms = Some(ms);
    }
    if let Some(level) = args.log_level {
        config.log_level = Some(level.as_str().to_string());
    }
    if let Some(file) = &args.log_file {
        config.log_file = Some(file.clone());
    }

    Ok(config)
}

/// Loads a config file, probing default locations when no path is given.
fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => {
            let defaults = [
                "/etc/perf-monitor/config.yaml",
                "./perf-monitor.yaml",
                "./perf-monitor.yml",
                "./perf-monitor.json",
                "./perf-monitor.toml",
            ];
            match defaults.iter().find(|p| Path::new(p).exists()) {
                Some(p) => PathBuf::from(p),
                None => return Ok(Config::default()),
            }
        }
    };

    if !path.exists() {
        anyhow::bail!("config file not found: {}", path.display());
    }

    let content = fs::read_to_string(&path)?;
    let config = parse_config(&content, path.extension().and_then(|s| s.to_str()))?;
    info!("Loaded configuration from: {}", path.display());
    Ok(config)
}

/// Parses config content by file extension; anything unrecognized is
/// treated as YAML.
fn parse_config(content: &str, extension: Option<&str>) -> anyhow::Result<Config> {
    let mut config = match extension {
        Some("json") => serde_json::from_str::<Config>(content)?,
        Some("toml") => toml::from_str::<Config>(content)?,
        _ => serde_yaml::from_str::<Config>(content)?,
    };

    // Missing keys fall back to defaults rather than staying empty.
    let defaults = Config::default();
    config.log_dir = config.log_dir.or(defaults.log_dir);
    config.process_pattern = config.process_pattern.or(defaults.process_pattern);
    config.sample_interval_ms = config.sample_interval_ms.or(defaults.sample_interval_ms);
    config.render_interval_ms = config.render_interval_ms.or(defaults.render_interval_ms);
    config.log_level = config.log_level.or(defaults.log_level);
    config.log_file = config.log_file.or(defaults.log_file);

    Ok(config)
}

/// Validates effective config (used by --check-config and at startup).
pub fn validate_effective_config(cfg: &Config) -> anyhow::Result<()> {
    if cfg.sample_interval_ms.unwrap_or(DEFAULT_SAMPLE_INTERVAL_MS) == 0 {
        anyhow::bail!("sample_interval_ms must be greater than zero");
    }
    if cfg.render_interval_ms.unwrap_or(DEFAULT_RENDER_INTERVAL_MS) == 0 {
        anyhow::bail!("render_interval_ms must be greater than zero");
    }
    if cfg
        .process_pattern
        .as_deref()
        .unwrap_or(DEFAULT_PROCESS_PATTERN)
        .is_empty()
    {
        anyhow::bail!("process_pattern must not be empty");
    }

    let level = cfg.log_level.as_deref().unwrap_or("info");
    match level {
        "off" | "error" | "warn" | "info" | "debug" | "trace" => {}
        other => anyhow::bail!(
            "invalid log_level '{}', expected off|error|warn|info|debug|trace",
            other
        ),
    }

    Ok(())
}

/// Shows configuration in the requested format.
pub fn show_config(config: &Config, format: ConfigFormat) -> anyhow::Result<()> {
    let output = render_config(config, format)?;
    println!("{output}");
    Ok(())
}

fn render_config(config: &Config, format: ConfigFormat) -> anyhow::Result<String> {
    Ok(match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    })
}

/// Generates a starter configuration file.
pub fn command_config(
    output: Option<PathBuf>,
    format: ConfigFormat,
    commented: bool,
) -> anyhow::Result<()> {
    let config = Config::default();
    let output = output.unwrap_or_else(|| PathBuf::from("perf-monitor.yaml"));

    let mut content = render_config(&config, format)?;
    if commented {
        if let ConfigFormat::Yaml = format {
            content = add_config_comments(content);
        }
    }

    if output.to_string_lossy() == "-" {
        print!("{}", content);
    } else {
        fs::write(&output, content)?;
        println!("✅ Configuration written to: {}", output.display());
    }

    Ok(())
}

/// Adds comments to YAML configuration.
fn add_config_comments(yaml: String) -> String {
    let comments = r#"# perf-monitor Configuration
# ==========================
#
# Sampling
# --------
# log_dir: "./perf_logs"         # Directory the benchmark writes logs into
# process_pattern: "performance_test"  # Substring that identifies the process
# sample_interval_ms: 1000       # Metric sampling cadence
# render_interval_ms: 500        # Dashboard redraw cadence
#
# Logging
# -------
# log_level: "info"              # off, error, warn, info, debug, trace
# log_file: "perf-monitor.log"   # Structured log destination in dashboard mode
"#;

    format!("{comments}\n{yaml}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.log_dir.unwrap(), PathBuf::from("./perf_logs"));
        assert_eq!(config.process_pattern.unwrap(), "performance_test");
        assert_eq!(config.sample_interval_ms, Some(1000));
        assert_eq!(config.render_interval_ms, Some(500));
    }

    #[test]
    fn test_cli_overrides_defaults() {
        let args = Args::parse_from([
            "perf-monitor",
            "--no-config",
            "--log-dir",
            "/tmp/logs",
            "--pattern",
            "my_bench",
            "--sample-interval-ms",
            "250",
        ]);
        let config = resolve_config(&args).unwrap();
        assert_eq!(config.log_dir.unwrap(), PathBuf::from("/tmp/logs"));
        assert_eq!(config.process_pattern.unwrap(), "my_bench");
        assert_eq!(config.sample_interval_ms, Some(250));
        // Untouched values keep their defaults.
        assert_eq!(config.render_interval_ms, Some(500));
    }

    #[test]
    fn test_parse_yaml_with_partial_keys() {
        let yaml = "log_dir: /var/log/bench\nsample_interval_ms: 2000\n";
        let config = parse_config(yaml, Some("yaml")).unwrap();
        assert_eq!(config.log_dir.unwrap(), PathBuf::from("/var/log/bench"));
        assert_eq!(config.sample_interval_ms, Some(2000));
        assert_eq!(config.process_pattern.unwrap(), "performance_test");
    }

    #[test]
    fn test_parse_json_and_toml() {
        let json = r#"{"process_pattern": "stress_run"}"#;
        let config = parse_config(json, Some("json")).unwrap();
        assert_eq!(config.process_pattern.unwrap(), "stress_run");

        let toml = "render_interval_ms = 100\n";
        let config = parse_config(toml, Some("toml")).unwrap();
        assert_eq!(config.render_interval_ms, Some(100));
    }

    #[test]
    fn test_validate_rejects_zero_intervals() {
        let mut config = Config::default();
        config.sample_interval_ms = Some(0);
        assert!(validate_effective_config(&config).is_err());

        let mut config = Config::default();
        config.render_interval_ms = Some(0);
        assert!(validate_effective_config(&config).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_log_level() {
        let mut config = Config::default();
        config.log_level = Some("verbose".to_string());
        assert!(validate_effective_config(&config).is_err());
    }

    #[test]
    fn test_validate_rejects_empty_pattern() {
        let mut config = Config::default();
        config.process_pattern = Some(String::new());
        assert!(validate_effective_config(&config).is_err());
    }

    #[test]
    fn test_validate_accepts_defaults() {
        assert!(validate_effective_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_render_config_round_trips_yaml() {
        let rendered = render_config(&Config::default(), ConfigFormat::Yaml).unwrap();
        let parsed = parse_config(&rendered, Some("yaml")).unwrap();
        assert_eq!(parsed.process_pattern.unwrap(), "performance_test");
    }
}
