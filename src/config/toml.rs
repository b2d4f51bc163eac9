//! TOML configuration file parsing

use super::*;
use crate::config::cli::Cli;
use crate::config::cli_convert::{convert_payload_pattern, parse_size};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Parse TOML configuration file
pub fn parse_toml_file(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_toml_string(&contents)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Parse TOML configuration from string
pub fn parse_toml_string(contents: &str) -> Result<Config> {
    let config: Config = ::toml::from_str(contents)
        .context("Failed to parse TOML configuration")?;

    Ok(config)
}

/// Build the effective configuration: file (if any), then CLI on top
pub fn load_config(cli: &Cli) -> Result<Config> {
    let base = match cli.config {
        Some(ref path) => parse_toml_file(path)?,
        None => Config::default(),
    };
    merge_cli_with_config(cli, base)
}

/// Merge CLI arguments with TOML configuration (CLI takes precedence)
pub fn merge_cli_with_config(cli: &Cli, mut config: Config) -> Result<Config> {
    // Target
    if let Some(ref url) = cli.url {
        config.target.url = url.clone();
    }
    if let Some(ref key) = cli.access_key {
        config.target.access_key = key.clone();
    }
    if let Some(ref key) = cli.secret_key {
        config.target.secret_key = key.clone();
    }
    if let Some(ref region) = cli.region {
        config.target.region = region.clone();
    }
    if let Some(ref prefix) = cli.bucket_prefix {
        config.target.bucket_prefix = prefix.clone();
    }
    if let Some(ref prefix) = cli.object_prefix {
        config.target.object_prefix = prefix.clone();
    }

    // Workload
    if let Some(ref modes) = cli.modes {
        config.workload.modes = modes.parse().context("Invalid modes passed to -m")?;
    }
    if let Some(threads) = cli.threads {
        config.workload.threads = threads;
    }
    if let Some(loops) = cli.loops {
        config.workload.loops = loops;
    }
    if let Some(duration) = cli.duration {
        config.workload.duration_secs = duration;
    }
    if let Some(objects) = cli.objects {
        config.workload.object_count = objects;
    }
    if let Some(buckets) = cli.buckets {
        config.workload.bucket_count = buckets;
    }
    if let Some(ref size) = cli.size {
        config.workload.object_size =
            parse_size(size).context("Invalid -z argument for object size")?;
    }
    if let Some(interval) = cli.report_interval {
        config.workload.report_interval = interval;
    }
    if let Some(max_keys) = cli.max_keys {
        config.workload.max_keys = max_keys;
    }
    if let Some(seed) = cli.seed {
        config.workload.seed = seed;
    }
    if cli.zero_data {
        config.workload.payload = convert_payload_pattern(true);
    }
    if cli.randomize_suffix {
        config.workload.randomize_suffix = true;
    }
    if cli.loop_objects {
        config.workload.loop_objects = true;
    }

    // Output
    if cli.csv_output.is_some() {
        config.output.csv_output = cli.csv_output.clone();
    }
    if cli.json_output.is_some() {
        config.output.json_output = cli.json_output.clone();
    }

    // Runtime
    if cli.dry_run {
        config.runtime.dry_run = true;
    }
    config.runtime.verbose = config.runtime.verbose.max(cli.verbose);

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::workload::{Mode, PayloadPattern};
    use std::io::Write;

    #[test]
    fn test_parse_toml_string() {
        let toml_str = r#"
[target]
url = "http://127.0.0.1:8000"
access_key = "ak"
secret_key = "sk"
bucket_prefix = "bench-"

[workload]
modes = "ipgd"
threads = 16
duration_secs = -1
object_count = 5000
object_size = 4096
report_interval = 0.5
payload = "zeros"

[output]
csv_output = "/tmp/out.csv"
"#;

        let config = parse_toml_string(toml_str).unwrap();
        assert_eq!(config.target.url, "http://127.0.0.1:8000");
        assert_eq!(config.target.secret_key, "sk");
        assert_eq!(config.target.region, "us-east-1");
        assert_eq!(config.target.bucket_prefix, "bench-");
        assert_eq!(config.workload.modes.modes()[1], Mode::Put);
        assert_eq!(config.workload.threads, 16);
        assert_eq!(config.workload.object_limit(), Some(5000));
        assert_eq!(config.workload.duration_limit(), None);
        assert_eq!(config.workload.payload, PayloadPattern::Zeros);
        assert_eq!(config.workload.max_keys, 1000);
        assert!(config.output.json_output.is_none());
    }

    #[test]
    fn test_parse_toml_rejects_bad_modes() {
        let toml_str = "[workload]\nmodes = \"ipq\"\n";
        assert!(parse_toml_string(toml_str).is_err());
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config = parse_toml_string("").unwrap();
        assert_eq!(config.workload.threads, 1);
        assert_eq!(config.workload.modes.to_string(), "cxiplgdcx");
    }

    #[test]
    fn test_cli_overrides_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[workload]\nthreads = 4\nloops = 3\nmodes = \"ip\"").unwrap();

        let cli = Cli {
            config: Some(file.path().to_path_buf()),
            threads: Some(12),
            size: Some("4K".to_string()),
            zero_data: true,
            ..Default::default()
        };

        let config = load_config(&cli).unwrap();
        assert_eq!(config.workload.threads, 12);
        assert_eq!(config.workload.loops, 3);
        assert_eq!(config.workload.modes.to_string(), "ip");
        assert_eq!(config.workload.object_size, 4096);
        assert_eq!(config.workload.payload, PayloadPattern::Zeros);
    }

    #[test]
    fn test_cli_invalid_modes() {
        let cli = Cli {
            modes: Some("ipz".to_string()),
            ..Default::default()
        };
        assert!(merge_cli_with_config(&cli, Config::default()).is_err());
    }
}
