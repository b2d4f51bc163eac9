//! Configuration module
//!
//! Handles CLI argument parsing, TOML configuration files, and validation.
//!
//! The resulting [`Config`] is immutable for the lifetime of a run and is
//! shared with every worker through an `Arc`. Mutable run state (counters,
//! carried-over object counts) lives in the coordinator, not here.

pub mod cli;
pub mod cli_convert;
pub mod toml;
pub mod validator;
pub mod workload;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use workload::*;

/// URL scheme selecting the in-memory object store
pub const MEMORY_URL_SCHEME: &str = "mem://";

/// Complete run configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub target: TargetConfig,
    #[serde(default)]
    pub workload: WorkloadConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

/// Storage endpoint and naming
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Endpoint URL with scheme, or `mem://` for the in-memory store
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub access_key: String,
    #[serde(default, skip_serializing)]
    pub secret_key: String,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default = "default_bucket_prefix")]
    pub bucket_prefix: String,
    #[serde(default)]
    pub object_prefix: String,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_bucket_prefix() -> String {
    "hotsauce-bench".to_string()
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            access_key: String::new(),
            secret_key: String::new(),
            region: default_region(),
            bucket_prefix: default_bucket_prefix(),
            object_prefix: String::new(),
        }
    }
}

impl TargetConfig {
    /// Whether the run targets the in-memory store instead of a real endpoint
    pub fn is_memory(&self) -> bool {
        self.url.starts_with(MEMORY_URL_SCHEME)
    }

    /// Name of bucket `index`
    pub fn bucket_name(&self, index: u64) -> String {
        format!("{}{:012}", self.bucket_prefix, index)
    }

    /// Key of object `index` when suffix randomization is off
    pub fn object_key(&self, index: u64) -> String {
        format!("{}{:012}", self.object_prefix, index)
    }
}

/// Phase sequence and load shape
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkloadConfig {
    /// Phases to run, in order
    #[serde(default)]
    pub modes: ModeSequence,
    /// Workers per phase
    #[serde(default = "default_threads")]
    pub threads: usize,
    /// Number of times the whole phase sequence is repeated
    #[serde(default = "default_loops")]
    pub loops: usize,
    /// Maximum phase duration in seconds (-1 = unlimited)
    #[serde(default = "default_duration_secs")]
    pub duration_secs: i64,
    /// Maximum number of objects (-1 = unlimited)
    #[serde(default = "default_object_count")]
    pub object_count: i64,
    /// Number of buckets objects are spread across
    #[serde(default = "default_bucket_count")]
    pub bucket_count: u64,
    /// Seconds between interval reports (<= 0 disables interval reporting)
    #[serde(default = "default_report_interval")]
    pub report_interval: f64,
    /// Object size in bytes
    #[serde(default = "default_object_size")]
    pub object_size: u64,
    /// Page size requested from bucket listings
    #[serde(default = "default_max_keys")]
    pub max_keys: i32,
    /// Use random identifiers instead of object indices as key suffixes
    #[serde(default)]
    pub randomize_suffix: bool,
    /// Seed for the suffix generator
    #[serde(default)]
    pub seed: u64,
    /// Wrap object indices modulo the object count in duration-bound get phases
    #[serde(default)]
    pub loop_objects: bool,
    /// Object payload content
    #[serde(default)]
    pub payload: PayloadPattern,
}

fn default_threads() -> usize {
    1
}

fn default_loops() -> usize {
    1
}

fn default_duration_secs() -> i64 {
    60
}

fn default_object_count() -> i64 {
    -1
}

fn default_bucket_count() -> u64 {
    1
}

fn default_report_interval() -> f64 {
    1.0
}

fn default_object_size() -> u64 {
    1024 * 1024
}

fn default_max_keys() -> i32 {
    1000
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            modes: ModeSequence::default(),
            threads: default_threads(),
            loops: default_loops(),
            duration_secs: default_duration_secs(),
            object_count: default_object_count(),
            bucket_count: default_bucket_count(),
            report_interval: default_report_interval(),
            object_size: default_object_size(),
            max_keys: default_max_keys(),
            randomize_suffix: false,
            seed: 0,
            loop_objects: false,
            payload: PayloadPattern::default(),
        }
    }
}

impl WorkloadConfig {
    /// Phase duration bound, `None` when unlimited
    pub fn duration_limit(&self) -> Option<Duration> {
        if self.duration_secs < 0 {
            None
        } else {
            Some(Duration::from_secs(self.duration_secs as u64))
        }
    }

    /// Object count bound, `None` when unlimited
    pub fn object_limit(&self) -> Option<u64> {
        if self.object_count < 0 {
            None
        } else {
            Some(self.object_count as u64)
        }
    }

    /// Width of one reporting interval, `None` when interval reporting is off
    pub fn interval_width(&self) -> Option<Duration> {
        if self.report_interval > 0.0 {
            Duration::try_from_secs_f64(self.report_interval).ok()
        } else {
            None
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// CSV output file path
    pub csv_output: Option<PathBuf>,
    /// JSON output file path
    pub json_output: Option<PathBuf>,
}

/// Runtime configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Validate and print the configuration without running
    #[serde(default)]
    pub dry_run: bool,
    /// Log verbosity (0 = info, 1 = debug, 2+ = trace)
    #[serde(default)]
    pub verbose: u8,
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Parameters:")?;
        writeln!(f, "  url={}", self.target.url)?;
        writeln!(f, "  object_prefix={}", self.target.object_prefix)?;
        writeln!(f, "  bucket_prefix={}", self.target.bucket_prefix)?;
        writeln!(f, "  region={}", self.target.region)?;
        writeln!(f, "  {}", self.workload)?;
        writeln!(f, "  {}", self.output)?;
        Ok(())
    }
}

impl fmt::Display for WorkloadConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "modes={}, threads={}, loops={}, duration={}, object_count={}, bucket_count={}, \
             size={}, interval={}, max_keys={}, payload={:?}, randomize_suffix={}, seed={}, loop_objects={}",
            self.modes,
            self.threads,
            self.loops,
            self.duration_secs,
            self.object_count,
            self.bucket_count,
            crate::util::time::format_bytes(self.object_size),
            self.report_interval,
            self.max_keys,
            self.payload,
            self.randomize_suffix,
            self.seed,
            self.loop_objects
        )
    }
}

impl fmt::Display for OutputConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |p: &Option<PathBuf>| {
            p.as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "-".to_string())
        };
        write!(f, "csv_output={}, json_output={}", show(&self.csv_output), show(&self.json_output))
    }
}
