//! CLI argument parsing using clap
//!
//! Every workload flag is optional here so that a TOML file given with
//! `--config` can supply it; anything passed on the command line wins.
//! Defaults for omitted flags come from [`crate::config::Config::default`].

use clap::{ArgAction, Parser};
use std::path::PathBuf;

const NOTES: &str = "\
NOTES:
  - Valid mode types for the -m mode string are:
    c: clear all existing objects from buckets (requires lookups)
    x: delete buckets
    i: initialize buckets
    p: put objects in buckets
    l: list objects in buckets
    g: get objects from buckets
    d: delete objects from buckets

    These modes are processed in-order and can be repeated, ie \"ippgd\" will
    initialize the buckets, put the objects, reput the objects, get the
    objects, and then delete the objects. The loops flag repeats this whole
    process the specified number of times.

  - When performing bucket listings, many S3 storage systems limit the
    maximum number of keys returned to 1000 even if max-keys is set higher.

  - Use --url mem:// to exercise the harness against an in-memory store.";

/// objbench - concurrent load generator for S3-compatible object storage
#[derive(Parser, Debug, Default)]
#[command(name = "objbench")]
#[command(version, about, long_about = None, after_help = NOTES)]
pub struct Cli {
    // === Target Options ===
    /// Access key
    #[arg(short = 'a', long, env = "AWS_ACCESS_KEY_ID", hide_env_values = true)]
    pub access_key: Option<String>,

    /// Secret key
    #[arg(short = 's', long, env = "AWS_SECRET_ACCESS_KEY", hide_env_values = true)]
    pub secret_key: Option<String>,

    /// Endpoint URL with scheme (e.g. http://10.0.0.1:8000), or mem:// for an in-memory store
    #[arg(short = 'u', long, env = "AWS_HOST")]
    pub url: Option<String>,

    /// Region for testing [default: us-east-1]
    #[arg(short = 'r', long, env = "AWS_REGION")]
    pub region: Option<String>,

    /// Prefix for buckets [default: hotsauce-bench]
    #[arg(long)]
    pub bucket_prefix: Option<String>,

    /// Prefix for objects
    #[arg(long)]
    pub object_prefix: Option<String>,

    // === Workload Options ===
    /// Run modes in order, see NOTES [default: cxiplgdcx]
    #[arg(short = 'm', long)]
    pub modes: Option<String>,

    /// Number of worker threads [default: 1]
    #[arg(short = 't', long)]
    pub threads: Option<usize>,

    /// Number of times to repeat the mode sequence [default: 1]
    #[arg(short = 'l', long)]
    pub loops: Option<usize>,

    /// Maximum phase duration in seconds, -1 for unlimited [default: 60]
    #[arg(short = 'd', long, allow_negative_numbers = true)]
    pub duration: Option<i64>,

    /// Maximum number of objects, -1 for unlimited [default: -1]
    #[arg(short = 'n', long, allow_negative_numbers = true)]
    pub objects: Option<i64>,

    /// Number of buckets to distribute IOs across [default: 1]
    #[arg(short = 'b', long)]
    pub buckets: Option<u64>,

    /// Object size with optional K, M, G suffix (e.g. 4K, 1M) [default: 1M]
    #[arg(short = 'z', long)]
    pub size: Option<String>,

    /// Seconds between report intervals, <= 0 disables interval reports [default: 1.0]
    #[arg(long, allow_negative_numbers = true)]
    pub report_interval: Option<f64>,

    /// Maximum number of keys to retrieve at once for bucket listings [default: 1000]
    #[arg(long)]
    pub max_keys: Option<i32>,

    /// Write zeros as object data instead of random bytes
    #[arg(long)]
    pub zero_data: bool,

    /// Randomize object name suffix
    #[arg(long)]
    pub randomize_suffix: bool,

    /// Seed for randomized object name suffixes [default: 0]
    #[arg(long)]
    pub seed: Option<u64>,

    /// Wrap object indices on duration-bound get phases
    #[arg(long)]
    pub loop_objects: bool,

    // === Output Options ===
    /// Write CSV output to this file
    #[arg(short = 'o', long)]
    pub csv_output: Option<PathBuf>,

    /// Write JSON output to this file
    #[arg(short = 'j', long)]
    pub json_output: Option<PathBuf>,

    // === Configuration File ===
    /// TOML configuration file
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Dry run - validate configuration without executing
    #[arg(long)]
    pub dry_run: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short = 'v', long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_short_flags() {
        let cli = Cli::try_parse_from([
            "objbench", "-a", "ak", "-s", "sk", "-u", "http://localhost:9000", "-m", "ipgd",
            "-t", "8", "-d", "-1", "-n", "1000", "-z", "4K", "-b", "2",
        ])
        .unwrap();
        assert_eq!(cli.access_key.as_deref(), Some("ak"));
        assert_eq!(cli.secret_key.as_deref(), Some("sk"));
        assert_eq!(cli.modes.as_deref(), Some("ipgd"));
        assert_eq!(cli.threads, Some(8));
        assert_eq!(cli.duration, Some(-1));
        assert_eq!(cli.objects, Some(1000));
        assert_eq!(cli.size.as_deref(), Some("4K"));
        assert_eq!(cli.buckets, Some(2));
    }

    #[test]
    fn test_parse_long_flags() {
        let cli = Cli::try_parse_from([
            "objbench", "--report-interval", "0.5", "--max-keys", "100", "--zero-data",
            "--randomize-suffix", "--seed", "7", "-vv",
        ])
        .unwrap();
        assert_eq!(cli.report_interval, Some(0.5));
        assert_eq!(cli.max_keys, Some(100));
        assert!(cli.zero_data);
        assert!(cli.randomize_suffix);
        assert_eq!(cli.seed, Some(7));
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_unset_flags_are_none() {
        let cli = Cli::try_parse_from(["objbench", "--url", "mem://"]).unwrap();
        assert_eq!(cli.threads, None);
        assert_eq!(cli.modes, None);
        assert!(!cli.dry_run);
    }
}
