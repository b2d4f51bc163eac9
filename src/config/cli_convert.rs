//! CLI to Config conversion utilities

use crate::config::workload::PayloadPattern;
use anyhow::{Context, Result};

const KIB: f64 = 1024.0;

/// Parse a size string (e.g., "1G", "100M", "4k", "512B") to bytes
///
/// Units are binary multiples. A trailing `B` or `iB` after the unit letter
/// is accepted, as are fractional values ("1.5M").
pub fn parse_size(s: &str) -> Result<u64> {
    let s = s.trim().to_uppercase();
    let unit_start = s
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(s.len());
    let (num_str, unit) = s.split_at(unit_start);

    let multiplier = match unit.trim() {
        "" | "B" => 1.0,
        "K" | "KB" | "KIB" => KIB,
        "M" | "MB" | "MIB" => KIB * KIB,
        "G" | "GB" | "GIB" => KIB * KIB * KIB,
        "T" | "TB" | "TIB" => KIB * KIB * KIB * KIB,
        other => anyhow::bail!("Invalid size unit '{}' in '{}' (expected B, K, M, G or T)", other, s),
    };

    let num: f64 = num_str
        .parse()
        .with_context(|| format!("Invalid size format: {}", s))?;
    if num <= 0.0 && multiplier > 1.0 {
        anyhow::bail!("Size must be positive: {}", s);
    }

    Ok((num * multiplier) as u64)
}

/// Convert the `--zero-data` flag to a payload pattern
pub fn convert_payload_pattern(zero_data: bool) -> PayloadPattern {
    if zero_data {
        PayloadPattern::Zeros
    } else {
        PayloadPattern::Random
    }
}
