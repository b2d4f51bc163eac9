//! Interval records and their summaries
//!
//! An [`IntervalRecord`] is the raw material: bytes, slowdowns and every
//! individual latency observed in one time window. [`IntervalRecord::summarize`]
//! turns it into an immutable [`Summary`] with exact nearest-rank percentiles.
//!
//! # Example
//!
//! ```
//! use objbench::config::workload::Mode;
//! use objbench::stats::summary::IntervalRecord;
//! use std::time::Duration;
//!
//! let mut record = IntervalRecord::new(0, Mode::Put, "0", Duration::from_secs(1));
//! for ms in 1..=10u64 {
//!     record.record_op(1_048_576, ms * 1_000_000);
//! }
//!
//! let summary = record.summarize();
//! assert_eq!(summary.ops, 10);
//! assert_eq!(summary.lat50, 5.0);
//! assert_eq!(summary.mbps, 10.0);
//! ```

use crate::config::workload::Mode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Bytes per megabyte used for throughput (binary megabyte)
pub const MEGABYTE: f64 = 1_048_576.0;

/// Label of the whole-phase summary row
pub const TOTAL_LABEL: &str = "TOTAL";

const NANOS_PER_MILLI: f64 = 1_000_000.0;

/// One worker's (or the merged) activity within one time window of a phase
#[derive(Debug, Clone, PartialEq)]
pub struct IntervalRecord {
    pub loop_index: usize,
    pub mode: Mode,
    pub label: String,
    pub bytes: u64,
    pub slowdowns: u64,
    /// Elapsed time the record covers
    pub width: Duration,
    /// Unordered operation latencies in nanoseconds
    pub latencies: Vec<u64>,
}

impl IntervalRecord {
    pub fn new(loop_index: usize, mode: Mode, label: impl Into<String>, width: Duration) -> Self {
        Self {
            loop_index,
            mode,
            label: label.into(),
            bytes: 0,
            slowdowns: 0,
            width,
            latencies: Vec::new(),
        }
    }

    #[inline]
    pub fn record_op(&mut self, bytes: u64, latency_nanos: u64) {
        self.bytes += bytes;
        self.latencies.push(latency_nanos);
    }

    #[inline]
    pub fn record_slowdown(&mut self) {
        self.slowdowns += 1;
    }

    pub fn ops(&self) -> usize {
        self.latencies.len()
    }

    /// Fold `other` into this record (bytes, slowdowns and samples)
    pub fn absorb(&mut self, other: &IntervalRecord) {
        self.bytes += other.bytes;
        self.slowdowns += other.slowdowns;
        self.latencies.extend_from_slice(&other.latencies);
    }

    /// Compute the summary of this record
    ///
    /// Percentiles use nearest-rank selection on a sorted copy of the
    /// samples: index `round(p * n) - 1`, clamped to the sample range, with
    /// ties rounded away from zero. An empty record yields zero latencies
    /// and zero rates.
    pub fn summarize(&self) -> Summary {
        let mut sorted = self.latencies.clone();
        sorted.sort_unstable();

        let ops = sorted.len();
        let mut summary = Summary {
            loop_index: self.loop_index,
            interval_name: self.label.clone(),
            seconds: self.width.as_secs_f64(),
            mode: self.mode.label().to_string(),
            ops: ops as u64,
            mbps: 0.0,
            iops: 0.0,
            min_lat: 0.0,
            avg_lat: 0.0,
            lat99: 0.0,
            lat95: 0.0,
            lat90: 0.0,
            lat75: 0.0,
            lat50: 0.0,
            max_lat: 0.0,
            slowdowns: self.slowdowns,
        };

        if ops > 0 {
            let total: u128 = sorted.iter().map(|&n| n as u128).sum();
            summary.min_lat = to_millis(sorted[0]);
            summary.max_lat = to_millis(sorted[ops - 1]);
            summary.avg_lat = total as f64 / ops as f64 / NANOS_PER_MILLI;
            summary.lat99 = to_millis(nearest_rank(&sorted, 0.99));
            summary.lat95 = to_millis(nearest_rank(&sorted, 0.95));
            summary.lat90 = to_millis(nearest_rank(&sorted, 0.90));
            summary.lat75 = to_millis(nearest_rank(&sorted, 0.75));
            summary.lat50 = to_millis(nearest_rank(&sorted, 0.50));
        }

        if summary.seconds > 0.0 {
            summary.mbps = self.bytes as f64 / summary.seconds / MEGABYTE;
            summary.iops = ops as f64 / summary.seconds;
        }

        summary
    }
}

/// Nearest-rank percentile of an ascending, non-empty sample
///
/// `fraction` is the percentile divided by 100.
pub fn nearest_rank(sorted: &[u64], fraction: f64) -> u64 {
    debug_assert!(!sorted.is_empty());
    let n = sorted.len();
    let rank = (fraction * n as f64).round() as i64 - 1;
    let index = rank.clamp(0, n as i64 - 1) as usize;
    sorted[index]
}

#[inline]
fn to_millis(nanos: u64) -> f64 {
    nanos as f64 / NANOS_PER_MILLI
}

/// Immutable result row: one per closed interval and one per finished phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Summary {
    #[serde(rename = "Loop")]
    pub loop_index: usize,
    pub interval_name: String,
    pub seconds: f64,
    pub mode: String,
    pub ops: u64,
    pub mbps: f64,
    pub iops: f64,
    pub min_lat: f64,
    pub avg_lat: f64,
    pub lat99: f64,
    pub lat95: f64,
    pub lat90: f64,
    pub lat75: f64,
    pub lat50: f64,
    pub max_lat: f64,
    pub slowdowns: u64,
}

impl Summary {
    pub fn is_total(&self) -> bool {
        self.interval_name == TOTAL_LABEL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_with(latencies: &[u64]) -> IntervalRecord {
        let mut record = IntervalRecord::new(0, Mode::Get, "0", Duration::from_secs(2));
        for &lat in latencies {
            record.record_op(1000, lat);
        }
        record
    }

    #[test]
    fn test_empty_record() {
        let record = IntervalRecord::new(1, Mode::Put, "3", Duration::from_secs(1));
        let summary = record.summarize();
        assert_eq!(summary.ops, 0);
        assert_eq!(summary.min_lat, 0.0);
        assert_eq!(summary.avg_lat, 0.0);
        assert_eq!(summary.lat50, 0.0);
        assert_eq!(summary.lat99, 0.0);
        assert_eq!(summary.max_lat, 0.0);
        assert_eq!(summary.mbps, 0.0);
        assert_eq!(summary.iops, 0.0);
        assert_eq!(summary.loop_index, 1);
        assert_eq!(summary.interval_name, "3");
        assert_eq!(summary.mode, "PUT");
    }

    #[test]
    fn test_zero_width_has_no_rates() {
        let mut record = IntervalRecord::new(0, Mode::Put, TOTAL_LABEL, Duration::ZERO);
        record.record_op(4096, 1_000_000);
        let summary = record.summarize();
        assert_eq!(summary.ops, 1);
        assert_eq!(summary.mbps, 0.0);
        assert_eq!(summary.iops, 0.0);
        assert!(summary.is_total());
    }

    #[test]
    fn test_single_sample() {
        let summary = record_with(&[3_000_000]).summarize();
        assert_eq!(summary.min_lat, 3.0);
        assert_eq!(summary.max_lat, 3.0);
        assert_eq!(summary.lat50, 3.0);
        assert_eq!(summary.lat99, 3.0);
        assert_eq!(summary.avg_lat, 3.0);
    }

    #[test]
    fn test_unsorted_input_min_max() {
        let summary = record_with(&[9_000_000, 1_000_000, 5_000_000, 7_000_000]).summarize();
        assert_eq!(summary.min_lat, 1.0);
        assert_eq!(summary.max_lat, 9.0);
        assert_eq!(summary.avg_lat, 5.5);
    }

    #[test]
    fn test_nearest_rank_indices() {
        let sorted: Vec<u64> = (1..=100).collect();
        assert_eq!(nearest_rank(&sorted, 0.50), 50);
        assert_eq!(nearest_rank(&sorted, 0.75), 75);
        assert_eq!(nearest_rank(&sorted, 0.90), 90);
        assert_eq!(nearest_rank(&sorted, 0.95), 95);
        assert_eq!(nearest_rank(&sorted, 0.99), 99);
    }

    #[test]
    fn test_nearest_rank_rounding() {
        // n = 3: 0.5 * 3 = 1.5 rounds away from zero to 2 -> index 1
        assert_eq!(nearest_rank(&[10, 20, 30], 0.50), 20);
        // n = 1: 0.5 rounds to 1 -> index 0
        assert_eq!(nearest_rank(&[10], 0.50), 10);
        // n = 5: 0.5 * 5 = 2.5 rounds to 3 -> index 2
        assert_eq!(nearest_rank(&[1, 2, 3, 4, 5], 0.50), 3);
        // n = 2: 0.75 * 2 = 1.5 -> 2 -> index 1
        assert_eq!(nearest_rank(&[1, 2], 0.75), 2);
    }

    #[test]
    fn test_nearest_rank_clamps_low() {
        // n = 1, p = 0.25 would give index -1 without clamping
        assert_eq!(nearest_rank(&[42], 0.25), 42);
    }

    #[test]
    fn test_p50_matches_rank_for_many_sizes() {
        for n in 1..200u64 {
            let latencies: Vec<u64> = (0..n).rev().map(|i| i * 1_000_000).collect();
            let summary = record_with(&latencies).summarize();
            let mut sorted = latencies.clone();
            sorted.sort_unstable();
            let idx = ((0.5 * n as f64).round() as usize).max(1) - 1;
            assert_eq!(summary.lat50, sorted[idx] as f64 / 1_000_000.0);
            assert_eq!(summary.min_lat, sorted[0] as f64 / 1_000_000.0);
            assert_eq!(summary.max_lat, sorted[n as usize - 1] as f64 / 1_000_000.0);
        }
    }

    #[test]
    fn test_throughput_uses_binary_megabyte() {
        let mut record = IntervalRecord::new(0, Mode::Put, "0", Duration::from_secs(2));
        record.record_op(1_048_576 * 4, 1_000);
        let summary = record.summarize();
        assert_eq!(summary.mbps, 2.0);
        assert_eq!(summary.iops, 0.5);
    }

    #[test]
    fn test_absorb() {
        let mut a = record_with(&[1, 2]);
        let mut b = record_with(&[3]);
        b.record_slowdown();
        a.absorb(&b);
        assert_eq!(a.ops(), 3);
        assert_eq!(a.bytes, 3000);
        assert_eq!(a.slowdowns, 1);
    }

    #[test]
    fn test_summary_json_field_names() {
        let summary = record_with(&[1_000_000]).summarize();
        let json = serde_json::to_value(&summary).unwrap();
        for key in [
            "Loop", "IntervalName", "Seconds", "Mode", "Ops", "Mbps", "Iops", "MinLat", "AvgLat",
            "Lat99", "Lat95", "Lat90", "Lat75", "Lat50", "MaxLat", "Slowdowns",
        ] {
            assert!(json.get(key).is_some(), "missing {}", key);
        }
    }
}
