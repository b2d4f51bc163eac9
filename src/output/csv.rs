//! CSV output formatting
//!
//! One row per summary, interval rows and TOTAL rows alike, in the order they
//! were produced. Values are written with two decimals.

use crate::stats::summary::Summary;
use crate::Result;
use anyhow::Context;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Column header. "Inteval" is kept as-is so existing parsers keep working.
pub const CSV_HEADER: &str = "Loop,Inteval,Duration(s),Mode,Ops,MB/s,IO/s,Min Latency (ms),\
Avg Latency(ms),99% Latency(ms),95% Latency(ms),90% Latency(ms),75% Latency(ms),\
50% Latency(ms),Max Latency(ms),Slowdowns";

/// CSV writer for summary rows
pub struct CsvWriter<W: Write> {
    out: W,
}

impl CsvWriter<BufWriter<File>> {
    /// Create (truncate) `path` and write the header row
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create CSV output: {}", path.display()))?;
        Self::new(BufWriter::new(file))
    }
}

impl<W: Write> CsvWriter<W> {
    /// Wrap a writer and write the header row
    pub fn new(mut out: W) -> Result<Self> {
        writeln!(out, "{}", CSV_HEADER)?;
        Ok(Self { out })
    }

    /// Append one summary row
    pub fn write_summary(&mut self, s: &Summary) -> Result<()> {
        writeln!(
            self.out,
            "{},{},{:.2},{},{},{:.2},{:.2},{:.2},{:.2},{:.2},{:.2},{:.2},{:.2},{:.2},{:.2},{}",
            s.loop_index,
            s.interval_name,
            s.seconds,
            s.mode,
            s.ops,
            s.mbps,
            s.iops,
            s.min_lat,
            s.avg_lat,
            s.lat99,
            s.lat95,
            s.lat90,
            s.lat75,
            s.lat50,
            s.max_lat,
            s.slowdowns
        )?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Write every summary to a CSV file at `path`
pub fn write_csv_output(path: &Path, summaries: &[Summary]) -> Result<()> {
    let mut writer = CsvWriter::create(path)?;
    for summary in summaries {
        writer.write_summary(summary)?;
    }
    writer.flush()
}
