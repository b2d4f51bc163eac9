//! Result output
//!
//! Interval lines are logged as they close (see [`text::format_summary`]).
//! After the run, every summary can additionally be written to CSV and JSON
//! files, and the phase totals are printed to the console.

pub mod csv;
pub mod json;
pub mod text;

use crate::config::OutputConfig;
use crate::stats::summary::Summary;
use crate::Result;
use tracing::info;

/// Write the run's summaries to every configured output
pub fn write_outputs(output: &OutputConfig, summaries: &[Summary]) -> Result<()> {
    if let Some(ref path) = output.csv_output {
        csv::write_csv_output(path, summaries)?;
        info!("Wrote {} rows to {}", summaries.len(), path.display());
    }
    if let Some(ref path) = output.json_output {
        json::write_json_output(path, summaries)?;
        info!("Wrote {} summaries to {}", summaries.len(), path.display());
    }
    Ok(())
}
