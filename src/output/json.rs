//! JSON output formatting
//!
//! The run's summaries serialized as one array, in production order. Field
//! names follow [`Summary`]'s serde renames (`Loop`, `IntervalName`, ...).

use crate::stats::summary::Summary;
use crate::Result;
use anyhow::Context;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Serialize summaries to a pretty-printed JSON array
pub fn summaries_to_json(summaries: &[Summary]) -> Result<String> {
    Ok(serde_json::to_string_pretty(summaries)?)
}

/// Write every summary to a JSON file at `path`
pub fn write_json_output(path: &Path, summaries: &[Summary]) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create JSON output: {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, summaries)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::workload::Mode;
    use crate::stats::summary::IntervalRecord;
    use std::time::Duration;

    fn summaries() -> Vec<Summary> {
        let mut rec = IntervalRecord::new(0, Mode::Delete, "0", Duration::from_secs(1));
        rec.record_op(0, 2_000_000);
        let mut total = rec.clone();
        total.label = "TOTAL".to_string();
        vec![rec.summarize(), total.summarize()]
    }

    #[test]
    fn test_json_array() {
        let text = summaries_to_json(&summaries()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        let rows = value.as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["Mode"], "DEL");
        assert_eq!(rows[0]["IntervalName"], "0");
        assert_eq!(rows[1]["IntervalName"], "TOTAL");
        assert_eq!(rows[1]["Ops"], 1);
        assert_eq!(rows[1]["Lat50"], 2.0);
    }

    #[test]
    fn test_write_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        let original = summaries();
        write_json_output(&path, &original).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let parsed: Vec<Summary> = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, original);
    }
}
