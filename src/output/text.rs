//! Human-readable text output

use crate::stats::summary::Summary;

/// One-line rendering of a summary, as logged when an interval closes
pub fn format_summary(s: &Summary) -> String {
    format!(
        "Loop: {}, Int: {}, Dur(s): {:.1}, Mode: {}, Ops: {}, MB/s: {:.2}, IO/s: {:.0}, \
         Lat(ms): [ min: {:.1}, avg: {:.1}, 99%: {:.1}, 95%: {:.1}, 90%: {:.1}, 75%: {:.1}, \
         50%: {:.1}, max: {:.1} ], Slowdowns: {}",
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
    )
}

/// Print the phase totals of a run to the console
pub fn print_results(summaries: &[Summary]) {
    let totals: Vec<&Summary> = summaries.iter().filter(|s| s.is_total()).collect();
    if totals.is_empty() {
        return;
    }

    println!("═══════════════════════════════════════════════════════════");
    println!("                    TEST RESULTS");
    println!("═══════════════════════════════════════════════════════════");
    println!();

    for total in totals {
        println!(
            "Loop {} {:<5} {:>10} ops in {:>8.2}s  {:>10.2} MB/s  {:>10.0} IO/s  \
             avg {:.2} ms  p99 {:.2} ms  slowdowns {}",
            total.loop_index,
            total.mode,
            format_number(total.ops),
            total.seconds,
            total.mbps,
            total.iops,
            total.avg_lat,
            total.lat99,
            total.slowdowns
        );
    }

    println!();
    println!("═══════════════════════════════════════════════════════════");
}

/// Format a number with thousands separators
fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::new();

    for (count, c) in s.chars().rev().enumerate() {
        if count > 0 && count % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }

    result.chars().rev().collect()
}
