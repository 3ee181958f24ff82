//! Report command: aggregated usage from the reconstructed intervals.

use std::collections::BTreeMap;
use std::io::Write;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use st_db::{Database, UsageRow};

/// Total usage for one app across the selected intervals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppUsage {
    /// Effective display name (alias if configured).
    pub app: String,
    pub category: String,
    pub total_seconds: i64,
}

pub fn run<W: Write>(writer: &mut W, db: &Database, device: Option<&str>, json: bool) -> Result<()> {
    let rows = db.usage_rows(device)?;
    let report = aggregate(&rows);

    if json {
        serde_json::to_writer_pretty(&mut *writer, &report)?;
        writeln!(writer)?;
        return Ok(());
    }

    if report.is_empty() {
        writeln!(writer, "No usage recorded.")?;
        return Ok(());
    }

    let total: i64 = report.iter().map(|entry| entry.total_seconds).sum();
    for entry in &report {
        writeln!(
            writer,
            "{:>10}  {}  [{}]",
            format_seconds(entry.total_seconds),
            entry.app,
            entry.category
        )?;
    }
    writeln!(writer, "\nTotal tracked: {}", format_seconds(total))?;

    Ok(())
}

/// Sums interval durations per display name, most used first; ties broken
/// alphabetically so output is stable.
fn aggregate(rows: &[UsageRow]) -> Vec<AppUsage> {
    let mut totals: BTreeMap<(String, String), i64> = BTreeMap::new();
    for row in rows {
        *totals
            .entry((row.display_name().to_string(), row.category.clone()))
            .or_default() += row.duration_seconds;
    }

    let mut report: Vec<AppUsage> = totals
        .into_iter()
        .map(|((app, category), total_seconds)| AppUsage {
            app,
            category,
            total_seconds,
        })
        .collect();
    report.sort_by(|a, b| {
        b.total_seconds
            .cmp(&a.total_seconds)
            .then_with(|| a.app.cmp(&b.app))
    });
    report
}

fn format_seconds(total: i64) -> String {
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    if hours > 0 {
        format!("{hours}h {minutes:02}m")
    } else if minutes > 0 {
        format!("{minutes}m {seconds:02}s")
    } else {
        format!("{seconds}s")
    }
}
