//! Status command for showing per-device ingestion state.

use std::io::Write;
use std::path::Path;

use anyhow::Result;

use st_db::Database;

pub fn run<W: Write>(writer: &mut W, db: &Database, database_path: &Path) -> Result<()> {
    let statuses = db.device_status()?;

    writeln!(writer, "Screen-time analyzer status")?;
    writeln!(writer, "Database: {}", database_path.display())?;

    if statuses.is_empty() {
        writeln!(writer, "No devices recorded.")?;
        return Ok(());
    }

    writeln!(writer, "Devices:")?;
    for status in statuses {
        let last_seen = status.last_snapshot.map_or_else(
            || "never".to_string(),
            |timestamp| timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
        );
        writeln!(
            writer,
            "- {}: {} snapshot(s), {} interval(s), last seen {}",
            status.name, status.snapshot_count, status.interval_count, last_seen
        )?;
    }

    Ok(())
}
