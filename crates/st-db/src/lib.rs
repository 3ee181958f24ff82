//! Storage layer for the screen-time analyzer.
//!
//! Provides persistence for devices, raw usage snapshots, and reconstructed
//! usage intervals using `rusqlite`.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but
//! not `Sync`. Ingestion is a single synchronous batch pass, so one
//! connection per invocation is the intended usage; nothing here supports
//! concurrent access to the same device's data.
//!
//! # Schema
//!
//! Timestamps are stored as TEXT in `%Y-%m-%dT%H:%M:%S` form (naive local
//! time, second precision) so that lexicographic ordering matches
//! chronological ordering. The snapshot log is append-only:
//! `(device_id, timestamp)` is unique and re-inserting an already-seen
//! snapshot is a no-op, which makes re-ingestion of the same export
//! idempotent. Usage intervals are derived data, deleted and regenerated
//! per device on every rebuild.

use std::collections::HashMap;
use std::path::Path;

use chrono::NaiveDateTime;
use rusqlite::{Connection, OptionalExtension, params};
use thiserror::Error;

use st_core::{Snapshot, diff_snapshots};

/// Stored timestamp layout. Second precision, no timezone.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A stored timestamp failed to parse back.
    #[error("invalid stored timestamp: {timestamp}")]
    TimestampParse {
        timestamp: String,
        #[source]
        source: chrono::ParseError,
    },
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for schema and threading notes.
pub struct Database {
    conn: Connection,
}

/// Per-device aggregate shown by the status command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceStatus {
    pub device_id: i64,
    pub name: String,
    pub snapshot_count: i64,
    pub interval_count: i64,
    pub last_snapshot: Option<NaiveDateTime>,
}

/// One row of the read-side usage query: an interval joined with its device
/// name and optional category metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageRow {
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub app_name: String,
    pub duration_seconds: i64,
    pub device_name: String,
    /// `"Uncategorized"` when the app has no mapping.
    pub category: String,
    pub alias: Option<String>,
}

impl UsageRow {
    /// Effective display name: alias if set, else the raw app name.
    pub fn display_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.app_name)
    }
}

/// A category/alias mapping for one app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRow {
    pub app_name: String,
    pub category: String,
    pub alias: Option<String>,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The schema is initialized on first open; initialization is idempotent.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection
    /// closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS devices (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT UNIQUE NOT NULL
            );

            -- Append-only log of parsed exports. (device_id, timestamp) is
            -- the dedup key for idempotent re-ingestion.
            CREATE TABLE IF NOT EXISTS raw_snapshots (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                device_id INTEGER NOT NULL,
                timestamp TEXT NOT NULL,
                file_source TEXT,
                created_at TEXT DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (device_id) REFERENCES devices(id),
                UNIQUE(device_id, timestamp)
            );

            CREATE TABLE IF NOT EXISTS raw_snapshot_entries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                snapshot_id INTEGER NOT NULL,
                app_name TEXT NOT NULL,
                cumulative_seconds INTEGER NOT NULL,
                FOREIGN KEY (snapshot_id) REFERENCES raw_snapshots(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_entries_snapshot ON raw_snapshot_entries(snapshot_id);

            -- Derived data: rebuilt wholesale per device, never updated in
            -- place.
            CREATE TABLE IF NOT EXISTS usage_intervals (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                device_id INTEGER NOT NULL,
                start_time TEXT NOT NULL,
                end_time TEXT NOT NULL,
                app_name TEXT NOT NULL,
                duration_seconds INTEGER NOT NULL,
                FOREIGN KEY (device_id) REFERENCES devices(id)
            );

            CREATE INDEX IF NOT EXISTS idx_intervals_device ON usage_intervals(device_id);
            CREATE INDEX IF NOT EXISTS idx_intervals_start ON usage_intervals(start_time);

            CREATE TABLE IF NOT EXISTS app_categories (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                app_name TEXT UNIQUE NOT NULL,
                category TEXT NOT NULL,
                alias TEXT
            );
            ",
        )?;
        Ok(())
    }

    /// Resolves a device by name, creating it on first sighting.
    pub fn get_or_create_device(&self, name: &str) -> Result<i64, DbError> {
        let existing = self
            .conn
            .query_row("SELECT id FROM devices WHERE name = ?", [name], |row| {
                row.get(0)
            })
            .optional()?;
        if let Some(id) = existing {
            return Ok(id);
        }
        self.conn
            .execute("INSERT INTO devices (name) VALUES (?)", [name])?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Lists all known device names with their IDs, ordered by name.
    pub fn list_devices(&self) -> Result<Vec<(i64, String)>, DbError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM devices ORDER BY name ASC")?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
        let mut devices = Vec::new();
        for row in rows {
            devices.push(row?);
        }
        Ok(devices)
    }

    /// Inserts the snapshots parsed from one file, in a single transaction.
    ///
    /// A snapshot whose `(device_id, timestamp)` already exists is silently
    /// skipped along with its entries. Returns the number of newly inserted
    /// snapshots, so a return of zero means the file contributed nothing new.
    pub fn insert_snapshots(
        &mut self,
        device_id: i64,
        file_source: &str,
        snapshots: &[Snapshot],
    ) -> Result<usize, DbError> {
        if snapshots.is_empty() {
            return Ok(0);
        }
        let tx = self.conn.transaction()?;
        let mut inserted = 0;
        {
            let mut snapshot_stmt = tx.prepare(
                "
                INSERT OR IGNORE INTO raw_snapshots (device_id, timestamp, file_source)
                VALUES (?, ?, ?)
                ",
            )?;
            let mut entry_stmt = tx.prepare(
                "
                INSERT INTO raw_snapshot_entries (snapshot_id, app_name, cumulative_seconds)
                VALUES (?, ?, ?)
                ",
            )?;
            for snapshot in snapshots {
                let changed = snapshot_stmt.execute(params![
                    device_id,
                    format_timestamp(snapshot.timestamp),
                    file_source,
                ])?;
                if changed == 0 {
                    // Already ingested from an earlier or overlapping export.
                    continue;
                }
                let snapshot_id = tx.last_insert_rowid();
                for (app, seconds) in &snapshot.apps {
                    entry_stmt.execute(params![snapshot_id, app, seconds])?;
                }
                inserted += 1;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }

    /// Loads the complete snapshot history for a device, ordered by
    /// timestamp ascending, with entries attached.
    pub fn device_snapshots(&self, device_id: i64) -> Result<Vec<Snapshot>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT id, timestamp
            FROM raw_snapshots
            WHERE device_id = ?
            ORDER BY timestamp ASC
            ",
        )?;
        let rows = stmt.query_map([device_id], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut snapshots = Vec::new();
        let mut positions = HashMap::new();
        for row in rows {
            let (snapshot_id, timestamp) = row?;
            let timestamp = parse_timestamp(&timestamp)?;
            positions.insert(snapshot_id, snapshots.len());
            snapshots.push(Snapshot {
                timestamp,
                apps: std::collections::BTreeMap::new(),
            });
        }

        let mut stmt = self.conn.prepare(
            "
            SELECT se.snapshot_id, se.app_name, se.cumulative_seconds
            FROM raw_snapshot_entries se
            JOIN raw_snapshots s ON se.snapshot_id = s.id
            WHERE s.device_id = ?
            ",
        )?;
        let rows = stmt.query_map([device_id], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })?;
        for row in rows {
            let (snapshot_id, app, seconds) = row?;
            if let Some(&position) = positions.get(&snapshot_id) {
                snapshots[position].apps.insert(app, seconds);
            }
        }

        Ok(snapshots)
    }

    /// Recomputes the full interval set for a device from its snapshot log.
    ///
    /// Existing intervals for the device are deleted and the replacement set
    /// is inserted in the same transaction. Returns the number of intervals
    /// produced. A device with no snapshots is a no-op.
    pub fn rebuild_intervals(&mut self, device_id: i64) -> Result<usize, DbError> {
        let snapshots = self.device_snapshots(device_id)?;
        if snapshots.is_empty() {
            return Ok(0);
        }
        let intervals = diff_snapshots(&snapshots);

        let tx = self.conn.transaction()?;
        tx.execute(
            "DELETE FROM usage_intervals WHERE device_id = ?",
            [device_id],
        )?;
        {
            let mut stmt = tx.prepare(
                "
                INSERT INTO usage_intervals
                (device_id, start_time, end_time, app_name, duration_seconds)
                VALUES (?, ?, ?, ?, ?)
                ",
            )?;
            for interval in &intervals {
                stmt.execute(params![
                    device_id,
                    format_timestamp(interval.start),
                    format_timestamp(interval.end),
                    interval.app,
                    interval.seconds,
                ])?;
            }
        }
        tx.commit()?;

        tracing::debug!(device_id, count = intervals.len(), "rebuilt intervals");
        Ok(intervals.len())
    }

    /// The read-side contract for the visualization layer: intervals joined
    /// with device name and optional category metadata, ordered by start
    /// time.
    pub fn usage_rows(&self, device: Option<&str>) -> Result<Vec<UsageRow>, DbError> {
        let base = "
            SELECT u.start_time, u.end_time, u.app_name, u.duration_seconds,
                   d.name, COALESCE(c.category, 'Uncategorized'), c.alias
            FROM usage_intervals u
            JOIN devices d ON u.device_id = d.id
            LEFT JOIN app_categories c ON u.app_name = c.app_name
            ";
        let order = " ORDER BY u.start_time ASC, u.app_name ASC";

        let map_row = |row: &rusqlite::Row<'_>| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, Option<String>>(6)?,
            ))
        };

        let mut raw = Vec::new();
        if let Some(device) = device {
            let sql = format!("{base} WHERE d.name = ? {order}");
            let mut stmt = self.conn.prepare(&sql)?;
            let rows = stmt.query_map([device], map_row)?;
            for row in rows {
                raw.push(row?);
            }
        } else {
            let sql = format!("{base} {order}");
            let mut stmt = self.conn.prepare(&sql)?;
            let rows = stmt.query_map([], map_row)?;
            for row in rows {
                raw.push(row?);
            }
        }

        let mut usage = Vec::new();
        for (start, end, app_name, duration_seconds, device_name, category, alias) in raw {
            usage.push(UsageRow {
                start_time: parse_timestamp(&start)?,
                end_time: parse_timestamp(&end)?,
                app_name,
                duration_seconds,
                device_name,
                category,
                alias,
            });
        }
        Ok(usage)
    }

    /// Per-device snapshot/interval counts and last snapshot time.
    pub fn device_status(&self) -> Result<Vec<DeviceStatus>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT d.id, d.name,
                   (SELECT COUNT(*) FROM raw_snapshots s WHERE s.device_id = d.id),
                   (SELECT COUNT(*) FROM usage_intervals u WHERE u.device_id = d.id),
                   (SELECT MAX(timestamp) FROM raw_snapshots s WHERE s.device_id = d.id)
            FROM devices d
            ORDER BY d.name ASC
            ",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, Option<String>>(4)?,
            ))
        })?;
        let mut statuses = Vec::new();
        for row in rows {
            let (device_id, name, snapshot_count, interval_count, last) = row?;
            let last_snapshot = match last {
                Some(timestamp) => Some(parse_timestamp(&timestamp)?),
                None => None,
            };
            statuses.push(DeviceStatus {
                device_id,
                name,
                snapshot_count,
                interval_count,
                last_snapshot,
            });
        }
        Ok(statuses)
    }

    /// Sets or replaces the category (and optional alias) for an app.
    pub fn set_category(
        &self,
        app_name: &str,
        category: &str,
        alias: Option<&str>,
    ) -> Result<(), DbError> {
        self.conn.execute(
            "
            INSERT INTO app_categories (app_name, category, alias)
            VALUES (?, ?, ?)
            ON CONFLICT(app_name) DO UPDATE SET
                category = excluded.category,
                alias = excluded.alias
            ",
            params![app_name, category, alias],
        )?;
        Ok(())
    }

    /// Lists all category mappings ordered by app name.
    pub fn list_categories(&self) -> Result<Vec<CategoryRow>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT app_name, category, alias FROM app_categories ORDER BY app_name ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(CategoryRow {
                app_name: row.get(0)?,
                category: row.get(1)?,
                alias: row.get(2)?,
            })
        })?;
        let mut categories = Vec::new();
        for row in rows {
            categories.push(row?);
        }
        Ok(categories)
    }

    /// Apps present in usage intervals but missing a category mapping,
    /// ordered by total recorded duration descending so the most-used apps
    /// surface first.
    pub fn uncategorized_apps(&self) -> Result<Vec<String>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT u.app_name, SUM(u.duration_seconds) AS total_duration
            FROM usage_intervals u
            LEFT JOIN app_categories c ON u.app_name = c.app_name
            WHERE c.category IS NULL
            GROUP BY u.app_name
            ORDER BY total_duration DESC
            ",
        )?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut apps = Vec::new();
        for row in rows {
            apps.push(row?);
        }
        Ok(apps)
    }
}

fn format_timestamp(timestamp: NaiveDateTime) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

fn parse_timestamp(timestamp: &str) -> Result<NaiveDateTime, DbError> {
    NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT).map_err(|source| {
        DbError::TimestampParse {
            timestamp: timestamp.to_string(),
            source,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::BTreeMap;

    use chrono::NaiveDate;

    fn ts(d: u32, h: u32, mi: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 2, d)
            .unwrap()
            .and_hms_opt(h, mi, 0)
            .unwrap()
    }

    fn snapshot(timestamp: NaiveDateTime, apps: &[(&str, i64)]) -> Snapshot {
        Snapshot {
            timestamp,
            apps: apps
                .iter()
                .map(|(app, seconds)| ((*app).to_string(), *seconds))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    #[test]
    fn get_or_create_device_is_idempotent() {
        let db = Database::open_in_memory().unwrap();
        let first = db.get_or_create_device("iPhone").unwrap();
        let second = db.get_or_create_device("iPhone").unwrap();
        assert_eq!(first, second);

        let other = db.get_or_create_device("iPad").unwrap();
        assert_ne!(first, other);
    }

    #[test]
    fn insert_snapshots_dedups_by_timestamp() {
        let mut db = Database::open_in_memory().unwrap();
        let device = db.get_or_create_device("iPhone").unwrap();

        let snapshots = vec![
            snapshot(ts(13, 10, 0), &[("Safari", 100)]),
            snapshot(ts(13, 11, 0), &[("Safari", 250)]),
        ];
        assert_eq!(db.insert_snapshots(device, "a.txt", &snapshots).unwrap(), 2);
        // Re-ingesting the same export is a no-op.
        assert_eq!(db.insert_snapshots(device, "a.txt", &snapshots).unwrap(), 0);

        // An overlapping export only contributes its unseen snapshots.
        let overlapping = vec![
            snapshot(ts(13, 11, 0), &[("Safari", 250)]),
            snapshot(ts(13, 12, 0), &[("Safari", 400)]),
        ];
        assert_eq!(
            db.insert_snapshots(device, "b.txt", &overlapping).unwrap(),
            1
        );

        let stored = db.device_snapshots(device).unwrap();
        assert_eq!(stored.len(), 3);
    }

    #[test]
    fn same_timestamp_on_different_devices_is_not_a_conflict() {
        let mut db = Database::open_in_memory().unwrap();
        let phone = db.get_or_create_device("iPhone").unwrap();
        let tablet = db.get_or_create_device("iPad").unwrap();

        let snapshots = vec![snapshot(ts(13, 10, 0), &[("Safari", 100)])];
        assert_eq!(db.insert_snapshots(phone, "a.txt", &snapshots).unwrap(), 1);
        assert_eq!(db.insert_snapshots(tablet, "b.txt", &snapshots).unwrap(), 1);
    }

    #[test]
    fn device_snapshots_ordered_with_entries() {
        let mut db = Database::open_in_memory().unwrap();
        let device = db.get_or_create_device("iPhone").unwrap();

        // Inserted out of order; read back ordered by timestamp.
        let snapshots = vec![
            snapshot(ts(13, 11, 0), &[("Safari", 250), ("Mail", 30)]),
            snapshot(ts(13, 10, 0), &[("Safari", 100)]),
        ];
        db.insert_snapshots(device, "a.txt", &snapshots).unwrap();

        let stored = db.device_snapshots(device).unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].timestamp, ts(13, 10, 0));
        assert_eq!(stored[1].timestamp, ts(13, 11, 0));
        assert_eq!(stored[1].apps.get("Mail"), Some(&30));
    }

    #[test]
    fn rebuild_intervals_produces_diffs() {
        let mut db = Database::open_in_memory().unwrap();
        let device = db.get_or_create_device("iPhone").unwrap();

        let snapshots = vec![
            snapshot(ts(13, 10, 0), &[("Safari", 100)]),
            snapshot(ts(13, 11, 0), &[("Safari", 250)]),
        ];
        db.insert_snapshots(device, "a.txt", &snapshots).unwrap();

        assert_eq!(db.rebuild_intervals(device).unwrap(), 1);

        let usage = db.usage_rows(None).unwrap();
        assert_eq!(usage.len(), 1);
        assert_eq!(usage[0].app_name, "Safari");
        assert_eq!(usage[0].duration_seconds, 150);
        assert_eq!(usage[0].start_time, ts(13, 10, 0));
        assert_eq!(usage[0].end_time, ts(13, 11, 0));
    }

    #[test]
    fn rebuild_replaces_prior_intervals() {
        let mut db = Database::open_in_memory().unwrap();
        let device = db.get_or_create_device("iPhone").unwrap();

        let snapshots = vec![
            snapshot(ts(13, 10, 0), &[("Safari", 100)]),
            snapshot(ts(13, 11, 0), &[("Safari", 250)]),
        ];
        db.insert_snapshots(device, "a.txt", &snapshots).unwrap();
        db.rebuild_intervals(device).unwrap();
        db.rebuild_intervals(device).unwrap();

        // Two consecutive rebuilds on an unchanged log yield the same set,
        // not an accumulation.
        let usage = db.usage_rows(None).unwrap();
        assert_eq!(usage.len(), 1);
    }

    #[test]
    fn rebuild_with_single_snapshot_yields_nothing() {
        let mut db = Database::open_in_memory().unwrap();
        let device = db.get_or_create_device("iPhone").unwrap();

        let snapshots = vec![snapshot(ts(13, 10, 0), &[("Safari", 100)])];
        db.insert_snapshots(device, "a.txt", &snapshots).unwrap();

        assert_eq!(db.rebuild_intervals(device).unwrap(), 0);
        assert!(db.usage_rows(None).unwrap().is_empty());
    }

    #[test]
    fn rebuild_with_no_snapshots_is_a_noop() {
        let mut db = Database::open_in_memory().unwrap();
        let device = db.get_or_create_device("iPhone").unwrap();
        assert_eq!(db.rebuild_intervals(device).unwrap(), 0);
    }

    #[test]
    fn usage_rows_default_category_and_alias() {
        let mut db = Database::open_in_memory().unwrap();
        let device = db.get_or_create_device("iPhone").unwrap();

        let snapshots = vec![
            snapshot(ts(13, 10, 0), &[("Safari", 100), ("Mail", 10)]),
            snapshot(ts(13, 11, 0), &[("Safari", 250), ("Mail", 40)]),
        ];
        db.insert_snapshots(device, "a.txt", &snapshots).unwrap();
        db.rebuild_intervals(device).unwrap();

        db.set_category("Safari", "Browsing", Some("Web")).unwrap();

        let usage = db.usage_rows(None).unwrap();
        let safari = usage.iter().find(|row| row.app_name == "Safari").unwrap();
        assert_eq!(safari.category, "Browsing");
        assert_eq!(safari.display_name(), "Web");
        assert_eq!(safari.device_name, "iPhone");

        let mail = usage.iter().find(|row| row.app_name == "Mail").unwrap();
        assert_eq!(mail.category, "Uncategorized");
        assert_eq!(mail.display_name(), "Mail");
    }

    #[test]
    fn usage_rows_filters_by_device() {
        let mut db = Database::open_in_memory().unwrap();
        let phone = db.get_or_create_device("iPhone").unwrap();
        let tablet = db.get_or_create_device("iPad").unwrap();

        for device in [phone, tablet] {
            let snapshots = vec![
                snapshot(ts(13, 10, 0), &[("Safari", 100)]),
                snapshot(ts(13, 11, 0), &[("Safari", 250)]),
            ];
            db.insert_snapshots(device, "a.txt", &snapshots).unwrap();
            db.rebuild_intervals(device).unwrap();
        }

        assert_eq!(db.usage_rows(None).unwrap().len(), 2);
        let filtered = db.usage_rows(Some("iPad")).unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].device_name, "iPad");
        assert!(db.usage_rows(Some("unknown")).unwrap().is_empty());
    }

    #[test]
    fn set_category_upserts() {
        let db = Database::open_in_memory().unwrap();
        db.set_category("Safari", "Browsing", None).unwrap();
        db.set_category("Safari", "Work", Some("Web")).unwrap();

        let categories = db.list_categories().unwrap();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].category, "Work");
        assert_eq!(categories[0].alias.as_deref(), Some("Web"));
    }

    #[test]
    fn uncategorized_apps_ordered_by_usage() {
        let mut db = Database::open_in_memory().unwrap();
        let device = db.get_or_create_device("iPhone").unwrap();

        let snapshots = vec![
            snapshot(ts(13, 10, 0), &[("Safari", 0), ("Mail", 0), ("Maps", 0)]),
            snapshot(
                ts(13, 11, 0),
                &[("Safari", 100), ("Mail", 900), ("Maps", 400)],
            ),
        ];
        db.insert_snapshots(device, "a.txt", &snapshots).unwrap();
        db.rebuild_intervals(device).unwrap();

        db.set_category("Maps", "Navigation", None).unwrap();

        let missing = db.uncategorized_apps().unwrap();
        assert_eq!(missing, vec!["Mail".to_string(), "Safari".to_string()]);
    }

    #[test]
    fn device_status_reports_counts() {
        let mut db = Database::open_in_memory().unwrap();
        let device = db.get_or_create_device("iPhone").unwrap();

        let snapshots = vec![
            snapshot(ts(13, 10, 0), &[("Safari", 100)]),
            snapshot(ts(13, 11, 0), &[("Safari", 250)]),
        ];
        db.insert_snapshots(device, "a.txt", &snapshots).unwrap();
        db.rebuild_intervals(device).unwrap();

        let statuses = db.device_status().unwrap();
        assert_eq!(statuses.len(), 1);
        assert_eq!(statuses[0].name, "iPhone");
        assert_eq!(statuses[0].snapshot_count, 2);
        assert_eq!(statuses[0].interval_count, 1);
        assert_eq!(statuses[0].last_snapshot, Some(ts(13, 11, 0)));
    }

    #[test]
    fn open_on_disk_is_reusable() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("st.db");
        {
            let mut db = Database::open(&path).unwrap();
            let device = db.get_or_create_device("iPhone").unwrap();
            let snapshots = vec![snapshot(ts(13, 10, 0), &[("Safari", 100)])];
            db.insert_snapshots(device, "a.txt", &snapshots).unwrap();
        }
        // Reopening initializes idempotently and sees prior data.
        let db = Database::open(&path).unwrap();
        let device = db.get_or_create_device("iPhone").unwrap();
        assert_eq!(db.device_snapshots(device).unwrap().len(), 1);
    }
}
