//! Ingest command: the batch ingestion orchestrator.
//!
//! Scans the data directory for per-device export files, parses them,
//! persists new snapshots, rebuilds intervals for any device that received
//! new data, and archives consumed files. Errors on one file or device are
//! logged and do not abort the rest of the pass; a file that fails stays in
//! place for a future retry.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use st_core::{Snapshot, parse_snapshots};
use st_db::Database;

use crate::Config;

/// Entries directly under the data directory that are never device inputs.
const RESERVED_DIRS: &[&str] = &["db", "processed", "input"];

/// Prefix the export shortcut puts on device folder and file names.
const DEVICE_PREFIX: &str = "Activity ";

/// Counts reported at the end of an ingestion pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestSummary {
    pub files_processed: usize,
    pub snapshots_added: usize,
    pub devices_reconstructed: usize,
    pub intervals_rebuilt: usize,
}

impl fmt::Display for IngestSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Processed {} file(s): {} new snapshot(s), {} device(s) reconstructed, {} interval(s).",
            self.files_processed,
            self.snapshots_added,
            self.devices_reconstructed,
            self.intervals_rebuilt
        )
    }
}

/// Runs one ingestion pass over the configured data directory.
///
/// Idempotent: a second pass over the same inputs inserts nothing and
/// triggers no reconstruction.
pub fn run(db: &mut Database, config: &Config) -> Result<IngestSummary> {
    ingest_root(db, &config.data_dir, &config.archive_dir())
}

fn ingest_root(db: &mut Database, data_dir: &Path, archive_dir: &Path) -> Result<IngestSummary> {
    let mut summary = IngestSummary::default();

    if !data_dir.exists() {
        tracing::warn!(path = %data_dir.display(), "data directory does not exist");
        return Ok(summary);
    }

    tracing::info!(path = %data_dir.display(), "scanning for new data");
    let (device_files, device_dirs) = discover_inputs(data_dir)?;

    for (device_name, files) in &device_files {
        if let Err(error) = ingest_device(db, device_name, files, archive_dir, &mut summary) {
            tracing::error!(device = device_name, %error, "failed to process device");
        }
    }

    for dir in &device_dirs {
        remove_if_empty(dir);
    }

    Ok(summary)
}

/// Maps device names to their candidate input files.
///
/// A directory under the root is a device folder (prefix stripped from its
/// name); a loose `.txt`/`.md` file is a single-file input whose device name
/// comes from the filename. Reserved and hidden entries are skipped. Also
/// returns the device folders seen, for the empty-folder sweep afterwards.
fn discover_inputs(data_dir: &Path) -> Result<(BTreeMap<String, Vec<PathBuf>>, Vec<PathBuf>)> {
    let mut device_files: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    let mut device_dirs = Vec::new();

    let entries = fs::read_dir(data_dir)
        .with_context(|| format!("failed to read {}", data_dir.display()))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("failed to read {}", data_dir.display()))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') || RESERVED_DIRS.contains(&name.as_str()) {
            continue;
        }

        let path = entry.path();
        if path.is_dir() {
            let device = device_name_from(&name);
            let files = fs::read_dir(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            for file in files {
                let file_path = file
                    .with_context(|| format!("failed to read {}", path.display()))?
                    .path();
                if file_path.is_file() && is_export_file(&file_path) {
                    device_files.entry(device.clone()).or_default().push(file_path);
                }
            }
            device_dirs.push(path);
        } else if path.is_file() && is_export_file(&path) {
            let stem = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default();
            device_files
                .entry(device_name_from(&stem))
                .or_default()
                .push(path);
        }
    }

    Ok((device_files, device_dirs))
}

fn ingest_device(
    db: &mut Database,
    device_name: &str,
    files: &[PathBuf],
    archive_dir: &Path,
    summary: &mut IngestSummary,
) -> Result<()> {
    tracing::info!(device = device_name, files = files.len(), "processing device");
    let device_id = db
        .get_or_create_device(device_name)
        .with_context(|| format!("failed to resolve device {device_name}"))?;

    let mut dirty = false;
    for file in files {
        match ingest_file(db, device_id, file, archive_dir) {
            Ok(Some(inserted)) => {
                summary.files_processed += 1;
                summary.snapshots_added += inserted;
                if inserted > 0 {
                    dirty = true;
                }
            }
            Ok(None) => {
                tracing::info!(file = %file.display(), "no valid snapshots found");
            }
            Err(error) => {
                // The file stays in place for a future retry.
                tracing::error!(file = %file.display(), %error, "failed to ingest file");
            }
        }
    }

    if dirty {
        let intervals = db
            .rebuild_intervals(device_id)
            .with_context(|| format!("failed to rebuild intervals for {device_name}"))?;
        tracing::info!(device = device_name, intervals, "recalculated intervals");
        summary.devices_reconstructed += 1;
        summary.intervals_rebuilt += intervals;
    }

    Ok(())
}

/// Parses one file and persists its snapshots, then archives it.
///
/// Returns `Ok(None)` when the file contained no parseable snapshots; such
/// files are left in place. Otherwise returns the number of newly inserted
/// snapshots, which is zero when every snapshot was already known.
fn ingest_file(
    db: &mut Database,
    device_id: i64,
    path: &Path,
    archive_dir: &Path,
) -> Result<Option<usize>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let snapshots: Vec<Snapshot> = parse_snapshots(&content).collect();
    if snapshots.is_empty() {
        return Ok(None);
    }

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let inserted = db.insert_snapshots(device_id, &file_name, &snapshots)?;
    tracing::debug!(
        file = %path.display(),
        parsed = snapshots.len(),
        inserted,
        "persisted snapshots"
    );

    archive_file(path, archive_dir)?;
    Ok(Some(inserted))
}

/// Moves a consumed file into the archive, appending a numeric suffix on
/// name collision rather than overwriting.
fn archive_file(path: &Path, archive_dir: &Path) -> Result<()> {
    fs::create_dir_all(archive_dir)
        .with_context(|| format!("failed to create {}", archive_dir.display()))?;

    let file_name = path
        .file_name()
        .with_context(|| format!("{} has no file name", path.display()))?;
    let mut dest = archive_dir.join(file_name);
    if dest.exists() {
        let stem = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = path
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();
        let mut counter = 1;
        loop {
            let candidate = archive_dir.join(format!("{stem}_{counter}{extension}"));
            if !candidate.exists() {
                dest = candidate;
                break;
            }
            counter += 1;
        }
    }

    fs::rename(path, &dest)
        .with_context(|| format!("failed to archive {}", path.display()))?;
    tracing::debug!(from = %path.display(), to = %dest.display(), "archived file");
    Ok(())
}

/// Removes a device folder once only platform housekeeping files remain.
fn remove_if_empty(dir: &Path) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        if entry.file_name().to_string_lossy() != ".DS_Store" {
            return;
        }
    }
    if let Err(error) = fs::remove_dir_all(dir) {
        tracing::warn!(dir = %dir.display(), %error, "failed to remove empty device folder");
    } else {
        tracing::info!(dir = %dir.display(), "removed empty device folder");
    }
}

fn device_name_from(name: &str) -> String {
    name.strip_prefix(DEVICE_PREFIX).unwrap_or(name).trim().to_string()
}

fn is_export_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("txt") || ext.eq_ignore_ascii_case("md"))
}
