// Per-class export: one xlsx buffer per partition, deterministic file names

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use concorso_engine::Partition;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::archive::Archive;

/// Suffix format for timestamped file names
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Default directory for persisted exports
pub const DEFAULT_OUTPUT_DIR: &str = "file_classi_concorso";

/// File stem for records whose `Classe` is blank
pub const BLANK_CLASS_STEM: &str = "senza_classe";

#[derive(Debug)]
pub enum ExportError {
    /// Writing to the output directory failed.
    Io { path: PathBuf, message: String },
    /// Building the zip bundle failed.
    Archive { message: String },
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, message } => write!(f, "cannot write {}: {message}", path.display()),
            Self::Archive { message } => write!(f, "cannot build archive: {message}"),
        }
    }
}

impl std::error::Error for ExportError {}

/// One serialized partition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportUnit {
    pub code: String,
    pub file_name: String,
    pub rows: usize,
    pub bytes: Vec<u8>,
}

impl ExportUnit {
    /// "sha256:<hex>" of the buffer
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.bytes);
        format!("sha256:{:x}", hasher.finalize())
    }
}

/// A partition whose serialization failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartitionFailure {
    pub code: String,
    pub error: String,
}

#[derive(Debug, Clone, Default)]
pub struct ExportOutcome {
    pub units: Vec<ExportUnit>,
    pub failures: Vec<PartitionFailure>,
}

#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    /// Shared `YYYYMMDD_HHMMSS` suffix, computed once per run
    pub timestamp: Option<String>,
}

/// Format the run's timestamp suffix
pub fn run_timestamp(now: NaiveDateTime) -> String {
    now.format(TIMESTAMP_FORMAT).to_string()
}

/// Replace path separators so a code is always a plain file name
pub fn sanitize_code(code: &str) -> String {
    code.replace(['/', '\\'], "_")
}

/// Sanitized code without leading dots; blank codes map to
/// `BLANK_CLASS_STEM` so no output is a hidden file
fn file_stem(code: &str) -> String {
    let sanitized = sanitize_code(code);
    let stem = sanitized.trim_start_matches('.');
    if stem.trim().is_empty() {
        BLANK_CLASS_STEM.to_string()
    } else {
        stem.to_string()
    }
}

/// `<stem>[_<timestamp>].xlsx`
pub fn file_name_for(code: &str, timestamp: Option<&str>) -> String {
    match timestamp {
        Some(ts) => format!("{}_{}.xlsx", file_stem(code), ts),
        None => format!("{}.xlsx", file_stem(code)),
    }
}

/// Serialize every non-empty partition.
///
/// A failing partition is recorded and skipped; its siblings still export.
/// Codes that sanitize to an already used name get a `_<n>` suffix.
pub fn export_partitions(partitions: &[Partition], options: &ExportOptions) -> ExportOutcome {
    let mut outcome = ExportOutcome::default();
    let mut used: HashSet<String> = HashSet::new();

    for part in partitions.iter().filter(|p| !p.table.is_empty()) {
        let bytes = match crate::xlsx::export_table(&part.table) {
            Ok(bytes) => bytes,
            Err(error) => {
                log::warn!("class {}: export failed: {}", part.code, error);
                outcome.failures.push(PartitionFailure {
                    code: part.code.clone(),
                    error,
                });
                continue;
            }
        };

        let file_name = unique_name(&part.code, options.timestamp.as_deref(), &mut used);
        if part.code.trim().is_empty() {
            log::warn!("{} records have an empty class, exported as {}", part.table.len(), file_name);
        }
        log::debug!("class {}: {} rows -> {}", part.code, part.table.len(), file_name);
        outcome.units.push(ExportUnit {
            code: part.code.clone(),
            file_name,
            rows: part.table.len(),
            bytes,
        });
    }

    outcome
}

fn unique_name(code: &str, timestamp: Option<&str>, used: &mut HashSet<String>) -> String {
    let base = file_name_for(code, timestamp);
    let mut name = base.clone();
    let mut n = 2;
    while used.contains(&name) {
        let stem = base.strip_suffix(".xlsx").unwrap_or(&base);
        name = format!("{}_{}.xlsx", stem, n);
        n += 1;
    }
    if name != base {
        log::warn!("class {}: file name {} already taken, using {}", code, base, name);
    }
    used.insert(name.clone());
    name
}

/// Write each unit (and the archive, if any) into `dir` under its file name.
/// Returns the written paths in order.
pub fn write_outputs(dir: &Path, units: &[ExportUnit], archive: Option<&Archive>) -> Result<Vec<PathBuf>, ExportError> {
    fs::create_dir_all(dir).map_err(|e| ExportError::Io {
        path: dir.to_path_buf(),
        message: e.to_string(),
    })?;

    let files = units
        .iter()
        .map(|u| (&u.file_name, &u.bytes))
        .chain(archive.map(|a| (&a.file_name, &a.bytes)));

    let mut written = Vec::new();
    for (name, bytes) in files {
        let path = dir.join(name);
        fs::write(&path, bytes).map_err(|e| ExportError::Io {
            path: path.clone(),
            message: e.to_string(),
        })?;
        written.push(path);
    }

    log::info!("wrote {} files to {}", written.len(), dir.display());
    Ok(written)
}
