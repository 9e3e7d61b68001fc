// Run pipeline: decode -> reconcile -> project -> partition -> export -> bundle
//
// A pure function of (input bytes, config, clock). Writing to disk is left to
// the caller via `export::write_outputs`.

use std::fmt;

use chrono::NaiveDateTime;
use concorso_engine::{partition, project, summarize, ClassSummary, EngineError, Table, CLASS_COLUMN};
use concorso_recon::{reconcile, ReconError, ID_COLUMN};
use serde::Serialize;

use crate::archive::{bundle, Archive};
use crate::decode::{decode, DecodeError, DecodeOptions, SourceFormat};
use crate::export::{export_partitions, run_timestamp, ExportError, ExportOptions, ExportUnit, PartitionFailure};

// ---------------------------------------------------------------------------
// Input + config
// ---------------------------------------------------------------------------

/// An uploaded file: name (for its extension and messages) plus raw bytes
#[derive(Debug, Clone)]
pub struct InputFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl InputFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self { name: name.into(), bytes }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunConfig {
    /// Columns to export; `None` exports every column
    pub selected_columns: Option<Vec<String>>,
    pub use_timestamp: bool,
    pub bundle_as_archive: bool,
    /// Class codes to bundle; `None` bundles every exported file
    pub bundle_selection: Option<Vec<String>>,
    pub decode: DecodeOptions,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum PipelineError {
    Decode(DecodeError),
    /// Required column absent; the run stops before partitioning.
    MissingColumn { file: String, column: String },
    Export(ExportError),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decode(e) => write!(f, "{e}"),
            Self::MissingColumn { file, column } => {
                write!(f, "{file}: required column '{column}' not found")
            }
            Self::Export(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for PipelineError {}

impl From<DecodeError> for PipelineError {
    fn from(e: DecodeError) -> Self {
        Self::Decode(e)
    }
}

impl From<ExportError> for PipelineError {
    fn from(e: ExportError) -> Self {
        Self::Export(e)
    }
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReconciliationOutcome {
    NotRequested,
    Applied { snapshot: String, total: usize, new: usize },
    Skipped { snapshot: String, reason: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectionSummary {
    pub columns: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unknown: Vec<String>,
    pub fell_back: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportedFile {
    pub file_name: String,
    pub code: String,
    pub rows: usize,
    pub bytes: usize,
    pub sha256: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub source: String,
    pub format: String,
    pub rows: usize,
    pub classes: Vec<ClassSummary>,
    pub reconciliation: ReconciliationOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projection: Option<ProjectionSummary>,
    pub files: Vec<ExportedFile>,
    pub failures: Vec<PartitionFailure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive: Option<String>,
}

impl RunSummary {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct RunOutput {
    pub units: Vec<ExportUnit>,
    pub archive: Option<Archive>,
    pub summary: RunSummary,
}

/// Decoded table plus what a preview shows
#[derive(Debug, Clone)]
pub struct Inspection {
    pub table: Table,
    pub format: SourceFormat,
    pub classes: Vec<ClassSummary>,
}

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

fn require_column(table: &Table, file: &str, column: &str) -> Result<(), PipelineError> {
    if table.has_column(column) {
        Ok(())
    } else {
        Err(PipelineError::MissingColumn {
            file: file.to_string(),
            column: column.to_string(),
        })
    }
}

fn class_partitions(table: &Table, file: &str) -> Result<Vec<concorso_engine::Partition>, PipelineError> {
    partition(table, CLASS_COLUMN).map_err(|e| match e {
        EngineError::MissingColumn { column } => PipelineError::MissingColumn {
            file: file.to_string(),
            column,
        },
    })
}

/// Decode a file and summarize its classes without exporting anything
pub fn inspect(input: &InputFile, options: &DecodeOptions) -> Result<Inspection, PipelineError> {
    let decoded = decode(&input.bytes, &input.name, options)?;
    require_column(&decoded.table, &input.name, CLASS_COLUMN)?;
    let partitions = class_partitions(&decoded.table, &input.name)?;
    Ok(Inspection {
        classes: summarize(&partitions, CLASS_COLUMN),
        table: decoded.table,
        format: decoded.format,
    })
}

/// Run the full pipeline for one upload.
///
/// `now` provides the run's single timestamp (file suffixes and archive
/// name). Fatal: undecodable input or snapshot, or a missing `Classe`
/// column. A missing `CF` column skips reconciliation and is reported in
/// the summary; per-class serialization failures are reported, not raised.
pub fn run(
    input: &InputFile,
    snapshot: Option<&InputFile>,
    config: &RunConfig,
    now: NaiveDateTime,
) -> Result<RunOutput, PipelineError> {
    let decoded = decode(&input.bytes, &input.name, &config.decode)?;
    require_column(&decoded.table, &input.name, CLASS_COLUMN)?;
    let source_rows = decoded.table.len();
    let mut table = decoded.table;

    let reconciliation = match snapshot {
        None => ReconciliationOutcome::NotRequested,
        Some(snap) => {
            let previous = decode(&snap.bytes, &snap.name, &config.decode)?;
            match reconcile(&table, &previous.table, ID_COLUMN) {
                Ok(result) => {
                    table = result.table;
                    ReconciliationOutcome::Applied {
                        snapshot: snap.name.clone(),
                        total: result.total,
                        new: result.new,
                    }
                }
                Err(e @ ReconError::MissingColumn { .. }) => {
                    log::warn!("reconciliation skipped, exporting all records: {}", e);
                    ReconciliationOutcome::Skipped {
                        snapshot: snap.name.clone(),
                        reason: e.to_string(),
                    }
                }
            }
        }
    };

    let projection = match &config.selected_columns {
        None => None,
        Some(selected) => {
            let projected = project(&table, selected, CLASS_COLUMN);
            for name in &projected.unknown {
                log::warn!("selected column '{}' is not in {}", name, input.name);
            }
            table = projected.table;
            Some(ProjectionSummary {
                columns: table.columns().to_vec(),
                unknown: projected.unknown,
                fell_back: projected.fell_back,
            })
        }
    };

    let partitions = class_partitions(&table, &input.name)?;
    let classes = summarize(&partitions, CLASS_COLUMN);
    log::info!("{}: {} records in {} classes", input.name, table.len(), classes.len());

    let timestamp = config.use_timestamp.then(|| run_timestamp(now));
    let outcome = export_partitions(&partitions, &ExportOptions { timestamp: timestamp.clone() });

    let archive = if config.bundle_as_archive {
        let stamp = timestamp.unwrap_or_else(|| now.format("%Y%m%d").to_string());
        bundle(&outcome.units, config.bundle_selection.as_deref(), &stamp)?
    } else {
        None
    };

    let files = outcome
        .units
        .iter()
        .map(|u| ExportedFile {
            file_name: u.file_name.clone(),
            code: u.code.clone(),
            rows: u.rows,
            bytes: u.bytes.len(),
            sha256: u.digest(),
        })
        .collect();

    let summary = RunSummary {
        source: input.name.clone(),
        format: decoded.format.to_string(),
        rows: source_rows,
        classes,
        reconciliation,
        projection,
        files,
        failures: outcome.failures,
        archive: archive.as_ref().map(|a| a.file_name.clone()),
    };

    Ok(RunOutput {
        units: outcome.units,
        archive,
        summary,
    })
}
