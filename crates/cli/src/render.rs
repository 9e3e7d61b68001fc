// Human-readable output for `inspect` and `split`

use std::fmt::Write;
use std::path::{Path, PathBuf};

use concorso_engine::{ClassSummary, Table};
use concorso_io::{Inspection, ReconciliationOutcome, RunSummary};

fn class_lines(out: &mut String, classes: &[ClassSummary]) {
    let code_width = classes.iter().map(|c| c.code.chars().count()).max().unwrap_or(0);
    let label_width = classes.iter().map(|c| c.label.chars().count()).max().unwrap_or(0);
    for class in classes {
        let _ = writeln!(
            out,
            "  {:<cw$}  {:<lw$}  {}",
            class.code,
            class.label,
            class.count,
            cw = code_width,
            lw = label_width
        );
    }
}

/// Tab-separated header plus rows
fn table_lines(out: &mut String, table: &Table) {
    let _ = writeln!(out, "  {}", table.columns().join("\t"));
    for row in table.rows() {
        let cells: Vec<String> = row.iter().map(|v| v.display()).collect();
        let _ = writeln!(out, "  {}", cells.join("\t"));
    }
}

pub fn inspection(source: &str, inspection: &Inspection, rows: usize) -> String {
    let mut out = String::new();
    let table = &inspection.table;
    let _ = writeln!(out, "{}: {} records, {}", source, table.len(), inspection.format);
    let _ = writeln!(out, "columns: {}", table.columns().join(", "));

    if rows > 0 && !table.is_empty() {
        let head = table.head(rows);
        let _ = writeln!(out, "first {} rows:", head.len());
        table_lines(&mut out, &head);
    }

    let _ = writeln!(out, "{} classes:", inspection.classes.len());
    class_lines(&mut out, &inspection.classes);
    out
}

pub fn run_summary(summary: &RunSummary, out_dir: Option<&Path>, written: &[PathBuf]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}: {} records, {}", summary.source, summary.rows, summary.format);

    match &summary.reconciliation {
        ReconciliationOutcome::NotRequested => {}
        ReconciliationOutcome::Applied { snapshot, total, new } => {
            let _ = writeln!(out, "new since {}: {} of {}", snapshot, new, total);
        }
        ReconciliationOutcome::Skipped { snapshot, reason } => {
            let _ = writeln!(out, "reconciliation with {} skipped: {}", snapshot, reason);
        }
    }

    if let Some(projection) = &summary.projection {
        let _ = writeln!(out, "columns: {}", projection.columns.join(", "));
        if !projection.unknown.is_empty() {
            let _ = writeln!(out, "ignored unknown columns: {}", projection.unknown.join(", "));
        }
        if projection.fell_back {
            let _ = writeln!(out, "no selected column matched, exporting all columns");
        }
    }

    let _ = writeln!(out, "{} classes:", summary.classes.len());
    class_lines(&mut out, &summary.classes);

    match out_dir {
        Some(dir) => {
            let _ = writeln!(out, "wrote {} files to {}", written.len(), dir.display());
        }
        None => {
            let _ = writeln!(out, "{} files generated (not written)", summary.files.len());
        }
    }
    for file in &summary.files {
        let _ = writeln!(out, "  {}  {} rows", file.file_name, file.rows);
    }
    if let Some(archive) = &summary.archive {
        let _ = writeln!(out, "archive: {}", archive);
    }
    for failure in &summary.failures {
        let _ = writeln!(out, "failed: {}: {}", failure.code, failure.error);
    }
    out
}
