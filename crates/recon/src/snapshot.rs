// Set-difference reconciliation keyed by a unique identifier column

use std::collections::HashSet;

use concorso_engine::{Table, Value};

use crate::error::ReconError;

/// Identifier column (codice fiscale) shared by current and snapshot files
pub const ID_COLUMN: &str = "CF";

/// Records of the current table absent from the snapshot
#[derive(Debug, Clone)]
pub struct Reconciliation {
    /// Current rows whose identifier is new, in source order
    pub table: Table,
    /// Row count of the current table before filtering
    pub total: usize,
    /// Row count after filtering
    pub new: usize,
}

/// Comparison key: display form, uppercased, not trimmed.
/// Empty identifiers yield `None` and never match anything.
fn normalize_id(value: &Value) -> Option<String> {
    let raw = value.display();
    if raw.is_empty() {
        None
    } else {
        Some(raw.to_uppercase())
    }
}

/// Uppercased, non-empty identifiers of `table`'s `column`
pub fn identifier_set(table: &Table, column: &str) -> Option<HashSet<String>> {
    let values = table.column_values(column)?;
    Some(values.filter_map(normalize_id).collect())
}

/// Keep the rows of `current` whose identifier is not in `snapshot`.
///
/// Identifiers compare case-insensitively by uppercasing both sides. Rows
/// with an empty identifier are always kept. Neither table is modified.
pub fn reconcile(current: &Table, snapshot: &Table, column: &str) -> Result<Reconciliation, ReconError> {
    let id_idx = current.column_index(column).ok_or_else(|| ReconError::MissingColumn {
        table: "current",
        column: column.to_string(),
    })?;
    let known = identifier_set(snapshot, column).ok_or_else(|| ReconError::MissingColumn {
        table: "snapshot",
        column: column.to_string(),
    })?;

    let table = current.filter_rows(|row| match normalize_id(&row[id_idx]) {
        Some(id) => !known.contains(&id),
        None => true,
    });

    let result = Reconciliation {
        total: current.len(),
        new: table.len(),
        table,
    };
    log::info!(
        "reconciliation: {} of {} records are new ({} identifiers in snapshot)",
        result.new,
        result.total,
        known.len()
    );
    Ok(result)
}
