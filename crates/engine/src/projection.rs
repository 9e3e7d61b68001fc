// Column projection: keep the user's selected columns plus the grouping column

use crate::table::Table;

/// Result of projecting a table onto a column selection
#[derive(Debug, Clone)]
pub struct Projection {
    pub table: Table,
    /// Selected names that do not exist in the table (ignored)
    pub unknown: Vec<String>,
    /// True when the selection left nothing but the forced column and the
    /// full column set was kept instead
    pub fell_back: bool,
}

/// Restrict `table` to `selected`, always keeping `forced`.
///
/// Columns keep the table's original order regardless of selection order, so
/// every partition of a run shares one layout. A selection that retains no
/// column besides `forced` falls back to the full table.
pub fn project(table: &Table, selected: &[String], forced: &str) -> Projection {
    let unknown: Vec<String> = selected
        .iter()
        .filter(|name| !table.has_column(name))
        .cloned()
        .collect();

    let keep: Vec<usize> = table
        .columns()
        .iter()
        .enumerate()
        .filter(|(_, name)| name.as_str() == forced || selected.iter().any(|s| s == *name))
        .map(|(idx, _)| idx)
        .collect();

    let retained_besides_forced = keep
        .iter()
        .filter(|&&idx| table.columns()[idx] != forced)
        .count();

    if retained_besides_forced == 0 {
        log::warn!(
            "column selection keeps only '{}'; exporting all {} columns instead",
            forced,
            table.columns().len()
        );
        return Projection {
            table: table.clone(),
            unknown,
            fell_back: true,
        };
    }

    Projection {
        table: table.select_indices(&keep),
        unknown,
        fell_back: false,
    }
}
