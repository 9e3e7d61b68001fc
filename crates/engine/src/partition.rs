// Partitioning: group records by derived class code

use std::collections::HashMap;

use serde::Serialize;

use crate::class_code::{class_code_of, class_label};
use crate::error::EngineError;
use crate::table::Table;

/// All records of the source table sharing one class code.
/// `table` has the source table's columns; the code itself is not a column.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    pub code: String,
    pub table: Table,
}

/// Per-class counts for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassSummary {
    pub code: String,
    /// First label seen for the class, without its parenthesized code
    pub label: String,
    pub count: usize,
}

/// Split `table` into one partition per distinct class code of `source_column`.
///
/// Partitions come out in first-occurrence order of their code and rows keep
/// their source order, so identical input always yields identical output.
/// Every row lands in exactly one partition; no partition is empty.
pub fn partition(table: &Table, source_column: &str) -> Result<Vec<Partition>, EngineError> {
    let source_idx = table
        .column_index(source_column)
        .ok_or_else(|| EngineError::MissingColumn { column: source_column.to_string() })?;

    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut partitions: Vec<Partition> = Vec::new();

    for row in table.rows() {
        let code = class_code_of(&row[source_idx]);
        let slot = match slots.get(&code) {
            Some(&slot) => slot,
            None => {
                partitions.push(Partition {
                    code: code.clone(),
                    table: Table::new(table.columns().to_vec()),
                });
                slots.insert(code, partitions.len() - 1);
                partitions.len() - 1
            }
        };
        partitions[slot].table.push_row(row.clone());
    }

    log::debug!("{} rows grouped into {} classes", table.len(), partitions.len());
    Ok(partitions)
}

/// Summaries in partition order
pub fn summarize(partitions: &[Partition], source_column: &str) -> Vec<ClassSummary> {
    partitions
        .iter()
        .map(|p| {
            let label = p
                .table
                .column_values(source_column)
                .and_then(|mut values| values.next().map(|v| class_label(&v.display()).to_string()))
                .unwrap_or_default();
            ClassSummary {
                code: p.code.clone(),
                label,
                count: p.table.len(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Value;
    use proptest::prelude::*;

    fn enrollments(labels: &[&str]) -> Table {
        Table::from_rows(
            vec!["Id".into(), "Classe".into()],
            labels
                .iter()
                .enumerate()
                .map(|(i, l)| vec![Value::Number(i as f64), Value::from(*l)])
                .collect(),
        )
    }

    #[test]
    fn test_groups_by_code() {
        let table = enrollments(&["Matematica (A-01)", "Chimica (A-02)", "Fisica (A-01)"]);
        let parts = partition(&table, "Classe").unwrap();

        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].code, "A-01");
        assert_eq!(parts[0].table.len(), 2);
        assert_eq!(parts[1].code, "A-02");
        assert_eq!(parts[1].table.len(), 1);

        // rows keep source order inside a partition
        assert_eq!(parts[0].table.rows()[0][0], Value::Number(0.0));
        assert_eq!(parts[0].table.rows()[1][0], Value::Number(2.0));
    }

    #[test]
    fn test_first_occurrence_order() {
        let table = enrollments(&["Z (B-09)", "A (A-01)", "Z bis (B-09)"]);
        let codes: Vec<String> = partition(&table, "Classe")
            .unwrap()
            .into_iter()
            .map(|p| p.code)
            .collect();
        assert_eq!(codes, vec!["B-09", "A-01"]);
    }

    #[test]
    fn test_unmatched_label_is_its_own_key() {
        let table = enrollments(&["Corso libero", "Corso libero", "Fisica (A-20)"]);
        let parts = partition(&table, "Classe").unwrap();
        assert_eq!(parts[0].code, "Corso libero");
        assert_eq!(parts[0].table.len(), 2);
    }

    #[test]
    fn test_missing_source_column() {
        let table = Table::new(vec!["Nome".into()]);
        let err = partition(&table, "Classe").unwrap_err();
        assert_eq!(err, EngineError::MissingColumn { column: "Classe".into() });
    }

    #[test]
    fn test_summaries() {
        let table = enrollments(&["Matematica (A-01)", "Fisica (A-01)", "Chimica (A-02)"]);
        let parts = partition(&table, "Classe").unwrap();
        let summary = summarize(&parts, "Classe");
        assert_eq!(
            summary,
            vec![
                ClassSummary { code: "A-01".into(), label: "Matematica".into(), count: 2 },
                ClassSummary { code: "A-02".into(), label: "Chimica".into(), count: 1 },
            ]
        );
    }

    proptest! {
        #[test]
        fn prop_partition_is_total_cover(
            labels in proptest::collection::vec(
                prop_oneof![
                    "[A-C]-0[1-3]".prop_map(|c| format!("Corso ({c})")),
                    "[a-z ]{0,6}",
                ],
                0..60,
            )
        ) {
            let refs: Vec<&str> = labels.iter().map(String::as_str).collect();
            let table = enrollments(&refs);
            let parts = partition(&table, "Classe").unwrap();

            let total: usize = parts.iter().map(|p| p.table.len()).sum();
            prop_assert_eq!(total, table.len());

            let mut seen = vec![0usize; table.len()];
            for p in &parts {
                prop_assert!(!p.table.is_empty());
                for row in p.table.rows() {
                    let id = match row[0] {
                        Value::Number(n) => n as usize,
                        _ => unreachable!(),
                    };
                    seen[id] += 1;
                    prop_assert_eq!(class_code_of(&row[1]), p.code.clone());
                }
            }
            prop_assert!(seen.iter().all(|&n| n == 1));
        }
    }
}
