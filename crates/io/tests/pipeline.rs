// End-to-end runs of the export pipeline over in-memory uploads.
// Run with: cargo test -p concorso-io --test pipeline

use chrono::{NaiveDate, NaiveDateTime};
use concorso_engine::{partition, Table, Value, CLASS_COLUMN};
use concorso_io::decode::{decode, DecodeOptions};
use concorso_io::pipeline::{run, InputFile, ReconciliationOutcome, RunConfig};
use concorso_io::xlsx::export_table;

fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 2, 14).unwrap().and_hms_opt(16, 45, 0).unwrap()
}

fn upload(name: &str, content: &str) -> InputFile {
    InputFile::new(name, content.as_bytes().to_vec())
}

const ENROLLMENTS: &str = "\
Nome;Cognome;Classe;CF
Anna;Rossi;Matematica (A-01);RSSNNA80A41H501X
Luca;Bianchi;Chimica (A-02);BNCLCU85B02F205Y
Sara;Verdi;Fisica (A-01);VRDSRA90C43L219Z
";

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn two_classes_two_files() {
    let output = run(&upload("iscritti.csv", ENROLLMENTS), None, &RunConfig::default(), now()).unwrap();

    let names: Vec<&str> = output.units.iter().map(|u| u.file_name.as_str()).collect();
    assert_eq!(names, vec!["A-01.xlsx", "A-02.xlsx"]);
    assert_eq!(output.units[0].rows, 2);
    assert_eq!(output.units[1].rows, 1);

    let classes = &output.summary.classes;
    assert_eq!(classes.len(), 2);
    assert_eq!((classes[0].code.as_str(), classes[0].count), ("A-01", 2));
    assert_eq!((classes[1].code.as_str(), classes[1].count), ("A-02", 1));
    assert_eq!(output.summary.reconciliation, ReconciliationOutcome::NotRequested);
    assert!(output.archive.is_none());
}

#[test]
fn exported_file_decodes_to_partition() {
    let output = run(&upload("iscritti.csv", ENROLLMENTS), None, &RunConfig::default(), now()).unwrap();
    let a01 = decode(&output.units[0].bytes, &output.units[0].file_name, &DecodeOptions::default())
        .unwrap()
        .table;

    assert_eq!(
        a01.columns(),
        &["Nome".to_string(), "Cognome".to_string(), "Classe".to_string(), "CF".to_string()]
    );
    assert_eq!(a01.len(), 2);
    assert_eq!(a01.rows()[0][2], Value::from("Matematica (A-01)"));
    assert_eq!(a01.rows()[1][0], Value::from("Sara"));
}

#[test]
fn case_insensitive_reconciliation() {
    let current = upload(
        "iscritti.csv",
        "Nome;Classe;CF\nAnna;Fisica (A-20);abc123\nLuca;Fisica (A-20);XYZ999\n",
    );
    let snapshot = upload("precedente.csv", "Nome;Classe;CF\nAnna;Fisica (A-20);ABC123\n");

    let output = run(&current, Some(&snapshot), &RunConfig::default(), now()).unwrap();
    assert_eq!(
        output.summary.reconciliation,
        ReconciliationOutcome::Applied { snapshot: "precedente.csv".into(), total: 2, new: 1 }
    );

    let table = decode(&output.units[0].bytes, "A-20.xlsx", &DecodeOptions::default()).unwrap().table;
    assert_eq!(table.len(), 1);
    assert_eq!(table.rows()[0][2], Value::from("XYZ999"));
}

#[test]
fn reconciliation_with_nothing_new_exports_nothing() {
    let current = upload("iscritti.csv", "Classe;CF\nFisica (A-20);A\n");
    let snapshot = upload("precedente.csv", "Classe;CF\nFisica (A-20);a\n");
    let output = run(&current, Some(&snapshot), &RunConfig::default(), now()).unwrap();
    assert!(output.units.is_empty());
    assert!(output.summary.classes.is_empty());
}

#[test]
fn latin1_upload_decodes() {
    let bytes = b"Nome;Classe\nNiccol\xF2;Lingua e cultura (A-24)\n".to_vec();
    assert!(std::str::from_utf8(&bytes).is_err());

    let output = run(&InputFile::new("iscritti.csv", bytes), None, &RunConfig::default(), now()).unwrap();
    assert_eq!(output.units[0].file_name, "A-24.xlsx");
    assert!(output.summary.format.contains("latin1"));
}

#[test]
fn spreadsheet_upload() {
    let source = Table::from_rows(
        vec!["Nome".into(), "Classe".into(), "Eta".into()],
        vec![
            vec![Value::from("Anna"), Value::from("Matematica (A-01)"), Value::Number(31.0)],
            vec![Value::from("Luca"), Value::from("Corso libero"), Value::Number(40.0)],
        ],
    );
    let bytes = export_table(&source).unwrap();

    let output = run(&InputFile::new("iscritti.xlsx", bytes), None, &RunConfig::default(), now()).unwrap();
    let names: Vec<&str> = output.units.iter().map(|u| u.file_name.as_str()).collect();
    assert_eq!(names, vec!["A-01.xlsx", "Corso libero.xlsx"]);
    assert_eq!(output.summary.format, "spreadsheet");
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

#[test]
fn identical_input_identical_output() {
    let config = RunConfig {
        bundle_as_archive: true,
        ..RunConfig::default()
    };
    let first = run(&upload("iscritti.csv", ENROLLMENTS), None, &config, now()).unwrap();
    let later = now() + chrono::Duration::seconds(1);
    let second = run(&upload("iscritti.csv", ENROLLMENTS), None, &config, later).unwrap();

    assert_eq!(first.units, second.units);
    assert_eq!(
        first.archive.as_ref().map(|a| &a.bytes),
        second.archive.as_ref().map(|a| &a.bytes)
    );
}

#[test]
fn every_partition_roundtrips_through_decoder() {
    let table = decode(ENROLLMENTS.as_bytes(), "iscritti.csv", &DecodeOptions::default())
        .unwrap()
        .table;

    for part in partition(&table, CLASS_COLUMN).unwrap() {
        let bytes = export_table(&part.table).unwrap();
        let back = decode(&bytes, "x.xlsx", &DecodeOptions::default()).unwrap().table;
        assert_eq!(back, part.table, "class {}", part.code);
    }
}

#[test]
fn projection_applies_to_every_file() {
    let config = RunConfig {
        selected_columns: Some(vec!["CF".into(), "Nome".into()]),
        ..RunConfig::default()
    };
    let output = run(&upload("iscritti.csv", ENROLLMENTS), None, &config, now()).unwrap();

    for unit in &output.units {
        let table = decode(&unit.bytes, &unit.file_name, &DecodeOptions::default()).unwrap().table;
        assert_eq!(
            table.columns(),
            &["Nome".to_string(), "Classe".to_string(), "CF".to_string()]
        );
    }
}

#[test]
fn partial_failure_keeps_other_classes() {
    let huge = "x".repeat(40_000);
    let content = format!("Classe;Note\nFisica (A-20);ok\nChimica (A-34);{huge}\nStoria (A-19);ok\n");
    let output = run(&upload("iscritti.csv", &content), None, &RunConfig::default(), now()).unwrap();

    assert!(output.summary.has_failures());
    assert_eq!(output.summary.failures[0].code, "A-34");
    let codes: Vec<&str> = output.units.iter().map(|u| u.code.as_str()).collect();
    assert_eq!(codes, vec!["A-20", "A-19"]);
}

#[test]
fn delimiter_only_lines_export_to_visible_file() {
    let content = "Nome;Classe\nAnna;M (A-01)\n;\n;\n";
    let config = RunConfig {
        bundle_as_archive: true,
        ..RunConfig::default()
    };
    let output = run(&upload("iscritti.csv", content), None, &config, now()).unwrap();

    let units: Vec<(&str, usize)> = output.units.iter().map(|u| (u.file_name.as_str(), u.rows)).collect();
    assert_eq!(units, vec![("A-01.xlsx", 1), ("senza_classe.xlsx", 2)]);
    assert_eq!(output.units[1].code, "");

    let archive = output.archive.unwrap();
    assert!(archive.entries.iter().all(|name| !name.starts_with('.')));
}
