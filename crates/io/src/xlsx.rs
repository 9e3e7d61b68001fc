// Excel file import (xlsx, xlsm, xlsb, xls, ods) and export (xlsx only)
//
// Import: first worksheet, first row is the header.
// Export: one worksheet, bold header row, values by type. Document
//         properties carry a fixed creation time so identical tables
//         serialize to identical bytes.

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use concorso_engine::{normalize_headers, Table, Value};
use rust_xlsxwriter::{DocProperties, ExcelDateTime, Format, Workbook};

use crate::decode::DecodeError;

/// Extensions read through the spreadsheet path (lowercase)
pub const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// Read the first worksheet of an in-memory workbook
pub fn import_bytes(bytes: &[u8], file: &str) -> Result<Table, DecodeError> {
    let spreadsheet_err = |message: String| DecodeError::Spreadsheet {
        file: file.to_string(),
        message,
    };

    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| spreadsheet_err(format!("failed to open workbook: {}", e)))?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    let first = sheet_names
        .first()
        .ok_or_else(|| spreadsheet_err("workbook contains no sheets".to_string()))?;

    let range = workbook
        .worksheet_range(first)
        .map_err(|e| spreadsheet_err(format!("failed to read sheet '{}': {}", first, e)))?;

    let mut rows = range.rows();
    let header = match rows.next() {
        Some(cells) => cells,
        None => return Err(DecodeError::Empty { file: file.to_string() }),
    };
    let columns = normalize_headers(header.iter().map(|cell| cell_value(cell).display()));

    let body = rows
        .map(|cells| cells.iter().map(cell_value).collect())
        .collect();

    Ok(Table::from_rows(columns, body))
}

fn cell_value(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::Empty,
        Data::String(s) => Value::text(s.as_str()),
        Data::Float(n) => Value::Number(*n),
        Data::Int(n) => Value::Number(*n as f64),
        Data::Bool(b) => Value::text(if *b { "TRUE" } else { "FALSE" }),
        Data::Error(e) => Value::text(e.to_string()),
        // Serial date; the 1900 system is assumed
        Data::DateTime(dt) => Value::Number(dt.as_f64()),
        other => Value::text(other.to_string()),
    }
}

/// Serialize a table to an xlsx buffer: header row plus one row per record
pub fn export_table(table: &Table) -> Result<Vec<u8>, String> {
    let mut workbook = Workbook::new();

    let created = ExcelDateTime::from_ymd(2000, 1, 1)
        .map_err(|e| format!("failed to build document date: {}", e))?;
    let properties = DocProperties::new().set_creation_datetime(&created);
    workbook.set_properties(&properties);

    {
        let worksheet = workbook.add_worksheet();
        let header_format = Format::new().set_bold();

        for (col, name) in table.columns().iter().enumerate() {
            worksheet
                .write_string_with_format(0, col as u16, name, &header_format)
                .map_err(|e| format!("failed to write header '{}': {}", name, e))?;
        }

        for (row_idx, row) in table.rows().iter().enumerate() {
            let row32 = (row_idx + 1) as u32;
            for (col, value) in row.iter().enumerate() {
                let col16 = col as u16;
                match value {
                    Value::Empty => {}
                    Value::Text(s) => {
                        worksheet
                            .write_string(row32, col16, s)
                            .map_err(|e| format!("failed to write cell ({}, {}): {}", row32, col, e))?;
                    }
                    Value::Number(n) => {
                        worksheet
                            .write_number(row32, col16, *n)
                            .map_err(|e| format!("failed to write cell ({}, {}): {}", row32, col, e))?;
                    }
                }
            }
        }
    }

    workbook
        .save_to_buffer()
        .map_err(|e| format!("failed to save xlsx buffer: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::from_rows(
            vec!["Nome".into(), "Classe".into(), "Eta".into(), "Note".into()],
            vec![
                vec![Value::from("Anna"), Value::from("Fisica (A-20)"), Value::Number(30.0), Value::Empty],
                vec![Value::from("Niccolò"), Value::from("Fisica (A-20)"), Value::Number(22.5), Value::from("è ok")],
            ],
        )
    }

    #[test]
    fn test_roundtrip_preserves_table() {
        let bytes = export_table(&sample()).unwrap();
        let back = import_bytes(&bytes, "A-20.xlsx").unwrap();
        assert_eq!(back, sample());
    }

    #[test]
    fn test_header_only_table() {
        let table = Table::new(vec!["Classe".into()]);
        let bytes = export_table(&table).unwrap();
        let back = import_bytes(&bytes, "x.xlsx").unwrap();
        assert_eq!(back.columns(), &["Classe".to_string()]);
        assert!(back.is_empty());
    }

    #[test]
    fn test_export_is_deterministic() {
        assert_eq!(export_table(&sample()).unwrap(), export_table(&sample()).unwrap());
    }

    #[test]
    fn test_oversized_string_fails() {
        let huge = "x".repeat(40_000);
        let table = Table::from_rows(vec!["Classe".into()], vec![vec![Value::text(huge)]]);
        let err = export_table(&table).unwrap_err();
        assert!(err.contains("failed to write cell (1, 0)"), "{err}");
    }

    #[test]
    fn test_import_bool_and_date_cells() {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        let date_format = Format::new().set_num_format("yyyy-mm-dd");
        let enrolled = ExcelDateTime::from_ymd(2024, 9, 1).unwrap();
        worksheet.write_string(0, 0, "Classe").unwrap();
        worksheet.write_string(0, 1, "Pagato").unwrap();
        worksheet.write_string(0, 2, "Iscrizione").unwrap();
        worksheet.write_string(1, 0, "Fisica (A-20)").unwrap();
        worksheet.write_boolean(1, 1, true).unwrap();
        worksheet.write_datetime_with_format(1, 2, &enrolled, &date_format).unwrap();
        worksheet.write_string(2, 0, "Chimica (A-34)").unwrap();
        worksheet.write_boolean(2, 1, false).unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let table = import_bytes(&bytes, "iscritti.xlsx").unwrap();
        assert_eq!(table.rows()[0][1], Value::from("TRUE"));
        assert_eq!(table.rows()[1][1], Value::from("FALSE"));
        // 2024-09-01 as a 1900-system serial
        assert_eq!(table.rows()[0][2], Value::Number(45536.0));
        assert_eq!(table.rows()[1][2], Value::Empty);
    }

    #[test]
    fn test_error_cells_keep_excel_text() {
        use calamine::CellErrorType;

        assert_eq!(cell_value(&Data::Error(CellErrorType::Div0)), Value::from("#DIV/0!"));
        assert_eq!(cell_value(&Data::Error(CellErrorType::NA)), Value::from("#N/A"));
        assert_eq!(cell_value(&Data::Int(7)), Value::Number(7.0));
        assert_eq!(cell_value(&Data::String(String::new())), Value::Empty);
    }

    #[test]
    fn test_garbage_is_spreadsheet_error() {
        let err = import_bytes(b"definitely not a workbook", "bad.xlsx").unwrap_err();
        assert!(matches!(err, DecodeError::Spreadsheet { ref file, .. } if file == "bad.xlsx"));
    }
}
