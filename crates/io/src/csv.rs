// CSV/TSV import for enrollment exports

use concorso_engine::{normalize_headers, Table, Value};

use crate::decode::DecodeError;

/// Pick the field delimiter by presence alone: `;` if the text contains one
/// anywhere, else `,`, else tab.
///
/// This does not tokenize, so a comma-separated file whose quoted fields
/// contain semicolons is misread as semicolon-separated.
pub fn infer_delimiter(content: &str) -> u8 {
    if content.contains(';') {
        b';'
    } else if content.contains(',') {
        b','
    } else {
        b'\t'
    }
}

/// Parse delimited text into a table. The first record is the header.
///
/// Short rows are padded with empties. Extra trailing fields are tolerated
/// only when they are empty (trailing delimiters); any other overflow is an
/// error naming the line.
pub fn parse(content: &str, delimiter: u8, file: &str) -> Result<Table, DecodeError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut records = reader.records();

    let header = match records.next() {
        Some(result) => result.map_err(|e| csv_error(file, &e))?,
        None => return Err(DecodeError::Empty { file: file.to_string() }),
    };
    let columns = normalize_headers(header.iter());
    let width = columns.len();

    let mut raw_rows: Vec<Vec<String>> = Vec::new();
    for result in records {
        let record = result.map_err(|e| csv_error(file, &e))?;
        if record.len() > width && record.iter().skip(width).any(|f| !f.is_empty()) {
            return Err(DecodeError::Csv {
                file: file.to_string(),
                line: record.position().map(|p| p.line()),
                message: format!("expected {} fields, found {}", width, record.len()),
            });
        }
        raw_rows.push(record.iter().take(width).map(str::to_string).collect());
    }

    let numeric: Vec<bool> = (0..width)
        .map(|col| {
            raw_rows
                .iter()
                .filter_map(|row| row.get(col))
                .filter(|field| !field.is_empty())
                .all(|field| parse_number(field).is_some())
        })
        .collect();

    let rows = raw_rows
        .into_iter()
        .map(|row| {
            row.into_iter()
                .enumerate()
                .map(|(col, field)| typed_value(field, numeric[col]))
                .collect()
        })
        .collect();

    Ok(Table::from_rows(columns, rows))
}

/// Finite decimal numbers only; "nan"/"inf" stay text
fn parse_number(field: &str) -> Option<f64> {
    field.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn typed_value(field: String, numeric: bool) -> Value {
    if field.is_empty() {
        return Value::Empty;
    }
    if numeric {
        if let Some(n) = parse_number(&field) {
            return Value::Number(n);
        }
    }
    Value::Text(field)
}

fn csv_error(file: &str, e: &csv::Error) -> DecodeError {
    DecodeError::Csv {
        file: file.to_string(),
        line: e.position().map(|p| p.line()),
        message: e.to_string(),
    }
}
