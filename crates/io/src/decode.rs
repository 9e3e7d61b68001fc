// Tabular decoder: raw upload bytes + file name -> Table

use std::fmt;
use std::path::Path;

use concorso_engine::Table;

use crate::encoding::{decode_text, TextEncoding, DEFAULT_ENCODINGS};
use crate::xlsx::SPREADSHEET_EXTENSIONS;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// No candidate encoding accepted the bytes.
    Encoding { file: String, attempted: Vec<&'static str> },
    /// Malformed delimited text.
    Csv { file: String, line: Option<u64>, message: String },
    /// Workbook could not be opened or read.
    Spreadsheet { file: String, message: String },
    /// No header row.
    Empty { file: String },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Encoding { file, attempted } => {
                write!(f, "{file}: cannot decode text with any of: {}", attempted.join(", "))
            }
            Self::Csv { file, line: Some(line), message } => write!(f, "{file}, line {line}: {message}"),
            Self::Csv { file, line: None, message } => write!(f, "{file}: {message}"),
            Self::Spreadsheet { file, message } => write!(f, "{file}: {message}"),
            Self::Empty { file } => write!(f, "{file}: file has no header row"),
        }
    }
}

impl std::error::Error for DecodeError {}

/// How delimited text is decoded
#[derive(Debug, Clone)]
pub struct DecodeOptions {
    /// Try-list, first success wins
    pub encodings: Vec<TextEncoding>,
    /// Skip inference and use this delimiter
    pub delimiter: Option<u8>,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            encodings: DEFAULT_ENCODINGS.to_vec(),
            delimiter: None,
        }
    }
}

/// Which reader produced the table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Spreadsheet,
    Delimited { encoding: TextEncoding, delimiter: u8 },
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spreadsheet => write!(f, "spreadsheet"),
            Self::Delimited { encoding, delimiter } => {
                let shown = match delimiter {
                    b'\t' => "tab".to_string(),
                    other => format!("'{}'", *other as char),
                };
                write!(f, "delimited text ({encoding}, {shown})")
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct Decoded {
    pub table: Table,
    pub format: SourceFormat,
}

/// True when the file name's extension selects the spreadsheet reader
pub fn is_spreadsheet(file_name: &str) -> bool {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SPREADSHEET_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Decode an upload. The file name is used only for its extension and for
/// error messages.
pub fn decode(bytes: &[u8], file_name: &str, options: &DecodeOptions) -> Result<Decoded, DecodeError> {
    if is_spreadsheet(file_name) {
        let table = crate::xlsx::import_bytes(bytes, file_name)?;
        log::info!("{}: read {} rows from spreadsheet", file_name, table.len());
        return Ok(Decoded { table, format: SourceFormat::Spreadsheet });
    }

    let (content, encoding) = decode_text(bytes, &options.encodings).map_err(|attempted| DecodeError::Encoding {
        file: file_name.to_string(),
        attempted,
    })?;
    let delimiter = options
        .delimiter
        .unwrap_or_else(|| crate::csv::infer_delimiter(&content));

    let table = crate::csv::parse(&content, delimiter, file_name)?;
    let format = SourceFormat::Delimited { encoding, delimiter };
    log::info!("{}: read {} rows as {}", file_name, table.len(), format);
    Ok(Decoded { table, format })
}

#[cfg(test)]
mod tests {
    use super::*;
    use concorso_engine::Value;

    #[test]
    fn test_extension_dispatch() {
        assert!(is_spreadsheet("iscritti.xlsx"));
        assert!(is_spreadsheet("ISCRITTI.XLS"));
        assert!(is_spreadsheet("dati.ods"));
        assert!(!is_spreadsheet("iscritti.csv"));
        assert!(!is_spreadsheet("iscritti.txt"));
        assert!(!is_spreadsheet("senza_estensione"));
    }

    #[test]
    fn test_latin1_csv_decodes() {
        let bytes = b"Nome;Classe\nNiccol\xF2;Fisica (A-20)\n";
        let decoded = decode(bytes, "iscritti.csv", &DecodeOptions::default()).unwrap();

        assert_eq!(
            decoded.format,
            SourceFormat::Delimited { encoding: TextEncoding::Latin1, delimiter: b';' }
        );
        assert_eq!(decoded.table.rows()[0][0], Value::from("Niccolò"));
    }

    #[test]
    fn test_encoding_error_lists_attempts() {
        let options = DecodeOptions {
            encodings: vec![TextEncoding::Utf8],
            delimiter: None,
        };
        let err = decode(b"\xFFClasse", "x.csv", &options).unwrap_err();
        assert_eq!(
            err.to_string(),
            "x.csv: cannot decode text with any of: utf-8"
        );
    }

    #[test]
    fn test_delimiter_override() {
        let options = DecodeOptions {
            delimiter: Some(b','),
            ..DecodeOptions::default()
        };
        let decoded = decode(b"Nome,Note\nAnna,\"a; b\"\n", "x.csv", &options).unwrap();
        assert_eq!(decoded.table.columns().len(), 2);
        assert_eq!(decoded.table.rows()[0][1], Value::from("a; b"));
    }

    #[test]
    fn test_format_display() {
        let f = SourceFormat::Delimited { encoding: TextEncoding::Cp1252, delimiter: b'\t' };
        assert_eq!(f.to_string(), "delimited text (cp1252, tab)");
    }
}
