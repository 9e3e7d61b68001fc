// Zip bundle of exported class files

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use crate::export::{ExportError, ExportUnit};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Archive {
    pub file_name: String,
    pub bytes: Vec<u8>,
    /// Entry names in archive order
    pub entries: Vec<String>,
}

/// `classi_concorso_<stamp>.zip`; stamp is the run timestamp or date
pub fn archive_name(stamp: &str) -> String {
    format!("classi_concorso_{}.zip", stamp)
}

/// Bundle the selected units into one deflate-compressed zip.
///
/// `selection` lists class codes to include (all units when `None`). Returns
/// `None` unless more than one unit is selected. Entries keep unit order and
/// carry a fixed modification time.
pub fn bundle(units: &[ExportUnit], selection: Option<&[String]>, stamp: &str) -> Result<Option<Archive>, ExportError> {
    if let Some(codes) = selection {
        for code in codes.iter().filter(|c| !units.iter().any(|u| &u.code == *c)) {
            log::warn!("bundle selection: no exported file for class {}", code);
        }
    }

    let selected: Vec<&ExportUnit> = units
        .iter()
        .filter(|u| selection.map_or(true, |codes| codes.iter().any(|c| c == &u.code)))
        .collect();

    if selected.len() < 2 {
        log::debug!("{} file(s) selected, no archive built", selected.len());
        return Ok(None);
    }

    let archive_err = |e: zip::result::ZipError| ExportError::Archive { message: e.to_string() };
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default());

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let mut entries = Vec::with_capacity(selected.len());
    for unit in &selected {
        writer.start_file(unit.file_name.as_str(), options).map_err(archive_err)?;
        writer.write_all(&unit.bytes).map_err(|e| ExportError::Archive { message: e.to_string() })?;
        entries.push(unit.file_name.clone());
    }
    let bytes = writer.finish().map_err(archive_err)?.into_inner();

    let archive = Archive {
        file_name: archive_name(stamp),
        bytes,
        entries,
    };
    log::info!("bundled {} files into {}", archive.entries.len(), archive.file_name);
    Ok(Some(archive))
}
