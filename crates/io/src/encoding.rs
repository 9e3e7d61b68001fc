// Character encoding fallback chain for delimited text uploads

use std::fmt;

/// Candidate text encodings, tried in list order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextEncoding {
    Latin1,
    Iso8859_1,
    Cp1252,
    Utf8Sig,
    Utf8,
}

/// Default try-list. Latin-1 maps every byte, so later entries only matter
/// when the list is reordered through settings or `--encoding`.
pub const DEFAULT_ENCODINGS: &[TextEncoding] = &[
    TextEncoding::Latin1,
    TextEncoding::Iso8859_1,
    TextEncoding::Cp1252,
    TextEncoding::Utf8Sig,
    TextEncoding::Utf8,
];

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Bytes with no assigned character in Windows-1252
const CP1252_UNDEFINED: &[u8] = &[0x81, 0x8D, 0x8F, 0x90, 0x9D];

impl TextEncoding {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Latin1 => "latin1",
            Self::Iso8859_1 => "iso-8859-1",
            Self::Cp1252 => "cp1252",
            Self::Utf8Sig => "utf-8-sig",
            Self::Utf8 => "utf-8",
        }
    }

    /// Parse a user-supplied label (case-insensitive, common aliases accepted)
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "latin1" | "latin-1" | "l1" => Some(Self::Latin1),
            "iso-8859-1" | "iso8859-1" | "iso_8859_1" => Some(Self::Iso8859_1),
            "cp1252" | "windows-1252" | "win1252" => Some(Self::Cp1252),
            "utf-8-sig" | "utf8-sig" | "utf-8-bom" => Some(Self::Utf8Sig),
            "utf-8" | "utf8" => Some(Self::Utf8),
            _ => None,
        }
    }

    /// Strict decode: `None` if the bytes are not valid in this encoding
    pub fn decode(&self, bytes: &[u8]) -> Option<String> {
        match self {
            Self::Latin1 | Self::Iso8859_1 => Some(bytes.iter().map(|&b| b as char).collect()),
            Self::Cp1252 => {
                if bytes.iter().any(|b| CP1252_UNDEFINED.contains(b)) {
                    return None;
                }
                encoding_rs::WINDOWS_1252
                    .decode_without_bom_handling_and_without_replacement(bytes)
                    .map(|s| s.into_owned())
            }
            Self::Utf8Sig => {
                let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
                std::str::from_utf8(body).ok().map(str::to_owned)
            }
            Self::Utf8 => encoding_rs::UTF_8
                .decode_without_bom_handling_and_without_replacement(bytes)
                .map(|s| s.into_owned()),
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Decode with the first candidate that accepts the bytes.
/// On failure returns the labels that were attempted, in order.
pub fn decode_text(bytes: &[u8], candidates: &[TextEncoding]) -> Result<(String, TextEncoding), Vec<&'static str>> {
    for &encoding in candidates {
        match encoding.decode(bytes) {
            Some(text) => return Ok((text, encoding)),
            None => log::debug!("input is not valid {}", encoding),
        }
    }
    Err(candidates.iter().map(|e| e.label()).collect())
}
