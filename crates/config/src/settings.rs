// Export settings
// Loaded from ~/.config/concorso/settings.json (or an explicit --config file)

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Where and how exports are produced
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Directory receiving the generated files
    pub dir: PathBuf,

    /// Append a YYYYMMDD_HHMMSS suffix to every file name
    pub timestamp: bool,

    /// Also produce a zip bundle when more than one file is generated
    pub zip: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("file_classi_concorso"),
            timestamp: false,
            zip: false,
        }
    }
}

/// Delimited text decoding
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct InputSettings {
    /// Encoding labels tried in order
    pub encodings: Vec<String>,

    /// Fixed delimiter; inferred from content when unset
    pub delimiter: Option<char>,
}

impl Default for InputSettings {
    fn default() -> Self {
        Self {
            encodings: ["latin1", "iso-8859-1", "cp1252", "utf-8-sig", "utf-8"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            delimiter: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ColumnSettings {
    /// Columns to export; empty = all
    pub selected: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub output: OutputSettings,
    pub input: InputSettings,
    pub columns: ColumnSettings,
}

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("concorso");
        config_dir.join("settings.json")
    }

    /// Load the user settings file, falling back to defaults when it is
    /// missing or unreadable
    pub fn load() -> Self {
        let path = Self::config_path();
        if !path.exists() {
            return Self::default();
        }

        match Self::load_from(&path) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("{}; using default settings", e);
                Self::default()
            }
        }
    }

    /// Load an explicit settings file. `.toml` files are parsed as TOML,
    /// anything else as JSON with `//` comment lines allowed.
    pub fn load_from(path: &Path) -> Result<Self, String> {
        let contents = fs::read_to_string(path)
            .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;

        let is_toml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("toml"))
            .unwrap_or(false);

        if is_toml {
            toml::from_str(&contents).map_err(|e| format!("cannot parse {}: {}", path.display(), e))
        } else {
            Self::from_json(&contents).map_err(|e| format!("cannot parse {}: {}", path.display(), e))
        }
    }

    /// Parse JSON settings, ignoring lines starting with `//`
    pub fn from_json(contents: &str) -> Result<Self, serde_json::Error> {
        let cleaned: String = contents
            .lines()
            .filter(|line| !line.trim().starts_with("//"))
            .collect::<Vec<_>>()
            .join("\n");
        serde_json::from_str(&cleaned)
    }

    /// Column selection, `None` when every column is exported
    pub fn selected_columns(&self) -> Option<Vec<String>> {
        if self.columns.selected.is_empty() {
            None
        } else {
            Some(self.columns.selected.clone())
        }
    }
}
