// Class code extraction: "Matematica (A-01)" -> "A-01"

use std::sync::OnceLock;

use regex::Regex;

use crate::table::Value;

/// Column holding the free-text class label
pub const CLASS_COLUMN: &str = "Classe";

fn code_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        // Single uppercase letter, dash, one or more digits, in parentheses
        Regex::new(r"\(([A-Z]-\d+)\)").expect("class code pattern is valid")
    })
}

/// Extract the class code from a label.
///
/// Returns the first `(X-NN)` group's inner text, or the label unchanged when
/// no such group exists.
pub fn extract_class_code(label: &str) -> String {
    match code_pattern().captures(label).and_then(|caps| caps.get(1)) {
        Some(m) => m.as_str().to_string(),
        None => label.to_string(),
    }
}

/// Class code for a cell value (non-text values use their display form)
pub fn class_code_of(value: &Value) -> String {
    match value {
        Value::Text(s) => extract_class_code(s),
        other => extract_class_code(&other.display()),
    }
}

/// Human-readable part of a label: everything before the first `(`, trimmed
pub fn class_label(label: &str) -> &str {
    label.split('(').next().unwrap_or(label).trim()
}
