use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconError {
    /// Identifier column absent from one side.
    /// `table` is "current" or "snapshot".
    MissingColumn { table: &'static str, column: String },
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingColumn { table, column } => {
                write!(f, "{table} table: missing identifier column '{column}'")
            }
        }
    }
}

impl std::error::Error for ReconError {}
