//! CLI Exit Code Registry
//!
//! Single source of truth for `concorso` exit codes. Scripts rely on them.
//!
//! | Code | Meaning                                          |
//! |------|--------------------------------------------------|
//! | 0    | Success                                          |
//! | 1    | General error (unspecified)                      |
//! | 2    | Usage error (bad args, unreadable input file)    |
//! | 3    | Input or snapshot could not be decoded           |
//! | 4    | Required column missing                          |
//! | 5    | Partial export: some classes failed to serialize |
//! | 6    | Output directory could not be written            |
//! | 7    | Settings file could not be loaded                |

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing or unreadable input file.
pub const EXIT_USAGE: u8 = 2;

/// No candidate encoding accepted the bytes, or the table was malformed.
pub const EXIT_DECODE: u8 = 3;

/// The `Classe` column is absent from the input.
pub const EXIT_MISSING_COLUMN: u8 = 4;

/// At least one class failed to export. The others were still produced.
pub const EXIT_PARTIAL: u8 = 5;

/// Writing an output file or building the archive failed.
pub const EXIT_WRITE: u8 = 6;

/// An explicit `--config` file was unreadable or invalid, or a setting
/// value was rejected.
pub const EXIT_CONFIG: u8 = 7;
