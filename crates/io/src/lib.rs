// File I/O operations: decoding uploads, per-class xlsx export, zip bundles

pub mod archive;
pub mod csv;
pub mod decode;
pub mod encoding;
pub mod export;
pub mod pipeline;
pub mod xlsx;

pub use archive::Archive;
pub use decode::{decode, DecodeError, DecodeOptions, Decoded, SourceFormat};
pub use encoding::{TextEncoding, DEFAULT_ENCODINGS};
pub use export::{write_outputs, ExportError, ExportUnit, BLANK_CLASS_STEM, DEFAULT_OUTPUT_DIR};
pub use pipeline::{inspect, run, InputFile, Inspection, PipelineError, ReconciliationOutcome, RunConfig, RunOutput, RunSummary};
