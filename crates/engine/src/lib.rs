//! `concorso-engine`: enrollment table model and the pure grouping stages.
//!
//! Receives decoded tables, returns class codes, projections and partitions.
//! No IO dependencies.

pub mod class_code;
pub mod error;
pub mod partition;
pub mod projection;
pub mod table;

pub use class_code::{class_code_of, class_label, extract_class_code, CLASS_COLUMN};
pub use error::EngineError;
pub use partition::{partition, summarize, ClassSummary, Partition};
pub use projection::{project, Projection};
pub use table::{normalize_headers, Table, Value};
