//! `concorso-recon`: incremental reconciliation against a prior snapshot.
//!
//! Pure engine crate: receives two decoded tables, returns the records of the
//! current one whose identifier the snapshot has never seen.
//! No CLI or IO dependencies.

pub mod error;
pub mod snapshot;

pub use error::ReconError;
pub use snapshot::{identifier_set, reconcile, Reconciliation, ID_COLUMN};
