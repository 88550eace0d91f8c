//! Target intake
//!
//! Reads the local target list and reconciles it against the scanner's
//! registered targets, producing the address -> identifier map the admission
//! controller works from.

pub mod reconciler;
pub mod source;

pub use reconciler::{Reconciliation, TargetReconciler};
pub use source::{load_targets, parse_targets, TargetSourceError};
