//! Scan scheduling
//!
//! Paces scan submission against the scanner's own concurrency ceiling. The
//! live running count is polled on every tick, including scans started by
//! other clients.

pub mod admission;

pub use admission::{AdmissionReport, ScanAdmissionController, TickOutcome};
