//! Notification System API
//!
//! Public interface for run status events and the sinks that receive them.

pub use crate::notifications::event::{EventSeverity, RunEvent};
pub use crate::notifications::sink::{EventSink, LogSink, MemorySink};
