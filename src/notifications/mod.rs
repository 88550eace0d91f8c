//! Run status notifications
//!
//! Components report progress as [`RunEvent`](api::RunEvent)s to an
//! [`EventSink`](api::EventSink); presentation is the sink's business.

// Internal modules - all access should go through api module
pub(crate) mod event;
pub(crate) mod sink;

// Public API module - the only public interface for the notification system
pub mod api;
