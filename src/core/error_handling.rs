//! Shared error reporting
//!
//! Errors that stop a run are logged through [`log_error_with_context`], which
//! decides between the error's own message and a generic context line.

/// Errors that know whether the user can act on them
///
/// When `is_user_actionable()` returns `true`, `user_message()` must return
/// `Some(message)`; otherwise it returns `None`.
pub trait ContextualError: std::error::Error {
    /// True for configuration mistakes and similar problems the user can fix
    fn is_user_actionable(&self) -> bool;

    /// The message to show the user when the error is actionable
    fn user_message(&self) -> Option<&str>;
}

/// Log a fatal error with the detail level its kind deserves
///
/// User-actionable errors print their own message. System errors print the
/// operation context, with the underlying error at debug level only.
pub fn log_error_with_context<E: ContextualError + std::fmt::Display + std::fmt::Debug>(
    error: &E,
    operation_context: &str,
) {
    let headline = fatal_headline(error, operation_context);
    log::error!("{}", headline);
    log::debug!("DETAIL: {}", error);
    log::debug!("DEBUG_DETAILS: {:?}", error);
}

/// Build the primary `FATAL:` line for an error
pub fn fatal_headline<E: ContextualError>(error: &E, operation_context: &str) -> String {
    match error.user_message() {
        Some(user_msg) if error.is_user_actionable() => format!("FATAL: {}", user_msg),
        _ => format!("FATAL: {}", operation_context),
    }
}
