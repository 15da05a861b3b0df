// Error types for the rep tracker
//
// Each domain gets its own enum with numeric codes so HTTP and CLI callers
// can report failures uniformly.

mod model;
mod tracker;

pub use model::{log_model_error, ModelError, ModelErrorCodes};
pub use tracker::{log_tracker_error, TrackerError, TrackerErrorCodes};

/// Error codes for structured error reporting
///
/// Provides a standard way to get error codes and messages from the
/// crate's error types, so every surface reports failures the same way.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}
