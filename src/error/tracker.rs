// Frame processing error types and constants

use crate::error::{ErrorCode, ModelError};
use log::error;
use std::fmt;

/// Tracker error code constants
///
/// Error code range: 1001-1004
pub struct TrackerErrorCodes {}

impl TrackerErrorCodes {
    /// Request payload could not be decoded into a frame
    pub const INPUT_DECODING: i32 = 1001;

    /// Exercise name is not one of the supported kinds
    pub const UNKNOWN_EXERCISE: i32 = 1002;

    /// Calorie model rejected the feature row
    pub const MODEL_INFERENCE: i32 = 1003;

    /// Session store lock was poisoned
    pub const LOCK_POISONED: i32 = 1004;
}

/// Log a tracker error with structured context
///
/// Logs the numeric code, component and message at `error` level.
pub fn log_tracker_error(err: &TrackerError, context: &str) {
    error!(
        "Tracker error in {}: code={}, component=FrameProcessor, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Errors surfaced by the frame processing pipeline
///
/// Absence of landmarks is not an error; it is handled as a normal frame.
///
/// Error code ranges: 1001-1004
#[derive(Debug, Clone, PartialEq)]
pub enum TrackerError {
    /// Malformed or undecodable frame payload
    InputDecoding { reason: String },

    /// Exercise value outside the supported set
    UnknownExercise { name: String },

    /// The calorie model failed on the constructed feature row
    ModelInference(ModelError),

    /// Mutex/RwLock was poisoned
    LockPoisoned { component: String },
}

impl TrackerError {
    pub fn decoding(reason: impl Into<String>) -> Self {
        TrackerError::InputDecoding {
            reason: reason.into(),
        }
    }

    /// Whether the failure was caused by the caller's input
    pub fn is_client_error(&self) -> bool {
        !matches!(self, TrackerError::LockPoisoned { .. })
    }
}

impl ErrorCode for TrackerError {
    fn code(&self) -> i32 {
        match self {
            TrackerError::InputDecoding { .. } => TrackerErrorCodes::INPUT_DECODING,
            TrackerError::UnknownExercise { .. } => TrackerErrorCodes::UNKNOWN_EXERCISE,
            TrackerError::ModelInference(_) => TrackerErrorCodes::MODEL_INFERENCE,
            TrackerError::LockPoisoned { .. } => TrackerErrorCodes::LOCK_POISONED,
        }
    }

    fn message(&self) -> String {
        match self {
            TrackerError::InputDecoding { reason } => format!("Invalid frame input: {}", reason),
            TrackerError::UnknownExercise { name } => format!(
                "Unknown exercise '{}' (expected bicep_curl or lateral_raise)",
                name
            ),
            TrackerError::ModelInference(inner) => {
                format!("Calorie estimation failed: {}", inner.message())
            }
            TrackerError::LockPoisoned { component } => {
                format!("Lock poisoned for component: {}", component)
            }
        }
    }
}

impl fmt::Display for TrackerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TrackerError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for TrackerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TrackerError::ModelInference(inner) => Some(inner),
            _ => None,
        }
    }
}

impl From<ModelError> for TrackerError {
    fn from(err: ModelError) -> Self {
        TrackerError::ModelInference(err)
    }
}
