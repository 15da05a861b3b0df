// Calorie model error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Calorie model error code constants
///
/// Error code range: 2001-2004
pub struct ModelErrorCodes {}

impl ModelErrorCodes {
    /// Feature row carries a category the model was never fitted on
    pub const MISSING_CATEGORY: i32 = 2001;

    /// Feature row does not match the model's expected shape
    pub const SHAPE_MISMATCH: i32 = 2002;

    /// Model produced NaN or infinity
    pub const NON_FINITE_PREDICTION: i32 = 2003;

    /// Model artifact could not be read or parsed
    pub const ARTIFACT_LOAD: i32 = 2004;
}

/// Log a model error with structured context
pub fn log_model_error(err: &ModelError, context: &str) {
    error!(
        "Model error in {}: code={}, component=CalorieEstimator, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Errors raised by a calorie regression model's inference interface
///
/// Error code ranges: 2001-2004
#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    /// The exercise category is unknown to the model
    MissingCategory { category: String },

    /// The feature row has the wrong number or kind of columns
    ShapeMismatch { expected: usize, got: usize },

    /// The model returned NaN or infinity
    NonFinitePrediction { value: f64 },

    /// The model artifact could not be loaded
    ArtifactLoad { reason: String },
}

impl ErrorCode for ModelError {
    fn code(&self) -> i32 {
        match self {
            ModelError::MissingCategory { .. } => ModelErrorCodes::MISSING_CATEGORY,
            ModelError::ShapeMismatch { .. } => ModelErrorCodes::SHAPE_MISMATCH,
            ModelError::NonFinitePrediction { .. } => ModelErrorCodes::NON_FINITE_PREDICTION,
            ModelError::ArtifactLoad { .. } => ModelErrorCodes::ARTIFACT_LOAD,
        }
    }

    fn message(&self) -> String {
        match self {
            ModelError::MissingCategory { category } => {
                format!("Model has no coefficients for category '{}'", category)
            }
            ModelError::ShapeMismatch { expected, got } => {
                format!("Feature shape mismatch: expected {}, got {}", expected, got)
            }
            ModelError::NonFinitePrediction { value } => {
                format!("Model produced a non-finite prediction ({})", value)
            }
            ModelError::ArtifactLoad { reason } => {
                format!("Failed to load model artifact: {}", reason)
            }
        }
    }
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ModelError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for ModelError {}

impl From<std::io::Error> for ModelError {
    fn from(err: std::io::Error) -> Self {
        ModelError::ArtifactLoad {
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for ModelError {
    fn from(err: serde_json::Error) -> Self {
        ModelError::ArtifactLoad {
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_error_codes() {
        assert_eq!(
            ModelError::MissingCategory {
                category: "squat".to_string()
            }
            .code(),
            ModelErrorCodes::MISSING_CATEGORY
        );
        assert_eq!(
            ModelError::ShapeMismatch {
                expected: 5,
                got: 4
            }
            .code(),
            ModelErrorCodes::SHAPE_MISMATCH
        );
        assert_eq!(
            ModelError::NonFinitePrediction { value: f64::NAN }.code(),
            ModelErrorCodes::NON_FINITE_PREDICTION
        );
        assert_eq!(
            ModelError::ArtifactLoad {
                reason: "test".to_string()
            }
            .code(),
            ModelErrorCodes::ARTIFACT_LOAD
        );
    }

    #[test]
    fn test_model_error_messages() {
        let err = ModelError::MissingCategory {
            category: "squat".to_string(),
        };
        assert_eq!(err.message(), "Model has no coefficients for category 'squat'");

        let err = ModelError::ShapeMismatch {
            expected: 5,
            got: 4,
        };
        assert!(err.message().contains("expected 5"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err: ModelError = io_err.into();

        match err {
            ModelError::ArtifactLoad { reason } => assert!(reason.contains("no such file")),
            _ => panic!("Expected ArtifactLoad variant"),
        }
    }
}
