//! Calorie estimation from a user profile and the accumulated rep count.
//!
//! The estimator only depends on the [`CalorieModel`] capability, so any
//! trained regressor (or a test stub) can be injected.

mod linear;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::analysis::ExerciseKind;
use crate::error::{log_model_error, ModelError};

pub use linear::{ExerciseCoefficients, ExerciseLinearModel};

/// Recorded gender, encoded as 0/1 on the wire and in the feature row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Gender {
    Female,
    Male,
}

impl Gender {
    pub fn as_feature(self) -> f64 {
        match self {
            Gender::Female => 0.0,
            Gender::Male => 1.0,
        }
    }
}

impl TryFrom<u8> for Gender {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Gender::Female),
            1 => Ok(Gender::Male),
            other => Err(format!("gender must be 0 or 1 (got {})", other)),
        }
    }
}

impl From<Gender> for u8 {
    fn from(gender: Gender) -> Self {
        match gender {
            Gender::Female => 0,
            Gender::Male => 1,
        }
    }
}

/// Per-request user details fed to the model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserProfile {
    pub age: u32,
    pub weight: f64,
    pub gender: Gender,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            age: 25,
            weight: 70.0,
            gender: Gender::Male,
        }
    }
}

/// Single-row feature vector `{age, weight, gender, reps, exercise}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureRow {
    pub age: f64,
    pub weight: f64,
    pub gender: f64,
    pub reps: f64,
    pub exercise: String,
}

impl FeatureRow {
    pub fn new(profile: &UserProfile, exercise: ExerciseKind, reps: u32) -> Self {
        Self {
            age: f64::from(profile.age),
            weight: profile.weight,
            gender: profile.gender.as_feature(),
            reps: f64::from(reps),
            exercise: exercise.as_str().to_string(),
        }
    }
}

/// Inference interface of a trained calorie regressor
pub trait CalorieModel: Send + Sync {
    fn predict(&self, row: &FeatureRow) -> Result<f64, ModelError>;
}

/// Adapts profile + rep count into a model call
#[derive(Clone)]
pub struct CalorieEstimator {
    model: Arc<dyn CalorieModel>,
}

impl CalorieEstimator {
    pub fn new(model: Arc<dyn CalorieModel>) -> Self {
        Self { model }
    }

    /// Estimated calories for `reps` repetitions.
    ///
    /// Zero reps short-circuit to `0.0` without touching the model. Negative
    /// predictions are clamped to zero; non-finite ones are an error.
    pub fn estimate(
        &self,
        profile: &UserProfile,
        exercise: ExerciseKind,
        reps: u32,
    ) -> Result<f64, ModelError> {
        if reps == 0 {
            return Ok(0.0);
        }

        let row = FeatureRow::new(profile, exercise, reps);
        let prediction = self.model.predict(&row).inspect_err(|err| {
            log_model_error(err, "estimate");
        })?;

        if !prediction.is_finite() {
            let err = ModelError::NonFinitePrediction { value: prediction };
            log_model_error(&err, "estimate");
            return Err(err);
        }

        Ok(prediction.max(0.0))
    }
}
