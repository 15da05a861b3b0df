// ExerciseLinearModel - per-exercise linear calorie regression
//
// kcal = intercept + age*c_age + weight*c_weight + gender*c_gender + reps*c_reps
//
// One coefficient set per exercise label. The built-in defaults match the
// synthetic training data:
//   reps*0.3*factor + weight*0.08 - age*0.05 + gender*2
// with factor 1.05 for curls and 0.9 for raises.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{CalorieModel, FeatureRow};
use crate::analysis::ExerciseKind;
use crate::error::ModelError;

/// Regression coefficients for one exercise
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExerciseCoefficients {
    #[serde(default)]
    pub intercept: f64,
    pub age: f64,
    pub weight: f64,
    pub gender: f64,
    pub reps: f64,
}

impl ExerciseCoefficients {
    fn apply(&self, row: &FeatureRow) -> f64 {
        self.intercept
            + row.age * self.age
            + row.weight * self.weight
            + row.gender * self.gender
            + row.reps * self.reps
    }
}

/// Calorie model artifact keyed by exercise label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseLinearModel {
    exercises: BTreeMap<String, ExerciseCoefficients>,
}

impl ExerciseLinearModel {
    pub fn new(exercises: BTreeMap<String, ExerciseCoefficients>) -> Self {
        Self { exercises }
    }

    /// Load a model artifact from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ModelError> {
        let contents = fs::read_to_string(&path)?;
        let model: Self = serde_json::from_str(&contents)?;
        if model.exercises.is_empty() {
            return Err(ModelError::ArtifactLoad {
                reason: "artifact defines no exercises".to_string(),
            });
        }
        log::info!(
            "[CalorieModel] Loaded {} exercise(s) from {:?}",
            model.exercises.len(),
            path.as_ref()
        );
        Ok(model)
    }

    pub fn coefficients(&self, exercise: &str) -> Option<&ExerciseCoefficients> {
        self.exercises.get(exercise)
    }
}

impl Default for ExerciseLinearModel {
    fn default() -> Self {
        let base = |exercise_factor: f64| ExerciseCoefficients {
            intercept: 0.0,
            age: -0.05,
            weight: 0.08,
            gender: 2.0,
            reps: 0.3 * exercise_factor,
        };

        let mut exercises = BTreeMap::new();
        exercises.insert(ExerciseKind::BicepCurl.as_str().to_string(), base(1.05));
        exercises.insert(ExerciseKind::LateralRaise.as_str().to_string(), base(0.9));
        Self { exercises }
    }
}

impl CalorieModel for ExerciseLinearModel {
    fn predict(&self, row: &FeatureRow) -> Result<f64, ModelError> {
        let coefficients =
            self.exercises
                .get(&row.exercise)
                .ok_or_else(|| ModelError::MissingCategory {
                    category: row.exercise.clone(),
                })?;
        Ok(coefficients.apply(row))
    }
}
