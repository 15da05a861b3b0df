// RepCounter - per-exercise repetition state machine
//
// Each exercise maps its "extended" and "contracted" arm postures to two
// disjoint joint-angle ranges. A rep is credited only on the Down -> Up edge:
//
//   BicepCurl    (angle at elbow):     angle > down  => Down,  Down && angle < up => Up
//   LateralRaise (angle at shoulder):  angle < down  => Down,  Down && angle > up => Up
//
// The Down condition is checked first on every frame, even while in Up, so
// the limb must return to the start posture before another rep can count.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TrackerError;
use crate::pose::{ArmSide, Joint};

/// Supported exercises
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseKind {
    BicepCurl,
    LateralRaise,
}

impl ExerciseKind {
    pub const ALL: [ExerciseKind; 2] = [ExerciseKind::BicepCurl, ExerciseKind::LateralRaise];

    /// Wire name, also used as the calorie model's category label
    pub fn as_str(self) -> &'static str {
        match self {
            ExerciseKind::BicepCurl => "bicep_curl",
            ExerciseKind::LateralRaise => "lateral_raise",
        }
    }

    /// Joints feeding the angle, in `(a, vertex, c)` order.
    pub fn angle_joints(self, side: ArmSide) -> (Joint, Joint, Joint) {
        match self {
            ExerciseKind::BicepCurl => (side.shoulder(), side.elbow(), side.wrist()),
            ExerciseKind::LateralRaise => (side.elbow(), side.shoulder(), side.hip()),
        }
    }

    /// Default thresholds for this exercise.
    pub fn default_thresholds(self) -> RepThresholds {
        match self {
            ExerciseKind::BicepCurl => RepThresholds {
                down: 150.0,
                up: 40.0,
            },
            ExerciseKind::LateralRaise => RepThresholds {
                down: 40.0,
                up: 75.0,
            },
        }
    }

    fn is_down(self, thresholds: &RepThresholds, angle: f64) -> bool {
        match self {
            ExerciseKind::BicepCurl => angle > thresholds.down,
            ExerciseKind::LateralRaise => angle < thresholds.down,
        }
    }

    fn is_up(self, thresholds: &RepThresholds, angle: f64) -> bool {
        match self {
            ExerciseKind::BicepCurl => angle < thresholds.up,
            ExerciseKind::LateralRaise => angle > thresholds.up,
        }
    }
}

impl fmt::Display for ExerciseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExerciseKind {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bicep_curl" => Ok(ExerciseKind::BicepCurl),
            "lateral_raise" => Ok(ExerciseKind::LateralRaise),
            other => Err(TrackerError::UnknownExercise {
                name: other.to_string(),
            }),
        }
    }
}

/// Phase of the repetition cycle. `None` (no stage yet) is `Option::None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Starting / extended posture
    Down,
    /// Completed / contracted posture
    Up,
}

/// Angle thresholds (degrees) for one exercise
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RepThresholds {
    /// Crossing this re-arms the counter (stage becomes Down)
    pub down: f64,
    /// Crossing this from Down completes a rep
    pub up: f64,
}

impl RepThresholds {
    /// Whether the Down and Up ranges are disjoint for `kind`.
    pub fn is_valid_for(&self, kind: ExerciseKind) -> bool {
        if !self.down.is_finite() || !self.up.is_finite() {
            return false;
        }
        match kind {
            ExerciseKind::BicepCurl => self.down > self.up,
            ExerciseKind::LateralRaise => self.down < self.up,
        }
    }
}

/// Outcome of feeding one angle to the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub stage: Option<Stage>,
    pub rep_completed: bool,
}

/// Advance the state machine by one angle sample.
pub fn advance(
    kind: ExerciseKind,
    thresholds: &RepThresholds,
    angle: f64,
    stage: Option<Stage>,
) -> Transition {
    if kind.is_down(thresholds, angle) {
        Transition {
            stage: Some(Stage::Down),
            rep_completed: false,
        }
    } else if stage == Some(Stage::Down) && kind.is_up(thresholds, angle) {
        Transition {
            stage: Some(Stage::Up),
            rep_completed: true,
        }
    } else {
        Transition {
            stage,
            rep_completed: false,
        }
    }
}
