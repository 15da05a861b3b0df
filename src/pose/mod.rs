//! Pose landmarks as produced by an external pose estimator.
//!
//! The estimator itself is not part of this crate; frames arrive as a list of
//! named joints in normalized image coordinates.

use serde::{Deserialize, Serialize};

/// Body joints the rep counter knows how to use.
///
/// Any other joint name reported by the estimator deserializes to `Other`
/// and is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Joint {
    LeftShoulder,
    LeftElbow,
    LeftWrist,
    LeftHip,
    RightShoulder,
    RightElbow,
    RightWrist,
    RightHip,
    #[serde(other)]
    Other,
}

/// Which arm feeds the joint angle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArmSide {
    #[default]
    Left,
    Right,
}

impl ArmSide {
    pub fn shoulder(self) -> Joint {
        match self {
            ArmSide::Left => Joint::LeftShoulder,
            ArmSide::Right => Joint::RightShoulder,
        }
    }

    pub fn elbow(self) -> Joint {
        match self {
            ArmSide::Left => Joint::LeftElbow,
            ArmSide::Right => Joint::RightElbow,
        }
    }

    pub fn wrist(self) -> Joint {
        match self {
            ArmSide::Left => Joint::LeftWrist,
            ArmSide::Right => Joint::RightWrist,
        }
    }

    pub fn hip(self) -> Joint {
        match self {
            ArmSide::Left => Joint::LeftHip,
            ArmSide::Right => Joint::RightHip,
        }
    }
}

/// A single 2D landmark (normalized coordinates)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64, // 0-1 normalized
    pub y: f64, // 0-1 normalized
    #[serde(default)]
    pub visibility: f64,
}

impl Landmark {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            visibility: 1.0,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Landmark tagged with the joint it belongs to, as sent over the wire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NamedLandmark {
    pub name: Joint,
    #[serde(flatten)]
    pub point: Landmark,
}

/// All landmarks detected in one frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PoseLandmarks {
    points: Vec<NamedLandmark>,
}

impl PoseLandmarks {
    pub fn new(points: Vec<NamedLandmark>) -> Self {
        Self { points }
    }

    /// Build from `(joint, x, y)` triples with full visibility.
    pub fn from_points(points: &[(Joint, f64, f64)]) -> Self {
        Self::new(
            points
                .iter()
                .map(|&(name, x, y)| NamedLandmark {
                    name,
                    point: Landmark::new(x, y),
                })
                .collect(),
        )
    }

    /// Last reported landmark for `joint`, if any.
    pub fn get(&self, joint: Joint) -> Option<Landmark> {
        if joint == Joint::Other {
            return None;
        }
        self.points
            .iter()
            .rev()
            .find(|landmark| landmark.name == joint)
            .map(|landmark| landmark.point)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
