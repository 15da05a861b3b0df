// Analysis Module
//
// Turns a frame's landmarks into a joint angle and drives the per-exercise
// repetition state machine with it.

pub mod angle;
pub mod rep_counter;

pub use angle::joint_angle;
pub use rep_counter::{advance, ExerciseKind, RepThresholds, Stage, Transition};
