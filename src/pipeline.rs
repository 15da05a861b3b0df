//! FrameProcessor: per-frame orchestration of the rep tracking core.
//!
//! For every frame: pick the exercise's three joints, compute the joint
//! angle, advance the session's state machine under its lock, then estimate
//! calories from the post-transition rep count.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;

use crate::analysis::{advance, joint_angle, ExerciseKind, Stage};
use crate::calories::{CalorieEstimator, CalorieModel, ExerciseLinearModel, UserProfile};
use crate::config::{AppConfig, TrackingConfig};
use crate::error::{log_model_error, log_tracker_error, ErrorCode, ModelError, TrackerError};
use crate::pose::{Joint, Landmark, PoseLandmarks};
use crate::session::{SessionState, SessionStore};
use crate::telemetry::{self, TelemetryHub};

/// One frame's worth of input for a session
#[derive(Debug, Clone)]
pub struct FrameInput {
    pub session_id: String,
    pub exercise: ExerciseKind,
    pub profile: UserProfile,
    /// `None` (or an empty list) when the pose estimator detected nobody
    pub landmarks: Option<PoseLandmarks>,
}

/// Session state after a frame plus the calorie estimate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameResult {
    pub reps: u32,
    pub stage: Option<Stage>,
    pub calories: f64,
    /// Joint angle for this frame, absent when no landmarks were detected
    pub angle: Option<f64>,
    pub rep_completed: bool,
}

/// Orchestrates angle computation, rep counting and calorie estimation
pub struct FrameProcessor {
    tracking: TrackingConfig,
    sessions: SessionStore,
    estimator: CalorieEstimator,
    telemetry: Arc<TelemetryHub>,
}

impl FrameInput {
    /// Landmarks for this frame, treating an empty list as no detection
    pub fn detected_landmarks(&self) -> Option<&PoseLandmarks> {
        self.landmarks.as_ref().filter(|landmarks| !landmarks.is_empty())
    }
}

impl FrameProcessor {
    pub fn new(tracking: TrackingConfig, model: Arc<dyn CalorieModel>) -> Self {
        Self {
            tracking,
            sessions: SessionStore::new(),
            estimator: CalorieEstimator::new(model),
            telemetry: telemetry::hub(),
        }
    }

    /// Build from application config, loading the model artifact if one is set.
    pub fn from_config(config: &AppConfig) -> Result<Self, ModelError> {
        let model = match &config.calories.model_path {
            Some(path) => ExerciseLinearModel::load_from_file(path).inspect_err(|err| {
                log_model_error(err, "from_config");
            })?,
            None => {
                log::info!("[FrameProcessor] No model artifact configured; using built-in coefficients");
                ExerciseLinearModel::default()
            }
        };
        Ok(Self::new(config.tracking.clone(), Arc::new(model)))
    }

    /// Use a dedicated telemetry hub instead of the process-wide one
    pub fn with_telemetry(mut self, telemetry: Arc<TelemetryHub>) -> Self {
        self.telemetry = telemetry;
        self
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn telemetry(&self) -> &Arc<TelemetryHub> {
        &self.telemetry
    }

    /// Process one frame for `input.session_id`.
    ///
    /// A model failure is returned as an error, but the rep transition made
    /// for this frame stays applied.
    pub fn process(&self, input: &FrameInput) -> Result<FrameResult, TrackerError> {
        let started = Instant::now();
        let result = self.process_inner(input);
        self.telemetry
            .record_frame(input.detected_landmarks().is_some(), started.elapsed());

        if let Err(err) = &result {
            log_tracker_error(err, "process_frame");
            self.telemetry
                .record_error(err.code(), format!("process_frame:{}", input.session_id));
        }
        result
    }

    /// Reset a session's counter. Unknown sessions are accepted silently.
    pub fn reset(&self, session_id: &str) -> Result<(), TrackerError> {
        let known = self.sessions.reset(session_id)?;
        self.telemetry.record_reset(session_id, known);
        Ok(())
    }

    /// Current state of a session without creating it
    pub fn session_state(&self, session_id: &str) -> Result<Option<SessionState>, TrackerError> {
        self.sessions.snapshot(session_id)
    }

    fn process_inner(&self, input: &FrameInput) -> Result<FrameResult, TrackerError> {
        // Invalid frames must not create or mutate a session.
        let angle = match input.detected_landmarks() {
            Some(landmarks) => Some(self.angle_for(input.exercise, landmarks)?),
            None => None,
        };

        let handle = self.sessions.get_or_create(&input.session_id)?;
        let (state, rep_completed, stage_changed) = {
            let mut state = handle.lock()?;
            match angle {
                Some(angle) => {
                    let thresholds = self.tracking.thresholds(input.exercise);
                    let previous = state.stage;
                    let transition = advance(input.exercise, thresholds, angle, previous);
                    state.apply(transition);
                    (
                        *state,
                        transition.rep_completed,
                        previous != transition.stage,
                    )
                }
                None => (*state, false, false),
            }
        };

        let _span = tracing::debug_span!(
            "frame",
            session = %input.session_id,
            exercise = %input.exercise
        )
        .entered();
        match angle {
            Some(angle) => tracing::debug!(angle, reps = state.reps, stage = ?state.stage, "frame processed"),
            None => tracing::debug!(reps = state.reps, "no landmarks detected"),
        }

        if stage_changed {
            self.telemetry.record_stage(&input.session_id, state.stage);
        }
        if rep_completed {
            log::info!(
                "[FrameProcessor] Session '{}' completed {} rep #{}",
                input.session_id,
                input.exercise,
                state.reps
            );
            self.telemetry
                .record_rep(&input.session_id, input.exercise, state.reps);
        }

        let calories = self
            .estimator
            .estimate(&input.profile, input.exercise, state.reps)?;

        Ok(FrameResult {
            reps: state.reps,
            stage: state.stage,
            calories,
            angle,
            rep_completed,
        })
    }

    fn angle_for(
        &self,
        exercise: ExerciseKind,
        landmarks: &PoseLandmarks,
    ) -> Result<f64, TrackerError> {
        let (a, vertex, c) = exercise.angle_joints(self.tracking.arm_side);
        Ok(joint_angle(
            required(landmarks, a)?,
            required(landmarks, vertex)?,
            required(landmarks, c)?,
        ))
    }
}

fn required(landmarks: &PoseLandmarks, joint: Joint) -> Result<Landmark, TrackerError> {
    let landmark = landmarks
        .get(joint)
        .ok_or_else(|| TrackerError::decoding(format!("missing landmark {:?}", joint)))?;
    if !landmark.is_finite() {
        return Err(TrackerError::decoding(format!(
            "non-finite coordinates for landmark {:?}",
            joint
        )));
    }
    Ok(landmark)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calories::{FeatureRow, Gender};
    use crate::telemetry::MetricEvent;

    struct PerRepModel;

    impl CalorieModel for PerRepModel {
        fn predict(&self, row: &FeatureRow) -> Result<f64, ModelError> {
            Ok(row.reps * 0.5)
        }
    }

    struct BrokenModel;

    impl CalorieModel for BrokenModel {
        fn predict(&self, _row: &FeatureRow) -> Result<f64, ModelError> {
            Err(ModelError::ShapeMismatch {
                expected: 5,
                got: 4,
            })
        }
    }

    fn processor(model: Arc<dyn CalorieModel>) -> FrameProcessor {
        FrameProcessor::new(TrackingConfig::default(), model)
            .with_telemetry(Arc::new(TelemetryHub::new(16, 32, 8)))
    }

    /// Left arm pose whose elbow angle `angle(shoulder, elbow, wrist)` equals `degrees`.
    fn curl_pose(degrees: f64) -> PoseLandmarks {
        let (sin, cos) = degrees.to_radians().sin_cos();
        PoseLandmarks::from_points(&[
            (Joint::LeftShoulder, 1.0, 0.0),
            (Joint::LeftElbow, 0.0, 0.0),
            (Joint::LeftWrist, cos, sin),
            (Joint::LeftHip, 0.0, 1.0),
        ])
    }

    /// Left arm pose whose shoulder angle `angle(elbow, shoulder, hip)` equals `degrees`.
    fn raise_pose(degrees: f64) -> PoseLandmarks {
        let (sin, cos) = degrees.to_radians().sin_cos();
        PoseLandmarks::from_points(&[
            (Joint::LeftElbow, 1.0, 0.0),
            (Joint::LeftShoulder, 0.0, 0.0),
            (Joint::LeftHip, cos, sin),
            (Joint::LeftWrist, 2.0, 0.0),
        ])
    }

    fn frame(session: &str, exercise: ExerciseKind, landmarks: Option<PoseLandmarks>) -> FrameInput {
        FrameInput {
            session_id: session.to_string(),
            exercise,
            profile: UserProfile {
                age: 25,
                weight: 70.0,
                gender: Gender::Male,
            },
            landmarks,
        }
    }

    #[test]
    fn bicep_curl_counts_reps() {
        let processor = processor(Arc::new(PerRepModel));
        let mut last = None;
        for angle in [160.0, 30.0, 160.0, 30.0] {
            let result = processor
                .process(&frame("s", ExerciseKind::BicepCurl, Some(curl_pose(angle))))
                .expect("frame");
            assert!((result.angle.expect("angle") - angle).abs() < 1e-6);
            last = Some(result);
        }

        let last = last.expect("result");
        assert_eq!(last.reps, 2);
        assert_eq!(last.stage, Some(Stage::Up));
        assert!(last.rep_completed);
        assert_eq!(last.calories, 1.0);
    }

    #[test]
    fn lateral_raise_counts_reps() {
        let processor = processor(Arc::new(PerRepModel));
        let results: Vec<_> = [10.0, 90.0, 10.0]
            .iter()
            .map(|&angle| {
                processor
                    .process(&frame("s", ExerciseKind::LateralRaise, Some(raise_pose(angle))))
                    .expect("frame")
            })
            .collect();

        assert_eq!(results[1].reps, 1);
        assert_eq!(results[1].stage, Some(Stage::Up));
        assert_eq!(results[2].reps, 1);
        assert_eq!(results[2].stage, Some(Stage::Down));
        assert!(!results[2].rep_completed);
    }

    #[test]
    fn missing_landmarks_leave_state_unchanged() {
        let processor = processor(Arc::new(PerRepModel));
        processor
            .process(&frame("s", ExerciseKind::BicepCurl, Some(curl_pose(160.0))))
            .expect("down");
        let before = processor
            .process(&frame("s", ExerciseKind::BicepCurl, Some(curl_pose(30.0))))
            .expect("up");

        let after = processor
            .process(&frame("s", ExerciseKind::BicepCurl, None))
            .expect("empty frame");

        assert_eq!(after.reps, before.reps);
        assert_eq!(after.stage, before.stage);
        assert_eq!(after.calories, before.calories);
        assert_eq!(after.angle, None);
        assert!(!after.rep_completed);
        assert_eq!(processor.telemetry().snapshot().frames_without_landmarks, 1);
    }

    #[test]
    fn empty_landmark_list_counts_as_no_detection() {
        let processor = processor(Arc::new(PerRepModel));
        for angle in [160.0, 30.0] {
            processor
                .process(&frame("s", ExerciseKind::BicepCurl, Some(curl_pose(angle))))
                .expect("frame");
        }

        let result = processor
            .process(&frame("s", ExerciseKind::BicepCurl, Some(PoseLandmarks::new(vec![]))))
            .expect("empty landmark list");
        assert_eq!(result.reps, 1);
        assert_eq!(result.stage, Some(Stage::Up));
        assert_eq!(result.calories, 0.5);
        assert_eq!(result.angle, None);
        assert!(!result.rep_completed);
        assert_eq!(processor.telemetry().snapshot().frames_without_landmarks, 1);
    }

    #[test]
    fn zero_reps_report_zero_calories() {
        let processor = processor(Arc::new(BrokenModel));
        let result = processor
            .process(&frame("s", ExerciseKind::BicepCurl, None))
            .expect("no reps means no model call");
        assert_eq!(result.calories, 0.0);
        assert_eq!(result.reps, 0);
        assert_eq!(result.stage, None);
    }

    #[test]
    fn model_failure_keeps_counted_rep() {
        let processor = processor(Arc::new(BrokenModel));
        processor
            .process(&frame("s", ExerciseKind::BicepCurl, Some(curl_pose(160.0))))
            .expect("down frame never calls the model");

        let err = processor
            .process(&frame("s", ExerciseKind::BicepCurl, Some(curl_pose(30.0))))
            .expect_err("model fails once reps > 0");
        assert!(matches!(err, TrackerError::ModelInference(_)));

        let state = processor.session_state("s").unwrap().expect("session");
        assert_eq!(state.reps, 1);
        assert_eq!(state.stage, Some(Stage::Up));

        let snapshot = processor.telemetry().snapshot();
        assert!(snapshot
            .recent
            .iter()
            .any(|event| matches!(event, MetricEvent::Error { code: 1003, .. })));
    }

    #[test]
    fn missing_joint_is_decoding_error_and_leaves_no_session() {
        let processor = processor(Arc::new(PerRepModel));
        let partial = PoseLandmarks::from_points(&[
            (Joint::LeftShoulder, 1.0, 0.0),
            (Joint::LeftElbow, 0.0, 0.0),
        ]);

        let err = processor
            .process(&frame("s", ExerciseKind::BicepCurl, Some(partial)))
            .expect_err("wrist is required");
        assert!(matches!(err, TrackerError::InputDecoding { .. }));
        assert_eq!(processor.session_state("s").unwrap(), None);
    }

    #[test]
    fn non_finite_coordinates_are_rejected() {
        let processor = processor(Arc::new(PerRepModel));
        let pose = PoseLandmarks::from_points(&[
            (Joint::LeftShoulder, 1.0, 0.0),
            (Joint::LeftElbow, f64::NAN, 0.0),
            (Joint::LeftWrist, 0.0, 1.0),
        ]);
        let err = processor
            .process(&frame("s", ExerciseKind::BicepCurl, Some(pose)))
            .expect_err("NaN elbow");
        assert!(err.message().contains("non-finite"));
    }

    #[test]
    fn sessions_do_not_cross_contaminate() {
        let processor = processor(Arc::new(PerRepModel));
        for angle in [160.0, 30.0] {
            processor
                .process(&frame("a", ExerciseKind::BicepCurl, Some(curl_pose(angle))))
                .expect("a");
            processor
                .process(&frame("b", ExerciseKind::LateralRaise, Some(raise_pose(angle))))
                .expect("b");
        }

        let a = processor.session_state("a").unwrap().expect("a");
        let b = processor.session_state("b").unwrap().expect("b");
        assert_eq!(a.reps, 1);
        assert_eq!(a.stage, Some(Stage::Up));
        // 160 never arms a raise; 30 arms it without completing a rep
        assert_eq!(b.reps, 0);
        assert_eq!(b.stage, Some(Stage::Down));
    }

    #[test]
    fn reset_clears_session_and_records_event() {
        let processor = processor(Arc::new(PerRepModel));
        for angle in [160.0, 30.0] {
            processor
                .process(&frame("s", ExerciseKind::BicepCurl, Some(curl_pose(angle))))
                .expect("frame");
        }

        processor.reset("s").expect("reset");
        processor.reset("unknown").expect("reset unknown");

        assert_eq!(
            processor.session_state("s").unwrap(),
            Some(SessionState::default())
        );
        let events = processor.telemetry().snapshot().recent;
        assert!(events.iter().any(|event| matches!(
            event,
            MetricEvent::SessionReset { known: true, .. }
        )));
        assert!(events.iter().any(|event| matches!(
            event,
            MetricEvent::SessionReset { known: false, .. }
        )));
    }

    #[test]
    fn right_arm_configuration_uses_right_joints() {
        let tracking = TrackingConfig {
            arm_side: crate::pose::ArmSide::Right,
            ..TrackingConfig::default()
        };
        let processor = FrameProcessor::new(tracking, Arc::new(PerRepModel))
            .with_telemetry(Arc::new(TelemetryHub::default()));

        let err = processor
            .process(&frame("s", ExerciseKind::BicepCurl, Some(curl_pose(160.0))))
            .expect_err("left-arm landmarks only");
        assert!(err.message().contains("RightShoulder"));
    }

    #[test]
    fn from_config_without_artifact_uses_builtin_model() {
        let processor = FrameProcessor::from_config(&AppConfig::default())
            .expect("default model")
            .with_telemetry(Arc::new(TelemetryHub::default()));
        for angle in [160.0, 30.0] {
            processor
                .process(&frame("s", ExerciseKind::BicepCurl, Some(curl_pose(angle))))
                .expect("frame");
        }
        let result = processor
            .process(&frame("s", ExerciseKind::BicepCurl, None))
            .expect("frame");
        // 0.315 + 70*0.08 - 25*0.05 + 2
        assert!((result.calories - 6.665).abs() < 1e-9);
    }
}
