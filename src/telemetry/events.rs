//! Telemetry event types exposed through the HTTP `/metrics` and `/events`
//! surfaces.

use serde::{Deserialize, Serialize};

use crate::analysis::{ExerciseKind, Stage};

/// Events recorded by the frame pipeline and session store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum MetricEvent {
    RepCompleted {
        session_id: String,
        exercise: ExerciseKind,
        reps: u32,
        timestamp_ms: u64,
    },
    StageChanged {
        session_id: String,
        stage: Option<Stage>,
    },
    SessionReset {
        session_id: String,
        known: bool,
    },
    Error {
        code: i32,
        context: String,
    },
}
