// Rep Tracker Core - exercise repetition counting from pose landmarks
// Joint angles drive a per-exercise state machine; a linear model turns reps into calories

// Module declarations
pub mod analysis;
pub mod calories;
pub mod config;
pub mod error;
pub mod fixtures;
pub mod http;
pub mod pipeline;
pub mod pose;
pub mod session;
pub mod telemetry;

// Re-exports for convenience
pub use analysis::{ExerciseKind, Stage};
pub use config::AppConfig;
pub use error::{ErrorCode, ModelError, TrackerError};
pub use pipeline::{FrameInput, FrameProcessor, FrameResult};
pub use pose::{ArmSide, Joint, Landmark, PoseLandmarks};

/// Install the global tracing subscriber.
///
/// `level` is one of `error`, `warn`, `info`, `debug`, `trace`; unknown
/// values fall back to `info`. `log` records are forwarded to tracing.
/// Calling this more than once is harmless.
pub fn init_logging(level: &str) {
    let max_level = level.parse::<tracing::Level>().unwrap_or(tracing::Level::INFO);
    if tracing_subscriber::fmt()
        .with_max_level(max_level)
        .with_target(false)
        .try_init()
        .is_ok()
    {
        log::debug!("[Logging] Initialized at level {}", max_level);
    }
}
