use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};

use crate::analysis::{ExerciseKind, Stage};
use crate::calories::{Gender, UserProfile};
use crate::error::{ErrorCode, TrackerError};
use crate::pipeline::{FrameInput, FrameProcessor};
use crate::pose::PoseLandmarks;
use crate::telemetry::TelemetrySnapshot;

use super::sse;

const DEFAULT_SESSION_ID: &str = "default";

/// Shared application state for HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub processor: Arc<FrameProcessor>,
    profile_defaults: UserProfile,
    started_at: Instant,
}

impl AppState {
    pub fn new(processor: Arc<FrameProcessor>, profile_defaults: UserProfile) -> Self {
        Self {
            processor,
            profile_defaults,
            started_at: Instant::now(),
        }
    }

    pub fn uptime_ms(&self) -> u64 {
        duration_ms(self.started_at.elapsed())
    }
}

fn duration_ms(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

/// Body of `POST /api/process_frame`.
#[derive(Debug, Clone, Deserialize)]
pub struct FrameRequest {
    /// Missing or null means the pose estimator found nobody
    #[serde(default)]
    pub landmarks: Option<PoseLandmarks>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub gender: Option<Gender>,
    pub exercise: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

impl FrameRequest {
    /// Validate into pipeline input, filling profile gaps from `defaults`.
    pub fn into_input(self, defaults: &UserProfile) -> Result<FrameInput, TrackerError> {
        let exercise: ExerciseKind = self.exercise.parse()?;
        let weight = self.weight.unwrap_or(defaults.weight);
        if !weight.is_finite() || weight <= 0.0 {
            return Err(TrackerError::decoding(format!(
                "weight must be a positive number (got {})",
                weight
            )));
        }

        Ok(FrameInput {
            session_id: self
                .session_id
                .unwrap_or_else(|| DEFAULT_SESSION_ID.to_string()),
            exercise,
            profile: UserProfile {
                age: self.age.unwrap_or(defaults.age),
                weight,
                gender: self.gender.unwrap_or(defaults.gender),
            },
            landmarks: self.landmarks,
        })
    }
}

/// Body of `POST /api/reset`.
#[derive(Debug, Default, Deserialize)]
pub struct ResetRequest {
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProcessFrameResponse {
    pub success: bool,
    pub reps: u32,
    pub calories: f64,
    pub stage: Option<Stage>,
}

#[derive(Debug, Serialize)]
pub struct ResetResponse {
    pub success: bool,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub sessions: usize,
    pub uptime_ms: u64,
    pub telemetry_events: u64,
}

/// Failure response `{success: false, error}`.
#[derive(Debug)]
pub struct ApiError(TrackerError);

impl From<TrackerError> for ApiError {
    fn from(err: TrackerError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        let body = serde_json::json!({
            "success": false,
            "error": self.0.message(),
            "code": self.0.code(),
        });
        (status, Json(body)).into_response()
    }
}

/// Build the Axum router with all handlers.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/process_frame", post(process_frame))
        .route("/api/reset", post(reset))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/events", get(events))
        .with_state(state)
}

/// Run the HTTP server until `shutdown` resolves.
pub async fn run_http_server<F>(state: AppState, addr: SocketAddr, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding HTTP listener on {}", addr))?;
    log::info!("[HTTP] Listening on {}", addr);
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .context("serving HTTP router")?;
    Ok(())
}

pub async fn process_frame(
    State(state): State<AppState>,
    payload: Result<Json<FrameRequest>, JsonRejection>,
) -> Result<Json<ProcessFrameResponse>, ApiError> {
    let Json(request) = payload.map_err(|rejection| TrackerError::decoding(rejection.body_text()))?;
    let input = request.into_input(&state.profile_defaults)?;
    let result = state.processor.process(&input)?;

    Ok(Json(ProcessFrameResponse {
        success: true,
        reps: result.reps,
        calories: round_to_cents(result.calories),
        stage: result.stage,
    }))
}

pub async fn reset(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ResetResponse>, ApiError> {
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        ResetRequest::default()
    } else {
        serde_json::from_slice::<ResetRequest>(&body)
            .map_err(|err| TrackerError::decoding(err.to_string()))?
    };
    let session_id = request.session_id.as_deref().unwrap_or(DEFAULT_SESSION_ID);
    state.processor.reset(session_id)?;

    Ok(Json(ResetResponse {
        success: true,
        message: "Counter reset",
    }))
}

pub async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    Ok(Json(HealthResponse {
        status: "ok",
        sessions: state.processor.sessions().len()?,
        uptime_ms: state.uptime_ms(),
        telemetry_events: state.processor.telemetry().snapshot().total_events,
    }))
}

pub async fn metrics(State(state): State<AppState>) -> Json<TelemetrySnapshot> {
    Json(state.processor.telemetry().snapshot())
}

pub async fn events(State(state): State<AppState>) -> sse::EventStream {
    sse::telemetry_events(state.processor.telemetry())
}

fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
