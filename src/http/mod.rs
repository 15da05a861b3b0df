//! HTTP surface for the rep tracker.
//!
//! An Axum router exposing frame processing, session reset, health,
//! telemetry metrics and a Server-Sent Events feed of rep events.

#[cfg(feature = "http")]
mod routes;
#[cfg(feature = "http")]
mod sse;

#[cfg(feature = "http")]
pub use routes::{build_router, run_http_server, AppState, FrameRequest, ResetRequest};
