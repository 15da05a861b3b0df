use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::{Stream, StreamExt};
use tokio_stream::wrappers::BroadcastStream;

use crate::telemetry::TelemetryHub;

type BoxedEvents = Pin<Box<dyn Stream<Item = Result<Event, Infallible>> + Send>>;

pub type EventStream = Sse<BoxedEvents>;

/// Build a Server-Sent Events stream of telemetry events (reps, resets, errors).
pub fn telemetry_events(hub: &Arc<TelemetryHub>) -> EventStream {
    let stream = BroadcastStream::new(hub.subscribe()).filter_map(|result| async move {
        match result {
            Ok(event) => match serde_json::to_string(&event) {
                Ok(payload) => Some(Ok(Event::default().event("telemetry").data(payload))),
                Err(_) => None,
            },
            // Lagged receivers skip missed events
            Err(_) => None,
        }
    });

    let stream: BoxedEvents = Box::pin(stream);
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(5))
            .text("keepalive"),
    )
}
