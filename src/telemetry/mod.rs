//! Telemetry collector and helpers.
//!
//! The collector keeps a bounded history of [`MetricEvent`]s and fans them
//! out over a broadcast channel; the hub adds frame counters and a rolling
//! processing-latency window on top.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::analysis::{ExerciseKind, Stage};
use crate::config::TelemetryConfig;

pub mod events;

pub use events::MetricEvent;

static HUB: OnceCell<Arc<TelemetryHub>> = OnceCell::new();

/// Install the process-wide hub. Returns `false` if one already exists.
pub fn init(config: &TelemetryConfig) -> bool {
    HUB.set(Arc::new(TelemetryHub::new(
        config.channel_capacity,
        config.history_capacity,
        DEFAULT_LATENCY_WINDOW,
    )))
    .is_ok()
}

/// Access the process-wide hub, creating a default one on first use.
pub fn hub() -> Arc<TelemetryHub> {
    Arc::clone(HUB.get_or_init(|| Arc::new(TelemetryHub::default())))
}

const DEFAULT_LATENCY_WINDOW: usize = 128;

/// Rolling frame processing latency
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LatencySummary {
    pub avg_ms: f64,
    pub max_ms: f64,
    pub sample_count: usize,
}

/// Snapshot of collector state for HTTP/CLI reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    pub recent: Vec<MetricEvent>,
    pub total_events: u64,
    pub dropped_events: u64,
    pub frames_processed: u64,
    pub frames_without_landmarks: u64,
    pub latency: LatencySummary,
}

/// Broadcast-based collector retaining a bounded history of events.
pub struct TelemetryCollector {
    tx: broadcast::Sender<MetricEvent>,
    history: Mutex<VecDeque<MetricEvent>>,
    history_capacity: usize,
    total_events: AtomicU64,
    dropped_history: AtomicU64,
}

impl TelemetryCollector {
    pub fn new(buffer: usize, history_capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(buffer.max(1));
        Self {
            tx,
            history: Mutex::new(VecDeque::with_capacity(history_capacity)),
            history_capacity,
            total_events: AtomicU64::new(0),
            dropped_history: AtomicU64::new(0),
        }
    }

    pub fn publish(&self, event: MetricEvent) {
        self.total_events.fetch_add(1, Ordering::Relaxed);
        match self.history.lock() {
            Ok(mut history) if self.history_capacity > 0 => {
                if history.len() == self.history_capacity {
                    history.pop_front();
                    self.dropped_history.fetch_add(1, Ordering::Relaxed);
                }
                history.push_back(event.clone());
            }
            Ok(_) => {}
            Err(_) => log::error!("[Telemetry] History lock poisoned; event not retained"),
        }

        // No subscribers is fine
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MetricEvent> {
        self.tx.subscribe()
    }

    fn recent(&self) -> Vec<MetricEvent> {
        self.history
            .lock()
            .map(|history| history.iter().cloned().collect())
            .unwrap_or_default()
    }
}

impl Default for TelemetryCollector {
    fn default() -> Self {
        Self::new(256, 64)
    }
}

/// Latency tracker maintains a rolling window to compute avg/max latency.
struct LatencyTracker {
    samples: VecDeque<f64>,
    max_samples: usize,
}

impl LatencyTracker {
    fn new(max_samples: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(max_samples),
            max_samples: max_samples.max(1),
        }
    }

    fn observe(&mut self, value_ms: f64) {
        if self.samples.len() == self.max_samples {
            self.samples.pop_front();
        }
        self.samples.push_back(value_ms);
    }

    fn summary(&self) -> LatencySummary {
        let count = self.samples.len();
        let sum: f64 = self.samples.iter().copied().sum();
        let max = self.samples.iter().copied().fold(0.0_f64, f64::max);
        LatencySummary {
            avg_ms: if count == 0 { 0.0 } else { sum / count as f64 },
            max_ms: max,
            sample_count: count,
        }
    }
}

/// Top-level hub wrapping collector state plus derived gauges.
pub struct TelemetryHub {
    collector: TelemetryCollector,
    latency: Mutex<LatencyTracker>,
    frames_processed: AtomicU64,
    frames_without_landmarks: AtomicU64,
}

impl TelemetryHub {
    pub fn new(channel_capacity: usize, history_capacity: usize, latency_window: usize) -> Self {
        Self {
            collector: TelemetryCollector::new(channel_capacity, history_capacity),
            latency: Mutex::new(LatencyTracker::new(latency_window)),
            frames_processed: AtomicU64::new(0),
            frames_without_landmarks: AtomicU64::new(0),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MetricEvent> {
        self.collector.subscribe()
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        let latency = self
            .latency
            .lock()
            .map(|tracker| tracker.summary())
            .unwrap_or_default();
        TelemetrySnapshot {
            recent: self.collector.recent(),
            total_events: self.collector.total_events.load(Ordering::Relaxed),
            dropped_events: self.collector.dropped_history.load(Ordering::Relaxed),
            frames_processed: self.frames_processed.load(Ordering::Relaxed),
            frames_without_landmarks: self.frames_without_landmarks.load(Ordering::Relaxed),
            latency,
        }
    }

    pub fn record_frame(&self, had_landmarks: bool, elapsed: Duration) {
        self.frames_processed.fetch_add(1, Ordering::Relaxed);
        if !had_landmarks {
            self.frames_without_landmarks
                .fetch_add(1, Ordering::Relaxed);
        }
        if let Ok(mut tracker) = self.latency.lock() {
            tracker.observe(elapsed.as_secs_f64() * 1000.0);
        }
    }

    pub fn record_rep(&self, session_id: &str, exercise: ExerciseKind, reps: u32) {
        self.collector.publish(MetricEvent::RepCompleted {
            session_id: session_id.to_string(),
            exercise,
            reps,
            timestamp_ms: now_timestamp_ms(),
        });
    }

    pub fn record_stage(&self, session_id: &str, stage: Option<Stage>) {
        self.collector.publish(MetricEvent::StageChanged {
            session_id: session_id.to_string(),
            stage,
        });
    }

    pub fn record_reset(&self, session_id: &str, known: bool) {
        self.collector.publish(MetricEvent::SessionReset {
            session_id: session_id.to_string(),
            known,
        });
    }

    pub fn record_error(&self, code: i32, context: impl Into<String>) {
        self.collector.publish(MetricEvent::Error {
            code,
            context: context.into(),
        });
    }
}

impl Default for TelemetryHub {
    fn default() -> Self {
        Self::new(256, 64, DEFAULT_LATENCY_WINDOW)
    }
}

fn now_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collector_preserves_order_within_history() {
        let collector = TelemetryCollector::new(8, 3);
        collector.publish(MetricEvent::SessionReset {
            session_id: "a".to_string(),
            known: true,
        });
        collector.publish(MetricEvent::Error {
            code: 1001,
            context: "decode".to_string(),
        });

        let recent = collector.recent();
        assert_eq!(recent.len(), 2);
        assert!(matches!(recent[0], MetricEvent::SessionReset { .. }));
        assert!(matches!(recent[1], MetricEvent::Error { code: 1001, .. }));
    }

    #[test]
    fn collector_drops_history_when_full() {
        let hub = TelemetryHub::new(8, 2, 4);
        hub.record_rep("a", ExerciseKind::BicepCurl, 1);
        hub.record_rep("a", ExerciseKind::BicepCurl, 2);
        hub.record_rep("a", ExerciseKind::BicepCurl, 3);

        let snapshot = hub.snapshot();
        assert_eq!(snapshot.recent.len(), 2);
        assert_eq!(snapshot.total_events, 3);
        assert_eq!(snapshot.dropped_events, 1);
        assert!(matches!(
            snapshot.recent[0],
            MetricEvent::RepCompleted { reps: 2, .. }
        ));
    }

    #[test]
    fn frame_counters_and_latency() {
        let hub = TelemetryHub::new(8, 8, 2);
        hub.record_frame(true, Duration::from_millis(2));
        hub.record_frame(false, Duration::from_millis(4));
        hub.record_frame(true, Duration::from_millis(6));

        let snapshot = hub.snapshot();
        assert_eq!(snapshot.frames_processed, 3);
        assert_eq!(snapshot.frames_without_landmarks, 1);
        assert_eq!(snapshot.latency.sample_count, 2);
        assert!((snapshot.latency.avg_ms - 5.0).abs() < 1e-6);
        assert!((snapshot.latency.max_ms - 6.0).abs() < 1e-6);
    }

    #[test]
    fn subscribers_receive_events() {
        let hub = TelemetryHub::new(8, 8, 4);
        let mut rx = hub.subscribe();
        hub.record_reset("b", false);

        match rx.try_recv() {
            Ok(MetricEvent::SessionReset { session_id, known }) => {
                assert_eq!(session_id, "b");
                assert!(!known);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn event_json_is_tagged() {
        let event = MetricEvent::RepCompleted {
            session_id: "s".to_string(),
            exercise: ExerciseKind::LateralRaise,
            reps: 4,
            timestamp_ms: 1,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "rep_completed");
        assert_eq!(json["payload"]["exercise"], "lateral_raise");
    }
}
