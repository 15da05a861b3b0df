//! Fixture utilities for the deterministic replay CLI.
//!
//! A fixture is a JSON recording of pose-estimator output for one exercise
//! set: a list of frames, each with the detected landmarks (or none). The
//! replayer feeds the frames through a fresh [`FrameProcessor`] and compares
//! the final rep count/stage against optional expectations.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::analysis::{ExerciseKind, Stage};
use crate::calories::{CalorieModel, UserProfile};
use crate::config::TrackingConfig;
use crate::pipeline::{FrameInput, FrameProcessor};
use crate::pose::PoseLandmarks;
use crate::telemetry::TelemetryHub;

/// Default location for fixture JSON assets.
pub const DEFAULT_FIXTURE_ROOT: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures");

const EXPECT_SUFFIX: &str = ".expect.json";

/// Metadata describing an available fixture.
#[derive(Clone, Debug)]
pub struct FixtureMetadata {
    pub name: String,
    pub path: PathBuf,
}

/// One recorded frame
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FixtureFrame {
    #[serde(default)]
    pub landmarks: Option<PoseLandmarks>,
}

/// A recorded exercise set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureData {
    pub exercise: ExerciseKind,
    #[serde(default = "default_session_id")]
    pub session_id: String,
    #[serde(default)]
    pub profile: UserProfile,
    pub frames: Vec<FixtureFrame>,
    #[serde(default)]
    pub expect: Option<FixtureExpectations>,
}

fn default_session_id() -> String {
    "fixture".to_string()
}

/// Expected final state after replaying all frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureExpectations {
    pub reps: u32,
    #[serde(default)]
    pub stage: Option<Stage>,
}

impl FixtureExpectations {
    pub fn verify(&self, report: &ReplayReport) -> std::result::Result<(), ExpectationDiff> {
        let mut failures = Vec::new();
        if report.reps != self.reps {
            failures.push(ExpectationFailure {
                field: "reps",
                expected: serde_json::json!(self.reps),
                actual: serde_json::json!(report.reps),
            });
        }
        if report.stage != self.stage {
            failures.push(ExpectationFailure {
                field: "stage",
                expected: serde_json::json!(self.stage),
                actual: serde_json::json!(report.stage),
            });
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ExpectationDiff { failures })
        }
    }
}

/// Outcome of comparing a replay with expectations.
#[derive(Debug)]
pub struct ExpectationDiff {
    pub failures: Vec<ExpectationFailure>,
}

impl ExpectationDiff {
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "failures": self.failures.iter().map(|failure| {
                serde_json::json!({
                    "field": failure.field,
                    "expected": failure.expected,
                    "actual": failure.actual,
                })
            }).collect::<Vec<_>>()
        })
    }
}

#[derive(Debug)]
pub struct ExpectationFailure {
    pub field: &'static str,
    pub expected: serde_json::Value,
    pub actual: serde_json::Value,
}

/// Per-frame replay output
#[derive(Debug, Clone, Serialize)]
pub struct ReplayEvent {
    pub frame: usize,
    pub reps: u32,
    pub stage: Option<Stage>,
    pub angle: Option<f64>,
    pub rep_completed: bool,
}

/// Summary of a full fixture replay
#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub exercise: ExerciseKind,
    pub frame_count: usize,
    pub reps: u32,
    pub stage: Option<Stage>,
    pub calories: f64,
    pub events: Vec<ReplayEvent>,
}

/// Catalog responsible for discovering fixtures on disk.
pub struct FixtureCatalog {
    root: PathBuf,
}

impl FixtureCatalog {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// List all fixtures (expectation files excluded).
    pub fn discover(&self) -> Result<Vec<FixtureMetadata>> {
        let mut fixtures = Vec::new();
        if !self.root.exists() {
            return Ok(fixtures);
        }

        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let path = entry.path();
            let file_name = path
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or_default()
                .to_string();
            if file_name.ends_with(".json") && !file_name.ends_with(EXPECT_SUFFIX) {
                fixtures.push(FixtureMetadata {
                    name: file_name.trim_end_matches(".json").to_string(),
                    path,
                });
            }
        }

        fixtures.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(fixtures)
    }

    /// Load a fixture by name (resolved under the root) or by path.
    ///
    /// `override_expect` replaces any inline expectations.
    pub fn load(&self, fixture: &str, override_expect: Option<PathBuf>) -> Result<FixtureData> {
        let path = self.resolve_fixture_path(fixture)?;
        let contents =
            fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
        let mut data: FixtureData = serde_json::from_str(&contents)
            .with_context(|| format!("parsing fixture {}", path.display()))?;

        if let Some(expect_path) = override_expect {
            let raw = fs::read_to_string(&expect_path)
                .with_context(|| format!("reading {}", expect_path.display()))?;
            data.expect = Some(
                serde_json::from_str(&raw)
                    .with_context(|| format!("parsing {}", expect_path.display()))?,
            );
        }
        Ok(data)
    }

    fn resolve_fixture_path(&self, fixture: &str) -> Result<PathBuf> {
        let direct = PathBuf::from(fixture);
        if direct.is_file() {
            return Ok(direct);
        }
        let named = self.root.join(format!("{}.json", fixture));
        if named.is_file() {
            return Ok(named);
        }
        Err(anyhow!(
            "fixture '{}' not found (looked for {} and {})",
            fixture,
            direct.display(),
            named.display()
        ))
    }
}

impl Default for FixtureCatalog {
    fn default() -> Self {
        Self::new(DEFAULT_FIXTURE_ROOT)
    }
}

/// Replays fixtures through an isolated frame processor.
pub struct FixtureReplayer {
    tracking: TrackingConfig,
    model: Arc<dyn CalorieModel>,
}

impl FixtureReplayer {
    pub fn new(tracking: TrackingConfig, model: Arc<dyn CalorieModel>) -> Self {
        Self { tracking, model }
    }

    pub fn run(&self, data: &FixtureData) -> Result<ReplayReport> {
        let processor = FrameProcessor::new(self.tracking.clone(), Arc::clone(&self.model))
            .with_telemetry(Arc::new(TelemetryHub::default()));

        let mut events = Vec::with_capacity(data.frames.len());
        let mut calories = 0.0;
        for (index, frame) in data.frames.iter().enumerate() {
            let input = FrameInput {
                session_id: data.session_id.clone(),
                exercise: data.exercise,
                profile: data.profile,
                landmarks: frame.landmarks.clone(),
            };
            let result = processor
                .process(&input)
                .with_context(|| format!("processing frame {}", index))?;
            calories = result.calories;
            events.push(ReplayEvent {
                frame: index,
                reps: result.reps,
                stage: result.stage,
                angle: result.angle,
                rep_completed: result.rep_completed,
            });
        }

        let final_state = processor
            .session_state(&data.session_id)?
            .unwrap_or_default();
        Ok(ReplayReport {
            exercise: data.exercise,
            frame_count: data.frames.len(),
            reps: final_state.reps,
            stage: final_state.stage,
            calories,
            events,
        })
    }
}
