use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use rep_tracker::analysis::joint_angle;
use rep_tracker::calories::{CalorieModel, ExerciseLinearModel};
use rep_tracker::config::AppConfig;
use rep_tracker::fixtures::{ExpectationDiff, FixtureCatalog, FixtureReplayer, ReplayReport};
use rep_tracker::pose::Landmark;

#[derive(Parser, Debug)]
#[command(
    name = "rep_cli",
    about = "Deterministic landmark replay harness for the rep tracker"
)]
struct Cli {
    /// Override directory containing fixture assets (defaults to the crate fixtures/ dir)
    #[arg(long)]
    fixtures_dir: Option<PathBuf>,
    /// Configuration file supplying thresholds, arm side and model artifact
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay a fixture and optionally compare against expectations
    Replay {
        #[arg(long)]
        fixture: String,
        #[arg(long)]
        expect: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Stream per-frame results for a fixture to stdout as JSON lines
    Stream {
        #[arg(long)]
        fixture: String,
    },
    /// Compute the angle at B formed by points A, B, C (each given as x,y)
    Angle {
        #[arg(long, allow_hyphen_values = true)]
        a: String,
        #[arg(long, allow_hyphen_values = true)]
        b: String,
        #[arg(long, allow_hyphen_values = true)]
        c: String,
    },
    /// List available fixtures on disk
    DumpFixtures,
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let catalog = cli
        .fixtures_dir
        .map(FixtureCatalog::new)
        .unwrap_or_default();

    match cli.command {
        Commands::Replay {
            fixture,
            expect,
            output,
        } => run_replay(&catalog, cli.config, &fixture, expect, output),
        Commands::Stream { fixture } => run_stream(&catalog, cli.config, &fixture),
        Commands::Angle { a, b, c } => run_angle(&a, &b, &c),
        Commands::DumpFixtures => run_dump(&catalog),
    }
}

fn build_replayer(config_path: Option<PathBuf>) -> Result<FixtureReplayer> {
    // Built-in defaults unless --config is given
    let config = match config_path {
        Some(path) => AppConfig::load_from_file(path),
        None => AppConfig::default(),
    };
    let model: Arc<dyn CalorieModel> = match &config.calories.model_path {
        Some(path) => Arc::new(
            ExerciseLinearModel::load_from_file(path)
                .with_context(|| format!("loading model artifact {}", path.display()))?,
        ),
        None => Arc::new(ExerciseLinearModel::default()),
    };
    Ok(FixtureReplayer::new(config.tracking, model))
}

fn run_replay(
    catalog: &FixtureCatalog,
    config_path: Option<PathBuf>,
    fixture: &str,
    override_expect: Option<PathBuf>,
    output_path: Option<PathBuf>,
) -> Result<ExitCode> {
    let replayer = build_replayer(config_path)?;
    let data = catalog.load(fixture, override_expect)?;
    let report = replayer
        .run(&data)
        .with_context(|| format!("replaying fixture {}", fixture))?;

    emit_report(&report, output_path)?;

    if let Some(expectations) = data.expect {
        match expectations.verify(&report) {
            Ok(()) => Ok(ExitCode::from(0)),
            Err(diff) => {
                emit_diff(&diff)?;
                Ok(ExitCode::from(2))
            }
        }
    } else {
        Ok(ExitCode::from(0))
    }
}

fn run_stream(
    catalog: &FixtureCatalog,
    config_path: Option<PathBuf>,
    fixture: &str,
) -> Result<ExitCode> {
    let replayer = build_replayer(config_path)?;
    let data = catalog.load(fixture, None)?;
    let report = replayer
        .run(&data)
        .with_context(|| format!("replaying fixture {}", fixture))?;

    for event in report.events {
        println!("{}", serde_json::to_string(&event)?);
    }

    Ok(ExitCode::from(0))
}

fn run_angle(a: &str, b: &str, c: &str) -> Result<ExitCode> {
    let angle = joint_angle(parse_point(a)?, parse_point(b)?, parse_point(c)?);
    println!("{angle}");
    Ok(ExitCode::from(0))
}

fn run_dump(catalog: &FixtureCatalog) -> Result<ExitCode> {
    let fixtures = catalog.discover()?;
    if fixtures.is_empty() {
        println!("No fixtures found under {}", catalog.root().display());
        return Ok(ExitCode::from(0));
    }

    for metadata in fixtures {
        println!("{} -> {}", metadata.name, metadata.path.display());
    }
    Ok(ExitCode::from(0))
}

fn parse_point(raw: &str) -> Result<Landmark> {
    let (x, y) = raw
        .split_once(',')
        .ok_or_else(|| anyhow!("expected point as x,y but got '{}'", raw))?;
    let x: f64 = x
        .trim()
        .parse()
        .with_context(|| format!("invalid x coordinate in '{}'", raw))?;
    let y: f64 = y
        .trim()
        .parse()
        .with_context(|| format!("invalid y coordinate in '{}'", raw))?;
    let point = Landmark::new(x, y);
    if !point.is_finite() {
        return Err(anyhow!("point '{}' has non-finite coordinates", raw));
    }
    Ok(point)
}

fn emit_report(report: &ReplayReport, output_path: Option<PathBuf>) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;

    if let Some(path) = output_path {
        fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    } else {
        println!("{json}");
    }

    Ok(())
}

fn emit_diff(diff: &ExpectationDiff) -> Result<()> {
    let json = serde_json::to_string_pretty(&diff.to_json())?;
    eprintln!("{json}");
    Ok(())
}
