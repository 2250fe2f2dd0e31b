//! Readmit: 30-day readmission risk estimation
//!
//! Command-line entry point. Reads one patient record as JSON, scores it,
//! and prints the risk report.
//!
//! ```bash
//! readmit [--model-dir <dir>] [--threshold <f64>] [--input <file.json>|-] [--json]
//! ```

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use readmit::adapters::artifacts::ArtifactLoader;
use readmit::adapters::sanitize::SanitizingMakeWriter;
use readmit::application::PredictionService;
use readmit::config::{AppConfig, LogMode};
use readmit::{PatientInput, PredictionReport, ReadmitError};

#[derive(Debug, Default)]
struct CliArgs {
    model_dir: Option<PathBuf>,
    threshold: Option<f64>,
    input: Option<String>,
    json: bool,
}

fn usage() -> String {
    "Usage: readmit [--model-dir <dir>] [--threshold <f64>] [--input <file.json>|-] [--json]"
        .to_string()
}

fn parse_args() -> Result<CliArgs, String> {
    let mut args = std::env::args().skip(1);
    let mut cli = CliArgs::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--model-dir" => {
                let v = args.next().ok_or_else(usage)?;
                cli.model_dir = Some(PathBuf::from(v));
            }
            "--threshold" => {
                let v = args.next().ok_or_else(usage)?;
                let parsed = v
                    .trim()
                    .parse::<f64>()
                    .map_err(|_| "--threshold must be a number".to_string())?;
                cli.threshold = Some(parsed);
            }
            "--input" => {
                cli.input = Some(args.next().ok_or_else(usage)?);
            }
            "--json" => cli.json = true,
            _ => return Err(usage()),
        }
    }

    Ok(cli)
}

fn read_input(source: Option<&str>) -> Result<PatientInput> {
    let json = match source {
        None => return Ok(PatientInput::default()),
        Some("-") => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read patient JSON from stdin")?;
            buf
        }
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read patient JSON from {path}"))?,
    };
    serde_json::from_str(&json).context("Invalid patient JSON")
}

fn render_report(report: &PredictionReport) -> String {
    let tier = report.risk_tier();
    [
        format!("{} [{}]", tier.label(), tier),
        tier.description().to_string(),
        String::new(),
        format!("Readmission probability: {:.1}%", report.probability_pct),
        format!("Model confidence:        {}%", report.display_confidence_pct),
        format!(
            "Decision threshold: {} | Raw probability: {:.4}",
            report.threshold, report.result.probability
        ),
        String::new(),
        "This prediction is for clinical decision support only and is not a substitute \
         for professional medical judgment."
            .to_string(),
    ]
    .join("\n")
}

fn main() -> Result<ExitCode> {
    let cli = match parse_args() {
        Ok(cli) => cli,
        Err(msg) => {
            eprintln!("{msg}");
            return Ok(ExitCode::from(2));
        }
    };

    let mut config = AppConfig::from_env()?;

    // Logs go to stderr or a file; stdout carries only the report.
    let (writer, _guard) = match &config.log_mode {
        LogMode::File(path) => {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            tracing_appender::non_blocking(file)
        }
        LogMode::Stderr => tracing_appender::non_blocking(std::io::stderr()),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(SanitizingMakeWriter::new(writer)),
        )
        .init();

    if let Some(dir) = cli.model_dir {
        config.model_dir = dir;
    }
    if let Some(threshold) = cli.threshold {
        config.prediction.threshold = threshold;
    }
    config.prediction.validate()?;

    tracing::info!("Starting Readmit...");

    let artifacts = match ArtifactLoader::from_config(&config)?.load() {
        Ok(artifacts) => artifacts,
        Err(e @ ReadmitError::MissingArtifacts(_)) => {
            eprintln!("{e}");
            eprintln!("Train and export the model first, then point --model-dir at its directory.");
            return Ok(ExitCode::FAILURE);
        }
        Err(e) => return Err(e).context("Refusing to serve predictions"),
    };
    let service = PredictionService::new(Arc::new(artifacts), config.prediction)?;

    let input = read_input(cli.input.as_deref())?;
    if let Err(errors) = input.validate() {
        for error in &errors {
            eprintln!("Invalid patient data: {error}");
        }
        return Ok(ExitCode::from(2));
    }

    match service.predict(&input) {
        Ok(report) => {
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", render_report(&report));
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            eprintln!("Prediction Error: {e}");
            Ok(ExitCode::FAILURE)
        }
    }
}
