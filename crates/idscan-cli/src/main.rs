// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// idscan command-line front end.
//
// Entry point. Initialises logging, builds a detector from a preset, an
// optional config file and `--set` overrides, and runs detection on image
// files, printing JSON to stdout.

mod batch;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::{Args, Parser, Subcommand};
use idscan_core::{DetectorConfig, IdScanError, Result};
use idscan_detect::{Detection, DocumentDetector};
use serde::Serialize;
use tracing::info;

use batch::{BatchEntry, BatchReport, BatchSummary};

#[derive(Parser)]
#[command(name = "idscan")]
#[command(about = "Locate ID-1 cards in photos and report their corners")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect the card in one image.
    Detect {
        /// Path to the input image.
        image: PathBuf,

        #[command(flatten)]
        detector: DetectorArgs,

        /// Write the JSON result here instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Run detection over many images and report success statistics.
    Batch {
        /// Input images.
        #[arg(required = true)]
        images: Vec<PathBuf>,

        #[command(flatten)]
        detector: DetectorArgs,

        /// Omit per-image entries from the report.
        #[arg(long)]
        summary_only: bool,
    },

    /// Print the effective detector configuration as JSON.
    Config {
        #[command(flatten)]
        detector: DetectorArgs,
    },
}

#[derive(Debug, Clone, Args)]
struct DetectorArgs {
    /// Starting preset: `id1` or `generic`.
    #[arg(long, default_value = "id1")]
    preset: String,

    /// JSON configuration file; replaces the preset.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override a configuration key, e.g. `--set approx_epsilon=0.02`.
    #[arg(long = "set", value_name = "KEY=VALUE")]
    overrides: Vec<String>,

    /// Pretty-print JSON output.
    #[arg(long)]
    pretty: bool,
}

impl DetectorArgs {
    fn build(&self) -> Result<DocumentDetector> {
        let mut config = match &self.config {
            Some(path) => DetectorConfig::load(path)?,
            None => DetectorConfig::preset(&self.preset).ok_or_else(|| {
                IdScanError::invalid_config("preset", &self.preset, "expected id1 or generic")
            })?,
        };
        for entry in &self.overrides {
            let (key, value) = entry.split_once('=').ok_or_else(|| {
                IdScanError::invalid_config("--set", entry, "expected KEY=VALUE")
            })?;
            config.set(key.trim(), value.trim())?;
        }
        Ok(DocumentDetector::new(config))
    }

    fn to_json<T: Serialize>(&self, value: &T) -> Result<String> {
        Ok(if self.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        })
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let outcome = match &cli.command {
        Commands::Detect {
            image,
            detector,
            out,
        } => run_detect(image, detector, out.as_deref()),
        Commands::Batch {
            images,
            detector,
            summary_only,
        } => run_batch(images, detector, *summary_only),
        Commands::Config { detector } => run_config(detector),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("idscan: {err}");
            ExitCode::from(err.status_code().unsigned_abs().min(u8::MAX as u32) as u8)
        }
    }
}

// -- detect ------------------------------------------------------------------

fn load_and_detect(detector: &DocumentDetector, path: &Path) -> Result<Detection> {
    let image = image::open(path).map_err(|err| {
        IdScanError::ImageError(format!("failed to open {}: {}", path.display(), err))
    })?;
    detector.detect_dynamic(&image)
}

fn run_detect(image: &Path, args: &DetectorArgs, out: Option<&Path>) -> Result<()> {
    info!("Loading image: {}", image.display());
    let detector = args.build()?;
    let detection = load_and_detect(&detector, image)?;

    let json = args.to_json(&detection)?;
    match out {
        Some(path) => {
            std::fs::write(path, json)?;
            info!("Result written to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

// -- batch -------------------------------------------------------------------

fn run_batch(images: &[PathBuf], args: &DetectorArgs, summary_only: bool) -> Result<()> {
    let detector = args.build()?;
    let mut entries = Vec::with_capacity(images.len());

    for path in images {
        let started = Instant::now();
        let entry = match load_and_detect(&detector, path) {
            Ok(detection) => {
                BatchEntry::success(path.clone(), detection.bounds.confidence, started.elapsed())
            }
            Err(err) => BatchEntry::failure(path.clone(), err.to_string(), started.elapsed()),
        };
        info!(
            path = %path.display(),
            detected = entry.detected,
            elapsed_ms = entry.elapsed_ms,
            "Batch entry"
        );
        entries.push(entry);
    }

    let summary = BatchSummary::from_entries(&entries);
    info!(
        total = summary.total,
        detected = summary.detected,
        success_rate = summary.success_rate,
        "Batch complete"
    );
    let report = BatchReport {
        summary,
        entries: if summary_only { Vec::new() } else { entries },
    };
    println!("{}", args.to_json(&report)?);
    Ok(())
}

// -- config ------------------------------------------------------------------

fn run_config(args: &DetectorArgs) -> Result<()> {
    let detector = args.build()?;
    println!("{}", args.to_json(detector.config())?);
    Ok(())
}
