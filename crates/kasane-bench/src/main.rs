//! kasane-bench: CLI tool for running and timing operation pipelines.
//!
//! Loads an image (or a saved project), applies an operation list, and
//! prints per-run timings. Useful for:
//!
//! - Measuring how kernel size affects convolution cost
//! - Checking warm-cache speedup after a suffix edit
//! - Exporting a processed result to a PNG file
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin kasane-bench -- [OPTIONS] <IMAGE_PATH>
//! cargo run --release --bin kasane-bench -- --project saved.json --output out.png
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use kasane_io::Project;
use kasane_pipeline::{Layer, Session};
use serde::Serialize;

/// Run and time a kasane operation pipeline.
///
/// The operation list comes from `--operations-json` (a JSON array of
/// layer records) or from a saved project file; with neither, the image
/// passes through unchanged.
#[derive(Parser)]
#[command(name = "kasane-bench", version)]
struct Cli {
    /// Path to the input image (PNG, JPEG, BMP, WebP). Ignored when
    /// --project is given.
    image_path: Option<PathBuf>,

    /// Load image and operations from a saved project file.
    #[arg(long, conflicts_with = "operations_json")]
    project: Option<PathBuf>,

    /// Operation list as a JSON array of layer records.
    #[arg(long)]
    operations_json: Option<String>,

    /// Pipeline position to start processing from (edit hint).
    #[arg(long, default_value_t = 0)]
    start: usize,

    /// Write the processed result to a PNG file.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Number of runs for averaging. The cache is warm after run 1.
    #[arg(long, default_value_t = 1, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    runs: usize,

    /// Output the timing summary as JSON instead of a plain report.
    #[arg(long)]
    json: bool,
}

/// Timing summary across all runs.
#[derive(Serialize)]
struct Summary {
    width: u32,
    height: u32,
    layer_count: usize,
    runs: usize,
    run_ms: Vec<f64>,
    mean_ms: f64,
}

/// Build the session from CLI inputs.
fn session_from_cli(cli: &Cli) -> Result<Session, String> {
    if let Some(ref path) = cli.project {
        let document = std::fs::read_to_string(path)
            .map_err(|e| format!("Error reading {}: {e}", path.display()))?;
        return Project::load_from_string(&document)
            .and_then(Project::into_session)
            .map_err(|e| format!("Error loading project {}: {e}", path.display()));
    }

    let Some(ref path) = cli.image_path else {
        return Err("Either an image path or --project is required".into());
    };
    let bytes =
        std::fs::read(path).map_err(|e| format!("Error reading {}: {e}", path.display()))?;
    let image = image::load_from_memory(&bytes)
        .map_err(|e| format!("Error decoding {}: {e}", path.display()))?
        .to_rgba8();
    let mut session = Session::new(image);

    if let Some(ref json) = cli.operations_json {
        let layers: Vec<Layer> = serde_json::from_str(json)
            .map_err(|e| format!("Error parsing --operations-json: {e}"))?;
        session = Session::restore(session.original().clone(), layers)
            .map_err(|e| format!("Invalid operation list: {e}"))?;
    }

    Ok(session)
}

#[allow(clippy::cast_precision_loss)]
fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut session = match session_from_cli(&cli) {
        Ok(s) => s,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    eprintln!(
        "Image: {}x{}, {} layer(s), {} run(s)",
        session.original().width(),
        session.original().height(),
        session.list().len(),
        cli.runs,
    );

    let mut run_ms = Vec::with_capacity(cli.runs);
    let mut last = None;
    for run in 0..cli.runs {
        let started = Instant::now();
        match session.process(cli.start) {
            Ok(processed) => {
                let elapsed = started.elapsed().as_secs_f64() * 1000.0;
                run_ms.push(elapsed);
                if !cli.json {
                    println!("run {}: {elapsed:.3}ms", run + 1);
                }
                last = Some(processed);
            }
            Err(e) => {
                eprintln!("Pipeline error: {e}");
                return ExitCode::FAILURE;
            }
        }
    }

    let Some(processed) = last else {
        // runs >= 1 is enforced by the parser.
        return ExitCode::FAILURE;
    };

    let mean_ms = run_ms.iter().sum::<f64>() / run_ms.len() as f64;
    if cli.json {
        let summary = Summary {
            width: processed.dimensions.width,
            height: processed.dimensions.height,
            layer_count: session.list().len(),
            runs: cli.runs,
            run_ms,
            mean_ms,
        };
        match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error serializing summary: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        println!("mean: {mean_ms:.3}ms over {} run(s)", cli.runs);
    }

    if let Some(ref output) = cli.output {
        match processed.image.save(output) {
            Ok(()) => eprintln!("Output written to {}", output.display()),
            Err(e) => {
                eprintln!("Error writing {}: {e}", output.display());
                return ExitCode::FAILURE;
            }
        }
    }

    ExitCode::SUCCESS
}
