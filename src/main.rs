use anyhow::Context;
use clap::Parser;
use rayon::prelude::*;
use std::path::PathBuf;
use watermarker::config::Config;
use watermarker::pipeline::unique_ids;
use watermarker::{MediaKind, Watermarker};

/// Watermarker - stamp text watermarks onto photos, videos and video notes
#[derive(Parser, Debug)]
#[command(name = "watermarker")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (built-in defaults when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    /// Kind of media in FILES
    #[arg(value_enum)]
    kind: MediaKind,

    /// Files to watermark
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

fn main() {
    // Parse command-line arguments
    let args = Args::parse();

    // Initialize logging subsystem
    watermarker::logging::init_subscriber(args.json_logs)
        .expect("Failed to initialize logging subsystem");

    let config = match &args.config {
        Some(path) => Config::from_file(path).unwrap_or_else(|e| {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }),
        None => Config::default(),
    };

    if let Err(e) = config.storage.ensure_dirs() {
        eprintln!("Failed to create working directories: {}", e);
        std::process::exit(1);
    }

    tracing::info!(
        config_file = ?args.config,
        kind = %args.kind,
        files = args.files.len(),
        work_dir = %config.storage.work_dir.display(),
        "Configuration loaded successfully"
    );

    let watermarker = Watermarker::new(config).unwrap_or_else(|e| {
        eprintln!("{}", e);
        std::process::exit(1);
    });

    // Inputs are read in place; ids keep same-stem inputs apart
    let ids = unique_ids(&args.files);

    let failures: usize = args
        .files
        .par_iter()
        .zip(ids.par_iter())
        .map(|(file, id)| {
            let result = watermarker
                .process_path_as(args.kind, file, id)
                .with_context(|| format!("failed to watermark {}", file.display()));

            match result {
                Ok(output) => {
                    println!("{}", output.display());
                    0
                }
                Err(e) => {
                    tracing::error!(file = %file.display(), error = format!("{:#}", e), "Processing failed");
                    1
                }
            }
        })
        .sum();

    if failures > 0 {
        tracing::error!(failures, total = args.files.len(), "Some files could not be watermarked");
        std::process::exit(1);
    }
}
