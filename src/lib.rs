//! Redecor: detect the furniture in a room photo and render rearranged layouts.
//!
//! One run takes an image through four stages:
//!
//! 1. [`detect`]: find objects with a YOLOv8 model (or the mock detector)
//! 2. [`layout`]: turn raw detections into a pixel-space [`layout::Layout`]
//! 3. [`rearrange`]: draw N random orderings of the layout's objects
//! 4. [`render`]: draw each ordering on a copy of the image as `layout_{i}.jpg`
//!
//! [`pipeline`] chains the stages, [`server`] exposes them over HTTP and
//! [`run`] drives the command line.
//!
//! # Modules
//!
//! - [`layout`]: Layout types, JSON I/O and extraction from detections
//! - [`validation`]: Layout validation and error reporting
//! - [`config`]: YAML configuration
//! - [`error`]: Error types for redecor operations

pub mod config;
pub mod detect;
pub mod error;
pub mod layout;
pub mod pipeline;
pub mod rearrange;
pub mod render;
pub mod server;
pub mod validation;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

pub use error::RedecorError;

use config::Config;
use detect::DetectorBackend;
use pipeline::{PipelineOptions, PipelineOutput};
use rearrange::{RearrangeOptions, DEFAULT_NUM_VERSIONS};

/// The redecor CLI application.
#[derive(Parser)]
#[command(name = "redecor")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Detect objects in an image (or a directory of images) and render layout variants.
    Run(RunArgs),
    /// Generate rearranged variants of a layout JSON file.
    Rearrange(RearrangeArgs),
    /// Validate a layout JSON file for errors and warnings.
    Validate(ValidateArgs),
    /// Serve the HTTP API.
    Serve(ServeArgs),
}

/// Config and detector selection shared by `run` and `serve`.
#[derive(clap::Args)]
struct DetectorArgs {
    /// YAML config file.
    #[arg(long, env = "REDECOR_CONFIG")]
    config: Option<PathBuf>,

    /// YOLOv8 ONNX model file.
    #[arg(long, env = "REDECOR_MODEL")]
    model: Option<PathBuf>,

    /// Use the model-free mock detector.
    #[arg(long)]
    mock: bool,

    /// Seed for the mock detector.
    #[arg(long, requires = "mock")]
    mock_seed: Option<u64>,

    /// Expected SHA-256 of the model file.
    #[arg(long)]
    model_sha256: Option<String>,

    /// Load the model without checksum verification.
    #[arg(long)]
    trust_model: bool,
}

impl DetectorArgs {
    /// Loads the config file and applies flag overrides on top.
    fn load_config(&self) -> Result<Config, RedecorError> {
        let mut config = Config::load_or_default(self.config.as_deref())?;

        if let Some(model) = &self.model {
            config.detector.backend = DetectorBackend::Yolo;
            config.detector.model_path = model.clone();
        }
        if self.mock {
            config.detector.backend = DetectorBackend::Mock;
        }
        if self.mock_seed.is_some() {
            config.detector.mock_seed = self.mock_seed;
        }
        if let Some(sha256) = &self.model_sha256 {
            config.detector.sha256 = Some(sha256.clone());
        }
        if self.trust_model {
            config.detector.trust_source = true;
        }
        Ok(config)
    }
}

/// Arguments for the run subcommand.
#[derive(clap::Args)]
struct RunArgs {
    /// Input image, or a directory of images.
    input: PathBuf,

    /// Directory for rendered images [default: paths.output_dir from the config].
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Number of layout variants to render.
    #[arg(short = 'n', long)]
    num_versions: Option<usize>,

    /// Seed for reproducible variants.
    #[arg(long)]
    seed: Option<u64>,

    /// Also write the extracted layout to this file (single-image runs).
    #[arg(long)]
    layout_json: Option<PathBuf>,

    /// Skip the annotated `{stem}_detected.jpg` image.
    #[arg(long)]
    no_detected: bool,

    #[command(flatten)]
    detector: DetectorArgs,
}

/// Arguments for the rearrange subcommand.
#[derive(clap::Args)]
struct RearrangeArgs {
    /// Layout JSON file.
    input: PathBuf,

    /// Number of variants to generate.
    #[arg(short = 'n', long, default_value_t = DEFAULT_NUM_VERSIONS)]
    num_versions: usize,

    /// Seed for reproducible variants.
    #[arg(long)]
    seed: Option<u64>,

    /// Write the variants here instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ReportFormat {
    Text,
    Json,
}

/// Arguments for the validate subcommand.
#[derive(clap::Args)]
struct ValidateArgs {
    /// Layout JSON file to validate.
    input: PathBuf,

    /// Treat warnings as errors (exit non-zero if any warnings).
    #[arg(long)]
    strict: bool,

    /// Output format for the report.
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    output: ReportFormat,

    /// Width of the source image, enables bounds checks.
    #[arg(long, requires = "image_height")]
    image_width: Option<u32>,

    /// Height of the source image, enables bounds checks.
    #[arg(long, requires = "image_width")]
    image_height: Option<u32>,
}

/// Arguments for the serve subcommand.
#[derive(clap::Args)]
struct ServeArgs {
    /// Listen address [default: server.addr from the config].
    #[arg(long, env = "REDECOR_ADDR")]
    addr: Option<String>,

    #[command(flatten)]
    detector: DetectorArgs,
}

/// Run the redecor CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), RedecorError> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Run(args)) => run_run(args),
        Some(Commands::Rearrange(args)) => run_rearrange(args),
        Some(Commands::Validate(args)) => run_validate(args),
        Some(Commands::Serve(args)) => run_serve(args),
        None => {
            println!("redecor {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("{}.", env!("CARGO_PKG_DESCRIPTION"));
            println!();
            println!("Run 'redecor --help' for usage information.");
            Ok(())
        }
    }
}

/// Execute the run subcommand.
fn run_run(args: RunArgs) -> Result<(), RedecorError> {
    let mut config = args.detector.load_config()?;
    if let Some(n) = args.num_versions {
        config.rearrange.num_versions = n;
        // The per-request cap is a server concern.
        config.server.max_versions = config.server.max_versions.max(n);
    }
    if args.seed.is_some() {
        config.rearrange.seed = args.seed;
    }
    config.validate()?;

    let output_dir = args
        .output_dir
        .unwrap_or_else(|| config.paths.output_dir.clone());
    let opts = PipelineOptions {
        rearrange: config.rearrange.clone(),
        render: config.render.clone(),
        save_detected: !args.no_detected,
        layout_json: args.layout_json,
    };

    let mut detector = detect::build_detector(&config.detector)?;

    let outputs = if args.input.is_dir() {
        pipeline::run_batch(detector.as_mut(), &args.input, &output_dir, &opts)?
    } else {
        vec![pipeline::run_pipeline(
            detector.as_mut(),
            &args.input,
            &output_dir,
            &opts,
        )?]
    };

    for output in &outputs {
        print_run_summary(output);
    }
    info!(runs = outputs.len(), "done");
    Ok(())
}

fn print_run_summary(output: &PipelineOutput) {
    println!("Detected {} object(s)", output.layout.len());
    if let Some(path) = &output.layout_json {
        println!("  layout: {}", path.display());
    }
    for path in output.images() {
        println!("  {}", path.display());
    }
}

/// Execute the rearrange subcommand.
fn run_rearrange(args: RearrangeArgs) -> Result<(), RedecorError> {
    let layout = layout::io_json::read_layout_json(&args.input)?;
    let opts = RearrangeOptions {
        num_versions: args.num_versions,
        seed: args.seed,
    };
    let variants = rearrange::generate_rearranged_layouts(&layout, &opts)?;

    match &args.output {
        Some(path) => {
            layout::io_json::write_variants_json(path, &variants)?;
            println!(
                "Wrote {} variant(s) of {} object(s) to {}",
                variants.len(),
                layout.len(),
                path.display()
            );
        }
        None => {
            let json = layout::io_json::variants_to_json_string(&variants).map_err(|source| {
                RedecorError::LayoutJsonWrite {
                    path: PathBuf::from("-"),
                    source,
                }
            })?;
            println!("{}", json);
        }
    }
    Ok(())
}

/// Execute the validate subcommand.
fn run_validate(args: ValidateArgs) -> Result<(), RedecorError> {
    let layout = layout::io_json::read_layout_json(&args.input)?;

    let opts = validation::ValidateOptions {
        image_size: args.image_width.zip(args.image_height),
    };
    let report = validation::validate_layout(&layout, &opts);

    match args.output {
        ReportFormat::Json => {
            let json = serde_json::to_string_pretty(&report.to_json_value()).map_err(|source| {
                RedecorError::LayoutJsonWrite {
                    path: PathBuf::from("-"),
                    source,
                }
            })?;
            println!("{}", json);
        }
        ReportFormat::Text => print!("{}", report),
    }

    if report.passes(args.strict) {
        Ok(())
    } else {
        Err(RedecorError::ValidationFailed {
            error_count: report.error_count(),
            warning_count: report.warning_count(),
            report,
        })
    }
}

/// Execute the serve subcommand.
fn run_serve(args: ServeArgs) -> Result<(), RedecorError> {
    let mut config = args.detector.load_config()?;
    if let Some(addr) = args.addr {
        config.server.addr = addr;
    }
    config.validate()?;

    let detector = detect::build_detector(&config.detector)?;
    let state = server::AppState::new(detector, config);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(server::start_server(state))
}
