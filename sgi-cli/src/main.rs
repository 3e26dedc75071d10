//! sgi - headless front end for the scene editor core
//!
//! Lists, renders, validates and normalises OBJ-style scene files.

use anyhow::Result;
use clap::{Parser, Subcommand};
use sgi_cli::{parse_pan, RenderOptions, Session};
use sgi_core::{EditorConfig, LineClipper, ProjectionMode};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sgi")]
#[command(about = "Inspect and render 2D/3D scene files", long_about = None)]
struct Cli {
    /// Editor configuration (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the objects of a scene
    List { file: PathBuf },
    /// Print the clipped device-space draw list
    Render {
        file: PathBuf,
        #[arg(long, default_value_t = 800.0)]
        width: f64,
        #[arg(long, default_value_t = 600.0)]
        height: f64,
        /// Line clipper: CS or LB
        #[arg(long)]
        clipper: Option<LineClipper>,
        /// parallel or perspective
        #[arg(long)]
        projection: Option<ProjectionMode>,
        /// Window offset in world units, as dx,dy
        #[arg(long, value_parser = parse_pan, allow_hyphen_values = true)]
        pan: Option<(f64, f64)>,
        /// Zoom factor applied to the window
        #[arg(long)]
        zoom: Option<f64>,
    },
    /// Report records the importer skipped; exits non-zero if any were
    Check { file: PathBuf },
    /// Load a scene and write it back in canonical form
    Convert {
        input: PathBuf,
        /// Output file; stdout when omitted
        output: Option<PathBuf>,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match &cli.config {
        Some(path) => EditorConfig::load(path)?,
        None => EditorConfig::default(),
    };
    let mut stdout = io::stdout().lock();

    match cli.command {
        Commands::List { file } => {
            Session::open(config, &file)?.list(&mut stdout)?;
        }
        Commands::Render {
            file,
            width,
            height,
            clipper,
            projection,
            pan,
            zoom,
        } => {
            let options = RenderOptions {
                width,
                height,
                clipper,
                projection,
                pan: pan.unwrap_or_default(),
                zoom,
            };
            Session::open(config, &file)?.render(&options, &mut stdout)?;
        }
        Commands::Check { file } => {
            if !Session::open(config, &file)?.check(&mut stdout)? {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Convert { input, output } => {
            let text = Session::open(config, &input)?.convert();
            match output {
                Some(path) => {
                    std::fs::write(&path, text)?;
                    tracing::info!(path = %path.display(), "scene written");
                }
                None => stdout.write_all(text.as_bytes())?,
            }
        }
    }

    stdout.flush()?;
    Ok(ExitCode::SUCCESS)
}
