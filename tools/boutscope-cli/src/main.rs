//! Boutscope CLI — Command-line interface for tail tracking and bout analysis.
//!
//! Usage:
//!   boutscope speeds <TRAJECTORY>                 Print instant speeds
//!   boutscope bouts <TRAJECTORY>                  Detect movement bouts
//!   boutscope smooth <TRAJECTORY>                 Zero-phase smoothing
//!   boutscope replay <TRAJECTORY>                 Stream through the realtime analyzer
//!   boutscope track <DIR> --start X,Y --end X,Y   Measure tail angles in frames
//!   boutscope config                              Show effective configuration

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

use boutscope_common::config::{config_file_path, AppConfig};
use boutscope_common::logging;
use boutscope_model::PixelCoord;

mod commands;

use commands::AnalysisArgs;

#[derive(Parser)]
#[command(
    name = "boutscope",
    about = "Larval tail tracking and swim bout analysis",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to $XDG_CONFIG_HOME/boutscope/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the instant speed of every frame
    Speeds {
        /// Trajectory file (one "x y" pair per line)
        trajectory: PathBuf,

        /// Acquisition frame rate (Hz)
        #[arg(long)]
        frame_rate: Option<u32>,
    },

    /// Detect movement bouts in a trajectory
    Bouts {
        /// Trajectory file (one "x y" pair per line)
        trajectory: PathBuf,

        #[command(flatten)]
        analysis: AnalysisArgs,

        /// Smooth positions with this window before computing speeds
        #[arg(long)]
        smooth: Option<usize>,

        /// Print a JSON report instead of TSV
        #[arg(long)]
        json: bool,
    },

    /// Zero-phase smoothing of a trajectory
    Smooth {
        /// Trajectory file (one "x y" pair per line)
        trajectory: PathBuf,

        /// Boxcar window in frames
        #[arg(short, long)]
        window: Option<usize>,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Feed a trajectory sample by sample through the realtime analyzer
    Replay {
        /// Trajectory file (one "x y" pair per line)
        trajectory: PathBuf,

        #[command(flatten)]
        analysis: AnalysisArgs,

        /// Realtime FIR tap count
        #[arg(long)]
        taps: Option<usize>,
    },

    /// Measure tail segment angles in a directory of grayscale frames
    Track {
        /// Directory of PNG/TIFF frames, processed in file name order
        frames: PathBuf,

        /// Tail origin in pixels
        #[arg(long, value_parser = commands::parse_pixel)]
        start: PixelCoord,

        /// Tail tip in pixels
        #[arg(long, value_parser = commands::parse_pixel)]
        end: PixelCoord,

        /// Number of tail segments
        #[arg(long)]
        segments: Option<usize>,

        /// Background closing disk radius
        #[arg(long)]
        radius: Option<usize>,

        /// Foreground threshold (0-255)
        #[arg(long)]
        threshold: Option<u8>,

        /// Background refresh period in frames
        #[arg(long)]
        frame_rate: Option<u32>,

        /// Print one JSON array per frame instead of TSV
        #[arg(long)]
        json: bool,
    },

    /// Print the effective configuration
    Config {
        /// Save it to the config file
        #[arg(long)]
        write: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (config, fallback_reason) = match &cli.config {
        Some(path) => (
            AppConfig::load_from(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None,
        ),
        None => match AppConfig::try_load() {
            Ok(config) => (config, None),
            Err(e) => (AppConfig::default(), Some(e)),
        },
    };

    logging::init_logging(&logging::with_verbosity(&config.logging, cli.verbose));
    if let Some(e) = fallback_reason {
        tracing::warn!("Ignoring config at {:?}: {}", config_file_path(), e);
    }

    match cli.command {
        Commands::Speeds {
            trajectory,
            frame_rate,
        } => commands::speeds::run(trajectory, frame_rate, &config),
        Commands::Bouts {
            trajectory,
            analysis,
            smooth,
            json,
        } => commands::bouts::run(trajectory, analysis, smooth, json, &config),
        Commands::Smooth {
            trajectory,
            window,
            output,
        } => commands::smooth::run(trajectory, window, output, &config),
        Commands::Replay {
            trajectory,
            analysis,
            taps,
        } => commands::replay::run(trajectory, analysis, taps, &config),
        Commands::Track {
            frames,
            start,
            end,
            segments,
            radius,
            threshold,
            frame_rate,
            json,
        } => commands::track::run(
            frames, start, end, segments, radius, threshold, frame_rate, json, &config,
        ),
        Commands::Config { write } => commands::config::run(write, cli.config, &config),
    }
}
