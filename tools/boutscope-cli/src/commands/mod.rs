//! Subcommand implementations and the helpers they share.

use std::path::Path;

use anyhow::Context;
use clap::Args;

use boutscope_common::config::AnalysisDefaults;
use boutscope_model::{PixelCoord, Trajectory};
use boutscope_processing::BoutCriteria;

pub mod bouts;
pub mod config;
pub mod replay;
pub mod smooth;
pub mod speeds;
pub mod track;

/// Bout criteria overrides; anything omitted comes from the config file.
#[derive(Debug, Clone, Default, Args)]
pub struct AnalysisArgs {
    /// Acquisition frame rate (Hz)
    #[arg(long)]
    pub frame_rate: Option<u32>,

    /// Speeds at or below this value are rest (pixels/sec)
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Minimum bout length in frames
    #[arg(long)]
    pub min_frames: Option<usize>,

    /// Maximum repeated samples at the peak speed
    #[arg(long)]
    pub max_at_peak: Option<usize>,
}

impl AnalysisArgs {
    pub fn criteria(&self, defaults: &AnalysisDefaults) -> BoutCriteria {
        BoutCriteria {
            speed_threshold: self.threshold.unwrap_or(defaults.speed_threshold),
            min_frames_per_bout: self.min_frames.unwrap_or(defaults.min_frames_per_bout),
            max_frames_at_peak: self.max_at_peak.unwrap_or(defaults.max_frames_at_peak),
            frame_rate: self.frame_rate.unwrap_or(defaults.frame_rate),
        }
    }
}

/// Parse `X,Y` into a pixel coordinate.
pub fn parse_pixel(s: &str) -> Result<PixelCoord, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y but got {s:?}"))?;
    let x = x
        .trim()
        .parse::<i32>()
        .map_err(|e| format!("invalid x coordinate {x:?}: {e}"))?;
    let y = y
        .trim()
        .parse::<i32>()
        .map_err(|e| format!("invalid y coordinate {y:?}: {e}"))?;
    Ok(PixelCoord::new(x, y))
}

pub fn read_trajectory(path: &Path) -> anyhow::Result<Trajectory> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read trajectory {}", path.display()))?;
    let trajectory = Trajectory::parse_text(&content)
        .with_context(|| format!("Failed to parse trajectory {}", path.display()))?;
    tracing::info!(path = %path.display(), frames = trajectory.len(), "trajectory loaded");
    Ok(trajectory)
}
