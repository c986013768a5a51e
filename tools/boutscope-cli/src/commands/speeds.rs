//! Print instant speeds of a trajectory.

use std::path::PathBuf;

use boutscope_common::config::AppConfig;
use boutscope_processing::compute_instant_speeds;

pub fn run(trajectory: PathBuf, frame_rate: Option<u32>, config: &AppConfig) -> anyhow::Result<()> {
    let frame_rate = frame_rate.unwrap_or(config.analysis.frame_rate);
    let positions = super::read_trajectory(&trajectory)?;
    let speeds = compute_instant_speeds(&positions, frame_rate)?;

    print!("{}", speeds.to_text());
    tracing::info!(frames = speeds.len(), max_speed = speeds.max(), "speeds computed");
    Ok(())
}
