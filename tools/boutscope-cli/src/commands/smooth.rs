//! Zero-phase smoothing of a trajectory file.

use std::path::PathBuf;

use anyhow::Context;

use boutscope_common::config::AppConfig;
use boutscope_processing::TrajectorySmoother;

pub fn run(
    trajectory: PathBuf,
    window: Option<usize>,
    output: Option<PathBuf>,
    config: &AppConfig,
) -> anyhow::Result<()> {
    let window = window.unwrap_or(config.analysis.smoothing_window);
    let mut positions = super::read_trajectory(&trajectory)?;

    let mut smoother = TrajectorySmoother::with_capacity(positions.len(), window)?;
    smoother.smooth(&mut positions, window)?;

    let text = positions.to_text();
    match output {
        Some(path) => {
            std::fs::write(&path, text)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Smoothed trajectory written to: {}", path.display());
        }
        None => print!("{text}"),
    }
    Ok(())
}
