//! Detect movement bouts in a trajectory file.

use std::path::PathBuf;

use boutscope_common::config::AppConfig;
use boutscope_common::FrameClock;
use boutscope_model::serialize_bouts;
use boutscope_processing::{smooth_trajectory, MovementAnalyzer};

use super::AnalysisArgs;

pub fn run(
    trajectory: PathBuf,
    analysis: AnalysisArgs,
    smooth: Option<usize>,
    json: bool,
    config: &AppConfig,
) -> anyhow::Result<()> {
    let criteria = analysis.criteria(&config.analysis);
    let analyzer = MovementAnalyzer::new(criteria)?;
    let clock = FrameClock::new(criteria.frame_rate)?;

    let mut positions = super::read_trajectory(&trajectory)?;
    if let Some(window) = smooth {
        positions = smooth_trajectory(&positions, window)?;
        tracing::debug!(window, "trajectory smoothed before analysis");
    }

    let report = analyzer.analyze(&positions)?;
    tracing::info!(
        bouts = report.bout_count(),
        rate_hz = report.bout_rate_hz(),
        "bout analysis complete"
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "# {} analyzed {} at {} Hz",
        trajectory.display(),
        clock.epoch_wall(),
        clock.frame_rate()
    );
    print!("{}", serialize_bouts(&report.bouts));
    if let Some(mean) = report.mean_peak_speed() {
        println!(
            "# {} bouts over {:.2}s, mean peak speed {mean:.2}, total displacement {:.2}",
            report.bout_count(),
            clock.frame_to_secs(report.speeds.len()),
            report.total_displacement()
        );
    }
    Ok(())
}
