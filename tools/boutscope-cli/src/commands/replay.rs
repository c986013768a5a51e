//! Stream a recorded trajectory through the realtime analyzer.

use std::path::PathBuf;

use boutscope_common::config::AppConfig;
use boutscope_common::FrameClock;
use boutscope_model::{Bout, BOUT_TSV_HEADER};
use boutscope_processing::RealtimeMovementAnalyzer;

use super::AnalysisArgs;

pub fn run(
    trajectory: PathBuf,
    analysis: AnalysisArgs,
    taps: Option<usize>,
    config: &AppConfig,
) -> anyhow::Result<()> {
    let criteria = analysis.criteria(&config.analysis);
    let taps = taps.unwrap_or(config.analysis.fir_taps);
    let mut analyzer = RealtimeMovementAnalyzer::new(taps, criteria)?;
    let clock = FrameClock::new(criteria.frame_rate)?;

    let positions = super::read_trajectory(&trajectory)?;

    println!("{BOUT_TSV_HEADER}\treported_at_secs");
    let mut count = 0usize;
    for &point in positions.iter() {
        let analysis = analyzer.process_next_point(point);
        if let Some(bout) = analysis.completed_bout {
            print_bout(&bout, clock.frame_to_secs(analysis.frame));
            count += 1;
        }
    }
    if let Some(bout) = analyzer.flush() {
        print_bout(&bout, clock.frame_to_secs(analyzer.frames_processed()));
        count += 1;
    }

    tracing::info!(
        frames = analyzer.frames_processed(),
        bouts = count,
        taps,
        "replay finished"
    );
    Ok(())
}

fn print_bout(bout: &Bout, reported_at: f64) {
    println!("{}\t{reported_at:.3}", bout.to_tsv_line());
}
