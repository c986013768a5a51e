//! Offline speed and bout analysis of a whole trajectory.

use serde::Serialize;
use tracing::debug;

use boutscope_common::{ensure_at_least, BoutscopeError, BoutscopeResult};
use boutscope_model::{Bout, SpeedTrace, Trajectory};

use crate::bouts::{BoutCriteria, BoutDetector};

/// Frame-to-frame speed: `frame_rate * |p[i] - p[i-1]|`, with `speed[0] = 0`.
pub fn compute_instant_speeds(trajectory: &Trajectory, frame_rate: u32) -> BoutscopeResult<SpeedTrace> {
    let mut speeds = SpeedTrace::zeros(trajectory.len());
    compute_instant_speeds_into(trajectory, frame_rate, &mut speeds)?;
    Ok(speeds)
}

/// Like [`compute_instant_speeds`], writing into a caller-owned trace of the
/// same length.
pub fn compute_instant_speeds_into(
    trajectory: &Trajectory,
    frame_rate: u32,
    speeds: &mut SpeedTrace,
) -> BoutscopeResult<()> {
    ensure_at_least("frame_rate", frame_rate, 1)?;
    if speeds.len() != trajectory.len() {
        return Err(BoutscopeError::dimension_mismatch(
            "compute_instant_speeds",
            trajectory.len(),
            speeds.len(),
        ));
    }

    let out = speeds.samples_mut();
    if let Some(first) = out.first_mut() {
        *first = 0.0;
    }
    let rate = frame_rate as f64;
    for (i, pair) in trajectory.points().windows(2).enumerate() {
        out[i + 1] = rate * pair[1].distance_to(&pair[0]);
    }
    Ok(())
}

/// Find bouts in `speeds`.
///
/// Samples at or below the threshold are clamped to zero in place, which
/// makes a second call on the same trace return the same bouts. A run still
/// open at the end of the trace is closed on its last sample.
pub fn detect_bouts(speeds: &mut SpeedTrace, criteria: &BoutCriteria) -> BoutscopeResult<Vec<Bout>> {
    let mut detector = BoutDetector::new(*criteria)?;
    for s in speeds.samples_mut() {
        if detector.is_rest(*s) {
            *s = 0.0;
        }
    }

    let mut bouts: Vec<Bout> = speeds
        .samples()
        .iter()
        .enumerate()
        .filter_map(|(frame, &s)| detector.push(frame, s))
        .collect();
    bouts.extend(detector.finish());
    debug!(samples = speeds.len(), bouts = bouts.len(), "bout detection finished");
    Ok(bouts)
}

/// Result of [`MovementAnalyzer::analyze`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub frame_rate: u32,
    /// Instant speeds after rest clamping.
    pub speeds: SpeedTrace,
    pub bouts: Vec<Bout>,
}

impl AnalysisReport {
    /// Number of accepted bouts.
    pub fn bout_count(&self) -> usize {
        self.bouts.len()
    }

    /// Mean of the bout peak speeds; `None` without bouts.
    pub fn mean_peak_speed(&self) -> Option<f64> {
        if self.bouts.is_empty() {
            return None;
        }
        let total: f64 = self.bouts.iter().map(|b| b.peak_speed).sum();
        Some(total / self.bouts.len() as f64)
    }

    /// Bouts per second of recording.
    pub fn bout_rate_hz(&self) -> f64 {
        if self.speeds.is_empty() {
            return 0.0;
        }
        let seconds = self.speeds.len() as f64 / self.frame_rate as f64;
        self.bouts.len() as f64 / seconds
    }

    /// Summed displacement of all bouts.
    pub fn total_displacement(&self) -> f64 {
        self.bouts.iter().map(|b| b.displacement).sum()
    }
}

/// Speeds plus bouts for a complete trajectory.
#[derive(Debug, Clone)]
pub struct MovementAnalyzer {
    criteria: BoutCriteria,
}

impl MovementAnalyzer {
    /// Analyzer applying `criteria`, validated up front.
    pub fn new(criteria: BoutCriteria) -> BoutscopeResult<Self> {
        criteria.validate()?;
        Ok(Self { criteria })
    }

    /// Rules used for bout detection.
    pub fn criteria(&self) -> &BoutCriteria {
        &self.criteria
    }

    /// Instant speeds and accepted bouts for a whole trajectory.
    pub fn analyze(&self, trajectory: &Trajectory) -> BoutscopeResult<AnalysisReport> {
        let mut speeds = compute_instant_speeds(trajectory, self.criteria.frame_rate)?;
        let bouts = detect_bouts(&mut speeds, &self.criteria)?;
        Ok(AnalysisReport {
            frame_rate: self.criteria.frame_rate,
            speeds,
            bouts,
        })
    }
}
