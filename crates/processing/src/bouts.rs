//! Bout segmentation shared by the batch and realtime analyzers.
//!
//! A bout is a run of consecutive above-threshold speed samples. The
//! detector consumes one sample at a time and reports a bout when the run
//! closes, so batch analysis is just the streaming detector fed the whole
//! trace.

use serde::{Deserialize, Serialize};

use boutscope_common::{ensure_at_least, AnalysisDefaults, BoutscopeError, BoutscopeResult};
use boutscope_model::Bout;

/// Acceptance rules for a candidate run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoutCriteria {
    /// Samples at or below this speed are rest.
    pub speed_threshold: f64,
    /// Shortest accepted run, in frames.
    pub min_frames_per_bout: usize,
    /// Longest accepted plateau at the peak speed (repeats after the first).
    pub max_frames_at_peak: usize,
    pub frame_rate: u32,
}

impl BoutCriteria {
    /// Reject a zero frame rate, zero minimum length or negative threshold.
    pub fn validate(&self) -> BoutscopeResult<()> {
        ensure_at_least("frame_rate", self.frame_rate, 1)?;
        ensure_at_least("min_frames_per_bout", self.min_frames_per_bout, 1)?;
        if !self.speed_threshold.is_finite() || self.speed_threshold < 0.0 {
            return Err(BoutscopeError::config(format!(
                "speed_threshold must be a non-negative number, got {}",
                self.speed_threshold
            )));
        }
        Ok(())
    }
}

impl From<&AnalysisDefaults> for BoutCriteria {
    fn from(defaults: &AnalysisDefaults) -> Self {
        Self {
            speed_threshold: defaults.speed_threshold,
            min_frames_per_bout: defaults.min_frames_per_bout,
            max_frames_at_peak: defaults.max_frames_at_peak,
            frame_rate: defaults.frame_rate,
        }
    }
}

impl Default for BoutCriteria {
    fn default() -> Self {
        Self::from(&AnalysisDefaults::default())
    }
}

/// A run that has not closed yet.
#[derive(Debug, Clone, Copy)]
struct OpenRun {
    start: usize,
    len: usize,
    peak: usize,
    peak_speed: f64,
    plateau: usize,
    displacement: f64,
}

/// Streaming bout detector.
#[derive(Debug, Clone)]
pub struct BoutDetector {
    criteria: BoutCriteria,
    run: Option<OpenRun>,
}

impl BoutDetector {
    /// A detector at rest, after validating `criteria`.
    pub fn new(criteria: BoutCriteria) -> BoutscopeResult<Self> {
        criteria.validate()?;
        Ok(Self {
            criteria,
            run: None,
        })
    }

    /// Rules this detector applies.
    pub fn criteria(&self) -> &BoutCriteria {
        &self.criteria
    }

    /// Whether a run is currently open.
    pub fn in_bout(&self) -> bool {
        self.run.is_some()
    }

    /// Whether `speed` counts as rest. NaN is rest.
    pub fn is_rest(&self, speed: f64) -> bool {
        speed.is_nan() || speed <= self.criteria.speed_threshold
    }

    /// Feed the sample for `frame`. Returns a bout when this sample closes
    /// an accepted run.
    pub fn push(&mut self, frame: usize, speed: f64) -> Option<Bout> {
        if self.is_rest(speed) {
            return self.run.take().and_then(|run| self.accept(run));
        }

        let frame_rate = self.criteria.frame_rate as f64;
        match self.run.as_mut() {
            None => {
                self.run = Some(OpenRun {
                    start: frame,
                    len: 1,
                    peak: frame,
                    peak_speed: speed,
                    plateau: 0,
                    displacement: speed / frame_rate,
                });
            }
            Some(run) => {
                run.len += 1;
                run.displacement += speed / frame_rate;
                if speed > run.peak_speed {
                    run.peak = frame;
                    run.peak_speed = speed;
                    run.plateau = 0;
                } else if speed == run.peak_speed {
                    run.plateau += 1;
                }
            }
        }
        None
    }

    /// Close a run left open at the end of the input.
    pub fn finish(&mut self) -> Option<Bout> {
        self.run.take().and_then(|run| self.accept(run))
    }

    /// Drop any open run.
    pub fn reset(&mut self) {
        self.run = None;
    }

    fn accept(&self, run: OpenRun) -> Option<Bout> {
        if run.len < self.criteria.min_frames_per_bout
            || run.plateau > self.criteria.max_frames_at_peak
        {
            return None;
        }
        // A bout peaking on its first sample began in the frame before.
        let start = if run.peak == run.start {
            run.start.saturating_sub(1)
        } else {
            run.start
        };
        Some(Bout {
            start,
            peak: run.peak,
            end: run.start + run.len - 1,
            displacement: run.displacement,
            peak_speed: run.peak_speed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn criteria(threshold: f64, min: usize, max_at_peak: usize) -> BoutCriteria {
        BoutCriteria {
            speed_threshold: threshold,
            min_frames_per_bout: min,
            max_frames_at_peak: max_at_peak,
            frame_rate: 1,
        }
    }

    fn run(detector: &mut BoutDetector, speeds: &[f64]) -> Vec<Bout> {
        let mut bouts: Vec<Bout> = speeds
            .iter()
            .enumerate()
            .filter_map(|(i, &s)| detector.push(i, s))
            .collect();
        bouts.extend(detector.finish());
        bouts
    }

    #[test]
    fn test_single_bout() {
        let mut d = BoutDetector::new(criteria(5.0, 2, 1)).unwrap();
        let bouts = run(&mut d, &[0.0, 0.0, 6.0, 9.0, 7.0, 0.0, 0.0]);
        assert_eq!(bouts.len(), 1);
        let b = bouts[0];
        assert_eq!((b.start, b.peak, b.end), (2, 3, 4));
        assert_eq!(b.displacement, 22.0);
        assert_eq!(b.peak_speed, 9.0);
    }

    #[test]
    fn test_peak_at_run_start_moves_start_back() {
        let mut d = BoutDetector::new(criteria(1.0, 2, 1)).unwrap();
        let bouts = run(&mut d, &[0.0, 9.0, 4.0, 2.0, 0.0]);
        assert_eq!((bouts[0].start, bouts[0].peak, bouts[0].end), (0, 1, 3));

        // Saturates at frame zero.
        let bouts = run(&mut d, &[9.0, 4.0, 0.0]);
        assert_eq!(bouts[0].start, 0);
    }

    #[test]
    fn test_short_run_rejected() {
        let mut d = BoutDetector::new(criteria(1.0, 3, 1)).unwrap();
        assert!(run(&mut d, &[0.0, 5.0, 6.0, 0.0]).is_empty());
    }

    #[test]
    fn test_plateau_limit() {
        let speeds = [0.0, 3.0, 8.0, 8.0, 8.0, 2.0, 0.0];
        let mut strict = BoutDetector::new(criteria(1.0, 2, 1)).unwrap();
        assert!(run(&mut strict, &speeds).is_empty());

        let mut lenient = BoutDetector::new(criteria(1.0, 2, 2)).unwrap();
        let bouts = run(&mut lenient, &speeds);
        assert_eq!(bouts[0].peak, 2);
    }

    #[test]
    fn test_higher_peak_resets_plateau() {
        let mut d = BoutDetector::new(criteria(1.0, 2, 0)).unwrap();
        let bouts = run(&mut d, &[0.0, 5.0, 5.0, 7.0, 3.0, 0.0]);
        assert_eq!(bouts.len(), 1);
        assert_eq!(bouts[0].peak, 3);
    }

    #[test]
    fn test_threshold_is_inclusive_rest() {
        let mut d = BoutDetector::new(criteria(5.0, 1, 1)).unwrap();
        assert!(d.is_rest(5.0));
        assert!(d.is_rest(f64::NAN));
        assert!(!d.is_rest(5.1));
    }

    #[test]
    fn test_open_run_closed_by_finish() {
        let mut d = BoutDetector::new(criteria(1.0, 2, 1)).unwrap();
        assert!(d.push(0, 0.0).is_none());
        assert!(d.push(1, 3.0).is_none());
        assert!(d.push(2, 4.0).is_none());
        assert!(d.in_bout());
        let b = d.finish().unwrap();
        assert_eq!((b.start, b.peak, b.end), (1, 2, 2));
        assert!(!d.in_bout());
        assert!(d.finish().is_none());
    }

    #[test]
    fn test_reset_discards_run() {
        let mut d = BoutDetector::new(criteria(1.0, 1, 1)).unwrap();
        d.push(0, 3.0);
        d.reset();
        assert!(d.push(1, 0.0).is_none());
    }

    #[test]
    fn test_invalid_criteria() {
        assert!(BoutDetector::new(criteria(-1.0, 2, 1)).unwrap_err().is_config());
        assert!(BoutDetector::new(criteria(1.0, 0, 1)).unwrap_err().is_config());
        let mut c = criteria(1.0, 2, 1);
        c.frame_rate = 0;
        assert!(c.validate().unwrap_err().is_config());
        BoutCriteria::default().validate().unwrap();
    }
}
