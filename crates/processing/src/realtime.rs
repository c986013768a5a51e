//! Sample-by-sample movement analysis during acquisition.

use std::collections::VecDeque;

use tracing::debug;

use boutscope_common::{ensure_at_least, BoutscopeResult};
use boutscope_model::{Bout, Point2D};

use crate::bouts::{BoutCriteria, BoutDetector};

/// Direct-form FIR filter with equal taps.
#[derive(Debug, Clone)]
pub struct BoxcarFir {
    taps: Vec<f64>,
    /// Newest sample first.
    delay: VecDeque<f64>,
}

impl BoxcarFir {
    /// Filter averaging the last `tap_count` samples; zero taps is a config error.
    pub fn new(tap_count: usize) -> BoutscopeResult<Self> {
        ensure_at_least("tap_count", tap_count, 1)?;
        Ok(Self {
            taps: vec![1.0 / tap_count as f64; tap_count],
            delay: VecDeque::from(vec![0.0; tap_count]),
        })
    }

    /// Number of filter taps.
    pub fn tap_count(&self) -> usize {
        self.taps.len()
    }

    /// Shift `sample` into the delay line and return the filter output.
    pub fn push(&mut self, sample: f64) -> f64 {
        self.delay.pop_back();
        self.delay.push_front(sample);
        let mut out = 0.0;
        for (t, v) in self.taps.iter().zip(&self.delay) {
            out += t * v;
        }
        out
    }

    /// Zero the delay line.
    pub fn reset(&mut self) {
        self.delay.iter_mut().for_each(|v| *v = 0.0);
    }
}

/// Everything learned from one incoming sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointAnalysis {
    pub frame: usize,
    pub original: Point2D,
    pub smoothed: Point2D,
    pub instant_speed: f64,
    /// A bout that closed on this sample.
    pub completed_bout: Option<Bout>,
}

/// Online counterpart of [`MovementAnalyzer`](crate::MovementAnalyzer).
///
/// Positions are smoothed by a causal boxcar per axis, speeds come from the
/// smoothed positions, and bouts are reported on the first rest sample after
/// their run. The first `tap_count` samples only fill the filter: their
/// speeds are reported but kept out of bout detection.
#[derive(Debug, Clone)]
pub struct RealtimeMovementAnalyzer {
    fir_x: BoxcarFir,
    fir_y: BoxcarFir,
    last_smoothed: Point2D,
    frame: usize,
    detector: BoutDetector,
}

impl RealtimeMovementAnalyzer {
    /// Analyzer with a `tap_count` boxcar prefilter and bout `criteria`.
    pub fn new(tap_count: usize, criteria: BoutCriteria) -> BoutscopeResult<Self> {
        Ok(Self {
            fir_x: BoxcarFir::new(tap_count)?,
            fir_y: BoxcarFir::new(tap_count)?,
            last_smoothed: Point2D::default(),
            frame: 0,
            detector: BoutDetector::new(criteria)?,
        })
    }

    /// Number of prefilter taps.
    pub fn tap_count(&self) -> usize {
        self.fir_x.tap_count()
    }

    /// Bout rules applied to the smoothed speeds.
    pub fn criteria(&self) -> &BoutCriteria {
        self.detector.criteria()
    }

    /// Points fed in since construction or the last reset.
    pub fn frames_processed(&self) -> usize {
        self.frame
    }

    /// Whether the filter delay line has filled.
    pub fn is_warmed_up(&self) -> bool {
        self.frame >= self.tap_count()
    }

    /// Smooth one raw position, update the speed and report any bout it closes.
    pub fn process_next_point(&mut self, raw: Point2D) -> PointAnalysis {
        let smoothed = Point2D::new(self.fir_x.push(raw.x), self.fir_y.push(raw.y));
        let rate = self.detector.criteria().frame_rate as f64;
        let instant_speed = rate * smoothed.distance_to(&self.last_smoothed);
        self.last_smoothed = smoothed;

        let frame = self.frame;
        let gated = if self.is_warmed_up() { instant_speed } else { 0.0 };
        let completed_bout = self.detector.push(frame, gated);
        if let Some(bout) = &completed_bout {
            debug!(start = bout.start, peak = bout.peak, end = bout.end, "bout completed");
        }
        self.frame += 1;

        PointAnalysis {
            frame,
            original: raw,
            smoothed,
            instant_speed,
            completed_bout,
        }
    }

    /// Close a bout still open when acquisition stops.
    pub fn flush(&mut self) -> Option<Bout> {
        self.detector.finish()
    }

    /// Clear filter history, speed state and any open bout.
    pub fn reset(&mut self) {
        self.fir_x.reset();
        self.fir_y.reset();
        self.last_smoothed = Point2D::default();
        self.frame = 0;
        self.detector.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn criteria() -> BoutCriteria {
        BoutCriteria {
            speed_threshold: 5.0,
            min_frames_per_bout: 2,
            max_frames_at_peak: 1,
            frame_rate: 10,
        }
    }

    #[test]
    fn test_fir_boxcar() {
        let mut fir = BoxcarFir::new(4).unwrap();
        assert_eq!(fir.push(4.0), 1.0);
        assert_eq!(fir.push(4.0), 2.0);
        assert_eq!(fir.push(4.0), 3.0);
        assert_eq!(fir.push(4.0), 4.0);
        assert_eq!(fir.push(0.0), 3.0);
        fir.reset();
        assert_eq!(fir.push(8.0), 2.0);
        assert!(BoxcarFir::new(0).is_err());
    }

    #[test]
    fn test_warm_up_keeps_bouts_out() {
        let mut rt = RealtimeMovementAnalyzer::new(3, criteria()).unwrap();
        // Large jump from the origin while the filter fills.
        for _ in 0..3 {
            let a = rt.process_next_point(Point2D::new(30.0, 0.0));
            assert!(a.instant_speed > 5.0);
            assert!(a.completed_bout.is_none());
        }
        assert!(rt.is_warmed_up());
        let a = rt.process_next_point(Point2D::new(30.0, 0.0));
        assert_eq!(a.instant_speed, 0.0);
        assert!(rt.flush().is_none());
    }

    #[test]
    fn test_bout_reported_after_run_ends() {
        let mut rt = RealtimeMovementAnalyzer::new(1, criteria()).unwrap();
        let xs = [0.0, 0.0, 1.0, 3.0, 4.0, 4.0, 4.0];
        let mut reported = Vec::new();
        for (i, &x) in xs.iter().enumerate() {
            let a = rt.process_next_point(Point2D::new(x, 0.0));
            assert_eq!(a.frame, i);
            if let Some(b) = a.completed_bout {
                reported.push((i, b));
            }
        }
        assert_eq!(reported.len(), 1);
        let (at, bout) = reported[0];
        assert_eq!(at, 5);
        assert_eq!((bout.start, bout.peak, bout.end), (2, 3, 4));
        assert!(at > bout.end);
    }

    #[test]
    fn test_flush_and_reset() {
        let mut rt = RealtimeMovementAnalyzer::new(1, criteria()).unwrap();
        for x in [0.0, 0.0, 2.0, 5.0, 9.0] {
            rt.process_next_point(Point2D::new(x, 0.0));
        }
        let open = rt.flush().unwrap();
        assert_eq!((open.start, open.end), (2, 4));

        rt.reset();
        assert_eq!(rt.frames_processed(), 0);
        assert!(!rt.is_warmed_up());
        let a = rt.process_next_point(Point2D::new(0.0, 0.0));
        assert_eq!(a.smoothed, Point2D::new(0.0, 0.0));
        assert_eq!(a.instant_speed, 0.0);
    }
}
