//! Zero-phase boxcar smoothing of trajectories.
//!
//! Each channel is filtered forward, reversed, filtered again and reversed
//! back. The two passes cancel each other's lag, so the impulse response is
//! symmetric about the impulse. Edges are padded by replicating the first
//! and last sample.

use boutscope_common::{ensure_at_least, BoutscopeResult};
use boutscope_model::{Point2D, Trajectory};

/// Reusable forward-backward boxcar smoother.
///
/// Scratch buffers are sized for one trace length and window and are only
/// reallocated when either changes.
#[derive(Debug, Clone, Default)]
pub struct TrajectorySmoother {
    window: usize,
    len: usize,
    border: usize,
    kernel: Vec<f64>,
    /// `len + 2 * border` samples.
    padded: Vec<f64>,
    filtered: Vec<f64>,
    reallocations: usize,
}

impl TrajectorySmoother {
    /// A smoother with no buffers allocated yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-size the buffers for traces of `len` samples and `window` taps.
    pub fn with_capacity(len: usize, window: usize) -> BoutscopeResult<Self> {
        ensure_at_least("window", window, 1)?;
        let mut smoother = Self::new();
        smoother.prepare(len, window);
        Ok(smoother)
    }

    /// Smooth `trajectory` in place with a `window`-tap boxcar.
    ///
    /// A window of 1 leaves the trajectory untouched.
    pub fn smooth(&mut self, trajectory: &mut Trajectory, window: usize) -> BoutscopeResult<()> {
        ensure_at_least("window", window, 1)?;
        if window == 1 || trajectory.is_empty() {
            return Ok(());
        }
        self.prepare(trajectory.len(), window);
        let points = trajectory.points_mut();
        self.smooth_channel(points, |p| p.x, |p, v| p.x = v);
        self.smooth_channel(points, |p| p.y, |p, v| p.y = v);
        Ok(())
    }

    /// Smoothed copy of `trajectory`.
    pub fn smoothed(&mut self, trajectory: &Trajectory, window: usize) -> BoutscopeResult<Trajectory> {
        let mut out = trajectory.clone();
        self.smooth(&mut out, window)?;
        Ok(out)
    }

    /// How many times the scratch buffers have been (re)allocated.
    pub fn reallocations(&self) -> usize {
        self.reallocations
    }

    fn prepare(&mut self, len: usize, window: usize) {
        if self.len == len && self.window == window && !self.kernel.is_empty() {
            return;
        }
        let border = window.div_ceil(2);
        self.window = window;
        self.len = len;
        self.border = border;
        self.kernel = vec![1.0 / window as f64; window];
        self.padded = vec![0.0; len + 2 * border];
        self.filtered = vec![0.0; len];
        self.reallocations += 1;
    }

    fn smooth_channel(
        &mut self,
        points: &mut [Point2D],
        get: fn(&Point2D) -> f64,
        set: fn(&mut Point2D, f64),
    ) {
        for (f, p) in self.filtered.iter_mut().zip(points.iter()) {
            *f = get(p);
        }
        self.filter_pass();
        self.filtered.reverse();
        self.filter_pass();
        self.filtered.reverse();
        for (p, &f) in points.iter_mut().zip(&self.filtered) {
            set(p, f);
        }
    }

    /// One boxcar pass over `filtered`, anchored `border` samples into the
    /// window.
    fn filter_pass(&mut self) {
        let n = self.len;
        let b = self.border;
        let (first, last) = (self.filtered[0], self.filtered[n - 1]);
        self.padded[..b].fill(first);
        self.padded[b..b + n].copy_from_slice(&self.filtered);
        self.padded[b + n..].fill(last);

        for (i, out) in self.filtered.iter_mut().enumerate() {
            *out = self
                .kernel
                .iter()
                .zip(&self.padded[i..i + self.window])
                .map(|(k, v)| k * v)
                .sum();
        }
    }
}

/// One-shot zero-phase smoothing.
pub fn smooth_trajectory(trajectory: &Trajectory, window: usize) -> BoutscopeResult<Trajectory> {
    TrajectorySmoother::new().smoothed(trajectory, window)
}

/// Single-pass causal boxcar with a zero-filled history.
///
/// Output `i` is the mean of samples `i - taps + 1 ..= i`, counting samples
/// before the start as zero. Terms are summed newest first, matching the
/// realtime FIR path sample for sample.
pub fn causal_boxcar(trajectory: &Trajectory, taps: usize) -> BoutscopeResult<Trajectory> {
    ensure_at_least("taps", taps, 1)?;
    let coef = 1.0 / taps as f64;
    let points = trajectory.points();
    let out = (0..points.len())
        .map(|i| {
            let mut x = 0.0;
            let mut y = 0.0;
            for k in 0..taps {
                let p = i.checked_sub(k).map(|j| points[j]).unwrap_or_default();
                x += coef * p.x;
                y += coef * p.y;
            }
            Point2D::new(x, y)
        })
        .collect();
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(xs: &[f64]) -> Trajectory {
        Trajectory::from_channels(xs, &vec![0.0; xs.len()]).unwrap()
    }

    #[test]
    fn test_window_one_is_identity() {
        let t = line(&[1.0, 5.0, -2.0, 7.0]);
        assert_eq!(smooth_trajectory(&t, 1).unwrap(), t);
    }

    #[test]
    fn test_zero_window_rejected() {
        let mut t = line(&[1.0, 2.0]);
        assert!(TrajectorySmoother::new().smooth(&mut t, 0).unwrap_err().is_config());
        assert!(causal_boxcar(&t, 0).unwrap_err().is_config());
        assert!(TrajectorySmoother::with_capacity(10, 0).is_err());
    }

    #[test]
    fn test_constant_is_preserved() {
        let t = Trajectory::from_channels(&[3.0; 12], &[-4.0; 12]).unwrap();
        let s = smooth_trajectory(&t, 5).unwrap();
        for p in s.iter() {
            assert!((p.x - 3.0).abs() < 1e-12);
            assert!((p.y + 4.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_impulse_response_is_symmetric() {
        let mut xs = vec![0.0; 41];
        xs[20] = 1.0;
        let s = smooth_trajectory(&line(&xs), 5).unwrap();
        for d in 1..15 {
            assert!((s[20 - d].x - s[20 + d].x).abs() < 1e-12, "offset {d}");
        }
        assert!(s[20].x > s[19].x);
        let total: f64 = s.iter().map(|p| p.x).sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_buffers_reused_until_shape_changes() {
        let mut smoother = TrajectorySmoother::with_capacity(8, 3).unwrap();
        assert_eq!(smoother.reallocations(), 1);
        let mut t = line(&[0.0, 1.0, 4.0, 9.0, 16.0, 25.0, 36.0, 49.0]);
        smoother.smooth(&mut t, 3).unwrap();
        smoother.smooth(&mut t, 3).unwrap();
        assert_eq!(smoother.reallocations(), 1);

        smoother.smooth(&mut t, 4).unwrap();
        assert_eq!(smoother.reallocations(), 2);
        smoother.smoothed(&line(&[1.0, 2.0, 3.0]), 4).unwrap();
        assert_eq!(smoother.reallocations(), 3);
    }

    #[test]
    fn test_causal_boxcar_ramps_up_from_zero() {
        let t = line(&[3.0, 3.0, 3.0, 3.0]);
        let c = causal_boxcar(&t, 3).unwrap();
        let xs: Vec<f64> = c.iter().map(|p| p.x).collect();
        assert!((xs[0] - 1.0).abs() < 1e-12);
        assert!((xs[1] - 2.0).abs() < 1e-12);
        assert!((xs[2] - 3.0).abs() < 1e-12);
        assert!((xs[3] - 3.0).abs() < 1e-12);
    }
}
