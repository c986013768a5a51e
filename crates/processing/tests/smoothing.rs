use proptest::prelude::*;

use boutscope_model::{Point2D, Trajectory};
use boutscope_processing::{smooth_trajectory, TrajectorySmoother};

fn impulse(len: usize, at: usize, height: f64) -> Trajectory {
    (0..len)
        .map(|i| {
            let v = if i == at { height } else { 0.0 };
            Point2D::new(v, -v)
        })
        .collect()
}

#[test]
fn smoothing_keeps_a_bout_peak_in_place() {
    // A symmetric speed bump should not move after zero-phase smoothing.
    let xs: Vec<f64> = (0..31)
        .map(|i| {
            let d = (i as f64 - 15.0).abs();
            (6.0 - d).max(0.0)
        })
        .collect();
    let t = Trajectory::from_channels(&xs, &xs).unwrap();
    let s = smooth_trajectory(&t, 5).unwrap();

    let peak = (0..s.len())
        .max_by(|&a, &b| s[a].x.total_cmp(&s[b].x))
        .unwrap();
    assert_eq!(peak, 15);
}

proptest! {
    #[test]
    fn impulse_response_is_symmetric(
        window in 2usize..12,
        height in 0.5f64..100.0,
    ) {
        let len = 8 * window + 1;
        let at = len / 2;
        let smoothed = smooth_trajectory(&impulse(len, at, height), window).unwrap();

        for d in 1..=at {
            let left = smoothed[at - d];
            let right = smoothed[at + d];
            prop_assert!((left.x - right.x).abs() < 1e-9 * height);
            prop_assert!((left.y - right.y).abs() < 1e-9 * height);
        }
        let mass: f64 = smoothed.iter().map(|p| p.x).sum();
        prop_assert!((mass - height).abs() < 1e-9 * height);
    }

    #[test]
    fn reused_smoother_matches_one_shot(
        xs in prop::collection::vec(-100.0f64..100.0, 1..60),
        window in 1usize..9,
    ) {
        let ys: Vec<f64> = xs.iter().map(|x| x * 0.5).collect();
        let t = Trajectory::from_channels(&xs, &ys).unwrap();

        let mut smoother = TrajectorySmoother::new();
        let first = smoother.smoothed(&t, window).unwrap();
        let second = smoother.smoothed(&t, window).unwrap();

        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first, smooth_trajectory(&t, window).unwrap());
        prop_assert!(smoother.reallocations() <= 1);
    }
}
