//! Boutscope Processing — Tail Tracking and Movement Analysis
//!
//! Turns frames and positions into behaviour measurements:
//! - **Tail Tracker:** Per-segment tail angles from grayscale frames
//! - **Movement Analyzer:** Instant speeds and bout segmentation of a whole trace
//! - **Realtime Analyzer:** The same analysis one sample at a time during acquisition
//! - **Smoother:** Zero-phase boxcar smoothing of trajectories
//!
//! This crate is pure computation — no I/O, no threads of its own.
//! All inputs are data; all outputs are data.

pub mod bouts;
pub mod movement;
pub mod realtime;
pub mod scan_geometry;
pub mod smoother;
pub mod tail_tracker;

pub use bouts::{BoutCriteria, BoutDetector};
pub use movement::{
    compute_instant_speeds, compute_instant_speeds_into, detect_bouts, AnalysisReport,
    MovementAnalyzer,
};
pub use realtime::{BoxcarFir, PointAnalysis, RealtimeMovementAnalyzer};
pub use scan_geometry::{ScanGeometry, ScanPoint, TailOrientation};
pub use smoother::{causal_boxcar, smooth_trajectory, TrajectorySmoother};
pub use tail_tracker::{TailTracker, TailTrackerConfig};
