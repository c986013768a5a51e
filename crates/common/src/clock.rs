//! Frame-based timing utilities.
//!
//! All Boutscope traces are indexed by frame number. This module provides
//! utilities for:
//! - Converting between frame indices and seconds at a fixed frame rate
//! - Deciding on which frames periodic work (background refresh) runs
//! - Stamping an analysis run with its wall-clock start

use crate::error::{ensure_at_least, BoutscopeResult};

/// A clock anchored to frame zero of a recording at a fixed frame rate.
#[derive(Debug, Clone)]
pub struct FrameClock {
    frame_rate: u32,

    /// Wall-clock time at which the analysis started (RFC 3339).
    epoch_wall: String,
}

impl FrameClock {
    /// Create a clock for the given frame rate, anchored to now.
    pub fn new(frame_rate: u32) -> BoutscopeResult<Self> {
        ensure_at_least("frame_rate", frame_rate, 1)?;
        Ok(Self {
            frame_rate,
            epoch_wall: chrono::Utc::now().to_rfc3339(),
        })
    }

    /// Frames per second.
    pub fn frame_rate(&self) -> u32 {
        self.frame_rate
    }

    /// Wall-clock time at clock creation.
    pub fn epoch_wall(&self) -> &str {
        &self.epoch_wall
    }

    /// Duration of one frame in seconds.
    pub fn frame_interval_secs(&self) -> f64 {
        1.0 / self.frame_rate as f64
    }

    /// Time of a frame relative to frame zero.
    pub fn frame_to_secs(&self, frame: usize) -> f64 {
        frame as f64 / self.frame_rate as f64
    }

    /// Index of the frame being shown at `secs` (floor).
    pub fn secs_to_frame(&self, secs: f64) -> usize {
        (secs.max(0.0) * self.frame_rate as f64).floor() as usize
    }

    /// Whether `frame` starts a new period of `period` frames.
    ///
    /// With `period == frame_rate` this fires once per second of video.
    pub fn is_period_start(frame: u64, period: u32) -> bool {
        period > 0 && frame % period as u64 == 0
    }
}
