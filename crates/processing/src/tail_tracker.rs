//! Per-frame tail angle measurement.
//!
//! The tracker keeps a closing-based estimate of the static scene, takes the
//! absolute difference with each frame inside the tracked region, thresholds
//! it into a mask and reads, for every tail segment, which sampled arc
//! pixels are on. The median hit gives the segment angle.
//!
//! # Concurrency
//!
//! [`TailTracker`] is `Send + Sync`. Tail layout and scan geometry each sit
//! behind their own lock holding an `Arc` snapshot. Setters build a new
//! snapshot while holding the layout lock, swap it in and mark the
//! background stale; a tracking call clones both snapshots and consumes the
//! stale mark under that same lock, so the background it rebuilds always
//! matches the layout it tracks with. Neither lock is held while processing
//! pixels. Tracking calls themselves run one at a time on the shared work
//! buffers.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, warn};

use boutscope_common::{ensure_at_least, BoutscopeError, BoutscopeResult, FrameClock, TrackingDefaults};
use boutscope_imaging::{log_failure, morphology, ClosingBackground, Raster8, StructuringElement};
use boutscope_model::{PixelCoord, Region, TailPoint};

use crate::scan_geometry::{ScanGeometry, ScanPoint, TailOrientation};

/// Extra pixels around the swept half disk so the 3x3 mask closing still
/// writes every arc pixel (twice the widest inset of the padded 3x3 square).
const MASK_MARGIN: usize = 4;

/// Construction parameters for a [`TailTracker`].
#[derive(Debug, Clone, PartialEq)]
pub struct TailTrackerConfig {
    /// Frame width in pixels.
    pub width: usize,
    /// Frame height in pixels.
    pub height: usize,
    pub tail_start: PixelCoord,
    pub tail_end: PixelCoord,
    pub segment_count: usize,
    /// Radius of the disk used to estimate the background.
    pub morphology_radius: usize,
    /// Foreground cutoff; differences strictly above it count as tail.
    pub threshold: u8,
    /// Background refresh period in frames.
    pub frame_rate: u32,
}

impl TailTrackerConfig {
    /// Tail endpoints with parameters taken from the configured defaults.
    pub fn with_defaults(
        width: usize,
        height: usize,
        tail_start: PixelCoord,
        tail_end: PixelCoord,
        defaults: &TrackingDefaults,
        frame_rate: u32,
    ) -> Self {
        Self {
            width,
            height,
            tail_start,
            tail_end,
            segment_count: defaults.segment_count,
            morphology_radius: defaults.morphology_radius,
            threshold: defaults.threshold,
            frame_rate,
        }
    }
}

/// Everything derived from the tail endpoints and morphology radius.
#[derive(Debug, Clone)]
struct TrackLayout {
    start: PixelCoord,
    end: PixelCoord,
    segment_count: usize,
    morphology_radius: usize,
    element: Arc<StructuringElement>,
    /// Region the foreground mask is computed over.
    inner: Region,
    /// Region the background is rebuilt over.
    outer: Region,
    orientation: TailOrientation,
}

impl TrackLayout {
    fn compute(
        width: usize,
        height: usize,
        start: PixelCoord,
        end: PixelCoord,
        segment_count: usize,
        morphology_radius: usize,
    ) -> BoutscopeResult<(Self, ScanGeometry)> {
        for (name, p) in [("tail start", start), ("tail end", end)] {
            if !p.within(width, height) {
                return Err(BoutscopeError::config(format!(
                    "{name} ({}, {}) lies outside the {width}x{height} image",
                    p.x, p.y
                )));
            }
        }
        ensure_at_least("morphology_radius", morphology_radius, 1)?;
        let geometry = ScanGeometry::compute(start, end, segment_count)?;
        let element = StructuringElement::disk(morphology_radius)?;

        let reach = geometry.tail_length().ceil() as i64;
        let (sx, sy) = (start.x as i64, start.y as i64);
        let swept = match geometry.orientation() {
            TailOrientation::Vertical => {
                Region::from_corners_clipped(sx - reach, sy, sx + reach, sy + reach, width, height)
            }
            TailOrientation::Horizontal => {
                Region::from_corners_clipped(sx, sy - reach, sx + reach, sy + reach, width, height)
            }
        };
        let inner = swept.expand_clipped(MASK_MARGIN, MASK_MARGIN, width, height);
        let pad = 2 * element.footprint();
        let outer = inner.expand_clipped(pad, pad, width, height);

        let layout = Self {
            start,
            end,
            segment_count,
            morphology_radius,
            element: Arc::new(element),
            inner,
            outer,
            orientation: geometry.orientation(),
        };
        Ok((layout, geometry))
    }
}

/// Image-sized working buffers, reused across frames.
#[derive(Debug)]
struct WorkBuffers {
    background: ClosingBackground,
    foreground: Raster8,
    thresholded: Raster8,
    mask: Raster8,
    scratch: Raster8,
}

impl WorkBuffers {
    fn new(width: usize, height: usize) -> Self {
        Self {
            background: ClosingBackground::new(width, height),
            foreground: Raster8::new(width, height),
            thresholded: Raster8::new(width, height),
            mask: Raster8::new(width, height),
            scratch: Raster8::new(width, height),
        }
    }
}

/// Measures tail segment angles frame by frame.
#[derive(Debug)]
pub struct TailTracker {
    width: usize,
    height: usize,
    layout: Mutex<Arc<TrackLayout>>,
    geometry: RwLock<Arc<ScanGeometry>>,
    work: Mutex<WorkBuffers>,
    threshold: AtomicU8,
    frame_rate: AtomicU32,
    frame_counter: AtomicU64,
    background_valid: AtomicBool,
}

impl TailTracker {
    /// Validate `config` and precompute the scan geometry. The background is built on the first frame.
    pub fn new(config: TailTrackerConfig) -> BoutscopeResult<Self> {
        ensure_at_least("width", config.width, 1)?;
        ensure_at_least("height", config.height, 1)?;
        ensure_at_least("frame_rate", config.frame_rate, 1)?;
        let (layout, geometry) = TrackLayout::compute(
            config.width,
            config.height,
            config.tail_start,
            config.tail_end,
            config.segment_count,
            config.morphology_radius,
        )?;
        warn_if_horizontal(&layout);

        Ok(Self {
            width: config.width,
            height: config.height,
            layout: Mutex::new(Arc::new(layout)),
            geometry: RwLock::new(Arc::new(geometry)),
            work: Mutex::new(WorkBuffers::new(config.width, config.height)),
            threshold: AtomicU8::new(config.threshold),
            frame_rate: AtomicU32::new(config.frame_rate),
            frame_counter: AtomicU64::new(0),
            background_valid: AtomicBool::new(false),
        })
    }

    /// Measure every segment in `frame`.
    ///
    /// Returns one [`TailPoint`] per segment; segments without a foreground
    /// hit have a NaN angle. Fails only when the frame size differs from the
    /// tracker's.
    pub fn track_tail(&self, frame: &Raster8) -> BoutscopeResult<Vec<TailPoint>> {
        if frame.size() != (self.width, self.height) {
            return Err(BoutscopeError::dimension_mismatch(
                "track_tail",
                format!("{}x{}", self.width, self.height),
                format!("{}x{}", frame.width(), frame.height()),
            ));
        }

        let mut work = self.work.lock();
        let work = &mut *work;

        let (was_valid, layout, geometry) = self.snapshot();
        let index = self.frame_counter.fetch_add(1, Ordering::Relaxed);
        let threshold = self.threshold.load(Ordering::Relaxed);
        let frame_rate = self.frame_rate.load(Ordering::Relaxed);

        if !was_valid || FrameClock::is_period_start(index, frame_rate) {
            match work.background.rebuild(frame, layout.outer, &layout.element) {
                Ok(valid) => debug!(frame = index, region = ?valid, "background rebuilt"),
                Err(e) => {
                    warn!(frame = index, error = %e, "background rebuild failed");
                    self.background_valid.store(false, Ordering::Release);
                }
            }
        }

        let inner = layout.inner;
        let _ = log_failure(work.thresholded.fill_region(inner, 0));
        let _ = log_failure(work.mask.fill_region(inner, 0));

        let effective = work
            .background
            .valid_region()
            .map(|valid| valid.intersect(&inner))
            .unwrap_or_default();
        if !effective.is_empty() {
            let _ = log_failure(morphology::abs_diff(
                work.background.image(),
                frame,
                &mut work.foreground,
                effective,
            ));
            let _ = log_failure(morphology::threshold(
                &work.foreground,
                &mut work.thresholded,
                effective,
                threshold,
            ));
            let _ = log_failure(morphology::close3x3(
                &work.thresholded,
                &mut work.mask,
                &mut work.scratch,
                effective,
            ));
        }

        let points = (0..geometry.segment_count())
            .map(|k| {
                let segment = geometry.segment(k);
                let hits = collect_hits(&work.mask, segment);
                match select_hit(&hits) {
                    Some(i) => {
                        let p = segment[i];
                        TailPoint {
                            angle: p.angle,
                            radius: p.radius,
                            coordinate: Some(p.pixel),
                        }
                    }
                    None => TailPoint::undetermined(geometry.radius(k)),
                }
            })
            .collect();
        Ok(points)
    }

    /// Move the tail endpoints. Rebuilds geometry and invalidates the background.
    pub fn set_tail(&self, start: PixelCoord, end: PixelCoord) -> BoutscopeResult<()> {
        self.update_layout(|l| (start, end, l.segment_count, l.morphology_radius))
    }

    /// Change the number of segments. Invalidates the background.
    pub fn set_segment_count(&self, segment_count: usize) -> BoutscopeResult<()> {
        self.update_layout(|l| (l.start, l.end, segment_count, l.morphology_radius))
    }

    /// Change the background disk radius. Invalidates the background.
    pub fn set_morphology_radius(&self, radius: usize) -> BoutscopeResult<()> {
        self.update_layout(|l| (l.start, l.end, l.segment_count, radius))
    }

    /// Foreground cutoff used from the next frame on.
    pub fn set_threshold(&self, threshold: u8) {
        self.threshold.store(threshold, Ordering::Relaxed);
    }

    /// Background refresh period in frames.
    pub fn set_frame_rate(&self, frame_rate: u32) -> BoutscopeResult<()> {
        ensure_at_least("frame_rate", frame_rate, 1)?;
        self.frame_rate.store(frame_rate, Ordering::Relaxed);
        Ok(())
    }

    /// Force a background rebuild on the next frame.
    pub fn invalidate_background(&self) {
        self.background_valid.store(false, Ordering::Release);
    }

    /// Frame width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Frame height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Current tail origin.
    pub fn tail_start(&self) -> PixelCoord {
        self.layout.lock().start
    }

    /// Current tail tip.
    pub fn tail_end(&self) -> PixelCoord {
        self.layout.lock().end
    }

    /// Number of segments reported per frame.
    pub fn segment_count(&self) -> usize {
        self.layout.lock().segment_count
    }

    /// Radius of the background disk.
    pub fn morphology_radius(&self) -> usize {
        self.layout.lock().morphology_radius
    }

    /// Orientation inferred from the tail endpoints.
    pub fn orientation(&self) -> TailOrientation {
        self.layout.lock().orientation
    }

    /// Current foreground cutoff.
    pub fn threshold(&self) -> u8 {
        self.threshold.load(Ordering::Relaxed)
    }

    /// Background refresh period in frames.
    pub fn frame_rate(&self) -> u32 {
        self.frame_rate.load(Ordering::Relaxed)
    }

    /// Frames passed to [`track_tail`](Self::track_tail) so far.
    pub fn frames_processed(&self) -> u64 {
        self.frame_counter.load(Ordering::Relaxed)
    }

    /// Region the foreground mask is computed over.
    pub fn track_region(&self) -> Region {
        self.layout.lock().inner
    }

    /// Region the background is rebuilt over.
    pub fn outer_region(&self) -> Region {
        self.layout.lock().outer
    }

    /// Snapshot of the arcs the next frame will be read along.
    pub fn scan_geometry(&self) -> Arc<ScanGeometry> {
        Arc::clone(&self.geometry.read())
    }

    /// Copy of the current background estimate.
    pub fn background(&self) -> Raster8 {
        self.work.lock().background.image().clone()
    }

    /// Current layout and geometry, plus whether the background still
    /// matches them. The flag is consumed under the layout lock: a setter
    /// either invalidates before this call and the returned layout is the
    /// new one, or after it and the next frame rebuilds.
    fn snapshot(&self) -> (bool, Arc<TrackLayout>, Arc<ScanGeometry>) {
        let layout = self.layout.lock();
        let was_valid = self.background_valid.swap(true, Ordering::AcqRel);
        let geometry = Arc::clone(&self.geometry.read());
        (was_valid, Arc::clone(&layout), geometry)
    }

    fn update_layout<F>(&self, params: F) -> BoutscopeResult<()>
    where
        F: FnOnce(&TrackLayout) -> (PixelCoord, PixelCoord, usize, usize),
    {
        let mut current = self.layout.lock();
        let (start, end, segment_count, radius) = params(&current);
        let (layout, geometry) =
            TrackLayout::compute(self.width, self.height, start, end, segment_count, radius)?;

        debug!(
            start = ?layout.start,
            end = ?layout.end,
            segments = layout.segment_count,
            radius = layout.morphology_radius,
            inner = ?layout.inner,
            "tail layout updated"
        );
        warn_if_horizontal(&layout);

        *self.geometry.write() = Arc::new(geometry);
        *current = Arc::new(layout);
        self.background_valid.store(false, Ordering::Release);
        Ok(())
    }
}

fn warn_if_horizontal(layout: &TrackLayout) {
    if layout.orientation == TailOrientation::Horizontal {
        warn!(
            start = ?layout.start,
            end = ?layout.end,
            "horizontal tail: arcs are swept around +x; only downward tails are fully supported"
        );
    }
}

/// List indices of arc pixels that are on in `mask`.
fn collect_hits(mask: &Raster8, segment: &[ScanPoint]) -> Vec<usize> {
    segment
        .iter()
        .enumerate()
        .filter(|(_, p)| p.pixel.within(mask.width(), mask.height()))
        .filter(|(_, p)| mask.get(p.pixel.x as usize, p.pixel.y as usize) != 0)
        .map(|(i, _)| i)
        .collect()
}

/// First hit for one or two hits, the median (lower-middle) otherwise.
fn select_hit(hits: &[usize]) -> Option<usize> {
    match hits.len() {
        0 => None,
        1 | 2 => Some(hits[0]),
        n => Some(hits[(n - 1) / 2]),
    }
}
