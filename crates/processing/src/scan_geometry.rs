//! Precomputed arc sampling for the tail tracker.
//!
//! Each tail segment is a circle of radius `L * (k + 1) / N` around the
//! tail start, where `L` is the start-to-end distance. The half circle
//! facing the tail is sampled at [`ANGLE_STEPS`] angles from -90 to +90
//! degrees. Adjacent angles often round to the same pixel, so consecutive
//! duplicates are collapsed and each list holds distinct pixels in angle
//! order.

use boutscope_common::{ensure_at_least, BoutscopeError, BoutscopeResult};
use boutscope_model::{PixelCoord, Point2D};

/// Number of sampled angles per segment.
pub const ANGLE_STEPS: usize = 901;

/// First sampled angle (degrees).
pub const ANGLE_MIN_DEG: f64 = -90.0;

/// Last sampled angle (degrees).
pub const ANGLE_MAX_DEG: f64 = 90.0;

/// Spacing between sampled angles (degrees).
pub const ANGLE_RESOLUTION_DEG: f64 = (ANGLE_MAX_DEG - ANGLE_MIN_DEG) / (ANGLE_STEPS - 1) as f64;

/// Axis along which the tail extends from its start point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TailOrientation {
    /// Tail hangs downward (+y). Fully supported.
    Vertical,
    /// Tail extends sideways. Swept around +x; only partially supported.
    Horizontal,
}

impl TailOrientation {
    /// Whichever axis has the larger endpoint separation wins; ties are vertical.
    pub fn infer(start: PixelCoord, end: PixelCoord) -> Self {
        let dx = (end.x - start.x).abs();
        let dy = (end.y - start.y).abs();
        if dy >= dx {
            Self::Vertical
        } else {
            Self::Horizontal
        }
    }
}

/// One sample of a segment arc.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanPoint {
    /// Degrees from the tail axis; positive toward +x (vertical tails).
    pub angle: f64,
    pub radius: f64,
    pub pixel: PixelCoord,
}

/// Arc tables for every segment of one tail configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanGeometry {
    start: PixelCoord,
    end: PixelCoord,
    orientation: TailOrientation,
    tail_length: f64,
    radii: Vec<f64>,
    segments: Vec<Vec<ScanPoint>>,
}

impl ScanGeometry {
    /// Build the tables for a tail from `start` to `end` split into
    /// `segment_count` segments.
    pub fn compute(
        start: PixelCoord,
        end: PixelCoord,
        segment_count: usize,
    ) -> BoutscopeResult<Self> {
        ensure_at_least("segment_count", segment_count, 1)?;
        if start == end {
            return Err(BoutscopeError::config(
                "tail start and end must be different points",
            ));
        }

        let orientation = TailOrientation::infer(start, end);
        let tail_length = start.to_point().distance_to(&end.to_point());
        let radii: Vec<f64> = (1..=segment_count)
            .map(|k| tail_length * k as f64 / segment_count as f64)
            .collect();
        let segments = radii
            .iter()
            .map(|&r| sample_arc(start, r, orientation))
            .collect();

        Ok(Self {
            start,
            end,
            orientation,
            tail_length,
            radii,
            segments,
        })
    }

    /// Tail origin the arcs are centred on.
    pub fn start(&self) -> PixelCoord {
        self.start
    }

    /// Tail tip used to derive the length.
    pub fn end(&self) -> PixelCoord {
        self.end
    }

    /// Axis the arcs are swept around.
    pub fn orientation(&self) -> TailOrientation {
        self.orientation
    }

    /// Start-to-end distance in pixels.
    pub fn tail_length(&self) -> f64 {
        self.tail_length
    }

    /// Number of arcs.
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Radius of segment `k`.
    pub fn radius(&self, k: usize) -> f64 {
        self.radii[k]
    }

    /// Arc radii, innermost first.
    pub fn radii(&self) -> &[f64] {
        &self.radii
    }

    /// Angle-ordered distinct pixels of segment `k`.
    pub fn segment(&self, k: usize) -> &[ScanPoint] {
        &self.segments[k]
    }

    /// Every arc, innermost first.
    pub fn segments(&self) -> impl Iterator<Item = &[ScanPoint]> {
        self.segments.iter().map(Vec::as_slice)
    }
}

/// Sampled angle `i` in degrees.
pub fn step_angle(i: usize) -> f64 {
    ANGLE_MIN_DEG + i as f64 * ANGLE_RESOLUTION_DEG
}

fn sample_arc(origin: PixelCoord, radius: f64, orientation: TailOrientation) -> Vec<ScanPoint> {
    let center = origin.to_point();
    let mut points: Vec<ScanPoint> = Vec::new();
    for i in 0..ANGLE_STEPS {
        let angle = step_angle(i);
        let (sin, cos) = angle.to_radians().sin_cos();
        let p = match orientation {
            TailOrientation::Vertical => Point2D::new(center.x + radius * sin, center.y + radius * cos),
            TailOrientation::Horizontal => {
                Point2D::new(center.x + radius * cos, center.y + radius * sin)
            }
        };
        let pixel = PixelCoord::round(p);
        if points.last().is_some_and(|last| last.pixel == pixel) {
            continue;
        }
        points.push(ScanPoint {
            angle,
            radius,
            pixel,
        });
    }
    points
}
