//! Position and speed traces.
//!
//! Traces are stored one sample per frame. The text format is one sample
//! per line; blank lines and lines starting with `#` are skipped so that
//! files can carry a header.

use serde::{Deserialize, Serialize};

use boutscope_common::{BoutscopeError, BoutscopeResult};

use crate::geometry::Point2D;

/// Ordered (x, y) samples, one per frame. Index = frame number.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Trajectory {
    points: Vec<Point2D>,
}

/// Instant speeds (pixels/sec), one per frame of the source trajectory.
/// Sample 0 is always 0 since frame 0 has no predecessor.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpeedTrace {
    samples: Vec<f64>,
}

impl Trajectory {
    pub fn new(points: Vec<Point2D>) -> Self {
        Self { points }
    }

    /// A trajectory of `len` samples at the origin.
    pub fn zeros(len: usize) -> Self {
        Self {
            points: vec![Point2D::default(); len],
        }
    }

    /// Build from separate coordinate channels.
    pub fn from_channels(xs: &[f64], ys: &[f64]) -> BoutscopeResult<Self> {
        if xs.len() != ys.len() {
            return Err(BoutscopeError::dimension_mismatch(
                "trajectory channels",
                xs.len(),
                ys.len(),
            ));
        }
        Ok(Self {
            points: xs
                .iter()
                .zip(ys)
                .map(|(&x, &y)| Point2D::new(x, y))
                .collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[Point2D] {
        &self.points
    }

    pub fn points_mut(&mut self) -> &mut [Point2D] {
        &mut self.points
    }

    pub fn iter(&self) -> impl Iterator<Item = &Point2D> {
        self.points.iter()
    }

    pub fn xs(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.x).collect()
    }

    pub fn ys(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.y).collect()
    }

    /// Parse the text format: `x y` per line, separated by tabs, spaces or
    /// a comma.
    pub fn parse_text(text: &str) -> BoutscopeResult<Self> {
        let mut points = Vec::new();
        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut fields = line
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|f| !f.is_empty());
            let x = parse_field(fields.next(), idx + 1, "x")?;
            let y = parse_field(fields.next(), idx + 1, "y")?;
            if fields.next().is_some() {
                return Err(BoutscopeError::parse(idx + 1, "expected exactly two columns"));
            }
            points.push(Point2D::new(x, y));
        }
        Ok(Self { points })
    }

    /// Serialize to the tab-separated text format.
    pub fn to_text(&self) -> String {
        let mut output = String::from("# x\ty\n");
        for p in &self.points {
            output.push_str(&format!("{}\t{}\n", p.x, p.y));
        }
        output
    }
}

impl From<Vec<Point2D>> for Trajectory {
    fn from(points: Vec<Point2D>) -> Self {
        Self::new(points)
    }
}

impl FromIterator<Point2D> for Trajectory {
    fn from_iter<I: IntoIterator<Item = Point2D>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl std::ops::Index<usize> for Trajectory {
    type Output = Point2D;

    fn index(&self, frame: usize) -> &Point2D {
        &self.points[frame]
    }
}

impl SpeedTrace {
    pub fn new(samples: Vec<f64>) -> Self {
        Self { samples }
    }

    /// A trace of `len` zero speeds.
    pub fn zeros(len: usize) -> Self {
        Self {
            samples: vec![0.0; len],
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn samples_mut(&mut self) -> &mut [f64] {
        &mut self.samples
    }

    pub fn into_inner(self) -> Vec<f64> {
        self.samples
    }

    /// Highest speed in the trace (0 for an empty trace).
    pub fn max(&self) -> f64 {
        self.samples.iter().copied().fold(0.0, f64::max)
    }

    /// Serialize as one speed per line.
    pub fn to_text(&self) -> String {
        let mut output = String::from("# speed\n");
        for s in &self.samples {
            output.push_str(&format!("{s}\n"));
        }
        output
    }
}

impl std::ops::Index<usize> for SpeedTrace {
    type Output = f64;

    fn index(&self, frame: usize) -> &f64 {
        &self.samples[frame]
    }
}

fn parse_field(field: Option<&str>, line: usize, name: &str) -> BoutscopeResult<f64> {
    let field = field.ok_or_else(|| BoutscopeError::parse(line, format!("missing {name} column")))?;
    field
        .parse::<f64>()
        .map_err(|e| BoutscopeError::parse(line, format!("invalid {name} value {field:?}: {e}")))
}
