//! Tail posture measurements.

use serde::{Deserialize, Serialize};

use crate::geometry::PixelCoord;

/// Measurement of one tail segment in one frame.
///
/// An angle of NaN means the segment could not be located in this frame;
/// it is a normal outcome, not a fault.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TailPoint {
    /// Bend angle in degrees. 0 points straight along the resting tail axis.
    #[serde(with = "nan_as_null")]
    pub angle: f64,
    /// Distance from the tail origin in pixels.
    pub radius: f64,
    /// Pixel the angle was read from, if any.
    pub coordinate: Option<PixelCoord>,
}

impl TailPoint {
    /// A segment with no foreground hit.
    pub fn undetermined(radius: f64) -> Self {
        Self {
            angle: f64::NAN,
            radius,
            coordinate: None,
        }
    }

    pub fn is_determined(&self) -> bool {
        !self.angle.is_nan()
    }
}

/// Format one frame of segment angles as a tab-separated row.
pub fn tail_angles_tsv_line(frame: usize, points: &[TailPoint]) -> String {
    let mut line = frame.to_string();
    for p in points {
        line.push('\t');
        if p.is_determined() {
            line.push_str(&format!("{:.1}", p.angle));
        } else {
            line.push_str("NaN");
        }
    }
    line
}

/// Header row matching [`tail_angles_tsv_line`].
pub fn tail_angles_tsv_header(segments: usize) -> String {
    let mut line = String::from("# frame");
    for k in 0..segments {
        line.push_str(&format!("\tseg{k}"));
    }
    line
}

/// JSON has no NaN; undetermined angles are written as `null`.
mod nan_as_null {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_nan() {
            serializer.serialize_none()
        } else {
            serializer.serialize_some(value)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
    }
}
