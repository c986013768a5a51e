//! Movement bouts.
//!
//! A bout is a contiguous run of above-threshold speed with one dominant
//! peak. Bout lists are logged as tab-separated text, one bout per line:
//! `start  peak  end  displacement  peak_speed`.

use serde::{Deserialize, Serialize};

use boutscope_common::{BoutscopeError, BoutscopeResult};

/// Header line written before bout rows.
pub const BOUT_TSV_HEADER: &str = "# start\tpeak\tend\tdisplacement\tpeak_speed";

/// A single detected movement bout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bout {
    /// First frame of the bout.
    pub start: usize,
    /// Frame at which the peak speed is first reached.
    pub peak: usize,
    /// Last frame with above-threshold speed.
    pub end: usize,
    /// Distance travelled during the bout (pixels).
    pub displacement: f64,
    /// Highest instant speed in the bout (pixels/sec).
    pub peak_speed: f64,
}

impl Bout {
    /// Number of frames spanned, inclusive of both ends.
    pub fn frames(&self) -> usize {
        self.end - self.start + 1
    }

    /// Bout duration in seconds.
    pub fn duration_secs(&self, frame_rate: u32) -> f64 {
        self.frames() as f64 / frame_rate.max(1) as f64
    }

    /// Whether `frame` falls inside the bout.
    pub fn contains(&self, frame: usize) -> bool {
        frame >= self.start && frame <= self.end
    }

    /// One tab-separated row (no trailing newline).
    pub fn to_tsv_line(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}\t{}",
            self.start, self.peak, self.end, self.displacement, self.peak_speed
        )
    }
}

/// Serialize bouts to tab-separated text with a header line.
pub fn serialize_bouts(bouts: &[Bout]) -> String {
    let mut output = String::from(BOUT_TSV_HEADER);
    output.push('\n');
    for bout in bouts {
        output.push_str(&bout.to_tsv_line());
        output.push('\n');
    }
    output
}

/// Parse bouts from tab-separated text. Header and blank lines are skipped.
pub fn parse_bouts(text: &str) -> BoutscopeResult<Vec<Bout>> {
    let mut bouts = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line_no = idx + 1;
        let fields: Vec<&str> = line.split('\t').map(str::trim).collect();
        if fields.len() != 5 {
            return Err(BoutscopeError::parse(
                line_no,
                format!("expected 5 fields, found {}", fields.len()),
            ));
        }
        let frame = |i: usize| -> BoutscopeResult<usize> {
            fields[i]
                .parse::<usize>()
                .map_err(|e| BoutscopeError::parse(line_no, format!("field {}: {e}", i + 1)))
        };
        let value = |i: usize| -> BoutscopeResult<f64> {
            fields[i]
                .parse::<f64>()
                .map_err(|e| BoutscopeError::parse(line_no, format!("field {}: {e}", i + 1)))
        };
        let bout = Bout {
            start: frame(0)?,
            peak: frame(1)?,
            end: frame(2)?,
            displacement: value(3)?,
            peak_speed: value(4)?,
        };
        if !(bout.start <= bout.peak && bout.peak <= bout.end) {
            return Err(BoutscopeError::parse(
                line_no,
                "frames must satisfy start <= peak <= end",
            ));
        }
        bouts.push(bout);
    }
    Ok(bouts)
}
