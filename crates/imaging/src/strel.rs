//! Structuring elements for morphology.

use crate::error::{ImagingError, ImagingResult};
use crate::raster::Raster8;

/// A binary neighborhood and its anchor.
///
/// Mask widths produced by the generators are padded to a multiple of 4;
/// the padding columns are off and never contribute to an operation.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuringElement {
    mask: Raster8,
    anchor: (usize, usize),
    /// On-pixels as `(dx, dy)` offsets from the anchor.
    offsets: Vec<(isize, isize)>,
}

impl StructuringElement {
    /// Build from a mask (nonzero = on) and an anchor inside it.
    pub fn new(mask: Raster8, anchor: (usize, usize)) -> ImagingResult<Self> {
        if anchor.0 >= mask.width() || anchor.1 >= mask.height() {
            return Err(ImagingError::InvalidElement {
                message: format!(
                    "anchor {anchor:?} lies outside the {}x{} mask",
                    mask.width(),
                    mask.height()
                ),
            });
        }
        let mut offsets = Vec::new();
        for y in 0..mask.height() {
            for (x, &v) in mask.row(y).iter().enumerate() {
                if v != 0 {
                    offsets.push((x as isize - anchor.0 as isize, y as isize - anchor.1 as isize));
                }
            }
        }
        if offsets.is_empty() {
            return Err(ImagingError::InvalidElement {
                message: "mask has no on pixels".to_string(),
            });
        }
        Ok(Self {
            mask,
            anchor,
            offsets,
        })
    }

    /// A disk of the given radius (radius 1 gives a 3x3 cross-like disk),
    /// anchored at its center.
    pub fn disk(radius: usize) -> ImagingResult<Self> {
        if radius < 1 {
            return Err(ImagingError::InvalidElement {
                message: format!("disk radius must be at least 1, got {radius}"),
            });
        }
        let diameter = 2 * radius + 1;
        let mut mask = Raster8::new(padded_width(diameter), diameter);
        let r2 = (radius * radius) as isize;
        for y in 0..diameter {
            for x in 0..diameter {
                let dx = x as isize - radius as isize;
                let dy = y as isize - radius as isize;
                if dx * dx + dy * dy <= r2 {
                    mask.set(x, y, 1);
                }
            }
        }
        Self::new(mask, (radius, radius))
    }

    /// A filled `width` x `height` rectangle anchored at its center.
    pub fn rect(width: usize, height: usize) -> ImagingResult<Self> {
        if width < 1 || height < 1 {
            return Err(ImagingError::InvalidElement {
                message: format!("rectangle must be at least 1x1, got {width}x{height}"),
            });
        }
        let mut mask = Raster8::new(padded_width(width), height);
        for y in 0..height {
            mask.row_mut(y)[..width].fill(1);
        }
        Self::new(mask, (width / 2, height / 2))
    }

    /// The 3x3 square.
    pub fn square3() -> Self {
        let mut mask = Raster8::new(padded_width(3), 3);
        for y in 0..3 {
            mask.row_mut(y)[..3].fill(1);
        }
        Self {
            mask,
            anchor: (1, 1),
            offsets: (-1..=1)
                .flat_map(|dy| (-1..=1).map(move |dx| (dx, dy)))
                .collect(),
        }
    }

    pub fn mask(&self) -> &Raster8 {
        &self.mask
    }

    pub fn anchor(&self) -> (usize, usize) {
        self.anchor
    }

    pub fn width(&self) -> usize {
        self.mask.width()
    }

    pub fn height(&self) -> usize {
        self.mask.height()
    }

    pub fn offsets(&self) -> &[(isize, isize)] {
        &self.offsets
    }

    /// How far the element reaches past its anchor on each side, as
    /// `(left, top, right, bottom)`. Measured on the padded mask.
    pub fn insets(&self) -> (usize, usize, usize, usize) {
        let (ax, ay) = self.anchor;
        (
            ax,
            ay,
            self.width() - 1 - ax,
            self.height() - 1 - ay,
        )
    }

    /// Largest mask dimension.
    pub fn footprint(&self) -> usize {
        self.width().max(self.height())
    }
}

fn padded_width(width: usize) -> usize {
    width.div_ceil(4) * 4
}
