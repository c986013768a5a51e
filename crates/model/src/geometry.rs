//! Point and region types in image pixel space.

use serde::{Deserialize, Serialize};

/// A sub-pixel position.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &Point2D) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// An integer pixel coordinate. May lie outside an image; callers check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PixelCoord {
    pub x: i32,
    pub y: i32,
}

impl PixelCoord {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Nearest pixel to a sub-pixel position.
    pub fn round(p: Point2D) -> Self {
        Self {
            x: p.x.round() as i32,
            y: p.y.round() as i32,
        }
    }

    /// Whether the coordinate lies inside a `width` x `height` image.
    pub fn within(&self, width: usize, height: usize) -> bool {
        self.x >= 0 && self.y >= 0 && (self.x as usize) < width && (self.y as usize) < height
    }

    pub fn to_point(self) -> Point2D {
        Point2D::new(self.x as f64, self.y as f64)
    }
}

/// Axis-aligned rectangle over a raster. Never owns pixel data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Region {
    /// Left edge (inclusive).
    pub x: usize,
    /// Top edge (inclusive).
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl Region {
    pub fn new(x: usize, y: usize, width: usize, height: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Region covering a whole `width` x `height` raster.
    pub fn full(width: usize, height: usize) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Right edge (exclusive).
    pub fn right(&self) -> usize {
        self.x + self.width
    }

    /// Bottom edge (exclusive).
    pub fn bottom(&self) -> usize {
        self.y + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn area(&self) -> usize {
        self.width * self.height
    }

    pub fn contains(&self, px: usize, py: usize) -> bool {
        px >= self.x && px < self.right() && py >= self.y && py < self.bottom()
    }

    /// Whether `other` lies entirely inside this region.
    pub fn encloses(&self, other: &Region) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Move each edge inward by the given insets.
    ///
    /// Collapses to an empty region (anchored at the shifted origin) when the
    /// insets exceed the size.
    pub fn shrink(&self, left: usize, top: usize, right: usize, bottom: usize) -> Region {
        Region {
            x: self.x + left,
            y: self.y + top,
            width: self.width.saturating_sub(left + right),
            height: self.height.saturating_sub(top + bottom),
        }
    }

    /// Grow each edge outward by `pad_x`/`pad_y`, clipped to a
    /// `width` x `height` extent.
    pub fn expand_clipped(&self, pad_x: usize, pad_y: usize, width: usize, height: usize) -> Region {
        let x0 = self.x.saturating_sub(pad_x);
        let y0 = self.y.saturating_sub(pad_y);
        let x1 = (self.right() + pad_x).min(width);
        let y1 = (self.bottom() + pad_y).min(height);
        Region {
            x: x0,
            y: y0,
            width: x1.saturating_sub(x0),
            height: y1.saturating_sub(y0),
        }
    }

    /// Intersection with a `width` x `height` extent.
    pub fn clip(&self, width: usize, height: usize) -> Region {
        self.expand_clipped(0, 0, width, height)
    }

    /// Overlap of two regions; empty when they are disjoint.
    pub fn intersect(&self, other: &Region) -> Region {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.right().min(other.right());
        let y1 = self.bottom().min(other.bottom());
        Region {
            x: x0,
            y: y0,
            width: x1.saturating_sub(x0),
            height: y1.saturating_sub(y0),
        }
    }

    /// Smallest region covering the pixel rectangle `[x0, x1] x [y0, y1]`
    /// (inclusive, possibly negative corners), clipped to the extent.
    pub fn from_corners_clipped(
        x0: i64,
        y0: i64,
        x1: i64,
        y1: i64,
        width: usize,
        height: usize,
    ) -> Region {
        let left = x0.min(x1).max(0) as usize;
        let top = y0.min(y1).max(0) as usize;
        let right = (x0.max(x1) + 1).clamp(0, width as i64) as usize;
        let bottom = (y0.max(y1) + 1).clamp(0, height as i64) as usize;
        Region {
            x: left.min(width),
            y: top.min(height),
            width: right.saturating_sub(left),
            height: bottom.saturating_sub(top),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_point2d_distance() {
        let a = Point2D::new(0.0, 0.0);
        let b = Point2D::new(3.0, 4.0);
        assert!((a.distance_to(&b) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_pixel_within() {
        assert!(PixelCoord::new(0, 0).within(4, 4));
        assert!(!PixelCoord::new(4, 0).within(4, 4));
        assert!(!PixelCoord::new(-1, 2).within(4, 4));
        assert_eq!(PixelCoord::round(Point2D::new(1.6, -0.4)), PixelCoord::new(2, 0));
    }

    #[test]
    fn test_region_shrink_collapses() {
        let r = Region::new(2, 2, 4, 3);
        let s = r.shrink(1, 1, 1, 1);
        assert_eq!(s, Region::new(3, 3, 2, 1));
        assert!(r.shrink(3, 0, 3, 0).is_empty());
    }

    #[test]
    fn test_region_expand_clipped() {
        let r = Region::new(2, 2, 4, 4);
        let e = r.expand_clipped(5, 1, 8, 100);
        assert_eq!(e, Region::new(0, 1, 8, 6));
        assert!(e.encloses(&r));
    }

    #[test]
    fn test_region_intersect() {
        let a = Region::new(0, 0, 10, 10);
        let b = Region::new(5, 8, 10, 10);
        assert_eq!(a.intersect(&b), Region::new(5, 8, 5, 2));
        assert!(a.intersect(&Region::new(20, 0, 2, 2)).is_empty());
    }

    #[test]
    fn test_region_from_corners() {
        let r = Region::from_corners_clipped(-3, 5, 4, 2, 10, 10);
        assert_eq!(r, Region::new(0, 2, 5, 4));
        assert!(r.contains(4, 5));
        assert!(!r.contains(5, 5));

        let outside = Region::from_corners_clipped(20, 20, 30, 30, 10, 10);
        assert!(outside.is_empty());
    }

    proptest! {
        #[test]
        fn prop_intersection_lies_in_both(
            a in (0usize..50, 0usize..50, 0usize..30, 0usize..30),
            b in (0usize..50, 0usize..50, 0usize..30, 0usize..30),
        ) {
            let ra = Region::new(a.0, a.1, a.2, a.3);
            let rb = Region::new(b.0, b.1, b.2, b.3);
            let i = ra.intersect(&rb);
            prop_assert_eq!(i, rb.intersect(&ra));
            if !i.is_empty() {
                prop_assert!(ra.encloses(&i));
                prop_assert!(rb.encloses(&i));
            }
            prop_assert!(i.area() <= ra.area().min(rb.area()));
        }
    }
}
