//! Binary/grayscale morphology, thresholding and differencing.
//!
//! Neighborhood operations shrink the requested region by the element's
//! insets before writing, so they never read outside it. Each returns the
//! region it actually wrote. `close` and `open` shrink twice: once for each
//! pass.

use boutscope_model::Region;

use crate::error::{ImagingError, ImagingResult};
use crate::raster::Raster8;
use crate::strel::StructuringElement;

/// Value written for "on" mask pixels.
pub const MASK_ON: u8 = 255;

/// Grayscale dilation (neighborhood maximum) of `src` into `dst`.
pub fn dilate(
    src: &Raster8,
    dst: &mut Raster8,
    roi: Region,
    element: &StructuringElement,
) -> ImagingResult<Region> {
    neighborhood_op("dilate", src, dst, roi, element, u8::MIN, u8::max)
}

/// Grayscale erosion (neighborhood minimum) of `src` into `dst`.
pub fn erode(
    src: &Raster8,
    dst: &mut Raster8,
    roi: Region,
    element: &StructuringElement,
) -> ImagingResult<Region> {
    neighborhood_op("erode", src, dst, roi, element, u8::MAX, u8::min)
}

/// Dilation followed by erosion. Fills dark gaps narrower than the element.
///
/// `scratch` receives the intermediate dilation.
pub fn close(
    src: &Raster8,
    dst: &mut Raster8,
    scratch: &mut Raster8,
    roi: Region,
    element: &StructuringElement,
) -> ImagingResult<Region> {
    let dilated = dilate(src, scratch, roi, element)?;
    erode(scratch, dst, dilated, element)
}

/// Erosion followed by dilation. Removes bright specks smaller than the element.
pub fn open(
    src: &Raster8,
    dst: &mut Raster8,
    scratch: &mut Raster8,
    roi: Region,
    element: &StructuringElement,
) -> ImagingResult<Region> {
    let eroded = erode(src, scratch, roi, element)?;
    dilate(scratch, dst, eroded, element)
}

/// [`close`] with the 3x3 square; fills pinholes in a mask.
pub fn close3x3(
    src: &Raster8,
    dst: &mut Raster8,
    scratch: &mut Raster8,
    roi: Region,
) -> ImagingResult<Region> {
    close(src, dst, scratch, roi, &StructuringElement::square3())
}

/// [`open`] with the 3x3 square; removes isolated pixels.
pub fn open3x3(
    src: &Raster8,
    dst: &mut Raster8,
    scratch: &mut Raster8,
    roi: Region,
) -> ImagingResult<Region> {
    open(src, dst, scratch, roi, &StructuringElement::square3())
}

/// Strict greater-than threshold: `> cutoff` becomes [`MASK_ON`], the rest 0.
pub fn threshold(src: &Raster8, dst: &mut Raster8, roi: Region, cutoff: u8) -> ImagingResult<()> {
    check_pair("threshold", src, dst, roi)?;
    for y in roi.y..roi.bottom() {
        let s = &src.row(y)[roi.x..roi.right()];
        let d = &mut dst.row_mut(y)[roi.x..roi.right()];
        for (out, &v) in d.iter_mut().zip(s) {
            *out = if v > cutoff { MASK_ON } else { 0 };
        }
    }
    Ok(())
}

/// Per-pixel `|a - b|` over `roi`.
pub fn abs_diff(a: &Raster8, b: &Raster8, dst: &mut Raster8, roi: Region) -> ImagingResult<()> {
    check_pair("abs_diff", a, dst, roi)?;
    a.check_same_size("abs_diff", b)?;
    for y in roi.y..roi.bottom() {
        let ra = &a.row(y)[roi.x..roi.right()];
        let rb = &b.row(y)[roi.x..roi.right()];
        let d = &mut dst.row_mut(y)[roi.x..roi.right()];
        for ((out, &va), &vb) in d.iter_mut().zip(ra).zip(rb) {
            *out = va.abs_diff(vb);
        }
    }
    Ok(())
}

/// Number of nonzero pixels in `roi`.
pub fn count_on(mask: &Raster8, roi: Region) -> ImagingResult<usize> {
    mask.check_region("count_on", roi)?;
    Ok((roi.y..roi.bottom())
        .map(|y| mask.row(y)[roi.x..roi.right()].iter().filter(|&&v| v != 0).count())
        .sum())
}

/// Region an element-sized neighborhood op can write inside `roi`.
pub fn inner_region(roi: Region, element: &StructuringElement) -> Region {
    let (left, top, right, bottom) = element.insets();
    roi.shrink(left, top, right, bottom)
}

fn neighborhood_op(
    op: &'static str,
    src: &Raster8,
    dst: &mut Raster8,
    roi: Region,
    element: &StructuringElement,
    identity: u8,
    combine: fn(u8, u8) -> u8,
) -> ImagingResult<Region> {
    check_pair(op, src, dst, roi)?;
    let inner = inner_region(roi, element);
    if inner.is_empty() {
        return Err(ImagingError::RegionTooSmall { op, region: roi });
    }

    let offsets = element.offsets();
    for y in inner.y..inner.bottom() {
        for x in inner.x..inner.right() {
            let mut acc = identity;
            for &(dx, dy) in offsets {
                // Offsets stay inside roi because inner was shrunk by the insets.
                let sx = (x as isize + dx) as usize;
                let sy = (y as isize + dy) as usize;
                acc = combine(acc, src.get(sx, sy));
            }
            dst.set(x, y, acc);
        }
    }
    Ok(inner)
}

fn check_pair(op: &'static str, src: &Raster8, dst: &Raster8, roi: Region) -> ImagingResult<()> {
    src.check_same_size(op, dst)?;
    src.check_region(op, roi)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn square(width: usize, height: usize, on: Region) -> Raster8 {
        let mut r = Raster8::new(width, height);
        r.fill_region(on, MASK_ON).unwrap();
        r
    }

    #[test]
    fn test_threshold_is_strict() {
        let src = Raster8::from_packed(4, 1, &[9, 10, 11, 255]).unwrap();
        let mut dst = Raster8::new(4, 1);
        threshold(&src, &mut dst, src.extent(), 10).unwrap();
        assert_eq!(dst.row(0), &[0, 0, MASK_ON, MASK_ON]);
    }

    #[test]
    fn test_threshold_respects_region() {
        let src = Raster8::filled(4, 2, 200);
        let mut dst = Raster8::new(4, 2);
        threshold(&src, &mut dst, Region::new(1, 1, 2, 1), 10).unwrap();
        assert_eq!(dst.row(0), &[0, 0, 0, 0]);
        assert_eq!(dst.row(1), &[0, MASK_ON, MASK_ON, 0]);
    }

    #[test]
    fn test_abs_diff() {
        let a = Raster8::from_packed(3, 1, &[10, 200, 50]).unwrap();
        let b = Raster8::from_packed(3, 1, &[30, 100, 50]).unwrap();
        let mut d = Raster8::new(3, 1);
        abs_diff(&a, &b, &mut d, a.extent()).unwrap();
        assert_eq!(d.row(0), &[20, 100, 0]);
        assert!(abs_diff(&a, &Raster8::new(2, 1), &mut d, a.extent()).is_err());
    }

    #[test]
    fn test_dilate_grows_single_pixel() {
        let src = square(9, 9, Region::new(4, 4, 1, 1));
        let mut dst = Raster8::new(9, 9);
        let written = dilate(&src, &mut dst, src.extent(), &StructuringElement::square3()).unwrap();
        assert_eq!(written, Region::new(1, 1, 6, 7));
        assert_eq!(count_on(&dst, dst.extent()).unwrap(), 9);
        assert_eq!(dst.get(3, 3), MASK_ON);
        assert_eq!(dst.get(5, 5), MASK_ON);
        assert_eq!(dst.get(6, 4), 0);
    }

    #[test]
    fn test_close_fills_hole() {
        let mut src = square(12, 12, Region::new(2, 2, 7, 7));
        src.set(5, 5, 0);
        let mut dst = Raster8::new(12, 12);
        let mut scratch = Raster8::new(12, 12);
        let written = close3x3(&src, &mut dst, &mut scratch, src.extent()).unwrap();
        assert!(written.contains(5, 5));
        assert_eq!(dst.get(5, 5), MASK_ON);
        assert_eq!(dst.get(4, 4), MASK_ON);
    }

    #[test]
    fn test_open_removes_speck() {
        let mut src = square(12, 12, Region::new(2, 2, 6, 6));
        src.set(9, 9, MASK_ON);
        let mut dst = Raster8::new(12, 12);
        let mut scratch = Raster8::new(12, 12);
        open3x3(&src, &mut dst, &mut scratch, src.extent()).unwrap();
        assert_eq!(dst.get(9, 9), 0);
        assert_eq!(dst.get(4, 4), MASK_ON);
    }

    #[test]
    fn test_close_with_disk_removes_dark_line() {
        // A thin dark body on a bright background disappears after closing,
        // which is how the tracker estimates the static scene.
        let mut frame = Raster8::filled(30, 30, 180);
        for y in 5..25 {
            frame.set(15, y, 20);
        }
        let disk = StructuringElement::disk(2).unwrap();
        let mut bg = Raster8::new(30, 30);
        let mut scratch = Raster8::new(30, 30);
        let written = close(&frame, &mut bg, &mut scratch, frame.extent(), &disk).unwrap();
        assert!(written.contains(15, 15));
        assert_eq!(bg.get(15, 15), 180);
    }

    #[test]
    fn test_region_too_small() {
        let src = Raster8::new(4, 4);
        let mut dst = Raster8::new(4, 4);
        let disk = StructuringElement::disk(3).unwrap();
        let err = dilate(&src, &mut dst, src.extent(), &disk).unwrap_err();
        assert!(matches!(err, ImagingError::RegionTooSmall { .. }));
    }

    #[test]
    fn test_region_outside_raster() {
        let src = Raster8::new(4, 4);
        let mut dst = Raster8::new(4, 4);
        let err = threshold(&src, &mut dst, Region::new(2, 2, 4, 4), 1).unwrap_err();
        assert!(matches!(err, ImagingError::RegionOutOfBounds { .. }));
    }

    proptest! {
        #[test]
        fn prop_closing_never_darkens(
            samples in prop::collection::vec(any::<u8>(), 16 * 12),
            radius in 1usize..3,
        ) {
            let src = Raster8::from_packed(16, 12, &samples).unwrap();
            let disk = StructuringElement::disk(radius).unwrap();
            let mut dst = Raster8::new(16, 12);
            let mut scratch = Raster8::new(16, 12);
            let written = close(&src, &mut dst, &mut scratch, src.extent(), &disk).unwrap();
            for y in written.y..written.bottom() {
                for x in written.x..written.right() {
                    prop_assert!(dst.get(x, y) >= src.get(x, y));
                }
            }
        }
    }
}
