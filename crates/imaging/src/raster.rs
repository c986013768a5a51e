//! Owned 2D sample grids with padded rows.
//!
//! Rows are padded so the stride is a multiple of [`ROW_ALIGN`] samples.
//! The padding is part of the storage but never part of the image: row
//! views expose exactly `width` samples and pixel access past `width` or
//! `height` panics.

use boutscope_model::Region;

use crate::error::{ImagingError, ImagingResult};

/// Row stride granularity, in samples.
pub const ROW_ALIGN: usize = 4;

/// A pixel sample type.
pub trait Sample: Copy + Default + PartialOrd + Send + Sync + std::fmt::Debug + 'static {}

impl Sample for u8 {}
impl Sample for f32 {}

/// A stride-padded raster that owns its samples.
#[derive(Clone, PartialEq)]
pub struct RasterBuffer<T: Sample> {
    width: usize,
    height: usize,
    stride: usize,
    data: Vec<T>,
}

/// 8-bit grayscale raster.
pub type Raster8 = RasterBuffer<u8>;

/// 32-bit float raster.
pub type Raster32f = RasterBuffer<f32>;

/// Smallest aligned stride that holds `width` samples.
pub fn aligned_stride(width: usize) -> usize {
    width.div_ceil(ROW_ALIGN) * ROW_ALIGN
}

impl<T: Sample> RasterBuffer<T> {
    /// A zeroed raster.
    pub fn new(width: usize, height: usize) -> Self {
        Self::filled(width, height, T::default())
    }

    /// A raster with every sample (padding included) set to `value`.
    pub fn filled(width: usize, height: usize, value: T) -> Self {
        let stride = aligned_stride(width);
        Self {
            width,
            height,
            stride,
            data: vec![value; stride * height],
        }
    }

    /// Wrap existing samples laid out with an explicit stride.
    pub fn from_samples(
        width: usize,
        height: usize,
        stride: usize,
        data: Vec<T>,
    ) -> ImagingResult<Self> {
        if stride < width {
            return Err(ImagingError::InvalidLayout {
                message: format!("stride {stride} is smaller than width {width}"),
            });
        }
        if data.len() < stride * height {
            return Err(ImagingError::InvalidLayout {
                message: format!(
                    "{} samples cannot hold {height} rows of stride {stride}",
                    data.len()
                ),
            });
        }
        let mut data = data;
        data.truncate(stride * height);
        Ok(Self {
            width,
            height,
            stride,
            data,
        })
    }

    /// Copy tightly packed rows (`width` samples each) into an aligned raster.
    pub fn from_packed(width: usize, height: usize, packed: &[T]) -> ImagingResult<Self> {
        if packed.len() != width * height {
            return Err(ImagingError::InvalidLayout {
                message: format!(
                    "expected {} packed samples for {width}x{height}, got {}",
                    width * height,
                    packed.len()
                ),
            });
        }
        let mut raster = Self::new(width, height);
        if width > 0 {
            for (y, row) in packed.chunks_exact(width).enumerate() {
                raster.row_mut(y).copy_from_slice(row);
            }
        }
        Ok(raster)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Samples per stored row, padding included.
    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Region covering the whole raster.
    pub fn extent(&self) -> Region {
        Region::full(self.width, self.height)
    }

    /// Sample at `(x, y)`. Panics outside the image.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> T {
        self.data[self.offset(x, y)]
    }

    /// Overwrite the sample at `(x, y)`. Panics outside the image.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: T) {
        let offset = self.offset(x, y);
        self.data[offset] = value;
    }

    /// The `width` image samples of row `y`.
    pub fn row(&self, y: usize) -> &[T] {
        assert!(y < self.height, "row {y} outside raster of height {}", self.height);
        let start = y * self.stride;
        &self.data[start..start + self.width]
    }

    pub fn row_mut(&mut self, y: usize) -> &mut [T] {
        assert!(y < self.height, "row {y} outside raster of height {}", self.height);
        let start = y * self.stride;
        &mut self.data[start..start + self.width]
    }

    /// Whole backing store, row padding included.
    pub fn as_padded_slice(&self) -> &[T] {
        &self.data
    }

    /// Image samples packed without row padding.
    pub fn to_packed(&self) -> Vec<T> {
        (0..self.height).flat_map(|y| self.row(y).to_vec()).collect()
    }

    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
    }

    /// Set every sample of `region` to `value`.
    pub fn fill_region(&mut self, region: Region, value: T) -> ImagingResult<()> {
        self.check_region("fill_region", region)?;
        for y in region.y..region.bottom() {
            self.row_mut(y)[region.x..region.right()].fill(value);
        }
        Ok(())
    }

    /// Copy `region` from a raster of the same size.
    pub fn copy_region_from(&mut self, src: &RasterBuffer<T>, region: Region) -> ImagingResult<()> {
        self.check_same_size("copy_region_from", src)?;
        self.check_region("copy_region_from", region)?;
        for y in region.y..region.bottom() {
            let src_row = &src.row(y)[region.x..region.right()];
            self.row_mut(y)[region.x..region.right()].copy_from_slice(src_row);
        }
        Ok(())
    }

    /// Error unless `region` lies inside the raster.
    pub fn check_region(&self, op: &'static str, region: Region) -> ImagingResult<()> {
        if self.extent().encloses(&region) {
            Ok(())
        } else {
            Err(ImagingError::RegionOutOfBounds {
                op,
                region,
                width: self.width,
                height: self.height,
            })
        }
    }

    /// Error unless `other` has the same width and height.
    pub fn check_same_size<U: Sample>(
        &self,
        op: &'static str,
        other: &RasterBuffer<U>,
    ) -> ImagingResult<()> {
        if self.size() == other.size() {
            Ok(())
        } else {
            Err(ImagingError::SizeMismatch {
                op,
                expected: self.size(),
                actual: other.size(),
            })
        }
    }

    #[inline]
    fn offset(&self, x: usize, y: usize) -> usize {
        assert!(
            x < self.width && y < self.height,
            "pixel ({x}, {y}) outside {}x{} raster",
            self.width,
            self.height
        );
        y * self.stride + x
    }
}

impl Raster8 {
    /// Float copy of an 8-bit raster.
    pub fn to_f32(&self) -> Raster32f {
        let mut out = Raster32f::new(self.width, self.height);
        for y in 0..self.height {
            for (dst, &src) in out.row_mut(y).iter_mut().zip(self.row(y)) {
                *dst = src as f32;
            }
        }
        out
    }
}

impl Raster32f {
    /// 8-bit copy, rounding and saturating to 0..=255.
    pub fn to_u8(&self) -> Raster8 {
        let mut out = Raster8::new(self.width, self.height);
        for y in 0..self.height {
            for (dst, &src) in out.row_mut(y).iter_mut().zip(self.row(y)) {
                *dst = src.round().clamp(0.0, 255.0) as u8;
            }
        }
        out
    }
}

impl<T: Sample> std::ops::Index<(usize, usize)> for RasterBuffer<T> {
    type Output = T;

    fn index(&self, (x, y): (usize, usize)) -> &T {
        &self.data[self.offset(x, y)]
    }
}

impl<T: Sample> std::ops::IndexMut<(usize, usize)> for RasterBuffer<T> {
    fn index_mut(&mut self, (x, y): (usize, usize)) -> &mut T {
        let offset = self.offset(x, y);
        &mut self.data[offset]
    }
}

impl<T: Sample> std::fmt::Debug for RasterBuffer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("stride", &self.stride)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stride_is_aligned() {
        let r = Raster8::new(5, 3);
        assert_eq!(r.stride(), 8);
        assert_eq!(r.as_padded_slice().len(), 24);
        assert_eq!(r.row(2).len(), 5);
        assert_eq!(Raster32f::new(8, 1).stride(), 8);
    }

    #[test]
    fn test_get_set_and_index() {
        let mut r = Raster8::new(3, 3);
        r.set(2, 1, 7);
        r[(0, 2)] = 9;
        assert_eq!(r.get(2, 1), 7);
        assert_eq!(r[(0, 2)], 9);
        assert_eq!(r.to_packed(), vec![0, 0, 0, 0, 0, 7, 9, 0, 0]);
    }

    #[test]
    #[should_panic(expected = "outside")]
    fn test_access_in_padding_panics() {
        let r = Raster8::new(3, 3);
        // Column 3 exists in storage (stride 4) but not in the image.
        r.get(3, 0);
    }

    #[test]
    fn test_from_samples_validates_layout() {
        assert!(Raster8::from_samples(4, 2, 3, vec![0; 8]).is_err());
        assert!(Raster8::from_samples(4, 2, 6, vec![0; 11]).is_err());
        let r = Raster8::from_samples(4, 2, 6, (0..12).collect()).unwrap();
        assert_eq!(r.get(1, 1), 7);
        assert_eq!(r.stride(), 6);
    }

    #[test]
    fn test_from_packed_roundtrip() {
        let packed: Vec<u8> = (0..15).collect();
        let r = Raster8::from_packed(5, 3, &packed).unwrap();
        assert_eq!(r.get(4, 2), 14);
        assert_eq!(r.to_packed(), packed);
        assert!(Raster8::from_packed(5, 3, &packed[..14]).is_err());
    }

    #[test]
    fn test_fill_and_copy_region() {
        let mut a = Raster8::new(6, 4);
        a.fill_region(Region::new(1, 1, 2, 2), 50).unwrap();
        let mut b = Raster8::new(6, 4);
        b.copy_region_from(&a, Region::new(0, 0, 2, 2)).unwrap();
        assert_eq!(b.get(1, 1), 50);
        assert_eq!(b.get(2, 2), 0);
        assert!(a.fill_region(Region::new(5, 0, 2, 1), 1).is_err());
        assert!(b.copy_region_from(&Raster8::new(5, 4), Region::new(0, 0, 1, 1)).is_err());
    }

    #[test]
    fn test_float_conversions_saturate() {
        let mut f = Raster32f::new(3, 1);
        f.set(0, 0, -4.0);
        f.set(1, 0, 127.6);
        f.set(2, 0, 300.0);
        let b = f.to_u8();
        assert_eq!(b.row(0), &[0, 128, 255]);
        assert_eq!(b.to_f32().get(1, 0), 128.0);
    }
}
