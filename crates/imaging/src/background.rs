//! Background models.
//!
//! [`ClosingBackground`] estimates the static scene from a single frame by
//! morphological closing: a thin dark animal vanishes under a closing with
//! an element wider than its body. [`RunningBackground`] blends every frame
//! into a float accumulator and can leave chosen regions out of the update.

use boutscope_model::Region;

use crate::error::{ImagingError, ImagingResult};
use crate::morphology;
use crate::raster::{Raster32f, Raster8};
use crate::strel::StructuringElement;

/// Background rebuilt from a frame by closing with a structuring element.
#[derive(Debug, Clone)]
pub struct ClosingBackground {
    background: Raster8,
    scratch: Raster8,
    /// Region written by the last successful rebuild.
    valid_region: Option<Region>,
}

impl ClosingBackground {
    /// An empty model for `width` x `height` frames.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            background: Raster8::new(width, height),
            scratch: Raster8::new(width, height),
            valid_region: None,
        }
    }

    /// Replace the estimate inside `region` with the closing of `frame`.
    ///
    /// Returns the region that now holds a valid estimate; it is `region`
    /// shrunk twice by the element's insets.
    pub fn rebuild(
        &mut self,
        frame: &Raster8,
        region: Region,
        element: &StructuringElement,
    ) -> ImagingResult<Region> {
        let written = morphology::close(
            frame,
            &mut self.background,
            &mut self.scratch,
            region,
            element,
        )?;
        self.valid_region = Some(written);
        Ok(written)
    }

    pub fn image(&self) -> &Raster8 {
        &self.background
    }

    /// Region covered by the last rebuild, if any.
    pub fn valid_region(&self) -> Option<Region> {
        self.valid_region
    }
}

/// Exponentially weighted running-average background.
#[derive(Debug, Clone)]
pub struct RunningBackground {
    background: Raster32f,
    /// Weight of the newest frame in each update.
    fraction: f32,
    /// Working copy of the frame for selective updates.
    cache: Raster8,
}

impl RunningBackground {
    /// Default weight of the newest frame.
    pub const DEFAULT_FRACTION: f32 = 0.1;

    /// Start from `initial` with the default update fraction.
    pub fn new(initial: &Raster8) -> Self {
        Self {
            background: initial.to_f32(),
            fraction: Self::DEFAULT_FRACTION,
            cache: Raster8::new(initial.width(), initial.height()),
        }
    }

    /// Start from `initial`, blending `fraction` of each new frame.
    pub fn with_fraction(initial: &Raster8, fraction: f32) -> ImagingResult<Self> {
        if !(0.0..=1.0).contains(&fraction) {
            return Err(ImagingError::InvalidLayout {
                message: format!("update fraction must lie in [0, 1], got {fraction}"),
            });
        }
        let mut model = Self::new(initial);
        model.fraction = fraction;
        Ok(model)
    }

    pub fn fraction(&self) -> f32 {
        self.fraction
    }

    /// `bg = (1 - f) * bg + f * frame`.
    pub fn update(&mut self, frame: &Raster8) -> ImagingResult<()> {
        self.background.check_same_size("running background update", frame)?;
        blend(&mut self.background, frame, self.fraction);
        Ok(())
    }

    /// Like [`update`](Self::update), but pixels inside `exclude` keep
    /// their previous background value.
    pub fn update_excluding(&mut self, frame: &Raster8, exclude: &[Region]) -> ImagingResult<()> {
        self.background.check_same_size("running background update", frame)?;
        if exclude.is_empty() {
            blend(&mut self.background, frame, self.fraction);
            return Ok(());
        }

        // Patching the current background into the excluded regions of the
        // frame makes the blend a no-op there.
        let current = self.background.to_u8();
        self.cache.copy_region_from(frame, frame.extent())?;
        for region in exclude {
            let clipped = region.clip(frame.width(), frame.height());
            if !clipped.is_empty() {
                self.cache.copy_region_from(&current, clipped)?;
            }
        }
        blend(&mut self.background, &self.cache, self.fraction);
        Ok(())
    }

    pub fn background(&self) -> &Raster32f {
        &self.background
    }

    /// Background rounded to 8 bits.
    pub fn background_u8(&self) -> Raster8 {
        self.background.to_u8()
    }
}

fn blend(background: &mut Raster32f, frame: &Raster8, fraction: f32) {
    let keep = 1.0 - fraction;
    for y in 0..frame.height() {
        for (bg, &v) in background.row_mut(y).iter_mut().zip(frame.row(y)) {
            *bg = keep * *bg + fraction * v as f32;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closing_background_erases_dark_body() {
        let mut frame = Raster8::filled(40, 40, 150);
        frame.fill_region(Region::new(18, 10, 2, 20), 10).unwrap();
        let disk = StructuringElement::disk(3).unwrap();

        let mut model = ClosingBackground::new(40, 40);
        assert!(model.valid_region().is_none());
        let valid = model.rebuild(&frame, frame.extent(), &disk).unwrap();

        assert!(valid.contains(19, 20));
        assert_eq!(model.image().get(19, 20), 150);
        assert_eq!(model.valid_region(), Some(valid));
    }

    #[test]
    fn test_running_update_blends() {
        let initial = Raster8::filled(4, 4, 100);
        let mut model = RunningBackground::with_fraction(&initial, 0.5).unwrap();
        model.update(&Raster8::filled(4, 4, 200)).unwrap();
        assert!((model.background().get(2, 2) - 150.0).abs() < 1e-4);
        assert_eq!(model.background_u8().get(0, 0), 150);
    }

    #[test]
    fn test_running_update_excluding_region() {
        let initial = Raster8::filled(6, 6, 100);
        let mut model = RunningBackground::with_fraction(&initial, 0.5).unwrap();
        model
            .update_excluding(&Raster8::filled(6, 6, 0), &[Region::new(0, 0, 3, 3)])
            .unwrap();
        assert!((model.background().get(1, 1) - 100.0).abs() < 1e-4);
        assert!((model.background().get(4, 4) - 50.0).abs() < 1e-4);
    }

    #[test]
    fn test_running_rejects_bad_inputs() {
        let initial = Raster8::new(4, 4);
        assert!(RunningBackground::with_fraction(&initial, 1.5).is_err());
        let mut model = RunningBackground::new(&initial);
        assert_eq!(model.fraction(), RunningBackground::DEFAULT_FRACTION);
        assert!(model.update(&Raster8::new(5, 4)).is_err());
    }
}
