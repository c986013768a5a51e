//! Boutscope Imaging
//!
//! Low-level image plumbing used by the tail tracker:
//! - **Raster:** Owned, stride-padded 8-bit and 32-bit float sample grids
//! - **Structuring elements:** Disk and rectangle neighborhoods with an anchor
//! - **Morphology:** Dilate/erode/open/close, thresholding, absolute difference
//! - **Background:** Closing-based and running-average background models
//!
//! Every operation works on an explicit [`Region`](boutscope_model::Region)
//! and never touches samples outside it.

pub mod background;
pub mod error;
pub mod morphology;
pub mod raster;
pub mod strel;

pub use background::{ClosingBackground, RunningBackground};
pub use error::{log_failure, ImagingError, ImagingResult};
pub use raster::{Raster32f, Raster8, RasterBuffer, Sample};
pub use strel::StructuringElement;
