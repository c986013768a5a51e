//! Imaging error types.

use boutscope_common::BoutscopeError;
use boutscope_model::Region;

/// Failure of an imaging primitive.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ImagingError {
    #[error("{op}: region {region:?} does not fit a {width}x{height} raster")]
    RegionOutOfBounds {
        op: &'static str,
        region: Region,
        width: usize,
        height: usize,
    },

    #[error("{op}: region {region:?} is empty after shrinking by the structuring element")]
    RegionTooSmall { op: &'static str, region: Region },

    #[error("{op}: raster size {actual:?} differs from {expected:?}")]
    SizeMismatch {
        op: &'static str,
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("Invalid raster layout: {message}")]
    InvalidLayout { message: String },

    #[error("Invalid structuring element: {message}")]
    InvalidElement { message: String },
}

pub type ImagingResult<T> = Result<T, ImagingError>;

impl From<ImagingError> for BoutscopeError {
    fn from(err: ImagingError) -> Self {
        match err {
            ImagingError::SizeMismatch {
                op,
                expected,
                actual,
            } => BoutscopeError::dimension_mismatch(
                op,
                format!("{}x{}", expected.0, expected.1),
                format!("{}x{}", actual.0, actual.1),
            ),
            ImagingError::InvalidElement { message } => BoutscopeError::config(message),
            other => BoutscopeError::imaging(other.to_string()),
        }
    }
}

/// Record a failed primitive and carry on.
///
/// Primitive failures are not fatal to tracking: the caller continues with
/// whatever the output buffer held before.
pub fn log_failure<T>(result: ImagingResult<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(error = %e, "imaging primitive failed; keeping previous buffer");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversion_to_common_error() {
        let err: BoutscopeError = ImagingError::SizeMismatch {
            op: "abs_diff",
            expected: (4, 4),
            actual: (4, 5),
        }
        .into();
        assert!(matches!(err, BoutscopeError::DimensionMismatch { .. }));

        let err: BoutscopeError = ImagingError::InvalidElement {
            message: "radius must be at least 1".into(),
        }
        .into();
        assert!(err.is_config());
    }

    #[test]
    fn test_log_failure_passes_values_through() {
        assert_eq!(log_failure::<u8>(Ok(3)), Some(3));
        let failed: ImagingResult<u8> = Err(ImagingError::RegionTooSmall {
            op: "close",
            region: Region::new(0, 0, 1, 1),
        });
        assert_eq!(log_failure(failed), None);
    }
}
