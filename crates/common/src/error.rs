//! Error types shared across Boutscope crates.

use std::path::PathBuf;

/// Top-level error type for Boutscope operations.
#[derive(Debug, thiserror::Error)]
pub enum BoutscopeError {
    /// A parameter was out of range. Raised by the mutating call before
    /// any state is touched.
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Dimension mismatch in {context}: expected {expected}, got {actual}")]
    DimensionMismatch {
        context: String,
        expected: String,
        actual: String,
    },

    #[error("Imaging error: {message}")]
    Imaging { message: String },

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using BoutscopeError.
pub type BoutscopeResult<T> = Result<T, BoutscopeError>;

impl BoutscopeError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn dimension_mismatch(
        context: impl Into<String>,
        expected: impl ToString,
        actual: impl ToString,
    ) -> Self {
        Self::DimensionMismatch {
            context: context.into(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    pub fn imaging(msg: impl Into<String>) -> Self {
        Self::Imaging {
            message: msg.into(),
        }
    }

    pub fn parse(line: usize, msg: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: msg.into(),
        }
    }

    /// Whether this error came from a bad parameter rather than bad data.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. })
    }
}

/// Fail with a configuration error unless `value >= min`.
pub fn ensure_at_least<T>(name: &str, value: T, min: T) -> BoutscopeResult<()>
where
    T: PartialOrd + std::fmt::Display,
{
    if value < min {
        return Err(BoutscopeError::config(format!(
            "{name} must be at least {min}, got {value}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_at_least() {
        assert!(ensure_at_least("segments", 3, 1).is_ok());
        let err = ensure_at_least("segments", 0, 1).unwrap_err();
        assert!(err.is_config());
        assert_eq!(
            err.to_string(),
            "Configuration error: segments must be at least 1, got 0"
        );
    }

    #[test]
    fn test_dimension_mismatch_message() {
        let err = BoutscopeError::dimension_mismatch("speed trace", 10, 9);
        assert_eq!(
            err.to_string(),
            "Dimension mismatch in speed trace: expected 10, got 9"
        );
        assert!(!err.is_config());
    }
}
