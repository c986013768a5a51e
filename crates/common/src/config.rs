//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ensure_at_least, BoutscopeError, BoutscopeResult};

/// Global application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Movement and bout analysis parameters.
    pub analysis: AnalysisDefaults,

    /// Tail tracking parameters.
    pub tracking: TrackingDefaults,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Default parameters for speed and bout analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisDefaults {
    /// Acquisition frame rate (Hz).
    pub frame_rate: u32,

    /// Speeds at or below this value (pixels/sec) count as rest.
    pub speed_threshold: f64,

    /// Minimum bout length in frames.
    pub min_frames_per_bout: usize,

    /// Maximum number of repeated samples at the peak speed.
    pub max_frames_at_peak: usize,

    /// Tap count of the realtime boxcar FIR filter.
    pub fir_taps: usize,

    /// Window size of the offline zero-phase smoother.
    pub smoothing_window: usize,
}

/// Default parameters for the tail tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingDefaults {
    /// Foreground threshold (0-255); pixels strictly above it are tail.
    pub threshold: u8,

    /// Radius of the disk used to build the background by closing.
    pub morphology_radius: usize,

    /// Number of tail segments measured per frame.
    pub segment_count: usize,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "boutscope=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,
}

impl Default for AnalysisDefaults {
    fn default() -> Self {
        Self {
            frame_rate: 250,
            speed_threshold: 4.0,
            min_frames_per_bout: 5,
            max_frames_at_peak: 1,
            fir_taps: 5,
            smoothing_window: 5,
        }
    }
}

impl Default for TrackingDefaults {
    fn default() -> Self {
        Self {
            threshold: 20,
            morphology_radius: 4,
            segment_count: 7,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    ///
    /// A missing file gives the defaults; a file that exists but cannot be
    /// read or fails validation is an error, so the caller can report it
    /// once logging is up.
    pub fn try_load() -> BoutscopeResult<Self> {
        let config_path = config_file_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load and validate config from an explicit path.
    pub fn load_from(path: &Path) -> BoutscopeResult<Self> {
        if !path.exists() {
            return Err(BoutscopeError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<PathBuf, std::io::Error> {
        let config_path = config_file_path();
        self.save_to(&config_path)?;
        Ok(config_path)
    }

    /// Save config to an explicit path.
    pub fn save_to(&self, path: &Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Check every parameter against its documented range.
    pub fn validate(&self) -> BoutscopeResult<()> {
        let a = &self.analysis;
        ensure_at_least("frame_rate", a.frame_rate, 1)?;
        ensure_at_least("min_frames_per_bout", a.min_frames_per_bout, 1)?;
        ensure_at_least("fir_taps", a.fir_taps, 1)?;
        ensure_at_least("smoothing_window", a.smoothing_window, 1)?;
        if !a.speed_threshold.is_finite() || a.speed_threshold < 0.0 {
            return Err(BoutscopeError::config(format!(
                "speed_threshold must be a non-negative number, got {}",
                a.speed_threshold
            )));
        }

        let t = &self.tracking;
        ensure_at_least("morphology_radius", t.morphology_radius, 1)?;
        ensure_at_least("segment_count", t.segment_count, 1)?;
        Ok(())
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("boutscope").join("config.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        AppConfig::default().validate().unwrap();
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"analysis":{"frame_rate":100}}"#).unwrap();
        assert_eq!(config.analysis.frame_rate, 100);
        assert_eq!(config.analysis.fir_taps, 5);
        assert_eq!(config.tracking, TrackingDefaults::default());
    }

    #[test]
    fn test_validate_rejects_zero_segments() {
        let mut config = AppConfig::default();
        config.tracking.segment_count = 0;
        assert!(config.validate().unwrap_err().is_config());
    }

    #[test]
    fn test_validate_rejects_negative_threshold() {
        let mut config = AppConfig::default();
        config.analysis.speed_threshold = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = std::env::temp_dir().join(format!("boutscope-config-{}", std::process::id()));
        let path = dir.join("config.json");
        let mut config = AppConfig::default();
        config.tracking.threshold = 42;
        config.save_to(&path).unwrap();

        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded, config);
        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_load_from_missing_file() {
        let err = AppConfig::load_from(Path::new("/nonexistent/boutscope.json")).unwrap_err();
        assert!(matches!(err, BoutscopeError::FileNotFound { .. }));
    }
}
