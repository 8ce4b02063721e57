//! Monitor configuration

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::md::default_library_paths;
use crate::monitor::{Mode, DEFAULT_SAMPLE_INTERVAL};
use crate::session::DEFAULT_MEASUREMENT_WINDOW;

/// Environment variable naming a Metrics Discovery library to try first
pub const LIBRARY_ENV_VAR: &str = "IGDMD_LIBRARY";

/// Settings for one monitoring run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    /// Snapshot or continuous sampling
    pub mode: Mode,
    /// Pause between samples in continuous mode
    pub sample_interval: Duration,
    /// How long the metric set stays active for each sample
    pub measurement_window: Duration,
    /// Library path tried before the built-in locations
    pub library_override: Option<PathBuf>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            sample_interval: DEFAULT_SAMPLE_INTERVAL,
            measurement_window: DEFAULT_MEASUREMENT_WINDOW,
            library_override: None,
        }
    }
}

impl MonitorConfig {
    /// Library paths to try, in order
    pub fn library_candidates(&self) -> Vec<PathBuf> {
        self.library_override
            .iter()
            .cloned()
            .chain(default_library_paths())
            .collect()
    }

    /// Check the configuration for values the monitor cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.sample_interval.is_zero() {
            return Err(Error::invalid_config("sample interval must be non-zero"));
        }
        if self.measurement_window.is_zero() {
            return Err(Error::invalid_config("measurement window must be non-zero"));
        }
        if self.measurement_window > self.sample_interval {
            return Err(Error::invalid_config(format!(
                "measurement window ({:?}) exceeds sample interval ({:?})",
                self.measurement_window, self.sample_interval
            )));
        }
        if let Some(path) = &self.library_override {
            if path.as_os_str().is_empty() {
                return Err(Error::invalid_config("library path is empty"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MonitorConfig::default();
        assert_eq!(config.mode, Mode::Continuous);
        assert_eq!(config.sample_interval, Duration::from_secs(1));
        assert_eq!(config.measurement_window, Duration::from_millis(100));
        assert!(config.validate().is_ok());
        assert_eq!(config.library_candidates(), default_library_paths());
    }

    #[test]
    fn test_override_is_tried_first() {
        let config = MonitorConfig {
            library_override: Some("/opt/md/libigdmd.so".into()),
            ..MonitorConfig::default()
        };
        let candidates = config.library_candidates();
        assert_eq!(candidates[0], PathBuf::from("/opt/md/libigdmd.so"));
        assert_eq!(candidates.len(), default_library_paths().len() + 1);
    }

    #[test]
    fn test_rejects_zero_durations() {
        let config = MonitorConfig {
            sample_interval: Duration::ZERO,
            ..MonitorConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig { .. })));

        let config = MonitorConfig {
            measurement_window: Duration::ZERO,
            ..MonitorConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_window_longer_than_interval() {
        let config = MonitorConfig {
            measurement_window: Duration::from_secs(2),
            ..MonitorConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_empty_library_path() {
        let config = MonitorConfig {
            library_override: Some(PathBuf::new()),
            ..MonitorConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
