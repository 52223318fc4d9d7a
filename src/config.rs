//! Viewer defaults, loadable from a TOML file.
//!
//! ```toml
//! default_window_level = 40.0
//! default_window_width = 400.0
//! default_zoom = 1.0
//! load_deadline_ms = 30000
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewerConfig {
    pub default_window_level: f64,
    pub default_window_width: f64,
    pub default_zoom: f64,
    /// Deadline applied to loads when the caller does not pass one.
    pub load_deadline_ms: Option<u64>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            default_window_level: 0.0,
            default_window_width: 400.0,
            default_zoom: 1.0,
            load_deadline_ms: None,
        }
    }
}

impl ViewerConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: ViewerConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        log::info!("Reading viewer config: {}", path.display());
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.default_window_level.is_finite() {
            return Err(ConfigError::Invalid {
                field: "default_window_level",
                reason: format!("{} is not finite", self.default_window_level),
            });
        }
        if !(self.default_window_width.is_finite() && self.default_window_width > 0.0) {
            return Err(ConfigError::Invalid {
                field: "default_window_width",
                reason: format!("{} is not positive", self.default_window_width),
            });
        }
        if !(self.default_zoom.is_finite() && self.default_zoom > 0.0) {
            return Err(ConfigError::Invalid {
                field: "default_zoom",
                reason: format!("{} is not positive", self.default_zoom),
            });
        }
        if self.load_deadline_ms == Some(0) {
            return Err(ConfigError::Invalid {
                field: "load_deadline_ms",
                reason: String::from("deadline must be at least 1ms"),
            });
        }
        Ok(())
    }

    pub fn load_deadline(&self) -> Option<Duration> {
        self.load_deadline_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = ViewerConfig::from_toml_str("").unwrap();
        assert_eq!(config, ViewerConfig::default());
        assert_eq!(config.default_window_width, 400.0);
        assert_eq!(config.load_deadline(), None);
    }

    #[test]
    fn partial_document_overrides_only_given_keys() {
        let config = ViewerConfig::from_toml_str(
            "default_window_level = 40.0\nload_deadline_ms = 1500\n",
        )
        .unwrap();
        assert_eq!(config.default_window_level, 40.0);
        assert_eq!(config.default_window_width, 400.0);
        assert_eq!(config.load_deadline(), Some(Duration::from_millis(1500)));
    }

    #[test]
    fn non_positive_width_is_rejected() {
        let err = ViewerConfig::from_toml_str("default_window_width = 0.0").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "default_window_width",
                ..
            }
        ));
    }

    #[test]
    fn zero_deadline_and_bad_zoom_are_rejected() {
        assert!(ViewerConfig::from_toml_str("load_deadline_ms = 0").is_err());
        assert!(ViewerConfig::from_toml_str("default_zoom = -1.0").is_err());
    }

    #[test]
    fn unknown_keys_fail_to_parse() {
        let err = ViewerConfig::from_toml_str("window = 3").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = ViewerConfig::load(Path::new("/nonexistent/dicomscope.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/dicomscope.toml"));
    }
}
