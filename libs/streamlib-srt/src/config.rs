// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Control surface settings loaded from TOML.
//!
//! ```toml
//! log_level = "notice"
//! log_areas = ["control", "rexmit"]
//! log_flags = ["disable_time"]
//! log_file = "/var/log/streamlib/srt.log"
//! max_stream_id_length = 256
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SrtControlError};
use crate::log_config::{LogAreas, LogFlags, LogLevel};
use crate::stream_id::MAX_STREAM_ID_LENGTH;

/// Settings applied by [`SessionControlSurface::apply_config`].
///
/// [`SessionControlSurface::apply_config`]: crate::SessionControlSurface::apply_config
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SrtControlConfig {
    /// Engine log threshold.
    pub log_level: LogLevel,

    /// Enabled functional areas by name. `"standard"` selects every area
    /// except congestion control.
    pub log_areas: Vec<String>,

    /// File sink line flags by name.
    pub log_flags: Vec<String>,

    /// Bind the diagnostic sink to this file.
    pub log_file: Option<PathBuf>,

    /// Route diagnostics to the host's `tracing` subscriber. Takes precedence
    /// over `log_file`.
    pub internal_log: bool,

    /// Stream id length limit, at most [`MAX_STREAM_ID_LENGTH`].
    pub max_stream_id_length: usize,
}

impl Default for SrtControlConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            log_areas: vec!["standard".to_string()],
            log_flags: Vec::new(),
            log_file: None,
            internal_log: false,
            max_stream_id_length: MAX_STREAM_ID_LENGTH,
        }
    }
}

impl SrtControlConfig {
    /// Parse and validate.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            SrtControlError::Configuration(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml_str(&content)?;
        tracing::info!("[SRT] Loaded control surface config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_stream_id_length > MAX_STREAM_ID_LENGTH {
            return Err(SrtControlError::Configuration(format!(
                "max_stream_id_length {} exceeds engine limit {}",
                self.max_stream_id_length, MAX_STREAM_ID_LENGTH
            )));
        }
        if let Some(path) = &self.log_file {
            if path.as_os_str().is_empty() {
                return Err(SrtControlError::Configuration(
                    "log_file is empty".to_string(),
                ));
            }
        }
        self.areas()?;
        self.flags()?;
        Ok(())
    }

    /// Union of the named areas.
    pub fn areas(&self) -> Result<LogAreas> {
        self.log_areas
            .iter()
            .try_fold(LogAreas::empty(), |acc, name| {
                LogAreas::parse_name(name).map(|area| acc | area)
            })
    }

    /// Union of the named flags.
    pub fn flags(&self) -> Result<LogFlags> {
        self.log_flags
            .iter()
            .try_fold(LogFlags::empty(), |acc, name| {
                LogFlags::parse_name(name).map(|flag| acc | flag)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = SrtControlConfig::from_toml_str("").unwrap();
        assert_eq!(config, SrtControlConfig::default());
        assert_eq!(config.areas().unwrap(), LogAreas::STANDARD);
        assert_eq!(config.flags().unwrap(), LogFlags::empty());
        assert_eq!(config.log_level, LogLevel::Warning);
    }

    #[test]
    fn test_parse_full() {
        let config = SrtControlConfig::from_toml_str(
            r#"
            log_level = "debug"
            log_areas = ["control", "REXMIT"]
            log_flags = ["disable_time", "disable_eol"]
            log_file = "/tmp/srt.log"
            internal_log = true
            max_stream_id_length = 64
            "#,
        )
        .unwrap();

        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.areas().unwrap(), LogAreas::CONTROL | LogAreas::REXMIT);
        assert_eq!(
            config.flags().unwrap(),
            LogFlags::DISABLE_TIME | LogFlags::DISABLE_EOL
        );
        assert_eq!(config.log_file, Some(PathBuf::from("/tmp/srt.log")));
        assert!(config.internal_log);
        assert_eq!(config.max_stream_id_length, 64);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(SrtControlConfig::from_toml_str("max_stream_id_length = 513").is_err());
        assert!(SrtControlConfig::from_toml_str("log_areas = [\"video\"]").is_err());
        assert!(SrtControlConfig::from_toml_str("log_level = \"verbose\"").is_err());
        assert!(SrtControlConfig::from_toml_str("log_colour = true").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "log_level = \"notice\"\n").unwrap();

        let config = SrtControlConfig::load(file.path()).unwrap();
        assert_eq!(config.log_level, LogLevel::Notice);

        assert!(SrtControlConfig::load("/nonexistent/srt.toml").is_err());
    }
}
