// SPDX-License-Identifier: MIT OR Apache-2.0
//! Editor configuration.
//!
//! Settings are stored as RON next to the session (`vidstudio.ron`). A
//! missing file means defaults; a file written by a newer editor is refused.

use crate::history::MAX_HISTORY;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use vidstudio_timeline::playback::{DEFAULT_ADVANCE_DELAY, DEFAULT_VIEWPORT_WIDTH};
use vidstudio_timeline::{SplitStrategy, DEFAULT_CLIP_DURATION, PIXELS_PER_SECOND};

/// Current config format version
pub const CONFIG_FORMAT_VERSION: u32 = 1;

/// Config file name
pub const CONFIG_FILE_NAME: &str = "vidstudio.ron";

/// Default zoom increment for zoom in/out
pub const DEFAULT_ZOOM_STEP: f32 = 0.1;

/// Default number of notifications kept by the log
pub const DEFAULT_NOTIFICATION_CAPACITY: usize = 64;

/// Config errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read or written
    #[error("Config I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File is not valid RON
    #[error("Config parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Settings could not be written as RON
    #[error("Config serialization error: {0}")]
    Serialize(#[from] ron::Error),

    /// File was written by a newer editor
    #[error("Config version {found} is newer than supported version {supported}")]
    VersionTooNew {
        /// Version in the file
        found: u32,
        /// Highest version this build reads
        supported: u32,
    },
}

/// Editor settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Format version
    pub version: u32,
    /// Maximum number of undo entries
    pub history_depth: usize,
    /// Delay before the next sequence entry plays, in milliseconds
    pub advance_delay_ms: u64,
    /// Duration given to new clips, in seconds
    pub default_clip_duration: f64,
    /// Timeline pixels per second at zoom 1.0
    pub pixels_per_second: f64,
    /// Zoom in/out increment
    pub zoom_step: f32,
    /// Width of the timeline viewport in pixels
    pub viewport_width: f32,
    /// How a split picks its clip
    pub split_strategy: SplitStrategy,
    /// Put imported videos on the timeline right away
    pub auto_add_video_imports: bool,
    /// Notifications kept in memory
    pub notification_capacity: usize,
    /// Where saved projects go
    pub project_dir: PathBuf,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_FORMAT_VERSION,
            history_depth: MAX_HISTORY,
            advance_delay_ms: DEFAULT_ADVANCE_DELAY.as_millis() as u64,
            default_clip_duration: DEFAULT_CLIP_DURATION,
            pixels_per_second: PIXELS_PER_SECOND,
            zoom_step: DEFAULT_ZOOM_STEP,
            viewport_width: DEFAULT_VIEWPORT_WIDTH,
            split_strategy: SplitStrategy::default(),
            auto_add_video_imports: true,
            notification_capacity: DEFAULT_NOTIFICATION_CAPACITY,
            project_dir: PathBuf::from("projects"),
        }
    }
}

impl EditorConfig {
    /// Delay before the next sequence entry plays
    pub fn advance_delay(&self) -> Duration {
        Duration::from_millis(self.advance_delay_ms)
    }

    /// Parse settings from a RON string
    pub fn from_ron(content: &str) -> Result<Self, ConfigError> {
        let config: EditorConfig = ron::from_str(content)?;

        // Version check
        if config.version > CONFIG_FORMAT_VERSION {
            return Err(ConfigError::VersionTooNew {
                found: config.version,
                supported: CONFIG_FORMAT_VERSION,
            });
        }

        Ok(config)
    }

    /// Load settings from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_ron(&content)
    }

    /// Load settings, falling back to defaults when the file does not exist
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        let config = Self::load(path)?;
        tracing::info!(path = %path.display(), "Loaded editor config");
        Ok(config)
    }

    /// Render settings as pretty RON
    pub fn to_ron(&self) -> Result<String, ConfigError> {
        let pretty = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);
        Ok(ron::ser::to_string_pretty(self, pretty)?)
    }

    /// Save settings to a file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        std::fs::write(path, self.to_ron()?)?;
        Ok(())
    }

    /// Get the config file path for a directory
    pub fn config_file_path(dir: &Path) -> PathBuf {
        dir.join(CONFIG_FILE_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EditorConfig::default();
        assert_eq!(config.version, CONFIG_FORMAT_VERSION);
        assert_eq!(config.history_depth, 100);
        assert_eq!(config.advance_delay(), Duration::from_millis(100));
        assert_eq!(config.default_clip_duration, 5.0);
        assert_eq!(config.split_strategy, SplitStrategy::DuplicateLast);
        assert!(config.auto_add_video_imports);
    }

    #[test]
    fn test_serialization() {
        let config = EditorConfig {
            history_depth: 12,
            split_strategy: SplitStrategy::AtPlayhead,
            ..Default::default()
        };
        let ron_str = config.to_ron().unwrap();
        let loaded = EditorConfig::from_ron(&ron_str).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let loaded = EditorConfig::from_ron("(history_depth: 7)").unwrap();
        assert_eq!(loaded.history_depth, 7);
        assert_eq!(loaded.zoom_step, DEFAULT_ZOOM_STEP);
    }

    #[test]
    fn test_newer_version_is_rejected() {
        let err = EditorConfig::from_ron("(version: 99)").unwrap_err();
        assert!(matches!(err, ConfigError::VersionTooNew { found: 99, .. }));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = EditorConfig::config_file_path(dir.path());
        assert_eq!(EditorConfig::load_or_default(&path).unwrap(), EditorConfig::default());

        let config = EditorConfig {
            viewport_width: 640.0,
            ..Default::default()
        };
        config.save(&path).unwrap();
        assert_eq!(EditorConfig::load_or_default(&path).unwrap().viewport_width, 640.0);
    }
}
