//! Engine Configuration
//!
//! Read once at startup from a RON file. Every field has a default, so a
//! config file only needs the values it changes:
//!
//! ```ron
//! (
//!     window: (title: "My Game", width: 1280, height: 720),
//!     scene: (max_entities: 10000),
//!     log_filter: "lumen2d=debug",
//! )
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ecs::{MAX_COMPONENT_TYPES, MAX_ENTITIES};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config: {0}")]
    Parse(#[from] ron::error::SpannedError),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: i32,
    pub height: i32,
    pub resizable: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "lumen2d".to_string(),
            width: 1280,
            height: 720,
            resizable: true,
        }
    }
}

/// Storage limits and built-in scene behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub max_entities: usize,
    /// Includes the scene's built-in component types
    pub max_component_types: usize,
    /// Escape stops the frame loop
    pub close_on_escape: bool,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            max_entities: MAX_ENTITIES,
            max_component_types: 32,
            close_on_escape: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub window: WindowConfig,
    pub scene: SceneConfig,
    /// `tracing` filter directive, overridden by `RUST_LOG`
    pub log_filter: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            scene: SceneConfig::default(),
            log_filter: "info".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = ron::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ron_str(&text)
    }

    /// Defaults when the file does not exist; errors if it exists but is bad.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let scene = &self.scene;
        if scene.max_entities == 0 {
            return Err(ConfigError::Invalid("scene.max_entities must be at least 1".into()));
        }
        if scene.max_component_types == 0 || scene.max_component_types > MAX_COMPONENT_TYPES {
            return Err(ConfigError::Invalid(format!(
                "scene.max_component_types must be in 1..={}",
                MAX_COMPONENT_TYPES
            )));
        }
        if self.window.width <= 0 || self.window.height <= 0 {
            return Err(ConfigError::Invalid("window size must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_file_uses_defaults() {
        let config = EngineConfig::from_ron_str("(scene: (max_entities: 128))").unwrap();
        assert_eq!(config.scene.max_entities, 128);
        assert_eq!(config.scene.max_component_types, 32);
        assert!(config.scene.close_on_escape);
        assert_eq!(config.window, WindowConfig::default());
    }

    #[test]
    fn test_rejects_bad_limits() {
        assert!(matches!(
            EngineConfig::from_ron_str("(scene: (max_component_types: 65))"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            EngineConfig::from_ron_str("(scene: (max_entities: 0))"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_rejects_malformed_ron() {
        assert!(matches!(
            EngineConfig::from_ron_str("(scene: "),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "(window: (title: \"demo\"), log_filter: \"debug\")").unwrap();

        let config = EngineConfig::load(file.path()).unwrap();
        assert_eq!(config.window.title, "demo");
        assert_eq!(config.log_filter, "debug");
    }

    #[test]
    fn test_missing_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig::load_or_default(dir.path().join("absent.ron")).unwrap();
        assert_eq!(config, EngineConfig::default());
        assert!(matches!(
            EngineConfig::load(dir.path().join("absent.ron")),
            Err(ConfigError::Io { .. })
        ));
    }
}
