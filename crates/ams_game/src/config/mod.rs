//! Configuration system
//!
//! [`Config`] gives any serde type TOML/RON file persistence; the engine's own
//! settings live in [`ApplicationConfig`].

mod application;

pub use application::{ApplicationConfig, EngineConfig, TimingConfig, WindowConfig};
pub use serde::{Deserialize, Serialize};

use std::path::Path;

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from a `.toml` or `.ron` file
    fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;

        match ConfigFormat::of(path)? {
            ConfigFormat::Toml => {
                toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
            }
            ConfigFormat::Ron => {
                ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
            }
        }
    }

    /// Save configuration to a `.toml` or `.ron` file
    fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = match ConfigFormat::of(path)? {
            ConfigFormat::Toml => {
                toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
            }
            ConfigFormat::Ron => ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?,
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

enum ConfigFormat {
    Toml,
    Ron,
}

impl ConfigFormat {
    fn of(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(Self::Toml),
            Some("ron") => Ok(Self::Ron),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Values rejected by validation
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
