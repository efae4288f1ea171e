use super::{Config, ConfigError};
use serde::{Deserialize, Serialize};

/// # Application Configuration
///
/// Top-level settings consumed by [`Application::new`](crate::Application::new).
///
/// ```
/// use ams_game::config::ApplicationConfig;
///
/// let config = ApplicationConfig::new("Asteroids")
///     .with_fixed_frame_rate(120.0)
///     .headless();
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    /// Application name, also used to name the default scene
    pub name: String,
    /// Engine-wide settings
    pub engine: EngineConfig,
    /// Game loop cadence
    pub timing: TimingConfig,
    /// Main window
    pub window: WindowConfig,
}

impl ApplicationConfig {
    /// Create a configuration with the given application name
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            window: WindowConfig {
                title: name.clone(),
                ..WindowConfig::default()
            },
            name,
            ..Self::default()
        }
    }

    /// Set the render frame rate
    #[must_use]
    pub fn with_target_frame_rate(mut self, fps: f32) -> Self {
        self.timing.target_frame_rate = fps;
        self
    }

    /// Set the fixed (simulation) frame rate
    #[must_use]
    pub fn with_fixed_frame_rate(mut self, fps: f32) -> Self {
        self.timing.fixed_frame_rate = fps;
        self
    }

    /// Cap the frame rate; 0 leaves it uncapped
    #[must_use]
    pub fn with_vsync_frame_rate(mut self, fps: f32) -> Self {
        self.timing.vsync_frame_rate = fps;
        self
    }

    /// Set the window size
    #[must_use]
    pub fn with_window_size(mut self, width: u32, height: u32) -> Self {
        self.window.width = width;
        self.window.height = height;
        self
    }

    /// Run without a native window
    #[must_use]
    pub fn headless(mut self) -> Self {
        self.window.headless = true;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::Invalid("application name is empty".to_string()));
        }
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "window size {}x{} has a zero dimension",
                self.window.width, self.window.height
            )));
        }
        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: "Application".to_string(),
            engine: EngineConfig::default(),
            timing: TimingConfig::default(),
            window: WindowConfig::default(),
        }
    }
}

impl Config for ApplicationConfig {}

/// Engine behaviour settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Default log level ("error", "warn", "info", "debug", "trace")
    pub log_level: String,
    /// Extra diagnostics
    pub debug_mode: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            debug_mode: cfg!(debug_assertions),
        }
    }
}

/// Game loop cadence, in frames per second
///
/// Rates are clamped when applied: target and fixed rates to at least 1,
/// the vsync cap to at least 0 (uncapped).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Render frame rate
    pub target_frame_rate: f32,
    /// Simulation frame rate
    pub fixed_frame_rate: f32,
    /// Frame-rate cap, 0 = uncapped
    pub vsync_frame_rate: f32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            target_frame_rate: 60.0,
            fixed_frame_rate: 60.0,
            vsync_frame_rate: 0.0,
        }
    }
}

/// Main window settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Window title
    pub title: String,
    /// Width in screen coordinates
    pub width: u32,
    /// Height in screen coordinates
    pub height: u32,
    /// Whether the user may resize the window
    pub resizable: bool,
    /// Fullscreen on the primary monitor
    pub fullscreen: bool,
    /// Skip the native window entirely
    pub headless: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Application".to_string(),
            width: 800,
            height: 600,
            resizable: true,
            fullscreen: false,
            headless: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ApplicationConfig::default();
        assert_eq!(config.name, "Application");
        assert_eq!(config.timing.target_frame_rate, 60.0);
        assert_eq!(config.timing.fixed_frame_rate, 60.0);
        assert_eq!(config.timing.vsync_frame_rate, 0.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_empty_name_and_zero_size() {
        let mut config = ApplicationConfig::new("  ");
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config = ApplicationConfig::new("Game").with_window_size(0, 600);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_toml_and_ron_files() {
        let dir = tempfile::tempdir().unwrap();
        let config = ApplicationConfig::new("Roundtrip")
            .with_fixed_frame_rate(30.0)
            .headless();

        let toml_path = dir.path().join("app.toml");
        config.save_to_file(&toml_path).unwrap();
        assert_eq!(ApplicationConfig::load_from_file(&toml_path).unwrap(), config);

        let ron_path = dir.path().join("app.ron");
        config.save_to_file(&ron_path).unwrap();
        assert_eq!(ApplicationConfig::load_from_file(&ron_path).unwrap(), config);
    }

    #[test]
    fn test_unsupported_extension() {
        let result = ApplicationConfig::default().save_to_file("settings.json");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.toml");
        std::fs::write(&path, "name = \"Partial\"\n[timing]\nfixed_frame_rate = 50.0\n").unwrap();

        let config = ApplicationConfig::load_from_file(&path).unwrap();
        assert_eq!(config.name, "Partial");
        assert_eq!(config.timing.fixed_frame_rate, 50.0);
        assert_eq!(config.timing.target_frame_rate, 60.0);
        assert_eq!(config.window.width, 800);
    }
}
