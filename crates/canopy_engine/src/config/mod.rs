//! Configuration system
//!
//! File-backed engine configuration. Formats are selected by extension:
//! `.toml` and `.ron` are supported.

pub use serde::{Deserialize, Serialize};

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, Default::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
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
}

/// Top-level engine configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EngineConfig {
    /// Physics simulation settings
    pub physics: PhysicsConfig,

    /// GUI settings
    pub gui: GuiConfig,
}

impl Config for EngineConfig {}

/// Physics simulation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhysicsConfig {
    /// World gravity vector (meters per second squared)
    pub gravity: [f32; 3],

    /// Largest timestep the integrator will accept per update, in seconds.
    /// Longer frames are clamped to this value.
    pub max_timestep: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: [0.0, -9.81, 0.0],
            max_timestep: 1.0 / 30.0,
        }
    }
}

/// GUI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuiConfig {
    /// Reference screen width in pixels for widget coordinates
    pub reference_width: f32,

    /// Reference screen height in pixels for widget coordinates
    pub reference_height: f32,
}

impl Default for GuiConfig {
    fn default() -> Self {
        Self {
            reference_width: 1920.0,
            reference_height: 1080.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.physics.gravity[1], -9.81);
        assert!(config.physics.max_timestep > 0.0);
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = EngineConfig::default();
        config.physics.gravity = [0.0, -3.71, 0.0];
        config.physics.max_timestep = 1.0 / 50.0;

        let path = std::env::temp_dir().join("canopy_engine_config_test.toml");
        let path = path.to_str().unwrap().to_string();

        config.save_to_file(&path).unwrap();
        let loaded = EngineConfig::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.physics.gravity, [0.0, -3.71, 0.0]);
        assert_eq!(loaded.physics.max_timestep, config.physics.max_timestep);
    }

    #[test]
    fn test_unsupported_format() {
        let config = EngineConfig::default();
        let result = config.save_to_file("config.yaml");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }
}
