//! Configuration system

pub use serde::{Deserialize, Serialize};

use crate::engine::EngineConfig;
use std::time::Duration;

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

        // Try different formats
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
            ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
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

/// Pool construction settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Maximum number of simultaneous streams
    pub max_streams: u32,
    /// Priority passed to the engine with each decode submission
    pub load_priority: i32,
    /// Priority passed to the engine with each stream
    pub play_priority: i32,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_streams: 6,
            load_priority: 1,
            play_priority: 1,
        }
    }
}

impl PoolConfig {
    /// Engine settings derived from this configuration
    pub fn engine(&self) -> EngineConfig {
        EngineConfig {
            max_streams: self.max_streams,
        }
    }
}

impl Config for PoolConfig {}

/// Timeline settings for a [`Player`](crate::instrument::Player)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerOptions {
    /// How long each chord sounds before it is stopped, in milliseconds
    pub duration_ms: u64,
    /// Release tail after the chord is stopped, in milliseconds
    pub release_ms: u64,
    /// Playback rate (0.5 to 2.0)
    pub speed: f32,
    /// Playback gain (0.0 to 1.0)
    pub gain: f32,
}

impl Default for PlayerOptions {
    fn default() -> Self {
        Self {
            duration_ms: 3000,
            release_ms: 300,
            speed: 1.0,
            gain: 1.0,
        }
    }
}

impl PlayerOptions {
    /// Chord duration
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    /// Release tail
    pub fn release(&self) -> Duration {
        Duration::from_millis(self.release_ms)
    }
}

impl Config for PlayerOptions {}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn scratch_path(name: &str) -> String {
        std::env::temp_dir()
            .join(format!("sound_pool_cfg_{}_{}", std::process::id(), name))
            .to_string_lossy()
            .into_owned()
    }

    #[test]
    fn test_pool_config_toml_round_trip() {
        let path = scratch_path("pool.toml");
        let config = PoolConfig {
            max_streams: 12,
            ..PoolConfig::default()
        };
        config.save_to_file(&path).unwrap();

        let loaded = PoolConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_partial_ron_uses_defaults() {
        let path = scratch_path("player.ron");
        std::fs::write(&path, "(duration_ms: 1000)").unwrap();

        let options = PlayerOptions::load_from_file(&path).unwrap();
        assert_eq!(options.duration(), Duration::from_millis(1000));
        assert_eq!(options.release(), Duration::from_millis(300));
        assert_relative_eq!(options.speed, 1.0);
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_unsupported_format() {
        let result = PoolConfig::default().save_to_file("pool.json");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }
}
