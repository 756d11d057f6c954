//! # Application Configuration
//!
//! Engine and scene settings for an application, loadable from TOML or RON
//! through [`Config`].
//!
//! ## Categories
//!
//! - **Engine Config**: logging, debug features, frame pacing
//! - **Scene Config**: object limits and per-frame dispatch behaviour

use serde::{Deserialize, Serialize};

pub use crate::config::{Config, ConfigError};

/// # Engine Configuration
///
/// Core engine behavior configuration including logging and debug features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Default log filter, e.g. `"info"` or `"scene_engine=debug"`
    pub log_level: String,
    /// Whether to enable debug features such as the attribute console
    pub debug_mode: bool,
    /// Target FPS for frame rate limiting
    pub target_fps: Option<u32>,
}

impl EngineConfig {
    /// Create a new engine configuration
    pub fn new() -> Self {
        Self {
            log_level: "info".to_string(),
            debug_mode: cfg!(debug_assertions),
            target_fps: None,
        }
    }

    /// Set log level
    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Enable debug mode
    #[must_use]
    pub const fn with_debug(mut self, enabled: bool) -> Self {
        self.debug_mode = enabled;
        self
    }

    /// Set target FPS
    #[must_use]
    pub const fn with_target_fps(mut self, fps: u32) -> Self {
        self.target_fps = Some(fps);
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Scene Configuration
///
/// Limits and dispatch behaviour of the scene manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Maximum number of registered objects; `None` is unbounded
    pub max_objects: Option<usize>,
    /// Advance the frame clock by this many seconds per frame instead of wall time
    pub fixed_delta: Option<f32>,
    /// Log per-frame statistics at debug level
    pub log_frame_stats: bool,
}

impl SceneConfig {
    /// Create a scene configuration with no limits and wall-clock timing
    pub const fn new() -> Self {
        Self {
            max_objects: None,
            fixed_delta: None,
            log_frame_stats: false,
        }
    }

    /// Cap the number of registered objects
    #[must_use]
    pub const fn with_max_objects(mut self, max: usize) -> Self {
        self.max_objects = Some(max);
        self
    }

    /// Step the clock by a fixed delta, for deterministic headless runs
    #[must_use]
    pub const fn with_fixed_delta(mut self, seconds: f32) -> Self {
        self.fixed_delta = Some(seconds);
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_objects == Some(0) {
            return Err(ConfigError::Invalid("max_objects must be at least 1".to_string()));
        }
        if let Some(delta) = self.fixed_delta {
            if !(delta.is_finite() && delta > 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "fixed_delta must be a positive number of seconds, got {delta}"
                )));
            }
        }
        Ok(())
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Complete Application Configuration
///
/// Top-level configuration applications load at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    /// Application name, used in log output
    pub name: String,
    /// Frames to run before exiting in headless mode; `0` runs until quit
    pub frames: u32,
    /// Engine core configuration
    pub engine: EngineConfig,
    /// Scene manager configuration
    pub scene: SceneConfig,
}

impl ApplicationConfig {
    /// Create a new application configuration with defaults
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            frames: 0,
            engine: EngineConfig::default(),
            scene: SceneConfig::default(),
        }
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::Invalid("application name cannot be empty".to_string()));
        }
        if self.engine.target_fps == Some(0) {
            return Err(ConfigError::Invalid("target_fps must be at least 1".to_string()));
        }
        self.scene.validate()
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self::new("Scene Engine Application")
    }
}

impl Config for ApplicationConfig {}
