//! Core engine settings

pub mod config;

pub use config::{ApplicationConfig, EngineConfig, SceneConfig};
