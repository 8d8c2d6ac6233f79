use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level engine configuration. Every field has a default, so a partial
/// JSON file only overrides what it names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub render: RenderConfig,
    pub player: PlayerConfig,
    pub game_loop: LoopConfig,
    pub window: WindowConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Internal framebuffer width in pixels.
    pub width: usize,
    /// Internal framebuffer height in pixels.
    pub height: usize,
    /// Maximum cells a ray walks.
    pub range: u32,
    /// Distance in cells at which fog is strongest.
    pub light_range: f32,
    /// Split kernel work across the rayon pool.
    pub parallel: bool,
    /// Cross sharpen after upscaling.
    pub sharpen: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            range: 40,
            light_range: 15.0,
            parallel: true,
            sharpen: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// cells/s
    pub move_speed: f32,
    /// rad/s
    pub turn_speed: f32,
    pub jump_speed: f32,
    pub max_z: f32,
    /// Vertical look speed in pixels/s.
    pub pitch_speed: f32,
    /// Pitch is clamped to `[-max_pitch, max_pitch]`.
    pub max_pitch: f32,
    pub pitch_decay: f32,
    pub z_decay: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            move_speed: 3.0,
            turn_speed: std::f32::consts::PI,
            jump_speed: 400.0,
            max_z: 300.0,
            pitch_speed: 400.0,
            max_pitch: 200.0,
            pitch_decay: 50.0,
            z_decay: 100.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    /// Callbacks closer together than this (seconds) are skipped.
    pub min_frame_time: f32,
    /// Longest step (seconds) fed to the simulation; longer gaps are clamped.
    pub max_frame_time: f32,
    /// Frame times kept for the FPS estimate.
    pub fps_window: usize,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            min_frame_time: 0.01,
            max_frame_time: 0.1,
            fps_window: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "gridcaster".to_string(),
            width: 1280,
            height: 960,
        }
    }
}

impl EngineConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.render.width < 2 || self.render.height < 2 {
            return Err(ConfigError::Invalid(format!(
                "render size {}x{} too small",
                self.render.width, self.render.height
            )));
        }
        if self.render.light_range <= 0.0 {
            return Err(ConfigError::Invalid("light_range must be positive".into()));
        }
        if self.game_loop.fps_window == 0 {
            return Err(ConfigError::Invalid("fps_window must be at least 1".into()));
        }
        if self.game_loop.max_frame_time < self.game_loop.min_frame_time {
            return Err(ConfigError::Invalid(
                "max_frame_time must not be below min_frame_time".into(),
            ));
        }
        if self.player.max_pitch < 0.0 || self.player.max_z < 0.0 {
            return Err(ConfigError::Invalid("limits must not be negative".into()));
        }
        if self.player.pitch_decay < 0.0 || self.player.pitch_decay >= self.player.z_decay {
            return Err(ConfigError::Invalid(format!(
                "pitch_decay {} must be non-negative and below z_decay {}",
                self.player.pitch_decay, self.player.z_decay
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = EngineConfig::from_json(r#"{ "render": { "width": 320 } }"#).unwrap();
        assert_eq!(config.render.width, 320);
        assert_eq!(config.render.height, 480);
        assert_eq!(config.player, PlayerConfig::default());
        assert_eq!(config.game_loop.fps_window, 60);
    }

    #[test]
    fn empty_object_is_default() {
        assert_eq!(EngineConfig::from_json("{}").unwrap(), EngineConfig::default());
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(matches!(
            EngineConfig::from_json(r#"{ "game_loop": { "fps_window": 0 } }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            EngineConfig::from_json(r#"{ "render": { "light_range": 0.0 } }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            EngineConfig::from_json(r#"{ "player": { "pitch_decay": 100.0 } }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            EngineConfig::from_json("not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = EngineConfig::load(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
