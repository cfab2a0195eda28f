//! Engine configuration
//!
//! Uses RON (Rusty Object Notation) for human-readable config files.
//! Every field has a documented default; missing fields take it, and
//! non-finite numbers are coerced back to it rather than rejected, so a
//! half-written config still boots.

use crate::camera::{CameraParams, MAX_PITCH, MIN_CAMERA_DISTANCE, MIN_FOV, MIN_PARALLAX_DISTANCE,
    MIN_PITCH, NEAR_CLIP_Z};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("serialize error: {0}")]
    Serialize(#[from] ron::Error),
}

/// Global projection tuning, shared by every map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum Z coordinate for tile and sprite visibility.
    pub far_clip_z: f32,
    /// Z coordinate where the white horizon fade starts.
    pub fade_z_begin: f32,
    /// Z coordinate where the white horizon fade saturates.
    pub fade_z_end: f32,
    /// Z coordinate at which sprite scale is exactly 1.0.
    pub base_scale_z: f32,
    pub parallax_scroll_x_multiplier: f32,
    pub parallax_scroll_y_multiplier: f32,
    /// Nearest-neighbour sampling for the tilemap texture.
    pub tilemap_pixelated: bool,
    /// Nearest-neighbour sampling for character sprites.
    pub characters_pixelated: bool,
    /// Turn character sprites with the camera yaw.
    pub adjust_sprite_direction: bool,
    /// Turn player input with the camera yaw.
    pub adjust_move_direction: bool,
    /// Additional tiles rendered on looping maps, on top of the computed
    /// loop extension.
    pub loop_extend_tiles: u32,
    pub default_fov: f32,
    pub default_pitch: f32,
    pub default_yaw: f32,
    pub default_camera_distance: f32,
    pub default_parallax_distance: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            far_clip_z: 1200.0,
            fade_z_begin: 500.0,
            fade_z_end: 1150.0,
            base_scale_z: 450.0,
            parallax_scroll_x_multiplier: 0.5,
            parallax_scroll_y_multiplier: 1.0,
            tilemap_pixelated: true,
            characters_pixelated: true,
            adjust_sprite_direction: true,
            adjust_move_direction: true,
            loop_extend_tiles: 3,
            default_fov: 60.0,
            default_pitch: 45.0,
            default_yaw: 0.0,
            default_camera_distance: 450.0,
            default_parallax_distance: 550.0,
        }
    }
}

impl EngineConfig {
    /// Load a config from a RON file, sanitized.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::load_from_str(&contents)
    }

    /// Load a config from a RON string, sanitized.
    pub fn load_from_str(s: &str) -> Result<Self, ConfigError> {
        let mut config: EngineConfig = ron::from_str(s)?;
        config.sanitize();
        Ok(config)
    }

    /// Save a config to a RON file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let pretty = ron::ser::PrettyConfig::new().indentor("  ".to_string());
        let contents = ron::ser::to_string_pretty(self, pretty)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Coerce out-of-range and non-finite values back to safe ones.
    pub fn sanitize(&mut self) {
        let defaults = EngineConfig::default();
        coerce(&mut self.far_clip_z, defaults.far_clip_z);
        coerce(&mut self.fade_z_begin, defaults.fade_z_begin);
        coerce(&mut self.fade_z_end, defaults.fade_z_end);
        coerce(&mut self.base_scale_z, defaults.base_scale_z);
        coerce(
            &mut self.parallax_scroll_x_multiplier,
            defaults.parallax_scroll_x_multiplier,
        );
        coerce(
            &mut self.parallax_scroll_y_multiplier,
            defaults.parallax_scroll_y_multiplier,
        );
        coerce(&mut self.default_fov, defaults.default_fov);
        coerce(&mut self.default_pitch, defaults.default_pitch);
        coerce(&mut self.default_yaw, defaults.default_yaw);
        coerce(&mut self.default_camera_distance, defaults.default_camera_distance);
        coerce(
            &mut self.default_parallax_distance,
            defaults.default_parallax_distance,
        );
        self.far_clip_z = self.far_clip_z.max(NEAR_CLIP_Z + 1.0);
        self.default_fov = self.default_fov.max(MIN_FOV);
        self.default_pitch = self.default_pitch.clamp(MIN_PITCH, MAX_PITCH);
        self.default_camera_distance = self.default_camera_distance.max(MIN_CAMERA_DISTANCE);
        self.default_parallax_distance = self.default_parallax_distance.max(MIN_PARALLAX_DISTANCE);
    }
}

fn coerce(value: &mut f32, default: f32) {
    if !value.is_finite() {
        *value = default;
    }
}

/// Per-map camera overrides, read from map metadata. Setting any field
/// (or the bare `enabled` marker) turns Mode 7 on for that map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Mode7Overrides {
    pub enabled: bool,
    pub fov: Option<f32>,
    pub pitch: Option<f32>,
    pub yaw: Option<f32>,
    pub camera_distance: Option<f32>,
    pub parallax_distance: Option<f32>,
}

impl Mode7Overrides {
    pub fn is_active(&self) -> bool {
        self.enabled
            || self.fov.is_some()
            || self.pitch.is_some()
            || self.yaw.is_some()
            || self.camera_distance.is_some()
            || self.parallax_distance.is_some()
    }

    /// Overrides merged over the configured defaults. Non-finite values
    /// count as absent.
    pub fn resolved(&self, config: &EngineConfig) -> CameraParams {
        CameraParams {
            fov: numeric(self.fov, config.default_fov),
            pitch: numeric(self.pitch, config.default_pitch),
            yaw: numeric(self.yaw, config.default_yaw),
            camera_distance: numeric(self.camera_distance, config.default_camera_distance),
            parallax_distance: numeric(self.parallax_distance, config.default_parallax_distance),
        }
    }
}

fn numeric(value: Option<f32>, default: f32) -> f32 {
    match value {
        Some(v) if v.is_finite() => v,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = EngineConfig::load_from_str("()").unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_partial_config_keeps_other_defaults() {
        let config = EngineConfig::load_from_str("(far_clip_z: 900.0, default_fov: 45.0)").unwrap();
        assert_eq!(config.far_clip_z, 900.0);
        assert_eq!(config.default_fov, 45.0);
        assert_eq!(config.fade_z_begin, 500.0);
    }

    #[test]
    fn test_sanitize_coerces_bad_values() {
        let mut config = EngineConfig {
            far_clip_z: f32::NAN,
            default_pitch: 200.0,
            default_parallax_distance: 0.0,
            ..EngineConfig::default()
        };
        config.sanitize();
        assert_eq!(config.far_clip_z, 1200.0);
        assert_eq!(config.default_pitch, 90.0);
        assert_eq!(config.default_parallax_distance, 1.0);
    }

    #[test]
    fn test_far_clip_never_below_near_plane() {
        let config = EngineConfig::load_from_str("(far_clip_z: 2.0)").unwrap();
        assert_eq!(config.far_clip_z, NEAR_CLIP_Z + 1.0);
    }

    #[test]
    fn test_overrides_activation() {
        let mut overrides = Mode7Overrides::default();
        assert!(!overrides.is_active());
        overrides.pitch = Some(30.0);
        assert!(overrides.is_active());
        let marker_only = Mode7Overrides { enabled: true, ..Default::default() };
        assert!(marker_only.is_active());
    }

    #[test]
    fn test_overrides_resolution() {
        let config = EngineConfig::default();
        let overrides = Mode7Overrides {
            enabled: true,
            fov: Some(50.0),
            pitch: Some(f32::INFINITY),
            ..Default::default()
        };
        let params = overrides.resolved(&config);
        assert_eq!(params.fov, 50.0);
        assert_eq!(params.pitch, 45.0); // non-finite override falls back
        assert_eq!(params.camera_distance, 450.0);
    }

    #[test]
    fn test_config_round_trips_through_ron() {
        let config = EngineConfig {
            default_yaw: 22.5,
            loop_extend_tiles: 5,
            ..EngineConfig::default()
        };
        let text = ron::to_string(&config).unwrap();
        let parsed = EngineConfig::load_from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }
}
