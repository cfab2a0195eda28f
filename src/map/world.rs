//! Per-map world context
//!
//! `Mode7Map` is the owner of the camera for one map: scripts mutate
//! camera parameters through it, scroll handlers move the display window
//! through it, and the sprite/tile layers query transforms through it.
//! When the map's metadata does not enable Mode 7 every query falls back
//! to flat identity behavior, so callers never branch.

use super::{EngineConfig, Mode7Overrides};
use crate::camera::{CameraState, GroundPlane, Screen};
use crate::math::Vector3;
use crate::projection::{self, Direction};
use crate::render;
use log::info;
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MapError {
    #[error("map has no tiles ({cols}x{rows})")]
    EmptyMap { cols: u32, rows: u32 },
    #[error("invalid tile size {width}x{height}")]
    InvalidTileSize { width: f32, height: f32 },
}

/// Static map data the engine needs, read once per map load.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapProfile {
    pub cols: u32,
    pub rows: u32,
    pub tile_width: f32,
    pub tile_height: f32,
    pub loop_horizontal: bool,
    pub loop_vertical: bool,
    /// Parallax scrolls with the map 1:1 instead of at half speed.
    pub parallax_zero: bool,
    pub parallax_loop_x: bool,
    pub parallax_loop_y: bool,
    pub mode7: Mode7Overrides,
}

impl Default for MapProfile {
    fn default() -> Self {
        Self {
            cols: 0,
            rows: 0,
            tile_width: 48.0,
            tile_height: 48.0,
            loop_horizontal: false,
            loop_vertical: false,
            parallax_zero: false,
            parallax_loop_x: false,
            parallax_loop_y: false,
            mode7: Mode7Overrides::default(),
        }
    }
}

impl MapProfile {
    fn ground_plane(&self) -> GroundPlane {
        GroundPlane {
            cols: self.cols,
            rows: self.rows,
            tile_width: self.tile_width,
            tile_height: self.tile_height,
            loop_horizontal: self.loop_horizontal,
            loop_vertical: self.loop_vertical,
        }
    }
}

/// One map's worth of projection state.
pub struct Mode7Map {
    profile: MapProfile,
    config: EngineConfig,
    screen: Screen,
    camera: Option<CameraState>,
    display_x: f32,
    display_y: f32,
    parallax_x: f32,
    parallax_y: f32,
}

impl Mode7Map {
    /// Build the context for a freshly loaded map. Fails when the base
    /// map data cannot support a view at all.
    pub fn new(
        profile: MapProfile,
        mut config: EngineConfig,
        screen: Screen,
    ) -> Result<Self, MapError> {
        if profile.cols == 0 || profile.rows == 0 {
            return Err(MapError::EmptyMap {
                cols: profile.cols,
                rows: profile.rows,
            });
        }
        if profile.tile_width <= 0.0 || profile.tile_height <= 0.0 {
            return Err(MapError::InvalidTileSize {
                width: profile.tile_width,
                height: profile.tile_height,
            });
        }
        config.sanitize();
        let camera = if profile.mode7.is_active() {
            let params = profile.mode7.resolved(&config);
            info!(
                "Mode 7 enabled: fov {} pitch {} yaw {} distance {}",
                params.fov, params.pitch, params.yaw, params.camera_distance
            );
            Some(CameraState::new(
                screen,
                profile.ground_plane(),
                params,
                config.far_clip_z,
                config.base_scale_z,
            ))
        } else {
            None
        };
        Ok(Self {
            profile,
            config,
            screen,
            camera,
            display_x: 0.0,
            display_y: 0.0,
            parallax_x: 0.0,
            parallax_y: 0.0,
        })
    }

    pub fn is_mode7(&self) -> bool {
        self.camera.is_some()
    }

    pub fn profile(&self) -> &MapProfile {
        &self.profile
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn camera(&self) -> Option<&CameraState> {
        self.camera.as_ref()
    }

    pub fn camera_mut(&mut self) -> Option<&mut CameraState> {
        self.camera.as_mut()
    }

    // ---- runtime control API -------------------------------------------

    pub fn fov(&self) -> f32 {
        self.camera
            .as_ref()
            .map_or(self.config.default_fov, |c| c.fov())
    }

    pub fn pitch(&self) -> f32 {
        self.camera
            .as_ref()
            .map_or(self.config.default_pitch, |c| c.pitch())
    }

    pub fn yaw(&self) -> f32 {
        self.camera
            .as_ref()
            .map_or(self.config.default_yaw, |c| c.yaw())
    }

    pub fn camera_distance(&self) -> f32 {
        self.camera
            .as_ref()
            .map_or(self.config.default_camera_distance, |c| c.camera_distance())
    }

    pub fn parallax_distance(&self) -> f32 {
        self.camera
            .as_ref()
            .map_or(self.config.default_parallax_distance, |c| {
                c.parallax_distance()
            })
    }

    pub fn set_fov(&mut self, value: f32) {
        if let Some(camera) = &mut self.camera {
            camera.set_fov(value);
        }
    }

    pub fn set_pitch(&mut self, value: f32) {
        if let Some(camera) = &mut self.camera {
            camera.set_pitch(value);
        }
    }

    pub fn set_yaw(&mut self, value: f32) {
        if let Some(camera) = &mut self.camera {
            camera.set_yaw(value);
        }
    }

    pub fn set_camera_distance(&mut self, value: f32) {
        if let Some(camera) = &mut self.camera {
            camera.set_camera_distance(value);
        }
    }

    pub fn set_parallax_distance(&mut self, value: f32) {
        if let Some(camera) = &mut self.camera {
            camera.set_parallax_distance(value);
        }
    }

    pub fn animate_fov(&mut self, target: f32, frames: u32) {
        if let Some(camera) = &mut self.camera {
            camera.animate_fov(target, frames);
        }
    }

    pub fn animate_pitch(&mut self, target: f32, frames: u32) {
        if let Some(camera) = &mut self.camera {
            camera.animate_pitch(target, frames);
        }
    }

    pub fn animate_yaw(&mut self, target: f32, frames: u32) {
        if let Some(camera) = &mut self.camera {
            camera.animate_yaw(target, frames);
        }
    }

    pub fn animate_camera_distance(&mut self, target: f32, frames: u32) {
        if let Some(camera) = &mut self.camera {
            camera.animate_camera_distance(target, frames);
        }
    }

    /// Horizontal screen-shake offset from the screen-effects collaborator.
    pub fn set_shake(&mut self, offset: f32) {
        if let Some(camera) = &mut self.camera {
            camera.set_shake(offset);
        }
    }

    /// One simulation tick. Returns true when a parameter animation moved
    /// and the matrices were rebuilt.
    pub fn update(&mut self) -> bool {
        match &mut self.camera {
            Some(camera) => camera.update(),
            None => false,
        }
    }

    /// See [`CameraState::take_retile_request`].
    pub fn take_retile_request(&mut self) -> bool {
        self.camera
            .as_mut()
            .map_or(false, |c| c.take_retile_request())
    }

    // ---- scrolling ------------------------------------------------------

    pub fn display_x(&self) -> f32 {
        self.display_x
    }

    pub fn display_y(&self) -> f32 {
        self.display_y
    }

    /// Jump the display window, in tiles. Looping axes wrap.
    pub fn set_display_pos(&mut self, x: f32, y: f32) {
        if self.profile.loop_horizontal {
            self.display_x = x.rem_euclid(self.profile.cols as f32);
            self.parallax_x = x;
        } else {
            self.display_x = x;
            self.parallax_x = x;
        }
        if self.profile.loop_vertical {
            self.display_y = y.rem_euclid(self.profile.rows as f32);
            self.parallax_y = y;
        } else {
            self.display_y = y;
            self.parallax_y = y;
        }
        self.push_display();
    }

    pub fn scroll_right(&mut self, distance: f32) {
        if self.profile.loop_horizontal {
            self.display_x = (self.display_x + distance).rem_euclid(self.profile.cols as f32);
            if self.profile.parallax_loop_x {
                self.parallax_x += distance;
            }
        } else {
            self.display_x += distance;
            self.parallax_x += distance;
        }
        self.push_display();
    }

    pub fn scroll_left(&mut self, distance: f32) {
        if self.profile.loop_horizontal {
            self.display_x = (self.display_x - distance).rem_euclid(self.profile.cols as f32);
            if self.profile.parallax_loop_x {
                self.parallax_x -= distance;
            }
        } else {
            self.display_x -= distance;
            self.parallax_x -= distance;
        }
        self.push_display();
    }

    pub fn scroll_down(&mut self, distance: f32) {
        if self.profile.loop_vertical {
            self.display_y = (self.display_y + distance).rem_euclid(self.profile.rows as f32);
            if self.profile.parallax_loop_y {
                self.parallax_y += distance;
            }
        } else {
            self.display_y += distance;
            self.parallax_y += distance;
        }
        self.push_display();
    }

    pub fn scroll_up(&mut self, distance: f32) {
        if self.profile.loop_vertical {
            self.display_y = (self.display_y - distance).rem_euclid(self.profile.rows as f32);
            if self.profile.parallax_loop_y {
                self.parallax_y -= distance;
            }
        } else {
            self.display_y -= distance;
            self.parallax_y -= distance;
        }
        self.push_display();
    }

    fn push_display(&mut self) {
        if let Some(camera) = &mut self.camera {
            camera.set_display_pos(self.display_x, self.display_y);
        }
    }

    /// Entity X in tiles relative to the display window, recentered
    /// across the wrap seam on looping maps.
    pub fn adjust_x(&self, x: f32) -> f32 {
        let cols = self.profile.cols as f32;
        let center = cols / 2.0;
        let display_center = center - self.screen_tile_x() / 2.0;
        if x >= center {
            if self.display_x < display_center {
                return x - self.display_x - cols;
            }
        } else if self.display_x >= display_center {
            return x - self.display_x + cols;
        }
        x - self.display_x
    }

    /// Vertical counterpart of [`Mode7Map::adjust_x`].
    pub fn adjust_y(&self, y: f32) -> f32 {
        let rows = self.profile.rows as f32;
        let center = rows / 2.0;
        let display_center = center - self.screen_tile_y() / 2.0;
        if y >= center {
            if self.display_y < display_center {
                return y - self.display_y - rows;
            }
        } else if self.display_y >= display_center {
            return y - self.display_y + rows;
        }
        y - self.display_y
    }

    fn screen_tile_x(&self) -> f32 {
        self.screen.width / self.profile.tile_width
    }

    fn screen_tile_y(&self) -> f32 {
        self.screen.height / self.profile.tile_height
    }

    // ---- parallax -------------------------------------------------------

    /// Parallax X origin: scroll position scaled by the configured
    /// multiplier plus a yaw-coupled drift at the parallax distance.
    pub fn parallax_ox(&self) -> f32 {
        let Some(camera) = &self.camera else {
            return 0.0;
        };
        let offset = -2.0 * camera.parallax_distance() * PI * camera.yaw() / 360.0;
        if self.profile.parallax_zero {
            self.parallax_x * self.config.parallax_scroll_x_multiplier * self.profile.tile_width
                + offset
        } else if self.profile.parallax_loop_x {
            self.parallax_x * self.config.parallax_scroll_x_multiplier * self.profile.tile_width
                / 2.0
                + offset
        } else {
            offset
        }
    }

    /// Parallax Y origin, pitch-coupled.
    pub fn parallax_oy(&self) -> f32 {
        let Some(camera) = &self.camera else {
            return 0.0;
        };
        let offset = -2.0 * camera.parallax_distance() * PI * camera.pitch() / 360.0;
        if self.profile.parallax_zero {
            self.parallax_y * self.config.parallax_scroll_y_multiplier * self.profile.tile_height
                + offset
        } else if self.profile.parallax_loop_y {
            self.parallax_y * self.config.parallax_scroll_y_multiplier * self.profile.tile_height
                / 2.0
                + offset
        } else {
            offset
        }
    }

    // ---- tilemap margins ------------------------------------------------

    /// Extra horizontal margin (pixels) the tilemap must paint so that
    /// wrap-around tiles stay covered under rotation.
    pub fn loop_margin_x(&self) -> f32 {
        match &self.camera {
            Some(camera) if self.profile.loop_horizontal => {
                (camera.loop_extend_x() + self.config.loop_extend_tiles) as f32
                    * self.profile.tile_width
                    - self.screen.half_width()
            }
            _ => 0.0,
        }
    }

    pub fn loop_margin_y(&self) -> f32 {
        match &self.camera {
            Some(camera) if self.profile.loop_vertical => {
                (camera.loop_extend_y() + self.config.loop_extend_tiles) as f32
                    * self.profile.tile_height
                    - self.screen.half_height()
            }
            _ => 0.0,
        }
    }

    // ---- transform façade -----------------------------------------------

    /// Screen position of a map point; identity (z = 0) on flat maps.
    pub fn map_to_screen(&self, x: f32, y: f32) -> Vector3 {
        match &self.camera {
            Some(camera) => projection::map_to_screen(camera, x, y),
            None => Vector3::new(x, y, 0.0),
        }
    }

    /// Map position under a screen pixel; identity on flat maps.
    pub fn screen_to_map(&self, x: f32, y: f32) -> Vector3 {
        match &self.camera {
            Some(camera) => projection::screen_to_map(camera, x, y),
            None => Vector3::new(x, y, 0.0),
        }
    }

    /// Tile under a screen pixel.
    pub fn screen_to_tile(&self, x: f32, y: f32) -> (i32, i32) {
        match &self.camera {
            Some(camera) => projection::screen_to_tile(camera, x, y),
            None => (
                (x / self.profile.tile_width).floor() as i32,
                (y / self.profile.tile_height).floor() as i32,
            ),
        }
    }

    /// Perspective sprite scale; 1.0 on flat maps.
    pub fn map_to_screen_scale(&self, x: f32, y: f32) -> f32 {
        match &self.camera {
            Some(camera) => projection::map_to_screen_scale(camera, x, y),
            None => 1.0,
        }
    }

    /// Depth culling; everything is visible on flat maps.
    pub fn is_visible(&self, z: f32) -> bool {
        match &self.camera {
            Some(camera) => render::is_visible(camera, z),
            None => true,
        }
    }

    /// Facing a character sprite should display with under the current yaw.
    pub fn rotate_sprite_direction(&self, direction: Direction) -> Direction {
        match &self.camera {
            Some(camera) if self.config.adjust_sprite_direction => {
                projection::rotate_direction(camera, direction, true)
            }
            _ => direction,
        }
    }

    /// Map-space direction for a raw input direction under the current yaw.
    pub fn rotate_input_direction(&self, direction: Direction) -> Direction {
        match &self.camera {
            Some(camera) if self.config.adjust_move_direction => {
                projection::rotate_direction(camera, direction, false)
            }
            _ => direction,
        }
    }
}
