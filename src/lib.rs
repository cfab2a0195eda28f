//! Mode 7 tile-plane projection engine
//!
//! Simulates the SNES "Mode 7" rendering mode by projecting a flat tile
//! grid and sprite positions through a real 3D camera:
//! - perspective or orthogonal projection (FOV of 0 selects orthogonal)
//! - yaw/pitch rotation and camera distance, animatable per frame
//! - screen-to-map picking via ground-plane raycasting
//! - tile batching under a hard per-draw-call vertex ceiling
//! - loop-extension math for wrap-around maps
//!
//! The crate owns the math and the geometry data; windowing, shader
//! compilation and buffer upload belong to the host renderer, which
//! consumes [`RenderCommand`] and the per-pass vertex arrays.

/// Version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod camera;
pub mod map;
pub mod math;
pub mod projection;
pub mod render;

pub use camera::{AnimationJob, CameraParams, CameraState, GroundPlane, Screen, NEAR_CLIP_Z};
pub use map::{ConfigError, EngineConfig, MapError, MapProfile, Mode7Map, Mode7Overrides};
pub use math::{Matrix4, Vector3};
pub use projection::{
    map_to_screen, map_to_screen_scale, map_z_to_screen_scale, rotate_direction, screen_to_map,
    screen_to_tile, Direction,
};
pub use render::{
    fade_factor, is_visible, screen_position, screen_scale, sprite_visible, BatchPass, FadeBand,
    Projectable, RenderCommand, TileBatcher, TileRect, MAX_PASS_VERTICES,
};
