//! Draw submission contract
//!
//! Everything the shading stage needs for one tilemap draw, as plain
//! values: no shader handles, no uniform dictionaries. The expected
//! fragment behavior is to blend the sampled color toward white by the
//! fade factor and discard fragments with alpha below 0.01; the vertex
//! stage applies modelview then projection and computes the fade from the
//! post-transform depth exactly like [`fade_factor`].

use crate::camera::CameraState;
use serde::{Deserialize, Serialize};

/// Depth band over which tiles fade to the horizon color.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FadeBand {
    pub begin: f32,
    pub end: f32,
}

impl FadeBand {
    pub fn new(begin: f32, end: f32) -> Self {
        Self { begin, end }
    }
}

/// Fade strength at a projected depth: 0 before the band, 1 past it.
pub fn fade_factor(z: f32, band: FadeBand) -> f32 {
    ((z - band.begin) / (band.end - band.begin)).clamp(0.0, 1.0)
}

/// One tilemap draw's uniforms, ready for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderCommand {
    pub projection: [f32; 16],
    pub modelview: [f32; 16],
    pub fade: FadeBand,
    /// Current tile-animation frame, multiplied against each vertex's
    /// animation offset.
    pub animation_frame: [f32; 2],
}

impl RenderCommand {
    pub fn new(camera: &CameraState, fade: FadeBand, animation_frame: [f32; 2]) -> Self {
        Self {
            projection: *camera.projection_matrix().as_array(),
            modelview: *camera.modelview_matrix().as_array(),
            fade,
            animation_frame,
        }
    }
}
