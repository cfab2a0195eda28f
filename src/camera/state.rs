//! Camera state and derived matrices
//!
//! One `CameraState` exists per Mode 7 map. Every mutation recomputes the
//! projection and modelview matrices synchronously; dependent code reads
//! them immediately afterwards, so there is no dirty-flag deferral.

use super::{
    AnimationJob, MAX_PITCH, MIN_CAMERA_DISTANCE, MIN_FOV, MIN_PARALLAX_DISTANCE, MIN_PITCH,
    NEAR_CLIP_Z,
};
use crate::math::{Matrix4, Vector3};
use log::debug;
use serde::{Deserialize, Serialize};

/// Logical screen size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Screen {
    pub width: f32,
    pub height: f32,
}

impl Screen {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn half_width(&self) -> f32 {
        self.width / 2.0
    }

    pub fn half_height(&self) -> f32 {
        self.height / 2.0
    }
}

/// The flat tile plane the camera looks at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroundPlane {
    pub cols: u32,
    pub rows: u32,
    pub tile_width: f32,
    pub tile_height: f32,
    pub loop_horizontal: bool,
    pub loop_vertical: bool,
}

impl GroundPlane {
    pub fn pixel_width(&self) -> f32 {
        self.cols as f32 * self.tile_width
    }

    pub fn pixel_height(&self) -> f32 {
        self.rows as f32 * self.tile_height
    }

    pub fn loops(&self) -> bool {
        self.loop_horizontal || self.loop_vertical
    }
}

/// Initial camera parameters, already in user units (degrees, pixels).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraParams {
    pub fov: f32,
    pub pitch: f32,
    pub yaw: f32,
    pub camera_distance: f32,
    pub parallax_distance: f32,
}

impl Default for CameraParams {
    fn default() -> Self {
        Self {
            fov: 60.0,
            pitch: 45.0,
            yaw: 0.0,
            camera_distance: 450.0,
            parallax_distance: 550.0,
        }
    }
}

/// Camera looking at one flat tile plane.
#[derive(Debug, Clone)]
pub struct CameraState {
    fov: f32,
    pitch: f32,
    yaw: f32,
    camera_distance: f32,
    parallax_distance: f32,

    screen: Screen,
    plane: GroundPlane,
    far_clip_z: f32,
    base_scale_z: f32,

    // per-frame inputs pushed in by the map context
    display_x: f32,
    display_y: f32,
    shake_x: f32,

    projection: Matrix4,
    modelview: Matrix4,
    loop_extend_x: u32,
    loop_extend_y: u32,
    retile_requested: bool,

    fov_job: Option<AnimationJob>,
    pitch_job: Option<AnimationJob>,
    yaw_job: Option<AnimationJob>,
    distance_job: Option<AnimationJob>,
}

impl CameraState {
    pub fn new(
        screen: Screen,
        plane: GroundPlane,
        params: CameraParams,
        far_clip_z: f32,
        base_scale_z: f32,
    ) -> Self {
        let mut state = Self {
            fov: params.fov.max(MIN_FOV),
            pitch: params.pitch.clamp(MIN_PITCH, MAX_PITCH),
            yaw: params.yaw,
            camera_distance: params.camera_distance.max(MIN_CAMERA_DISTANCE),
            parallax_distance: params.parallax_distance.max(MIN_PARALLAX_DISTANCE),
            screen,
            plane,
            far_clip_z: far_clip_z.max(NEAR_CLIP_Z + 1.0),
            base_scale_z,
            display_x: 0.0,
            display_y: 0.0,
            shake_x: 0.0,
            projection: Matrix4::identity(),
            modelview: Matrix4::identity(),
            loop_extend_x: 0,
            loop_extend_y: 0,
            retile_requested: false,
            fov_job: None,
            pitch_job: None,
            yaw_job: None,
            distance_job: None,
        };
        state.refresh();
        state
    }

    pub fn fov(&self) -> f32 {
        self.fov
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn camera_distance(&self) -> f32 {
        self.camera_distance
    }

    pub fn parallax_distance(&self) -> f32 {
        self.parallax_distance
    }

    /// An FOV of 0 switches the projection to orthogonal.
    pub fn is_orthogonal(&self) -> bool {
        self.fov <= 0.0
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn plane(&self) -> GroundPlane {
        self.plane
    }

    pub fn far_clip_z(&self) -> f32 {
        self.far_clip_z
    }

    pub fn base_scale_z(&self) -> f32 {
        self.base_scale_z
    }

    pub fn display_x(&self) -> f32 {
        self.display_x
    }

    pub fn display_y(&self) -> f32 {
        self.display_y
    }

    pub fn shake_x(&self) -> f32 {
        self.shake_x
    }

    pub fn projection_matrix(&self) -> &Matrix4 {
        &self.projection
    }

    pub fn modelview_matrix(&self) -> &Matrix4 {
        &self.modelview
    }

    /// Extra tile columns a wrapping map must render beyond the viewport.
    pub fn loop_extend_x(&self) -> u32 {
        self.loop_extend_x
    }

    /// Extra tile rows a wrapping map must render beyond the viewport.
    pub fn loop_extend_y(&self) -> u32 {
        self.loop_extend_y
    }

    /// True once per loop-extension change: the whole tilemap needs
    /// repainting, which is expensive. Callers may rate-limit how often
    /// they honor it.
    pub fn take_retile_request(&mut self) -> bool {
        std::mem::take(&mut self.retile_requested)
    }

    pub fn set_fov(&mut self, value: f32) {
        self.fov = value.max(MIN_FOV);
        self.refresh();
    }

    pub fn set_pitch(&mut self, value: f32) {
        self.pitch = value.clamp(MIN_PITCH, MAX_PITCH);
        self.refresh();
    }

    pub fn set_yaw(&mut self, value: f32) {
        self.yaw = value;
        self.refresh();
    }

    pub fn set_camera_distance(&mut self, value: f32) {
        self.camera_distance = value.max(MIN_CAMERA_DISTANCE);
        self.refresh();
    }

    pub fn set_parallax_distance(&mut self, value: f32) {
        self.parallax_distance = value.max(MIN_PARALLAX_DISTANCE);
        self.refresh();
    }

    /// Scroll position of the view window, in tiles.
    pub fn set_display_pos(&mut self, x: f32, y: f32) {
        self.display_x = x;
        self.display_y = y;
        self.refresh();
    }

    /// Horizontal screen-shake offset from the screen-effects collaborator.
    pub fn set_shake(&mut self, offset: f32) {
        if self.shake_x != offset {
            self.shake_x = offset;
            self.refresh();
        }
    }

    pub fn animate_fov(&mut self, target: f32, frames: u32) {
        self.fov_job = AnimationJob::new(target, frames);
    }

    pub fn animate_pitch(&mut self, target: f32, frames: u32) {
        self.pitch_job = AnimationJob::new(target, frames);
    }

    pub fn animate_yaw(&mut self, target: f32, frames: u32) {
        self.yaw_job = AnimationJob::new(target, frames);
    }

    pub fn animate_camera_distance(&mut self, target: f32, frames: u32) {
        self.distance_job = AnimationJob::new(target, frames);
    }

    pub fn is_animating(&self) -> bool {
        self.fov_job.is_some()
            || self.pitch_job.is_some()
            || self.yaw_job.is_some()
            || self.distance_job.is_some()
    }

    /// One simulation tick: advance all running parameter animations.
    /// Returns true if any parameter changed (and the matrices refreshed).
    pub fn update(&mut self) -> bool {
        let mut changed = false;
        if let Some(mut job) = self.fov_job.take() {
            self.fov = job.step(self.fov).max(MIN_FOV);
            if !job.is_finished() {
                self.fov_job = Some(job);
            }
            changed = true;
        }
        if let Some(mut job) = self.pitch_job.take() {
            self.pitch = job.step(self.pitch).clamp(MIN_PITCH, MAX_PITCH);
            if !job.is_finished() {
                self.pitch_job = Some(job);
            }
            changed = true;
        }
        if let Some(mut job) = self.yaw_job.take() {
            self.yaw = job.step(self.yaw);
            if !job.is_finished() {
                self.yaw_job = Some(job);
            }
            changed = true;
        }
        if let Some(mut job) = self.distance_job.take() {
            self.camera_distance = job.step(self.camera_distance).max(MIN_CAMERA_DISTANCE);
            if !job.is_finished() {
                self.distance_job = Some(job);
            }
            changed = true;
        }
        if changed {
            self.refresh();
        }
        changed
    }

    /// Rebuild loop extension and both matrices from the current parameters.
    fn refresh(&mut self) {
        self.refresh_loop_extension();
        if self.fov > 0.0 {
            self.projection.set_perspective(
                self.fov,
                self.screen.width,
                self.screen.height,
                NEAR_CLIP_Z,
                self.far_clip_z,
            );
        } else {
            self.projection
                .set_ortho_projection(0.0, 0.0, self.screen.width, self.screen.height);
        }
        let eye = Vector3::new(0.0, 0.0, self.camera_distance);
        self.modelview.look_at(eye, Vector3::ZERO, Vector3::UP);
        self.modelview.translate(self.shake_x, 0.0, 0.0);
        self.modelview.rotate_x(self.pitch);
        self.modelview.rotate_z(self.yaw);
        self.modelview.translate(
            -self.screen.half_width() - self.display_x * self.plane.tile_width,
            -self.screen.half_height() - (self.display_y + 0.5) * self.plane.tile_height,
            0.0,
        );
    }

    fn refresh_loop_extension(&mut self) {
        let (extend_x, extend_y) = if self.plane.loops() {
            let rad = self.fov.to_radians();
            let side = self.far_clip_z / rad.cos();
            let band = rad * self.screen.height / self.screen.width;
            let mut extent = (side / band.cos()).abs();
            extent = extent * self.camera_distance / self.far_clip_z;
            // +1 because the tile coordinate is centered
            (
                (extent / self.plane.tile_width).ceil() as u32 + 1,
                (extent / self.plane.tile_height).ceil() as u32 + 1,
            )
        } else {
            (0, 0)
        };
        if (extend_x, extend_y) != (self.loop_extend_x, self.loop_extend_y) {
            debug!(
                "loop extension changed to {}x{} tiles, tilemap repaint required",
                extend_x, extend_y
            );
            self.loop_extend_x = extend_x;
            self.loop_extend_y = extend_y;
            self.retile_requested = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_screen() -> Screen {
        Screen::new(816.0, 624.0)
    }

    fn flat_plane() -> GroundPlane {
        GroundPlane {
            cols: 20,
            rows: 15,
            tile_width: 48.0,
            tile_height: 48.0,
            loop_horizontal: false,
            loop_vertical: false,
        }
    }

    fn looping_plane() -> GroundPlane {
        GroundPlane {
            loop_horizontal: true,
            loop_vertical: true,
            ..flat_plane()
        }
    }

    #[test]
    fn test_setters_clamp() {
        let mut camera = CameraState::new(
            test_screen(),
            flat_plane(),
            CameraParams::default(),
            1200.0,
            450.0,
        );
        camera.set_pitch(120.0);
        assert_eq!(camera.pitch(), 90.0);
        camera.set_pitch(-15.0);
        assert_eq!(camera.pitch(), 0.0);
        camera.set_fov(-10.0);
        assert_eq!(camera.fov(), 0.0);
        assert!(camera.is_orthogonal());
        camera.set_camera_distance(-1.0);
        assert_eq!(camera.camera_distance(), 0.0);
        camera.set_parallax_distance(0.0);
        assert_eq!(camera.parallax_distance(), 1.0);
    }

    #[test]
    fn test_far_clip_floor() {
        let camera = CameraState::new(
            test_screen(),
            flat_plane(),
            CameraParams::default(),
            5.0,
            450.0,
        );
        assert_eq!(camera.far_clip_z(), NEAR_CLIP_Z + 1.0);
    }

    #[test]
    fn test_animation_reaches_target_exactly() {
        let mut camera = CameraState::new(
            test_screen(),
            flat_plane(),
            CameraParams::default(),
            1200.0,
            450.0,
        );
        camera.animate_fov(100.0, 10);
        for frame in 0..10 {
            assert!(camera.update(), "tick {} should report a change", frame);
        }
        assert_eq!(camera.fov(), 100.0);
        assert!(!camera.is_animating());
        assert!(!camera.update());
    }

    #[test]
    fn test_animation_midway_between_endpoints() {
        let mut camera = CameraState::new(
            test_screen(),
            flat_plane(),
            CameraParams::default(),
            1200.0,
            450.0,
        );
        camera.animate_fov(100.0, 10);
        for _ in 0..5 {
            camera.update();
        }
        assert!(camera.fov() > 60.0 && camera.fov() < 100.0);
        // the recurrence interpolates 1/remaining of the way each tick
        assert!((camera.fov() - 80.0).abs() < 1e-3);
    }

    #[test]
    fn test_direct_set_during_animation_rebases() {
        let mut camera = CameraState::new(
            test_screen(),
            flat_plane(),
            CameraParams::default(),
            1200.0,
            450.0,
        );
        camera.animate_pitch(90.0, 10);
        camera.update();
        camera.set_pitch(10.0);
        assert_eq!(camera.pitch(), 10.0);
        camera.update();
        // still animating toward 90, now from the rebased value
        assert!(camera.pitch() > 10.0 && camera.pitch() < 90.0);
    }

    #[test]
    fn test_loop_extension_values() {
        let mut camera = CameraState::new(
            test_screen(),
            looping_plane(),
            CameraParams::default(),
            1200.0,
            450.0,
        );
        assert!(camera.take_retile_request());
        // fov 60, distance 450, far 1200, 816x624 screen, 48px tiles
        assert_eq!(camera.loop_extend_x(), 28);
        assert_eq!(camera.loop_extend_y(), 28);
        camera.set_camera_distance(300.0);
        assert_eq!(camera.loop_extend_x(), 19);
        assert!(camera.take_retile_request());
        assert!(!camera.take_retile_request());
    }

    #[test]
    fn test_no_loop_extension_on_bounded_maps() {
        let mut camera = CameraState::new(
            test_screen(),
            flat_plane(),
            CameraParams::default(),
            1200.0,
            450.0,
        );
        assert_eq!(camera.loop_extend_x(), 0);
        assert_eq!(camera.loop_extend_y(), 0);
        assert!(!camera.take_retile_request());
    }

    #[test]
    fn test_yaw_unbounded() {
        let mut camera = CameraState::new(
            test_screen(),
            flat_plane(),
            CameraParams::default(),
            1200.0,
            450.0,
        );
        camera.set_yaw(725.0);
        assert_eq!(camera.yaw(), 725.0);
    }
}
