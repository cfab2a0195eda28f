//! Map/screen transform façade
//!
//! All functions take the owning [`CameraState`] explicitly; there is no
//! ambient camera. Screen coordinates are pixels with the origin in the
//! top-left corner, map coordinates are pixels on the tile plane.

use super::plane::ground_plane;
use crate::camera::CameraState;
use crate::math::Vector3;
use serde::{Deserialize, Serialize};

/// Project a map position to screen space.
///
/// `x`/`y` are relative to the visible map window, the way sprite layers
/// track them; the camera's display offset is added back before the
/// transform. The returned `z` is the projected depth, untouched by the
/// perspective divide, for visibility tests.
pub fn map_to_screen(camera: &CameraState, x: f32, y: f32) -> Vector3 {
    let plane = camera.plane();
    let position = Vector3::new(
        x + camera.display_x() * plane.tile_width,
        y + camera.display_y() * plane.tile_height,
        0.0,
    );
    let world = camera.modelview_matrix().transform_point(position);
    let projection = camera.projection_matrix();
    let mut result = projection.transform_point(world);
    // transform_point drops the fourth row; the perspective divide needs it
    let p = projection.as_array();
    let w = p[3] * world.x + p[7] * world.y + p[11] * world.z + p[15];
    let screen = camera.screen();
    result.x =
        (result.x * screen.half_width() / w + screen.half_width()).round() - camera.shake_x();
    result.y = (result.y * screen.half_height() / w + screen.half_height()).round();
    result
}

/// Cast a screen pixel back onto the tile plane.
///
/// Builds the pixel's view ray from the near/far ends of device space,
/// undoes the perspective terms algebraically (the affine matrix inverse
/// is not defined for a projection matrix), then intersects the ray with
/// the ground plane recovered by [`ground_plane`].
pub fn screen_to_map(camera: &CameraState, x: f32, y: f32) -> Vector3 {
    let screen = camera.screen();
    let half_width = screen.half_width();
    let half_height = screen.half_height();
    let mut origin = Vector3::new(x - half_width, y - half_height, -1.0);
    let mut target = Vector3::new(x - half_width, y - half_height, 1.0);
    let projection = camera.projection_matrix();
    if !camera.is_orthogonal() {
        let p = projection.as_array();
        let scale_z = p[10];
        let offset_z = p[14];
        origin.x = origin.x * (offset_z - origin.z) / scale_z / half_width;
        origin.y = origin.y * (offset_z - origin.z) / scale_z / half_height;
        target.x = target.x * (offset_z - target.z) / scale_z / half_width;
        target.y = target.y * (offset_z - target.z) / scale_z / half_height;
    } else {
        target = origin + target;
    }
    let inverse_projection = projection.inversed();
    let origin = inverse_projection.transform_point(origin);
    let target = inverse_projection.transform_point(target);

    let plane = camera.plane();
    let modelview = camera.modelview_matrix();
    let factors = ground_plane(modelview, plane.pixel_width(), plane.pixel_height());
    let normal = Vector3::new(factors[0], factors[1], factors[2]);
    let mut ray = target - origin;
    ray.scale((factors[3] - normal.dot(origin)) / normal.dot(ray));
    let intersection = origin + ray;
    modelview.inversed().transform_point(intersection)
}

/// Screen tile under a pixel, for pointer/touch picking.
pub fn screen_to_tile(camera: &CameraState, x: f32, y: f32) -> (i32, i32) {
    let plane = camera.plane();
    let position = screen_to_map(camera, x, y);
    (
        (position.x / plane.tile_width).floor() as i32,
        (position.y / plane.tile_height).floor() as i32,
    )
}

/// Perspective sprite scale at a map position. Exactly `1.0` in
/// orthogonal mode; there is no depth scaling without perspective.
pub fn map_to_screen_scale(camera: &CameraState, x: f32, y: f32) -> f32 {
    if camera.is_orthogonal() {
        return 1.0;
    }
    map_z_to_screen_scale(camera, map_to_screen(camera, x, y).z)
}

/// Sprite scale from an already-projected depth.
pub fn map_z_to_screen_scale(camera: &CameraState, z: f32) -> f32 {
    camera.base_scale_z() / z.abs()
}

/// 8-way compass direction, named from the viewer's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Down,
    Left,
    Right,
    Up,
    DownLeft,
    DownRight,
    UpLeft,
    UpRight,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::Down,
        Direction::Left,
        Direction::Right,
        Direction::Up,
        Direction::DownLeft,
        Direction::DownRight,
        Direction::UpLeft,
        Direction::UpRight,
    ];

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
            Direction::Up => Direction::Down,
            Direction::DownLeft => Direction::UpRight,
            Direction::DownRight => Direction::UpLeft,
            Direction::UpLeft => Direction::DownRight,
            Direction::UpRight => Direction::DownLeft,
        }
    }
}

/// Remap a compass direction to follow the camera yaw.
///
/// Sprite facing uses `clockwise = true`, player input uses
/// `clockwise = false`; the two are mutual inverses. Diagonals only flip
/// in the 180-degree band; the quarter-turn bands pass them through, the
/// same limited 8-direction support the tile renderer has.
pub fn rotate_direction(camera: &CameraState, direction: Direction, clockwise: bool) -> Direction {
    rotate_direction_for_yaw(camera.yaw(), direction, clockwise)
}

/// [`rotate_direction`] for a raw yaw angle in degrees.
pub fn rotate_direction_for_yaw(yaw: f32, direction: Direction, clockwise: bool) -> Direction {
    let angle = yaw.rem_euclid(360.0);
    let near_side = (45.0..=135.0).contains(&angle);
    let behind = angle > 135.0 && angle < 225.0;
    let far_side = (225.0..=315.0).contains(&angle);
    if clockwise && near_side || !clockwise && far_side {
        match direction {
            Direction::Down => Direction::Left,
            Direction::Left => Direction::Up,
            Direction::Right => Direction::Down,
            Direction::Up => Direction::Right,
            other => other,
        }
    } else if behind {
        direction.opposite()
    } else if !clockwise && near_side || clockwise && far_side {
        match direction {
            Direction::Down => Direction::Right,
            Direction::Left => Direction::Down,
            Direction::Right => Direction::Up,
            Direction::Up => Direction::Left,
            other => other,
        }
    } else {
        direction
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{CameraParams, GroundPlane, Screen};

    fn camera_with(fov: f32, pitch: f32, yaw: f32) -> CameraState {
        let screen = Screen::new(816.0, 624.0);
        let plane = GroundPlane {
            cols: 20,
            rows: 15,
            tile_width: 48.0,
            tile_height: 48.0,
            loop_horizontal: false,
            loop_vertical: false,
        };
        let params = CameraParams {
            fov,
            pitch,
            yaw,
            camera_distance: 450.0,
            parallax_distance: 550.0,
        };
        CameraState::new(screen, plane, params, 1200.0, 450.0)
    }

    #[test]
    fn test_view_center_projects_to_screen_center() {
        let camera = camera_with(60.0, 0.0, 0.0);
        // the modelview centers the view half a tile below the screen middle
        let result = map_to_screen(&camera, 408.0, 336.0);
        assert_eq!(result.x, 408.0);
        assert_eq!(result.y, 312.0);
        assert!((result.z - 437.39).abs() < 0.1);
    }

    #[test]
    fn test_map_to_screen_with_pitch() {
        let camera = camera_with(60.0, 45.0, 0.0);
        let result = map_to_screen(&camera, 500.0, 400.0);
        assert!((result.x - 531.0).abs() <= 1.0);
        assert!((result.y - 372.0).abs() <= 1.0);
        assert!((result.z - 391.38).abs() < 0.1);
    }

    #[test]
    fn test_round_trip_without_rotation() {
        let camera = camera_with(60.0, 0.0, 0.0);
        for &(x, y) in &[(500.0, 400.0), (408.0, 312.0), (100.0, 650.0), (816.0, 0.0)] {
            let screen = map_to_screen(&camera, x, y);
            let map = screen_to_map(&camera, screen.x, screen.y);
            // pixel rounding in map_to_screen bounds the recovery error
            assert!((map.x - x).abs() < 1.0, "x: {} -> {}", x, map.x);
            assert!((map.y - y).abs() < 1.0, "y: {} -> {}", y, map.y);
            assert!(map.z.abs() < 0.01);
        }
    }

    #[test]
    fn test_round_trip_with_rotation() {
        let camera = camera_with(60.0, 30.0, 30.0);
        let screen = map_to_screen(&camera, 500.0, 400.0);
        let map = screen_to_map(&camera, screen.x, screen.y);
        assert!((map.x - 500.0).abs() < 1.0);
        assert!((map.y - 400.0).abs() < 1.0);
    }

    #[test]
    fn test_orthogonal_projection_is_flat() {
        let camera = camera_with(0.0, 0.0, 0.0);
        let result = map_to_screen(&camera, 500.0, 400.0);
        assert_eq!(result.x, 500.0);
        assert_eq!(result.y, 376.0);
        assert_eq!(result.z, 0.0);
    }

    #[test]
    fn test_orthogonal_scale_is_one() {
        let camera = camera_with(0.0, 80.0, 45.0);
        for &(x, y) in &[(0.0, 0.0), (500.0, 400.0), (960.0, 720.0)] {
            assert_eq!(map_to_screen_scale(&camera, x, y), 1.0);
        }
    }

    #[test]
    fn test_perspective_scale_shrinks_with_depth() {
        let camera = camera_with(60.0, 45.0, 0.0);
        // a point higher on the screen sits deeper in the scene
        let near = map_to_screen(&camera, 408.0, 650.0);
        let far = map_to_screen(&camera, 408.0, 50.0);
        assert!(far.z > near.z);
        assert!(
            map_z_to_screen_scale(&camera, far.z) < map_z_to_screen_scale(&camera, near.z)
        );
    }

    #[test]
    fn test_screen_to_tile_picks_the_tile_under_the_pixel() {
        let camera = camera_with(60.0, 0.0, 0.0);
        // mid-tile map point, so the round-trip error cannot cross a border
        let screen = map_to_screen(&camera, 420.0, 350.0);
        let (tx, ty) = screen_to_tile(&camera, screen.x, screen.y);
        assert_eq!((tx, ty), (8, 7));
    }

    #[test]
    fn test_rotate_direction_quarter_turns() {
        assert_eq!(
            rotate_direction_for_yaw(90.0, Direction::Down, true),
            Direction::Left
        );
        assert_eq!(
            rotate_direction_for_yaw(90.0, Direction::Left, false),
            Direction::Down
        );
        assert_eq!(
            rotate_direction_for_yaw(180.0, Direction::UpLeft, true),
            Direction::DownRight
        );
        assert_eq!(
            rotate_direction_for_yaw(0.0, Direction::Up, true),
            Direction::Up
        );
    }

    #[test]
    fn test_rotate_direction_inverse_property() {
        for step in 0..72 {
            let yaw = step as f32 * 5.0 - 180.0;
            for &direction in &Direction::ALL {
                let turned = rotate_direction_for_yaw(yaw, direction, true);
                let back = rotate_direction_for_yaw(yaw, turned, false);
                assert_eq!(back, direction, "yaw {} direction {:?}", yaw, direction);
            }
        }
    }
}
