//! Sprite projection capability
//!
//! Sprite-like entities implement [`Projectable`] and the renderer derives
//! placement, perspective scale and culling through it, instead of the
//! engine reaching into any particular sprite type.

use super::visibility::is_visible;
use crate::camera::CameraState;
use crate::math::Vector3;
use crate::projection::{map_to_screen, map_to_screen_scale};

/// Anything with a position on the tile plane.
pub trait Projectable {
    /// Position on the tile plane, in pixels, relative to the display
    /// window (the feet of a character sprite).
    fn map_position(&self) -> (f32, f32);

    /// Vertical offset off the plane, in pixels (jumping, airships).
    fn anchor_shift(&self) -> f32 {
        0.0
    }
}

/// Screen position of an entity; `z` is its depth for culling.
pub fn screen_position<T: Projectable + ?Sized>(camera: &CameraState, entity: &T) -> Vector3 {
    let (x, y) = entity.map_position();
    map_to_screen(camera, x, y + entity.anchor_shift())
}

/// Perspective scale an entity's sprite should render at.
pub fn screen_scale<T: Projectable + ?Sized>(camera: &CameraState, entity: &T) -> f32 {
    let (x, y) = entity.map_position();
    map_to_screen_scale(camera, x, y + entity.anchor_shift())
}

/// Whether the entity survives depth culling this frame.
pub fn sprite_visible<T: Projectable + ?Sized>(camera: &CameraState, entity: &T) -> bool {
    is_visible(camera, screen_position(camera, entity).z)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{CameraParams, GroundPlane, Screen};

    struct Marker {
        x: f32,
        y: f32,
    }

    impl Projectable for Marker {
        fn map_position(&self) -> (f32, f32) {
            (self.x, self.y)
        }
    }

    struct Airship {
        x: f32,
        y: f32,
        altitude: f32,
    }

    impl Projectable for Airship {
        fn map_position(&self) -> (f32, f32) {
            (self.x, self.y)
        }

        fn anchor_shift(&self) -> f32 {
            -self.altitude
        }
    }

    fn camera(fov: f32, pitch: f32) -> CameraState {
        let plane = GroundPlane {
            cols: 20,
            rows: 15,
            tile_width: 48.0,
            tile_height: 48.0,
            loop_horizontal: false,
            loop_vertical: false,
        };
        let params = CameraParams { fov, pitch, ..CameraParams::default() };
        CameraState::new(Screen::new(816.0, 624.0), plane, params, 1200.0, 450.0)
    }

    #[test]
    fn test_marker_projects_like_map_to_screen() {
        let camera = camera(60.0, 45.0);
        let marker = Marker { x: 500.0, y: 400.0 };
        let direct = map_to_screen(&camera, 500.0, 400.0);
        assert_eq!(screen_position(&camera, &marker), direct);
        assert!(sprite_visible(&camera, &marker));
    }

    #[test]
    fn test_anchor_shift_moves_the_projection_base() {
        let camera = camera(60.0, 45.0);
        let grounded = Marker { x: 408.0, y: 336.0 };
        let flying = Airship { x: 408.0, y: 336.0, altitude: 96.0 };
        let on_plane = screen_position(&camera, &grounded);
        let aloft = screen_position(&camera, &flying);
        // with pitch, a point higher on the map plane is deeper in the scene
        assert!(aloft.z > on_plane.z);
    }

    #[test]
    fn test_far_entity_is_culled() {
        let camera = camera(60.0, 85.0);
        // near the top map edge with a steep pitch: beyond the far plane?
        let marker = Marker { x: 408.0, y: -30000.0 };
        assert!(!sprite_visible(&camera, &marker));
    }

    #[test]
    fn test_orthogonal_entities_always_visible() {
        let camera = camera(0.0, 45.0);
        let marker = Marker { x: 408.0, y: -30000.0 };
        assert!(sprite_visible(&camera, &marker));
        assert_eq!(screen_scale(&camera, &marker), 1.0);
    }
}
