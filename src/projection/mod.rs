//! Screen/map coordinate transforms
//!
//! - map position -> screen position with perspective divide
//! - screen position -> map position via ground-plane raycasting
//! - perspective sprite scale from projected depth
//! - compass direction remapping under camera yaw

mod plane;
mod transform;

pub use plane::*;
pub use transform::*;
