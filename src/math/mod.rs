//! Linear algebra for the projection pipeline
//!
//! Deliberately small: a 3-component vector and a column-major 4x4 matrix
//! with exactly the operations the camera and the screen/map transforms
//! need. Angles are degrees everywhere, matching the public camera API.

mod matrix;
mod vector;

pub use matrix::*;
pub use vector::*;
