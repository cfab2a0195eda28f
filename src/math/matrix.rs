//! Column-major 4x4 matrix
//!
//! Element `(row, col)` lives at index `col * 4 + row`, the layout GPU
//! uniform uploads expect. `multiply` composes in place; the inverse is
//! defined only for rotation+translation matrices (see [`Matrix4::inversed`]).

use super::Vector3;
use serde::{Deserialize, Serialize};

/// Column-major 4x4 transform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix4 {
    data: [f32; 16],
}

impl Default for Matrix4 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Matrix4 {
    pub fn identity() -> Self {
        Self {
            data: [
                1.0, 0.0, 0.0, 0.0, //
                0.0, 1.0, 0.0, 0.0, //
                0.0, 0.0, 1.0, 0.0, //
                0.0, 0.0, 0.0, 1.0,
            ],
        }
    }

    pub fn from_array(data: [f32; 16]) -> Self {
        Self { data }
    }

    /// The raw 16 floats, ready for a uniform upload.
    pub fn as_array(&self) -> &[f32; 16] {
        &self.data
    }

    pub fn set_identity(&mut self) {
        self.set_zero();
        self.data[0] = 1.0;
        self.data[5] = 1.0;
        self.data[10] = 1.0;
        self.data[15] = 1.0;
    }

    pub fn set_zero(&mut self) {
        self.data = [0.0; 16];
    }

    pub fn set_translation(&mut self, offset: Vector3) {
        self.set_identity();
        self.data[12] = offset.x;
        self.data[13] = offset.y;
        self.data[14] = offset.z;
    }

    pub fn translate(&mut self, x: f32, y: f32, z: f32) {
        let mut matrix = Matrix4::identity();
        matrix.set_translation(Vector3::new(x, y, z));
        self.multiply(&matrix);
    }

    /// Rotation about the X axis, `angle` in degrees.
    pub fn set_rotation_x(&mut self, angle: f32) {
        self.set_zero();
        let rad = angle.to_radians();
        self.data[0] = 1.0;
        self.data[15] = 1.0;
        self.data[5] = rad.cos();
        self.data[10] = self.data[5];
        self.data[6] = rad.sin();
        self.data[9] = -self.data[6];
    }

    /// Rotation about the Z axis, `angle` in degrees.
    pub fn set_rotation_z(&mut self, angle: f32) {
        self.set_zero();
        let rad = angle.to_radians();
        self.data[10] = 1.0;
        self.data[15] = 1.0;
        self.data[0] = rad.cos();
        self.data[5] = self.data[0];
        self.data[1] = rad.sin();
        self.data[4] = -self.data[1];
    }

    pub fn rotate_x(&mut self, angle: f32) {
        let mut matrix = Matrix4::identity();
        matrix.set_rotation_x(angle);
        self.multiply(&matrix);
    }

    pub fn rotate_z(&mut self, angle: f32) {
        let mut matrix = Matrix4::identity();
        matrix.set_rotation_z(angle);
        self.multiply(&matrix);
    }

    /// In-place composition `self = self * other`.
    pub fn multiply(&mut self, other: &Matrix4) {
        let a = &self.data;
        let b = &other.data;
        let mut result = [0.0f32; 16];
        for col in 0..4 {
            for row in 0..4 {
                let mut sum = 0.0;
                for k in 0..4 {
                    sum += a[k * 4 + row] * b[col * 4 + k];
                }
                result[col * 4 + row] = sum;
            }
        }
        self.data = result;
    }

    /// Transform a point, treating it as `(x, y, z, 1)` and dropping the
    /// `w` row. Callers needing the homogeneous `w` compute it from
    /// [`Matrix4::as_array`] directly.
    pub fn transform_point(&self, v: Vector3) -> Vector3 {
        let d = &self.data;
        Vector3::new(
            d[0] * v.x + d[4] * v.y + d[8] * v.z + d[12],
            d[1] * v.x + d[5] * v.y + d[9] * v.z + d[13],
            d[2] * v.x + d[6] * v.y + d[10] * v.z + d[14],
        )
    }

    /// View matrix looking from `eye` toward `target`.
    pub fn look_at(&mut self, eye: Vector3, target: Vector3, up: Vector3) {
        self.set_zero();
        let mut bz = eye - target;
        bz.normalize();
        let mut bx = up.cross(bz);
        bx.normalize();
        let mut by = bz.cross(bx);
        by.normalize();
        self.data[0] = bx.x;
        self.data[1] = by.x;
        self.data[2] = bz.x;
        self.data[4] = bx.y;
        self.data[5] = by.y;
        self.data[6] = bz.y;
        self.data[8] = bx.z;
        self.data[9] = by.z;
        self.data[10] = bz.z;
        self.data[15] = 1.0;
        let mut back = eye;
        back.negate();
        let mut translation = Matrix4::identity();
        translation.set_translation(back);
        self.multiply(&translation);
    }

    /// Right-handed perspective projection looking down -Z.
    /// `fov` is the vertical field of view in degrees and must be > 0;
    /// an FOV of 0 selects [`Matrix4::set_ortho_projection`] instead.
    pub fn set_perspective(&mut self, fov: f32, width: f32, height: f32, near_z: f32, far_z: f32) {
        self.set_zero();
        let inv_tan = 1.0 / (fov * 0.5).to_radians().tan();
        let z_diff = far_z - near_z;
        self.data[0] = inv_tan * height / width;
        self.data[5] = inv_tan;
        self.data[10] = -(far_z + near_z) / z_diff;
        self.data[11] = -1.0;
        self.data[14] = -2.0 * far_z * near_z / z_diff;
    }

    pub fn set_ortho_projection(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.set_zero();
        self.data[0] = 2.0 / width;
        self.data[5] = 2.0 / height;
        self.data[12] = x * 2.0 / width;
        self.data[13] = y * 2.0 / height;
        self.data[15] = 1.0;
    }

    /// Inverse for rotation+translation matrices: cofactor inverse of the
    /// upper-left 3x3 block plus translation back-substitution. Not valid
    /// for a matrix carrying a perspective row; the screen-to-map path
    /// removes the perspective terms before coming through here.
    pub fn inversed(&self) -> Matrix4 {
        let d = &self.data;
        let inv_det = 1.0 / self.determinant();
        let mut m = [0.0f32; 16];
        m[15] = 1.0;
        m[0] = (d[5] * d[10] - d[9] * d[6]) * inv_det;
        m[1] = -(d[1] * d[10] - d[9] * d[2]) * inv_det;
        m[2] = (d[1] * d[6] - d[5] * d[2]) * inv_det;
        m[4] = -(d[4] * d[10] - d[8] * d[6]) * inv_det;
        m[5] = (d[0] * d[10] - d[8] * d[2]) * inv_det;
        m[6] = -(d[0] * d[6] - d[4] * d[2]) * inv_det;
        m[8] = (d[4] * d[9] - d[8] * d[5]) * inv_det;
        m[9] = -(d[0] * d[9] - d[8] * d[1]) * inv_det;
        m[10] = (d[0] * d[5] - d[4] * d[1]) * inv_det;
        m[12] = -(d[12] * m[0] + d[13] * m[4] + d[14] * m[8]);
        m[13] = -(d[12] * m[1] + d[13] * m[5] + d[14] * m[9]);
        m[14] = -(d[12] * m[2] + d[13] * m[6] + d[14] * m[10]);
        Matrix4::from_array(m)
    }

    /// Determinant of the upper-left 3x3 block.
    pub fn determinant(&self) -> f32 {
        let d = &self.data;
        d[0] * d[5] * d[10] + d[4] * d[9] * d[2] + d[8] * d[1] * d[6]
            - d[8] * d[5] * d[2]
            - d[4] * d[1] * d[10]
            - d[0] * d[9] * d[6]
    }
}
