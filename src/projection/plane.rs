//! Ground-plane extraction for inverse raycasting
//!
//! The picking path needs the plane equation `Ax + By + Cz + D = 0` of the
//! tile plane after the modelview transform. The four map corners give four
//! equations in four unknowns, solved by Gaussian elimination.

use crate::math::{Matrix4, Vector3};

/// Plane coefficients `(A, B, C, D)` of the transformed tile plane.
/// `width`/`height` are the map size in pixels.
pub(crate) fn ground_plane(modelview: &Matrix4, width: f32, height: f32) -> [f32; 4] {
    let corners = [
        modelview.transform_point(Vector3::ZERO),
        modelview.transform_point(Vector3::new(width, 0.0, 0.0)),
        modelview.transform_point(Vector3::new(0.0, height, 0.0)),
        modelview.transform_point(Vector3::new(width, height, 0.0)),
    ];
    let mut system = [[0.0f32; 4]; 4];
    for (row, corner) in system.iter_mut().zip(corners.iter()) {
        *row = [corner.x, corner.y, corner.z, 0.0];
    }
    solve_linear_system(system)
}

/// Solve `Mx = 1` for a 4x4 system by Gaussian elimination with partial
/// pivoting (max-magnitude pivot per column keeps the elimination stable).
///
/// A zero pivot leaves that unknown underdetermined; it is forced to `1`
/// instead of failing. The resulting plane is an approximation, which is
/// accepted so that degenerate camera angles stay interactive.
pub(crate) fn solve_linear_system(m: [[f32; 4]; 4]) -> [f32; 4] {
    const N: usize = 4;
    let mut m: [[f32; 5]; 4] = [
        [m[0][0], m[0][1], m[0][2], m[0][3], 1.0],
        [m[1][0], m[1][1], m[1][2], m[1][3], 1.0],
        [m[2][0], m[2][1], m[2][2], m[2][3], 1.0],
        [m[3][0], m[3][1], m[3][2], m[3][3], 1.0],
    ];
    for i in 0..N {
        // search the column for the maximum-magnitude pivot
        let mut max_element = m[i][i].abs();
        let mut max_row = i;
        for k in (i + 1)..N {
            if m[k][i].abs() > max_element {
                max_element = m[k][i].abs();
                max_row = k;
            }
        }
        m.swap(i, max_row);
        if m[i][i] != 0.0 {
            // zero the column below the pivot
            for k in (i + 1)..N {
                let factor = -m[k][i] / m[i][i];
                for j in i..=N {
                    if i == j {
                        m[k][j] = 0.0;
                    } else {
                        m[k][j] += factor * m[i][j];
                    }
                }
            }
        }
    }
    // back-substitution on the upper triangular system
    let mut result = [0.0f32; N];
    for i in (0..N).rev() {
        if m[i][i] == 0.0 {
            result[i] = 1.0;
        } else {
            result[i] = m[i][N] / m[i][i];
        }
        for k in (0..i).rev() {
            m[k][N] -= m[k][i] * result[i];
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solves_full_rank_system() {
        let m = [
            [2.0, 1.0, -1.0, 3.0],
            [1.0, 3.0, 2.0, -2.0],
            [3.0, -1.0, 4.0, 1.0],
            [1.0, 1.0, 1.0, 1.0],
        ];
        let x = solve_linear_system(m);
        for row in &m {
            let sum: f32 = row.iter().zip(x.iter()).map(|(a, b)| a * b).sum();
            assert!((sum - 1.0).abs() < 1e-4, "row residual {}", sum);
        }
    }

    #[test]
    fn test_pivoting_handles_zero_leading_entry() {
        // the first pivot must come from a lower row
        let m = [
            [0.0, 2.0, 0.0, 0.0],
            [4.0, 0.0, 0.0, 0.0],
            [0.0, 0.0, 8.0, 0.0],
            [0.0, 0.0, 0.0, 16.0],
        ];
        let x = solve_linear_system(m);
        assert!((x[0] - 0.25).abs() < 1e-6);
        assert!((x[1] - 0.5).abs() < 1e-6);
        assert!((x[2] - 0.125).abs() < 1e-6);
        assert!((x[3] - 0.0625).abs() < 1e-6);
    }

    #[test]
    fn test_degenerate_column_defaults_to_one() {
        // the fourth unknown never appears: its pivot is zero
        let m = [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [1.0, 1.0, 1.0, 0.0],
        ];
        let x = solve_linear_system(m);
        assert_eq!(x[3], 1.0);
    }

    #[test]
    fn test_flat_plane_at_camera_distance() {
        // untransformed plane z=0 shifted to z=-450 by a plain translation
        let mut modelview = Matrix4::identity();
        modelview.translate(0.0, 0.0, -450.0);
        let factors = ground_plane(&modelview, 960.0, 720.0);
        // normal must be parallel to the z axis
        assert!(factors[0].abs() < 1e-5);
        assert!(factors[1].abs() < 1e-5);
        // plane equation: C * (-450) = D
        assert!((factors[2] * -450.0 - factors[3]).abs() < 1e-3);
    }
}
