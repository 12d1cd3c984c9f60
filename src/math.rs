//! Vector and matrix math for 2D transforms
//!
//! Matrices are row-major `[[f32; 4]; 4]` with the translation in the last
//! column, so a point is transformed as `M * p`.

use std::ops::{Add, Mul, Sub};
use serde::{Serialize, Deserialize};

/// 2D Vector
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };
    pub const ONE: Vec2 = Vec2 { x: 1.0, y: 1.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn dot(self, other: Vec2) -> f32 {
        self.x * other.x + self.y * other.y
    }

    pub fn len(self) -> f32 {
        self.dot(self).sqrt()
    }

    pub fn normalize(self) -> Vec2 {
        let l = self.len();
        if l == 0.0 {
            return Vec2::ZERO;
        }
        Vec2 { x: self.x / l, y: self.y / l }
    }

    pub fn scale(self, s: f32) -> Vec2 {
        Vec2 { x: self.x * s, y: self.y * s }
    }

    /// Distance check with a tolerance, mostly for tests and snapping.
    pub fn approx_eq(self, other: Vec2, epsilon: f32) -> bool {
        (self.x - other.x).abs() <= epsilon && (self.y - other.y).abs() <= epsilon
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, other: Vec2) -> Vec2 {
        Vec2 { x: self.x + other.x, y: self.y + other.y }
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, other: Vec2) -> Vec2 {
        Vec2 { x: self.x - other.x, y: self.y - other.y }
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;
    fn mul(self, s: f32) -> Vec2 {
        self.scale(s)
    }
}

/// 3D Vector (points pushed through a `Mat4`)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 0.0 };

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn xy(self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

// =============================================================================
// 4x4 Matrix operations (for transforms)
// =============================================================================

/// 4x4 transformation matrix type
pub type Mat4 = [[f32; 4]; 4];

/// Identity matrix
pub const MAT4_IDENTITY: Mat4 = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

/// Create translation matrix
pub fn mat4_translation(t: Vec3) -> Mat4 {
    [
        [1.0, 0.0, 0.0, t.x],
        [0.0, 1.0, 0.0, t.y],
        [0.0, 0.0, 1.0, t.z],
        [0.0, 0.0, 0.0, 1.0],
    ]
}

/// Rotation about the Z axis, angle in degrees (counter-clockwise).
pub fn mat4_rotation_z(degrees: f32) -> Mat4 {
    let (s, c) = degrees.to_radians().sin_cos();
    [
        [c, -s, 0.0, 0.0],
        [s, c, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ]
}

/// Non-uniform scale on X and Y.
pub fn mat4_scale(s: Vec2) -> Mat4 {
    [
        [s.x, 0.0, 0.0, 0.0],
        [0.0, s.y, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ]
}

/// Multiply two 4x4 matrices
pub fn mat4_mul(a: &Mat4, b: &Mat4) -> Mat4 {
    let mut result = [[0.0; 4]; 4];
    for i in 0..4 {
        for j in 0..4 {
            for k in 0..4 {
                result[i][j] += a[i][k] * b[k][j];
            }
        }
    }
    result
}

/// Transform a point by a 4x4 matrix
pub fn mat4_transform_point(m: &Mat4, p: Vec3) -> Vec3 {
    Vec3::new(
        m[0][0] * p.x + m[0][1] * p.y + m[0][2] * p.z + m[0][3],
        m[1][0] * p.x + m[1][1] * p.y + m[1][2] * p.z + m[1][3],
        m[2][0] * p.x + m[2][1] * p.y + m[2][2] * p.z + m[2][3],
    )
}

/// Translation part of a matrix
pub fn mat4_translation_of(m: &Mat4) -> Vec3 {
    Vec3::new(m[0][3], m[1][3], m[2][3])
}

/// Rotation (degrees) and per-axis scale of a 2D affine matrix.
/// Assumes no shear, which holds for anything built from `Transform`s
/// with uniform or unrotated scales.
pub fn mat4_rotation_scale_of(m: &Mat4) -> (f32, Vec2) {
    let sx = (m[0][0] * m[0][0] + m[1][0] * m[1][0]).sqrt();
    let sy = (m[0][1] * m[0][1] + m[1][1] * m[1][1]).sqrt();
    let degrees = m[1][0].atan2(m[0][0]).to_degrees();
    (degrees, Vec2::new(sx, sy))
}

/// Element-wise comparison with a tolerance
pub fn mat4_approx_eq(a: &Mat4, b: &Mat4, epsilon: f32) -> bool {
    a.iter()
        .flatten()
        .zip(b.iter().flatten())
        .all(|(x, y)| (x - y).abs() <= epsilon)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translation_then_point() {
        let m = mat4_translation(Vec3::new(10.0, 20.0, 0.0));
        let p = mat4_transform_point(&m, Vec3::new(1.0, 1.0, 0.0));
        assert!((p.x - 11.0).abs() < 0.001);
        assert!((p.y - 21.0).abs() < 0.001);
    }

    #[test]
    fn test_rotation_z_quarter_turn() {
        let m = mat4_rotation_z(90.0);
        let p = mat4_transform_point(&m, Vec3::new(1.0, 0.0, 0.0));
        assert!(p.x.abs() < 0.001);
        assert!((p.y - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_mul_identity() {
        let m = mat4_mul(&mat4_translation(Vec3::new(3.0, 4.0, 0.0)), &mat4_scale(Vec2::new(2.0, 2.0)));
        assert!(mat4_approx_eq(&mat4_mul(&MAT4_IDENTITY, &m), &m, 1e-6));
        assert!(mat4_approx_eq(&mat4_mul(&m, &MAT4_IDENTITY), &m, 1e-6));
    }

    #[test]
    fn test_translate_after_scale_order() {
        // T * S applies the scale first
        let m = mat4_mul(&mat4_translation(Vec3::new(5.0, 0.0, 0.0)), &mat4_scale(Vec2::new(2.0, 1.0)));
        let p = mat4_transform_point(&m, Vec3::new(1.0, 0.0, 0.0));
        assert!((p.x - 7.0).abs() < 0.001);
        assert_eq!(mat4_translation_of(&m).xy(), Vec2::new(5.0, 0.0));
    }

    #[test]
    fn test_rotation_scale_extraction() {
        let m = mat4_mul(&mat4_rotation_z(30.0), &mat4_scale(Vec2::new(2.0, 3.0)));
        let (degrees, scale) = mat4_rotation_scale_of(&m);
        assert!((degrees - 30.0).abs() < 0.001);
        assert!(scale.approx_eq(Vec2::new(2.0, 3.0), 0.001));
    }

    #[test]
    fn test_vec2_normalize_zero() {
        assert_eq!(Vec2::ZERO.normalize(), Vec2::ZERO);
        assert!((Vec2::new(3.0, 4.0).len() - 5.0).abs() < 0.001);
    }
}
