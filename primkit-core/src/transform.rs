/// 4x4 affine transforms for 2D primitive placement
use nalgebra::{Matrix4, Point3, Vector3};
use std::ops::Mul;

use crate::geometry::Vertex;

/// A 4x4 transform applied to column vectors
///
/// Elementary operations right-multiply, so the most recently added
/// operation is the first one applied to a point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    matrix: Matrix4<f32>,
}

impl Transform {
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
        }
    }

    pub fn from_matrix(matrix: Matrix4<f32>) -> Self {
        Self { matrix }
    }

    /// Scale, then rotate, then translate.
    pub fn build(x: f32, y: f32, sx: f32, sy: f32, theta: f32) -> Self {
        Self::from_matrix(
            Self::translation_matrix(x, y) * Self::rotation_matrix(theta) * Self::scale_matrix(sx, sy),
        )
    }

    pub fn matrix(&self) -> &Matrix4<f32> {
        &self.matrix
    }

    pub fn copy_from(&mut self, src: &Transform) {
        self.matrix = src.matrix;
    }

    pub fn translate(&mut self, dx: f32, dy: f32) -> &mut Self {
        self.matrix *= Self::translation_matrix(dx, dy);
        self
    }

    /// Rotation about the z axis, counter-clockwise in radians.
    pub fn rotate(&mut self, theta: f32) -> &mut Self {
        self.matrix *= Self::rotation_matrix(theta);
        self
    }

    pub fn scale(&mut self, sx: f32, sy: f32) -> &mut Self {
        self.matrix *= Self::scale_matrix(sx, sy);
        self
    }

    /// Right-multiplies by `other` in place.
    pub fn transform_by(&mut self, other: &Transform) -> &mut Self {
        self.matrix *= other.matrix;
        self
    }

    /// Matrix product `a · b`.
    pub fn compose(a: &Transform, b: &Transform) -> Transform {
        Self::from_matrix(a.matrix * b.matrix)
    }

    /// Transforms position and normal. The normal is a direction and ignores
    /// translation; its length follows the matrix.
    pub fn apply(&self, vertex: &Vertex) -> Vertex {
        Vertex {
            position: self.matrix.transform_point(&vertex.position),
            normal: self.matrix.transform_vector(&vertex.normal),
            ..*vertex
        }
    }

    pub fn apply_point(&self, x: f32, y: f32) -> (f32, f32) {
        let p = self.matrix.transform_point(&Point3::new(x, y, 0.0));
        (p.x, p.y)
    }

    /// Uniform scale estimate of the planar part, used to pick segment counts.
    pub fn scale_estimate(&self) -> f32 {
        let m = &self.matrix;
        let det = m[(0, 0)] * m[(1, 1)] - m[(0, 1)] * m[(1, 0)];
        det.abs().sqrt()
    }

    pub fn approx_eq(&self, other: &Transform, epsilon: f32) -> bool {
        (self.matrix - other.matrix).abs().max() <= epsilon
    }

    fn rotation_matrix(theta: f32) -> Matrix4<f32> {
        Matrix4::new_rotation(Vector3::new(0.0, 0.0, theta))
    }

    fn translation_matrix(x: f32, y: f32) -> Matrix4<f32> {
        Matrix4::new_translation(&Vector3::new(x, y, 0.0))
    }

    fn scale_matrix(sx: f32, sy: f32) -> Matrix4<f32> {
        Matrix4::new_nonuniform_scaling(&Vector3::new(sx, sy, 1.0))
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Mul for Transform {
    type Output = Transform;

    fn mul(self, rhs: Transform) -> Transform {
        Transform::compose(&self, &rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, PI};

    fn assert_close(a: f32, b: f32) {
        assert!((a - b).abs() < 1e-5, "{} != {}", a, b);
    }

    fn sample_transforms() -> Vec<Transform> {
        let mut chained = Transform::identity();
        chained.rotate(0.7).translate(3.0, -1.0).scale(2.0, 0.5);
        vec![
            Transform::identity(),
            Transform::build(10.0, 20.0, 2.0, 3.0, 0.3),
            Transform::build(-4.0, 0.5, 1.0, 1.0, PI),
            chained,
        ]
    }

    #[test]
    fn test_identity_law() {
        let identity = Transform::identity();
        for t in sample_transforms() {
            assert!(Transform::compose(&identity, &t).approx_eq(&t, 1e-6));
            assert!(Transform::compose(&t, &identity).approx_eq(&t, 1e-6));
        }
    }

    #[test]
    fn test_translate_origin() {
        let mut t = Transform::identity();
        t.translate(4.0, -2.5);
        let v = t.apply(&Vertex::at(0.0, 0.0));
        assert_eq!(v.position, Point3::new(4.0, -2.5, 0.0));
    }

    #[test]
    fn test_build_order_is_scale_rotate_translate() {
        let t = Transform::build(10.0, 5.0, 2.0, 3.0, FRAC_PI_2);
        // (1, 0) scales to (2, 0), rotates to (0, 2), translates to (10, 7)
        let (x, y) = t.apply_point(1.0, 0.0);
        assert_close(x, 10.0);
        assert_close(y, 7.0);

        let mut manual = Transform::identity();
        manual.translate(10.0, 5.0).rotate(FRAC_PI_2).scale(2.0, 3.0);
        assert!(manual.approx_eq(&t, 1e-6));
    }

    #[test]
    fn test_compose_is_not_commutative() {
        let mut a = Transform::identity();
        a.translate(5.0, 0.0);
        let mut b = Transform::identity();
        b.rotate(FRAC_PI_2);

        let ab = Transform::compose(&a, &b);
        let ba = Transform::compose(&b, &a);
        assert!(!ab.approx_eq(&ba, 1e-3));

        // a · b rotates first, then translates
        let (x, y) = ab.apply_point(1.0, 0.0);
        assert_close(x, 5.0);
        assert_close(y, 1.0);
        assert!((a * b).approx_eq(&ab, 1e-6));
    }

    #[test]
    fn test_transform_by_matches_compose() {
        let a = Transform::build(1.0, 2.0, 1.5, 1.5, 0.4);
        let b = Transform::build(-3.0, 0.0, 1.0, 2.0, -1.1);
        let mut c = a;
        c.transform_by(&b);
        assert!(c.approx_eq(&Transform::compose(&a, &b), 1e-6));
    }

    #[test]
    fn test_normal_ignores_translation() {
        let mut t = Transform::identity();
        t.translate(100.0, 100.0).rotate(FRAC_PI_2);
        let v = t.apply(&Vertex::new(0.0, 0.0, 0.0, 1.0, 0.0, 0.0));
        assert_close(v.normal.x, 0.0);
        assert_close(v.normal.y, 1.0);
        assert_close(v.normal.z, 0.0);
    }

    #[test]
    fn test_identity_keeps_normal() {
        let v = Vertex::new(1.0, 2.0, 3.0, 0.0, 3.0, 4.0);
        assert_eq!(Transform::identity().apply(&v), v);

        let unit = Vertex::new(0.0, 0.0, 0.0, 0.6, 0.8, 0.0);
        assert_eq!(Transform::identity().apply(&unit).normal, unit.normal);
    }

    #[test]
    fn test_normal_follows_scale() {
        let t = Transform::build(7.0, 7.0, 2.0, 3.0, 0.0);
        let v = t.apply(&Vertex::new(0.0, 0.0, 0.0, 1.0, 1.0, 0.0));
        assert_close(v.normal.x, 2.0);
        assert_close(v.normal.y, 3.0);
    }

    #[test]
    fn test_copy_from() {
        let src = Transform::build(1.0, 1.0, 2.0, 2.0, 0.0);
        let mut dest = Transform::identity();
        dest.copy_from(&src);
        assert_eq!(dest, src);
    }

    #[test]
    fn test_scale_estimate() {
        assert_close(Transform::identity().scale_estimate(), 1.0);
        assert_close(Transform::build(3.0, 3.0, 4.0, 4.0, 1.0).scale_estimate(), 4.0);
    }
}
