use std::ops::Mul;

use crate::error::{GeometryError, Result};

use super::polygon_3d;
use super::{Matrix3, Matrix4, Point3, Vector3, TOLERANCE};

/// A rigid 4x4 transformation (rotation + translation).
///
/// Used to move between a space's local frame, the building frame, and a
/// per-surface face frame where the outward normal is +Z. Composable with `*`
/// and exactly invertible.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transformation {
    matrix: Matrix4,
}

impl Default for Transformation {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transformation {
    /// The identity transformation.
    #[must_use]
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
        }
    }

    /// A pure translation.
    #[must_use]
    pub fn translation(offset: Vector3) -> Self {
        Self {
            matrix: Matrix4::new_translation(&offset),
        }
    }

    /// A pure rotation about the origin.
    #[must_use]
    pub fn rotation(rotation: Matrix3) -> Self {
        let mut matrix = Matrix4::identity();
        matrix.fixed_view_mut::<3, 3>(0, 0).copy_from(&rotation);
        Self { matrix }
    }

    /// Builds a rotation whose +Z axis equals `z_prime`.
    ///
    /// For non-horizontal faces the x axis is horizontal (`up x z'`), so y
    /// points up when looking at the face from outside. Horizontal faces fall
    /// back to the global +X axis.
    ///
    /// # Errors
    ///
    /// Returns an error if `z_prime` has zero length.
    pub fn align_z_prime(z_prime: Vector3) -> Result<Self> {
        let len = z_prime.norm();
        if len < TOLERANCE {
            return Err(GeometryError::ZeroVector.into());
        }
        let z_axis = z_prime / len;
        let up = Vector3::new(0.0, 0.0, 1.0);

        let horizontal = up.cross(&z_axis);
        let x_axis = if horizontal.norm() < 1e-6 {
            Vector3::new(1.0, 0.0, 0.0)
        } else {
            horizontal.normalize()
        };
        let y_axis = z_axis.cross(&x_axis);

        Ok(Self::rotation(Matrix3::from_columns(&[
            x_axis, y_axis, z_axis,
        ])))
    }

    /// Builds the transformation from face coordinates to the input frame for
    /// a planar polygon.
    ///
    /// In face coordinates the polygon's outward normal is +Z, y points up,
    /// and the polygon's bounding-box minimum corner sits at the origin, so
    /// the face lies in the first quadrant of the z = 0 plane. The inverse
    /// transformation takes the polygon's vertices into face coordinates.
    ///
    /// # Errors
    ///
    /// Returns an error for degenerate input (fewer than 3 non-collinear
    /// vertices).
    pub fn align_face(vertices: &[Point3]) -> Result<Self> {
        let normal = polygon_3d::outward_normal(vertices)?;
        let align = Self::align_z_prime(normal)?;
        let aligned = align.inverse().apply_points(vertices);

        let mut x_min = aligned[0].x;
        let mut y_min = aligned[0].y;
        for pt in &aligned[1..] {
            x_min = x_min.min(pt.x);
            y_min = y_min.min(pt.y);
        }
        let anchor = Vector3::new(x_min, y_min, aligned[0].z);

        Ok(align * Self::translation(anchor))
    }

    /// The exact inverse of this rigid transformation.
    #[must_use]
    pub fn inverse(&self) -> Self {
        let rotation = self.rotation_part().transpose();
        let translation = -rotation * self.translation_part();
        let mut matrix = Matrix4::identity();
        matrix.fixed_view_mut::<3, 3>(0, 0).copy_from(&rotation);
        matrix.fixed_view_mut::<3, 1>(0, 3).copy_from(&translation);
        Self { matrix }
    }

    /// Applies the transformation to a point.
    #[must_use]
    pub fn apply_point(&self, point: &Point3) -> Point3 {
        self.matrix.transform_point(point)
    }

    /// Applies the rotation part only, for direction vectors.
    #[must_use]
    pub fn apply_vector(&self, vector: &Vector3) -> Vector3 {
        self.rotation_part() * vector
    }

    /// Applies the transformation to every point in a polygon.
    #[must_use]
    pub fn apply_points(&self, points: &[Point3]) -> Vec<Point3> {
        points.iter().map(|p| self.apply_point(p)).collect()
    }

    /// The 3x3 rotation block.
    #[must_use]
    pub fn rotation_part(&self) -> Matrix3 {
        self.matrix.fixed_view::<3, 3>(0, 0).into_owned()
    }

    /// The translation column.
    #[must_use]
    pub fn translation_part(&self) -> Vector3 {
        self.matrix.fixed_view::<3, 1>(0, 3).into_owned()
    }
}

impl Mul for Transformation {
    type Output = Transformation;

    fn mul(self, rhs: Transformation) -> Transformation {
        Transformation {
            matrix: self.matrix * rhs.matrix,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn wall() -> Vec<Point3> {
        // 10m x 3m wall in the xz plane, outward normal -y, counter-clockwise
        // when viewed from outside
        vec![
            Point3::new(0.0, 0.0, 3.0),
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(10.0, 0.0, 0.0),
            Point3::new(10.0, 0.0, 3.0),
        ]
    }

    #[test]
    fn align_face_round_trip() {
        let vertices = wall();
        let transformation = Transformation::align_face(&vertices).unwrap();
        let face = transformation.inverse().apply_points(&vertices);
        let back = transformation.apply_points(&face);
        for (orig, round) in vertices.iter().zip(&back) {
            assert_relative_eq!((orig - round).norm(), 0.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn align_face_flattens_to_z_zero() {
        let vertices = wall();
        let transformation = Transformation::align_face(&vertices).unwrap();
        let face = transformation.inverse().apply_points(&vertices);
        for pt in &face {
            assert_relative_eq!(pt.z, 0.0, epsilon = 1e-9);
            assert!(pt.x > -1e-9);
            assert!(pt.y > -1e-9);
        }
    }

    #[test]
    fn align_face_y_is_up_for_walls() {
        let vertices = wall();
        let transformation = Transformation::align_face(&vertices).unwrap();
        let up = transformation.apply_vector(&Vector3::new(0.0, 1.0, 0.0));
        assert_relative_eq!(up.z, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn align_face_rejects_degenerate() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        ];
        assert!(Transformation::align_face(&vertices).is_err());
    }

    #[test]
    fn composition_matches_sequential_application() {
        let a = Transformation::translation(Vector3::new(1.0, 2.0, 3.0));
        let b =
            Transformation::align_z_prime(Vector3::new(0.0, -1.0, 0.0)).unwrap();
        let p = Point3::new(0.5, 0.25, -1.0);
        let composed = (a * b).apply_point(&p);
        let sequential = a.apply_point(&b.apply_point(&p));
        assert_relative_eq!((composed - sequential).norm(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn inverse_composes_to_identity() {
        let t = Transformation::align_face(&wall()).unwrap();
        let id = t * t.inverse();
        let p = Point3::new(4.0, 5.0, 6.0);
        assert_relative_eq!((id.apply_point(&p) - p).norm(), 0.0, epsilon = 1e-9);
    }
}
