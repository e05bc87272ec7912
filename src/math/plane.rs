use crate::error::{GeometryError, Result};

use super::transform::Transformation;
use super::{polygon_3d, Point3, Vector3, TOLERANCE};

/// Angular slack for plane normal comparisons.
const NORMAL_TOL: f64 = 1e-4;

/// An infinite plane defined by an origin point and a unit normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    origin: Point3,
    normal: Vector3,
}

impl Plane {
    /// Creates a plane from an origin and a normal vector.
    ///
    /// # Errors
    ///
    /// Returns an error if the normal vector is zero-length.
    pub fn new(origin: Point3, normal: Vector3) -> Result<Self> {
        let len = normal.norm();
        if len < TOLERANCE {
            return Err(GeometryError::ZeroVector.into());
        }
        Ok(Self {
            origin,
            normal: normal / len,
        })
    }

    /// Creates the plane containing a planar polygon, with the polygon's
    /// outward normal.
    ///
    /// # Errors
    ///
    /// Returns an error for degenerate input.
    pub fn from_polygon(vertices: &[Point3]) -> Result<Self> {
        let normal = polygon_3d::outward_normal(vertices)?;
        Ok(Self {
            origin: vertices[0],
            normal,
        })
    }

    /// The plane's origin point.
    #[must_use]
    pub fn origin(&self) -> Point3 {
        self.origin
    }

    /// The plane's unit normal.
    #[must_use]
    pub fn normal(&self) -> Vector3 {
        self.normal
    }

    /// Signed distance from a point to the plane, positive on the normal side.
    #[must_use]
    pub fn signed_distance(&self, point: &Point3) -> f64 {
        (point - self.origin).dot(&self.normal)
    }

    /// Tests whether two planes occupy the same location with opposite
    /// normals, within `tol` (in meters).
    ///
    /// This is the geometric test for "the same wall seen from both sides".
    #[must_use]
    pub fn reverse_equal(&self, other: &Plane, tol: f64) -> bool {
        if self.normal.dot(&other.normal) > -(1.0 - NORMAL_TOL) {
            return false;
        }
        self.signed_distance(&other.origin).abs() <= tol
            && other.signed_distance(&self.origin).abs() <= tol
    }

    /// Orthogonal projection of a point onto the plane.
    #[must_use]
    pub fn project(&self, point: &Point3) -> Point3 {
        point - self.signed_distance(point) * self.normal
    }

    /// Orthogonal projection of a polygon onto the plane.
    #[must_use]
    pub fn project_points(&self, points: &[Point3]) -> Vec<Point3> {
        points.iter().map(|p| self.project(p)).collect()
    }

    /// The image of this plane under a rigid transformation.
    #[must_use]
    pub fn transformed(&self, transformation: &Transformation) -> Plane {
        Plane {
            origin: transformation.apply_point(&self.origin),
            normal: transformation.apply_vector(&self.normal),
        }
    }
}
