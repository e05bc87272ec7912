use crate::error::{GeometryError, Result};

use super::transform::Transformation;
use super::{Point3, Vector3, TOLERANCE};

/// Computes the outward normal of a 3D polygon using Newell's method.
///
/// The normal points out of the face for counter-clockwise winding when viewed
/// from outside.
///
/// # Errors
///
/// Returns an error if the polygon has fewer than 3 vertices or is degenerate
/// (collinear or coincident points).
pub fn outward_normal(points: &[Point3]) -> Result<Vector3> {
    if points.len() < 3 {
        return Err(GeometryError::TooFewVertices.into());
    }
    let mut normal = Vector3::zeros();
    let n = points.len();
    for i in 0..n {
        let p = &points[i];
        let q = &points[(i + 1) % n];
        normal.x += (p.y - q.y) * (p.z + q.z);
        normal.y += (p.z - q.z) * (p.x + q.x);
        normal.z += (p.x - q.x) * (p.y + q.y);
    }
    let len = normal.norm();
    if len < TOLERANCE {
        return Err(GeometryError::Degenerate("polygon has no area".into()).into());
    }
    Ok(normal / len)
}

/// Computes the area of a planar 3D polygon.
///
/// # Errors
///
/// Returns an error if the polygon is degenerate.
pub fn area_3d(points: &[Point3]) -> Result<f64> {
    if points.len() < 3 {
        return Err(GeometryError::TooFewVertices.into());
    }
    let mut sum = Vector3::zeros();
    let n = points.len();
    let origin = points[0];
    for i in 1..n - 1 {
        let u = points[i] - origin;
        let v = points[i + 1] - origin;
        sum += u.cross(&v);
    }
    Ok(sum.norm() * 0.5)
}

/// Computes the vertex centroid of a polygon.
///
/// # Errors
///
/// Returns an error if the polygon is empty.
pub fn centroid(points: &[Point3]) -> Result<Point3> {
    if points.is_empty() {
        return Err(GeometryError::TooFewVertices.into());
    }
    let mut sum = Vector3::zeros();
    for pt in points {
        sum += pt.coords;
    }
    #[allow(clippy::cast_precision_loss)]
    Ok(Point3::from(sum / points.len() as f64))
}

/// Tilt of a polygon in degrees: the angle between its outward normal and
/// straight up.
///
/// 0 for an upward-facing roof, 90 for a vertical wall, 180 for a
/// downward-facing floor.
///
/// # Errors
///
/// Returns an error if the polygon is degenerate.
pub fn tilt_degrees(points: &[Point3]) -> Result<f64> {
    let normal = outward_normal(points)?;
    let cos_tilt = normal.dot(&Vector3::new(0.0, 0.0, 1.0)).clamp(-1.0, 1.0);
    Ok(cos_tilt.acos().to_degrees())
}

/// Rotates a vertex loop so it starts at the upper-left corner of the face.
///
/// "Upper left" is judged in face coordinates (maximum y, ties broken by
/// minimum x), giving a deterministic starting vertex regardless of how the
/// loop was produced. The winding order is unchanged. Degenerate input is
/// returned as-is.
#[must_use]
pub fn reorder_ulc(points: &[Point3]) -> Vec<Point3> {
    let Ok(transformation) = Transformation::align_face(points) else {
        return points.to_vec();
    };
    let face_points = transformation.inverse().apply_points(points);

    let mut best = 0;
    for (i, pt) in face_points.iter().enumerate().skip(1) {
        let b = &face_points[best];
        if pt.y > b.y + TOLERANCE || ((pt.y - b.y).abs() < TOLERANCE && pt.x < b.x - TOLERANCE) {
            best = i;
        }
    }
    if best == 0 {
        return points.to_vec();
    }
    let mut rotated = Vec::with_capacity(points.len());
    rotated.extend_from_slice(&points[best..]);
    rotated.extend_from_slice(&points[..best]);
    rotated
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn normal_of_ccw_square_points_up() {
        let pts = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let n = outward_normal(&pts).unwrap();
        assert_relative_eq!(n.z, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn area_of_wall() {
        // 10m wide, 3m tall wall in the xz plane
        let pts = vec![
            Point3::new(0.0, 0.0, 3.0),
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(10.0, 0.0, 0.0),
            Point3::new(10.0, 0.0, 3.0),
        ];
        assert_relative_eq!(area_3d(&pts).unwrap(), 30.0, epsilon = 1e-12);
    }

    #[test]
    fn tilt_of_vertical_wall_is_ninety() {
        let pts = vec![
            Point3::new(0.0, 0.0, 3.0),
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(10.0, 0.0, 0.0),
            Point3::new(10.0, 0.0, 3.0),
        ];
        assert_relative_eq!(tilt_degrees(&pts).unwrap(), 90.0, epsilon = 1e-9);
    }

    #[test]
    fn tilt_of_floor_is_one_eighty() {
        let pts = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
        ];
        assert_relative_eq!(tilt_degrees(&pts).unwrap(), 180.0, epsilon = 1e-9);
    }

    #[test]
    fn reorder_ulc_starts_at_top_left() {
        // wall in xz plane, loop starting at bottom-right
        let pts = vec![
            Point3::new(10.0, 0.0, 0.0),
            Point3::new(10.0, 0.0, 3.0),
            Point3::new(0.0, 0.0, 3.0),
            Point3::new(0.0, 0.0, 0.0),
        ];
        let reordered = reorder_ulc(&pts);
        assert_relative_eq!(reordered[0].x, 0.0, epsilon = 1e-9);
        assert_relative_eq!(reordered[0].z, 3.0, epsilon = 1e-9);
        assert_eq!(reordered.len(), 4);
    }

    #[test]
    fn degenerate_polygon_rejected() {
        let pts = vec![Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)];
        assert!(outward_normal(&pts).is_err());
    }
}
