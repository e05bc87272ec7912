use super::{Point3, TOLERANCE};

/// Computes the signed area of a polygon in the XY plane (shoelace formula).
///
/// Positive for counter-clockwise, negative for clockwise.
#[must_use]
pub fn signed_area_2d(points: &[Point3]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        sum += points[i].x * points[j].y - points[j].x * points[i].y;
    }
    sum * 0.5
}

/// Rotates a closed polygon so it starts at the leftmost vertex (smallest x),
/// breaking ties by smallest y. Ensures deterministic output for tests.
#[must_use]
pub fn rotate_to_canonical_start(points: &[Point3]) -> Vec<Point3> {
    if points.len() < 2 {
        return points.to_vec();
    }
    let mut best = 0;
    for (i, pt) in points.iter().enumerate().skip(1) {
        let b = &points[best];
        if pt.x < b.x - TOLERANCE || (pt.x - b.x).abs() < TOLERANCE && pt.y < b.y {
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

/// Axis-aligned bounds of a polygon in the XY plane.
///
/// Returns `(x_min, x_max, y_min, y_max)`, or `None` for an empty input.
#[must_use]
pub fn bounds_2d(points: &[Point3]) -> Option<(f64, f64, f64, f64)> {
    let first = points.first()?;
    let mut x_min = first.x;
    let mut x_max = first.x;
    let mut y_min = first.y;
    let mut y_max = first.y;
    for pt in &points[1..] {
        x_min = x_min.min(pt.x);
        x_max = x_max.max(pt.x);
        y_min = y_min.min(pt.y);
        y_max = y_max.max(pt.y);
    }
    Some((x_min, x_max, y_min, y_max))
}

/// Tests whether a point lies inside (or within `tol` of the boundary of)
/// a polygon in the XY plane.
///
/// The point must also lie within `tol` of the z = 0 plane, since callers
/// operate in face coordinates where the polygon is flat.
#[must_use]
pub fn point_in_polygon(point: &Point3, polygon: &[Point3], tol: f64) -> bool {
    if polygon.len() < 3 {
        return false;
    }
    if point.z.abs() > tol {
        return false;
    }

    // boundary proximity counts as containment
    let n = polygon.len();
    for i in 0..n {
        let j = (i + 1) % n;
        if distance_point_segment_2d(point, &polygon[i], &polygon[j]) <= tol {
            return true;
        }
    }

    // ray cast for strict interior
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let pi = &polygon[i];
        let pj = &polygon[j];
        if ((pi.y > point.y) != (pj.y > point.y))
            && (point.x < (pj.x - pi.x) * (point.y - pi.y) / (pj.y - pi.y) + pi.x)
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Distance from a point to a line segment, measured in the XY plane.
#[must_use]
pub fn distance_point_segment_2d(point: &Point3, a: &Point3, b: &Point3) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx * dx + dy * dy;
    let (cx, cy) = if len_sq < TOLERANCE {
        (a.x, a.y)
    } else {
        let t = ((point.x - a.x) * dx + (point.y - a.y) * dy) / len_sq;
        let t = t.clamp(0.0, 1.0);
        (a.x + t * dx, a.y + t * dy)
    };
    let ex = point.x - cx;
    let ey = point.y - cy;
    (ex * ex + ey * ey).sqrt()
}

/// Tests whether two vertex loops describe the same polygon, allowing the
/// second loop to start at any vertex.
///
/// Order must match once the starting offset is chosen; this is the geometric
/// equality test used by space-level surface matching, where two loops is the
/// same physical boundary but serialization may have rotated it.
#[must_use]
pub fn circular_equal(a: &[Point3], b: &[Point3], tol: f64) -> bool {
    let n = a.len();
    if n != b.len() {
        return false;
    }
    if n == 0 {
        return true;
    }
    for offset in 0..n {
        let mut all_equal = true;
        for i in 0..n {
            let pa = &a[i];
            let pb = &b[(i + offset) % n];
            if (pa - pb).norm() > tol {
                all_equal = false;
                break;
            }
        }
        if all_equal {
            return true;
        }
    }
    false
}

/// Removes vertices that are collinear with their neighbors, within `tol`.
///
/// Keeps at least a triangle; returns the input unchanged if removal would
/// degenerate the loop.
#[must_use]
pub fn remove_collinear(points: &[Point3], tol: f64) -> Vec<Point3> {
    let n = points.len();
    if n <= 3 {
        return points.to_vec();
    }

    let mut result = Vec::with_capacity(n);
    for i in 0..n {
        let prev = &points[(i + n - 1) % n];
        let curr = &points[i];
        let next = &points[(i + 1) % n];
        let u = curr - prev;
        let v = next - prev;
        if u.cross(&v).norm() > tol {
            result.push(*curr);
        }
    }

    if result.len() < 3 {
        return points.to_vec();
    }
    result
}
