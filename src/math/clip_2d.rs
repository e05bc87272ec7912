use i_overlay::core::fill_rule::FillRule;
use i_overlay::core::overlay_rule::OverlayRule;
use i_overlay::float::single::SingleFloatOverlay;

use super::polygon_2d::{rotate_to_canonical_start, signed_area_2d};
use super::{triangulate, Point3};

/// Result of intersecting two coplanar polygons in a shared face frame.
///
/// `polygon_1`/`polygon_2` hold the (shared) largest intersection region; the
/// per-side lists hold every leftover region of the corresponding input, so
/// that `polygon_n` plus `new_polygons_n` exactly covers input `n`.
#[derive(Debug, Clone)]
pub struct IntersectionResult {
    polygon_1: Vec<Point3>,
    polygon_2: Vec<Point3>,
    new_polygons_1: Vec<Vec<Point3>>,
    new_polygons_2: Vec<Vec<Point3>>,
}

impl IntersectionResult {
    /// The intersection region, as seen by the first input.
    #[must_use]
    pub fn polygon_1(&self) -> &[Point3] {
        &self.polygon_1
    }

    /// The intersection region, as seen by the second input.
    #[must_use]
    pub fn polygon_2(&self) -> &[Point3] {
        &self.polygon_2
    }

    /// Leftover regions of the first input (input minus intersection).
    #[must_use]
    pub fn new_polygons_1(&self) -> &[Vec<Point3>] {
        &self.new_polygons_1
    }

    /// Leftover regions of the second input.
    #[must_use]
    pub fn new_polygons_2(&self) -> &[Vec<Point3>] {
        &self.new_polygons_2
    }

    /// Total area covered on the first input's side.
    #[must_use]
    pub fn area_1(&self) -> f64 {
        signed_area_2d(&self.polygon_1).abs()
            + self
                .new_polygons_1
                .iter()
                .map(|p| signed_area_2d(p).abs())
                .sum::<f64>()
    }

    /// Total area covered on the second input's side.
    #[must_use]
    pub fn area_2(&self) -> f64 {
        signed_area_2d(&self.polygon_2).abs()
            + self
                .new_polygons_2
                .iter()
                .map(|p| signed_area_2d(p).abs())
                .sum::<f64>()
    }
}

type Path = Vec<[f64; 2]>;
type Shape = Vec<Path>;

fn to_path(points: &[Point3]) -> Path {
    points.iter().map(|p| [p.x, p.y]).collect()
}

fn path_to_points(path: &[[f64; 2]]) -> Vec<Point3> {
    path.iter().map(|p| Point3::new(p[0], p[1], 0.0)).collect()
}

fn path_area(path: &[[f64; 2]]) -> f64 {
    let n = path.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        sum += path[i][0] * path[j][1] - path[j][0] * path[i][1];
    }
    (sum * 0.5).abs()
}

/// Net area of a shape: outer contour minus holes.
fn shape_area(shape: &Shape) -> f64 {
    let Some(outer) = shape.first() else {
        return 0.0;
    };
    let holes: f64 = shape[1..].iter().map(|c| path_area(c)).sum();
    path_area(outer) - holes
}

/// Normalizes an output contour to the clockwise convention the callers use,
/// starting at a canonical vertex.
fn to_clockwise_points(path: &[[f64; 2]]) -> Vec<Point3> {
    let mut points = path_to_points(path);
    if signed_area_2d(&points) > 0.0 {
        points.reverse();
    }
    rotate_to_canonical_start(&points)
}

/// Converts a clip-result shape into hole-free polygons.
///
/// A shape without holes maps to its outer contour. Holes cannot be expressed
/// by the surface model, so holed shapes fall back to triangulation.
fn shape_to_polygons(shape: &Shape, min_area: f64) -> Vec<Vec<Point3>> {
    let Some(outer) = shape.first() else {
        return Vec::new();
    };
    if shape.len() == 1 {
        if path_area(outer) < min_area {
            return Vec::new();
        }
        return vec![to_clockwise_points(outer)];
    }

    let outer_points = path_to_points(outer);
    let holes: Vec<Vec<Point3>> = shape[1..].iter().map(|c| path_to_points(c)).collect();
    match triangulate::triangulate(&outer_points, &holes) {
        Ok(triangles) => triangles
            .iter()
            .map(|t| to_clockwise_points(&to_path(t)))
            .filter(|p| signed_area_2d(p).abs() >= min_area)
            .collect(),
        Err(e) => {
            log::error!("failed to partition holed clip result: {e}");
            Vec::new()
        }
    }
}

/// Computes the Boolean intersection of two coplanar polygons, both expressed
/// in the same face frame with clockwise winding.
///
/// Returns `None` when the polygons do not overlap within tolerance, or when
/// the largest overlap region is degenerate. Leftover regions smaller than
/// `tol`² are discarded.
#[must_use]
pub fn intersect(
    polygon_1: &[Point3],
    polygon_2: &[Point3],
    tol: f64,
) -> Option<IntersectionResult> {
    if polygon_1.len() < 3 || polygon_2.len() < 3 {
        return None;
    }
    let min_area = tol * tol;

    let subject: Vec<Path> = vec![to_path(polygon_1)];
    let clip: Vec<Path> = vec![to_path(polygon_2)];

    let mut overlap = subject.overlay(&clip, OverlayRule::Intersect, FillRule::EvenOdd);
    if overlap.is_empty() {
        return None;
    }

    if overlap.len() > 1 {
        log::info!("intersection has {} separate regions", overlap.len());
        overlap.sort_by(|a, b| {
            shape_area(b)
                .partial_cmp(&shape_area(a))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    }

    // the largest region becomes the shared intersection polygon
    let largest = &overlap[0];
    if largest.len() > 1 {
        log::error!("largest intersection region has inner loops");
        return None;
    }
    if shape_area(largest) < min_area {
        log::info!(
            "largest intersection region has very small area of {} m^2",
            shape_area(largest)
        );
        return None;
    }
    let intersection = to_clockwise_points(&largest[0]);

    let mut new_polygons_1 = Vec::new();
    let mut new_polygons_2 = Vec::new();

    // extra disjoint overlap regions belong to the leftovers of both sides
    for shape in &overlap[1..] {
        for polygon in shape_to_polygons(shape, min_area) {
            new_polygons_1.push(polygon.clone());
            new_polygons_2.push(polygon);
        }
    }

    // each input's remainder outside the other polygon
    for shape in &subject.overlay(&clip, OverlayRule::Difference, FillRule::EvenOdd) {
        new_polygons_1.extend(shape_to_polygons(shape, min_area));
    }
    for shape in &clip.overlay(&subject, OverlayRule::Difference, FillRule::EvenOdd) {
        new_polygons_2.extend(shape_to_polygons(shape, min_area));
    }

    Some(IntersectionResult {
        polygon_1: intersection.clone(),
        polygon_2: intersection,
        new_polygons_1,
        new_polygons_2,
    })
}

/// Every hole-free region of the Boolean intersection of two polygons.
///
/// Unlike [`intersect`], no region is singled out and no leftovers are
/// computed; the splitting engine uses this to carve mask pieces out of a
/// parent polygon.
#[must_use]
pub fn intersection_regions(
    polygon_1: &[Point3],
    polygon_2: &[Point3],
    tol: f64,
) -> Vec<Vec<Point3>> {
    if polygon_1.len() < 3 || polygon_2.len() < 3 {
        return Vec::new();
    }
    let min_area = tol * tol;

    let subject: Vec<Path> = vec![to_path(polygon_1)];
    let clip: Vec<Path> = vec![to_path(polygon_2)];
    let overlap = subject.overlay(&clip, OverlayRule::Intersect, FillRule::EvenOdd);

    let mut result = Vec::new();
    for shape in &overlap {
        result.extend(shape_to_polygons(shape, min_area));
    }
    result
}

/// Unions two polygons into one, if they overlap (or touch) and the union is a
/// single hole-free region of meaningful area.
#[must_use]
pub fn join(polygon_1: &[Point3], polygon_2: &[Point3], tol: f64) -> Option<Vec<Point3>> {
    if polygon_1.len() < 3 || polygon_2.len() < 3 {
        return None;
    }

    let subject: Vec<Path> = vec![to_path(polygon_1)];
    let clip: Vec<Path> = vec![to_path(polygon_2)];
    let union = subject.overlay(&clip, OverlayRule::Union, FillRule::EvenOdd);

    // a union that did not merge, or merged into a ring, is not usable
    if union.len() != 1 {
        return None;
    }
    let shape = &union[0];
    if shape.len() > 1 {
        log::error!("union has inner loops");
        return None;
    }
    if shape_area(shape) < tol * tol {
        log::info!("union has very small area of {} m^2", shape_area(shape));
        return None;
    }

    Some(to_clockwise_points(&shape[0]))
}

/// Unions an arbitrary collection of polygons, merging every connected group
/// of overlapping polygons into one.
///
/// Polygons that overlap nothing are returned unchanged. This is the
/// mask-merging primitive of the splitting engine.
#[must_use]
pub fn join_all(polygons: &[Vec<Point3>], tol: f64) -> Vec<Vec<Point3>> {
    let n = polygons.len();
    if n <= 1 {
        return polygons.to_vec();
    }

    // adjacency by pairwise joinability, then merge connected components
    let mut adjacent = vec![vec![false; n]; n];
    for i in 0..n {
        adjacent[i][i] = true;
        for j in i + 1..n {
            if join(&polygons[i], &polygons[j], tol).is_some() {
                adjacent[i][j] = true;
                adjacent[j][i] = true;
            }
        }
    }

    let mut result = Vec::new();
    let mut visited = vec![false; n];
    for start in 0..n {
        if visited[start] {
            continue;
        }
        let mut component = Vec::new();
        let mut stack = vec![start];
        visited[start] = true;
        while let Some(i) = stack.pop() {
            component.push(i);
            for j in 0..n {
                if adjacent[i][j] && !visited[j] {
                    visited[j] = true;
                    stack.push(j);
                }
            }
        }
        component.sort_unstable();

        let mut merged = polygons[component[0]].clone();
        for &i in &component[1..] {
            match join(&merged, &polygons[i], tol) {
                Some(joined) => merged = joined,
                None => log::error!("expected polygons to join together"),
            }
        }
        result.push(merged);
    }

    result
}

/// Subtracts hole polygons from a polygon, returning the remaining fragments.
///
/// Fragments smaller than `tol`² are discarded; fragments the clipper reports
/// with inner loops are partitioned by triangulation.
#[must_use]
pub fn subtract(polygon: &[Point3], holes: &[Vec<Point3>], tol: f64) -> Vec<Vec<Point3>> {
    if polygon.len() < 3 {
        return Vec::new();
    }
    let min_area = tol * tol;

    let subject: Vec<Path> = vec![to_path(polygon)];
    let clip: Vec<Path> = holes
        .iter()
        .filter(|h| h.len() >= 3)
        .map(|h| to_path(h))
        .collect();
    if clip.is_empty() {
        return vec![polygon.to_vec()];
    }

    let difference = subject.overlay(&clip, OverlayRule::Difference, FillRule::EvenOdd);

    let mut result = Vec::new();
    for shape in &difference {
        result.extend(shape_to_polygons(shape, min_area));
    }
    result
}
