use crate::error::Result;
use crate::math::{clip_2d, polygon_2d, Point3, Transformation, EDGE_GAP, INTERSECT_TOL};
use crate::model::{SurfaceId, SurfaceStore, SurfaceType};

/// Splits a wall into disjoint fragments around its sub-surfaces.
///
/// Each sub-surface gets an expanded full-height mask strip in the wall's
/// face frame; overlapping masks merge. The wall is carved into the mask
/// pieces plus the remainder, the largest fragment keeps the wall's identity,
/// and
/// every other fragment becomes a new surface in the same space.
/// Sub-surfaces are reparented to whichever fragment contains their
/// reference vertex.
///
/// Inapplicable surfaces (not a wall, already paired, no sub-surfaces)
/// produce no fragments and no mutation.
pub struct SplitSurfaceForSubSurfaces {
    surface: SurfaceId,
}

impl SplitSurfaceForSubSurfaces {
    /// Creates a new `SplitSurfaceForSubSurfaces` operation.
    #[must_use]
    pub fn new(surface: SurfaceId) -> Self {
        Self { surface }
    }

    /// Executes the split, returning the newly created surfaces.
    ///
    /// # Errors
    ///
    /// Returns an error if the surface or a sub-surface is not found in the
    /// store, or the face frame cannot be built from degenerate geometry.
    pub fn execute(&self, store: &mut SurfaceStore) -> Result<Vec<SurfaceId>> {
        let data = store.surface(self.surface)?;
        if data.surface_type != SurfaceType::Wall
            || data.adjacent_surface.is_some()
            || data.sub_surfaces.is_empty()
        {
            return Ok(Vec::new());
        }
        let space = data.space;
        let children = data.sub_surfaces.clone();
        let vertices = data.vertices.clone();

        let face = Transformation::align_face(&vertices)?;
        let face_inverse = face.inverse();
        let mut parent_face = face_inverse.apply_points(&vertices);
        parent_face.reverse();

        let Some((_, _, parent_y_min, parent_y_max)) = polygon_2d::bounds_2d(&parent_face) else {
            return Ok(Vec::new());
        };

        // one expanded mask strip per sub-surface, merged where they touch;
        // the strip spans the full height of the wall so each fragment stays
        // a simple polygon with no interior holes
        let mut rectangles = Vec::new();
        for &child in &children {
            let points = face_inverse.apply_points(&store.sub_surface(child)?.vertices);
            let Some((x_min, x_max, _, _)) = polygon_2d::bounds_2d(&points) else {
                continue;
            };
            rectangles.push(expanded_rectangle(
                x_min,
                x_max,
                parent_y_min,
                parent_y_max,
                EDGE_GAP,
            ));
        }
        let masks = clip_2d::join_all(&rectangles, INTERSECT_TOL);

        let mut fragments = Vec::new();
        for mask in &masks {
            fragments.extend(clip_2d::intersection_regions(
                &parent_face,
                mask,
                INTERSECT_TOL,
            ));
        }
        fragments.extend(clip_2d::subtract(&parent_face, &masks, INTERSECT_TOL));
        fragments.sort_by(|a, b| {
            polygon_2d::signed_area_2d(b)
                .abs()
                .partial_cmp(&polygon_2d::signed_area_2d(a).abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        if fragments.is_empty() {
            return Ok(Vec::new());
        }

        let to_local = |fragment: &[Point3]| -> Vec<Point3> {
            let mut points = fragment.to_vec();
            points.reverse();
            face.apply_points(&points)
        };

        // the largest fragment keeps the wall's identity
        store.surface_mut(self.surface)?.vertices = to_local(&fragments[0]);
        let mut owners = vec![self.surface];
        let mut new_surfaces = Vec::new();
        for fragment in &fragments[1..] {
            let new_id = store.clone_surface(self.surface, space)?;
            for carried in store.surface(new_id)?.sub_surfaces.clone() {
                store.remove_sub_surface(carried)?;
            }
            store.surface_mut(new_id)?.vertices = to_local(fragment);
            owners.push(new_id);
            new_surfaces.push(new_id);
        }

        // reparent each sub-surface to the fragment containing its
        // reference vertex
        let mut reparented = 0_usize;
        for &child in &children {
            let reference = store.sub_surface(child)?.vertices[0];
            let point = face_inverse.apply_point(&reference);
            let target = fragments
                .iter()
                .position(|f| polygon_2d::point_in_polygon(&point, f, INTERSECT_TOL));
            let Some(index) = target else {
                continue;
            };
            reparented += 1;
            let owner = owners[index];
            if owner != self.surface {
                store.sub_surface_mut(child)?.surface = owner;
                store
                    .surface_mut(self.surface)?
                    .sub_surfaces
                    .retain(|c| *c != child);
                store.surface_mut(owner)?.sub_surfaces.push(child);
            }
        }
        if reparented != children.len() {
            log::warn!(
                "split reparented {} of {} sub-surfaces",
                reparented,
                children.len()
            );
        }

        Ok(new_surfaces)
    }
}

/// A clockwise mask rectangle, expanded on every side.
fn expanded_rectangle(x_min: f64, x_max: f64, y_min: f64, y_max: f64, expand: f64) -> Vec<Point3> {
    vec![
        Point3::new(x_min - expand, y_min - expand, 0.0),
        Point3::new(x_min - expand, y_max + expand, 0.0),
        Point3::new(x_max + expand, y_max + expand, 0.0),
        Point3::new(x_max + expand, y_min - expand, 0.0),
    ]
}
