use crate::error::Result;
use crate::math::{
    clip_2d, polygon_2d, polygon_3d, Point3, Transformation, AREA_TOL, INTERSECT_TOL, TOLERANCE,
};
use crate::model::{SurfaceData, SurfaceId, SurfaceStore};

/// Transient result of intersecting two surfaces across two spaces.
///
/// References the two (possibly re-geometrized) original surfaces plus the
/// surfaces newly spawned in each space to cover the non-overlapping
/// remainder. Not persisted in the store.
#[derive(Debug, Clone)]
pub struct SurfaceIntersection {
    surface_1: SurfaceId,
    surface_2: SurfaceId,
    new_surfaces_1: Vec<SurfaceId>,
    new_surfaces_2: Vec<SurfaceId>,
}

impl SurfaceIntersection {
    /// The first original surface.
    #[must_use]
    pub fn surface_1(&self) -> SurfaceId {
        self.surface_1
    }

    /// The second original surface.
    #[must_use]
    pub fn surface_2(&self) -> SurfaceId {
        self.surface_2
    }

    /// Surfaces spawned in the first surface's space.
    #[must_use]
    pub fn new_surfaces_1(&self) -> &[SurfaceId] {
        &self.new_surfaces_1
    }

    /// Surfaces spawned in the second surface's space.
    #[must_use]
    pub fn new_surfaces_2(&self) -> &[SurfaceId] {
        &self.new_surfaces_2
    }
}

/// Intersects two surfaces in different spaces and re-geometrizes both to
/// their shared overlap, spawning remainder surfaces in each space.
///
/// Inapplicable inputs (same space, existing sub-surfaces or pairings,
/// planes not reverse-equal, no overlap) report `None` rather than an error.
/// Newly spawned surfaces get freshly derived defaults; no boundary
/// condition or adjacency is carried over.
pub struct ComputeIntersection {
    surface_1: SurfaceId,
    surface_2: SurfaceId,
}

impl ComputeIntersection {
    /// Creates a new `ComputeIntersection` operation.
    #[must_use]
    pub fn new(surface_1: SurfaceId, surface_2: SurfaceId) -> Self {
        Self {
            surface_1,
            surface_2,
        }
    }

    /// Executes the intersection.
    ///
    /// # Errors
    ///
    /// Returns an error if either surface or space is not found in the
    /// store, or the face frame cannot be built from degenerate geometry.
    pub fn execute(&self, store: &mut SurfaceStore) -> Result<Option<SurfaceIntersection>> {
        let data_1 = store.surface(self.surface_1)?;
        let data_2 = store.surface(self.surface_2)?;
        if data_1.space == data_2.space
            || !data_1.sub_surfaces.is_empty()
            || !data_2.sub_surfaces.is_empty()
            || data_1.adjacent_surface.is_some()
            || data_2.adjacent_surface.is_some()
        {
            return Ok(None);
        }
        let space_1 = data_1.space;
        let space_2 = data_2.space;
        let name_1 = data_1.name.clone();
        let name_2 = data_2.name.clone();
        let to_building_1 = store.space(space_1)?.transformation;
        let to_building_2 = store.space(space_2)?.transformation;

        let building_1 = to_building_1.apply_points(&data_1.vertices);
        let plane_1 = data_1.plane()?.transformed(&to_building_1);
        let plane_2 = store
            .surface(self.surface_2)?
            .plane()?
            .transformed(&to_building_2);
        if !plane_1.reverse_equal(&plane_2, INTERSECT_TOL) {
            return Ok(None);
        }
        // squash any residual out-of-plane drift before clipping
        let building_2 = to_building_2.apply_points(&store.surface(self.surface_2)?.vertices);
        let building_2 = plane_1.project_points(&building_2);

        // clip in the first surface's face frame; its own loop must be
        // reversed to the clockwise convention, the opposing loop already is
        let face = Transformation::align_face(&building_1)?;
        let face_inverse = face.inverse();
        let mut face_1 = face_inverse.apply_points(&building_1);
        face_1.reverse();
        let face_2 = face_inverse.apply_points(&building_2);

        let area_1 = polygon_2d::signed_area_2d(&face_1).abs();
        let area_2 = polygon_2d::signed_area_2d(&face_2).abs();

        let Some(result) = clip_2d::intersect(&face_1, &face_2, INTERSECT_TOL) else {
            return Ok(None);
        };
        if (area_1 - result.area_1()).abs() > AREA_TOL {
            log::error!(
                "intersection lost {} m^2 of surface '{}'",
                area_1 - result.area_1(),
                name_1
            );
        }
        if (area_2 - result.area_2()).abs() > AREA_TOL {
            log::error!(
                "intersection lost {} m^2 of surface '{}'",
                area_2 - result.area_2(),
                name_2
            );
        }

        // both already match perfectly: common case, not re-geometrized
        if result.new_polygons_1().is_empty() && result.new_polygons_2().is_empty() {
            return Ok(Some(SurfaceIntersection {
                surface_1: self.surface_1,
                surface_2: self.surface_2,
                new_surfaces_1: Vec::new(),
                new_surfaces_2: Vec::new(),
            }));
        }

        let from_building_1 = to_building_1.inverse();
        let from_building_2 = to_building_2.inverse();
        let to_local_1 = |polygon: &[Point3], reverse: bool| -> Vec<Point3> {
            let mut points = polygon_2d::remove_collinear(polygon, TOLERANCE);
            if reverse {
                points.reverse();
            }
            polygon_3d::reorder_ulc(&from_building_1.apply_points(&face.apply_points(&points)))
        };
        let to_local_2 = |polygon: &[Point3], reverse: bool| -> Vec<Point3> {
            let mut points = polygon_2d::remove_collinear(polygon, TOLERANCE);
            if reverse {
                points.reverse();
            }
            polygon_3d::reorder_ulc(&from_building_2.apply_points(&face.apply_points(&points)))
        };

        store.surface_mut(self.surface_1)?.vertices = to_local_1(result.polygon_1(), true);
        store.surface_mut(self.surface_2)?.vertices = to_local_2(result.polygon_2(), false);

        let mut new_surfaces_1 = Vec::new();
        for (i, leftover) in result.new_polygons_1().iter().enumerate() {
            let vertices = to_local_1(leftover, true);
            let data = SurfaceData::new(format!("{} {}", name_1, i + 1), vertices, space_1)?;
            new_surfaces_1.push(store.add_surface(data));
        }
        let mut new_surfaces_2 = Vec::new();
        for (i, leftover) in result.new_polygons_2().iter().enumerate() {
            let vertices = to_local_2(leftover, false);
            let data = SurfaceData::new(format!("{} {}", name_2, i + 1), vertices, space_2)?;
            new_surfaces_2.push(store.add_surface(data));
        }

        Ok(Some(SurfaceIntersection {
            surface_1: self.surface_1,
            surface_2: self.surface_2,
            new_surfaces_1,
            new_surfaces_2,
        }))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{SpaceData, SpaceId};
    use approx::assert_relative_eq;

    fn horizontal(
        store: &mut SurfaceStore,
        space: SpaceId,
        x0: f64,
        x1: f64,
        reversed: bool,
    ) -> SurfaceId {
        let mut vertices = vec![
            Point3::new(x0, 0.0, 0.0),
            Point3::new(x1, 0.0, 0.0),
            Point3::new(x1, 1.0, 0.0),
            Point3::new(x0, 1.0, 0.0),
        ];
        if reversed {
            vertices.reverse();
        }
        store.add_surface(SurfaceData::new("surface", vertices, space).unwrap())
    }

    #[test]
    fn identical_reverse_wound_squares_match_perfectly() {
        let mut store = SurfaceStore::new();
        let space_a = store.add_space(SpaceData::new("a"));
        let space_b = store.add_space(SpaceData::new("b"));
        let a = horizontal(&mut store, space_a, 0.0, 1.0, false);
        let b = horizontal(&mut store, space_b, 0.0, 1.0, true);
        let before_a = store.surface(a).unwrap().vertices.clone();
        let before_b = store.surface(b).unwrap().vertices.clone();

        let result = ComputeIntersection::new(a, b)
            .execute(&mut store)
            .unwrap()
            .unwrap();
        assert!(result.new_surfaces_1().is_empty());
        assert!(result.new_surfaces_2().is_empty());
        assert_eq!(store.surface(a).unwrap().vertices, before_a);
        assert_eq!(store.surface(b).unwrap().vertices, before_b);
    }

    #[test]
    fn partial_overlap_regeometrizes_and_spawns_remainders() {
        let mut store = SurfaceStore::new();
        let space_a = store.add_space(SpaceData::new("a"));
        let space_b = store.add_space(SpaceData::new("b"));
        let a = horizontal(&mut store, space_a, 0.0, 2.0, false);
        let b = horizontal(&mut store, space_b, 1.0, 3.0, true);

        let result = ComputeIntersection::new(a, b)
            .execute(&mut store)
            .unwrap()
            .unwrap();
        assert_eq!(result.new_surfaces_1().len(), 1);
        assert_eq!(result.new_surfaces_2().len(), 1);

        // both originals shrink to the shared 1 m2 overlap
        assert_relative_eq!(
            store.surface(a).unwrap().gross_area().unwrap(),
            1.0,
            epsilon = 1e-6
        );
        assert_relative_eq!(
            store.surface(b).unwrap().gross_area().unwrap(),
            1.0,
            epsilon = 1e-6
        );
        // remainders cover the rest, in their own spaces
        let extra_a = store.surface(result.new_surfaces_1()[0]).unwrap();
        assert_eq!(extra_a.space, space_a);
        assert_relative_eq!(extra_a.gross_area().unwrap(), 1.0, epsilon = 1e-6);
        assert_eq!(extra_a.adjacent_surface, None);
    }

    #[test]
    fn same_space_is_inapplicable() {
        let mut store = SurfaceStore::new();
        let space = store.add_space(SpaceData::new("a"));
        let a = horizontal(&mut store, space, 0.0, 1.0, false);
        let b = horizontal(&mut store, space, 0.0, 1.0, true);
        assert!(ComputeIntersection::new(a, b)
            .execute(&mut store)
            .unwrap()
            .is_none());
    }

    #[test]
    fn non_reverse_equal_planes_are_inapplicable() {
        let mut store = SurfaceStore::new();
        let space_a = store.add_space(SpaceData::new("a"));
        let space_b = store.add_space(SpaceData::new("b"));
        let a = horizontal(&mut store, space_a, 0.0, 1.0, false);
        // same winding means the normals agree instead of opposing
        let b = horizontal(&mut store, space_b, 0.0, 1.0, false);
        assert!(ComputeIntersection::new(a, b)
            .execute(&mut store)
            .unwrap()
            .is_none());
    }

    #[test]
    fn paired_surface_is_inapplicable() {
        let mut store = SurfaceStore::new();
        let space_a = store.add_space(SpaceData::new("a"));
        let space_b = store.add_space(SpaceData::new("b"));
        let a = horizontal(&mut store, space_a, 0.0, 1.0, false);
        let b = horizontal(&mut store, space_b, 0.0, 1.0, true);
        store.surface_mut(a).unwrap().adjacent_surface = Some(b);
        assert!(ComputeIntersection::new(a, b)
            .execute(&mut store)
            .unwrap()
            .is_none());
    }
}
