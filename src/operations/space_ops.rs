use std::collections::HashSet;

use crate::error::Result;
use crate::math::{polygon_2d, polygon_3d, Point3, INTERSECT_TOL};
use crate::model::{SpaceId, SubSurfaceData, SurfaceData, SurfaceId, SurfaceStore, SurfaceType};
use crate::operations::adjacency::{unpair_surface, MatchSurfaces};
use crate::operations::intersection::ComputeIntersection;
use crate::operations::sub_adjacency::MatchSubSurfaces;

/// Opposing-normal threshold for space-level surface matching.
const OPPOSING_DOT: f64 = -0.98;

/// Pairs every partition shared by two spaces.
///
/// Two unpaired surfaces match when their building-frame normals oppose and
/// their vertex loops, one reversed, are circularly equal within tolerance.
/// Sub-surfaces of newly paired surfaces are then matched the same way.
pub struct MatchSpaces {
    space: SpaceId,
    other: SpaceId,
}

impl MatchSpaces {
    /// Creates a new `MatchSpaces` operation.
    #[must_use]
    pub fn new(space: SpaceId, other: SpaceId) -> Self {
        Self { space, other }
    }

    /// Executes the matching.
    ///
    /// # Errors
    ///
    /// Returns an error if either space or a surface is not found in the
    /// store.
    pub fn execute(&self, store: &mut SurfaceStore) -> Result<()> {
        if self.space == self.other {
            return Ok(());
        }
        let to_building_1 = store.space(self.space)?.transformation;
        let to_building_2 = store.space(self.other)?.transformation;

        for surface_1 in store.surfaces_in_space(self.space) {
            if store.surface(surface_1)?.adjacent_surface.is_some() {
                continue;
            }
            let building_1 = to_building_1.apply_points(&store.surface(surface_1)?.vertices);
            let Ok(normal_1) = polygon_3d::outward_normal(&building_1) else {
                continue;
            };
            let Ok(centroid_1) = polygon_3d::centroid(&building_1) else {
                continue;
            };
            for surface_2 in store.surfaces_in_space(self.other) {
                if store.surface(surface_2)?.adjacent_surface.is_some() {
                    continue;
                }
                let building_2 = to_building_2.apply_points(&store.surface(surface_2)?.vertices);
                let Ok(normal_2) = polygon_3d::outward_normal(&building_2) else {
                    continue;
                };
                if normal_1.dot(&normal_2) >= OPPOSING_DOT {
                    continue;
                }
                // coincident loops share a centroid, so cheap rejection first
                let Ok(centroid_2) = polygon_3d::centroid(&building_2) else {
                    continue;
                };
                if (centroid_1 - centroid_2).norm() > INTERSECT_TOL {
                    continue;
                }
                let mut reversed = building_2.clone();
                reversed.reverse();
                if !polygon_2d::circular_equal(&building_1, &reversed, INTERSECT_TOL) {
                    continue;
                }
                MatchSurfaces::new(surface_1, surface_2).execute(store)?;
                self.match_sub_surfaces(store, surface_1, surface_2)?;
                break;
            }
        }
        Ok(())
    }

    fn match_sub_surfaces(
        &self,
        store: &mut SurfaceStore,
        surface_1: SurfaceId,
        surface_2: SurfaceId,
    ) -> Result<()> {
        let to_building_1 = store.space(self.space)?.transformation;
        let to_building_2 = store.space(self.other)?.transformation;
        for child_1 in store.surface(surface_1)?.sub_surfaces.clone() {
            if store.sub_surface(child_1)?.adjacent_sub_surface.is_some() {
                continue;
            }
            let building_1 = to_building_1.apply_points(&store.sub_surface(child_1)?.vertices);
            for child_2 in store.surface(surface_2)?.sub_surfaces.clone() {
                if store.sub_surface(child_2)?.adjacent_sub_surface.is_some() {
                    continue;
                }
                let mut reversed =
                    to_building_2.apply_points(&store.sub_surface(child_2)?.vertices);
                reversed.reverse();
                if polygon_2d::circular_equal(&building_1, &reversed, INTERSECT_TOL) {
                    MatchSubSurfaces::new(child_1, child_2).execute(store)?;
                    break;
                }
            }
        }
        Ok(())
    }
}

/// Dissolves every pairing touching a space, at both levels.
pub struct UnmatchSpace {
    space: SpaceId,
}

impl UnmatchSpace {
    /// Creates a new `UnmatchSpace` operation.
    #[must_use]
    pub fn new(space: SpaceId) -> Self {
        Self { space }
    }

    /// Executes the unmatching.
    ///
    /// # Errors
    ///
    /// Returns an error if the space is not found in the store.
    pub fn execute(&self, store: &mut SurfaceStore) -> Result<()> {
        store.space(self.space)?;
        for surface in store.surfaces_in_space(self.space) {
            unpair_surface(store, surface);
        }
        Ok(())
    }
}

/// Intersects every surface of one space against every surface of another,
/// re-geometrizing overlaps until a fixed point.
///
/// Surfaces with sub-surfaces or pairings are skipped; attempted pairs are
/// memoized; remainder surfaces spawned by an intersection re-enter the
/// candidate lists on the next pass.
pub struct IntersectSpaces {
    space: SpaceId,
    other: SpaceId,
}

impl IntersectSpaces {
    /// Creates a new `IntersectSpaces` operation.
    #[must_use]
    pub fn new(space: SpaceId, other: SpaceId) -> Self {
        Self { space, other }
    }

    /// Executes the intersection sweep.
    ///
    /// # Errors
    ///
    /// Returns an error if either space or a surface is not found in the
    /// store.
    pub fn execute(&self, store: &mut SurfaceStore) -> Result<()> {
        if self.space == self.other {
            return Ok(());
        }
        store.space(self.space)?;
        store.space(self.other)?;

        let mut attempted: HashSet<(SurfaceId, SurfaceId)> = HashSet::new();
        loop {
            let candidates_1 = eligible_surfaces(store, self.space)?;
            let candidates_2 = eligible_surfaces(store, self.other)?;
            let mut changed = false;
            'sweep: for &surface_1 in &candidates_1 {
                for &surface_2 in &candidates_2 {
                    if !attempted.insert((surface_1, surface_2)) {
                        continue;
                    }
                    if ComputeIntersection::new(surface_1, surface_2)
                        .execute(store)?
                        .is_some()
                    {
                        // the vertex loops changed and remainder surfaces
                        // may have spawned, rebuild the candidate lists
                        changed = true;
                        break 'sweep;
                    }
                }
            }
            if !changed {
                return Ok(());
            }
        }
    }

}

/// Eligible surfaces of a space for intersection, largest first.
fn eligible_surfaces(store: &SurfaceStore, space: SpaceId) -> Result<Vec<SurfaceId>> {
    let mut eligible = Vec::new();
    for id in store.surfaces_in_space(space) {
        let data = store.surface(id)?;
        if data.adjacent_surface.is_some() || !data.sub_surfaces.is_empty() {
            continue;
        }
        eligible.push((id, data.gross_area().unwrap_or(0.0)));
    }
    eligible.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    Ok(eligible.into_iter().map(|(id, _)| id).collect())
}

/// Mirrors a surface (and its sub-surfaces) into another space and pairs
/// the mirror with the original at both levels.
///
/// The mirrored loop runs through both space transforms with reversed
/// winding; Floor and RoofCeiling types swap.
pub struct CreateAdjacentSurface {
    surface: SurfaceId,
    other_space: SpaceId,
}

impl CreateAdjacentSurface {
    /// Creates a new `CreateAdjacentSurface` operation.
    #[must_use]
    pub fn new(surface: SurfaceId, other_space: SpaceId) -> Self {
        Self {
            surface,
            other_space,
        }
    }

    /// Executes the mirroring. `None` means the surface already lives in the
    /// target space.
    ///
    /// # Errors
    ///
    /// Returns an error if the surface or either space is not found in the
    /// store, or the mirrored geometry is degenerate.
    pub fn execute(&self, store: &mut SurfaceStore) -> Result<Option<SurfaceId>> {
        let data = store.surface(self.surface)?;
        if data.space == self.other_space {
            return Ok(None);
        }
        let name = data.name.clone();
        let surface_type = data.surface_type;
        let children = data.sub_surfaces.clone();
        let to_building = store.space(data.space)?.transformation;
        let from_building = store.space(self.other_space)?.transformation.inverse();

        let mirror = |vertices: &[Point3]| -> Vec<Point3> {
            let mut building = to_building.apply_points(vertices);
            building.reverse();
            from_building.apply_points(&building)
        };

        let vertices = mirror(&store.surface(self.surface)?.vertices);
        let mut new_data =
            SurfaceData::new(format!("{name} Reversed"), vertices, self.other_space)?;
        new_data.surface_type = match surface_type {
            SurfaceType::Floor => SurfaceType::RoofCeiling,
            SurfaceType::RoofCeiling => SurfaceType::Floor,
            SurfaceType::Wall => SurfaceType::Wall,
        };
        let new_surface = store.add_surface(new_data);
        MatchSurfaces::new(self.surface, new_surface).execute(store)?;

        for child in children {
            let child_data = store.sub_surface(child)?;
            let child_name = child_data.name.clone();
            let child_type = child_data.sub_surface_type;
            let multiplier = child_data.multiplier;
            let child_vertices = mirror(&child_data.vertices);

            let mut new_child_data =
                SubSurfaceData::new(format!("{child_name} Reversed"), child_vertices, new_surface)?;
            new_child_data.multiplier = multiplier;
            let new_child = store.add_sub_surface(new_child_data)?;
            store.sub_surface_mut(new_child)?.sub_surface_type = child_type;
            MatchSubSurfaces::new(child, new_child).execute(store)?;
        }
        Ok(Some(new_surface))
    }
}
