use crate::error::Result;
use crate::model::{ConstructionId, SubSurfaceId, SurfaceId, SurfaceStore};

/// A resolved construction plus how far the defaulting search travelled to
/// find it: 0 for an explicit assignment, 1 via the space's default set,
/// 2 via the building-wide set.
pub type ConstructionSearch = (ConstructionId, u32);

/// Resolves a surface's own `(construction, search distance)`, without
/// consulting the paired side.
///
/// # Errors
///
/// Returns an error if the surface or its space is not found in the store.
pub fn surface_construction_search(
    store: &SurfaceStore,
    id: SurfaceId,
) -> Result<Option<ConstructionSearch>> {
    let data = store.surface(id)?;
    if let Some(construction) = data.construction {
        return Ok(Some((construction, 0)));
    }
    let space = store.space(data.space)?;
    if let Some(set) = space.default_construction_set {
        let set = store.construction_set(set)?;
        if let Some(construction) = set.for_surface(data.surface_type, data.boundary_condition) {
            return Ok(Some((construction, 1)));
        }
    }
    if let Some(set) = store.default_construction_set {
        let set = store.construction_set(set)?;
        if let Some(construction) = set.for_surface(data.surface_type, data.boundary_condition) {
            return Ok(Some((construction, 2)));
        }
    }
    Ok(None)
}

/// Resolves a sub-surface's own `(construction, search distance)`.
///
/// # Errors
///
/// Returns an error if the sub-surface, its parent surface, or its space is
/// not found in the store.
pub fn sub_surface_construction_search(
    store: &SurfaceStore,
    id: SubSurfaceId,
) -> Result<Option<ConstructionSearch>> {
    let data = store.sub_surface(id)?;
    if let Some(construction) = data.construction {
        return Ok(Some((construction, 0)));
    }
    let parent = store.surface(data.surface)?;
    let space = store.space(parent.space)?;
    if let Some(set) = space.default_construction_set {
        let set = store.construction_set(set)?;
        if let Some(construction) = set.for_sub_surface(data.sub_surface_type) {
            return Ok(Some((construction, 1)));
        }
    }
    if let Some(set) = store.default_construction_set {
        let set = store.construction_set(set)?;
        if let Some(construction) = set.for_sub_surface(data.sub_surface_type) {
            return Ok(Some((construction, 2)));
        }
    }
    Ok(None)
}

/// Reconciles the two sides of a pairing into one construction.
fn reconcile(
    store: &SurfaceStore,
    local: Option<ConstructionSearch>,
    remote: Option<ConstructionSearch>,
) -> Option<ConstructionId> {
    match (local, remote) {
        (None, None) => None,
        (Some((construction, _)), None) | (None, Some((construction, _))) => Some(construction),
        (Some((local_c, local_d)), Some((remote_c, remote_d))) => {
            if local_c == remote_c {
                return Some(local_c);
            }
            if local_d < remote_d {
                return Some(local_c);
            }
            if remote_d < local_d {
                return Some(remote_c);
            }
            let reversed = match (store.construction(local_c), store.construction(remote_c)) {
                (Ok(a), Ok(b)) => a.reverse_equal_layers(b),
                _ => false,
            };
            if !reversed {
                log::info!("constructions of a paired surface do not reconcile, keeping the local side");
            }
            // reverse-layer pairs are interchangeable; otherwise the local
            // side stands in as a conservative fallback
            Some(local_c)
        }
    }
}

/// Resolves the effective construction of a surface.
///
/// When the surface is paired, both sides' search results are reconciled:
/// identical constructions agree trivially, a strictly shorter search
/// distance wins, reverse-layer equivalents are interchangeable, and an
/// irreconcilable tie keeps the local side.
pub struct ResolveSurfaceConstruction {
    surface: SurfaceId,
}

impl ResolveSurfaceConstruction {
    /// Creates a new `ResolveSurfaceConstruction` operation.
    #[must_use]
    pub fn new(surface: SurfaceId) -> Self {
        Self { surface }
    }

    /// Executes the resolution. `None` means no construction was found on
    /// either side.
    ///
    /// # Errors
    ///
    /// Returns an error if the surface or its space is not found in the
    /// store.
    pub fn execute(&self, store: &SurfaceStore) -> Result<Option<ConstructionId>> {
        let local = surface_construction_search(store, self.surface)?;
        let partner = store.surface(self.surface)?.adjacent_surface;
        let remote = match partner.filter(|p| *p != self.surface) {
            Some(partner) => surface_construction_search(store, partner)?,
            None => None,
        };
        Ok(reconcile(store, local, remote))
    }
}

/// Resolves the effective construction of a sub-surface, with the same
/// pairing reconciliation as [`ResolveSurfaceConstruction`].
pub struct ResolveSubSurfaceConstruction {
    sub_surface: SubSurfaceId,
}

impl ResolveSubSurfaceConstruction {
    /// Creates a new `ResolveSubSurfaceConstruction` operation.
    #[must_use]
    pub fn new(sub_surface: SubSurfaceId) -> Self {
        Self { sub_surface }
    }

    /// Executes the resolution.
    ///
    /// # Errors
    ///
    /// Returns an error if the sub-surface or one of its ancestors is not
    /// found in the store.
    pub fn execute(&self, store: &SurfaceStore) -> Result<Option<ConstructionId>> {
        let local = sub_surface_construction_search(store, self.sub_surface)?;
        let partner = store.sub_surface(self.sub_surface)?.adjacent_sub_surface;
        let remote = match partner.filter(|p| *p != self.sub_surface) {
            Some(partner) => sub_surface_construction_search(store, partner)?,
            None => None,
        };
        Ok(reconcile(store, local, remote))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;
    use crate::model::{
        ConstructionData, ConstructionSetData, SpaceData, SpaceId, SurfaceData,
    };
    use crate::operations::adjacency::MatchSurfaces;
    use crate::operations::sub_adjacency::MatchSubSurfaces;

    fn wall(store: &mut SurfaceStore, space: SpaceId) -> SurfaceId {
        let vertices = vec![
            Point3::new(0.0, 0.0, 3.0),
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(10.0, 0.0, 0.0),
            Point3::new(10.0, 0.0, 3.0),
        ];
        store.add_surface(SurfaceData::new("wall", vertices, space).unwrap())
    }

    #[test]
    fn explicit_assignment_has_distance_zero() {
        let mut store = SurfaceStore::new();
        let space = store.add_space(SpaceData::new("space"));
        let surface = wall(&mut store, space);
        let c = store.add_construction(ConstructionData::new("c", vec!["brick".into()]));
        store.surface_mut(surface).unwrap().construction = Some(c);
        assert_eq!(
            surface_construction_search(&store, surface).unwrap(),
            Some((c, 0))
        );
    }

    #[test]
    fn space_set_beats_building_set() {
        let mut store = SurfaceStore::new();
        let space = store.add_space(SpaceData::new("space"));
        let surface = wall(&mut store, space);

        let near = store.add_construction(ConstructionData::new("near", vec!["brick".into()]));
        let far = store.add_construction(ConstructionData::new("far", vec!["block".into()]));
        let mut space_set = ConstructionSetData::new("space set");
        space_set.exterior.wall = Some(near);
        let space_set = store.add_construction_set(space_set);
        let mut building_set = ConstructionSetData::new("building set");
        building_set.exterior.wall = Some(far);
        let building_set = store.add_construction_set(building_set);

        store.space_mut(space).unwrap().default_construction_set = Some(space_set);
        store.default_construction_set = Some(building_set);

        assert_eq!(
            surface_construction_search(&store, surface).unwrap(),
            Some((near, 1))
        );
        store.space_mut(space).unwrap().default_construction_set = None;
        assert_eq!(
            surface_construction_search(&store, surface).unwrap(),
            Some((far, 2))
        );
    }

    #[test]
    fn shorter_search_distance_wins_across_pairing() {
        let mut store = SurfaceStore::new();
        let space_a = store.add_space(SpaceData::new("a"));
        let space_b = store.add_space(SpaceData::new("b"));
        let left = wall(&mut store, space_a);
        let right = wall(&mut store, space_b);
        MatchSurfaces::new(left, right).execute(&mut store).unwrap();

        let explicit = store.add_construction(ConstructionData::new("explicit", vec!["gyp".into()]));
        let defaulted = store.add_construction(ConstructionData::new("defaulted", vec!["brick".into()]));
        store.surface_mut(right).unwrap().construction = Some(explicit);
        let mut set = ConstructionSetData::new("set");
        set.interior.wall = Some(defaulted);
        let set = store.add_construction_set(set);
        store.space_mut(space_a).unwrap().default_construction_set = Some(set);

        // the remote explicit assignment outranks the local defaulted one
        assert_eq!(
            ResolveSurfaceConstruction::new(left)
                .execute(&store)
                .unwrap(),
            Some(explicit)
        );
    }

    #[test]
    fn reverse_layer_tie_returns_local_side() {
        let mut store = SurfaceStore::new();
        let space_a = store.add_space(SpaceData::new("a"));
        let space_b = store.add_space(SpaceData::new("b"));
        let left = wall(&mut store, space_a);
        let right = wall(&mut store, space_b);
        MatchSurfaces::new(left, right).execute(&mut store).unwrap();

        let forward = store.add_construction(ConstructionData::new(
            "forward",
            vec!["gyp".into(), "ins".into(), "brick".into()],
        ));
        let backward = store.add_construction(ConstructionData::new(
            "backward",
            vec!["brick".into(), "ins".into(), "gyp".into()],
        ));
        store.surface_mut(left).unwrap().construction = Some(forward);
        store.surface_mut(right).unwrap().construction = Some(backward);

        assert_eq!(
            ResolveSurfaceConstruction::new(left)
                .execute(&store)
                .unwrap(),
            Some(forward)
        );
        assert_eq!(
            ResolveSurfaceConstruction::new(right)
                .execute(&store)
                .unwrap(),
            Some(backward)
        );
    }

    #[test]
    fn sub_surface_resolution_reconciles_across_pairing() {
        let mut store = SurfaceStore::new();
        let space_a = store.add_space(SpaceData::new("a"));
        let space_b = store.add_space(SpaceData::new("b"));
        let left = wall(&mut store, space_a);
        let right = wall(&mut store, space_b);
        MatchSurfaces::new(left, right).execute(&mut store).unwrap();

        let window_vertices = vec![
            Point3::new(1.0, 0.0, 2.0),
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(2.0, 0.0, 1.0),
            Point3::new(2.0, 0.0, 2.0),
        ];
        let wl = store
            .add_sub_surface(
                crate::model::SubSurfaceData::new("wl", window_vertices.clone(), left).unwrap(),
            )
            .unwrap();
        let wr = store
            .add_sub_surface(
                crate::model::SubSurfaceData::new("wr", window_vertices, right).unwrap(),
            )
            .unwrap();
        MatchSubSurfaces::new(wl, wr).execute(&mut store).unwrap();

        let explicit =
            store.add_construction(ConstructionData::fenestration("explicit", vec!["low-e".into()]));
        let defaulted =
            store.add_construction(ConstructionData::fenestration("defaulted", vec!["clear".into()]));
        store.sub_surface_mut(wr).unwrap().construction = Some(explicit);
        let mut set = ConstructionSetData::new("set");
        set.fixed_window = Some(defaulted);
        let set = store.add_construction_set(set);
        store.space_mut(space_a).unwrap().default_construction_set = Some(set);

        assert_eq!(
            sub_surface_construction_search(&store, wl).unwrap(),
            Some((defaulted, 1))
        );
        // the remote explicit assignment outranks the local defaulted one
        assert_eq!(
            ResolveSubSurfaceConstruction::new(wl)
                .execute(&store)
                .unwrap(),
            Some(explicit)
        );
    }

    #[test]
    fn unpaired_surface_without_any_set_resolves_to_none() {
        let mut store = SurfaceStore::new();
        let space = store.add_space(SpaceData::new("space"));
        let surface = wall(&mut store, space);
        assert_eq!(
            ResolveSurfaceConstruction::new(surface)
                .execute(&store)
                .unwrap(),
            None
        );
    }
}
