use crate::error::Result;
use crate::model::{BoundaryCondition, SurfaceId, SurfaceStore};

/// Clears a surface's pairing, cascading to the partner.
///
/// Both sides drop their sub-surface pairings and fall back to their
/// defaulted boundary condition and exposures. Safe to call on an already
/// unpaired surface; a vanished handle is ignored.
pub(crate) fn unpair_surface(store: &mut SurfaceStore, id: SurfaceId) {
    clear_sub_surface_pairings(store, id);
    let partner = store
        .surface(id)
        .ok()
        .and_then(|data| data.adjacent_surface);
    if let Some(partner) = partner.filter(|p| *p != id) {
        clear_sub_surface_pairings(store, partner);
        if let Ok(data) = store.surface_mut(partner) {
            data.adjacent_surface = None;
            data.refresh_defaults();
        }
    }
    if let Ok(data) = store.surface_mut(id) {
        data.adjacent_surface = None;
        data.refresh_defaults();
    }
}

/// Drops the pairings of every sub-surface of a surface, cascading to each
/// partner sub-surface.
pub(crate) fn clear_sub_surface_pairings(store: &mut SurfaceStore, id: SurfaceId) {
    let children = match store.surface(id) {
        Ok(data) => data.sub_surfaces.clone(),
        Err(_) => return,
    };
    for child in children {
        let partner = store
            .sub_surface(child)
            .ok()
            .and_then(|data| data.adjacent_sub_surface);
        if let Some(partner) = partner {
            if let Ok(data) = store.sub_surface_mut(partner) {
                data.adjacent_sub_surface = None;
            }
        }
        if let Ok(data) = store.sub_surface_mut(child) {
            data.adjacent_sub_surface = None;
        }
    }
}

/// Establishes the symmetric adjacent-surface pairing between two surfaces.
///
/// This is the low-level relation setter: planes are not checked for
/// geometric reverse-equality here. A surface may pair with itself
/// (multiplier-based story repetition).
///
/// On a new pairing, any other surface previously pointing at either side is
/// forcibly unpaired and reset to its defaulted boundary condition, and both
/// sides' sub-surface pairings are cleared for independent re-resolution.
/// Re-affirming an existing pairing skips the cascades.
pub struct MatchSurfaces {
    surface: SurfaceId,
    other: SurfaceId,
}

impl MatchSurfaces {
    /// Creates a new `MatchSurfaces` operation.
    #[must_use]
    pub fn new(surface: SurfaceId, other: SurfaceId) -> Self {
        Self { surface, other }
    }

    /// Executes the pairing. Returns `true` on success.
    ///
    /// # Errors
    ///
    /// Returns an error if either surface is not found in the store.
    pub fn execute(&self, store: &mut SurfaceStore) -> Result<bool> {
        store.surface(self.surface)?;
        store.surface(self.other)?;

        let is_new_match = store.surface(self.surface)?.adjacent_surface != Some(self.other)
            || store.surface(self.other)?.adjacent_surface != Some(self.surface);

        if is_new_match {
            // at most one partner per surface, never a dangling half-pair
            for side in [self.surface, self.other] {
                for previous in store.surfaces_pointing_at(side) {
                    if previous != self.surface && previous != self.other {
                        unpair_surface(store, previous);
                    }
                }
                unpair_surface(store, side);
            }
        }

        for (side, partner) in [(self.surface, self.other), (self.other, self.surface)] {
            let data = store.surface_mut(side)?;
            data.adjacent_surface = Some(partner);
            data.other_side_coefficients = None;
            data.other_side_conditions_model = None;
            data.refresh_defaults();
        }
        Ok(true)
    }
}

/// Dissolves a surface's pairing, cascading to the partner side.
pub struct UnmatchSurface {
    surface: SurfaceId,
}

impl UnmatchSurface {
    /// Creates a new `UnmatchSurface` operation.
    #[must_use]
    pub fn new(surface: SurfaceId) -> Self {
        Self { surface }
    }

    /// Executes the unpairing. A surface with no pairing is left unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error if the surface is not found in the store.
    pub fn execute(&self, store: &mut SurfaceStore) -> Result<()> {
        store.surface(self.surface)?;
        unpair_surface(store, self.surface);
        Ok(())
    }
}

/// Drives the boundary-condition state machine of a surface.
///
/// Transitions with missing prerequisites are rejected with `false` and no
/// mutation: `Surface` needs a partner (supplied here or already paired),
/// the other-side conditions need their side-object reference present.
pub struct SetBoundaryCondition {
    surface: SurfaceId,
    condition: BoundaryCondition,
    adjacent_surface: Option<SurfaceId>,
}

impl SetBoundaryCondition {
    /// Creates a new `SetBoundaryCondition` operation.
    #[must_use]
    pub fn new(surface: SurfaceId, condition: BoundaryCondition) -> Self {
        Self {
            surface,
            condition,
            adjacent_surface: None,
        }
    }

    /// Supplies the partner for a transition to `Surface`.
    #[must_use]
    pub fn with_adjacent_surface(mut self, other: SurfaceId) -> Self {
        self.adjacent_surface = Some(other);
        self
    }

    /// Executes the transition. Returns `false` when a prerequisite is
    /// missing; the surface is then left unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error if the surface is not found in the store.
    pub fn execute(&self, store: &mut SurfaceStore) -> Result<bool> {
        let data = store.surface(self.surface)?;
        let has_adjacent = data.adjacent_surface.is_some();
        let has_coefficients = data.other_side_coefficients.is_some();
        let has_conditions_model = data.other_side_conditions_model.is_some();

        match self.condition {
            BoundaryCondition::Surface => {
                if let Some(other) = self.adjacent_surface {
                    MatchSurfaces::new(self.surface, other).execute(store)
                } else if has_adjacent {
                    // re-affirm the existing pairing
                    let data = store.surface_mut(self.surface)?;
                    data.boundary_condition = BoundaryCondition::Surface;
                    data.sun_exposure = data.default_sun_exposure();
                    data.wind_exposure = data.default_wind_exposure();
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
            BoundaryCondition::OtherSideCoefficients => {
                if !has_coefficients {
                    return Ok(false);
                }
                unpair_surface(store, self.surface);
                self.apply(store)?;
                Ok(true)
            }
            BoundaryCondition::OtherSideConditionsModel => {
                if !has_conditions_model {
                    return Ok(false);
                }
                unpair_surface(store, self.surface);
                self.apply(store)?;
                Ok(true)
            }
            _ => {
                unpair_surface(store, self.surface);
                let data = store.surface_mut(self.surface)?;
                data.other_side_coefficients = None;
                data.other_side_conditions_model = None;
                self.apply(store)?;
                if self.condition == BoundaryCondition::Adiabatic {
                    self.remove_sub_surfaces(store)?;
                }
                Ok(true)
            }
        }
    }

    fn apply(&self, store: &mut SurfaceStore) -> Result<()> {
        let data = store.surface_mut(self.surface)?;
        data.boundary_condition = self.condition;
        data.sun_exposure = data.default_sun_exposure();
        data.wind_exposure = data.default_wind_exposure();
        Ok(())
    }

    /// An adiabatic surface cannot be fenestrated.
    fn remove_sub_surfaces(&self, store: &mut SurfaceStore) -> Result<()> {
        let data = store.surface(self.surface)?;
        let children = data.sub_surfaces.clone();
        if !children.is_empty() {
            log::warn!(
                "removing {} sub-surfaces from adiabatic surface '{}'",
                children.len(),
                data.name
            );
        }
        for child in children {
            store.remove_sub_surface(child)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;
    use crate::model::{SpaceData, SubSurfaceData, SurfaceData};

    fn wall(store: &mut SurfaceStore, name: &str) -> SurfaceId {
        let space = store.add_space(SpaceData::new(format!("space for {name}")));
        let vertices = vec![
            Point3::new(0.0, 0.0, 3.0),
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(10.0, 0.0, 0.0),
            Point3::new(10.0, 0.0, 3.0),
        ];
        store.add_surface(SurfaceData::new(name, vertices, space).unwrap())
    }

    fn window(store: &mut SurfaceStore, surface: SurfaceId, x: f64) -> crate::model::SubSurfaceId {
        store
            .add_sub_surface(
                SubSurfaceData::new(
                    "window",
                    vec![
                        Point3::new(x, 0.0, 2.0),
                        Point3::new(x, 0.0, 1.0),
                        Point3::new(x + 1.0, 0.0, 1.0),
                        Point3::new(x + 1.0, 0.0, 2.0),
                    ],
                    surface,
                )
                .unwrap(),
            )
            .unwrap()
    }

    #[test]
    fn pairing_is_symmetric() {
        let mut store = SurfaceStore::new();
        let a = wall(&mut store, "a");
        let b = wall(&mut store, "b");
        assert!(MatchSurfaces::new(a, b).execute(&mut store).unwrap());
        assert_eq!(store.surface(a).unwrap().adjacent_surface, Some(b));
        assert_eq!(store.surface(b).unwrap().adjacent_surface, Some(a));
        assert_eq!(
            store.surface(a).unwrap().boundary_condition,
            BoundaryCondition::Surface
        );
        assert_eq!(
            store.surface(b).unwrap().boundary_condition,
            BoundaryCondition::Surface
        );

        UnmatchSurface::new(a).execute(&mut store).unwrap();
        assert_eq!(store.surface(a).unwrap().adjacent_surface, None);
        assert_eq!(store.surface(b).unwrap().adjacent_surface, None);
        assert_eq!(
            store.surface(b).unwrap().boundary_condition,
            BoundaryCondition::Outdoors
        );
    }

    #[test]
    fn at_most_one_partner() {
        let mut store = SurfaceStore::new();
        let a = wall(&mut store, "a");
        let b = wall(&mut store, "b");
        let c = wall(&mut store, "c");
        assert!(MatchSurfaces::new(a, c).execute(&mut store).unwrap());
        assert!(MatchSurfaces::new(a, b).execute(&mut store).unwrap());
        assert_eq!(store.surface(a).unwrap().adjacent_surface, Some(b));
        assert_eq!(store.surface(b).unwrap().adjacent_surface, Some(a));
        assert_eq!(store.surface(c).unwrap().adjacent_surface, None);
        assert_eq!(
            store.surface(c).unwrap().boundary_condition,
            BoundaryCondition::Outdoors
        );
    }

    #[test]
    fn new_pairing_clears_sub_surface_pairings() {
        let mut store = SurfaceStore::new();
        let a = wall(&mut store, "a");
        let b = wall(&mut store, "b");
        MatchSurfaces::new(a, b).execute(&mut store).unwrap();
        let wa = window(&mut store, a, 1.0);
        let wb = window(&mut store, b, 1.0);
        store.sub_surface_mut(wa).unwrap().adjacent_sub_surface = Some(wb);
        store.sub_surface_mut(wb).unwrap().adjacent_sub_surface = Some(wa);

        // re-affirmation keeps the window match
        MatchSurfaces::new(a, b).execute(&mut store).unwrap();
        assert_eq!(
            store.sub_surface(wa).unwrap().adjacent_sub_surface,
            Some(wb)
        );

        // a genuinely new pairing drops it
        let c = wall(&mut store, "c");
        MatchSurfaces::new(a, c).execute(&mut store).unwrap();
        assert_eq!(store.sub_surface(wa).unwrap().adjacent_sub_surface, None);
        assert_eq!(store.sub_surface(wb).unwrap().adjacent_sub_surface, None);
    }

    #[test]
    fn self_pairing_is_allowed() {
        let mut store = SurfaceStore::new();
        let a = wall(&mut store, "a");
        assert!(MatchSurfaces::new(a, a).execute(&mut store).unwrap());
        assert_eq!(store.surface(a).unwrap().adjacent_surface, Some(a));
        assert_eq!(
            store.surface(a).unwrap().boundary_condition,
            BoundaryCondition::Surface
        );
    }

    #[test]
    fn surface_condition_without_partner_is_rejected() {
        let mut store = SurfaceStore::new();
        let a = wall(&mut store, "a");
        let accepted = SetBoundaryCondition::new(a, BoundaryCondition::Surface)
            .execute(&mut store)
            .unwrap();
        assert!(!accepted);
        assert_eq!(
            store.surface(a).unwrap().boundary_condition,
            BoundaryCondition::Outdoors
        );
    }

    #[test]
    fn surface_condition_with_partner_pairs_both_sides() {
        let mut store = SurfaceStore::new();
        let a = wall(&mut store, "a");
        let b = wall(&mut store, "b");
        let accepted = SetBoundaryCondition::new(a, BoundaryCondition::Surface)
            .with_adjacent_surface(b)
            .execute(&mut store)
            .unwrap();
        assert!(accepted);
        assert_eq!(store.surface(a).unwrap().adjacent_surface, Some(b));
        assert_eq!(store.surface(b).unwrap().adjacent_surface, Some(a));
        assert_eq!(
            store.surface(b).unwrap().boundary_condition,
            BoundaryCondition::Surface
        );
    }

    #[test]
    fn other_side_conditions_model_requires_reference() {
        let mut store = SurfaceStore::new();
        let a = wall(&mut store, "a");
        let rejected = SetBoundaryCondition::new(a, BoundaryCondition::OtherSideConditionsModel)
            .execute(&mut store)
            .unwrap();
        assert!(!rejected);

        let model = store.add_other_side_conditions_model(
            crate::model::OtherSideConditionsModelData {
                name: "ground model".into(),
            },
        );
        store.surface_mut(a).unwrap().other_side_conditions_model = Some(model);
        let accepted = SetBoundaryCondition::new(a, BoundaryCondition::OtherSideConditionsModel)
            .execute(&mut store)
            .unwrap();
        assert!(accepted);
        assert_eq!(
            store.surface(a).unwrap().boundary_condition,
            BoundaryCondition::OtherSideConditionsModel
        );
    }

    #[test]
    fn other_side_coefficients_requires_reference() {
        let mut store = SurfaceStore::new();
        let a = wall(&mut store, "a");
        let rejected = SetBoundaryCondition::new(a, BoundaryCondition::OtherSideCoefficients)
            .execute(&mut store)
            .unwrap();
        assert!(!rejected);

        let osc = store.add_other_side_coefficients(
            crate::model::OtherSideCoefficientsData {
                name: "osc".into(),
            },
        );
        store.surface_mut(a).unwrap().other_side_coefficients = Some(osc);
        let accepted = SetBoundaryCondition::new(a, BoundaryCondition::OtherSideCoefficients)
            .execute(&mut store)
            .unwrap();
        assert!(accepted);
        assert_eq!(
            store.surface(a).unwrap().boundary_condition,
            BoundaryCondition::OtherSideCoefficients
        );
    }

    #[test]
    fn adiabatic_removes_sub_surfaces() {
        let mut store = SurfaceStore::new();
        let a = wall(&mut store, "a");
        let w1 = window(&mut store, a, 1.0);
        let w2 = window(&mut store, a, 4.0);
        let accepted = SetBoundaryCondition::new(a, BoundaryCondition::Adiabatic)
            .execute(&mut store)
            .unwrap();
        assert!(accepted);
        assert!(store.surface(a).unwrap().sub_surfaces.is_empty());
        assert!(store.sub_surface(w1).is_err());
        assert!(store.sub_surface(w2).is_err());
        assert_eq!(
            store.surface(a).unwrap().boundary_condition,
            BoundaryCondition::Adiabatic
        );
    }

    #[test]
    fn outdoors_clears_pairing_on_both_sides() {
        let mut store = SurfaceStore::new();
        let a = wall(&mut store, "a");
        let b = wall(&mut store, "b");
        MatchSurfaces::new(a, b).execute(&mut store).unwrap();
        let accepted = SetBoundaryCondition::new(a, BoundaryCondition::Outdoors)
            .execute(&mut store)
            .unwrap();
        assert!(accepted);
        assert_eq!(store.surface(a).unwrap().adjacent_surface, None);
        assert_eq!(store.surface(b).unwrap().adjacent_surface, None);
        assert_eq!(
            store.surface(b).unwrap().boundary_condition,
            BoundaryCondition::Outdoors
        );
    }
}
