use crate::error::{OperationError, Result};
use crate::model::{SubSurfaceId, SubSurfaceType, SurfaceStore};

/// Clears a sub-surface's pairing, cascading to the partner side.
pub(crate) fn unpair_sub_surface(store: &mut SurfaceStore, id: SubSurfaceId) {
    let partner = store
        .sub_surface(id)
        .ok()
        .and_then(|data| data.adjacent_sub_surface);
    if let Some(partner) = partner.filter(|p| *p != id) {
        if let Ok(data) = store.sub_surface_mut(partner) {
            data.adjacent_sub_surface = None;
        }
    }
    if let Ok(data) = store.sub_surface_mut(id) {
        data.adjacent_sub_surface = None;
    }
}

/// Establishes the symmetric pairing between two sub-surfaces.
///
/// Hard preconditions, each rejected with `false` and no mutation:
/// the multipliers must be equal, and the two parent surfaces must already be
/// an adjacent pair. Sub-surface pairing cannot exist without surface pairing.
pub struct MatchSubSurfaces {
    sub_surface: SubSurfaceId,
    other: SubSurfaceId,
}

impl MatchSubSurfaces {
    /// Creates a new `MatchSubSurfaces` operation.
    #[must_use]
    pub fn new(sub_surface: SubSurfaceId, other: SubSurfaceId) -> Self {
        Self { sub_surface, other }
    }

    /// Executes the pairing. Returns `false` when a precondition fails.
    ///
    /// When the two sides' types differ, the side whose type departs from its
    /// own geometric default is treated as deliberately overridden and wins;
    /// ambiguous cases fall back to the local side.
    ///
    /// # Errors
    ///
    /// Returns an error if either sub-surface or a parent surface is not
    /// found in the store.
    pub fn execute(&self, store: &mut SurfaceStore) -> Result<bool> {
        let local = store.sub_surface(self.sub_surface)?;
        let remote = store.sub_surface(self.other)?;
        if local.multiplier() != remote.multiplier() {
            return Ok(false);
        }
        let local_parent = local.surface;
        let remote_parent = remote.surface;
        if store.surface(local_parent)?.adjacent_surface != Some(remote_parent)
            || store.surface(remote_parent)?.adjacent_surface != Some(local_parent)
        {
            return Ok(false);
        }

        // at most one partner per sub-surface
        for side in [self.sub_surface, self.other] {
            for previous in store.sub_surfaces_pointing_at(side) {
                if previous != self.sub_surface && previous != self.other {
                    unpair_sub_surface(store, previous);
                }
            }
            unpair_sub_surface(store, side);
        }

        store.sub_surface_mut(self.sub_surface)?.adjacent_sub_surface = Some(self.other);
        store.sub_surface_mut(self.other)?.adjacent_sub_surface = Some(self.sub_surface);

        self.resolve_type_conflict(store)?;
        Ok(true)
    }

    fn resolve_type_conflict(&self, store: &mut SurfaceStore) -> Result<()> {
        let local_type = store.sub_surface(self.sub_surface)?.sub_surface_type;
        let remote_type = store.sub_surface(self.other)?.sub_surface_type;
        if local_type == remote_type {
            return Ok(());
        }
        let local_overridden = store.default_sub_surface_type(self.sub_surface)? != local_type;
        let remote_overridden = store.default_sub_surface_type(self.other)? != remote_type;

        // an explicitly overridden side wins; a tie goes to the local side
        let (winner_type, loser) = if remote_overridden && !local_overridden {
            (remote_type, self.sub_surface)
        } else {
            (local_type, self.other)
        };
        SetSubSurfaceType::new(loser, winner_type).execute(store)
    }
}

/// Dissolves a sub-surface's pairing, cascading to the partner side.
pub struct UnmatchSubSurface {
    sub_surface: SubSurfaceId,
}

impl UnmatchSubSurface {
    /// Creates a new `UnmatchSubSurface` operation.
    #[must_use]
    pub fn new(sub_surface: SubSurfaceId) -> Self {
        Self { sub_surface }
    }

    /// Executes the unpairing.
    ///
    /// # Errors
    ///
    /// Returns an error if the sub-surface is not found in the store.
    pub fn execute(&self, store: &mut SurfaceStore) -> Result<()> {
        store.sub_surface(self.sub_surface)?;
        unpair_sub_surface(store, self.sub_surface);
        Ok(())
    }
}

/// Sets a sub-surface's type, cascading to attachments and the paired side.
///
/// A type that disallows shading controls, frame-and-dividers, or
/// daylighting shelves strips those attachments. A paired sub-surface is
/// force-set to the same type, likewise stripped.
pub struct SetSubSurfaceType {
    sub_surface: SubSurfaceId,
    sub_surface_type: SubSurfaceType,
}

impl SetSubSurfaceType {
    /// Creates a new `SetSubSurfaceType` operation.
    #[must_use]
    pub fn new(sub_surface: SubSurfaceId, sub_surface_type: SubSurfaceType) -> Self {
        Self {
            sub_surface,
            sub_surface_type,
        }
    }

    /// Executes the type change.
    ///
    /// # Errors
    ///
    /// Returns an error if the sub-surface is not found in the store.
    pub fn execute(&self, store: &mut SurfaceStore) -> Result<()> {
        apply_type(store, self.sub_surface, self.sub_surface_type)?;
        let partner = store.sub_surface(self.sub_surface)?.adjacent_sub_surface;
        if let Some(partner) = partner.filter(|p| *p != self.sub_surface) {
            apply_type(store, partner, self.sub_surface_type)?;
        }
        Ok(())
    }
}

fn apply_type(
    store: &mut SurfaceStore,
    id: SubSurfaceId,
    sub_surface_type: SubSurfaceType,
) -> Result<()> {
    let shelf = {
        let data = store.sub_surface_mut(id)?;
        data.sub_surface_type = sub_surface_type;
        if !sub_surface_type.allows_shading_control() {
            data.shading_control = None;
        }
        if !sub_surface_type.allows_frame_and_divider() {
            data.frame_and_divider = None;
        }
        if sub_surface_type.allows_daylighting_shelf() {
            None
        } else {
            data.daylighting_shelf
        }
    };
    if let Some(shelf) = shelf {
        store.remove_daylighting_shelf(shelf);
    }
    Ok(())
}

/// Sets a sub-surface's multiplier, kept numerically identical across a
/// pairing at all times.
pub struct SetMultiplier {
    sub_surface: SubSurfaceId,
    multiplier: u32,
}

impl SetMultiplier {
    /// Creates a new `SetMultiplier` operation.
    #[must_use]
    pub fn new(sub_surface: SubSurfaceId, multiplier: u32) -> Self {
        Self {
            sub_surface,
            multiplier,
        }
    }

    /// Executes the change, propagating to the paired sub-surface.
    ///
    /// # Errors
    ///
    /// Returns an error if the multiplier is zero, or the sub-surface is not
    /// found in the store.
    pub fn execute(&self, store: &mut SurfaceStore) -> Result<()> {
        if self.multiplier == 0 {
            return Err(OperationError::InvalidInput("multiplier must be at least 1".into()).into());
        }
        let data = store.sub_surface_mut(self.sub_surface)?;
        data.multiplier = Some(self.multiplier);
        let partner = data.adjacent_sub_surface;
        if let Some(partner) = partner.filter(|p| *p != self.sub_surface) {
            store.sub_surface_mut(partner)?.multiplier = Some(self.multiplier);
        }
        Ok(())
    }
}

/// Resets a sub-surface's multiplier to its defaulted value of 1,
/// propagating to the paired sub-surface.
pub struct ResetMultiplier {
    sub_surface: SubSurfaceId,
}

impl ResetMultiplier {
    /// Creates a new `ResetMultiplier` operation.
    #[must_use]
    pub fn new(sub_surface: SubSurfaceId) -> Self {
        Self { sub_surface }
    }

    /// Executes the reset, propagating to the paired sub-surface.
    ///
    /// # Errors
    ///
    /// Returns an error if the sub-surface is not found in the store.
    pub fn execute(&self, store: &mut SurfaceStore) -> Result<()> {
        let data = store.sub_surface_mut(self.sub_surface)?;
        data.multiplier = None;
        let partner = data.adjacent_sub_surface;
        if let Some(partner) = partner.filter(|p| *p != self.sub_surface) {
            store.sub_surface_mut(partner)?.multiplier = None;
        }
        Ok(())
    }
}
