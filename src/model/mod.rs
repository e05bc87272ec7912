pub mod attachments;
pub mod construction;
pub mod space;
pub mod sub_surface;
pub mod surface;

pub use attachments::{
    DaylightingShelfData, DaylightingShelfId, FrameAndDividerData, FrameAndDividerId,
    OtherSideCoefficientsData, OtherSideCoefficientsId, OtherSideConditionsModelData,
    OtherSideConditionsModelId, ShadingControlData, ShadingControlId, ShadingSurfaceData,
    ShadingSurfaceId,
};
pub use construction::{
    ConstructionData, ConstructionId, ConstructionSetData, ConstructionSetId, SurfaceConstructions,
};
pub use space::{SpaceData, SpaceId};
pub use sub_surface::{SubSurfaceData, SubSurfaceId, SubSurfaceType};
pub use surface::{
    default_surface_type, BoundaryCondition, SunExposure, SurfaceData, SurfaceId, SurfaceType,
    WindExposure,
};

use crate::error::ModelError;
use crate::math::polygon_3d;
use slotmap::SlotMap;

/// Central arena that owns all envelope entities.
///
/// Entities reference each other via typed IDs (generational indices),
/// avoiding self-referential structures and enabling safe mutation.
#[derive(Debug, Default)]
pub struct SurfaceStore {
    spaces: SlotMap<SpaceId, SpaceData>,
    surfaces: SlotMap<SurfaceId, SurfaceData>,
    sub_surfaces: SlotMap<SubSurfaceId, SubSurfaceData>,
    constructions: SlotMap<ConstructionId, ConstructionData>,
    construction_sets: SlotMap<ConstructionSetId, ConstructionSetData>,
    other_side_coefficients: SlotMap<OtherSideCoefficientsId, OtherSideCoefficientsData>,
    other_side_conditions_models: SlotMap<OtherSideConditionsModelId, OtherSideConditionsModelData>,
    shading_controls: SlotMap<ShadingControlId, ShadingControlData>,
    frame_and_dividers: SlotMap<FrameAndDividerId, FrameAndDividerData>,
    daylighting_shelves: SlotMap<DaylightingShelfId, DaylightingShelfData>,
    shading_surfaces: SlotMap<ShadingSurfaceId, ShadingSurfaceData>,
    /// Building-wide default construction set, searched after the space's.
    pub default_construction_set: Option<ConstructionSetId>,
}

impl SurfaceStore {
    /// Creates a new, empty surface store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Space operations ---

    /// Inserts a space and returns its ID.
    pub fn add_space(&mut self, data: SpaceData) -> SpaceId {
        self.spaces.insert(data)
    }

    /// Returns a reference to the space data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn space(&self, id: SpaceId) -> Result<&SpaceData, ModelError> {
        self.spaces
            .get(id)
            .ok_or_else(|| ModelError::EntityNotFound("space".into()))
    }

    /// Returns a mutable reference to the space data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn space_mut(&mut self, id: SpaceId) -> Result<&mut SpaceData, ModelError> {
        self.spaces
            .get_mut(id)
            .ok_or_else(|| ModelError::EntityNotFound("space".into()))
    }

    /// IDs of all spaces.
    #[must_use]
    pub fn space_ids(&self) -> Vec<SpaceId> {
        self.spaces.keys().collect()
    }

    // --- Surface operations ---

    /// Inserts a surface and returns its ID.
    pub fn add_surface(&mut self, data: SurfaceData) -> SurfaceId {
        self.surfaces.insert(data)
    }

    /// Returns a reference to the surface data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn surface(&self, id: SurfaceId) -> Result<&SurfaceData, ModelError> {
        self.surfaces
            .get(id)
            .ok_or_else(|| ModelError::EntityNotFound("surface".into()))
    }

    /// Returns a mutable reference to the surface data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn surface_mut(&mut self, id: SurfaceId) -> Result<&mut SurfaceData, ModelError> {
        self.surfaces
            .get_mut(id)
            .ok_or_else(|| ModelError::EntityNotFound("surface".into()))
    }

    /// IDs of all surfaces.
    #[must_use]
    pub fn surface_ids(&self) -> Vec<SurfaceId> {
        self.surfaces.keys().collect()
    }

    /// IDs of the surfaces belonging to a space.
    #[must_use]
    pub fn surfaces_in_space(&self, space: SpaceId) -> Vec<SurfaceId> {
        self.surfaces
            .iter()
            .filter(|(_, data)| data.space == space)
            .map(|(id, _)| id)
            .collect()
    }

    /// IDs of the surfaces whose adjacent-surface reference points at `id`.
    #[must_use]
    pub fn surfaces_pointing_at(&self, id: SurfaceId) -> Vec<SurfaceId> {
        self.surfaces
            .iter()
            .filter(|(_, data)| data.adjacent_surface == Some(id))
            .map(|(other, _)| other)
            .collect()
    }

    /// Removes a surface, its sub-surfaces, and any pairings pointing at
    /// them.
    ///
    /// Surfaces left without a partner fall back to their defaulted boundary
    /// condition.
    ///
    /// # Errors
    ///
    /// Returns an error if the surface is not found in the store.
    pub fn remove_surface(&mut self, id: SurfaceId) -> Result<(), ModelError> {
        let data = self
            .surfaces
            .remove(id)
            .ok_or_else(|| ModelError::EntityNotFound("surface".into()))?;
        for child in data.sub_surfaces {
            self.remove_sub_surface_internal(child);
        }
        for other in self.surfaces_pointing_at(id) {
            if let Some(other_data) = self.surfaces.get_mut(other) {
                other_data.adjacent_surface = None;
                other_data.refresh_defaults();
            }
        }
        Ok(())
    }

    /// Deep-copies a surface and its sub-surfaces into a space.
    ///
    /// Pairings are never carried over: the copy starts unmatched at both
    /// levels, with defaults re-derived.
    ///
    /// # Errors
    ///
    /// Returns an error if the surface is not found in the store.
    pub fn clone_surface(&mut self, id: SurfaceId, space: SpaceId) -> Result<SurfaceId, ModelError> {
        let mut data = self.surface(id)?.clone();
        let children = std::mem::take(&mut data.sub_surfaces);
        data.space = space;
        data.adjacent_surface = None;
        data.refresh_defaults();
        let new_id = self.surfaces.insert(data);
        for child in children {
            let Some(child_data) = self.sub_surfaces.get(child) else {
                continue;
            };
            let mut copy = child_data.clone();
            copy.surface = new_id;
            copy.adjacent_sub_surface = None;
            // a shelf belongs to exactly one window, so the copy starts bare
            copy.daylighting_shelf = None;
            let new_child = self.sub_surfaces.insert(copy);
            if let Some(parent) = self.surfaces.get_mut(new_id) {
                parent.sub_surfaces.push(new_child);
            }
        }
        Ok(new_id)
    }

    // --- Sub-surface operations ---

    /// Inserts a sub-surface under its parent surface and returns its ID.
    ///
    /// The sub-surface type is set to its geometric default.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent surface is not found in the store.
    pub fn add_sub_surface(&mut self, data: SubSurfaceData) -> Result<SubSurfaceId, ModelError> {
        let parent = data.surface;
        if !self.surfaces.contains_key(parent) {
            return Err(ModelError::EntityNotFound("surface".into()));
        }
        let id = self.sub_surfaces.insert(data);
        if let Some(parent_data) = self.surfaces.get_mut(parent) {
            parent_data.sub_surfaces.push(id);
        }
        if let Ok(default) = self.default_sub_surface_type(id) {
            if let Some(sub) = self.sub_surfaces.get_mut(id) {
                sub.sub_surface_type = default;
            }
        }
        Ok(id)
    }

    /// Returns a reference to the sub-surface data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn sub_surface(&self, id: SubSurfaceId) -> Result<&SubSurfaceData, ModelError> {
        self.sub_surfaces
            .get(id)
            .ok_or_else(|| ModelError::EntityNotFound("sub-surface".into()))
    }

    /// Returns a mutable reference to the sub-surface data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn sub_surface_mut(&mut self, id: SubSurfaceId) -> Result<&mut SubSurfaceData, ModelError> {
        self.sub_surfaces
            .get_mut(id)
            .ok_or_else(|| ModelError::EntityNotFound("sub-surface".into()))
    }

    /// IDs of all sub-surfaces.
    #[must_use]
    pub fn sub_surface_ids(&self) -> Vec<SubSurfaceId> {
        self.sub_surfaces.keys().collect()
    }

    /// IDs of the sub-surfaces whose pairing reference points at `id`.
    #[must_use]
    pub fn sub_surfaces_pointing_at(&self, id: SubSurfaceId) -> Vec<SubSurfaceId> {
        self.sub_surfaces
            .iter()
            .filter(|(_, data)| data.adjacent_sub_surface == Some(id))
            .map(|(other, _)| other)
            .collect()
    }

    /// Removes a sub-surface, detaching it from its parent and clearing any
    /// pairing pointing at it.
    ///
    /// # Errors
    ///
    /// Returns an error if the sub-surface is not found in the store.
    pub fn remove_sub_surface(&mut self, id: SubSurfaceId) -> Result<(), ModelError> {
        if !self.sub_surfaces.contains_key(id) {
            return Err(ModelError::EntityNotFound("sub-surface".into()));
        }
        self.remove_sub_surface_internal(id);
        Ok(())
    }

    fn remove_sub_surface_internal(&mut self, id: SubSurfaceId) {
        let Some(data) = self.sub_surfaces.remove(id) else {
            return;
        };
        if let Some(parent) = self.surfaces.get_mut(data.surface) {
            parent.sub_surfaces.retain(|child| *child != id);
        }
        for other in self.sub_surfaces_pointing_at(id) {
            if let Some(other_data) = self.sub_surfaces.get_mut(other) {
                other_data.adjacent_sub_surface = None;
            }
        }
        if let Some(shelf) = data.daylighting_shelf {
            if let Some(shelf_data) = self.daylighting_shelves.remove(shelf) {
                if let Some(outside) = shelf_data.outside_shelf {
                    self.shading_surfaces.remove(outside);
                }
            }
        }
    }

    /// The sub-surface type implied by geometry: roof and floor parents get
    /// skylights, wall openings that reach the parent's lowest edge get
    /// doors, everything else a fixed window.
    ///
    /// A door becomes a glass door when the sub-surface already carries a
    /// glazed type or a fenestration construction.
    ///
    /// # Errors
    ///
    /// Returns an error if the sub-surface is not found, or its vertex loop
    /// is degenerate.
    pub fn default_sub_surface_type(
        &self,
        id: SubSurfaceId,
    ) -> crate::error::Result<SubSurfaceType> {
        let data = self.sub_surface(id)?;
        let Ok(parent) = self.surface(data.surface) else {
            // Detached loop: classify by tilt alone. Near-horizontal loops
            // are skylights whether they face up or down.
            let tilt = polygon_3d::tilt_degrees(&data.vertices)?;
            return Ok(if tilt < 60.0 || tilt >= 179.0 {
                SubSurfaceType::Skylight
            } else {
                SubSurfaceType::FixedWindow
            });
        };
        match parent.surface_type {
            SurfaceType::RoofCeiling | SurfaceType::Floor => Ok(SubSurfaceType::Skylight),
            SurfaceType::Wall => {
                let parent_min_z = parent
                    .vertices
                    .iter()
                    .map(|p| p.z)
                    .fold(f64::INFINITY, f64::min);
                if data.min_z() <= parent_min_z {
                    let glazed = data.sub_surface_type == SubSurfaceType::GlassDoor
                        || data
                            .construction
                            .and_then(|c| self.constructions.get(c))
                            .is_some_and(|c| c.fenestration);
                    Ok(if glazed {
                        SubSurfaceType::GlassDoor
                    } else {
                        SubSurfaceType::Door
                    })
                } else {
                    Ok(SubSurfaceType::FixedWindow)
                }
            }
        }
    }

    // --- Construction operations ---

    /// Inserts a construction and returns its ID.
    pub fn add_construction(&mut self, data: ConstructionData) -> ConstructionId {
        self.constructions.insert(data)
    }

    /// Returns a reference to the construction data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn construction(&self, id: ConstructionId) -> Result<&ConstructionData, ModelError> {
        self.constructions
            .get(id)
            .ok_or_else(|| ModelError::EntityNotFound("construction".into()))
    }

    /// Inserts a construction set and returns its ID.
    pub fn add_construction_set(&mut self, data: ConstructionSetData) -> ConstructionSetId {
        self.construction_sets.insert(data)
    }

    /// Returns a reference to the construction set data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn construction_set(
        &self,
        id: ConstructionSetId,
    ) -> Result<&ConstructionSetData, ModelError> {
        self.construction_sets
            .get(id)
            .ok_or_else(|| ModelError::EntityNotFound("construction set".into()))
    }

    // --- Attachment operations ---

    /// Inserts an other-side-coefficients descriptor and returns its ID.
    pub fn add_other_side_coefficients(
        &mut self,
        data: OtherSideCoefficientsData,
    ) -> OtherSideCoefficientsId {
        self.other_side_coefficients.insert(data)
    }

    /// Inserts an other-side-conditions-model descriptor and returns its ID.
    pub fn add_other_side_conditions_model(
        &mut self,
        data: OtherSideConditionsModelData,
    ) -> OtherSideConditionsModelId {
        self.other_side_conditions_models.insert(data)
    }

    /// Inserts a shading control and returns its ID.
    pub fn add_shading_control(&mut self, data: ShadingControlData) -> ShadingControlId {
        self.shading_controls.insert(data)
    }

    /// Inserts a frame-and-divider and returns its ID.
    pub fn add_frame_and_divider(&mut self, data: FrameAndDividerData) -> FrameAndDividerId {
        self.frame_and_dividers.insert(data)
    }

    /// Inserts a daylighting shelf and returns its ID.
    pub fn add_daylighting_shelf(&mut self, data: DaylightingShelfData) -> DaylightingShelfId {
        self.daylighting_shelves.insert(data)
    }

    /// Returns a reference to the daylighting shelf data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn daylighting_shelf(
        &self,
        id: DaylightingShelfId,
    ) -> Result<&DaylightingShelfData, ModelError> {
        self.daylighting_shelves
            .get(id)
            .ok_or_else(|| ModelError::EntityNotFound("daylighting shelf".into()))
    }

    /// Removes a daylighting shelf along with its outside shading surface,
    /// clearing the owning window's reference.
    pub fn remove_daylighting_shelf(&mut self, id: DaylightingShelfId) {
        let Some(data) = self.daylighting_shelves.remove(id) else {
            return;
        };
        if let Some(outside) = data.outside_shelf {
            self.shading_surfaces.remove(outside);
        }
        if let Some(window) = self.sub_surfaces.get_mut(data.window) {
            if window.daylighting_shelf == Some(id) {
                window.daylighting_shelf = None;
            }
        }
    }

    /// Inserts a shading surface and returns its ID.
    pub fn add_shading_surface(&mut self, data: ShadingSurfaceData) -> ShadingSurfaceId {
        self.shading_surfaces.insert(data)
    }

    /// Returns a reference to the shading surface data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn shading_surface(&self, id: ShadingSurfaceId) -> Result<&ShadingSurfaceData, ModelError> {
        self.shading_surfaces
            .get(id)
            .ok_or_else(|| ModelError::EntityNotFound("shading surface".into()))
    }

    /// IDs of all shading surfaces.
    #[must_use]
    pub fn shading_surface_ids(&self) -> Vec<ShadingSurfaceId> {
        self.shading_surfaces.keys().collect()
    }
}
