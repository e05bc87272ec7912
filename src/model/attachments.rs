//! Auxiliary model objects that attach to surfaces and sub-surfaces:
//! other-side boundary descriptors, shading controls, frames, shelves,
//! and shading surfaces.

use crate::math::Point3;

use super::sub_surface::SubSurfaceId;

slotmap::new_key_type! {
    /// Identifier for an other-side-coefficients boundary descriptor.
    pub struct OtherSideCoefficientsId;
}

slotmap::new_key_type! {
    /// Identifier for an other-side-conditions-model boundary descriptor.
    pub struct OtherSideConditionsModelId;
}

slotmap::new_key_type! {
    /// Identifier for a shading control.
    pub struct ShadingControlId;
}

slotmap::new_key_type! {
    /// Identifier for a window frame-and-divider.
    pub struct FrameAndDividerId;
}

slotmap::new_key_type! {
    /// Identifier for a daylighting shelf.
    pub struct DaylightingShelfId;
}

slotmap::new_key_type! {
    /// Identifier for a detached shading surface.
    pub struct ShadingSurfaceId;
}

#[derive(Debug, Clone)]
pub struct OtherSideCoefficientsData {
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct OtherSideConditionsModelData {
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct ShadingControlData {
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct FrameAndDividerData {
    pub name: String,
}

/// A light shelf attached to a window. The inside shelf polygon lives in the
/// window's space; an outside shelf, when present, is a shading surface.
#[derive(Debug, Clone)]
pub struct DaylightingShelfData {
    pub name: String,
    pub window: SubSurfaceId,
    pub inside_shelf: Vec<Point3>,
    pub outside_shelf: Option<ShadingSurfaceId>,
}

/// A detached shading polygon, optionally tied to the sub-surface whose
/// daylighting shelf it realizes.
#[derive(Debug, Clone)]
pub struct ShadingSurfaceData {
    pub name: String,
    pub vertices: Vec<Point3>,
    pub shaded_sub_surface: Option<SubSurfaceId>,
}
