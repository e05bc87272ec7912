use crate::error::Result;
use crate::math::{polygon_3d, Plane, Point3};

use super::attachments::{DaylightingShelfId, FrameAndDividerId, ShadingControlId};
use super::construction::ConstructionId;
use super::surface::SurfaceId;

slotmap::new_key_type! {
    /// Unique identifier for a sub-surface in the surface store.
    pub struct SubSurfaceId;
}

/// Classification of a sub-surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubSurfaceType {
    FixedWindow,
    OperableWindow,
    GlassDoor,
    Door,
    OverheadDoor,
    Skylight,
}

impl SubSurfaceType {
    /// Whether a shading control may be attached to this type.
    #[must_use]
    pub fn allows_shading_control(self) -> bool {
        matches!(
            self,
            Self::FixedWindow | Self::OperableWindow | Self::GlassDoor
        )
    }

    /// Whether a frame-and-divider may be attached to this type.
    #[must_use]
    pub fn allows_frame_and_divider(self) -> bool {
        matches!(
            self,
            Self::FixedWindow | Self::OperableWindow | Self::GlassDoor
        )
    }

    /// Whether a daylighting shelf may be attached to this type.
    #[must_use]
    pub fn allows_daylighting_shelf(self) -> bool {
        matches!(
            self,
            Self::FixedWindow | Self::OperableWindow | Self::GlassDoor
        )
    }

    /// Whether this type is plain glazing (the kinds replaced by the
    /// glazing-ratio solver).
    #[must_use]
    pub fn is_window(self) -> bool {
        matches!(self, Self::FixedWindow | Self::OperableWindow)
    }
}

/// Data associated with a sub-surface: a planar polygon nested within a
/// parent surface (window, door, or skylight).
#[derive(Debug, Clone)]
pub struct SubSurfaceData {
    /// Human-readable name.
    pub name: String,
    /// Required parent surface.
    pub surface: SurfaceId,
    /// Ordered vertex loop, coplanar with the parent surface.
    pub vertices: Vec<Point3>,
    pub sub_surface_type: SubSurfaceType,
    /// Weak symmetric pairing, valid only while the parent surfaces are
    /// themselves paired.
    pub adjacent_sub_surface: Option<SubSurfaceId>,
    /// Story multiplier; `None` means the defaulted value of 1.
    pub multiplier: Option<u32>,
    /// Explicit construction assignment; `None` means a defaulted search.
    pub construction: Option<ConstructionId>,
    pub shading_control: Option<ShadingControlId>,
    pub frame_and_divider: Option<FrameAndDividerId>,
    pub daylighting_shelf: Option<DaylightingShelfId>,
}

impl SubSurfaceData {
    /// Creates a sub-surface under the given parent surface.
    ///
    /// The type starts as `FixedWindow`; the store assigns the geometric
    /// default when the sub-surface is registered, once the parent is known.
    ///
    /// # Errors
    ///
    /// Returns an error for a degenerate vertex loop.
    pub fn new(name: impl Into<String>, vertices: Vec<Point3>, surface: SurfaceId) -> Result<Self> {
        // validate the loop up front
        let _ = Plane::from_polygon(&vertices)?;
        Ok(Self {
            name: name.into(),
            surface,
            vertices,
            sub_surface_type: SubSurfaceType::FixedWindow,
            adjacent_sub_surface: None,
            multiplier: None,
            construction: None,
            shading_control: None,
            frame_and_divider: None,
            daylighting_shelf: None,
        })
    }

    /// The effective multiplier (defaulted to 1).
    #[must_use]
    pub fn multiplier(&self) -> u32 {
        self.multiplier.unwrap_or(1)
    }

    /// The sub-surface's area.
    ///
    /// # Errors
    ///
    /// Returns an error for a degenerate vertex loop.
    pub fn area(&self) -> Result<f64> {
        polygon_3d::area_3d(&self.vertices)
    }

    /// Lowest vertex height in local coordinates.
    #[must_use]
    pub fn min_z(&self) -> f64 {
        self.vertices
            .iter()
            .map(|p| p.z)
            .fold(f64::INFINITY, f64::min)
    }
}
