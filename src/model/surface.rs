use crate::error::Result;
use crate::math::{polygon_3d, Plane, Point3};

use super::attachments::{OtherSideCoefficientsId, OtherSideConditionsModelId};
use super::construction::ConstructionId;
use super::space::SpaceId;
use super::sub_surface::SubSurfaceId;

slotmap::new_key_type! {
    /// Unique identifier for a surface in the surface store.
    pub struct SurfaceId;
}

/// Classification of a surface by orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceType {
    Wall,
    Floor,
    RoofCeiling,
}

/// What lies on the far side of a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryCondition {
    Outdoors,
    Ground,
    GroundFCfactorMethod,
    /// Another surface; requires an adjacent-surface pairing.
    Surface,
    Adiabatic,
    /// Requires an other-side-coefficients reference.
    OtherSideCoefficients,
    /// Requires an other-side-conditions-model reference.
    OtherSideConditionsModel,
}

impl BoundaryCondition {
    /// Whether this condition represents ground contact.
    #[must_use]
    pub fn is_ground(self) -> bool {
        matches!(self, Self::Ground | Self::GroundFCfactorMethod)
    }
}

/// Whether a surface is exposed to the sun.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SunExposure {
    SunExposed,
    NoSun,
}

/// Whether a surface is exposed to the wind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindExposure {
    WindExposed,
    NoWind,
}

/// Data associated with a surface: a planar polygon bounding a space.
///
/// The vertex loop is ordered counter-clockwise when viewed from outside the
/// space, so its Newell normal points outward.
#[derive(Debug, Clone)]
pub struct SurfaceData {
    /// Human-readable name.
    pub name: String,
    /// Owning space.
    pub space: SpaceId,
    /// Ordered vertex loop in the space's local coordinates.
    pub vertices: Vec<Point3>,
    pub surface_type: SurfaceType,
    pub boundary_condition: BoundaryCondition,
    /// Weak symmetric pairing with a surface in another space.
    pub adjacent_surface: Option<SurfaceId>,
    /// Explicit construction assignment; `None` means a defaulted search.
    pub construction: Option<ConstructionId>,
    pub sun_exposure: SunExposure,
    pub wind_exposure: WindExposure,
    pub other_side_coefficients: Option<OtherSideCoefficientsId>,
    pub other_side_conditions_model: Option<OtherSideConditionsModelId>,
    /// Owned child sub-surfaces.
    pub sub_surfaces: Vec<SubSurfaceId>,
}

impl SurfaceData {
    /// Creates a surface, deriving its type, boundary condition and
    /// exposures from the vertex geometry.
    ///
    /// # Errors
    ///
    /// Returns an error for a degenerate vertex loop.
    pub fn new(name: impl Into<String>, vertices: Vec<Point3>, space: SpaceId) -> Result<Self> {
        let surface_type = default_surface_type(&vertices)?;
        let mut data = Self {
            name: name.into(),
            space,
            vertices,
            surface_type,
            boundary_condition: BoundaryCondition::Outdoors,
            adjacent_surface: None,
            construction: None,
            sun_exposure: SunExposure::SunExposed,
            wind_exposure: WindExposure::WindExposed,
            other_side_coefficients: None,
            other_side_conditions_model: None,
            sub_surfaces: Vec::new(),
        };
        data.boundary_condition = data.default_boundary_condition();
        data.sun_exposure = data.default_sun_exposure();
        data.wind_exposure = data.default_wind_exposure();
        Ok(data)
    }

    /// The plane containing this surface, in local coordinates.
    ///
    /// # Errors
    ///
    /// Returns an error for a degenerate vertex loop.
    pub fn plane(&self) -> Result<Plane> {
        Plane::from_polygon(&self.vertices)
    }

    /// The surface's gross area (sub-surfaces not subtracted).
    ///
    /// # Errors
    ///
    /// Returns an error for a degenerate vertex loop.
    pub fn gross_area(&self) -> Result<f64> {
        polygon_3d::area_3d(&self.vertices)
    }

    /// The boundary condition this surface would default to, given its
    /// current references and type.
    ///
    /// Preference order: adjacent surface, other-side coefficients,
    /// other-side conditions model, ground for floors, outdoors otherwise.
    #[must_use]
    pub fn default_boundary_condition(&self) -> BoundaryCondition {
        if self.adjacent_surface.is_some() {
            BoundaryCondition::Surface
        } else if self.other_side_coefficients.is_some() {
            BoundaryCondition::OtherSideCoefficients
        } else if self.other_side_conditions_model.is_some() {
            BoundaryCondition::OtherSideConditionsModel
        } else if self.surface_type == SurfaceType::Floor {
            BoundaryCondition::Ground
        } else {
            BoundaryCondition::Outdoors
        }
    }

    /// The sun exposure implied by the current boundary condition and type.
    #[must_use]
    pub fn default_sun_exposure(&self) -> SunExposure {
        match self.boundary_condition {
            BoundaryCondition::Outdoors => SunExposure::SunExposed,
            BoundaryCondition::Surface
            | BoundaryCondition::Adiabatic
            | BoundaryCondition::Ground
            | BoundaryCondition::GroundFCfactorMethod
            | BoundaryCondition::OtherSideCoefficients => SunExposure::NoSun,
            BoundaryCondition::OtherSideConditionsModel => {
                if self.surface_type == SurfaceType::Floor {
                    SunExposure::NoSun
                } else {
                    SunExposure::SunExposed
                }
            }
        }
    }

    /// The wind exposure implied by the current boundary condition and type.
    #[must_use]
    pub fn default_wind_exposure(&self) -> WindExposure {
        match self.boundary_condition {
            BoundaryCondition::Outdoors => WindExposure::WindExposed,
            BoundaryCondition::Surface
            | BoundaryCondition::Adiabatic
            | BoundaryCondition::Ground
            | BoundaryCondition::GroundFCfactorMethod
            | BoundaryCondition::OtherSideCoefficients => WindExposure::NoWind,
            BoundaryCondition::OtherSideConditionsModel => {
                if self.surface_type == SurfaceType::Floor {
                    WindExposure::NoWind
                } else {
                    WindExposure::WindExposed
                }
            }
        }
    }

    /// Re-derives the defaulted boundary condition and both exposures.
    ///
    /// Called after any mutation that can invalidate them (pairing changes,
    /// reference changes).
    pub fn refresh_defaults(&mut self) {
        self.boundary_condition = self.default_boundary_condition();
        self.sun_exposure = self.default_sun_exposure();
        self.wind_exposure = self.default_wind_exposure();
    }
}

/// Classifies a vertex loop by tilt: under 60 degrees from horizontal is a
/// roof/ceiling, 60 to 179 a wall, steeper a floor.
///
/// # Errors
///
/// Returns an error for a degenerate vertex loop.
pub fn default_surface_type(vertices: &[Point3]) -> Result<SurfaceType> {
    let tilt = polygon_3d::tilt_degrees(vertices)?;
    Ok(if tilt < 60.0 {
        SurfaceType::RoofCeiling
    } else if tilt < 179.0 {
        SurfaceType::Wall
    } else {
        SurfaceType::Floor
    })
}
