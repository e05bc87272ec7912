use super::surface::{BoundaryCondition, SurfaceType};
use super::sub_surface::SubSurfaceType;

slotmap::new_key_type! {
    /// Unique identifier for a construction in the surface store.
    pub struct ConstructionId;
}

slotmap::new_key_type! {
    /// Unique identifier for a default construction set.
    pub struct ConstructionSetId;
}

/// An opaque or fenestration construction: an ordered stack of material
/// layers, outside first.
#[derive(Debug, Clone)]
pub struct ConstructionData {
    pub name: String,
    /// Material layer names, outside to inside.
    pub layers: Vec<String>,
    /// Whether this is a fenestration (glazing) construction.
    pub fenestration: bool,
}

impl ConstructionData {
    /// Creates an opaque layered construction.
    #[must_use]
    pub fn new(name: impl Into<String>, layers: Vec<String>) -> Self {
        Self {
            name: name.into(),
            layers,
            fenestration: false,
        }
    }

    /// Creates a fenestration construction.
    #[must_use]
    pub fn fenestration(name: impl Into<String>, layers: Vec<String>) -> Self {
        Self {
            name: name.into(),
            layers,
            fenestration: true,
        }
    }

    /// Tests whether the other construction is this one's exact
    /// reverse-layer-order equivalent.
    ///
    /// A partition's two sides may legitimately carry reversed stacks of the
    /// same layers; such pairs are interchangeable for conflict resolution.
    #[must_use]
    pub fn reverse_equal_layers(&self, other: &ConstructionData) -> bool {
        self.layers.len() == other.layers.len()
            && self.layers.iter().eq(other.layers.iter().rev())
    }
}

/// Constructions for the three surface types in one boundary class.
#[derive(Debug, Clone, Default)]
pub struct SurfaceConstructions {
    pub wall: Option<ConstructionId>,
    pub floor: Option<ConstructionId>,
    pub roof_ceiling: Option<ConstructionId>,
}

impl SurfaceConstructions {
    /// The slot for a surface type.
    #[must_use]
    pub fn for_type(&self, surface_type: SurfaceType) -> Option<ConstructionId> {
        match surface_type {
            SurfaceType::Wall => self.wall,
            SurfaceType::Floor => self.floor,
            SurfaceType::RoofCeiling => self.roof_ceiling,
        }
    }
}

/// A default construction set: the constructions a surface or sub-surface
/// falls back to when it carries no explicit assignment.
#[derive(Debug, Clone, Default)]
pub struct ConstructionSetData {
    pub name: String,
    pub exterior: SurfaceConstructions,
    pub interior: SurfaceConstructions,
    pub ground: SurfaceConstructions,
    pub fixed_window: Option<ConstructionId>,
    pub operable_window: Option<ConstructionId>,
    pub glass_door: Option<ConstructionId>,
    pub door: Option<ConstructionId>,
    pub overhead_door: Option<ConstructionId>,
    pub skylight: Option<ConstructionId>,
}

impl ConstructionSetData {
    /// Creates an empty construction set.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Looks up the defaulted construction for a surface.
    #[must_use]
    pub fn for_surface(
        &self,
        surface_type: SurfaceType,
        boundary_condition: BoundaryCondition,
    ) -> Option<ConstructionId> {
        let class = match boundary_condition {
            BoundaryCondition::Surface | BoundaryCondition::Adiabatic => &self.interior,
            bc if bc.is_ground() => &self.ground,
            _ => &self.exterior,
        };
        class.for_type(surface_type)
    }

    /// Looks up the defaulted construction for a sub-surface.
    #[must_use]
    pub fn for_sub_surface(&self, sub_surface_type: SubSurfaceType) -> Option<ConstructionId> {
        match sub_surface_type {
            SubSurfaceType::FixedWindow => self.fixed_window,
            SubSurfaceType::OperableWindow => self.operable_window,
            SubSurfaceType::GlassDoor => self.glass_door,
            SubSurfaceType::Door => self.door,
            SubSurfaceType::OverheadDoor => self.overhead_door,
            SubSurfaceType::Skylight => self.skylight,
        }
    }
}
