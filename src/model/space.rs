use crate::math::Transformation;

use super::construction::ConstructionSetId;

slotmap::new_key_type! {
    /// Unique identifier for a space in the surface store.
    pub struct SpaceId;
}

/// Data associated with a space: a volume bounded by surfaces.
///
/// Every surface belongs to exactly one space; the space's transformation
/// moves its local coordinates into the building frame.
#[derive(Debug, Clone)]
pub struct SpaceData {
    /// Human-readable name.
    pub name: String,
    /// Local-to-building transformation.
    pub transformation: Transformation,
    /// Default construction set searched when a surface has no explicit
    /// construction.
    pub default_construction_set: Option<ConstructionSetId>,
}

impl SpaceData {
    /// Creates a space at the building origin.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transformation: Transformation::identity(),
            default_construction_set: None,
        }
    }

    /// Creates a space with an explicit local-to-building transformation.
    #[must_use]
    pub fn with_transformation(name: impl Into<String>, transformation: Transformation) -> Self {
        Self {
            name: name.into(),
            transformation,
            default_construction_set: None,
        }
    }
}
