pub mod adjacency;
pub mod construction_resolution;
pub mod glazing;
pub mod intersection;
pub mod space_ops;
pub mod split;
pub mod sub_adjacency;

pub use adjacency::{MatchSurfaces, SetBoundaryCondition, UnmatchSurface};
pub use construction_resolution::{
    ResolveSubSurfaceConstruction, ResolveSurfaceConstruction,
};
pub use glazing::{ApplyGlassRatios, SetWindowToWallRatio};
pub use intersection::{ComputeIntersection, SurfaceIntersection};
pub use space_ops::{CreateAdjacentSurface, IntersectSpaces, MatchSpaces, UnmatchSpace};
pub use split::SplitSurfaceForSubSurfaces;
pub use sub_adjacency::{
    MatchSubSurfaces, ResetMultiplier, SetMultiplier, SetSubSurfaceType, UnmatchSubSurface,
};
