use crate::error::Result;
use crate::math::{polygon_2d, Point3, Transformation, EDGE_GAP, INTERSECT_TOL};
use crate::model::{
    ConstructionId, DaylightingShelfData, ShadingSurfaceData, SubSurfaceData, SubSurfaceId,
    SurfaceId, SurfaceStore, SurfaceType,
};

/// Iteration bound for the shrink-to-fit band placement loop.
const MAX_ITERATIONS: usize = 100;

/// A requested glazing band: target fraction of the wall's gross area plus
/// the desired offset from its anchoring edge.
#[derive(Debug, Clone, Copy)]
struct BandRequest {
    ratio: f64,
    offset: f64,
}

/// A solved band placement in the wall's face frame.
#[derive(Debug, Clone, Copy)]
struct BandPlacement {
    sill: f64,
    height: f64,
}

/// Solves axis-aligned glazing-band layouts on a wall: a view band anchored
/// to the sill and/or a daylighting band anchored to the header, each sized
/// to a target fraction of the wall's gross area.
///
/// Both bands stay an inch inside the wall boundary and an inch apart.
/// When the desired offsets would make the bands collide, the larger offset
/// shrinks an inch at a time until the layout fits, bounded at 100 steps.
/// On success all existing window-type sub-surfaces are replaced by the
/// solved rectangles; infeasible targets leave the wall untouched.
pub struct ApplyGlassRatios {
    surface: SurfaceId,
    view: Option<BandRequest>,
    daylighting: Option<BandRequest>,
    exterior_shading_factor: f64,
    interior_shelf_factor: f64,
    view_construction: Option<ConstructionId>,
    daylighting_construction: Option<ConstructionId>,
}

impl ApplyGlassRatios {
    /// Creates a new `ApplyGlassRatios` operation with no bands requested.
    #[must_use]
    pub fn new(surface: SurfaceId) -> Self {
        Self {
            surface,
            view: None,
            daylighting: None,
            exterior_shading_factor: 0.0,
            interior_shelf_factor: 0.0,
            view_construction: None,
            daylighting_construction: None,
        }
    }

    /// Requests a view band, anchored this far above the wall's base.
    #[must_use]
    pub fn with_view_band(mut self, ratio: f64, sill_height: f64) -> Self {
        self.view = Some(BandRequest {
            ratio,
            offset: sill_height,
        });
        self
    }

    /// Requests a daylighting band, anchored this far below the wall's top.
    #[must_use]
    pub fn with_daylighting_band(mut self, ratio: f64, header_offset: f64) -> Self {
        self.daylighting = Some(BandRequest {
            ratio,
            offset: header_offset,
        });
        self
    }

    /// Adds an exterior shading fin at the view band's header, projecting
    /// outward by `factor` times the band height.
    #[must_use]
    pub fn with_exterior_shading(mut self, factor: f64) -> Self {
        self.exterior_shading_factor = factor;
        self
    }

    /// Adds an interior light shelf at the daylighting band's sill,
    /// projecting inward by `factor` times the band height.
    #[must_use]
    pub fn with_interior_shelf(mut self, factor: f64) -> Self {
        self.interior_shelf_factor = factor;
        self
    }

    /// Assigns a construction to the view band's window.
    #[must_use]
    pub fn with_view_construction(mut self, construction: ConstructionId) -> Self {
        self.view_construction = Some(construction);
        self
    }

    /// Assigns a construction to the daylighting band's window.
    #[must_use]
    pub fn with_daylighting_construction(mut self, construction: ConstructionId) -> Self {
        self.daylighting_construction = Some(construction);
        self
    }

    /// Executes the layout, returning the new sub-surfaces (view band first).
    ///
    /// An empty result means the request was inapplicable or infeasible and
    /// nothing changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the surface is not found in the store, or the
    /// face frame cannot be built from degenerate geometry.
    pub fn execute(&self, store: &mut SurfaceStore) -> Result<Vec<SubSurfaceId>> {
        let data = store.surface(self.surface)?;
        if data.surface_type != SurfaceType::Wall {
            return Ok(Vec::new());
        }
        let name = data.name.clone();
        let vertices = data.vertices.clone();
        let children = data.sub_surfaces.clone();

        // doors and other non-window openings cannot be replaced, so their
        // presence makes the whole layout inapplicable
        for &child in &children {
            if !store.sub_surface(child)?.sub_surface_type.is_window() {
                log::info!("surface '{name}' carries a non-window opening, cannot lay out glazing bands");
                return Ok(Vec::new());
            }
        }

        let face = Transformation::align_face(&vertices)?;
        let face_points = face.inverse().apply_points(&vertices);
        let Some((x_min, x_max, y_min, y_max)) = polygon_2d::bounds_2d(&face_points) else {
            return Ok(Vec::new());
        };
        let width = x_max - x_min;
        let height = y_max - y_min;
        let area = polygon_2d::signed_area_2d(&face_points).abs();
        if width <= 0.0 || height <= 0.0 {
            return Ok(Vec::new());
        }
        // the band arithmetic assumes a rectangular wall
        if (area - width * height).abs() > INTERSECT_TOL * area {
            log::info!("surface '{name}' is not rectangular, cannot lay out glazing bands");
            return Ok(Vec::new());
        }

        let Some((view, daylighting)) = solve_bands(self.view, self.daylighting, width, height, area)
        else {
            log::info!("no feasible glazing band layout for surface '{name}'");
            return Ok(Vec::new());
        };

        // solved: the bands replace every existing window on the wall
        for child in children {
            store.remove_sub_surface(child)?;
        }

        let band_rectangle = |band: BandPlacement| -> Vec<Point3> {
            face.apply_points(&[
                Point3::new(x_min + EDGE_GAP, band.sill, 0.0),
                Point3::new(x_max - EDGE_GAP, band.sill, 0.0),
                Point3::new(x_max - EDGE_GAP, band.sill + band.height, 0.0),
                Point3::new(x_min + EDGE_GAP, band.sill + band.height, 0.0),
            ])
        };

        let mut created = Vec::new();
        if let Some(band) = view {
            let data =
                SubSurfaceData::new(format!("{name} View Glass"), band_rectangle(band), self.surface)?;
            let id = store.add_sub_surface(data)?;
            store.sub_surface_mut(id)?.construction = self.view_construction;
            created.push(id);

            if self.exterior_shading_factor > 0.0 {
                let projection = self.exterior_shading_factor * band.height;
                let header = band.sill + band.height;
                let fin = face.apply_points(&[
                    Point3::new(x_min + EDGE_GAP, header, 0.0),
                    Point3::new(x_max - EDGE_GAP, header, 0.0),
                    Point3::new(x_max - EDGE_GAP, header, projection),
                    Point3::new(x_min + EDGE_GAP, header, projection),
                ]);
                store.add_shading_surface(ShadingSurfaceData {
                    name: format!("{name} Shading Fin"),
                    vertices: fin,
                    shaded_sub_surface: Some(id),
                });
            }
        }
        if let Some(band) = daylighting {
            let data = SubSurfaceData::new(
                format!("{name} Daylighting Glass"),
                band_rectangle(band),
                self.surface,
            )?;
            let id = store.add_sub_surface(data)?;
            store.sub_surface_mut(id)?.construction = self.daylighting_construction;
            created.push(id);

            if self.interior_shelf_factor > 0.0 {
                let projection = self.interior_shelf_factor * band.height;
                let inside_shelf = face.apply_points(&[
                    Point3::new(x_min + EDGE_GAP, band.sill, 0.0),
                    Point3::new(x_min + EDGE_GAP, band.sill, -projection),
                    Point3::new(x_max - EDGE_GAP, band.sill, -projection),
                    Point3::new(x_max - EDGE_GAP, band.sill, 0.0),
                ]);
                let shelf = store.add_daylighting_shelf(DaylightingShelfData {
                    name: format!("{name} Light Shelf"),
                    window: id,
                    inside_shelf,
                    outside_shelf: None,
                });
                store.sub_surface_mut(id)?.daylighting_shelf = Some(shelf);
            }
        }
        Ok(created)
    }
}

/// Solves the vertical placement of the requested bands, or `None` when the
/// request is infeasible.
fn solve_bands(
    view: Option<BandRequest>,
    daylighting: Option<BandRequest>,
    width: f64,
    height: f64,
    area: f64,
) -> Option<(Option<BandPlacement>, Option<BandPlacement>)> {
    let margin = EDGE_GAP;
    let band_width = width - 2.0 * margin;
    if band_width <= 0.0 {
        return None;
    }
    let view = view.filter(|b| b.ratio > 0.0);
    let daylighting = daylighting.filter(|b| b.ratio > 0.0);

    let view_ratio = view.map_or(0.0, |b| b.ratio);
    let day_ratio = daylighting.map_or(0.0, |b| b.ratio);
    if view_ratio >= 1.0 || day_ratio >= 1.0 || view_ratio + day_ratio >= 1.0 {
        return None;
    }
    let view_height = view_ratio * area / band_width;
    let day_height = day_ratio * area / band_width;

    match (view, daylighting) {
        (None, None) => None,
        (Some(request), None) => {
            if view_height + 2.0 * margin > height {
                return None;
            }
            // keep the band inside the top margin, defaulting toward the base
            let sill = request.offset.clamp(margin, height - margin - view_height);
            Some((
                Some(BandPlacement {
                    sill,
                    height: view_height,
                }),
                None,
            ))
        }
        (None, Some(request)) => {
            if day_height + 2.0 * margin > height {
                return None;
            }
            let header = request.offset.clamp(margin, height - margin - day_height);
            Some((
                None,
                Some(BandPlacement {
                    sill: height - header - day_height,
                    height: day_height,
                }),
            ))
        }
        (Some(view_request), Some(day_request)) => {
            // both bands plus three margins must fit the wall height
            if view_height + day_height + 3.0 * margin > height {
                return None;
            }
            let mut sill = view_request.offset.max(margin);
            let mut header = day_request.offset.max(margin);
            for _ in 0..MAX_ITERATIONS {
                let view_top = sill + view_height;
                let day_sill = height - header - day_height;
                if view_top + margin <= day_sill {
                    return Some((
                        Some(BandPlacement {
                            sill,
                            height: view_height,
                        }),
                        Some(BandPlacement {
                            sill: day_sill,
                            height: day_height,
                        }),
                    ));
                }
                // shrink the larger offset an inch at a time
                if sill >= header && sill > margin {
                    sill = (sill - EDGE_GAP).max(margin);
                } else if header > margin {
                    header = (header - EDGE_GAP).max(margin);
                } else if sill > margin {
                    sill = (sill - EDGE_GAP).max(margin);
                } else {
                    return None;
                }
            }
            None
        }
    }
}

/// Replaces a wall's windows with a single band at a target
/// window-to-wall ratio.
///
/// The band anchors to the floor (sill offset) or to the header, matching
/// the single-band cases of [`ApplyGlassRatios`].
pub struct SetWindowToWallRatio {
    surface: SurfaceId,
    ratio: f64,
    offset: f64,
    offset_from_floor: bool,
}

impl SetWindowToWallRatio {
    /// Creates a new `SetWindowToWallRatio` operation with a sill-anchored
    /// band.
    #[must_use]
    pub fn new(surface: SurfaceId, ratio: f64, offset: f64) -> Self {
        Self {
            surface,
            ratio,
            offset,
            offset_from_floor: true,
        }
    }

    /// Anchors the band to the wall's top edge instead of its base.
    #[must_use]
    pub fn anchored_to_header(mut self) -> Self {
        self.offset_from_floor = false;
        self
    }

    /// Executes the layout, returning the new window if one was created.
    ///
    /// # Errors
    ///
    /// Returns an error if the surface is not found in the store, or the
    /// face frame cannot be built from degenerate geometry.
    pub fn execute(&self, store: &mut SurfaceStore) -> Result<Option<SubSurfaceId>> {
        let operation = if self.offset_from_floor {
            ApplyGlassRatios::new(self.surface).with_view_band(self.ratio, self.offset)
        } else {
            ApplyGlassRatios::new(self.surface).with_daylighting_band(self.ratio, self.offset)
        };
        Ok(operation.execute(store)?.into_iter().next())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{SpaceData, SubSurfaceType};
    use approx::assert_relative_eq;

    fn wall(store: &mut SurfaceStore) -> SurfaceId {
        let space = store.add_space(SpaceData::new("space"));
        store.add_surface(
            crate::model::SurfaceData::new(
                "wall",
                vec![
                    Point3::new(0.0, 0.0, 3.0),
                    Point3::new(0.0, 0.0, 0.0),
                    Point3::new(10.0, 0.0, 0.0),
                    Point3::new(10.0, 0.0, 3.0),
                ],
                space,
            )
            .unwrap(),
        )
    }

    fn min_z(points: &[Point3]) -> f64 {
        points.iter().map(|p| p.z).fold(f64::INFINITY, f64::min)
    }

    #[test]
    fn window_to_wall_ratio_sizes_and_places_the_band() {
        let mut store = SurfaceStore::new();
        let surface = wall(&mut store);
        let window = SetWindowToWallRatio::new(surface, 0.4, 1.0)
            .execute(&mut store)
            .unwrap()
            .unwrap();
        let data = store.sub_surface(window).unwrap();
        assert_relative_eq!(data.area().unwrap(), 12.0, epsilon = 1e-6);
        assert_relative_eq!(min_z(&data.vertices), 1.0, epsilon = 1e-9);
        // an inch inset from each vertical edge
        let x_min = data.vertices.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
        let x_max = data
            .vertices
            .iter()
            .map(|p| p.x)
            .fold(f64::NEG_INFINITY, f64::max);
        assert_relative_eq!(x_min, EDGE_GAP, epsilon = 1e-9);
        assert_relative_eq!(x_max, 10.0 - EDGE_GAP, epsilon = 1e-9);
        assert_eq!(data.sub_surface_type, SubSurfaceType::FixedWindow);
    }

    #[test]
    fn non_window_opening_makes_the_wall_inapplicable() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut store = SurfaceStore::new();
        let surface = wall(&mut store);
        let old_window = store
            .add_sub_surface(
                SubSurfaceData::new(
                    "old window",
                    vec![
                        Point3::new(1.0, 0.0, 2.0),
                        Point3::new(1.0, 0.0, 1.0),
                        Point3::new(2.0, 0.0, 1.0),
                        Point3::new(2.0, 0.0, 2.0),
                    ],
                    surface,
                )
                .unwrap(),
            )
            .unwrap();
        let door = store
            .add_sub_surface(
                SubSurfaceData::new(
                    "door",
                    vec![
                        Point3::new(8.0, 0.0, 2.1),
                        Point3::new(8.0, 0.0, 0.0),
                        Point3::new(9.0, 0.0, 0.0),
                        Point3::new(9.0, 0.0, 2.1),
                    ],
                    surface,
                )
                .unwrap(),
            )
            .unwrap();

        let created = SetWindowToWallRatio::new(surface, 0.2, 0.8)
            .execute(&mut store)
            .unwrap();
        // the door cannot be replaced, so nothing changes at all
        assert!(created.is_none());
        assert!(store.sub_surface(old_window).is_ok());
        assert!(store.sub_surface(door).is_ok());
        assert_eq!(store.surface(surface).unwrap().sub_surfaces.len(), 2);
    }

    #[test]
    fn existing_windows_are_replaced_by_the_band() {
        let mut store = SurfaceStore::new();
        let surface = wall(&mut store);
        let old_window = store
            .add_sub_surface(
                SubSurfaceData::new(
                    "old window",
                    vec![
                        Point3::new(1.0, 0.0, 2.0),
                        Point3::new(1.0, 0.0, 1.0),
                        Point3::new(2.0, 0.0, 1.0),
                        Point3::new(2.0, 0.0, 2.0),
                    ],
                    surface,
                )
                .unwrap(),
            )
            .unwrap();

        let created = SetWindowToWallRatio::new(surface, 0.2, 0.8)
            .execute(&mut store)
            .unwrap();
        assert!(created.is_some());
        assert!(store.sub_surface(old_window).is_err());
        assert_eq!(store.surface(surface).unwrap().sub_surfaces.len(), 1);
    }

    #[test]
    fn dual_bands_keep_their_separation() {
        let mut store = SurfaceStore::new();
        let surface = wall(&mut store);
        let created = ApplyGlassRatios::new(surface)
            .with_view_band(0.2, 1.0)
            .with_daylighting_band(0.1, 0.3)
            .execute(&mut store)
            .unwrap();
        assert_eq!(created.len(), 2);
        let view = store.sub_surface(created[0]).unwrap();
        let daylighting = store.sub_surface(created[1]).unwrap();
        assert_relative_eq!(view.area().unwrap(), 6.0, epsilon = 1e-6);
        assert_relative_eq!(daylighting.area().unwrap(), 3.0, epsilon = 1e-6);
        let view_top = view.vertices.iter().map(|p| p.z).fold(f64::NEG_INFINITY, f64::max);
        assert!(min_z(&daylighting.vertices) - view_top >= EDGE_GAP - 1e-9);
    }

    #[test]
    fn colliding_bands_shrink_the_larger_offset() {
        let mut store = SurfaceStore::new();
        let surface = wall(&mut store);
        let created = ApplyGlassRatios::new(surface)
            .with_view_band(0.3, 1.5)
            .with_daylighting_band(0.2, 0.2)
            .execute(&mut store)
            .unwrap();
        assert_eq!(created.len(), 2);
        let view = store.sub_surface(created[0]).unwrap();
        let daylighting = store.sub_surface(created[1]).unwrap();
        let view_top = view.vertices.iter().map(|p| p.z).fold(f64::NEG_INFINITY, f64::max);
        assert!(min_z(&daylighting.vertices) - view_top >= EDGE_GAP - 1e-9);
        // the view sill gave way, the daylighting header did not
        assert!(min_z(&view.vertices) < 1.5);
    }

    #[test]
    fn infeasible_ratio_changes_nothing() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut store = SurfaceStore::new();
        let surface = wall(&mut store);
        let old_window = store
            .add_sub_surface(
                SubSurfaceData::new(
                    "old window",
                    vec![
                        Point3::new(1.0, 0.0, 2.0),
                        Point3::new(1.0, 0.0, 1.0),
                        Point3::new(2.0, 0.0, 1.0),
                        Point3::new(2.0, 0.0, 2.0),
                    ],
                    surface,
                )
                .unwrap(),
            )
            .unwrap();
        let created = SetWindowToWallRatio::new(surface, 0.99, 1.0)
            .execute(&mut store)
            .unwrap();
        assert!(created.is_none());
        assert!(store.sub_surface(old_window).is_ok());
    }

    #[test]
    fn header_anchored_band_hangs_from_the_top() {
        let mut store = SurfaceStore::new();
        let surface = wall(&mut store);
        let window = SetWindowToWallRatio::new(surface, 0.2, 0.5)
            .anchored_to_header()
            .execute(&mut store)
            .unwrap()
            .unwrap();
        let data = store.sub_surface(window).unwrap();
        assert_relative_eq!(data.area().unwrap(), 6.0, epsilon = 1e-6);
        let z_max = data.vertices.iter().map(|p| p.z).fold(f64::NEG_INFINITY, f64::max);
        assert_relative_eq!(z_max, 2.5, epsilon = 1e-9);
    }

    #[test]
    fn band_constructions_are_assigned() {
        let mut store = SurfaceStore::new();
        let surface = wall(&mut store);
        let view_glass = store.add_construction(crate::model::ConstructionData::fenestration(
            "view glass",
            vec!["clear 3mm".into()],
        ));
        let day_glass = store.add_construction(crate::model::ConstructionData::fenestration(
            "daylighting glass",
            vec!["diffuse 3mm".into()],
        ));
        let created = ApplyGlassRatios::new(surface)
            .with_view_band(0.2, 1.0)
            .with_daylighting_band(0.1, 0.3)
            .with_view_construction(view_glass)
            .with_daylighting_construction(day_glass)
            .execute(&mut store)
            .unwrap();
        assert_eq!(created.len(), 2);
        assert_eq!(store.sub_surface(created[0]).unwrap().construction, Some(view_glass));
        assert_eq!(store.sub_surface(created[1]).unwrap().construction, Some(day_glass));
    }

    #[test]
    fn shading_fin_and_shelf_are_synthesized() {
        let mut store = SurfaceStore::new();
        let surface = wall(&mut store);
        let created = ApplyGlassRatios::new(surface)
            .with_view_band(0.2, 1.0)
            .with_daylighting_band(0.1, 0.3)
            .with_exterior_shading(0.5)
            .with_interior_shelf(0.5)
            .execute(&mut store)
            .unwrap();
        assert_eq!(created.len(), 2);

        let fins = store.shading_surface_ids();
        assert_eq!(fins.len(), 1);
        let fin = store.shading_surface(fins[0]).unwrap();
        assert_eq!(fin.shaded_sub_surface, Some(created[0]));
        assert_eq!(fin.vertices.len(), 4);

        let shelf = store.sub_surface(created[1]).unwrap().daylighting_shelf;
        assert!(shelf.is_some());
        let shelf_data = store.daylighting_shelf(shelf.unwrap()).unwrap();
        assert_eq!(shelf_data.window, created[1]);
        assert_eq!(shelf_data.inside_shelf.len(), 4);
    }
}
