//! Per-slice feature engine: shells, floor, roof, support, and infill.
//!
//! A [`Layer`] is built once from its reconstructed loops (shell phase)
//! and then driven through the remaining phases by the model's two
//! passes, which hand it the shell data of its vertical neighbors. The
//! phase order is enforced by an explicit state machine instead of
//! nullable fields.

use crate::clip::{self, JoinStyle, SIMPLIFY_EPS};
use crate::error::{Result, SlicerError};
use crate::infill::{crosshatch, solid_fill, HatchOrder};
use crate::path::{Polygon, Polyline};
use crate::SliceSettings;

/// Processing phase of a layer. Phases advance strictly in declaration
/// order; each `generate_*` operation requires the preceding phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LayerState {
    /// Constructed but shells not yet derived.
    Unsliced,
    /// Shells derived from the reconstructed loops.
    ShellsBuilt,
    /// Floor region and fill computed.
    FloorDone,
    /// Roof region and fill computed.
    RoofDone,
    /// Support region and fill computed (possibly empty).
    SupportDone,
    /// Infill computed; the layer is complete.
    InfillDone,
}

/// One horizontal cross-section with its derived print regions.
#[derive(Debug, Clone)]
pub struct Layer {
    z: f64,
    index: usize,
    state: LayerState,
    /// Concentric shells, outermost first.
    shells: Vec<Vec<Polygon>>,
    floor_region: Vec<Polygon>,
    roof_region: Vec<Polygon>,
    support_region: Vec<Polygon>,
    floor: Vec<Polyline>,
    roof: Vec<Polyline>,
    support: Vec<Polyline>,
    infill: Vec<Polyline>,
}

impl Layer {
    /// Build a layer from the closed loops reconstructed at height `z`.
    ///
    /// The loops are unioned under the even-odd rule, eroded inward by
    /// half the tool width to compensate for the tool footprint, and
    /// offset inward one tool width at a time into concentric shells.
    /// Shell generation stops early if an offset empties the region; the
    /// shell list is then shorter than configured.
    pub fn from_loops(z: f64, index: usize, loops: Vec<Polygon>, settings: &SliceSettings) -> Self {
        let mut layer = Self {
            z,
            index,
            state: LayerState::Unsliced,
            shells: Vec::new(),
            floor_region: Vec::new(),
            roof_region: Vec::new(),
            support_region: Vec::new(),
            floor: Vec::new(),
            roof: Vec::new(),
            support: Vec::new(),
            infill: Vec::new(),
        };

        let region = clip::simplify(&clip::regionize(&loops), SIMPLIFY_EPS);
        let mut current = clip::simplify(
            &clip::inflate(&region, -settings.half_tool_width(), JoinStyle::Miter),
            SIMPLIFY_EPS,
        );
        for _ in 0..settings.shell_count {
            if current.is_empty() {
                break;
            }
            layer.shells.push(current.clone());
            current = clip::simplify(
                &clip::inflate(&current, -settings.tool_width, JoinStyle::Miter),
                SIMPLIFY_EPS,
            );
        }

        layer.state = LayerState::ShellsBuilt;
        layer
    }

    /// Slice height.
    pub fn z(&self) -> f64 {
        self.z
    }

    /// Layer index, 0 at the bottom.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Current processing phase.
    pub fn state(&self) -> LayerState {
        self.state
    }

    /// All concentric shells, outermost first.
    pub fn shells(&self) -> &[Vec<Polygon>] {
        &self.shells
    }

    /// Outermost perimeter, read by neighbors for support generation.
    pub fn outer_shell(&self) -> &[Polygon] {
        self.shells.first().map_or(&[], Vec::as_slice)
    }

    /// Innermost perimeter bounding the solid interior, read by neighbors
    /// for floor/roof generation.
    pub fn inner_shell(&self) -> &[Polygon] {
        self.shells.last().map_or(&[], Vec::as_slice)
    }

    /// Every shell as a closed path, outermost first - the outer layer
    /// path set consumed by emission.
    pub fn wall_paths(&self) -> Vec<Polyline> {
        self.shells
            .iter()
            .flatten()
            .map(Polygon::to_polyline)
            .collect()
    }

    /// Solid floor paths.
    pub fn floor(&self) -> &[Polyline] {
        &self.floor
    }

    /// Solid roof paths.
    pub fn roof(&self) -> &[Polyline] {
        &self.roof
    }

    /// Support paths.
    pub fn support(&self) -> &[Polyline] {
        &self.support
    }

    /// Sparse infill paths.
    pub fn infill(&self) -> &[Polyline] {
        &self.infill
    }

    /// Pre-fill floor boundary, retained for infill exclusion.
    pub fn floor_region(&self) -> &[Polygon] {
        &self.floor_region
    }

    /// Pre-fill roof boundary, retained for infill exclusion.
    pub fn roof_region(&self) -> &[Polygon] {
        &self.roof_region
    }

    /// Support boundary, read by the layer below when extending support
    /// downward.
    pub fn support_region(&self) -> &[Polygon] {
        &self.support_region
    }

    fn require(&self, expected: LayerState, operation: &'static str) -> Result<()> {
        if self.state != expected {
            return Err(SlicerError::NotReady {
                layer: self.index,
                operation,
            });
        }
        Ok(())
    }

    /// Derive the floor region and fill it solid.
    ///
    /// On a base layer the whole innermost shell becomes floor. Otherwise
    /// a point needs floor exactly when it is not backed by solid
    /// material on every one of the supplied lower neighbors, so the
    /// intersection of their inner shells is subtracted from this
    /// layer's innermost shell.
    pub fn generate_floor(
        &mut self,
        lower_inner_shells: &[Vec<Polygon>],
        is_base: bool,
        settings: &SliceSettings,
    ) -> Result<()> {
        self.require(LayerState::ShellsBuilt, "floor")?;
        if !is_base && self.shells.is_empty() {
            return Err(SlicerError::NotReady {
                layer: self.index,
                operation: "floor",
            });
        }

        let region = if is_base {
            self.inner_shell().to_vec()
        } else {
            let backing = intersect_all(lower_inner_shells);
            clip::difference(self.inner_shell(), &backing)
        };

        self.floor = solid_fill(&region, settings.tool_width);
        self.floor_region = region;
        self.state = LayerState::FloorDone;
        Ok(())
    }

    /// Derive the roof region and fill it solid. Symmetric to
    /// [`Layer::generate_floor`], consulting upper neighbors.
    pub fn generate_roof(
        &mut self,
        upper_inner_shells: &[Vec<Polygon>],
        is_top: bool,
        settings: &SliceSettings,
    ) -> Result<()> {
        self.require(LayerState::FloorDone, "roof")?;
        if !is_top && self.shells.is_empty() {
            return Err(SlicerError::NotReady {
                layer: self.index,
                operation: "roof",
            });
        }

        let region = if is_top {
            self.inner_shell().to_vec()
        } else {
            let backing = intersect_all(upper_inner_shells);
            clip::difference(self.inner_shell(), &backing)
        };

        self.roof = solid_fill(&region, settings.tool_width);
        self.roof_region = region;
        self.state = LayerState::RoofDone;
        Ok(())
    }

    /// Derive the support region from the layer above and cross-hatch it.
    ///
    /// `upper` is the union of the outer shell and support region of the
    /// layer immediately above. Whatever falls outside this layer's
    /// self-supporting area - the outer shell inflated by
    /// `min(half_tool_width, layer_height)` - needs support, after an
    /// inward tool-width clearance. The hatch direction order alternates
    /// by layer parity. The top layer carries no support; an empty
    /// `upper` (support disabled) naturally yields none.
    pub fn generate_support(
        &mut self,
        upper: &[Polygon],
        is_top: bool,
        settings: &SliceSettings,
    ) -> Result<()> {
        self.require(LayerState::RoofDone, "support")?;

        if is_top || upper.is_empty() {
            self.state = LayerState::SupportDone;
            return Ok(());
        }

        let reach = settings.half_tool_width().min(settings.layer_height);
        let self_supporting = clip::inflate(self.outer_shell(), reach, JoinStyle::Miter);
        let uncovered = clip::difference(upper, &self_supporting);
        let region = clip::simplify(
            &clip::inflate(&uncovered, -settings.tool_width, JoinStyle::Miter),
            SIMPLIFY_EPS,
        );

        let order = if self.index % 2 == 0 {
            HatchOrder::HorizontalFirst
        } else {
            HatchOrder::VerticalFirst
        };
        self.support = crosshatch(&region, settings.support_spacing, order);
        self.support_region = region;
        self.state = LayerState::SupportDone;
        Ok(())
    }

    /// Cross-hatch the sparse interior.
    ///
    /// The region is the innermost shell pulled inward by
    /// `half_tool_width - infill_overlap * tool_width` (letting infill
    /// bond slightly into the innermost wall), minus the floor region,
    /// minus the roof region, in that order.
    pub fn generate_infill(&mut self, settings: &SliceSettings) -> Result<()> {
        self.require(LayerState::SupportDone, "infill")?;

        let shrink = settings.half_tool_width() - settings.infill_overlap * settings.tool_width;
        let mut region = clip::inflate(self.inner_shell(), -shrink, JoinStyle::Miter);
        region = clip::difference(&region, &self.floor_region);
        region = clip::difference(&region, &self.roof_region);

        self.infill = crosshatch(&region, settings.infill_spacing, HatchOrder::HorizontalFirst);
        self.state = LayerState::InfillDone;
        Ok(())
    }

    /// Fold the infill paths into the floor path set. Applied by the
    /// model directly above a floor transition, where a separate
    /// pure-infill pass would be redundant.
    pub fn merge_infill_into_floor(&mut self) {
        self.floor.append(&mut self.infill);
    }
}

/// Intersection of several regions; empty input yields an empty region.
fn intersect_all(regions: &[Vec<Polygon>]) -> Vec<Polygon> {
    let Some(first) = regions.first() else {
        return Vec::new();
    };
    let mut acc = first.clone();
    for region in &regions[1..] {
        if acc.is_empty() {
            break;
        }
        acc = clip::intersection(&acc, region);
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::Point2;

    fn square_loop(x: f64, y: f64, size: f64) -> Polygon {
        Polygon::new(vec![
            Point2::new(x, y),
            Point2::new(x + size, y),
            Point2::new(x + size, y + size),
            Point2::new(x, y + size),
        ])
    }

    fn settings() -> SliceSettings {
        SliceSettings {
            shell_count: 2,
            ..Default::default()
        }
    }

    fn built_layer(index: usize) -> Layer {
        Layer::from_loops(0.2, index, vec![square_loop(0.0, 0.0, 20.0)], &settings())
    }

    #[test]
    fn test_shell_construction() {
        let layer = built_layer(0);
        assert_eq!(layer.state(), LayerState::ShellsBuilt);
        assert_eq!(layer.shells().len(), 2);

        // 20x20 eroded by 0.2 then offset by 0.4: 19.6 and 18.8 squares
        let outer_area = clip::region_area(layer.outer_shell());
        let inner_area = clip::region_area(layer.inner_shell());
        assert!((outer_area - 19.6 * 19.6).abs() < 1e-2);
        assert!((inner_area - 18.8 * 18.8).abs() < 1e-2);
        assert!(outer_area >= inner_area);
        assert_eq!(layer.wall_paths().len(), 2);
    }

    #[test]
    fn test_shell_generation_stops_early() {
        let settings = SliceSettings {
            shell_count: 10,
            ..Default::default()
        };
        let layer = Layer::from_loops(0.2, 0, vec![square_loop(0.0, 0.0, 2.0)], &settings);
        // a 2mm square cannot hold ten 0.4mm shells; the shorter list is
        // tolerated, not an error
        assert!(layer.shells().len() < 10);
        assert!(!layer.shells().is_empty());
    }

    #[test]
    fn test_region_ops_require_phase_order() {
        let mut layer = built_layer(0);
        assert!(matches!(
            layer.generate_infill(&settings()),
            Err(SlicerError::NotReady { .. })
        ));
        assert!(matches!(
            layer.generate_roof(&[], true, &settings()),
            Err(SlicerError::NotReady { .. })
        ));

        layer.generate_floor(&[], true, &settings()).unwrap();
        assert!(matches!(
            layer.generate_floor(&[], true, &settings()),
            Err(SlicerError::NotReady { .. })
        ));
    }

    #[test]
    fn test_floor_on_empty_interior_layer_errors() {
        let mut layer = Layer::from_loops(0.2, 3, Vec::new(), &settings());
        assert!(layer.shells().is_empty());
        let result = layer.generate_floor(&[Vec::new()], false, &settings());
        assert!(matches!(result, Err(SlicerError::NotReady { .. })));
    }

    #[test]
    fn test_base_floor_is_solid() {
        let mut layer = built_layer(0);
        layer.generate_floor(&[], true, &settings()).unwrap();
        assert_eq!(layer.state(), LayerState::FloorDone);
        assert!(!layer.floor().is_empty());
        assert!((clip::region_area(layer.floor_region()) - 18.8 * 18.8).abs() < 1e-2);
    }

    #[test]
    fn test_fully_backed_floor_is_empty() {
        let mut layer = built_layer(1);
        let backing = layer.inner_shell().to_vec();
        layer
            .generate_floor(&[backing], false, &settings())
            .unwrap();
        assert!(layer.floor_region().is_empty());
        assert!(layer.floor().is_empty());
    }

    #[test]
    fn test_partially_backed_floor() {
        let mut layer = built_layer(1);
        // the layer below only covers the left half
        let backing = vec![square_loop(-1.0, -1.0, 11.0)];
        layer
            .generate_floor(&[backing], false, &settings())
            .unwrap();
        let area = clip::region_area(layer.floor_region());
        assert!(area > 0.0);
        assert!(area < 18.8 * 18.8);
        assert!(!layer.floor().is_empty());
    }

    #[test]
    fn test_support_from_overhanging_upper() {
        let mut layer = built_layer(0);
        layer.generate_floor(&[], true, &settings()).unwrap();
        layer.generate_roof(&[], true, &settings()).unwrap();

        // the layer above extends far beyond this layer's footprint
        let upper = vec![square_loop(-10.0, 0.0, 40.0)];
        layer.generate_support(&upper, false, &settings()).unwrap();
        assert_eq!(layer.state(), LayerState::SupportDone);
        assert!(!layer.support_region().is_empty());
        assert!(!layer.support().is_empty());
    }

    #[test]
    fn test_top_layer_has_no_support() {
        let mut layer = built_layer(5);
        layer.generate_floor(&[], true, &settings()).unwrap();
        layer.generate_roof(&[], true, &settings()).unwrap();
        layer
            .generate_support(&[square_loop(0.0, 0.0, 30.0)], true, &settings())
            .unwrap();
        assert!(layer.support().is_empty());
        assert!(layer.support_region().is_empty());
    }

    #[test]
    fn test_infill_area_accounting() {
        let mut layer = built_layer(1);
        // floor backed only on the left, roof backed everywhere
        layer
            .generate_floor(&[vec![square_loop(-1.0, -1.0, 11.0)]], false, &settings())
            .unwrap();
        layer
            .generate_roof(&[layer.inner_shell().to_vec()], false, &settings())
            .unwrap();
        layer.generate_support(&[], false, &settings()).unwrap();
        layer.generate_infill(&settings()).unwrap();
        assert_eq!(layer.state(), LayerState::InfillDone);
        assert!(!layer.infill().is_empty());

        // area(infill region) = area(shrunk shell)
        //   - area(shrunk ∩ floor) - area(shrunk ∩ roof)
        let s = settings();
        let shrink = s.half_tool_width() - s.infill_overlap * s.tool_width;
        let shrunk = clip::inflate(layer.inner_shell(), -shrink, JoinStyle::Miter);
        let infill_region = clip::difference(
            &clip::difference(&shrunk, layer.floor_region()),
            layer.roof_region(),
        );

        let expected = clip::region_area(&shrunk)
            - clip::region_area(&clip::intersection(&shrunk, layer.floor_region()))
            - clip::region_area(&clip::intersection(&shrunk, layer.roof_region()));
        assert!((clip::region_area(&infill_region) - expected).abs() < 1e-3);
    }

    #[test]
    fn test_merge_infill_into_floor() {
        let mut layer = built_layer(1);
        layer
            .generate_floor(&[vec![square_loop(-1.0, -1.0, 11.0)]], false, &settings())
            .unwrap();
        // fully backed from above: the empty roof leaves infill to merge
        layer
            .generate_roof(&[layer.inner_shell().to_vec()], false, &settings())
            .unwrap();
        layer.generate_support(&[], false, &settings()).unwrap();
        layer.generate_infill(&settings()).unwrap();

        let floor_count = layer.floor().len();
        let infill_count = layer.infill().len();
        assert!(infill_count > 0);

        layer.merge_infill_into_floor();
        assert!(layer.infill().is_empty());
        assert_eq!(layer.floor().len(), floor_count + infill_count);
    }
}
