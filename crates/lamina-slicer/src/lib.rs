#![warn(missing_docs)]

//! Layer-by-layer toolpath generation core for 3D printing.
//!
//! This crate converts a triangle mesh into a stack of layers, each
//! carrying concentric wall paths, solid floor and roof fill, optional
//! support, and sparse interior infill, ready for an instruction
//! emitter to walk.
//!
//! # Example
//!
//! ```ignore
//! use lamina_slicer::{slice, SliceSettings, TriangleMesh};
//!
//! let mesh: TriangleMesh = // ... load a mesh
//! let settings = SliceSettings::default();
//! let model = slice(&mesh, &settings)?;
//!
//! println!("Layers: {}", model.layers().len());
//! ```

pub mod clip;
pub mod error;
pub mod infill;
pub mod layer;
pub mod mesh;
pub mod model;
pub mod path;
pub mod slice;
pub mod snap;
pub mod trace;

pub use error::{Result, SlicerError};
pub use infill::HatchOrder;
pub use layer::{Layer, LayerState};
pub use mesh::{SupportAugmenter, TriangleMesh};
pub use model::Model;
pub use path::{Point2, Polygon, Polyline, Vec2};

use serde::{Deserialize, Serialize};

/// Slicing parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SliceSettings {
    /// Layer height (mm).
    pub layer_height: f64,
    /// Deposition tool width (mm); shells are spaced by this.
    pub tool_width: f64,
    /// Number of concentric wall shells.
    pub shell_count: usize,
    /// Number of solid layers at the bottom of any downward-facing surface.
    pub floor_layers: usize,
    /// Number of solid layers under any upward-facing surface.
    pub roof_layers: usize,
    /// Cross-hatch spacing of sparse infill (mm).
    pub infill_spacing: f64,
    /// Cross-hatch spacing of support fill (mm).
    pub support_spacing: f64,
    /// How far infill reaches into the innermost wall, as a fraction of
    /// the tool width.
    pub infill_overlap: f64,
    /// Enable support structures.
    pub support_enabled: bool,
    /// Use mesh-augmenting tree support instead of planar support.
    pub tree_support: bool,
    /// Geometric tolerance for vertex snapping, collinearity, and loop
    /// closure (mm).
    pub epsilon: f64,
    /// XY translation applied to every path at emission (mm).
    pub planar_offset: [f64; 2],
}

impl Default for SliceSettings {
    fn default() -> Self {
        Self {
            layer_height: 0.2,
            tool_width: 0.4,
            shell_count: 2,
            floor_layers: 3,
            roof_layers: 3,
            infill_spacing: 2.0,
            support_spacing: 2.5,
            infill_overlap: 0.15,
            support_enabled: false,
            tree_support: false,
            epsilon: 1e-6,
            planar_offset: [0.0, 0.0],
        }
    }
}

impl SliceSettings {
    /// Half the tool width, the erosion applied to every outline so the
    /// tool center traces it.
    pub fn half_tool_width(&self) -> f64 {
        self.tool_width / 2.0
    }

    /// Validate settings.
    pub fn validate(&self) -> Result<()> {
        if self.layer_height <= 0.0 {
            return Err(SlicerError::InvalidSettings(
                "layer_height must be positive".into(),
            ));
        }
        if self.tool_width <= 0.0 {
            return Err(SlicerError::InvalidSettings(
                "tool_width must be positive".into(),
            ));
        }
        if self.shell_count == 0 {
            return Err(SlicerError::InvalidSettings(
                "shell_count must be at least 1".into(),
            ));
        }
        if self.floor_layers == 0 || self.roof_layers == 0 {
            return Err(SlicerError::InvalidSettings(
                "floor_layers and roof_layers must be at least 1".into(),
            ));
        }
        if self.infill_spacing <= 0.0 || self.support_spacing <= 0.0 {
            return Err(SlicerError::InvalidSettings(
                "fill spacings must be positive".into(),
            ));
        }
        if !(0.0..1.0).contains(&self.infill_overlap) {
            return Err(SlicerError::InvalidSettings(
                "infill_overlap must be in [0, 1)".into(),
            ));
        }
        if self.epsilon <= 0.0 {
            return Err(SlicerError::InvalidSettings(
                "epsilon must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Slice a mesh into a printable layer stack.
pub fn slice(mesh: &TriangleMesh, settings: &SliceSettings) -> Result<Model> {
    Model::slice(mesh, settings)
}
