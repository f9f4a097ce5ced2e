//! Model orchestration: slice a mesh into layers and drive the region
//! passes.
//!
//! Plane intersection and loop reconstruction are independent per plane
//! and run in parallel. The region passes are inherently sequential -
//! floors read downward, roofs and support read upward - so they run as
//! two ordered sweeps over the finished layer stack.

use rayon::prelude::*;
use tracing::{debug, info};

use crate::clip;
use crate::error::{Result, SlicerError};
use crate::layer::Layer;
use crate::mesh::{SupportAugmenter, TriangleMesh};
use crate::path::Polygon;
use crate::slice::{extract_triangles, layer_heights, segments_at};
use crate::snap::Snapper;
use crate::trace::loops_from_segments;
use crate::SliceSettings;

/// A fully sliced model: the ordered layer stack plus the settings it
/// was produced with.
#[derive(Debug, Clone)]
pub struct Model {
    settings: SliceSettings,
    layers: Vec<Layer>,
}

impl Model {
    /// Slice a mesh into layers and run both region passes.
    ///
    /// Fails on invalid settings, an empty mesh, or a mesh too thin to
    /// hold a single layer. Individual malformed planes do not fail the
    /// slice; they contribute fewer loops.
    pub fn slice(mesh: &TriangleMesh, settings: &SliceSettings) -> Result<Self> {
        settings.validate()?;

        let (min, max) = mesh.bounds().ok_or(SlicerError::EmptyMesh)?;
        if mesh.is_empty() {
            return Err(SlicerError::EmptyMesh);
        }

        let heights = layer_heights(min[2], max[2], settings.layer_height);
        if heights.is_empty() {
            return Err(SlicerError::SliceFailed(
                "model too thin to slice".to_string(),
            ));
        }

        info!(
            triangles = mesh.triangle_count(),
            layers = heights.len(),
            layer_height = settings.layer_height,
            "slicing mesh"
        );

        let triangles = extract_triangles(mesh);
        let snap = Snapper::new(settings.epsilon);

        let layers: Vec<Layer> = heights
            .into_par_iter()
            .enumerate()
            .map(|(index, z)| {
                let segments = segments_at(&triangles, z);
                let loops = loops_from_segments(segments, &snap, settings.epsilon);
                Layer::from_loops(z, index, loops, settings)
            })
            .collect();

        let mut model = Self {
            settings: settings.clone(),
            layers,
        };
        model.generate_regions()?;
        info!(layers = model.layers.len(), "slice complete");
        Ok(model)
    }

    /// Slice with a pre-slicing support augmentation step.
    ///
    /// When tree support is selected the augmenter synthesizes support
    /// geometry into the mesh before any plane is intersected; planar
    /// support generation is then skipped per layer because the support
    /// is part of the model. Otherwise this is identical to
    /// [`Model::slice`].
    pub fn slice_with_support(
        mesh: &TriangleMesh,
        augmenter: &dyn SupportAugmenter,
        settings: &SliceSettings,
    ) -> Result<Self> {
        if settings.tree_support {
            let augmented = augmenter.augment(mesh);
            Self::slice(&augmented, settings)
        } else {
            Self::slice(mesh, settings)
        }
    }

    /// Run the upward floor pass and the downward roof/support/infill
    /// pass over the layer stack.
    fn generate_regions(&mut self) -> Result<()> {
        let n = self.layers.len();
        let floor_n = self.settings.floor_layers;
        let roof_n = self.settings.roof_layers;

        debug!(layers = n, "floor pass");
        for i in 0..n {
            let is_base = i < floor_n;
            let lower: Vec<Vec<Polygon>> = if is_base {
                Vec::new()
            } else {
                (i - floor_n..i)
                    .map(|j| self.layers[j].inner_shell().to_vec())
                    .collect()
            };
            self.layers[i].generate_floor(&lower, is_base, &self.settings)?;
        }

        debug!(layers = n, "roof, support, and infill pass");
        for i in (0..n).rev() {
            let is_top = i + roof_n >= n;
            let upper: Vec<Vec<Polygon>> = if is_top {
                Vec::new()
            } else {
                (i + 1..=i + roof_n)
                    .map(|j| self.layers[j].inner_shell().to_vec())
                    .collect()
            };

            // planar support descends from the layer above: its outline
            // plus whatever that layer itself needs held up
            let support_upper: Vec<Polygon> =
                if self.settings.support_enabled && !self.settings.tree_support && !is_top {
                    clip::union(
                        self.layers[i + 1].outer_shell(),
                        self.layers[i + 1].support_region(),
                    )
                } else {
                    Vec::new()
                };

            let layer = &mut self.layers[i];
            layer.generate_roof(&upper, is_top, &self.settings)?;
            layer.generate_support(&support_upper, is_top, &self.settings)?;
            layer.generate_infill(&self.settings)?;
        }

        // directly above a floor transition the sparse infill would sit
        // on fresh solid floor anyway; fold it in
        for i in 1..n {
            if !self.layers[i].floor_region().is_empty()
                && self.layers[i - 1].floor_region().is_empty()
                && !self.layers[i].infill().is_empty()
            {
                self.layers[i].merge_infill_into_floor();
            }
        }

        Ok(())
    }

    /// The ordered layer stack, bottom first.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Settings the model was sliced with.
    pub fn settings(&self) -> &SliceSettings {
        &self.settings
    }

    /// XY translation to apply to every path at emission.
    pub fn planar_offset(&self) -> [f64; 2] {
        self.settings.planar_offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::LayerState;

    /// Axis-aligned closed box as a 12-triangle mesh.
    fn box_mesh(min: [f64; 3], max: [f64; 3]) -> TriangleMesh {
        let [x0, y0, z0] = min;
        let [x1, y1, z1] = max;
        let vertices = vec![
            x0, y0, z0, x1, y0, z0, x1, y1, z0, x0, y1, z0, // bottom ring
            x0, y0, z1, x1, y0, z1, x1, y1, z1, x0, y1, z1, // top ring
        ];
        let indices = vec![
            0, 2, 1, 0, 3, 2, // bottom
            4, 5, 6, 4, 6, 7, // top
            0, 1, 5, 0, 5, 4, // front
            1, 2, 6, 1, 6, 5, // right
            2, 3, 7, 2, 7, 6, // back
            3, 0, 4, 3, 4, 7, // left
        ];
        TriangleMesh::new(vertices, indices)
    }

    /// Two stacked boxes as one mesh: a narrow column carrying a wide slab.
    fn mushroom_mesh() -> TriangleMesh {
        let column = box_mesh([7.5, 7.5, 0.0], [12.5, 12.5, 1.0]);
        let slab = box_mesh([0.0, 0.0, 1.0], [20.0, 20.0, 2.0]);

        let mut vertices = column.vertices;
        let base = (vertices.len() / 3) as u32;
        vertices.extend(slab.vertices);
        let mut indices = column.indices;
        indices.extend(slab.indices.iter().map(|&i| i + base));
        TriangleMesh::new(vertices, indices)
    }

    #[test]
    fn test_cube_slices_end_to_end() {
        let mesh = box_mesh([0.0, 0.0, 0.0], [10.0, 10.0, 2.0]);
        let model = Model::slice(&mesh, &SliceSettings::default()).unwrap();

        let layers = model.layers();
        assert_eq!(layers.len(), 10);
        for layer in layers {
            assert_eq!(layer.state(), LayerState::InfillDone);
            assert!(!layer.shells().is_empty());
            assert!(layer.support().is_empty());
        }

        // three solid floors, three solid roofs, sparse middle
        assert!(!layers[0].floor().is_empty());
        assert!(!layers[2].floor().is_empty());
        assert!(layers[4].floor().is_empty());
        assert!(layers[4].roof().is_empty());
        assert!(!layers[4].infill().is_empty());
        assert!(!layers[9].roof().is_empty());
        assert!(layers[9].floor().is_empty());
    }

    #[test]
    fn test_cube_shell_geometry() {
        let mesh = box_mesh([0.0, 0.0, 0.0], [10.0, 10.0, 2.0]);
        let model = Model::slice(&mesh, &SliceSettings::default()).unwrap();

        let layer = &model.layers()[5];
        assert_eq!(layer.shells().len(), 2);
        // outer shell is the footprint eroded by half the tool width
        let outer = clip::region_area(layer.outer_shell());
        assert!((outer - 9.6 * 9.6).abs() < 1e-2);
        let inner = clip::region_area(layer.inner_shell());
        assert!((inner - 8.8 * 8.8).abs() < 1e-2);
    }

    #[test]
    fn test_floor_follows_backing() {
        // floors appear where the layers below stop backing the interior:
        // the overhanging slab area stays floor until it has three solid
        // layers underneath
        let model = Model::slice(&mushroom_mesh(), &SliceSettings::default()).unwrap();
        let layers = model.layers();
        assert_eq!(layers.len(), 10);

        assert!(!layers[0].floor_region().is_empty());
        assert!(layers[4].floor_region().is_empty());
        assert!(!layers[5].floor_region().is_empty());
        assert!(!layers[6].floor_region().is_empty());
        assert!(!layers[7].floor_region().is_empty());
        assert!(layers[8].floor_region().is_empty());
    }

    #[test]
    fn test_prism_single_floor_layer() {
        let settings = SliceSettings {
            floor_layers: 1,
            roof_layers: 1,
            ..Default::default()
        };
        let mesh = box_mesh([0.0, 0.0, 0.0], [10.0, 10.0, 2.0]);
        let model = Model::slice(&mesh, &settings).unwrap();

        // a vertical prism grows floor on the base layer only
        for (i, layer) in model.layers().iter().enumerate() {
            assert_eq!(layer.floor_region().is_empty(), i != 0, "layer {i}");
        }
    }

    #[test]
    fn test_infill_merged_above_floor_transition() {
        let model = Model::slice(&mushroom_mesh(), &SliceSettings::default()).unwrap();
        let layers = model.layers();

        // layer 5 starts the slab: its infill is folded into the floor set
        assert!(!layers[5].floor_region().is_empty());
        assert!(layers[4].floor_region().is_empty());
        assert!(layers[5].infill().is_empty());
        assert!(!layers[5].floor().is_empty());
    }

    #[test]
    fn test_support_under_overhang() {
        let settings = SliceSettings {
            support_enabled: true,
            ..Default::default()
        };
        let model = Model::slice(&mushroom_mesh(), &settings).unwrap();
        let layers = model.layers();

        // the slab overhangs the column; every column layer supports it
        assert!(!layers[4].support().is_empty());
        assert!(!layers[0].support().is_empty());
        // slab layers are fully backed by the slab above them
        assert!(layers[6].support().is_empty());
        // topmost layer never carries support
        assert!(layers[9].support().is_empty());
    }

    #[test]
    fn test_support_disabled_by_default() {
        let model = Model::slice(&mushroom_mesh(), &SliceSettings::default()).unwrap();
        assert!(model.layers().iter().all(|l| l.support().is_empty()));
    }

    #[test]
    fn test_tree_support_replaces_mesh() {
        struct Widen;
        impl SupportAugmenter for Widen {
            fn augment(&self, mesh: &TriangleMesh) -> TriangleMesh {
                let _ = mesh;
                box_mesh([0.0, 0.0, 0.0], [20.0, 20.0, 2.0])
            }
        }

        let settings = SliceSettings {
            support_enabled: true,
            tree_support: true,
            ..Default::default()
        };
        let small = box_mesh([0.0, 0.0, 0.0], [5.0, 5.0, 2.0]);
        let model = Model::slice_with_support(&small, &Widen, &settings).unwrap();

        // sliced geometry is the augmented mesh, and planar support is
        // skipped in tree mode
        let outer = clip::region_area(model.layers()[5].outer_shell());
        assert!((outer - 19.6 * 19.6).abs() < 1e-2);
        assert!(model.layers().iter().all(|l| l.support().is_empty()));
    }

    #[test]
    fn test_empty_mesh_errors() {
        let result = Model::slice(&TriangleMesh::default(), &SliceSettings::default());
        assert!(matches!(result, Err(SlicerError::EmptyMesh)));
    }

    #[test]
    fn test_flat_mesh_errors() {
        let mesh = TriangleMesh::new(
            vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            vec![0, 1, 2],
        );
        let result = Model::slice(&mesh, &SliceSettings::default());
        assert!(matches!(result, Err(SlicerError::SliceFailed(_))));
    }

    #[test]
    fn test_planar_offset_accessor() {
        let settings = SliceSettings {
            planar_offset: [3.0, -1.5],
            ..Default::default()
        };
        let mesh = box_mesh([0.0, 0.0, 0.0], [10.0, 10.0, 2.0]);
        let model = Model::slice(&mesh, &settings).unwrap();
        assert_eq!(model.planar_offset(), [3.0, -1.5]);
    }
}
