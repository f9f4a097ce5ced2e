//! Input triangle mesh.

/// A triangulated surface mesh.
///
/// Vertices are stored as flat `[x, y, z]` triples in world units; indices
/// reference vertices in groups of three.
#[derive(Debug, Clone, Default)]
pub struct TriangleMesh {
    /// Vertex coordinates, three per vertex.
    pub vertices: Vec<f64>,
    /// Triangle vertex indices, three per triangle.
    pub indices: Vec<u32>,
}

impl TriangleMesh {
    /// Create a mesh from raw vertex and index buffers.
    pub fn new(vertices: Vec<f64>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Whether the mesh has no triangles.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.indices.is_empty()
    }

    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Coordinates of vertex `i`.
    pub fn vertex(&self, i: usize) -> [f64; 3] {
        [
            self.vertices[i * 3],
            self.vertices[i * 3 + 1],
            self.vertices[i * 3 + 2],
        ]
    }

    /// Compute the bounding box of the mesh.
    /// Returns `(min, max)` as `([x, y, z], [x, y, z])`.
    pub fn bounds(&self) -> Option<([f64; 3], [f64; 3])> {
        if self.vertices.is_empty() {
            return None;
        }

        let mut min = [f64::MAX, f64::MAX, f64::MAX];
        let mut max = [f64::MIN, f64::MIN, f64::MIN];

        for i in 0..(self.vertices.len() / 3) {
            for axis in 0..3 {
                let v = self.vertices[i * 3 + axis];
                min[axis] = min[axis].min(v);
                max[axis] = max[axis].max(v);
            }
        }

        Some((min, max))
    }
}

/// Pre-slicing mesh substitution seam.
///
/// A tree-support generator synthesizes auxiliary support geometry and
/// merges it into the input mesh before any plane is intersected. The
/// slicing core treats the result as an opaque replacement mesh.
pub trait SupportAugmenter {
    /// Return the mesh to slice in place of `mesh`.
    fn augment(&self, mesh: &TriangleMesh) -> TriangleMesh;
}
