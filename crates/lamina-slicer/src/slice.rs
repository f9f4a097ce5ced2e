//! Plane intersection - cut mesh triangles with horizontal planes.

use crate::mesh::TriangleMesh;
use crate::path::Point2;

/// Tie-break bias for the crossing test: a vertex lying exactly on the
/// plane counts as below it, so exact-plane touches never admit an edge.
const PLANE_DELTA: f64 = 1e-10;

/// One unordered cross-section segment at a fixed plane height, projected
/// to the XY plane.
#[derive(Debug, Clone, Copy)]
pub struct Segment {
    /// First endpoint.
    pub a: Point2,
    /// Second endpoint.
    pub b: Point2,
}

/// A triangle with its vertices and bounding Z range.
#[derive(Debug, Clone, Copy)]
pub struct Triangle {
    v: [[f64; 3]; 3],
    z_min: f64,
    z_max: f64,
}

/// Extract triangles from a mesh for slicing, caching each one's Z range.
pub fn extract_triangles(mesh: &TriangleMesh) -> Vec<Triangle> {
    let mut triangles = Vec::with_capacity(mesh.triangle_count());

    for i in 0..mesh.triangle_count() {
        let v = [
            mesh.vertex(mesh.indices[i * 3] as usize),
            mesh.vertex(mesh.indices[i * 3 + 1] as usize),
            mesh.vertex(mesh.indices[i * 3 + 2] as usize),
        ];
        let z_min = v[0][2].min(v[1][2]).min(v[2][2]);
        let z_max = v[0][2].max(v[1][2]).max(v[2][2]);
        triangles.push(Triangle { v, z_min, z_max });
    }

    triangles
}

/// Intersect every triangle with the horizontal plane at `z`, producing
/// unordered segments.
pub fn segments_at(triangles: &[Triangle], z: f64) -> Vec<Segment> {
    let mut segments = Vec::new();

    for tri in triangles {
        if tri.z_max < z || tri.z_min > z {
            continue;
        }
        if let Some(seg) = triangle_plane_intersection(tri, z) {
            segments.push(seg);
        }
    }

    segments
}

/// Intersect a single triangle with the plane at `z`.
///
/// An edge is admitted when exactly one of its endpoints is strictly above
/// `z + PLANE_DELTA`; the intersection point is interpolated along it. A
/// triangle contributes a segment iff exactly two such crossings exist -
/// triangles entirely above, entirely below, or lying on the plane yield
/// nothing, and so do degenerate multi-crossing configurations.
fn triangle_plane_intersection(tri: &Triangle, z: f64) -> Option<Segment> {
    let mut points: Vec<Point2> = Vec::with_capacity(2);

    for i in 0..3 {
        for j in 0..3 {
            if i == j {
                continue;
            }
            let a = tri.v[i];
            let b = tri.v[j];
            if a[2] > z + PLANE_DELTA && b[2] <= z + PLANE_DELTA {
                let t = (z - a[2]) / (b[2] - a[2]);
                points.push(Point2::new(
                    a[0] + t * (b[0] - a[0]),
                    a[1] + t * (b[1] - a[1]),
                ));
            }
        }
    }

    if points.len() == 2 {
        Some(Segment {
            a: points[0],
            b: points[1],
        })
    } else {
        None
    }
}

/// Generate slicing plane heights as layer midpoints:
/// `z_min + (i + 0.5) * layer_height`.
pub fn layer_heights(z_min: f64, z_max: f64, layer_height: f64) -> Vec<f64> {
    let mut heights = Vec::new();
    if z_max <= z_min || layer_height <= 0.0 {
        return heights;
    }

    let mut i = 0usize;
    loop {
        let z = z_min + (i as f64 + 0.5) * layer_height;
        if z >= z_max {
            break;
        }
        heights.push(z);
        i += 1;
    }

    heights
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle(v0: [f64; 3], v1: [f64; 3], v2: [f64; 3]) -> Triangle {
        let mesh = TriangleMesh::new(
            v0.iter().chain(&v1).chain(&v2).copied().collect(),
            vec![0, 1, 2],
        );
        extract_triangles(&mesh)[0]
    }

    #[test]
    fn test_crossing_triangle() {
        let tri = triangle([0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 0.0, 2.0]);
        let seg = triangle_plane_intersection(&tri, 1.0).unwrap();
        // cuts the vertical edge at (0,0) and the hypotenuse at (1,0)
        let mut xs = [seg.a.x, seg.b.x];
        xs.sort_by(f64::total_cmp);
        assert!((xs[0]).abs() < 1e-12);
        assert!((xs[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_no_crossing() {
        let above = triangle([0.0, 0.0, 2.0], [1.0, 0.0, 3.0], [0.0, 1.0, 2.5]);
        assert!(triangle_plane_intersection(&above, 1.0).is_none());

        let below = triangle([0.0, 0.0, 0.0], [1.0, 0.0, 0.5], [0.0, 1.0, 0.2]);
        assert!(triangle_plane_intersection(&below, 1.0).is_none());
    }

    #[test]
    fn test_coplanar_triangle_yields_nothing() {
        let flat = triangle([0.0, 0.0, 1.0], [1.0, 0.0, 1.0], [0.0, 1.0, 1.0]);
        assert!(triangle_plane_intersection(&flat, 1.0).is_none());
    }

    #[test]
    fn test_vertex_on_plane() {
        // one vertex exactly on the plane, one above, one below:
        // the on-plane vertex counts as below, giving two crossings
        let tri = triangle([0.0, 0.0, 1.0], [2.0, 0.0, 2.0], [0.0, 2.0, 0.0]);
        assert!(triangle_plane_intersection(&tri, 1.0).is_some());
    }

    #[test]
    fn test_layer_heights_are_midpoints() {
        let heights = layer_heights(0.0, 1.0, 0.25);
        assert_eq!(heights.len(), 4);
        assert!((heights[0] - 0.125).abs() < 1e-12);
        assert!((heights[3] - 0.875).abs() < 1e-12);

        assert!(layer_heights(1.0, 1.0, 0.25).is_empty());
        assert!(layer_heights(0.0, 1.0, 0.0).is_empty());
    }
}
