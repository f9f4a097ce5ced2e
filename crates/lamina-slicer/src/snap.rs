//! Coordinate snapping and point interning.
//!
//! Floating-point intersection points that should be the same vertex never
//! compare exactly equal. The [`Snapper`] quantizes coordinates onto an
//! integer grid so nearly-identical points share one [`VertexKey`]; the
//! [`PointInterner`] maps keys to dense vertex ids so the tracing hot loops
//! index arrays instead of hashing floats.

use std::collections::HashMap;

use crate::path::Point2;

/// Integer grid key identifying coincident vertices.
///
/// Equality is exact under the rounding, not under geometric distance: two
/// points farther apart than the grid step can still collide when they
/// straddle a rounding boundary. That is an accepted tie-break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexKey(pub i64, pub i64);

/// Quantizes 2D coordinates to [`VertexKey`]s at a fixed grid step.
#[derive(Debug, Clone, Copy)]
pub struct Snapper {
    eps: f64,
}

impl Snapper {
    /// Create a snapper with the given grid step.
    pub fn new(eps: f64) -> Self {
        Self { eps }
    }

    /// The grid step.
    pub fn eps(&self) -> f64 {
        self.eps
    }

    /// Quantize a point to its grid key.
    pub fn key(&self, p: &Point2) -> VertexKey {
        VertexKey(
            (p.x / self.eps).round() as i64,
            (p.y / self.eps).round() as i64,
        )
    }

    /// Do two points land on the same grid cell?
    pub fn coincident(&self, a: &Point2, b: &Point2) -> bool {
        self.key(a) == self.key(b)
    }
}

/// Arena interner assigning dense ids to snapped points.
///
/// The first point seen for a key becomes the representative coordinate
/// for that vertex id.
#[derive(Debug, Clone)]
pub struct PointInterner {
    snap: Snapper,
    ids: HashMap<VertexKey, usize>,
    points: Vec<Point2>,
}

impl PointInterner {
    /// Create an empty interner.
    pub fn new(snap: Snapper) -> Self {
        Self {
            snap,
            ids: HashMap::new(),
            points: Vec::new(),
        }
    }

    /// Intern a point, returning its vertex id.
    pub fn intern(&mut self, p: &Point2) -> usize {
        let key = self.snap.key(p);
        if let Some(&id) = self.ids.get(&key) {
            return id;
        }
        let id = self.points.len();
        self.ids.insert(key, id);
        self.points.push(*p);
        id
    }

    /// Representative coordinate for a vertex id.
    pub fn point(&self, id: usize) -> Point2 {
        self.points[id]
    }

    /// Number of distinct vertices interned so far.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether no vertex has been interned yet.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
