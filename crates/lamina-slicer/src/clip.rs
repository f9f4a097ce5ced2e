//! Polygon engine facade.
//!
//! Boolean operations and offsetting are delegated to the Clipper backend
//! through `geo-clipper`; this module owns the conversions between the
//! crate's path types and `geo` geometry, even-odd regionization of raw
//! loops, and tolerance-based path simplification.
//!
//! Regions are flat path sets: counter-clockwise polygons are solid areas,
//! clockwise polygons are holes.

use geo::{Coord, LineString, MultiPolygon, Polygon as GeoPolygon};
use geo_clipper::{Clipper, EndType, JoinType};

use crate::path::{point_in_polygon, Point2, Polygon};

/// Fixed-point scaling factor handed to the clipper backend.
const CLIP_SCALE: f64 = 1e7;

/// Tolerance for path simplification and degenerate-ring rejection.
pub const SIMPLIFY_EPS: f64 = 1e-9;

/// Corner treatment for offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinStyle {
    /// Square corners.
    Square,
    /// Round corners.
    Round,
    /// Mitered corners.
    Miter,
}

impl From<JoinStyle> for JoinType {
    fn from(style: JoinStyle) -> Self {
        match style {
            JoinStyle::Square => JoinType::Square,
            JoinStyle::Round => JoinType::Round(0.25),
            JoinStyle::Miter => JoinType::Miter(2.0),
        }
    }
}

fn ring(points: &[Point2]) -> LineString<f64> {
    let mut coords: Vec<Coord<f64>> = points.iter().map(|p| Coord { x: p.x, y: p.y }).collect();
    if let (Some(first), Some(last)) = (coords.first().copied(), coords.last().copied()) {
        if first != last {
            coords.push(first);
        }
    }
    LineString::new(coords)
}

/// Convert a flat region into `geo` polygons, attaching each hole to the
/// smallest solid area containing it. Holes contained by nothing are
/// dropped as degenerate.
fn to_geo(region: &[Polygon]) -> MultiPolygon<f64> {
    let mut outers: Vec<usize> = Vec::new();
    let mut holes: Vec<usize> = Vec::new();

    for (i, poly) in region.iter().enumerate() {
        if poly.len() < 3 {
            continue;
        }
        if poly.is_ccw() {
            outers.push(i);
        } else {
            holes.push(i);
        }
    }

    let mut interiors: Vec<Vec<LineString<f64>>> = vec![Vec::new(); outers.len()];
    for &h in &holes {
        let Some(probe) = region[h].points.first() else {
            continue;
        };
        let owner = outers
            .iter()
            .enumerate()
            .filter(|(_, &o)| point_in_polygon(probe, &region[o]))
            .min_by(|(_, &a), (_, &b)| {
                region[a]
                    .signed_area()
                    .abs()
                    .partial_cmp(&region[b].signed_area().abs())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|(slot, _)| slot);
        if let Some(slot) = owner {
            interiors[slot].push(ring(&region[h].points));
        }
    }

    let polygons = outers
        .iter()
        .zip(interiors)
        .map(|(&o, inner)| GeoPolygon::new(ring(&region[o].points), inner))
        .collect();
    MultiPolygon::new(polygons)
}

fn ring_points(ls: &LineString<f64>) -> Vec<Point2> {
    let mut points: Vec<Point2> = ls.coords().map(|c| Point2::new(c.x, c.y)).collect();
    if points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    points
}

/// Flatten `geo` polygons back into a region: exteriors counter-clockwise,
/// holes clockwise, degenerate rings discarded.
fn from_geo(multi: &MultiPolygon<f64>) -> Vec<Polygon> {
    let mut out = Vec::new();

    for poly in &multi.0 {
        let mut exterior = Polygon::new(ring_points(poly.exterior()));
        if exterior.len() >= 3 && exterior.signed_area().abs() > SIMPLIFY_EPS {
            exterior.ensure_ccw();
            out.push(exterior);
        } else {
            continue;
        }
        for interior in poly.interiors() {
            let mut hole = Polygon::new(ring_points(interior));
            if hole.len() >= 3 && hole.signed_area().abs() > SIMPLIFY_EPS {
                hole.ensure_cw();
                out.push(hole);
            }
        }
    }

    out
}

/// Boolean union of two regions.
pub fn union(a: &[Polygon], b: &[Polygon]) -> Vec<Polygon> {
    if a.is_empty() {
        return b.to_vec();
    }
    if b.is_empty() {
        return a.to_vec();
    }
    from_geo(&to_geo(a).union(&to_geo(b), CLIP_SCALE))
}

/// Boolean intersection of two regions.
pub fn intersection(a: &[Polygon], b: &[Polygon]) -> Vec<Polygon> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }
    from_geo(&to_geo(a).intersection(&to_geo(b), CLIP_SCALE))
}

/// Boolean difference `a - b`.
pub fn difference(a: &[Polygon], b: &[Polygon]) -> Vec<Polygon> {
    if a.is_empty() {
        return Vec::new();
    }
    if b.is_empty() {
        return a.to_vec();
    }
    from_geo(&to_geo(a).difference(&to_geo(b), CLIP_SCALE))
}

/// Offset a region by `delta`: positive grows it outward, negative shrinks
/// it inward. An offset that empties the region returns an empty set.
pub fn inflate(region: &[Polygon], delta: f64, style: JoinStyle) -> Vec<Polygon> {
    if region.is_empty() {
        return Vec::new();
    }
    if delta == 0.0 {
        return region.to_vec();
    }
    from_geo(&to_geo(region).offset(delta, style.into(), EndType::ClosedPolygon, CLIP_SCALE))
}

/// Turn raw reconstructed loops into a well-formed region under the
/// even-odd fill rule.
///
/// Loop orientation out of reconstruction is arbitrary, so winding is
/// normalized first by containment parity: a loop nested inside an even
/// number of others is solid, an odd number makes it a hole. A self-union
/// through the backend then resolves overlaps.
pub fn regionize(loops: &[Polygon]) -> Vec<Polygon> {
    let mut normalized: Vec<Polygon> = Vec::with_capacity(loops.len());

    for (i, lp) in loops.iter().enumerate() {
        if lp.len() < 3 {
            continue;
        }
        let Some(probe) = lp.points.first() else {
            continue;
        };
        let depth = loops
            .iter()
            .enumerate()
            .filter(|&(j, other)| j != i && point_in_polygon(probe, other))
            .count();
        let mut lp = lp.clone();
        if depth % 2 == 0 {
            lp.ensure_ccw();
        } else {
            lp.ensure_cw();
        }
        normalized.push(lp);
    }

    if normalized.is_empty() {
        return Vec::new();
    }
    from_geo(&to_geo(&normalized).union(&MultiPolygon::new(Vec::new()), CLIP_SCALE))
}

/// Remove near-duplicate and collinear points from every path, dropping
/// paths that degenerate below three vertices or to near-zero area.
pub fn simplify(region: &[Polygon], tol: f64) -> Vec<Polygon> {
    region
        .iter()
        .map(|poly| Polygon::new(simplify_ring(&poly.points, tol)))
        .filter(|poly| poly.len() >= 3 && poly.signed_area().abs() > tol)
        .collect()
}

fn simplify_ring(points: &[Point2], tol: f64) -> Vec<Point2> {
    let mut pts: Vec<Point2> = Vec::with_capacity(points.len());
    for p in points {
        if let Some(last) = pts.last() {
            if (p - last).norm() <= tol {
                continue;
            }
        }
        pts.push(*p);
    }
    while pts.len() > 1 && (pts[0] - pts[pts.len() - 1]).norm() <= tol {
        pts.pop();
    }

    let n = pts.len();
    if n < 3 {
        return pts;
    }

    let mut out: Vec<Point2> = Vec::with_capacity(n);
    for i in 0..n {
        let prev = pts[(i + n - 1) % n];
        let cur = pts[i];
        let next = pts[(i + 1) % n];
        let chord = next - prev;
        let off = cur - prev;
        let chord_len = chord.norm();
        let deviation = if chord_len > tol {
            (chord.x * off.y - chord.y * off.x).abs() / chord_len
        } else {
            f64::MAX
        };
        if deviation > tol {
            out.push(cur);
        }
    }
    out
}

/// Net area of a region (holes subtract).
pub fn region_area(region: &[Polygon]) -> f64 {
    region.iter().map(Polygon::signed_area).sum()
}
