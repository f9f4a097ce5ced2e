//! Pattern fills: cross-hatch line grids and concentric solid fill.

use crate::clip::{self, JoinStyle, SIMPLIFY_EPS};
use crate::path::{region_bounds, Point2, Polygon, Polyline};

/// Emission order of the two cross-hatch directions.
///
/// Support fill alternates the order by layer parity so consecutive layers
/// peel apart more easily; model infill always leads with the horizontal
/// pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HatchOrder {
    /// Horizontal lines, then vertical.
    HorizontalFirst,
    /// Vertical lines, then horizontal.
    VerticalFirst,
}

/// Fill a region with a cross-hatch of horizontal and vertical lines at
/// the given spacing, clipped to the region. A zero-area region yields an
/// empty fill.
pub fn crosshatch(region: &[Polygon], spacing: f64, order: HatchOrder) -> Vec<Polyline> {
    let Some((min, max)) = region_bounds(region) else {
        return Vec::new();
    };

    let horizontal = scan_lines(region, spacing, min, max, false);
    let vertical = scan_lines(region, spacing, min, max, true);

    let mut paths = Vec::with_capacity(horizontal.len() + vertical.len());
    match order {
        HatchOrder::HorizontalFirst => {
            paths.extend(horizontal);
            paths.extend(vertical);
        }
        HatchOrder::VerticalFirst => {
            paths.extend(vertical);
            paths.extend(horizontal);
        }
    }
    paths
}

/// Clip one family of axis-aligned scan lines against the region.
///
/// Every boundary edge crossing the scan line contributes one coordinate;
/// sorting the crossings and pairing them realizes the even-odd rule, so
/// holes interrupt the lines without any containment test. Degenerate
/// spans are discarded.
fn scan_lines(
    region: &[Polygon],
    spacing: f64,
    min: Point2,
    max: Point2,
    vertical: bool,
) -> Vec<Polyline> {
    let mut paths = Vec::new();
    let (mut level, limit) = if vertical {
        (min.x + spacing, max.x)
    } else {
        (min.y + spacing, max.y)
    };

    while level < limit {
        let mut crossings: Vec<f64> = Vec::new();

        for poly in region {
            let n = poly.points.len();
            for i in 0..n {
                let p = poly.points[i];
                let q = poly.points[(i + 1) % n];
                let (pa, pq, pb, qb) = if vertical {
                    (p.x, q.x, p.y, q.y)
                } else {
                    (p.y, q.y, p.x, q.x)
                };
                if (pa > level) != (pq > level) {
                    crossings.push(pb + (level - pa) * (qb - pb) / (pq - pa));
                }
            }
        }

        crossings.sort_by(f64::total_cmp);

        for pair in crossings.chunks(2) {
            if pair.len() == 2 && pair[1] - pair[0] > SIMPLIFY_EPS {
                let (a, b) = if vertical {
                    (Point2::new(level, pair[0]), Point2::new(level, pair[1]))
                } else {
                    (Point2::new(pair[0], level), Point2::new(pair[1], level))
                };
                paths.push(Polyline::new(vec![a, b]));
            }
        }

        level += spacing;
    }

    paths
}

/// Fill a region solid by iterative inward offsetting: each pass emits the
/// current boundary as closed paths, then shrinks by `step` until the
/// offset empties the region.
pub fn solid_fill(region: &[Polygon], step: f64) -> Vec<Polyline> {
    let mut paths = Vec::new();
    let mut current = region.to_vec();

    while !current.is_empty() {
        paths.extend(current.iter().map(Polygon::to_polyline));
        current = clip::simplify(
            &clip::inflate(&current, -step, JoinStyle::Miter),
            SIMPLIFY_EPS,
        );
    }

    paths
}
