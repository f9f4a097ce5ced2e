//! Loop reconstruction - turn an unordered segment soup into closed polygons.
//!
//! Three passes run per plane: duplicate removal, collinear chain merging,
//! then adjacency-graph tracing. All vertex identity goes through the
//! [`Snapper`] grid so floating-point noise cannot split a vertex.

use std::collections::HashSet;

use crate::path::Polygon;
use crate::slice::Segment;
use crate::snap::{PointInterner, Snapper, VertexKey};

/// Remove degenerate and duplicate segments.
///
/// A segment whose snapped endpoints collide is dropped. Remaining segments
/// are keyed by the ordered pair of their endpoint keys so `(A,B)` and
/// `(B,A)` canonicalize identically; only the first occurrence of each key
/// survives. This removes the twin segment produced when two adjacent
/// triangles share an edge crossing the plane.
pub fn dedup_segments(segments: &[Segment], snap: &Snapper) -> Vec<Segment> {
    let mut seen: HashSet<(VertexKey, VertexKey)> = HashSet::new();
    let mut out = Vec::with_capacity(segments.len());

    for seg in segments {
        let ka = snap.key(&seg.a);
        let kb = snap.key(&seg.b);
        if ka == kb {
            continue;
        }
        let canonical = if ka <= kb { (ka, kb) } else { (kb, ka) };
        if seen.insert(canonical) {
            out.push(*seg);
        }
    }

    out
}

/// Fuse chains of collinear segments meeting at two-valent vertices.
///
/// Each pass computes every merge candidate from a freshly built adjacency
/// map, applies a non-conflicting subset, and rebuilds the segment list;
/// passes repeat until no vertex qualifies. Rebuilding per pass avoids the
/// index invalidation a mutate-while-scanning formulation would suffer.
pub fn merge_collinear(mut segments: Vec<Segment>, snap: &Snapper, tol: f64) -> Vec<Segment> {
    loop {
        let mut interner = PointInterner::new(*snap);
        let ends: Vec<(usize, usize)> = segments
            .iter()
            .map(|s| (interner.intern(&s.a), interner.intern(&s.b)))
            .collect();

        let mut incident: Vec<Vec<(usize, bool)>> = vec![Vec::new(); interner.len()];
        for (i, &(ia, ib)) in ends.iter().enumerate() {
            incident[ia].push((i, true));
            incident[ib].push((i, false));
        }

        let mut consumed = vec![false; segments.len()];
        let mut merged: Vec<Segment> = Vec::new();

        for refs in &incident {
            if refs.len() != 2 {
                continue;
            }
            let (i, i_starts_here) = refs[0];
            let (j, j_starts_here) = refs[1];
            if i == j || consumed[i] || consumed[j] {
                continue;
            }

            // orient segment i into the vertex and segment j out of it
            let (a_far, a_near) = if i_starts_here {
                (segments[i].b, segments[i].a)
            } else {
                (segments[i].a, segments[i].b)
            };
            let (b_near, b_far) = if j_starts_here {
                (segments[j].a, segments[j].b)
            } else {
                (segments[j].b, segments[j].a)
            };

            let (Some(d1), Some(d2)) = (
                (a_near - a_far).try_normalize(1e-12),
                (b_far - b_near).try_normalize(1e-12),
            ) else {
                continue;
            };

            let cross = d1.x * d2.y - d1.y * d2.x;
            let dot = d1.dot(&d2);
            // collinear and pointing the same way; a reversal at the
            // vertex must stay a corner
            if cross.abs() <= tol && dot >= -tol {
                consumed[i] = true;
                consumed[j] = true;
                merged.push(Segment { a: a_far, b: b_far });
            }
        }

        if merged.is_empty() {
            return segments;
        }

        let mut next: Vec<Segment> = segments
            .iter()
            .zip(&consumed)
            .filter(|(_, &c)| !c)
            .map(|(s, _)| *s)
            .collect();
        next.append(&mut merged);
        segments = next;
    }
}

/// Trace the segment set into closed polygon loops.
///
/// Segments are scanned in input order; each unused one seeds a trace that
/// repeatedly takes the *first* unused segment incident to the current
/// vertex (no preference among ambiguous branches) until the trace returns
/// to its start vertex. Traces that cannot continue are discarded, as are
/// loops shorter than three segments. A hard cap of four steps per segment
/// bounds malformed topology. Outer/hole classification is left to the
/// polygon engine's fill rule.
pub fn reconstruct_loops(segments: &[Segment], snap: &Snapper) -> Vec<Polygon> {
    if segments.is_empty() {
        return Vec::new();
    }

    let mut interner = PointInterner::new(*snap);
    let ends: Vec<(usize, usize)> = segments
        .iter()
        .map(|s| (interner.intern(&s.a), interner.intern(&s.b)))
        .collect();

    let mut incident: Vec<Vec<(usize, bool)>> = vec![Vec::new(); interner.len()];
    for (i, &(ia, ib)) in ends.iter().enumerate() {
        incident[ia].push((i, true));
        incident[ib].push((i, false));
    }

    let cap = segments.len() * 4;
    let mut used = vec![false; segments.len()];
    let mut loops = Vec::new();

    for s in 0..segments.len() {
        if used[s] {
            continue;
        }
        used[s] = true;

        let (start_id, mut cur_id) = ends[s];
        let mut points = vec![segments[s].a, segments[s].b];
        let mut closed = cur_id == start_id;
        let mut steps = 0usize;

        while !closed {
            steps += 1;
            if steps > cap {
                break;
            }

            let mut advanced = false;
            for &(t, t_starts_here) in &incident[cur_id] {
                if used[t] {
                    continue;
                }
                used[t] = true;
                // orient the segment so it starts at the current point
                let (next_point, next_id) = if t_starts_here {
                    (segments[t].b, ends[t].1)
                } else {
                    (segments[t].a, ends[t].0)
                };
                points.push(next_point);
                cur_id = next_id;
                advanced = true;
                break;
            }

            if !advanced {
                break;
            }
            closed = cur_id == start_id;
        }

        if !closed {
            // open trace: the partial loop is discarded, the plane just
            // contributes fewer polygons
            continue;
        }

        // Drop the repeated closing vertex; when a sub-grid residual gap
        // remains instead, the polygon's implicit closing edge spans it.
        if let (Some(&first), Some(&last)) = (points.first(), points.last()) {
            if (last - first).norm() < snap.eps() {
                points.pop();
            }
        }

        if points.len() >= 3 {
            loops.push(Polygon::new(points));
        }
    }

    loops
}

/// Full per-plane pipeline: deduplicate, merge collinear chains, trace.
pub fn loops_from_segments(segments: Vec<Segment>, snap: &Snapper, tol: f64) -> Vec<Polygon> {
    let deduped = dedup_segments(&segments, snap);
    let merged = merge_collinear(deduped, snap, tol);
    reconstruct_loops(&merged, snap)
}
