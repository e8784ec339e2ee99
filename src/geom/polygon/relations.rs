//! Edge relations between polygons: shared edges and self adjacency.

use super::{Point2, Polygon2};
use crate::Tolerance;
use crate::geom::EPS;

impl Polygon2 {
    /// Returns true if `self` and `other` share a piece of an edge longer than the length
    /// tolerance.
    ///
    /// Touching in a single point (tangency) is not adjacency.
    /// The result is undefined for overlapping polygons.
    pub fn is_adjacent_to(&self, other: &Polygon2, tolerance: &Tolerance) -> bool {
        edge_lies_on_edge(self, other, tolerance.length)
            || edge_lies_on_edge(other, self, tolerance.length)
            || collinear_edges_overlap(self.vertices(), other.vertices(), tolerance, false)
    }

    /// Returns true if two edges of the polygon run along each other, i.e. the polygon
    /// folds back onto itself within the length tolerance.
    pub fn is_self_adjacent(&self, tolerance: &Tolerance) -> bool {
        let pts = self.vertices();
        let n = pts.len();
        for i in 0..n {
            for j in 0..n {
                if i == j {
                    continue;
                }
                let (a, b) = (pts[j], pts[(j + 1) % n]);
                if distance_to_segment(pts[i], a, b) < tolerance.length
                    && distance_to_segment(pts[(i + 1) % n], a, b) < tolerance.length
                {
                    return true;
                }
            }
        }
        collinear_edges_overlap(pts, pts, tolerance, true)
    }
}

/// Both ends of an edge of `lhs` lie on one edge of `rhs`.
fn edge_lies_on_edge(lhs: &Polygon2, rhs: &Polygon2, length: f64) -> bool {
    lhs.edges().any(|(p, q)| {
        rhs.edges().any(|(a, b)| {
            distance_to_segment(p, a, b) < length && distance_to_segment(q, a, b) < length
        })
    })
}

/// A vertex of `rhs` touches an edge of `lhs`, one of the edges at that vertex is
/// parallel to the touched edge, and the two edges overlap by more than the length tolerance.
fn collinear_edges_overlap(
    lhs: &[Point2],
    rhs: &[Point2],
    tolerance: &Tolerance,
    same_polygon: bool,
) -> bool {
    let n = lhs.len();
    let m = rhs.len();
    for i in 0..n {
        let ipp = (i + 1) % n;
        let (p, q) = (lhs[i], lhs[ipp]);
        for j in 0..m {
            // Within one polygon, skip vertices that belong to the edge or its neighbours
            if same_polygon && ring_distance(i, j, n) <= 2 {
                continue;
            }
            if distance_to_segment(rhs[j], p, q) >= tolerance.length {
                continue;
            }
            for k in [(j + 1) % m, (j + m - 1) % m] {
                if !are_parallel(p, q, rhs[j], rhs[k], tolerance.angle) {
                    continue;
                }
                let reach = rhs[j].distance_to(&rhs[k]) - tolerance.length;
                let inside =
                    |v: Point2| rhs[j].distance_to(&v) < reach && rhs[k].distance_to(&v) < reach;
                if inside(p) || inside(q) {
                    return true;
                }
            }
        }
    }
    false
}

fn ring_distance(i: usize, j: usize, n: usize) -> usize {
    let d = i.abs_diff(j);
    d.min(n - d)
}

fn are_parallel(a: Point2, b: Point2, c: Point2, d: Point2, angle: f64) -> bool {
    let (ux, uy) = (b.x - a.x, b.y - a.y);
    let (vx, vy) = (d.x - c.x, d.y - c.y);
    let cross = ux * vy - uy * vx;
    let dot = ux * vx + uy * vy;
    if ux.hypot(uy) < EPS || vx.hypot(vy) < EPS {
        return false;
    }
    let phi = cross.abs().atan2(dot);
    phi <= angle + EPS || std::f64::consts::PI - phi <= angle + EPS
}

/// Shortest distance between point `p` and segment (a, b).
pub(crate) fn distance_to_segment(p: Point2, a: Point2, b: Point2) -> f64 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len2 = dx * dx + dy * dy;
    if len2 < EPS * EPS {
        return p.distance_to(&a);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len2).clamp(0.0, 1.0);
    p.distance_to(&Point2::new(a.x + t * dx, a.y + t * dy))
}
