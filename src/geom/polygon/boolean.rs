//! Intersection of polygons in a common two dimensional coordinate system.
//!
//! Clipping uses the Sutherland-Hodgman algorithm, which needs a convex clip
//! polygon. Non-convex pairs are handled by clipping against the triangles of
//! one of the polygons.

use super::{Point2, Polygon2, cross};
use crate::Tolerance;
use crate::geom::EPS;

impl Polygon2 {
    /// Returns the polygons forming the overlap of `self` and `other`.
    ///
    /// Pieces without area and pieces that are negligible by `tolerance` are dropped,
    /// so polygons that only share an edge or a vertex have an empty intersection.
    pub fn intersection(&self, other: &Polygon2, tolerance: &Tolerance) -> Vec<Polygon2> {
        let pieces: Vec<Polygon2> = if other.is_convex() {
            vec![clip(self, other)]
        } else if self.is_convex() {
            vec![clip(other, self)]
        } else {
            other
                .triangulate()
                .iter()
                .map(|triangle| clip(self, triangle))
                .collect()
        };

        pieces
            .into_iter()
            .filter(|p| p.vertices().len() >= 3 && p.area() > EPS && !p.is_negligible(tolerance))
            .collect()
    }

    /// Total area of the overlap of `self` and `other`.
    pub fn overlap_area(&self, other: &Polygon2, tolerance: &Tolerance) -> f64 {
        self.intersection(other, tolerance)
            .iter()
            .map(|p| p.area())
            .sum()
    }

    /// Returns true if both polygons share a non-negligible area.
    pub fn intersects(&self, other: &Polygon2, tolerance: &Tolerance) -> bool {
        !self.intersection(other, tolerance).is_empty()
    }
}

fn clip(subject: &Polygon2, clip_poly: &Polygon2) -> Polygon2 {
    let mut output: Vec<Point2> = subject.vertices().to_vec();

    for (edge_start, edge_end) in clip_poly.edges() {
        if output.is_empty() {
            break;
        }
        let input = std::mem::take(&mut output);

        for j in 0..input.len() {
            let current = input[j];
            let previous = input[(j + input.len() - 1) % input.len()];

            let curr_inside = cross(edge_start, edge_end, current) >= -EPS;
            let prev_inside = cross(edge_start, edge_end, previous) >= -EPS;

            if curr_inside {
                if !prev_inside
                    && let Some(p) = line_intersection(previous, current, edge_start, edge_end)
                {
                    output.push(p);
                }
                output.push(current);
            } else if prev_inside
                && let Some(p) = line_intersection(previous, current, edge_start, edge_end)
            {
                output.push(p);
            }
        }
    }

    Polygon2::from_raw(output)
}

/// Intersection of segment (p1, p2) with the infinite line through (p3, p4).
fn line_intersection(p1: Point2, p2: Point2, p3: Point2, p4: Point2) -> Option<Point2> {
    let d1 = (p2.x - p1.x, p2.y - p1.y);
    let d2 = (p4.x - p3.x, p4.y - p3.y);
    let denom = d1.0 * d2.1 - d1.1 * d2.0;
    if denom.abs() < EPS {
        return None;
    }
    let t = ((p3.x - p1.x) * d2.1 - (p3.y - p1.y) * d2.0) / denom;
    Some(Point2::new(p1.x + t * d1.0, p1.y + t * d1.1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon2 {
        Polygon2::rectangle(Point2::new(x0, y0), Point2::new(x1, y1)).unwrap()
    }

    #[test]
    fn test_partial_overlap() {
        let tol = Tolerance::default();
        let a = rect(0.0, 0.0, 2.0, 2.0);
        let b = rect(1.0, 1.0, 3.0, 3.0);
        assert!((a.overlap_area(&b, &tol) - 1.0).abs() < 1e-12);
        assert!((b.overlap_area(&a, &tol) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_full_containment() {
        let tol = Tolerance::default();
        let outer = rect(0.0, 0.0, 4.0, 4.0);
        let inner = rect(1.0, 1.0, 2.0, 3.0);
        assert!((outer.overlap_area(&inner, &tol) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_shared_edge_is_not_an_intersection() {
        let tol = Tolerance::default();
        let a = rect(0.0, 0.0, 1.0, 1.0);
        let b = rect(1.0, 0.0, 2.0, 1.0);
        assert!(!a.intersects(&b, &tol));
        let zero = Tolerance::new(0.0, 0.0, 0.0).unwrap();
        assert!(!a.intersects(&b, &zero));
    }

    #[test]
    fn test_non_convex_pair() {
        let tol = Tolerance::default();
        let l_shape = |dx: f64| {
            Polygon2::new(vec![
                Point2::new(dx, 0.0),
                Point2::new(dx + 2.0, 0.0),
                Point2::new(dx + 2.0, 1.0),
                Point2::new(dx + 1.0, 1.0),
                Point2::new(dx + 1.0, 2.0),
                Point2::new(dx, 2.0),
            ])
            .unwrap()
        };
        let a = l_shape(0.0);
        let b = l_shape(0.0);
        assert!((a.overlap_area(&b, &tol) - 3.0).abs() < 1e-9);
        let shifted = l_shape(1.0);
        // Overlap is the unit square [1,2]x[0,1]
        assert!((a.overlap_area(&shifted, &tol) - 1.0).abs() < 1e-9);
    }
}
