use crate::geom::EPS;
use crate::{Result, ThermalError, Tolerance};
use serde::{Deserialize, Serialize};

pub mod boolean;
pub mod relations;

/// Point in a two dimensional coordinate system (e.g. the local system of a plane).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn is_close(&self, other: &Self) -> bool {
        (self.x - other.x).abs() < EPS && (self.y - other.y).abs() < EPS
    }
}

/// Simple polygon in a two dimensional coordinate system.
///
/// Vertices are stored counter-clockwise without repeating the first vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon2 {
    vertices: Vec<Point2>,
}

impl Polygon2 {
    /// Creates a polygon from its outline.
    ///
    /// The orientation of `vertices` is corrected to counter-clockwise.
    /// Fails on fewer than three distinct vertices and on self-intersecting outlines.
    pub fn new(vertices: Vec<Point2>) -> Result<Self> {
        let polygon = Self::from_raw(vertices);
        if polygon.vertices.len() < 3 {
            return Err(ThermalError::Geometry(format!(
                "polygon needs at least 3 distinct vertices, got {}",
                polygon.vertices.len()
            )));
        }
        if polygon.is_self_intersecting() {
            return Err(ThermalError::Geometry(
                "polygon outline is self intersecting".to_string(),
            ));
        }
        Ok(polygon)
    }

    /// Axis-aligned rectangle spanned by two opposite corners.
    pub fn rectangle(lower: Point2, upper: Point2) -> Result<Self> {
        Self::new(vec![
            lower,
            Point2::new(upper.x, lower.y),
            upper,
            Point2::new(lower.x, upper.y),
        ])
    }

    /// Builds a polygon without validation. Drops repeated vertices and fixes orientation.
    pub(crate) fn from_raw(vertices: Vec<Point2>) -> Self {
        let mut pts: Vec<Point2> = Vec::with_capacity(vertices.len());
        for p in vertices {
            if pts.last().is_none_or(|last| !last.is_close(&p)) {
                pts.push(p);
            }
        }
        while pts.len() > 1 && pts[0].is_close(&pts[pts.len() - 1]) {
            pts.pop();
        }
        if signed_area(&pts) < 0.0 {
            pts.reverse();
        }
        Self { vertices: pts }
    }

    pub fn vertices(&self) -> &[Point2] {
        &self.vertices
    }

    /// Iterates over the edges as `(start, end)` pairs.
    pub fn edges(&self) -> impl Iterator<Item = (Point2, Point2)> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| (self.vertices[i], self.vertices[(i + 1) % n]))
    }

    pub fn area(&self) -> f64 {
        signed_area(&self.vertices).abs()
    }

    pub fn perimeter(&self) -> f64 {
        self.edges().map(|(a, b)| a.distance_to(&b)).sum()
    }

    /// Area centroid. Falls back to the vertex mean for degenerate polygons.
    pub fn centroid(&self) -> Point2 {
        let a = signed_area(&self.vertices);
        if a.abs() < EPS {
            let n = self.vertices.len().max(1) as f64;
            let sx: f64 = self.vertices.iter().map(|p| p.x).sum();
            let sy: f64 = self.vertices.iter().map(|p| p.y).sum();
            return Point2::new(sx / n, sy / n);
        }
        let (mut cx, mut cy) = (0.0, 0.0);
        for (p, q) in self.edges() {
            let w = p.x * q.y - q.x * p.y;
            cx += (p.x + q.x) * w;
            cy += (p.y + q.y) * w;
        }
        Point2::new(cx / (6.0 * a), cy / (6.0 * a))
    }

    /// Bounding box as `(lower, upper)` corners.
    pub fn envelope(&self) -> (Point2, Point2) {
        let mut lower = Point2::new(f64::MAX, f64::MAX);
        let mut upper = Point2::new(f64::MIN, f64::MIN);
        for p in &self.vertices {
            lower.x = lower.x.min(p.x);
            lower.y = lower.y.min(p.y);
            upper.x = upper.x.max(p.x);
            upper.y = upper.y.max(p.y);
        }
        (lower, upper)
    }

    pub fn is_convex(&self) -> bool {
        let n = self.vertices.len();
        if n < 3 {
            return false;
        }
        (0..n).all(|i| {
            let a = self.vertices[i];
            let b = self.vertices[(i + 1) % n];
            let c = self.vertices[(i + 2) % n];
            cross(a, b, c) >= -EPS
        })
    }

    /// Returns true if the smallest dimension of the polygon is below the length tolerance.
    ///
    /// The smallest dimension is estimated as `2 * area / perimeter`.
    pub fn is_negligible(&self, tolerance: &Tolerance) -> bool {
        if tolerance.length == 0.0 {
            return false;
        }
        let perimeter = self.perimeter();
        if perimeter < EPS {
            return true;
        }
        2.0 * self.area() / perimeter < tolerance.length
    }

    /// Splits the polygon into triangles by ear clipping.
    pub fn triangulate(&self) -> Vec<Polygon2> {
        let mut idx: Vec<usize> = (0..self.vertices.len()).collect();
        let mut triangles = Vec::with_capacity(idx.len().saturating_sub(2));
        while idx.len() > 3 {
            let n = idx.len();
            let ear = (0..n).find(|&k| {
                let a = self.vertices[idx[(k + n - 1) % n]];
                let b = self.vertices[idx[k]];
                let c = self.vertices[idx[(k + 1) % n]];
                if cross(a, b, c) <= EPS {
                    return false;
                }
                idx.iter()
                    .filter(|&&j| j != idx[(k + n - 1) % n] && j != idx[k] && j != idx[(k + 1) % n])
                    .all(|&j| !point_in_triangle(self.vertices[j], a, b, c))
            });
            // Degenerate remainder, cut the first vertex
            let k = ear.unwrap_or(0);
            triangles.push(Polygon2::from_raw(vec![
                self.vertices[idx[(k + n - 1) % n]],
                self.vertices[idx[k]],
                self.vertices[idx[(k + 1) % n]],
            ]));
            idx.remove(k);
        }
        if idx.len() == 3 {
            triangles.push(Polygon2::from_raw(
                idx.iter().map(|&i| self.vertices[i]).collect(),
            ));
        }
        triangles
    }

    fn is_self_intersecting(&self) -> bool {
        let n = self.vertices.len();
        for i in 0..n {
            let (a, b) = (self.vertices[i], self.vertices[(i + 1) % n]);
            for j in (i + 1)..n {
                // Neighbouring edges share a vertex
                if j == i + 1 || (i == 0 && j == n - 1) {
                    continue;
                }
                let (c, d) = (self.vertices[j], self.vertices[(j + 1) % n]);
                if segments_intersect(a, b, c, d) {
                    return true;
                }
            }
        }
        false
    }
}

/// z component of `(b - a) x (c - a)`.
pub(crate) fn cross(a: Point2, b: Point2, c: Point2) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

fn signed_area(pts: &[Point2]) -> f64 {
    let n = pts.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let p = pts[i];
        let q = pts[(i + 1) % n];
        sum += p.x * q.y - q.x * p.y;
    }
    0.5 * sum
}

fn point_in_triangle(p: Point2, a: Point2, b: Point2, c: Point2) -> bool {
    cross(a, b, p) >= 0.0 && cross(b, c, p) >= 0.0 && cross(c, a, p) >= 0.0
}

fn segments_intersect(a: Point2, b: Point2, c: Point2, d: Point2) -> bool {
    let d1 = cross(c, d, a);
    let d2 = cross(c, d, b);
    let d3 = cross(a, b, c);
    let d4 = cross(a, b, d);
    ((d1 > EPS && d2 < -EPS) || (d1 < -EPS && d2 > EPS))
        && ((d3 > EPS && d4 < -EPS) || (d3 < -EPS && d4 > EPS))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(size: f64) -> Polygon2 {
        Polygon2::rectangle(Point2::new(0.0, 0.0), Point2::new(size, size)).unwrap()
    }

    #[test]
    fn test_orientation_is_corrected() {
        let cw = Polygon2::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(0.0, 1.0),
            Point2::new(2.0, 1.0),
            Point2::new(2.0, 0.0),
        ])
        .unwrap();
        assert!((cw.area() - 2.0).abs() < 1e-12);
        assert!(signed_area(cw.vertices()) > 0.0);
    }

    #[test]
    fn test_rejects_bow_tie() {
        let bow_tie = Polygon2::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(1.0, 0.0),
            Point2::new(0.0, 1.0),
        ]);
        assert!(bow_tie.is_err());
        assert!(Polygon2::new(vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)]).is_err());
    }

    #[test]
    fn test_centroid_and_envelope() {
        let sq = square(2.0);
        let c = sq.centroid();
        assert!((c.x - 1.0).abs() < 1e-12 && (c.y - 1.0).abs() < 1e-12);
        let (lo, hi) = sq.envelope();
        assert!(lo.is_close(&Point2::new(0.0, 0.0)));
        assert!(hi.is_close(&Point2::new(2.0, 2.0)));
        assert!((sq.perimeter() - 8.0).abs() < 1e-12);
    }

    #[test]
    fn test_is_negligible() {
        let tol = Tolerance::default();
        let sliver =
            Polygon2::rectangle(Point2::new(0.0, 0.0), Point2::new(1.0, 1e-8)).unwrap();
        assert!(sliver.is_negligible(&tol));
        assert!(!square(1e-3).is_negligible(&tol));
        let zero = Tolerance::new(0.0, 0.0, 0.0).unwrap();
        assert!(!sliver.is_negligible(&zero));
    }

    #[test]
    fn test_triangulate_l_shape() {
        let l_shape = Polygon2::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(2.0, 1.0),
            Point2::new(1.0, 1.0),
            Point2::new(1.0, 2.0),
            Point2::new(0.0, 2.0),
        ])
        .unwrap();
        assert!(!l_shape.is_convex());
        let triangles = l_shape.triangulate();
        assert_eq!(triangles.len(), 4);
        let total: f64 = triangles.iter().map(|t| t.area()).sum();
        assert!((total - 3.0).abs() < 1e-12, "total={}", total);
    }
}
