use crate::geom::plane::Plane;
use crate::geom::polygon::{Point2, Polygon2};
use crate::{Point, Result, ThermalError, Tolerance};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of a surface area relative to its thermal element or block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Location {
    Top,
    Side,
    Bottom,
}

impl Location {
    pub const ALL: [Location; 3] = [Location::Top, Location::Side, Location::Bottom];

    /// Position of this location in per-location tables.
    pub fn index(self) -> usize {
        match self {
            Location::Top => 0,
            Location::Side => 1,
            Location::Bottom => 2,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Location::Top => "TOP",
            Location::Side => "SIDE",
            Location::Bottom => "BOTTOM",
        };
        f.write_str(s)
    }
}

/// Planar surface patch of a thermal element or a cooling region.
#[derive(Debug, Clone)]
pub struct Area {
    plane: Plane,
    polygon: Polygon2,
    distance_to_grid_vertex: f64,
    conductivity: f64,
    location: Location,
}

/// Bounding box and centroids of a set of coplanar areas, in the local system of the
/// aggregating area.
#[derive(Debug, Clone)]
pub struct AggregatedAreas {
    pub lowest: Point2,
    pub highest: Point2,
    /// One entry per input area, `None` for areas that are not coplanar.
    pub centroids: Vec<Option<Point2>>,
}

impl Area {
    /// `vertices` are given in the local coordinate system of `plane`.
    pub fn new(
        vertices: Vec<Point2>,
        plane: Plane,
        distance_to_grid_vertex: f64,
        conductivity: f64,
        location: Location,
    ) -> Result<Self> {
        if !(distance_to_grid_vertex >= 0.0) {
            return Err(ThermalError::invalid(
                "distance_to_grid_vertex",
                format!("must be non-negative, got {distance_to_grid_vertex}"),
            ));
        }
        if !(conductivity >= 0.0) {
            return Err(ThermalError::invalid(
                "conductivity",
                format!("must be non-negative, got {conductivity}"),
            ));
        }
        Ok(Self {
            plane,
            polygon: Polygon2::new(vertices)?,
            distance_to_grid_vertex,
            conductivity,
            location,
        })
    }

    pub fn plane(&self) -> &Plane {
        &self.plane
    }

    pub fn polygon(&self) -> &Polygon2 {
        &self.polygon
    }

    pub fn distance_to_grid_vertex(&self) -> f64 {
        self.distance_to_grid_vertex
    }

    pub fn conductivity(&self) -> f64 {
        self.conductivity
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn area_value(&self) -> f64 {
        self.polygon.area()
    }

    /// Vertices in global cartesian coordinates.
    pub fn global_vertices(&self) -> Vec<Point> {
        self.polygon
            .vertices()
            .iter()
            .map(|&p| self.plane.global(p))
            .collect()
    }

    pub fn is_coplanar_to(&self, other: &Area, tolerance: &Tolerance) -> bool {
        self.plane.is_coplanar_to(&other.plane, tolerance)
    }

    pub fn is_horizontal(&self, tolerance: &Tolerance) -> bool {
        self.plane.is_horizontal(tolerance)
    }

    /// Area value of the overlap with `other`, zero if both are not coplanar.
    pub fn overlap_with(&self, other: &Area, tolerance: &Tolerance) -> f64 {
        if !self.is_coplanar_to(other, tolerance) {
            return 0.0;
        }
        let transformed = self.transform_into_local(other);
        self.polygon.overlap_area(&transformed, tolerance)
    }

    /// Bounding box and centroids of `areas` in the local system of this area.
    ///
    /// Areas that are not coplanar to this one are skipped.
    pub fn aggregate(&self, areas: &[&Area], tolerance: &Tolerance) -> AggregatedAreas {
        let mut lowest = Point2::new(f64::MAX, f64::MAX);
        let mut highest = Point2::new(f64::MIN, f64::MIN);
        let mut centroids = Vec::with_capacity(areas.len());

        for area in areas {
            if !self.is_coplanar_to(area, tolerance) {
                centroids.push(None);
                continue;
            }
            let local = self.transform_into_local(area);
            let (lo, hi) = local.envelope();
            lowest.x = lowest.x.min(lo.x);
            lowest.y = lowest.y.min(lo.y);
            highest.x = highest.x.max(hi.x);
            highest.y = highest.y.max(hi.y);
            centroids.push(Some(local.centroid()));
        }

        AggregatedAreas {
            lowest,
            highest,
            centroids,
        }
    }

    /// Polygon of a coplanar `other` expressed in the local system of this area.
    fn transform_into_local(&self, other: &Area) -> Polygon2 {
        Polygon2::from_raw(
            other
                .polygon
                .vertices()
                .iter()
                .map(|&p| self.plane.transform_from(&other.plane, p))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Vector;

    fn unit_square() -> Vec<Point2> {
        vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        ]
    }

    #[test]
    fn test_overlap_of_stacked_faces() {
        let tol = Tolerance::default();
        let top = Area::new(
            unit_square(),
            Plane::horizontal(Point::new(0.0, 0.0, 1.0)),
            0.5,
            1.0,
            Location::Top,
        )
        .unwrap();
        let bottom = Area::new(
            unit_square(),
            Plane::horizontal(Point::new(0.5, 0.5, 1.0)),
            0.5,
            1.0,
            Location::Bottom,
        )
        .unwrap();
        assert!((top.overlap_with(&bottom, &tol) - 0.25).abs() < 1e-12);
        assert!((bottom.overlap_with(&top, &tol) - 0.25).abs() < 1e-12);

        let elsewhere = Area::new(
            unit_square(),
            Plane::horizontal(Point::new(0.0, 0.0, 2.0)),
            0.5,
            1.0,
            Location::Bottom,
        )
        .unwrap();
        assert_eq!(top.overlap_with(&elsewhere, &tol), 0.0);
    }

    #[test]
    fn test_overlap_of_opposite_side_faces() {
        let tol = Tolerance::default();
        let right = Area::new(
            unit_square(),
            Plane::vertical(Point::new(1.0, 0.0, 0.0), Vector::Y).unwrap(),
            0.5,
            1.0,
            Location::Side,
        )
        .unwrap();
        let left = Area::new(
            unit_square(),
            Plane::vertical(Point::new(1.0, 1.5, 0.0), -Vector::Y).unwrap(),
            0.5,
            1.0,
            Location::Side,
        )
        .unwrap();
        // left covers y in [0.5, 1.5]
        assert!((right.overlap_with(&left, &tol) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_aggregate_bounding_box() {
        let tol = Tolerance::default();
        let a = Area::new(
            unit_square(),
            Plane::horizontal(Point::new(0.0, 0.0, 0.0)),
            0.5,
            1.0,
            Location::Top,
        )
        .unwrap();
        let b = Area::new(
            unit_square(),
            Plane::horizontal(Point::new(2.0, 1.0, 0.0)),
            0.5,
            1.0,
            Location::Top,
        )
        .unwrap();
        let c = Area::new(
            unit_square(),
            Plane::horizontal(Point::new(0.0, 0.0, 3.0)),
            0.5,
            1.0,
            Location::Top,
        )
        .unwrap();
        let agg = a.aggregate(&[&a, &b, &c], &tol);
        assert!(agg.lowest.is_close(&Point2::new(0.0, 0.0)));
        assert!(agg.highest.is_close(&Point2::new(3.0, 2.0)));
        assert!(agg.centroids[2].is_none());
        let cb = agg.centroids[1].unwrap();
        assert!(cb.is_close(&Point2::new(2.5, 1.5)));
    }

    #[test]
    fn test_rejects_negative_parameters() {
        let plane = Plane::horizontal(Point::new(0.0, 0.0, 0.0));
        assert!(Area::new(unit_square(), plane, -1.0, 1.0, Location::Top).is_err());
        assert!(Area::new(unit_square(), plane, 1.0, -1.0, Location::Top).is_err());
    }
}
