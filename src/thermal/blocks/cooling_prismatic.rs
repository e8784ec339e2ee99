use crate::geom::area::{Area, Location};
use crate::geom::block_geometry::BlockGeometry;
use crate::geom::plane::Plane;
use crate::geom::polygon::{Point2, Polygon2};
use crate::thermal::blocks::CoolingBlock;
use crate::thermal::cooling::Cooling;
use crate::{Point, Result, ThermalError, Vector};
use std::sync::Arc;

/// Cooling region shaped as a vertical prism over a polygon in the xy plane,
/// e.g. a cold plate below the cells or a cooling fin between them.
#[derive(Debug, Clone)]
pub struct CoolingPrismatic {
    description: String,
    base: Polygon2,
    z_lower: f64,
    z_upper: f64,
    cooling: Arc<Cooling>,
}

impl CoolingPrismatic {
    pub fn new(
        description: &str,
        vertices: Vec<Point2>,
        z_lower: f64,
        z_upper: f64,
        cooling: Arc<Cooling>,
    ) -> Result<Self> {
        if !(z_lower < z_upper) {
            return Err(ThermalError::invalid(
                "z_lower",
                format!("{description}: z_lower ({z_lower}) must be below z_upper ({z_upper})"),
            ));
        }
        if vertices.len() < 3 {
            return Err(ThermalError::invalid(
                "vertices",
                format!("{description}: need at least 3 vertices, got {}", vertices.len()),
            ));
        }
        Ok(Self {
            description: description.to_string(),
            base: Polygon2::new(vertices)?,
            z_lower,
            z_upper,
            cooling,
        })
    }
}

impl CoolingBlock for CoolingPrismatic {
    fn description(&self) -> &str {
        &self.description
    }

    /// Bottom, top and one side area per base edge. Cooling areas have no distance to a
    /// grid vertex and no conductivity.
    fn cooling_areas(&self) -> Result<Vec<Area>> {
        let vertices = self.base.vertices().to_vec();
        let mut areas = Vec::with_capacity(vertices.len() + 2);
        areas.push(Area::new(
            vertices.clone(),
            Plane::horizontal(Point::new(0.0, 0.0, self.z_lower)),
            0.0,
            0.0,
            Location::Bottom,
        )?);
        areas.push(Area::new(
            vertices,
            Plane::horizontal(Point::new(0.0, 0.0, self.z_upper)),
            0.0,
            0.0,
            Location::Top,
        )?);

        let height = self.z_upper - self.z_lower;
        for (a, b) in self.base.edges() {
            let length = a.distance_to(&b);
            let plane = Plane::vertical(
                Point::new(a.x, a.y, self.z_lower),
                Vector::new(b.x - a.x, b.y - a.y, 0.0),
            )?;
            let outline = vec![
                Point2::new(0.0, 0.0),
                Point2::new(length, 0.0),
                Point2::new(length, height),
                Point2::new(0.0, height),
            ];
            areas.push(Area::new(outline, plane, 0.0, 0.0, Location::Side)?);
        }
        Ok(areas)
    }

    fn block_geometry(&self) -> Result<BlockGeometry> {
        BlockGeometry::new(
            self.base.clone(),
            self.z_lower,
            self.z_upper,
            &self.description,
        )
    }

    fn cooling(&self) -> &Arc<Cooling> {
        &self.cooling
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> Vec<Point2> {
        vec![
            Point2::new(0.0, 0.0),
            Point2::new(3.0, 0.0),
            Point2::new(0.0, 4.0),
        ]
    }

    fn cooling() -> Arc<Cooling> {
        Arc::new(Cooling::ConstantValue { value: -50.0 })
    }

    #[test]
    fn test_areas() {
        let fin = CoolingPrismatic::new("fin", triangle(), 1.0, 3.0, cooling()).unwrap();
        let areas = fin.cooling_areas().unwrap();
        assert_eq!(areas.len(), 5);
        assert_eq!(areas[0].location(), Location::Bottom);
        assert_eq!(areas[1].location(), Location::Top);
        assert!((areas[1].area_value() - 6.0).abs() < 1e-12);
        assert!((areas[1].plane().origin().z - 3.0).abs() < 1e-12);

        let sides: f64 = areas[2..].iter().map(Area::area_value).sum();
        assert!((sides - 2.0 * 12.0).abs() < 1e-9, "sides={}", sides);
        assert!(areas.iter().all(|a| a.conductivity() == 0.0));
        assert!(areas[2..].iter().all(|a| !a.is_horizontal(&Default::default())));
    }

    #[test]
    fn test_geometry() {
        let fin = CoolingPrismatic::new("fin", triangle(), 1.0, 3.0, cooling()).unwrap();
        let geometry = fin.block_geometry().unwrap();
        assert_eq!(geometry.z_range(), (1.0, 3.0));
        assert_eq!(geometry.description(), "fin");
        assert_eq!(fin.cooling().as_ref(), &Cooling::ConstantValue { value: -50.0 });
    }

    #[test]
    fn test_rejects_invalid_input() {
        assert!(CoolingPrismatic::new("a", triangle(), 2.0, 2.0, cooling()).is_err());
        assert!(CoolingPrismatic::new("a", triangle()[..2].to_vec(), 0.0, 1.0, cooling()).is_err());
        let bow_tie = vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(1.0, 0.0),
            Point2::new(0.0, 1.0),
        ];
        assert!(CoolingPrismatic::new("a", bow_tie, 0.0, 1.0, cooling()).is_err());
    }
}
