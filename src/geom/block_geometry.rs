use crate::geom::polygon::Polygon2;
use crate::{Result, ThermalError, Tolerance};

/// Relation between two blocks, seen from the first block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdjacencyType {
    NotAdjacent,
    /// The top of the first block touches the bottom of the second block.
    TopBottom,
    /// The bottom of the first block touches the top of the second block.
    BottomTop,
    /// The blocks touch with their side faces.
    SideSide,
}

/// Prism used for collision and adjacency tests: a base polygon in the global xy plane
/// extruded from `z_lower` to `z_upper`.
#[derive(Debug, Clone)]
pub struct BlockGeometry {
    base: Polygon2,
    z_lower: f64,
    z_upper: f64,
    description: String,
}

impl BlockGeometry {
    pub fn new(base: Polygon2, z_lower: f64, z_upper: f64, description: &str) -> Result<Self> {
        if z_lower > z_upper {
            return Err(ThermalError::invalid(
                "z_lower",
                format!("{description}: z_lower ({z_lower}) is above z_upper ({z_upper})"),
            ));
        }
        Ok(Self {
            base,
            z_lower,
            z_upper,
            description: description.to_string(),
        })
    }

    pub fn base(&self) -> &Polygon2 {
        &self.base
    }

    pub fn z_range(&self) -> (f64, f64) {
        (self.z_lower, self.z_upper)
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns true if both prisms share a volume.
    pub fn collides_with(&self, rhs: &BlockGeometry, tolerance: &Tolerance) -> bool {
        if rhs.z_lower + tolerance.length > self.z_upper
            || rhs.z_upper - tolerance.length < self.z_lower
        {
            return false;
        }
        self.base.intersects(&rhs.base, tolerance)
    }

    pub fn is_adjacent_to(&self, rhs: &BlockGeometry, tolerance: &Tolerance) -> AdjacencyType {
        let length = tolerance.length;
        if rhs.z_lower - length > self.z_upper || rhs.z_upper + length < self.z_lower {
            AdjacencyType::NotAdjacent
        } else if rhs.z_lower + length > self.z_upper {
            // rhs sits on top of this block
            if self.base.intersects(&rhs.base, tolerance) {
                AdjacencyType::TopBottom
            } else {
                AdjacencyType::NotAdjacent
            }
        } else if rhs.z_upper - length < self.z_lower {
            if self.base.intersects(&rhs.base, tolerance) {
                AdjacencyType::BottomTop
            } else {
                AdjacencyType::NotAdjacent
            }
        } else if self.base.is_adjacent_to(&rhs.base, tolerance) {
            AdjacencyType::SideSide
        } else {
            AdjacencyType::NotAdjacent
        }
    }

    /// Returns true if any length of the prism is below the length tolerance.
    pub fn has_insufficient_dimension(&self, tolerance: &Tolerance) -> bool {
        self.z_upper - self.z_lower < tolerance.length
            || self.base.is_negligible(tolerance)
            || self.base.is_self_adjacent(tolerance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::polygon::Point2;

    fn block(x0: f64, y0: f64, x1: f64, y1: f64, z0: f64, z1: f64) -> BlockGeometry {
        let base = Polygon2::rectangle(Point2::new(x0, y0), Point2::new(x1, y1)).unwrap();
        BlockGeometry::new(base, z0, z1, "block").unwrap()
    }

    #[test]
    fn test_stacked_blocks() {
        let tol = Tolerance::default();
        let lower = block(0.0, 0.0, 1.0, 1.0, 0.0, 1.0);
        let upper = block(0.5, 0.5, 1.5, 1.5, 1.0, 2.0);
        assert_eq!(lower.is_adjacent_to(&upper, &tol), AdjacencyType::TopBottom);
        assert_eq!(upper.is_adjacent_to(&lower, &tol), AdjacencyType::BottomTop);
        assert!(!lower.collides_with(&upper, &tol));
    }

    #[test]
    fn test_side_by_side_blocks() {
        let tol = Tolerance::default();
        let a = block(0.0, 0.0, 1.0, 1.0, 0.0, 1.0);
        let b = block(1.0, 0.0, 2.0, 1.0, 0.5, 1.5);
        assert_eq!(a.is_adjacent_to(&b, &tol), AdjacencyType::SideSide);
        assert_eq!(b.is_adjacent_to(&a, &tol), AdjacencyType::SideSide);
        assert!(!a.collides_with(&b, &tol));
    }

    #[test]
    fn test_corner_contact_and_gap() {
        let tol = Tolerance::default();
        let a = block(0.0, 0.0, 1.0, 1.0, 0.0, 1.0);
        let diagonal = block(1.0, 1.0, 2.0, 2.0, 0.0, 1.0);
        assert_eq!(a.is_adjacent_to(&diagonal, &tol), AdjacencyType::NotAdjacent);
        let far = block(0.0, 0.0, 1.0, 1.0, 1.5, 2.0);
        assert_eq!(a.is_adjacent_to(&far, &tol), AdjacencyType::NotAdjacent);
    }

    #[test]
    fn test_collision() {
        let tol = Tolerance::default();
        let a = block(0.0, 0.0, 1.0, 1.0, 0.0, 1.0);
        let b = block(0.5, 0.5, 1.5, 1.5, 0.5, 1.5);
        assert!(a.collides_with(&b, &tol));
        assert!(b.collides_with(&a, &tol));
    }

    #[test]
    fn test_insufficient_dimension() {
        let tol = Tolerance::default();
        assert!(block(0.0, 0.0, 1.0, 1.0, 0.0, 1e-8).has_insufficient_dimension(&tol));
        assert!(block(0.0, 0.0, 1.0, 1e-8, 0.0, 1.0).has_insufficient_dimension(&tol));
        assert!(!block(0.0, 0.0, 1.0, 1.0, 0.0, 1.0).has_insufficient_dimension(&tol));
        assert!(BlockGeometry::new(
            Polygon2::rectangle(Point2::new(0.0, 0.0), Point2::new(1.0, 1.0)).unwrap(),
            1.0,
            0.0,
            "inverted"
        )
        .is_err());
    }
}
