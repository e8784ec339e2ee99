use crate::geom::polygon::Point2;
use crate::{Point, Result, ThermalError, Tolerance, Vector};

/// Plane through an emplacement point, spanned by two orthonormal direction vectors.
///
/// The first direction vector is the local x axis, the second one the local y axis.
/// Local coordinates of a point are its projections onto both directions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    origin: Point,
    dir1: Vector,
    dir2: Vector,
    normal: Vector,
}

impl Plane {
    /// Creates a plane. `dir2` is orthogonalized against `dir1`.
    pub fn new(origin: Point, dir1: Vector, dir2: Vector) -> Result<Self> {
        let dir1 = dir1
            .normalize()
            .ok_or_else(|| ThermalError::Geometry("plane direction 1 has zero length".into()))?;
        let dir2 = (dir2 - dir1 * dir1.dot(&dir2))
            .normalize()
            .ok_or_else(|| {
                ThermalError::Geometry("plane directions are parallel or zero".into())
            })?;
        let normal = dir1.cross(&dir2);
        Ok(Self {
            origin,
            dir1,
            dir2,
            normal,
        })
    }

    /// Horizontal plane at height `z` with local axes along global x and y.
    pub fn horizontal(origin: Point) -> Self {
        Self {
            origin,
            dir1: Vector::X,
            dir2: Vector::Y,
            normal: Vector::Z,
        }
    }

    /// Vertical plane whose first axis runs along `direction` (projected to xy) and second
    /// axis along z.
    pub fn vertical(origin: Point, direction: Vector) -> Result<Self> {
        Self::new(origin, Vector::new(direction.dx, direction.dy, 0.0), Vector::Z)
    }

    pub fn origin(&self) -> Point {
        self.origin
    }

    pub fn dir1(&self) -> Vector {
        self.dir1
    }

    pub fn dir2(&self) -> Vector {
        self.dir2
    }

    pub fn normal(&self) -> Vector {
        self.normal
    }

    pub fn is_parallel_to(&self, other: &Plane, tolerance: &Tolerance) -> bool {
        self.normal.is_parallel_to(&other.normal, tolerance.angle)
    }

    /// Parallel planes whose emplacement points are closer than the length tolerance along
    /// the normal.
    pub fn is_coplanar_to(&self, other: &Plane, tolerance: &Tolerance) -> bool {
        self.is_parallel_to(other, tolerance)
            && self.normal.dot(&(other.origin - self.origin)).abs() <= tolerance.length
    }

    pub fn is_horizontal(&self, tolerance: &Tolerance) -> bool {
        self.normal.is_parallel_to(&Vector::Z, tolerance.angle)
    }

    /// Global coordinates of a point given in the local system of this plane.
    pub fn global(&self, p: Point2) -> Point {
        self.origin + self.dir1 * p.x + self.dir2 * p.y
    }

    /// Local coordinates of the projection of `p` onto this plane.
    pub fn local(&self, p: Point) -> Point2 {
        let r = p - self.origin;
        Point2::new(r.dot(&self.dir1), r.dot(&self.dir2))
    }

    /// Maps local coordinates of `other` into the local system of this plane.
    pub fn transform_from(&self, other: &Plane, p: Point2) -> Point2 {
        self.local(other.global(p))
    }
}
