pub mod area;
pub mod block_geometry;
pub mod plane;
pub mod point;
pub mod polygon;
pub mod tolerance;
pub mod vector;

/// Geometric precision
const EPS: f64 = 1e-13;
