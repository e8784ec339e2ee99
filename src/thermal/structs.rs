use crate::geom::area::{Area, Location};
use crate::thermal::cooling::Cooling;
use std::ops::AddAssign;
use std::sync::Arc;

/// Entry of a sparse conductivity row: conductance towards element `index` in W/K.
///
/// The entry with the row's own index holds the negative sum of all other entries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexedValue {
    pub index: usize,
    pub value: f64,
}

impl IndexedValue {
    pub fn new(index: usize, value: f64) -> Self {
        Self { index, value }
    }
}

/// Surface area belonging to the element `index` of its block.
#[derive(Debug, Clone)]
pub struct IndexedArea {
    pub index: usize,
    pub area: Area,
}

impl IndexedArea {
    pub fn new(index: usize, area: Area) -> Self {
        Self { index, area }
    }
}

/// Heat flux `q = offset + slope * (T - T_ref)` linearized around a reference temperature.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Linearization {
    pub offset: f64,
    pub slope: f64,
}

impl Linearization {
    pub fn new(offset: f64, slope: f64) -> Self {
        Self { offset, slope }
    }
}

impl AddAssign for Linearization {
    fn add_assign(&mut self, rhs: Self) {
        self.offset += rhs.offset;
        self.slope += rhs.slope;
    }
}

/// Boundary condition data of one external surface patch of an element.
#[derive(Debug, Clone)]
pub struct TaylorData {
    /// Surface temperature of the previous update step, the linearization point.
    pub temp_surf_last_step: f64,
    /// Length used by the default convection model, `-1` for forced cooling.
    pub characteristic_length: f64,
    /// Part of the surface area exposed to this boundary condition in m^2.
    pub a_cool: f64,
    pub location: Location,
    pub distance_to_grid_vertex: f64,
    pub conductivity: f64,
    /// Forced cooling policy, `None` for ambient convection and radiation.
    pub cooling: Option<Arc<Cooling>>,
}

/// Linear boundary source of one element: `A * T + C` in W.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoundarySource {
    pub a_th: f64,
    pub c_th: f64,
}
