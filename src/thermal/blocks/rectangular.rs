use crate::geom::area::{Area, Location};
use crate::geom::block_geometry::BlockGeometry;
use crate::geom::plane::Plane;
use crate::geom::polygon::{Point2, Polygon2};
use crate::thermal::blocks::{BlockData, ThermalBlock};
use crate::thermal::element::ThermalElement;
use crate::thermal::material::Material;
use crate::thermal::state::ThermalState;
use crate::thermal::structs::{IndexedArea, IndexedValue};
use crate::{Point, Result, ThermalError, Vector};
use std::sync::Arc;

/// Cuboid split into `nx * ny * nz` equal elements.
///
/// Element `(i, j, k)` has the local index `i + j * nx + k * nx * ny`. The block
/// extends from `emplacement` along the positive axes.
#[derive(Debug, Clone)]
pub struct RectangularBlock {
    description: String,
    material: Arc<Material>,
    size: [f64; 3],
    cells: [usize; 3],
    temperature: f64,
    emplacement: Point,
    states: Vec<Arc<ThermalState>>,
    state_cells: [usize; 3],
}

impl RectangularBlock {
    /// `size` is `[length, width, height]` in m, `cells` the number of elements per axis.
    pub fn new(
        description: &str,
        material: Arc<Material>,
        size: [f64; 3],
        cells: [usize; 3],
        temperature: f64,
        emplacement: Point,
    ) -> Result<Self> {
        if size.iter().any(|&s| !(s > 0.0 && s.is_finite())) {
            return Err(ThermalError::invalid(
                "size",
                format!("{description}: all lengths must be positive, got {size:?}"),
            ));
        }
        if cells.contains(&0) {
            return Err(ThermalError::invalid(
                "cells",
                format!("{description}: need at least one element per axis, got {cells:?}"),
            ));
        }
        Ok(Self {
            description: description.to_string(),
            material,
            size,
            cells,
            temperature,
            emplacement,
            states: Vec::new(),
            state_cells: [1, 1, 1],
        })
    }

    /// Attaches heat sources. `state_cells` tells how many states lie along each axis,
    /// each state spreads its power evenly over the elements it covers.
    pub fn with_thermal_states(
        mut self,
        states: Vec<Arc<ThermalState>>,
        state_cells: [usize; 3],
    ) -> Result<Self> {
        for axis in 0..3 {
            if state_cells[axis] == 0 || self.cells[axis] % state_cells[axis] != 0 {
                return Err(ThermalError::invalid(
                    "state_cells",
                    format!(
                        "{}: {} elements along axis {axis} cannot be split into {} states",
                        self.description, self.cells[axis], state_cells[axis]
                    ),
                ));
            }
        }
        let expected: usize = state_cells.iter().product();
        if states.len() != expected {
            return Err(ThermalError::SizeMismatch {
                what: "thermal states",
                expected,
                actual: states.len(),
            });
        }
        self.states = states;
        self.state_cells = state_cells;
        Ok(self)
    }

    fn cell_size(&self) -> [f64; 3] {
        [
            self.size[0] / self.cells[0] as f64,
            self.size[1] / self.cells[1] as f64,
            self.size[2] / self.cells[2] as f64,
        ]
    }

    fn index(&self, i: usize, j: usize, k: usize) -> usize {
        i + j * self.cells[0] + k * self.cells[0] * self.cells[1]
    }

    fn cell_origin(&self, i: usize, j: usize, k: usize) -> Point {
        let [dx, dy, dz] = self.cell_size();
        self.emplacement + Vector::new(i as f64 * dx, j as f64 * dy, k as f64 * dz)
    }

    fn elements(&self) -> Result<Vec<ThermalElement>> {
        let [nx, ny, nz] = self.cells;
        let [dx, dy, dz] = self.cell_size();
        let disc = [
            nx / self.state_cells[0],
            ny / self.state_cells[1],
            nz / self.state_cells[2],
        ];
        let power_factor = 1.0 / (disc[0] * disc[1] * disc[2]) as f64;

        let mut elements = Vec::with_capacity(self.element_count());
        for k in 0..nz {
            for j in 0..ny {
                for i in 0..nx {
                    let half = Vector::new(0.5 * dx, 0.5 * dy, 0.5 * dz);
                    let center = self.cell_origin(i, j, k) + half;
                    let element = ThermalElement::new(
                        center,
                        dx * dy * dz,
                        self.temperature,
                        Arc::clone(&self.material),
                    )?;
                    let element = if self.states.is_empty() {
                        element
                    } else {
                        let state = i / disc[0]
                            + self.state_cells[0] * (j / disc[1])
                            + self.state_cells[0] * self.state_cells[1] * (k / disc[2]);
                        element.with_state(&self.states[state], power_factor)?
                    };
                    elements.push(element);
                }
            }
        }
        Ok(elements)
    }

    fn conductivity(&self) -> Vec<Vec<IndexedValue>> {
        let [nx, ny, nz] = self.cells;
        let [dx, dy, dz] = self.cell_size();
        let cx = dy * dz / dx * self.material.conductivity(0);
        let cy = dx * dz / dy * self.material.conductivity(1);
        let cz = dx * dy / dz * self.material.conductivity(2);

        let mut rows = vec![Vec::new(); self.element_count()];
        for k in 0..nz {
            for j in 0..ny {
                for i in 0..nx {
                    let own = self.index(i, j, k);
                    let mut neighbours = Vec::with_capacity(6);
                    if k > 0 {
                        neighbours.push(IndexedValue::new(self.index(i, j, k - 1), cz));
                    }
                    if j > 0 {
                        neighbours.push(IndexedValue::new(self.index(i, j - 1, k), cy));
                    }
                    if i > 0 {
                        neighbours.push(IndexedValue::new(self.index(i - 1, j, k), cx));
                    }
                    if i + 1 < nx {
                        neighbours.push(IndexedValue::new(self.index(i + 1, j, k), cx));
                    }
                    if j + 1 < ny {
                        neighbours.push(IndexedValue::new(self.index(i, j + 1, k), cy));
                    }
                    if k + 1 < nz {
                        neighbours.push(IndexedValue::new(self.index(i, j, k + 1), cz));
                    }
                    if neighbours.is_empty() {
                        continue;
                    }
                    let sum: f64 = neighbours.iter().map(|n| n.value).sum();
                    neighbours.push(IndexedValue::new(own, -sum));
                    neighbours.sort_by_key(|n| n.index);
                    rows[own] = neighbours;
                }
            }
        }
        rows
    }

    fn surface_areas(&self) -> Result<Vec<IndexedArea>> {
        let [nx, ny, nz] = self.cells;
        let [dx, dy, dz] = self.cell_size();
        let k = [
            self.material.conductivity(0),
            self.material.conductivity(1),
            self.material.conductivity(2),
        ];
        let mut areas = Vec::with_capacity(2 * (nx * ny + nx * nz + ny * nz));

        for j in 0..ny {
            for i in 0..nx {
                let top = Plane::horizontal(self.cell_origin(i, j, nz));
                let bottom = Plane::horizontal(self.cell_origin(i, j, 0));
                areas.push(IndexedArea::new(
                    self.index(i, j, nz - 1),
                    face(top, dx, dy, 0.5 * dz, k[2], Location::Top)?,
                ));
                areas.push(IndexedArea::new(
                    self.index(i, j, 0),
                    face(bottom, dx, dy, 0.5 * dz, k[2], Location::Bottom)?,
                ));
            }
        }
        for kz in 0..nz {
            for i in 0..nx {
                let back = Plane::vertical(self.cell_origin(i, ny, kz), Vector::X)?;
                let front = Plane::vertical(self.cell_origin(i, 0, kz), Vector::X)?;
                areas.push(IndexedArea::new(
                    self.index(i, ny - 1, kz),
                    face(back, dx, dz, 0.5 * dy, k[1], Location::Side)?,
                ));
                areas.push(IndexedArea::new(
                    self.index(i, 0, kz),
                    face(front, dx, dz, 0.5 * dy, k[1], Location::Side)?,
                ));
            }
            for j in 0..ny {
                let right = Plane::vertical(self.cell_origin(nx, j, kz), Vector::Y)?;
                let left = Plane::vertical(self.cell_origin(0, j, kz), Vector::Y)?;
                areas.push(IndexedArea::new(
                    self.index(nx - 1, j, kz),
                    face(right, dy, dz, 0.5 * dx, k[0], Location::Side)?,
                ));
                areas.push(IndexedArea::new(
                    self.index(0, j, kz),
                    face(left, dy, dz, 0.5 * dx, k[0], Location::Side)?,
                ));
            }
        }
        Ok(areas)
    }

    fn geometry(&self) -> Result<BlockGeometry> {
        let e = self.emplacement;
        let base = Polygon2::rectangle(
            Point2::new(e.x, e.y),
            Point2::new(e.x + self.size[0], e.y + self.size[1]),
        )?;
        BlockGeometry::new(base, e.z, e.z + self.size[2], &self.description)
    }
}

/// Rectangle `[0, u] x [0, v]` in the local system of `plane`.
fn face(
    plane: Plane,
    u: f64,
    v: f64,
    distance: f64,
    conductivity: f64,
    location: Location,
) -> Result<Area> {
    let vertices = vec![
        Point2::new(0.0, 0.0),
        Point2::new(u, 0.0),
        Point2::new(u, v),
        Point2::new(0.0, v),
    ];
    Area::new(vertices, plane, distance, conductivity, location)
}

impl ThermalBlock for RectangularBlock {
    fn description(&self) -> &str {
        &self.description
    }

    fn element_count(&self) -> usize {
        self.cells.iter().product()
    }

    fn create_data(&self) -> Result<BlockData> {
        Ok(BlockData {
            elements: self.elements()?,
            conductivity: self.conductivity(),
            surface_areas: self.surface_areas()?,
            geometry: self.geometry()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(cells: [usize; 3]) -> RectangularBlock {
        let material = Arc::new(Material::new(2000.0, 900.0, [1.0, 2.0, 4.0]).unwrap());
        RectangularBlock::new(
            "cell",
            material,
            [0.2, 0.1, 0.4],
            cells,
            25.0,
            Point::new(1.0, 2.0, 3.0),
        )
        .unwrap()
    }

    #[test]
    fn test_elements() {
        let data = block([2, 1, 2]).create_data().unwrap();
        assert_eq!(data.elements.len(), 4);
        let e = &data.elements[3];
        assert!(e.grid_vertex().is_close(&Point::new(1.15, 2.05, 3.3)));
        assert!((e.volume() - 0.1 * 0.1 * 0.2).abs() < 1e-15);
        assert_eq!(e.temperature(), 25.0);
        let total: f64 = data.elements.iter().map(|e| e.volume()).sum();
        assert!((total - 0.2 * 0.1 * 0.4).abs() < 1e-15);
    }

    #[test]
    fn test_conductivity() {
        let data = block([2, 1, 2]).create_data().unwrap();
        let cx = 0.1 * 0.2 / 0.1 * 1.0;
        let cz = 0.1 * 0.1 / 0.2 * 4.0;
        let row = &data.conductivity[0];
        assert_eq!(row.len(), 3);
        assert_eq!(row[0].index, 0);
        assert!((row[0].value + cx + cz).abs() < 1e-12);
        assert!((row[1].value - cx).abs() < 1e-12);
        assert_eq!(row[2].index, 2);
        assert!((row[2].value - cz).abs() < 1e-12);
        for row in &data.conductivity {
            let sum: f64 = row.iter().map(|e| e.value).sum();
            assert!(sum.abs() < 1e-12);
        }

        let single = block([1, 1, 1]).create_data().unwrap();
        assert!(single.conductivity[0].is_empty());
    }

    #[test]
    fn test_surface_areas_cover_the_block() {
        let data = block([2, 3, 4]).create_data().unwrap();
        assert_eq!(data.surface_areas.len(), 2 * (6 + 8 + 12));
        let total: f64 = data.surface_areas.iter().map(|a| a.area.area_value()).sum();
        let expected = 2.0 * (0.2 * 0.1 + 0.2 * 0.4 + 0.1 * 0.4);
        assert!((total - expected).abs() < 1e-12, "total={}", total);

        let top: Vec<&IndexedArea> = data
            .surface_areas
            .iter()
            .filter(|a| a.area.location() == Location::Top)
            .collect();
        assert_eq!(top.len(), 6);
        assert!(top.iter().all(|a| a.index >= 18));
        assert!(top.iter().all(|a| (a.area.plane().origin().z - 3.4).abs() < 1e-12));
        assert!((top[0].area.distance_to_grid_vertex() - 0.05).abs() < 1e-12);
        assert_eq!(top[0].area.conductivity(), 4.0);

        let (lo, hi) = data.geometry.z_range();
        assert_eq!(lo, 3.0);
        assert!((hi - 3.4).abs() < 1e-12);
    }

    #[test]
    fn test_thermal_states() {
        let states: Vec<Arc<ThermalState>> =
            (0..2).map(|_| Arc::new(ThermalState::new(25.0))).collect();
        states[1].set_fixed_power_dissipation(8.0);
        let data = block([2, 2, 2])
            .with_thermal_states(states.clone(), [1, 1, 2])
            .unwrap()
            .create_data()
            .unwrap();
        // Lower layer belongs to the first state, upper layer to the second
        assert_eq!(data.elements[0].power_dissipation(1.0, 1.0), 0.0);
        assert!((data.elements[7].power_dissipation(1.0, 1.0) - 2.0).abs() < 1e-12);

        assert!(block([2, 2, 2])
            .with_thermal_states(states.clone(), [1, 1, 3])
            .is_err());
        assert!(block([2, 2, 2])
            .with_thermal_states(states, [2, 1, 2])
            .is_err());
    }

    #[test]
    fn test_rejects_bad_dimensions() {
        let material = Arc::new(Material::isotropic(1.0, 1.0, 1.0).unwrap());
        let origin = Point::new(0.0, 0.0, 0.0);
        let flat =
            RectangularBlock::new("a", material.clone(), [0.0, 1.0, 1.0], [1, 1, 1], 0.0, origin);
        assert!(flat.is_err());
        let empty = RectangularBlock::new("a", material, [1.0, 1.0, 1.0], [1, 0, 1], 0.0, origin);
        assert!(empty.is_err());
    }
}
