use crate::parallel::ThreadedForLoop;
use crate::thermal::convection::ConvectionByLocation;
use crate::thermal::cooling::Radiation;
use crate::thermal::element::ThermalElement;
use crate::thermal::model::FusedModel;
use crate::thermal::structs::{BoundarySource, IndexedValue, Linearization, TaylorData};
use crate::{Result, ThermalError};
use std::sync::Arc;
use tracing::debug;

/// Ambient conditions seen by every external surface without forced cooling.
#[derive(Debug, Clone)]
struct Ambient {
    convection: ConvectionByLocation,
    radiation: Option<Radiation>,
    air_temperature: f64,
}

/// Boundary patches of one element and the linear source they add up to.
#[derive(Debug, Clone, Default)]
struct ElementBoundary {
    source: BoundarySource,
    taylor: Vec<TaylorData>,
}

/// Right hand side of the thermal network `dT/dt = f(T)`.
///
/// Boundary fluxes are linearized once per [`OdeSystemThermal::update`] around the
/// surface temperatures of the previous step. Between two updates the system is
/// linear and [`OdeSystemThermal::derivative`] can be evaluated as often as an
/// integrator needs. Both must not run at the same time for one instance.
#[derive(Debug)]
pub struct OdeSystemThermal {
    elements: Vec<ThermalElement>,
    conductivity: Vec<Vec<IndexedValue>>,
    /// `1 / (volume * density * specific_capacity)` per element.
    factors: Vec<f64>,
    dirichlet: Vec<BoundarySource>,
    boundaries: Vec<ElementBoundary>,
    ambient: Ambient,
    looper: Option<Arc<ThreadedForLoop>>,
}

impl OdeSystemThermal {
    /// Builds the system and linearizes all boundaries at the air temperature.
    ///
    /// Without `looper` every loop runs on the calling thread.
    pub fn new(
        fused: FusedModel,
        convection: ConvectionByLocation,
        radiation: Option<Radiation>,
        air_temperature: f64,
        looper: Option<Arc<ThreadedForLoop>>,
    ) -> Result<Self> {
        let FusedModel {
            elements,
            conductivity,
            cooling_data,
            dirichlet_data,
        } = fused;
        let size = elements.len();
        for (what, len) in [
            ("conductivity rows", conductivity.len()),
            ("cooling data", cooling_data.len()),
            ("dirichlet data", dirichlet_data.len()),
        ] {
            if len != size {
                return Err(ThermalError::SizeMismatch {
                    what,
                    expected: size,
                    actual: len,
                });
            }
        }
        if let Some(index) = conductivity.iter().flatten().map(|e| e.index).find(|&i| i >= size) {
            return Err(ThermalError::IndexOutOfRange {
                what: "conductivity",
                index,
                len: size,
            });
        }
        let non_finite = conductivity
            .iter()
            .enumerate()
            .flat_map(|(row, entries)| entries.iter().map(move |e| (row, e)))
            .find(|(_, e)| !e.value.is_finite());
        if let Some((row, entry)) = non_finite {
            return Err(ThermalError::ConductivityNotFinite {
                row,
                index: entry.index,
                value: entry.value,
            });
        }
        convection.validate()?;
        for data in cooling_data.iter().chain(&dirichlet_data).flatten() {
            validate_taylor(data)?;
        }

        let mut dirichlet = vec![BoundarySource::default(); size];
        for (source, entries) in dirichlet.iter_mut().zip(&dirichlet_data) {
            for data in entries {
                let value = data.conductivity * data.a_cool / data.distance_to_grid_vertex;
                source.a_th -= value;
                source.c_th += data.temp_surf_last_step * value;
            }
        }

        let mut factors = Vec::with_capacity(size);
        for (i, element) in elements.iter().enumerate() {
            let capacity = element.heat_capacity();
            if !(capacity > 0.0) {
                return Err(ThermalError::invalid(
                    "heat_capacity",
                    format!("element {i} has no heat capacity"),
                ));
            }
            factors.push(1.0 / capacity);
        }

        let boundaries = cooling_data
            .into_iter()
            .map(|mut taylor| {
                for data in &mut taylor {
                    data.temp_surf_last_step = air_temperature;
                }
                ElementBoundary {
                    source: BoundarySource::default(),
                    taylor,
                }
            })
            .collect();

        debug!(
            size,
            threads = looper.as_ref().map_or(1, |l| l.threads()),
            "thermal ODE system created"
        );
        let mut system = Self {
            elements,
            conductivity,
            factors,
            dirichlet,
            boundaries,
            ambient: Ambient {
                convection,
                radiation,
                air_temperature,
            },
            looper,
        };
        system.update(0.0, 0.0);
        Ok(system)
    }

    pub fn ode_system_size(&self) -> usize {
        self.elements.len()
    }

    pub fn elements(&self) -> &[ThermalElement] {
        &self.elements
    }

    pub fn conductivity(&self) -> &[Vec<IndexedValue>] {
        &self.conductivity
    }

    pub fn thermal_element_factors(&self) -> &[f64] {
        &self.factors
    }

    /// Constant part of the sources contributed by fixed temperature boundaries.
    pub fn dirichlet_sources(&self) -> &[BoundarySource] {
        &self.dirichlet
    }

    /// Sources frozen by the last update.
    pub fn boundary_sources(&self) -> Vec<BoundarySource> {
        self.boundaries.iter().map(|b| b.source).collect()
    }

    pub fn cooling_data(&self, element: usize) -> Option<&[TaylorData]> {
        self.boundaries.get(element).map(|b| b.taylor.as_slice())
    }

    pub fn air_temperature(&self) -> f64 {
        self.ambient.air_temperature
    }

    pub fn reset_air_temperature(&mut self, air_temperature: f64) {
        self.ambient.air_temperature = air_temperature;
    }

    pub fn convection(&self) -> &ConvectionByLocation {
        &self.ambient.convection
    }

    pub fn radiation(&self) -> Option<&Radiation> {
        self.ambient.radiation.as_ref()
    }

    pub fn temperature_vector(&self) -> Vec<f64> {
        self.elements.iter().map(ThermalElement::temperature).collect()
    }

    pub fn set_temperature_vector(&mut self, temperatures: &[f64]) -> Result<()> {
        if temperatures.len() != self.elements.len() {
            return Err(ThermalError::SizeMismatch {
                what: "temperature vector",
                expected: self.elements.len(),
                actual: temperatures.len(),
            });
        }
        for (element, &t) in self.elements.iter_mut().zip(temperatures) {
            element.set_temperature(t);
        }
        Ok(())
    }

    /// Holds the given elements at `temperature` through the conductance `conductivity`
    /// in W/K, on top of the fused Dirichlet boundaries.
    pub fn set_dirichlet_boundary_condition(
        &mut self,
        indices: &[usize],
        temperature: f64,
        conductivity: f64,
    ) -> Result<()> {
        if !(conductivity > 0.0 && conductivity.is_finite()) {
            return Err(ThermalError::invalid(
                "conductivity",
                format!("must be positive, got {conductivity}"),
            ));
        }
        let len = self.elements.len();
        if let Some(&index) = indices.iter().find(|&&i| i >= len) {
            return Err(ThermalError::IndexOutOfRange {
                what: "elements",
                index,
                len,
            });
        }
        for &i in indices {
            self.dirichlet[i].a_th -= conductivity;
            self.dirichlet[i].c_th += temperature * conductivity;
        }
        Ok(())
    }

    /// Recomputes the mean temperature of every thermal state from its elements.
    pub fn update_thermal_states(&self) -> Result<()> {
        for element in &self.elements {
            if let Some(state) = element.state() {
                state.reset_temperature();
            }
        }
        for element in &self.elements {
            if let Some(state) = element.state() {
                state.add_temperature(element.temperature(), element.volume())?;
            }
        }
        Ok(())
    }

    /// Relinearizes all boundaries at the current element temperatures and samples the
    /// mean power over `[time - dt, time]`.
    pub fn update(&mut self, time: f64, dt: f64) {
        let elements = &self.elements;
        let dirichlet = &self.dirichlet;
        let ambient = &self.ambient;
        let op = |i: usize, boundary: &mut ElementBoundary| {
            update_element(boundary, &elements[i], dirichlet[i], ambient, time, dt);
        };
        match &self.looper {
            Some(looper) => looper.run_loop_mut(&mut self.boundaries, op),
            None => self
                .boundaries
                .iter_mut()
                .enumerate()
                .for_each(|(i, b)| op(i, b)),
        }
    }

    /// `dxdt[i] = (sum_j G[i][j] * x[j] + A[i] * x[i] + C[i]) / capacity[i]`.
    pub fn derivative(&self, x: &[f64], dxdt: &mut [f64]) -> Result<()> {
        let size = self.elements.len();
        for (what, len) in [("state vector", x.len()), ("derivative vector", dxdt.len())] {
            if len != size {
                return Err(ThermalError::SizeMismatch {
                    what,
                    expected: size,
                    actual: len,
                });
            }
        }
        let op = |i: usize, out: &mut f64| {
            let coupling: f64 = self.conductivity[i]
                .iter()
                .map(|e| e.value * x[e.index])
                .sum();
            let source = self.boundaries[i].source;
            *out = (coupling + source.a_th * x[i] + source.c_th) * self.factors[i];
        };
        match &self.looper {
            Some(looper) => looper.run_loop_mut(dxdt, op),
            None => dxdt.iter_mut().enumerate().for_each(|(i, out)| op(i, out)),
        }
        Ok(())
    }
}

fn validate_taylor(data: &TaylorData) -> Result<()> {
    if !(data.distance_to_grid_vertex > 0.0 && data.distance_to_grid_vertex.is_finite()) {
        return Err(ThermalError::invalid(
            "distance_to_grid_vertex",
            format!("boundary needs a positive distance, got {}", data.distance_to_grid_vertex),
        ));
    }
    if !(data.conductivity > 0.0 && data.conductivity.is_finite()) {
        return Err(ThermalError::invalid(
            "conductivity",
            format!("boundary needs a positive conductivity, got {}", data.conductivity),
        ));
    }
    if !(data.a_cool >= 0.0) {
        return Err(ThermalError::invalid(
            "a_cool",
            format!("must be non-negative, got {}", data.a_cool),
        ));
    }
    Ok(())
}

fn update_element(
    boundary: &mut ElementBoundary,
    element: &ThermalElement,
    dirichlet: BoundarySource,
    ambient: &Ambient,
    time: f64,
    dt: f64,
) {
    let temperature = element.temperature();
    let air = ambient.air_temperature;
    let mut source = BoundarySource {
        a_th: dirichlet.a_th,
        c_th: dirichlet.c_th + element.power_dissipation(time, dt),
    };

    for data in &mut boundary.taylor {
        let surface = data.temp_surf_last_step;
        let mut lin = Linearization::default();
        match &data.cooling {
            Some(cooling) => lin += cooling.offset_slope(surface, air),
            None if temperature > air => {
                if let Some(radiation) = &ambient.radiation {
                    lin += radiation.offset_slope(surface, air);
                }
                if let Some(convection) = ambient.convection.get(data.location) {
                    lin += convection.offset_slope(surface, data.characteristic_length, air);
                }
            }
            None => {}
        }

        // Linearized flux in series with the conduction from the grid vertex
        let k = data.conductivity;
        let d = data.distance_to_grid_vertex;
        let help = data.a_cool * k / (d * lin.slope + k);
        let slope = help * lin.slope;
        let offset = help * (lin.offset - lin.slope * surface);
        source.a_th -= slope;
        source.c_th -= offset;

        data.temp_surf_last_step =
            (k / d * temperature + slope * surface - offset) / (slope + k / d);
    }
    boundary.source = source;
}
