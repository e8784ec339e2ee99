use crate::thermal::material::Material;
use crate::thermal::state::ThermalState;
use crate::{Point, Result, ThermalError};
use std::sync::{Arc, Weak};

/// One finite volume of the thermal network.
#[derive(Debug, Clone)]
pub struct ThermalElement {
    temperature: f64,
    volume: f64,
    grid_vertex: Point,
    material: Arc<Material>,
    state: Option<Weak<ThermalState>>,
    /// Share of the state's power dissipated in this element.
    power_factor: f64,
}

impl ThermalElement {
    pub fn new(
        grid_vertex: Point,
        volume: f64,
        temperature: f64,
        material: Arc<Material>,
    ) -> Result<Self> {
        if !(volume >= 0.0 && volume.is_finite()) {
            return Err(ThermalError::invalid(
                "volume",
                format!("must be non-negative, got {volume}"),
            ));
        }
        Ok(Self {
            temperature,
            volume,
            grid_vertex,
            material,
            state: None,
            power_factor: 1.0,
        })
    }

    /// Attaches a heat source. `power_factor` must be in `(0, 1]`.
    pub fn with_state(mut self, state: &Arc<ThermalState>, power_factor: f64) -> Result<Self> {
        if !(power_factor > 0.0 && power_factor <= 1.0) {
            return Err(ThermalError::invalid(
                "power_factor",
                format!("must be in (0, 1], got {power_factor}"),
            ));
        }
        self.state = Some(Arc::downgrade(state));
        self.power_factor = power_factor;
        Ok(self)
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn set_temperature(&mut self, temperature: f64) {
        self.temperature = temperature;
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    pub fn grid_vertex(&self) -> Point {
        self.grid_vertex
    }

    pub fn material(&self) -> &Arc<Material> {
        &self.material
    }

    pub fn state(&self) -> Option<Arc<ThermalState>> {
        self.state.as_ref().and_then(Weak::upgrade)
    }

    /// Mean power over `[time - dt, time]` dissipated in this element. Zero without a state.
    pub fn power_dissipation(&self, time: f64, dt: f64) -> f64 {
        self.state()
            .map_or(0.0, |s| s.power_dissipation(time, dt) * self.power_factor)
    }

    /// Heat capacity `volume * density * specific_capacity` in J/K.
    pub fn heat_capacity(&self) -> f64 {
        self.volume * self.material.volumetric_heat_capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn material() -> Arc<Material> {
        Arc::new(Material::isotropic(1000.0, 1000.0, 1.0).unwrap())
    }

    #[test]
    fn test_power_from_state() {
        let state = Arc::new(ThermalState::new(20.0));
        state.set_fixed_power_dissipation(8.0);
        let el = ThermalElement::new(Point::new(0.0, 0.0, 0.0), 1e-3, 20.0, material())
            .unwrap()
            .with_state(&state, 0.25)
            .unwrap();
        assert!((el.power_dissipation(1.0, 1.0) - 2.0).abs() < 1e-12);
        assert!((el.heat_capacity() - 1000.0).abs() < 1e-9);
        drop(state);
        assert_eq!(el.power_dissipation(1.0, 1.0), 0.0);
    }

    #[test]
    fn test_validation() {
        let origin = Point::new(0.0, 0.0, 0.0);
        assert!(ThermalElement::new(origin, -1.0, 20.0, material()).is_err());
        let state = Arc::new(ThermalState::default());
        let el = ThermalElement::new(origin, 1.0, 20.0, material()).unwrap();
        assert!(el.clone().with_state(&state, 0.0).is_err());
        assert!(el.with_state(&state, 1.5).is_err());
    }
}
