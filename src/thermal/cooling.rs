use crate::thermal::lookup::LookupTable1D;
use crate::thermal::structs::Linearization;
use serde::{Deserialize, Serialize};

pub const STEFAN_BOLTZMANN: f64 = 5.67e-8;
pub const ABSOLUTE_ZERO_CELSIUS: f64 = -273.15;

/// Black body radiation to the surroundings (emissivity 1).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Radiation;

impl Radiation {
    /// No heat flux while the surface is colder than the air.
    pub fn offset_slope(&self, surface_temperature: f64, air_temperature: f64) -> Linearization {
        if surface_temperature < air_temperature {
            return Linearization::default();
        }
        let ts = surface_temperature - ABSOLUTE_ZERO_CELSIUS;
        let ta = air_temperature.max(ABSOLUTE_ZERO_CELSIUS) - ABSOLUTE_ZERO_CELSIUS;
        Linearization::new(
            STEFAN_BOLTZMANN * (ts.powi(4) - ta.powi(4)),
            STEFAN_BOLTZMANN * 4.0 * ts.powi(3),
        )
    }
}

/// Forced cooling policy of a cooling region.
///
/// Every variant maps `(surface temperature, air temperature)` to a heat flux
/// density linearization in W/m^2 and W/(m^2*K).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Cooling {
    /// Surface held at a fixed temperature.
    Dirichlet { temperature: f64 },
    Radiation(Radiation),
    /// Offset and slope read from tables over the surface temperature.
    LookUp {
        offset: LookupTable1D,
        slope: LookupTable1D,
    },
    /// Constant heat flux density, independent of temperature.
    ConstantValue { value: f64 },
}

impl Cooling {
    pub fn offset_slope(&self, surface_temperature: f64, air_temperature: f64) -> Linearization {
        match self {
            Cooling::Dirichlet { temperature } => Linearization::new(*temperature, *temperature),
            Cooling::Radiation(radiation) => {
                radiation.offset_slope(surface_temperature, air_temperature)
            }
            Cooling::LookUp { offset, slope } => Linearization::new(
                offset.value(surface_temperature),
                slope.value(surface_temperature),
            ),
            Cooling::ConstantValue { value } => Linearization::new(*value, 0.0),
        }
    }

    pub fn is_dirichlet(&self) -> bool {
        matches!(self, Cooling::Dirichlet { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_radiation() {
        let r = Radiation;
        assert_eq!(r.offset_slope(20.0, 25.0), Linearization::default());
        let lin = r.offset_slope(26.85, 26.85);
        assert!(lin.offset.abs() < 1e-9);
        // 4 * sigma * 300^3
        assert!((lin.slope - 6.1236).abs() < 1e-9, "slope={}", lin.slope);
        // Air below absolute zero is clamped
        let cold = r.offset_slope(ABSOLUTE_ZERO_CELSIUS + 1.0, -1000.0);
        assert!((cold.offset - STEFAN_BOLTZMANN).abs() < 1e-18);
    }

    #[test]
    fn test_policies() {
        let d = Cooling::Dirichlet { temperature: 15.0 };
        assert!(d.is_dirichlet());
        assert_eq!(d.offset_slope(0.0, 0.0), Linearization::new(15.0, 15.0));

        let c = Cooling::ConstantValue { value: -200.0 };
        assert!(!c.is_dirichlet());
        assert_eq!(c.offset_slope(50.0, 20.0), Linearization::new(-200.0, 0.0));

        let table = Cooling::LookUp {
            offset: LookupTable1D::new(vec![0.0, 100.0], vec![0.0, 1000.0]).unwrap(),
            slope: LookupTable1D::new(vec![0.0, 100.0], vec![10.0, 10.0]).unwrap(),
        };
        assert_eq!(table.offset_slope(50.0, 20.0), Linearization::new(500.0, 10.0));
    }
}
