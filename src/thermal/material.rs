use crate::{Result, ThermalError};
use serde::{Deserialize, Serialize};

/// Thermal properties of a solid.
///
/// Conductivity is given per axis (x, y, z) in W/(m*K) so that layered cells
/// can be modelled as anisotropic blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Density in kg/m^3.
    density: f64,
    /// Specific heat capacity in J/(kg*K).
    specific_capacity: f64,
    conductivity: [f64; 3],
}

impl Material {
    pub fn new(density: f64, specific_capacity: f64, conductivity: [f64; 3]) -> Result<Self> {
        let check = |name: &'static str, value: f64| {
            if value > 0.0 && value.is_finite() {
                Ok(())
            } else {
                Err(ThermalError::invalid(
                    name,
                    format!("must be positive, got {value}"),
                ))
            }
        };
        check("density", density)?;
        check("specific_capacity", specific_capacity)?;
        for k in conductivity {
            check("conductivity", k)?;
        }
        Ok(Self {
            density,
            specific_capacity,
            conductivity,
        })
    }

    pub fn isotropic(density: f64, specific_capacity: f64, conductivity: f64) -> Result<Self> {
        Self::new(density, specific_capacity, [conductivity; 3])
    }

    pub fn density(&self) -> f64 {
        self.density
    }

    pub fn specific_capacity(&self) -> f64 {
        self.specific_capacity
    }

    /// Conductivity along axis 0 (x), 1 (y) or 2 (z).
    pub fn conductivity(&self, axis: usize) -> f64 {
        self.conductivity[axis.min(2)]
    }

    /// Volumetric heat capacity in J/(m^3*K).
    pub fn volumetric_heat_capacity(&self) -> f64 {
        self.density * self.specific_capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_material() {
        let m = Material::new(2000.0, 800.0, [1.0, 2.0, 30.0]).unwrap();
        assert_eq!(m.conductivity(2), 30.0);
        assert!((m.volumetric_heat_capacity() - 1.6e6).abs() < 1e-6);
    }

    #[test]
    fn test_rejects_non_positive_values() {
        assert!(Material::isotropic(0.0, 800.0, 1.0).is_err());
        assert!(Material::isotropic(2000.0, -1.0, 1.0).is_err());
        assert!(Material::new(2000.0, 800.0, [1.0, 0.0, 1.0]).is_err());
    }
}
