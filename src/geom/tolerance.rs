use crate::{Result, ThermalError};
use serde::{Deserialize, Serialize};

/// Precision used by every geometric comparison while a model is fused.
///
/// - `length` is an absolute length in meters.
/// - `angle` is in radians.
/// - `percent_of_quantity` is a relative tolerance in percent, used for
///   area bookkeeping and for deciding whether two conductivities are equal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tolerance {
    pub length: f64,
    pub angle: f64,
    pub percent_of_quantity: f64,
}

impl Tolerance {
    pub fn new(length: f64, angle: f64, percent_of_quantity: f64) -> Result<Self> {
        let tolerance = Self {
            length,
            angle,
            percent_of_quantity,
        };
        tolerance.validate()?;
        Ok(tolerance)
    }

    pub fn with_angle_deg(length: f64, angle_deg: f64, percent_of_quantity: f64) -> Result<Self> {
        Self::new(length, angle_deg.to_radians(), percent_of_quantity)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("tolerance.length", self.length),
            ("tolerance.angle", self.angle),
            ("tolerance.percent_of_quantity", self.percent_of_quantity),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ThermalError::invalid(
                    name,
                    format!("must be finite and non-negative, got {value}"),
                ));
            }
        }
        Ok(())
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            length: 1e-6,
            angle: 0.001_f64.to_radians(),
            percent_of_quantity: 0.1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let tol = Tolerance::default();
        assert!(tol.validate().is_ok());
        assert!((tol.angle - 1.7453292519943296e-5).abs() < 1e-18);
    }

    #[test]
    fn test_rejects_negative_values() {
        assert!(Tolerance::new(-1.0, 0.0, 0.0).is_err());
        assert!(Tolerance::new(0.0, -0.1, 0.0).is_err());
        assert!(Tolerance::new(0.0, 0.0, f64::NAN).is_err());
        assert!(Tolerance::with_angle_deg(1e-6, 0.001, 0.1).is_ok());
    }
}
