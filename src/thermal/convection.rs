use crate::geom::area::Location;
use crate::thermal::cooling::ABSOLUTE_ZERO_CELSIUS;
use crate::thermal::lookup::LookupTable2D;
use crate::thermal::structs::Linearization;
use crate::{Result, ThermalError};
use serde::{Deserialize, Serialize};

// Air properties for the natural convection correlation
const PRANDTL_AIR: f64 = 0.73135;
const CONDUCTIVITY_AIR: f64 = 0.0262;
const KINEMATIC_VISCOSITY_AIR: f64 = 1.75e-5;
const GRAVITY: f64 = 9.81;

/// Default natural convection model of external surfaces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DefaultConvection {
    /// Nusselt correlation `h ~ pre_factor * (dT / (T_air * L))^0.25`.
    Formula { pre_factor: f64 },
    /// Offset and slope over (surface temperature, characteristic length).
    LookUp {
        offset: LookupTable2D,
        slope: LookupTable2D,
    },
}

impl DefaultConvection {
    pub fn formula(pre_factor: f64) -> Result<Self> {
        let convection = Self::Formula { pre_factor };
        convection.validate()?;
        Ok(convection)
    }

    pub fn validate(&self) -> Result<()> {
        if let Self::Formula { pre_factor } = self
            && !(*pre_factor > 0.0)
        {
            return Err(ThermalError::invalid(
                "pre_factor",
                format!("must be positive, got {pre_factor}"),
            ));
        }
        Ok(())
    }

    pub fn offset_slope(
        &self,
        surface_temperature: f64,
        characteristic_length: f64,
        air_temperature: f64,
    ) -> Linearization {
        match self {
            Self::Formula { pre_factor } => {
                let delta = surface_temperature - air_temperature;
                if delta < 0.0 {
                    return Linearization::default();
                }
                let help = pre_factor
                    * (PRANDTL_AIR * GRAVITY / (KINEMATIC_VISCOSITY_AIR * KINEMATIC_VISCOSITY_AIR))
                        .powf(0.25)
                    * CONDUCTIVITY_AIR
                    * ((air_temperature - ABSOLUTE_ZERO_CELSIUS) * characteristic_length)
                        .powf(-0.25);
                Linearization::new(help * delta.powf(1.25), help * 1.25 * delta.powf(0.25))
            }
            Self::LookUp { offset, slope } => Linearization::new(
                offset.value(surface_temperature, characteristic_length),
                slope.value(surface_temperature, characteristic_length),
            ),
        }
    }
}

/// Default convection per surface location. Locations without a model get no convection.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConvectionByLocation {
    pub top: Option<DefaultConvection>,
    pub side: Option<DefaultConvection>,
    pub bottom: Option<DefaultConvection>,
}

impl ConvectionByLocation {
    /// Same model on every location.
    pub fn uniform(convection: DefaultConvection) -> Self {
        Self {
            top: Some(convection.clone()),
            side: Some(convection.clone()),
            bottom: Some(convection),
        }
    }

    pub fn get(&self, location: Location) -> Option<&DefaultConvection> {
        match location {
            Location::Top => self.top.as_ref(),
            Location::Side => self.side.as_ref(),
            Location::Bottom => self.bottom.as_ref(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        for convection in [&self.top, &self.side, &self.bottom].into_iter().flatten() {
            convection.validate()?;
        }
        Ok(())
    }
}
