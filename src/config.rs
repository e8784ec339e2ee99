//! JSON configuration of the model assembly and the ambient boundary conditions.

use crate::Result;
use crate::geom::tolerance::Tolerance;
use crate::parallel::ThreadedForLoop;
use crate::thermal::convection::{ConvectionByLocation, DefaultConvection};
use crate::thermal::cooling::Radiation;
use crate::thermal::model::{AggregateAreasForConvection, FusedModel, ThermalModel};
use crate::thermal::ode_system::OdeSystemThermal;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::sync::Arc;

/// Configuration shared by the assembler and the ODE system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThermalConfig {
    /// Length, angle and relative tolerances of all geometric tests.
    pub tolerance: Tolerance,
    /// Grouping of external areas for the characteristic length.
    pub aggregation: AggregateAreasForConvection,
    /// Ambient air temperature in °C.
    pub air_temperature: f64,
    /// Natural convection per surface location.
    ///
    /// Default: Nusselt correlations with pre-factors 0.54 (top), 0.59 (side)
    /// and 0.27 (bottom).
    pub convection: ConvectionByLocation,
    /// Black body radiation from external surfaces to the air temperature.
    pub radiation: bool,
    /// Worker threads of the ODE system loops.
    ///
    /// - `None` (default): run on the calling thread
    /// - `Some(0)`: use the available parallelism
    pub threads: Option<usize>,
}

impl ThermalConfig {
    pub fn new() -> Self {
        Self {
            tolerance: Tolerance::default(),
            aggregation: AggregateAreasForConvection::ByPlane,
            air_temperature: 25.0,
            convection: ConvectionByLocation {
                top: Some(DefaultConvection::Formula { pre_factor: 0.54 }),
                side: Some(DefaultConvection::Formula { pre_factor: 0.59 }),
                bottom: Some(DefaultConvection::Formula { pre_factor: 0.27 }),
            },
            radiation: false,
            threads: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.tolerance.validate()?;
        self.convection.validate()
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Worker pool for `threads`, if any.
    pub fn build_looper(&self) -> Result<Option<Arc<ThreadedForLoop>>> {
        self.threads
            .map(|threads| ThreadedForLoop::new(threads).map(Arc::new))
            .transpose()
    }

    /// Empty model using the configured tolerance, aggregation and worker pool.
    pub fn build_model(&self) -> Result<ThermalModel> {
        let model = ThermalModel::new(self.tolerance, self.aggregation)?;
        Ok(match self.build_looper()? {
            Some(looper) => model.with_looper(looper),
            None => model,
        })
    }

    /// ODE system over `fused` with the configured ambient conditions and worker pool.
    pub fn build_ode_system(&self, fused: FusedModel) -> Result<OdeSystemThermal> {
        OdeSystemThermal::new(
            fused,
            self.convection.clone(),
            self.radiation.then_some(Radiation),
            self.air_temperature,
            self.build_looper()?,
        )
    }
}

impl Default for ThermalConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads a configuration from a JSON file. Missing fields take their defaults.
pub fn read_config(path: &Path) -> anyhow::Result<ThermalConfig> {
    let file =
        File::open(path).with_context(|| format!("Failed to open file: {}", path.display()))?;
    let config: ThermalConfig = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse configuration: {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("Invalid configuration: {}", path.display()))?;
    Ok(config)
}

pub fn write_config(path: &Path, config: &ThermalConfig) -> anyhow::Result<()> {
    let file =
        File::create(path).with_context(|| format!("Failed to create file: {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), config)
        .with_context(|| format!("Failed to write configuration to: {}", path.display()))?;
    Ok(())
}
