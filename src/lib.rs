pub mod config;
mod error;
pub mod geom;
pub mod parallel;
pub mod thermal;

// Prelude
pub use error::{Result, ThermalError};
pub use geom::point::Point;
pub use geom::tolerance::Tolerance;
pub use geom::vector::Vector;
pub use thermal::model::{AggregateAreasForConvection, FusedModel, ThermalModel};
pub use thermal::ode_system::OdeSystemThermal;
// Configuration
pub use config::ThermalConfig;
