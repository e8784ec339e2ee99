use anyhow::Result;
use packtherm::config::read_config;
use packtherm::geom::polygon::Point2;
use packtherm::thermal::blocks::{CoolingPrismatic, RectangularBlock};
use packtherm::thermal::cooling::Cooling;
use packtherm::thermal::diagnostics::ClusterReport;
use packtherm::thermal::material::Material;
use packtherm::thermal::state::ThermalState;
use packtherm::{Point, ThermalConfig};
use std::path::Path;
use std::sync::Arc;

fn main() -> Result<()> {
    // Optional JSON configuration as the first argument
    let config = match std::env::args().nth(1) {
        Some(path) => read_config(Path::new(&path))?,
        None => ThermalConfig::new(),
    };

    // Two pouch cells stacked on a cold plate
    let cell_material = Arc::new(Material::new(2500.0, 1000.0, [25.0, 25.0, 0.8])?);
    let lower = Arc::new(ThermalState::new(config.air_temperature));
    let upper = Arc::new(ThermalState::new(config.air_temperature));
    lower.set_fixed_power_dissipation(4.0);
    upper.set_fixed_power_dissipation(4.0);

    let mut model = config.build_model()?;
    for (name, z, state) in [("cell_lower", 0.0, &lower), ("cell_upper", 0.01, &upper)] {
        let cell = RectangularBlock::new(
            name,
            Arc::clone(&cell_material),
            [0.2, 0.1, 0.01],
            [4, 2, 2],
            config.air_temperature,
            Point::new(0.0, 0.0, z),
        )?
        .with_thermal_states(vec![Arc::clone(state)], [1, 1, 1])?;
        model.add_thermal_block(&cell)?;
    }
    let plate = CoolingPrismatic::new(
        "cold_plate",
        vec![
            Point2::new(-0.05, -0.05),
            Point2::new(0.25, -0.05),
            Point2::new(0.25, 0.15),
            Point2::new(-0.05, 0.15),
        ],
        -0.005,
        0.0,
        Arc::new(Cooling::Dirichlet { temperature: 20.0 }),
    )?;
    model.add_cooling_block(&plate)?;

    let mut clusters: Vec<ClusterReport> = Vec::new();
    let fused = model.fuse_with_sink(&mut clusters)?;
    println!(
        "Fused {} elements, {} convection clusters",
        fused.ode_system_size(),
        clusters.len()
    );

    // Explicit Euler, one update per step
    let mut system = config.build_ode_system(fused)?;
    let dt = 0.5;
    let mut x = system.temperature_vector();
    let mut dxdt = vec![0.0; x.len()];
    for step in 1..=2400 {
        let time = step as f64 * dt;
        system.update(time, dt);
        system.derivative(&x, &mut dxdt)?;
        for (t, d) in x.iter_mut().zip(&dxdt) {
            *t += d * dt;
        }
        system.set_temperature_vector(&x)?;
        if step % 240 == 0 {
            system.update_thermal_states()?;
            println!(
                "t = {:6.0} s  lower = {:6.2} °C  upper = {:6.2} °C",
                time,
                lower.temperature(),
                upper.temperature()
            );
        }
    }
    Ok(())
}
