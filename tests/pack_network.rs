use anyhow::Result;
use packtherm::geom::polygon::Point2;
use packtherm::thermal::blocks::{CoolingPrismatic, RectangularBlock};
use packtherm::thermal::convection::ConvectionByLocation;
use packtherm::thermal::cooling::Cooling;
use packtherm::thermal::material::Material;
use packtherm::thermal::state::ThermalState;
use packtherm::thermal::structs::IndexedValue;
use packtherm::{
    AggregateAreasForConvection, FusedModel, OdeSystemThermal, Point, ThermalConfig, ThermalModel,
    Tolerance,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

fn material() -> Arc<Material> {
    Arc::new(Material::new(2500.0, 1000.0, [20.0, 20.0, 1.0]).unwrap())
}

fn model() -> ThermalModel {
    ThermalModel::new(Tolerance::default(), AggregateAreasForConvection::ByPlane).unwrap()
}

fn assert_valid_graph(conductivity: &[Vec<IndexedValue>]) {
    for (i, row) in conductivity.iter().enumerate() {
        let sum: f64 = row.iter().map(|e| e.value).sum();
        let scale: f64 = row.iter().map(|e| e.value.abs()).sum::<f64>().max(1.0);
        assert!(sum.abs() < 1e-12 * scale, "row {} sums to {}", i, sum);
        assert!(row.windows(2).all(|w| w[0].index < w[1].index));
        for e in row.iter().filter(|e| e.index != i) {
            assert!(e.value > 0.0);
            let back = conductivity[e.index]
                .iter()
                .find(|f| f.index == i)
                .expect("missing symmetric entry");
            assert!((back.value - e.value).abs() < 1e-12 * e.value.max(1.0));
        }
    }
}

/// Global element ranges of each block, in insertion order.
fn block_ranges(sizes: &[usize]) -> Vec<std::ops::Range<usize>> {
    let mut start = 0;
    sizes
        .iter()
        .map(|&n| {
            let range = start..start + n;
            start += n;
            range
        })
        .collect()
}

#[test]
fn test_insulated_pack_conserves_energy() -> Result<()> {
    let state = Arc::new(ThermalState::new(20.0));
    state.set_fixed_power_dissipation(12.0);

    let mut model = model();
    let heated = RectangularBlock::new(
        "heated",
        material(),
        [0.1, 0.1, 0.02],
        [2, 2, 2],
        20.0,
        Point::new(0.0, 0.0, 0.0),
    )?
    .with_thermal_states(vec![Arc::clone(&state)], [1, 1, 1])?;
    model.add_thermal_block(&heated)?;
    model.add_thermal_block(&RectangularBlock::new(
        "passive",
        material(),
        [0.1, 0.1, 0.02],
        [2, 2, 1],
        20.0,
        Point::new(0.0, 0.0, 0.02),
    )?)?;

    let fused = model.fuse()?;
    assert_valid_graph(&fused.conductivity);
    let mut system =
        OdeSystemThermal::new(fused, ConvectionByLocation::default(), None, 20.0, None)?;
    let capacities: Vec<f64> = system.elements().iter().map(|e| e.heat_capacity()).collect();

    let dt = 1.0;
    let mut x = system.temperature_vector();
    let mut dxdt = vec![0.0; x.len()];
    let energy = |x: &[f64]| x.iter().zip(&capacities).map(|(t, c)| t * c).sum::<f64>();
    let initial = energy(&x);
    for step in 1..=100 {
        system.update(step as f64 * dt, dt);
        system.derivative(&x, &mut dxdt)?;
        for (t, d) in x.iter_mut().zip(&dxdt) {
            *t += d * dt;
        }
        system.set_temperature_vector(&x)?;
    }
    let gained = energy(&x) - initial;
    assert!((gained - 1200.0).abs() < 1e-6, "gained={}", gained);
    // Heat flows from the heated block into the passive one
    assert!(x[8..].iter().all(|&t| t > 20.0));
    assert!(x[..4].iter().all(|&t| t > x[8]));
    Ok(())
}

#[test]
fn test_block_relaxes_to_cold_plate() -> Result<()> {
    let mut model = model();
    model.add_thermal_block(&RectangularBlock::new(
        "cell",
        material(),
        [0.05, 0.05, 0.01],
        [1, 1, 2],
        40.0,
        Point::new(0.0, 0.0, 0.0),
    )?)?;
    model.add_cooling_block(&CoolingPrismatic::new(
        "plate",
        vec![
            Point2::new(-0.01, -0.01),
            Point2::new(0.06, -0.01),
            Point2::new(0.06, 0.06),
            Point2::new(-0.01, 0.06),
        ],
        -0.01,
        0.0,
        Arc::new(Cooling::Dirichlet { temperature: 15.0 }),
    )?)?;
    let fused = model.fuse()?;
    assert_eq!(fused.dirichlet_data[0].len(), 1);
    assert!(fused.dirichlet_data[1].is_empty());

    let mut system =
        OdeSystemThermal::new(fused, ConvectionByLocation::default(), None, 25.0, None)?;
    let dt = 2.0;
    let mut x = system.temperature_vector();
    let mut dxdt = vec![0.0; x.len()];
    for step in 1..=5000 {
        system.update(step as f64 * dt, dt);
        system.derivative(&x, &mut dxdt)?;
        for (t, d) in x.iter_mut().zip(&dxdt) {
            *t += d * dt;
        }
        system.set_temperature_vector(&x)?;
    }
    assert!(x.iter().all(|&t| (t - 15.0).abs() < 1e-3), "x={:?}", x);
    Ok(())
}

#[test]
fn test_random_stacks_keep_graph_invariants() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..10 {
        let mut model = model();
        let mut sizes = Vec::new();
        let columns = rng.random_range(1..4);
        for c in 0..columns {
            let mut z = 0.0;
            for layer in 0..rng.random_range(1..4) {
                let height = rng.random_range(1..4) as f64 * 0.01;
                let cells = [
                    rng.random_range(1..4),
                    rng.random_range(1..3),
                    rng.random_range(1..3),
                ];
                let block = RectangularBlock::new(
                    &format!("block_{c}_{layer}"),
                    material(),
                    [0.03, 0.02, height],
                    cells,
                    20.0,
                    Point::new(c as f64 * 0.03, 0.0, z),
                )?;
                sizes.push(cells.iter().product::<usize>());
                model.add_thermal_block(&block)?;
                z += height;
            }
        }
        let fused = model.fuse()?;
        assert_eq!(fused.ode_system_size(), sizes.iter().sum::<usize>());
        assert_valid_graph(&fused.conductivity);

        // Every external area fraction is positive and no area is overcommitted
        for data in fused.cooling_data.iter().flatten() {
            assert!(data.a_cool > 0.0);
            assert!(data.characteristic_length > 0.0);
        }
    }
    Ok(())
}

#[test]
fn test_separated_blocks_stay_uncoupled() -> Result<()> {
    let mut model = model();
    let sizes = [4, 2];
    model.add_thermal_block(&RectangularBlock::new(
        "a",
        material(),
        [0.02, 0.02, 0.01],
        [2, 2, 1],
        20.0,
        Point::new(0.0, 0.0, 0.0),
    )?)?;
    model.add_thermal_block(&RectangularBlock::new(
        "b",
        material(),
        [0.02, 0.02, 0.01],
        [2, 1, 1],
        20.0,
        Point::new(0.05, 0.0, 0.0),
    )?)?;
    let fused = model.fuse()?;
    let ranges = block_ranges(&sizes);
    for range in &ranges {
        for i in range.clone() {
            assert!(fused.conductivity[i].iter().all(|e| range.contains(&e.index)));
        }
    }
    // All 2 * (4 + 2 + 2) + 2 * (2 + 2 + 1) faces are external
    let total: usize = fused.cooling_data.iter().map(Vec::len).sum();
    assert_eq!(total, 16 + 10);
    assert!(fused.dirichlet_data.iter().all(Vec::is_empty));
    Ok(())
}

#[test]
fn test_fully_covered_top_face() -> Result<()> {
    let mut model = model();
    for (name, z) in [("lower", 0.0), ("upper", 0.01)] {
        model.add_thermal_block(&RectangularBlock::new(
            name,
            material(),
            [0.02, 0.02, 0.01],
            [2, 2, 1],
            20.0,
            Point::new(0.0, 0.0, z),
        )?)?;
    }
    let fused: FusedModel = model.fuse()?;
    for i in 0..4 {
        let edges: Vec<&IndexedValue> = fused.conductivity[i]
            .iter()
            .filter(|e| e.index >= 4)
            .collect();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].index, i + 4);
        // k = 1, 1e-4 m^2 overlap, 5 mm to each grid vertex
        assert!((edges[0].value - 1e-4 / 0.01).abs() < 1e-12);
        // Bottom, two sides remain
        assert_eq!(fused.cooling_data[i].len(), 3);
        assert_eq!(fused.cooling_data[i + 4].len(), 3);
    }
    Ok(())
}

#[test]
fn test_config_driven_parallel_run() -> Result<()> {
    let config = ThermalConfig::from_json_str(r#"{ "threads": 3, "radiation": true }"#)?;
    let mut model = config.build_model()?;
    model.add_thermal_block(&RectangularBlock::new(
        "cell",
        material(),
        [0.1, 0.05, 0.02],
        [4, 2, 2],
        45.0,
        Point::new(0.0, 0.0, 0.0),
    )?)?;
    let mut system = config.build_ode_system(model.fuse()?)?;
    system.update(1.0, 1.0);
    let x = system.temperature_vector();
    let mut dxdt = vec![0.0; x.len()];
    system.derivative(&x, &mut dxdt)?;
    assert!(dxdt.iter().all(|&d| d < 0.0));
    Ok(())
}
