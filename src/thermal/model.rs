use crate::geom::area::{Area, Location};
use crate::geom::block_geometry::{AdjacencyType, BlockGeometry};
use crate::geom::polygon::Point2;
use crate::parallel::ThreadedForLoop;
use crate::thermal::blocks::{CoolingBlock, ThermalBlock};
use crate::thermal::cooling::Cooling;
use crate::thermal::diagnostics::{ClusterReport, ClusterSink, NullSink};
use crate::thermal::element::ThermalElement;
use crate::thermal::structs::{IndexedArea, IndexedValue, TaylorData};
use crate::{Point, Result, ThermalError, Tolerance};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info};

/// How external areas are grouped before a characteristic length is computed for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AggregateAreasForConvection {
    /// All coplanar areas with the same location form one cluster.
    #[default]
    ByPlane,
    /// Coplanar clusters are further split into groups of blocks that touch each other.
    ByPlaneAndBlocks,
}

/// Output of [`ThermalModel::fuse`], the input of the ODE system.
///
/// All vectors are indexed by the global element index. Elements are numbered block
/// by block in insertion order.
#[derive(Debug, Clone)]
pub struct FusedModel {
    pub elements: Vec<ThermalElement>,
    /// Sparse rows sorted by index. Diagonals are negative, off-diagonals positive.
    pub conductivity: Vec<Vec<IndexedValue>>,
    /// Convective, radiative and non-Dirichlet forced boundary patches.
    pub cooling_data: Vec<Vec<TaylorData>>,
    /// Patches held at a fixed temperature.
    pub dirichlet_data: Vec<Vec<TaylorData>>,
}

impl FusedModel {
    pub fn ode_system_size(&self) -> usize {
        self.elements.len()
    }
}

/// Surface mesh of all blocks for plotting.
#[derive(Debug, Clone, Default)]
pub struct SurfaceMesh {
    /// Distinct vertices, merged within the length tolerance.
    pub vertices: Vec<Point>,
    /// Outline of each surface area as indices into `vertices`.
    pub areas: Vec<Vec<usize>>,
    /// Global element index of each surface area.
    pub area_elements: Vec<usize>,
    /// Indices into `areas`, one list per block.
    pub volumes: Vec<Vec<usize>>,
    pub volume_names: Vec<String>,
}

#[derive(Debug, Clone)]
struct BlockEntry {
    elements: Vec<ThermalElement>,
    conductivity: Vec<Vec<IndexedValue>>,
    surface_areas: Vec<IndexedArea>,
    geometry: BlockGeometry,
    name: String,
}

#[derive(Debug, Clone)]
struct CoolingEntry {
    areas: Vec<Area>,
    geometry: BlockGeometry,
    cooling: Arc<Cooling>,
}

/// Part of a block surface area that is not covered by any neighbour.
#[derive(Debug, Clone, Copy)]
struct ExternalArea {
    element: usize,
    block: usize,
    area: usize,
    rest: f64,
}

/// Part of a block surface area that touches a cooling region.
#[derive(Debug, Clone)]
struct CooledArea {
    element: usize,
    block: usize,
    area: usize,
    overlap: f64,
    cooling: Arc<Cooling>,
}

type AdjacencyRow = Vec<(usize, AdjacencyType)>;
type AdjacencyMatrix = Vec<AdjacencyRow>;

/// Collects thermal blocks and cooling regions and fuses them into one network.
///
/// Blocks only know their own elements. Fusing connects touching faces of different
/// blocks, finds the faces that stay exposed and groups those into convection clusters.
#[derive(Debug, Clone)]
pub struct ThermalModel {
    tolerance: Tolerance,
    aggregation: AggregateAreasForConvection,
    blocks: Vec<BlockEntry>,
    coolings: Vec<CoolingEntry>,
    looper: Option<Arc<ThreadedForLoop>>,
}

impl ThermalModel {
    pub fn new(tolerance: Tolerance, aggregation: AggregateAreasForConvection) -> Result<Self> {
        tolerance.validate()?;
        Ok(Self {
            tolerance,
            aggregation,
            blocks: Vec::new(),
            coolings: Vec::new(),
            looper: None,
        })
    }

    /// Runs the per-block and per-element passes of [`fuse`](Self::fuse) on `looper`.
    pub fn with_looper(mut self, looper: Arc<ThreadedForLoop>) -> Self {
        self.looper = Some(looper);
        self
    }

    pub fn tolerance(&self) -> &Tolerance {
        &self.tolerance
    }

    pub fn aggregation(&self) -> AggregateAreasForConvection {
        self.aggregation
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn cooling_count(&self) -> usize {
        self.coolings.len()
    }

    /// Number of thermal elements of all blocks.
    pub fn element_count(&self) -> usize {
        self.blocks.iter().map(|b| b.elements.len()).sum()
    }

    /// Adds a block. Indices in `conductivity` and `surface_areas` are local to the block.
    pub fn add_block(
        &mut self,
        elements: Vec<ThermalElement>,
        conductivity: Vec<Vec<IndexedValue>>,
        surface_areas: Vec<IndexedArea>,
        geometry: BlockGeometry,
        name: &str,
    ) -> Result<()> {
        let len = elements.len();
        if conductivity.len() != len {
            return Err(ThermalError::SizeMismatch {
                what: "block conductivity rows",
                expected: len,
                actual: conductivity.len(),
            });
        }
        let indices = conductivity
            .iter()
            .flatten()
            .map(|e| e.index)
            .chain(surface_areas.iter().map(|a| a.index));
        for index in indices {
            if index >= len {
                return Err(ThermalError::IndexOutOfRange {
                    what: "block elements",
                    index,
                    len,
                });
            }
        }
        for surface in &surface_areas {
            let distance = surface.area.distance_to_grid_vertex();
            if !(distance > 0.0 && distance.is_finite()) {
                return Err(ThermalError::invalid(
                    "distance_to_grid_vertex",
                    format!(
                        "{name}: area of element {} has distance {distance}",
                        surface.index
                    ),
                ));
            }
            let conductivity = surface.area.conductivity();
            if !(conductivity > 0.0 && conductivity.is_finite()) {
                return Err(ThermalError::invalid(
                    "conductivity",
                    format!(
                        "{name}: area of element {} has conductivity {conductivity}",
                        surface.index
                    ),
                ));
            }
        }
        debug!(name, elements = len, areas = surface_areas.len(), "block added");
        self.blocks.push(BlockEntry {
            elements,
            conductivity,
            surface_areas,
            geometry,
            name: name.to_string(),
        });
        Ok(())
    }

    pub fn add_cooling(
        &mut self,
        areas: Vec<Area>,
        geometry: BlockGeometry,
        cooling: Arc<Cooling>,
    ) {
        debug!(
            name = geometry.description(),
            areas = areas.len(),
            "cooling added"
        );
        self.coolings.push(CoolingEntry {
            areas,
            geometry,
            cooling,
        });
    }

    pub fn add_thermal_block(&mut self, block: &dyn ThermalBlock) -> Result<()> {
        let data = block.create_data()?;
        self.add_block(
            data.elements,
            data.conductivity,
            data.surface_areas,
            data.geometry,
            block.description(),
        )
    }

    pub fn add_cooling_block(&mut self, block: &dyn CoolingBlock) -> Result<()> {
        let areas = block.cooling_areas()?;
        let geometry = block.block_geometry()?;
        self.add_cooling(areas, geometry, Arc::clone(block.cooling()));
        Ok(())
    }

    /// Fails if any block or cooling region is thinner than the length tolerance.
    pub fn dimension_test(&self) -> Result<()> {
        let geometries = self
            .blocks
            .iter()
            .map(|b| &b.geometry)
            .chain(self.coolings.iter().map(|c| &c.geometry));
        for geometry in geometries {
            if geometry.has_insufficient_dimension(&self.tolerance) {
                return Err(ThermalError::InsufficientDimension(
                    geometry.description().to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Fails if two blocks, a block and a cooling region, or two cooling regions share volume.
    pub fn collision_test(&self) -> Result<()> {
        let tol = &self.tolerance;
        let collision = |a: &BlockGeometry, b: &BlockGeometry| ThermalError::Collision {
            first: a.description().to_string(),
            second: b.description().to_string(),
        };

        for (i, block) in self.blocks.iter().enumerate() {
            for other in &self.blocks[i + 1..] {
                if block.geometry.collides_with(&other.geometry, tol) {
                    return Err(collision(&block.geometry, &other.geometry));
                }
            }
            for cooling in &self.coolings {
                if block.geometry.collides_with(&cooling.geometry, tol) {
                    return Err(collision(&block.geometry, &cooling.geometry));
                }
            }
        }
        for (i, cooling) in self.coolings.iter().enumerate() {
            for other in &self.coolings[i + 1..] {
                if cooling.geometry.collides_with(&other.geometry, tol) {
                    return Err(collision(&cooling.geometry, &other.geometry));
                }
            }
        }
        Ok(())
    }

    pub fn fuse(&self) -> Result<FusedModel> {
        self.fuse_with_sink(&mut NullSink)
    }

    /// Fuses all blocks and coolings into one network and reports every convection
    /// cluster to `sink`.
    pub fn fuse_with_sink(&self, sink: &mut dyn ClusterSink) -> Result<FusedModel> {
        info!(
            blocks = self.blocks.len(),
            coolings = self.coolings.len(),
            "fusing thermal model"
        );
        self.dimension_test()?;
        self.collision_test()?;

        let size = self.element_count();
        let starts = self.block_start_indices();
        let elements: Vec<ThermalElement> = self
            .blocks
            .iter()
            .flat_map(|b| b.elements.iter().cloned())
            .collect();

        let mut conductivity = self.inner_conductivities(&starts, size);
        let (adjacency, cooling_adjacency) = self.adjacency_matrices();
        debug!(
            block_contacts = adjacency.iter().map(Vec::len).sum::<usize>(),
            cooling_contacts = cooling_adjacency.iter().map(Vec::len).sum::<usize>(),
            "adjacency found"
        );

        let (external, cooled) = self.fuse_outer_conductivities(
            &adjacency,
            &cooling_adjacency,
            &starts,
            &mut conductivity,
        )?;
        self.check_conductivity(&mut conductivity)?;

        let mut cooling_data = vec![Vec::new(); size];
        let mut dirichlet_data = vec![Vec::new(); size];
        let clusters =
            self.create_convection_data(&adjacency, &external, &mut cooling_data, sink)?;
        self.create_forced_cooling_data(&cooled, &mut cooling_data, &mut dirichlet_data);

        info!(
            elements = size,
            external_areas = external.len(),
            clusters,
            cooled_areas = cooled.len(),
            "thermal model fused"
        );
        Ok(FusedModel {
            elements,
            conductivity,
            cooling_data,
            dirichlet_data,
        })
    }

    /// Global index of the element whose grid vertex is closest to each probe point.
    pub fn probe_thermal_elements(&self, probes: &[Point]) -> Result<Vec<usize>> {
        if self.element_count() == 0 {
            return Err(ThermalError::NoElements);
        }
        let probes = probes
            .iter()
            .map(|probe| {
                let mut best = (0, f64::MAX);
                let vertices = self
                    .blocks
                    .iter()
                    .flat_map(|b| b.elements.iter())
                    .map(ThermalElement::grid_vertex);
                for (index, vertex) in vertices.enumerate() {
                    let distance = vertex.distance_to(probe);
                    if distance < best.1 {
                        best = (index, distance);
                    }
                }
                best.0
            })
            .collect();
        Ok(probes)
    }

    /// Outer surfaces of all blocks with shared vertices merged.
    pub fn surface_mesh(&self) -> SurfaceMesh {
        let mut mesh = SurfaceMesh::default();
        for (block, start) in self.blocks.iter().zip(self.block_start_indices()) {
            let mut volume = Vec::with_capacity(block.surface_areas.len());
            for indexed in &block.surface_areas {
                let outline = indexed
                    .area
                    .global_vertices()
                    .into_iter()
                    .map(|v| {
                        match mesh
                            .vertices
                            .iter()
                            .position(|w| w.equals_within(&v, self.tolerance.length))
                        {
                            Some(i) => i,
                            None => {
                                mesh.vertices.push(v);
                                mesh.vertices.len() - 1
                            }
                        }
                    })
                    .collect();
                volume.push(mesh.areas.len());
                mesh.areas.push(outline);
                mesh.area_elements.push(start + indexed.index);
            }
            mesh.volumes.push(volume);
            mesh.volume_names.push(block.name.clone());
        }
        mesh
    }

    fn block_start_indices(&self) -> Vec<usize> {
        self.blocks
            .iter()
            .scan(0, |next, block| {
                let start = *next;
                *next += block.elements.len();
                Some(start)
            })
            .collect()
    }

    fn inner_conductivities(&self, starts: &[usize], size: usize) -> Vec<Vec<IndexedValue>> {
        let mut conductivity = Vec::with_capacity(size);
        for (block, &start) in self.blocks.iter().zip(starts) {
            for row in &block.conductivity {
                conductivity.push(
                    row.iter()
                        .map(|e| IndexedValue::new(e.index + start, e.value))
                        .collect(),
                );
            }
        }
        conductivity
    }

    /// Block pairs `i < j` and block-cooling pairs with the relation seen from the block.
    fn adjacency_matrices(&self) -> (AdjacencyMatrix, AdjacencyMatrix) {
        let mut rows: Vec<(AdjacencyRow, AdjacencyRow)> =
            vec![(Vec::new(), Vec::new()); self.blocks.len()];
        let op = |i: usize, row: &mut (AdjacencyRow, AdjacencyRow)| *row = self.adjacency_row(i);
        match &self.looper {
            Some(looper) => looper.run_loop_mut(&mut rows, op),
            None => rows.iter_mut().enumerate().for_each(|(i, row)| op(i, row)),
        }
        rows.into_iter().unzip()
    }

    fn adjacency_row(&self, i: usize) -> (AdjacencyRow, AdjacencyRow) {
        let tol = &self.tolerance;
        let block = &self.blocks[i];
        let blocks = self
            .blocks
            .iter()
            .enumerate()
            .skip(i + 1)
            .map(|(j, other)| (j, block.geometry.is_adjacent_to(&other.geometry, tol)))
            .filter(|&(_, relation)| relation != AdjacencyType::NotAdjacent)
            .collect();
        let coolings = self
            .coolings
            .iter()
            .enumerate()
            .map(|(j, cooling)| (j, block.geometry.is_adjacent_to(&cooling.geometry, tol)))
            .filter(|&(_, relation)| relation != AdjacencyType::NotAdjacent)
            .collect();
        (blocks, coolings)
    }

    /// Sorts every conductivity row and rejects duplicates, wrong signs and
    /// non-finite values.
    fn check_conductivity(&self, conductivity: &mut [Vec<IndexedValue>]) -> Result<()> {
        match &self.looper {
            Some(looper) => {
                looper.try_run_loop_mut(conductivity, |row, entries| check_row(row, entries))
            }
            None => conductivity
                .iter_mut()
                .enumerate()
                .try_for_each(|(row, entries)| check_row(row, entries)),
        }
    }

    fn fuse_outer_conductivities(
        &self,
        adjacency: &AdjacencyMatrix,
        cooling_adjacency: &AdjacencyMatrix,
        starts: &[usize],
        conductivity: &mut [Vec<IndexedValue>],
    ) -> Result<(Vec<ExternalArea>, Vec<CooledArea>)> {
        let tol = &self.tolerance;
        let block_sorted: Vec<[Vec<usize>; 3]> = self
            .blocks
            .iter()
            .map(|b| sort_by_location(b.surface_areas.iter().map(|a| &a.area)))
            .collect();
        let cooling_sorted: Vec<[Vec<usize>; 3]> = self
            .coolings
            .iter()
            .map(|c| sort_by_location(c.areas.iter()))
            .collect();
        let mut not_covered: Vec<Vec<f64>> = self
            .blocks
            .iter()
            .map(|b| b.surface_areas.iter().map(|a| a.area.area_value()).collect())
            .collect();

        for (i, row) in adjacency.iter().enumerate() {
            for &(j, relation) in row {
                let Some((own, other)) = touching_locations(relation) else {
                    continue;
                };
                for &a in &block_sorted[i][own.index()] {
                    for &b in &block_sorted[j][other.index()] {
                        let first = &self.blocks[i].surface_areas[a];
                        let second = &self.blocks[j].surface_areas[b];
                        let overlap = first.area.overlap_with(&second.area, tol);
                        if overlap <= 0.0 {
                            continue;
                        }
                        not_covered[i][a] -= overlap;
                        not_covered[j][b] -= overlap;
                        let value = contact_conductance(overlap, &first.area, &second.area, tol);
                        connect(
                            conductivity,
                            starts[i] + first.index,
                            starts[j] + second.index,
                            value,
                        );
                    }
                }
            }
        }

        let mut cooled = Vec::new();
        for (i, row) in cooling_adjacency.iter().enumerate() {
            for &(j, relation) in row {
                let Some((own, other)) = touching_locations(relation) else {
                    continue;
                };
                let cooling = &self.coolings[j];
                for &a in &block_sorted[i][own.index()] {
                    for &c in &cooling_sorted[j][other.index()] {
                        let surface = &self.blocks[i].surface_areas[a];
                        let overlap = surface.area.overlap_with(&cooling.areas[c], tol);
                        if overlap <= 0.0 {
                            continue;
                        }
                        not_covered[i][a] -= overlap;
                        cooled.push(CooledArea {
                            element: starts[i] + surface.index,
                            block: i,
                            area: a,
                            overlap,
                            cooling: Arc::clone(&cooling.cooling),
                        });
                    }
                }
            }
        }

        let mut external = Vec::new();
        for (i, block) in self.blocks.iter().enumerate() {
            for (a, surface) in block.surface_areas.iter().enumerate() {
                let rest = not_covered[i][a];
                let limit = surface.area.area_value() * tol.percent_of_quantity / 100.0;
                let element = starts[i] + surface.index;
                if rest < -limit {
                    return Err(ThermalError::OverlapBiggerThanArea {
                        element,
                        excess: -rest,
                    });
                }
                if rest > limit {
                    external.push(ExternalArea {
                        element,
                        block: i,
                        area: a,
                        rest,
                    });
                }
            }
        }
        Ok((external, cooled))
    }

    /// Groups external areas into clusters and fills `cooling_data` with one entry per area.
    /// Returns the number of clusters.
    fn create_convection_data(
        &self,
        adjacency: &AdjacencyMatrix,
        external: &[ExternalArea],
        cooling_data: &mut [Vec<TaylorData>],
        sink: &mut dyn ClusterSink,
    ) -> Result<usize> {
        let tol = &self.tolerance;
        let area_of = |e: &ExternalArea| &self.blocks[e.block].surface_areas[e.area].area;

        let mut clusters: Vec<Vec<usize>> = Vec::new();
        for (n, candidate) in external.iter().enumerate() {
            let area = area_of(candidate);
            let found = clusters.iter_mut().find(|cluster| {
                let front = area_of(&external[cluster[0]]);
                front.location() == area.location() && front.is_coplanar_to(area, tol)
            });
            match found {
                Some(cluster) => cluster.push(n),
                None => clusters.push(vec![n]),
            }
        }
        if self.aggregation == AggregateAreasForConvection::ByPlaneAndBlocks {
            clusters = clusters
                .into_iter()
                .flat_map(|cluster| {
                    let location = area_of(&external[cluster[0]]).location();
                    split_by_blocks(cluster, location, external, adjacency)
                })
                .collect();
        }

        for cluster in &clusters {
            check_cluster(cluster, external)?;
            let areas: Vec<&Area> = cluster.iter().map(|&n| area_of(&external[n])).collect();
            let constructing = areas[0];
            let aggregated = constructing.aggregate(&areas, tol);
            let (lo, hi) = (aggregated.lowest, aggregated.highest);
            let plane = constructing.plane();
            let corners = [
                plane.global(lo),
                plane.global(Point2::new(lo.x, hi.y)),
                plane.global(hi),
                plane.global(Point2::new(hi.x, lo.y)),
            ];
            let characteristic_length = if constructing.is_horizontal(tol) {
                let a = hi.x - lo.x;
                let b = hi.y - lo.y;
                0.5 * a * b / (a + b)
            } else {
                let z = corners.iter().map(|c| c.z);
                z.clone().fold(f64::MIN, f64::max) - z.fold(f64::MAX, f64::min)
            };

            for (&n, area) in cluster.iter().zip(&areas) {
                cooling_data[external[n].element].push(TaylorData {
                    temp_surf_last_step: 0.0,
                    characteristic_length,
                    a_cool: external[n].rest,
                    location: area.location(),
                    distance_to_grid_vertex: area.distance_to_grid_vertex(),
                    conductivity: area.conductivity(),
                    cooling: None,
                });
            }
            sink.report(&ClusterReport {
                location: constructing.location(),
                characteristic_length,
                corners,
                area_count: cluster.len(),
            })?;
        }
        debug!(clusters = clusters.len(), "convection clusters created");
        Ok(clusters.len())
    }

    fn create_forced_cooling_data(
        &self,
        cooled: &[CooledArea],
        cooling_data: &mut [Vec<TaylorData>],
        dirichlet_data: &mut [Vec<TaylorData>],
    ) {
        for entry in cooled {
            let area = &self.blocks[entry.block].surface_areas[entry.area].area;
            let mut data = TaylorData {
                temp_surf_last_step: 0.0,
                characteristic_length: -1.0,
                a_cool: entry.overlap,
                location: area.location(),
                distance_to_grid_vertex: area.distance_to_grid_vertex(),
                conductivity: area.conductivity(),
                cooling: Some(Arc::clone(&entry.cooling)),
            };
            if entry.cooling.is_dirichlet() {
                data.temp_surf_last_step = entry.cooling.offset_slope(0.0, 0.0).offset;
                dirichlet_data[entry.element].push(data);
            } else {
                cooling_data[entry.element].push(data);
            }
        }
    }
}

/// Area indices per location, in table order of [`Location::index`].
fn sort_by_location<'a>(areas: impl Iterator<Item = &'a Area>) -> [Vec<usize>; 3] {
    let mut sorted: [Vec<usize>; 3] = Default::default();
    for (i, area) in areas.enumerate() {
        sorted[area.location().index()].push(i);
    }
    sorted
}

/// Locations of the touching faces of the first and the second partner.
fn touching_locations(relation: AdjacencyType) -> Option<(Location, Location)> {
    match relation {
        AdjacencyType::NotAdjacent => None,
        AdjacencyType::TopBottom => Some((Location::Top, Location::Bottom)),
        AdjacencyType::BottomTop => Some((Location::Bottom, Location::Top)),
        AdjacencyType::SideSide => Some((Location::Side, Location::Side)),
    }
}

/// Conductance in W/K between the grid vertices behind two touching areas.
fn contact_conductance(overlap: f64, first: &Area, second: &Area, tolerance: &Tolerance) -> f64 {
    let (k1, d1) = (first.conductivity(), first.distance_to_grid_vertex());
    let (k2, d2) = (second.conductivity(), second.distance_to_grid_vertex());
    if (k1 / k2 - 1.0).abs() < tolerance.percent_of_quantity / 100.0 {
        overlap * k1 / (d1 + d2)
    } else {
        overlap / (d1 / k1 + d2 / k2)
    }
}

fn add_to_row(row: &mut Vec<IndexedValue>, index: usize, value: f64) {
    match row.iter_mut().find(|e| e.index == index) {
        Some(entry) => entry.value += value,
        None => row.push(IndexedValue::new(index, value)),
    }
}

fn connect(conductivity: &mut [Vec<IndexedValue>], i: usize, j: usize, value: f64) {
    add_to_row(&mut conductivity[i], j, value);
    add_to_row(&mut conductivity[j], i, value);
    add_to_row(&mut conductivity[i], i, -value);
    add_to_row(&mut conductivity[j], j, -value);
}

/// Sorts a row by index and checks that its entries are finite and correctly signed.
fn check_row(row: usize, entries: &mut [IndexedValue]) -> Result<()> {
    entries.sort_by_key(|e| e.index);
    if let Some(pair) = entries.windows(2).find(|w| w[0].index == w[1].index) {
        return Err(ThermalError::ConductivityIndexTwice {
            row,
            index: pair[0].index,
        });
    }
    for entry in entries.iter() {
        if !entry.value.is_finite() {
            return Err(ThermalError::ConductivityNotFinite {
                row,
                index: entry.index,
                value: entry.value,
            });
        }
        if entry.index == row {
            if entry.value >= 0.0 {
                return Err(ThermalError::SelfConductivityNotNegative {
                    row,
                    value: entry.value,
                });
            }
        } else if entry.value <= 0.0 {
            return Err(ThermalError::ConductivityNotPositive {
                row,
                index: entry.index,
                value: entry.value,
            });
        }
    }
    Ok(())
}

/// Rejects a cluster that lists the same block surface area more than once.
fn check_cluster(cluster: &[usize], external: &[ExternalArea]) -> Result<()> {
    let mut seen = HashSet::new();
    for &n in cluster {
        if !seen.insert((external[n].block, external[n].area)) {
            return Err(ThermalError::AreaFoundTwice {
                element: external[n].element,
            });
        }
    }
    Ok(())
}

/// Splits a coplanar cluster into groups of blocks connected through touching faces.
///
/// Side clusters are connected through blocks stacked on each other, top and bottom
/// clusters through blocks standing side by side. Groups are ordered by first appearance.
fn split_by_blocks(
    cluster: Vec<usize>,
    location: Location,
    external: &[ExternalArea],
    adjacency: &AdjacencyMatrix,
) -> Vec<Vec<usize>> {
    let mut blocks: Vec<usize> = Vec::new();
    for &n in &cluster {
        if !blocks.contains(&external[n].block) {
            blocks.push(external[n].block);
        }
    }

    let mut parent: Vec<usize> = (0..blocks.len()).collect();
    for p in 0..blocks.len() {
        for q in p + 1..blocks.len() {
            let (lo, hi) = (blocks[p].min(blocks[q]), blocks[p].max(blocks[q]));
            let relation = adjacency[lo]
                .iter()
                .find(|(j, _)| *j == hi)
                .map_or(AdjacencyType::NotAdjacent, |&(_, r)| r);
            let joined = match location {
                Location::Side => matches!(
                    relation,
                    AdjacencyType::TopBottom | AdjacencyType::BottomTop
                ),
                Location::Top | Location::Bottom => relation == AdjacencyType::SideSide,
            };
            if joined {
                let (rp, rq) = (find_root(&mut parent, p), find_root(&mut parent, q));
                parent[rp.max(rq)] = rp.min(rq);
            }
        }
    }

    let mut labels: HashMap<usize, usize> = HashMap::new();
    let mut groups: Vec<Vec<usize>> = Vec::new();
    for n in cluster {
        let position = blocks
            .iter()
            .position(|&b| b == external[n].block)
            .unwrap_or_default();
        let root = find_root(&mut parent, position);
        let label = *labels.entry(root).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[label].push(n);
    }
    groups
}

fn find_root(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}
