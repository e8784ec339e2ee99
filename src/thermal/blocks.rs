//! Building blocks of a battery pack: discretized solids and cooling regions.

use crate::geom::area::Area;
use crate::geom::block_geometry::BlockGeometry;
use crate::thermal::cooling::Cooling;
use crate::thermal::element::ThermalElement;
use crate::thermal::structs::{IndexedArea, IndexedValue};
use crate::Result;
use std::sync::Arc;

pub mod cooling_prismatic;
pub mod rectangular;

pub use cooling_prismatic::CoolingPrismatic;
pub use rectangular::RectangularBlock;

/// Discretization of one block. All indices are local to the block.
#[derive(Debug, Clone)]
pub struct BlockData {
    pub elements: Vec<ThermalElement>,
    pub conductivity: Vec<Vec<IndexedValue>>,
    pub surface_areas: Vec<IndexedArea>,
    pub geometry: BlockGeometry,
}

/// Solid that can be split into thermal elements.
pub trait ThermalBlock {
    fn description(&self) -> &str;
    fn element_count(&self) -> usize;
    fn create_data(&self) -> Result<BlockData>;
}

/// Region whose faces cool the blocks they touch.
pub trait CoolingBlock {
    fn description(&self) -> &str;
    fn cooling_areas(&self) -> Result<Vec<Area>>;
    fn block_geometry(&self) -> Result<BlockGeometry>;
    fn cooling(&self) -> &Arc<Cooling>;
}
