//! Attribute processors run over each section after it is built
//!
//! A processor sees the section padded by its [`area_offset`] and may read
//! attributes of anything in that padded view. Only writes to elements owned
//! by the section being processed are kept; everything else lands in a
//! scratch overlay that later stages of the same run can read, and that is
//! thrown away once the pipeline is done.
//!
//! [`area_offset`]: CellMapProcessor::area_offset

mod distance;
mod edge_distance;
mod moisture;
mod ocean_land;
mod river;

pub use distance::DistanceToOceanProcessor;
pub use edge_distance::{EdgeDistanceData, EdgeDistanceProcessor};
pub use moisture::MoistureProcessor;
pub use ocean_land::OceanLandProcessor;
pub use river::RiverProcessor;

use std::any::Any;
use std::collections::HashMap;

use glam::DVec2;

use crate::geom::Rectanglei;
use crate::map::data::{DataKey, DataValue};
use crate::map::{Cell, CellId, Chunk, Corner, CornerId, Edge, EdgeId, ElementId, MapView, MeshArena};

/// Attribute keys written by the built-in processors
pub mod keys {
    use crate::map::data::DataKey;

    /// Set on cells; `true` below sea level
    pub const IS_OCEAN: DataKey<bool> = DataKey::new("is_ocean");

    /// Set on corners and edges a river runs along
    pub const IS_RIVER: DataKey<bool> = DataKey::new("is_river");

    /// Steps to the coastline.
    ///
    /// Coastline corners are 0, corners inland count up from 1 and corners
    /// out at sea count down from -1. Coastline land cells are 1 and
    /// coastline ocean cells are 0; cells further out count on from there.
    pub const DISTANCE_TO_OCEAN: DataKey<i32> = DataKey::new("distance_to_ocean");

    /// Steps from the mouth of the river
    pub const DISTANCE_TO_RIVER_START: DataKey<i32> = DataKey::new("distance_to_river_start");

    /// Normalized to `[0, 1]`
    pub const MOISTURE: DataKey<f64> = DataKey::new("moisture");

    /// Set on chunks; per-block distance to the closest cell border
    pub const EDGE_DISTANCE: DataKey<super::EdgeDistanceData> = DataKey::new("edge_distance");
}

/// One stage of attribute generation
pub trait CellMapProcessor: Send + Sync {
    /// Extra context needed around the processed section, in section units
    fn area_offset(&self) -> DVec2 {
        DVec2::ZERO
    }

    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    fn process(&self, ctx: &mut ProcessContext<'_>);
}

/// A stage run on each chunk right after it is rasterized
///
/// The sections under the chunk are already processed, so cell, corner and
/// edge attributes can be read from `arena`. Results go on the chunk.
pub trait ChunkProcessor: Send + Sync {
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    fn process(&self, chunk: &mut Chunk, arena: &MeshArena);
}

pub(crate) type Scratch = HashMap<(ElementId, &'static str), Option<DataValue>>;

/// What a processor sees of the map while processing one section
pub struct ProcessContext<'a> {
    arena: &'a mut MeshArena,
    view: &'a MapView,
    target: Rectanglei,
    seed: u64,
    scratch: &'a mut Scratch,
}

impl<'a> ProcessContext<'a> {
    pub(crate) fn new(
        arena: &'a mut MeshArena,
        view: &'a MapView,
        target: Rectanglei,
        seed: u64,
        scratch: &'a mut Scratch,
    ) -> Self {
        Self {
            arena,
            view,
            target,
            seed,
            scratch,
        }
    }

    /// The padded view
    pub fn view(&self) -> &'a MapView {
        self.view
    }

    /// World seed of the map
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Block rectangle of the section being processed
    pub fn target(&self) -> Rectanglei {
        self.target
    }

    pub fn cell(&self, id: CellId) -> Option<&Cell> {
        self.arena.cell(id)
    }

    pub fn corner(&self, id: CornerId) -> Option<&Corner> {
        self.arena.corner(id)
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.arena.edge(id)
    }

    /// Whether writes to `element` outlive this run
    pub fn is_writable(&self, element: impl Into<ElementId>) -> bool {
        self.target.contains_half_open(element.into().point())
    }

    pub fn get<T: Any>(&self, element: impl Into<ElementId>, key: &DataKey<T>) -> Option<&T> {
        let element = element.into();
        match self.scratch.get(&(element, key.name())) {
            Some(value) => value.as_ref().and_then(|value| value.downcast_ref::<T>()),
            None => self.arena.data(element)?.get(key),
        }
    }

    /// # Panics
    ///
    /// Panics if the attribute is missing.
    pub fn require<T: Any>(&self, element: impl Into<ElementId>, key: &DataKey<T>) -> &T {
        let element = element.into();
        match self.get(element, key) {
            Some(value) => value,
            None => panic!("required attribute `{}` is missing on {:?}", key.name(), element),
        }
    }

    pub fn set<T: Any + Send + Sync>(&mut self, element: impl Into<ElementId>, key: &DataKey<T>, value: T) {
        let element = element.into();
        if self.is_writable(element) {
            if let Some(data) = self.arena.data_mut(element) {
                data.set(key, value);
            }
        } else {
            self.scratch
                .insert((element, key.name()), Some(Box::new(value)));
        }
    }

    pub fn remove<T: Any>(&mut self, element: impl Into<ElementId>, key: &DataKey<T>) {
        let element = element.into();
        if self.is_writable(element) {
            if let Some(data) = self.arena.data_mut(element) {
                data.remove(key);
            }
        } else {
            self.scratch.insert((element, key.name()), None);
        }
    }

    pub fn cell_neighbors(&self, id: CellId) -> Vec<CellId> {
        self.cell(id)
            .map(|cell| self.view.cell_neighbors(cell))
            .unwrap_or_default()
    }

    pub fn cell_edges(&self, id: CellId) -> Vec<EdgeId> {
        self.cell(id)
            .map(|cell| self.view.cell_edges(cell))
            .unwrap_or_default()
    }

    pub fn corner_neighbors(&self, id: CornerId) -> Vec<CornerId> {
        self.corner(id)
            .map(|corner| self.view.corner_neighbors(corner))
            .unwrap_or_default()
    }

    pub fn corner_cells(&self, id: CornerId) -> Vec<CellId> {
        self.corner(id)
            .map(|corner| self.view.corner_cells(corner))
            .unwrap_or_default()
    }

    pub fn corner_edges(&self, id: CornerId) -> Vec<EdgeId> {
        self.corner(id)
            .map(|corner| self.view.corner_edges(corner))
            .unwrap_or_default()
    }
}
