//! Cells, corners and edges of the mesh, and the arena that owns them
//!
//! Elements never point at each other directly. Every adjacency is a sorted
//! set of ids resolved through the owning [`MeshArena`], which keeps the
//! cyclic cell/corner/edge graph free of shared ownership.

use std::collections::{BTreeSet, HashMap};

use glam::{DVec2, IVec2};

use super::data::{DataKey, DataStore};
use crate::geom::{pack_point, unpack_point, Line2i, Polygon};

macro_rules! element_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub i64);

        impl $name {
            /// Id of the element anchored at an integer point
            #[inline]
            pub fn from_point(point: IVec2) -> Self {
                Self(pack_point(point))
            }

            /// The integer point this id was packed from
            #[inline]
            pub fn point(self) -> IVec2 {
                unpack_point(self.0)
            }
        }
    };
}

element_id!(
    /// Packed floored center of a cell
    CellId
);
element_id!(
    /// Packed integer position of a corner
    CornerId
);
element_id!(
    /// Packed integer midpoint of an edge
    EdgeId
);

/// Id of any kind of element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElementId {
    Cell(CellId),
    Corner(CornerId),
    Edge(EdgeId),
}

impl ElementId {
    /// The integer point the element's id was packed from
    pub fn point(self) -> IVec2 {
        match self {
            ElementId::Cell(id) => id.point(),
            ElementId::Corner(id) => id.point(),
            ElementId::Edge(id) => id.point(),
        }
    }
}

impl From<CellId> for ElementId {
    fn from(id: CellId) -> Self {
        ElementId::Cell(id)
    }
}

impl From<CornerId> for ElementId {
    fn from(id: CornerId) -> Self {
        ElementId::Corner(id)
    }
}

impl From<EdgeId> for ElementId {
    fn from(id: EdgeId) -> Self {
        ElementId::Edge(id)
    }
}

/// A polygonal region of the map
///
/// Cells are keyed by their floored center. Adjacency is stored as id sets:
/// `neighbors` are cells sharing a corner, `edges` and `corners` are the
/// elements of the cell's own ring. All three sets are symmetric with the
/// matching sets on the other records.
#[derive(Debug)]
pub struct Cell {
    id: CellId,
    center: DVec2,
    polygon: Polygon,
    pub(crate) neighbors: BTreeSet<CellId>,
    pub(crate) edges: BTreeSet<EdgeId>,
    pub(crate) corners: BTreeSet<CornerId>,
    data: DataStore,
}

impl Cell {
    pub(crate) fn new(id: CellId, center: DVec2, polygon: Polygon) -> Self {
        Self {
            id,
            center,
            polygon,
            neighbors: BTreeSet::new(),
            edges: BTreeSet::new(),
            corners: BTreeSet::new(),
            data: DataStore::new(),
        }
    }

    /// Packed floored center
    #[inline]
    pub fn id(&self) -> CellId {
        self.id
    }

    /// Exact center produced by the polygon generator
    #[inline]
    pub fn center(&self) -> DVec2 {
        self.center
    }

    /// Cell outline in world coordinates, vertices floored
    #[inline]
    pub fn polygon(&self) -> &Polygon {
        &self.polygon
    }

    /// Cells sharing at least one corner with this one, by ascending id
    pub fn neighbors(&self) -> impl Iterator<Item = CellId> + '_ {
        self.neighbors.iter().copied()
    }

    pub fn is_neighbor(&self, other: CellId) -> bool {
        self.neighbors.contains(&other)
    }

    /// Edges of the cell's ring, by ascending id
    ///
    /// Unfiltered: an edge whose record was evicted may still be listed.
    /// [`MapView::cell_edges`](super::MapView::cell_edges) filters to a view.
    pub fn edges(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.edges.iter().copied()
    }

    pub fn corners(&self) -> impl Iterator<Item = CornerId> + '_ {
        self.corners.iter().copied()
    }

    /// Whether the center of block `(x, y)` lies inside the cell
    ///
    /// # Arguments
    ///
    /// * `x`, `y` - World block coordinate
    ///
    /// # Returns
    ///
    /// `true` if `(x + 0.5, y + 0.5)` is inside the polygon
    pub fn contains_block(&self, x: i32, y: i32) -> bool {
        self.polygon
            .contains_point(DVec2::new(x as f64 + 0.5, y as f64 + 0.5))
    }

    pub fn data(&self) -> &DataStore {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut DataStore {
        &mut self.data
    }

    /// Read an attribute written by a processor
    ///
    /// # Example
    ///
    /// ```
    /// # use rust_voronoi_map::*;
    /// # let config = MapConfigBuilder::new().seed(3).section_size(256, 256).unwrap().build().unwrap();
    /// # let mut map = CellMap::builder(config)
    /// #     .points_generator(WhiteNoisePointsGenerator::new(20..=30))
    /// #     .polygon_generator(VoronoiPolygonGenerator::new())
    /// #     .add_processor(OceanLandProcessor::new(PerlinHeightSampler::new(3)))
    /// #     .build()
    /// #     .unwrap();
    /// let cell = map.cell_at(10, 10).unwrap();
    /// if cell.get(&keys::IS_OCEAN) == Some(&true) {
    ///     println!("block (10, 10) is under water");
    /// }
    /// ```
    pub fn get<T: 'static>(&self, key: &DataKey<T>) -> Option<&T> {
        self.data.get(key)
    }

    /// Store an attribute, returning the previous value
    pub fn set<T: Send + Sync + 'static>(&mut self, key: &DataKey<T>, value: T) -> Option<T> {
        self.data.set(key, value)
    }

    pub fn remove<T: 'static>(&mut self, key: &DataKey<T>) -> Option<T> {
        self.data.remove(key)
    }
}

/// A point shared by cells and edges
///
/// Corners sit on integer points; the id is the packed point itself.
#[derive(Debug)]
pub struct Corner {
    id: CornerId,
    pub(crate) cells: BTreeSet<CellId>,
    pub(crate) edges: BTreeSet<EdgeId>,
    pub(crate) neighbors: BTreeSet<CornerId>,
    data: DataStore,
}

impl Corner {
    pub(crate) fn new(id: CornerId) -> Self {
        Self {
            id,
            cells: BTreeSet::new(),
            edges: BTreeSet::new(),
            neighbors: BTreeSet::new(),
            data: DataStore::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> CornerId {
        self.id
    }

    #[inline]
    pub fn point(&self) -> IVec2 {
        self.id.point()
    }

    /// Cells whose ring passes through this corner
    pub fn cells(&self) -> impl Iterator<Item = CellId> + '_ {
        self.cells.iter().copied()
    }

    pub fn edges(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.edges.iter().copied()
    }

    /// Corners connected to this one by an edge
    pub fn neighbors(&self) -> impl Iterator<Item = CornerId> + '_ {
        self.neighbors.iter().copied()
    }

    pub fn data(&self) -> &DataStore {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut DataStore {
        &mut self.data
    }

    pub fn get<T: 'static>(&self, key: &DataKey<T>) -> Option<&T> {
        self.data.get(key)
    }

    pub fn set<T: Send + Sync + 'static>(&mut self, key: &DataKey<T>, value: T) -> Option<T> {
        self.data.set(key, value)
    }

    pub fn remove<T: 'static>(&mut self, key: &DataKey<T>) -> Option<T> {
        self.data.remove(key)
    }
}

/// A boundary segment between two corners, shared by one or two cells
#[derive(Debug)]
pub struct Edge {
    id: EdgeId,
    line: Line2i,
    pub(crate) cells: BTreeSet<CellId>,
    pub(crate) corners: BTreeSet<CornerId>,
    data: DataStore,
}

impl Edge {
    pub(crate) fn new(id: EdgeId, line: Line2i) -> Self {
        Self {
            id,
            line,
            cells: BTreeSet::new(),
            corners: BTreeSet::new(),
            data: DataStore::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> EdgeId {
        self.id
    }

    /// Segment between the two corners, endpoints in lexicographic order
    #[inline]
    pub fn line(&self) -> Line2i {
        self.line
    }

    pub fn cells(&self) -> impl Iterator<Item = CellId> + '_ {
        self.cells.iter().copied()
    }

    pub fn corners(&self) -> impl Iterator<Item = CornerId> + '_ {
        self.corners.iter().copied()
    }

    /// The cell on the other side of this edge, if any
    pub fn other_cell(&self, cell: CellId) -> Option<CellId> {
        self.cells.iter().copied().find(|&other| other != cell)
    }

    pub fn data(&self) -> &DataStore {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut DataStore {
        &mut self.data
    }

    pub fn get<T: 'static>(&self, key: &DataKey<T>) -> Option<&T> {
        self.data.get(key)
    }

    pub fn set<T: Send + Sync + 'static>(&mut self, key: &DataKey<T>, value: T) -> Option<T> {
        self.data.set(key, value)
    }

    pub fn remove<T: 'static>(&mut self, key: &DataKey<T>) -> Option<T> {
        self.data.remove(key)
    }
}

/// Map-global element tables, one record per id
///
/// Records are shared between the sections whose polygons produced them, so
/// a cell on a section border exists exactly once. The arena is owned by
/// [`CellMap`](super::CellMap), which hands it out read-only; processors
/// write through a [`ProcessContext`](crate::processor::ProcessContext).
#[derive(Debug, Default)]
pub struct MeshArena {
    pub(crate) cells: HashMap<CellId, Cell>,
    pub(crate) corners: HashMap<CornerId, Corner>,
    pub(crate) edges: HashMap<EdgeId, Edge>,
}

impl MeshArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a cell record
    ///
    /// # Arguments
    ///
    /// * `id` - Packed floored center of the cell
    ///
    /// # Returns
    ///
    /// `None` if the id never belonged to a generated cell or its sections
    /// were evicted.
    ///
    /// # Example
    ///
    /// ```
    /// # use rust_voronoi_map::*;
    /// # let config = MapConfigBuilder::new().seed(5).section_size(128, 128).unwrap().build().unwrap();
    /// # let mut map = CellMap::builder(config)
    /// #     .points_generator(WhiteNoisePointsGenerator::new(10..=20))
    /// #     .polygon_generator(VoronoiPolygonGenerator::new())
    /// #     .build()
    /// #     .unwrap();
    /// let view = map.get_sub_view(Rectanglei::new(IVec2::ZERO, IVec2::new(100, 100)));
    /// for id in view.cells() {
    ///     let cell = map.arena().cell(id).unwrap();
    ///     assert_eq!(cell.id(), id);
    /// }
    /// ```
    pub fn cell(&self, id: CellId) -> Option<&Cell> {
        self.cells.get(&id)
    }

    pub fn cell_mut(&mut self, id: CellId) -> Option<&mut Cell> {
        self.cells.get_mut(&id)
    }

    /// Look up a corner record; `None` if absent or evicted
    pub fn corner(&self, id: CornerId) -> Option<&Corner> {
        self.corners.get(&id)
    }

    pub fn corner_mut(&mut self, id: CornerId) -> Option<&mut Corner> {
        self.corners.get_mut(&id)
    }

    /// Look up an edge record by its packed midpoint
    ///
    /// # Arguments
    ///
    /// * `id` - Packed [`Line2i::center`] of the edge
    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(&id)
    }

    pub fn edge_mut(&mut self, id: EdgeId) -> Option<&mut Edge> {
        self.edges.get_mut(&id)
    }

    /// Whether a record exists for `element`
    pub fn contains(&self, element: ElementId) -> bool {
        match element {
            ElementId::Cell(id) => self.cells.contains_key(&id),
            ElementId::Corner(id) => self.corners.contains_key(&id),
            ElementId::Edge(id) => self.edges.contains_key(&id),
        }
    }

    /// Attribute store of any element
    pub fn data(&self, element: ElementId) -> Option<&DataStore> {
        match element {
            ElementId::Cell(id) => self.cells.get(&id).map(Cell::data),
            ElementId::Corner(id) => self.corners.get(&id).map(Corner::data),
            ElementId::Edge(id) => self.edges.get(&id).map(Edge::data),
        }
    }

    /// Mutable attribute store of any element
    pub fn data_mut(&mut self, element: ElementId) -> Option<&mut DataStore> {
        match element {
            ElementId::Cell(id) => self.cells.get_mut(&id).map(Cell::data_mut),
            ElementId::Corner(id) => self.corners.get_mut(&id).map(Corner::data_mut),
            ElementId::Edge(id) => self.edges.get_mut(&id).map(Edge::data_mut),
        }
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn corner_count(&self) -> usize {
        self.corners.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Drop every record whose id is not in the given sets
    pub(crate) fn retain(
        &mut self,
        cells: &BTreeSet<CellId>,
        corners: &BTreeSet<CornerId>,
        edges: &BTreeSet<EdgeId>,
    ) {
        self.cells.retain(|id, _| cells.contains(id));
        self.corners.retain(|id, _| corners.contains(id));
        self.edges.retain(|id, _| edges.contains(id));
    }
}
