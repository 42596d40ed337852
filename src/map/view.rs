//! Read-only windows over one or more sections

use std::collections::BTreeSet;
use std::sync::OnceLock;

use glam::DVec2;

use super::element::{Cell, CellId, Corner, CornerId, Edge, EdgeId, ElementId, MeshArena};
use super::section::{Section, SectionPosition, SectionReference};
use crate::geom::Rectanglei;
use crate::spatial::SpatialIndex;

/// Element ids visible through a rectangle of blocks
///
/// A view holds one [`SectionReference`] per section it was built from and
/// keeps those sections cached until it is released or dropped. Elements are
/// resolved through the map; the view only decides which ids are visible,
/// and filters adjacency lists down to them.
///
/// # Example
///
/// ```
/// use rust_voronoi_map::*;
///
/// let config = MapConfigBuilder::new()
///     .seed(11)
///     .section_size(128, 128).unwrap()
///     .build().unwrap();
/// let mut map = CellMap::builder(config)
///     .points_generator(WhiteNoisePointsGenerator::new(10..=20))
///     .polygon_generator(VoronoiPolygonGenerator::new())
///     .build()
///     .unwrap();
///
/// let view = map.get_sub_view(Rectanglei::new(IVec2::ZERO, IVec2::new(64, 64)));
/// for id in view.cells() {
///     let cell = map.cell(id).unwrap();
///     // neighbors outside the view are left out
///     for neighbor in view.cell_neighbors(cell) {
///         assert!(view.contains(neighbor));
///     }
/// }
/// drop(view);
/// ```
#[derive(Debug)]
pub struct MapView {
    rectangle: Rectanglei,
    references: Vec<SectionReference>,
    cells: BTreeSet<CellId>,
    corners: BTreeSet<CornerId>,
    edges: BTreeSet<EdgeId>,
    index: OnceLock<Option<NearestCells>>,
}

struct NearestCells {
    index: SpatialIndex,
    ids: Vec<CellId>,
}

impl std::fmt::Debug for NearestCells {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NearestCells").field("len", &self.ids.len()).finish()
    }
}

impl MapView {
    /// Collect the elements of `sections` visible in `rectangle`
    ///
    /// Sections flagged as boundary sections are filtered geometrically;
    /// interior sections contribute all of their elements.
    pub(crate) fn build<'a>(
        rectangle: Rectanglei,
        arena: &MeshArena,
        sections: impl IntoIterator<Item = (&'a Section, bool)>,
        references: Vec<SectionReference>,
    ) -> Self {
        let bounds = rectangle.to_double();
        let mut cells = BTreeSet::new();
        let mut corners = BTreeSet::new();
        let mut edges = BTreeSet::new();

        for (section, boundary) in sections {
            if !boundary {
                cells.extend(section.cells().iter().copied());
                corners.extend(section.corners().iter().copied());
                edges.extend(section.edges().iter().copied());
                continue;
            }

            cells.extend(section.cells().iter().copied().filter(|&id| {
                arena
                    .cell(id)
                    .map_or(false, |cell| cell.polygon().overlaps_rect(&bounds))
            }));
            corners.extend(
                section
                    .corners()
                    .iter()
                    .copied()
                    .filter(|id| rectangle.contains(id.point())),
            );
            edges.extend(section.edges().iter().copied().filter(|&id| {
                arena.edge(id).map_or(false, |edge| {
                    let line = edge.line();
                    rectangle.contains(line.start())
                        || rectangle.contains(line.end())
                        || bounds.intersects_segment(line.start().as_dvec2(), line.end().as_dvec2())
                })
            }));
        }

        Self {
            rectangle,
            references,
            cells,
            corners,
            edges,
            index: OnceLock::new(),
        }
    }

    /// Requested rectangle of blocks, `max` exclusive
    #[inline]
    pub fn rectangle(&self) -> Rectanglei {
        self.rectangle
    }

    /// Visible cells, by ascending id
    pub fn cells(&self) -> impl Iterator<Item = CellId> + '_ {
        self.cells.iter().copied()
    }

    /// Corners inside the rectangle (inclusive), by ascending id
    pub fn corners(&self) -> impl Iterator<Item = CornerId> + '_ {
        self.corners.iter().copied()
    }

    /// Edges with an endpoint inside the rectangle or crossing it
    pub fn edges(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.edges.iter().copied()
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

    /// Whether an element is visible through this view
    pub fn contains(&self, element: impl Into<ElementId>) -> bool {
        match element.into() {
            ElementId::Cell(id) => self.cells.contains(&id),
            ElementId::Corner(id) => self.corners.contains(&id),
            ElementId::Edge(id) => self.edges.contains(&id),
        }
    }

    /// Sections this view keeps referenced
    pub fn sections(&self) -> impl Iterator<Item = SectionPosition> + '_ {
        self.references.iter().map(SectionReference::position)
    }

    /// Release every section reference; later calls do nothing
    pub fn release(&mut self) {
        for reference in &mut self.references {
            reference.release();
        }
    }

    /// `true` once every reference was released; also for views that never held any
    pub fn is_released(&self) -> bool {
        self.references.iter().all(SectionReference::is_released)
    }

    pub(crate) fn push_reference(&mut self, reference: SectionReference) {
        self.references.push(reference);
    }

    /// Neighbors of `cell` that are visible through this view
    ///
    /// # Arguments
    ///
    /// * `cell` - Any cell record, visible or not
    ///
    /// # Returns
    ///
    /// Visible neighbor ids, by ascending id
    pub fn cell_neighbors(&self, cell: &Cell) -> Vec<CellId> {
        cell.neighbors().filter(|id| self.cells.contains(id)).collect()
    }

    /// Visible edges of `cell`
    pub fn cell_edges(&self, cell: &Cell) -> Vec<EdgeId> {
        cell.edges().filter(|id| self.edges.contains(id)).collect()
    }

    pub fn cell_corners(&self, cell: &Cell) -> Vec<CornerId> {
        cell.corners().filter(|id| self.corners.contains(id)).collect()
    }

    /// Visible corners one edge away from `corner`
    pub fn corner_neighbors(&self, corner: &Corner) -> Vec<CornerId> {
        corner.neighbors().filter(|id| self.corners.contains(id)).collect()
    }

    pub fn corner_cells(&self, corner: &Corner) -> Vec<CellId> {
        corner.cells().filter(|id| self.cells.contains(id)).collect()
    }

    pub fn corner_edges(&self, corner: &Corner) -> Vec<EdgeId> {
        corner.edges().filter(|id| self.edges.contains(id)).collect()
    }

    pub fn edge_cells(&self, edge: &Edge) -> Vec<CellId> {
        edge.cells().filter(|id| self.cells.contains(id)).collect()
    }

    pub fn edge_corners(&self, edge: &Edge) -> Vec<CornerId> {
        edge.corners().filter(|id| self.corners.contains(id)).collect()
    }

    /// Visible cell whose floored center is closest to `point`
    ///
    /// The KD-tree is built on the first call.
    ///
    /// # Returns
    ///
    /// `None` only when the view has no cells. The nearest center is not
    /// always the cell containing `point`; use [`Cell::contains_block`] to
    /// check.
    pub fn nearest_cell(&self, point: DVec2) -> Option<CellId> {
        let nearest = self.index.get_or_init(|| {
            let ids: Vec<CellId> = self.cells.iter().copied().collect();
            let centers: Vec<DVec2> = ids.iter().map(|id| id.point().as_dvec2()).collect();
            SpatialIndex::new(&centers).map(|index| NearestCells { index, ids })
        });
        nearest
            .as_ref()
            .map(|nearest| nearest.ids[nearest.index.find_nearest(point)])
    }
}
