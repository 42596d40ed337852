//! Turns generated polygons into the shared cell/corner/edge graph

use std::collections::BTreeSet;

use glam::IVec2;
use slog::{trace, Logger};

use super::element::{Cell, CellId, Corner, CornerId, Edge, EdgeId, MeshArena};
use crate::generation::CellPolygon;
use crate::geom::{floor_point, Line2i};

/// Ids of every element one section's polygons produced
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct AnchoredElements {
    pub cells: BTreeSet<CellId>,
    pub corners: BTreeSet<CornerId>,
    pub edges: BTreeSet<EdgeId>,
}

/// Link one section's polygons into the arena
///
/// Elements already present (built by a neighboring section) are reused, so
/// each id maps to exactly one record no matter how many sections reach it.
/// Cell neighbors are derived from shared corners once every polygon is
/// linked.
pub(crate) fn build_elements(
    arena: &mut MeshArena,
    polygons: &[CellPolygon],
    log: &Logger,
) -> AnchoredElements {
    let mut anchored = AnchoredElements::default();

    for cell_polygon in polygons {
        let cell_id = CellId::from_point(floor_point(cell_polygon.center));
        arena
            .cells
            .entry(cell_id)
            .or_insert_with(|| Cell::new(cell_id, cell_polygon.center, cell_polygon.polygon.clone()));
        anchored.cells.insert(cell_id);

        let ring = floored_ring(cell_polygon);
        let count = ring.len();
        for i in 0..count {
            let current = ring[i];
            let previous = ring[(i + count - 1) % count];
            if current == previous {
                continue;
            }
            link_segment(arena, &mut anchored, cell_id, current, previous, log);
        }
    }

    for corner_id in &anchored.corners {
        let cells: Vec<CellId> = match arena.corners.get(corner_id) {
            Some(corner) => corner.cells.iter().copied().collect(),
            None => continue,
        };
        for &cell_id in &cells {
            if let Some(cell) = arena.cells.get_mut(&cell_id) {
                cell.neighbors
                    .extend(cells.iter().copied().filter(|&other| other != cell_id));
            }
        }
    }

    anchored
}

/// Floored polygon ring without consecutive repeats
fn floored_ring(cell_polygon: &CellPolygon) -> Vec<IVec2> {
    let mut ring: Vec<IVec2> = cell_polygon
        .polygon
        .vertices()
        .iter()
        .map(|&v| floor_point(v))
        .collect();
    ring.dedup();
    while ring.len() > 1 && ring.first() == ring.last() {
        ring.pop();
    }
    ring
}

fn link_segment(
    arena: &mut MeshArena,
    anchored: &mut AnchoredElements,
    cell_id: CellId,
    a: IVec2,
    b: IVec2,
    log: &Logger,
) {
    let corner_a = CornerId::from_point(a);
    let corner_b = CornerId::from_point(b);
    let line = Line2i::new(a, b);
    let edge_id = EdgeId::from_point(line.center());

    // a segment whose id is taken by a different line links nothing at all
    if let Some(existing) = arena.edges.get(&edge_id) {
        if existing.line() != line {
            trace!(log, "edge id collision, segment left unlinked";
                "edge" => edge_id.0, "x" => a.x, "y" => a.y);
            return;
        }
    }

    for corner_id in [corner_a, corner_b] {
        let corner = arena
            .corners
            .entry(corner_id)
            .or_insert_with(|| Corner::new(corner_id));
        corner.cells.insert(cell_id);
        anchored.corners.insert(corner_id);
    }
    if let Some(corner) = arena.corners.get_mut(&corner_a) {
        corner.neighbors.insert(corner_b);
    }
    if let Some(corner) = arena.corners.get_mut(&corner_b) {
        corner.neighbors.insert(corner_a);
    }
    if let Some(cell) = arena.cells.get_mut(&cell_id) {
        cell.corners.insert(corner_a);
        cell.corners.insert(corner_b);
    }

    let edge = arena
        .edges
        .entry(edge_id)
        .or_insert_with(|| Edge::new(edge_id, line));
    edge.cells.insert(cell_id);
    edge.corners.insert(corner_a);
    edge.corners.insert(corner_b);
    anchored.edges.insert(edge_id);

    if let Some(cell) = arena.cells.get_mut(&cell_id) {
        cell.edges.insert(edge_id);
    }
    for corner_id in [corner_a, corner_b] {
        if let Some(corner) = arena.corners.get_mut(&corner_id) {
            corner.edges.insert(edge_id);
        }
    }
}
