use std::collections::HashMap;

use glam::{DVec2, IVec2};

use super::keys::EDGE_DISTANCE;
use super::ChunkProcessor;
use crate::geom::Line2d;
use crate::map::{CellId, Chunk, EdgeId, MeshArena};

/// Per-block distance to the closest cell edge of one chunk
///
/// Only blocks within the configured distance of an edge get an entry, so
/// the band along the cell borders can be told apart from cell interiors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeDistanceData {
    size_y: i32,
    blocks: Vec<Option<(EdgeId, u8)>>,
}

impl EdgeDistanceData {
    fn new(size: IVec2) -> Self {
        Self {
            size_y: size.y,
            blocks: vec![None; (size.x * size.y) as usize],
        }
    }

    fn index(&self, local_x: i32, local_y: i32) -> usize {
        (local_x * self.size_y + local_y) as usize
    }

    /// Closest edge and its distance in whole blocks, if within range
    pub fn get(&self, local_x: i32, local_y: i32) -> Option<(EdgeId, u8)> {
        self.blocks[self.index(local_x, local_y)]
    }

    pub fn distance(&self, local_x: i32, local_y: i32) -> Option<u8> {
        self.get(local_x, local_y).map(|(_, distance)| distance)
    }

    /// Distance to `edge`, if it is the closest edge of the block and in range
    pub fn distance_to_edge(&self, edge: EdgeId, local_x: i32, local_y: i32) -> Option<u8> {
        self.get(local_x, local_y)
            .filter(|&(closest, _)| closest == edge)
            .map(|(_, distance)| distance)
    }

    /// Number of blocks within range of an edge
    pub fn covered(&self) -> usize {
        self.blocks.iter().filter(|block| block.is_some()).count()
    }
}

/// Marks the blocks of each chunk that lie close to a cell border
///
/// Cells are convex, so the closest border of a block is always one of the
/// edges of the cell it lies in.
pub struct EdgeDistanceProcessor {
    max_distance: u8,
}

impl Default for EdgeDistanceProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl EdgeDistanceProcessor {
    pub fn new() -> Self {
        Self { max_distance: 10 }
    }

    /// Blocks further than this from every edge get no entry
    pub fn with_max_distance(mut self, max_distance: u8) -> Self {
        self.max_distance = max_distance;
        self
    }

    fn cell_lines(arena: &MeshArena, cell: CellId) -> Vec<(EdgeId, Line2d)> {
        arena.cell(cell).map_or_else(Vec::new, |cell| {
            cell.edges()
                .filter_map(|id| arena.edge(id).map(|edge| (id, edge.line().to_double())))
                .collect()
        })
    }
}

impl ChunkProcessor for EdgeDistanceProcessor {
    fn process(&self, chunk: &mut Chunk, arena: &MeshArena) {
        let size = chunk.size();
        let origin = chunk.rectangle().min();
        let mut data = EdgeDistanceData::new(size);
        let mut lines: HashMap<CellId, Vec<(EdgeId, Line2d)>> = HashMap::new();

        for local_x in 0..size.x {
            for local_y in 0..size.y {
                let cell = chunk.cell(local_x, local_y);
                let cell_lines = lines.entry(cell).or_insert_with(|| Self::cell_lines(arena, cell));
                let center = (origin + IVec2::new(local_x, local_y)).as_dvec2() + DVec2::splat(0.5);

                let closest = cell_lines
                    .iter()
                    .map(|(id, line)| (*id, line.distance_to_point(center)))
                    .min_by(|a, b| a.1.total_cmp(&b.1));
                if let Some((edge, distance)) = closest {
                    if distance <= f64::from(self.max_distance) {
                        let index = data.index(local_x, local_y);
                        data.blocks[index] = Some((edge, distance.floor() as u8));
                    }
                }
            }
        }

        chunk.set(&EDGE_DISTANCE, data);
    }
}
