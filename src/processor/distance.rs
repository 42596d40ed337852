use std::collections::HashMap;

use glam::DVec2;

use super::keys::{DISTANCE_TO_OCEAN, IS_OCEAN};
use super::{CellMapProcessor, ProcessContext};
use crate::map::{CellId, CornerId};

/// Graph distance of cells and corners to the coastline
///
/// Searches outward along neighbor links, never deeper than the configured
/// maximum. Elements that can't reach the coast within that depth get the
/// maximum (negated at sea). Stored values never exceed the maximum.
pub struct DistanceToOceanProcessor {
    max_cell_distance: i32,
    max_corner_distance: i32,
    area_offset: DVec2,
}

/// State of one pass over the cells of a view
#[derive(Debug, Default)]
struct CellSearch {
    visiting: Vec<CellId>,
    /// Results of searches started from the cell itself
    exact: HashMap<CellId, i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CornerType {
    Land,
    Coast,
    Ocean,
}

impl Default for DistanceToOceanProcessor {
    fn default() -> Self {
        Self::new(5)
    }
}

impl DistanceToOceanProcessor {
    /// Corners search three steps further than cells
    pub fn new(max_cell_distance: i32) -> Self {
        Self {
            max_cell_distance,
            max_corner_distance: max_cell_distance + 3,
            area_offset: DVec2::splat(0.3),
        }
    }

    pub fn with_max_corner_distance(mut self, distance: i32) -> Self {
        self.max_corner_distance = distance;
        self
    }

    pub fn with_area_offset(mut self, offset: DVec2) -> Self {
        self.area_offset = offset;
        self
    }

    fn is_ocean(ctx: &ProcessContext<'_>, id: CellId) -> bool {
        ctx.get(id, &IS_OCEAN).copied().unwrap_or(false)
    }

    fn corner_type(ctx: &ProcessContext<'_>, id: CornerId) -> CornerType {
        let cells = ctx.corner_cells(id);
        let oceans = cells.iter().filter(|&&cell| Self::is_ocean(ctx, cell)).count();
        if oceans == 0 {
            CornerType::Land
        } else if oceans < cells.len() {
            CornerType::Coast
        } else {
            CornerType::Ocean
        }
    }

    fn cell_distance(&self, ctx: &ProcessContext<'_>, id: CellId, search: &mut CellSearch) -> Option<i32> {
        if let Some(&known) = search.exact.get(&id) {
            return Some(known);
        }
        let allowed = self.max_cell_distance;
        if search.visiting.len() as i32 >= allowed {
            return None;
        }

        let neighbors = ctx.cell_neighbors(id);
        let ocean = Self::is_ocean(ctx, id);
        let coastline = neighbors.iter().any(|&n| Self::is_ocean(ctx, n) != ocean);

        let distance = if coastline {
            Some(if ocean { 0 } else { 1 })
        } else {
            search.visiting.push(id);
            let mut closest: Option<i32> = None;
            for neighbor in neighbors {
                if search.visiting.contains(&neighbor) {
                    continue;
                }
                if let Some(d) = self.cell_distance(ctx, neighbor, search) {
                    if closest.map_or(true, |c| d.abs() < c.abs()) {
                        closest = Some(d);
                    }
                }
            }
            search.visiting.pop();
            closest.map(|d| {
                let d = if ocean { d - 1 } else { d + 1 };
                d.clamp(-allowed, allowed)
            })
        };

        // only a search started from this cell saw every path within reach
        if search.visiting.is_empty() {
            if let Some(d) = distance {
                search.exact.insert(id, d);
            }
        }
        distance
    }

    fn corner_distance(&self, ctx: &mut ProcessContext<'_>, id: CornerId, visiting: &mut Vec<CornerId>) -> Option<i32> {
        let allowed = self.max_corner_distance;
        let stored = ctx.get(id, &DISTANCE_TO_OCEAN).copied();
        if matches!(stored, Some(-1..=1)) {
            return stored;
        }
        if visiting.len() as i32 >= allowed {
            return None;
        }

        let kind = Self::corner_type(ctx, id);
        let distance = match kind {
            CornerType::Coast => Some(0),
            CornerType::Land | CornerType::Ocean => {
                visiting.push(id);
                let mut closest: Option<i32> = None;
                for neighbor in ctx.corner_neighbors(id) {
                    if visiting.contains(&neighbor) {
                        continue;
                    }
                    if let Some(d) = self.corner_distance(ctx, neighbor, visiting) {
                        if closest.map_or(true, |c| d.abs() < c.abs()) {
                            closest = Some(d);
                        }
                    }
                }
                visiting.pop();
                closest.map(|d| {
                    let d = if kind == CornerType::Land { d + 1 } else { d - 1 };
                    d.clamp(-allowed, allowed)
                })
            }
        };

        if let Some(stored) = stored {
            if distance.map_or(true, |d| stored.abs() <= d.abs()) {
                return Some(stored);
            }
        }
        match distance {
            Some(d) => ctx.set(id, &DISTANCE_TO_OCEAN, d),
            None => {
                let fallback = if kind == CornerType::Ocean { -allowed } else { allowed };
                ctx.set(id, &DISTANCE_TO_OCEAN, fallback);
            }
        }
        distance
    }
}

impl CellMapProcessor for DistanceToOceanProcessor {
    fn area_offset(&self) -> DVec2 {
        self.area_offset
    }

    fn process(&self, ctx: &mut ProcessContext<'_>) {
        let view = ctx.view();
        let allowed = self.max_cell_distance;
        let mut search = CellSearch::default();
        for id in view.cells() {
            let distance = self
                .cell_distance(ctx, id, &mut search)
                .unwrap_or(if Self::is_ocean(ctx, id) { -allowed } else { allowed });
            ctx.set(id, &DISTANCE_TO_OCEAN, distance);
        }
        let mut visiting = Vec::new();
        for id in view.corners() {
            self.corner_distance(ctx, id, &mut visiting);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::tests::{strip, strip_cell, strip_corner};
    use crate::processor::Scratch;

    fn distances(ocean_cells: usize, count: usize, processor: &DistanceToOceanProcessor) -> (Vec<i32>, Vec<i32>) {
        let (mut arena, view) = strip(count);
        for i in 0..ocean_cells {
            arena.cell_mut(strip_cell(i)).unwrap().set(&IS_OCEAN, true);
        }
        for i in ocean_cells..count {
            arena.cell_mut(strip_cell(i)).unwrap().set(&IS_OCEAN, false);
        }

        let mut scratch = Scratch::new();
        let mut ctx = ProcessContext::new(&mut arena, &view, view.rectangle(), 0, &mut scratch);
        processor.process(&mut ctx);

        let cells = (0..count).map(|i| *ctx.require(strip_cell(i), &DISTANCE_TO_OCEAN)).collect();
        let corners = (0..=count as i32)
            .map(|i| *ctx.require(strip_corner(i * 10, 0), &DISTANCE_TO_OCEAN))
            .collect();
        (cells, corners)
    }

    #[test]
    fn test_cell_distance_along_strip() {
        let (cells, _) = distances(2, 10, &DistanceToOceanProcessor::new(5));
        assert_eq!(cells, vec![-1, 0, 1, 2, 3, 4, 5, 5, 5, 5]);
    }

    #[test]
    fn test_alternating_strip_is_all_coastline() {
        let (mut arena, view) = strip(10);
        for i in 0..10 {
            arena.cell_mut(strip_cell(i)).unwrap().set(&IS_OCEAN, i % 2 == 0);
        }
        let mut scratch = Scratch::new();
        let mut ctx = ProcessContext::new(&mut arena, &view, view.rectangle(), 0, &mut scratch);
        DistanceToOceanProcessor::new(5).process(&mut ctx);

        let cells: Vec<i32> = (0..10).map(|i| *ctx.require(strip_cell(i), &DISTANCE_TO_OCEAN)).collect();
        assert_eq!(cells, vec![0, 1, 0, 1, 0, 1, 0, 1, 0, 1]);
        let corners: Vec<i32> = (0..=10)
            .map(|i| *ctx.require(strip_corner(i * 10, 0), &DISTANCE_TO_OCEAN))
            .collect();
        // every inner corner touches both kinds of cell
        assert!(corners[1..10].iter().all(|&d| d == 0));
    }

    #[test]
    fn test_long_strip_matches_breadth_first_distances() {
        let (cells, _) = distances(1, 30, &DistanceToOceanProcessor::new(12));
        let expected: Vec<i32> = (0..30).map(|i: i32| i.min(12)).collect();
        assert_eq!(cells, expected);
    }

    #[test]
    fn test_cell_distance_is_monotonic_and_clamped() {
        let (cells, _) = distances(1, 10, &DistanceToOceanProcessor::new(3));
        assert!(cells.windows(2).all(|w| w[0].abs() <= w[1].abs() || w[1] == 3));
        assert!(cells.iter().all(|d| d.abs() <= 3));
        assert_eq!(cells[0], 0);
        assert_eq!(cells[1], 1);
    }

    #[test]
    fn test_corner_distance_around_coast() {
        let (_, corners) = distances(2, 6, &DistanceToOceanProcessor::new(5));
        // x = 0, 10 at sea, 20 on the coast, then inland
        assert_eq!(&corners[..5], &[-2, -1, 0, 1, 2]);
        assert!(corners.iter().all(|d| d.abs() <= 8));
    }

    #[test]
    fn test_all_land_falls_back_to_maximum() {
        let (cells, corners) = distances(0, 4, &DistanceToOceanProcessor::new(2));
        assert!(cells.iter().all(|&d| d == 2));
        assert!(corners.iter().all(|&d| d == 5));
    }
}
