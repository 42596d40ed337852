use std::ops::RangeInclusive;

use glam::DVec2;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::keys::{DISTANCE_TO_OCEAN, DISTANCE_TO_RIVER_START, IS_RIVER};
use super::{CellMapProcessor, ProcessContext};
use crate::map::{CornerId, EdgeId};

/// Murmur3 64-bit finalizer
fn fmix64(mut k: u64) -> u64 {
    k ^= k >> 33;
    k = k.wrapping_mul(0xff51_afd7_ed55_8ccd);
    k ^= k >> 33;
    k = k.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
    k ^= k >> 33;
    k
}

#[derive(Debug, Clone, Default)]
struct RiverPath {
    corners: Vec<CornerId>,
    edges: Vec<EdgeId>,
}

/// Rivers flowing inland from the coast along corner links
///
/// Needs [`DISTANCE_TO_OCEAN`] on corners. Each coastline corner starts a
/// river with the configured chance. The river walks to neighboring corners
/// that are inland and not lower than the previous one, until it reaches the
/// length picked for it. A river that gets stuck is kept if it already has
/// the minimum length.
pub struct RiverProcessor {
    chance: f64,
    length: RangeInclusive<usize>,
    area_offset: DVec2,
}

impl Default for RiverProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl RiverProcessor {
    pub fn new() -> Self {
        Self {
            chance: 0.19,
            length: 3..=15,
            area_offset: DVec2::splat(0.3),
        }
    }

    pub fn with_chance(mut self, chance: f64) -> Self {
        self.chance = chance;
        self
    }

    /// Number of edges a river spans
    pub fn with_length(mut self, length: RangeInclusive<usize>) -> Self {
        assert!(!length.is_empty(), "empty river length range");
        self.length = length;
        self
    }

    pub fn with_area_offset(mut self, offset: DVec2) -> Self {
        self.area_offset = offset;
        self
    }

    fn distance(ctx: &ProcessContext<'_>, corner: CornerId) -> i32 {
        ctx.get(corner, &DISTANCE_TO_OCEAN).copied().unwrap_or(0)
    }

    fn common_edge(ctx: &ProcessContext<'_>, a: CornerId, b: CornerId) -> Option<EdgeId> {
        let edges = ctx.corner_edges(b);
        ctx.corner_edges(a).into_iter().find(|edge| edges.contains(edge))
    }

    fn traverse(
        &self,
        ctx: &ProcessContext<'_>,
        corner: CornerId,
        rng: &mut ChaCha8Rng,
        expected: usize,
        path: &RiverPath,
    ) -> Option<RiverPath> {
        if path.corners.contains(&corner) {
            return None;
        }

        let mut path = path.clone();
        if let Some(&last) = path.corners.last() {
            let distance = Self::distance(ctx, corner);
            // never back into the sea, never downhill
            if distance <= 0 || *ctx.require(last, &DISTANCE_TO_OCEAN) > distance {
                return None;
            }
            path.edges.push(Self::common_edge(ctx, last, corner)?);
        }
        path.corners.push(corner);
        if path.edges.len() == expected {
            return Some(path);
        }

        let mut neighbors = ctx.corner_neighbors(corner);
        neighbors.shuffle(rng);
        neighbors.sort_by_key(|&neighbor| -Self::distance(ctx, neighbor));

        let mut best: Option<(i32, RiverPath)> = None;
        for neighbor in neighbors {
            if let Some(found) = self.traverse(ctx, neighbor, rng, expected, &path) {
                let end = found.corners.last().map_or(0, |&c| Self::distance(ctx, c));
                if best.as_ref().map_or(true, |(best_end, _)| end > *best_end) {
                    best = Some((end, found));
                }
            }
        }
        match best {
            Some((_, found)) => Some(found),
            None if path.edges.len() >= *self.length.start() => Some(path),
            None => None,
        }
    }
}

impl CellMapProcessor for RiverProcessor {
    fn area_offset(&self) -> DVec2 {
        self.area_offset
    }

    fn process(&self, ctx: &mut ProcessContext<'_>) {
        let coast: Vec<CornerId> = ctx
            .view()
            .corners()
            .filter(|&corner| ctx.get(corner, &DISTANCE_TO_OCEAN) == Some(&0))
            .collect();

        for corner in coast {
            let mut rng = ChaCha8Rng::seed_from_u64(fmix64(corner.0 as u64) ^ ctx.seed());
            if rng.gen::<f64>() > self.chance {
                continue;
            }
            let expected = rng.gen_range(self.length.clone());
            let river = match self.traverse(ctx, corner, &mut rng, expected, &RiverPath::default()) {
                Some(river) => river,
                None => continue,
            };

            for (distance, corner) in river.corners.into_iter().enumerate() {
                ctx.set(corner, &IS_RIVER, true);
                ctx.set(corner, &DISTANCE_TO_RIVER_START, distance as i32);
            }
            for (distance, edge) in river.edges.into_iter().enumerate() {
                ctx.set(edge, &IS_RIVER, true);
                ctx.set(edge, &DISTANCE_TO_RIVER_START, distance as i32);
            }
        }
    }
}
