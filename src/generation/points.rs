//! Unit-square point distributions

use std::ops::RangeInclusive;

use glam::DVec2;
use rand::seq::SliceRandom;
use rand::Rng;

use super::{PointsGenerator, SectionRng};

/// Uniformly random points, with a random count drawn from `amount`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhiteNoisePointsGenerator {
    amount: RangeInclusive<usize>,
}

impl WhiteNoisePointsGenerator {
    pub fn new(amount: RangeInclusive<usize>) -> Self {
        Self { amount }
    }
}

impl PointsGenerator for WhiteNoisePointsGenerator {
    fn generate(&self, rng: &mut SectionRng) -> Vec<DVec2> {
        let count = rng.gen_range(self.amount.clone());
        (0..count)
            .map(|_| DVec2::new(rng.gen::<f64>(), rng.gen::<f64>()))
            .collect()
    }
}

/// Jitter strength as fraction of a grid cell
/// 0.0 = points sit exactly at cell centers
/// 1.0 = points may land anywhere inside their cell
const DEFAULT_JITTER: f64 = 0.5;

/// One point in each of a random subset of grid cells
///
/// Gives more even cell sizes than white noise. The grid has
/// `ceil(sqrt(max amount)) + 4` cells per side unless set explicitly, and
/// each point is jittered inside its grid cell so that no four points end up
/// on a common circle.
#[derive(Debug, Clone, PartialEq)]
pub struct JitteredGridPointsGenerator {
    amount: RangeInclusive<usize>,
    grid_size: usize,
    jitter: f64,
}

impl JitteredGridPointsGenerator {
    pub fn new(amount: RangeInclusive<usize>) -> Self {
        let grid_size = (*amount.end() as f64).sqrt().ceil() as usize + 4;
        Self {
            amount,
            grid_size,
            jitter: DEFAULT_JITTER,
        }
    }

    /// Override the number of grid cells per side
    pub fn with_grid_size(mut self, grid_size: usize) -> Self {
        self.grid_size = grid_size.max(1);
        self
    }

    /// Override the jitter, clamped to `[0, 1]`
    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter.clamp(0.0, 1.0);
        self
    }

    pub fn grid_size(&self) -> usize {
        self.grid_size
    }
}

impl PointsGenerator for JitteredGridPointsGenerator {
    fn generate(&self, rng: &mut SectionRng) -> Vec<DVec2> {
        let size = self.grid_size;
        let count = rng.gen_range(self.amount.clone()).min(size * size);

        let mut slots: Vec<usize> = (0..size * size).collect();
        slots.shuffle(rng);

        let cell = 1.0 / size as f64;
        slots[..count]
            .iter()
            .map(|&slot| {
                let base = DVec2::new((slot % size) as f64, (slot / size) as f64);
                let offset = DVec2::new(rng.gen::<f64>() - 0.5, rng.gen::<f64>() - 0.5) * self.jitter;
                (base + DVec2::splat(0.5) + offset) * cell
            })
            .collect()
    }
}
