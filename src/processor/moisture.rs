use super::keys::{IS_OCEAN, IS_RIVER, MOISTURE};
use super::{CellMapProcessor, ProcessContext};
use crate::terrain::{ConstantSampler, Sampler2};

/// Per-cell moisture from nearby water, shaped by noise
///
/// Ocean cells are saturated. Land cells gain moisture from neighboring
/// ocean cells and from river edges, up to a capped number of each. The sum
/// is offset by `base` and scaled by `modifier`, both sampled at the cell
/// center, then clamped and normalized to `[0, 1]`.
pub struct MoistureProcessor {
    base: Box<dyn Sampler2>,
    modifier: Box<dyn Sampler2>,
    maximum: f64,
    ocean_factor: f64,
    ocean_max_neighbors: usize,
    river_factor: f64,
    river_max_edges: usize,
}

impl Default for MoistureProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl MoistureProcessor {
    pub fn new() -> Self {
        Self {
            base: Box::new(ConstantSampler(0.0)),
            modifier: Box::new(ConstantSampler(1.0)),
            maximum: 2.0,
            ocean_factor: 0.3,
            ocean_max_neighbors: 1,
            river_factor: 0.2,
            river_max_edges: 2,
        }
    }

    pub fn with_base(mut self, base: impl Sampler2 + 'static) -> Self {
        self.base = Box::new(base);
        self
    }

    pub fn with_modifier(mut self, modifier: impl Sampler2 + 'static) -> Self {
        self.modifier = Box::new(modifier);
        self
    }

    pub fn with_maximum(mut self, maximum: f64) -> Self {
        assert!(maximum > 0.0, "maximum moisture must be positive");
        self.maximum = maximum;
        self
    }

    pub fn with_ocean_factor(mut self, factor: f64, max_neighbors: usize) -> Self {
        self.ocean_factor = factor;
        self.ocean_max_neighbors = max_neighbors;
        self
    }

    pub fn with_river_factor(mut self, factor: f64, max_edges: usize) -> Self {
        self.river_factor = factor;
        self.river_max_edges = max_edges;
        self
    }
}

impl CellMapProcessor for MoistureProcessor {
    fn process(&self, ctx: &mut ProcessContext<'_>) {
        for id in ctx.view().cells() {
            let moisture = if ctx.get(id, &IS_OCEAN) == Some(&true) {
                self.maximum
            } else {
                let oceans = ctx
                    .cell_neighbors(id)
                    .into_iter()
                    .filter(|&n| ctx.get(n, &IS_OCEAN) == Some(&true))
                    .count();
                let rivers = ctx
                    .cell_edges(id)
                    .into_iter()
                    .filter(|&e| ctx.get(e, &IS_RIVER) == Some(&true))
                    .count();
                oceans.min(self.ocean_max_neighbors) as f64 * self.ocean_factor
                    + rivers.min(self.river_max_edges) as f64 * self.river_factor
            };

            let center = id.point().as_dvec2();
            let base = self.base.sample(center.x, center.y);
            let modifier = self.modifier.sample(center.x, center.y);
            let moisture = ((base + moisture) * modifier).clamp(0.0, self.maximum) / self.maximum;
            ctx.set(id, &MOISTURE, moisture);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::tests::{strip, strip_cell};
    use crate::processor::Scratch;

    fn moisture(processor: &MoistureProcessor, river_edge_of: Option<usize>) -> Vec<f64> {
        let (mut arena, view) = strip(5);
        for i in 0..5 {
            arena.cell_mut(strip_cell(i)).unwrap().set(&IS_OCEAN, i == 0);
        }
        if let Some(i) = river_edge_of {
            let edges: Vec<_> = arena.cell(strip_cell(i)).unwrap().edges().collect();
            for edge in edges {
                arena.edge_mut(edge).unwrap().set(&IS_RIVER, true);
            }
        }

        let mut scratch = Scratch::new();
        let mut ctx = ProcessContext::new(&mut arena, &view, view.rectangle(), 0, &mut scratch);
        processor.process(&mut ctx);
        (0..5).map(|i| *ctx.require(strip_cell(i), &MOISTURE)).collect()
    }

    #[test]
    fn test_ocean_is_saturated_and_coast_is_damp() {
        let values = moisture(&MoistureProcessor::new(), None);
        assert_eq!(values[0], 1.0);
        assert!((values[1] - 0.15).abs() < 1e-12);
        assert_eq!(&values[2..], &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_river_edges_are_capped() {
        // all four edges of cell 3 carry a river, only two count
        let values = moisture(&MoistureProcessor::new(), Some(3));
        assert!((values[3] - 0.2).abs() < 1e-12);
        // the edges shared with cells 2 and 4 count once for each of them
        assert!((values[2] - 0.1).abs() < 1e-12);
        assert!((values[4] - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_noise_fields_are_clamped() {
        let processor = MoistureProcessor::new().with_base(|x: f64, _y: f64| if x > 30.0 { 10.0 } else { -10.0 });
        let values = moisture(&processor, None);
        assert_eq!(values[0], 0.0);
        assert_eq!(values[4], 1.0);
    }
}
