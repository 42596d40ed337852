use glam::DVec2;

use super::keys::IS_OCEAN;
use super::{CellMapProcessor, ProcessContext};
use crate::terrain::Sampler2;

/// Marks every cell whose center lies below sea level as ocean
pub struct OceanLandProcessor {
    height: Box<dyn Sampler2>,
    area_offset: DVec2,
}

impl OceanLandProcessor {
    pub fn new(height: impl Sampler2 + 'static) -> Self {
        Self {
            height: Box::new(height),
            area_offset: DVec2::splat(0.3),
        }
    }

    pub fn with_area_offset(mut self, offset: DVec2) -> Self {
        self.area_offset = offset;
        self
    }
}

impl CellMapProcessor for OceanLandProcessor {
    fn area_offset(&self) -> DVec2 {
        self.area_offset
    }

    fn process(&self, ctx: &mut ProcessContext<'_>) {
        for id in ctx.view().cells() {
            let center = id.point().as_dvec2();
            let height = self.height.sample(center.x, center.y);
            ctx.set(id, &IS_OCEAN, height < 0.0);
        }
    }
}
