//! Per-section polygon generation with cross-section padding

use glam::{DVec2, IVec2};

use super::{section_rng, CellPolygon, CellPolygonGenerator, PointsGenerator};
use crate::geom::{ceil_to_int, Rectangled};

/// Generates the polygons anchored to one section
///
/// Every section samples its own points from an independent seeded stream.
/// To generate section `(x, y)`, the points of the surrounding sections
/// within the polygon generator's `points_offset` are added, so polygons on
/// the section border come out identical no matter which side builds them.
pub struct SectionPolygonGenerator {
    seed: u64,
    section_size: IVec2,
    points: Box<dyn PointsGenerator>,
    polygons: Box<dyn CellPolygonGenerator>,
}

impl SectionPolygonGenerator {
    pub fn new(
        seed: u64,
        section_size: IVec2,
        points: Box<dyn PointsGenerator>,
        polygons: Box<dyn CellPolygonGenerator>,
    ) -> Self {
        Self {
            seed,
            section_size,
            points,
            polygons,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn section_size(&self) -> IVec2 {
        self.section_size
    }

    /// Points of section `(x, y)` and its padding, in the section's unit space
    pub fn padded_points(&self, x: i32, y: i32) -> Vec<DVec2> {
        let offset = self.polygons.points_offset();
        let reach = IVec2::new(ceil_to_int(offset.x), ceil_to_int(offset.y));
        let bounds = Rectangled::new(-offset, DVec2::ONE + offset);

        let mut points = Vec::new();
        for local_x in -reach.x..=reach.x {
            for local_y in -reach.y..=reach.y {
                let border = (reach.x != 0 && local_x.abs() == reach.x)
                    || (reach.y != 0 && local_y.abs() == reach.y);
                let local = DVec2::new(local_x as f64, local_y as f64);

                let mut rng = section_rng(self.seed, x + local_x, y + local_y);
                points.extend(
                    self.points
                        .generate(&mut rng)
                        .into_iter()
                        .map(|p| p + local)
                        .filter(|&p| !border || bounds.contains_point(p)),
                );
            }
        }
        points
    }

    /// World-space polygons with at least one vertex inside section `(x, y)`
    pub fn generate(&self, x: i32, y: i32) -> Vec<CellPolygon> {
        let points = self.padded_points(x, y);
        let unit = Rectangled::new(DVec2::ZERO, DVec2::ONE);
        let size = self.section_size.as_dvec2();
        let origin = DVec2::new(x as f64, y as f64) * size;

        self.polygons
            .generate(&points)
            .into_iter()
            .filter(|cell| cell.polygon.vertices().iter().any(|&v| unit.contains_point(v)))
            .map(|cell| cell.scale(size).translate(origin))
            .collect()
    }
}
