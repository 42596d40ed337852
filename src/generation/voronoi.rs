//! Voronoi cell construction from a Delaunay triangulation
//!
//! The triangulation comes from the convex hull of the points lifted onto
//! the paraboloid `z = x² + y²`: its downward-facing faces project back to
//! exactly the Delaunay triangles. Each interior site's cell is then the ring
//! of centers of the triangles around it.

use glam::{DVec2, DVec3};
use parry3d::math::Point;
use parry3d::transformation;

use super::{CellPolygon, CellPolygonGenerator};
use crate::geom::{Polygon, Triangle};
use crate::spatial::SpatialIndex;

/// Vertices closer than this (squared) collapse into one
const DUPLICATE_VERTEX_EPSILON: f64 = 1e-18;

/// Default padding in section units
const DEFAULT_POINTS_OFFSET: f64 = 0.5;

/// Which triangle center becomes a cell vertex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TriangleCenter {
    /// True Voronoi cells, always convex
    #[default]
    Circumcenter,
    /// Rounder cells, possibly concave
    Centroid,
    Incenter,
}

impl TriangleCenter {
    pub fn compute(self, triangle: &Triangle) -> DVec2 {
        match self {
            TriangleCenter::Circumcenter => triangle.circumcenter(),
            TriangleCenter::Centroid => triangle.centroid(),
            TriangleCenter::Incenter => triangle.incenter(),
        }
    }

    /// Whether cells built from this center are convex by construction
    pub fn always_convex(self) -> bool {
        matches!(self, TriangleCenter::Circumcenter)
    }
}

/// Builds one polygon per interior input point
///
/// # Example
///
/// ```
/// use rust_voronoi_map::generation::*;
///
/// let points = WhiteNoisePointsGenerator::new(50..=60).generate(&mut section_rng(42, 0, 0));
/// let cells = VoronoiPolygonGenerator::new().generate(&points);
/// assert!(!cells.is_empty());
/// assert!(cells.iter().all(|cell| cell.polygon.is_convex()));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct VoronoiPolygonGenerator {
    center: TriangleCenter,
    points_offset: DVec2,
}

impl VoronoiPolygonGenerator {
    pub fn new() -> Self {
        Self {
            center: TriangleCenter::default(),
            points_offset: DVec2::splat(DEFAULT_POINTS_OFFSET),
        }
    }

    pub fn with_triangle_center(mut self, center: TriangleCenter) -> Self {
        self.center = center;
        self
    }

    /// Padding in section units; must not exceed one section
    pub fn with_points_offset(mut self, offset: DVec2) -> Self {
        self.points_offset = offset;
        self
    }
}

impl Default for VoronoiPolygonGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl CellPolygonGenerator for VoronoiPolygonGenerator {
    fn points_offset(&self) -> DVec2 {
        self.points_offset
    }

    fn generate(&self, points: &[DVec2]) -> Vec<CellPolygon> {
        let triangulation = triangulate(points);

        let centers: Vec<DVec2> = triangulation
            .triangles
            .iter()
            .map(|&[a, b, c]| self.center.compute(&Triangle::new(points[a], points[b], points[c])))
            .collect();

        let mut incident: Vec<Vec<usize>> = vec![Vec::new(); points.len()];
        for (triangle, sites) in triangulation.triangles.iter().enumerate() {
            for &site in sites {
                incident[site].push(triangle);
            }
        }

        let mut cells = Vec::new();
        for (site, triangles) in incident.iter().enumerate() {
            // unbounded cells on the outer hull are skipped
            if triangulation.hull_sites[site] || triangles.len() < 3 {
                continue;
            }

            let ring = order_cell_vertices(
                triangles.iter().map(|&t| centers[t]).collect(),
                points[site],
            );
            if ring.len() < 3 {
                continue;
            }

            let polygon = if self.center.always_convex() {
                Polygon::new_convex(ring)
            } else {
                Polygon::new(ring)
            };
            let center = polygon.centroid();
            cells.push(CellPolygon::new(center, polygon));
        }

        cells
    }
}

/// Delaunay triangles plus the sites lying on the outer hull
struct Triangulation {
    triangles: Vec<[usize; 3]>,
    hull_sites: Vec<bool>,
}

fn triangulate(points: &[DVec2]) -> Triangulation {
    let mut triangulation = Triangulation {
        triangles: Vec::new(),
        hull_sites: vec![true; points.len()],
    };
    if points.len() < 4 {
        return triangulation;
    }
    let index = match SpatialIndex::new(points) {
        Some(index) => index,
        None => return triangulation,
    };
    triangulation.hull_sites.fill(false);

    // Center the points first to keep the lifted coordinates small
    let mean = points.iter().copied().sum::<DVec2>() / points.len() as f64;
    let lifted: Vec<DVec3> = points
        .iter()
        .map(|&p| {
            let q = p - mean;
            DVec3::new(q.x, q.y, q.length_squared())
        })
        .collect();
    let interior = lifted.iter().copied().sum::<DVec3>() / lifted.len() as f64;

    let hull_input: Vec<Point<f32>> = lifted
        .iter()
        .map(|p| Point::new(p.x as f32, p.y as f32, p.z as f32))
        .collect();
    let (hull_vertices, faces) = transformation::convex_hull(&hull_input);

    // Hull vertices are copies of input points; map them back to sites
    let sites: Vec<usize> = hull_vertices
        .iter()
        .map(|v| index.find_nearest(DVec2::new(v.x as f64, v.y as f64) + mean))
        .collect();

    for face in &faces {
        let [a, b, c] = (*face).map(|i| sites[i as usize]);
        if a == b || b == c || a == c {
            continue;
        }

        let (pa, pb, pc) = (lifted[a], lifted[b], lifted[c]);
        let mut normal = (pb - pa).cross(pc - pa);
        if normal.dot(interior - pa) > 0.0 {
            normal = -normal;
        }

        if normal.z < 0.0 {
            triangulation.triangles.push([a, b, c]);
        } else {
            triangulation.hull_sites[a] = true;
            triangulation.hull_sites[b] = true;
            triangulation.hull_sites[c] = true;
        }
    }

    triangulation
}

/// Order cell vertices counter-clockwise around the site
fn order_cell_vertices(vertices: Vec<DVec2>, site: DVec2) -> Vec<DVec2> {
    let mut with_angles: Vec<(DVec2, f64)> = vertices
        .into_iter()
        .map(|v| {
            let to_vertex = v - site;
            (v, to_vertex.y.atan2(to_vertex.x))
        })
        .collect();

    with_angles.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

    let mut ring: Vec<DVec2> = with_angles.into_iter().map(|(v, _)| v).collect();
    ring.dedup_by(|a, b| a.distance_squared(*b) < DUPLICATE_VERTEX_EPSILON);
    if ring.len() > 1 && ring[0].distance_squared(ring[ring.len() - 1]) < DUPLICATE_VERTEX_EPSILON {
        ring.pop();
    }
    ring
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::{section_rng, JitteredGridPointsGenerator, PointsGenerator};

    fn sample_points() -> Vec<DVec2> {
        JitteredGridPointsGenerator::new(40..=40)
            .with_grid_size(8)
            .generate(&mut section_rng(42, 0, 0))
    }

    #[test]
    fn test_too_few_points() {
        let cells = VoronoiPolygonGenerator::new().generate(&[DVec2::ZERO, DVec2::X, DVec2::Y]);
        assert!(cells.is_empty());
    }

    #[test]
    fn test_triangulation_is_delaunay() {
        let points = sample_points();
        let triangulation = triangulate(&points);
        assert!(!triangulation.triangles.is_empty());

        for &[a, b, c] in &triangulation.triangles {
            let triangle = Triangle::new(points[a], points[b], points[c]);
            let center = triangle.circumcenter();
            let radius_squared = points[a].distance_squared(center);
            for (i, point) in points.iter().enumerate() {
                if i == a || i == b || i == c {
                    continue;
                }
                assert!(
                    point.distance_squared(center) >= radius_squared * (1.0 - 1e-4),
                    "point {} lies inside circumcircle of {:?}",
                    i,
                    [a, b, c]
                );
            }
        }
    }

    #[test]
    fn test_every_cell_contains_exactly_one_site() {
        let points = sample_points();
        let cells = VoronoiPolygonGenerator::new().generate(&points);
        assert!(!cells.is_empty());

        for cell in &cells {
            assert!(cell.polygon.is_convex());
            assert!(cell.polygon.contains_point(cell.center));
            let sites = points.iter().filter(|&&p| cell.polygon.contains_point(p)).count();
            assert_eq!(sites, 1);
        }
    }

    #[test]
    fn test_hull_sites_are_skipped() {
        let points = sample_points();
        let triangulation = triangulate(&points);
        let hull_count = triangulation.hull_sites.iter().filter(|&&h| h).count();
        let cells = VoronoiPolygonGenerator::new().generate(&points);
        assert!(hull_count > 0);
        assert!(cells.len() <= points.len() - hull_count);
    }

    #[test]
    fn test_generation_is_deterministic() {
        let points = sample_points();
        let generator = VoronoiPolygonGenerator::new().with_triangle_center(TriangleCenter::Centroid);
        assert_eq!(generator.generate(&points), generator.generate(&points));
    }

    #[test]
    fn test_ring_is_counter_clockwise() {
        let ring = order_cell_vertices(
            vec![DVec2::new(0.0, 1.0), DVec2::new(1.0, 0.0), DVec2::new(-1.0, 0.0), DVec2::new(0.0, -1.0)],
            DVec2::ZERO,
        );
        assert_eq!(
            ring,
            vec![DVec2::new(0.0, -1.0), DVec2::new(1.0, 0.0), DVec2::new(0.0, 1.0), DVec2::new(-1.0, 0.0)]
        );
    }
}
