//! Simple polygons with cached convexity

use std::sync::OnceLock;

use glam::DVec2;

use super::{edges_intersect, edges_truly_intersect, ring_edges, sign, Rectangled, Shape};

/// A closed ring of at least three vertices
///
/// Convexity and the centroid are computed on first use and cached.
/// Polygons built by the Voronoi generator from circumcenters are known to
/// be convex up front and skip the check entirely.
#[derive(Debug, Clone)]
pub struct Polygon {
    vertices: Vec<DVec2>,
    convex: OnceLock<bool>,
    centroid: OnceLock<DVec2>,
}

impl PartialEq for Polygon {
    fn eq(&self, other: &Self) -> bool {
        self.vertices == other.vertices
    }
}

impl Polygon {
    /// Create a polygon from its ring of vertices
    ///
    /// # Panics
    ///
    /// Panics if fewer than three vertices are given.
    pub fn new(vertices: Vec<DVec2>) -> Self {
        assert!(
            vertices.len() >= 3,
            "a polygon needs at least 3 vertices, got {}",
            vertices.len()
        );
        Self {
            vertices,
            convex: OnceLock::new(),
            centroid: OnceLock::new(),
        }
    }

    /// Create a polygon that is already known to be convex
    pub fn new_convex(vertices: Vec<DVec2>) -> Self {
        let polygon = Self::new(vertices);
        let _ = polygon.convex.set(true);
        polygon
    }

    #[inline]
    pub fn vertices(&self) -> &[DVec2] {
        &self.vertices
    }

    /// Average of the vertices
    pub fn centroid(&self) -> DVec2 {
        *self.centroid.get_or_init(|| {
            let sum: DVec2 = self.vertices.iter().copied().sum();
            sum / self.vertices.len() as f64
        })
    }

    /// Whether every consecutive vertex triple turns the same way
    pub fn is_convex(&self) -> bool {
        *self.convex.get_or_init(|| compute_convex(&self.vertices))
    }

    pub fn bounds(&self) -> Rectangled {
        let (min, max) = self.vertices.iter().fold(
            (DVec2::splat(f64::INFINITY), DVec2::splat(f64::NEG_INFINITY)),
            |(min, max), &v| (min.min(v), max.max(v)),
        );
        Rectangled::new(min, max)
    }

    pub fn edges(&self) -> Vec<(DVec2, DVec2)> {
        ring_edges(&self.vertices)
    }

    /// Ray casting point-in-polygon test
    pub fn contains_point(&self, point: DVec2) -> bool {
        let mut inside = false;
        let mut j = self.vertices.len() - 1;
        for i in 0..self.vertices.len() {
            let vi = self.vertices[i];
            let vj = self.vertices[j];
            if (vi.y > point.y) != (vj.y > point.y)
                && point.x < (vj.x - vi.x) * (point.y - vi.y) / (vj.y - vi.y) + vi.x
            {
                inside = !inside;
            }
            j = i;
        }
        inside
    }

    /// Whether the whole shape lies inside this polygon
    ///
    /// When either side is concave, a proper crossing of the two boundaries
    /// rejects immediately; otherwise every vertex of the shape must be inside.
    pub fn contains_shape<'a>(&self, shape: impl Into<Shape<'a>>) -> bool {
        let shape = shape.into();
        if (!self.is_convex() || !shape.is_convex())
            && edges_truly_intersect(&self.edges(), &shape.edges())
        {
            return false;
        }
        shape
            .vertices()
            .into_iter()
            .all(|vertex| self.contains_point(vertex))
    }

    pub fn contains_rect(&self, rectangle: &Rectangled) -> bool {
        self.contains_shape(rectangle)
    }

    pub fn contains_polygon(&self, polygon: &Polygon) -> bool {
        self.contains_shape(polygon)
    }

    /// Whether any boundary segment touches a boundary segment of the shape
    ///
    /// A shape strictly inside the polygon (or the other way round) does not
    /// intersect it.
    pub fn intersects_shape<'a>(&self, shape: impl Into<Shape<'a>>) -> bool {
        edges_intersect(&self.edges(), &shape.into().edges())
    }

    pub fn intersects_rect(&self, rectangle: &Rectangled) -> bool {
        self.intersects_shape(rectangle)
    }

    pub fn intersects_polygon(&self, polygon: &Polygon) -> bool {
        self.intersects_shape(polygon)
    }

    /// Whether the polygon and the rectangle share any area
    pub fn overlaps_rect(&self, rectangle: &Rectangled) -> bool {
        self.bounds().intersects_rect(rectangle)
            && (self.vertices.iter().any(|&v| rectangle.contains_point(v))
                || self.contains_point(rectangle.min())
                || self.intersects_rect(rectangle))
    }

    /// Scale every vertex component-wise around the origin
    pub fn scale(&self, factor: DVec2) -> Self {
        self.map_vertices(|v| v * factor)
    }

    pub fn translate(&self, offset: DVec2) -> Self {
        self.map_vertices(|v| v + offset)
    }

    fn map_vertices(&self, f: impl Fn(DVec2) -> DVec2) -> Self {
        let convex = self.convex.clone();
        Self {
            vertices: self.vertices.iter().map(|&v| f(v)).collect(),
            convex,
            centroid: OnceLock::new(),
        }
    }
}

fn compute_convex(vertices: &[DVec2]) -> bool {
    let count = vertices.len();
    if count < 4 {
        return true;
    }
    let mut expected = 0;
    for i in 0..count {
        let a = vertices[i];
        let b = vertices[(i + 1) % count];
        let c = vertices[(i + 2) % count];
        let turn = sign((b - a).perp_dot(c - b));
        if turn == 0 {
            continue;
        }
        if expected == 0 {
            expected = turn;
        } else if turn != expected {
            return false;
        }
    }
    true
}
