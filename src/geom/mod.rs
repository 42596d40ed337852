//! Planar geometry kernel
//!
//! Segments, rectangles, polygons and triangles with the predicates the
//! mesh engine relies on: orientation-based segment intersection, ray-cast
//! polygon containment, cached convexity and rectangle overlap tests.
//!
//! Degenerate shapes (colinear triangles, zero-area polygons) are not
//! guarded against; results for them are unspecified.

mod line;
mod polygon;
mod rect;
mod triangle;

pub use line::{orientation, segments_intersect, segments_truly_intersect, Line2d, Line2i, Orientation};
pub use polygon::Polygon;
pub use rect::{Rectangled, Rectanglei};
pub use triangle::Triangle;

use glam::{DVec2, IVec2};

/// Floor a double to an int, the way every id in the mesh is derived
#[inline]
pub fn floor_to_int(value: f64) -> i32 {
    value.floor() as i32
}

/// Ceil a double to an int
#[inline]
pub fn ceil_to_int(value: f64) -> i32 {
    value.ceil() as i32
}

/// Floor both components of a point
#[inline]
pub fn floor_point(point: DVec2) -> IVec2 {
    IVec2::new(floor_to_int(point.x), floor_to_int(point.y))
}

/// Pack two ints into one long, first value in the high 32 bits
#[inline]
pub fn pack_int_pair(first: i32, second: i32) -> i64 {
    ((first as i64 & 0xffff_ffff) << 32) | (second as i64 & 0xffff_ffff)
}

/// Inverse of [`pack_int_pair`]
#[inline]
pub fn unpack_int_pair(packed: i64) -> (i32, i32) {
    ((packed >> 32) as i32, packed as i32)
}

/// Pack an integer point into one long
#[inline]
pub fn pack_point(point: IVec2) -> i64 {
    pack_int_pair(point.x, point.y)
}

/// Unpack a long produced by [`pack_point`]
#[inline]
pub fn unpack_point(packed: i64) -> IVec2 {
    let (x, y) = unpack_int_pair(packed);
    IVec2::new(x, y)
}

/// Sign of a double as -1, 0 or 1 (zero stays zero, unlike `f64::signum`)
#[inline]
pub(crate) fn sign(value: f64) -> i32 {
    if value > 0.0 {
        1
    } else if value < 0.0 {
        -1
    } else {
        0
    }
}

/// Borrowed view of any shape the containment predicates dispatch over
#[derive(Debug, Clone, Copy)]
pub enum Shape<'a> {
    Rectangle(&'a Rectangled),
    Polygon(&'a Polygon),
    Triangle(&'a Triangle),
}

impl<'a> From<&'a Rectangled> for Shape<'a> {
    fn from(rectangle: &'a Rectangled) -> Self {
        Shape::Rectangle(rectangle)
    }
}

impl<'a> From<&'a Polygon> for Shape<'a> {
    fn from(polygon: &'a Polygon) -> Self {
        Shape::Polygon(polygon)
    }
}

impl<'a> From<&'a Triangle> for Shape<'a> {
    fn from(triangle: &'a Triangle) -> Self {
        Shape::Triangle(triangle)
    }
}

impl Shape<'_> {
    /// Whether the point lies inside the shape
    pub fn contains_point(&self, point: DVec2) -> bool {
        match self {
            Shape::Rectangle(rectangle) => rectangle.contains_point(point),
            Shape::Polygon(polygon) => polygon.contains_point(point),
            Shape::Triangle(triangle) => triangle.contains_point(point),
        }
    }

    pub fn vertices(&self) -> Vec<DVec2> {
        match self {
            Shape::Rectangle(rectangle) => rectangle.corners().to_vec(),
            Shape::Polygon(polygon) => polygon.vertices().to_vec(),
            Shape::Triangle(triangle) => triangle.vertices().to_vec(),
        }
    }

    /// Boundary segments of the shape, in ring order
    pub fn edges(&self) -> Vec<(DVec2, DVec2)> {
        ring_edges(&self.vertices())
    }

    pub fn is_convex(&self) -> bool {
        match self {
            Shape::Rectangle(_) | Shape::Triangle(_) => true,
            Shape::Polygon(polygon) => polygon.is_convex(),
        }
    }
}

/// Pairs every vertex with its successor, closing the ring
pub(crate) fn ring_edges(vertices: &[DVec2]) -> Vec<(DVec2, DVec2)> {
    let count = vertices.len();
    (0..count)
        .map(|i| (vertices[i], vertices[(i + 1) % count]))
        .collect()
}

/// Whether any boundary segment of `a` crosses any boundary segment of `b`
pub(crate) fn edges_intersect(a: &[(DVec2, DVec2)], b: &[(DVec2, DVec2)]) -> bool {
    a.iter()
        .any(|&(p1, q1)| b.iter().any(|&(p2, q2)| segments_intersect(p1, q1, p2, q2)))
}

/// Whether any boundary segment of `a` properly crosses one of `b`
pub(crate) fn edges_truly_intersect(a: &[(DVec2, DVec2)], b: &[(DVec2, DVec2)]) -> bool {
    a.iter().any(|&(p1, q1)| {
        b.iter()
            .any(|&(p2, q2)| segments_truly_intersect(p1, q1, p2, q2))
    })
}
