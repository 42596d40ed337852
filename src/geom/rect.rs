//! Axis-aligned rectangles

use glam::{DVec2, IVec2};

use super::{ring_edges, segments_intersect, Polygon};

/// Floating point rectangle, `min <= max` component-wise
///
/// Containment is inclusive on every side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rectangled {
    min: DVec2,
    max: DVec2,
}

impl Rectangled {
    /// Create a rectangle from any two opposite corners
    pub fn new(a: DVec2, b: DVec2) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    #[inline]
    pub fn min(&self) -> DVec2 {
        self.min
    }

    #[inline]
    pub fn max(&self) -> DVec2 {
        self.max
    }

    pub fn size(&self) -> DVec2 {
        self.max - self.min
    }

    pub fn center(&self) -> DVec2 {
        (self.min + self.max) * 0.5
    }

    /// Corners in counter-clockwise order starting at `min`
    pub fn corners(&self) -> [DVec2; 4] {
        [
            self.min,
            DVec2::new(self.max.x, self.min.y),
            self.max,
            DVec2::new(self.min.x, self.max.y),
        ]
    }

    pub fn contains_point(&self, point: DVec2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }

    pub fn contains_rect(&self, other: &Rectangled) -> bool {
        self.contains_point(other.min) && self.contains_point(other.max)
    }

    /// Whether the areas overlap (touching counts)
    pub fn intersects_rect(&self, other: &Rectangled) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    /// Whether the segment ab has any point inside the rectangle
    pub fn intersects_segment(&self, a: DVec2, b: DVec2) -> bool {
        self.contains_point(a)
            || self.contains_point(b)
            || ring_edges(&self.corners())
                .iter()
                .any(|&(p, q)| segments_intersect(p, q, a, b))
    }

    pub fn translate(&self, offset: DVec2) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    pub fn to_polygon(&self) -> Polygon {
        Polygon::new_convex(self.corners().to_vec())
    }
}

/// Integer rectangle in block coordinates, `min <= max` component-wise
///
/// [`Rectanglei::contains`] is inclusive on both ends, which is what view
/// filtering uses. [`Rectanglei::contains_half_open`] treats `max` as
/// exclusive and gives every point exactly one owning section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rectanglei {
    min: IVec2,
    max: IVec2,
}

impl Rectanglei {
    /// Create a rectangle from any two opposite corners
    pub fn new(a: IVec2, b: IVec2) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Rectangle starting at `origin` spanning `size` blocks (`max` exclusive)
    pub fn from_origin(origin: IVec2, size: IVec2) -> Self {
        Self::new(origin, origin + size)
    }

    #[inline]
    pub fn min(&self) -> IVec2 {
        self.min
    }

    #[inline]
    pub fn max(&self) -> IVec2 {
        self.max
    }

    pub fn size(&self) -> IVec2 {
        self.max - self.min
    }

    pub fn contains(&self, point: IVec2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }

    pub fn contains_half_open(&self, point: IVec2) -> bool {
        point.x >= self.min.x && point.x < self.max.x && point.y >= self.min.y && point.y < self.max.y
    }

    pub fn contains_rect(&self, other: &Rectanglei) -> bool {
        self.contains(other.min) && self.contains(other.max)
    }

    /// Grow the rectangle by `amount` on every side
    pub fn expand(&self, amount: IVec2) -> Self {
        Self::new(self.min - amount, self.max + amount)
    }

    pub fn to_double(&self) -> Rectangled {
        Rectangled::new(self.min.as_dvec2(), self.max.as_dvec2())
    }
}
