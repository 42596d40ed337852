//! Triangles and their centers

use std::sync::OnceLock;

use glam::DVec2;

use super::{sign, Polygon, Rectangled};

/// A triangle with a lazily computed circumcenter
#[derive(Debug, Clone)]
pub struct Triangle {
    a: DVec2,
    b: DVec2,
    c: DVec2,
    circumcenter: OnceLock<DVec2>,
}

impl PartialEq for Triangle {
    fn eq(&self, other: &Self) -> bool {
        self.vertices() == other.vertices()
    }
}

impl Triangle {
    pub fn new(a: DVec2, b: DVec2, c: DVec2) -> Self {
        Self {
            a,
            b,
            c,
            circumcenter: OnceLock::new(),
        }
    }

    #[inline]
    pub fn vertices(&self) -> [DVec2; 3] {
        [self.a, self.b, self.c]
    }

    /// Center of the circle through all three vertices
    pub fn circumcenter(&self) -> DVec2 {
        *self.circumcenter.get_or_init(|| {
            let (a, b, c) = (self.a, self.b, self.c);
            let d = 2.0 * (a.x * (b.y - c.y) + b.x * (c.y - a.y) + c.x * (a.y - b.y));
            let a2 = a.length_squared();
            let b2 = b.length_squared();
            let c2 = c.length_squared();
            DVec2::new(
                (a2 * (b.y - c.y) + b2 * (c.y - a.y) + c2 * (a.y - b.y)) / d,
                (a2 * (c.x - b.x) + b2 * (a.x - c.x) + c2 * (b.x - a.x)) / d,
            )
        })
    }

    /// Average of the vertices
    pub fn centroid(&self) -> DVec2 {
        (self.a + self.b + self.c) / 3.0
    }

    /// Center of the inscribed circle
    pub fn incenter(&self) -> DVec2 {
        let la = self.b.distance(self.c);
        let lb = self.a.distance(self.c);
        let lc = self.a.distance(self.b);
        (self.a * la + self.b * lb + self.c * lc) / (la + lb + lc)
    }

    pub fn is_oriented_ccw(&self) -> bool {
        (self.b - self.a).perp_dot(self.c - self.a) > 0.0
    }

    pub fn is_point_in_circumcircle(&self, point: DVec2) -> bool {
        let center = self.circumcenter();
        point.distance_squared(center) < self.a.distance_squared(center)
    }

    /// Whether the point lies on the same side of all three edges
    pub fn contains_point(&self, point: DVec2) -> bool {
        let d1 = sign((point - self.b).perp_dot(self.a - self.b));
        let d2 = sign((point - self.c).perp_dot(self.b - self.c));
        let d3 = sign((point - self.a).perp_dot(self.c - self.a));
        let has_negative = d1 < 0 || d2 < 0 || d3 < 0;
        let has_positive = d1 > 0 || d2 > 0 || d3 > 0;
        !(has_negative && has_positive)
    }

    pub fn to_polygon(&self) -> Polygon {
        Polygon::new_convex(self.vertices().to_vec())
    }

    pub fn contains_rect(&self, rectangle: &Rectangled) -> bool {
        rectangle
            .corners()
            .iter()
            .all(|&corner| self.contains_point(corner))
    }

    pub fn intersects_rect(&self, rectangle: &Rectangled) -> bool {
        self.to_polygon().intersects_rect(rectangle)
    }
}
