//! Line segments and segment intersection

use glam::{DVec2, IVec2};

/// Turn direction of an ordered point triple
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Colinear,
    Clockwise,
    CounterClockwise,
}

/// Orientation of the triple (p, q, r), from the sign of the cross product
#[inline]
pub fn orientation(p: DVec2, q: DVec2, r: DVec2) -> Orientation {
    let value = (q.y - p.y) * (r.x - q.x) - (q.x - p.x) * (r.y - q.y);
    if value == 0.0 {
        Orientation::Colinear
    } else if value > 0.0 {
        Orientation::Clockwise
    } else {
        Orientation::CounterClockwise
    }
}

/// Given colinear p, q, r: whether q lies on the segment pr
#[inline]
fn on_segment(p: DVec2, q: DVec2, r: DVec2) -> bool {
    q.x <= p.x.max(r.x) && q.x >= p.x.min(r.x) && q.y <= p.y.max(r.y) && q.y >= p.y.min(r.y)
}

/// Whether the segments p1q1 and p2q2 share at least one point
///
/// Touching endpoints and colinear overlaps count as intersections.
pub fn segments_intersect(p1: DVec2, q1: DVec2, p2: DVec2, q2: DVec2) -> bool {
    let o1 = orientation(p1, q1, p2);
    let o2 = orientation(p1, q1, q2);
    let o3 = orientation(p2, q2, p1);
    let o4 = orientation(p2, q2, q1);

    if o1 != o2 && o3 != o4 {
        return true;
    }

    (o1 == Orientation::Colinear && on_segment(p1, p2, q1))
        || (o2 == Orientation::Colinear && on_segment(p1, q2, q1))
        || (o3 == Orientation::Colinear && on_segment(p2, p1, q2))
        || (o4 == Orientation::Colinear && on_segment(p2, q1, q2))
}

/// Whether the segments p1q1 and p2q2 properly cross each other
///
/// Stricter than [`segments_intersect`]: no endpoint may lie on the other
/// segment, which rules out touching and colinear overlaps.
pub fn segments_truly_intersect(p1: DVec2, q1: DVec2, p2: DVec2, q2: DVec2) -> bool {
    let o1 = orientation(p1, q1, p2);
    let o2 = orientation(p1, q1, q2);
    let o3 = orientation(p2, q2, p1);
    let o4 = orientation(p2, q2, q1);

    [o1, o2, o3, o4].iter().all(|&o| o != Orientation::Colinear) && o1 != o2 && o3 != o4
}

#[inline]
fn ordered<T: Copy>(a: T, b: T, key: impl Fn(T) -> (f64, f64)) -> (T, T) {
    if key(b) < key(a) {
        (b, a)
    } else {
        (a, b)
    }
}

/// A floating point segment with normalized endpoint order
///
/// The lexicographically smaller endpoint is always `start`, so two
/// segments over the same points compare equal regardless of direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line2d {
    start: DVec2,
    end: DVec2,
}

impl Line2d {
    pub fn new(a: DVec2, b: DVec2) -> Self {
        let (start, end) = ordered(a, b, |p| (p.x, p.y));
        Self { start, end }
    }

    #[inline]
    pub fn start(&self) -> DVec2 {
        self.start
    }

    #[inline]
    pub fn end(&self) -> DVec2 {
        self.end
    }

    /// Midpoint of the segment
    pub fn center(&self) -> DVec2 {
        (self.start + self.end) * 0.5
    }

    pub fn length(&self) -> f64 {
        self.start.distance(self.end)
    }

    pub fn intersects(&self, other: &Line2d) -> bool {
        segments_intersect(self.start, self.end, other.start, other.end)
    }

    pub fn truly_intersects(&self, other: &Line2d) -> bool {
        segments_truly_intersect(self.start, self.end, other.start, other.end)
    }

    /// Shortest distance from `point` to any point of the segment
    pub fn distance_to_point(&self, point: DVec2) -> f64 {
        let direction = self.end - self.start;
        let length_squared = direction.length_squared();
        if length_squared == 0.0 {
            return self.start.distance(point);
        }
        let t = ((point - self.start).dot(direction) / length_squared).clamp(0.0, 1.0);
        (self.start + direction * t).distance(point)
    }

    /// Floor both endpoints
    pub fn to_int(&self) -> Line2i {
        Line2i::new(super::floor_point(self.start), super::floor_point(self.end))
    }
}

/// An integer segment with normalized endpoint order
///
/// Edges of the mesh are `Line2i`s; their id is derived from [`Line2i::center`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Line2i {
    start: IVec2,
    end: IVec2,
}

impl Line2i {
    pub fn new(a: IVec2, b: IVec2) -> Self {
        let (start, end) = ordered(a, b, |p| (p.x as f64, p.y as f64));
        Self { start, end }
    }

    #[inline]
    pub fn start(&self) -> IVec2 {
        self.start
    }

    #[inline]
    pub fn end(&self) -> IVec2 {
        self.end
    }

    /// Integer midpoint: `start + floor((end - start) / 2)`
    pub fn center(&self) -> IVec2 {
        let half = (self.end - self.start).as_dvec2() / 2.0;
        self.start + super::floor_point(half)
    }

    pub fn to_double(&self) -> Line2d {
        Line2d::new(self.start.as_dvec2(), self.end.as_dvec2())
    }

    /// Same answer as [`Line2d::intersects`] on the converted segments
    pub fn intersects(&self, other: &Line2i) -> bool {
        self.to_double().intersects(&other.to_double())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(x: f64, y: f64) -> DVec2 {
        DVec2::new(x, y)
    }

    #[test]
    fn test_orientation() {
        assert_eq!(orientation(d(0.0, 0.0), d(1.0, 1.0), d(2.0, 2.0)), Orientation::Colinear);
        assert_eq!(orientation(d(0.0, 0.0), d(1.0, 0.0), d(1.0, 1.0)), Orientation::CounterClockwise);
        assert_eq!(orientation(d(0.0, 0.0), d(1.0, 0.0), d(1.0, -1.0)), Orientation::Clockwise);
    }

    #[test]
    fn test_crossing_segments() {
        assert!(segments_intersect(d(0.0, 0.0), d(2.0, 2.0), d(0.0, 2.0), d(2.0, 0.0)));
        assert!(segments_truly_intersect(d(0.0, 0.0), d(2.0, 2.0), d(0.0, 2.0), d(2.0, 0.0)));
    }

    #[test]
    fn test_disjoint_segments() {
        assert!(!segments_intersect(d(0.0, 0.0), d(1.0, 0.0), d(0.0, 1.0), d(1.0, 1.0)));
        assert!(!segments_intersect(d(0.0, 0.0), d(1.0, 1.0), d(2.0, 2.0), d(3.0, 3.0)));
    }

    #[test]
    fn test_touching_is_not_true_intersection() {
        // T junction
        assert!(segments_intersect(d(0.0, 0.0), d(2.0, 0.0), d(1.0, 0.0), d(1.0, 1.0)));
        assert!(!segments_truly_intersect(d(0.0, 0.0), d(2.0, 0.0), d(1.0, 0.0), d(1.0, 1.0)));
        // shared endpoint
        assert!(segments_intersect(d(0.0, 0.0), d(1.0, 1.0), d(1.0, 1.0), d(2.0, 0.0)));
        assert!(!segments_truly_intersect(d(0.0, 0.0), d(1.0, 1.0), d(1.0, 1.0), d(2.0, 0.0)));
    }

    #[test]
    fn test_colinear_overlap() {
        assert!(segments_intersect(d(0.0, 0.0), d(2.0, 0.0), d(1.0, 0.0), d(3.0, 0.0)));
        assert!(!segments_truly_intersect(d(0.0, 0.0), d(2.0, 0.0), d(1.0, 0.0), d(3.0, 0.0)));
    }

    #[test]
    fn test_lines_normalize_direction() {
        let a = Line2d::new(d(3.0, 1.0), d(1.0, 5.0));
        let b = Line2d::new(d(1.0, 5.0), d(3.0, 1.0));
        assert_eq!(a, b);
        assert_eq!(a.start(), d(1.0, 5.0));

        let c = Line2i::new(IVec2::new(4, 0), IVec2::new(4, -2));
        assert_eq!(c.start(), IVec2::new(4, -2));
    }

    #[test]
    fn test_int_center_floors() {
        let line = Line2i::new(IVec2::new(0, 0), IVec2::new(3, -3));
        // (3, -3) / 2 = (1.5, -1.5) -> (1, -2)
        assert_eq!(line.center(), IVec2::new(1, -2));
        let line = Line2i::new(IVec2::new(10, 10), IVec2::new(14, 12));
        assert_eq!(line.center(), IVec2::new(12, 11));
    }

    #[test]
    fn test_int_segment_intersections() {
        let line = |ax, ay, bx, by| Line2i::new(IVec2::new(ax, ay), IVec2::new(bx, by));

        // plain crossing
        assert!(line(0, 0, 4, 4).intersects(&line(0, 4, 4, 0)));
        // T junction, the stem ends on the bar
        assert!(line(0, 0, 4, 0).intersects(&line(2, 0, 2, 3)));
        // stem stops one block short of the bar
        assert!(!line(0, 0, 4, 0).intersects(&line(2, 1, 2, 3)));
        // colinear segments touching end to end
        assert!(line(0, 0, 2, 0).intersects(&line(2, 0, 5, 0)));
        // colinear with a gap
        assert!(!line(0, 0, 2, 0).intersects(&line(3, 0, 5, 0)));
        // parallel
        assert!(!line(0, 0, 4, 1).intersects(&line(0, 1, 4, 2)));
        // the other segment would cross past the end of this one
        assert!(!line(0, 0, 2, 2).intersects(&line(3, 0, 3, 5)));
    }

    #[test]
    fn test_distance_to_point() {
        let line = Line2d::new(d(0.0, 0.0), d(10.0, 0.0));
        assert_eq!(line.distance_to_point(d(4.0, 3.0)), 3.0);
        // beyond an end, measured to the endpoint
        assert_eq!(line.distance_to_point(d(13.0, 4.0)), 5.0);
        assert_eq!(line.distance_to_point(d(-3.0, -4.0)), 5.0);

        let point = Line2d::new(d(1.0, 1.0), d(1.0, 1.0));
        assert_eq!(point.distance_to_point(d(4.0, 5.0)), 5.0);
    }

    #[test]
    fn test_floor_to_int_line() {
        let line = Line2d::new(d(-0.5, 2.7), d(1.2, -3.1)).to_int();
        assert_eq!(line, Line2i::new(IVec2::new(-1, 2), IVec2::new(1, -4)));
    }
}
