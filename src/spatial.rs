//! Spatial indexing for fast nearest-point lookups

use glam::DVec2;
use kiddo::immutable::float::kdtree::ImmutableKdTree;
use kiddo::SquaredEuclidean;

/// Wrapper around a 2D KD-tree
///
/// Maps a query position to the index of the closest input point. Used to
/// resolve convex hull vertices back to their input sites, and by views to
/// find the cell whose center is nearest to a position.
///
/// # Performance
///
/// - Construction: O(n log n)
/// - Query: O(log n)
#[derive(Clone)]
pub struct SpatialIndex {
    tree: ImmutableKdTree<f64, usize, 2, 32>,
    len: usize,
}

impl SpatialIndex {
    /// Build an index over the given points
    ///
    /// Returns `None` for an empty slice, since there is nothing to find.
    ///
    /// # Example
    ///
    /// ```
    /// use rust_voronoi_map::SpatialIndex;
    /// use glam::DVec2;
    ///
    /// let points = vec![DVec2::new(0.0, 0.0), DVec2::new(10.0, 0.0)];
    /// let index = SpatialIndex::new(&points).unwrap();
    /// assert_eq!(index.find_nearest(DVec2::new(8.0, 1.0)), 1);
    /// ```
    pub fn new(points: &[DVec2]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }

        let entries: Vec<[f64; 2]> = points.iter().map(|p| [p.x, p.y]).collect();

        Some(Self {
            tree: ImmutableKdTree::new_from_slice(&entries),
            len: points.len(),
        })
    }

    /// Index of the input point closest to `position`
    pub fn find_nearest(&self, position: DVec2) -> usize {
        let query = [position.x, position.y];
        let result = self.tree.nearest_one::<SquaredEuclidean>(&query);
        result.item as usize
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
