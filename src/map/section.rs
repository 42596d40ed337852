//! Sections and the reference handles that keep them cached

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use glam::IVec2;

use super::element::{CellId, CornerId, EdgeId};
use super::mesh_builder::AnchoredElements;
use crate::geom::{pack_int_pair, Rectanglei};

/// Integer coordinate of a section
///
/// Section `(x, y)` covers blocks `[x * size.x, (x + 1) * size.x)` by
/// `[y * size.y, (y + 1) * size.y)`. Ordering is by `x`, then `y`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SectionPosition {
    pub x: i32,
    pub y: i32,
}

impl SectionPosition {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The section a block belongs to
    ///
    /// # Arguments
    ///
    /// * `block` - World block coordinate, may be negative
    /// * `section_size` - Section size in blocks
    ///
    /// # Example
    ///
    /// ```
    /// # use rust_voronoi_map::*;
    /// let size = IVec2::splat(256);
    /// assert_eq!(SectionPosition::containing(IVec2::new(255, 0), size), SectionPosition::new(0, 0));
    /// assert_eq!(SectionPosition::containing(IVec2::new(-1, 256), size), SectionPosition::new(-1, 1));
    /// ```
    pub fn containing(block: IVec2, section_size: IVec2) -> Self {
        Self::new(
            block.x.div_euclid(section_size.x),
            block.y.div_euclid(section_size.y),
        )
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// This section and its eight neighbors
    pub fn neighborhood(self) -> impl Iterator<Item = SectionPosition> {
        (-1..=1).flat_map(move |dx| (-1..=1).map(move |dy| self.offset(dx, dy)))
    }

    /// Both coordinates packed into one key
    pub fn packed(self) -> i64 {
        pack_int_pair(self.x, self.y)
    }

    /// Minimum block of the section
    pub fn origin(self, section_size: IVec2) -> IVec2 {
        IVec2::new(self.x, self.y) * section_size
    }

    /// Block rectangle of the section, `max` exclusive
    pub fn rectangle(self, section_size: IVec2) -> Rectanglei {
        Rectanglei::from_origin(self.origin(section_size), section_size)
    }
}

/// How far a section has been generated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionStage {
    /// Cells, corners and edges are linked; no attributes yet
    Structure,
    /// Every processor has run over the section
    Processed,
}

/// A generation and caching unit
///
/// Lists the elements its polygons produced. Elements on the border are
/// listed by every section that produced them.
///
/// Sections are created and cached by [`CellMap`](super::CellMap); callers
/// only see them through [`CellMap::section`](super::CellMap::section) and
/// keep them alive with a [`SectionReference`].
#[derive(Debug)]
pub struct Section {
    position: SectionPosition,
    rectangle: Rectanglei,
    cells: Vec<CellId>,
    corners: Vec<CornerId>,
    edges: Vec<EdgeId>,
    pub(crate) stage: SectionStage,
    references: Arc<AtomicUsize>,
}

impl Section {
    pub(crate) fn new(position: SectionPosition, rectangle: Rectanglei, elements: AnchoredElements) -> Self {
        Self {
            position,
            rectangle,
            cells: elements.cells.into_iter().collect(),
            corners: elements.corners.into_iter().collect(),
            edges: elements.edges.into_iter().collect(),
            stage: SectionStage::Structure,
            references: Arc::new(AtomicUsize::new(0)),
        }
    }

    #[inline]
    pub fn position(&self) -> SectionPosition {
        self.position
    }

    /// Blocks owned by this section, `max` exclusive
    #[inline]
    pub fn rectangle(&self) -> Rectanglei {
        self.rectangle
    }

    /// Anchored cells, by ascending id
    pub fn cells(&self) -> &[CellId] {
        &self.cells
    }

    pub fn corners(&self) -> &[CornerId] {
        &self.corners
    }

    pub fn edges(&self) -> &[EdgeId] {
        &self.edges
    }

    #[inline]
    pub fn stage(&self) -> SectionStage {
        self.stage
    }

    /// Number of live references
    pub fn reference_count(&self) -> usize {
        self.references.load(Ordering::Acquire)
    }

    /// Hand out a new reference, incrementing the count
    pub(crate) fn acquire(&self) -> SectionReference {
        self.references.fetch_add(1, Ordering::AcqRel);
        SectionReference {
            position: self.position,
            count: Arc::clone(&self.references),
            released: false,
        }
    }
}

/// Keeps one section cached until released
///
/// Dropping a reference releases it. Releasing twice is a no-op.
#[derive(Debug)]
pub struct SectionReference {
    position: SectionPosition,
    count: Arc<AtomicUsize>,
    released: bool,
}

impl SectionReference {
    #[inline]
    pub fn position(&self) -> SectionPosition {
        self.position
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Decrement the section's count once
    ///
    /// A section with no live references may be evicted by
    /// [`CellMap::evict_unreferenced`](super::CellMap::evict_unreferenced).
    pub fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.count.fetch_sub(1, Ordering::AcqRel);
        }
    }
}

impl Drop for SectionReference {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_section() -> Section {
        let position = SectionPosition::new(2, -1);
        Section::new(position, position.rectangle(IVec2::splat(512)), AnchoredElements::default())
    }

    #[test]
    fn test_containing_handles_negative_blocks() {
        let size = IVec2::splat(512);
        assert_eq!(SectionPosition::containing(IVec2::new(0, 511), size), SectionPosition::new(0, 0));
        assert_eq!(SectionPosition::containing(IVec2::new(-1, 512), size), SectionPosition::new(-1, 1));
        assert_eq!(SectionPosition::containing(IVec2::new(-512, -513), size), SectionPosition::new(-1, -2));
    }

    #[test]
    fn test_rectangle() {
        let rect = SectionPosition::new(2, -1).rectangle(IVec2::splat(512));
        assert_eq!(rect.min(), IVec2::new(1024, -512));
        assert_eq!(rect.max(), IVec2::new(1536, 0));
    }

    #[test]
    fn test_neighborhood() {
        let around: Vec<SectionPosition> = SectionPosition::new(0, 0).neighborhood().collect();
        assert_eq!(around.len(), 9);
        assert!(around.contains(&SectionPosition::new(-1, 1)));
        assert!(around.contains(&SectionPosition::new(0, 0)));
    }

    #[test]
    fn test_references_count_and_release_once() {
        let section = empty_section();
        let mut a = section.acquire();
        let b = section.acquire();
        assert_eq!(section.reference_count(), 2);

        a.release();
        a.release();
        assert!(a.is_released());
        assert_eq!(section.reference_count(), 1);

        drop(b);
        assert_eq!(section.reference_count(), 0);
        drop(a);
        assert_eq!(section.reference_count(), 0);
    }
}
