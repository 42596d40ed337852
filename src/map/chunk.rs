//! Rasterized block to cell lookup tables

use glam::IVec2;

use super::data::{DataKey, DataStore};
use super::element::CellId;
use super::section::{SectionPosition, SectionReference};
use crate::geom::{pack_int_pair, Polygon, Rectanglei};

/// Minimum bits needed to store indices `0..count`
///
/// `ceil(log2(count))`, but never less than one bit.
pub const fn bits_required(count: usize) -> u32 {
    if count <= 2 {
        1
    } else {
        usize::BITS - (count - 1).leading_zeros()
    }
}

/// Fixed-width unsigned values packed into `u64` words
///
/// Values may span two words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedIndexArray {
    words: Vec<u64>,
    bits: u32,
    len: usize,
}

impl PackedIndexArray {
    pub fn new(bits: u32, len: usize) -> Self {
        assert!((1..=32).contains(&bits), "bits out of range: {}", bits);
        let words = (len * bits as usize + 63) / 64;
        Self {
            words: vec![0; words],
            bits,
            len,
        }
    }

    #[inline]
    pub fn bits(&self) -> u32 {
        self.bits
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    fn mask(&self) -> u64 {
        (1u64 << self.bits) - 1
    }

    pub fn get(&self, index: usize) -> usize {
        assert!(index < self.len, "index {} out of bounds ({})", index, self.len);
        let bit_offset = index * self.bits as usize;
        let word = bit_offset >> 6;
        let shift = (bit_offset & 63) as u32;

        let mut value = self.words[word] >> shift;
        if shift + self.bits > 64 {
            value |= self.words[word + 1] << (64 - shift);
        }
        (value & self.mask()) as usize
    }

    pub fn set(&mut self, index: usize, value: usize) {
        assert!(index < self.len, "index {} out of bounds ({})", index, self.len);
        let mask = self.mask();
        let value = value as u64;
        assert!(value <= mask, "value {} does not fit in {} bits", value, self.bits);

        let bit_offset = index * self.bits as usize;
        let word = bit_offset >> 6;
        let shift = (bit_offset & 63) as u32;

        self.words[word] = (self.words[word] & !(mask << shift)) | (value << shift);
        if shift + self.bits > 64 {
            let spilled = 64 - shift;
            self.words[word + 1] =
                (self.words[word + 1] & !(mask >> spilled)) | (value >> spilled);
        }
    }
}

/// Cell of every block of a chunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellBlockData {
    /// The chunk overlaps a single cell
    Single(CellId),
    /// Indices into `cells`, stored column by column
    Packed {
        cells: Vec<CellId>,
        indices: PackedIndexArray,
        size_y: i32,
    },
}

impl CellBlockData {
    /// Rasterize candidate cells over the chunk at `origin`
    ///
    /// Candidates are tested in ascending id order. A block whose center no
    /// earlier candidate contains falls to the last one, which saves a
    /// containment test per block.
    ///
    /// # Panics
    ///
    /// Panics if `candidates` is empty.
    pub fn rasterize(origin: IVec2, size: IVec2, candidates: &[(CellId, &Polygon)]) -> Self {
        assert!(!candidates.is_empty(), "Cell list cannot be empty");
        let mut candidates = candidates.to_vec();
        candidates.sort_by_key(|(id, _)| *id);

        if candidates.len() == 1 {
            return CellBlockData::Single(candidates[0].0);
        }

        let last = candidates.len() - 1;
        let mut indices = PackedIndexArray::new(bits_required(candidates.len()), (size.x * size.y) as usize);

        for local_x in 0..size.x {
            let x = (origin.x + local_x) as f64 + 0.5;
            for local_y in 0..size.y {
                let y = (origin.y + local_y) as f64 + 0.5;
                let center = glam::DVec2::new(x, y);
                let found = candidates[..last]
                    .iter()
                    .position(|(_, polygon)| polygon.contains_point(center))
                    .unwrap_or(last);
                indices.set((local_x * size.y + local_y) as usize, found);
            }
        }

        CellBlockData::Packed {
            cells: candidates.into_iter().map(|(id, _)| id).collect(),
            indices,
            size_y: size.y,
        }
    }

    pub fn cell(&self, local_x: i32, local_y: i32) -> CellId {
        match self {
            CellBlockData::Single(id) => *id,
            CellBlockData::Packed {
                cells,
                indices,
                size_y,
            } => cells[indices.get((local_x * size_y + local_y) as usize)],
        }
    }

    /// Every cell that may appear in the chunk
    pub fn cells(&self) -> &[CellId] {
        match self {
            CellBlockData::Single(id) => std::slice::from_ref(id),
            CellBlockData::Packed { cells, .. } => cells,
        }
    }
}

/// A rasterized chunk, keeping its section cached
///
/// Besides the block to cell table a chunk carries its own attributes,
/// filled in by chunk processors right after rasterization (see
/// [`ChunkProcessor`](crate::processor::ChunkProcessor)).
#[derive(Debug)]
pub struct Chunk {
    position: IVec2,
    rectangle: Rectanglei,
    data: CellBlockData,
    attributes: DataStore,
    reference: SectionReference,
}

impl Chunk {
    pub(crate) fn new(position: IVec2, rectangle: Rectanglei, data: CellBlockData, reference: SectionReference) -> Self {
        Self {
            position,
            rectangle,
            data,
            attributes: DataStore::new(),
            reference,
        }
    }

    /// Chunk coordinate
    #[inline]
    pub fn position(&self) -> IVec2 {
        self.position
    }

    /// Packed chunk coordinate, the key chunks are cached under
    pub fn packed(&self) -> i64 {
        pack_int_pair(self.position.x, self.position.y)
    }

    /// Block rectangle of the chunk, `max` exclusive
    #[inline]
    pub fn rectangle(&self) -> Rectanglei {
        self.rectangle
    }

    pub fn size(&self) -> IVec2 {
        self.rectangle.size()
    }

    /// Cell containing block `(local_x, local_y)` of this chunk
    ///
    /// # Panics
    ///
    /// Panics if the local coordinate is outside the chunk.
    pub fn cell(&self, local_x: i32, local_y: i32) -> CellId {
        let size = self.size();
        assert!(
            (0..size.x).contains(&local_x) && (0..size.y).contains(&local_y),
            "local block ({}, {}) outside chunk of size {}",
            local_x,
            local_y,
            size
        );
        self.data.cell(local_x, local_y)
    }

    pub fn data(&self) -> &CellBlockData {
        &self.data
    }

    /// Section the chunk lies in
    pub fn section(&self) -> SectionPosition {
        self.reference.position()
    }

    /// Chunk-level attributes
    pub fn attributes(&self) -> &DataStore {
        &self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut DataStore {
        &mut self.attributes
    }

    pub fn get<T: 'static>(&self, key: &DataKey<T>) -> Option<&T> {
        self.attributes.get(key)
    }

    /// Store a chunk attribute, returning the previous value
    pub fn set<T: Send + Sync + 'static>(&mut self, key: &DataKey<T>, value: T) -> Option<T> {
        self.attributes.set(key, value)
    }

    pub fn remove<T: 'static>(&mut self, key: &DataKey<T>) -> Option<T> {
        self.attributes.remove(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec2;

    fn rect_polygon(min: DVec2, max: DVec2) -> Polygon {
        Polygon::new(vec![min, DVec2::new(max.x, min.y), max, DVec2::new(min.x, max.y)])
    }

    #[test]
    fn test_bits_required() {
        assert_eq!(bits_required(1), 1);
        assert_eq!(bits_required(2), 1);
        assert_eq!(bits_required(3), 2);
        assert_eq!(bits_required(4), 2);
        assert_eq!(bits_required(5), 3);
        assert_eq!(bits_required(256), 8);
        assert_eq!(bits_required(257), 9);
    }

    #[test]
    fn test_packed_values_span_words() {
        let mut array = PackedIndexArray::new(5, 40);
        for i in 0..40 {
            array.set(i, (i * 7) % 32);
        }
        for i in 0..40 {
            assert_eq!(array.get(i), (i * 7) % 32, "index {}", i);
        }
        // overwrite keeps neighbors intact
        array.set(12, 31);
        array.set(12, 1);
        assert_eq!(array.get(11), (11 * 7) % 32);
        assert_eq!(array.get(12), 1);
        assert_eq!(array.get(13), (13 * 7) % 32);
    }

    #[test]
    #[should_panic(expected = "Cell list cannot be empty")]
    fn test_rasterize_requires_cells() {
        CellBlockData::rasterize(IVec2::ZERO, IVec2::splat(4), &[]);
    }

    #[test]
    fn test_single_cell_is_constant() {
        let polygon = rect_polygon(DVec2::splat(-10.0), DVec2::splat(10.0));
        let data = CellBlockData::rasterize(IVec2::ZERO, IVec2::splat(4), &[(CellId(7), &polygon)]);
        assert_eq!(data, CellBlockData::Single(CellId(7)));
        assert_eq!(data.cell(3, 3), CellId(7));
    }

    #[test]
    fn test_rasterize_splits_chunk() {
        // left half and right half of an 8x4 chunk at (8, 0)
        let left = rect_polygon(DVec2::new(0.0, -5.0), DVec2::new(12.0, 10.0));
        let right = rect_polygon(DVec2::new(12.0, -5.0), DVec2::new(20.0, 10.0));
        let left_id = CellId::from_point(IVec2::new(6, 2));
        let right_id = CellId::from_point(IVec2::new(16, 2));

        let data = CellBlockData::rasterize(
            IVec2::new(8, 0),
            IVec2::new(8, 4),
            &[(right_id, &right), (left_id, &left)],
        );
        assert_eq!(data.cells(), &[left_id, right_id]);
        for local_y in 0..4 {
            for local_x in 0..4 {
                assert_eq!(data.cell(local_x, local_y), left_id);
            }
            for local_x in 4..8 {
                assert_eq!(data.cell(local_x, local_y), right_id);
            }
        }
    }

    #[test]
    fn test_chunk_attributes_and_reference() {
        use crate::map::mesh_builder::AnchoredElements;
        use crate::map::section::Section;

        const BIOME: DataKey<&'static str> = DataKey::new("biome");

        let position = SectionPosition::new(0, 0);
        let section = Section::new(position, position.rectangle(IVec2::splat(64)), AnchoredElements::default());
        let mut chunk = Chunk::new(
            IVec2::ZERO,
            Rectanglei::from_origin(IVec2::ZERO, IVec2::splat(16)),
            CellBlockData::Single(CellId(1)),
            section.acquire(),
        );

        assert_eq!(chunk.get(&BIOME), None);
        assert_eq!(chunk.set(&BIOME, "desert"), None);
        assert_eq!(chunk.set(&BIOME, "forest"), Some("desert"));
        assert_eq!(chunk.get(&BIOME), Some(&"forest"));
        assert_eq!(section.reference_count(), 1);

        assert_eq!(chunk.remove(&BIOME), Some("forest"));
        assert!(chunk.attributes().is_empty());
        drop(chunk);
        assert_eq!(section.reference_count(), 0);
    }
}
