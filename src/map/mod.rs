//! The cell map: sections generated on demand, cached while referenced
//!
//! All elements live in one [`MeshArena`] owned by the [`CellMap`]. Sections
//! record which elements their polygons produced; views and chunks hold
//! section references that keep those sections cached. A section is first
//! built structurally together with its eight neighbors, then every
//! processor runs over it once before it is handed out.

mod chunk;
pub(crate) mod data;
mod element;
pub(crate) mod mesh_builder;
mod section;
mod view;

pub use chunk::{bits_required, CellBlockData, Chunk, PackedIndexArray};
pub use data::{DataKey, DataStore};
pub use element::{Cell, CellId, Corner, CornerId, Edge, EdgeId, ElementId, MeshArena};
pub use section::{Section, SectionPosition, SectionReference, SectionStage};
pub use view::MapView;

use std::collections::{BTreeSet, HashMap};

use glam::{DVec2, IVec2};
use slog::{debug, info, o, trace, Logger};

use crate::config::MapConfig;
use crate::error::{MeshError, Result};
use crate::generation::{CellPolygonGenerator, PointsGenerator, SectionPolygonGenerator};
use crate::geom::{floor_point, pack_int_pair, Rectangled, Rectanglei};
use crate::processor::{CellMapProcessor, ChunkProcessor, ProcessContext, Scratch};
use mesh_builder::build_elements;

/// An incrementally generated map of Voronoi cells
///
/// # Example
///
/// ```
/// use rust_voronoi_map::*;
/// use glam::IVec2;
///
/// let config = MapConfigBuilder::new()
///     .seed(7)
///     .section_size(256, 256).unwrap()
///     .build().unwrap();
/// let mut map = CellMap::builder(config)
///     .points_generator(JitteredGridPointsGenerator::new(30..=40))
///     .polygon_generator(VoronoiPolygonGenerator::new())
///     .add_processor(OceanLandProcessor::new(PerlinHeightSampler::new(7)))
///     .build()
///     .unwrap();
///
/// let mut view = map.get_sub_view(Rectanglei::new(IVec2::ZERO, IVec2::new(300, 100)));
/// for id in view.cells() {
///     let cell = map.cell(id).unwrap();
///     assert!(cell.get(&keys::IS_OCEAN).is_some());
/// }
/// view.release();
/// ```
pub struct CellMap {
    config: MapConfig,
    log: Logger,
    generator: SectionPolygonGenerator,
    processors: Vec<Box<dyn CellMapProcessor>>,
    chunk_processors: Vec<Box<dyn ChunkProcessor>>,
    processor_padding: IVec2,
    arena: MeshArena,
    sections: HashMap<SectionPosition, Section>,
    chunks: HashMap<i64, Chunk>,
}

impl CellMap {
    pub fn builder(config: MapConfig) -> CellMapBuilder {
        CellMapBuilder::new(config)
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn seed(&self) -> u64 {
        self.config.seed
    }

    pub fn logger(&self) -> &Logger {
        &self.log
    }

    /// Blocks of context every processor run gets around its section
    pub fn processor_padding(&self) -> IVec2 {
        self.processor_padding
    }

    pub fn arena(&self) -> &MeshArena {
        &self.arena
    }

    /// A processed section, kept cached while the reference is alive
    pub fn get_section(&mut self, position: SectionPosition) -> SectionReference {
        self.ensure_processed(position).acquire()
    }

    /// A cached section, if it was generated
    pub fn section(&self, position: SectionPosition) -> Option<&Section> {
        self.sections.get(&position)
    }

    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    /// The section that owns an element's attributes
    pub fn owner_of(&self, element: impl Into<ElementId>) -> SectionPosition {
        SectionPosition::containing(element.into().point(), self.config.section_size)
    }

    /// A view of every element in `rectangle`
    ///
    /// Each covered section is generated and processed first, as are the
    /// owners of the elements that show up in the view. Release the view
    /// (or drop it) to let those sections go.
    pub fn get_sub_view(&mut self, rectangle: Rectanglei) -> MapView {
        let (min, max) = self.section_range(rectangle);
        let mut references = Vec::new();
        for x in min.x..=max.x {
            for y in min.y..=max.y {
                references.push(self.ensure_processed(SectionPosition::new(x, y)).acquire());
            }
        }

        let covered = references.iter().filter_map(|reference| {
            let position = reference.position();
            let boundary = position.x == min.x || position.x == max.x || position.y == min.y || position.y == max.y;
            self.sections.get(&position).map(|section| (section, boundary))
        });
        let mut view = MapView::build(rectangle, &self.arena, covered, Vec::new());
        for reference in references {
            view.push_reference(reference);
        }

        let mut owners = BTreeSet::new();
        owners.extend(view.cells().map(|id| self.owner_of(id)));
        owners.extend(view.corners().map(|id| self.owner_of(id)));
        owners.extend(view.edges().map(|id| self.owner_of(id)));
        for owner in owners {
            let covered = (min.x..=max.x).contains(&owner.x) && (min.y..=max.y).contains(&owner.y);
            if !covered {
                view.push_reference(self.ensure_processed(owner).acquire());
            }
        }

        debug!(self.log, "created view";
            "min_x" => rectangle.min().x, "min_y" => rectangle.min().y,
            "max_x" => rectangle.max().x, "max_y" => rectangle.max().y,
            "cells" => view.cell_count());
        view
    }

    /// A view of a rectangle inside an existing view
    ///
    /// # Panics
    ///
    /// Panics if `rectangle` is not contained in the parent's rectangle.
    pub fn sub_view_of(&mut self, parent: &MapView, rectangle: Rectanglei) -> MapView {
        assert!(
            parent.rectangle().contains_rect(&rectangle),
            "Rectangle {:?} is not contained in the parent view {:?}",
            rectangle,
            parent.rectangle()
        );
        self.get_sub_view(rectangle)
    }

    /// The rasterized chunk at chunk coordinate `(x, y)`
    ///
    /// Chunks stay cached, keeping their section alive, until
    /// [`CellMap::release_chunk`]. Chunk processors run once, when the
    /// chunk is first rasterized.
    ///
    /// # Arguments
    ///
    /// * `x`, `y` - Chunk coordinate; chunk `(x, y)` starts at block
    ///   `(x * chunk_size.x, y * chunk_size.y)`
    ///
    /// # Example
    ///
    /// ```
    /// # use rust_voronoi_map::*;
    /// # let config = MapConfigBuilder::new().seed(2).section_size(128, 128).unwrap().build().unwrap();
    /// # let mut map = CellMap::builder(config)
    /// #     .points_generator(WhiteNoisePointsGenerator::new(10..=20))
    /// #     .polygon_generator(VoronoiPolygonGenerator::new())
    /// #     .build()
    /// #     .unwrap();
    /// let id = map.get_chunk(-1, 0).cell(15, 0);
    /// assert!(map.cell(id).is_some());
    /// map.release_chunk(-1, 0);
    /// ```
    pub fn get_chunk(&mut self, x: i32, y: i32) -> &Chunk {
        let key = pack_int_pair(x, y);
        let chunk = match self.chunks.remove(&key) {
            Some(chunk) => chunk,
            None => self.rasterize_chunk(IVec2::new(x, y)),
        };
        self.chunks.entry(key).or_insert(chunk)
    }

    /// Drop a cached chunk; returns whether it was cached
    pub fn release_chunk(&mut self, x: i32, y: i32) -> bool {
        self.chunks.remove(&pack_int_pair(x, y)).is_some()
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// The cell containing block `(x, y)`, generating it if needed
    ///
    /// Looks through the cells of the block's section and its neighbors.
    /// Blocks no polygon contains (on a shared border after flooring) fall
    /// back to the cell with the closest center.
    ///
    /// # Returns
    ///
    /// The processed cell record; `None` only if the neighborhood produced
    /// no cells at all.
    pub fn cell_at(&mut self, x: i32, y: i32) -> Option<&Cell> {
        let block = IVec2::new(x, y);
        let position = SectionPosition::containing(block, self.config.section_size);
        self.ensure_processed(position);

        let point = block.as_dvec2() + DVec2::splat(0.5);
        let mut nearest: Option<(f64, CellId)> = None;
        let mut found = None;
        for id in self.neighborhood_cells(position) {
            let Some(cell) = self.arena.cell(id) else {
                continue;
            };
            if cell.polygon().contains_point(point) {
                found = Some(id);
                break;
            }
            let distance = cell.center().distance_squared(point);
            if nearest.map_or(true, |(best, _)| distance < best) {
                nearest = Some((distance, id));
            }
        }

        let id = found.or(nearest.map(|(_, id)| id))?;
        let owner = self.owner_of(id);
        self.ensure_processed(owner);
        self.arena.cell(id)
    }

    /// A generated cell record
    ///
    /// Unlike [`CellMap::cell_at`] this never generates anything, so ids of
    /// evicted or never generated sections return `None`.
    ///
    /// # Arguments
    ///
    /// * `id` - Cell id, usually taken from a view or chunk
    pub fn cell(&self, id: CellId) -> Option<&Cell> {
        self.arena.cell(id)
    }

    /// A generated corner record, see [`CellMap::cell`]
    pub fn corner(&self, id: CornerId) -> Option<&Corner> {
        self.arena.corner(id)
    }

    /// A generated edge record, see [`CellMap::cell`]
    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.arena.edge(id)
    }

    /// The cell whose center floors to the same block as `center`
    pub fn cell_by_center(&self, center: DVec2) -> Option<&Cell> {
        self.arena.cell(CellId::from_point(floor_point(center)))
    }

    /// Whether an element is currently generated
    pub fn contains(&self, element: impl Into<ElementId>) -> bool {
        self.arena.contains(element.into())
    }

    /// Drop every section nothing refers to, with the elements only they held
    ///
    /// A section is kept while it has live references, and so are its eight
    /// neighbors. Returns the number of sections dropped.
    pub fn evict_unreferenced(&mut self) -> usize {
        let keep: BTreeSet<SectionPosition> = self
            .sections
            .values()
            .filter(|section| section.reference_count() > 0)
            .flat_map(|section| section.position().neighborhood())
            .collect();

        let before = self.sections.len();
        self.sections.retain(|position, _| keep.contains(position));
        let evicted = before - self.sections.len();
        if evicted == 0 {
            return 0;
        }

        let mut cells = BTreeSet::new();
        let mut corners = BTreeSet::new();
        let mut edges = BTreeSet::new();
        for section in self.sections.values() {
            cells.extend(section.cells().iter().copied());
            corners.extend(section.corners().iter().copied());
            edges.extend(section.edges().iter().copied());
        }
        self.arena.retain(&cells, &corners, &edges);

        info!(self.log, "evicted unreferenced sections";
            "evicted" => evicted, "remaining" => self.sections.len());
        evicted
    }

    fn section_range(&self, rectangle: Rectanglei) -> (SectionPosition, SectionPosition) {
        let size = self.config.section_size;
        let max = (rectangle.max() - IVec2::ONE).max(rectangle.min());
        (
            SectionPosition::containing(rectangle.min(), size),
            SectionPosition::containing(max, size),
        )
    }

    fn neighborhood_cells(&self, position: SectionPosition) -> BTreeSet<CellId> {
        position
            .neighborhood()
            .filter_map(|neighbor| self.sections.get(&neighbor))
            .flat_map(|section| section.cells().iter().copied())
            .collect()
    }

    fn ensure_structure(&mut self, position: SectionPosition) -> &mut Section {
        let Self {
            config,
            log,
            generator,
            arena,
            sections,
            ..
        } = self;

        sections.entry(position).or_insert_with(|| {
            let polygons = generator.generate(position.x, position.y);
            let elements = build_elements(arena, &polygons, log);
            debug!(log, "built section structure";
                "x" => position.x, "y" => position.y,
                "cells" => elements.cells.len(),
                "corners" => elements.corners.len(),
                "edges" => elements.edges.len());
            Section::new(position, position.rectangle(config.section_size), elements)
        })
    }

    fn ensure_processed(&mut self, position: SectionPosition) -> &Section {
        for neighbor in position.neighborhood() {
            self.ensure_structure(neighbor);
        }
        if self.ensure_structure(position).stage() == SectionStage::Structure {
            self.process_section(position);
        }
        self.ensure_structure(position)
    }

    fn process_section(&mut self, position: SectionPosition) {
        let target = position.rectangle(self.config.section_size);
        let padded = target.expand(self.processor_padding);
        let (min, max) = self.section_range(padded);

        let covered = (min.x..=max.x)
            .flat_map(|x| (min.y..=max.y).map(move |y| SectionPosition::new(x, y)))
            .filter_map(|p| {
                let boundary = p.x == min.x || p.x == max.x || p.y == min.y || p.y == max.y;
                self.sections.get(&p).map(|section| (section, boundary))
            });
        let view = MapView::build(padded, &self.arena, covered, Vec::new());

        debug!(self.log, "processing section"; "x" => position.x, "y" => position.y,
            "cells" => view.cell_count());
        let mut scratch = Scratch::new();
        for processor in &self.processors {
            trace!(self.log, "running processor"; "processor" => processor.name());
            let mut ctx = ProcessContext::new(&mut self.arena, &view, target, self.config.seed, &mut scratch);
            processor.process(&mut ctx);
        }

        if let Some(section) = self.sections.get_mut(&position) {
            section.stage = SectionStage::Processed;
        }
        debug!(self.log, "processed section"; "x" => position.x, "y" => position.y,
            "scratch_writes" => scratch.len());
    }

    fn rasterize_chunk(&mut self, position: IVec2) -> Chunk {
        let size = self.config.chunk_size;
        let rectangle = Rectanglei::from_origin(position * size, size);
        let section = SectionPosition::containing(rectangle.min(), self.config.section_size);
        self.ensure_processed(section);

        let centers = Rectangled::new(
            rectangle.min().as_dvec2() + DVec2::splat(0.5),
            rectangle.max().as_dvec2() - DVec2::splat(0.5),
        );
        let candidates: Vec<CellId> = self
            .neighborhood_cells(section)
            .into_iter()
            .filter(|&id| {
                self.arena
                    .cell(id)
                    .map_or(false, |cell| cell.polygon().overlaps_rect(&centers))
            })
            .collect();
        for id in &candidates {
            let owner = self.owner_of(*id);
            self.ensure_processed(owner);
        }

        let polygons: Vec<(CellId, &crate::geom::Polygon)> = candidates
            .iter()
            .filter_map(|&id| self.arena.cell(id).map(|cell| (id, cell.polygon())))
            .collect();
        let data = CellBlockData::rasterize(rectangle.min(), size, &polygons);
        trace!(self.log, "rasterized chunk"; "x" => position.x, "y" => position.y,
            "cells" => data.cells().len());

        let reference = self.ensure_processed(section).acquire();
        let mut chunk = Chunk::new(position, rectangle, data, reference);
        for processor in &self.chunk_processors {
            trace!(self.log, "running chunk processor"; "processor" => processor.name());
            processor.process(&mut chunk, &self.arena);
        }
        chunk
    }
}

/// Assembles a [`CellMap`] from its generators and processors
pub struct CellMapBuilder {
    config: MapConfig,
    points: Option<Box<dyn PointsGenerator>>,
    polygons: Option<Box<dyn CellPolygonGenerator>>,
    processors: Vec<Box<dyn CellMapProcessor>>,
    chunk_processors: Vec<Box<dyn ChunkProcessor>>,
    log: Option<Logger>,
}

impl CellMapBuilder {
    pub fn new(config: MapConfig) -> Self {
        Self {
            config,
            points: None,
            polygons: None,
            processors: Vec::new(),
            chunk_processors: Vec::new(),
            log: None,
        }
    }

    pub fn points_generator(mut self, generator: impl PointsGenerator + 'static) -> Self {
        self.points = Some(Box::new(generator));
        self
    }

    pub fn polygon_generator(mut self, generator: impl CellPolygonGenerator + 'static) -> Self {
        self.polygons = Some(Box::new(generator));
        self
    }

    /// Processors run in the order they are added
    pub fn add_processor(mut self, processor: impl CellMapProcessor + 'static) -> Self {
        self.processors.push(Box::new(processor));
        self
    }

    /// Chunk processors run on every freshly rasterized chunk, in order
    pub fn add_chunk_processor(mut self, processor: impl ChunkProcessor + 'static) -> Self {
        self.chunk_processors.push(Box::new(processor));
        self
    }

    /// Log through `log` instead of discarding
    pub fn logger(mut self, log: Logger) -> Self {
        self.log = Some(log);
        self
    }

    /// # Errors
    ///
    /// Returns `MissingComponent` if no points or polygon generator was set.
    ///
    /// # Panics
    ///
    /// Panics if a processor asks for more than one section of padding.
    pub fn build(self) -> Result<CellMap> {
        let points = self.points.ok_or(MeshError::MissingComponent("points generator"))?;
        let polygons = self
            .polygons
            .ok_or(MeshError::MissingComponent("polygon generator"))?;

        let section_size = self.config.section_size;
        let offset = self
            .processors
            .iter()
            .fold(DVec2::ZERO, |offset, processor| offset.max(processor.area_offset()));
        let padding = (section_size.as_dvec2() * offset).floor().as_ivec2();
        assert!(
            padding.x <= section_size.x && padding.y <= section_size.y,
            "Requested an area that's too big: {} blocks of padding, sections are {}",
            padding,
            section_size
        );

        let log = self
            .log
            .unwrap_or_else(|| Logger::root(slog::Discard, o!()))
            .new(o!("map_seed" => self.config.seed));

        Ok(CellMap {
            generator: SectionPolygonGenerator::new(self.config.seed, section_size, points, polygons),
            config: self.config,
            log,
            processors: self.processors,
            chunk_processors: self.chunk_processors,
            processor_padding: padding,
            arena: MeshArena::new(),
            sections: HashMap::new(),
            chunks: HashMap::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapConfigBuilder;
    use crate::generation::{VoronoiPolygonGenerator, WhiteNoisePointsGenerator};
    use crate::processor::keys::{DISTANCE_TO_OCEAN, EDGE_DISTANCE, IS_OCEAN, MOISTURE};
    use crate::processor::{
        DistanceToOceanProcessor, EdgeDistanceProcessor, MoistureProcessor, OceanLandProcessor, RiverProcessor,
    };
    use crate::terrain::PerlinHeightSampler;

    fn builder(seed: u64, section: i32) -> CellMapBuilder {
        let config = MapConfigBuilder::new()
            .seed(seed)
            .section_size(section, section)
            .unwrap()
            .build()
            .unwrap();
        CellMap::builder(config)
            .points_generator(WhiteNoisePointsGenerator::new(40..=50))
            .polygon_generator(VoronoiPolygonGenerator::new())
    }

    fn map_with_terrain(seed: u64) -> CellMap {
        builder(seed, 512)
            .add_processor(OceanLandProcessor::new(PerlinHeightSampler::new(seed)))
            .add_processor(DistanceToOceanProcessor::default())
            .add_processor(MoistureProcessor::new())
            .build()
            .unwrap()
    }

    #[test]
    fn test_missing_generators() {
        let config = MapConfigBuilder::new().seed(1).build().unwrap();
        assert_eq!(
            CellMap::builder(config).build().err(),
            Some(MeshError::MissingComponent("points generator"))
        );
        let only_points = CellMap::builder(config).points_generator(WhiteNoisePointsGenerator::new(1..=2));
        assert_eq!(
            only_points.build().err(),
            Some(MeshError::MissingComponent("polygon generator"))
        );
    }

    #[test]
    #[should_panic(expected = "Requested an area that's too big")]
    fn test_padding_beyond_neighbors_panics() {
        let _ = builder(1, 512)
            .add_processor(OceanLandProcessor::new(|_x: f64, _y: f64| 0.0).with_area_offset(DVec2::splat(1.5)))
            .build();
    }

    #[test]
    fn test_processor_padding_uses_largest_offset() {
        let map = map_with_terrain(1);
        assert_eq!(map.processor_padding(), IVec2::splat(153));
    }

    #[test]
    fn test_boundary_cell_is_shared_between_sections() {
        let mut map = builder(42, 512).build().unwrap();
        let left = map.get_section(SectionPosition::new(0, 0));
        let right = map.get_section(SectionPosition::new(1, 0));

        let left_cells: BTreeSet<CellId> = map.section(left.position()).unwrap().cells().iter().copied().collect();
        let right_cells: BTreeSet<CellId> = map.section(right.position()).unwrap().cells().iter().copied().collect();
        let shared: Vec<CellId> = left_cells.intersection(&right_cells).copied().collect();
        assert!(!shared.is_empty());

        let mut view = map.get_sub_view(Rectanglei::new(IVec2::ZERO, IVec2::new(1024, 512)));
        for id in &shared {
            assert_eq!(view.cells().filter(|c| c == id).count(), 1);
            let cell = map.cell(*id).unwrap();
            assert!(cell.polygon().vertices().iter().any(|v| v.x <= 512.0));
            assert!(cell.polygon().vertices().iter().any(|v| v.x >= 512.0));
        }
        view.release();
    }

    #[test]
    fn test_adjacency_is_symmetric() {
        let mut map = builder(3, 256).build().unwrap();
        let _view = map.get_sub_view(Rectanglei::new(IVec2::new(-300, -300), IVec2::new(300, 300)));
        let arena = map.arena();
        assert!(arena.cell_count() > 0);

        for cell in arena.cells.values() {
            for neighbor in cell.neighbors() {
                if let Some(other) = arena.cell(neighbor) {
                    assert!(other.is_neighbor(cell.id()));
                }
            }
            for edge in cell.edges() {
                assert!(arena.edge(edge).unwrap().cells.contains(&cell.id()));
            }
        }
        for corner in arena.corners.values() {
            for neighbor in corner.neighbors() {
                assert!(arena.corner(neighbor).unwrap().neighbors.contains(&corner.id()));
                // every corner link is backed by an edge
                assert!(corner.edges().any(|e| arena.edge(e).unwrap().corners.contains(&neighbor)));
            }
        }
        for edge in arena.edges.values() {
            assert_eq!(edge.corners.len(), 2);
            assert!((1..=2).contains(&edge.cells.len()));
        }
    }

    #[test]
    fn test_dense_sections_link_corners_through_edges() {
        for seed in 0..5 {
            let config = MapConfigBuilder::new()
                .seed(seed)
                .section_size(256, 256)
                .unwrap()
                .build()
                .unwrap();
            let mut map = CellMap::builder(config)
                .points_generator(WhiteNoisePointsGenerator::new(150..=200))
                .polygon_generator(VoronoiPolygonGenerator::new())
                .build()
                .unwrap();
            let _view = map.get_sub_view(Rectanglei::new(IVec2::splat(-256), IVec2::splat(512)));

            let arena = map.arena();
            for corner in arena.corners.values() {
                for neighbor in corner.neighbors() {
                    assert!(
                        corner.edges().any(|e| arena.edge(e).unwrap().corners.contains(&neighbor)),
                        "seed {} corner {} linked to {} without an edge",
                        seed,
                        corner.point(),
                        neighbor.point()
                    );
                }
            }
        }
    }

    #[test]
    fn test_overlapping_views_share_references() {
        let mut map = builder(11, 256).build().unwrap();
        let mut a = map.get_sub_view(Rectanglei::new(IVec2::ZERO, IVec2::new(500, 200)));
        let mut b = map.get_sub_view(Rectanglei::new(IVec2::new(300, 0), IVec2::new(700, 200)));

        let shared = SectionPosition::new(1, 0);
        let count = |map: &CellMap| map.section(shared).unwrap().reference_count();
        assert_eq!(count(&map), 2);

        a.release();
        assert_eq!(count(&map), 1);
        a.release();
        assert_eq!(count(&map), 1);

        b.release();
        for section in map.sections.values() {
            assert_eq!(section.reference_count(), 0);
        }
    }

    #[test]
    fn test_sub_view_of_parent() {
        let mut map = builder(5, 256).build().unwrap();
        let parent = map.get_sub_view(Rectanglei::new(IVec2::ZERO, IVec2::new(256, 256)));
        let child = map.sub_view_of(&parent, Rectanglei::new(IVec2::new(10, 10), IVec2::new(100, 100)));
        assert!(child.cells().all(|id| parent.contains(id)));
    }

    #[test]
    #[should_panic(expected = "is not contained in the parent view")]
    fn test_sub_view_outside_parent_panics() {
        let mut map = builder(5, 256).build().unwrap();
        let parent = map.get_sub_view(Rectanglei::new(IVec2::ZERO, IVec2::new(100, 100)));
        map.sub_view_of(&parent, Rectanglei::new(IVec2::new(50, 50), IVec2::new(150, 80)));
    }

    #[test]
    fn test_eviction_regenerates_identically() {
        let mut map = map_with_terrain(42);
        let position = SectionPosition::new(0, 0);

        let snapshot = |map: &mut CellMap| {
            let reference = map.get_section(position);
            let section = map.section(reference.position()).unwrap();
            let cells: Vec<(CellId, Vec<DVec2>, Vec<CellId>, Option<bool>, Option<i32>)> = section
                .cells()
                .iter()
                .map(|&id| {
                    let cell = map.cell(id).unwrap();
                    (
                        id,
                        cell.polygon().vertices().to_vec(),
                        cell.neighbors().collect(),
                        cell.get(&IS_OCEAN).copied(),
                        cell.get(&DISTANCE_TO_OCEAN).copied(),
                    )
                })
                .collect();
            let corners = section.corners().to_vec();
            let edges = section.edges().to_vec();
            (cells, corners, edges)
        };

        let first = snapshot(&mut map);
        assert_eq!(map.evict_unreferenced(), 9);
        assert_eq!(map.section_count(), 0);
        assert_eq!(map.arena().cell_count(), 0);

        let second = snapshot(&mut map);
        assert_eq!(first, second);
    }

    #[test]
    fn test_referenced_sections_survive_eviction() {
        let mut map = builder(8, 256).build().unwrap();
        let kept = map.get_section(SectionPosition::new(0, 0));
        let far = map.get_section(SectionPosition::new(5, 5));
        drop(far);

        assert_eq!(map.evict_unreferenced(), 9);
        assert_eq!(map.section_count(), 9);
        let section = map.section(kept.position()).unwrap();
        assert!(section.cells().iter().all(|&id| map.cell(id).is_some()));
        assert_eq!(map.evict_unreferenced(), 0);
    }

    #[test]
    fn test_reprocessing_keeps_owned_attributes() {
        let mut map = map_with_terrain(42);
        let position = SectionPosition::new(0, 0);
        let _reference = map.get_section(position);

        let owned = |map: &CellMap| -> Vec<(CellId, bool, i32, f64)> {
            map.section(position)
                .unwrap()
                .cells()
                .iter()
                .filter(|&&id| map.owner_of(id) == position)
                .map(|&id| {
                    let cell = map.cell(id).unwrap();
                    (
                        id,
                        *cell.data().require(&IS_OCEAN),
                        *cell.data().require(&DISTANCE_TO_OCEAN),
                        *cell.data().require(&MOISTURE),
                    )
                })
                .collect()
        };

        let before = owned(&map);
        assert!(!before.is_empty());
        map.process_section(position);
        assert_eq!(owned(&map), before);
    }

    #[test]
    fn test_writes_stay_inside_owner() {
        let mut map = map_with_terrain(42);
        let _reference = map.get_section(SectionPosition::new(0, 0));
        // neighbors were only built structurally
        let neighbor = map.section(SectionPosition::new(1, 0)).unwrap();
        assert_eq!(neighbor.stage(), SectionStage::Structure);
        for &id in neighbor.cells() {
            if map.owner_of(id) == SectionPosition::new(1, 0) {
                assert!(map.cell(id).unwrap().data().is_empty());
            }
        }
    }

    #[test]
    fn test_full_pipeline_through_view() {
        let mut map = builder(42, 256)
            .add_processor(OceanLandProcessor::new(PerlinHeightSampler::new(42).with_sea_level_bias(0.05)))
            .add_processor(DistanceToOceanProcessor::default())
            .add_processor(RiverProcessor::new().with_length(3..=6))
            .add_processor(MoistureProcessor::new())
            .build()
            .unwrap();

        let view = map.get_sub_view(Rectanglei::new(IVec2::ZERO, IVec2::new(256, 256)));
        for id in view.cells() {
            let cell = map.cell(id).unwrap();
            let moisture = *cell.data().require(&MOISTURE);
            assert!((0.0..=1.0).contains(&moisture));
            let distance = *cell.data().require(&DISTANCE_TO_OCEAN);
            assert!(distance.abs() <= 5);
        }
        for id in view.corners() {
            let distance = map.corner(id).unwrap().get(&DISTANCE_TO_OCEAN);
            assert!(distance.map_or(false, |d| d.abs() <= 8));
        }
    }

    #[test]
    fn test_chunk_lookup_matches_polygons() {
        let mut map = builder(42, 128).build().unwrap();
        let (x, y) = (3, -2);
        let chunk = map.get_chunk(x, y);
        assert_eq!(chunk.position(), IVec2::new(x, y));
        assert_eq!(chunk.section(), SectionPosition::new(0, -1));
        let origin = chunk.rectangle().min();
        let ids: Vec<(IVec2, CellId)> = (0..16)
            .flat_map(|lx| (0..16).map(move |ly| (lx, ly)))
            .map(|(lx, ly)| (origin + IVec2::new(lx, ly), chunk.cell(lx, ly)))
            .collect();

        for (block, id) in ids {
            assert!(map.cell(id).unwrap().contains_block(block.x, block.y));
        }

        assert_eq!(map.section(SectionPosition::new(0, -1)).unwrap().reference_count(), 1);
        assert!(map.release_chunk(x, y));
        assert!(!map.release_chunk(x, y));
        assert_eq!(map.section(SectionPosition::new(0, -1)).unwrap().reference_count(), 0);
    }

    #[test]
    fn test_chunk_processors_fill_chunk_attributes() {
        let mut map = builder(42, 128)
            .add_chunk_processor(EdgeDistanceProcessor::new().with_max_distance(4))
            .build()
            .unwrap();
        let (x, y) = (2, 5);
        let chunk = map.get_chunk(x, y);
        let origin = chunk.rectangle().min();
        let data = chunk.get(&EDGE_DISTANCE).expect("edge distances").clone();
        let blocks: Vec<(IVec2, CellId)> = (0..16)
            .flat_map(|lx| (0..16).map(move |ly| (lx, ly)))
            .map(|(lx, ly)| (IVec2::new(lx, ly), chunk.cell(lx, ly)))
            .collect();

        let mut covered = 0;
        for (local, id) in blocks {
            if let Some((edge, distance)) = data.get(local.x, local.y) {
                covered += 1;
                assert!(distance <= 4);
                assert!(map.cell(id).unwrap().edges().any(|e| e == edge), "block {}", origin + local);
            }
        }
        assert_eq!(covered, data.covered());

        // cached chunks are not processed again
        assert!(map.get_chunk(x, y).get(&EDGE_DISTANCE).is_some());
        assert_eq!(map.chunk_count(), 1);
    }

    #[test]
    fn test_cell_at_contains_block() {
        let mut map = map_with_terrain(9);
        for (x, y) in [(0, 0), (511, 3), (-40, 700), (1000, -1000)] {
            let cell = map.cell_at(x, y).expect("cell");
            assert!(cell.contains_block(x, y));
            assert!(cell.get(&IS_OCEAN).is_some());
        }
        assert!(map.cell_by_center(DVec2::new(1.0e9, 1.0e9)).is_none());
    }

    #[test]
    fn test_map_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CellMap>();
        assert_send_sync::<MapView>();
        assert_send_sync::<SectionReference>();
    }
}
