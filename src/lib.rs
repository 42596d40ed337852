//! Incrementally generated Voronoi cell maps
//!
//! An unbounded plane is split into sections. Each section is filled with
//! Voronoi cells on first use, linked to the cells of its neighbors, and run
//! through a pipeline of processors that attach typed attributes (ocean,
//! distance to the coast, rivers, moisture, ...). Sections stay cached while
//! views or chunks refer to them and are regenerated identically after
//! eviction.
//!
//! # Quick Start
//!
//! ```rust
//! use rust_voronoi_map::*;
//! use glam::IVec2;
//!
//! let config = MapConfigBuilder::new()
//!     .seed(42)
//!     .section_size(256, 256).unwrap()
//!     .build().unwrap();
//!
//! let mut map = CellMap::builder(config)
//!     .points_generator(WhiteNoisePointsGenerator::new(30..=40))
//!     .polygon_generator(VoronoiPolygonGenerator::new())
//!     .add_processor(OceanLandProcessor::new(PerlinHeightSampler::new(42)))
//!     .add_processor(DistanceToOceanProcessor::default())
//!     .build()
//!     .unwrap();
//!
//! let view = map.get_sub_view(Rectanglei::new(IVec2::ZERO, IVec2::new(200, 200)));
//! let coast = view
//!     .cells()
//!     .filter(|&id| map.cell(id).and_then(|c| c.get(&keys::DISTANCE_TO_OCEAN)) == Some(&1))
//!     .count();
//! println!("{} of {} cells are on the coast", coast, view.cell_count());
//!
//! let chunk = map.get_chunk(0, 0);
//! let _cell = chunk.cell(3, 7);
//! ```
//!
//! # Features
//!
//! - `serde`: Enables serialization support for [`MapConfig`]

// Modules
pub mod config;
pub mod error;
pub mod generation;
pub mod geom;
pub mod map;
pub mod processor;
pub mod spatial;
pub mod terrain;

// Re-export core types for convenience
pub use config::{MapConfig, MapConfigBuilder};
pub use error::{MeshError, Result};
pub use generation::{
    CellPolygon, CellPolygonGenerator, JitteredGridPointsGenerator, PointsGenerator, SectionPolygonGenerator,
    TriangleCenter, VoronoiPolygonGenerator, WhiteNoisePointsGenerator,
};
pub use geom::{Line2d, Line2i, Polygon, Rectangled, Rectanglei, Shape, Triangle};
pub use map::{
    Cell, CellBlockData, CellId, CellMap, CellMapBuilder, Chunk, Corner, CornerId, DataKey, DataStore, Edge, EdgeId,
    ElementId, MapView, MeshArena, Section, SectionPosition, SectionReference, SectionStage,
};
pub use processor::{
    keys, CellMapProcessor, ChunkProcessor, DistanceToOceanProcessor, EdgeDistanceData, EdgeDistanceProcessor,
    MoistureProcessor, OceanLandProcessor, ProcessContext, RiverProcessor,
};
pub use spatial::SpatialIndex;
pub use terrain::{ConstantSampler, PerlinConfig, PerlinHeightSampler, Sampler2};

// Re-export glam vectors for convenience
pub use glam::{DVec2, IVec2};
