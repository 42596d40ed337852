//! Cell map configuration and builder
//!
//! The configuration is small and serializable. A map is never persisted
//! directly: the same configuration always regenerates the identical map.

use glam::IVec2;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{MeshError, Result};

/// Default section edge length in blocks
pub const DEFAULT_SECTION_SIZE: i32 = 512;

/// Default chunk edge length in blocks
pub const DEFAULT_CHUNK_SIZE: i32 = 16;

/// Configuration for deterministic cell map generation
///
/// # Example
///
/// ```rust
/// use rust_voronoi_map::*;
///
/// let config = MapConfigBuilder::new()
///     .seed(42)
///     .build()
///     .unwrap();
///
/// # #[cfg(feature = "serde")]
/// # {
/// let json = serde_json::to_string(&config).unwrap();
/// let restored: MapConfig = serde_json::from_str(&json).unwrap();
/// assert_eq!(config, restored);
/// # }
/// ```
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapConfig {
    /// World seed
    ///
    /// Every per-section random stream is derived from this value, so the
    /// same seed (with the same sizes) produces the same cells everywhere.
    pub seed: u64,

    /// Size of one generation/caching section in blocks
    pub section_size: IVec2,

    /// Size of one rasterized chunk in blocks
    ///
    /// Always divides `section_size`, so a chunk never spans two sections.
    pub chunk_size: IVec2,
}

impl MapConfig {
    /// Number of chunks along each axis of a section
    #[inline]
    pub fn chunks_per_section(&self) -> IVec2 {
        self.section_size / self.chunk_size
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            seed: rand::random(),
            section_size: IVec2::splat(DEFAULT_SECTION_SIZE),
            chunk_size: IVec2::splat(DEFAULT_CHUNK_SIZE),
        }
    }
}

/// Builder for creating MapConfig with validation
///
/// # Example
///
/// ```rust
/// use rust_voronoi_map::*;
///
/// let config = MapConfigBuilder::new()
///     .seed(7)
///     .section_size(256, 256)
///     .unwrap()
///     .chunk_size(32, 32)
///     .unwrap()
///     .build()
///     .unwrap();
/// assert_eq!(config.chunks_per_section(), glam::IVec2::new(8, 8));
/// ```
#[derive(Debug, Clone)]
pub struct MapConfigBuilder {
    seed: Option<u64>,
    section_size: IVec2,
    chunk_size: IVec2,
}

impl MapConfigBuilder {
    /// Create a new builder with default values
    ///
    /// Defaults:
    /// - seed: Random
    /// - section_size: 512×512
    /// - chunk_size: 16×16
    pub fn new() -> Self {
        Self {
            seed: None,
            section_size: IVec2::splat(DEFAULT_SECTION_SIZE),
            chunk_size: IVec2::splat(DEFAULT_CHUNK_SIZE),
        }
    }

    /// Set the world seed
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the section size in blocks
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if either dimension is not positive
    pub fn section_size(mut self, x: i32, y: i32) -> Result<Self> {
        if x <= 0 || y <= 0 {
            return Err(MeshError::InvalidConfig(format!(
                "section size must be positive (got {}x{})",
                x, y
            )));
        }
        self.section_size = IVec2::new(x, y);
        Ok(self)
    }

    /// Set the chunk size in blocks
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if either dimension is not positive
    pub fn chunk_size(mut self, x: i32, y: i32) -> Result<Self> {
        if x <= 0 || y <= 0 {
            return Err(MeshError::InvalidConfig(format!(
                "chunk size must be positive (got {}x{})",
                x, y
            )));
        }
        self.chunk_size = IVec2::new(x, y);
        Ok(self)
    }

    /// Build the configuration
    ///
    /// If no seed was provided, a random one is drawn.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the section size is not a multiple of the
    /// chunk size.
    pub fn build(self) -> Result<MapConfig> {
        if self.section_size.x % self.chunk_size.x != 0
            || self.section_size.y % self.chunk_size.y != 0
        {
            return Err(MeshError::InvalidConfig(format!(
                "section size {}x{} is not a multiple of chunk size {}x{}",
                self.section_size.x, self.section_size.y, self.chunk_size.x, self.chunk_size.y
            )));
        }

        Ok(MapConfig {
            seed: self.seed.unwrap_or_else(rand::random),
            section_size: self.section_size,
            chunk_size: self.chunk_size,
        })
    }
}

impl Default for MapConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = MapConfigBuilder::new().seed(1).build().unwrap();
        assert_eq!(config.section_size, IVec2::splat(512));
        assert_eq!(config.chunk_size, IVec2::splat(16));
        assert_eq!(config.chunks_per_section(), IVec2::splat(32));
    }

    #[test]
    fn test_builder_custom() {
        let config = MapConfigBuilder::new()
            .seed(42)
            .section_size(128, 64)
            .unwrap()
            .chunk_size(8, 16)
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(config.seed, 42);
        assert_eq!(config.section_size, IVec2::new(128, 64));
        assert_eq!(config.chunks_per_section(), IVec2::new(16, 4));
    }

    #[test]
    fn test_builder_rejects_non_positive_sizes() {
        assert!(MapConfigBuilder::new().section_size(0, 512).is_err());
        assert!(MapConfigBuilder::new().chunk_size(16, -1).is_err());
    }

    #[test]
    fn test_builder_rejects_misaligned_chunks() {
        let result = MapConfigBuilder::new()
            .section_size(100, 100)
            .unwrap()
            .chunk_size(16, 16)
            .unwrap()
            .build();
        assert!(matches!(result, Err(MeshError::InvalidConfig(_))));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_config_serialization() {
        let config = MapConfigBuilder::new().seed(12345).build().unwrap();

        let json = serde_json::to_string(&config).unwrap();
        let restored: MapConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(config, restored);
    }
}
