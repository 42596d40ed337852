//! Continuous 2D fields sampled by processors
//!
//! Heights, moisture noise and similar inputs are plain functions of a world
//! position. Anything implementing [`Sampler2`] can be handed to a processor,
//! including closures.

mod perlin;

pub use perlin::{perlin_3d, sample_perlin_fbm, PerlinConfig};

use glam::DVec3;

/// A pure function of a world position
pub trait Sampler2: Send + Sync {
    fn sample(&self, x: f64, y: f64) -> f64;
}

impl<F> Sampler2 for F
where
    F: Fn(f64, f64) -> f64 + Send + Sync,
{
    fn sample(&self, x: f64, y: f64) -> f64 {
        self(x, y)
    }
}

/// The same value everywhere
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantSampler(pub f64);

impl Sampler2 for ConstantSampler {
    fn sample(&self, _x: f64, _y: f64) -> f64 {
        self.0
    }
}

/// Perlin fBm height field, negative below sea level
///
/// Samples the plane `z = 0.5` of 3D noise, so the lattice never lines up
/// with the sampled plane.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PerlinHeightSampler {
    pub seed: u64,
    pub config: PerlinConfig,
    /// Added to the noise; positive values raise land out of the sea
    pub sea_level_bias: f64,
}

impl PerlinHeightSampler {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            config: PerlinConfig::default(),
            sea_level_bias: 0.0,
        }
    }

    pub fn with_config(mut self, config: PerlinConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_sea_level_bias(mut self, bias: f64) -> Self {
        self.sea_level_bias = bias;
        self
    }
}

impl Sampler2 for PerlinHeightSampler {
    fn sample(&self, x: f64, y: f64) -> f64 {
        sample_perlin_fbm(DVec3::new(x, y, 0.5), self.seed, &self.config) + self.sea_level_bias
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_sampler() {
        let ramp = |x: f64, _y: f64| x * 2.0;
        let sampler: Box<dyn Sampler2> = Box::new(ramp);
        assert_eq!(sampler.sample(1.5, 9.0), 3.0);
        assert_eq!(ConstantSampler(0.25).sample(-4.0, 4.0), 0.25);
    }

    #[test]
    fn test_height_is_deterministic() {
        let a = PerlinHeightSampler::new(42);
        let b = PerlinHeightSampler::new(42);
        for i in 0..50 {
            let (x, y) = (i as f64 * 13.7, i as f64 * -4.2);
            assert_eq!(a.sample(x, y), b.sample(x, y));
        }
    }

    #[test]
    fn test_sea_level_bias_shifts_height() {
        let sampler = PerlinHeightSampler::new(3);
        let raised = sampler.with_sea_level_bias(0.5);
        let (x, y) = (120.3, 77.1);
        assert!((raised.sample(x, y) - sampler.sample(x, y) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_height_has_land_and_sea() {
        let sampler = PerlinHeightSampler::new(42);
        let heights: Vec<f64> = (0..40)
            .flat_map(|x| (0..40).map(move |y| (x, y)))
            .map(|(x, y)| sampler.sample(x as f64 * 64.0, y as f64 * 64.0))
            .collect();
        assert!(heights.iter().any(|&h| h < 0.0));
        assert!(heights.iter().any(|&h| h > 0.0));
    }
}
