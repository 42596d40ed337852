//! Seeded 3D Perlin noise
//!
//! Uses the standard Ken Perlin permutation table, salted by a seed.

use glam::DVec3;

/// Configuration for fractal Perlin noise
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PerlinConfig {
    /// Frequency of the first octave, in cycles per block
    pub base_frequency: f64,
    pub octaves: usize,
    /// Amplitude decay per octave
    pub persistence: f64,
    /// Frequency multiplier per octave
    pub lacunarity: f64,
}

impl Default for PerlinConfig {
    fn default() -> Self {
        Self {
            base_frequency: 1.0 / 256.0,
            octaves: 5,
            persistence: 0.5,
            lacunarity: 2.0,
        }
    }
}

// Must stay unchanged, terrain depends on it.
const PERM: [u32; 256] = [
    151, 160, 137, 91, 90, 15, 131, 13, 201, 95, 96, 53, 194, 233, 7, 225, 140, 36, 103, 30, 69,
    142, 8, 99, 37, 240, 21, 10, 23, 190, 6, 148, 247, 120, 234, 75, 0, 26, 197, 62, 94, 252, 219,
    203, 117, 35, 11, 32, 57, 177, 33, 88, 237, 149, 56, 87, 174, 20, 125, 136, 171, 168, 68, 175,
    74, 165, 71, 134, 139, 48, 27, 166, 77, 146, 158, 231, 83, 111, 229, 122, 60, 211, 133, 230,
    220, 105, 92, 41, 55, 46, 245, 40, 244, 102, 143, 54, 65, 25, 63, 161, 1, 216, 80, 73, 209, 76,
    132, 187, 208, 89, 18, 169, 200, 196, 135, 130, 116, 188, 159, 86, 164, 100, 109, 198, 173,
    186, 3, 64, 52, 217, 226, 250, 124, 123, 5, 202, 38, 147, 118, 126, 255, 82, 85, 212, 207, 206,
    59, 227, 47, 16, 58, 17, 182, 189, 28, 42, 223, 183, 170, 213, 119, 248, 152, 2, 44, 154, 163,
    70, 221, 153, 101, 155, 167, 43, 172, 9, 129, 22, 39, 253, 19, 98, 108, 110, 79, 113, 224, 232,
    178, 185, 112, 104, 218, 246, 97, 228, 251, 34, 242, 193, 238, 210, 144, 12, 191, 179, 162,
    241, 81, 51, 145, 235, 249, 14, 239, 107, 49, 192, 214, 31, 181, 199, 106, 157, 184, 84, 204,
    176, 115, 121, 50, 45, 127, 4, 150, 254, 138, 236, 205, 93, 222, 114, 67, 29, 24, 72, 243, 141,
    128, 195, 78, 66, 215, 61, 156, 180,
];

/// Permutation lookup of a lattice point, salted with the seed
#[inline]
fn hash(x: i64, y: i64, z: i64, seed: u64) -> u32 {
    let salt = seed.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1_442_695_040_888_963_407) >> 33;
    let ix = ((x as u64) ^ salt) & 255;
    let iy = ((y as u64) ^ (salt >> 8)) & 255;
    let iz = ((z as u64) ^ (salt >> 16)) & 255;
    let a = PERM[ix as usize] as u64;
    let b = PERM[((a + iy) & 255) as usize] as u64;
    PERM[((b + iz) & 255) as usize]
}

/// Dot product with one of the 12 cube edge directions
#[inline]
fn gradient(hash: u32, x: f64, y: f64, z: f64) -> f64 {
    let h = hash & 15;
    let u = if h < 8 { x } else { y };
    let v = if h < 4 {
        y
    } else if h == 12 || h == 14 {
        x
    } else {
        z
    };
    let u = if h & 1 == 0 { u } else { -u };
    let v = if h & 2 == 0 { v } else { -v };
    u + v
}

/// 6t⁵ - 15t⁴ + 10t³
#[inline]
fn fade(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

#[inline]
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + t * (b - a)
}

/// Raw Perlin noise in roughly `[-1, 1]`
pub fn perlin_3d(position: DVec3, seed: u64) -> f64 {
    let floor = position.floor();
    let (x0, y0, z0) = (floor.x as i64, floor.y as i64, floor.z as i64);
    let f = position - floor;
    let (u, v, w) = (fade(f.x), fade(f.y), fade(f.z));

    let corner = |dx: i64, dy: i64, dz: i64| {
        gradient(
            hash(x0 + dx, y0 + dy, z0 + dz, seed),
            f.x - dx as f64,
            f.y - dy as f64,
            f.z - dz as f64,
        )
    };

    let x00 = lerp(corner(0, 0, 0), corner(1, 0, 0), u);
    let x10 = lerp(corner(0, 1, 0), corner(1, 1, 0), u);
    let x01 = lerp(corner(0, 0, 1), corner(1, 0, 1), u);
    let x11 = lerp(corner(0, 1, 1), corner(1, 1, 1), u);
    lerp(lerp(x00, x10, v), lerp(x01, x11, v), w)
}

/// Fractal Brownian motion over [`perlin_3d`], normalized to roughly `[-1, 1]`
pub fn sample_perlin_fbm(position: DVec3, seed: u64, config: &PerlinConfig) -> f64 {
    let mut total = 0.0;
    let mut amplitude = 1.0;
    let mut frequency = config.base_frequency;
    let mut max_value = 0.0;

    for octave in 0..config.octaves {
        // shift every octave so lattice points don't line up
        let salt = seed.wrapping_add(octave as u64);
        total += perlin_3d(position * frequency, salt) * amplitude;
        max_value += amplitude;
        amplitude *= config.persistence;
        frequency *= config.lacunarity;
    }

    if max_value == 0.0 {
        0.0
    } else {
        total / max_value
    }
}
