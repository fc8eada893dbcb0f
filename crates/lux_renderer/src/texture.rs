//! Textures: spatially varying colors sampled at a hit point.

use std::sync::Arc;

use crate::sampling::gen_f32;
use lux_core::{ImageData, TextureFilter};
use lux_math::{Color, Vec3};
use rand::seq::SliceRandom;
use rand::RngCore;

/// Number of lattice values in a Perlin table.
const PERLIN_SIZE: usize = 256;

/// Octaves summed by [`Perlin::turbulence`].
const TURBULENCE_DEPTH: usize = 8;

/// A texture, evaluated by [`Texture::value`].
#[derive(Debug, Clone)]
pub enum Texture {
    /// Constant color.
    Solid(Color),

    /// 3D checkerboard alternating between two child textures.
    Checker {
        odd: Arc<Texture>,
        even: Arc<Texture>,
        scale: f32,
    },

    /// Marble veins from Perlin noise plus turbulence, blended between two
    /// colors.
    Marble {
        noise: Arc<Perlin>,
        scale: f32,
        color1: Color,
        color2: Color,
    },

    /// Decoded image looked up by surface UV.
    Image {
        image: Arc<ImageData>,
        filter: TextureFilter,
    },
}

impl Texture {
    /// Color at surface coordinates `(u, v)` and world point `p`.
    pub fn value(&self, u: f32, v: f32, p: Vec3) -> Color {
        match self {
            Texture::Solid(color) => *color,

            Texture::Checker { odd, even, scale } => {
                let sines = (scale * p.x).sin() * (scale * p.y).sin() * (scale * p.z).sin();
                if sines < 0.0 {
                    odd.value(u, v, p)
                } else {
                    even.value(u, v, p)
                }
            }

            Texture::Marble {
                noise,
                scale,
                color1,
                color2,
            } => {
                let phase = 5.0 * (scale * noise.noise(p) + 4.0 * noise.turbulence(p));
                let n = phase.sin() * 0.5 + 0.5;
                *color1 * n + *color2 * (1.0 - n)
            }

            Texture::Image { image, filter } => image.sample(u, v, *filter),
        }
    }
}

/// Lattice noise table: random scalars hashed through three independent
/// permutations.
///
/// Built once per scene and shared read-only.
#[derive(Debug, Clone)]
pub struct Perlin {
    values: Vec<f32>,
    perm_x: Vec<usize>,
    perm_y: Vec<usize>,
    perm_z: Vec<usize>,
}

impl Perlin {
    pub fn new(rng: &mut dyn RngCore) -> Self {
        let values = (0..PERLIN_SIZE).map(|_| gen_f32(rng)).collect();

        Self {
            values,
            perm_x: permutation(rng),
            perm_y: permutation(rng),
            perm_z: permutation(rng),
        }
    }

    /// Trilinearly interpolated lattice noise in `[0, 1)`.
    pub fn noise(&self, p: Vec3) -> f32 {
        let base = p.floor();
        let frac = p - base;
        let (i, j, k) = (base.x as i64, base.y as i64, base.z as i64);

        let mut accum = 0.0;
        for a in 0..2i64 {
            for b in 0..2i64 {
                for c in 0..2i64 {
                    let wx = if a == 1 { frac.x } else { 1.0 - frac.x };
                    let wy = if b == 1 { frac.y } else { 1.0 - frac.y };
                    let wz = if c == 1 { frac.z } else { 1.0 - frac.z };

                    accum += wx * wy * wz * self.lattice(i + a, j + b, k + c);
                }
            }
        }
        accum
    }

    /// Sum of octaves of [`Perlin::noise`], frequency doubling and weight
    /// halving per octave.
    pub fn turbulence(&self, p: Vec3) -> f32 {
        let mut accum = 0.0;
        let mut point = p;
        let mut weight = 1.0;

        for _ in 0..TURBULENCE_DEPTH {
            accum += weight * self.noise(point);
            weight *= 0.5;
            point *= 2.0;
        }
        accum
    }

    fn lattice(&self, i: i64, j: i64, k: i64) -> f32 {
        let mask = PERLIN_SIZE as i64 - 1;
        let index = self.perm_x[(i & mask) as usize]
            ^ self.perm_y[(j & mask) as usize]
            ^ self.perm_z[(k & mask) as usize];
        self.values[index]
    }
}

fn permutation(rng: &mut dyn RngCore) -> Vec<usize> {
    let mut perm: Vec<usize> = (0..PERLIN_SIZE).collect();
    perm.shuffle(rng);
    perm
}
