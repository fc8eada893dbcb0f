//! Random sampling helpers.
//!
//! Every function takes the generator explicitly so that each render row
//! owns an independent, reproducible stream.

use lux_math::Vec3;
use rand::{Rng, RngCore};

/// Uniform sample in `[0, 1)`.
#[inline]
pub fn gen_f32(rng: &mut dyn RngCore) -> f32 {
    rng.gen::<f32>()
}

/// Uniform point strictly inside the unit ball.
///
/// Rejection sampled; a tiny neighborhood of the origin is rejected too so
/// the result can always be normalized.
pub fn random_in_unit_sphere(rng: &mut dyn RngCore) -> Vec3 {
    loop {
        let p = Vec3::new(
            gen_f32(rng) * 2.0 - 1.0,
            gen_f32(rng) * 2.0 - 1.0,
            gen_f32(rng) * 2.0 - 1.0,
        );
        let len_sq = p.length_squared();
        if len_sq < 1.0 && len_sq > 1e-12 {
            return p;
        }
    }
}

/// Uniform point inside the unit disk in the XY plane.
pub fn random_in_unit_disk(rng: &mut dyn RngCore) -> Vec3 {
    loop {
        let p = Vec3::new(gen_f32(rng) * 2.0 - 1.0, gen_f32(rng) * 2.0 - 1.0, 0.0);
        if p.length_squared() < 1.0 {
            return p;
        }
    }
}

/// Offset in `[-1, 1)` drawn from a tent distribution centered on zero.
#[inline]
pub fn tent(rng: &mut dyn RngCore) -> f32 {
    let r = 2.0 * gen_f32(rng);
    if r < 1.0 {
        r.sqrt() - 1.0
    } else {
        1.0 - (2.0 - r).sqrt()
    }
}
