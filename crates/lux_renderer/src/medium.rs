//! Constant-density participating medium.

use std::sync::Arc;

use crate::{
    gen_f32,
    hittable::{HitRecord, Hittable},
    Isotropic, Material, Texture,
};
use lux_math::{Aabb, Color, Interval, Ray, Vec3};
use rand::RngCore;

/// Fog of uniform density filling a closed boundary.
///
/// A ray passing through the volume scatters at an exponentially
/// distributed free-path distance, or passes through if that distance is
/// longer than its path inside the boundary.
pub struct ConstantMedium {
    boundary: Arc<dyn Hittable>,
    neg_inv_density: f32,
    phase: Isotropic,
}

impl ConstantMedium {
    pub fn new(boundary: Arc<dyn Hittable>, density: f32, color: Color) -> Self {
        Self {
            boundary,
            neg_inv_density: -1.0 / density,
            phase: Isotropic::new(Arc::new(Texture::Solid(color))),
        }
    }
}

impl Hittable for ConstantMedium {
    fn hit(&self, ray: &Ray, ray_t: Interval, rng: &mut dyn RngCore) -> Option<HitRecord<'_>> {
        let entry = self.boundary.hit(ray, Interval::UNIVERSE, rng)?;
        let exit = self
            .boundary
            .hit(ray, Interval::new(entry.t + 1e-4, f32::INFINITY), rng)?;

        let mut t_in = entry.t.max(ray_t.min);
        let t_out = exit.t.min(ray_t.max);
        if t_in >= t_out {
            return None;
        }
        t_in = t_in.max(0.0);

        let ray_length = ray.direction().length();
        let distance_inside = (t_out - t_in) * ray_length;
        // 1 - U lies in (0, 1], so the log is finite
        let hit_distance = self.neg_inv_density * (1.0 - gen_f32(rng)).ln();
        if hit_distance > distance_inside {
            return None;
        }

        let t = t_in + hit_distance / ray_length;
        Some(HitRecord {
            t,
            p: ray.at(t),
            // Arbitrary: the phase function ignores it
            normal: Vec3::X,
            u: 0.0,
            v: 0.0,
            material: &self.phase as &dyn Material,
        })
    }

    fn bounding_box(&self, time0: f32, time1: f32) -> Option<Aabb> {
        self.boundary.bounding_box(time0, time1)
    }
}
