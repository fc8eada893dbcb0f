//! Thin-lens camera for ray generation.

use crate::sampling::{gen_f32, random_in_unit_disk};
use lux_core::CameraDesc;
use lux_math::{Ray, Vec3};
use rand::RngCore;

/// Camera for generating rays into the scene.
///
/// Rays are addressed by viewport coordinates `(s, t)` in `[0, 1]²`, with
/// `(0, 0)` at the bottom-left corner.
#[derive(Clone, Debug)]
pub struct Camera {
    // Image settings
    pub image_width: u32,
    pub image_height: u32,

    // Cached viewport
    origin: Vec3,
    lower_left: Vec3,
    horizontal: Vec3,
    vertical: Vec3,

    // Orthonormal basis
    u: Vec3,
    v: Vec3,

    lens_radius: f32,

    // Shutter interval
    time0: f32,
    time1: f32,
}

impl Camera {
    /// Create a camera from a scene description.
    pub fn new(desc: &CameraDesc) -> Self {
        let theta = desc.fov_degrees.to_radians();
        let half_height = (theta / 2.0).tan();
        let half_width = desc.aspect_ratio() * half_height;
        let focus = desc.focus_dist;

        // Calculate camera basis vectors
        let w = (desc.from - desc.at).normalize();
        let u = desc.up.cross(w).normalize();
        let v = w.cross(u);

        let origin = desc.from;
        let horizontal = 2.0 * half_width * focus * u;
        let vertical = 2.0 * half_height * focus * v;
        let lower_left = origin - horizontal / 2.0 - vertical / 2.0 - focus * w;

        Self {
            image_width: desc.width,
            image_height: desc.height,
            origin,
            lower_left,
            horizontal,
            vertical,
            u,
            v,
            lens_radius: desc.aperture / 2.0,
            time0: desc.time0,
            time1: desc.time1,
        }
    }

    /// Generate a ray through viewport point `(s, t)`.
    ///
    /// The origin is jittered across the lens and the time is drawn
    /// uniformly from the shutter interval.
    pub fn get_ray(&self, s: f32, t: f32, rng: &mut dyn RngCore) -> Ray {
        let rd = self.lens_radius * random_in_unit_disk(rng);
        let offset = self.u * rd.x + self.v * rd.y;

        let time = self.time0 + gen_f32(rng) * (self.time1 - self.time0);
        let direction = self.lower_left + s * self.horizontal + t * self.vertical - self.origin - offset;

        Ray::new(self.origin + offset, direction, time)
    }
}
