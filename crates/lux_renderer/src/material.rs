//! Material trait for surface scattering.

use std::sync::Arc;

use crate::hittable::HitRecord;
use crate::sampling::{gen_f32, random_in_unit_sphere};
use crate::Texture;
use lux_math::{Color, Ray, Vec3};
use rand::RngCore;

/// Outcome of a scattering event.
#[derive(Debug, Clone, Copy)]
pub struct ScatterResult {
    /// Per-channel throughput of the scattered path
    pub attenuation: Color,
    /// Outgoing ray, at the incoming ray's time
    pub scattered: Ray,
}

/// Trait for materials that describe how light interacts with surfaces.
pub trait Material: Send + Sync {
    /// Scatter an incoming ray.
    ///
    /// Returns `None` if the ray is absorbed.
    fn scatter(&self, ray_in: &Ray, rec: &HitRecord, rng: &mut dyn RngCore) -> Option<ScatterResult>;

    /// Get emitted light from this material.
    ///
    /// Most materials return black (no emission).
    fn emitted(&self, _u: f32, _v: f32, _p: Vec3) -> Color {
        Color::ZERO
    }
}

/// Lambertian (diffuse) material.
///
/// Scatters toward `normal + random point in the unit ball`, an
/// approximation of cosine-weighted sampling.
#[derive(Clone)]
pub struct Lambertian {
    albedo: Arc<Texture>,
}

impl Lambertian {
    /// Create a new Lambertian material with the given albedo texture.
    pub fn new(albedo: Arc<Texture>) -> Self {
        Self { albedo }
    }
}

impl Material for Lambertian {
    fn scatter(&self, ray_in: &Ray, rec: &HitRecord, rng: &mut dyn RngCore) -> Option<ScatterResult> {
        let mut scatter_direction = rec.normal + random_in_unit_sphere(rng);

        // Catch degenerate scatter direction
        if scatter_direction.length_squared() < 1e-8 {
            scatter_direction = rec.normal;
        }

        Some(ScatterResult {
            attenuation: self.albedo.value(rec.u, rec.v, rec.p),
            scattered: Ray::new(rec.p, scatter_direction, ray_in.time()),
        })
    }
}

/// Metal (specular) material.
pub struct Metal {
    albedo: Arc<Texture>,
    fuzz: f32,
}

impl Metal {
    /// Create a new Metal material.
    ///
    /// - `albedo`: The color of the metal
    /// - `fuzz`: Roughness, 0.0 = perfect mirror, 1.0 = very rough
    pub fn new(albedo: Arc<Texture>, fuzz: f32) -> Self {
        Self {
            albedo,
            fuzz: fuzz.clamp(0.0, 1.0),
        }
    }
}

impl Material for Metal {
    fn scatter(&self, ray_in: &Ray, rec: &HitRecord, rng: &mut dyn RngCore) -> Option<ScatterResult> {
        let reflected = reflect(ray_in.direction(), rec.normal);
        let scattered_dir = reflected + self.fuzz * random_in_unit_sphere(rng);

        // Only scatter if the reflected ray is in the same hemisphere as the normal
        if scattered_dir.dot(rec.normal) <= 0.0 {
            return None;
        }

        Some(ScatterResult {
            attenuation: self.albedo.value(rec.u, rec.v, rec.p),
            scattered: Ray::new(rec.p, scattered_dir, ray_in.time()),
        })
    }
}

/// Dielectric (glass) material.
pub struct Dielectric {
    /// Index of refraction
    ri: f32,
    /// Tint applied to both reflected and refracted paths
    color: Color,
}

impl Dielectric {
    /// Create a new Dielectric material.
    ///
    /// - `ri`: Index of refraction (1.0 = air, 1.5 = glass, 2.4 = diamond)
    pub fn new(ri: f32, color: Color) -> Self {
        Self { ri, color }
    }
}

impl Material for Dielectric {
    /// Reflect or refract, choosing by the Schlick reflectance.
    ///
    /// Leaving the medium, the Fresnel cosine is `ri * (D·n)`. Entering, it is
    /// the plain incident cosine `-(D·n)`, not `-ri * (D·n)`, so head-on
    /// reflectance is exactly `r0`.
    fn scatter(&self, ray_in: &Ray, rec: &HitRecord, rng: &mut dyn RngCore) -> Option<ScatterResult> {
        let direction = ray_in.direction();
        let reflected = reflect(direction, rec.normal);
        let d_dot_n = direction.dot(rec.normal);

        // `out_normal` points to the side the ray travels into
        let (out_normal, eta, cosine) = if d_dot_n > 0.0 {
            (rec.normal, self.ri, self.ri * d_dot_n)
        } else {
            (-rec.normal, 1.0 / self.ri, -d_dot_n)
        };

        let scattered_dir = match refract(direction, out_normal, eta) {
            Some(refracted) if gen_f32(rng) >= schlick(cosine, self.ri) => refracted,
            _ => reflected,
        };

        Some(ScatterResult {
            attenuation: self.color,
            scattered: Ray::new(rec.p, scattered_dir, ray_in.time()),
        })
    }
}

/// Diffuse light emitter.
pub struct DiffuseLight {
    emit: Arc<Texture>,
}

impl DiffuseLight {
    /// Create a new diffuse light with the given emission texture.
    pub fn new(emit: Arc<Texture>) -> Self {
        Self { emit }
    }
}

impl Material for DiffuseLight {
    fn scatter(&self, _ray_in: &Ray, _rec: &HitRecord, _rng: &mut dyn RngCore) -> Option<ScatterResult> {
        // Lights terminate the path
        None
    }

    fn emitted(&self, u: f32, v: f32, p: Vec3) -> Color {
        self.emit.value(u, v, p)
    }
}

/// Phase function of a participating medium: scatters uniformly in all
/// directions.
pub struct Isotropic {
    albedo: Arc<Texture>,
}

impl Isotropic {
    pub fn new(albedo: Arc<Texture>) -> Self {
        Self { albedo }
    }
}

impl Material for Isotropic {
    fn scatter(&self, ray_in: &Ray, rec: &HitRecord, rng: &mut dyn RngCore) -> Option<ScatterResult> {
        Some(ScatterResult {
            attenuation: self.albedo.value(rec.u, rec.v, rec.p),
            scattered: Ray::new(rec.p, random_in_unit_sphere(rng), ray_in.time()),
        })
    }
}

// =============================================================================
// Helper functions
// =============================================================================

/// Reflect a vector about a normal.
#[inline]
pub fn reflect(v: Vec3, n: Vec3) -> Vec3 {
    v - 2.0 * v.dot(n) * n
}

/// Refract unit vector `v` through a surface whose normal `n` points to
/// the transmitted side. `eta` is the ratio of indices (incident over
/// transmitted). Returns `None` on total internal reflection.
#[inline]
pub fn refract(v: Vec3, n: Vec3, eta: f32) -> Option<Vec3> {
    let cos = v.dot(n);
    let det = 1.0 - eta * eta * (1.0 - cos * cos);
    if det > 0.0 {
        Some((v - n * cos) * eta + n * det.sqrt())
    } else {
        None
    }
}

/// Schlick's approximation for reflectance.
#[inline]
pub fn schlick(cosine: f32, ri: f32) -> f32 {
    let r0 = ((1.0 - ri) / (1.0 + ri)).powi(2);
    r0 + (1.0 - r0) * (1.0 - cosine).powi(5)
}
