//! Sphere primitives for ray tracing.

use std::f32::consts::PI;
use std::sync::Arc;

use crate::{
    hittable::{HitRecord, Hittable},
    Material,
};
use lux_math::{Aabb, Interval, Ray, Vec3};
use rand::RngCore;

/// A sphere primitive.
pub struct Sphere {
    center: Vec3,
    radius: f32,
    material: Arc<dyn Material>,
}

impl Sphere {
    /// Create a new sphere.
    pub fn new(center: Vec3, radius: f32, material: Arc<dyn Material>) -> Self {
        Self {
            center,
            radius,
            material,
        }
    }
}

impl Hittable for Sphere {
    fn hit(&self, ray: &Ray, ray_t: Interval, _rng: &mut dyn RngCore) -> Option<HitRecord<'_>> {
        hit_sphere(self.center, self.radius, self.material.as_ref(), ray, ray_t)
    }

    fn bounding_box(&self, _time0: f32, _time1: f32) -> Option<Aabb> {
        Some(sphere_box(self.center, self.radius))
    }
}

/// A sphere whose center moves linearly over a time interval.
pub struct MovingSphere {
    center0: Vec3,
    center1: Vec3,
    time0: f32,
    time1: f32,
    radius: f32,
    material: Arc<dyn Material>,
}

impl MovingSphere {
    /// Create a sphere at `center0` at `time0` and `center1` at `time1`.
    pub fn new(
        center0: Vec3,
        center1: Vec3,
        time0: f32,
        time1: f32,
        radius: f32,
        material: Arc<dyn Material>,
    ) -> Self {
        Self {
            center0,
            center1,
            time0,
            time1,
            radius,
            material,
        }
    }

    /// Center at the given time. Times outside the interval extrapolate.
    pub fn center(&self, time: f32) -> Vec3 {
        let span = self.time1 - self.time0;
        if span == 0.0 {
            return self.center0;
        }
        self.center0 + (self.center1 - self.center0) * ((time - self.time0) / span)
    }
}

impl Hittable for MovingSphere {
    fn hit(&self, ray: &Ray, ray_t: Interval, _rng: &mut dyn RngCore) -> Option<HitRecord<'_>> {
        let center = self.center(ray.time());
        hit_sphere(center, self.radius, self.material.as_ref(), ray, ray_t)
    }

    fn bounding_box(&self, time0: f32, time1: f32) -> Option<Aabb> {
        let box0 = sphere_box(self.center(time0), self.radius);
        let box1 = sphere_box(self.center(time1), self.radius);
        Some(Aabb::surrounding(&box0, &box1))
    }
}

fn hit_sphere<'a>(
    center: Vec3,
    radius: f32,
    material: &'a dyn Material,
    ray: &Ray,
    ray_t: Interval,
) -> Option<HitRecord<'a>> {
    let oc = center - ray.origin();
    let a = ray.direction().length_squared();
    let h = ray.direction().dot(oc);
    let c = oc.length_squared() - radius * radius;

    let discriminant = h * h - a * c;
    if discriminant < 0.0 {
        return None;
    }

    let sqrtd = discriminant.sqrt();

    // Find the nearest root in the acceptable range
    let mut root = (h - sqrtd) / a;
    if !ray_t.surrounds(root) {
        root = (h + sqrtd) / a;
        if !ray_t.surrounds(root) {
            return None;
        }
    }

    let p = ray.at(root);
    let normal = (p - center) / radius;
    let (u, v) = sphere_uv(normal);

    Some(HitRecord {
        t: root,
        p,
        normal,
        u,
        v,
        material,
    })
}

/// UV coordinates of a point on the unit sphere centered at the origin.
fn sphere_uv(n: Vec3) -> (f32, f32) {
    let phi = n.z.atan2(n.x);
    let theta = n.y.clamp(-1.0, 1.0).asin();

    let u = 0.5 - phi / (2.0 * PI);
    let v = 0.5 + theta / PI;
    (u, v)
}

fn sphere_box(center: Vec3, radius: f32) -> Aabb {
    let rvec = Vec3::splat(radius.abs());
    Aabb::from_points(center - rvec, center + rvec)
}
