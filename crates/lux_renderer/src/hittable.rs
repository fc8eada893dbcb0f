//! Hittable trait and HitRecord for ray-object intersection.

use std::sync::Arc;

use crate::Material;
use lux_math::{Aabb, Interval, Ray, Vec3};
use rand::RngCore;

/// Record of a ray-object intersection.
///
/// Only meaningful for the query interval that produced it.
#[derive(Clone, Copy)]
pub struct HitRecord<'a> {
    /// Parameter t where the intersection occurs
    pub t: f32,
    /// Point of intersection
    pub p: Vec3,
    /// Unit surface normal. Primitives report their geometric (outward)
    /// normal; it is not flipped to face the ray.
    pub normal: Vec3,
    /// UV texture coordinates
    pub u: f32,
    pub v: f32,
    /// Material at the intersection point
    pub material: &'a dyn Material,
}

/// Trait for objects that can be hit by rays.
pub trait Hittable: Send + Sync {
    /// Nearest intersection with `ray` strictly inside `ray_t`.
    ///
    /// `rng` is only consumed by stochastic primitives (participating media).
    fn hit(&self, ray: &Ray, ray_t: Interval, rng: &mut dyn RngCore) -> Option<HitRecord<'_>>;

    /// Bounds over the shutter interval `[time0, time1]`, or `None` if the
    /// object is unbounded or has no spatial extent to represent.
    fn bounding_box(&self, time0: f32, time1: f32) -> Option<Aabb>;
}

/// A list of hittable objects, intersected by linear scan.
#[derive(Clone, Default)]
pub struct HittableList {
    objects: Vec<Arc<dyn Hittable>>,
}

impl HittableList {
    /// Create a new empty hittable list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a list from existing objects.
    pub fn from_objects(objects: Vec<Arc<dyn Hittable>>) -> Self {
        Self { objects }
    }

    /// Add an object to the list.
    pub fn add(&mut self, object: Arc<dyn Hittable>) {
        self.objects.push(object);
    }

    /// Get the number of objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Check if the list is empty.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl Hittable for HittableList {
    fn hit(&self, ray: &Ray, ray_t: Interval, rng: &mut dyn RngCore) -> Option<HitRecord<'_>> {
        let mut closest: Option<HitRecord<'_>> = None;

        for object in &self.objects {
            let max = closest.as_ref().map_or(ray_t.max, |rec| rec.t);
            if let Some(rec) = object.hit(ray, Interval::new(ray_t.min, max), rng) {
                closest = Some(rec);
            }
        }

        closest
    }

    fn bounding_box(&self, time0: f32, time1: f32) -> Option<Aabb> {
        let mut objects = self.objects.iter();
        let first = objects.next()?.bounding_box(time0, time1)?;

        objects.try_fold(first, |acc, object| {
            object
                .bounding_box(time0, time1)
                .map(|bbox| Aabb::surrounding(&acc, &bbox))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BezierCurve, Lambertian, Sphere, Texture};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn gray() -> Arc<dyn Material> {
        Arc::new(Lambertian::new(Arc::new(Texture::Solid(Vec3::splat(0.5)))))
    }

    #[test]
    fn test_list_returns_nearest() {
        let mut list = HittableList::new();
        list.add(Arc::new(Sphere::new(Vec3::new(0.0, 0.0, -10.0), 1.0, gray())));
        list.add(Arc::new(Sphere::new(Vec3::new(0.0, 0.0, -5.0), 1.0, gray())));
        list.add(Arc::new(Sphere::new(Vec3::new(0.0, 0.0, -20.0), 1.0, gray())));

        let mut rng = StdRng::seed_from_u64(0);
        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z, 0.0);
        let rec = list
            .hit(&ray, Interval::new(0.001, f32::INFINITY), &mut rng)
            .unwrap();

        assert!((rec.t - 4.0).abs() < 1e-5);
    }

    #[test]
    fn test_list_bounding_box() {
        let mut list = HittableList::new();
        assert!(list.bounding_box(0.0, 1.0).is_none());

        list.add(Arc::new(Sphere::new(Vec3::new(-2.0, 0.0, 0.0), 1.0, gray())));
        list.add(Arc::new(Sphere::new(Vec3::new(3.0, 0.0, 0.0), 1.0, gray())));

        let bbox = list.bounding_box(0.0, 1.0).unwrap();
        assert_eq!(bbox.min(), Vec3::new(-3.0, -1.0, -1.0));
        assert_eq!(bbox.max(), Vec3::new(4.0, 1.0, 1.0));
    }

    #[test]
    fn test_list_with_unbounded_member_is_unbounded() {
        let mut list = HittableList::new();
        list.add(Arc::new(Sphere::new(Vec3::ZERO, 1.0, gray())));
        list.add(Arc::new(BezierCurve::new(vec![Vec3::X; 4])));

        assert_eq!(list.len(), 2);
        assert!(list.bounding_box(0.0, 1.0).is_none());
    }
}
