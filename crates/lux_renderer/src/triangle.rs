//! Triangle and rectangle primitives for ray tracing.
//!
//! Ray-triangle intersection solves the 3x3 system
//! `t·D + b·(v0 - v1) + r·(v0 - v2) = v0 - O` with Cramer's rule.

use std::sync::Arc;

use crate::{
    hittable::{HitRecord, Hittable},
    Material,
};
use lux_core::Mesh;
use lux_math::{Aabb, Interval, Ray, Vec3};
use rand::RngCore;

/// Padding added to each side of a triangle's bounding box.
const BOX_PADDING: f32 = 1e-5;

/// A triangle primitive.
pub struct Triangle {
    /// Vertices
    v0: Vec3,
    v1: Vec3,
    v2: Vec3,
    /// Pre-computed winding normal (unit length)
    normal: Vec3,
    /// Material
    material: Arc<dyn Material>,
    /// Bounding box
    bbox: Aabb,
}

impl Triangle {
    /// Create a new triangle from three vertices.
    pub fn new(vertices: [Vec3; 3], material: Arc<dyn Material>) -> Self {
        let [v0, v1, v2] = vertices;
        let normal = (v1 - v0).cross(v2 - v0).normalize();

        let min = v0.min(v1).min(v2);
        let max = v0.max(v1).max(v2);
        let pad = Vec3::splat(BOX_PADDING);
        let bbox = Aabb::from_points(min - pad, max + pad);

        Self {
            v0,
            v1,
            v2,
            normal,
            material,
            bbox,
        }
    }
}

/// `a · (b × c)`
#[inline]
fn det(a: Vec3, b: Vec3, c: Vec3) -> f32 {
    a.dot(b.cross(c))
}

impl Hittable for Triangle {
    fn hit(&self, ray: &Ray, ray_t: Interval, _rng: &mut dyn RngCore) -> Option<HitRecord<'_>> {
        let d = ray.direction();
        let e1 = self.v0 - self.v1;
        let e2 = self.v0 - self.v2;
        let s = self.v0 - ray.origin();

        let d0 = det(d, e1, e2);
        // Ray is parallel to the triangle's plane
        if d0 == 0.0 {
            return None;
        }

        let t = det(s, e1, e2) / d0;
        if !ray_t.surrounds(t) {
            return None;
        }

        let b = det(d, s, e2) / d0;
        let r = det(d, e1, s) / d0;
        if !(0.0..=1.0).contains(&b) || !(0.0..=1.0).contains(&r) || b + r > 1.0 {
            return None;
        }

        Some(HitRecord {
            t,
            p: ray.at(t),
            normal: self.normal,
            u: b,
            v: r,
            material: self.material.as_ref(),
        })
    }

    fn bounding_box(&self, _time0: f32, _time1: f32) -> Option<Aabb> {
        Some(self.bbox)
    }
}

/// A planar rectangle given by three corners `a`, `b`, `c`, with the right
/// angle at `b`.
///
/// `c` is projected so the `b -> c` edge is perpendicular to `b -> a`, and
/// the fourth corner is `a + c - b`.
pub struct Rectangle {
    first: Triangle,
    second: Triangle,
    origin: Vec3,
    /// Unit edge directions and lengths along `b -> c` and `b -> a`
    u_axis: Vec3,
    u_len: f32,
    v_axis: Vec3,
    v_len: f32,
    normal: Vec3,
}

impl Rectangle {
    pub fn new(corners: [Vec3; 3], material: Arc<dyn Material>) -> Self {
        let [a, b, c] = corners;

        // Right-angle correction
        let e1 = (a - b).normalize();
        let c = c - e1 * (c - b).dot(e1);
        let d = a + c - b;

        let u_edge = c - b;
        let v_edge = a - b;

        Self {
            first: Triangle::new([a, b, c], Arc::clone(&material)),
            second: Triangle::new([a, d, c], material),
            origin: b,
            u_axis: u_edge.normalize(),
            u_len: u_edge.length(),
            v_axis: v_edge.normalize(),
            v_len: v_edge.length(),
            normal: (b - a).cross(c - a).normalize(),
        }
    }

    /// The four corners in order `a, b, c, d`.
    pub fn corners(&self) -> [Vec3; 4] {
        [self.first.v0, self.first.v1, self.first.v2, self.second.v1]
    }
}

impl Hittable for Rectangle {
    fn hit(&self, ray: &Ray, ray_t: Interval, rng: &mut dyn RngCore) -> Option<HitRecord<'_>> {
        let first = self.first.hit(ray, ray_t, rng);
        let max = first.as_ref().map_or(ray_t.max, |rec| rec.t);
        let second = self.second.hit(ray, Interval::new(ray_t.min, max), rng);

        let mut rec = second.or(first)?;

        // The second triangle winds the other way; report one consistent normal
        rec.normal = self.normal;

        let local = rec.p - self.origin;
        rec.u = local.dot(self.u_axis) / self.u_len;
        rec.v = local.dot(self.v_axis) / self.v_len;

        Some(rec)
    }

    fn bounding_box(&self, time0: f32, time1: f32) -> Option<Aabb> {
        let a = self.first.bounding_box(time0, time1)?;
        let b = self.second.bounding_box(time0, time1)?;
        Some(Aabb::surrounding(&a, &b))
    }
}

/// One [`Triangle`] per mesh face, all sharing `material`.
pub fn triangles_from_mesh(mesh: &Mesh, material: &Arc<dyn Material>) -> Vec<Arc<dyn Hittable>> {
    mesh.triangles()
        .map(|vertices| Arc::new(Triangle::new(vertices, Arc::clone(material))) as Arc<dyn Hittable>)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Lambertian, Texture};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn gray() -> Arc<dyn Material> {
        Arc::new(Lambertian::new(Arc::new(Texture::Solid(Vec3::splat(0.5)))))
    }

    fn any_t() -> Interval {
        Interval::new(0.001, f32::INFINITY)
    }

    fn unit_rect() -> Rectangle {
        // Slightly skewed third corner, corrected to (1, 0, 0)
        Rectangle::new(
            [Vec3::new(0.0, 1.0, 0.0), Vec3::ZERO, Vec3::new(1.0, 0.5, 0.0)],
            gray(),
        )
    }

    #[test]
    fn test_triangle_hit() {
        // Triangle in XY plane at z=-1
        let tri = Triangle::new(
            [
                Vec3::new(-1.0, -1.0, -1.0),
                Vec3::new(1.0, -1.0, -1.0),
                Vec3::new(0.0, 1.0, -1.0),
            ],
            gray(),
        );

        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z, 0.0);
        let mut rng = StdRng::seed_from_u64(0);

        let rec = tri.hit(&ray, any_t(), &mut rng).unwrap();
        assert!((rec.t - 1.0).abs() < 1e-5);
        assert!((rec.normal - Vec3::Z).length() < 1e-5);
    }

    #[test]
    fn test_triangle_miss() {
        let tri = Triangle::new(
            [
                Vec3::new(-1.0, -1.0, -1.0),
                Vec3::new(1.0, -1.0, -1.0),
                Vec3::new(0.0, 1.0, -1.0),
            ],
            gray(),
        );

        let mut rng = StdRng::seed_from_u64(0);

        // Pointing away
        let away = Ray::new(Vec3::ZERO, Vec3::Z, 0.0);
        assert!(tri.hit(&away, any_t(), &mut rng).is_none());

        // Parallel to the plane
        let parallel = Ray::new(Vec3::new(-5.0, 0.0, -1.0), Vec3::X, 0.0);
        assert!(tri.hit(&parallel, any_t(), &mut rng).is_none());

        // Outside the edges
        let outside = Ray::new(Vec3::new(0.9, 0.9, 0.0), Vec3::NEG_Z, 0.0);
        assert!(tri.hit(&outside, any_t(), &mut rng).is_none());
    }

    #[test]
    fn test_triangle_centroid_barycentrics() {
        let v0 = Vec3::new(0.0, 0.0, -2.0);
        let v1 = Vec3::new(3.0, 0.0, -2.0);
        let v2 = Vec3::new(0.0, 3.0, -2.0);
        let tri = Triangle::new([v0, v1, v2], gray());

        let centroid = (v0 + v1 + v2) / 3.0;
        let ray = Ray::new(Vec3::new(centroid.x, centroid.y, 0.0), Vec3::NEG_Z, 0.0);
        let mut rng = StdRng::seed_from_u64(0);

        let rec = tri.hit(&ray, any_t(), &mut rng).unwrap();
        assert!((rec.u - 1.0 / 3.0).abs() < 1e-5);
        assert!((rec.v - 1.0 / 3.0).abs() < 1e-5);
        assert!((rec.p - centroid).length() < 1e-5);
    }

    #[test]
    fn test_triangle_box_is_padded() {
        let tri = Triangle::new([Vec3::ZERO, Vec3::X, Vec3::Y], gray());
        let bbox = tri.bounding_box(0.0, 0.0).unwrap();

        assert!(bbox.min().x < 0.0 && bbox.max().x > 1.0);
        assert!(bbox.z.size() > 0.0);
    }

    #[test]
    fn test_rectangle_right_angle_correction() {
        let rect = unit_rect();
        let [a, b, c, d] = rect.corners();

        assert_eq!(a, Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(b, Vec3::ZERO);
        assert!((c - Vec3::X).length() < 1e-6);
        assert!((d - Vec3::new(1.0, 1.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_rectangle_hit_uv_and_normal() {
        let rect = unit_rect();
        let mut rng = StdRng::seed_from_u64(0);

        // Lands in the first triangle
        let ray = Ray::new(Vec3::new(0.25, 0.6, 5.0), Vec3::NEG_Z, 0.0);
        let rec = rect.hit(&ray, any_t(), &mut rng).unwrap();
        assert!((rec.t - 5.0).abs() < 1e-5);
        assert!((rec.u - 0.25).abs() < 1e-5);
        assert!((rec.v - 0.6).abs() < 1e-5);
        assert!((rec.normal - Vec3::Z).length() < 1e-5);

        // Lands in the second triangle, same normal
        let ray = Ray::new(Vec3::new(0.9, 0.9, 5.0), Vec3::NEG_Z, 0.0);
        let rec = rect.hit(&ray, any_t(), &mut rng).unwrap();
        assert!((rec.u - 0.9).abs() < 1e-5);
        assert!((rec.v - 0.9).abs() < 1e-5);
        assert!((rec.normal - Vec3::Z).length() < 1e-5);
    }

    #[test]
    fn test_rectangle_miss() {
        let rect = unit_rect();
        let mut rng = StdRng::seed_from_u64(0);

        let ray = Ray::new(Vec3::new(1.1, 0.5, 5.0), Vec3::NEG_Z, 0.0);
        assert!(rect.hit(&ray, any_t(), &mut rng).is_none());
    }

    #[test]
    fn test_triangles_from_mesh() {
        let mesh = Mesh::new(
            vec![Vec3::ZERO, Vec3::X, Vec3::new(1.0, 1.0, 0.0), Vec3::Y],
            vec![0, 1, 2, 0, 2, 3],
        )
        .unwrap();

        let triangles = triangles_from_mesh(&mesh, &gray());
        assert_eq!(triangles.len(), 2);
    }
}
