//! Surfaces of revolution: a Bezier profile curve swept around the Y axis.
//!
//! There is no closed-form intersection, so rays are intersected by
//! Newton's method on `O + t·D = S(θ, μ)` for the three unknowns
//! `(t, μ, θ)`, started from where the ray enters the bounding box.

use std::f32::consts::TAU;
use std::sync::Arc;

use crate::{
    hittable::{HitRecord, Hittable},
    Material,
};
use lux_math::{Aabb, Interval, Ray, Vec3};
use rand::RngCore;

/// Maximum Newton iterations per ray.
const NEWTON_STEPS: usize = 20;

/// Squared residual below which the iteration has converged.
const NEWTON_TOLERANCE: f32 = 1e-4;

/// Keeps `μ` off the curve endpoints while iterating.
const MU_EPSILON: f32 = 1e-5;

/// A Bezier curve of degree `controls.len() - 1` in the XY plane.
///
/// On its own a curve is not renderable: it is never hit and has no
/// bounding box.
#[derive(Debug, Clone)]
pub struct BezierCurve {
    controls: Vec<Vec3>,
}

impl BezierCurve {
    pub fn new(controls: Vec<Vec3>) -> Self {
        Self { controls }
    }

    pub fn controls(&self) -> &[Vec3] {
        &self.controls
    }

    /// Position and tangent at parameter `mu` in `[0, 1]`.
    pub fn evaluate(&self, mu: f32) -> (Vec3, Vec3) {
        let n = self.controls.len().saturating_sub(1);

        let point: Vec3 = self
            .controls
            .iter()
            .enumerate()
            .map(|(i, &c)| c * bernstein(n, i, mu))
            .sum();

        let tangent = if n == 0 {
            Vec3::ZERO
        } else {
            let sum: Vec3 = self
                .controls
                .windows(2)
                .enumerate()
                .map(|(i, pair)| (pair[1] - pair[0]) * bernstein(n - 1, i, mu))
                .sum();
            sum * n as f32
        };

        (point, tangent)
    }

    fn first(&self) -> Vec3 {
        self.controls.first().copied().unwrap_or(Vec3::ZERO)
    }

    fn last(&self) -> Vec3 {
        self.controls.last().copied().unwrap_or(Vec3::ZERO)
    }
}

impl Hittable for BezierCurve {
    fn hit(&self, _ray: &Ray, _ray_t: Interval, _rng: &mut dyn RngCore) -> Option<HitRecord<'_>> {
        None
    }

    fn bounding_box(&self, _time0: f32, _time1: f32) -> Option<Aabb> {
        None
    }
}

/// `B(n, i)(t) = C(n, i) t^i (1 - t)^(n - i)`
fn bernstein(n: usize, i: usize, t: f32) -> f32 {
    binomial(n, i) * t.powi(i as i32) * (1.0 - t).powi((n - i) as i32)
}

fn binomial(n: usize, k: usize) -> f32 {
    (0..k).fold(1.0, |acc, j| acc * (n - j) as f32 / (j + 1) as f32)
}

/// A profile curve revolved about the vertical axis through `center`.
pub struct RevolutionSurface {
    center: Vec3,
    curve: BezierCurve,
    material: Arc<dyn Material>,
    bbox: Aabb,
}

impl RevolutionSurface {
    pub fn new(center: Vec3, curve: BezierCurve, material: Arc<dyn Material>) -> Self {
        let radius = curve
            .controls()
            .iter()
            .fold(0.0f32, |r, c| r.max(c.x.abs()));
        let (y_min, y_max) = curve
            .controls()
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), c| {
                (lo.min(c.y), hi.max(c.y))
            });

        let bbox = Aabb::from_points(
            Vec3::new(-radius, y_min, -radius),
            Vec3::new(radius, y_max, radius),
        )
        .translate(center);

        Self {
            center,
            curve,
            material,
            bbox,
        }
    }

    /// Initial `(θ, μ)` for a point in surface-local coordinates.
    fn initial_guess(&self, p: Vec3) -> (f32, f32) {
        let theta = (-p.z).atan2(p.x).rem_euclid(TAU);

        let y0 = self.curve.first().y;
        let y1 = self.curve.last().y;
        let mu = if y1 == y0 {
            0.5
        } else {
            ((p.y - y0) / (y1 - y0)).clamp(0.0, 1.0)
        };

        (theta, mu)
    }
}

impl Hittable for RevolutionSurface {
    fn hit(&self, ray: &Ray, ray_t: Interval, _rng: &mut dyn RngCore) -> Option<HitRecord<'_>> {
        let mut box_t = ray_t;
        if !self.bbox.hit(ray, &mut box_t) {
            return None;
        }

        let origin = ray.origin() - self.center;
        let d = ray.direction();

        let mut t = box_t.min.max(ray_t.min);
        let (mut theta, mut mu) = self.initial_guess(origin + d * t);
        let mut normal = None;

        for _ in 0..NEWTON_STEPS {
            theta = theta.rem_euclid(TAU);
            mu = mu.clamp(MU_EPSILON, 1.0 - MU_EPSILON);

            let (c, dc) = self.curve.evaluate(mu);
            let (sin, cos) = theta.sin_cos();

            let s = Vec3::new(c.x * cos, c.y, -c.x * sin);
            let ds_dmu = Vec3::new(dc.x * cos, dc.y, -dc.x * sin);
            let ds_dtheta = Vec3::new(-c.x * sin, 0.0, -c.x * cos);
            let n = ds_dmu.cross(ds_dtheta);

            let f = origin + d * t - s;
            if f.length_squared() < NEWTON_TOLERANCE {
                normal = Some(n);
                break;
            }

            let dn = d.dot(n);
            if dn == 0.0 {
                return None;
            }

            t -= ds_dmu.dot(ds_dtheta.cross(f)) / dn;
            mu -= d.dot(ds_dtheta.cross(f)) / dn;
            theta += d.dot(ds_dmu.cross(f)) / dn;
        }

        let n = normal?;
        if !t.is_finite() || !mu.is_finite() || !theta.is_finite() {
            return None;
        }
        if !ray_t.surrounds(t) || !(0.0..=1.0).contains(&mu) {
            return None;
        }

        let local = origin + d * t;
        let radial = Vec3::new(local.x, 0.0, local.z);
        let mut normal = n.normalize();
        if !normal.is_finite() {
            return None;
        }
        if normal.dot(radial) < 0.0 {
            normal = -normal;
        }

        Some(HitRecord {
            t,
            p: ray.at(t),
            normal,
            u: theta / TAU,
            v: mu,
            material: self.material.as_ref(),
        })
    }

    fn bounding_box(&self, _time0: f32, _time1: f32) -> Option<Aabb> {
        Some(self.bbox)
    }
}
