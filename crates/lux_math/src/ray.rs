use crate::Vec3;

/// A ray `origin + t * direction` sampled at one instant of the shutter.
///
/// `direction` is unit length, so `t` is a world-space distance. Primitives
/// that move (such as moving spheres) are evaluated at `time`, which the
/// camera draws from its shutter interval and scattered rays inherit.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
    pub time: f32,
}

impl Ray {
    /// `direction` need not be normalized; it is normalized here.
    pub fn new(origin: Vec3, direction: Vec3, time: f32) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
            time,
        }
    }

    #[inline]
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    #[inline]
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    #[inline]
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Point at distance `t`. Negative `t` lies behind the origin.
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}
