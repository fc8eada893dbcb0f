/// A range of ray parameters, or of coordinates along one box axis.
///
/// Hit queries pass `[t_min, t_max]` and shrink `max` as closer hits are
/// found, so a primitive only reports hits nearer than anything seen so far.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub min: f32,
    pub max: f32,
}

impl Interval {
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn size(&self) -> f32 {
        self.max - self.min
    }

    /// Strict containment. A hit exactly at `t_min` is rejected, which keeps
    /// scattered rays from re-hitting the surface they leave.
    pub fn surrounds(&self, x: f32) -> bool {
        self.min < x && x < self.max
    }

    /// Grow by `delta` in total, half on each side. Used to pad flat boxes.
    pub fn expand(&self, delta: f32) -> Interval {
        let padding = delta / 2.0;
        Interval::new(self.min - padding, self.max + padding)
    }

    /// Shift both ends by `displacement`.
    pub fn add_scalar(&self, displacement: f32) -> Interval {
        Interval::new(self.min + displacement, self.max + displacement)
    }

    /// Smallest interval covering `a` and `b`.
    pub fn surrounding(a: &Interval, b: &Interval) -> Interval {
        Interval::new(a.min.min(b.min), a.max.max(b.max))
    }

    /// Covers nothing; the identity for `surrounding`.
    pub const EMPTY: Interval = Interval {
        min: f32::INFINITY,
        max: f32::NEG_INFINITY,
    };

    /// Every parameter along a ray, including behind its origin. Media use
    /// it to find where a ray enters their boundary.
    pub const UNIVERSE: Interval = Interval {
        min: f32::NEG_INFINITY,
        max: f32::INFINITY,
    };
}
