// Re-export glam for convenience
pub use glam::*;

// Lux math types
mod aabb;
mod interval;
mod ray;

pub use aabb::Aabb;
pub use interval::Interval;
pub use ray::Ray;

/// Linear RGB color. Shares its representation with `Vec3`.
pub type Color = Vec3;
