//! Lux Renderer - CPU Path Tracing
//!
//! A Monte Carlo path tracer for physically-based rendering.
//!
//! The pipeline: [`World::from_scene`] converts a parsed scene into shared
//! materials, textures and primitives wrapped in a BVH; [`render`] then
//! traces every pixel in parallel, asking the [`Camera`] for rays and
//! [`radiance`] for the light they carry.

mod bvh;
mod camera;
mod hittable;
mod material;
mod medium;
mod renderer;
mod revolution;
pub mod sampling;
mod sphere;
mod texture;
mod triangle;
mod world;

pub use bvh::BvhNode;
pub use camera::Camera;
pub use hittable::{HitRecord, Hittable, HittableList};
pub use material::{
    reflect, refract, schlick, Dielectric, DiffuseLight, Isotropic, Lambertian, Material, Metal,
    ScatterResult,
};
pub use medium::ConstantMedium;
pub use renderer::{
    color_to_rgb, radiance, render, render_pixel, render_with_progress, ImageBuffer, RenderConfig,
    RenderProgress,
};
pub use revolution::{BezierCurve, RevolutionSurface};
pub use sampling::gen_f32;
pub use sphere::{MovingSphere, Sphere};
pub use texture::{Perlin, Texture};
pub use triangle::{triangles_from_mesh, Rectangle, Triangle};
pub use world::{Acceleration, World, WorldError, WorldResult};

/// Re-export Vec3 and common math types from lux_math
pub use lux_math::{Aabb, Color, Interval, Ray, Vec3};
