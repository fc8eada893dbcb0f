//! Core path tracing renderer.
//!
//! Implements Monte Carlo path tracing with:
//! - Recursive ray tracing with Russian-roulette termination
//! - 2x2 sub-pixel supersampling with tent-filtered jitter
//! - Row-parallel rendering with one reproducible random stream per row

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use crate::sampling::{gen_f32, tent};
use crate::{Acceleration, Camera, Color, Hittable, ScatterResult};
use lux_math::{Interval, Ray};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Render configuration.
///
/// Loadable from JSON; missing fields take their defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Samples per pixel, spread over the 2x2 sub-pixel grid
    pub samples_per_pixel: u32,
    /// Hard cap on path length
    pub max_depth: u32,
    /// Depth from which paths are randomly terminated
    pub roulette_depth: u32,
    /// Minimum hit distance, to avoid self-intersection
    pub t_min: f32,
    /// Background color when ray doesn't hit anything. Comes from the scene.
    #[serde(skip)]
    pub background: Color,
    /// Base seed for the per-row random streams
    pub seed: u64,
    /// Worker threads, 0 for one per core
    pub threads: usize,
    /// Top-level intersection structure
    pub acceleration: Acceleration,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            samples_per_pixel: 100,
            max_depth: 20,
            roulette_depth: 5,
            t_min: 0.001,
            background: Color::ZERO,
            seed: 0,
            threads: 0,
            acceleration: Acceleration::Bvh,
        }
    }
}

/// Compute the radiance arriving along a ray.
///
/// This is the core path tracing function. `depth` is the number of bounces
/// already taken.
pub fn radiance(
    ray: &Ray,
    world: &dyn Hittable,
    depth: u32,
    config: &RenderConfig,
    rng: &mut dyn RngCore,
) -> Color {
    // If we've exceeded max depth, return black (no light)
    if depth >= config.max_depth {
        return Color::ZERO;
    }

    let rec = match world.hit(ray, Interval::new(config.t_min, f32::INFINITY), rng) {
        Some(rec) => rec,
        None => return config.background,
    };

    // Get emission from material (for lights)
    let emission = rec.material.emitted(rec.u, rec.v, rec.p);

    match rec.material.scatter(ray, &rec, rng) {
        Some(ScatterResult {
            mut attenuation,
            scattered,
        }) => {
            if depth >= config.roulette_depth {
                // Survive with probability of the brightest channel and
                // reweight so the estimate stays unbiased
                let survival = attenuation.max_element().min(1.0);
                if gen_f32(rng) >= survival {
                    return emission;
                }
                attenuation /= survival;
            }

            let incoming = radiance(&scattered, world, depth + 1, config, rng);
            emission + attenuation * incoming
        }
        // Ray was absorbed - just return emission
        None => emission,
    }
}

/// Clamp a value to [0, 1] range.
#[inline]
pub fn clamp_01(x: f32) -> f32 {
    x.clamp(0.0, 1.0)
}

/// Convert a linear color to 8-bit RGB, without gamma.
pub fn color_to_rgb(color: Color) -> [u8; 3] {
    let quantize = |c: f32| (255.99 * clamp_01(c)) as u8;
    [quantize(color.x), quantize(color.y), quantize(color.z)]
}

/// Render a single pixel with 2x2 sub-pixel supersampling.
///
/// `y` counts rows from the top of the image. Each sub-pixel receives
/// `max(1, samples_per_pixel / 4)` samples; its mean is clamped to `[0, 1]`
/// before the four are averaged.
pub fn render_pixel(
    camera: &Camera,
    world: &dyn Hittable,
    x: u32,
    y: u32,
    config: &RenderConfig,
    rng: &mut dyn RngCore,
) -> Color {
    let samples = (config.samples_per_pixel / 4).max(1);
    let width = camera.image_width as f32;
    let height = camera.image_height as f32;
    let y_up = (camera.image_height - 1 - y) as f32;

    let mut pixel_color = Color::ZERO;
    for sy in 0..2 {
        for sx in 0..2 {
            let mut sub = Color::ZERO;
            for _ in 0..samples {
                let dx = tent(rng);
                let dy = tent(rng);
                let s = (x as f32 + (sx as f32 + 0.5 + dx) / 2.0) / width;
                let t = (y_up + (sy as f32 + 0.5 + dy) / 2.0) / height;

                let ray = camera.get_ray(s, t, rng);
                sub += radiance(&ray, world, 0, config, rng);
            }

            let mean = sub / samples as f32;
            pixel_color += mean.clamp(Color::ZERO, Color::ONE) * 0.25;
        }
    }

    pixel_color
}

/// Simple image buffer for storing render output.
///
/// Rows are stored top to bottom.
pub struct ImageBuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Color>,
}

impl ImageBuffer {
    /// Create a new image buffer filled with black.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Color::ZERO; width as usize * height as usize],
        }
    }

    /// Get the pixel at (x, y).
    pub fn get(&self, x: u32, y: u32) -> Color {
        self.pixels[self.index(x, y)]
    }

    /// Set the pixel at (x, y).
    pub fn set(&mut self, x: u32, y: u32, color: Color) {
        let index = self.index(x, y);
        self.pixels[index] = color;
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Quantize to 8-bit RGB triples, top row first.
    pub fn to_rgb(&self) -> Vec<[u8; 3]> {
        self.pixels.iter().map(|c| color_to_rgb(*c)).collect()
    }
}

/// Random stream for one image row, derived from the configured seed.
fn row_rng(seed: u64, row: usize) -> StdRng {
    StdRng::seed_from_u64(seed.wrapping_mul(0x9E37_79B9_7F4A_7C15) ^ row as u64)
}

/// Shared count of finished rows.
///
/// Workers call [`RenderProgress::row_finished`] as they complete rows; a
/// line is logged each time another tenth of the image is done.
#[derive(Debug)]
pub struct RenderProgress {
    rows_done: AtomicUsize,
    total_rows: usize,
}

impl RenderProgress {
    pub fn new(total_rows: usize) -> Self {
        Self {
            rows_done: AtomicUsize::new(0),
            total_rows,
        }
    }

    /// Record one finished row and return how many are done.
    pub fn row_finished(&self) -> usize {
        let done = self.rows_done.fetch_add(1, Ordering::Relaxed) + 1;
        let total = self.total_rows.max(1);

        if (done * 10) / total != ((done - 1) * 10) / total {
            log::info!("Rendering {:5.2}%", 100.0 * done as f32 / total as f32);
        } else {
            log::debug!("Row {}/{} done", done, total);
        }
        done
    }

    pub fn rows_done(&self) -> usize {
        self.rows_done.load(Ordering::Relaxed)
    }
}

/// Render the entire scene to an image buffer.
///
/// Rows are distributed over the rayon thread pool. Each row draws from
/// its own seeded stream, so the output depends only on the scene and
/// `config.seed`, never on scheduling.
pub fn render(camera: &Camera, world: &dyn Hittable, config: &RenderConfig) -> ImageBuffer {
    let progress = RenderProgress::new(camera.image_height as usize);
    render_with_progress(camera, world, config, &progress)
}

/// [`render`], reporting finished rows to `progress`.
pub fn render_with_progress(
    camera: &Camera,
    world: &dyn Hittable,
    config: &RenderConfig,
    progress: &RenderProgress,
) -> ImageBuffer {
    let width = camera.image_width;
    let height = camera.image_height;
    let mut image = ImageBuffer::new(width, height);
    if width == 0 || height == 0 {
        return image;
    }

    log::info!(
        "Rendering {}x{} at {} spp on {} threads",
        width,
        height,
        config.samples_per_pixel,
        rayon::current_num_threads()
    );
    let start = Instant::now();

    image
        .pixels
        .par_chunks_mut(width as usize)
        .enumerate()
        .for_each(|(row, pixels)| {
            let mut rng = row_rng(config.seed, row);
            for (x, pixel) in pixels.iter_mut().enumerate() {
                *pixel = render_pixel(camera, world, x as u32, row as u32, config, &mut rng);
            }
            progress.row_finished();
        });

    log::info!("Render finished in {:.2?}", start.elapsed());
    image
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DiffuseLight, HittableList, Lambertian, Material, Sphere, Texture, Vec3};
    use lux_core::CameraDesc;
    use std::sync::Arc;

    fn diffuse(albedo: Color) -> Arc<dyn Material> {
        Arc::new(Lambertian::new(Arc::new(Texture::Solid(albedo))))
    }

    /// A huge diffuse sphere whose top touches the origin.
    fn ground(albedo: Color) -> HittableList {
        let mut world = HittableList::new();
        world.add(Arc::new(Sphere::new(Vec3::new(0.0, -100.0, 0.0), 100.0, diffuse(albedo))));
        world
    }

    fn down_ray() -> Ray {
        Ray::new(Vec3::new(0.0, 1.0, 0.0), Vec3::NEG_Y, 0.0)
    }

    fn config_with_background(background: Color) -> RenderConfig {
        RenderConfig {
            background,
            ..RenderConfig::default()
        }
    }

    #[test]
    fn test_config_from_json_defaults() {
        let config: RenderConfig = serde_json::from_str(r#"{ "max_depth": 8, "seed": 3 }"#).unwrap();

        assert_eq!(config.max_depth, 8);
        assert_eq!(config.seed, 3);
        assert_eq!(config.roulette_depth, 5);
        assert_eq!(config.samples_per_pixel, 100);
        assert_eq!(config.background, Color::ZERO);
        assert_eq!(config.acceleration, Acceleration::Bvh);

        let linear: RenderConfig = serde_json::from_str(r#"{ "acceleration": "list" }"#).unwrap();
        assert_eq!(linear.acceleration, Acceleration::List);
    }

    #[test]
    fn test_radiance_miss_returns_background() {
        let world = HittableList::new();
        let config = config_with_background(Color::new(0.2, 0.3, 0.4));
        let mut rng = StdRng::seed_from_u64(0);

        let c = radiance(&down_ray(), &world, 0, &config, &mut rng);
        assert_eq!(c, Color::new(0.2, 0.3, 0.4));
    }

    #[test]
    fn test_radiance_depth_cap() {
        let world = HittableList::new();
        let config = RenderConfig {
            max_depth: 3,
            ..config_with_background(Color::ONE)
        };
        let mut rng = StdRng::seed_from_u64(0);

        assert_eq!(radiance(&down_ray(), &world, 3, &config, &mut rng), Color::ZERO);
        assert_eq!(radiance(&down_ray(), &world, 2, &config, &mut rng), Color::ONE);
    }

    #[test]
    fn test_radiance_emitter() {
        let light: Arc<dyn Material> = Arc::new(DiffuseLight::new(Arc::new(Texture::Solid(Color::splat(3.0)))));
        let mut world = HittableList::new();
        world.add(Arc::new(Sphere::new(Vec3::new(0.0, -2.0, 0.0), 1.0, light)));

        let config = config_with_background(Color::ONE);
        let mut rng = StdRng::seed_from_u64(0);

        assert_eq!(radiance(&down_ray(), &world, 0, &config, &mut rng), Color::splat(3.0));
    }

    #[test]
    fn test_radiance_without_roulette_is_exact() {
        let world = ground(Color::splat(0.5));
        let config = RenderConfig {
            roulette_depth: 100,
            ..config_with_background(Color::ONE)
        };
        let mut rng = StdRng::seed_from_u64(1);

        // One bounce off the ground, then escape to the background
        for _ in 0..100 {
            let c = radiance(&down_ray(), &world, 0, &config, &mut rng);
            assert!((c - Color::splat(0.5)).length() < 1e-6);
        }
    }

    fn roulette_mean(albedo: Color, seed: u64) -> Color {
        let world = ground(albedo);
        let config = RenderConfig {
            roulette_depth: 0,
            ..config_with_background(Color::ONE)
        };
        let mut rng = StdRng::seed_from_u64(seed);

        let n = 20_000;
        let mut sum = Color::ZERO;
        for _ in 0..n {
            sum += radiance(&down_ray(), &world, 0, &config, &mut rng);
        }
        sum / n as f32
    }

    #[test]
    fn test_russian_roulette_is_unbiased_gray() {
        let mean = roulette_mean(Color::splat(0.5), 2);
        assert!((mean - Color::splat(0.5)).abs().max_element() < 0.02, "{:?}", mean);
    }

    #[test]
    fn test_russian_roulette_is_unbiased_colored() {
        let albedo = Color::new(0.8, 0.4, 0.2);
        let mean = roulette_mean(albedo, 3);
        assert!((mean - albedo).abs().max_element() < 0.02, "{:?}", mean);
    }

    /// Mean radiance inside a closed diffuse shell around a small light.
    /// Paths bounce off the shell many times before reaching the light.
    fn enclosed_mean(roulette_depth: u32, seed: u64) -> Color {
        let light: Arc<dyn Material> =
            Arc::new(DiffuseLight::new(Arc::new(Texture::Solid(Color::ONE))));
        let mut world = HittableList::new();
        world.add(Arc::new(Sphere::new(Vec3::ZERO, 2.0, diffuse(Color::splat(0.7)))));
        world.add(Arc::new(Sphere::new(Vec3::ZERO, 1.0, light)));

        let config = RenderConfig {
            roulette_depth,
            ..RenderConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(seed);
        let ray = Ray::new(Vec3::new(0.0, 1.5, 0.0), Vec3::Y, 0.0);

        let n = 20_000;
        let mut sum = Color::ZERO;
        for _ in 0..n {
            sum += radiance(&ray, &world, 0, &config, &mut rng);
        }
        sum / n as f32
    }

    #[test]
    fn test_russian_roulette_is_unbiased_after_many_bounces() {
        let with_roulette = enclosed_mean(RenderConfig::default().roulette_depth, 4);
        let without = enclosed_mean(100, 5);

        assert!(without.x > 0.1, "{:?}", without);
        assert!(
            (with_roulette - without).abs().max_element() < 0.02,
            "{:?} vs {:?}",
            with_roulette,
            without
        );
    }

    #[test]
    fn test_render_reports_every_row() {
        let camera = Camera::new(&CameraDesc::new(Vec3::ZERO, Vec3::NEG_Z, Vec3::Y, 60.0, 5, 7));
        let world = HittableList::new();
        let config = RenderConfig {
            samples_per_pixel: 4,
            ..config_with_background(Color::splat(0.5))
        };

        let progress = RenderProgress::new(7);
        let image = render_with_progress(&camera, &world, &config, &progress);

        assert_eq!(progress.rows_done(), 7);
        assert_eq!(image.pixels.len(), 35);
        assert_eq!(progress.row_finished(), 8);
    }

    #[test]
    fn test_image_buffer_large_dimensions() {
        // 70000² overflows u32
        let image = ImageBuffer { width: 70_000, height: 70_000, pixels: Vec::new() };
        assert_eq!(image.index(1, 69_999), 69_999usize * 70_000 + 1);
    }

    #[test]
    fn test_color_to_rgb() {
        assert_eq!(color_to_rgb(Color::new(1.0, 0.5, 0.0)), [255, 127, 0]);
        assert_eq!(color_to_rgb(Color::new(2.0, -1.0, 0.25)), [255, 0, 63]);
    }

    #[test]
    fn test_render_pixel_clamps_subpixels() {
        let camera = Camera::new(&CameraDesc::new(Vec3::ZERO, Vec3::NEG_Z, Vec3::Y, 60.0, 4, 4));
        let world = HittableList::new();
        let mut rng = StdRng::seed_from_u64(0);

        let gray = config_with_background(Color::splat(0.5));
        let c = render_pixel(&camera, &world, 1, 2, &gray, &mut rng);
        assert!((c - Color::splat(0.5)).length() < 1e-6);

        let bright = config_with_background(Color::new(3.0, 0.5, 0.0));
        let c = render_pixel(&camera, &world, 0, 0, &bright, &mut rng);
        assert!((c - Color::new(1.0, 0.5, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_render_is_deterministic() {
        let camera = Camera::new(&CameraDesc::new(
            Vec3::new(0.0, 1.0, 3.0),
            Vec3::ZERO,
            Vec3::Y,
            60.0,
            8,
            6,
        ));
        let mut world = ground(Color::new(0.7, 0.6, 0.5));
        world.add(Arc::new(Sphere::new(Vec3::new(0.0, 0.5, 0.0), 0.5, diffuse(Color::splat(0.9)))));

        let config = RenderConfig {
            samples_per_pixel: 8,
            seed: 11,
            ..config_with_background(Color::new(0.5, 0.7, 1.0))
        };

        let a = render(&camera, &world, &config);
        let b = render(&camera, &world, &config);

        assert_eq!(a.width, 8);
        assert_eq!(a.height, 6);
        assert_eq!(a.pixels.len(), 48);
        assert_eq!(a.pixels, b.pixels);

        // Top row sees sky, bottom row sees ground
        assert!(a.get(0, 0).z > a.get(0, 5).z);
    }

    #[test]
    fn test_image_buffer() {
        let mut image = ImageBuffer::new(3, 2);
        image.set(2, 1, Color::new(1.0, 0.0, 0.5));

        assert_eq!(image.get(2, 1), Color::new(1.0, 0.0, 0.5));
        assert_eq!(image.to_rgb()[5], [255, 0, 127]);
        assert_eq!(image.to_rgb()[0], [0, 0, 0]);
    }
}
