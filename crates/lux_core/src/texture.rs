//! Image texture loading and caching.
//!
//! Decodes image files into an RGB float buffer that the renderer samples
//! by surface UV. Images referenced more than once by a scene are decoded
//! once and shared.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use lux_math::Vec3;
use thiserror::Error;

/// Errors that can occur during texture loading.
#[derive(Error, Debug)]
pub enum TextureError {
    #[error("Failed to load texture {path}: {source}")]
    Load {
        path: String,
        #[source]
        source: image::ImageError,
    },

    #[error("Texture {0} has no pixels")]
    Empty(String),
}

pub type TextureResult<T> = Result<T, TextureError>;

/// How an image is sampled between pixel centers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextureFilter {
    /// Pick the pixel under the sample point.
    #[default]
    Nearest,
    /// Blend the four surrounding pixels.
    Bilinear,
}

/// A decoded image with pixel data.
///
/// Channels are stored as `byte / 255` with no color-space conversion, so
/// texel values match the file's raw RGB values.
#[derive(Clone, Debug)]
pub struct ImageData {
    /// Texture width in pixels
    pub width: u32,

    /// Texture height in pixels
    pub height: u32,

    /// Row-major RGB pixels, top row first
    pub pixels: Vec<[f32; 3]>,

    /// Original file path (for debugging)
    pub path: String,
}

impl ImageData {
    /// Create a new image from pixel data.
    pub fn new(width: u32, height: u32, pixels: Vec<[f32; 3]>, path: impl Into<String>) -> Self {
        debug_assert_eq!(pixels.len(), (width * height) as usize);
        Self {
            width,
            height,
            pixels,
            path: path.into(),
        }
    }

    /// Sample at UV coordinates with the given filter.
    ///
    /// `(0, 0)` is the bottom-left of the image. Both axes are clamped to
    /// valid pixel indices.
    pub fn sample(&self, u: f32, v: f32, filter: TextureFilter) -> Vec3 {
        match filter {
            TextureFilter::Nearest => self.sample_nearest(u, v),
            TextureFilter::Bilinear => self.sample_bilinear(u, v),
        }
    }

    fn sample_nearest(&self, u: f32, v: f32) -> Vec3 {
        let w = self.width as f32;
        let h = self.height as f32;

        let x = (u * w) as i64;
        let y = ((1.0 - v) * h - 0.001) as i64;

        self.texel(x, y)
    }

    fn sample_bilinear(&self, u: f32, v: f32) -> Vec3 {
        // Pixel-center coordinates
        let x = u * self.width as f32 - 0.5;
        let y = (1.0 - v) * self.height as f32 - 0.5;

        let x0 = x.floor();
        let y0 = y.floor();
        let fx = x - x0;
        let fy = y - y0;
        let (x0, y0) = (x0 as i64, y0 as i64);

        let top = self.texel(x0, y0) * (1.0 - fx) + self.texel(x0 + 1, y0) * fx;
        let bottom = self.texel(x0, y0 + 1) * (1.0 - fx) + self.texel(x0 + 1, y0 + 1) * fx;

        top * (1.0 - fy) + bottom * fy
    }

    /// Pixel at integer coordinates, clamped to the image.
    fn texel(&self, x: i64, y: i64) -> Vec3 {
        let x = x.clamp(0, self.width as i64 - 1) as usize;
        let y = y.clamp(0, self.height as i64 - 1) as usize;
        Vec3::from(self.pixels[y * self.width as usize + x])
    }

    /// Get total size in bytes (approximate).
    pub fn size_bytes(&self) -> usize {
        self.pixels.len() * std::mem::size_of::<[f32; 3]>()
    }
}

/// Cache for loaded images.
///
/// Images are loaded on-demand and cached by the path they were requested
/// with.
pub struct TextureCache {
    /// Cached images by requested path
    textures: HashMap<String, Arc<ImageData>>,

    /// Base directory for resolving relative paths
    base_dir: Option<PathBuf>,
}

impl TextureCache {
    /// Create a new empty texture cache.
    pub fn new() -> Self {
        Self {
            textures: HashMap::new(),
            base_dir: None,
        }
    }

    /// Create a texture cache with a base directory for relative paths.
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            textures: HashMap::new(),
            base_dir: Some(base_dir.into()),
        }
    }

    /// Load an image from file, using cache if available.
    pub fn load(&mut self, path: &str) -> TextureResult<Arc<ImageData>> {
        if let Some(texture) = self.textures.get(path) {
            return Ok(texture.clone());
        }

        let full_path = resolve_path(self.base_dir.as_deref(), path);
        let texture = Arc::new(load_image_file(&full_path)?);
        self.textures.insert(path.to_string(), texture.clone());

        log::debug!(
            "Loaded texture: {} ({}x{}, {:.1} KB)",
            path,
            texture.width,
            texture.height,
            texture.size_bytes() as f32 / 1024.0
        );

        Ok(texture)
    }

    /// Get the number of cached textures.
    pub fn len(&self) -> usize {
        self.textures.len()
    }

    /// Check if cache is empty.
    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }
}

impl Default for TextureCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve an asset path.
///
/// Paths that exist as given (absolute, or relative to the working
/// directory) are used directly; otherwise relative paths are joined onto
/// `base_dir`.
pub(crate) fn resolve_path(base_dir: Option<&Path>, path: &str) -> PathBuf {
    let path = Path::new(path);

    if path.is_absolute() || path.exists() {
        return path.to_path_buf();
    }

    match base_dir {
        Some(base) => base.join(path),
        None => path.to_path_buf(),
    }
}

/// Load an image from a file path.
fn load_image_file(path: &Path) -> TextureResult<ImageData> {
    let display = path.display().to_string();
    let img = image::open(path).map_err(|source| TextureError::Load {
        path: display.clone(),
        source,
    })?;

    let rgb = img.to_rgb8();
    let (width, height) = rgb.dimensions();
    if width == 0 || height == 0 {
        return Err(TextureError::Empty(display));
    }

    let pixels: Vec<[f32; 3]> = rgb
        .pixels()
        .map(|p| {
            [
                p[0] as f32 / 255.0,
                p[1] as f32 / 255.0,
                p[2] as f32 / 255.0,
            ]
        })
        .collect();

    Ok(ImageData::new(width, height, pixels, display))
}
