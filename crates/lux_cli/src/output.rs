//! Writing rendered images to disk.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use lux_renderer::ImageBuffer;

/// Output encodings, picked from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Plain-text `P3` pixmap
    Ppm,
    Bmp,
    Png,
}

impl OutputFormat {
    /// `.bmp` and `.png` (any case) select those encoders; anything else is
    /// written as PPM.
    pub fn from_path(path: &Path) -> Self {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());

        match extension.as_deref() {
            Some("bmp") => OutputFormat::Bmp,
            Some("png") => OutputFormat::Png,
            _ => OutputFormat::Ppm,
        }
    }
}

/// Write `buffer` as plain-text PPM, top row first.
pub fn write_ppm<W: Write>(buffer: &ImageBuffer, mut out: W) -> std::io::Result<()> {
    writeln!(out, "P3")?;
    writeln!(out, "{} {}", buffer.width, buffer.height)?;
    writeln!(out, "255")?;

    let width = buffer.width.max(1) as usize;
    for row in buffer.to_rgb().chunks(width) {
        let line: Vec<String> = row
            .iter()
            .map(|[r, g, b]| format!("{} {} {}", r, g, b))
            .collect();
        writeln!(out, "{}", line.join(" "))?;
    }
    out.flush()
}

/// Save `buffer` to `path` in the format its extension selects.
pub fn save_image(buffer: &ImageBuffer, path: &Path) -> Result<()> {
    let format = match OutputFormat::from_path(path) {
        OutputFormat::Ppm => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            return write_ppm(buffer, BufWriter::new(file))
                .with_context(|| format!("Failed to write {}", path.display()));
        }
        OutputFormat::Bmp => image::ImageFormat::Bmp,
        OutputFormat::Png => image::ImageFormat::Png,
    };

    let rgb = buffer.to_rgb();
    let bytes: &[u8] = bytemuck::cast_slice(&rgb);

    image::save_buffer_with_format(
        path,
        bytes,
        buffer.width,
        buffer.height,
        image::ColorType::Rgb8,
        format,
    )
    .with_context(|| format!("Failed to encode {}", path.display()))
}
