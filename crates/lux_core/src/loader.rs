//! Scene file loading.

use std::path::Path;

use thiserror::Error;

use crate::parser::{ParseError, SceneParser};
use crate::scene::Scene;

/// Errors that can occur during scene loading.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Cannot read scene file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: ParseError,
    },
}

/// Result type for loading operations.
pub type LoadResult<T> = Result<T, LoadError>;

/// Load and parse a scene file.
///
/// Asset paths inside the file that do not exist relative to the working
/// directory are resolved against the scene file's directory.
pub fn load_scene<P: AsRef<Path>>(path: P) -> LoadResult<Scene> {
    let path = path.as_ref();
    let display = path.display().to_string();

    let source = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: display.clone(),
        source,
    })?;

    let base_dir = path.parent().filter(|dir| !dir.as_os_str().is_empty());
    let scene = SceneParser::new(&source, base_dir)
        .parse()
        .map_err(|source| LoadError::Parse {
            path: display.clone(),
            source,
        })?;

    log::info!(
        "Loaded scene {}: {}x{}, {} materials, {} objects, {} triangles",
        display,
        scene.camera.width,
        scene.camera.height,
        scene.materials.len(),
        scene.object_count(),
        scene.triangle_count()
    );

    Ok(scene)
}
