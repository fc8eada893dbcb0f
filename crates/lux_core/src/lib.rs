//! Lux Core - Scene description and asset loading.
//!
//! This crate provides:
//!
//! - **Scene types**: `Scene`, `CameraDesc`, `MaterialDesc`, `TextureDesc`, `Object`
//! - **Scene files**: tokenizer and parser for the block-structured scene format
//! - **Assets**: OBJ meshes (via `tobj`) and image textures (via `image`)
//!
//! # Example
//!
//! ```ignore
//! use lux_core::load_scene;
//!
//! let scene = load_scene("scenes/cornell.txt")?;
//! println!("{} objects, {} materials", scene.object_count(), scene.materials.len());
//! ```

pub mod loader;
pub mod mesh;
pub mod parser;
pub mod scene;
pub mod texture;

// Re-export commonly used types
pub use loader::{load_scene, LoadError, LoadResult};
pub use mesh::{Mesh, MeshError, MeshTransform};
pub use parser::{parse_scene, ParseError, ParseResult, SceneParser};
pub use scene::{CameraDesc, MaterialDesc, Object, Scene, Shape, TextureDesc};
pub use texture::{ImageData, TextureCache, TextureError, TextureFilter};
