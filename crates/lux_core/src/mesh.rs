//! Triangle mesh geometry loaded from OBJ files.
//!
//! The renderer never sees the file format: a mesh is a flat vertex buffer
//! plus triangle indices, already placed in world space.

use std::path::Path;

use lux_math::Vec3;
use thiserror::Error;

/// Errors that can occur during mesh loading.
#[derive(Error, Debug)]
pub enum MeshError {
    #[error("Failed to load OBJ {path}: {source}")]
    Obj {
        path: String,
        #[source]
        source: tobj::LoadError,
    },

    #[error("OBJ {0} contains no triangles")]
    NoGeometry(String),

    #[error("Triangle index {index} out of range ({count} vertices)")]
    IndexOutOfRange { index: u32, count: usize },
}

pub type MeshResult<T> = Result<T, MeshError>;

/// Placement applied to every vertex when a mesh is loaded.
///
/// Vertices are rotated about +Y, then scaled per axis, then translated.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeshTransform {
    pub scale: Vec3,
    pub center: Vec3,
    /// Rotation about the Y axis in degrees
    pub rotate_y: f32,
}

impl Default for MeshTransform {
    fn default() -> Self {
        Self {
            scale: Vec3::ONE,
            center: Vec3::ZERO,
            rotate_y: 0.0,
        }
    }
}

impl MeshTransform {
    /// Apply the transform to a single point.
    pub fn apply(&self, p: Vec3) -> Vec3 {
        let (sin, cos) = self.rotate_y.to_radians().sin_cos();
        let rotated = Vec3::new(p.x * cos + p.z * sin, p.y, -p.x * sin + p.z * cos);
        rotated * self.scale + self.center
    }
}

/// A mesh consisting of vertex positions and triangle indices.
#[derive(Clone, Debug)]
pub struct Mesh {
    /// Vertex positions (one Vec3 per vertex)
    pub positions: Vec<Vec3>,

    /// Triangle indices (every 3 indices form a triangle)
    pub indices: Vec<u32>,
}

impl Mesh {
    /// Create a new mesh from positions and indices.
    ///
    /// Every index must refer to an existing position.
    pub fn new(positions: Vec<Vec3>, indices: Vec<u32>) -> MeshResult<Self> {
        if let Some(&index) = indices.iter().find(|&&i| i as usize >= positions.len()) {
            return Err(MeshError::IndexOutOfRange {
                index,
                count: positions.len(),
            });
        }

        Ok(Self { positions, indices })
    }

    /// Load every model in an OBJ file into one mesh, placed by `transform`.
    pub fn load_obj(path: &Path, transform: &MeshTransform) -> MeshResult<Self> {
        let display = path.display().to_string();
        let (models, _materials) = tobj::load_obj(
            path,
            &tobj::LoadOptions {
                single_index: true,
                triangulate: true,
                ..Default::default()
            },
        )
        .map_err(|source| MeshError::Obj {
            path: display.clone(),
            source,
        })?;

        let mut positions = Vec::new();
        let mut indices = Vec::new();

        for model in &models {
            let base = positions.len() as u32;
            positions.extend(
                model
                    .mesh
                    .positions
                    .chunks_exact(3)
                    .map(|p| transform.apply(Vec3::from_slice(p))),
            );
            indices.extend(model.mesh.indices.iter().map(|i| base + i));
        }

        if indices.len() < 3 {
            return Err(MeshError::NoGeometry(display));
        }

        let mesh = Self::new(positions, indices)?;
        log::debug!(
            "Loaded mesh: {} ({} vertices, {} triangles)",
            display,
            mesh.vertex_count(),
            mesh.triangle_count()
        );
        Ok(mesh)
    }

    /// Iterate over the triangles as vertex triples.
    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.indices.chunks_exact(3).map(|face| {
            [
                self.positions[face[0] as usize],
                self.positions[face[1] as usize],
                self.positions[face[2] as usize],
            ]
        })
    }

    /// Get the number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Get the number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}
