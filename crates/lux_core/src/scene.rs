//! Scene description types.
//!
//! This module defines a renderer-agnostic description of everything a scene
//! file declares: camera, background, a material table and an object tree.
//! Assets (meshes, images) are already loaded; nothing here knows how to
//! trace a ray.

use std::sync::Arc;

use lux_math::Vec3;

use crate::mesh::Mesh;
use crate::texture::{ImageData, TextureFilter};

/// Thin-lens camera parameters as written in the scene file.
#[derive(Clone, Debug, PartialEq)]
pub struct CameraDesc {
    pub from: Vec3,
    pub at: Vec3,
    pub up: Vec3,

    /// Vertical field of view in degrees
    pub fov_degrees: f32,

    /// Image width in pixels
    pub width: u32,

    /// Image height in pixels
    pub height: u32,

    /// Lens diameter (0 = pinhole)
    pub aperture: f32,

    /// Distance to the plane in perfect focus
    pub focus_dist: f32,

    /// Shutter open time
    pub time0: f32,

    /// Shutter close time
    pub time1: f32,
}

impl CameraDesc {
    /// Create a pinhole camera with an instantaneous shutter.
    pub fn new(from: Vec3, at: Vec3, up: Vec3, fov_degrees: f32, width: u32, height: u32) -> Self {
        Self {
            from,
            at,
            up,
            fov_degrees,
            width,
            height,
            aperture: 0.0,
            focus_dist: 1.0,
            time0: 0.0,
            time1: 0.0,
        }
    }

    /// Width divided by height.
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

/// Surface color source.
#[derive(Clone, Debug)]
pub enum TextureDesc {
    /// A single color everywhere
    Constant(Vec3),

    /// 3D checkerboard alternating between two colors
    Checker { color1: Vec3, color2: Vec3, scale: f32 },

    /// Marble-like Perlin turbulence blending two colors
    Noise { scale: f32, color1: Vec3, color2: Vec3 },

    /// Decoded image looked up by surface UV
    Image {
        image: Arc<ImageData>,
        filter: TextureFilter,
    },
}

/// Material entry in the scene's material table.
#[derive(Clone, Debug)]
pub enum MaterialDesc {
    Diffuse { texture: TextureDesc },
    Specular { texture: TextureDesc, fuzz: f32 },
    Refract { ri: f32, color: Vec3 },
    DiffuseLight { texture: TextureDesc },
}

/// Geometry of a single surface primitive.
#[derive(Clone, Debug)]
pub enum Shape {
    Sphere {
        center: Vec3,
        radius: f32,
    },

    /// Sphere whose center moves linearly from `center0` at `time0` to
    /// `center1` at `time1`
    MovingSphere {
        center0: Vec3,
        center1: Vec3,
        time0: f32,
        time1: f32,
        radius: f32,
    },

    Triangle([Vec3; 3]),

    /// Rectangle spanned by three corners; the third is projected so the
    /// corner at the second vertex is a right angle
    Rectangle([Vec3; 3]),

    /// Triangle mesh already transformed to world space
    Mesh(Arc<Mesh>),

    /// Bezier profile in the XY plane revolved about the Y axis
    Revolution { center: Vec3, controls: Vec<Vec3> },
}

/// Node of the scene's object tree.
#[derive(Clone, Debug)]
pub enum Object {
    /// A surface with an index into the scene's material table
    Surface { material: usize, shape: Shape },

    /// Constant-density fog bounded by another object
    Medium {
        boundary: Box<Object>,
        density: f32,
        color: Vec3,
    },

    /// Nested group of objects
    Group(Vec<Object>),
}

impl Object {
    /// Count surfaces and media in this subtree (groups are not counted).
    pub fn leaf_count(&self) -> usize {
        match self {
            Object::Surface { .. } | Object::Medium { .. } => 1,
            Object::Group(children) => children.iter().map(Object::leaf_count).sum(),
        }
    }

    /// Count triangles contributed by meshes, triangles and rectangles.
    pub fn triangle_count(&self) -> usize {
        match self {
            Object::Surface { shape, .. } => match shape {
                Shape::Triangle(_) => 1,
                Shape::Rectangle(_) => 2,
                Shape::Mesh(mesh) => mesh.triangle_count(),
                _ => 0,
            },
            Object::Medium { boundary, .. } => boundary.triangle_count(),
            Object::Group(children) => children.iter().map(Object::triangle_count).sum(),
        }
    }
}

/// A complete scene.
#[derive(Clone, Debug)]
pub struct Scene {
    pub camera: CameraDesc,

    /// Radiance returned by rays that escape the scene
    pub background: Vec3,

    /// Material table referenced by `Object::Surface::material`
    pub materials: Vec<MaterialDesc>,

    /// Top-level objects
    pub objects: Vec<Object>,
}

impl Scene {
    /// Create an empty scene with a black background.
    pub fn new(camera: CameraDesc) -> Self {
        Self {
            camera,
            background: Vec3::ZERO,
            materials: Vec::new(),
            objects: Vec::new(),
        }
    }

    /// Add a material and return its index.
    pub fn add_material(&mut self, material: MaterialDesc) -> usize {
        self.materials.push(material);
        self.materials.len() - 1
    }

    /// Add a top-level object.
    pub fn add_object(&mut self, object: Object) {
        self.objects.push(object);
    }

    /// Total number of surfaces and media, ignoring grouping.
    pub fn object_count(&self) -> usize {
        self.objects.iter().map(Object::leaf_count).sum()
    }

    /// Total triangle count across all objects.
    pub fn triangle_count(&self) -> usize {
        self.objects.iter().map(Object::triangle_count).sum()
    }
}
