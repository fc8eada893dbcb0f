//! Scene assembly: turns a parsed [`Scene`] description into renderable
//! primitives, materials and textures.

use std::sync::Arc;

use crate::texture::Perlin;
use crate::triangle::triangles_from_mesh;
use crate::{
    BezierCurve, BvhNode, Camera, Color, ConstantMedium, Dielectric, DiffuseLight, Hittable,
    HittableList, Lambertian, Material, Metal, MovingSphere, Rectangle, RevolutionSurface, Sphere,
    Texture, Triangle,
};
use lux_core::{MaterialDesc, Object, Scene, Shape, TextureDesc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while assembling a world.
#[derive(Error, Debug)]
pub enum WorldError {
    #[error("Object uses material {index}, but the scene defines {count} materials")]
    MissingMaterial { index: usize, count: usize },
}

pub type WorldResult<T> = Result<T, WorldError>;

/// How top-level objects are organized for intersection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Acceleration {
    /// Bounding volume hierarchy over all bounded objects.
    #[default]
    Bvh,
    /// Linear scan over every object. Meshes still get their own BVH.
    List,
}

/// Everything needed to render: camera, background and the object tree.
pub struct World {
    pub camera: Camera,
    pub background: Color,
    root: Arc<dyn Hittable>,
    primitive_count: usize,
}

impl World {
    /// Build the world for `scene`.
    ///
    /// `rng` seeds the noise table and the BVH split axes, so a fixed seed
    /// gives a reproducible world.
    pub fn from_scene(
        scene: &Scene,
        acceleration: Acceleration,
        rng: &mut dyn RngCore,
    ) -> WorldResult<Self> {
        let mut builder = Builder::new(scene, rng);

        let mut objects = Vec::new();
        for object in &scene.objects {
            builder.add_object(object, rng, &mut objects)?;
        }
        let primitive_count = objects.len();

        let root: Arc<dyn Hittable> = match acceleration {
            Acceleration::Bvh => builder.accelerate(objects, rng),
            Acceleration::List => Arc::new(HittableList::from_objects(objects)),
        };

        log::info!(
            "Assembled world: {} primitives, {} materials ({:?})",
            primitive_count,
            builder.materials.len(),
            acceleration
        );

        Ok(Self {
            camera: Camera::new(&scene.camera),
            background: scene.background,
            root,
            primitive_count,
        })
    }

    /// Root of the object tree.
    pub fn root(&self) -> &dyn Hittable {
        self.root.as_ref()
    }

    /// Number of top-level primitives after flattening groups. A mesh
    /// counts once.
    pub fn primitive_count(&self) -> usize {
        self.primitive_count
    }
}

/// Shared state while converting scene objects.
struct Builder {
    materials: Vec<Arc<dyn Material>>,
    time0: f32,
    time1: f32,
}

impl Builder {
    fn new(scene: &Scene, rng: &mut dyn RngCore) -> Self {
        // One noise table shared by every marble texture
        let perlin = Arc::new(Perlin::new(rng));

        let materials = scene
            .materials
            .iter()
            .map(|desc| build_material(desc, &perlin))
            .collect();

        Self {
            materials,
            time0: scene.camera.time0,
            time1: scene.camera.time1,
        }
    }

    fn material(&self, index: usize) -> WorldResult<Arc<dyn Material>> {
        self.materials
            .get(index)
            .cloned()
            .ok_or(WorldError::MissingMaterial {
                index,
                count: self.materials.len(),
            })
    }

    /// Convert `object` and append the results to `out`. Groups are
    /// flattened.
    fn add_object(
        &self,
        object: &Object,
        rng: &mut dyn RngCore,
        out: &mut Vec<Arc<dyn Hittable>>,
    ) -> WorldResult<()> {
        match object {
            Object::Surface { material, shape } => {
                let material = self.material(*material)?;
                if let Some(primitive) = self.build_shape(shape, material, rng) {
                    out.push(primitive);
                }
            }

            Object::Medium {
                boundary,
                density,
                color,
            } => {
                let mut parts = Vec::new();
                self.add_object(boundary, rng, &mut parts)?;

                let boundary: Arc<dyn Hittable> = if parts.len() == 1 {
                    Arc::clone(&parts[0])
                } else {
                    Arc::new(HittableList::from_objects(parts))
                };
                out.push(Arc::new(ConstantMedium::new(boundary, *density, *color)));
            }

            Object::Group(children) => {
                for child in children {
                    self.add_object(child, rng, out)?;
                }
            }
        }
        Ok(())
    }

    fn build_shape(
        &self,
        shape: &Shape,
        material: Arc<dyn Material>,
        rng: &mut dyn RngCore,
    ) -> Option<Arc<dyn Hittable>> {
        let primitive: Arc<dyn Hittable> = match shape {
            Shape::Sphere { center, radius } => Arc::new(Sphere::new(*center, *radius, material)),

            Shape::MovingSphere {
                center0,
                center1,
                time0,
                time1,
                radius,
            } => Arc::new(MovingSphere::new(
                *center0, *center1, *time0, *time1, *radius, material,
            )),

            Shape::Triangle(vertices) => Arc::new(Triangle::new(*vertices, material)),

            Shape::Rectangle(corners) => Arc::new(Rectangle::new(*corners, material)),

            Shape::Mesh(mesh) => {
                let triangles = triangles_from_mesh(mesh, &material);
                if triangles.is_empty() {
                    log::warn!("Skipping mesh without triangles");
                    return None;
                }
                log::debug!("Building mesh BVH over {} triangles", triangles.len());
                Arc::new(BvhNode::new(triangles, self.time0, self.time1, rng))
            }

            Shape::Revolution { center, controls } => Arc::new(RevolutionSurface::new(
                *center,
                BezierCurve::new(controls.clone()),
                material,
            )),
        };
        Some(primitive)
    }

    /// Put bounded objects in a BVH. Unbounded ones cannot be placed in the
    /// tree, so they are scanned linearly next to it.
    fn accelerate(&self, objects: Vec<Arc<dyn Hittable>>, rng: &mut dyn RngCore) -> Arc<dyn Hittable> {
        let (bounded, unbounded): (Vec<_>, Vec<_>) = objects
            .into_iter()
            .partition(|object| object.bounding_box(self.time0, self.time1).is_some());

        let bvh = BvhNode::new(bounded, self.time0, self.time1, rng);
        log::debug!("Top-level BVH: {} primitives, depth {}", bvh.len(), bvh.depth());

        if unbounded.is_empty() {
            return Arc::new(bvh);
        }

        log::warn!(
            "{} unbounded primitives kept outside the BVH",
            unbounded.len()
        );
        let mut list = HittableList::from_objects(unbounded);
        list.add(Arc::new(bvh));
        Arc::new(list)
    }
}

fn build_texture(desc: &TextureDesc, perlin: &Arc<Perlin>) -> Arc<Texture> {
    let texture = match desc {
        TextureDesc::Constant(color) => Texture::Solid(*color),

        TextureDesc::Checker {
            color1,
            color2,
            scale,
        } => Texture::Checker {
            odd: Arc::new(Texture::Solid(*color1)),
            even: Arc::new(Texture::Solid(*color2)),
            scale: *scale,
        },

        TextureDesc::Noise {
            scale,
            color1,
            color2,
        } => Texture::Marble {
            noise: Arc::clone(perlin),
            scale: *scale,
            color1: *color1,
            color2: *color2,
        },

        TextureDesc::Image { image, filter } => Texture::Image {
            image: Arc::clone(image),
            filter: *filter,
        },
    };
    Arc::new(texture)
}

fn build_material(desc: &MaterialDesc, perlin: &Arc<Perlin>) -> Arc<dyn Material> {
    match desc {
        MaterialDesc::Diffuse { texture } => Arc::new(Lambertian::new(build_texture(texture, perlin))),
        MaterialDesc::Specular { texture, fuzz } => {
            Arc::new(Metal::new(build_texture(texture, perlin), *fuzz))
        }
        MaterialDesc::Refract { ri, color } => Arc::new(Dielectric::new(*ri, *color)),
        MaterialDesc::DiffuseLight { texture } => {
            Arc::new(DiffuseLight::new(build_texture(texture, perlin)))
        }
    }
}
