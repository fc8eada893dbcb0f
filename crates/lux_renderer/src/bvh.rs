//! Bounding Volume Hierarchy (BVH) acceleration structure.
//!
//! A binary tree over the scene's primitives, split at the median along a
//! randomly chosen axis.

use std::sync::Arc;

use crate::{HitRecord, Hittable};
use lux_math::{Aabb, Interval, Ray};
use rand::{Rng, RngCore};

/// BVH node - either a branch with two children or a leaf with one
/// primitive.
///
/// Built once over a fixed shutter interval and never mutated.
pub enum BvhNode {
    /// Internal node with two children.
    Branch {
        left: Box<BvhNode>,
        right: Box<BvhNode>,
        bbox: Aabb,
    },
    /// Leaf node holding a single primitive.
    Leaf { object: Arc<dyn Hittable>, bbox: Aabb },
    /// Empty node (no bounded primitives).
    Empty,
}

impl BvhNode {
    /// Create a BVH from a list of hittable objects.
    ///
    /// Objects without a bounding box over `[time0, time1]` cannot be placed
    /// in the tree and are dropped with a warning.
    pub fn new(
        objects: Vec<Arc<dyn Hittable>>,
        time0: f32,
        time1: f32,
        rng: &mut dyn RngCore,
    ) -> Self {
        let total = objects.len();
        let bounded: Vec<(Arc<dyn Hittable>, Aabb)> = objects
            .into_iter()
            .filter_map(|object| {
                let bbox = object.bounding_box(time0, time1)?;
                Some((object, bbox))
            })
            .collect();

        if bounded.len() < total {
            log::warn!(
                "BVH: excluded {} of {} primitives without a bounding box",
                total - bounded.len(),
                total
            );
        }

        if bounded.is_empty() {
            return BvhNode::Empty;
        }
        Self::build(bounded, rng)
    }

    /// Recursive BVH construction.
    fn build(mut objects: Vec<(Arc<dyn Hittable>, Aabb)>, rng: &mut dyn RngCore) -> Self {
        let axis = rng.gen_range(0..3);
        let axis_min = |entry: &(Arc<dyn Hittable>, Aabb)| entry.1.axis_interval(axis).min;

        match objects.len() {
            0 => BvhNode::Empty,
            1 => {
                let (object, bbox) = objects.remove(0);
                BvhNode::Leaf { object, bbox }
            }
            2 => {
                if axis_min(&objects[1]) < axis_min(&objects[0]) {
                    objects.swap(0, 1);
                }
                let (right_object, right_bbox) = objects.remove(1);
                let (left_object, left_bbox) = objects.remove(0);

                BvhNode::Branch {
                    bbox: Aabb::surrounding(&left_bbox, &right_bbox),
                    left: Box::new(BvhNode::Leaf {
                        object: left_object,
                        bbox: left_bbox,
                    }),
                    right: Box::new(BvhNode::Leaf {
                        object: right_object,
                        bbox: right_bbox,
                    }),
                }
            }
            n => {
                // Stable, so equal keys keep their input order
                objects.sort_by(|a, b| axis_min(a).total_cmp(&axis_min(b)));

                let right_objects = objects.split_off(n / 2);
                let left = Self::build(objects, rng);
                let right = Self::build(right_objects, rng);

                let bbox = match (left.bbox(), right.bbox()) {
                    (Some(l), Some(r)) => Aabb::surrounding(&l, &r),
                    (Some(b), None) | (None, Some(b)) => b,
                    (None, None) => return BvhNode::Empty,
                };

                BvhNode::Branch {
                    left: Box::new(left),
                    right: Box::new(right),
                    bbox,
                }
            }
        }
    }

    fn bbox(&self) -> Option<Aabb> {
        match self {
            BvhNode::Empty => None,
            BvhNode::Leaf { bbox, .. } | BvhNode::Branch { bbox, .. } => Some(*bbox),
        }
    }

    /// Number of primitives in the tree.
    pub fn len(&self) -> usize {
        match self {
            BvhNode::Empty => 0,
            BvhNode::Leaf { .. } => 1,
            BvhNode::Branch { left, right, .. } => left.len() + right.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, BvhNode::Empty)
    }

    /// Depth of the deepest leaf.
    pub fn depth(&self) -> usize {
        match self {
            BvhNode::Empty => 0,
            BvhNode::Leaf { .. } => 1,
            BvhNode::Branch { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }
}

impl Hittable for BvhNode {
    fn hit(&self, ray: &Ray, ray_t: Interval, rng: &mut dyn RngCore) -> Option<HitRecord<'_>> {
        match self {
            BvhNode::Empty => None,

            BvhNode::Leaf { object, bbox } => {
                let mut box_t = ray_t;
                if !bbox.hit(ray, &mut box_t) {
                    return None;
                }
                object.hit(ray, ray_t, rng)
            }

            BvhNode::Branch { left, right, bbox } => {
                let mut box_t = ray_t;
                if !bbox.hit(ray, &mut box_t) {
                    return None;
                }

                let hit_left = left.hit(ray, ray_t, rng);

                // Only check right up to closest hit
                let right_max = hit_left.as_ref().map_or(ray_t.max, |rec| rec.t);
                let hit_right = right.hit(ray, Interval::new(ray_t.min, right_max), rng);

                hit_right.or(hit_left)
            }
        }
    }

    fn bounding_box(&self, _time0: f32, _time1: f32) -> Option<Aabb> {
        self.bbox()
    }
}
