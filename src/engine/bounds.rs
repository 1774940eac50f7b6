// Axis-aligned bounding boxes and the static occluder index.
// The index is built once after the environment loads and never mutated.

use bevy_ecs::prelude::*;
use glam::{Mat4, Vec3};

// ============================================================================
// AABB
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn from_center_size(center: Vec3, size: Vec3) -> Self {
        let half = size * 0.5;
        Self { min: center - half, max: center + half }
    }

    /// Smallest box containing every point. `None` for an empty iterator.
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        Some(iter.fold(Self::new(first, first), |acc, p| Self::new(acc.min.min(p), acc.max.max(p))))
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb::new(self.min.min(other.min), self.max.max(other.max))
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn translated(&self, offset: Vec3) -> Aabb {
        Aabb::new(self.min + offset, self.max + offset)
    }

    /// The eight corners, min corner first.
    pub fn corners(&self) -> [Vec3; 8] {
        let (a, b) = (self.min, self.max);
        [
            Vec3::new(a.x, a.y, a.z),
            Vec3::new(b.x, a.y, a.z),
            Vec3::new(a.x, b.y, a.z),
            Vec3::new(b.x, b.y, a.z),
            Vec3::new(a.x, a.y, b.z),
            Vec3::new(b.x, a.y, b.z),
            Vec3::new(a.x, b.y, b.z),
            Vec3::new(b.x, b.y, b.z),
        ]
    }

    /// Box enclosing this box after an affine transform (all 8 corners).
    pub fn transformed(&self, matrix: &Mat4) -> Aabb {
        let corners = self.corners().map(|c| matrix.transform_point3(c));
        // 8 corners, never empty
        Aabb::from_points(corners).unwrap_or(*self)
    }

    /// Closed-interval overlap on all three axes. Touching faces count.
    ///
    /// Inverted intervals (min > max on an axis) are compared as-is, so a
    /// vertically inflated query box still behaves like the reference
    /// `min <= other.max && max >= other.min` test.
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x && self.max.x >= other.min.x
            && self.min.y <= other.max.y && self.max.y >= other.min.y
            && self.min.z <= other.max.z && self.max.z >= other.min.z
    }
}

// ============================================================================
// BOUNDING VOLUME INDEX
// ============================================================================

/// One world-space box per static occluder mesh.
///
/// Empty until `build` is called; an empty index never reports an
/// intersection, so movement is never blocked before the environment exists.
#[derive(Resource, Debug, Default, Clone)]
pub struct BoundingVolumeIndex {
    boxes: Vec<Aabb>,
}

impl BoundingVolumeIndex {
    /// Collect the box of every mesh whose name is not `exclude_name`.
    pub fn build<'a>(
        meshes: impl IntoIterator<Item = (&'a str, Aabb)>,
        exclude_name: &str,
    ) -> Self {
        let boxes = meshes
            .into_iter()
            .filter(|(name, _)| *name != exclude_name)
            .map(|(_, bounds)| bounds)
            .collect();
        Self { boxes }
    }

    pub fn intersects_any(&self, query: &Aabb) -> bool {
        self.boxes.iter().any(|b| query.intersects(b))
    }

    pub fn boxes(&self) -> &[Aabb] { &self.boxes }
    pub fn len(&self) -> usize { self.boxes.len() }
    pub fn is_empty(&self) -> bool { self.boxes.is_empty() }
}
