//! Transform Component
//!
//! Local position/rotation/scale relative to the parent, plus a cached
//! copy of the parent's global matrix that the scene refreshes once per
//! frame:
//!
//! global = parent_transform * local
//!
//! Roots have an identity `parent_transform`.

use serde::{Deserialize, Serialize};

use crate::ecs::{EcsError, EntityRegistry, Identifier};
use crate::math::{
    mat4_mul, mat4_rotation_z, mat4_scale, mat4_translation, Mat4, Vec2, Vec3, MAT4_IDENTITY,
};

use super::hierarchy::Hierarchy;

fn identity() -> Mat4 {
    MAT4_IDENTITY
}

/// Local transform relative to parent (or world if no parent).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Position relative to parent
    pub position: Vec2,
    /// Rotation about Z in degrees
    pub rotation: f32,
    pub scale: Vec2,
    /// Parent's global matrix as of the last update
    #[serde(skip, default = "identity")]
    pub parent_transform: Mat4,
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        position: Vec2::ZERO,
        rotation: 0.0,
        scale: Vec2::ONE,
        parent_transform: MAT4_IDENTITY,
    };

    pub fn from_position(position: Vec2) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    pub fn with_rotation(mut self, degrees: f32) -> Self {
        self.rotation = degrees;
        self
    }

    pub fn with_scale(mut self, scale: Vec2) -> Self {
        self.scale = scale;
        self
    }

    /// Local matrix: translate * rotate * scale
    pub fn local_matrix(&self) -> Mat4 {
        let translation = mat4_translation(Vec3::new(self.position.x, self.position.y, 0.0));
        let rotation = mat4_rotation_z(self.rotation);
        let scale = mat4_scale(self.scale);
        mat4_mul(&translation, &mat4_mul(&rotation, &scale))
    }

    /// World matrix, valid as of the last hierarchy update
    pub fn global_matrix(&self) -> Mat4 {
        mat4_mul(&self.parent_transform, &self.local_matrix())
    }

    pub fn translate(&mut self, offset: Vec2) {
        self.position = self.position + offset;
    }

    pub fn rotate(&mut self, degrees: f32) {
        self.rotation += degrees;
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Recompute every cached `parent_transform` from the hierarchy.
///
/// Each chain tail (a transform whose children carry no transform) is
/// walked up to its root, then the chain is replayed root to leaf,
/// composing global matrices along the way. Links without a transform
/// pass their parent's matrix through unchanged.
///
/// Ancestors shared by several tails are recomputed for each; at the
/// entity counts this targets that is cheaper than tracking dirtiness.
pub fn propagate_transforms(registry: &mut EntityRegistry, hierarchy: &Hierarchy) -> Result<(), EcsError> {
    let tails: Vec<Identifier> = registry
        .view::<(Transform,)>()?
        .ids()
        .filter(|&id| {
            !hierarchy
                .children_of(id)
                .iter()
                .any(|&child| registry.has_component::<Transform>(child))
        })
        .collect();

    for tail in tails {
        let mut stack = hierarchy.chain_to_root(tail);
        let mut parent_global = MAT4_IDENTITY;
        while let Some(id) = stack.pop() {
            if let Some(transform) = registry.try_component_mut::<Transform>(id) {
                transform.parent_transform = parent_global;
                parent_global = transform.global_matrix();
            }
        }
    }
    Ok(())
}
