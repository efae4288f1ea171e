//! Transform component
//!
//! Every entity owns exactly one transform, created with the entity. The
//! hierarchy is stored as entity ids: the parent link on the child and a
//! child set on the parent. Only the scene rewires it, see
//! [`Scene::set_parent`](crate::scene::Scene::set_parent).

use crate::ecs::Component;
use crate::foundation::math::{compose_trs, Mat4, Quat, Vec3};
use crate::object::ObjectId;
use std::collections::BTreeSet;

/// Local position, rotation and scale of an entity plus its hierarchy links
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    entity: ObjectId,
    /// Position relative to the parent
    pub position: Vec3,
    /// Rotation relative to the parent
    pub rotation: Quat,
    /// Scale relative to the parent
    pub scale: Vec3,
    parent: Option<ObjectId>,
    children: BTreeSet<ObjectId>,
}

impl Component for Transform {}

impl Transform {
    pub(crate) fn new(entity: ObjectId) -> Self {
        Self {
            entity,
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
            parent: None,
            children: BTreeSet::new(),
        }
    }

    /// Entity owning this transform
    pub const fn entity(&self) -> ObjectId {
        self.entity
    }

    /// Parent entity, if any
    pub const fn parent(&self) -> Option<ObjectId> {
        self.parent
    }

    /// Child entities, ordered by id
    pub fn children(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.children.iter().copied()
    }

    /// Number of children
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Whether `entity` is a direct child
    pub fn has_child(&self, entity: ObjectId) -> bool {
        self.children.contains(&entity)
    }

    /// Matrix relative to the parent
    pub fn local_matrix(&self) -> Mat4 {
        compose_trs(&self.position, &self.rotation, &self.scale)
    }

    /// Move by `delta`
    pub fn translate(&mut self, delta: Vec3) {
        self.position += delta;
    }

    /// Apply `rotation` on top of the current one
    pub fn rotate(&mut self, rotation: Quat) {
        self.rotation = rotation * self.rotation;
    }

    pub(crate) fn set_parent_link(&mut self, parent: Option<ObjectId>) {
        self.parent = parent;
    }

    pub(crate) fn add_child_link(&mut self, child: ObjectId) {
        self.children.insert(child);
    }

    pub(crate) fn remove_child_link(&mut self, child: ObjectId) -> bool {
        self.children.remove(&child)
    }

    pub(crate) fn take_children(&mut self) -> BTreeSet<ObjectId> {
        std::mem::take(&mut self.children)
    }
}
