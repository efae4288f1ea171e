//! Entity implementation

use crate::ecs::{AsAny, Component, ComponentHandle, ComponentSlot, Transform};
use crate::object::{Object, ObjectId};
use std::collections::BTreeSet;

/// A named container of components, always including exactly one [`Transform`]
///
/// Entities only exist inside a [`Scene`](crate::scene::Scene); create them
/// with [`Scene::create_entity`](crate::scene::Scene::create_entity).
#[derive(Debug)]
pub struct Entity {
    object: Object,
    scene: ObjectId,
    transform: Transform,
    components: Vec<ComponentSlot>,
    behaviors: BTreeSet<ObjectId>,
}

impl Entity {
    pub(crate) fn new(scene: ObjectId, name: Option<String>) -> Self {
        let object = match name {
            Some(name) => Object::named(name),
            None => Object::new(),
        };
        let transform = Transform::new(object.id());
        Self {
            object,
            scene,
            transform,
            components: Vec::new(),
            behaviors: BTreeSet::new(),
        }
    }

    /// Entity id
    pub const fn id(&self) -> ObjectId {
        self.object.id()
    }

    /// Entity name
    pub fn name(&self) -> &str {
        self.object.name()
    }

    /// Rename the entity
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.object.set_name(name);
    }

    /// Id of the owning scene
    pub const fn scene(&self) -> ObjectId {
        self.scene
    }

    /// The entity's transform
    pub const fn transform(&self) -> &Transform {
        &self.transform
    }

    /// The entity's transform, mutably
    pub fn transform_mut(&mut self) -> &mut Transform {
        &mut self.transform
    }

    /// Components added after the transform, in insertion order
    pub fn components(&self) -> &[ComponentSlot] {
        &self.components
    }

    /// Number of components, the transform included
    pub fn component_count(&self) -> usize {
        self.components.len() + 1
    }

    /// Ids of the components that are behaviors
    pub fn behavior_ids(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.behaviors.iter().copied()
    }

    /// First component of type `T`; the transform counts as the first component
    pub fn component<T: Component>(&self) -> Option<&T> {
        if let Some(transform) = self.transform.as_any().downcast_ref::<T>() {
            return Some(transform);
        }
        self.components
            .iter()
            .find_map(|slot| slot.component().downcast_ref::<T>())
    }

    /// First component of type `T`, mutably
    pub fn component_mut<T: Component>(&mut self) -> Option<&mut T> {
        if self.transform.as_any().is::<T>() {
            return self.transform.as_any_mut().downcast_mut::<T>();
        }
        self.components
            .iter_mut()
            .find_map(|slot| slot.component_mut().downcast_mut::<T>())
    }

    /// Handle of the first component of type `T` (the transform has none)
    pub fn find<T: Component>(&self) -> Option<ComponentHandle> {
        self.components
            .iter()
            .find(|slot| slot.component().is::<T>())
            .map(ComponentSlot::handle)
    }

    /// Component record by id
    pub fn slot(&self, component: ObjectId) -> Option<&ComponentSlot> {
        self.components.iter().find(|slot| slot.id() == component)
    }

    pub(crate) fn slot_mut(&mut self, component: ObjectId) -> Option<&mut ComponentSlot> {
        self.components.iter_mut().find(|slot| slot.id() == component)
    }

    /// Split borrow of the transform and one component record
    pub(crate) fn transform_and_slot(
        &mut self,
        component: ObjectId,
    ) -> Option<(&mut Transform, &mut ComponentSlot)> {
        let Self {
            transform,
            components,
            ..
        } = self;
        components
            .iter_mut()
            .find(|slot| slot.id() == component)
            .map(|slot| (transform, slot))
    }

    pub(crate) fn push_component(&mut self, component: Box<dyn Component>) -> ComponentHandle {
        let slot = ComponentSlot::new(self.id(), component);
        let handle = slot.handle();
        if slot.is_behavior() {
            self.behaviors.insert(handle.component);
        }
        self.components.push(slot);
        handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::Camera;

    struct Tag;
    impl Component for Tag {}

    #[test]
    fn test_new_entity_owns_transform() {
        let entity = Entity::new(ObjectId::generate(), None);
        assert_eq!(entity.transform().entity(), entity.id());
        assert_eq!(entity.component_count(), 1);
        assert!(entity.component::<Transform>().is_some());
        assert_eq!(entity.name(), format!("Object_{}", entity.id()));
    }

    #[test]
    fn test_component_lookup() {
        let mut entity = Entity::new(ObjectId::generate(), Some("Ship".to_string()));
        assert!(entity.component::<Tag>().is_none());

        let handle = entity.push_component(Box::new(Camera::default()));
        entity.push_component(Box::new(Tag));

        assert_eq!(entity.find::<Camera>(), Some(handle));
        assert!(entity.component::<Tag>().is_some());
        entity.component_mut::<Camera>().unwrap().set_fov(60.0);
        assert_eq!(entity.component::<Camera>().unwrap().fov(), 60.0);
        assert_eq!(entity.behavior_ids().count(), 0);
    }
}
