//! Component trait and the engine-side component record

use crate::ecs::{Behavior, Camera};
use crate::object::{Object, ObjectId};
use std::any::Any;

/// Upcast helper so boxed components can be downcast to their concrete type
pub trait AsAny: Any {
    /// `&dyn Any` view of `self`
    fn as_any(&self) -> &dyn Any;
    /// `&mut dyn Any` view of `self`
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A unit of per-entity state
///
/// Plain data components only need an empty impl. Behaviors and cameras
/// override the matching accessor so the scene can index them; use
/// [`impl_behavior!`](crate::impl_behavior) for behaviors.
pub trait Component: AsAny {
    /// This component viewed as a behavior
    fn as_behavior(&self) -> Option<&dyn Behavior> {
        None
    }

    /// This component viewed as a mutable behavior
    fn as_behavior_mut(&mut self) -> Option<&mut dyn Behavior> {
        None
    }

    /// This component viewed as a camera
    fn as_camera(&self) -> Option<&Camera> {
        None
    }

    /// This component viewed as a mutable camera
    fn as_camera_mut(&mut self) -> Option<&mut Camera> {
        None
    }
}

impl dyn Component {
    /// Downcast to a concrete component type
    pub fn downcast_ref<T: Component>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Downcast to a concrete component type, mutably
    pub fn downcast_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }

    /// Whether the component is a `T`
    pub fn is<T: Component>(&self) -> bool {
        self.as_any().is::<T>()
    }
}

/// Wire a type up as a [`Behavior`] component
///
/// ```
/// use ams_game::prelude::*;
///
/// #[derive(Default)]
/// struct Spinner;
///
/// impl Behavior for Spinner {}
/// ams_game::impl_behavior!(Spinner);
/// ```
#[macro_export]
macro_rules! impl_behavior {
    ($ty:ty) => {
        impl $crate::ecs::Component for $ty {
            fn as_behavior(&self) -> Option<&dyn $crate::ecs::Behavior> {
                Some(self)
            }

            fn as_behavior_mut(&mut self) -> Option<&mut dyn $crate::ecs::Behavior> {
                Some(self)
            }
        }
    };
}

/// Address of a component: owning entity plus the component's own id
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ComponentHandle {
    /// Owning entity
    pub entity: ObjectId,
    /// Component id
    pub component: ObjectId,
}

/// Engine-managed record wrapping a user component
///
/// Holds the component's identity, owner and enabled flag. Owned by an
/// [`Entity`](crate::ecs::Entity); it never outlives it.
pub struct ComponentSlot {
    object: Object,
    entity: ObjectId,
    enabled: bool,
    component: Box<dyn Component>,
}

impl ComponentSlot {
    pub(crate) fn new(entity: ObjectId, component: Box<dyn Component>) -> Self {
        Self {
            object: Object::new(),
            entity,
            enabled: true,
            component,
        }
    }

    /// Component id
    pub const fn id(&self) -> ObjectId {
        self.object.id()
    }

    /// Component name
    pub fn name(&self) -> &str {
        self.object.name()
    }

    /// Owning entity id
    pub const fn entity(&self) -> ObjectId {
        self.entity
    }

    /// Handle addressing this component
    pub const fn handle(&self) -> ComponentHandle {
        ComponentHandle {
            entity: self.entity,
            component: self.object.id(),
        }
    }

    /// Whether the component is enabled
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub(crate) fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Whether the wrapped component is a behavior
    pub fn is_behavior(&self) -> bool {
        self.component.as_behavior().is_some()
    }

    /// Whether the wrapped component is a camera
    pub fn is_camera(&self) -> bool {
        self.component.as_camera().is_some()
    }

    /// The wrapped component
    pub fn component(&self) -> &dyn Component {
        self.component.as_ref()
    }

    /// The wrapped component, mutably
    pub fn component_mut(&mut self) -> &mut dyn Component {
        self.component.as_mut()
    }
}

impl std::fmt::Debug for ComponentSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentSlot")
            .field("id", &self.object.id())
            .field("name", &self.object.name())
            .field("entity", &self.entity)
            .field("enabled", &self.enabled)
            .field("behavior", &self.is_behavior())
            .field("camera", &self.is_camera())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Health(u32);
    impl Component for Health {}

    #[derive(Default)]
    struct Wander;
    impl Behavior for Wander {}
    crate::impl_behavior!(Wander);

    #[test]
    fn test_downcast() {
        let boxed: Box<dyn Component> = Box::new(Health(7));
        assert!(boxed.is::<Health>());
        assert_eq!(boxed.downcast_ref::<Health>().map(|h| h.0), Some(7));
        assert!(boxed.downcast_ref::<Wander>().is_none());
    }

    #[test]
    fn test_slot_classification() {
        let owner = ObjectId::generate();
        let plain = ComponentSlot::new(owner, Box::new(Health(1)));
        let behavior = ComponentSlot::new(owner, Box::new(Wander));

        assert!(!plain.is_behavior());
        assert!(behavior.is_behavior());
        assert!(behavior.is_enabled());
        assert_eq!(behavior.entity(), owner);
        assert_ne!(plain.id(), behavior.id());
        assert_eq!(behavior.handle().component, behavior.id());
    }
}
