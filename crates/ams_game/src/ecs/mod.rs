//! Entity/Component layer
//!
//! Entities own a [`Transform`] plus any number of boxed [`Component`]s.
//! Components that implement [`Behavior`] receive lifecycle callbacks from
//! the owning scene; [`Camera`] components are indexed by the scene.

pub mod behavior;
pub mod camera;
pub mod component;
pub mod entity;
pub mod transform;

pub use behavior::{Behavior, BehaviorContext, Hook};
pub use camera::Camera;
pub use component::{AsAny, Component, ComponentHandle, ComponentSlot};
pub use entity::Entity;
pub use transform::Transform;
