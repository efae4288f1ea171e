//! Behaviors: components with lifecycle callbacks

use crate::ecs::{Component, Transform};
use crate::object::ObjectId;
use crate::scene::{AppRequest, SceneRequest};
use std::time::Duration;

/// A component with scriptable lifecycle callbacks, driven by its scene
///
/// All hooks default to no-ops. A behavior takes part in the scene's passes
/// only while it is enabled and registered.
///
/// | hook              | called                                            |
/// |-------------------|---------------------------------------------------|
/// | `on_enable`       | on registration and when the scene is entered     |
/// | `on_start`        | right after `on_enable` on registration           |
/// | `on_fixed_update` | every fixed step, before `on_update`              |
/// | `on_update`       | every fixed step                                  |
/// | `on_late_update`  | every rendered frame                              |
/// | `on_disable`      | on unregistration and when the scene is exited    |
/// | `on_destroy`      | when the owning entity is destroyed               |
#[allow(unused_variables)]
pub trait Behavior: Component {
    /// The behavior became active
    fn on_enable(&mut self, ctx: &mut BehaviorContext<'_>) {}

    /// The behavior became inactive
    fn on_disable(&mut self, ctx: &mut BehaviorContext<'_>) {}

    /// First activation after registration
    fn on_start(&mut self, ctx: &mut BehaviorContext<'_>) {}

    /// Fixed-timestep logic update
    fn on_update(&mut self, ctx: &mut BehaviorContext<'_>) {}

    /// Fixed-timestep hook run ahead of `on_update`
    fn on_fixed_update(&mut self, ctx: &mut BehaviorContext<'_>) {}

    /// Per-frame update after all fixed steps of the frame
    fn on_late_update(&mut self, ctx: &mut BehaviorContext<'_>) {}

    /// The owning entity is being destroyed
    fn on_destroy(&mut self, ctx: &mut BehaviorContext<'_>) {}
}

/// Lifecycle callback selector used by the scene's dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hook {
    /// [`Behavior::on_enable`]
    Enable,
    /// [`Behavior::on_disable`]
    Disable,
    /// [`Behavior::on_start`]
    Start,
    /// [`Behavior::on_update`]
    Update,
    /// [`Behavior::on_fixed_update`]
    FixedUpdate,
    /// [`Behavior::on_late_update`]
    LateUpdate,
    /// [`Behavior::on_destroy`]
    Destroy,
}

impl Hook {
    pub(crate) fn call(self, behavior: &mut dyn Behavior, ctx: &mut BehaviorContext<'_>) {
        match self {
            Self::Enable => behavior.on_enable(ctx),
            Self::Disable => behavior.on_disable(ctx),
            Self::Start => behavior.on_start(ctx),
            Self::Update => behavior.on_update(ctx),
            Self::FixedUpdate => behavior.on_fixed_update(ctx),
            Self::LateUpdate => behavior.on_late_update(ctx),
            Self::Destroy => behavior.on_destroy(ctx),
        }
    }
}

/// What a behavior sees while one of its hooks runs
///
/// Besides its own entity's transform, a behavior can only act on the wider
/// scene through requests. The scene applies them as soon as the hook returns,
/// before the next behavior is visited.
pub struct BehaviorContext<'a> {
    entity: ObjectId,
    behavior: ObjectId,
    transform: &'a mut Transform,
    frame_time: Duration,
    requests: Vec<SceneRequest>,
}

impl<'a> BehaviorContext<'a> {
    pub(crate) fn new(
        entity: ObjectId,
        behavior: ObjectId,
        transform: &'a mut Transform,
        frame_time: Duration,
    ) -> Self {
        Self {
            entity,
            behavior,
            transform,
            frame_time,
            requests: Vec::new(),
        }
    }

    /// Id of the entity owning the behavior
    pub const fn entity(&self) -> ObjectId {
        self.entity
    }

    /// Id of the running behavior
    pub const fn behavior(&self) -> ObjectId {
        self.behavior
    }

    /// The owning entity's transform
    pub fn transform(&self) -> &Transform {
        self.transform
    }

    /// The owning entity's transform, mutably
    pub fn transform_mut(&mut self) -> &mut Transform {
        self.transform
    }

    /// Length of one fixed step
    pub const fn fixed_frame_time(&self) -> Duration {
        self.frame_time
    }

    /// Destroy an entity of this scene (possibly the owning one)
    pub fn destroy_entity(&mut self, entity: ObjectId) {
        self.requests.push(SceneRequest::DestroyEntity(entity));
    }

    /// Destroy the owning entity
    pub fn destroy_self(&mut self) {
        self.destroy_entity(self.entity);
    }

    /// Disable this behavior; it leaves the scene's passes
    pub fn disable_self(&mut self) {
        self.requests.push(SceneRequest::Disable {
            entity: self.entity,
            component: self.behavior,
        });
    }

    /// Exit the scene: the current pass stops and every entity is destroyed
    pub fn exit_scene(&mut self) {
        self.requests.push(SceneRequest::Exit);
    }

    /// Stop visiting behaviors in the current pass
    pub fn abort_frame(&mut self) {
        self.requests.push(SceneRequest::AbortFrame);
    }

    /// Ask the application to stop its loop after the current frame
    pub fn stop_application(&mut self) {
        self.requests.push(SceneRequest::Application(AppRequest::Stop));
    }

    /// Ask the application to exit, tearing down every scene
    pub fn exit_application(&mut self) {
        self.requests.push(SceneRequest::Application(AppRequest::Exit));
    }

    /// Ask the application to switch to another scene
    pub fn set_current_scene(&mut self, name: impl Into<String>) {
        self.requests
            .push(SceneRequest::Application(AppRequest::SetCurrentScene(name.into())));
    }

    pub(crate) fn into_requests(self) -> Vec<SceneRequest> {
        self.requests
    }
}
