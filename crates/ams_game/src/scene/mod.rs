//! Scene: entity ownership and behavior dispatch
//!
//! A [`Scene`] owns every entity of a level and keeps two derived indexes: the
//! registered behaviors (keyed by behavior id) and the cameras (keyed by
//! entity id). Both only ever reference components of entities the scene
//! still owns.
//!
//! ## Passes
//!
//! ```text
//! Application fixed step  ->  Scene::on_update   (on_fixed_update, on_update)
//! Application frame       ->  Scene::on_render   (on_late_update)
//! ```
//!
//! Each pass walks the behavior index in id order. After every callback the
//! scene applies the callback's requests, then checks its [`TickControl`]; a
//! request that tears the scene down (or an explicit abort) ends the pass
//! before the next behavior is visited.

mod error;
mod request;

pub use error::SceneError;
pub use request::{AppRequest, TickControl};
pub(crate) use request::SceneRequest;

use crate::ecs::{
    BehaviorContext, Camera, Component, ComponentHandle, Entity, Hook, Transform,
};
use crate::foundation::math::Mat4;
use crate::foundation::time::Stopwatch;
use crate::object::{Object, ObjectId};
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::time::{Duration, Instant};

/// Camera registered in a scene, with its entity
#[derive(Debug, Clone, Copy)]
pub struct CameraView<'a> {
    /// Entity owning the camera
    pub entity: &'a Entity,
    /// Handle of the camera component
    pub handle: ComponentHandle,
    /// The camera
    pub camera: &'a Camera,
}

impl CameraView<'_> {
    /// Transform of the camera's entity
    pub const fn transform(&self) -> &Transform {
        self.entity.transform()
    }
}

/// A level: owns entities, indexes behaviors and cameras, runs the passes
pub struct Scene {
    object: Object,
    entities: BTreeMap<ObjectId, Entity>,
    behaviors: BTreeMap<ObjectId, ComponentHandle>,
    cameras: BTreeMap<ObjectId, ComponentHandle>,
    destroying: BTreeSet<ObjectId>,
    tick: TickControl,
    fixed_frame_time: Duration,
    clock: Stopwatch,
    app_requests: Vec<AppRequest>,
}

impl Scene {
    /// Create an empty scene
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            object: Object::named(name),
            entities: BTreeMap::new(),
            behaviors: BTreeMap::new(),
            cameras: BTreeMap::new(),
            destroying: BTreeSet::new(),
            tick: TickControl::default(),
            fixed_frame_time: Duration::ZERO,
            clock: Stopwatch::start_new(),
            app_requests: Vec::new(),
        }
    }

    /// Scene id
    pub const fn id(&self) -> ObjectId {
        self.object.id()
    }

    /// Scene name
    pub fn name(&self) -> &str {
        self.object.name()
    }

    /// When the scene was created
    pub const fn start_time(&self) -> Instant {
        self.clock.started_at()
    }

    /// Time since the scene was created
    pub fn elapsed_time(&self) -> Duration {
        self.clock.elapsed()
    }

    // ---------------------------------------------------------------------
    // Entities
    // ---------------------------------------------------------------------

    /// Create an entity named `Object_<id>`
    pub fn create_entity(&mut self) -> ObjectId {
        self.insert_entity(Entity::new(self.id(), None))
    }

    /// Create a named entity
    pub fn create_entity_named(&mut self, name: impl Into<String>) -> ObjectId {
        self.insert_entity(Entity::new(self.id(), Some(name.into())))
    }

    /// Create a named entity as a child of `parent`
    pub fn create_entity_with_parent(
        &mut self,
        name: impl Into<String>,
        parent: ObjectId,
    ) -> Result<ObjectId, SceneError> {
        if !self.entities.contains_key(&parent) {
            return Err(SceneError::EntityNotFound(parent));
        }
        let id = self.create_entity_named(name);
        self.set_parent(id, Some(parent))?;
        Ok(id)
    }

    fn insert_entity(&mut self, entity: Entity) -> ObjectId {
        let id = entity.id();
        log::debug!("Scene '{}': created entity '{}' ({id})", self.name(), entity.name());
        self.entities.insert(id, entity);
        id
    }

    /// Destroy an entity and everything it owns
    ///
    /// Its behaviors are unregistered (`on_disable`), then receive
    /// `on_destroy`; it leaves the hierarchy and the camera index. Returns
    /// `false` when the entity is not in the scene.
    pub fn destroy_entity(&mut self, id: ObjectId) -> bool {
        if !self.entities.contains_key(&id) || self.destroying.contains(&id) {
            log::debug!("Scene '{}': destroy_entity({id}) - not found", self.name());
            return false;
        }

        self.destroying.insert(id);
        let behavior_ids: Vec<ObjectId> = self
            .entities
            .get(&id)
            .map(|entity| entity.behavior_ids().collect())
            .unwrap_or_default();
        for component in behavior_ids {
            self.unregister_behavior(ComponentHandle { entity: id, component });
        }
        self.teardown_entity(id);
        self.destroying.remove(&id);

        log::debug!("Scene '{}': destroyed entity {id}", self.name());
        true
    }

    fn teardown_entity(&mut self, id: ObjectId) {
        let behavior_ids: Vec<ObjectId> = match self.entities.get(&id) {
            Some(entity) => entity.behavior_ids().collect(),
            None => return,
        };
        for component in behavior_ids {
            self.invoke(ComponentHandle { entity: id, component }, Hook::Destroy);
        }
        self.detach_hierarchy(id);
        self.cameras.remove(&id);
        self.behaviors.retain(|_, handle| handle.entity != id);
        self.entities.remove(&id);
    }

    /// Entity by id
    pub fn entity(&self, id: ObjectId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Entity by id, mutably
    pub fn entity_mut(&mut self, id: ObjectId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// Whether the entity lives in this scene
    pub fn contains_entity(&self, id: ObjectId) -> bool {
        self.entities.contains_key(&id)
    }

    /// All entities, ordered by id
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// Number of entities
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Transform of an entity
    pub fn transform(&self, entity: ObjectId) -> Result<&Transform, SceneError> {
        self.entities
            .get(&entity)
            .map(Entity::transform)
            .ok_or(SceneError::EntityNotFound(entity))
    }

    /// Transform of an entity, mutably
    pub fn transform_mut(&mut self, entity: ObjectId) -> Result<&mut Transform, SceneError> {
        self.entities
            .get_mut(&entity)
            .map(Entity::transform_mut)
            .ok_or(SceneError::EntityNotFound(entity))
    }

    // ---------------------------------------------------------------------
    // Components
    // ---------------------------------------------------------------------

    /// Attach a component to an entity
    ///
    /// Behaviors are registered (`on_enable`, `on_start`) and cameras join
    /// the camera index right away. A second [`Transform`] is rejected.
    pub fn add_component<T: Component>(
        &mut self,
        entity: ObjectId,
        component: T,
    ) -> Result<ComponentHandle, SceneError> {
        self.add_boxed_component(entity, Box::new(component))
    }

    /// Attach an already boxed component
    pub fn add_boxed_component(
        &mut self,
        entity: ObjectId,
        component: Box<dyn Component>,
    ) -> Result<ComponentHandle, SceneError> {
        let target = self
            .entities
            .get_mut(&entity)
            .ok_or(SceneError::EntityNotFound(entity))?;
        let component_ref: &dyn Component = &*component;
        if component_ref.is::<Transform>() {
            log::warn!("Entity {entity} already has a Transform");
            return Err(SceneError::DuplicateTransform(entity));
        }
        let is_camera = component_ref.as_camera().is_some();
        let is_behavior = component_ref.as_behavior().is_some();

        let handle = target.push_component(component);
        if is_camera {
            self.register_camera(handle)?;
        }
        if is_behavior {
            self.register_behavior(handle);
        }
        Ok(handle)
    }

    /// Attach several components; nothing is attached if any is a [`Transform`]
    pub fn add_components(
        &mut self,
        entity: ObjectId,
        components: Vec<Box<dyn Component>>,
    ) -> Result<Vec<ComponentHandle>, SceneError> {
        if !self.entities.contains_key(&entity) {
            return Err(SceneError::EntityNotFound(entity));
        }
        if components.iter().any(|component| (**component).is::<Transform>()) {
            log::warn!("Entity {entity} already has a Transform");
            return Err(SceneError::DuplicateTransform(entity));
        }
        components
            .into_iter()
            .map(|component| self.add_boxed_component(entity, component))
            .collect()
    }

    /// First component of type `T` on an entity (the transform included)
    pub fn component<T: Component>(&self, entity: ObjectId) -> Result<&T, SceneError> {
        self.entities
            .get(&entity)
            .ok_or(SceneError::EntityNotFound(entity))?
            .component::<T>()
            .ok_or_else(|| SceneError::ComponentNotFound {
                entity,
                component: std::any::type_name::<T>().to_string(),
            })
    }

    /// First component of type `T` on an entity, mutably
    pub fn component_mut<T: Component>(&mut self, entity: ObjectId) -> Result<&mut T, SceneError> {
        self.entities
            .get_mut(&entity)
            .ok_or(SceneError::EntityNotFound(entity))?
            .component_mut::<T>()
            .ok_or_else(|| SceneError::ComponentNotFound {
                entity,
                component: std::any::type_name::<T>().to_string(),
            })
    }

    /// Enable or disable a component; returns whether the flag changed
    ///
    /// Enabling a behavior registers it, disabling unregisters it.
    pub fn set_component_enabled(
        &mut self,
        handle: ComponentHandle,
        enabled: bool,
    ) -> Result<bool, SceneError> {
        let slot = self
            .entities
            .get_mut(&handle.entity)
            .ok_or(SceneError::EntityNotFound(handle.entity))?
            .slot_mut(handle.component)
            .ok_or_else(|| SceneError::ComponentNotFound {
                entity: handle.entity,
                component: handle.component.to_string(),
            })?;
        if slot.is_enabled() == enabled {
            return Ok(false);
        }
        slot.set_enabled(enabled);

        if slot.is_behavior() {
            if enabled {
                self.register_behavior(handle);
            } else {
                self.unregister_behavior(handle);
            }
        }
        Ok(true)
    }

    // ---------------------------------------------------------------------
    // Behavior index
    // ---------------------------------------------------------------------

    /// Add a behavior to the index, then call `on_enable` and `on_start`
    ///
    /// Returns `false` if the component is missing, not a behavior, disabled,
    /// or already registered.
    pub fn register_behavior(&mut self, handle: ComponentHandle) -> bool {
        let Some(slot) = self
            .entities
            .get(&handle.entity)
            .and_then(|entity| entity.slot(handle.component))
        else {
            log::debug!("register_behavior: component {} not found", handle.component);
            return false;
        };
        if !slot.is_behavior() || !slot.is_enabled() {
            return false;
        }
        if self.behaviors.contains_key(&handle.component) {
            return false;
        }

        self.behaviors.insert(handle.component, handle);
        self.invoke(handle, Hook::Enable);
        self.invoke(handle, Hook::Start);
        true
    }

    /// Remove a behavior from the index and call `on_disable`
    ///
    /// Returns `false` if it was not registered.
    pub fn unregister_behavior(&mut self, handle: ComponentHandle) -> bool {
        if self.behaviors.remove(&handle.component).is_none() {
            return false;
        }
        self.invoke(handle, Hook::Disable);
        true
    }

    /// Whether the behavior is in the index
    pub fn is_behavior_registered(&self, handle: ComponentHandle) -> bool {
        self.behaviors.contains_key(&handle.component)
    }

    /// Registered behaviors, in visiting order
    pub fn behaviors(&self) -> Vec<ComponentHandle> {
        self.behaviors.values().copied().collect()
    }

    /// Number of registered behaviors
    pub fn behavior_count(&self) -> usize {
        self.behaviors.len()
    }

    // ---------------------------------------------------------------------
    // Camera index
    // ---------------------------------------------------------------------

    /// Index a camera under its entity's id
    ///
    /// Fails if the entity is not in this scene or the component is not a
    /// camera. `Ok(false)` if the entity already has a camera indexed.
    pub fn register_camera(&mut self, handle: ComponentHandle) -> Result<bool, SceneError> {
        let Some(entity) = self.entities.get(&handle.entity) else {
            log::warn!("Camera {} is not attached to an entity of this scene", handle.component);
            return Err(SceneError::EntityNotFound(handle.entity));
        };
        if !entity.slot(handle.component).is_some_and(|slot| slot.is_camera()) {
            return Err(SceneError::ComponentNotFound {
                entity: handle.entity,
                component: handle.component.to_string(),
            });
        }
        match self.cameras.entry(handle.entity) {
            Entry::Vacant(entry) => {
                entry.insert(handle);
                Ok(true)
            }
            Entry::Occupied(_) => Ok(false),
        }
    }

    /// Drop the camera entry of the handle's entity
    pub fn unregister_camera(&mut self, handle: ComponentHandle) -> bool {
        self.cameras.remove(&handle.entity).is_some()
    }

    /// Indexed cameras, ordered by entity id
    pub fn cameras(&self) -> Vec<CameraView<'_>> {
        self.cameras
            .values()
            .filter_map(|handle| {
                let entity = self.entities.get(&handle.entity)?;
                let camera = entity.slot(handle.component)?.component().as_camera()?;
                Some(CameraView {
                    entity,
                    handle: *handle,
                    camera,
                })
            })
            .collect()
    }

    /// Number of indexed cameras
    pub fn camera_count(&self) -> usize {
        self.cameras.len()
    }

    // ---------------------------------------------------------------------
    // Hierarchy
    // ---------------------------------------------------------------------

    /// Reparent `child` under `parent`, or detach it with `None`
    pub fn set_parent(
        &mut self,
        child: ObjectId,
        parent: Option<ObjectId>,
    ) -> Result<(), SceneError> {
        let old_parent = self.transform(child)?.parent();

        if let Some(parent) = parent {
            if !self.entities.contains_key(&parent) {
                return Err(SceneError::EntityNotFound(parent));
            }
            let mut cursor = Some(parent);
            while let Some(ancestor) = cursor {
                if ancestor == child {
                    return Err(SceneError::HierarchyCycle { child, parent });
                }
                cursor = self.entities.get(&ancestor).and_then(|e| e.transform().parent());
            }
        }

        if old_parent == parent {
            return Ok(());
        }
        if let Some(old) = old_parent.and_then(|id| self.entities.get_mut(&id)) {
            old.transform_mut().remove_child_link(child);
        }
        if let Some(new) = parent.and_then(|id| self.entities.get_mut(&id)) {
            new.transform_mut().add_child_link(child);
        }
        self.transform_mut(child)?.set_parent_link(parent);
        Ok(())
    }

    /// Matrix of an entity in scene space
    pub fn world_matrix(&self, entity: ObjectId) -> Result<Mat4, SceneError> {
        let transform = self.transform(entity)?;
        let mut matrix = transform.local_matrix();
        let mut cursor = transform.parent();
        while let Some(id) = cursor {
            let parent = self.transform(id)?;
            matrix = parent.local_matrix() * matrix;
            cursor = parent.parent();
        }
        Ok(matrix)
    }

    fn detach_hierarchy(&mut self, id: ObjectId) {
        let Some(entity) = self.entities.get_mut(&id) else {
            return;
        };
        let parent = entity.transform().parent();
        let children = entity.transform_mut().take_children();
        entity.transform_mut().set_parent_link(None);

        if let Some(parent) = parent.and_then(|p| self.entities.get_mut(&p)) {
            parent.transform_mut().remove_child_link(id);
        }
        for child in children {
            if let Some(child) = self.entities.get_mut(&child) {
                child.transform_mut().set_parent_link(None);
            }
        }
    }

    // ---------------------------------------------------------------------
    // Lifecycle and passes
    // ---------------------------------------------------------------------

    /// Scene became current: `on_enable` on every registered behavior
    pub fn on_enter(&mut self) {
        log::info!("Entering scene '{}'", self.name());
        self.app_requests.clear();
        for handle in self.behaviors() {
            if self.behaviors.contains_key(&handle.component) {
                self.invoke(handle, Hook::Enable);
            }
        }
    }

    /// Scene stops being current
    ///
    /// Aborts any running pass, calls `on_disable` on every registered
    /// behavior, then destroys every entity (`on_destroy` on their behaviors).
    pub fn on_exit(&mut self) {
        log::info!("Exiting scene '{}'", self.name());
        self.invalidate_frame();

        for handle in self.behaviors() {
            if self.behaviors.remove(&handle.component).is_some() {
                self.invoke(handle, Hook::Disable);
            }
        }

        let ids: Vec<ObjectId> = self.entities.keys().copied().collect();
        for id in ids {
            if self.destroying.insert(id) {
                self.teardown_entity(id);
                self.destroying.remove(&id);
            }
        }
        self.entities.clear();
        self.behaviors.clear();
        self.cameras.clear();
    }

    /// Fixed-step pass: `on_fixed_update` then `on_update` on each behavior
    pub fn on_update(&mut self) {
        self.run_pass(&[Hook::FixedUpdate, Hook::Update]);
    }

    /// Late-update pass: `on_late_update` on each behavior
    pub fn on_render(&mut self) {
        self.run_pass(&[Hook::LateUpdate]);
    }

    fn run_pass(&mut self, hooks: &[Hook]) {
        self.tick = TickControl::Continue;

        'behaviors: for handle in self.behaviors() {
            for &hook in hooks {
                // Skip behaviors unregistered earlier in this pass.
                if !self.behaviors.contains_key(&handle.component) {
                    continue 'behaviors;
                }
                self.invoke(handle, hook);
                if self.tick.should_stop() {
                    break 'behaviors;
                }
            }
        }

        self.tick = TickControl::StopAfterCurrent;
    }

    /// Stop the running pass after the current callback
    pub fn invalidate_frame(&mut self) {
        self.tick = TickControl::StopAfterCurrent;
    }

    /// Whether a pass is running and has not been aborted
    pub const fn is_frame_valid(&self) -> bool {
        !self.tick.should_stop()
    }

    /// Current tick state
    pub const fn tick(&self) -> TickControl {
        self.tick
    }

    /// Length of one fixed step, as reported to behaviors
    pub const fn fixed_frame_time(&self) -> Duration {
        self.fixed_frame_time
    }

    /// Set the fixed step reported to behaviors
    pub fn set_fixed_frame_time(&mut self, frame_time: Duration) {
        self.fixed_frame_time = frame_time;
    }

    /// Requests queued for the owning application
    pub fn pending_requests(&self) -> &[AppRequest] {
        &self.app_requests
    }

    pub(crate) fn take_app_requests(&mut self) -> Vec<AppRequest> {
        std::mem::take(&mut self.app_requests)
    }

    fn invoke(&mut self, handle: ComponentHandle, hook: Hook) -> bool {
        let frame_time = self.fixed_frame_time;
        let requests = {
            let Some((transform, slot)) = self
                .entities
                .get_mut(&handle.entity)
                .and_then(|entity| entity.transform_and_slot(handle.component))
            else {
                return false;
            };
            let Some(behavior) = slot.component_mut().as_behavior_mut() else {
                return false;
            };
            let mut ctx = BehaviorContext::new(handle.entity, handle.component, transform, frame_time);
            hook.call(behavior, &mut ctx);
            ctx.into_requests()
        };
        self.apply_requests(requests);
        true
    }

    fn apply_requests(&mut self, requests: Vec<SceneRequest>) {
        for request in requests {
            match request {
                SceneRequest::DestroyEntity(id) => {
                    self.destroy_entity(id);
                }
                SceneRequest::Disable { entity, component } => {
                    if let Err(err) =
                        self.set_component_enabled(ComponentHandle { entity, component }, false)
                    {
                        log::debug!("disable request ignored: {err}");
                    }
                }
                SceneRequest::Exit => self.on_exit(),
                SceneRequest::AbortFrame => self.invalidate_frame(),
                SceneRequest::Application(request) => {
                    if request.aborts_frame() {
                        self.invalidate_frame();
                    }
                    self.app_requests.push(request);
                }
            }
        }
    }
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("id", &self.id())
            .field("name", &self.name())
            .field("entities", &self.entities.len())
            .field("behaviors", &self.behaviors.len())
            .field("cameras", &self.cameras.len())
            .field("tick", &self.tick)
            .finish()
    }
}
