//! # ams_game
//!
//! A small game framework: entities with components and scriptable
//! behaviors, scenes that dispatch fixed-step and render passes, an
//! application running the game loop, and a mesh pipeline with the `.ams`
//! format plus pluggable loaders.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ams_game::prelude::*;
//!
//! #[derive(Default)]
//! struct Spin;
//!
//! impl Behavior for Spin {
//!     fn on_update(&mut self, ctx: &mut BehaviorContext<'_>) {
//!         ctx.transform_mut().rotate(Quat::from_axis_angle(&Vec3::y_axis(), 0.01));
//!     }
//! }
//! ams_game::impl_behavior!(Spin);
//!
//! fn main() -> Result<(), AppError> {
//!     let context = Context::new();
//!     let mut app = Application::new(&context, ApplicationConfig::new("demo"))?;
//!
//!     if let Some(scene) = app.current_scene_mut() {
//!         let player = scene.create_entity_named("player");
//!         scene.add_component(player, Spin)?;
//!     }
//!
//!     app.run();
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(
    clippy::module_name_repetitions,
    clippy::similar_names,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss
)]

pub mod config;
pub mod context;
pub mod ecs;
pub mod foundation;
pub mod mesh;
pub mod object;
pub mod scene;
pub mod window;

mod application;

pub use application::{AppError, Application, ApplicationHooks, ApplicationInfo};
pub use context::{ApplicationSlot, Context, ContextError};
pub use object::{Object, ObjectId};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        config::{ApplicationConfig, Config, ConfigError},
        ecs::{Behavior, BehaviorContext, Camera, Component, ComponentHandle, Entity, Transform},
        foundation::math::{Mat4, Quat, Vec2, Vec3, Vec4},
        impl_behavior,
        mesh::{Mesh, MeshError, MeshLoader, MeshLoaderRegistry},
        scene::{Scene, SceneError, TickControl},
        window::{HeadlessWindow, Window},
        AppError, Application, ApplicationHooks, Context, ObjectId,
    };
}
