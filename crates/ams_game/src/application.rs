//! Application: scene ownership and the game loop
//!
//! ## Loop
//!
//! ```text
//! on_run_start
//! while running:
//!     on_frame_start
//!     lag += time since last frame
//!     while lag >= fixed_frame_time and running:
//!         on_fixed_frame_start
//!         current_scene.on_update()
//!         lag -= fixed_frame_time
//!         on_fixed_frame_end
//!     current_scene.on_render()
//!     update windows (drop closed ones; stop when none are left)
//!     on_frame_end
//!     sleep out the rest of the vsync budget, if capped
//! on_run_end
//! ```

use crate::config::{ApplicationConfig, ConfigError};
use crate::context::{ApplicationSlot, Context, ContextError};
use crate::foundation::logging;
use crate::foundation::time::{fps_to_duration, Stopwatch};
use crate::object::{Object, ObjectId};
use crate::scene::{AppRequest, Scene, SceneError};
use crate::window::{create_window, Window, WindowError};
use slotmap::{DefaultKey, SlotMap};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Application-level errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Another application is alive in the same context
    #[error("Application already exists (id {0})")]
    AlreadyExists(ObjectId),

    /// No scene with this name
    #[error("Scene not found: {0}")]
    SceneNotFound(String),

    /// A scene with this name already exists
    #[error("Scene already exists: {0}")]
    SceneAlreadyExists(String),

    /// Scene error propagated to application level
    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    /// Window error
    #[error("Window error: {0}")]
    Window(#[from] WindowError),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl From<ContextError> for AppError {
    fn from(err: ContextError) -> Self {
        match err {
            ContextError::ApplicationAlreadyExists(id) => Self::AlreadyExists(id),
        }
    }
}

/// Callbacks around the game loop
///
/// Every hook receives the application, so it can stop the loop, switch
/// scenes or inspect timing. All hooks default to no-ops; `()` implements the
/// trait for loops without hooks.
#[allow(unused_variables)]
pub trait ApplicationHooks {
    /// Before the first frame
    fn on_run_start(&mut self, app: &mut Application) {}

    /// At the start of every frame
    fn on_frame_start(&mut self, app: &mut Application) {}

    /// Before each fixed step
    fn on_fixed_frame_start(&mut self, app: &mut Application) {}

    /// After each fixed step
    fn on_fixed_frame_end(&mut self, app: &mut Application) {}

    /// At the end of every frame
    fn on_frame_end(&mut self, app: &mut Application) {}

    /// After the loop has exited
    fn on_run_end(&mut self, app: &mut Application) {}
}

impl ApplicationHooks for () {}

/// Static description of a running application
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationInfo {
    /// Application name
    pub name: String,
    /// Application id
    pub id: ObjectId,
    /// Engine crate version
    pub engine_version: &'static str,
}

/// Owns the scenes and runs the fixed-timestep game loop
///
/// Only one application may be alive per [`Context`]; dropping it frees the
/// slot.
pub struct Application {
    object: Object,
    slot: ApplicationSlot,
    config: ApplicationConfig,
    scenes: SlotMap<DefaultKey, Scene>,
    current: Option<DefaultKey>,
    windows: Vec<Box<dyn Window>>,
    clock: Stopwatch,
    last_frame_time: Instant,
    delta_time: Duration,
    target_frame_rate: f32,
    fixed_frame_rate: f32,
    vsync_frame_rate: f32,
    target_frame_time: Duration,
    fixed_frame_time: Duration,
    vsync_time: Duration,
    running: bool,
    frame_count: u64,
    fixed_frame_count: u64,
}

impl Application {
    /// Create the application for `context`
    ///
    /// Fails with [`AppError::AlreadyExists`] while another application of the
    /// same context is alive. The main window and a default scene named
    /// `<name>_default_<id>` are created and the default scene is made current.
    pub fn new(context: &Context, config: ApplicationConfig) -> Result<Self, AppError> {
        config.validate()?;
        logging::init_with_level(&config.engine.log_level);

        let object = Object::named(config.name.clone());
        let slot = context.application_slot().clone();
        slot.claim(object.id())?;

        let window = match create_window(&config.window) {
            Ok(window) => window,
            Err(err) => {
                slot.release(object.id());
                return Err(err.into());
            }
        };

        let now = Instant::now();
        let mut app = Self {
            object,
            slot,
            scenes: SlotMap::new(),
            current: None,
            windows: vec![window],
            clock: Stopwatch::start_new(),
            last_frame_time: now,
            delta_time: Duration::ZERO,
            target_frame_rate: 0.0,
            fixed_frame_rate: 0.0,
            vsync_frame_rate: 0.0,
            target_frame_time: Duration::ZERO,
            fixed_frame_time: Duration::ZERO,
            vsync_time: Duration::ZERO,
            running: false,
            frame_count: 0,
            fixed_frame_count: 0,
            config,
        };
        app.set_target_frame_rate(app.config.timing.target_frame_rate);
        app.set_fixed_frame_rate(app.config.timing.fixed_frame_rate);
        app.set_vsync_frame_rate(app.config.timing.vsync_frame_rate);

        let default_name = app.default_scene_name();
        let key = app.insert_scene(Scene::new(default_name));
        app.current = Some(key);

        log::info!("Application '{}' created ({})", app.name(), app.id());
        Ok(app)
    }

    /// Application id
    pub const fn id(&self) -> ObjectId {
        self.object.id()
    }

    /// Application name
    pub fn name(&self) -> &str {
        self.object.name()
    }

    /// Name, id and engine version
    pub fn info(&self) -> ApplicationInfo {
        ApplicationInfo {
            name: self.name().to_string(),
            id: self.id(),
            engine_version: env!("CARGO_PKG_VERSION"),
        }
    }

    /// Configuration the application was created with
    pub const fn config(&self) -> &ApplicationConfig {
        &self.config
    }

    /// Name of the scene created with the application
    pub fn default_scene_name(&self) -> String {
        format!("{}_default_{}", self.name(), self.id())
    }

    // ---------------------------------------------------------------------
    // Scenes
    // ---------------------------------------------------------------------

    fn insert_scene(&mut self, mut scene: Scene) -> DefaultKey {
        scene.set_fixed_frame_time(self.fixed_frame_time);
        self.scenes.insert(scene)
    }

    fn scene_key(&self, name: &str) -> Option<DefaultKey> {
        self.scenes
            .iter()
            .find(|(_, scene)| scene.name() == name)
            .map(|(key, _)| key)
    }

    /// Create a scene owned by the application
    pub fn create_scene(&mut self, name: &str) -> Result<&mut Scene, AppError> {
        if self.scene_key(name).is_some() {
            log::warn!("Scene '{name}' already exists");
            return Err(AppError::SceneAlreadyExists(name.to_string()));
        }
        let key = self.insert_scene(Scene::new(name));
        log::debug!("Created scene '{name}'");
        self.scenes
            .get_mut(key)
            .ok_or_else(|| AppError::SceneNotFound(name.to_string()))
    }

    /// Scene by name, if present
    pub fn try_get_scene(&self, name: &str) -> Option<&Scene> {
        self.scene_key(name).and_then(|key| self.scenes.get(key))
    }

    /// Scene by name, if present, mutably
    pub fn try_get_scene_mut(&mut self, name: &str) -> Option<&mut Scene> {
        self.scene_key(name).and_then(|key| self.scenes.get_mut(key))
    }

    /// Scene by name
    pub fn get_scene(&self, name: &str) -> Result<&Scene, AppError> {
        self.try_get_scene(name).ok_or_else(|| {
            log::error!("Scene '{name}' not found");
            AppError::SceneNotFound(name.to_string())
        })
    }

    /// Scene by name, mutably
    pub fn get_scene_mut(&mut self, name: &str) -> Result<&mut Scene, AppError> {
        match self.scene_key(name).and_then(|key| self.scenes.get_mut(key)) {
            Some(scene) => Ok(scene),
            None => {
                log::error!("Scene '{name}' not found");
                Err(AppError::SceneNotFound(name.to_string()))
            }
        }
    }

    /// All scenes
    pub fn scenes(&self) -> impl Iterator<Item = &Scene> {
        self.scenes.values()
    }

    /// Number of scenes
    pub fn scene_count(&self) -> usize {
        self.scenes.len()
    }

    /// The current scene
    pub fn current_scene(&self) -> Option<&Scene> {
        self.current.and_then(|key| self.scenes.get(key))
    }

    /// The current scene, mutably
    pub fn current_scene_mut(&mut self) -> Option<&mut Scene> {
        self.current.and_then(|key| self.scenes.get_mut(key))
    }

    /// Make the named scene current
    ///
    /// The previous current scene is exited (destroying its entities) and
    /// the new one entered. Nothing changes when the name is unknown.
    pub fn set_current_scene(&mut self, name: &str) -> Result<(), AppError> {
        let Some(key) = self.scene_key(name) else {
            log::error!("Cannot switch to scene '{name}': not found");
            return Err(AppError::SceneNotFound(name.to_string()));
        };

        if let Some(old) = self.current.and_then(|old| self.scenes.get_mut(old)) {
            old.on_exit();
        }
        self.current = Some(key);
        if let Some(scene) = self.scenes.get_mut(key) {
            scene.on_enter();
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Windows
    // ---------------------------------------------------------------------

    /// Add a window updated by the loop
    pub fn add_window(&mut self, window: Box<dyn Window>) {
        self.windows.push(window);
    }

    /// Open windows
    pub fn windows(&self) -> &[Box<dyn Window>] {
        &self.windows
    }

    /// Open windows, mutably
    pub fn windows_mut(&mut self) -> &mut [Box<dyn Window>] {
        &mut self.windows
    }

    fn update_windows(&mut self) {
        for window in &mut self.windows {
            window.update();
        }
        self.windows.retain(|window| {
            let closing = window.should_close();
            if closing {
                log::info!("Window '{}' closed", window.title());
            }
            !closing
        });
        if self.windows.is_empty() {
            self.stop();
        }
    }

    // ---------------------------------------------------------------------
    // Game loop
    // ---------------------------------------------------------------------

    /// Run the game loop without hooks
    pub fn run(&mut self) {
        self.run_with(&mut ());
    }

    /// Run the game loop until [`stop`](Self::stop) is called
    pub fn run_with<H: ApplicationHooks + ?Sized>(&mut self, hooks: &mut H) {
        self.last_frame_time = Instant::now();
        let mut lag = Duration::ZERO;
        self.running = true;
        log::info!("Starting main loop for '{}'", self.name());

        hooks.on_run_start(self);
        while self.running {
            hooks.on_frame_start(self);

            let now = Instant::now();
            self.delta_time = now.saturating_duration_since(self.last_frame_time);
            self.last_frame_time = now;
            lag += self.delta_time;

            while lag >= self.fixed_frame_time && self.running {
                hooks.on_fixed_frame_start(self);
                if let Some(scene) = self.current_scene_mut() {
                    scene.on_update();
                }
                self.process_scene_requests();
                lag -= self.fixed_frame_time;
                self.fixed_frame_count += 1;
                hooks.on_fixed_frame_end(self);
            }

            if let Some(scene) = self.current_scene_mut() {
                scene.on_render();
            }
            self.process_scene_requests();
            self.update_windows();
            self.frame_count += 1;

            hooks.on_frame_end(self);

            if !self.vsync_time.is_zero() {
                let spent = self.last_frame_time.elapsed();
                if spent < self.vsync_time {
                    std::thread::sleep(self.vsync_time - spent);
                }
            }
        }
        hooks.on_run_end(self);
        log::info!(
            "Main loop for '{}' ended after {} frames ({} fixed steps)",
            self.name(),
            self.frame_count,
            self.fixed_frame_count
        );
    }

    fn process_scene_requests(&mut self) {
        loop {
            let requests = match self.current_scene_mut() {
                Some(scene) => scene.take_app_requests(),
                None => return,
            };
            if requests.is_empty() {
                return;
            }
            for request in requests {
                match request {
                    AppRequest::Stop => self.stop(),
                    AppRequest::Exit => self.exit(),
                    AppRequest::SetCurrentScene(name) => {
                        if let Err(err) = self.set_current_scene(&name) {
                            log::error!("Scene switch requested by a behavior failed: {err}");
                        }
                    }
                }
            }
        }
    }

    /// Leave the loop at the next loop-condition check
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Stop, exit every scene and drop them all
    pub fn exit(&mut self) {
        log::info!("Application '{}' exiting", self.name());
        self.stop();
        if let Some(scene) = self.current_scene_mut() {
            scene.invalidate_frame();
            scene.on_exit();
        }
        self.current = None;
        for scene in self.scenes.values_mut() {
            scene.on_exit();
        }
        self.scenes.clear();
    }

    /// Whether the loop is running
    pub const fn is_running(&self) -> bool {
        self.running
    }

    // ---------------------------------------------------------------------
    // Timing
    // ---------------------------------------------------------------------

    /// Set the render frame rate (clamped to at least 1 fps)
    pub fn set_target_frame_rate(&mut self, fps: f32) {
        self.target_frame_rate = fps.max(1.0);
        self.target_frame_time = fps_to_duration(self.target_frame_rate);
    }

    /// Set the fixed step rate (clamped to at least 1 fps)
    pub fn set_fixed_frame_rate(&mut self, fps: f32) {
        self.fixed_frame_rate = fps.max(1.0);
        self.fixed_frame_time = fps_to_duration(self.fixed_frame_rate);
        for scene in self.scenes.values_mut() {
            scene.set_fixed_frame_time(self.fixed_frame_time);
        }
    }

    /// Cap the frame rate; values up to 0 leave it uncapped
    pub fn set_vsync_frame_rate(&mut self, fps: f32) {
        self.vsync_frame_rate = fps.max(0.0);
        self.vsync_time = fps_to_duration(self.vsync_frame_rate);
    }

    /// Render frame rate
    pub const fn target_frame_rate(&self) -> f32 {
        self.target_frame_rate
    }

    /// Fixed step rate
    pub const fn fixed_frame_rate(&self) -> f32 {
        self.fixed_frame_rate
    }

    /// Frame-rate cap, 0 when uncapped
    pub const fn vsync_frame_rate(&self) -> f32 {
        self.vsync_frame_rate
    }

    /// Duration of one rendered frame at the target rate
    pub const fn target_frame_time(&self) -> Duration {
        self.target_frame_time
    }

    /// Duration of one fixed step
    pub const fn fixed_frame_time(&self) -> Duration {
        self.fixed_frame_time
    }

    /// Minimum frame duration, zero when uncapped
    pub const fn vsync_time(&self) -> Duration {
        self.vsync_time
    }

    /// When the application was created
    pub const fn start_time(&self) -> Instant {
        self.clock.started_at()
    }

    /// Time since the application was created
    pub fn elapsed_time(&self) -> Duration {
        self.clock.elapsed()
    }

    /// Duration of the last frame
    pub const fn delta_time(&self) -> Duration {
        self.delta_time
    }

    /// Frames run so far
    pub const fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Fixed steps run so far
    pub const fn fixed_frame_count(&self) -> u64 {
        self.fixed_frame_count
    }
}

impl Drop for Application {
    fn drop(&mut self) {
        self.slot.release(self.id());
        log::debug!("Application '{}' dropped", self.name());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::HeadlessWindow;

    fn config(name: &str) -> ApplicationConfig {
        ApplicationConfig::new(name).headless()
    }

    struct StopAfterFrames(u64);

    impl ApplicationHooks for StopAfterFrames {
        fn on_frame_end(&mut self, app: &mut Application) {
            if app.frame_count() >= self.0 {
                app.stop();
            }
        }
    }

    #[test]
    fn test_single_application_per_context() {
        let context = Context::new();
        let app = Application::new(&context, config("First")).unwrap();
        assert_eq!(context.active_application(), Some(app.id()));

        let second = Application::new(&context, config("Second"));
        assert!(matches!(second, Err(AppError::AlreadyExists(id)) if id == app.id()));

        drop(app);
        assert!(context.active_application().is_none());
        assert!(Application::new(&context, config("Third")).is_ok());
    }

    #[test]
    fn test_separate_contexts_are_independent() {
        let first = Context::new();
        let second = Context::new();
        let _a = Application::new(&first, config("A")).unwrap();
        assert!(Application::new(&second, config("B")).is_ok());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let context = Context::new();
        let result = Application::new(&context, config("Bad").with_window_size(0, 0));
        assert!(matches!(result, Err(AppError::Config(_))));
        assert!(context.active_application().is_none());
    }

    #[test]
    fn test_default_scene_is_current() {
        let context = Context::new();
        let app = Application::new(&context, config("Game")).unwrap();
        let expected = format!("Game_default_{}", app.id());
        assert_eq!(app.current_scene().map(Scene::name), Some(expected.as_str()));
        assert_eq!(app.scene_count(), 1);
        assert!(app.try_get_scene(&expected).is_some());
    }

    #[test]
    fn test_create_and_lookup_scenes() {
        let context = Context::new();
        let mut app = Application::new(&context, config("Game")).unwrap();

        app.create_scene("Level1").unwrap();
        assert!(matches!(
            app.create_scene("Level1"),
            Err(AppError::SceneAlreadyExists(name)) if name == "Level1"
        ));
        assert!(app.get_scene("Level1").is_ok());
        assert!(app.try_get_scene("Missing").is_none());
        assert!(matches!(app.get_scene("Missing"), Err(AppError::SceneNotFound(_))));
        assert_eq!(app.scene_count(), 2);
    }

    #[test]
    fn test_set_current_scene() {
        let context = Context::new();
        let mut app = Application::new(&context, config("Game")).unwrap();
        let default_name = app.default_scene_name();
        let id = app.current_scene_mut().unwrap().create_entity();
        app.create_scene("Level1").unwrap();

        app.set_current_scene("Level1").unwrap();
        assert_eq!(app.current_scene().unwrap().name(), "Level1");
        // exiting destroyed the default scene's entities
        assert!(!app.get_scene(&default_name).unwrap().contains_entity(id));

        assert!(matches!(
            app.set_current_scene("Nope"),
            Err(AppError::SceneNotFound(_))
        ));
        assert_eq!(app.current_scene().unwrap().name(), "Level1");
    }

    #[test]
    fn test_frame_rate_clamping() {
        let context = Context::new();
        let mut app = Application::new(&context, config("Game")).unwrap();

        app.set_target_frame_rate(0.0);
        assert_eq!(app.target_frame_rate(), 1.0);
        assert_eq!(app.target_frame_time(), Duration::from_secs(1));

        app.set_fixed_frame_rate(-5.0);
        assert_eq!(app.fixed_frame_rate(), 1.0);
        assert_eq!(app.current_scene().unwrap().fixed_frame_time(), Duration::from_secs(1));

        app.set_vsync_frame_rate(-1.0);
        assert_eq!(app.vsync_frame_rate(), 0.0);
        assert_eq!(app.vsync_time(), Duration::ZERO);

        app.set_vsync_frame_rate(4.0);
        assert_eq!(app.vsync_time(), Duration::from_millis(250));
    }

    #[test]
    fn test_run_stops_from_hook() {
        let context = Context::new();
        let mut app = Application::new(&context, config("Game")).unwrap();
        app.run_with(&mut StopAfterFrames(5));
        assert_eq!(app.frame_count(), 5);
        assert!(!app.is_running());
    }

    #[test]
    fn test_closing_last_window_stops_loop() {
        let context = Context::new();
        let mut app = Application::new(&context, config("Game")).unwrap();
        app.windows_mut()[0].set_should_close(true);
        app.add_window(Box::new(HeadlessWindow::new("Second", 64, 64).closing_after(3)));

        app.run();
        assert_eq!(app.frame_count(), 3);
        assert!(app.windows().is_empty());
    }

    #[test]
    fn test_exit_drops_scenes() {
        let context = Context::new();
        let mut app = Application::new(&context, config("Game")).unwrap();
        app.create_scene("Level1").unwrap();
        app.exit();
        assert!(app.current_scene().is_none());
        assert_eq!(app.scene_count(), 0);
        assert!(!app.is_running());
    }

    #[test]
    fn test_info() {
        let context = Context::new();
        let app = Application::new(&context, config("Game")).unwrap();
        let info = app.info();
        assert_eq!(info.name, "Game");
        assert_eq!(info.id, app.id());
        assert_eq!(info.engine_version, env!("CARGO_PKG_VERSION"));
    }
}
