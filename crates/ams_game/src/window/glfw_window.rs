//! GLFW-backed window

use super::{Window, WindowError};
use crate::config::WindowConfig;

/// Native window created through GLFW
pub struct GlfwWindow {
    title: String,
    glfw: glfw::Glfw,
    window: glfw::PWindow,
    events: glfw::GlfwReceiver<(f64, glfw::WindowEvent)>,
}

impl GlfwWindow {
    /// Create a window from its configuration
    pub fn new(config: &WindowConfig) -> Result<Self, WindowError> {
        let mut glfw = glfw::init(glfw::fail_on_errors)
            .map_err(|e| WindowError::InitializationFailed(format!("{e:?}")))?;

        glfw.window_hint(glfw::WindowHint::ClientApi(glfw::ClientApiHint::NoApi));
        glfw.window_hint(glfw::WindowHint::Resizable(config.resizable));

        let created = if config.fullscreen {
            glfw.with_primary_monitor(|glfw, monitor| match monitor {
                Some(monitor) => glfw.create_window(
                    config.width,
                    config.height,
                    &config.title,
                    glfw::WindowMode::FullScreen(monitor),
                ),
                None => glfw.create_window(
                    config.width,
                    config.height,
                    &config.title,
                    glfw::WindowMode::Windowed,
                ),
            })
        } else {
            glfw.create_window(
                config.width,
                config.height,
                &config.title,
                glfw::WindowMode::Windowed,
            )
        };
        let (mut window, events) =
            created.ok_or_else(|| WindowError::CreationFailed(config.title.clone()))?;

        window.set_close_polling(true);
        window.set_size_polling(true);

        log::info!("Created window '{}' ({}x{})", config.title, config.width, config.height);
        Ok(Self {
            title: config.title.clone(),
            glfw,
            window,
            events,
        })
    }
}

impl Window for GlfwWindow {
    fn title(&self) -> &str {
        &self.title
    }

    fn should_close(&self) -> bool {
        self.window.should_close()
    }

    fn set_should_close(&mut self, should_close: bool) {
        self.window.set_should_close(should_close);
    }

    fn update(&mut self) {
        self.glfw.poll_events();
        for (_, event) in glfw::flush_messages(&self.events) {
            if let glfw::WindowEvent::Close = event {
                self.window.set_should_close(true);
            }
        }
    }

    fn size(&self) -> (u32, u32) {
        let (width, height) = self.window.get_size();
        (
            u32::try_from(width).unwrap_or(0),
            u32::try_from(height).unwrap_or(0),
        )
    }
}
