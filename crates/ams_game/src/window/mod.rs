//! Window seam
//!
//! The application owns a list of windows and updates them once per frame,
//! after the render pass. A window reporting `should_close` is dropped; when
//! none remain the application stops.
//!
//! [`HeadlessWindow`] is always available. A native GLFW window is provided by
//! [`GlfwWindow`] when the `glfw` feature is enabled.

mod headless;
#[cfg(feature = "glfw")]
mod glfw_window;

pub use headless::HeadlessWindow;
#[cfg(feature = "glfw")]
pub use glfw_window::GlfwWindow;

use crate::config::WindowConfig;
use thiserror::Error;

/// Window management errors
#[derive(Error, Debug)]
pub enum WindowError {
    /// The windowing library could not be initialized
    #[error("Window system initialization failed: {0}")]
    InitializationFailed(String),

    /// The native window could not be created
    #[error("Window creation failed: {0}")]
    CreationFailed(String),
}

/// A window driven by the application's game loop
///
/// Windows are used from the thread running the loop only.
pub trait Window {
    /// Window title
    fn title(&self) -> &str;

    /// Whether the window was asked to close
    fn should_close(&self) -> bool;

    /// Request (or cancel a request) to close the window
    fn set_should_close(&mut self, should_close: bool);

    /// Process pending events and present the frame; called once per frame
    fn update(&mut self);

    /// Size of the drawable area
    fn size(&self) -> (u32, u32);
}

/// Create the main window described by `config`
///
/// Headless configurations, and builds without the `glfw` feature, get a
/// [`HeadlessWindow`].
pub fn create_window(config: &WindowConfig) -> Result<Box<dyn Window>, WindowError> {
    if config.headless {
        return Ok(Box::new(HeadlessWindow::new(
            &config.title,
            config.width,
            config.height,
        )));
    }

    #[cfg(feature = "glfw")]
    {
        Ok(Box::new(GlfwWindow::new(config)?))
    }

    #[cfg(not(feature = "glfw"))]
    {
        log::warn!("Built without the `glfw` feature; '{}' runs headless", config.title);
        Ok(Box::new(HeadlessWindow::new(
            &config.title,
            config.width,
            config.height,
        )))
    }
}
