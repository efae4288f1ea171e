//! Tick control and the requests behaviors send to their scene

use crate::object::ObjectId;

/// State of the pass currently walking the behavior index
///
/// Checked after every behavior callback; once it reads `StopAfterCurrent`
/// no further behavior is visited in that pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TickControl {
    /// Keep visiting behaviors
    Continue,
    /// Stop once the running callback returns
    #[default]
    StopAfterCurrent,
}

impl TickControl {
    /// Whether the pass must stop
    pub const fn should_stop(self) -> bool {
        matches!(self, Self::StopAfterCurrent)
    }
}

/// Work a behavior asks its scene to do once its callback returns
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SceneRequest {
    DestroyEntity(ObjectId),
    Disable { entity: ObjectId, component: ObjectId },
    Exit,
    AbortFrame,
    Application(AppRequest),
}

/// Work a scene forwards to the application that owns it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppRequest {
    /// Leave the game loop after the current frame
    Stop,
    /// Stop and tear down every scene
    Exit,
    /// Switch the current scene
    SetCurrentScene(String),
}

impl AppRequest {
    /// Whether honouring the request tears down the running scene
    pub const fn aborts_frame(&self) -> bool {
        matches!(self, Self::Exit | Self::SetCurrentScene(_))
    }
}
