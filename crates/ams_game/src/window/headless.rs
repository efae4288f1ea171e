use super::Window;

/// Window without a native surface
///
/// Counts the frames it was updated for; useful for tests and servers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadlessWindow {
    title: String,
    width: u32,
    height: u32,
    should_close: bool,
    frames: u64,
    close_after: Option<u64>,
}

impl HeadlessWindow {
    /// Create a headless window
    pub fn new(title: &str, width: u32, height: u32) -> Self {
        Self {
            title: title.to_string(),
            width,
            height,
            should_close: false,
            frames: 0,
            close_after: None,
        }
    }

    /// Close by itself once it has been updated `frames` times
    #[must_use]
    pub fn closing_after(mut self, frames: u64) -> Self {
        self.close_after = Some(frames);
        self
    }

    /// Number of updates received
    pub const fn frames(&self) -> u64 {
        self.frames
    }
}

impl Window for HeadlessWindow {
    fn title(&self) -> &str {
        &self.title
    }

    fn should_close(&self) -> bool {
        self.should_close
    }

    fn set_should_close(&mut self, should_close: bool) {
        self.should_close = should_close;
    }

    fn update(&mut self) {
        self.frames += 1;
        if self.close_after.is_some_and(|limit| self.frames >= limit) {
            self.should_close = true;
        }
    }

    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
