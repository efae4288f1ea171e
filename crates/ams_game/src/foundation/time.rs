//! Frame-rate conversions and a simple stopwatch

use std::time::{Duration, Instant};

/// Duration of one frame at `fps` frames per second
///
/// Zero or negative rates (and NaN) yield [`Duration::ZERO`].
pub fn fps_to_duration(fps: f32) -> Duration {
    if fps > 0.0 && fps.is_finite() {
        Duration::from_secs_f64(1.0 / f64::from(fps))
    } else {
        Duration::ZERO
    }
}

/// Frame rate matching a frame duration; zero for a zero duration
pub fn duration_to_fps(duration: Duration) -> f32 {
    let secs = duration.as_secs_f64();
    if secs > 0.0 {
        (1.0 / secs) as f32
    } else {
        0.0
    }
}

/// Measures wall-clock time since it was (re)started
#[derive(Debug, Clone, Copy)]
pub struct Stopwatch {
    started: Instant,
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::start_new()
    }
}

impl Stopwatch {
    /// Start a new stopwatch
    pub fn start_new() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    /// Instant the stopwatch was last started
    pub const fn started_at(&self) -> Instant {
        self.started
    }

    /// Reset to zero and keep running
    pub fn restart(&mut self) {
        self.started = Instant::now();
    }

    /// Time since the last (re)start
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Time since the last (re)start, in seconds
    pub fn elapsed_secs(&self) -> f32 {
        self.elapsed().as_secs_f32()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_fps_to_duration() {
        assert_eq!(fps_to_duration(1.0), Duration::from_secs(1));
        assert_eq!(fps_to_duration(4.0), Duration::from_millis(250));
        assert_eq!(fps_to_duration(0.0), Duration::ZERO);
        assert_eq!(fps_to_duration(-30.0), Duration::ZERO);
    }

    #[test]
    fn test_duration_to_fps() {
        assert_relative_eq!(duration_to_fps(Duration::from_millis(250)), 4.0);
        assert_relative_eq!(duration_to_fps(fps_to_duration(60.0)), 60.0, epsilon = 1e-3);
        assert_eq!(duration_to_fps(Duration::ZERO), 0.0);
    }

    #[test]
    fn test_stopwatch_advances() {
        let mut watch = Stopwatch::start_new();
        std::thread::sleep(Duration::from_millis(5));
        assert!(watch.elapsed() >= Duration::from_millis(5));
        watch.restart();
        assert!(watch.elapsed() < Duration::from_secs(1));
    }
}
