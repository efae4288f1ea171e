//! Foundation module - small utilities used throughout the engine
//!
//! - Math aliases and helpers
//! - Frame timing
//! - Logging setup

pub mod logging;
pub mod math;
pub mod time;
