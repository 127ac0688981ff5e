//! Countdown timers. Timers live only in memory; presets are persisted.

mod board;
mod engine;
mod presets;

pub use board::{format_time, Timer, TimerBoard, TimerStatus, DEFAULT_COLORS, DEFAULT_DURATION};
pub use engine::TimerEngine;
pub use presets::{TimerPreset, TimerPresetPatch, TimerPresetStore};
