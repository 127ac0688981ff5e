//! Timer state and its transitions, free of any clock.

use crate::random::generate_id;
use serde::{Deserialize, Serialize};

pub const DEFAULT_DURATION: u32 = 5 * 60;
pub const DEFAULT_COLORS: [&str; 4] = ["#ef4444", "#3b82f6", "#22c55e", "#f59e0b"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timer {
    pub id: String,
    pub label: String,
    /// Seconds.
    pub duration: u32,
    pub remaining: u32,
    pub is_running: bool,
    pub color: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerStatus {
    Idle,
    Running,
    Paused,
    Finished,
}

impl Timer {
    pub fn status(&self) -> TimerStatus {
        if self.is_running {
            TimerStatus::Running
        } else if self.remaining == 0 {
            TimerStatus::Finished
        } else if self.remaining == self.duration {
            TimerStatus::Idle
        } else {
            TimerStatus::Paused
        }
    }

    /// Remaining time as a percentage of the duration; 0 for a zero duration.
    pub fn progress(&self) -> f64 {
        if self.duration == 0 {
            return 0.0;
        }
        f64::from(self.remaining) / f64::from(self.duration) * 100.0
    }
}

/// `MM:SS`, minutes not capped at 59.
pub fn format_time(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// A set of timers with at most one running.
#[derive(Debug, Clone, Default)]
pub struct TimerBoard {
    timers: Vec<Timer>,
    active_id: Option<String>,
}

impl TimerBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timers(&self) -> &[Timer] {
        &self.timers
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active_id.as_deref()
    }

    pub fn get(&self, id: &str) -> Option<&Timer> {
        self.timers.iter().find(|t| t.id == id)
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut Timer> {
        self.timers.iter_mut().find(|t| t.id == id)
    }

    pub fn create_timer(&mut self, label: &str, duration: u32, color: &str) -> Timer {
        let timer = Timer {
            id: generate_id(),
            label: label.to_string(),
            duration,
            remaining: duration,
            is_running: false,
            color: color.to_string(),
        };
        self.timers.push(timer.clone());
        timer
    }

    pub fn setup_simple(&mut self, duration: u32) {
        self.setup_players(&["Timer"], duration);
    }

    pub fn setup_face_to_face(&mut self, duration: u32) {
        self.setup_players(&["Player 1", "Player 2"], duration);
    }

    pub fn setup_four_player(&mut self, duration: u32) {
        self.setup_players(&["Player 1", "Player 2", "Player 3", "Player 4"], duration);
    }

    fn setup_players(&mut self, labels: &[&str], duration: u32) {
        self.clear_all();
        for (label, color) in labels.iter().zip(DEFAULT_COLORS) {
            self.create_timer(label, duration, color);
        }
    }

    pub fn clear_all(&mut self) {
        self.timers.clear();
        self.active_id = None;
    }

    /// Run `id`, pausing whichever timer was active. Returns whether it started.
    pub fn start(&mut self, id: &str) -> bool {
        match self.get(id) {
            Some(timer) if timer.remaining > 0 => {}
            _ => return false,
        }

        if let Some(active) = self.active_id.clone() {
            if active != id {
                self.pause(&active);
            }
        }

        if let Some(timer) = self.get_mut(id) {
            timer.is_running = true;
        }
        self.active_id = Some(id.to_string());
        true
    }

    pub fn pause(&mut self, id: &str) {
        if let Some(timer) = self.get_mut(id) {
            timer.is_running = false;
        }
        if self.active_id.as_deref() == Some(id) {
            self.active_id = None;
        }
    }

    pub fn toggle(&mut self, id: &str) {
        match self.get(id) {
            Some(timer) if timer.is_running => self.pause(id),
            Some(_) => {
                self.start(id);
            }
            None => {}
        }
    }

    pub fn reset(&mut self, id: &str) {
        if self.get(id).is_none() {
            return;
        }
        self.pause(id);
        if let Some(timer) = self.get_mut(id) {
            timer.remaining = timer.duration;
        }
    }

    pub fn reset_all(&mut self) {
        self.stop_all();
        for timer in &mut self.timers {
            timer.remaining = timer.duration;
        }
    }

    pub fn stop_all(&mut self) {
        for timer in &mut self.timers {
            timer.is_running = false;
        }
        self.active_id = None;
    }

    /// Pause the active timer and start the next one in order.
    ///
    /// With no active timer the first timer starts. A next timer that has run
    /// out is left stopped.
    pub fn switch_to_next(&mut self) {
        if self.timers.len() < 2 {
            return;
        }

        let next_index = self
            .active_id
            .as_deref()
            .and_then(|active| self.timers.iter().position(|t| t.id == active))
            .map_or(0, |i| (i + 1) % self.timers.len());
        let next_id = self.timers[next_index].id.clone();

        if let Some(active) = self.active_id.clone() {
            self.pause(&active);
        }
        self.start(&next_id);
    }

    pub fn set_duration(&mut self, id: &str, duration: u32) {
        if let Some(timer) = self.get_mut(id) {
            timer.duration = duration;
            timer.remaining = duration;
        }
    }

    pub fn set_all_durations(&mut self, duration: u32) {
        for timer in &mut self.timers {
            timer.duration = duration;
            timer.remaining = duration;
        }
    }

    /// Advance the active timer by one second. Returns whether anything is still running.
    pub fn tick(&mut self) -> bool {
        let Some(active) = self.active_id.clone() else {
            return false;
        };
        let Some(timer) = self.get_mut(&active) else {
            self.active_id = None;
            return false;
        };
        if !timer.is_running {
            return false;
        }

        timer.remaining = timer.remaining.saturating_sub(1);
        if timer.remaining == 0 {
            timer.is_running = false;
            self.active_id = None;
            return false;
        }
        true
    }

    pub fn is_any_running(&self) -> bool {
        self.timers.iter().any(|t| t.is_running)
    }

    pub fn is_any_finished(&self) -> bool {
        self.timers.iter().any(|t| t.remaining == 0)
    }
}
