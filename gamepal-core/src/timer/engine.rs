//! Drives a [`TimerBoard`] with a one-second tokio ticker.
//!
//! The engine owns at most one tick task. It is aborted before a new one is
//! installed and whenever no timer is left running.

use super::board::{Timer, TimerBoard};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tracing::{debug, warn};

const TICK: Duration = Duration::from_secs(1);

fn lock(board: &Mutex<TimerBoard>) -> MutexGuard<'_, TimerBoard> {
    board.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct TimerEngine {
    board: Arc<Mutex<TimerBoard>>,
    ticker: Option<JoinHandle<()>>,
}

impl TimerEngine {
    pub fn new() -> Self {
        Self {
            board: Arc::new(Mutex::new(TimerBoard::new())),
            ticker: None,
        }
    }

    fn board(&self) -> MutexGuard<'_, TimerBoard> {
        lock(&self.board)
    }

    /// Copy of every timer as of now.
    pub fn snapshot(&self) -> Vec<Timer> {
        self.board().timers().to_vec()
    }

    pub fn get(&self, id: &str) -> Option<Timer> {
        self.board().get(id).cloned()
    }

    pub fn active_id(&self) -> Option<String> {
        self.board().active_id().map(str::to_string)
    }

    pub fn is_any_running(&self) -> bool {
        self.board().is_any_running()
    }

    pub fn is_any_finished(&self) -> bool {
        self.board().is_any_finished()
    }

    pub fn is_ticking(&self) -> bool {
        self.ticker.as_ref().is_some_and(|t| !t.is_finished())
    }

    pub fn create_timer(&mut self, label: &str, duration: u32, color: &str) -> Timer {
        self.board().create_timer(label, duration, color)
    }

    pub fn setup_simple(&mut self, duration: u32) {
        self.stop_ticker();
        self.board().setup_simple(duration);
    }

    pub fn setup_face_to_face(&mut self, duration: u32) {
        self.stop_ticker();
        self.board().setup_face_to_face(duration);
    }

    pub fn setup_four_player(&mut self, duration: u32) {
        self.stop_ticker();
        self.board().setup_four_player(duration);
    }

    pub fn clear_all(&mut self) {
        self.stop_ticker();
        self.board().clear_all();
    }

    /// Start `id`, pausing any other running timer.
    pub fn start(&mut self, id: &str) -> bool {
        let started = self.board().start(id);
        if started {
            self.restart_ticker();
        }
        started
    }

    pub fn pause(&mut self, id: &str) {
        self.board().pause(id);
        self.sync_ticker();
    }

    pub fn toggle(&mut self, id: &str) {
        let was_running = self.board().get(id).is_some_and(|t| t.is_running);
        if was_running {
            self.pause(id);
        } else {
            self.start(id);
        }
    }

    pub fn reset(&mut self, id: &str) {
        self.board().reset(id);
        self.sync_ticker();
    }

    pub fn reset_all(&mut self) {
        self.stop_ticker();
        self.board().reset_all();
    }

    pub fn stop_all(&mut self) {
        self.stop_ticker();
        self.board().stop_all();
    }

    pub fn switch_to_next(&mut self) {
        self.board().switch_to_next();
        if self.board().active_id().is_some() {
            self.restart_ticker();
        } else {
            self.stop_ticker();
        }
    }

    pub fn set_duration(&mut self, id: &str, duration: u32) {
        self.board().set_duration(id, duration);
    }

    pub fn set_all_durations(&mut self, duration: u32) {
        self.board().set_all_durations(duration);
    }

    fn sync_ticker(&mut self) {
        if self.board().active_id().is_none() {
            self.stop_ticker();
        }
    }

    fn stop_ticker(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }

    fn restart_ticker(&mut self) {
        self.stop_ticker();

        let handle = match Handle::try_current() {
            Ok(handle) => handle,
            Err(err) => {
                warn!(error = %err, "no tokio runtime; timer will not tick");
                return;
            }
        };

        let board = Arc::clone(&self.board);
        self.ticker = Some(handle.spawn(async move {
            let mut interval = interval_at(Instant::now() + TICK, TICK);
            loop {
                interval.tick().await;
                if !lock(&board).tick() {
                    debug!("timer stopped ticking");
                    break;
                }
            }
        }));
    }
}

impl Default for TimerEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TimerEngine {
    fn drop(&mut self) {
        self.stop_ticker();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_without_runtime_does_not_panic() {
        let mut engine = TimerEngine::new();
        let t = engine.create_timer("T", 10, "#fff");
        assert!(engine.start(&t.id));
        assert!(!engine.is_ticking());
        assert!(engine.is_any_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_once_per_second() {
        let mut engine = TimerEngine::new();
        let t = engine.create_timer("T", 10, "#fff");
        engine.start(&t.id);

        tokio::time::sleep(Duration::from_millis(3_500)).await;
        assert_eq!(engine.get(&t.id).unwrap().remaining, 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_stops_ticker() {
        let mut engine = TimerEngine::new();
        let t = engine.create_timer("T", 10, "#fff");
        engine.start(&t.id);
        tokio::time::sleep(Duration::from_millis(1_500)).await;
        engine.pause(&t.id);
        assert!(!engine.is_ticking());

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(engine.get(&t.id).unwrap().remaining, 9);
    }
}
