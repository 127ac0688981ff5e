//! Timer engine behavior against tokio's paused clock.

use gamepal_core::testing::assert_single_running_timer;
use gamepal_core::timer::{TimerEngine, TimerStatus, DEFAULT_DURATION};
use gamepal_core::TestHarness;
use std::time::Duration;

async fn wait_secs(seconds: u64) {
    tokio::time::sleep(Duration::from_secs(seconds) + Duration::from_millis(100)).await;
}

#[tokio::test(start_paused = true)]
async fn test_only_one_timer_runs() {
    let mut engine = TimerEngine::new();
    engine.setup_face_to_face(DEFAULT_DURATION);
    let timers = engine.snapshot();
    let (a, b) = (&timers[0].id, &timers[1].id);

    engine.start(a);
    wait_secs(2).await;
    engine.start(b);
    wait_secs(3).await;

    let a = engine.get(a).unwrap();
    let b = engine.get(b).unwrap();
    assert_eq!(a.remaining, DEFAULT_DURATION - 2);
    assert_eq!(a.status(), TimerStatus::Paused);
    assert_eq!(b.remaining, DEFAULT_DURATION - 3);
    assert!(b.is_running);
    assert_eq!(engine.snapshot().iter().filter(|t| t.is_running).count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_countdown_floors_at_zero_and_stops() {
    let mut engine = TimerEngine::new();
    let timer = engine.create_timer("Turn", 3, "#ef4444");
    engine.start(&timer.id);

    wait_secs(10).await;

    let timer = engine.get(&timer.id).unwrap();
    assert_eq!(timer.remaining, 0);
    assert!(!timer.is_running);
    assert_eq!(timer.status(), TimerStatus::Finished);
    assert!(engine.active_id().is_none());
    assert!(engine.is_any_finished());
    assert!(!engine.is_ticking());

    assert!(!engine.start(&timer.id));
}

#[tokio::test(start_paused = true)]
async fn test_switch_to_next_hands_over() {
    let mut engine = TimerEngine::new();
    engine.setup_four_player(60);
    let ids: Vec<_> = engine.snapshot().into_iter().map(|t| t.id).collect();

    engine.switch_to_next();
    wait_secs(1).await;
    engine.switch_to_next();
    wait_secs(2).await;

    assert_eq!(engine.get(&ids[0]).unwrap().remaining, 59);
    assert_eq!(engine.get(&ids[1]).unwrap().remaining, 58);
    assert_eq!(engine.active_id().as_deref(), Some(ids[1].as_str()));
}

#[tokio::test(start_paused = true)]
async fn test_stop_and_reset_all() {
    let mut engine = TimerEngine::new();
    engine.setup_face_to_face(30);
    let a = engine.snapshot()[0].id.clone();

    engine.start(&a);
    wait_secs(5).await;
    engine.stop_all();
    assert!(!engine.is_any_running());
    assert!(!engine.is_ticking());

    wait_secs(5).await;
    assert_eq!(engine.get(&a).unwrap().remaining, 25);

    engine.reset_all();
    assert!(engine.snapshot().iter().all(|t| t.remaining == 30));
}

#[tokio::test(start_paused = true)]
async fn test_toggle_resumes_where_it_paused() {
    let mut engine = TimerEngine::new();
    engine.setup_simple(20);
    let id = engine.snapshot()[0].id.clone();

    engine.toggle(&id);
    wait_secs(4).await;
    engine.toggle(&id);
    wait_secs(4).await;
    engine.toggle(&id);
    wait_secs(1).await;

    assert_eq!(engine.get(&id).unwrap().remaining, 15);
}

#[tokio::test(start_paused = true)]
async fn test_app_timers_and_presets() {
    let mut h = TestHarness::new();
    let preset = h.app.timer_presets.add("Blitz", 90, Some("Chess"));

    h.app.timers.setup_face_to_face(preset.duration);
    let first = h.app.timers.snapshot()[0].id.clone();
    h.app.timers.start(&first);
    wait_secs(1).await;
    assert_single_running_timer(&h.app);
    assert_eq!(h.app.timers.get(&first).unwrap().remaining, 89);

    h.app.clear_all_data();
    assert!(h.app.timers.snapshot().is_empty());
    assert!(h.app.timer_presets.all().is_empty());
}
