//! Walk through a game night: players, a score sheet, dice and a timer.
//!
//! Run with: `cargo run -p gamepal-core --example game_night`

use gamepal_core::dice::{DiceExpression, DiceTray, DieType};
use gamepal_core::stores::{NewGame, ScoreOptions};
use gamepal_core::timer::format_time;
use gamepal_core::{Gamepal, Roster};
use std::time::Duration;

#[tokio::main]
async fn main() {
    println!("=== Game Night ===\n");

    let mut app = Gamepal::in_memory();
    for name in ["Alice", "Bob", "Chloé"] {
        let player = app.players.add(name, None);
        println!("Player {} wears {}", player.name, player.color);
    }

    let catan = app.library.add(NewGame::new("Catan", 3, 4).with_style("Strategy").owned());
    app.library.mark_borrowed(&catan.id, Some("Sam"));
    app.library.mark_borrowed(&catan.id, None);
    let stats = app.library.stats();
    println!("\nLibrary: {} games, {} loans so far", stats.total, stats.total_loans);

    let roster = Roster::from_players(app.players.all());
    if let Some(first) = roster.pick() {
        println!("{} goes first", first.player.name);
    }

    let names: Vec<&str> = app.players.all().iter().map(|p| p.name.as_str()).collect();
    let sheet = app.score_sessions.create(
        "Game Night",
        &names,
        ScoreOptions {
            max_score: Some(10),
            ..ScoreOptions::default()
        },
    );
    let alice = sheet.players[0].id.clone();
    app.score_sessions.update_player_score(&sheet.id, &alice, 1, 7);
    app.score_sessions.update_player_score(&sheet.id, &alice, 3, 2);
    if let Some(sheet) = app.score_sessions.get(&sheet.id) {
        println!("\nStandings:");
        for player in sheet.standings() {
            println!("  {:<8} {:>3} {:?}", player.name, player.total, player.scores);
        }
    }

    let mut tray = DiceTray::new();
    tray.add(DieType::D6);
    tray.add(DieType::D6);
    tray.roll();
    println!("\nTray: {}", tray.total());
    for notation in ["2d6+3", "4d6kh3", "1d20-1"] {
        match DiceExpression::parse(notation) {
            Ok(expr) => println!("{notation}: {}", expr.roll()),
            Err(e) => println!("{notation}: {e}"),
        }
    }

    app.timers.setup_face_to_face(5);
    let first = app.timers.snapshot()[0].id.clone();
    app.timers.start(&first);
    tokio::time::sleep(Duration::from_millis(2100)).await;
    app.timers.switch_to_next();
    println!("\nTimers:");
    for timer in app.timers.snapshot() {
        println!("  {} {} running={}", timer.label, format_time(timer.remaining), timer.is_running);
    }
}
