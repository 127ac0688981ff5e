//! Line-oriented console.
//!
//! Protocol:
//! - Lines starting with `#` are commands (players, scores, timers, ...)
//! - Any other line is a question for the AI assistant
//! - Output lines are tagged `[OK]`, `[ERROR]`, `[AI]` or a section name

use chat::{ChatMessage, Provider};
use gamepal_core::dice::{self, DiceExpression};
use gamepal_core::preferences::FontSize;
use gamepal_core::stores::{NewGame, NewRule, ScoreOptions};
use gamepal_core::timer::{format_time, TimerStatus, DEFAULT_DURATION};
use gamepal_core::{Gamepal, Roster};
use std::io::{self, BufRead, Write};
use tracing::debug;

const SYSTEM_PROMPT: &str =
    "You are a friendly board game night helper. Keep answers short and practical.";

const HELP: &[&str] = &[
    "  #quit                               - Exit",
    "  #players | #player add <name> | #player rm <name>",
    "  #teams | #team add <name> | #team join <team> <player>",
    "  #games | #game add <name> <min> <max> | #game lend <name> <borrower> | #game return <name>",
    "  #stats                              - Library statistics",
    "  #rules <game> | #rule add <game> | <title> | <content>",
    "  #score new <name> <p1,p2,...> | #score set <round> <player> <points> | #score show",
    "  #timer simple|duel|four [seconds] | #timer next | #timer stop | #timer show",
    "  #roll <notation>                    - e.g. 2d6+3, 4d6kh3",
    "  #pick                               - Choose a random player",
    "  #ai provider <openai|anthropic> | #ai key <provider> <key> | #ai test",
    "  #ask <game> | <question>            - Rules question about one game",
    "  #theme | #font <small|medium|large> | #locale <code>",
    "  #clear-data                         - Erase everything",
    "  (anything else is sent to the assistant)",
];

pub struct Console {
    pub app: Gamepal,
    history: Vec<ChatMessage>,
    should_quit: bool,
}

impl Console {
    pub fn new(app: Gamepal) -> Self {
        Self {
            app,
            history: Vec::new(),
            should_quit: false,
        }
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Handle one input line and return the lines to print.
    pub async fn handle(&mut self, line: &str) -> Vec<String> {
        let line = line.trim();
        if line.is_empty() {
            return Vec::new();
        }
        match line.strip_prefix('#') {
            Some(command) => self.command(command).await,
            None => self.converse(line).await,
        }
    }

    async fn command(&mut self, command: &str) -> Vec<String> {
        let (name, rest) = split_word(command);
        debug!(command = name, "console command");
        match name {
            "quit" | "exit" => {
                self.should_quit = true;
                vec!["Goodbye!".to_string()]
            }
            "help" => {
                let mut out = vec!["[HELP]".to_string()];
                out.extend(HELP.iter().map(|l| l.to_string()));
                out
            }
            "players" => self.list_players(),
            "player" => self.player(rest),
            "teams" => self.list_teams(),
            "team" => self.team(rest),
            "games" => self.list_games(),
            "game" => self.game(rest),
            "stats" => {
                let stats = self.app.library.stats();
                vec![format!(
                    "[STATS] total: {}, owned: {}, lent: {}, for sale: {}, loans: {}",
                    stats.total, stats.owned, stats.borrowed, stats.for_sale, stats.total_loans
                )]
            }
            "rules" => self.list_rules(rest),
            "rule" => self.rule(rest),
            "score" => self.score(rest),
            "timer" => self.timer(rest),
            "roll" => roll(rest),
            "pick" => self.pick(),
            "ai" => self.ai(rest).await,
            "ask" => self.ask(rest).await,
            "theme" => {
                let theme = self.app.theme.toggle();
                vec![format!("[OK] Theme: {}", theme.as_str())]
            }
            "font" => match FontSize::parse(rest) {
                Some(size) => {
                    self.app.settings.set_font_size(size);
                    vec![format!("[OK] Font size: {rest}")]
                }
                None => error("Usage: #font <small|medium|large>"),
            },
            "locale" => {
                let locale = self.app.locale.set(rest);
                vec![format!("[OK] Locale: {locale}")]
            }
            "clear-data" => {
                self.app.clear_all_data();
                self.history.clear();
                vec!["[OK] All data cleared".to_string()]
            }
            _ => error("Unknown command. Type #help for help."),
        }
    }

    // =========================================================================
    // PLAYERS AND TEAMS
    // =========================================================================

    fn list_players(&self) -> Vec<String> {
        let mut out = vec![format!("[PLAYERS] {}", self.app.players.all().len())];
        for player in self.app.players.all() {
            let team = self
                .app
                .teams
                .team_of(&player.id)
                .map(|t| format!(" ({})", t.name))
                .unwrap_or_default();
            out.push(format!("  {} {}{team}", player.color, player.name));
        }
        out
    }

    fn player(&mut self, args: &str) -> Vec<String> {
        match split_word(args) {
            ("add", name) if !name.is_empty() => {
                let player = self.app.players.add(name, None);
                vec![format!("[OK] Added {} ({})", player.name, player.color)]
            }
            ("rm", name) => match self.player_id(name) {
                Some(id) => {
                    self.app.delete_player(&id);
                    vec![format!("[OK] Removed {name}")]
                }
                None => error(&format!("No player named {name}")),
            },
            _ => error("Usage: #player add <name> | #player rm <name>"),
        }
    }

    fn list_teams(&self) -> Vec<String> {
        let mut out = vec![format!("[TEAMS] {}", self.app.teams.all().len())];
        for team in self.app.teams.all() {
            let members: Vec<_> = self
                .app
                .players
                .get_many(&team.player_ids)
                .into_iter()
                .map(|p| p.name.as_str())
                .collect();
            out.push(format!("  {}: {}", team.name, members.join(", ")));
        }
        out
    }

    fn team(&mut self, args: &str) -> Vec<String> {
        match split_word(args) {
            ("add", name) if !name.is_empty() => {
                let team = self.app.teams.add(name, None);
                vec![format!("[OK] Added team {}", team.name)]
            }
            ("join", rest) => {
                let (team_name, player_name) = split_word(rest);
                let team_id = self
                    .app
                    .teams
                    .all()
                    .iter()
                    .find(|t| t.name.eq_ignore_ascii_case(team_name))
                    .map(|t| t.id.clone());
                match (team_id, self.player_id(player_name)) {
                    (Some(team_id), Some(player_id)) => {
                        self.app.teams.add_player(&team_id, &player_id);
                        vec![format!("[OK] {player_name} joined {team_name}")]
                    }
                    (None, _) => error(&format!("No team named {team_name}")),
                    (_, None) => error(&format!("No player named {player_name}")),
                }
            }
            _ => error("Usage: #team add <name> | #team join <team> <player>"),
        }
    }

    fn player_id(&self, name: &str) -> Option<String> {
        self.app
            .players
            .all()
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name) || p.id == name)
            .map(|p| p.id.clone())
    }

    // =========================================================================
    // LIBRARY AND RULES
    // =========================================================================

    fn list_games(&self) -> Vec<String> {
        let mut out = vec![format!("[GAMES] {}", self.app.library.all().len())];
        for game in self.app.library.all() {
            let mut flags = Vec::new();
            if game.is_owned {
                flags.push("owned".to_string());
            }
            if let Some(borrower) = &game.borrowed_to {
                flags.push(format!("lent to {borrower}"));
            }
            if game.for_sale {
                flags.push("for sale".to_string());
            }
            out.push(format!(
                "  {} ({}-{} players) {}",
                game.name,
                game.min_players,
                game.max_players,
                flags.join(", ")
            ));
        }
        out
    }

    fn game(&mut self, args: &str) -> Vec<String> {
        let (action, rest) = split_word(args);
        match action {
            "add" => {
                let parts: Vec<&str> = rest.split_whitespace().collect();
                let parsed = match parts.as_slice() {
                    [name @ .., min, max] if !name.is_empty() => {
                        min.parse().ok().zip(max.parse().ok()).map(|(min, max)| {
                            NewGame::new(name.join(" "), min, max).owned()
                        })
                    }
                    _ => None,
                };
                match parsed {
                    Some(new) => {
                        let game = self.app.library.add(new);
                        vec![format!("[OK] Added {}", game.name)]
                    }
                    None => error("Usage: #game add <name> <min> <max>"),
                }
            }
            "lend" => {
                let Some((name, borrower)) = rest.rsplit_once(char::is_whitespace) else {
                    return error("Usage: #game lend <name> <borrower>");
                };
                let name = name.trim();
                match self.game_id(name) {
                    Some(id) => {
                        self.app.library.mark_borrowed(&id, Some(borrower));
                        vec![format!("[OK] {name} lent to {borrower}")]
                    }
                    None => error(&format!("No game named {name}")),
                }
            }
            "return" => match self.game_id(rest) {
                Some(id) => {
                    self.app.library.mark_borrowed(&id, None);
                    vec![format!("[OK] {rest} is back")]
                }
                None => error(&format!("No game named {rest}")),
            },
            _ => error("Usage: #game add|lend|return ..."),
        }
    }

    fn game_id(&self, name: &str) -> Option<String> {
        self.app
            .library
            .all()
            .iter()
            .find(|g| g.name.eq_ignore_ascii_case(name))
            .map(|g| g.id.clone())
    }

    fn list_rules(&self, game: &str) -> Vec<String> {
        let rules = if game.is_empty() {
            self.app.rules.all().iter().collect::<Vec<_>>()
        } else {
            self.app.rules.by_game(game)
        };
        let mut out = vec![format!("[RULES] {}", rules.len())];
        for rule in rules {
            out.push(format!("  [{}] {}: {}", rule.game, rule.title, rule.content));
        }
        out
    }

    fn rule(&mut self, args: &str) -> Vec<String> {
        let (action, rest) = split_word(args);
        let parts: Vec<&str> = rest.split('|').map(str::trim).collect();
        match (action, parts.as_slice()) {
            ("add", [game, title, content]) if !game.is_empty() && !title.is_empty() => {
                let rule = self.app.rules.add(NewRule::new(*game, *title, *content));
                vec![format!("[OK] Saved rule {}", rule.title)]
            }
            _ => error("Usage: #rule add <game> | <title> | <content>"),
        }
    }

    // =========================================================================
    // SCORES, TIMERS, DICE
    // =========================================================================

    fn score(&mut self, args: &str) -> Vec<String> {
        let (action, rest) = split_word(args);
        match action {
            "new" => {
                let (name, players) = split_word(rest);
                let names: Vec<&str> = players
                    .split(',')
                    .map(str::trim)
                    .filter(|n| !n.is_empty())
                    .collect();
                if name.is_empty() || names.is_empty() {
                    return error("Usage: #score new <name> <p1,p2,...>");
                }
                let sheet = self
                    .app
                    .score_sessions
                    .create(name, &names, ScoreOptions::default());
                self.app.score_sessions.set_current(Some(&sheet.id));
                vec![format!("[OK] Score sheet {} with {} players", sheet.name, names.len())]
            }
            "set" => {
                let parts: Vec<&str> = rest.split_whitespace().collect();
                let [round, player, points] = parts.as_slice() else {
                    return error("Usage: #score set <round> <player> <points>");
                };
                let (Ok(round), Ok(points)) = (round.parse::<usize>(), points.parse::<i64>()) else {
                    return error("Round and points must be numbers");
                };
                let Some(sheet) = self.app.score_sessions.current() else {
                    return error("No current score sheet. Use #score new first.");
                };
                let Some(player_id) = sheet
                    .players
                    .iter()
                    .find(|p| p.name.eq_ignore_ascii_case(player))
                    .map(|p| p.id.clone())
                else {
                    return error(&format!("No player named {player} on this sheet"));
                };
                let sheet_id = sheet.id.clone();
                if self
                    .app
                    .score_sessions
                    .update_player_score(&sheet_id, &player_id, round, points)
                {
                    self.score_board()
                } else {
                    error("Rounds start at 1")
                }
            }
            "show" => self.score_board(),
            _ => error("Usage: #score new|set|show ..."),
        }
    }

    fn score_board(&self) -> Vec<String> {
        let Some(sheet) = self.app.score_sessions.current() else {
            return error("No current score sheet");
        };
        let mut out = vec![format!("[SCORES] {}", sheet.name)];
        for player in sheet.standings() {
            let rounds: Vec<String> = player.scores.iter().map(|s| s.to_string()).collect();
            out.push(format!(
                "  {}: {} [{}]",
                player.name,
                player.total,
                rounds.join(", ")
            ));
        }
        out
    }

    fn timer(&mut self, args: &str) -> Vec<String> {
        const USAGE: &str = "Usage: #timer simple|duel|four [seconds] | next | stop | reset | show";
        let (action, rest) = split_word(args);
        let duration = if rest.is_empty() {
            DEFAULT_DURATION
        } else {
            match rest.parse() {
                Ok(seconds) => seconds,
                Err(_) => return error(USAGE),
            }
        };
        match action {
            "simple" => self.app.timers.setup_simple(duration),
            "duel" => self.app.timers.setup_face_to_face(duration),
            "four" => self.app.timers.setup_four_player(duration),
            "next" => self.app.timers.switch_to_next(),
            "stop" => self.app.timers.stop_all(),
            "reset" => self.app.timers.reset_all(),
            "show" | "" => {}
            _ => return error(USAGE),
        }
        self.timer_board()
    }

    fn timer_board(&self) -> Vec<String> {
        let timers = self.app.timers.snapshot();
        let mut out = vec![format!("[TIMERS] {}", timers.len())];
        for timer in timers {
            let status = match timer.status() {
                TimerStatus::Idle => "idle",
                TimerStatus::Running => "running",
                TimerStatus::Paused => "paused",
                TimerStatus::Finished => "finished",
            };
            out.push(format!(
                "  {} {} {status}",
                timer.label,
                format_time(timer.remaining)
            ));
        }
        out
    }

    fn pick(&self) -> Vec<String> {
        let roster = Roster::from_players(self.app.players.all());
        match roster.pick() {
            Some(player) => vec![format!("[PICK] {}", player.player.name)],
            None => error("Need at least two players to pick from"),
        }
    }

    // =========================================================================
    // ASSISTANT
    // =========================================================================

    async fn ai(&mut self, args: &str) -> Vec<String> {
        let (action, rest) = split_word(args);
        match action {
            "provider" => match Provider::parse(rest) {
                Some(provider) => {
                    self.app.assistant.set_provider(provider);
                    vec![format!("[OK] Provider: {provider}")]
                }
                None => error("Usage: #ai provider <openai|anthropic>"),
            },
            "key" => {
                let (provider, key) = split_word(rest);
                match Provider::parse(provider) {
                    Some(provider) if !key.is_empty() => {
                        self.app.assistant.set_api_key(provider, key);
                        vec![format!("[OK] Key saved for {provider}")]
                    }
                    _ => error("Usage: #ai key <openai|anthropic> <key>"),
                }
            }
            "test" => {
                if self.app.assistant.test_connection().await {
                    vec!["[OK] Connection works".to_string()]
                } else {
                    error("Connection failed")
                }
            }
            "" | "status" => {
                let config = self.app.assistant.config();
                vec![format!(
                    "[AI] provider: {}, configured: {}",
                    config.provider,
                    config.is_configured()
                )]
            }
            _ => error("Usage: #ai provider|key|test|status"),
        }
    }

    async fn ask(&mut self, args: &str) -> Vec<String> {
        let Some((game, question)) = args.split_once('|') else {
            return error("Usage: #ask <game> | <question>");
        };
        match self.app.assistant.ask_rules(game.trim(), question.trim()).await {
            Ok(answer) => reply_lines(&answer),
            Err(e) => error(&e.to_string()),
        }
    }

    async fn converse(&mut self, text: &str) -> Vec<String> {
        self.history.push(ChatMessage::user(text));
        match self.app.assistant.chat(&self.history, Some(SYSTEM_PROMPT)).await {
            Ok(answer) => {
                self.history.push(ChatMessage::assistant(answer.clone()));
                reply_lines(&answer)
            }
            Err(e) => {
                self.history.pop();
                error(&e.to_string())
            }
        }
    }
}

fn roll(notation: &str) -> Vec<String> {
    if notation.is_empty() {
        return error("Usage: #roll <notation>");
    }
    match DiceExpression::parse(notation) {
        Ok(expr) => vec![format!("[ROLL] {notation}: {}", expr.roll())],
        Err(dice::DiceError::NoDice) => error("Roll needs at least one die, e.g. 1d6"),
        Err(e) => error(&e.to_string()),
    }
}

fn reply_lines(answer: &str) -> Vec<String> {
    let mut out = vec!["[AI]".to_string()];
    out.extend(answer.split("\n\n").map(str::to_string));
    out
}

fn error(message: &str) -> Vec<String> {
    vec![format!("[ERROR] {message}")]
}

/// Split off the first word; the remainder is trimmed.
fn split_word(input: &str) -> (&str, &str) {
    let input = input.trim();
    match input.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (input, ""),
    }
}

/// Run the console over stdin/stdout until EOF or `#quit`.
pub async fn run(app: Gamepal) -> io::Result<()> {
    let mut console = Console::new(app);

    println!("=== Gamepal ===");
    println!(
        "{} players, {} games, {} rules",
        console.app.players.all().len(),
        console.app.library.all().len(),
        console.app.rules.all().len()
    );
    println!("Type #help for commands.");
    println!();

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                eprintln!("Error reading input: {e}");
                break;
            }
        };

        for out in console.handle(&line).await {
            println!("{out}");
        }
        stdout.flush().ok();

        if console.should_quit() {
            break;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gamepal_core::TestHarness;

    fn console() -> (Console, chat::testing::MockTransport) {
        let TestHarness { app, transport, .. } = TestHarness::new();
        (Console::new(app), transport)
    }

    #[test]
    fn test_split_word() {
        assert_eq!(split_word("  add  Alice Smith "), ("add", "Alice Smith"));
        assert_eq!(split_word("show"), ("show", ""));
        assert_eq!(split_word(""), ("", ""));
    }

    #[tokio::test]
    async fn test_players_and_teams() {
        let (mut c, _) = console();
        c.handle("#player add Alice").await;
        c.handle("#team add Red").await;
        let out = c.handle("#team join red alice").await;
        assert_eq!(out, vec!["[OK] alice joined red"]);

        let out = c.handle("#players").await;
        assert_eq!(out[0], "[PLAYERS] 1");
        assert!(out[1].ends_with("Alice (Red)"));

        c.handle("#player rm Alice").await;
        assert!(c.app.teams.all()[0].player_ids.is_empty());
    }

    #[tokio::test]
    async fn test_score_sheet_flow() {
        let (mut c, _) = console();
        c.handle("#score new Night Alice, Bob").await;
        c.handle("#score set 1 alice 7").await;
        let out = c.handle("#score set 3 alice 2").await;
        assert_eq!(out[1], "  Alice: 9 [7, 0, 2]");

        let out = c.handle("#score set 0 bob 1").await;
        assert_eq!(out, vec!["[ERROR] Rounds start at 1"]);
    }

    #[tokio::test]
    async fn test_game_loans() {
        let (mut c, _) = console();
        c.handle("#game add Ticket to Ride 2 5").await;
        c.handle("#game lend ticket to ride Sam").await;
        assert!(c.handle("#game lend Ticket").await[0].starts_with("[ERROR] Usage"));
        assert_eq!(c.handle("#game lend Azul Sam").await, vec!["[ERROR] No game named Azul"]);

        let game = &c.app.library.all()[0];
        assert_eq!(game.name, "Ticket to Ride");
        assert!(game.is_owned);
        assert_eq!(game.borrowed_to.as_deref(), Some("Sam"));
    }

    #[tokio::test]
    async fn test_roll_errors() {
        let (mut c, _) = console();
        let out = c.handle("#roll 5").await;
        assert!(out[0].starts_with("[ERROR] Roll needs at least one die"));
        assert!(c.handle("#roll 2d6+1").await[0].starts_with("[ROLL] 2d6+1: "));
        assert!(c.handle("#roll 4000000000d100").await[0].starts_with("[ERROR] Too many dice"));
        assert!(c.handle("#roll 1d6+2147483647+1").await[0].starts_with("[ERROR] Invalid dice notation"));
    }

    #[tokio::test]
    async fn test_timer_duration() {
        let (mut c, _) = console();
        let out = c.handle("#timer duel 3o").await;
        assert!(out[0].starts_with("[ERROR] Usage: #timer"));
        assert!(c.app.timers.snapshot().is_empty());

        c.handle("#timer duel").await;
        assert!(c.app.timers.snapshot().iter().all(|t| t.duration == DEFAULT_DURATION));

        let out = c.handle("#timer simple 90").await;
        assert_eq!(out[0], "[TIMERS] 1");
        assert_eq!(c.app.timers.snapshot()[0].duration, 90);
    }

    #[tokio::test]
    async fn test_free_text_goes_to_assistant() {
        let (mut c, transport) = console();
        assert!(c.handle("hello").await[0].starts_with("[ERROR] AI is not configured"));

        c.handle("#ai provider openai").await;
        c.handle("#ai key openai sk-test").await;
        transport.push_reply(200, gamepal_core::testing::openai_reply("Hi there"));
        assert_eq!(c.handle("hello").await, vec!["[AI]", "Hi there"]);

        transport.push_reply(200, gamepal_core::testing::openai_reply("Sure"));
        c.handle("and again").await;
        let body = &transport.requests()[1].body;
        // system + user + assistant + user
        assert_eq!(body["messages"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_quit() {
        let (mut c, _) = console();
        assert!(!c.should_quit());
        c.handle("#quit").await;
        assert!(c.should_quit());
    }
}
