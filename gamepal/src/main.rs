//! Board game companion console.
//!
//! A line-oriented interface over the companion engine: players, teams, the
//! game library, rules, score sheets, timers, dice and the AI rules assistant.
//!
//! ```bash
//! cargo run -p gamepal -- --data-dir ./gamepal-data
//! ```
//!
//! Data is written to `GAMEPAL_DATA_DIR` (or `--data-dir`), one JSON file per
//! stored key. API keys from `OPENAI_API_KEY` / `ANTHROPIC_API_KEY` seed the
//! assistant configuration when none is stored yet.

mod console;

use chat::{ChatClient, Provider};
use gamepal_core::{FileStore, Gamepal, MemoryDocument, Storage};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_DATA_DIR: &str = "gamepal-data";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return Ok(());
    }

    let data_dir = data_dir_from_args(&args);
    let store = FileStore::open(&data_dir)?;
    info!(dir = %data_dir.display(), "opened data directory");

    let mut app = Gamepal::open(
        Storage::new(store),
        Arc::new(MemoryDocument::new()),
        ChatClient::new(),
    );
    seed_api_keys(&mut app);

    console::run(app).await?;
    Ok(())
}

fn data_dir_from_args(args: &[String]) -> PathBuf {
    let mut i = 0;
    while i < args.len() {
        if args[i] == "--data-dir" {
            if let Some(dir) = args.get(i + 1) {
                return PathBuf::from(dir);
            }
        }
        i += 1;
    }
    std::env::var("GAMEPAL_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_DIR))
}

/// Fill in provider keys from the environment without overwriting stored ones.
fn seed_api_keys(app: &mut Gamepal) {
    let sources = [
        (Provider::OpenAi, "OPENAI_API_KEY"),
        (Provider::Anthropic, "ANTHROPIC_API_KEY"),
    ];
    for (provider, var) in sources {
        if app
            .assistant
            .config()
            .key_for(provider)
            .is_some_and(|key| !key.is_empty())
        {
            continue;
        }
        if let Ok(key) = std::env::var(var) {
            if !key.trim().is_empty() {
                app.assistant.set_api_key(provider, &key);
                info!(%provider, "loaded API key from environment");
            }
        }
    }
}

fn print_help() {
    println!("Gamepal - board game companion");
    println!();
    println!("USAGE:");
    println!("  gamepal [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("  -h, --help          Show this help message");
    println!("  --data-dir <DIR>    Where to keep data (default: $GAMEPAL_DATA_DIR or ./{DEFAULT_DATA_DIR})");
    println!();
    println!("ENVIRONMENT:");
    println!("  OPENAI_API_KEY      Seeds the OpenAI key if none is stored");
    println!("  ANTHROPIC_API_KEY   Seeds the Anthropic key if none is stored");
    println!("  RUST_LOG            Log filter (default: info)");
    println!();
    println!("Type #help once running for the list of commands.");
}
