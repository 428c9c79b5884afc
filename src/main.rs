use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand};
use colored::*;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};

use persona_chat::{
    handler, session::load_history, tui, ui, App, ChatSession, CompletionClient, Config, GroqClient, KeyValueStore,
    LauncherConfig, Persona, Sender, SqliteStore,
};

#[derive(Parser)]
#[command(name = "personas")]
#[command(about = "Chat with AI personas from your terminal")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
    /// History database to use instead of the configured one
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Model identifier to send with each request
    #[arg(long, global = true)]
    model: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List personas and how many messages each has stored
    List,
    /// Print a persona's stored conversation
    History {
        /// Persona slug or title (e.g. grandpa, "AI Best Friend")
        persona: String,
    },
    /// Send one message and print the reply
    Send {
        /// Persona slug or title
        persona: String,
        /// Message text
        #[arg(required = true)]
        message: Vec<String>,
    },
    /// Erase a persona's conversation
    Clear {
        /// Persona slug or title
        persona: String,
    },
    /// Save the model to use by default
    SetModel {
        /// Model identifier (e.g. llama3-8b-8192)
        model: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_tracing();

    if let Some(Commands::SetModel { model }) = &cli.command {
        Config::save_default_model(model)?;
        println!("Default model set to {} in {}", model.bold(), Config::config_path()?.display());
        return Ok(());
    }

    let mut config = Config::load()?;
    if let Some(db) = cli.db {
        config.history_path = Some(db);
    }
    if let Some(model) = cli.model {
        config.model = model;
    }

    let history_path = config.resolve_history_path()?;
    let store: Arc<dyn KeyValueStore> = Arc::new(SqliteStore::open(&history_path)?);
    info!(path = %history_path.display(), model = %config.model, "Starting");

    match cli.command {
        None => run_tui(&config, store).await?,
        Some(Commands::List) => list_personas(store),
        Some(Commands::History { persona }) => print_history(parse_persona(&persona)?, store),
        Some(Commands::Send { persona, message }) => {
            let mut session = open_session(&persona, &config, store)?;
            send_message(&mut session, &config, &message.join(" ")).await;
        }
        Some(Commands::Clear { persona }) => {
            let mut session = open_session(&persona, &config, store)?;
            session.clear_history();
            println!("Cleared history for {}", session.title.bold());
        }
        Some(Commands::SetModel { .. }) => {}
    }

    Ok(())
}

/// Log to a daily file; the terminal belongs to the UI.
fn init_tracing() -> Option<WorkerGuard> {
    use tracing_subscriber::EnvFilter;

    let appender = log_appender(&Config::log_dir().ok()?)?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .ok()?;
    Some(guard)
}

/// Daily log file under `log_dir`, or `None` if the directory can't be used.
fn log_appender(log_dir: &Path) -> Option<RollingFileAppender> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("personas.log")
        .build(log_dir)
        .ok()
}

fn completion_client(config: &Config) -> Arc<dyn CompletionClient> {
    let api_key = config.resolve_api_key().unwrap_or_else(|| {
        warn!("No API key configured; requests will fail until one is set");
        String::new()
    });
    Arc::new(GroqClient::new(&api_key, &config.base_url))
}

fn parse_persona(name: &str) -> Result<Persona> {
    Persona::from_str(name).ok_or_else(|| {
        let known: Vec<&str> = Persona::all().iter().map(|p| p.slug()).collect();
        anyhow!("Unknown persona '{}'. Choose one of: {}", name, known.join(", "))
    })
}

fn open_session(name: &str, config: &Config, store: Arc<dyn KeyValueStore>) -> Result<ChatSession> {
    let persona = parse_persona(name)?;
    Ok(ChatSession::open(persona.route(), &config.model, store))
}

async fn run_tui(config: &Config, store: Arc<dyn KeyValueStore>) -> Result<()> {
    let mut app = App::new(
        completion_client(config),
        store,
        &config.model,
        config.response_delay(),
        LauncherConfig::default(),
    );

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = tui::EventHandler::new(tui::TICK_RATE);

    let result = async {
        while !app.should_quit {
            terminal.draw(|frame| ui::render(&mut app, frame))?;
            match events.next().await {
                Some(event) => handler::handle_event(&mut app, event).await?,
                None => break,
            }
        }
        Ok::<(), anyhow::Error>(())
    }
    .await;

    tui::restore()?;
    result
}

fn list_personas(store: Arc<dyn KeyValueStore>) {
    println!("\n{}", "AI Personas".bold().blue());
    println!("{}", "=".repeat(30).dimmed());

    for persona in Persona::all() {
        let count = load_history(store.as_ref(), persona.title()).len();
        println!(
            "  • {} ({}) {}",
            persona.title().green(),
            persona.slug(),
            format!("{} messages", count).dimmed()
        );
    }
}

fn print_history(persona: Persona, store: Arc<dyn KeyValueStore>) {
    let messages = load_history(store.as_ref(), persona.title());

    println!("\n{}", persona.title().bold().blue());
    println!("{}", "=".repeat(40).dimmed());

    if messages.is_empty() {
        println!("{}", "No messages yet".yellow());
        return;
    }

    for msg in &messages {
        match msg.sender {
            Sender::User => println!("\n{}\n{}", "You:".bold().cyan(), msg.text),
            Sender::Bot => println!("\n{}\n{}", format!("{}:", persona.title()).bold().yellow(), msg.text),
        }
    }
}

async fn send_message(session: &mut ChatSession, config: &Config, text: &str) {
    session.set_input(text);
    // Pacing is for the chat screen; print as soon as the reply lands
    if !session.exchange(completion_client(config), Duration::ZERO).await {
        println!("{}", "Nothing to send".yellow());
        return;
    }

    if let Some(reply) = session.messages().last() {
        println!("{}", format!("{}:", session.title).bold().yellow());
        println!("{}", reply.text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_appender_in_writable_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(log_appender(&dir.path().join("logs")).is_some());
    }

    #[test]
    fn test_log_appender_unusable_dir_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("not-a-dir");
        std::fs::write(&file, "").unwrap();
        assert!(log_appender(&file.join("logs")).is_none());
    }
}
