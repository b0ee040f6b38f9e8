use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use papo_core::{identity, ChatClient, Config, FileStore, HttpTransport, Outcome};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod app;
mod handler;
mod tui;
mod ui;

use app::App;
use tui::{EventHandler, Session};

#[derive(Parser)]
#[command(name = "papo")]
#[command(about = "Terminal chat client with quick-reply options", version)]
struct Cli {
    /// Chat endpoint URL (overrides config and PAPO_ENDPOINT)
    #[arg(short, long, global = true)]
    endpoint: Option<String>,
    /// Path of the local storage file holding the user id
    #[arg(short, long, global = true)]
    storage: Option<PathBuf>,
    /// Request timeout in seconds (0 disables)
    #[arg(short, long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the interactive chat (default)
    Chat,
    /// Send a single message and print the reply
    Send {
        /// Message text
        message: String,
    },
    /// Print the persisted user id, creating it if needed
    Whoami,
    /// Show the effective configuration
    Config {
        /// Persist the command-line overrides to the config file
        #[arg(long)]
        save: bool,
    },
}

impl Cli {
    fn apply(&self, mut config: Config) -> Config {
        if let Some(endpoint) = &self.endpoint {
            config.endpoint = Some(endpoint.clone());
        }
        if let Some(storage) = &self.storage {
            config.storage_path = Some(storage.clone());
        }
        if let Some(timeout) = self.timeout {
            config.timeout_secs = Some(timeout);
        }
        config
    }

    /// Flags over `PAPO_ENDPOINT` over the config file
    fn resolve_config(&self, file: Config) -> Config {
        self.apply(file.with_env())
    }
}

/// A missing file yields defaults; an unreadable one is reported and skipped.
fn load_config() -> Config {
    match Config::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(error = %e, "ignoring unreadable config file, using defaults");
            Config::new()
        }
    }
}

/// Log to a file: the terminal belongs to the UI.
fn init_logging() -> Result<PathBuf> {
    let log_dir = dirs::data_dir()
        .ok_or_else(|| anyhow!("Could not determine data directory"))?
        .join("papo");
    fs::create_dir_all(&log_dir)?;
    let log_path = log_dir.join("papo.log");

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("opening log file {}", log_path.display()))?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,papo_core=debug,papo_tui=debug".into());
    let writer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(Mutex::new(file));

    tracing_subscriber::registry().with(filter).with(writer).init();

    Ok(log_path)
}

fn build_client(config: &Config) -> Result<ChatClient> {
    let transport = HttpTransport::with_timeout(config.endpoint(), config.timeout())?;
    let store = FileStore::new(config.storage_path()?);
    Ok(ChatClient::new(Arc::new(transport), Box::new(store)))
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Logging is best-effort; chatting works without it
    let log_path = init_logging().ok();

    let config = cli.resolve_config(load_config());
    tracing::info!(endpoint = config.endpoint(), log = ?log_path, "starting papo");

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => {
            run_chat(&config).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Send { message } => send_once(&config, &message).await,
        Commands::Whoami => {
            let mut store = FileStore::new(config.storage_path()?);
            println!("{}", identity::user_id(&mut store)?);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Config { save } => {
            if save {
                config.save()?;
                println!("Saved to {}", Config::get_config_path()?.display());
            }
            println!("{}", serde_json::to_string_pretty(&config)?);
            println!("effective endpoint: {}", config.endpoint());
            println!("storage file: {}", config.storage_path()?.display());
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn send_once(config: &Config, message: &str) -> Result<ExitCode> {
    let mut client = build_client(config)?;
    let mut input = message.to_string();

    let Some(outcome) = client.send_message(&mut input, None).await else {
        eprintln!("Nothing to send: message is empty");
        return Ok(ExitCode::FAILURE);
    };

    for entry in client.transcript().entries().skip(1) {
        println!("{}", entry.text);
    }
    if let Some(set) = client.transcript().latest_options() {
        for (i, choice) in set.choices.iter().enumerate() {
            println!("  {}. {}", i + 1, choice);
        }
    }

    Ok(match outcome {
        Outcome::Replied => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    })
}

async fn run_chat(config: &Config) -> Result<()> {
    let client = build_client(config)?;
    let mut app = App::new(client, config.endpoint());

    let mut session = Session::open()?;
    let mut events = EventHandler::new();
    let tx = events.sender();

    let result = async {
        while !app.should_quit {
            session.terminal.draw(|frame| ui::render(&mut app, frame))?;

            match events.next().await {
                Some(event) => handler::handle_event(&mut app, event, &tx)?,
                None => break,
            }
        }
        Ok::<(), anyhow::Error>(())
    }
    .await;

    session.close()?;
    result
}
