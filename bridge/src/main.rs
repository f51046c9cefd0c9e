//! `uci-bridge`: runs one board against a UCI engine.
//!
//! UI notifications arrive on stdin as JSON lines (see [`UiNotification`]);
//! effects leave on stdout as JSON lines (see [`Effect`]). Logs go to a
//! daily rolling file, never to stdout.

use std::path::PathBuf;
use std::sync::Arc;

use bridge::board::{BoardManager, Effect, UiNotification};
use bridge::book::{FenBook, NoBook, OpeningBook};
use bridge::config;
use bridge::settings::{FileSettingsSource, Settings, SettingsStore};
use clap::Parser;
use engine::transport_for;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::{BroadcastStream, LinesStream};
use tokio_stream::StreamExt;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "uci-bridge", about = "Engine hints and moves for a chess board UI")]
struct Cli {
    /// Settings file. Defaults to `UCI_BRIDGE_SETTINGS_PATH` or the user
    /// config directory.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Opening book with one FEN per line.
    #[arg(long)]
    book: Option<PathBuf>,

    /// Run the engine as a child process from this path.
    #[arg(long, conflicts_with = "tcp")]
    engine: Option<PathBuf>,

    /// Talk to an engine worker at `host:port`.
    #[arg(long)]
    tcp: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_dir = config::get_log_dir();
    std::fs::create_dir_all(&log_dir).ok();
    let file_appender = tracing_appender::rolling::daily(&log_dir, "uci-bridge");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_line_number(true),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    tracing::info!("UCI bridge starting up");

    let settings_path = cli.settings.unwrap_or_else(config::get_settings_path);
    let mut store = SettingsStore::new(Box::new(FileSettingsSource::new(&settings_path)));
    let settings = apply_overrides(store.load().await, cli.engine, cli.tcp);
    tracing::info!("Settings from {:?}, engine at {:?}", settings_path, settings.endpoint());

    let book: Arc<dyn OpeningBook> = match cli.book.or_else(config::get_book_path) {
        Some(path) => match FenBook::load(&path).await {
            Ok(book) => Arc::new(book),
            Err(e) => {
                tracing::warn!("Opening book {:?} unavailable: {}", path, e);
                Arc::new(NoBook)
            }
        },
        None => Arc::new(NoBook),
    };

    let manager = BoardManager::new(book);
    let transport = transport_for(&settings.endpoint());
    let (handle, effects) = manager.create_board(settings, transport).await;

    let writer = tokio::spawn(write_effects(BroadcastStream::new(effects)));

    let mut lines = LinesStream::new(BufReader::new(tokio::io::stdin()).lines());
    while let Some(line) = lines.next().await {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let notification: UiNotification = match serde_json::from_str(&line) {
            Ok(n) => n,
            Err(e) => {
                tracing::warn!("Ignoring malformed notification {:?}: {}", line, e);
                continue;
            }
        };
        let pushed = match &notification {
            UiNotification::OptionsChanged { options } => Settings::from_map(options.clone()).ok(),
            _ => None,
        };
        match handle.notify(notification).await {
            Ok(()) => {
                if let Some(settings) = pushed {
                    store.remember(settings);
                }
            }
            Err(e) => tracing::warn!("Notification rejected: {}", e),
        }
    }

    tracing::info!("Input closed, shutting down");
    manager.close_board(handle.id()).await?;
    writer.await?;

    tracing::info!("UCI bridge shutting down");
    Ok(())
}

/// Command-line endpoint flags win over the settings file.
fn apply_overrides(mut settings: Settings, engine: Option<PathBuf>, tcp: Option<String>) -> Settings {
    if let Some(path) = engine {
        settings.api_stockfish = false;
        settings.engine_path = Some(path);
    }
    if let Some(addr) = tcp {
        settings.api_stockfish = true;
        settings.url_api_stockfish = addr;
    }
    settings
}

async fn write_effects(mut effects: BroadcastStream<Effect>) {
    let mut stdout = tokio::io::stdout();
    while let Some(effect) = effects.next().await {
        let effect = match effect {
            Ok(effect) => effect,
            Err(BroadcastStreamRecvError::Lagged(n)) => {
                tracing::warn!("Effect output lagged, {} effects dropped", n);
                continue;
            }
        };
        let mut line = match serde_json::to_string(&effect) {
            Ok(line) => line,
            Err(e) => {
                tracing::error!("Failed to encode effect: {}", e);
                continue;
            }
        };
        line.push('\n');
        if stdout.write_all(line.as_bytes()).await.is_err() || stdout.flush().await.is_err() {
            tracing::warn!("Stdout closed, no longer writing effects");
            break;
        }
    }
}
