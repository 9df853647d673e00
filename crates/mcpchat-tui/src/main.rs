use anyhow::{Context, Result};
use clap::Parser;
use mcpchat_core::{ChatApiClient, ChatClient, Config};
use tracing::{info, warn};

mod app;
mod handler;
mod logging;
mod tui;
mod ui;

use app::App;
use tui::{EventHandler, Tui};

#[derive(Parser, Debug)]
#[command(name = "mcpchat", version)]
#[command(about = "Terminal chat client for MCP chat servers")]
struct Cli {
    /// Chat server URL; the API is served under /api/chat
    #[arg(short, long, env = "MCPCHAT_SERVER_URL")]
    url: Option<String>,

    /// Restrict tool selection to one category
    #[arg(short, long, env = "MCPCHAT_CATEGORY")]
    category: Option<String>,

    /// Give up on requests after this many seconds (default: wait forever)
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Write the effective settings to the config file
    #[arg(long)]
    save: bool,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let _log_guard = logging::init(cli.verbose)?;

    let file_config = Config::load().unwrap_or_else(|e| {
        warn!("Ignoring unreadable config file: {}", e);
        Config::new()
    });
    let config = file_config.merge(cli.url, cli.category, cli.timeout);
    if cli.save {
        config.save().context("could not save config")?;
    }

    info!(server = config.server_url(), "Starting mcpchat");

    let api = ChatApiClient::with_timeout(config.server_url(), config.request_timeout())?;
    let chat = ChatClient::new(api).with_category(config.category_id.clone());
    let mut app = App::new(chat, config.server_url());

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let result = run(&mut terminal, &mut app).await;
    tui::restore()?;

    result
}

async fn run(terminal: &mut Tui, app: &mut App) -> Result<()> {
    let mut events = EventHandler::new();

    // Show the connecting state while the session and health requests run
    terminal.draw(|frame| ui::render(app, frame))?;
    app.initialize().await;

    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event).await?,
            None => break,
        }
    }

    info!("Exiting");
    Ok(())
}
