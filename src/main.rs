mod app;
mod catalog;
mod config;
mod constants;
mod debounce;
mod detail;
mod input;
mod lifecycle;
mod logging;
mod poster;
mod search;
mod summary;
mod theme;
mod ui;
mod watched;
mod window;

use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser};
use ratatui::{
  DefaultTerminal,
  crossterm::event::{self, Event, KeyEventKind},
};
use std::sync::Arc;
use tracing::{info, warn};

use app::App;
use catalog::OmdbClient;
use config::{Config, data_dir};
use constants::constants;
use poster::CliPosterMode;
use watched::WatchedStore;

// --- CLI ---

#[derive(Parser, Debug)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
struct Args {
  /// OMDb API key (overrides the one saved in prefs.toml)
  #[arg(long, env = "OMDB_API_KEY", hide_env_values = true)]
  api_key: Option<String>,

  /// Catalog endpoint
  #[arg(long)]
  base_url: Option<String>,

  /// Poster mode: 'auto', 'color', 'ascii', or 'off' (default: saved preference, then auto-detect)
  #[arg(short, long, default_value = "auto")]
  poster_mode: CliPosterMode,

  /// More log output (-v debug, -vv trace)
  #[arg(short, long, action = clap::ArgAction::Count)]
  verbose: u8,

  /// Print shell completions and exit
  #[arg(long, value_name = "SHELL")]
  completions: Option<clap_complete::Shell>,
}

// --- Main ---

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  if let Some(shell) = args.completions {
    let mut cmd = Args::command();
    let name = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
    return Ok(());
  }

  let data_dir = data_dir();
  let _log_guard = logging::init_logging(&data_dir.join("logs"), args.verbose)?;
  info!(version = env!("CARGO_PKG_VERSION"), "starting");

  let config = Config::load();
  let api_key = config.resolve_api_key(args.api_key.as_deref()).ok_or_else(|| {
    anyhow!("No OMDb API key. Pass --api-key, set OMDB_API_KEY, or add api_key to prefs.toml")
  })?;
  let base_url = args.base_url.clone().or_else(|| config.base_url.clone()).unwrap_or_else(|| constants().catalog_base_url.clone());
  let catalog = OmdbClient::new(api_key, &base_url).with_context(|| format!("Failed to set up catalog client for {}", base_url))?;

  let watched = WatchedStore::open(data_dir.join(&constants().watched_file));
  let poster_mode = poster::resolve_poster_mode(args.poster_mode, config.poster_mode.as_deref());
  let app = App::new(Arc::new(catalog), watched, config, poster_mode);

  let default_hook = std::panic::take_hook();
  std::panic::set_hook(Box::new(move |info| {
    ratatui::restore();
    default_hook(info);
  }));

  let mut terminal = ratatui::init();
  let result = run(&mut terminal, app).await;
  if let Err(e) = window::set_title(&constants().app_title) {
    warn!(err = %e, "failed to restore title");
  }
  ratatui::restore();
  info!("exiting");
  result
}

async fn run(terminal: &mut DefaultTerminal, mut app: App) -> Result<()> {
  loop {
    app.tick();
    if let Some(title) = app.take_title_change()
      && let Err(e) = window::set_title(&title)
    {
      warn!(err = %e, "failed to set title");
    }

    terminal.draw(|frame| ui::ui(frame, &mut app))?;

    if event::poll(constants().poll_interval())? {
      match event::read()? {
        Event::Key(key) if key.kind == KeyEventKind::Press => {
          input::handle_key_event(&mut app, key);
        }
        _ => {}
      }
    }

    if app.should_quit {
      break;
    }
  }
  Ok(())
}
