//! `marusya`: terminal client for marking movies as favorites.
//!
//! # Usage
//!
//! ```
//! marusya --url http://localhost:8080 tt0133093 tt0816692
//! marusya --config ~/.config/marusya/config.toml --log-file /tmp/marusya.log
//! ```

mod app;
mod board;
mod client;
mod session;
mod ui;


use std::{fs::File, io, path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use app::App;
use board::FavoritesBoard;
use clap::Parser;
use client::{ApiClient, ApiConfig};
use crossterm::{
  event::{self, Event},
  execute,
  terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use marusya_core::movie::{Movie, MovieId};
use ratatui::{Terminal, backend::CrosstermBackend};
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "marusya", about = "Terminal client for Marusya favorites")]
struct Args {
  /// Path to a TOML config file (url, movies).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the marusya server (default: http://localhost:8080).
  #[arg(long, env = "MARUSYA_URL")]
  url: Option<String>,

  /// Write logs to this file. The terminal is never logged to.
  #[arg(long, value_name = "FILE")]
  log_file: Option<PathBuf>,

  /// Movie ids to show; replaces the config file's list.
  #[arg(value_name = "MOVIE_ID")]
  movies: Vec<String>,
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url:    String,
  #[serde(default)]
  movies: Vec<Movie>,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  // Log to a file only; the terminal belongs to the UI.
  if let Some(path) = &args.log_file {
    let file = File::create(path)
      .with_context(|| format!("opening log file {}", path.display()))?;
    tracing_subscriber::fmt()
      .with_env_filter(
        EnvFilter::builder()
          .with_default_directive(LevelFilter::INFO.into())
          .from_env_lossy(),
      )
      .with_ansi(false)
      .with_writer(std::sync::Mutex::new(file))
      .init();
  }

  // Load config file if provided.
  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  // CLI flags override config file, which overrides defaults.
  let api_config = ApiConfig {
    base_url: args
      .url
      .or_else(|| (!file_cfg.url.is_empty()).then(|| file_cfg.url.clone()))
      .unwrap_or_else(|| "http://localhost:8080".to_string()),
  };
  let movies = if args.movies.is_empty() {
    file_cfg.movies
  } else {
    args
      .movies
      .into_iter()
      .map(|id| Movie { id: MovieId::from(id), title: String::new() })
      .collect()
  };
  anyhow::ensure!(
    !movies.is_empty(),
    "no movies to show; pass movie ids or list them in the config file"
  );

  // Build the client and the board.
  let client = ApiClient::new(api_config)?;
  let mut board = FavoritesBoard::new(Arc::new(client.clone()), Arc::new(client));

  // Learn who is signed in before the first frame.
  board.restore_session();
  let mut app = App::new(board, movies);
  app.board.run_until_idle().await;
  app.tick();

  // Set up the terminal.
  enable_raw_mode().context("enabling raw mode")?;
  let mut stdout = io::stdout();
  execute!(stdout, EnterAlternateScreen).context("entering alternate screen")?;
  let backend = CrosstermBackend::new(stdout);
  let mut terminal = Terminal::new(backend).context("creating terminal")?;

  // Run the event loop; restore terminal even on error.
  let run_result = run_event_loop(&mut terminal, &mut app);

  // Restore terminal regardless of result.
  disable_raw_mode().ok();
  execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
  terminal.show_cursor().ok();

  run_result
}

// ─── Event loop ───────────────────────────────────────────────────────────────

fn run_event_loop(
  terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
  app: &mut App<ApiClient, ApiClient>,
) -> Result<()> {
  loop {
    app.tick();
    terminal.draw(|f| ui::draw(f, app)).context("drawing frame")?;

    // Poll for an event, letting the runtime's workers finish requests
    // while this thread waits.
    let maybe_event = tokio::task::block_in_place(|| {
      if event::poll(Duration::from_millis(50))? {
        Ok::<_, io::Error>(Some(event::read()?))
      } else {
        Ok(None)
      }
    })?;

    if let Some(Event::Key(key)) = maybe_event
      && !app.handle_key(key)
    {
      break;
    }
  }

  Ok(())
}
