//! mealcache - school meals from NEIS in the terminal.
//!
//! Search a school, pin up to three favorites, and see today's lunch or the
//! whole school week. Responses are cached locally so repeat lookups are
//! instant.

mod app;
mod ui;

use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::Local;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use mealcache_core::utils::week_dates;
use mealcache_core::{ApiClient, Config, MealStore};
use mealcache_core::cache::FileStore;

use app::{App, AppState};
use ui::input::handle_input;
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

const LOG_FILE_NAME: &str = "mealcache.log";

fn env_filter() -> EnvFilter {
    // RUST_LOG controls the level (e.g. RUST_LOG=mealcache=debug)
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Log to a file under the cache dir; the terminal belongs to the UI.
fn init_file_tracing(log_dir: &Path) -> WorkerGuard {
    let appender = tracing_appender::rolling::never(log_dir, LOG_FILE_NAME);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(env_filter())
        .init();

    guard
}

/// CLI commands print JSON to stdout, so logs go to stderr.
fn init_stderr_tracing() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(env_filter())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let args: Vec<String> = std::env::args().collect();
    match args.get(1).map(String::as_str) {
        Some("--search") => {
            init_stderr_tracing();
            let query = args[2..].join(" ");
            return dump_search(&query).await;
        }
        Some("--meals") => {
            init_stderr_tracing();
            return dump_meals().await;
        }
        Some("--set-key") => {
            init_stderr_tracing();
            let Some(key) = args.get(2).filter(|k| !k.trim().is_empty()) else {
                anyhow::bail!("Usage: mealcache --set-key <key>");
            };
            let path = Config::store_api_key(key)?;
            eprintln!("API key saved to {}", path.display());
            return Ok(());
        }
        Some(other) if other.starts_with("--") => {
            anyhow::bail!(
                "Unknown option {other}. Usage: mealcache [--search <query> | --meals | --set-key <key>]"
            );
        }
        _ => {}
    }

    let log_dir = Config::load()
        .ok()
        .and_then(|c| c.cache_dir().ok())
        .unwrap_or_else(|| PathBuf::from("./cache"));
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory {:?}", log_dir))?;
    let _log_guard = init_file_tracing(&log_dir);
    info!("mealcache starting");

    let mut app = App::new()?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    app.bootstrap();

    // Main loop
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    info!("mealcache shutting down");
    Ok(())
}

fn cli_client() -> Result<ApiClient> {
    let config = Config::load().context("Failed to load config")?;
    let store = MealStore::shared(FileStore::new(config.cache_dir()?)?);
    Ok(ApiClient::new(config, store)?)
}

/// Print schools matching `query` as JSON
async fn dump_search(query: &str) -> Result<()> {
    let client = cli_client()?;
    let schools = client.search_schools(query).await?;
    eprintln!("Found {} schools", schools.len());
    println!("{}", serde_json::to_string_pretty(&schools)?);
    Ok(())
}

/// Print this week's meals for the stored school as JSON
async fn dump_meals() -> Result<()> {
    let client = cli_client()?;
    let school = client.store().selected_school();
    let Some(ref picked) = school else {
        anyhow::bail!("No school selected. Pick one in the app first.");
    };

    let week = week_dates(Local::now().date_naive());
    let (Some(&from), Some(&to)) = (week.first(), week.last()) else {
        return Ok(());
    };

    eprintln!("Fetching meals for {} ({} ~ {})...", picked.school_name, from, to);
    let meals = client.meals_for_range(school.as_ref(), from, to).await?;
    println!("{}", serde_json::to_string_pretty(&meals)?);
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        // Draw UI
        terminal.draw(|f| render(f, app))?;

        // Poll for events with timeout to allow background updates
        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }

                // Ctrl+C to quit
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    return Ok(());
                }

                if handle_input(app, key)? {
                    return Ok(());
                }
            }
        }

        app.tick(Instant::now());

        // Check for completed background tasks
        app.check_background_tasks();

        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }
    }
}
