//! linkgate - a keyboard-driven link shortener behind a login.
//!
//! The interactive TUI shortens one URL at a time through TinyURL or is.gd.
//! The session ends after 30 minutes without a key press or mouse event.

mod app;
mod clipboard;
mod ui;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use linkgate_core::auth::KeyringVerifier;
use linkgate_core::{Config, ProviderId, ShortenRequest, ShortenState};

use app::{App, AppState};
use ui::input::handle_input;
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

/// Log file name inside the cache directory
const LOG_FILE: &str = "linkgate.log";

/// Initialize tracing for the TUI. Output goes to a file so log lines never
/// land on the alternate screen. The guard must live until shutdown.
fn init_file_tracing(config: &Config) -> WorkerGuard {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let log_dir = config.cache_dir().unwrap_or_else(|_| PathBuf::from("./cache"));
    let appender = tracing_appender::rolling::never(log_dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(filter)
        .init();

    guard
}

/// Initialize tracing for one-shot CLI commands
fn init_stderr_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    // Check for CLI commands
    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 {
        init_stderr_tracing();
        return match args[1].as_str() {
            "--login" => cli_login(),
            "--logout" => cli_logout(),
            "--shorten" => cli_shorten(&args[2..]).await,
            "--store-credential" => cli_store_credential(),
            other => bail!(
                "Unknown option {}. Usage: linkgate [--login | --logout | \
                 --shorten <url> [--provider tinyurl|isgd] | --store-credential]",
                other
            ),
        };
    }

    let mut app = App::new().await?;

    // Initialize logging
    let _log_guard = init_file_tracing(&app.config);
    info!("linkgate starting");

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Resume a live session or ask for credentials
    app.restore_session();

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

    info!("linkgate shutting down");
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
            match event::read()? {
                Event::Key(key) => {
                    // Ctrl+C to quit
                    if key.code == KeyCode::Char('c')
                        && key.modifiers.contains(KeyModifiers::CONTROL)
                    {
                        return Ok(());
                    }

                    app.record_activity();

                    // Handle input
                    if handle_input(app, key)? {
                        return Ok(());
                    }
                }
                Event::Mouse(_) => app.record_activity(),
                _ => {}
            }
        }

        // Drain finished requests and expiry checks
        app.check_background_tasks();

        // Check if we should quit
        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }
    }
}

// ============================================================================
// CLI Commands
// ============================================================================

fn load_config() -> Config {
    Config::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load config, using defaults");
        Config::default()
    })
}

/// Prompt on stderr and read one line from stdin
fn prompt_line(prompt: &str, default: Option<&str>) -> Result<String> {
    match default {
        Some(d) => eprint!("{} [{}]: ", prompt, d),
        None => eprint!("{}: ", prompt),
    }
    io::stderr().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let line = line.trim();
    if line.is_empty() {
        Ok(default.unwrap_or_default().to_string())
    } else {
        Ok(line.to_string())
    }
}

fn prompt_credentials(config: &Config) -> Result<(String, String)> {
    let default = std::env::var("LINKGATE_USERNAME")
        .ok()
        .or_else(|| config.last_username.clone());
    let username = prompt_line("Username", default.as_deref())?;
    if username.is_empty() {
        bail!("Username required");
    }
    let password = rpassword::prompt_password("Password: ").context("Failed to read password")?;
    Ok((username, password))
}

/// Log in and persist the session for later `--shorten` calls
fn cli_login() -> Result<()> {
    let mut config = load_config();
    let (username, password) = prompt_credentials(&config)?;

    let mut gate = app::build_gate(&config, None)?;
    gate.login(&username, &password)?;
    eprintln!("Signed in as {}", username);

    if config.last_username.as_deref() != Some(username.as_str()) {
        config.last_username = Some(username);
        if let Err(e) = config.save() {
            tracing::warn!(error = %e, "Failed to save config");
        }
    }
    Ok(())
}

fn cli_logout() -> Result<()> {
    let config = load_config();
    let mut gate = app::build_gate(&config, None)?;
    // Restoring clears a stale record; logging out clears a live one
    if gate.restore() {
        gate.logout();
    }
    eprintln!("Signed out");
    Ok(())
}

/// Shorten one URL with the persisted session
async fn cli_shorten(args: &[String]) -> Result<()> {
    let config = load_config();

    let mut url = None;
    let mut provider = config.default_provider;
    let mut rest = args.iter();
    while let Some(arg) = rest.next() {
        match arg.as_str() {
            "--provider" => {
                let name = rest.next().context("--provider needs a value")?;
                provider = name.parse::<ProviderId>()?;
            }
            _ if url.is_none() => url = Some(arg.clone()),
            _ => bail!("Please enter only one URL at a time"),
        }
    }
    let url = url.context("Usage: linkgate --shorten <url> [--provider tinyurl|isgd]")?;

    let mut gate = app::build_gate(&config, None)?;
    if !gate.restore() {
        bail!("Not signed in. Run `linkgate --login` first.");
    }
    gate.record_activity();

    match gate.submit(&ShortenRequest::new(url, provider)).await {
        ShortenState::Success(short) => {
            println!("{}", short);
            Ok(())
        }
        ShortenState::Failed(e) => bail!("{}", e),
        _ => bail!("Session expired after inactivity. Run `linkgate --login` again."),
    }
}

/// Save a username/password pair for the keychain verifier
fn cli_store_credential() -> Result<()> {
    let config = load_config();
    let (username, password) = prompt_credentials(&config)?;
    KeyringVerifier::store(&username, &password)?;
    eprintln!("Stored credential for {} in the system keychain", username);
    Ok(())
}
