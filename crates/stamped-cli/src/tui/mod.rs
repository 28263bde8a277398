//! Stamped TUI
//!
//! Terminal user interface for Stamped - timestamped notes.
//!
//! ## Views
//!
//! - Landing (`/`): title, how it works, stored documents
//! - Document (`/<id>`): stopwatch controls above a grid (or text) editor
//!
//! ## Landing keys
//!
//! - j/k or ↑/↓: Move selection up/down
//! - Enter: Open selected document
//! - n: New document
//! - d: Delete selected document
//! - ?: Help
//! - q: Quit
//!
//! ## Document keys
//!
//! - Typing edits the active cell; the terminator stamps the elapsed time
//! - ←/→, Home/End: Move the caret
//! - ↑/↓, Tab/Shift+Tab: Change cell
//! - Ctrl+T: Start/stop timer, Ctrl+R: Reset timer
//! - Ctrl+S: Save, Ctrl+E: Download CSV
//! - Esc: Back to the landing view
//! - F1: Help
//! - Ctrl+C / Ctrl+Q: Quit

mod app;
mod ui;

use std::fs::{self, File};
use std::io::stdout;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::prelude::*;
use stamped_core::route::Route;
use stamped_core::{analytics, Analytics, Config, DocumentKind, DocumentStore, FileStore};
use tracing::info;
use tracing_subscriber::EnvFilter;

use app::{App, View};

use crate::commands;

/// Key polling interval
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Run the TUI application starting at `route`
pub async fn run(config: Config, route: Route, is_new: bool) -> Result<()> {
    // Initialize TUI logging (file-based, only if STAMPED_LOG is set)
    init_tui_logging(&config);

    let mut store = commands::open_store(&config)?;
    let sink = analytics::from_config(&config);

    // Create app and show the first view
    let mut app = App::new(&store, &config)?;
    app.navigate(&mut store, route, is_new, sink.as_ref())?;

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    // Run app
    let result = run_app(&mut terminal, &mut app, &mut store, sink.as_ref()).await;

    // An error may leave a document open
    app.close_session(&mut store);

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    if let Some(error) = app.error.take() {
        eprintln!("{}", error);
    }

    result
}

async fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    store: &mut DocumentStore<FileStore>,
    sink: &dyn Analytics,
) -> Result<()> {
    loop {
        // Fire ticks, autosaves and message expiry
        app.poll(store, Instant::now());

        // Draw UI
        terminal.draw(|frame| ui::draw(frame, app))?;

        let wake_at = app.next_deadline().map(tokio::time::Instant::from_std);

        tokio::select! {
            biased;

            // Next timer deadline; handled by the poll at the top of the loop
            _ = async {
                match wake_at {
                    Some(at) => tokio::time::sleep_until(at).await,
                    None => std::future::pending::<()>().await,
                }
            } => {}

            // Poll for terminal events
            _ = tokio::time::sleep(POLL_INTERVAL) => {
                // Check for terminal events (non-blocking)
                if event::poll(Duration::from_millis(0))? {
                    if let Event::Key(key) = event::read()? {
                        // Only handle key press events (not release)
                        if key.kind != KeyEventKind::Press {
                            continue;
                        }

                        // If error modal is showing, any key dismisses it
                        if app.has_error() {
                            app.clear_error();
                            continue;
                        }

                        // If help is showing, any key dismisses it
                        if app.show_help {
                            app.show_help = false;
                            continue;
                        }

                        let result = match app.view {
                            View::Landing => {
                                handle_landing_keys(app, store, sink, key.code, key.modifiers)
                            }
                            View::Document(_) => handle_document_keys(
                                app,
                                store,
                                sink,
                                key.code,
                                key.modifiers,
                                Instant::now(),
                            ),
                        };
                        if let Err(e) = result {
                            app.set_error(format!("{:#}", e));
                        }
                    }
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

/// Handle key events on the landing view
fn handle_landing_keys(
    app: &mut App,
    store: &mut DocumentStore<FileStore>,
    sink: &dyn Analytics,
    code: KeyCode,
    modifiers: KeyModifiers,
) -> Result<()> {
    match code {
        // Quit
        KeyCode::Char('q') => app.quit(store),
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => app.quit(store),

        // Navigation
        KeyCode::Char('k') | KeyCode::Up => app.move_up(),
        KeyCode::Char('j') | KeyCode::Down => app.move_down(),

        KeyCode::Enter => app.open_selected(store, sink)?,
        KeyCode::Char('n') => app.new_document(store, sink)?,
        KeyCode::Char('d') => app.delete_selected(store)?,
        KeyCode::Char('?') => app.toggle_help(),

        _ => {}
    }
    Ok(())
}

/// Handle key events on the document view
fn handle_document_keys(
    app: &mut App,
    store: &mut DocumentStore<FileStore>,
    sink: &dyn Analytics,
    code: KeyCode,
    modifiers: KeyModifiers,
    now: Instant,
) -> Result<()> {
    if modifiers.contains(KeyModifiers::CONTROL) {
        match code {
            KeyCode::Char('c') | KeyCode::Char('q') => app.quit(store),
            KeyCode::Char('s') => app.save(store, now),
            KeyCode::Char('e') => app.export(sink),
            KeyCode::Char('t') => {
                if let Some(session) = app.session_mut() {
                    session.toggle_timer(now);
                }
            }
            KeyCode::Char('r') => {
                if let Some(session) = app.session_mut() {
                    session.reset_timer();
                }
            }
            _ => {}
        }
        return Ok(());
    }

    match code {
        KeyCode::Esc => return app.go_home(store, sink),
        KeyCode::F(1) => {
            app.toggle_help();
            return Ok(());
        }
        _ => {}
    }

    let Some(session) = app.session_mut() else {
        return Ok(());
    };

    match code {
        KeyCode::Char(c) if !modifiers.contains(KeyModifiers::ALT) => session.type_char(c, now),
        KeyCode::Enter => match session.kind() {
            DocumentKind::Grid => session.move_down(),
            DocumentKind::Text => session.type_char('\n', now),
        },
        KeyCode::Backspace => session.backspace(now),
        KeyCode::Delete => session.delete(now),

        // Caret
        KeyCode::Left => session.cursor_left(),
        KeyCode::Right => session.cursor_right(),
        KeyCode::Home => session.cursor_home(),
        KeyCode::End => session.cursor_end(),

        // Cells
        KeyCode::Up => session.move_up(),
        KeyCode::Down => session.move_down(),
        KeyCode::Tab => session.next_cell(),
        KeyCode::BackTab => session.prev_cell(),

        _ => {}
    }
    Ok(())
}

/// Initialize TUI logging to a file
///
/// Only initializes if STAMPED_LOG is set (e.g., STAMPED_LOG=debug).
/// Logs are written to {data_dir}/debug.log or the configured log_file.
fn init_tui_logging(config: &Config) {
    // Only log if STAMPED_LOG is set
    let Ok(log_level) = std::env::var("STAMPED_LOG") else {
        return;
    };

    let log_path = config.log_path();
    if let Some(parent) = log_path.parent() {
        let _ = fs::create_dir_all(parent);
    }

    // Create log file
    let log_file = match File::create(&log_path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: Could not create log file {:?}: {}", log_path, e);
            return;
        }
    };

    let env_filter = EnvFilter::new(format!(
        "stamped_core={},stamped_cli={},stamped={}",
        log_level, log_level, log_level
    ));

    // Initialize file-based logging (ignore error if already initialized)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(log_file)
        .try_init();

    info!("TUI logging initialized to {:?}", log_path);
}
