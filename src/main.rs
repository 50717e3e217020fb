mod api;
mod app;
mod args;
mod catalog;
mod chat;
mod commands;
mod config;
mod error;
mod models;
#[cfg(test)]
mod test_support;
mod ui;

use std::path::PathBuf;
use std::sync::Arc;
use std::{io, time::Duration};

use anyhow::{Context, Result};
use app::{App, AppEvent, TerminalMessenger};
use chat::{CommandContext, Message, Room, User};
use commands::MemeApp;
use config::Config;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use directories::ProjectDirs;
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::ui::draw;

struct TerminalSession {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl TerminalSession {
    fn new() -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Ok(Self { terminal })
    }

    fn terminal_mut(&mut self) -> &mut Terminal<CrosstermBackend<io::Stdout>> {
        &mut self.terminal
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(
            self.terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        );
        let _ = self.terminal.show_cursor();
    }
}

/// Logs go to a daily rolling file so they never draw over the TUI.
fn init_tracing() -> Result<WorkerGuard> {
    let proj_dirs = ProjectDirs::from("com", "memegen-chat", "memegen-chat")
        .ok_or_else(|| anyhow::anyhow!("Failed to determine data directory"))?;
    let log_dir = proj_dirs.data_local_dir().join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let appender = tracing_appender::rolling::daily(&log_dir, "memegen-chat.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,hyper_util=info,reqwest=info"));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(writer)
                .with_target(true)
                .with_ansi(false),
        )
        .with(filter)
        .init();
    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    // WorkerGuard must outlive main() so buffered log lines are flushed on exit.
    let _log_guard = init_tracing()?;

    let config_path = match std::env::args_os().nth(1) {
        Some(path) => PathBuf::from(path),
        None => Config::default_path()?,
    };
    let config = Config::load(&config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;
    info!(path = %config_path.display(), "Configuration loaded");

    let http = Arc::new(api::ApiClient::new(&config)?);
    let meme_app = Arc::new(MemeApp::new(&config, http));
    meme_app
        .initialize()
        .await
        .context("loading the meme template catalog")?;
    if let Some(catalog) = meme_app.catalog().cached() {
        info!(templates = catalog.len(), "Template catalog ready");
    }

    if let Some(period) = config.refresh_interval() {
        info!(?period, "Periodic catalog refresh enabled");
        meme_app.catalog().spawn_periodic_refresh(period);
    }

    let user = User::new(config.username.clone(), config.username.clone());
    let room = Room::new(config.room.clone(), config.room.clone());
    let mut app = App::new(user, room);
    app.push_system("Welcome! Try /meme --list, or /help for all commands.");

    let mut session = TerminalSession::new()?;
    let (tx, mut rx) = mpsc::channel(100);

    // Event loop thread
    let tx_c = tx.clone();
    tokio::task::spawn_blocking(move || {
        loop {
            if event::poll(Duration::from_millis(100)).unwrap_or(false) {
                match event::read() {
                    Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                        let _ = tx_c.blocking_send(AppEvent::Key(key));
                    }
                    Ok(_) => {}
                    Err(err) => {
                        let _ = tx_c.blocking_send(AppEvent::Error(err.to_string()));
                    }
                }
            }
            if tx_c.blocking_send(AppEvent::Tick).is_err() {
                break;
            }
        }
    });

    loop {
        session.terminal_mut().draw(|f| draw(f, &app))?;

        let Some(ev) = rx.recv().await else {
            break;
        };
        match ev {
            AppEvent::Tick => {}
            AppEvent::Error(e) => app.push_error(e),
            AppEvent::Notice(message) => app.push_notice(message),
            AppEvent::RoomMessage(message) => app.push_message(message),
            AppEvent::CommandDone(failure) => {
                app.pending = app.pending.saturating_sub(1);
                if let Some(e) = failure {
                    app.push_error(e);
                }
            }
            AppEvent::Key(key) => match key.code {
                KeyCode::Char(c) => {
                    app.error = None;
                    app.input.push(c);
                }
                KeyCode::Backspace => {
                    app.input.pop();
                }
                KeyCode::Up => app.history_previous(),
                KeyCode::Down => app.history_next(),
                KeyCode::PageUp => app.scroll_up(10),
                KeyCode::PageDown => app.scroll_down(10),
                KeyCode::Esc => break,
                KeyCode::Enter => {
                    let Some(line) = app.submit() else {
                        continue;
                    };
                    match line.as_str() {
                        "/quit" => break,
                        "/help" => app.push_system(App::help_text(meme_app.commands())),
                        _ => submit_line(&mut app, &meme_app, &tx, line),
                    }
                }
                _ => {}
            },
        }
    }

    info!("Leaving room");
    Ok(())
}

/// Routes a submitted line: slash commands run as their own task, anything
/// else is posted to the room as plain text.
fn submit_line(app: &mut App, meme_app: &Arc<MemeApp>, tx: &mpsc::Sender<AppEvent>, line: String) {
    if !line.starts_with('/') {
        let message = Message::start(&app.user, &app.room).with_text(line);
        app.push_message(message);
        return;
    }

    let Some((command, arguments)) = meme_app.route(&line) else {
        app.push_system(format!("Unknown command: {line}. Type /help for a list."));
        return;
    };

    let context = CommandContext {
        sender: app.user.clone(),
        room: app.room.clone(),
        arguments,
    };
    let messenger = TerminalMessenger::new(tx.clone());
    let tx = tx.clone();
    app.pending += 1;

    tokio::spawn(async move {
        let failure = match command.execute(context, &messenger).await {
            Ok(()) => None,
            Err(e) => {
                error!(command = command.command(), "Command delivery failed: {e:#}");
                Some(format!("/{} failed: {e}", command.command()))
            }
        };
        let _ = tx.send(AppEvent::CommandDone(failure)).await;
    });
}
