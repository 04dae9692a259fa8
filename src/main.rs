//! mess-client - terminal front end for the mess management client
//!
//! Architecture:
//! - Main thread: reads commands from stdin and prints state changes
//! - Backend thread: runs a Tokio runtime for store calls and the chat feed
//! - Communication via crossbeam channels

use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::thread;

use chrono::Local;
use crossbeam_channel::{select, unbounded, Receiver, Sender};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use mess_client::backend::{run_backend, BackendOptions};
use mess_client::commands::{handle_chat_line, handle_user_command, CommandOutcome};
use mess_client::config::{load_settings, save_settings, Settings, MAX_SAVED_HISTORY};
use mess_client::events::apply_event;
use mess_client::input_state::InputState;
use mess_client::logging::Logger;
use mess_client::protocol::{BackendAction, GuiEvent};
use mess_client::state::{ClientState, Page};
use mess_client::store::MemoryStore;

struct MessApp {
    state: ClientState,
    settings: Settings,
    action_tx: Sender<BackendAction>,
    event_rx: Receiver<GuiEvent>,
    backend: Option<thread::JoinHandle<()>>,
}

impl MessApp {
    fn new(settings: Settings) -> Self {
        // Create channels for UI <-> Backend
        let (action_tx, action_rx) = unbounded::<BackendAction>();
        let (event_tx, event_rx) = unbounded::<GuiEvent>();

        let options = BackendOptions {
            feed_ordering: settings.feed_ordering,
            remember_session: settings.remember_session,
        };
        let store = Arc::new(MemoryStore::new());
        let backend = thread::Builder::new()
            .name("backend".into())
            .spawn(move || run_backend(store, options, action_rx, event_tx))
            .map_err(|e| warn!(event = "app.backend_spawn_failed", error = %e))
            .ok();

        let mut state = ClientState::new();
        state.input = InputState::with_history(settings.history.clone());
        if settings.chat_transcript {
            state.logger = Logger::new()
                .map_err(|e| warn!(event = "app.transcript_disabled", error = %e))
                .ok();
        }
        if backend.is_none() {
            state.log("Error: could not start the backend worker");
        }

        Self {
            state,
            settings,
            action_tx,
            event_rx,
            backend,
        }
    }

    fn run(&mut self) {
        let lines = spawn_stdin_reader();
        let events = self.event_rx.clone();

        self.state.log("Mess client. Type /help for commands.");
        if self.settings.remember_session {
            if let Some(email) = self.settings.last_email.clone() {
                self.state.log(format!("Resuming session for {}...", email));
                let _ = self.action_tx.send(BackendAction::RestoreSession { email });
            }
        }
        self.flush_output();

        loop {
            select! {
                recv(lines) -> line => match line {
                    Ok(line) => {
                        if self.handle_line(&line) == CommandOutcome::Quit {
                            break;
                        }
                    }
                    // EOF on stdin
                    Err(_) => break,
                },
                recv(events) -> event => match event {
                    Ok(event) => self.handle_event(event),
                    Err(_) => {
                        self.state.log("Backend stopped");
                        self.flush_output();
                        break;
                    }
                },
            }
            self.flush_output();
        }
    }

    fn handle_line(&mut self, line: &str) -> CommandOutcome {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            return CommandOutcome::Handled;
        }
        let today = Local::now().date_naive();
        match handle_user_command(line, &mut self.state, &self.action_tx, today) {
            CommandOutcome::NotACommand => {
                handle_chat_line(line, &mut self.state, &self.action_tx);
                CommandOutcome::Handled
            }
            outcome => outcome,
        }
    }

    fn handle_event(&mut self, event: GuiEvent) {
        if let GuiEvent::SignedIn { session, .. } = &event {
            if self.settings.last_email.as_deref() != Some(session.email.as_str()) {
                self.settings.last_email = Some(session.email.clone());
                self.save();
            }
        }
        apply_event(&mut self.state, event);
    }

    fn flush_output(&mut self) {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        for line in self.state.drain_log() {
            let _ = writeln!(out, "{}", line);
        }
        let _ = write!(out, "{}", prompt(&self.state));
        let _ = out.flush();
    }

    fn save(&mut self) {
        let history = &self.state.input.history;
        let skip = history.len().saturating_sub(MAX_SAVED_HISTORY);
        self.settings.history = history[skip..].to_vec();
        if let Err(e) = save_settings(&self.settings) {
            warn!(event = "app.settings_save_failed", error = %e);
        }
    }
}

impl Drop for MessApp {
    fn drop(&mut self) {
        // Persist settings on exit
        self.save();
        let _ = self.action_tx.send(BackendAction::Shutdown);
        if let Some(handle) = self.backend.take() {
            if handle.join().is_err() {
                warn!(event = "app.backend_panicked");
            }
        }
    }
}

fn prompt(state: &ClientState) -> String {
    let page = match state.page {
        Page::SignIn => "sign-in",
        Page::Dashboard => "dashboard",
        Page::Entries => "entries",
        Page::Products => "products",
        Page::Chat => "chat",
    };
    if state.chat.unread_count > 0 && state.page != Page::Chat {
        format!("[{} | {} unread] > ", page, state.chat.unread_count)
    } else {
        format!("[{}] > ", page)
    }
}

/// Forward stdin lines to a channel; the channel closes on EOF.
fn spawn_stdin_reader() -> Receiver<String> {
    let (tx, rx) = unbounded();
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!(event = "app.stdin_failed", error = %e);
                    break;
                }
            }
        }
    });
    rx
}

fn main() {
    let settings = load_settings();

    // Logs go to stderr; stdout is the UI
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    info!(event = "app.started", ordering = ?settings.feed_ordering);
    let mut app = MessApp::new(settings);
    app.run();
    println!();
}
