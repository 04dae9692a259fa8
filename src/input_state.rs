//! Chat draft, sent-message history, and command completion.

use crate::commands::COMMANDS;

/// Longest history kept in memory.
const MAX_HISTORY: usize = 100;

/// Input-related state for the chat page.
#[derive(Default, Debug)]
pub struct InputState {
    /// Message being composed. Kept after a failed send.
    pub message_input: String,

    /// Sent messages, oldest first (for up/down navigation)
    pub history: Vec<String>,

    /// Current position in history (None = not navigating)
    pub history_pos: Option<usize>,

    /// Saved input when entering history mode
    pub history_saved_input: Option<String>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_history(history: Vec<String>) -> Self {
        Self {
            history,
            ..Self::default()
        }
    }

    /// A line is about to be sent: it becomes the draft until acknowledged.
    pub fn stage(&mut self, body: &str) {
        self.message_input = body.to_string();
        self.history_pos = None;
        self.history_saved_input = None;
    }

    /// The store accepted `body`. The draft is cleared only when it still
    /// holds that body; a newer line typed meanwhile is left alone.
    pub fn commit_sent(&mut self, body: &str) {
        if self.message_input == body {
            self.message_input.clear();
        }
        if !body.trim().is_empty() && self.history.last().map(String::as_str) != Some(body) {
            self.history.push(body.to_string());
            if self.history.len() > MAX_HISTORY {
                self.history.remove(0);
            }
        }
    }

    /// The store refused `body`; it becomes the draft again.
    pub fn restore_rejected(&mut self, body: String) {
        self.message_input = body;
    }

    /// Load the previous sent message into the draft. Returns false when
    /// there is no history.
    pub fn history_up(&mut self) -> bool {
        let pos = match self.history_pos {
            _ if self.history.is_empty() => return false,
            None => {
                self.history_saved_input = Some(std::mem::take(&mut self.message_input));
                self.history.len() - 1
            }
            Some(pos) => pos.saturating_sub(1),
        };
        self.history_pos = Some(pos);
        self.message_input = self.history[pos].clone();
        true
    }

    /// Step forward; past the newest entry the pre-navigation draft comes
    /// back. Returns false when not navigating.
    pub fn history_down(&mut self) -> bool {
        let Some(pos) = self.history_pos else {
            return false;
        };
        match self.history.get(pos + 1) {
            Some(next) => {
                self.message_input = next.clone();
                self.history_pos = Some(pos + 1);
            }
            None => {
                self.history_pos = None;
                self.message_input = self.history_saved_input.take().unwrap_or_default();
            }
        }
        true
    }

    /// Commands starting with `prefix`, sorted.
    pub fn complete_command(prefix: &str) -> Vec<&'static str> {
        let mut matches: Vec<&'static str> = COMMANDS
            .iter()
            .map(|(name, _)| *name)
            .filter(|name| name.starts_with(prefix))
            .collect();
        matches.sort_unstable();
        matches
    }
}
