//! Front-end state, separated from I/O.
//!
//! `ClientState` mirrors what the backend has told the UI: who is signed in,
//! the chat feed, the inventory, the entries log, and the last summary.

use chrono::NaiveDate;

use crate::auth::DEFAULT_DISPLAY_NAME;
use crate::buffer::ChatBuffer;
use crate::input_state::InputState;
use crate::logging::Logger;
use crate::model::{DailyEntry, Session};
use crate::products::Inventory;

/// Lines kept in the system log before the oldest are dropped.
const MAX_SYSTEM_LOG: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Page {
    #[default]
    SignIn,
    Dashboard,
    Entries,
    Products,
    Chat,
}

impl Page {
    /// Every page except sign-in needs a session.
    pub fn requires_session(self) -> bool {
        !matches!(self, Page::SignIn)
    }
}

#[derive(Default)]
pub struct ClientState {
    pub session: Option<Session>,
    /// Name for the "Welcome" header
    pub display_name: String,
    pub page: Page,
    pub chat: ChatBuffer,
    pub inventory: Inventory,
    /// Entries log, newest first
    pub entries: Vec<DailyEntry>,
    /// Date and entry of the last dashboard summary
    pub summary: Option<(NaiveDate, Option<DailyEntry>)>,
    pub input: InputState,
    /// Lines waiting to be shown to the user
    pub system_log: Vec<String>,
    /// Chat transcript writer, when enabled
    pub logger: Option<Logger>,
}

impl ClientState {
    pub fn new() -> Self {
        Self {
            display_name: DEFAULT_DISPLAY_NAME.to_string(),
            ..Self::default()
        }
    }

    pub fn is_signed_in(&self) -> bool {
        self.session.is_some()
    }

    pub fn own_user_id(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.user_id.as_str())
    }

    pub fn log(&mut self, line: impl Into<String>) {
        self.system_log.push(line.into());
        if self.system_log.len() > MAX_SYSTEM_LOG {
            self.system_log.remove(0);
        }
    }

    /// Take the pending lines for display.
    pub fn drain_log(&mut self) -> Vec<String> {
        std::mem::take(&mut self.system_log)
    }

    /// Switch pages. Without a session, guarded pages fall back to sign-in.
    pub fn navigate(&mut self, page: Page) -> bool {
        if page.requires_session() && !self.is_signed_in() {
            self.page = Page::SignIn;
            self.log("Please sign in first (/signin <email> <password>)");
            return false;
        }
        self.page = page;
        if page == Page::Chat {
            self.chat.clear_unread();
        }
        true
    }

    /// Forget everything tied to the previous user.
    pub fn reset_session(&mut self) {
        self.session = None;
        self.display_name = DEFAULT_DISPLAY_NAME.to_string();
        self.page = Page::SignIn;
        self.chat.clear();
        self.inventory = Inventory::default();
        self.entries.clear();
        self.summary = None;
        self.input.message_input.clear();
    }
}
