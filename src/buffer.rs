use chrono::{DateTime, Local, Utc};

use crate::model::FeedItem;

/// Name shown instead of the author for the user's own messages.
pub const OWN_SENDER: &str = "You";

/// Local `HH:MM` for a message timestamp.
pub fn format_time(created_at: DateTime<Utc>) -> String {
    created_at.with_timezone(&Local).format("%H:%M").to_string()
}

/// One chat line: `[HH:MM] Name: body`.
pub fn format_message_line(item: &FeedItem, own_user_id: Option<&str>) -> String {
    let sender = if own_user_id == Some(item.author_id.as_str()) {
        OWN_SENDER
    } else {
        item.author_display_name.as_str()
    };
    format!("[{}] {}: {}", format_time(item.created_at), sender, item.body)
}

/// The UI's copy of the chat feed. Mirrors the backend's merged sequence
/// index for index, so it is never trimmed.
#[derive(Default, Clone, Debug)]
pub struct ChatBuffer {
    pub messages: Vec<FeedItem>,
    /// Messages that arrived while the chat page was not shown
    pub unread_count: usize,
    /// Whether the history load has completed
    pub loaded: bool,
}

impl ChatBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the contents with the history load.
    pub fn load(&mut self, items: Vec<FeedItem>) {
        self.messages = items;
        self.loaded = true;
    }

    /// Place a live message where the backend placed it.
    pub fn insert_message(&mut self, index: usize, item: FeedItem, is_active: bool) {
        let index = index.min(self.messages.len());
        self.messages.insert(index, item);
        if !is_active {
            self.unread_count += 1;
        }
    }

    pub fn clear_unread(&mut self) {
        self.unread_count = 0;
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.unread_count = 0;
        self.loaded = false;
    }
}
