//! Records exchanged with the backing store.
//!
//! These mirror the rows of the hosted tables (`profiles`, `messages`,
//! `products`, `daily_entries`) plus the enriched `FeedItem` shown in chat.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Identity of a signed-in user, issued by the auth provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    pub email: String,
    pub access_token: String,
}

/// A row of the `profiles` table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub full_name: String,
    pub avatar_initials: String,
}

impl Profile {
    pub fn new(id: impl Into<String>, full_name: impl Into<String>) -> Self {
        let full_name = full_name.into();
        let avatar_initials = initials_for(&full_name);
        Self {
            id: id.into(),
            full_name,
            avatar_initials,
        }
    }

    pub fn author(&self) -> AuthorProfile {
        AuthorProfile {
            display_name: self.full_name.clone(),
            avatar_initials: self.avatar_initials.clone(),
        }
    }
}

/// Denormalized display fields for a message author.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthorProfile {
    pub display_name: String,
    pub avatar_initials: String,
}

/// A raw `messages` row as delivered by an insert notification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRow {
    pub id: String,
    pub body: String,
    pub author_id: String,
    pub created_at: DateTime<Utc>,
}

/// A chat message ready for display.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedItem {
    pub id: String,
    pub body: String,
    pub author_id: String,
    pub created_at: DateTime<Utc>,
    pub author_display_name: String,
    pub author_avatar: String,
}

impl FeedItem {
    pub fn enrich(row: MessageRow, author: AuthorProfile) -> Self {
        Self {
            id: row.id,
            body: row.body,
            author_id: row.author_id,
            created_at: row.created_at,
            author_display_name: author.display_name,
            author_avatar: author.avatar_initials,
        }
    }
}

/// A row of the `products` inventory table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    /// Free-form quantity/unit, e.g. "25kg Bag".
    pub quantity: String,
    pub created_at: DateTime<Utc>,
}

/// Something consumed on a given day.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryItem {
    pub name: String,
    pub quantity: String,
}

/// Payload for the daily-entry upsert, keyed by `date`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewDailyEntry {
    pub date: NaiveDate,
    pub morning_count: u32,
    pub night_count: u32,
    pub attendance: u32,
    pub items: Vec<EntryItem>,
}

/// A row of the `daily_entries` table. One row per date.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyEntry {
    pub id: String,
    pub date: NaiveDate,
    pub morning_count: u32,
    pub night_count: u32,
    pub attendance: u32,
    pub items: Vec<EntryItem>,
    pub recorded_by: String,
    pub updated_at: DateTime<Utc>,
}

/// Avatar initials: first letter of up to two words, upper-cased.
pub fn initials_for(name: &str) -> String {
    let initials: String = name
        .split_whitespace()
        .filter_map(|word| word.chars().next())
        .take(2)
        .flat_map(char::to_uppercase)
        .collect();
    if initials.is_empty() {
        "?".to_string()
    } else {
        initials
    }
}
