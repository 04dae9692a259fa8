//! The log of past daily entries.

use chrono::NaiveDate;

use crate::error::ActionError;
use crate::model::{DailyEntry, EntryItem};
use crate::store::EntryStore;

/// All entries, newest date first.
pub async fn load_entries<S: EntryStore>(store: &S) -> Result<Vec<DailyEntry>, ActionError> {
    Ok(store.list_daily_entries().await?)
}

/// Long en-IN style date, e.g. "20 May 2025".
pub fn format_entry_date(date: NaiveDate) -> String {
    date.format("%-d %B %Y").to_string()
}

/// "Rice (10kg), Dal (5kg)", or "N/A" when nothing was used.
pub fn format_items(items: &[EntryItem]) -> String {
    if items.is_empty() {
        return "N/A".to_string();
    }
    items
        .iter()
        .map(|item| format!("{} ({})", item.name, item.quantity))
        .collect::<Vec<_>>()
        .join(", ")
}

/// One table row of the entries log.
pub fn format_entry_row(entry: &DailyEntry) -> String {
    format!(
        "{:<18} morning {:>4}  night {:>4}  attendance {:>4}  items: {}",
        format_entry_date(entry.date),
        entry.morning_count,
        entry.night_count,
        entry.attendance,
        format_items(&entry.items)
    )
}
