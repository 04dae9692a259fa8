//! Daily head-count entry and the dashboard summary.

use chrono::NaiveDate;
use tracing::info;

use crate::entries::format_entry_date;
use crate::error::ActionError;
use crate::model::{DailyEntry, NewDailyEntry};
use crate::session::SessionContext;
use crate::store::EntryStore;
use crate::validation;

/// Raw daily-entry form fields as typed by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryForm {
    /// YYYY-MM-DD; empty means today
    pub date: String,
    pub morning_count: String,
    pub night_count: String,
    /// Empty means morning + night
    pub attendance: String,
    /// "name=quantity" pairs separated by commas
    pub items: String,
}

impl EntryForm {
    pub fn parse(&self, today: NaiveDate) -> Result<NewDailyEntry, String> {
        let date = if self.date.trim().is_empty() {
            today
        } else {
            validation::parse_entry_date(&self.date)?
        };
        let morning_count = validation::parse_count("Morning count", &self.morning_count)?;
        let night_count = validation::parse_count("Night count", &self.night_count)?;
        let attendance = if self.attendance.trim().is_empty() {
            morning_count
                .checked_add(night_count)
                .ok_or_else(|| "Counts are too large".to_string())?
        } else {
            validation::parse_count("Total attendance", &self.attendance)?
        };
        let items = validation::parse_items(&self.items)?;
        Ok(NewDailyEntry {
            date,
            morning_count,
            night_count,
            attendance,
            items,
        })
    }
}

/// Upsert the entry for its date as the current user.
pub async fn submit_entry<S: EntryStore>(
    store: &S,
    ctx: &SessionContext,
    entry: NewDailyEntry,
) -> Result<DailyEntry, ActionError> {
    let session = ctx.require()?;
    let saved = store.upsert_daily_entry(session, entry).await?;
    info!(event = "dashboard.entry_saved", date = %saved.date);
    Ok(saved)
}

pub async fn load_summary<S: EntryStore>(
    store: &S,
    date: NaiveDate,
) -> Result<Option<DailyEntry>, ActionError> {
    Ok(store.daily_entry_for(date).await?)
}

/// Summary card lines for a date.
pub fn summary_lines(date: NaiveDate, entry: Option<&DailyEntry>) -> Vec<String> {
    let mut lines = vec![format!("Summary for {}", format_entry_date(date))];
    match entry {
        Some(entry) => {
            lines.push(format!("  Morning Count     {}", entry.morning_count));
            lines.push(format!("  Night Count       {}", entry.night_count));
            lines.push(format!("  Total Attendance  {}", entry.attendance));
        }
        None => lines.push("  No entry yet".to_string()),
    }
    lines
}
