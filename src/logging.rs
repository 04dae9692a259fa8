//! Chat transcript persistence
//!
//! Appends chat messages to plain-text files without blocking the UI thread.
//! Files live in XDG_DATA_HOME/mess-client/logs/chat/YYYY-MM-DD.log, one per
//! local day of the message.

use chrono::{DateTime, Local, Utc};
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::thread;

use crate::model::FeedItem;

/// A transcript line to be written to disk
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub created_at: DateTime<Utc>,
    pub sender: String,
    pub message: String,
}

impl LogEntry {
    pub fn from_item(item: &FeedItem) -> Self {
        Self {
            created_at: item.created_at,
            sender: item.author_display_name.clone(),
            message: item.body.clone(),
        }
    }
}

/// Logger queues transcript lines for a background writer thread
pub struct Logger {
    tx: Sender<LogEntry>,
}

impl Logger {
    /// Logger writing under the platform data directory
    pub fn new() -> Result<Self, String> {
        Self::with_dir(get_log_directory()?)
    }

    pub fn with_dir(log_dir: PathBuf) -> Result<Self, String> {
        fs::create_dir_all(&log_dir)
            .map_err(|e| format!("Failed to create log directory: {}", e))?;

        let (tx, rx) = unbounded::<LogEntry>();
        thread::Builder::new()
            .name("transcript".into())
            .spawn(move || run_logger_thread(rx, log_dir))
            .map_err(|e| format!("Failed to start transcript writer: {}", e))?;

        Ok(Self { tx })
    }

    /// Queue a line (non-blocking)
    pub fn log(&self, entry: LogEntry) {
        // If send fails, the writer thread has stopped
        let _ = self.tx.send(entry);
    }
}

fn run_logger_thread(rx: Receiver<LogEntry>, log_dir: PathBuf) {
    // One open writer per day file
    let mut file_cache: HashMap<String, BufWriter<File>> = HashMap::new();

    while let Ok(entry) = rx.recv() {
        if let Err(e) = write_log_entry(&mut file_cache, &log_dir, &entry) {
            tracing::warn!(event = "transcript.write_failed", error = %e);
        }
    }

    for (_, mut writer) in file_cache.drain() {
        let _ = writer.flush();
    }
}

fn write_log_entry(
    file_cache: &mut HashMap<String, BufWriter<File>>,
    log_dir: &Path,
    entry: &LogEntry,
) -> Result<(), String> {
    let local = entry.created_at.with_timezone(&Local);
    let date = local.format("%Y-%m-%d").to_string();

    let writer = match file_cache.entry(date.clone()) {
        std::collections::hash_map::Entry::Occupied(slot) => slot.into_mut(),
        std::collections::hash_map::Entry::Vacant(slot) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(log_dir.join(format!("{}.log", date)))
                .map_err(|e| format!("Failed to open log file: {}", e))?;
            slot.insert(BufWriter::new(file))
        }
    };

    // Format: [HH:MM:SS] Name: message
    writeln!(
        writer,
        "[{}] {}: {}",
        local.format("%H:%M:%S"),
        entry.sender,
        entry.message
    )
    .map_err(|e| format!("Failed to write log entry: {}", e))?;

    writer
        .flush()
        .map_err(|e| format!("Failed to flush log: {}", e))?;

    Ok(())
}

fn get_log_directory() -> Result<PathBuf, String> {
    let base = directories::BaseDirs::new().ok_or("Failed to determine home directory")?;
    Ok(base.data_dir().join("mess-client").join("logs").join("chat"))
}
