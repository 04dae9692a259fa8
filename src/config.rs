use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::feed::FeedOrdering;

/// Default `RUST_LOG`-style filter when the environment sets none.
pub const DEFAULT_LOG_FILTER: &str = "mess_client=info";
/// Sent-message history kept across runs.
pub const MAX_SAVED_HISTORY: usize = 50;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Pre-fills sign-in and keys the remembered session
    pub last_email: Option<String>,
    pub feed_ordering: FeedOrdering,
    /// Keep the access token in the OS keyring between runs
    pub remember_session: bool,
    /// Append chat messages to daily transcript files
    pub chat_transcript: bool,
    pub log_filter: String,
    pub history: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            last_email: None,
            feed_ordering: FeedOrdering::default(),
            remember_session: true,
            chat_transcript: false,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            history: Vec::new(),
        }
    }
}

pub fn settings_path() -> Option<PathBuf> {
    if let Some(proj) = ProjectDirs::from("com", "mess-client", "mess-client") {
        let dir = proj.config_dir();
        if let Err(e) = fs::create_dir_all(dir) {
            tracing::warn!(event = "config.dir_failed", error = %e);
            return None;
        }
        return Some(dir.join("settings.json"));
    }
    None
}

/// Settings from the default location; defaults when missing or unreadable.
pub fn load_settings() -> Settings {
    settings_path()
        .and_then(|path| load_settings_from(&path))
        .unwrap_or_default()
}

pub fn load_settings_from(path: &Path) -> Option<Settings> {
    let content = fs::read_to_string(path).ok()?;
    match serde_json::from_str(&content) {
        Ok(settings) => Some(settings),
        Err(e) => {
            tracing::warn!(event = "config.parse_failed", path = %path.display(), error = %e);
            None
        }
    }
}

pub fn save_settings(settings: &Settings) -> std::io::Result<()> {
    if let Some(path) = settings_path() {
        save_settings_to(settings, &path)?;
    }
    Ok(())
}

pub fn save_settings_to(settings: &Settings, path: &Path) -> std::io::Result<()> {
    let data = serde_json::to_string_pretty(settings)?;
    let mut file = fs::File::create(path)?;
    file.write_all(data.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = Settings {
            last_email: Some("alex@example.com".into()),
            feed_ordering: FeedOrdering::Append,
            history: vec!["hi".into()],
            ..Settings::default()
        };
        save_settings_to(&settings, &path).unwrap();
        assert_eq!(load_settings_from(&path), Some(settings));
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"feed_ordering":"append"}"#).unwrap();
        let settings = load_settings_from(&path).unwrap();
        assert_eq!(settings.feed_ordering, FeedOrdering::Append);
        assert!(settings.remember_session);
        assert_eq!(settings.log_filter, DEFAULT_LOG_FILTER);
    }

    #[test]
    fn test_corrupt_or_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        assert_eq!(load_settings_from(&path), None);
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(load_settings_from(&path), None);
    }
}
