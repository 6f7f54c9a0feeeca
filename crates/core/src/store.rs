//! Persisted state: conversion history and the saved API key.
//!
//! Both live as plain files in one directory (by default
//! `<data dir>/paperfold`): `history.json` holds the most recent
//! conversions, `credential` the key for the remote extractor.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::Result;

/// Most entries kept in the history.
pub const HISTORY_LIMIT: usize = 20;

/// Title recorded when a conversion produced none.
pub const UNTITLED_HISTORY_TITLE: &str = "Untitled Article";

const HISTORY_FILE: &str = "history.json";
const CREDENTIAL_FILE: &str = "credential";

/// A previously converted URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub title: String,
    pub url: String,
}

/// File-backed state rooted at one directory.
#[derive(Debug, Clone)]
pub struct StateStore {
    root: PathBuf,
}

impl StateStore {
    /// Store rooted at `root`. The directory is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Default location (`~/.local/share/paperfold` on Linux).
    pub fn default_root() -> Option<PathBuf> {
        dirs::data_dir().map(|dir| dir.join("paperfold"))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Recorded history, most recent first.
    ///
    /// A missing file is an empty history; a corrupt one is logged and
    /// treated as empty so that the next write replaces it.
    pub fn history(&self) -> Result<Vec<HistoryEntry>> {
        let Some(contents) = self.read(HISTORY_FILE)? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str(&contents) {
            Ok(entries) => Ok(entries),
            Err(err) => {
                warn!(error = %err, "ignoring unreadable history file");
                Ok(Vec::new())
            }
        }
    }

    /// Adds a conversion to the front of the history.
    ///
    /// Older entries with the same URL are dropped and the list is capped at
    /// [`HISTORY_LIMIT`].
    pub fn record(&self, title: &str, url: &str) -> Result<Vec<HistoryEntry>> {
        let title = match title.trim() {
            "" => UNTITLED_HISTORY_TITLE,
            trimmed => trimmed,
        };

        let mut history = self.history()?;
        history.retain(|entry| entry.url != url);
        history.insert(0, HistoryEntry { title: title.to_string(), url: url.to_string() });
        history.truncate(HISTORY_LIMIT);

        self.write(HISTORY_FILE, &serde_json::to_string_pretty(&history)?)?;
        debug!(entries = history.len(), "recorded history entry");
        Ok(history)
    }

    pub fn clear_history(&self) -> Result<()> {
        self.remove(HISTORY_FILE)
    }

    /// Saved API key, if any.
    pub fn credential(&self) -> Result<Option<String>> {
        Ok(self
            .read(CREDENTIAL_FILE)?
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty()))
    }

    /// Saves the key trimmed; an empty key removes the saved one.
    pub fn save_credential(&self, key: &str) -> Result<()> {
        match key.trim() {
            "" => self.remove(CREDENTIAL_FILE),
            key => self.write(CREDENTIAL_FILE, key),
        }
    }

    fn read(&self, name: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.root.join(name)) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn write(&self, name: &str, contents: &str) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        fs::write(self.root.join(name), contents)?;
        Ok(())
    }

    fn remove(&self, name: &str) -> Result<()> {
        match fs::remove_file(self.root.join(name)) {
            Err(err) if err.kind() != ErrorKind::NotFound => Err(err.into()),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_empty_store() {
        let dir = TempDir::new().unwrap();
        let store = StateStore::new(dir.path().join("state"));

        assert!(store.history().unwrap().is_empty());
        assert_eq!(store.credential().unwrap(), None);
        store.clear_history().unwrap();
    }

    #[test]
    fn test_record_dedupes_and_orders() {
        let dir = TempDir::new().unwrap();
        let store = StateStore::new(dir.path());

        store.record("First", "https://a.example").unwrap();
        store.record("Second", "https://b.example").unwrap();
        let history = store.record("First again", "https://a.example").unwrap();

        assert_eq!(
            history,
            vec![
                HistoryEntry { title: "First again".into(), url: "https://a.example".into() },
                HistoryEntry { title: "Second".into(), url: "https://b.example".into() },
            ]
        );
        assert_eq!(store.history().unwrap(), history);
    }

    #[test]
    fn test_history_is_capped() {
        let dir = TempDir::new().unwrap();
        let store = StateStore::new(dir.path());

        for i in 0..25 {
            store.record(&format!("Article {i}"), &format!("https://example.com/{i}")).unwrap();
        }
        let history = store.history().unwrap();

        assert_eq!(history.len(), HISTORY_LIMIT);
        assert_eq!(history[0].url, "https://example.com/24");
        assert_eq!(history[HISTORY_LIMIT - 1].url, "https://example.com/5");
    }

    #[test]
    fn test_blank_title_fallback_and_clear() {
        let dir = TempDir::new().unwrap();
        let store = StateStore::new(dir.path());

        let history = store.record("  ", "https://example.com").unwrap();
        assert_eq!(history[0].title, UNTITLED_HISTORY_TITLE);

        store.clear_history().unwrap();
        assert!(store.history().unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_history_treated_as_empty() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(HISTORY_FILE), "{not json").unwrap();
        let store = StateStore::new(dir.path());

        assert!(store.history().unwrap().is_empty());
        assert_eq!(store.record("T", "https://example.com").unwrap().len(), 1);
    }

    #[test]
    fn test_credential_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = StateStore::new(dir.path());

        store.save_credential("  secret-key \n").unwrap();
        assert_eq!(store.credential().unwrap().as_deref(), Some("secret-key"));

        store.save_credential("   ").unwrap();
        assert_eq!(store.credential().unwrap(), None);
    }
}
