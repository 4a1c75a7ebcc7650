//! Wallet-side signing history, persisted as one JSON array in one file.
//!
//! The file is read whole and rewritten on every change. There is no format
//! version: if it stops parsing, the user has to clear it.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::HistoryError;
use crate::common::types::SignedMessageHistoryEntry;

/// Default history file, relative to the working directory
pub const HISTORY_FILE: &str = "signed_messages.json";

pub struct LocalHistoryStore {
    path: PathBuf,
}

impl LocalHistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Vec<SignedMessageHistoryEntry>, HistoryError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        serde_json::from_str(&contents).map_err(|e| HistoryError::Corrupt {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        })
    }

    pub fn append(&self, entry: SignedMessageHistoryEntry) -> Result<(), HistoryError> {
        let mut entries = self.load()?;
        entries.push(entry);
        self.save(&entries)
    }

    pub fn clear(&self) -> Result<(), HistoryError> {
        self.save(&[])
    }

    fn save(&self, entries: &[SignedMessageHistoryEntry]) -> Result<(), HistoryError> {
        let json = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}
