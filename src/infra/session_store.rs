// ============================================================
// Layer 6 - Session Store
// ============================================================
// Reads and writes one annotation file as pretty-printed JSON.
//
// The store itself never decides whether overwriting is OK.
// It answers "does the destination exist?" and performs the
// write it is told to; the overwrite policy lives with the
// caller (the session asks its Reviewer first).
//
// Reference: Rust Book §9 (Error Handling with anyhow)

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::{
    fs,
    path::PathBuf,
};

pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// True if something is already stored at the destination
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Serialise `value` and write it, replacing any existing file.
    /// Parent directories are created as needed.
    pub fn write<T: Serialize>(&self, value: &T) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Cannot create directory '{}'", parent.display())
                })?;
            }
        }

        let json = serde_json::to_string_pretty(value)?;

        fs::write(&self.path, json)
            .with_context(|| format!("Cannot write '{}'", self.path.display()))?;

        tracing::debug!("Wrote '{}'", self.path.display());
        Ok(())
    }

    /// Read the file back and deserialise it
    pub fn read<T: DeserializeOwned>(&self) -> Result<T> {
        let json = fs::read_to_string(&self.path)
            .with_context(|| format!("Cannot read '{}'", self.path.display()))?;

        serde_json::from_str(&json)
            .with_context(|| format!("'{}' is not a valid annotation file", self.path.display()))
    }
}
