//! Client-side prediction history
//!
//! An append-only JSON-lines file. Each successful prediction adds one line;
//! nothing is ever rewritten.

use crate::client::PredictRequest;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub inputs: PredictRequest,
    pub prediction: f64,
}

pub struct PredictionHistory {
    path: PathBuf,
}

impl PredictionHistory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `~/.local/share/hpp/history.jsonl` unless overridden
    pub fn default_path() -> Result<PathBuf> {
        let data = dirs_next::data_dir().context("Could not determine data directory")?;
        Ok(data.join("hpp").join("history.jsonl"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, entry: &HistoryEntry) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).context("Failed to create history directory")?;
        }

        let mut line = serde_json::to_string(entry).context("Failed to serialize history entry")?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open history file {:?}", self.path))?;
        file.write_all(line.as_bytes())
            .context("Failed to write history entry")?;

        Ok(())
    }

    /// Up to `limit` entries, newest first. Unreadable lines are skipped.
    pub fn recent(&self, limit: usize) -> Result<Vec<HistoryEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = fs::File::open(&self.path)
            .with_context(|| format!("Failed to open history file {:?}", self.path))?;

        let mut entries = Vec::new();
        for (n, line) in BufReader::new(file).lines().enumerate() {
            let line = line.context("Failed to read history file")?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<HistoryEntry>(&line) {
                Ok(entry) => entries.push(entry),
                Err(e) => warn!(line = n + 1, error = %e, "Skipping malformed history line"),
            }
        }

        entries.reverse();
        entries.truncate(limit);
        Ok(entries)
    }
}
