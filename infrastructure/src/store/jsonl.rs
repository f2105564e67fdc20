//! JSONL-backed decision store.
//!
//! One JSON object per line, append-only, flushed per write so a crash
//! loses at most the entry being written. Reads re-scan the file; the
//! log is small enough that mining queries stay cheap, and the analyzer
//! bounds its scans anyway.

use async_trait::async_trait;
use ensemble_application::ports::decision_store::{DecisionStore, StoreError};
use ensemble_domain::{DecisionLogEntry, Message};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

/// Decision type whose entries reconstruct the conversation window
const TURN_DECISION: &str = "turn";

pub struct JsonlDecisionStore {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl JsonlDecisionStore {
    /// Open (or create) the log at the given path, creating parent
    /// directories as needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::Io(e.to_string()))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| StoreError::Io(e.to_string()))?;

        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse every line of the log, skipping corrupt lines with a
    /// warning rather than failing the query.
    fn read_entries(&self) -> Result<Vec<DecisionLogEntry>, StoreError> {
        let file = File::open(&self.path).map_err(|e| StoreError::Io(e.to_string()))?;
        let reader = BufReader::new(file);

        let mut entries = Vec::new();
        for line in reader.lines() {
            let line = line.map_err(|e| StoreError::Io(e.to_string()))?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<DecisionLogEntry>(&line) {
                Ok(entry) => entries.push(entry),
                Err(e) => warn!("Skipping corrupt decision log line: {}", e),
            }
        }
        Ok(entries)
    }
}

#[async_trait]
impl DecisionStore for JsonlDecisionStore {
    async fn log(&self, entry: DecisionLogEntry) -> Result<(), StoreError> {
        let line =
            serde_json::to_string(&entry).map_err(|e| StoreError::Serialization(e.to_string()))?;

        let mut writer = self
            .writer
            .lock()
            .map_err(|_| StoreError::Io("decision log writer poisoned".to_string()))?;
        writeln!(writer, "{}", line).map_err(|e| StoreError::Io(e.to_string()))?;
        writer.flush().map_err(|e| StoreError::Io(e.to_string()))
    }

    async fn context_window(
        &self,
        user_id: &str,
        session_id: &str,
        n: usize,
    ) -> Result<Vec<Message>, StoreError> {
        let mut messages = Vec::new();
        for entry in self.read_entries()? {
            if entry.decision_type != TURN_DECISION
                || entry.user_id != user_id
                || entry.session_id != session_id
            {
                continue;
            }
            messages.push(Message::user(entry.input));
            if !entry.output.is_empty() {
                messages.push(Message::assistant(entry.output));
            }
        }

        let start = messages.len().saturating_sub(n);
        Ok(messages.split_off(start))
    }

    async fn recent_decisions(
        &self,
        decision_type: &str,
        limit: usize,
    ) -> Result<Vec<DecisionLogEntry>, StoreError> {
        let entries = self.read_entries()?;
        Ok(entries
            .into_iter()
            .rev()
            .filter(|e| e.decision_type == decision_type)
            .take(limit)
            .collect())
    }
}

impl Drop for JsonlDecisionStore {
    fn drop(&mut self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}
