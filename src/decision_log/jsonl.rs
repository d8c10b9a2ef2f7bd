//! JSON-lines decision store.

use super::{DecisionFilter, DecisionLogEntry, DecisionStore, StoreError};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Decision store appending one JSON object per line to a file.
///
/// Each entry is encoded in full before a single `write_all`, under a mutex,
/// so concurrent appends never interleave within a line.
#[derive(Debug)]
pub struct JsonlDecisionLog {
    path: PathBuf,
    writer: Mutex<File>,
}

impl JsonlDecisionLog {
    /// Open (creating if needed) the log at `path` for appending.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            writer: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DecisionStore for JsonlDecisionLog {
    fn append(&self, entry: &DecisionLogEntry) -> Result<(), StoreError> {
        let mut line = serde_json::to_vec(entry)?;
        line.push(b'\n');

        let mut file = self.writer.lock().map_err(|_| StoreError::Poisoned)?;
        file.write_all(&line)?;
        file.flush()?;
        Ok(())
    }

    fn query(&self, filter: &DecisionFilter) -> Result<Vec<DecisionLogEntry>, StoreError> {
        Ok(read_entries(&self.path)?
            .into_iter()
            .filter(|e| filter.matches(e))
            .collect())
    }
}

/// Load every entry from a JSON-lines decision log. Blank lines are skipped.
///
/// # Errors
///
/// `StoreError::Corrupt` names the first line that is not a valid entry.
pub fn read_entries(path: impl AsRef<Path>) -> Result<Vec<DecisionLogEntry>, StoreError> {
    let reader = BufReader::new(File::open(path)?);
    let mut entries = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let entry = serde_json::from_str(&line).map_err(|e| StoreError::Corrupt {
            line: idx + 1,
            message: e.to_string(),
        })?;
        entries.push(entry);
    }

    Ok(entries)
}
