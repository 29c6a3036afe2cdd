//! Durable ledger storage.
//!
//! The store owns the ledger file exclusively for the duration of a run.
//! Writes go to a temp file in the same directory followed by a rename, so
//! a crash mid-write never leaves a partially written ledger behind and the
//! prior file stays the last known-good state.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::models::HistoryLedger;

/// Ledger storage error types.
#[derive(Error, Debug)]
pub enum HistoryError {
    /// A ledger file exists but does not parse. Silently discarding history
    /// is worse than stopping, so the run aborts on this.
    #[error("corrupt ledger at {path}: {source}")]
    CorruptLedger {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to read ledger at {path}: {source}")]
    ReadFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to persist ledger to {path}: {source}")]
    PersistFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// File-backed history store. One writer process per run; concurrent runs
/// must be serialized externally.
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Load the ledger from disk. A missing file is the empty ledger; an
    /// unparseable file is `CorruptLedger`.
    pub fn load(&self) -> Result<HistoryLedger, HistoryError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(HistoryLedger::default());
            }
            Err(e) => {
                return Err(HistoryError::ReadFailure {
                    path: self.path.clone(),
                    source: e,
                });
            }
        };

        serde_json::from_str(&raw).map_err(|e| HistoryError::CorruptLedger {
            path: self.path.clone(),
            source: e,
        })
    }

    /// Write the full ledger back, replacing prior contents atomically.
    pub fn persist(&self, ledger: &HistoryLedger) -> Result<(), HistoryError> {
        let json = serde_json::to_string_pretty(ledger).map_err(|e| {
            HistoryError::PersistFailure {
                path: self.path.clone(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
            }
        })?;

        let tmp_path = self.path.with_extension("json.tmp");
        let write_result = fs::write(&tmp_path, json)
            .and_then(|_| fs::rename(&tmp_path, &self.path));

        write_result.map_err(|e| {
            // Leave no temp file behind on failure
            let _ = fs::remove_file(&tmp_path);
            HistoryError::PersistFailure {
                path: self.path.clone(),
                source: e,
            }
        })
    }
}
