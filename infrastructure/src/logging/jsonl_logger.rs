//! JSONL file writer for consensus decisions.
//!
//! Each [`DecisionRecord`] is serialized as a single JSON line with a
//! `timestamp`, appended to the file via a buffered writer.

use docquorum_application::ports::decision_logger::{DecisionLogger, DecisionRecord};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

/// JSONL decision logger that writes one JSON object per decision.
///
/// Thread-safe via `Mutex<BufWriter<File>>`. Appends to an existing file so
/// the log accumulates across runs. Flushes on `Drop`.
pub struct JsonlDecisionLogger {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl JsonlDecisionLogger {
    /// Create a new logger appending to the given path.
    ///
    /// Creates the file (and parent directories) if they don't exist.
    /// Returns `None` if the file cannot be opened.
    pub fn new(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            warn!(
                "Could not create decision log directory {}: {}",
                parent.display(),
                e
            );
            return None;
        }

        let file = match OpenOptions::new().create(true).append(true).open(path) {
            Ok(f) => f,
            Err(e) => {
                warn!("Could not open decision log file {}: {}", path.display(), e);
                return None;
            }
        };

        Some(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }

    /// Get the path to the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DecisionLogger for JsonlDecisionLogger {
    fn log(&self, record: &DecisionRecord) {
        let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);

        let failures: Vec<serde_json::Value> = record
            .failures
            .iter()
            .map(|(provider, error)| serde_json::json!({ "provider": provider, "error": error }))
            .collect();
        let line = serde_json::json!({
            "timestamp": timestamp,
            "question": record.question,
            "answer_type": record.answer_type.as_str(),
            "document_fingerprint": record.document_fingerprint,
            "document_len": record.document_len,
            "decision": record.decision,
            "failures": failures,
        });

        let Ok(line) = serde_json::to_string(&line) else {
            return;
        };

        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", line);
            // JSONL is append-only; flush each record
            let _ = writer.flush();
        }
    }
}

impl Drop for JsonlDecisionLogger {
    fn drop(&mut self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}
