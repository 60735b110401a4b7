//! Transition audit log.
//!
//! Every applied status transition is appended, before the store snapshot is
//! replaced, as one JSON line in a write-ahead log. The WAL is the durable
//! audit trail; [`crate::csv_rollup`] later folds it into the flat CSV report
//! and archives it.

use crate::types::CaseStatus;
use crate::Result;
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// One audited status change
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransitionEvent {
    pub case_id: Uuid,
    pub case_number: String,
    pub worker_id: String,
    pub status: CaseStatus,
    pub updated_at: DateTime<Utc>,
    pub updated_by: String,
}

/// Destination for audited transition events
pub trait EventSink {
    fn append(&mut self, event: &TransitionEvent) -> Result<()>;
}

/// Append-only JSONL sink guarded by an exclusive file lock
pub struct JsonlSink {
    path: PathBuf,
}

impl JsonlSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl EventSink for JsonlSink {
    fn append(&mut self, event: &TransitionEvent) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.lock_exclusive()?;

        let mut writer = std::io::BufWriter::new(&file);
        serde_json::to_writer(&mut writer, event)?;
        writer.write_all(b"\n")?;
        writer.flush()?;

        file.unlock()?;

        tracing::debug!("Audited transition for case {}", event.case_id);
        Ok(())
    }
}

/// Read every event from a WAL file, skipping lines that fail to parse
///
/// A missing file reads as empty. Corrupt lines are logged and dropped so a
/// partially written tail never blocks the rollup.
pub fn read_events(path: &Path) -> Result<Vec<TransitionEvent>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    file.lock_shared()?;

    let mut events = Vec::new();
    for (index, line) in BufReader::new(&file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<TransitionEvent>(&line) {
            Ok(event) => events.push(event),
            Err(e) => tracing::warn!("Skipping malformed WAL line {}: {}", index + 1, e),
        }
    }

    file.unlock()?;
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(status: CaseStatus) -> TransitionEvent {
        TransitionEvent {
            case_id: Uuid::new_v4(),
            case_number: "CASE-20240315-143022-AB12".into(),
            worker_id: "W-1042".into(),
            status,
            updated_at: Utc::now(),
            updated_by: "clin.rao".into(),
        }
    }

    #[test]
    fn test_append_and_read() {
        let temp_dir = tempfile::tempdir().unwrap();
        let wal_path = temp_dir.path().join("wal").join("transitions.wal");

        let mut sink = JsonlSink::new(&wal_path);
        sink.append(&event(CaseStatus::New)).unwrap();
        sink.append(&event(CaseStatus::Triaged)).unwrap();

        let events = read_events(&wal_path).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].status, CaseStatus::New);
        assert_eq!(events[1].status, CaseStatus::Triaged);
    }

    #[test]
    fn test_read_missing_file_is_empty() {
        let temp_dir = tempfile::tempdir().unwrap();
        let events = read_events(&temp_dir.path().join("absent.wal")).unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn test_corrupt_line_skipped() {
        let temp_dir = tempfile::tempdir().unwrap();
        let wal_path = temp_dir.path().join("transitions.wal");

        let mut sink = JsonlSink::new(&wal_path);
        sink.append(&event(CaseStatus::New)).unwrap();

        let mut file = OpenOptions::new().append(true).open(&wal_path).unwrap();
        writeln!(file, "not json at all").unwrap();
        drop(file);

        sink.append(&event(CaseStatus::Closed)).unwrap();

        let events = read_events(&wal_path).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].status, CaseStatus::Closed);
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let line = serde_json::to_string(&event(CaseStatus::ReturnToWork)).unwrap();
        assert!(line.contains(r#""status":"return_to_work""#));
    }
}
