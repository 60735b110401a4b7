//! WAL to CSV rollup.
//!
//! Folds audited transition events into a flat, appending CSV report for
//! administrators. The CSV is fsynced before the WAL is archived, and the WAL
//! is renamed rather than deleted so the raw audit data survives a bad
//! rollup.

use crate::wal::TransitionEvent;
use crate::Result;
use std::fs::OpenOptions;
use std::path::Path;

#[derive(Debug, serde::Serialize)]
struct CsvRow {
    case_id: String,
    case_number: String,
    worker_id: String,
    status: String,
    updated_at: String,
    updated_by: String,
}

impl From<&TransitionEvent> for CsvRow {
    fn from(event: &TransitionEvent) -> Self {
        CsvRow {
            case_id: event.case_id.to_string(),
            case_number: event.case_number.clone(),
            worker_id: event.worker_id.clone(),
            status: event.status.to_string(),
            updated_at: event.updated_at.to_rfc3339(),
            updated_by: event.updated_by.clone(),
        }
    }
}

/// Append all WAL events to the CSV report and archive the WAL
///
/// Returns the number of events processed. An empty or missing WAL is a
/// no-op. On success the WAL has been renamed to `<name>.processed`; until
/// the rename lands, a crash leaves both files intact and the rollup can be
/// re-run (at the cost of duplicate CSV rows, never lost ones).
pub fn wal_to_csv_and_archive(wal_path: &Path, csv_path: &Path) -> Result<usize> {
    let events = crate::wal::read_events(wal_path)?;
    if events.is_empty() {
        tracing::info!("No transition events to roll up");
        return Ok(0);
    }

    if let Some(parent) = csv_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new().create(true).append(true).open(csv_path)?;
    // Only a freshly created (or truncated) report gets a header row
    let needs_headers = file.metadata()?.len() == 0;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_headers)
        .from_writer(file);
    for event in &events {
        writer.serialize(CsvRow::from(event))?;
    }
    writer.flush()?;

    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    file.sync_all()?;

    let archived = wal_path.with_extension("wal.processed");
    std::fs::rename(wal_path, &archived)?;
    tracing::info!(
        "Rolled up {} events to {:?}, WAL archived to {:?}",
        events.len(),
        csv_path,
        archived
    );

    Ok(events.len())
}

/// Delete `.wal.processed` archives under the given directory
pub fn cleanup_processed_wals(dir: &Path) -> Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }

    let mut removed = 0;
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "processed") {
            std::fs::remove_file(&path)?;
            tracing::debug!("Removed archived WAL {:?}", path);
            removed += 1;
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CaseStatus;
    use crate::wal::{EventSink, JsonlSink};
    use chrono::Utc;
    use uuid::Uuid;

    fn write_events(wal_path: &Path, statuses: &[CaseStatus]) {
        let mut sink = JsonlSink::new(wal_path);
        for status in statuses {
            sink.append(&TransitionEvent {
                case_id: Uuid::new_v4(),
                case_number: "CASE-20240315-143022-AB12".into(),
                worker_id: "W-1042".into(),
                status: *status,
                updated_at: Utc::now(),
                updated_by: "clin.rao".into(),
            })
            .unwrap();
        }
    }

    #[test]
    fn test_rollup_writes_rows_and_archives() {
        let temp_dir = tempfile::tempdir().unwrap();
        let wal_path = temp_dir.path().join("transitions.wal");
        let csv_path = temp_dir.path().join("transitions.csv");

        write_events(&wal_path, &[CaseStatus::New, CaseStatus::Triaged]);

        let count = wal_to_csv_and_archive(&wal_path, &csv_path).unwrap();
        assert_eq!(count, 2);
        assert!(!wal_path.exists());
        assert!(temp_dir.path().join("transitions.wal.processed").exists());

        let csv = std::fs::read_to_string(&csv_path).unwrap();
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("case_id,case_number,worker_id,status"));
        assert!(lines[1].contains(",new,"));
        assert!(lines[2].contains(",triaged,"));
    }

    #[test]
    fn test_rollup_empty_wal_is_noop() {
        let temp_dir = tempfile::tempdir().unwrap();
        let wal_path = temp_dir.path().join("transitions.wal");
        let csv_path = temp_dir.path().join("transitions.csv");

        let count = wal_to_csv_and_archive(&wal_path, &csv_path).unwrap();
        assert_eq!(count, 0);
        assert!(!csv_path.exists());
    }

    #[test]
    fn test_second_rollup_appends_without_headers() {
        let temp_dir = tempfile::tempdir().unwrap();
        let wal_path = temp_dir.path().join("transitions.wal");
        let csv_path = temp_dir.path().join("transitions.csv");

        write_events(&wal_path, &[CaseStatus::New]);
        wal_to_csv_and_archive(&wal_path, &csv_path).unwrap();

        // First archive must be out of the way before the next WAL cycle
        cleanup_processed_wals(temp_dir.path()).unwrap();

        write_events(&wal_path, &[CaseStatus::Closed]);
        wal_to_csv_and_archive(&wal_path, &csv_path).unwrap();

        let csv = std::fs::read_to_string(&csv_path).unwrap();
        let header_count = csv.lines().filter(|l| l.starts_with("case_id,")).count();
        assert_eq!(header_count, 1);
        assert_eq!(csv.lines().count(), 3);
    }

    #[test]
    fn test_cleanup_removes_only_processed() {
        let temp_dir = tempfile::tempdir().unwrap();
        std::fs::write(temp_dir.path().join("a.wal.processed"), "x").unwrap();
        std::fs::write(temp_dir.path().join("keep.wal"), "x").unwrap();

        let removed = cleanup_processed_wals(temp_dir.path()).unwrap();
        assert_eq!(removed, 1);
        assert!(temp_dir.path().join("keep.wal").exists());
        assert!(!temp_dir.path().join("a.wal.processed").exists());
    }

    #[test]
    fn test_cleanup_missing_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let removed = cleanup_processed_wals(&temp_dir.path().join("absent")).unwrap();
        assert_eq!(removed, 0);
    }
}
