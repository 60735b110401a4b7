//! Working-set persistence with file locking.
//!
//! The store is a single JSON snapshot of exceptions, cases, plans and
//! completion marks. Loads take a shared lock; saves take an exclusive lock
//! and replace the file atomically (temp file + rename). Concurrent status
//! transitions against the same case must go through [`CaseStore::update`] so
//! the read-modify-write is serialized - the pure transition logic itself
//! performs no locking.

use crate::types::{Case, Completion, Exception, PlanStatus, RehabilitationPlan};
use crate::{Error, Result};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use uuid::Uuid;

/// Persistent working set for the case-management engine
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CaseStore {
    #[serde(default)]
    pub exceptions: HashMap<Uuid, Exception>,
    #[serde(default)]
    pub cases: HashMap<Uuid, Case>,
    #[serde(default)]
    pub plans: HashMap<Uuid, RehabilitationPlan>,
    #[serde(default)]
    pub completions: Vec<Completion>,
}

impl CaseStore {
    /// Load the store under a shared lock
    ///
    /// A store that cannot be opened, read or parsed degrades to an empty one
    /// with a warning; the engine must stay usable after a damaged snapshot.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No store file found, starting empty");
            return Ok(Self::default());
        }

        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!("Unable to open store file {:?}: {}. Starting empty.", path, e);
                return Ok(Self::default());
            }
        };

        if let Err(e) = file.lock_shared() {
            tracing::warn!("Unable to lock store file {:?}: {}. Starting empty.", path, e);
            return Ok(Self::default());
        }

        let mut contents = String::new();
        let mut reader = std::io::BufReader::new(&file);
        if let Err(e) = reader.read_to_string(&mut contents) {
            let _ = file.unlock();
            tracing::warn!("Failed to read store file {:?}: {}. Starting empty.", path, e);
            return Ok(Self::default());
        }

        file.unlock()?;

        match serde_json::from_str::<CaseStore>(&contents) {
            Ok(store) => {
                tracing::debug!("Loaded store from {:?}", path);
                Ok(store)
            }
            Err(e) => {
                tracing::warn!("Failed to parse store file {:?}: {}. Starting empty.", path, e);
                Ok(Self::default())
            }
        }
    }

    /// Save the store atomically under an exclusive lock
    ///
    /// The snapshot is written to a unique temp file in the same directory,
    /// synced, then renamed over the old file, so a reader never observes a
    /// half-written store.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let temp = NamedTempFile::new_in(path.parent().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::Other, "store path missing parent")
        })?)?;
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string(self)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved store to {:?}", path);
        Ok(())
    }

    /// Load the store, modify it, and save it back atomically
    ///
    /// This is the serialization point for concurrent case mutations.
    pub fn update<F>(path: &Path, f: F) -> Result<Self>
    where
        F: FnOnce(&mut CaseStore) -> Result<()>,
    {
        let mut store = Self::load(path)?;
        f(&mut store)?;
        store.save(path)?;
        Ok(store)
    }

    /// Plans linked to the given case
    pub fn plans_for_case(&self, case_id: Uuid) -> Vec<RehabilitationPlan> {
        self.plans
            .values()
            .filter(|p| p.case_id == case_id)
            .cloned()
            .collect()
    }

    /// Whether the case already has an active plan (one active plan per case)
    pub fn has_active_plan(&self, case_id: Uuid) -> bool {
        self.plans
            .values()
            .any(|p| p.case_id == case_id && p.status == PlanStatus::Active)
    }

    /// All exceptions recorded for a worker
    pub fn worker_exceptions(&self, worker_id: &str) -> Vec<Exception> {
        self.exceptions
            .values()
            .filter(|e| e.worker_id == worker_id)
            .cloned()
            .collect()
    }

    /// Record a completion mark; duplicates of the same key are ignored
    pub fn add_completion(&mut self, completion: Completion) {
        if !self.completions.contains(&completion) {
            self.completions.push(completion);
        }
    }
}
