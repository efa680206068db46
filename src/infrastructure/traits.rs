//! Boundary traits for testability
//!
//! These traits abstract the record tables and the persistence medium,
//! allowing services to be tested with in-memory implementations.

use std::collections::HashMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::domain::{Customer, CustomerId, DivisionId, DomainResult};
use crate::infrastructure::store::Snapshot;

/// Customer access needed by the division core.
pub trait CustomerRepository {
    /// Customers directly attached to `division`, ordered by name.
    fn list_by_division(&self, division: DivisionId) -> Vec<Customer>;

    /// Every attached customer grouped by division, each group ordered by name.
    fn group_by_division(&self) -> HashMap<DivisionId, Vec<Customer>>;

    /// Detach a customer from its division without deleting it.
    fn clear_division_ref(&mut self, customer: CustomerId) -> DomainResult<()>;
}

/// Persistence medium for store snapshots.
pub trait SnapshotStorage: Send + Sync {
    /// Load the last saved snapshot; `None` if nothing was saved yet.
    fn load(&self) -> io::Result<Option<Snapshot>>;

    /// Replace the saved snapshot.
    fn save(&self, snapshot: &Snapshot) -> io::Result<()>;

    /// Human readable location, used in error messages.
    fn describe(&self) -> String;
}

// ============================================================
// REAL IMPLEMENTATIONS
// ============================================================

/// Snapshot stored as a pretty-printed JSON file.
///
/// Writes go to a temp file in the same directory which is then renamed over
/// the target, so a crash never leaves a half-written snapshot behind.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotStorage for JsonFileStorage {
    fn load(&self) -> io::Result<Option<Snapshot>> {
        if !self.path.exists() {
            debug!("load: no snapshot at {}", self.path.display());
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)?;
        let snapshot = serde_json::from_str(&content)?;
        Ok(Some(snapshot))
    }

    fn save(&self, snapshot: &Snapshot) -> io::Result<()> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        let mut tmp = NamedTempFile::new_in(&dir)?;
        serde_json::to_writer_pretty(&mut tmp, snapshot)?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        debug!("save: wrote snapshot to {}", self.path.display());
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Keeps the last snapshot in memory.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    saved: Mutex<Option<Snapshot>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        Self {
            saved: Mutex::new(Some(snapshot)),
        }
    }

    /// The most recently saved snapshot.
    pub fn last_saved(&self) -> Option<Snapshot> {
        self.saved.lock().ok().and_then(|s| s.clone())
    }
}

impl SnapshotStorage for MemoryStorage {
    fn load(&self) -> io::Result<Option<Snapshot>> {
        Ok(self.last_saved())
    }

    fn save(&self, snapshot: &Snapshot) -> io::Result<()> {
        let mut saved = self
            .saved
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "memory storage poisoned"))?;
        *saved = Some(snapshot.clone());
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
