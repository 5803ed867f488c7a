//! Flat-file borrow record store.
//!
//! The whole list lives in one pretty-printed JSON array. Every mutation is a
//! full read-modify-write, serialized by an in-process writer lock so two
//! borrows (or a borrow racing a sweep) never overwrite each other.

use std::path::{Path, PathBuf};

use tokio::sync::{Mutex, MutexGuard};

use crate::{domain::BorrowRecord, Result};

pub struct BorrowStore {
    path: PathBuf,
    writer: Mutex<()>,
}

/// Exclusive access to the store for a multi-step read-modify-write.
///
/// Held by the sweeper from its load to its save.
pub struct StoreGuard<'a> {
    store: &'a BorrowStore,
    _lock: MutexGuard<'a, ()>,
}

impl BorrowStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            writer: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Full persisted list in insertion order.
    ///
    /// Missing document → empty. Unreadable or corrupt document → logged, empty.
    pub async fn load(&self) -> Vec<BorrowRecord> {
        match read_records(&self.path).await {
            Ok(v) => v,
            Err(e) => {
                tracing::error!(path = %self.path.display(), "error loading borrowings: {e}");
                Vec::new()
            }
        }
    }

    /// Overwrite the document. Failures are logged, never returned.
    pub async fn save(&self, records: &[BorrowRecord]) {
        let _lock = self.writer.lock().await;
        self.save_unlocked(records).await;
    }

    /// `save(load() + [record])` under the writer lock.
    pub async fn append(&self, record: BorrowRecord) {
        let guard = self.lock().await;
        let mut records = guard.load().await;
        records.push(record);
        guard.save(&records).await;
    }

    pub async fn lock(&self) -> StoreGuard<'_> {
        StoreGuard {
            store: self,
            _lock: self.writer.lock().await,
        }
    }

    async fn save_unlocked(&self, records: &[BorrowRecord]) {
        if let Err(e) = write_records(&self.path, records).await {
            tracing::error!(path = %self.path.display(), "error saving borrowings: {e}");
        }
    }
}

impl StoreGuard<'_> {
    pub async fn load(&self) -> Vec<BorrowRecord> {
        self.store.load().await
    }

    pub async fn save(&self, records: &[BorrowRecord]) {
        self.store.save_unlocked(records).await;
    }
}

async fn read_records(path: &Path) -> Result<Vec<BorrowRecord>> {
    let txt = match tokio::fs::read_to_string(path).await {
        Ok(t) => t,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    Ok(serde_json::from_str(&txt)?)
}

/// Write to a sibling temp file, then rename over the target so readers
/// never see a half-written document.
async fn write_records(path: &Path, records: &[BorrowRecord]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let txt = serde_json::to_string_pretty(records)?;
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, txt).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}
