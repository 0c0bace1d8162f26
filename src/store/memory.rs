//! In-process record store with an optional TOML snapshot
//!
//! Every mutation is applied to a copy, written to the snapshot file and only
//! then made visible, so a failed write leaves the store unchanged. Presence
//! checks happen under the same write lock as the change they guard.

use super::{BookmarkStore, StoreError};
use crate::bookmarks::{Bookmark, BookmarkDraft};
use crate::logger;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// On-disk layout of the snapshot file
#[derive(Debug, Serialize, Deserialize, Default)]
struct Snapshot {
    next_id: u64,
    #[serde(default)]
    bookmarks: Vec<Bookmark>,
}

#[derive(Debug, Clone, Default)]
struct Records {
    next_id: u64,
    by_id: BTreeMap<u64, Bookmark>,
}

impl Records {
    fn from_snapshot(snapshot: Snapshot) -> Self {
        let by_id: BTreeMap<u64, Bookmark> =
            snapshot.bookmarks.into_iter().map(|b| (b.id, b)).collect();
        // Never hand out an id that is already taken
        let floor = by_id.keys().next_back().map_or(1, |max| max + 1);
        Self {
            next_id: snapshot.next_id.max(floor),
            by_id,
        }
    }

    fn to_snapshot(&self) -> Snapshot {
        Snapshot {
            next_id: self.next_id,
            bookmarks: self.by_id.values().cloned().collect(),
        }
    }
}

#[derive(Debug)]
pub struct MemoryBookmarkStore {
    records: RwLock<Records>,
    data_file: Option<PathBuf>,
}

impl Default for MemoryBookmarkStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBookmarkStore {
    /// Volatile store, lost on exit
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Records {
                next_id: 1,
                by_id: BTreeMap::new(),
            }),
            data_file: None,
        }
    }

    /// Store backed by `path`; a missing file starts empty
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let records = match Self::load(&path)? {
            Some(snapshot) => {
                let records = Records::from_snapshot(snapshot);
                logger::log_info(&format!(
                    "Loaded {} bookmarks from {}",
                    records.by_id.len(),
                    path.display()
                ));
                records
            }
            None => Records {
                next_id: 1,
                by_id: BTreeMap::new(),
            },
        };
        Ok(Self {
            records: RwLock::new(records),
            data_file: Some(path),
        })
    }

    pub fn data_file(&self) -> Option<&Path> {
        self.data_file.as_deref()
    }

    fn load(path: &Path) -> Result<Option<Snapshot>, StoreError> {
        if !path.exists() {
            return Ok(None);
        }
        let load_err = |reason: String| StoreError::Load {
            path: path.display().to_string(),
            reason,
        };
        let content = fs::read_to_string(path).map_err(|e| load_err(e.to_string()))?;
        toml::from_str(&content)
            .map(Some)
            .map_err(|e| load_err(e.to_string()))
    }

    /// Write the snapshot next to the target and rename it into place
    fn persist(&self, records: &Records) -> Result<(), StoreError> {
        let Some(path) = &self.data_file else {
            return Ok(());
        };
        let persist_err = |reason: String| StoreError::Persist {
            path: path.display().to_string(),
            reason,
        };

        let content = toml::to_string_pretty(&records.to_snapshot())
            .map_err(|e| persist_err(format!("serialize: {e}")))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| persist_err(e.to_string()))?;
        }
        let tmp = path.with_extension("toml.tmp");
        fs::write(&tmp, content).map_err(|e| persist_err(e.to_string()))?;
        fs::rename(&tmp, path).map_err(|e| persist_err(e.to_string()))
    }

    /// Apply `change` to a copy, persist it, then publish it.
    /// `None` from `change` means nothing changed: no write, no publish.
    fn mutate<T>(
        &self,
        change: impl FnOnce(&mut Records) -> Option<T>,
    ) -> Result<Option<T>, StoreError> {
        let mut guard = self
            .records
            .write()
            .map_err(|_| StoreError::Unavailable("record lock poisoned".into()))?;
        let mut next = guard.clone();
        let Some(out) = change(&mut next) else {
            return Ok(None);
        };
        self.persist(&next)?;
        *guard = next;
        Ok(Some(out))
    }

    fn read<T>(&self, f: impl FnOnce(&Records) -> T) -> Result<T, StoreError> {
        self.records
            .read()
            .map(|guard| f(&guard))
            .map_err(|_| StoreError::Unavailable("record lock poisoned".into()))
    }
}

impl BookmarkStore for MemoryBookmarkStore {
    fn find_all(&self) -> Result<Vec<Bookmark>, StoreError> {
        self.read(|records| records.by_id.values().cloned().collect())
    }

    fn find_by_id(&self, id: u64) -> Result<Option<Bookmark>, StoreError> {
        self.read(|records| records.by_id.get(&id).cloned())
    }

    fn insert(&self, draft: BookmarkDraft) -> Result<u64, StoreError> {
        let id = self.mutate(|records| {
            let id = records.next_id;
            records.next_id += 1;
            records.by_id.insert(id, draft.with_id(id));
            Some(id)
        })?;
        id.ok_or_else(|| StoreError::Unavailable("insert produced no record".into()))
    }

    fn update(&self, id: u64, draft: BookmarkDraft) -> Result<bool, StoreError> {
        let updated = self.mutate(|records| {
            let slot = records.by_id.get_mut(&id)?;
            *slot = draft.with_id(id);
            Some(())
        })?;
        Ok(updated.is_some())
    }

    fn delete(&self, id: u64) -> Result<bool, StoreError> {
        let removed = self.mutate(|records| records.by_id.remove(&id))?;
        Ok(removed.is_some())
    }
}
