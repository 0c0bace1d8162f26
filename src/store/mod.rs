//! Storage collaborators
//!
//! Handlers reach records, sessions and uploaded files only through these
//! traits. All calls are synchronous; the connection layer already runs
//! dispatch on the blocking pool.

mod memory;
mod session;
mod upload;

pub use memory::MemoryBookmarkStore;
pub use session::MemorySessionStore;
pub use upload::{FsUploadStore, UploadError};

use crate::bookmarks::{Bookmark, BookmarkDraft};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store cannot serve requests right now
    #[error("record store unavailable: {0}")]
    Unavailable(String),

    /// Snapshot could not be written
    #[error("failed to persist {path}: {reason}")]
    Persist { path: String, reason: String },

    /// Snapshot exists but could not be loaded
    #[error("failed to load {path}: {reason}")]
    Load { path: String, reason: String },
}

/// Bookmark records
pub trait BookmarkStore: Send + Sync {
    fn find_all(&self) -> Result<Vec<Bookmark>, StoreError>;

    fn find_by_id(&self, id: u64) -> Result<Option<Bookmark>, StoreError>;

    /// Store a new record and return its id
    fn insert(&self, draft: BookmarkDraft) -> Result<u64, StoreError>;

    /// Replace the record; `false` if no record has this id
    fn update(&self, id: u64, draft: BookmarkDraft) -> Result<bool, StoreError>;

    /// `false` if no record has this id
    fn delete(&self, id: u64) -> Result<bool, StoreError>;
}

/// Authenticated session ids. Expiry is left to the implementation.
pub trait SessionStore: Send + Sync {
    fn is_authenticated(&self, session_id: &str) -> bool;

    fn mark_authenticated(&self, session_id: &str);

    fn clear(&self, session_id: &str);
}

/// Screenshot files attached to bookmarks
pub trait UploadStore: Send + Sync {
    /// Write `data` under a fresh name derived from `original_name`'s
    /// extension and return the stored name
    fn save(&self, original_name: &str, data: &[u8]) -> Result<String, UploadError>;

    fn open(&self, name: &str) -> Result<Vec<u8>, UploadError>;

    /// Removing a file that is already gone is not an error
    fn remove(&self, name: &str) -> Result<(), UploadError>;
}
