//! In-memory session store

use super::SessionStore;
use std::collections::HashSet;
use std::sync::{PoisonError, RwLock};

/// Authenticated session ids held in memory. Concurrent writers for the
/// same id race; the last one wins.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    authenticated: RwLock<HashSet<String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.authenticated
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStore for MemorySessionStore {
    fn is_authenticated(&self, session_id: &str) -> bool {
        self.authenticated
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(session_id)
    }

    fn mark_authenticated(&self, session_id: &str) {
        self.authenticated
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(session_id.to_string());
    }

    fn clear(&self, session_id: &str) {
        self.authenticated
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(session_id);
    }
}
