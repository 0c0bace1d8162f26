// Application state module
// Shared by every connection for the lifetime of the server

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use super::types::Config;
use crate::routing::{Dispatcher, MethodOverride};

/// Application state
pub struct AppState {
    pub config: Config,
    pub dispatcher: Arc<Dispatcher>,
    pub method_override: MethodOverride,

    // Cached config values for fast access without locks
    pub cached_access_log: Arc<AtomicBool>,

    /// Connections currently being served
    pub active_connections: AtomicU64,
}

impl AppState {
    pub fn new(config: &Config, dispatcher: Dispatcher) -> Self {
        Self {
            config: config.clone(),
            dispatcher: Arc::new(dispatcher),
            method_override: MethodOverride::from_config(&config.method_override),
            cached_access_log: Arc::new(AtomicBool::new(config.logging.access_log)),
            active_connections: AtomicU64::new(0),
        }
    }

    pub fn access_log_enabled(&self) -> bool {
        self.cached_access_log.load(Ordering::Relaxed)
    }

    /// Reserve a connection slot; `false` when the configured limit is reached
    pub fn try_acquire_connection(&self) -> bool {
        let limit = self.config.performance.max_connections;
        self.active_connections
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| match limit {
                Some(max) if current >= max => None,
                _ => Some(current + 1),
            })
            .is_ok()
    }

    pub fn release_connection(&self) {
        self.active_connections.fetch_sub(1, Ordering::AcqRel);
    }
}
