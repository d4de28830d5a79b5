//! Watch-obligation registry

use std::path::{Path, PathBuf};

use dashmap::DashSet;
use path_clean::PathClean;

/// Receiver for watch obligations. Registration is fire-and-forget: it
/// never fails and never blocks the graph commit it accompanies.
pub trait WatchSink: Send + Sync {
    fn register_watch(&self, path: &Path);
}

/// Set of files the surrounding pipeline owes a watch for. Obligations
/// are strictly additive: nothing ever revokes them. Thread-safe for
/// concurrent registration.
#[derive(Debug, Default)]
pub struct WatchRegistry {
    paths: DashSet<PathBuf>,
}

impl WatchRegistry {
    pub fn new() -> Self {
        WatchRegistry {
            paths: DashSet::new(),
        }
    }

    /// Check if a path already carries a watch obligation.
    pub fn is_watched(&self, path: &Path) -> bool {
        self.paths.contains(&path.clean())
    }

    /// Number of registered obligations.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// All registered paths.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.paths.iter().map(|entry| entry.key().clone()).collect()
    }
}

impl WatchSink for WatchRegistry {
    fn register_watch(&self, path: &Path) {
        if self.paths.insert(path.clean()) {
            tracing::debug!("watch obligation registered: {}", path.display());
        }
    }
}
