//! Filesystem watcher over registered obligations

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::Result;
use globset::{Glob, GlobSet, GlobSetBuilder};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use crate::registry::WatchRegistry;

/// Events emitted by the file watcher
#[derive(Debug, Clone)]
pub enum WatchEvent {
    /// File created
    Created(PathBuf),
    /// File modified
    Modified(PathBuf),
    /// File removed
    Removed(PathBuf),
}

impl WatchEvent {
    pub fn path(&self) -> &Path {
        match self {
            WatchEvent::Created(path) | WatchEvent::Modified(path) | WatchEvent::Removed(path) => {
                path
            }
        }
    }
}

/// Thin notify tail over the watch registry. Watches each obligation
/// non-recursively; no debouncing, no project crawling.
pub struct FileWatcher {
    watcher: RecommendedWatcher,
    event_rx: mpsc::UnboundedReceiver<WatchEvent>,
    watched_paths: HashSet<PathBuf>,
}

impl FileWatcher {
    pub fn new() -> Result<Self> {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let ignore = ignore_set()?;

        let watcher =
            notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
                match res {
                    Ok(event) => {
                        debug!("file system event: {:?}", event);
                        Self::handle_notify_event(event, &event_tx, &ignore);
                    }
                    Err(e) => {
                        error!("file system watch error: {}", e);
                    }
                }
            })?;

        Ok(Self {
            watcher,
            event_rx,
            watched_paths: HashSet::new(),
        })
    }

    /// Convert a notify event into watch events on the channel.
    fn handle_notify_event(
        event: notify::Event,
        event_tx: &mpsc::UnboundedSender<WatchEvent>,
        ignore: &GlobSet,
    ) {
        let wrap: fn(PathBuf) -> WatchEvent = match event.kind {
            notify::EventKind::Create(_) => WatchEvent::Created,
            notify::EventKind::Modify(_) => WatchEvent::Modified,
            notify::EventKind::Remove(_) => WatchEvent::Removed,
            _ => return,
        };
        for path in event.paths {
            if ignore.is_match(&path) {
                continue;
            }
            if let Err(e) = event_tx.send(wrap(path)) {
                warn!("failed to send watch event: {}", e);
            }
        }
    }

    /// Watch a single file.
    pub fn watch_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        debug!("watching file: {:?}", path);

        self.watcher.watch(path, RecursiveMode::NonRecursive)?;
        self.watched_paths.insert(path.to_path_buf());
        Ok(())
    }

    /// Watch every obligation currently in the registry. Obligations may
    /// name files that do not exist yet; those are skipped with a
    /// warning. Returns how many watches were established.
    pub fn watch_registry(&mut self, registry: &WatchRegistry) -> usize {
        let mut established = 0;
        for path in registry.paths() {
            match self.watch_file(&path) {
                Ok(()) => established += 1,
                Err(e) => warn!("cannot watch {}: {}", path.display(), e),
            }
        }
        established
    }

    /// Get the event receiver
    pub fn event_receiver(&mut self) -> &mut mpsc::UnboundedReceiver<WatchEvent> {
        &mut self.event_rx
    }

    /// Check if a path is being watched
    pub fn is_watching(&self, path: &Path) -> bool {
        self.watched_paths.contains(path)
    }

    /// Get all watched paths
    pub fn watched_paths(&self) -> &HashSet<PathBuf> {
        &self.watched_paths
    }
}

/// Paths never worth watching, whatever the registry says.
fn ignore_set() -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in ["**/target/**", "**/.git/**", "**/node_modules/**", "**/.ivy/**"] {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}
