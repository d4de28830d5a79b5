//! Ivy Watcher — watch-obligation registry and notify tail

pub mod registry;
pub mod watcher;

pub use registry::{WatchRegistry, WatchSink};
pub use watcher::{FileWatcher, WatchEvent};
