//! Ivy Graph — module data model, graph storage, and update broadcast

pub mod graph;
pub mod model;
pub mod snapshot;
pub mod update;


pub use graph::{Graph, GraphError, GraphHandle, SharedGraph};
pub use model::{
    DependencyEdge, EdgeOrigin, ModuleId, ModuleKind, ModuleNode, SCRIPT_EXTENSIONS, normalize,
};
pub use snapshot::{
    GraphSnapshot, SNAPSHOT_DIR, SNAPSHOT_FILE, clear_snapshot, ensure_snapshot_dir, load_snapshot,
    save_snapshot, snapshot_dir, snapshot_path,
};
pub use update::GraphUpdate;
