//! Graph snapshot persistence between build sessions

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::graph::Graph;
use crate::model::{DependencyEdge, ModuleId, ModuleNode};

/// Snapshot directory: .ivy/
pub const SNAPSHOT_DIR: &str = ".ivy";

/// Graph snapshot file
pub const SNAPSHOT_FILE: &str = "graph.json";

/// A serialized edge; endpoints are stable module ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotEdge {
    pub source: ModuleId,
    pub target: ModuleId,
    pub edge: DependencyEdge,
}

/// On-disk form of the graph.
#[derive(Debug, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub version: String,
    pub saved_at: String,
    pub sequence: u64,
    pub modules: Vec<ModuleNode>,
    pub edges: Vec<SnapshotEdge>,
}

/// Get snapshot directory path
pub fn snapshot_dir(root: &Path) -> PathBuf {
    root.join(SNAPSHOT_DIR)
}

/// Get graph snapshot file path
pub fn snapshot_path(root: &Path) -> PathBuf {
    root.join(SNAPSHOT_DIR).join(SNAPSHOT_FILE)
}

/// Ensure snapshot directory exists
pub fn ensure_snapshot_dir(root: &Path) -> std::io::Result<()> {
    let dir = snapshot_dir(root);
    if !dir.exists() {
        std::fs::create_dir_all(&dir)?;
    }
    Ok(())
}

/// Serialize the graph to the snapshot file under `root`.
pub fn save_snapshot(graph: &Graph, root: &Path) -> anyhow::Result<()> {
    ensure_snapshot_dir(root)?;
    let path = snapshot_path(root);

    let snapshot = GraphSnapshot {
        version: env!("CARGO_PKG_VERSION").to_string(),
        saved_at: chrono::Utc::now().to_rfc3339(),
        sequence: graph.sequence(),
        modules: graph.all_modules().cloned().collect(),
        edges: graph
            .all_edges()
            .map(|(source, target, edge)| SnapshotEdge { source, target, edge })
            .collect(),
    };

    let json = serde_json::to_string_pretty(&snapshot)?;
    std::fs::write(&path, json)?;

    tracing::debug!("graph snapshot saved: {}", path.display());
    Ok(())
}

/// Load the graph from the snapshot file under `root`, if one exists.
pub fn load_snapshot(root: &Path) -> anyhow::Result<Option<Graph>> {
    let path = snapshot_path(root);
    if !path.exists() {
        return Ok(None);
    }

    let json = std::fs::read_to_string(&path)?;
    let snapshot: GraphSnapshot = serde_json::from_str(&json)?;

    let mut graph = Graph::new();
    for module in snapshot.modules {
        graph.insert_node(module);
    }
    for SnapshotEdge { source, target, edge } in snapshot.edges {
        graph.link(source, target, edge.origin)?;
    }
    graph.restore_sequence(snapshot.sequence);

    tracing::debug!(
        "graph snapshot loaded from {}: {} modules, {} edges",
        path.display(),
        graph.module_count(),
        graph.edge_count()
    );
    Ok(Some(graph))
}

/// Remove the snapshot directory.
pub fn clear_snapshot(root: &Path) -> std::io::Result<()> {
    let dir = snapshot_dir(root);
    if dir.exists() {
        std::fs::remove_dir_all(&dir)?;
    }
    Ok(())
}
