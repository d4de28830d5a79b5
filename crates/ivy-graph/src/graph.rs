//! Graph wrapper using petgraph::StableDiGraph with path-keyed module identity

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use petgraph::Direction;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use rustc_hash::FxHashMap;
use thiserror::Error;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard, broadcast};

use crate::model::*;
use crate::update::GraphUpdate;

/// Errors surfaced by graph mutations. A failed commit propagates to the
/// caller uncaught; the next compile event re-attempts from consistent
/// state.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("module {0:?} is not tracked by the graph")]
    UnknownModule(ModuleId),
    #[error("edge target {0:?} is not tracked by the graph")]
    UnknownTarget(ModuleId),
}

/// The module graph — a directed graph of modules with stable indices,
/// keyed by normalized file path and by compiler-assigned id.
pub struct Graph {
    inner: StableDiGraph<ModuleNode, DependencyEdge>,
    by_id: FxHashMap<ModuleId, NodeIndex>,
    by_compiled: FxHashMap<String, ModuleId>,
    sequence: u64,
}

impl std::fmt::Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field("module_count", &self.inner.node_count())
            .field("edge_count", &self.inner.edge_count())
            .field("sequence", &self.sequence)
            .finish()
    }
}

impl Graph {
    pub fn new() -> Self {
        Graph {
            inner: StableDiGraph::new(),
            by_id: FxHashMap::default(),
            by_compiled: FxHashMap::default(),
            sequence: 0,
        }
    }

    /// Resolve a file path to its module, creating a file-only placeholder
    /// entry if the path is not tracked yet. Idempotent by normalized
    /// path: re-requesting the same path yields the same module.
    pub fn resolve_file_entry(&mut self, path: &Path) -> ModuleId {
        let id = ModuleId::from_path(path);
        if !self.by_id.contains_key(&id) {
            let idx = self.inner.add_node(ModuleNode::placeholder(path));
            self.by_id.insert(id, idx);
        }
        id
    }

    /// Register a compiled unit. Upgrades an existing placeholder in
    /// place (same `ModuleId`) or creates the module outright, and
    /// indexes it by compiled id.
    pub fn claim_module(
        &mut self,
        file: &Path,
        compiled_id: &str,
        kind: ModuleKind,
        self_accepting: bool,
    ) -> ModuleId {
        let id = self.resolve_file_entry(file);
        let idx = self.by_id[&id];
        if let Some(node) = self.inner.node_weight_mut(idx) {
            node.compiled_id = Some(compiled_id.to_string());
            node.kind = kind;
            node.is_self_accepting = self_accepting;
            node.is_placeholder = false;
        }
        self.by_compiled.insert(compiled_id.to_string(), id);
        id
    }

    /// Look up a module by compiler-assigned id.
    pub fn lookup_compiled(&self, compiled_id: &str) -> Option<ModuleId> {
        self.by_compiled.get(compiled_id).copied()
    }

    /// Look up a module by file path.
    pub fn lookup_file(&self, path: &Path) -> Option<ModuleId> {
        let id = ModuleId::from_path(path);
        self.by_id.contains_key(&id).then_some(id)
    }

    /// Get a module by id.
    pub fn node(&self, id: ModuleId) -> Option<&ModuleNode> {
        self.by_id.get(&id).and_then(|idx| self.inner.node_weight(*idx))
    }

    /// Targets of a module's outgoing "depends on" edges.
    pub fn dependencies(&self, id: ModuleId) -> Vec<ModuleId> {
        let Some(&idx) = self.by_id.get(&id) else {
            return Vec::new();
        };
        self.inner
            .edges_directed(idx, Direction::Outgoing)
            .filter_map(|edge_ref| self.inner.node_weight(edge_ref.target()))
            .map(|node| node.id)
            .collect()
    }

    /// Modules that depend on the given module (reverse edges). This is
    /// what hot-reload invalidation walks.
    pub fn dependents(&self, id: ModuleId) -> Vec<ModuleId> {
        let Some(&idx) = self.by_id.get(&id) else {
            return Vec::new();
        };
        self.inner
            .edges_directed(idx, Direction::Incoming)
            .filter_map(|edge_ref| self.inner.node_weight(edge_ref.source()))
            .map(|node| node.id)
            .collect()
    }

    /// All modules reachable over reverse edges — everything a change to
    /// the given module would invalidate.
    pub fn transitive_dependents(&self, id: ModuleId) -> HashSet<ModuleId> {
        let mut dependents = HashSet::new();
        let mut to_visit = vec![id];

        while let Some(current) = to_visit.pop() {
            for dependent in self.dependents(current) {
                if dependents.insert(dependent) {
                    to_visit.push(dependent);
                }
            }
        }

        dependents
    }

    /// Add a single dependency edge. Duplicate edges (same source and
    /// target) are not created twice.
    pub fn link(
        &mut self,
        source: ModuleId,
        target: ModuleId,
        origin: EdgeOrigin,
    ) -> Result<(), GraphError> {
        let src = *self.by_id.get(&source).ok_or(GraphError::UnknownModule(source))?;
        let tgt = *self.by_id.get(&target).ok_or(GraphError::UnknownTarget(target))?;
        if !self.dependencies(source).contains(&target) {
            self.inner.add_edge(src, tgt, DependencyEdge::new(origin));
        }
        Ok(())
    }

    /// Replace a module's outgoing edge set atomically.
    ///
    /// Edges whose target survives keep their existing entry (and
    /// origin); edges to vanished targets are removed; new targets get
    /// fresh edges with the given origin. The accepted set and
    /// self-accepting flag are overwritten as passed. Readers behind the
    /// shared lock observe either the fully-old or fully-new set.
    pub fn commit_edges(
        &mut self,
        module: ModuleId,
        edges: &HashSet<ModuleId>,
        accepted: HashSet<ModuleId>,
        self_accepting: bool,
        origin: EdgeOrigin,
    ) -> Result<GraphUpdate, GraphError> {
        let idx = *self.by_id.get(&module).ok_or(GraphError::UnknownModule(module))?;

        // Validate every target before touching the graph.
        let mut targets = FxHashMap::default();
        for target in edges {
            let tgt = *self.by_id.get(target).ok_or(GraphError::UnknownTarget(*target))?;
            targets.insert(*target, tgt);
        }

        let current: Vec<(petgraph::stable_graph::EdgeIndex, ModuleId)> = self
            .inner
            .edges_directed(idx, Direction::Outgoing)
            .filter_map(|edge_ref| {
                self.inner
                    .node_weight(edge_ref.target())
                    .map(|node| (edge_ref.id(), node.id))
            })
            .collect();

        let mut removed = Vec::new();
        let mut kept = HashSet::new();
        for (edge_idx, target) in current {
            if edges.contains(&target) {
                kept.insert(target);
            } else {
                self.inner.remove_edge(edge_idx);
                removed.push(target);
            }
        }

        let mut added = Vec::new();
        for (target, tgt) in &targets {
            if !kept.contains(target) {
                self.inner.add_edge(idx, *tgt, DependencyEdge::new(origin));
                added.push(*target);
            }
        }

        let node = self
            .inner
            .node_weight_mut(idx)
            .ok_or(GraphError::UnknownModule(module))?;
        node.accepted_deps = accepted;
        node.is_self_accepting = self_accepting;

        self.sequence += 1;

        let mut accepted: Vec<ModuleId> = node.accepted_deps.iter().copied().collect();
        accepted.sort();
        added.sort();
        removed.sort();
        let update = GraphUpdate {
            sequence: self.sequence,
            module,
            file: node.file.clone(),
            added,
            removed,
            accepted,
            self_accepting,
        };

        let dep_files: Vec<String> = edges
            .iter()
            .filter_map(|id| self.node(*id))
            .map(|n| n.file.display().to_string())
            .collect();
        tracing::debug!(
            "updated deps for {}: {}",
            update.file.display(),
            dep_files.join(", ")
        );

        Ok(update)
    }

    /// Total number of modules.
    pub fn module_count(&self) -> usize {
        self.inner.node_count()
    }

    /// Total number of edges.
    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    /// Current commit sequence number.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Iterate over all modules.
    pub fn all_modules(&self) -> impl Iterator<Item = &ModuleNode> {
        self.inner
            .node_indices()
            .filter_map(move |idx| self.inner.node_weight(idx))
    }

    /// Iterate over all edges as (source, target, edge) triples.
    pub fn all_edges(&self) -> impl Iterator<Item = (ModuleId, ModuleId, DependencyEdge)> + '_ {
        self.inner.edge_indices().filter_map(move |idx| {
            let (src, tgt) = self.inner.edge_endpoints(idx)?;
            let edge = self.inner.edge_weight(idx)?;
            Some((self.inner[src].id, self.inner[tgt].id, *edge))
        })
    }

    /// Insert a fully-formed module, e.g. when restoring a snapshot.
    pub(crate) fn insert_node(&mut self, node: ModuleNode) {
        let id = node.id;
        let compiled = node.compiled_id.clone();
        let idx = self.inner.add_node(node);
        self.by_id.insert(id, idx);
        if let Some(compiled_id) = compiled {
            self.by_compiled.insert(compiled_id, id);
        }
    }

    pub(crate) fn restore_sequence(&mut self, sequence: u64) {
        self.sequence = sequence;
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared graph state for the build session.
pub type SharedGraph = Arc<RwLock<Graph>>;

/// Graph plus the optional update broadcast channel, handed to everything
/// that mutates the graph during a build session.
#[derive(Clone)]
pub struct GraphHandle {
    graph: SharedGraph,
    update_tx: Option<broadcast::Sender<GraphUpdate>>,
}

impl GraphHandle {
    pub fn new(graph: Graph) -> Self {
        GraphHandle {
            graph: Arc::new(RwLock::new(graph)),
            update_tx: None,
        }
    }

    /// Create a handle that broadcasts a `GraphUpdate` after every commit.
    pub fn with_broadcast(graph: Graph, update_tx: broadcast::Sender<GraphUpdate>) -> Self {
        GraphHandle {
            graph: Arc::new(RwLock::new(graph)),
            update_tx: Some(update_tx),
        }
    }

    pub async fn read(&self) -> RwLockReadGuard<'_, Graph> {
        self.graph.read().await
    }

    pub async fn write(&self) -> RwLockWriteGuard<'_, Graph> {
        self.graph.write().await
    }

    pub fn shared(&self) -> SharedGraph {
        Arc::clone(&self.graph)
    }

    /// Fan an update out to subscribers. It's okay if there are no
    /// receivers - just means no hot-update consumers are connected.
    pub fn broadcast(&self, update: &GraphUpdate) {
        if let Some(tx) = &self.update_tx {
            let _ = tx.send(update.clone());
        }
    }

    pub fn subscribe(&self) -> Option<broadcast::Receiver<GraphUpdate>> {
        self.update_tx.as_ref().map(|tx| tx.subscribe())
    }
}
