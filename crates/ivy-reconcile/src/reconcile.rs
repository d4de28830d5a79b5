//! Edge reconciliation after a compile event

use std::collections::HashSet;
use std::path::PathBuf;

use ivy_graph::{EdgeOrigin, GraphError, GraphHandle, GraphUpdate, ModuleId, normalize};
use ivy_watcher::WatchSink;
use tracing::debug;

use crate::classify::classify;
use crate::compile::CompileRecord;

/// What a reconciliation did.
#[derive(Debug)]
pub enum ReconcileOutcome {
    /// The module's edge set was replaced and the update broadcast.
    Committed(GraphUpdate),
    /// Absent module or nothing to add or remove; the graph was not
    /// touched and no update was emitted.
    Skipped,
}

impl ReconcileOutcome {
    pub fn is_skipped(&self) -> bool {
        matches!(self, ReconcileOutcome::Skipped)
    }

    pub fn update(&self) -> Option<&GraphUpdate> {
        match self {
            ReconcileOutcome::Committed(update) => Some(update),
            ReconcileOutcome::Skipped => None,
        }
    }
}

/// Merge a compile's script dependencies into the unit's script module
/// and register a watch obligation for each of them.
///
/// Watch registration happens for the whole group whether or not the
/// module is tracked yet, matching the additive watch contract.
pub async fn update_script_module(
    record: &CompileRecord,
    handle: &GraphHandle,
    watches: &dyn WatchSink,
) -> Result<ReconcileOutcome, GraphError> {
    let groups = classify(&record.dependencies);
    let module = handle.read().await.lookup_compiled(&record.id);
    let outcome = reconcile(handle, module, &groups.script, None).await?;
    for dep in &groups.script {
        watches.register_watch(dep);
    }
    Ok(outcome)
}

/// Merge a compile's style dependencies into the unit's extracted style
/// module, so edits to `@import`ed css trigger the main import to hot
/// update. Registers a watch obligation per style dependency.
pub async fn update_style_module(
    record: &CompileRecord,
    handle: &GraphHandle,
    watches: &dyn WatchSink,
) -> Result<ReconcileOutcome, GraphError> {
    let groups = classify(&record.dependencies);
    let module = match &record.style_id {
        Some(style_id) => handle.read().await.lookup_compiled(style_id),
        None => None,
    };
    let outcome = reconcile(handle, module, &groups.style, None).await?;
    for dep in &groups.style {
        watches.register_watch(dep);
    }
    Ok(outcome)
}

/// Reconcile a module's outgoing edges with newly discovered
/// dependencies.
///
/// Added identifiers resolve to canonical modules (created as file-only
/// placeholders when unseen). Existing edges survive unless their file
/// appears in `remove`; that filter is the only form of edge deletion.
/// The accepted set only grows: it is the union of the new edges with
/// whatever the module already accepted. Everything lands in one commit,
/// so readers of the shared graph observe the old set or the new set,
/// never a partial one.
///
/// Returns `Skipped` without touching the graph when the module is
/// absent or there is nothing to add or remove.
pub async fn reconcile(
    handle: &GraphHandle,
    module: Option<ModuleId>,
    add: &[PathBuf],
    remove: Option<&[PathBuf]>,
) -> Result<ReconcileOutcome, GraphError> {
    let Some(module) = module else {
        return Ok(ReconcileOutcome::Skipped);
    };
    let removals = remove.unwrap_or(&[]);
    if add.is_empty() && removals.is_empty() {
        return Ok(ReconcileOutcome::Skipped);
    }

    let update = {
        let mut graph = handle.write().await;
        let Some(node) = graph.node(module) else {
            return Ok(ReconcileOutcome::Skipped);
        };
        let prior_accepted = node.accepted_deps.clone();
        let self_accepting = node.is_self_accepting;

        let new_edges: HashSet<ModuleId> = add
            .iter()
            .map(|path| graph.resolve_file_entry(path))
            .collect();

        let removed_files: HashSet<PathBuf> = removals.iter().map(|path| normalize(path)).collect();
        let kept: HashSet<ModuleId> = graph
            .dependencies(module)
            .into_iter()
            .filter(|dep| {
                graph
                    .node(*dep)
                    .is_none_or(|node| !removed_files.contains(&node.file))
            })
            .collect();

        let updated: HashSet<ModuleId> = kept.union(&new_edges).copied().collect();
        let accepted: HashSet<ModuleId> = new_edges.union(&prior_accepted).copied().collect();

        graph.commit_edges(
            module,
            &updated,
            accepted,
            self_accepting,
            EdgeOrigin::Preprocessor,
        )?
    };

    debug!(
        "reconciled {:?}: +{} -{} edges",
        module,
        update.added.len(),
        update.removed.len()
    );
    handle.broadcast(&update);
    Ok(ReconcileOutcome::Committed(update))
}
