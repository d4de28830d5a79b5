//! CLI command implementations

use std::path::{Path, PathBuf};

use ivy_graph::{EdgeOrigin, GraphHandle, ModuleKind, load_snapshot, save_snapshot};
use ivy_reconcile::{CompileRecord, read_records, update_script_module, update_style_module};
use ivy_watcher::{FileWatcher, WatchRegistry};

pub async fn apply(root: PathBuf, events: PathBuf, snapshot: bool) -> anyhow::Result<()> {
    let (handle, registry, mut update_rx) = replay(&root, &events).await?;

    while let Ok(update) = update_rx.try_recv() {
        println!("{}", serde_json::to_string(&update)?);
    }

    {
        let graph = handle.read().await;
        tracing::info!(
            "graph: {} modules, {} edges, {} watch obligations",
            graph.module_count(),
            graph.edge_count(),
            registry.len()
        );
        if snapshot {
            save_snapshot(&graph, &root)?;
            tracing::info!("snapshot saved under {}", root.display());
        }
    }

    Ok(())
}

pub async fn watch(root: PathBuf, events: PathBuf) -> anyhow::Result<()> {
    let (handle, registry, _update_rx) = replay(&root, &events).await?;

    let mut watcher = FileWatcher::new()?;
    let established = watcher.watch_registry(&registry);
    tracing::info!(
        "watching {} of {} registered dependencies",
        established,
        registry.len()
    );

    while let Some(event) = watcher.event_receiver().recv().await {
        let path = event.path().to_path_buf();
        let graph = handle.read().await;

        let module = graph
            .lookup_file(&path)
            .or_else(|| path.strip_prefix(&root).ok().and_then(|p| graph.lookup_file(p)));
        let Some(module) = module else {
            tracing::debug!("change to untracked file: {}", path.display());
            continue;
        };

        let invalidated: Vec<String> = graph
            .transitive_dependents(module)
            .into_iter()
            .filter_map(|id| graph.node(id))
            .map(|node| node.file.display().to_string())
            .collect();
        tracing::info!(
            "{} changed; would invalidate {} dependents: {}",
            path.display(),
            invalidated.len(),
            invalidated.join(", ")
        );
    }

    Ok(())
}

pub fn clear(root: PathBuf) -> anyhow::Result<()> {
    tracing::info!("clearing snapshot under {}", root.display());
    ivy_graph::clear_snapshot(&root)?;
    tracing::info!("snapshot cleared");
    Ok(())
}

/// Replay every compile record from the events file into a (possibly
/// snapshot-restored) graph.
async fn replay(
    root: &Path,
    events: &Path,
) -> anyhow::Result<(
    GraphHandle,
    WatchRegistry,
    tokio::sync::broadcast::Receiver<ivy_graph::GraphUpdate>,
)> {
    let graph = load_snapshot(root)?.unwrap_or_default();
    let (update_tx, update_rx) = tokio::sync::broadcast::channel(1024);
    let handle = GraphHandle::with_broadcast(graph, update_tx);
    let registry = WatchRegistry::new();

    let records = read_records(events)?;
    tracing::info!("replaying {} compile records from {}", records.len(), events.display());

    for record in &records {
        ingest_record(record, &handle, &registry).await?;
    }

    Ok((handle, registry, update_rx))
}

/// Apply one compile record: claim the unit's modules, then reconcile
/// each classified dependency group into its module.
async fn ingest_record(
    record: &CompileRecord,
    handle: &GraphHandle,
    registry: &WatchRegistry,
) -> anyhow::Result<()> {
    {
        let mut graph = handle.write().await;
        let script = graph.claim_module(
            Path::new(&record.id),
            &record.id,
            ModuleKind::Script,
            record.self_accepting,
        );
        if let Some(style_id) = &record.style_id {
            let style = graph.claim_module(Path::new(style_id), style_id, ModuleKind::Style, false);
            // the compiled unit imports its own extracted style artifact
            graph.link(script, style, EdgeOrigin::Compiled)?;
        }
    }

    update_script_module(record, handle, registry).await?;
    update_style_module(record, handle, registry).await?;
    Ok(())
}
