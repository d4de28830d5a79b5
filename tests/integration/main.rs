//! Integration tests for Ivy
//!
//! These tests verify that the crates work together correctly.

use std::path::{Path, PathBuf};
use std::process::Command;

use ivy_graph::{Graph, GraphHandle, ModuleKind};
use ivy_reconcile::{CompileRecord, read_records, update_script_module, update_style_module};
use ivy_watcher::WatchRegistry;

/// Test that the CLI can be invoked
#[test]
fn test_cli_invocation() {
    let output = Command::new("cargo")
        .args(["run", "--", "--help"])
        .current_dir(".")
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("ivy"));
    assert!(stdout.contains("module graph"));
}

/// Test that the CLI replays a record file and prints update events
#[test]
fn test_cli_apply_replays_records() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let events = temp_dir.path().join("events.jsonl");
    std::fs::write(
        &events,
        concat!(
            r#"{"id":"/src/main.svelte","style_id":"/src/main.svelte?type=style&lang.css","dependencies":["src/theme.scss","src/util.ts"],"self_accepting":true}"#,
            "\n",
        ),
    )
    .unwrap();

    let output = Command::new("cargo")
        .args([
            "run",
            "--",
            "--root",
            temp_dir.path().to_str().unwrap(),
            "apply",
            "--events",
            events.to_str().unwrap(),
        ])
        .current_dir(".")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"sequence\""), "no update events in: {stdout}");
}

/// Test the full reconciliation flow across crates
#[tokio::test]
async fn test_compile_record_flow() {
    let record = CompileRecord {
        id: "/src/main.svelte".to_string(),
        style_id: Some("/src/main.svelte?type=style&lang.css".to_string()),
        dependencies: vec![PathBuf::from("src/theme.scss"), PathBuf::from("src/util.ts")],
        self_accepting: true,
    };

    let mut graph = Graph::new();
    graph.claim_module(
        Path::new(&record.id),
        &record.id,
        ModuleKind::Script,
        record.self_accepting,
    );
    let style_id = record.style_id.as_deref().unwrap();
    graph.claim_module(Path::new(style_id), style_id, ModuleKind::Style, false);
    let handle = GraphHandle::new(graph);

    let registry = WatchRegistry::new();
    update_script_module(&record, &handle, &registry).await.unwrap();
    update_style_module(&record, &handle, &registry).await.unwrap();

    let graph = handle.read().await;
    let script = graph.lookup_compiled(&record.id).unwrap();
    let style = graph.lookup_compiled(style_id).unwrap();
    let util = graph.lookup_file(Path::new("src/util.ts")).unwrap();
    let theme = graph.lookup_file(Path::new("src/theme.scss")).unwrap();

    assert_eq!(graph.dependencies(script), vec![util]);
    assert_eq!(graph.dependencies(style), vec![theme]);

    // both groups registered their watch obligations
    assert!(registry.is_watched(Path::new("src/util.ts")));
    assert!(registry.is_watched(Path::new("src/theme.scss")));
    assert_eq!(registry.len(), 2);

    // a change to the theme invalidates the style module
    assert!(graph.transitive_dependents(theme).contains(&style));
}

/// Test that a snapshot written by one session restores in the next
#[tokio::test]
async fn test_snapshot_survives_sessions() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let root = temp_dir.path();

    let record = CompileRecord {
        id: "/src/app.svelte".to_string(),
        style_id: None,
        dependencies: vec![PathBuf::from("src/shared.js")],
        self_accepting: false,
    };

    {
        let mut graph = Graph::new();
        graph.claim_module(Path::new(&record.id), &record.id, ModuleKind::Script, false);
        let handle = GraphHandle::new(graph);
        let registry = WatchRegistry::new();
        update_style_module(&record, &handle, &registry).await.unwrap();
        update_script_module(&record, &handle, &registry).await.unwrap();

        ivy_graph::save_snapshot(&*handle.read().await, root).unwrap();
    }

    let restored = ivy_graph::load_snapshot(root).unwrap().expect("snapshot");
    let app = restored.lookup_compiled("/src/app.svelte").unwrap();
    let shared = restored.lookup_file(Path::new("src/shared.js")).unwrap();
    assert_eq!(restored.dependencies(app), vec![shared]);
}

/// Test that record files parse the way the pipeline writes them
#[test]
fn test_record_file_round_trip() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let path = temp_dir.path().join("events.jsonl");

    let record = CompileRecord {
        id: "/src/a.svelte".to_string(),
        style_id: Some("/src/a.svelte?type=style&lang.css".to_string()),
        dependencies: vec![PathBuf::from("x.css")],
        self_accepting: true,
    };
    std::fs::write(&path, format!("{}\n", serde_json::to_string(&record).unwrap())).unwrap();

    let records = read_records(&path).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, record.id);
    assert_eq!(records[0].dependencies, record.dependencies);
}
