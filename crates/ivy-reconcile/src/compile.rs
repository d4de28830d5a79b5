//! Compile records handed over by the external compile pipeline

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// What one compile of a source unit produced, as far as the graph is
/// concerned: the compiled unit's id, the id of its extracted style
/// artifact (if the preprocessor emitted one), and the dependency files
/// the preprocessor discovered, in discovery order.
///
/// Ids are path-like; the id string doubles as the (virtual) file path
/// backing the module.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompileRecord {
    pub id: String,
    #[serde(default)]
    pub style_id: Option<String>,
    #[serde(default)]
    pub dependencies: Vec<PathBuf>,
    /// Whether the compiled unit accepts its own hot updates.
    #[serde(default)]
    pub self_accepting: bool,
}

/// Read a JSONL stream of compile records, one per line. Blank lines are
/// skipped.
pub fn read_records(path: &Path) -> Result<Vec<CompileRecord>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read compile records from {}", path.display()))?;

    let mut records = Vec::new();
    for (lineno, line) in raw.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let record: CompileRecord = serde_json::from_str(line)
            .with_context(|| format!("malformed compile record at {}:{}", path.display(), lineno + 1))?;
        records.push(record);
    }
    Ok(records)
}
