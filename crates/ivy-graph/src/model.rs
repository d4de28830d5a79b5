//! Core data structures for the module dependency graph

use std::collections::HashSet;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::path::{Path, PathBuf};

use path_clean::PathClean;
use serde::{Deserialize, Serialize};

/// Unique, stable identifier for a module. Derived from the normalized
/// file path, so the same path always maps to the same id.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct ModuleId(pub u64);

impl ModuleId {
    pub fn from_path(path: &Path) -> Self {
        let mut hasher = DefaultHasher::new();
        normalize(path).hash(&mut hasher);
        ModuleId(hasher.finish())
    }
}

/// Normalize a raw identifier into the canonical path used for module
/// identity. Identity invariants all key off this form.
pub fn normalize(path: &Path) -> PathBuf {
    path.clean()
}

/// File extensions treated as script modules. Preprocessor script
/// dependencies are rare, usually added by markup preprocessors.
pub const SCRIPT_EXTENSIONS: [&str; 4] = ["ts", "js", "html", "pug"];

/// Discriminates which update channel a module belongs to. The partition
/// is binary: anything that is not a known script extension is a style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModuleKind {
    Script,
    Style,
}

impl ModuleKind {
    /// Classify from file extension (the suffix after the final dot of
    /// the last path component).
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if SCRIPT_EXTENSIONS.contains(&ext) => ModuleKind::Script,
            _ => ModuleKind::Style,
        }
    }
}

/// A single module tracked by the graph.
///
/// Placeholder modules carry only a file path; they are created the first
/// time something depends on a file the compiler has not claimed yet, and
/// are upgraded in place (same `ModuleId`) once it does.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModuleNode {
    pub id: ModuleId,
    /// Normalized file path backing this module.
    pub file: PathBuf,
    /// Compiler-assigned id, distinct from the file path. `None` for
    /// placeholder modules.
    pub compiled_id: Option<String>,
    pub kind: ModuleKind,
    /// Targets this module accepts self-contained hot updates for.
    /// Grows monotonically across reconciliations.
    pub accepted_deps: HashSet<ModuleId>,
    pub is_self_accepting: bool,
    pub is_placeholder: bool,
}

impl ModuleNode {
    /// Build a file-only placeholder entry.
    pub fn placeholder(path: &Path) -> Self {
        let file = normalize(path);
        ModuleNode {
            id: ModuleId::from_path(path),
            kind: ModuleKind::from_path(&file),
            file,
            compiled_id: None,
            accepted_deps: HashSet::new(),
            is_self_accepting: false,
            is_placeholder: true,
        }
    }
}

/// How a dependency edge was discovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeOrigin {
    /// Reported by the compiler for the compiled unit itself.
    Compiled,
    /// Discovered by a preprocessor (e.g. an `@import` in extracted css).
    Preprocessor,
}

/// A directed "depends on" edge in the module graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub origin: EdgeOrigin,
}

impl DependencyEdge {
    pub fn new(origin: EdgeOrigin) -> Self {
        DependencyEdge { origin }
    }
}
