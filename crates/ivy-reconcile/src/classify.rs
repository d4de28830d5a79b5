//! Dependency classification into update channels

use std::path::PathBuf;

use ivy_graph::ModuleKind;

/// A dependency list split by update channel. Every input lands in
/// exactly one group; there is no unknown bucket.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DepGroups {
    pub script: Vec<PathBuf>,
    pub style: Vec<PathBuf>,
}

/// Partition a flat dependency list into script and style groups by file
/// extension. Pure and stateless; order within each group follows the
/// input.
pub fn classify(dependencies: &[PathBuf]) -> DepGroups {
    let mut groups = DepGroups::default();
    for dep in dependencies {
        match ModuleKind::from_path(dep) {
            ModuleKind::Script => groups.script.push(dep.clone()),
            ModuleKind::Style => groups.style.push(dep.clone()),
        }
    }
    groups
}
