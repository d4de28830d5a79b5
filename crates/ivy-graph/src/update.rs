//! Update events broadcast after each committed reconciliation

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::model::ModuleId;

/// Describes one committed edge-set replacement. Broadcast to hot-update
/// consumers so they can propagate invalidations to dependents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphUpdate {
    /// Monotonically increasing commit sequence number.
    pub sequence: u64,
    /// The module whose edge set was replaced.
    pub module: ModuleId,
    /// File path backing the module.
    pub file: PathBuf,
    /// Edge targets added by this commit.
    pub added: Vec<ModuleId>,
    /// Edge targets removed by this commit.
    pub removed: Vec<ModuleId>,
    /// Full accepted-edge set after the commit.
    pub accepted: Vec<ModuleId>,
    pub self_accepting: bool,
}

impl GraphUpdate {
    /// Check if this update changed the edge set at all.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}
