//! Ivy Reconcile — edge reconciliation for recompiled units

pub mod classify;
pub mod compile;
pub mod reconcile;


pub use classify::{DepGroups, classify};
pub use compile::{CompileRecord, read_records};
pub use reconcile::{ReconcileOutcome, reconcile, update_script_module, update_style_module};
