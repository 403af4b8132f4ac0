// ── HA lifecycle orchestration ──
//
// Entry points a change listener calls when a device attaches to, or
// changes under, its HA parent. Each composes puts and deletes into the
// transaction it is handed; none of them commits.

mod config_updated;
mod handler;
mod node_connected;
mod op_updated;

pub use handler::{HaEventHandler, HaSyncState, PriorParentConfig};
