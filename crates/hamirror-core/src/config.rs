// ── Runtime engine configuration ──
//
// Describes how the engine is wired up. It never touches disk: the
// config crate (or any embedding service) builds an `EngineConfig` and
// hands it in.

use std::time::Duration;

use crate::model::RecordKind;

/// Configuration for the registry, the reconcile queue and the
/// reference store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Bounded capacity of each logical node's reconcile queue.
    pub queue_capacity: usize,
    /// How long a logical node's worker waits for a job before it exits.
    /// The next submission for that node starts a fresh worker.
    pub worker_idle: Duration,
    /// Capacity of the store's change broadcast channel.
    pub event_capacity: usize,
    /// Record kinds whose descriptors are left out of the registry.
    pub disabled_kinds: Vec<RecordKind>,
}

impl EngineConfig {
    pub fn is_enabled(&self, kind: RecordKind) -> bool {
        !self.disabled_kinds.contains(&kind)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 64,
            worker_idle: Duration::from_secs(60),
            event_capacity: 256,
            disabled_kinds: Vec::new(),
        }
    }
}
