// ── Core error types ──
//
// The merge engine itself has no failure modes beyond store reads; the
// remaining variants belong to the reference store and the reconcile
// queue. Configuration errors live in the config crate.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Store errors ─────────────────────────────────────────────────
    #[error("Failed to read node {node} from {datastore}: {reason}")]
    ReadFailed {
        datastore: String,
        node: String,
        reason: String,
    },

    #[error("Parent node missing for {path}")]
    MissingParent { path: String },

    // ── Queue errors ─────────────────────────────────────────────────
    #[error("Reconcile queue for {node} is closed")]
    QueueClosed { node: String },

    #[error("Reconciliation cancelled")]
    Cancelled,

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}
