// ── Transactional store contract ──
//
// The engine never owns storage. It queues puts and deletes into a
// transaction handed in by the caller; each transaction is bound to one
// namespace at the type level.

mod collection;
mod memory;

use serde::{Deserialize, Serialize};
use strum::Display;

use crate::error::CoreError;
use crate::model::{Node, NodeId, Record, RecordPath};

pub use memory::{MemoryStore, MemoryTransaction, StoreEvent};

/// The two logically separate namespaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Datastore {
    /// Authoritative configuration.
    Desired,
    /// Device-reported state.
    Observed,
}

/// Type-level namespace marker.
pub trait Namespace: Send + Sync + 'static {
    const DATASTORE: Datastore;
}

/// Marker for the desired (configuration) namespace.
#[derive(Debug)]
pub enum Desired {}

/// Marker for the observed (operational) namespace.
#[derive(Debug)]
pub enum Observed {}

impl Namespace for Desired {
    const DATASTORE: Datastore = Datastore::Desired;
}

impl Namespace for Observed {
    const DATASTORE: Datastore = Datastore::Observed;
}

/// A read-write transaction scoped to namespace `N`.
///
/// Writes are queued; they become visible to other readers only when the
/// owner commits, and never if it drops the transaction. Reads observe the
/// transaction's own queued writes.
pub trait Transaction<N: Namespace> {
    fn read_node(&self, id: &NodeId) -> Result<Option<Node>, CoreError>;

    /// Merge a whole node: lists merge by key, set scalars overwrite.
    fn merge_node(&mut self, node: Node);

    fn put(&mut self, path: RecordPath, record: Record, create_missing_parents: bool);

    fn delete(&mut self, path: RecordPath);

    fn delete_node(&mut self, id: &NodeId);

    fn datastore(&self) -> Datastore {
        N::DATASTORE
    }
}

/// Before/after snapshots of one changed node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeChange {
    pub before: Option<Node>,
    pub after: Option<Node>,
}

impl NodeChange {
    pub fn new(before: Option<Node>, after: Option<Node>) -> Self {
        Self { before, after }
    }

    /// The node id of whichever snapshot is present.
    pub fn node_id(&self) -> Option<&NodeId> {
        self.after
            .as_ref()
            .or(self.before.as_ref())
            .map(|n| &n.id)
    }
}
