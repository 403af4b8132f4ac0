// ── Node collection ──
//
// Concurrent storage for one namespace: O(1) lookups by node id and a
// version counter bumped on every mutation.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::watch;

use crate::model::{Node, NodeId};

pub(crate) struct NodeCollection {
    by_id: DashMap<NodeId, Arc<Node>>,

    /// Version counter, bumped on every mutation.
    version: watch::Sender<u64>,
}

impl NodeCollection {
    pub(crate) fn new() -> Self {
        let (version, _) = watch::channel(0u64);
        Self {
            by_id: DashMap::new(),
            version,
        }
    }

    /// Insert or replace a node. Returns `true` if the id was new.
    pub(crate) fn upsert(&self, node: Node) -> bool {
        let is_new = self.by_id.insert(node.id.clone(), Arc::new(node)).is_none();
        self.bump_version();
        is_new
    }

    /// Remove a node by id. Returns the removed node if it existed.
    pub(crate) fn remove(&self, id: &NodeId) -> Option<Arc<Node>> {
        let removed = self.by_id.remove(id).map(|(_, v)| v);
        if removed.is_some() {
            self.bump_version();
        }
        removed
    }

    pub(crate) fn get(&self, id: &NodeId) -> Option<Arc<Node>> {
        self.by_id.get(id).map(|r| Arc::clone(r.value()))
    }

    pub(crate) fn ids(&self) -> Vec<NodeId> {
        self.by_id.iter().map(|r| r.key().clone()).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.by_id.len()
    }

    pub(crate) fn version(&self) -> u64 {
        *self.version.borrow()
    }

    fn bump_version(&self) {
        self.version.send_modify(|v| *v += 1);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn upsert_returns_true_for_new_id() {
        let col = NodeCollection::new();
        assert!(col.upsert(Node::new(NodeId::from("d1"))));
        assert!(!col.upsert(Node::new(NodeId::from("d1"))));
        assert_eq!(col.len(), 1);
    }

    #[test]
    fn remove_bumps_version_only_when_present() {
        let col = NodeCollection::new();
        col.upsert(Node::new(NodeId::from("d1")));
        let v = col.version();

        assert!(col.remove(&NodeId::from("missing")).is_none());
        assert_eq!(col.version(), v);

        assert!(col.remove(&NodeId::from("d1")).is_some());
        assert_eq!(col.version(), v + 1);
        assert!(col.get(&NodeId::from("d1")).is_none());
    }

    #[test]
    fn ids_lists_every_node() {
        let col = NodeCollection::new();
        col.upsert(Node::new(NodeId::from("a")));
        col.upsert(Node::new(NodeId::from("b")));
        let mut ids = col.ids();
        ids.sort();
        assert_eq!(ids, vec![NodeId::from("a"), NodeId::from("b")]);
    }
}
