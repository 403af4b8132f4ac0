// ── In-memory reference store ──
//
// Two node collections (desired / observed) behind namespace-typed
// transactions. Commits are all-or-nothing and publish one StoreEvent per
// changed node on a broadcast channel, which is what a change listener
// turns into orchestrator calls.

use std::marker::PhantomData;
use std::sync::{Arc, Mutex};

use indexmap::IndexSet;
use tokio::sync::broadcast;
use tracing::{debug, trace};

use super::collection::NodeCollection;
use super::{Datastore, Desired, Namespace, NodeChange, Observed, Transaction};
use crate::config::EngineConfig;
use crate::error::CoreError;
use crate::model::{Node, NodeId, Record, RecordPath};

/// A committed change to one node.
#[derive(Debug, Clone)]
pub struct StoreEvent {
    pub datastore: Datastore,
    pub node: NodeId,
    pub change: NodeChange,
}

/// Dashmap-backed store with desired and observed namespaces.
pub struct MemoryStore {
    desired: NodeCollection,
    observed: NodeCollection,
    events: broadcast::Sender<Arc<StoreEvent>>,
    /// Serializes commits so a commit's node writes are never interleaved.
    commit_lock: Mutex<()>,
}

impl MemoryStore {
    pub fn new(config: &EngineConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity);
        Self {
            desired: NodeCollection::new(),
            observed: NodeCollection::new(),
            events,
            commit_lock: Mutex::new(()),
        }
    }

    /// Open a transaction against namespace `N`.
    pub fn begin<N: Namespace>(&self) -> MemoryTransaction<'_, N> {
        MemoryTransaction {
            store: self,
            ops: Vec::new(),
            _namespace: PhantomData,
        }
    }

    pub fn begin_desired(&self) -> MemoryTransaction<'_, Desired> {
        self.begin()
    }

    pub fn begin_observed(&self) -> MemoryTransaction<'_, Observed> {
        self.begin()
    }

    /// Committed state of a node.
    pub fn read(&self, datastore: Datastore, id: &NodeId) -> Option<Node> {
        self.collection(datastore).get(id).map(|n| (*n).clone())
    }

    pub fn node_ids(&self, datastore: Datastore) -> Vec<NodeId> {
        self.collection(datastore).ids()
    }

    pub fn node_count(&self, datastore: Datastore) -> usize {
        self.collection(datastore).len()
    }

    /// Mutation counter of a namespace.
    pub fn version(&self, datastore: Datastore) -> u64 {
        self.collection(datastore).version()
    }

    /// Subscribe to committed node changes.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<StoreEvent>> {
        self.events.subscribe()
    }

    fn collection(&self, datastore: Datastore) -> &NodeCollection {
        match datastore {
            Datastore::Desired => &self.desired,
            Datastore::Observed => &self.observed,
        }
    }

    fn commit_ops(&self, datastore: Datastore, ops: &[Op]) -> Result<usize, CoreError> {
        let _guard = self
            .commit_lock
            .lock()
            .map_err(|_| CoreError::Internal("store commit lock poisoned".into()))?;
        let collection = self.collection(datastore);

        let touched: IndexSet<NodeId> = ops.iter().map(|op| op.node_id().clone()).collect();

        // Compute every result first so a failing op leaves the store untouched.
        let mut results = Vec::with_capacity(touched.len());
        for id in touched {
            let before = collection.get(&id).map(|n| (*n).clone());
            let mut after = before.clone();
            for op in ops.iter().filter(|op| op.node_id() == &id) {
                op.apply(&id, &mut after)?;
            }
            results.push((id, before, after));
        }

        let mut changed = 0;
        for (id, before, after) in results {
            if before == after {
                continue;
            }
            match &after {
                Some(node) => {
                    collection.upsert(node.clone());
                }
                None => {
                    collection.remove(&id);
                }
            }
            changed += 1;
            trace!(%datastore, node = %id, "node committed");
            let _ = self.events.send(Arc::new(StoreEvent {
                datastore,
                node: id,
                change: NodeChange::new(before, after),
            }));
        }

        debug!(%datastore, ops = ops.len(), nodes = changed, "transaction committed");
        Ok(ops.len())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

// ── Queued operations ───────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Op {
    Merge(Node),
    Put {
        path: RecordPath,
        record: Record,
        create_missing_parents: bool,
    },
    Delete(RecordPath),
    DeleteNode(NodeId),
}

impl Op {
    fn node_id(&self) -> &NodeId {
        match self {
            Self::Merge(node) => &node.id,
            Self::Put { path, .. } | Self::Delete(path) => &path.node,
            Self::DeleteNode(id) => id,
        }
    }

    fn apply(&self, id: &NodeId, node: &mut Option<Node>) -> Result<(), CoreError> {
        match self {
            Self::Merge(incoming) => {
                node.get_or_insert_with(|| Node::new(id.clone()))
                    .merge_from(incoming.clone());
            }
            Self::Put {
                path,
                record,
                create_missing_parents,
            } => {
                if node.is_none() && !create_missing_parents {
                    return Err(CoreError::MissingParent {
                        path: path.to_string(),
                    });
                }
                node.get_or_insert_with(|| Node::new(id.clone()))
                    .upsert(record.clone());
            }
            Self::Delete(path) => {
                if let Some(n) = node.as_mut() {
                    n.remove(&path.key);
                }
            }
            Self::DeleteNode(_) => *node = None,
        }
        Ok(())
    }
}

// ── Transactions ────────────────────────────────────────────────────

/// Transaction over a [`MemoryStore`]. Dropping it without
/// [`commit()`](Self::commit) discards every queued write.
pub struct MemoryTransaction<'a, N: Namespace> {
    store: &'a MemoryStore,
    ops: Vec<Op>,
    _namespace: PhantomData<N>,
}

impl<N: Namespace> MemoryTransaction<'_, N> {
    /// Apply every queued write atomically. Returns the number of operations.
    pub fn commit(self) -> Result<usize, CoreError> {
        self.store.commit_ops(N::DATASTORE, &self.ops)
    }

    pub fn pending(&self) -> usize {
        self.ops.len()
    }

    /// Queued record puts, in order.
    pub fn puts(&self) -> Vec<(&RecordPath, &Record)> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::Put { path, record, .. } => Some((path, record)),
                _ => None,
            })
            .collect()
    }

    /// Queued record deletes, in order.
    pub fn deletes(&self) -> Vec<&RecordPath> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::Delete(path) => Some(path),
                _ => None,
            })
            .collect()
    }
}

impl<N: Namespace> Transaction<N> for MemoryTransaction<'_, N> {
    fn read_node(&self, id: &NodeId) -> Result<Option<Node>, CoreError> {
        let mut node = self.store.read(N::DATASTORE, id);
        for op in self.ops.iter().filter(|op| op.node_id() == id) {
            // A parentless put only fails at commit; reads just skip it.
            let _ = op.apply(id, &mut node);
        }
        Ok(node)
    }

    fn merge_node(&mut self, node: Node) {
        self.ops.push(Op::Merge(node));
    }

    fn put(&mut self, path: RecordPath, record: Record, create_missing_parents: bool) {
        self.ops.push(Op::Put {
            path,
            record,
            create_missing_parents,
        });
    }

    fn delete(&mut self, path: RecordPath) {
        self.ops.push(Op::Delete(path));
    }

    fn delete_node(&mut self, id: &NodeId) {
        self.ops.push(Op::DeleteNode(id.clone()));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{GlobalAugmentation, LogicalSwitch, RecordKey};

    fn ls_path(node: &str, name: &str) -> RecordPath {
        RecordPath::new(NodeId::from(node), RecordKey::LogicalSwitch(name.into()))
    }

    #[test]
    fn dropped_transaction_changes_nothing() {
        let store = MemoryStore::default();
        {
            let mut tx = store.begin_desired();
            tx.put(
                ls_path("ha1", "ls1"),
                Record::LogicalSwitch(LogicalSwitch::new("ls1")),
                true,
            );
            assert_eq!(tx.pending(), 1);
        }
        assert!(store.read(Datastore::Desired, &NodeId::from("ha1")).is_none());
    }

    #[test]
    fn reads_see_own_writes() {
        let store = MemoryStore::default();
        let mut tx = store.begin_observed();
        tx.put(
            ls_path("ha1", "ls1"),
            Record::LogicalSwitch(LogicalSwitch::new("ls1")),
            true,
        );
        let node = tx.read_node(&NodeId::from("ha1")).unwrap().unwrap();
        assert_eq!(node.record_count(), 1);
        assert!(store.read(Datastore::Observed, &NodeId::from("ha1")).is_none());
    }

    #[test]
    fn put_without_parent_fails_whole_commit() {
        let store = MemoryStore::default();
        let mut tx = store.begin_desired();
        tx.merge_node(Node::new(NodeId::from("d1")));
        tx.put(
            ls_path("ha1", "ls1"),
            Record::LogicalSwitch(LogicalSwitch::new("ls1")),
            false,
        );
        let err = tx.commit().unwrap_err();
        assert!(matches!(err, CoreError::MissingParent { .. }));
        assert_eq!(store.node_count(Datastore::Desired), 0);
    }

    #[test]
    fn commit_publishes_before_and_after() {
        let store = MemoryStore::default();
        let mut rx = store.subscribe();

        let mut tx = store.begin_observed();
        tx.merge_node(Node::new(NodeId::from("d1")).with_global(GlobalAugmentation {
            logical_switches: vec![LogicalSwitch::new("ls1")],
            ..GlobalAugmentation::default()
        }));
        tx.commit().unwrap();

        let event = rx.try_recv().unwrap();
        assert_eq!(event.datastore, Datastore::Observed);
        assert_eq!(event.node, NodeId::from("d1"));
        assert!(event.change.before.is_none());
        assert_eq!(event.change.after.as_ref().unwrap().record_count(), 1);
    }

    #[test]
    fn delete_and_delete_node() {
        let store = MemoryStore::default();
        let mut tx = store.begin_desired();
        tx.put(
            ls_path("ha1", "ls1"),
            Record::LogicalSwitch(LogicalSwitch::new("ls1")),
            true,
        );
        tx.merge_node(Node::new(NodeId::from("d1")));
        tx.commit().unwrap();

        let mut tx = store.begin_desired();
        tx.delete(ls_path("ha1", "ls1"));
        tx.delete_node(&NodeId::from("d1"));
        assert_eq!(tx.deletes().len(), 1);
        tx.commit().unwrap();

        let ha = store.read(Datastore::Desired, &NodeId::from("ha1")).unwrap();
        assert_eq!(ha.record_count(), 0);
        assert!(store.read(Datastore::Desired, &NodeId::from("d1")).is_none());
    }

    #[test]
    fn unchanged_commit_emits_no_event() {
        let store = MemoryStore::default();
        let mut tx = store.begin_desired();
        tx.merge_node(Node::new(NodeId::from("d1")));
        tx.commit().unwrap();
        let version = store.version(Datastore::Desired);

        let mut rx = store.subscribe();
        let mut tx = store.begin_desired();
        tx.merge_node(Node::new(NodeId::from("d1")));
        tx.commit().unwrap();

        assert!(rx.try_recv().is_err());
        assert_eq!(store.version(Datastore::Desired), version);
    }
}
