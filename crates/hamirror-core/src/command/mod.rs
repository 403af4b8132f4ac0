// ── Record-type descriptors and the diff/merge core ──
//
// One `MergeCommand` per record kind supplies container access, key,
// equality and scope transform. Everything else (set difference, key
// difference, add-only merge, differential update) is written once as
// provided trait methods driven by those primitives.

mod aggregator;
mod logical_switches;
mod mcast;
mod switches;
mod termination_point;
mod tunnel;
mod ucast;

use std::collections::HashSet;

use tracing::trace;

use crate::model::{Entry, LocatorRef, NodeId, Record, RecordKind, RecordPath};
use crate::store::{Desired, Namespace, Observed, Transaction};

pub use aggregator::{CommandRegistry, ErasedCommand, MergeCommandsAggregator};
pub use logical_switches::LogicalSwitchesCmd;
pub use mcast::{LocalMcastCmd, RemoteMcastCmd};
pub use switches::SwitchesCmd;
pub use termination_point::TerminationPointCmd;
pub use tunnel::TunnelCmd;
pub use ucast::{LocalUcastCmd, RemoteUcastCmd};

// ── Null-safe helpers ───────────────────────────────────────────────

pub fn is_empty<T>(list: Option<&[T]>) -> bool {
    list.is_none_or(<[T]>::is_empty)
}

/// Both empty (or absent), or both non-empty with the same length.
pub fn same_size<T, U>(a: Option<&[T]>, b: Option<&[U]>) -> bool {
    match (is_empty(a), is_empty(b)) {
        (true, true) => true,
        (false, false) => a.map_or(0, <[T]>::len) == b.map_or(0, <[U]>::len),
        _ => false,
    }
}

/// Elements of `a` for which no element of `b` satisfies `eq(a, b)`.
pub fn diff_of<T: Clone>(a: &[T], b: &[T], eq: impl Fn(&T, &T) -> bool) -> Vec<T> {
    a.iter()
        .filter(|x| !b.iter().any(|y| eq(x, y)))
        .cloned()
        .collect()
}

/// Locator set members compare by termination point id only.
pub fn locator_eq(updated: &LocatorRef, orig: &LocatorRef) -> bool {
    updated.tp_id == orig.tp_id
}

/// Locator sets are equal when they hold the same termination points.
pub fn locator_sets_equal(updated: &[LocatorRef], orig: &[LocatorRef]) -> bool {
    same_size(Some(updated), Some(orig))
        && diff_of(updated, orig, locator_eq).is_empty()
        && diff_of(orig, updated, locator_eq).is_empty()
}

/// Puts and deletes queued by one differential update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub added: usize,
    pub removed: usize,
}

impl MergeStats {
    pub fn is_empty(&self) -> bool {
        self.added == 0 && self.removed == 0
    }
}

impl std::ops::AddAssign for MergeStats {
    fn add_assign(&mut self, rhs: Self) {
        self.added += rhs.added;
        self.removed += rhs.removed;
    }
}

// ── Descriptor contract ─────────────────────────────────────────────

/// Strategy object for one kind of mirrored record.
pub trait MergeCommand: Send + Sync + 'static {
    type Item: Entry;
    type Container: Send + Sync;

    fn kind(&self) -> RecordKind;

    /// Diagnostic label.
    fn description(&self) -> &'static str;

    /// This kind's list inside `container`; empty when the container is absent.
    fn get_data<'a>(&self, container: Option<&'a Self::Container>) -> &'a [Self::Item];

    /// Replace this kind's list inside `container`.
    fn set_data(&self, container: &mut Self::Container, data: Vec<Self::Item>);

    /// Identifier of `item` once copied into `dest`.
    fn generate_id(&self, dest: &NodeId, item: &Self::Item) -> RecordPath;

    /// Copy of `item` with every reference rewritten into `dest` and a
    /// freshly derived identity.
    fn transform(&self, dest: &NodeId, item: &Self::Item) -> Self::Item;

    /// Payload equality, identity excluded.
    fn are_equal(&self, updated: &Self::Item, orig: &Self::Item) -> bool;

    fn without_uuid(&self, item: &Self::Item) -> Self::Item;

    /// Wrap an item for the store.
    fn record(&self, item: Self::Item) -> Record;

    fn key(&self, item: &Self::Item) -> <Self::Item as Entry>::Key {
        item.key()
    }

    // ── Diff core ────────────────────────────────────────────────────

    fn diff_of(&self, a: &[Self::Item], b: &[Self::Item]) -> Vec<Self::Item> {
        diff_of(a, b, |x, y| self.are_equal(x, y))
    }

    /// Elements of `updated` whose key is absent from `original`. Payload
    /// differences are ignored.
    fn diff_by_key(&self, updated: &[Self::Item], original: &[Self::Item]) -> Vec<Self::Item> {
        let keys: HashSet<_> = original.iter().map(|o| self.key(o)).collect();
        updated
            .iter()
            .filter(|u| !keys.contains(&self.key(u)))
            .cloned()
            .collect()
    }

    fn transform_all(&self, dest: &NodeId, items: &[Self::Item]) -> Vec<Self::Item> {
        items.iter().map(|i| self.transform(dest, i)).collect()
    }

    /// Add-only union: transformed copies of the `src` records not already
    /// present in `existing`.
    fn transform_op_data(
        &self,
        existing: &[Self::Item],
        src: &[Self::Item],
        dest: &NodeId,
    ) -> Vec<Self::Item> {
        if src.is_empty() {
            return Vec::new();
        }
        let added = self.diff_of(src, existing);
        self.transform_all(dest, &added)
    }

    /// Authoritative copy of every `updated_src` record.
    fn transform_config_data(&self, updated_src: &[Self::Item], dest: &NodeId) -> Vec<Self::Item> {
        self.transform_all(dest, updated_src)
    }

    /// Queue the puts and deletes that carry an `orig -> updated` change of
    /// the source into `dest`.
    ///
    /// Only records absent from `existing` are written. A record whose key
    /// left the source is deleted only if `existing` still holds that key,
    /// so a sibling's contribution or a never-copied entry is left alone.
    fn transform_update<N, T>(
        &self,
        existing: &[Self::Item],
        updated: &[Self::Item],
        orig: &[Self::Item],
        dest: &NodeId,
        tx: &mut T,
    ) -> MergeStats
    where
        N: Namespace,
        T: Transaction<N> + ?Sized,
    {
        let mut stats = MergeStats::default();

        let added = self.diff_of(&self.diff_of(updated, orig), existing);
        for item in &added {
            let path = self.generate_id(dest, item);
            let transformed = self.transform(dest, item);
            trace!(kind = self.description(), node = %path.node, key = %path.key, "adding");
            tx.put(path, self.record(transformed), true);
            stats.added += 1;
        }

        let removed = self.transform_all(dest, &self.diff_by_key(orig, updated));
        let skip = self.diff_by_key(&removed, existing);
        for item in self.diff_by_key(&removed, &skip) {
            let path = self.generate_id(dest, &item);
            trace!(kind = self.description(), node = %path.node, key = %path.key, "removing");
            tx.delete(path);
            stats.removed += 1;
        }

        stats
    }

    // ── Container-level merges ───────────────────────────────────────

    /// Fill `dst` with the `src` records missing from `existing_dst`.
    fn merge_operational_data(
        &self,
        dst: &mut Self::Container,
        existing_dst: Option<&Self::Container>,
        src: Option<&Self::Container>,
        dest: &NodeId,
    ) -> usize {
        let data = self.transform_op_data(self.get_data(existing_dst), self.get_data(src), dest);
        let merged = data.len();
        if merged > 0 {
            trace!(kind = self.description(), node = %dest, size = merged, "merging op");
        }
        self.set_data(dst, data);
        merged
    }

    /// Fill `dst` with every `src` record.
    fn merge_config_data(
        &self,
        dst: &mut Self::Container,
        src: Option<&Self::Container>,
        dest: &NodeId,
    ) -> usize {
        let data = self.transform_config_data(self.get_data(src), dest);
        let copied = data.len();
        if copied > 0 {
            trace!(kind = self.description(), node = %dest, size = copied, "copying config");
        }
        self.set_data(dst, data);
        copied
    }

    fn merge_op_update(
        &self,
        orig_dst: Option<&Self::Container>,
        updated_src: Option<&Self::Container>,
        orig_src: Option<&Self::Container>,
        dest: &NodeId,
        tx: &mut dyn Transaction<Observed>,
    ) -> MergeStats {
        self.transform_update::<Observed, _>(
            self.get_data(orig_dst),
            self.get_data(updated_src),
            self.get_data(orig_src),
            dest,
            tx,
        )
    }

    fn merge_config_update(
        &self,
        existing_dst: Option<&Self::Container>,
        updated_src: Option<&Self::Container>,
        orig_src: Option<&Self::Container>,
        dest: &NodeId,
        tx: &mut dyn Transaction<Desired>,
    ) -> MergeStats {
        self.transform_update::<Desired, _>(
            self.get_data(existing_dst),
            self.get_data(updated_src),
            self.get_data(orig_src),
            dest,
            tx,
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    // No glob: `ErasedCommand` would make descriptor calls ambiguous.
    use super::{LocalUcastCmd, MergeCommand, MergeStats, is_empty, locator_sets_equal, same_size};
    use crate::model::{
        GlobalAugmentation, LocatorRef, LogicalSwitchRef, MacAddress, Node, NodeId, TpId,
        UcastMac, derive_identity,
    };
    use crate::store::MemoryStore;
    use proptest::prelude::*;

    fn mac(node: &str, addr: u8, tep: &str) -> UcastMac {
        let node = NodeId::from(node);
        UcastMac::new(
            MacAddress::new(format!("00:00:00:00:00:{addr:02x}")),
            LogicalSwitchRef::new(node.clone(), "ls1"),
        )
        .with_locator(LocatorRef::new(node, TpId::from(tep)))
        .with_uuid(derive_identity(&format!("device-local-{addr}")))
    }

    fn global(macs: Vec<UcastMac>) -> GlobalAugmentation {
        GlobalAugmentation {
            local_ucast_macs: macs,
            ..GlobalAugmentation::default()
        }
    }

    #[test]
    fn null_safe_helpers() {
        let empty: &[u8] = &[];
        assert!(is_empty::<u8>(None));
        assert!(is_empty(Some(empty)));
        assert!(same_size::<u8, u8>(None, Some(empty)));
        assert!(same_size(Some(&[1u8][..]), Some(&[2u8][..])));
        assert!(!same_size(Some(&[1u8][..]), None::<&[u8]>));
    }

    #[test]
    fn locator_sets_compare_by_tp_id_as_sets() {
        let a = LocatorRef::new(NodeId::from("d1"), TpId::from("vxlan_over_ipv4:1.1.1.1"));
        let b = LocatorRef::new(NodeId::from("ha1"), TpId::from("vxlan_over_ipv4:2.2.2.2"));
        let a_in_ha = crate::model::rewrite(&NodeId::from("ha1"), &a);
        assert!(locator_sets_equal(
            &[a.clone(), b.clone()],
            &[b.clone(), a_in_ha]
        ));
        assert!(!locator_sets_equal(&[a.clone()], &[a, b]));
    }

    #[test]
    fn transform_op_data_is_idempotent() {
        let cmd = LocalUcastCmd;
        let dest = NodeId::from("ha1");
        let src = vec![
            mac("d1", 1, "vxlan_over_ipv4:1.1.1.1"),
            mac("d1", 2, "vxlan_over_ipv4:1.1.1.1"),
        ];

        let first = cmd.transform_op_data(&[], &src, &dest);
        assert_eq!(first.len(), 2);
        assert!(cmd.transform_op_data(&first, &src, &dest).is_empty());
    }

    #[test]
    fn merge_operational_data_writes_nothing_on_rerun() {
        let cmd = LocalUcastCmd;
        let dest = NodeId::from("ha1");
        let src = global(vec![mac("d1", 1, "vxlan_over_ipv4:1.1.1.1")]);

        let mut dst = GlobalAugmentation::default();
        assert_eq!(cmd.merge_operational_data(&mut dst, None, Some(&src), &dest), 1);

        let existing = dst.clone();
        let mut again = GlobalAugmentation::default();
        assert_eq!(
            cmd.merge_operational_data(&mut again, Some(&existing), Some(&src), &dest),
            0
        );
        assert!(again.local_ucast_macs.is_empty());
    }

    #[test]
    fn transform_update_deletes_only_what_destination_holds() {
        let cmd = LocalUcastCmd;
        let store = MemoryStore::default();
        let dest = NodeId::from("ha1");
        let x = mac("d1", 1, "vxlan_over_ipv4:1.1.1.1");
        let y = mac("d1", 2, "vxlan_over_ipv4:1.1.1.1");
        let z = mac("d1", 3, "vxlan_over_ipv4:1.1.1.1");

        // Destination holds X' only; Y and Z both leave the source.
        let existing = cmd.transform_all(&dest, &[x.clone()]);
        let mut tx = store.begin_observed();
        let stats = cmd.transform_update(
            &existing,
            &[x.clone()],
            &[x, y.clone(), z],
            &dest,
            &mut tx,
        );
        assert_eq!(stats, MergeStats { added: 0, removed: 0 });

        let existing = cmd.transform_all(&dest, &[y.clone()]);
        let mut tx = store.begin_observed();
        let stats = cmd.transform_update(&existing, &[], &[y.clone()], &dest, &mut tx);
        assert_eq!(stats.removed, 1);
        assert_eq!(tx.deletes()[0], &cmd.generate_id(&dest, &y));
    }

    #[test]
    fn moved_mac_is_resynced() {
        let cmd = LocalUcastCmd;
        let store = MemoryStore::default();
        let dest = NodeId::from("ha1");
        let before = mac("d1", 1, "vxlan_over_ipv4:1.1.1.1");
        let after = mac("d1", 1, "vxlan_over_ipv4:9.9.9.9");

        let existing = cmd.transform_all(&dest, &[before.clone()]);
        let mut tx = store.begin_observed();
        let stats = cmd.transform_update(&existing, &[after], &[before], &dest, &mut tx);
        assert_eq!(stats, MergeStats { added: 1, removed: 0 });
    }

    #[test]
    fn merge_op_update_goes_through_containers() {
        let cmd = LocalUcastCmd;
        let store = MemoryStore::default();
        let dest = NodeId::from("ha1");
        let updated = global(vec![mac("d1", 1, "vxlan_over_ipv4:1.1.1.1")]);

        let mut tx = store.begin_observed();
        let stats = cmd.merge_op_update(None, Some(&updated), None, &dest, &mut tx);
        assert_eq!(stats.added, 1);
        tx.commit().unwrap();

        let node: Node = store
            .read(crate::store::Datastore::Observed, &dest)
            .unwrap();
        let stored = &node.global.unwrap().local_ucast_macs[0];
        assert_eq!(stored.logical_switch.node, dest);
    }

    // ── Properties ───────────────────────────────────────────────────

    fn arb_macs() -> impl Strategy<Value = Vec<UcastMac>> {
        prop::collection::vec((0u8..8, 0u8..3, prop::bool::ANY), 0..8).prop_map(|picks| {
            picks
                .into_iter()
                .map(|(addr, tep, in_ha)| {
                    let node = if in_ha { "ha1" } else { "d1" };
                    mac(node, addr, &format!("vxlan_over_ipv4:10.0.0.{tep}"))
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn diff_of_is_subset_without_equal_elements(a in arb_macs(), b in arb_macs()) {
            let cmd = LocalUcastCmd;
            let diff = cmd.diff_of(&a, &b);
            for d in &diff {
                prop_assert!(a.contains(d));
                prop_assert!(!b.iter().any(|x| cmd.are_equal(d, x)));
            }
        }

        #[test]
        fn diff_by_key_keys_are_absent_from_original(a in arb_macs(), b in arb_macs()) {
            let cmd = LocalUcastCmd;
            let keys: Vec<_> = b.iter().map(|x| cmd.key(x)).collect();
            for d in cmd.diff_by_key(&a, &b) {
                prop_assert!(!keys.contains(&cmd.key(&d)));
            }
        }

        #[test]
        fn transform_is_stable_on_key(a in arb_macs()) {
            let cmd = LocalUcastCmd;
            let dest = NodeId::from("ha1");
            for m in &a {
                let once = cmd.transform(&dest, m);
                let twice = cmd.transform(&dest, m);
                prop_assert_eq!(cmd.key(&once), cmd.key(&twice));
                prop_assert_eq!(cmd.key(&once), cmd.key(m));
            }
        }

        #[test]
        fn no_orphan_delete(
            existing in arb_macs(),
            updated in arb_macs(),
            orig in arb_macs(),
        ) {
            let cmd = LocalUcastCmd;
            let store = MemoryStore::default();
            let dest = NodeId::from("ha1");
            let existing = cmd.transform_all(&dest, &existing);
            let existing_keys: Vec<_> = existing.iter().map(|x| cmd.key(x)).collect();

            let mut tx = store.begin_observed();
            cmd.transform_update(&existing, &updated, &orig, &dest, &mut tx);

            for path in tx.deletes() {
                let crate::model::RecordKey::LocalUcastMac(key) = &path.key else {
                    panic!("unexpected key kind {path}");
                };
                prop_assert!(existing_keys.contains(key));
                prop_assert!(!updated.iter().any(|u| &cmd.key(u) == key));
            }
        }
    }
}
