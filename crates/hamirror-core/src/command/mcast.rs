// Multicast MACs carry a locator set instead of a single locator. Set
// members compare by termination point id, order-insensitive.

use super::{MergeCommand, locator_sets_equal};
use crate::model::{
    Entry, GlobalAugmentation, McastMac, NodeId, Record, RecordKey, RecordKind, RecordPath,
    derive_identity, rewrite,
};

fn transform_mcast(dest: &NodeId, item: &McastMac) -> McastMac {
    let dest = dest.global();
    McastMac {
        mac: item.mac.clone(),
        logical_switch: rewrite(&dest, &item.logical_switch),
        locator_set: item.locator_set.iter().map(|l| rewrite(&dest, l)).collect(),
        ip_addr: item.ip_addr,
        mac_entry_uuid: Some(derive_identity(&item.key().seed())),
    }
}

fn mcast_equal(updated: &McastMac, orig: &McastMac) -> bool {
    updated.mac == orig.mac
        && updated.logical_switch.name == orig.logical_switch.name
        && updated.ip_addr == orig.ip_addr
        && locator_sets_equal(&updated.locator_set, &orig.locator_set)
}

fn without_uuid(item: &McastMac) -> McastMac {
    McastMac {
        mac_entry_uuid: None,
        ..item.clone()
    }
}

/// Multicast entries learned locally.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalMcastCmd;

impl MergeCommand for LocalMcastCmd {
    type Item = McastMac;
    type Container = GlobalAugmentation;

    fn kind(&self) -> RecordKind {
        RecordKind::LocalMcastMac
    }

    fn description(&self) -> &'static str {
        "LocalMcastMacs"
    }

    fn get_data<'a>(&self, container: Option<&'a GlobalAugmentation>) -> &'a [McastMac] {
        container
            .map(|c| c.local_mcast_macs.as_slice())
            .unwrap_or_default()
    }

    fn set_data(&self, container: &mut GlobalAugmentation, data: Vec<McastMac>) {
        container.local_mcast_macs = data;
    }

    fn generate_id(&self, dest: &NodeId, item: &McastMac) -> RecordPath {
        RecordPath::new(dest.global(), RecordKey::LocalMcastMac(item.key()))
    }

    fn transform(&self, dest: &NodeId, item: &McastMac) -> McastMac {
        transform_mcast(dest, item)
    }

    fn are_equal(&self, updated: &McastMac, orig: &McastMac) -> bool {
        mcast_equal(updated, orig)
    }

    fn without_uuid(&self, item: &McastMac) -> McastMac {
        without_uuid(item)
    }

    fn record(&self, item: McastMac) -> Record {
        Record::LocalMcastMac(item)
    }
}

/// Multicast entries pointing at remote replication locators.
#[derive(Debug, Clone, Copy, Default)]
pub struct RemoteMcastCmd;

impl MergeCommand for RemoteMcastCmd {
    type Item = McastMac;
    type Container = GlobalAugmentation;

    fn kind(&self) -> RecordKind {
        RecordKind::RemoteMcastMac
    }

    fn description(&self) -> &'static str {
        "RemoteMcastMacs"
    }

    fn get_data<'a>(&self, container: Option<&'a GlobalAugmentation>) -> &'a [McastMac] {
        container
            .map(|c| c.remote_mcast_macs.as_slice())
            .unwrap_or_default()
    }

    fn set_data(&self, container: &mut GlobalAugmentation, data: Vec<McastMac>) {
        container.remote_mcast_macs = data;
    }

    fn generate_id(&self, dest: &NodeId, item: &McastMac) -> RecordPath {
        RecordPath::new(dest.global(), RecordKey::RemoteMcastMac(item.key()))
    }

    fn transform(&self, dest: &NodeId, item: &McastMac) -> McastMac {
        transform_mcast(dest, item)
    }

    fn are_equal(&self, updated: &McastMac, orig: &McastMac) -> bool {
        mcast_equal(updated, orig)
    }

    fn without_uuid(&self, item: &McastMac) -> McastMac {
        without_uuid(item)
    }

    fn record(&self, item: McastMac) -> Record {
        Record::RemoteMcastMac(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LocatorRef, LogicalSwitchRef, MacAddress, TpId};

    fn locator(node: &str, ip: &str) -> LocatorRef {
        LocatorRef::new(NodeId::from(node), TpId::from(format!("vxlan_over_ipv4:{ip}").as_str()))
    }

    fn unknown_dst(node: &str, locators: Vec<LocatorRef>) -> McastMac {
        McastMac::new(
            MacAddress::unknown_dst(),
            LogicalSwitchRef::new(NodeId::from(node), "ls1"),
        )
        .with_locators(locators)
    }

    #[test]
    fn reordered_locator_set_is_equal() {
        let cmd = RemoteMcastCmd;
        let a = unknown_dst("d1", vec![locator("d1", "1.1.1.1"), locator("d1", "2.2.2.2")]);
        let b = unknown_dst("ha1", vec![locator("ha1", "2.2.2.2"), locator("ha1", "1.1.1.1")]);
        assert!(cmd.are_equal(&a, &b));
    }

    #[test]
    fn grown_locator_set_is_not_equal() {
        let cmd = LocalMcastCmd;
        let a = unknown_dst("d1", vec![locator("d1", "1.1.1.1")]);
        let b = unknown_dst("d1", vec![locator("d1", "1.1.1.1"), locator("d1", "2.2.2.2")]);
        assert!(!cmd.are_equal(&a, &b));
        assert!(!cmd.are_equal(&b, &a));
    }

    #[test]
    fn transform_rescopes_every_locator() {
        let cmd = RemoteMcastCmd;
        let dest = NodeId::from("ha1");
        let src = unknown_dst("d1", vec![locator("d1", "1.1.1.1"), locator("d1", "2.2.2.2")]);
        let out = cmd.transform(&dest, &src);

        assert!(out.locator_set.iter().all(|l| l.node == dest));
        assert_eq!(out.logical_switch.node, dest);
        assert!(out.identity().is_some());
        assert!(cmd.without_uuid(&out).identity().is_none());
    }
}
