// Local and remote unicast MACs share payload, key, transform and
// equality; they differ only in which list of the global node they live in.

use super::MergeCommand;
use crate::model::{
    Entry, GlobalAugmentation, NodeId, Record, RecordKey, RecordKind, RecordPath, UcastMac,
    derive_identity, rewrite,
};

fn transform_ucast(dest: &NodeId, item: &UcastMac) -> UcastMac {
    let dest = dest.global();
    UcastMac {
        mac: item.mac.clone(),
        logical_switch: rewrite(&dest, &item.logical_switch),
        locator: item.locator.as_ref().map(|l| rewrite(&dest, l)),
        ip_addr: item.ip_addr,
        mac_entry_uuid: Some(derive_identity(&item.key().seed())),
    }
}

fn ucast_equal(updated: &UcastMac, orig: &UcastMac) -> bool {
    updated.mac == orig.mac
        && updated.logical_switch.name == orig.logical_switch.name
        && updated.locator.as_ref().map(|l| &l.tp_id) == orig.locator.as_ref().map(|l| &l.tp_id)
        && updated.ip_addr == orig.ip_addr
}

fn without_uuid(item: &UcastMac) -> UcastMac {
    UcastMac {
        mac_entry_uuid: None,
        ..item.clone()
    }
}

// ── Local ───────────────────────────────────────────────────────────

/// MACs learned on a device's own ports.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalUcastCmd;

impl MergeCommand for LocalUcastCmd {
    type Item = UcastMac;
    type Container = GlobalAugmentation;

    fn kind(&self) -> RecordKind {
        RecordKind::LocalUcastMac
    }

    fn description(&self) -> &'static str {
        "LocalUcastMacs"
    }

    fn get_data<'a>(&self, container: Option<&'a GlobalAugmentation>) -> &'a [UcastMac] {
        container
            .map(|c| c.local_ucast_macs.as_slice())
            .unwrap_or_default()
    }

    fn set_data(&self, container: &mut GlobalAugmentation, data: Vec<UcastMac>) {
        container.local_ucast_macs = data;
    }

    fn generate_id(&self, dest: &NodeId, item: &UcastMac) -> RecordPath {
        RecordPath::new(dest.global(), RecordKey::LocalUcastMac(item.key()))
    }

    fn transform(&self, dest: &NodeId, item: &UcastMac) -> UcastMac {
        transform_ucast(dest, item)
    }

    fn are_equal(&self, updated: &UcastMac, orig: &UcastMac) -> bool {
        ucast_equal(updated, orig)
    }

    fn without_uuid(&self, item: &UcastMac) -> UcastMac {
        without_uuid(item)
    }

    fn record(&self, item: UcastMac) -> Record {
        Record::LocalUcastMac(item)
    }
}

// ── Remote ──────────────────────────────────────────────────────────

/// MACs reachable through a remote tunnel endpoint.
#[derive(Debug, Clone, Copy, Default)]
pub struct RemoteUcastCmd;

impl MergeCommand for RemoteUcastCmd {
    type Item = UcastMac;
    type Container = GlobalAugmentation;

    fn kind(&self) -> RecordKind {
        RecordKind::RemoteUcastMac
    }

    fn description(&self) -> &'static str {
        "RemoteUcastMacs"
    }

    fn get_data<'a>(&self, container: Option<&'a GlobalAugmentation>) -> &'a [UcastMac] {
        container
            .map(|c| c.remote_ucast_macs.as_slice())
            .unwrap_or_default()
    }

    fn set_data(&self, container: &mut GlobalAugmentation, data: Vec<UcastMac>) {
        container.remote_ucast_macs = data;
    }

    fn generate_id(&self, dest: &NodeId, item: &UcastMac) -> RecordPath {
        RecordPath::new(dest.global(), RecordKey::RemoteUcastMac(item.key()))
    }

    fn transform(&self, dest: &NodeId, item: &UcastMac) -> UcastMac {
        transform_ucast(dest, item)
    }

    fn are_equal(&self, updated: &UcastMac, orig: &UcastMac) -> bool {
        ucast_equal(updated, orig)
    }

    fn without_uuid(&self, item: &UcastMac) -> UcastMac {
        without_uuid(item)
    }

    fn record(&self, item: UcastMac) -> Record {
        Record::RemoteUcastMac(item)
    }
}
