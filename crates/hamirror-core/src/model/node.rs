// ── Nodes, containers and type-erased records ──
//
// A Node is the unit the store reads and merges. Its record lists live in
// two augmentations (global / physical switch) plus the node's own
// termination points. `Record` / `RecordKey` erase the per-kind types so
// transactions can carry puts and deletes of any kind.

use std::fmt;
use std::net::IpAddr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use super::node_id::{NodeId, TpId};
use super::records::{
    Entry, LogicalSwitch, MacKey, McastMac, SwitchMembership, TerminationPoint, Tunnel, TunnelKey,
    UcastMac,
};

// ── Containers ──────────────────────────────────────────────────────

/// Record lists and attributes of a global (device or HA parent) node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalAugmentation {
    pub db_version: Option<String>,
    /// Children recorded on an HA parent's manager entry.
    pub ha_children: Vec<NodeId>,
    pub logical_switches: Vec<LogicalSwitch>,
    pub local_ucast_macs: Vec<UcastMac>,
    pub remote_ucast_macs: Vec<UcastMac>,
    pub local_mcast_macs: Vec<McastMac>,
    pub remote_mcast_macs: Vec<McastMac>,
    pub switches: Vec<SwitchMembership>,
}

/// Record lists and attributes of a physical switch sub-node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicalSwitchAugmentation {
    pub node_name: Option<String>,
    pub managed_by: Option<NodeId>,
    pub management_ips: Vec<IpAddr>,
    pub tunnel_ips: Vec<IpAddr>,
    pub tunnels: Vec<Tunnel>,
}

/// One node in a namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    #[serde(default)]
    pub global: Option<GlobalAugmentation>,
    #[serde(default)]
    pub physical_switch: Option<PhysicalSwitchAugmentation>,
    #[serde(default)]
    pub termination_points: Vec<TerminationPoint>,
}

impl Node {
    pub fn new(id: NodeId) -> Self {
        Self {
            id,
            global: None,
            physical_switch: None,
            termination_points: Vec::new(),
        }
    }

    pub fn with_global(mut self, global: GlobalAugmentation) -> Self {
        self.global = Some(global);
        self
    }

    pub fn with_physical_switch(mut self, ps: PhysicalSwitchAugmentation) -> Self {
        self.physical_switch = Some(ps);
        self
    }

    pub fn with_termination_points(mut self, tps: Vec<TerminationPoint>) -> Self {
        self.termination_points = tps;
        self
    }

    /// Insert or replace the record with the same key.
    pub fn upsert(&mut self, record: Record) {
        match record {
            Record::LogicalSwitch(r) => upsert_entry(&mut self.global_mut().logical_switches, r),
            Record::LocalUcastMac(r) => upsert_entry(&mut self.global_mut().local_ucast_macs, r),
            Record::RemoteUcastMac(r) => upsert_entry(&mut self.global_mut().remote_ucast_macs, r),
            Record::LocalMcastMac(r) => upsert_entry(&mut self.global_mut().local_mcast_macs, r),
            Record::RemoteMcastMac(r) => upsert_entry(&mut self.global_mut().remote_mcast_macs, r),
            Record::PhysicalSwitch(r) => upsert_entry(&mut self.global_mut().switches, r),
            Record::Tunnel(r) => upsert_entry(&mut self.ps_mut().tunnels, r),
            Record::TerminationPoint(r) => upsert_entry(&mut self.termination_points, r),
        }
    }

    /// Remove the record with `key`, returning it if it was present.
    pub fn remove(&mut self, key: &RecordKey) -> Option<Record> {
        if let RecordKey::TerminationPoint(k) = key {
            return remove_entry(&mut self.termination_points, k).map(Record::TerminationPoint);
        }
        if let RecordKey::Tunnel(k) = key {
            let ps = self.physical_switch.as_mut()?;
            return remove_entry(&mut ps.tunnels, k).map(Record::Tunnel);
        }
        let global = self.global.as_mut()?;
        match key {
            RecordKey::LogicalSwitch(k) => {
                remove_entry(&mut global.logical_switches, k).map(Record::LogicalSwitch)
            }
            RecordKey::LocalUcastMac(k) => {
                remove_entry(&mut global.local_ucast_macs, k).map(Record::LocalUcastMac)
            }
            RecordKey::RemoteUcastMac(k) => {
                remove_entry(&mut global.remote_ucast_macs, k).map(Record::RemoteUcastMac)
            }
            RecordKey::LocalMcastMac(k) => {
                remove_entry(&mut global.local_mcast_macs, k).map(Record::LocalMcastMac)
            }
            RecordKey::RemoteMcastMac(k) => {
                remove_entry(&mut global.remote_mcast_macs, k).map(Record::RemoteMcastMac)
            }
            RecordKey::PhysicalSwitch(k) => {
                remove_entry(&mut global.switches, k).map(Record::PhysicalSwitch)
            }
            RecordKey::Tunnel(_) | RecordKey::TerminationPoint(_) => None,
        }
    }

    /// Look up the record with `key`.
    pub fn get(&self, key: &RecordKey) -> Option<Record> {
        let global = self.global.as_ref();
        match key {
            RecordKey::LogicalSwitch(k) => global
                .and_then(|g| find_entry(&g.logical_switches, k))
                .map(Record::LogicalSwitch),
            RecordKey::LocalUcastMac(k) => global
                .and_then(|g| find_entry(&g.local_ucast_macs, k))
                .map(Record::LocalUcastMac),
            RecordKey::RemoteUcastMac(k) => global
                .and_then(|g| find_entry(&g.remote_ucast_macs, k))
                .map(Record::RemoteUcastMac),
            RecordKey::LocalMcastMac(k) => global
                .and_then(|g| find_entry(&g.local_mcast_macs, k))
                .map(Record::LocalMcastMac),
            RecordKey::RemoteMcastMac(k) => global
                .and_then(|g| find_entry(&g.remote_mcast_macs, k))
                .map(Record::RemoteMcastMac),
            RecordKey::PhysicalSwitch(k) => global
                .and_then(|g| find_entry(&g.switches, k))
                .map(Record::PhysicalSwitch),
            RecordKey::Tunnel(k) => self
                .physical_switch
                .as_ref()
                .and_then(|ps| find_entry(&ps.tunnels, k))
                .map(Record::Tunnel),
            RecordKey::TerminationPoint(k) => {
                find_entry(&self.termination_points, k).map(Record::TerminationPoint)
            }
        }
    }

    /// Merge `other` into this node: lists merge by key, scalar attributes
    /// are overwritten only when `other` sets them.
    pub fn merge_from(&mut self, other: Node) {
        if let Some(g) = other.global {
            let dst = self.global_mut();
            if g.db_version.is_some() {
                dst.db_version = g.db_version;
            }
            for child in g.ha_children {
                if !dst.ha_children.contains(&child) {
                    dst.ha_children.push(child);
                }
            }
            merge_entries(&mut dst.logical_switches, g.logical_switches);
            merge_entries(&mut dst.local_ucast_macs, g.local_ucast_macs);
            merge_entries(&mut dst.remote_ucast_macs, g.remote_ucast_macs);
            merge_entries(&mut dst.local_mcast_macs, g.local_mcast_macs);
            merge_entries(&mut dst.remote_mcast_macs, g.remote_mcast_macs);
            merge_entries(&mut dst.switches, g.switches);
        }
        if let Some(ps) = other.physical_switch {
            let dst = self.ps_mut();
            if ps.node_name.is_some() {
                dst.node_name = ps.node_name;
            }
            if ps.managed_by.is_some() {
                dst.managed_by = ps.managed_by;
            }
            if !ps.management_ips.is_empty() {
                dst.management_ips = ps.management_ips;
            }
            if !ps.tunnel_ips.is_empty() {
                dst.tunnel_ips = ps.tunnel_ips;
            }
            merge_entries(&mut dst.tunnels, ps.tunnels);
        }
        merge_entries(&mut self.termination_points, other.termination_points);
    }

    /// Total number of records held by the node.
    pub fn record_count(&self) -> usize {
        let global = self.global.as_ref().map_or(0, |g| {
            g.logical_switches.len()
                + g.local_ucast_macs.len()
                + g.remote_ucast_macs.len()
                + g.local_mcast_macs.len()
                + g.remote_mcast_macs.len()
                + g.switches.len()
        });
        let ps = self.physical_switch.as_ref().map_or(0, |p| p.tunnels.len());
        global + ps + self.termination_points.len()
    }

    fn global_mut(&mut self) -> &mut GlobalAugmentation {
        self.global.get_or_insert_with(GlobalAugmentation::default)
    }

    fn ps_mut(&mut self) -> &mut PhysicalSwitchAugmentation {
        self.physical_switch
            .get_or_insert_with(PhysicalSwitchAugmentation::default)
    }
}

// ── Keyed list helpers ──────────────────────────────────────────────

fn upsert_entry<T: Entry>(list: &mut Vec<T>, item: T) {
    let key = item.key();
    match list.iter_mut().find(|e| e.key() == key) {
        Some(slot) => *slot = item,
        None => list.push(item),
    }
}

fn remove_entry<T: Entry>(list: &mut Vec<T>, key: &T::Key) -> Option<T> {
    let idx = list.iter().position(|e| &e.key() == key)?;
    Some(list.remove(idx))
}

fn find_entry<T: Entry>(list: &[T], key: &T::Key) -> Option<T> {
    list.iter().find(|e| &e.key() == key).cloned()
}

fn merge_entries<T: Entry>(dst: &mut Vec<T>, src: Vec<T>) {
    for item in src {
        upsert_entry(dst, item);
    }
}

// ── Type-erased records ─────────────────────────────────────────────

/// Kind of a mirrored record.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RecordKind {
    LogicalSwitch,
    LocalUcastMac,
    RemoteUcastMac,
    LocalMcastMac,
    RemoteMcastMac,
    PhysicalSwitch,
    Tunnel,
    TerminationPoint,
}

/// One record of any kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "record", rename_all = "snake_case")]
pub enum Record {
    LogicalSwitch(LogicalSwitch),
    LocalUcastMac(UcastMac),
    RemoteUcastMac(UcastMac),
    LocalMcastMac(McastMac),
    RemoteMcastMac(McastMac),
    PhysicalSwitch(SwitchMembership),
    Tunnel(Tunnel),
    TerminationPoint(TerminationPoint),
}

impl Record {
    pub fn kind(&self) -> RecordKind {
        self.key().kind()
    }

    pub fn key(&self) -> RecordKey {
        match self {
            Self::LogicalSwitch(r) => RecordKey::LogicalSwitch(r.key()),
            Self::LocalUcastMac(r) => RecordKey::LocalUcastMac(r.key()),
            Self::RemoteUcastMac(r) => RecordKey::RemoteUcastMac(r.key()),
            Self::LocalMcastMac(r) => RecordKey::LocalMcastMac(r.key()),
            Self::RemoteMcastMac(r) => RecordKey::RemoteMcastMac(r.key()),
            Self::PhysicalSwitch(r) => RecordKey::PhysicalSwitch(r.key()),
            Self::Tunnel(r) => RecordKey::Tunnel(r.key()),
            Self::TerminationPoint(r) => RecordKey::TerminationPoint(r.key()),
        }
    }
}

/// Domain key of a record of any kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "key", rename_all = "snake_case")]
pub enum RecordKey {
    LogicalSwitch(String),
    LocalUcastMac(MacKey),
    RemoteUcastMac(MacKey),
    LocalMcastMac(MacKey),
    RemoteMcastMac(MacKey),
    PhysicalSwitch(String),
    Tunnel(TunnelKey),
    TerminationPoint(TpId),
}

impl RecordKey {
    pub fn kind(&self) -> RecordKind {
        match self {
            Self::LogicalSwitch(_) => RecordKind::LogicalSwitch,
            Self::LocalUcastMac(_) => RecordKind::LocalUcastMac,
            Self::RemoteUcastMac(_) => RecordKind::RemoteUcastMac,
            Self::LocalMcastMac(_) => RecordKind::LocalMcastMac,
            Self::RemoteMcastMac(_) => RecordKind::RemoteMcastMac,
            Self::PhysicalSwitch(_) => RecordKind::PhysicalSwitch,
            Self::Tunnel(_) => RecordKind::Tunnel,
            Self::TerminationPoint(_) => RecordKind::TerminationPoint,
        }
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LogicalSwitch(name) | Self::PhysicalSwitch(name) => write!(f, "{name}"),
            Self::LocalUcastMac(k)
            | Self::RemoteUcastMac(k)
            | Self::LocalMcastMac(k)
            | Self::RemoteMcastMac(k) => write!(f, "{}/{}", k.logical_switch, k.mac),
            Self::Tunnel(k) => write!(f, "{}->{}", k.local, k.remote),
            Self::TerminationPoint(tp) => write!(f, "{tp}"),
        }
    }
}

/// Scoped identifier of a single record: the node it lives in plus its key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordPath {
    pub node: NodeId,
    pub key: RecordKey,
}

impl RecordPath {
    pub fn new(node: NodeId, key: RecordKey) -> Self {
        Self { node, key }
    }
}

impl fmt::Display for RecordPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.node, self.key.kind(), self.key)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{LogicalSwitchRef, MacAddress};
    use pretty_assertions::assert_eq;

    fn mac(node: &str, ls: &str, addr: &str) -> UcastMac {
        UcastMac::new(
            MacAddress::new(addr),
            LogicalSwitchRef::new(NodeId::from(node), ls),
        )
    }

    #[test]
    fn upsert_replaces_same_key() {
        let mut node = Node::new(NodeId::from("ha1"));
        node.upsert(Record::LocalUcastMac(mac("ha1", "ls1", "00:00:00:00:00:01")));
        let mut moved = mac("ha1", "ls1", "00:00:00:00:00:01");
        moved.ip_addr = Some("10.1.1.1".parse().unwrap());
        node.upsert(Record::LocalUcastMac(moved.clone()));

        let global = node.global.as_ref().unwrap();
        assert_eq!(global.local_ucast_macs, vec![moved]);
    }

    #[test]
    fn remove_and_get_by_key() {
        let mut node = Node::new(NodeId::from("ha1"));
        let record = Record::RemoteUcastMac(mac("ha1", "ls1", "00:00:00:00:00:02"));
        let key = record.key();
        node.upsert(record.clone());

        assert_eq!(node.get(&key), Some(record.clone()));
        assert_eq!(node.remove(&key), Some(record));
        assert!(node.get(&key).is_none());
        assert_eq!(node.record_count(), 0);
    }

    #[test]
    fn remove_from_missing_augmentation_is_none() {
        let mut node = Node::new(NodeId::from("ha1/physicalswitch/sw1"));
        let key = RecordKey::Tunnel(TunnelKey {
            local: TpId::from("vxlan_over_ipv4:1.1.1.1"),
            remote: TpId::from("vxlan_over_ipv4:2.2.2.2"),
        });
        assert!(node.remove(&key).is_none());
    }

    #[test]
    fn merge_keeps_existing_entries_and_scalars() {
        let mut base = Node::new(NodeId::from("ha1")).with_global(GlobalAugmentation {
            db_version: Some("1.3.0".into()),
            logical_switches: vec![LogicalSwitch::new("ls1")],
            ..GlobalAugmentation::default()
        });
        let incoming = Node::new(NodeId::from("ha1")).with_global(GlobalAugmentation {
            ha_children: vec![NodeId::from("d1")],
            logical_switches: vec![LogicalSwitch::new("ls2")],
            ..GlobalAugmentation::default()
        });
        base.merge_from(incoming);

        let global = base.global.unwrap();
        assert_eq!(global.db_version.as_deref(), Some("1.3.0"));
        assert_eq!(global.ha_children, vec![NodeId::from("d1")]);
        assert_eq!(global.logical_switches.len(), 2);
    }

    #[test]
    fn record_kind_parses_snake_case() {
        let kind: RecordKind = "remote_mcast_mac".parse().unwrap();
        assert_eq!(kind, RecordKind::RemoteMcastMac);
        assert_eq!(RecordKind::TerminationPoint.to_string(), "termination_point");
    }

    #[test]
    fn record_path_display() {
        let path = RecordPath::new(
            NodeId::from("ha1"),
            RecordKey::LogicalSwitch("ls1".into()),
        );
        assert_eq!(path.to_string(), "ha1/logical_switch/ls1");
    }
}
