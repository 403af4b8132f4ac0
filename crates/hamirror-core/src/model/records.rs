// ── Mirrored record types ──
//
// Every record separates three things: a scope-free domain key, a
// device-local identity, and the payload. Derived `PartialEq` compares
// everything (identity included) and is only meant for tests.

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::net::IpAddr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::node_id::{MacAddress, NodeId, TpId};
use super::refs::{LocatorRef, LogicalSwitchRef, PhysicalSwitchRef};

/// Key/identity access shared by all record types.
pub trait Entry: Clone + Debug + Send + Sync + 'static {
    type Key: Clone + Debug + Eq + Hash + Send + Sync;

    /// Domain key: identifies the entity independent of the reporting device.
    fn key(&self) -> Self::Key;

    /// Device-local identity token. Never part of any comparison.
    fn identity(&self) -> Option<Uuid>;
}

/// Derive a fresh, deterministic identity from a domain key's text.
pub fn derive_identity(seed: &str) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, seed.as_bytes())
}

// ── Logical switches ────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalSwitch {
    pub name: String,
    pub logical_switch_uuid: Option<Uuid>,
    /// VNI carried on the tunnel for this switch.
    pub tunnel_key: Option<String>,
    pub description: Option<String>,
    pub replication_mode: Option<String>,
}

impl LogicalSwitch {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            logical_switch_uuid: None,
            tunnel_key: None,
            description: None,
            replication_mode: None,
        }
    }

    pub fn with_tunnel_key(mut self, vni: impl Into<String>) -> Self {
        self.tunnel_key = Some(vni.into());
        self
    }
}

impl Entry for LogicalSwitch {
    type Key = String;

    fn key(&self) -> String {
        self.name.clone()
    }

    fn identity(&self) -> Option<Uuid> {
        self.logical_switch_uuid
    }
}

// ── MAC bindings ────────────────────────────────────────────────────

/// Key of a unicast or multicast MAC binding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MacKey {
    pub logical_switch: String,
    pub mac: MacAddress,
}

impl MacKey {
    pub fn seed(&self) -> String {
        format!("{}/{}", self.logical_switch, self.mac)
    }
}

/// Unicast MAC to single locator binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UcastMac {
    pub mac: MacAddress,
    pub logical_switch: LogicalSwitchRef,
    pub locator: Option<LocatorRef>,
    pub ip_addr: Option<IpAddr>,
    pub mac_entry_uuid: Option<Uuid>,
}

impl UcastMac {
    pub fn new(mac: MacAddress, logical_switch: LogicalSwitchRef) -> Self {
        Self {
            mac,
            logical_switch,
            locator: None,
            ip_addr: None,
            mac_entry_uuid: None,
        }
    }

    pub fn with_locator(mut self, locator: LocatorRef) -> Self {
        self.locator = Some(locator);
        self
    }

    pub fn with_uuid(mut self, uuid: Uuid) -> Self {
        self.mac_entry_uuid = Some(uuid);
        self
    }
}

impl Entry for UcastMac {
    type Key = MacKey;

    fn key(&self) -> MacKey {
        MacKey {
            logical_switch: self.logical_switch.name.clone(),
            mac: self.mac.clone(),
        }
    }

    fn identity(&self) -> Option<Uuid> {
        self.mac_entry_uuid
    }
}

/// Multicast MAC to locator set binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McastMac {
    pub mac: MacAddress,
    pub logical_switch: LogicalSwitchRef,
    pub locator_set: Vec<LocatorRef>,
    pub ip_addr: Option<IpAddr>,
    pub mac_entry_uuid: Option<Uuid>,
}

impl McastMac {
    pub fn new(mac: MacAddress, logical_switch: LogicalSwitchRef) -> Self {
        Self {
            mac,
            logical_switch,
            locator_set: Vec::new(),
            ip_addr: None,
            mac_entry_uuid: None,
        }
    }

    pub fn with_locators(mut self, locators: Vec<LocatorRef>) -> Self {
        self.locator_set = locators;
        self
    }

    pub fn with_uuid(mut self, uuid: Uuid) -> Self {
        self.mac_entry_uuid = Some(uuid);
        self
    }
}

impl Entry for McastMac {
    type Key = MacKey;

    fn key(&self) -> MacKey {
        MacKey {
            logical_switch: self.logical_switch.name.clone(),
            mac: self.mac.clone(),
        }
    }

    fn identity(&self) -> Option<Uuid> {
        self.mac_entry_uuid
    }
}

// ── Physical switch membership ──────────────────────────────────────

/// A physical switch managed by a global node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchMembership {
    pub switch_ref: PhysicalSwitchRef,
}

impl SwitchMembership {
    pub fn new(node: NodeId) -> Self {
        Self {
            switch_ref: PhysicalSwitchRef::new(node),
        }
    }
}

impl Entry for SwitchMembership {
    type Key = String;

    fn key(&self) -> String {
        self.switch_ref.switch_name().to_owned()
    }

    fn identity(&self) -> Option<Uuid> {
        None
    }
}

// ── Tunnels ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TunnelKey {
    pub local: TpId,
    pub remote: TpId,
}

/// Tunnel edge between a local and a remote locator of a physical switch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tunnel {
    pub local_locator: LocatorRef,
    pub remote_locator: LocatorRef,
    #[serde(default)]
    pub bfd_status: BTreeMap<String, String>,
    pub tunnel_uuid: Option<Uuid>,
}

impl Tunnel {
    pub fn new(local_locator: LocatorRef, remote_locator: LocatorRef) -> Self {
        Self {
            local_locator,
            remote_locator,
            bfd_status: BTreeMap::new(),
            tunnel_uuid: None,
        }
    }
}

impl Entry for Tunnel {
    type Key = TunnelKey;

    fn key(&self) -> TunnelKey {
        TunnelKey {
            local: self.local_locator.tp_id.clone(),
            remote: self.remote_locator.tp_id.clone(),
        }
    }

    fn identity(&self) -> Option<Uuid> {
        self.tunnel_uuid
    }
}

// ── Termination points ──────────────────────────────────────────────

/// Physical locator of a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminationPoint {
    pub tp_id: TpId,
    pub encapsulation: Option<String>,
    pub dst_ip: Option<IpAddr>,
    pub physical_locator_uuid: Option<Uuid>,
}

impl TerminationPoint {
    /// A VXLAN-over-IPv4 locator for `ip`.
    pub fn vxlan(ip: IpAddr) -> Self {
        Self {
            tp_id: TpId::for_tep(ip),
            encapsulation: Some(super::node_id::VXLAN_OVER_IPV4.to_owned()),
            dst_ip: Some(ip),
            physical_locator_uuid: None,
        }
    }
}

impl Entry for TerminationPoint {
    type Key = TpId;

    fn key(&self) -> TpId {
        self.tp_id.clone()
    }

    fn identity(&self) -> Option<Uuid> {
        self.physical_locator_uuid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mac_key_ignores_scope_and_identity() {
        let a = UcastMac::new(
            MacAddress::new("00:00:00:00:00:01"),
            LogicalSwitchRef::new(NodeId::from("d1"), "ls1"),
        )
        .with_uuid(Uuid::new_v4());
        let b = UcastMac::new(
            MacAddress::new("00:00:00:00:00:01"),
            LogicalSwitchRef::new(NodeId::from("d2"), "ls1"),
        )
        .with_uuid(Uuid::new_v4());

        assert_eq!(a.key(), b.key());
        assert_ne!(a.identity(), b.identity());
    }

    #[test]
    fn switch_membership_key_is_switch_name() {
        let m = SwitchMembership::new(NodeId::from("d1/physicalswitch/sw1"));
        assert_eq!(m.key(), "sw1");
    }

    #[test]
    fn derived_identity_is_deterministic() {
        assert_eq!(derive_identity("ls1"), derive_identity("ls1"));
        assert_ne!(derive_identity("ls1"), derive_identity("ls2"));
    }
}
