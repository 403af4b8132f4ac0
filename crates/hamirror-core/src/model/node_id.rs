// ── Core identity types ──
//
// NodeId, MacAddress and TpId form the foundation of every record.
// A NodeId is kept structured (global node + optional physical switch)
// so scope rewriting never has to slice encoded names.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

/// Token joining a global node id and a physical switch name in the
/// textual node id encoding.
pub const PHYSICAL_SWITCH_SEPARATOR: &str = "/physicalswitch/";

/// Termination point prefix for VXLAN-over-IPv4 physical locators.
pub const VXLAN_OVER_IPV4: &str = "vxlan_over_ipv4";

// ── NodeId ──────────────────────────────────────────────────────────

/// Identity of a node in either namespace.
///
/// Global nodes are HA parents or physical devices. Physical switch
/// sub-nodes hang off a global node and are encoded as
/// `<global>/physicalswitch/<name>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub struct NodeId {
    global: String,
    physical_switch: Option<String>,
}

impl NodeId {
    /// A global node id.
    pub fn new(global: impl Into<String>) -> Self {
        Self {
            global: global.into(),
            physical_switch: None,
        }
    }

    /// The global node owning this id (itself for global nodes).
    pub fn global(&self) -> NodeId {
        Self::new(self.global.clone())
    }

    /// The physical switch sub-node `name` under this id's global node.
    pub fn physical_switch(&self, name: impl Into<String>) -> NodeId {
        Self {
            global: self.global.clone(),
            physical_switch: Some(name.into()),
        }
    }

    pub fn global_id(&self) -> &str {
        &self.global
    }

    pub fn switch_name(&self) -> Option<&str> {
        self.physical_switch.as_deref()
    }

    pub fn is_physical_switch(&self) -> bool {
        self.physical_switch.is_some()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.physical_switch {
            Some(name) => write!(f, "{}{PHYSICAL_SWITCH_SEPARATOR}{name}", self.global),
            None => write!(f, "{}", self.global),
        }
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        match s.find(PHYSICAL_SWITCH_SEPARATOR) {
            Some(idx) if idx > 0 => {
                let name = s[idx + PHYSICAL_SWITCH_SEPARATOR.len()..].to_owned();
                let mut global = s;
                global.truncate(idx);
                Self {
                    global,
                    physical_switch: Some(name),
                }
            }
            _ => Self::new(s),
        }
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self::from(s.to_owned())
    }
}

impl From<NodeId> for String {
    fn from(id: NodeId) -> Self {
        id.to_string()
    }
}

impl FromStr for NodeId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

// ── MacAddress ──────────────────────────────────────────────────────

/// MAC address, normalized to lowercase colon-separated format (aa:bb:cc:dd:ee:ff).
///
/// Multicast entries use the literal `unknown-dst`, which is kept as is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MacAddress(String);

impl MacAddress {
    pub const UNKNOWN_DST: &'static str = "unknown-dst";

    /// Create a normalized MAC address from any common format.
    pub fn new(raw: impl AsRef<str>) -> Self {
        let raw = raw.as_ref();
        if raw.eq_ignore_ascii_case(Self::UNKNOWN_DST) {
            return Self(Self::UNKNOWN_DST.to_owned());
        }
        Self(raw.to_lowercase().replace('-', ":"))
    }

    pub fn unknown_dst() -> Self {
        Self(Self::UNKNOWN_DST.to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MacAddress {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

// ── TpId ────────────────────────────────────────────────────────────

/// Termination point id of a physical locator, e.g. `vxlan_over_ipv4:10.0.0.1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TpId(String);

impl TpId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The locator id of a VXLAN tunnel endpoint.
    pub fn for_tep(ip: IpAddr) -> Self {
        Self(format!("{VXLAN_OVER_IPV4}:{ip}"))
    }

    /// The tunnel endpoint address part, if the id carries one.
    pub fn tep_ip(&self) -> Option<&str> {
        self.0.split_once(':').map(|(_, ip)| ip)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TpId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TpId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn node_id_parses_physical_switch() {
        let id = NodeId::from("hwvtep://uuid/ha1/physicalswitch/sw1");
        assert_eq!(id.global_id(), "hwvtep://uuid/ha1");
        assert_eq!(id.switch_name(), Some("sw1"));
        assert!(id.is_physical_switch());
    }

    #[test]
    fn node_id_without_separator_is_global() {
        let id = NodeId::from("hwvtep://uuid/ha1");
        assert_eq!(id.switch_name(), None);
        assert_eq!(id.global(), id);
    }

    #[test]
    fn node_id_leading_separator_is_not_a_split() {
        let id = NodeId::from("/physicalswitch/sw1");
        assert_eq!(id.global_id(), "/physicalswitch/sw1");
        assert!(!id.is_physical_switch());
    }

    #[test]
    fn node_id_display_roundtrips_encoding() {
        let raw = "hwvtep://uuid/d1/physicalswitch/tor-a";
        let id: NodeId = raw.parse().unwrap();
        assert_eq!(id.to_string(), raw);
    }

    #[test]
    fn physical_switch_is_built_under_global() {
        let ps = NodeId::from("ha1/physicalswitch/sw1");
        assert_eq!(ps.physical_switch("sw2").to_string(), "ha1/physicalswitch/sw2");
    }

    #[test]
    fn node_id_serializes_as_string() {
        let id = NodeId::from("d1/physicalswitch/sw1");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"d1/physicalswitch/sw1\"");
        let back: NodeId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn mac_address_normalizes() {
        assert_eq!(MacAddress::new("AA-BB-CC-DD-EE-FF").as_str(), "aa:bb:cc:dd:ee:ff");
        assert_eq!(MacAddress::new("UNKNOWN-DST").as_str(), "unknown-dst");
    }

    #[test]
    fn tp_id_extracts_tep_ip() {
        let tp = TpId::for_tep("10.0.0.1".parse().unwrap());
        assert_eq!(tp.as_str(), "vxlan_over_ipv4:10.0.0.1");
        assert_eq!(tp.tep_ip(), Some("10.0.0.1"));
    }
}
