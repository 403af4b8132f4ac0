// ── Domain model ──
//
// Node identities, scoped references, the mirrored record types and the
// node/container values the store holds.

pub mod node;
pub mod node_id;
pub mod records;
pub mod refs;

pub use node::{
    GlobalAugmentation, Node, PhysicalSwitchAugmentation, Record, RecordKey, RecordKind,
    RecordPath,
};
pub use node_id::{MacAddress, NodeId, PHYSICAL_SWITCH_SEPARATOR, TpId, VXLAN_OVER_IPV4};
pub use records::{
    Entry, LogicalSwitch, MacKey, McastMac, SwitchMembership, TerminationPoint, Tunnel, TunnelKey,
    UcastMac, derive_identity,
};
pub use refs::{LocatorRef, LogicalSwitchRef, PhysicalSwitchRef, Rescope, rewrite};
