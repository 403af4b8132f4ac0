// ── Scoped references ──
//
// References point at other entities inside one node's namespace. When a
// record is copied between a child and its HA parent every reference is
// rewritten into the destination scope.

use serde::{Deserialize, Serialize};

use super::node_id::{NodeId, TpId};

/// Rewrite a reference from the scope it carries into `dest`.
pub trait Rescope {
    fn rescope(&self, dest: &NodeId) -> Self;

    /// The node the reference currently resolves in.
    fn scope(&self) -> &NodeId;
}

/// Pure scope rewrite: the source scope is the one `reference` carries.
pub fn rewrite<R: Rescope>(dest: &NodeId, reference: &R) -> R {
    reference.rescope(dest)
}

/// Reference to a logical switch defined under `node`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LogicalSwitchRef {
    pub node: NodeId,
    pub name: String,
}

impl LogicalSwitchRef {
    pub fn new(node: NodeId, name: impl Into<String>) -> Self {
        Self {
            node,
            name: name.into(),
        }
    }
}

impl Rescope for LogicalSwitchRef {
    fn rescope(&self, dest: &NodeId) -> Self {
        Self::new(dest.clone(), self.name.clone())
    }

    fn scope(&self) -> &NodeId {
        &self.node
    }
}

/// Reference to a physical locator (termination point) of `node`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocatorRef {
    pub node: NodeId,
    pub tp_id: TpId,
}

impl LocatorRef {
    pub fn new(node: NodeId, tp_id: TpId) -> Self {
        Self { node, tp_id }
    }
}

impl Rescope for LocatorRef {
    fn rescope(&self, dest: &NodeId) -> Self {
        Self::new(dest.clone(), self.tp_id.clone())
    }

    fn scope(&self) -> &NodeId {
        &self.node
    }
}

/// Reference to a physical switch sub-node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PhysicalSwitchRef {
    pub node: NodeId,
}

impl PhysicalSwitchRef {
    pub fn new(node: NodeId) -> Self {
        Self { node }
    }

    /// The switch name, falling back to the global id for refs that point
    /// at a global node.
    ///
    /// A ref without a switch part is taken whole as the name. It is not
    /// sliced at where the `/physicalswitch/` separator would be, so the
    /// result is never a truncated or shifted fragment of the id.
    pub fn switch_name(&self) -> &str {
        self.node
            .switch_name()
            .unwrap_or_else(|| self.node.global_id())
    }
}

impl Rescope for PhysicalSwitchRef {
    /// Keeps the switch name and moves it under the destination's global node.
    fn rescope(&self, dest: &NodeId) -> Self {
        Self::new(dest.global().physical_switch(self.switch_name()))
    }

    fn scope(&self) -> &NodeId {
        &self.node
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logical_switch_ref_moves_to_destination() {
        let src = LogicalSwitchRef::new(NodeId::from("d1"), "ls-100");
        let dst = rewrite(&NodeId::from("ha1"), &src);
        assert_eq!(dst.node, NodeId::from("ha1"));
        assert_eq!(dst.name, "ls-100");
    }

    #[test]
    fn locator_ref_keeps_tp_id() {
        let src = LocatorRef::new(NodeId::from("d1"), TpId::from("vxlan_over_ipv4:10.0.0.1"));
        let dst = src.rescope(&NodeId::from("ha1"));
        assert_eq!(dst.scope(), &NodeId::from("ha1"));
        assert_eq!(dst.tp_id, src.tp_id);
    }

    #[test]
    fn physical_switch_ref_uses_destination_global() {
        let src = PhysicalSwitchRef::new(NodeId::from("d1/physicalswitch/sw1"));
        let dst = src.rescope(&NodeId::from("ha1/physicalswitch/other"));
        assert_eq!(dst.node.to_string(), "ha1/physicalswitch/sw1");

        let from_global = src.rescope(&NodeId::from("ha1"));
        assert_eq!(from_global.node.to_string(), "ha1/physicalswitch/sw1");
    }

    #[test]
    fn physical_switch_ref_to_global_node_keeps_its_name() {
        let src = PhysicalSwitchRef::new(NodeId::from("tor-a"));
        let dst = src.rescope(&NodeId::from("ha1"));
        assert_eq!(dst.node.to_string(), "ha1/physicalswitch/tor-a");
    }
}
