use super::MergeCommand;
use crate::model::{
    Entry, NodeId, PhysicalSwitchAugmentation, Record, RecordKey, RecordKind, RecordPath, Tunnel,
    derive_identity, rewrite,
};

/// Tunnels of a physical switch sub-node. Locators live on the global
/// node, so both ends rescope into the destination's global node.
#[derive(Debug, Clone, Copy, Default)]
pub struct TunnelCmd;

impl MergeCommand for TunnelCmd {
    type Item = Tunnel;
    type Container = PhysicalSwitchAugmentation;

    fn kind(&self) -> RecordKind {
        RecordKind::Tunnel
    }

    fn description(&self) -> &'static str {
        "Tunnels"
    }

    fn get_data<'a>(&self, container: Option<&'a PhysicalSwitchAugmentation>) -> &'a [Tunnel] {
        container.map(|c| c.tunnels.as_slice()).unwrap_or_default()
    }

    fn set_data(&self, container: &mut PhysicalSwitchAugmentation, data: Vec<Tunnel>) {
        container.tunnels = data;
    }

    fn generate_id(&self, dest: &NodeId, item: &Tunnel) -> RecordPath {
        RecordPath::new(dest.clone(), RecordKey::Tunnel(item.key()))
    }

    fn transform(&self, dest: &NodeId, item: &Tunnel) -> Tunnel {
        let global = dest.global();
        let key = item.key();
        Tunnel {
            local_locator: rewrite(&global, &item.local_locator),
            remote_locator: rewrite(&global, &item.remote_locator),
            bfd_status: item.bfd_status.clone(),
            tunnel_uuid: Some(derive_identity(&format!("{}->{}", key.local, key.remote))),
        }
    }

    fn are_equal(&self, updated: &Tunnel, orig: &Tunnel) -> bool {
        updated.local_locator.tp_id == orig.local_locator.tp_id
            && updated.remote_locator.tp_id == orig.remote_locator.tp_id
            && updated.bfd_status == orig.bfd_status
    }

    fn without_uuid(&self, item: &Tunnel) -> Tunnel {
        Tunnel {
            tunnel_uuid: None,
            ..item.clone()
        }
    }

    fn record(&self, item: Tunnel) -> Record {
        Record::Tunnel(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LocatorRef, TpId};

    fn tunnel(node: &str, remote: &str) -> Tunnel {
        let node = NodeId::from(node);
        Tunnel::new(
            LocatorRef::new(node.clone(), TpId::from("vxlan_over_ipv4:10.0.0.1")),
            LocatorRef::new(node, TpId::from(remote)),
        )
    }

    #[test]
    fn transform_points_locators_at_parent_global() {
        let cmd = TunnelCmd;
        let dest = NodeId::from("ha1/physicalswitch/sw1");
        let out = cmd.transform(&dest, &tunnel("d1", "vxlan_over_ipv4:10.0.0.9"));
        assert_eq!(out.local_locator.node, NodeId::from("ha1"));
        assert_eq!(out.remote_locator.node, NodeId::from("ha1"));
        assert_eq!(
            cmd.generate_id(&dest, &out).to_string(),
            "ha1/physicalswitch/sw1/tunnel/vxlan_over_ipv4:10.0.0.1->vxlan_over_ipv4:10.0.0.9"
        );
    }

    #[test]
    fn bfd_change_is_not_equal() {
        let cmd = TunnelCmd;
        let a = tunnel("d1", "vxlan_over_ipv4:10.0.0.9");
        let mut b = a.clone();
        b.bfd_status.insert("state".into(), "up".into());
        assert!(!cmd.are_equal(&a, &b));
        assert_eq!(cmd.key(&a), cmd.key(&b));
    }
}
