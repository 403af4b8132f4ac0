use super::MergeCommand;
use crate::model::{
    Entry, GlobalAugmentation, NodeId, Record, RecordKey, RecordKind, RecordPath,
    SwitchMembership, rewrite,
};

/// Physical switches managed by a global node. The reference is the whole
/// payload, so two memberships are equal when they name the same switch.
#[derive(Debug, Clone, Copy, Default)]
pub struct SwitchesCmd;

impl MergeCommand for SwitchesCmd {
    type Item = SwitchMembership;
    type Container = GlobalAugmentation;

    fn kind(&self) -> RecordKind {
        RecordKind::PhysicalSwitch
    }

    fn description(&self) -> &'static str {
        "Switches"
    }

    fn get_data<'a>(&self, container: Option<&'a GlobalAugmentation>) -> &'a [SwitchMembership] {
        container
            .map(|c| c.switches.as_slice())
            .unwrap_or_default()
    }

    fn set_data(&self, container: &mut GlobalAugmentation, data: Vec<SwitchMembership>) {
        container.switches = data;
    }

    fn generate_id(&self, dest: &NodeId, item: &SwitchMembership) -> RecordPath {
        RecordPath::new(dest.global(), RecordKey::PhysicalSwitch(item.key()))
    }

    fn transform(&self, dest: &NodeId, item: &SwitchMembership) -> SwitchMembership {
        SwitchMembership {
            switch_ref: rewrite(dest, &item.switch_ref),
        }
    }

    fn are_equal(&self, updated: &SwitchMembership, orig: &SwitchMembership) -> bool {
        updated.key() == orig.key()
    }

    fn without_uuid(&self, item: &SwitchMembership) -> SwitchMembership {
        item.clone()
    }

    fn record(&self, item: SwitchMembership) -> Record {
        Record::PhysicalSwitch(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_moves_switch_under_parent() {
        let cmd = SwitchesCmd;
        let child = SwitchMembership::new(NodeId::from("d1/physicalswitch/sw1"));
        let out = cmd.transform(&NodeId::from("ha1"), &child);
        assert_eq!(out.switch_ref.node, NodeId::from("ha1/physicalswitch/sw1"));
        assert!(cmd.are_equal(&child, &out));
    }

    #[test]
    fn different_switches_are_not_equal() {
        let cmd = SwitchesCmd;
        let a = SwitchMembership::new(NodeId::from("d1/physicalswitch/sw1"));
        let b = SwitchMembership::new(NodeId::from("d1/physicalswitch/sw2"));
        assert!(!cmd.are_equal(&a, &b));
    }

    #[test]
    fn op_merge_adds_second_switch_to_populated_parent() {
        let cmd = SwitchesCmd;
        let dest = NodeId::from("ha1");
        let existing = vec![SwitchMembership::new(NodeId::from("ha1/physicalswitch/sw1"))];
        let src = vec![
            SwitchMembership::new(NodeId::from("d1/physicalswitch/sw1")),
            SwitchMembership::new(NodeId::from("d1/physicalswitch/sw2")),
        ];
        let added = cmd.transform_op_data(&existing, &src, &dest);
        assert_eq!(added.len(), 1);
        assert_eq!(added[0].key(), "sw2");
    }
}
