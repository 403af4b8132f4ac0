use super::MergeCommand;
use crate::model::{
    GlobalAugmentation, LogicalSwitch, NodeId, Record, RecordKey, RecordKind, RecordPath,
    derive_identity,
};

/// Logical switches of a global node.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogicalSwitchesCmd;

impl MergeCommand for LogicalSwitchesCmd {
    type Item = LogicalSwitch;
    type Container = GlobalAugmentation;

    fn kind(&self) -> RecordKind {
        RecordKind::LogicalSwitch
    }

    fn description(&self) -> &'static str {
        "LogicalSwitches"
    }

    fn get_data<'a>(&self, container: Option<&'a GlobalAugmentation>) -> &'a [LogicalSwitch] {
        container.map(|c| c.logical_switches.as_slice()).unwrap_or_default()
    }

    fn set_data(&self, container: &mut GlobalAugmentation, data: Vec<LogicalSwitch>) {
        container.logical_switches = data;
    }

    fn generate_id(&self, dest: &NodeId, item: &LogicalSwitch) -> RecordPath {
        RecordPath::new(dest.global(), RecordKey::LogicalSwitch(item.name.clone()))
    }

    fn transform(&self, _dest: &NodeId, item: &LogicalSwitch) -> LogicalSwitch {
        LogicalSwitch {
            logical_switch_uuid: Some(derive_identity(&item.name)),
            ..item.clone()
        }
    }

    fn are_equal(&self, updated: &LogicalSwitch, orig: &LogicalSwitch) -> bool {
        updated.name == orig.name
            && updated.tunnel_key == orig.tunnel_key
            && updated.description == orig.description
            && updated.replication_mode == orig.replication_mode
    }

    fn without_uuid(&self, item: &LogicalSwitch) -> LogicalSwitch {
        LogicalSwitch {
            logical_switch_uuid: None,
            ..item.clone()
        }
    }

    fn record(&self, item: LogicalSwitch) -> Record {
        Record::LogicalSwitch(item)
    }
}
