use super::MergeCommand;
use crate::model::{
    Entry, Node, NodeId, Record, RecordKey, RecordKind, RecordPath, TerminationPoint,
    derive_identity,
};

/// Termination points (physical locators) held directly by a node.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminationPointCmd;

impl MergeCommand for TerminationPointCmd {
    type Item = TerminationPoint;
    type Container = Node;

    fn kind(&self) -> RecordKind {
        RecordKind::TerminationPoint
    }

    fn description(&self) -> &'static str {
        "TerminationPoints"
    }

    fn get_data<'a>(&self, container: Option<&'a Node>) -> &'a [TerminationPoint] {
        container
            .map(|c| c.termination_points.as_slice())
            .unwrap_or_default()
    }

    fn set_data(&self, container: &mut Node, data: Vec<TerminationPoint>) {
        container.termination_points = data;
    }

    fn generate_id(&self, dest: &NodeId, item: &TerminationPoint) -> RecordPath {
        RecordPath::new(dest.clone(), RecordKey::TerminationPoint(item.key()))
    }

    fn transform(&self, _dest: &NodeId, item: &TerminationPoint) -> TerminationPoint {
        TerminationPoint {
            physical_locator_uuid: Some(derive_identity(item.tp_id.as_str())),
            ..item.clone()
        }
    }

    fn are_equal(&self, updated: &TerminationPoint, orig: &TerminationPoint) -> bool {
        updated.tp_id == orig.tp_id
            && updated.encapsulation == orig.encapsulation
            && updated.dst_ip == orig.dst_ip
    }

    fn without_uuid(&self, item: &TerminationPoint) -> TerminationPoint {
        TerminationPoint {
            physical_locator_uuid: None,
            ..item.clone()
        }
    }

    fn record(&self, item: TerminationPoint) -> Record {
        Record::TerminationPoint(item)
    }
}
