// Observed changes of a device, merged up into its HA parent.

use tracing::{debug, warn};

use crate::command::{CommandRegistry, MergeStats};
use crate::error::CoreError;
use crate::model::{Node, NodeId};
use crate::store::{NodeChange, Observed, Transaction};

pub(super) fn copy_global(
    registry: &CommandRegistry,
    parent_scope: &NodeId,
    change: &NodeChange,
    tx: &mut dyn Transaction<Observed>,
) -> Result<MergeStats, CoreError> {
    let parent_scope = parent_scope.global();
    let existing = tx.read_node(&parent_scope)?;
    let updated = change.after.as_ref();
    let orig = change.before.as_ref();

    let mut stats = registry.global().merge_op_update(
        existing.as_ref().and_then(|n| n.global.as_ref()),
        updated.and_then(|n| n.global.as_ref()),
        orig.and_then(|n| n.global.as_ref()),
        &parent_scope,
        tx,
    );
    stats += registry
        .node()
        .merge_op_update(existing.as_ref(), updated, orig, &parent_scope, tx);

    log_stats(change, &parent_scope, stats);
    Ok(stats)
}

pub(super) fn copy_physical_switch(
    registry: &CommandRegistry,
    updated_child_ps: &Node,
    parent_scope: &NodeId,
    change: &NodeChange,
    tx: &mut dyn Transaction<Observed>,
) -> Result<MergeStats, CoreError> {
    let Some(name) = updated_child_ps.id.switch_name() else {
        warn!(node = %updated_child_ps.id, "op update is not from a physical switch, skipping");
        return Ok(MergeStats::default());
    };
    let parent_ps_id = parent_scope.global().physical_switch(name);
    let existing = tx.read_node(&parent_ps_id)?;
    let updated = change.after.as_ref();
    let orig = change.before.as_ref();

    let mut stats = registry.physical_switch().merge_op_update(
        existing.as_ref().and_then(|n| n.physical_switch.as_ref()),
        updated.and_then(|n| n.physical_switch.as_ref()),
        orig.and_then(|n| n.physical_switch.as_ref()),
        &parent_ps_id,
        tx,
    );
    stats += registry
        .node()
        .merge_op_update(existing.as_ref(), updated, orig, &parent_ps_id, tx);

    log_stats(change, &parent_ps_id, stats);
    Ok(stats)
}

fn log_stats(change: &NodeChange, dest: &NodeId, stats: MergeStats) {
    if !stats.is_empty() {
        debug!(
            from = ?change.node_id(),
            to = %dest,
            added = stats.added,
            removed = stats.removed,
            "merged op update up"
        );
    }
}
