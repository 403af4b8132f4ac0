// Desired changes of an HA parent, pushed down into one device.

use tracing::{debug, warn};

use crate::command::{CommandRegistry, MergeStats};
use crate::error::CoreError;
use crate::model::NodeId;
use crate::store::{Desired, NodeChange, Transaction};

pub(super) fn copy_global(
    registry: &CommandRegistry,
    child_scope: &NodeId,
    change: &NodeChange,
    tx: &mut dyn Transaction<Desired>,
) -> Result<MergeStats, CoreError> {
    let child_scope = child_scope.global();
    let existing = tx.read_node(&child_scope)?;

    let updated = change.after.as_ref();
    let orig = change.before.as_ref();

    let mut stats = registry.global().merge_config_update(
        existing.as_ref().and_then(|n| n.global.as_ref()),
        updated.and_then(|n| n.global.as_ref()),
        orig.and_then(|n| n.global.as_ref()),
        &child_scope,
        tx,
    );
    // Locators referenced by the records above must exist in the child.
    stats += registry
        .node()
        .merge_config_update(existing.as_ref(), updated, orig, &child_scope, tx);

    log_stats(change, &child_scope, stats);
    Ok(stats)
}

pub(super) fn copy_physical_switch(
    registry: &CommandRegistry,
    child_scope: &NodeId,
    change: &NodeChange,
    tx: &mut dyn Transaction<Desired>,
) -> Result<MergeStats, CoreError> {
    let Some(name) = change.node_id().and_then(NodeId::switch_name) else {
        warn!(child = %child_scope, "config update is not for a physical switch, skipping");
        return Ok(MergeStats::default());
    };
    let child_ps_id = child_scope.global().physical_switch(name);
    let existing = tx.read_node(&child_ps_id)?;
    let updated = change.after.as_ref();
    let orig = change.before.as_ref();

    let mut stats = registry.physical_switch().merge_config_update(
        existing.as_ref().and_then(|n| n.physical_switch.as_ref()),
        updated.and_then(|n| n.physical_switch.as_ref()),
        orig.and_then(|n| n.physical_switch.as_ref()),
        &child_ps_id,
        tx,
    );
    stats += registry
        .node()
        .merge_config_update(existing.as_ref(), updated, orig, &child_ps_id, tx);

    log_stats(change, &child_ps_id, stats);
    Ok(stats)
}

fn log_stats(change: &NodeChange, dest: &NodeId, stats: MergeStats) {
    if !stats.is_empty() {
        debug!(
            from = ?change.node_id(),
            to = %dest,
            added = stats.added,
            removed = stats.removed,
            "pushed config update down"
        );
    }
}
