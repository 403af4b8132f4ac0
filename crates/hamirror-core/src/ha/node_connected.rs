// Device attach: register the device on the parent, merge its observed
// state up, then either push prior parent config down or clear the
// device's stale physical switch config.

use tracing::{debug, info, warn};

use super::PriorParentConfig;
use crate::command::CommandRegistry;
use crate::error::CoreError;
use crate::model::{Entry, GlobalAugmentation, Node, NodeId, PhysicalSwitchAugmentation};
use crate::store::{Desired, Observed, Transaction};

pub(super) fn run(
    registry: &CommandRegistry,
    child: &Node,
    child_scope: &NodeId,
    parent_scope: &NodeId,
    prior: &PriorParentConfig,
    conf_tx: &mut dyn Transaction<Desired>,
    oper_tx: &mut dyn Transaction<Observed>,
) -> Result<(), CoreError> {
    let parent_scope = parent_scope.global();
    let switch_names: Vec<String> = child
        .global
        .as_ref()
        .map(|g| g.switches.iter().map(Entry::key).collect())
        .unwrap_or_default();

    register_child(child_scope, &parent_scope, conf_tx);
    merge_global_up(registry, child, &parent_scope, oper_tx)?;
    for name in &switch_names {
        merge_switch_up(registry, child_scope, &parent_scope, name, oper_tx)?;
    }

    if let Some(global) = &prior.global {
        push_global_down(registry, global, child_scope, conf_tx);
    }
    match &prior.physical_switch {
        Some(ps) => push_switch_down(registry, ps, child_scope, conf_tx),
        None => {
            for name in &switch_names {
                let stale = child_scope.global().physical_switch(name);
                info!(node = %stale, "deleting stale physical switch config");
                conf_tx.delete_node(&stale);
            }
        }
    }
    Ok(())
}

/// Ensure the parent's desired global node exists and lists the device.
fn register_child(
    child_scope: &NodeId,
    parent_scope: &NodeId,
    conf_tx: &mut dyn Transaction<Desired>,
) {
    debug!(child = %child_scope, parent = %parent_scope, "registering HA child");
    conf_tx.merge_node(Node::new(parent_scope.clone()).with_global(GlobalAugmentation {
        ha_children: vec![child_scope.global()],
        ..GlobalAugmentation::default()
    }));
}

fn merge_global_up(
    registry: &CommandRegistry,
    child: &Node,
    parent_scope: &NodeId,
    oper_tx: &mut dyn Transaction<Observed>,
) -> Result<(), CoreError> {
    let existing = oper_tx.read_node(parent_scope)?;
    let src_global = child.global.as_ref();

    let mut global = GlobalAugmentation {
        db_version: src_global.and_then(|g| g.db_version.clone()),
        ..GlobalAugmentation::default()
    };
    let mut merged = registry.global().merge_operational_data(
        &mut global,
        existing.as_ref().and_then(|n| n.global.as_ref()),
        src_global,
        parent_scope,
    );

    let mut dst = Node::new(parent_scope.clone()).with_global(global);
    merged += registry
        .node()
        .merge_operational_data(&mut dst, existing.as_ref(), Some(child), parent_scope);

    debug!(child = %child.id, parent = %parent_scope, merged, "merged device global state up");
    oper_tx.merge_node(dst);
    Ok(())
}

fn merge_switch_up(
    registry: &CommandRegistry,
    child_scope: &NodeId,
    parent_scope: &NodeId,
    switch_name: &str,
    oper_tx: &mut dyn Transaction<Observed>,
) -> Result<(), CoreError> {
    let child_ps_id = child_scope.global().physical_switch(switch_name);
    let Some(child_ps) = oper_tx.read_node(&child_ps_id)? else {
        warn!(node = %child_ps_id, "physical switch listed but not reported, skipping");
        return Ok(());
    };
    let parent_ps_id = parent_scope.physical_switch(switch_name);
    let existing = oper_tx.read_node(&parent_ps_id)?;
    let src = child_ps.physical_switch.as_ref();

    let mut ps = PhysicalSwitchAugmentation {
        node_name: src.and_then(|p| p.node_name.clone()),
        managed_by: Some(parent_scope.clone()),
        management_ips: src.map(|p| p.management_ips.clone()).unwrap_or_default(),
        tunnel_ips: src.map(|p| p.tunnel_ips.clone()).unwrap_or_default(),
        tunnels: Vec::new(),
    };
    let mut merged = registry.physical_switch().merge_operational_data(
        &mut ps,
        existing.as_ref().and_then(|n| n.physical_switch.as_ref()),
        src,
        &parent_ps_id,
    );

    let mut dst = Node::new(parent_ps_id.clone()).with_physical_switch(ps);
    merged += registry
        .node()
        .merge_operational_data(&mut dst, existing.as_ref(), Some(&child_ps), &parent_ps_id);

    debug!(from = %child_ps_id, to = %parent_ps_id, merged, "merged physical switch state up");
    oper_tx.merge_node(dst);
    Ok(())
}

fn push_global_down(
    registry: &CommandRegistry,
    parent_global: &Node,
    child_scope: &NodeId,
    conf_tx: &mut dyn Transaction<Desired>,
) {
    let child_scope = child_scope.global();
    let mut global = GlobalAugmentation::default();
    let mut copied =
        registry
            .global()
            .merge_config_data(&mut global, parent_global.global.as_ref(), &child_scope);

    let mut dst = Node::new(child_scope.clone()).with_global(global);
    copied += registry
        .node()
        .merge_config_data(&mut dst, Some(parent_global), &child_scope);

    info!(child = %child_scope, copied, "pushed prior parent global config down");
    conf_tx.merge_node(dst);
}

fn push_switch_down(
    registry: &CommandRegistry,
    parent_ps: &Node,
    child_scope: &NodeId,
    conf_tx: &mut dyn Transaction<Desired>,
) {
    let Some(name) = parent_ps.id.switch_name() else {
        warn!(node = %parent_ps.id, "prior physical switch config is not a switch node, skipping");
        return;
    };
    let child_ps_id = child_scope.global().physical_switch(name);
    let src = parent_ps.physical_switch.as_ref();

    let mut ps = PhysicalSwitchAugmentation {
        node_name: src.and_then(|p| p.node_name.clone()),
        ..PhysicalSwitchAugmentation::default()
    };
    let mut copied = registry
        .physical_switch()
        .merge_config_data(&mut ps, src, &child_ps_id);

    let mut dst = Node::new(child_ps_id.clone()).with_physical_switch(ps);
    copied += registry
        .node()
        .merge_config_data(&mut dst, Some(parent_ps), &child_ps_id);

    info!(child = %child_ps_id, copied, "pushed prior parent physical switch config down");
    conf_tx.merge_node(dst);
}
