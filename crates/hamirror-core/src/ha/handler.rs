use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strum::Display;
use tracing::{debug, info};

use super::{config_updated, node_connected, op_updated};
use crate::command::{CommandRegistry, MergeStats};
use crate::error::CoreError;
use crate::model::{Node, NodeId};
use crate::store::{Desired, NodeChange, Observed, Transaction};

/// Sync state of one device's association with its HA parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum HaSyncState {
    Disconnected,
    Connecting,
    Reconnecting,
    Synced,
}

/// Parent desired state captured before a device reconnects.
#[derive(Debug, Clone, Default)]
pub struct PriorParentConfig {
    /// The parent's desired global node.
    pub global: Option<Node>,
    /// The parent's desired physical switch sub-node.
    pub physical_switch: Option<Node>,
}

/// Mirrors state between HA parents and their devices.
///
/// Stateless between calls; the registry is shared read-only. Every entry
/// point is a no-op when the HA parent (or child) id is absent.
#[derive(Clone)]
pub struct HaEventHandler {
    registry: Arc<CommandRegistry>,
}

impl HaEventHandler {
    pub fn new(registry: Arc<CommandRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// A device attached to its HA parent for the first time.
    pub fn handle_child_node_connected(
        &self,
        child: &Node,
        child_scope: &NodeId,
        parent_scope: Option<&NodeId>,
        conf_tx: &mut dyn Transaction<Desired>,
        oper_tx: &mut dyn Transaction<Observed>,
    ) -> Result<HaSyncState, CoreError> {
        let Some(parent_scope) = parent_scope else {
            debug!(child = %child_scope, "no HA parent, skipping connect");
            return Ok(HaSyncState::Disconnected);
        };
        info!(
            child = %child_scope,
            parent = %parent_scope,
            state = %HaSyncState::Connecting,
            "device connected to HA parent"
        );
        node_connected::run(
            &self.registry,
            child,
            child_scope,
            parent_scope,
            &PriorParentConfig::default(),
            conf_tx,
            oper_tx,
        )?;
        Ok(HaSyncState::Synced)
    }

    /// A device came back. `prior` is pushed down into the device's desired
    /// namespace before it resumes.
    pub fn handle_child_node_reconnected(
        &self,
        child: &Node,
        child_scope: &NodeId,
        parent_scope: Option<&NodeId>,
        prior: &PriorParentConfig,
        conf_tx: &mut dyn Transaction<Desired>,
        oper_tx: &mut dyn Transaction<Observed>,
    ) -> Result<HaSyncState, CoreError> {
        let Some(parent_scope) = parent_scope else {
            debug!(child = %child_scope, "no HA parent, skipping reconnect");
            return Ok(HaSyncState::Disconnected);
        };
        info!(
            child = %child_scope,
            parent = %parent_scope,
            state = %HaSyncState::Reconnecting,
            prior_global = prior.global.is_some(),
            prior_physical_switch = prior.physical_switch.is_some(),
            "device reconnected to HA parent"
        );
        node_connected::run(
            &self.registry,
            child,
            child_scope,
            parent_scope,
            prior,
            conf_tx,
            oper_tx,
        )?;
        Ok(HaSyncState::Synced)
    }

    /// Merge a device's observed global change up into its HA parent.
    pub fn copy_child_global_op_update_to_ha_parent(
        &self,
        parent_scope: Option<&NodeId>,
        change: &NodeChange,
        tx: &mut dyn Transaction<Observed>,
    ) -> Result<MergeStats, CoreError> {
        let Some(parent_scope) = parent_scope else {
            return Ok(MergeStats::default());
        };
        op_updated::copy_global(&self.registry, parent_scope, change, tx)
    }

    /// Merge a device's observed physical switch change up into the HA
    /// parent's matching sub-node.
    pub fn copy_child_ps_op_update_to_ha_parent(
        &self,
        updated_child_ps: &Node,
        parent_scope: Option<&NodeId>,
        change: &NodeChange,
        tx: &mut dyn Transaction<Observed>,
    ) -> Result<MergeStats, CoreError> {
        let Some(parent_scope) = parent_scope else {
            return Ok(MergeStats::default());
        };
        op_updated::copy_physical_switch(&self.registry, updated_child_ps, parent_scope, change, tx)
    }

    /// Push an HA parent's desired global change down to one device.
    pub fn copy_ha_global_update_to_child(
        &self,
        child_scope: Option<&NodeId>,
        change: &NodeChange,
        tx: &mut dyn Transaction<Desired>,
    ) -> Result<MergeStats, CoreError> {
        let Some(child_scope) = child_scope else {
            return Ok(MergeStats::default());
        };
        config_updated::copy_global(&self.registry, child_scope, change, tx)
    }

    /// Push an HA parent's desired physical switch change down to one device.
    pub fn copy_ha_ps_update_to_child(
        &self,
        child_scope: Option<&NodeId>,
        change: &NodeChange,
        tx: &mut dyn Transaction<Desired>,
    ) -> Result<MergeStats, CoreError> {
        let Some(child_scope) = child_scope else {
            return Ok(MergeStats::default());
        };
        config_updated::copy_physical_switch(&self.registry, child_scope, change, tx)
    }
}

impl Default for HaEventHandler {
    fn default() -> Self {
        Self::new(Arc::new(CommandRegistry::new()))
    }
}
