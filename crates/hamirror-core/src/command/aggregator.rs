// ── Per-container descriptor lists ──
//
// Descriptors have different item types, so each is erased to the
// container it reads from. An aggregator fans a merge operation out over
// every descriptor of one container type, in registration order.

use tracing::debug;

use super::{
    LocalMcastCmd, LocalUcastCmd, LogicalSwitchesCmd, MergeCommand, MergeStats, RemoteMcastCmd,
    RemoteUcastCmd, SwitchesCmd, TerminationPointCmd, TunnelCmd,
};
use crate::config::EngineConfig;
use crate::model::{GlobalAugmentation, Node, NodeId, PhysicalSwitchAugmentation, RecordKind};
use crate::store::{Desired, Observed, Transaction};

/// A descriptor seen only through the container it operates on.
pub trait ErasedCommand<C>: Send + Sync {
    fn kind(&self) -> RecordKind;

    fn description(&self) -> &'static str;

    fn merge_operational_data(
        &self,
        dst: &mut C,
        existing_dst: Option<&C>,
        src: Option<&C>,
        dest: &NodeId,
    ) -> usize;

    fn merge_config_data(&self, dst: &mut C, src: Option<&C>, dest: &NodeId) -> usize;

    fn merge_op_update(
        &self,
        orig_dst: Option<&C>,
        updated_src: Option<&C>,
        orig_src: Option<&C>,
        dest: &NodeId,
        tx: &mut dyn Transaction<Observed>,
    ) -> MergeStats;

    fn merge_config_update(
        &self,
        existing_dst: Option<&C>,
        updated_src: Option<&C>,
        orig_src: Option<&C>,
        dest: &NodeId,
        tx: &mut dyn Transaction<Desired>,
    ) -> MergeStats;
}

impl<M: MergeCommand> ErasedCommand<M::Container> for M {
    fn kind(&self) -> RecordKind {
        MergeCommand::kind(self)
    }

    fn description(&self) -> &'static str {
        MergeCommand::description(self)
    }

    fn merge_operational_data(
        &self,
        dst: &mut M::Container,
        existing_dst: Option<&M::Container>,
        src: Option<&M::Container>,
        dest: &NodeId,
    ) -> usize {
        MergeCommand::merge_operational_data(self, dst, existing_dst, src, dest)
    }

    fn merge_config_data(
        &self,
        dst: &mut M::Container,
        src: Option<&M::Container>,
        dest: &NodeId,
    ) -> usize {
        MergeCommand::merge_config_data(self, dst, src, dest)
    }

    fn merge_op_update(
        &self,
        orig_dst: Option<&M::Container>,
        updated_src: Option<&M::Container>,
        orig_src: Option<&M::Container>,
        dest: &NodeId,
        tx: &mut dyn Transaction<Observed>,
    ) -> MergeStats {
        MergeCommand::merge_op_update(self, orig_dst, updated_src, orig_src, dest, tx)
    }

    fn merge_config_update(
        &self,
        existing_dst: Option<&M::Container>,
        updated_src: Option<&M::Container>,
        orig_src: Option<&M::Container>,
        dest: &NodeId,
        tx: &mut dyn Transaction<Desired>,
    ) -> MergeStats {
        MergeCommand::merge_config_update(self, existing_dst, updated_src, orig_src, dest, tx)
    }
}

// ── Aggregator ──────────────────────────────────────────────────────

/// Ordered descriptors for containers of type `C`.
pub struct MergeCommandsAggregator<C> {
    commands: Vec<Box<dyn ErasedCommand<C>>>,
}

impl<C: 'static> MergeCommandsAggregator<C> {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }

    /// Register a descriptor unless `config` disables its kind.
    pub fn register<M>(&mut self, command: M, config: &EngineConfig)
    where
        M: MergeCommand<Container = C>,
    {
        let kind = MergeCommand::kind(&command);
        if config.is_enabled(kind) {
            self.commands.push(Box::new(command));
        } else {
            debug!(%kind, "descriptor disabled by configuration");
        }
    }

    pub fn kinds(&self) -> Vec<RecordKind> {
        self.commands.iter().map(|c| c.kind()).collect()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Add-only merge of every kind. Returns the number of records merged.
    pub fn merge_operational_data(
        &self,
        dst: &mut C,
        existing_dst: Option<&C>,
        src: Option<&C>,
        dest: &NodeId,
    ) -> usize {
        self.commands
            .iter()
            .map(|c| c.merge_operational_data(dst, existing_dst, src, dest))
            .sum()
    }

    /// Authoritative copy of every kind. Returns the number of records copied.
    pub fn merge_config_data(&self, dst: &mut C, src: Option<&C>, dest: &NodeId) -> usize {
        self.commands
            .iter()
            .map(|c| c.merge_config_data(dst, src, dest))
            .sum()
    }

    pub fn merge_op_update(
        &self,
        orig_dst: Option<&C>,
        updated_src: Option<&C>,
        orig_src: Option<&C>,
        dest: &NodeId,
        tx: &mut dyn Transaction<Observed>,
    ) -> MergeStats {
        let mut stats = MergeStats::default();
        for c in &self.commands {
            stats += c.merge_op_update(orig_dst, updated_src, orig_src, dest, tx);
        }
        stats
    }

    pub fn merge_config_update(
        &self,
        existing_dst: Option<&C>,
        updated_src: Option<&C>,
        orig_src: Option<&C>,
        dest: &NodeId,
        tx: &mut dyn Transaction<Desired>,
    ) -> MergeStats {
        let mut stats = MergeStats::default();
        for c in &self.commands {
            stats += c.merge_config_update(existing_dst, updated_src, orig_src, dest, tx);
        }
        stats
    }
}

impl<C: 'static> Default for MergeCommandsAggregator<C> {
    fn default() -> Self {
        Self::new()
    }
}

// ── Registry ────────────────────────────────────────────────────────

/// The three aggregators, built once and read-only afterwards.
pub struct CommandRegistry {
    global: MergeCommandsAggregator<GlobalAugmentation>,
    physical_switch: MergeCommandsAggregator<PhysicalSwitchAugmentation>,
    node: MergeCommandsAggregator<Node>,
}

impl CommandRegistry {
    /// Every descriptor enabled.
    pub fn new() -> Self {
        Self::from_config(&EngineConfig::default())
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        let mut global = MergeCommandsAggregator::new();
        global.register(LogicalSwitchesCmd, config);
        global.register(RemoteUcastCmd, config);
        global.register(LocalUcastCmd, config);
        global.register(RemoteMcastCmd, config);
        global.register(LocalMcastCmd, config);
        global.register(SwitchesCmd, config);

        let mut physical_switch = MergeCommandsAggregator::new();
        physical_switch.register(TunnelCmd, config);

        let mut node = MergeCommandsAggregator::new();
        node.register(TerminationPointCmd, config);

        debug!(
            global = global.len(),
            physical_switch = physical_switch.len(),
            node = node.len(),
            "command registry built"
        );

        Self {
            global,
            physical_switch,
            node,
        }
    }

    pub fn global(&self) -> &MergeCommandsAggregator<GlobalAugmentation> {
        &self.global
    }

    pub fn physical_switch(&self) -> &MergeCommandsAggregator<PhysicalSwitchAugmentation> {
        &self.physical_switch
    }

    pub fn node(&self) -> &MergeCommandsAggregator<Node> {
        &self.node
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}
