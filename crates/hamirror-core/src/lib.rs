//! Differential state mirroring between HA logical nodes and their
//! physical devices.
//!
//! Devices report observed state; operators configure desired state on the
//! HA parent. This crate keeps the two sides in step:
//!
//! - **[`HaEventHandler`]**: the six lifecycle entry points. Device attach
//!   and reattach merge observed state up into the parent and push parent
//!   config down; incremental observed and desired changes are carried
//!   across differentially.
//!
//! - **[`MergeCommand`]**: one strategy object per record kind (logical
//!   switches, local/remote unicast and multicast MACs, switch membership,
//!   tunnels, termination points). Each supplies the key, payload equality
//!   and scope transform; the diff core (`diff_of`, `diff_by_key`,
//!   `transform_update`, ...) is written once on the trait.
//!
//! - **[`CommandRegistry`]**: the descriptors grouped per container type.
//!
//! - **[`Transaction`]**: the store contract the engine writes into, bound
//!   to the desired or observed namespace at the type level.
//!   [`MemoryStore`] is a dashmap-backed implementation with all-or-nothing
//!   commits and a change broadcast.
//!
//! - **[`ReconcileQueue`]**: serializes reconciliation per logical node on
//!   tokio workers.
//!
//! Records compare by payload, never by their device-local identity, so a
//! device and its HA parent holding the same entry under different ids see
//! no difference and nothing is rewritten.

pub mod command;
pub mod config;
pub mod error;
pub mod ha;
pub mod model;
pub mod queue;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use command::{CommandRegistry, MergeCommand, MergeCommandsAggregator, MergeStats};
pub use config::EngineConfig;
pub use error::CoreError;
pub use ha::{HaEventHandler, HaSyncState, PriorParentConfig};
pub use queue::ReconcileQueue;
pub use store::{
    Datastore, Desired, MemoryStore, MemoryTransaction, Namespace, NodeChange, Observed,
    StoreEvent, Transaction,
};

pub use model::{
    Entry, GlobalAugmentation, LocatorRef, LogicalSwitch, LogicalSwitchRef, MacAddress, MacKey,
    McastMac, Node, NodeId, PhysicalSwitchAugmentation, PhysicalSwitchRef, Record, RecordKey,
    RecordKind, RecordPath, Rescope, SwitchMembership, TerminationPoint, TpId, Tunnel, TunnelKey,
    UcastMac,
};
