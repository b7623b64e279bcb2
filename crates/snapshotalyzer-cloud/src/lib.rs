//! Snapshotalyzer Cloud Core
//!
//! This crate holds the provider-neutral part of Snapshotalyzer: which
//! instances to touch, whether a volume already has a snapshot in flight,
//! and the stop → snapshot volumes → restart workflow that drives them.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                  shotty CLI                      │
//! │   (instances snapshot / start / stop / ...)      │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │             snapshotalyzer-cloud                 │
//! │  ┌──────────────┐  ┌──────────────────────────┐ │
//! │  │   Selector   │─▶│   LifecycleOrchestrator  │ │
//! │  └──────────────┘  │  (conflict check, waiter)│ │
//! │                    └──────────────────────────┘ │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │  trait ResourceClient { ... }            │   │
//! │  └──────────────────────────────────────────┘   │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//!           ┌───────▼────────┐
//!           │  ec2 (aws-sdk) │
//!           └────────────────┘
//! ```

pub mod conflict;
pub mod error;
pub mod model;
pub mod orchestrator;
pub mod power;
pub mod provider;
pub mod report;
pub mod selector;
#[cfg(any(test, feature = "test-util"))]
pub mod testing;
pub mod waiter;

// Re-exports
pub use conflict::{has_pending_snapshot, pending_snapshots};
pub use error::{CloudError, ResourceAction, ResourceActionError, Result, SelectionError};
pub use model::{Instance, InstanceFilter, InstanceState, Snapshot, SnapshotState, Volume};
pub use orchestrator::{
    CancelFlag, DEFAULT_SNAPSHOT_DESCRIPTION, LifecycleEvent, LifecycleOrchestrator,
    OrchestratorConfig, ProgressSink,
};
pub use power::{PowerAction, PowerReport, apply_power_action};
pub use provider::ResourceClient;
pub use report::{InstanceOutcome, RunReport, RunSummary, VolumeOutcome};
pub use selector::{SelectionCriteria, TargetSelector};
pub use waiter::{WaitConfig, wait_for_instance_state};
