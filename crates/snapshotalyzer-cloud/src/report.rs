//! Outcome of a snapshot run

use crate::error::ResourceActionError;
use crate::model::InstanceState;

/// What happened to one volume
#[derive(Debug)]
pub enum VolumeOutcome {
    /// A new snapshot was requested
    Created {
        volume_id: String,
        snapshot_id: String,
    },
    /// Skipped because a snapshot was already pending (not a failure)
    Skipped {
        volume_id: String,
        pending_snapshot_ids: Vec<String>,
    },
    /// Snapshot check or creation failed; details are in `InstanceOutcome::failures`
    Failed { volume_id: String },
}

/// Result of processing a single instance
#[derive(Debug)]
pub struct InstanceOutcome {
    pub instance_id: String,
    /// State read at the start of processing
    pub initial_state: InstanceState,
    /// Whether the instance was stopped for snapshotting
    pub stopped: bool,
    /// Whether the instance was confirmed running again afterwards
    pub restarted: bool,
    pub volumes: Vec<VolumeOutcome>,
    pub failures: Vec<ResourceActionError>,
}

impl InstanceOutcome {
    pub fn new(instance_id: impl Into<String>, initial_state: InstanceState) -> Self {
        Self {
            instance_id: instance_id.into(),
            initial_state,
            stopped: false,
            restarted: false,
            volumes: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Running before and running after, or not running and never touched
    pub fn preserved_state(&self) -> bool {
        if self.initial_state.needs_restart() {
            self.restarted
        } else {
            !self.stopped
        }
    }
}

/// Result of a whole run
#[derive(Debug, Default)]
pub struct RunReport {
    pub instances: Vec<InstanceOutcome>,
    /// The run was halted between instances
    pub cancelled: bool,
    /// Total execution time in milliseconds
    pub duration_ms: u64,
}

impl RunReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_success(&self) -> bool {
        !self.cancelled && self.instances.iter().all(InstanceOutcome::is_success)
    }

    pub fn failures(&self) -> impl Iterator<Item = &ResourceActionError> {
        self.instances.iter().flat_map(|i| i.failures.iter())
    }

    pub fn summary(&self) -> RunSummary {
        let mut summary = RunSummary {
            instances: self.instances.len(),
            ..RunSummary::default()
        };
        for volume in self.instances.iter().flat_map(|i| i.volumes.iter()) {
            match volume {
                VolumeOutcome::Created { .. } => summary.created += 1,
                VolumeOutcome::Skipped { .. } => summary.skipped += 1,
                VolumeOutcome::Failed { .. } => {}
            }
        }
        summary.failed = self.failures().count();
        summary
    }
}

/// Counts for the final status line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub instances: usize,
    pub created: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} instances, {} snapshots created, {} skipped, {} failed",
            self.instances, self.created, self.skipped, self.failed
        )
    }
}
