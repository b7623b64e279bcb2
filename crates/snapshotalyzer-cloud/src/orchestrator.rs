//! Stop → snapshot volumes → restart workflow
//!
//! Instances are processed one at a time, and the volumes of an instance one
//! at a time, so at most one instance is down at any moment. Per instance:
//!
//! ```text
//! Evaluate ──▶ MaybeStop ──▶ SnapshotVolumes ──▶ MaybeRestart ──▶ Done
//! ```
//!
//! The state is re-read when an instance's turn comes. Only instances that
//! are `running` or `pending` at that point are stopped, and only those are
//! started again. A failed provider call is recorded against its
//! resource and processing continues with the next volume or instance.

use crate::conflict::pending_snapshots;
use crate::error::{CloudError, ResourceAction, ResourceActionError};
use crate::model::{Instance, InstanceState};
use crate::provider::ResourceClient;
use crate::report::{InstanceOutcome, RunReport, RunSummary, VolumeOutcome};
use crate::waiter::{WaitConfig, wait_for_instance_state};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

/// Description attached to every snapshot created by a run
pub const DEFAULT_SNAPSHOT_DESCRIPTION: &str = "Created by Snapshotalyzer";

/// Orchestrator settings, built once at startup
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Polling schedule for the stopped/running confirmations
    pub wait: WaitConfig,
    pub snapshot_description: String,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            wait: WaitConfig::default(),
            snapshot_description: DEFAULT_SNAPSHOT_DESCRIPTION.to_string(),
        }
    }
}

/// Cooperative stop signal, checked between instances only
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Progress notification emitted on each state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    Stopping {
        instance_id: String,
    },
    Stopped {
        instance_id: String,
    },
    /// The instance was not running, so it is neither stopped nor restarted
    LeftInState {
        instance_id: String,
        state: InstanceState,
    },
    CheckingVolumes {
        instance_id: String,
        volumes: usize,
    },
    SkippingVolume {
        volume_id: String,
        pending_snapshot_ids: Vec<String>,
    },
    CreatingSnapshot {
        volume_id: String,
    },
    SnapshotCreated {
        volume_id: String,
        snapshot_id: String,
    },
    Starting {
        instance_id: String,
    },
    Started {
        instance_id: String,
    },
    Rebooting {
        instance_id: String,
    },
    ActionFailed {
        resource_id: String,
        action: ResourceAction,
        message: String,
    },
    Cancelled {
        remaining: usize,
    },
    Completed {
        summary: RunSummary,
    },
}

impl std::fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LifecycleEvent::Stopping { instance_id } => write!(f, "Stopping {}...", instance_id),
            LifecycleEvent::Stopped { instance_id } => write!(f, "{} stopped", instance_id),
            LifecycleEvent::LeftInState { instance_id, state } => {
                write!(f, "{} is {}, leaving it as is", instance_id, state)
            }
            LifecycleEvent::CheckingVolumes {
                instance_id,
                volumes,
            } => write!(f, "{} has {} volume(s)", instance_id, volumes),
            LifecycleEvent::SkippingVolume { volume_id, .. } => {
                write!(f, "Skipping {}, snapshot already in progress", volume_id)
            }
            LifecycleEvent::CreatingSnapshot { volume_id } => {
                write!(f, "Creating snapshot of {}", volume_id)
            }
            LifecycleEvent::SnapshotCreated {
                volume_id,
                snapshot_id,
            } => write!(f, "{} requested for {}", snapshot_id, volume_id),
            LifecycleEvent::Starting { instance_id } => write!(f, "Starting {}...", instance_id),
            LifecycleEvent::Started { instance_id } => write!(f, "{} running", instance_id),
            LifecycleEvent::Rebooting { instance_id } => write!(f, "Rebooting {}...", instance_id),
            LifecycleEvent::ActionFailed {
                resource_id,
                action,
                message,
            } => write!(f, "Could not {} {}. {}", action, resource_id, message),
            LifecycleEvent::Cancelled { remaining } => {
                write!(f, "Cancelled, {} instance(s) left untouched", remaining)
            }
            LifecycleEvent::Completed { .. } => write!(f, "Job done"),
        }
    }
}

/// Consumer of progress notifications (printing, logging, tests)
pub trait ProgressSink: Send + Sync {
    fn notify(&self, event: &LifecycleEvent);
}

/// Discards notifications; tracing output is still produced
impl ProgressSink for () {
    fn notify(&self, _event: &LifecycleEvent) {}
}

pub(crate) fn emit<S: ProgressSink + ?Sized>(sink: &S, event: LifecycleEvent) {
    match &event {
        LifecycleEvent::ActionFailed { .. } => tracing::warn!("{}", event),
        LifecycleEvent::CheckingVolumes { .. } => tracing::debug!("{}", event),
        _ => tracing::info!("{}", event),
    }
    sink.notify(&event);
}

pub(crate) fn record<S: ProgressSink + ?Sized>(
    sink: &S,
    failures: &mut Vec<ResourceActionError>,
    error: ResourceActionError,
) {
    emit(
        sink,
        LifecycleEvent::ActionFailed {
            resource_id: error.resource_id.clone(),
            action: error.action,
            message: error.source.to_string(),
        },
    );
    failures.push(error);
}

/// Drives selected instances through the snapshot workflow
pub struct LifecycleOrchestrator<'a, C: ResourceClient + ?Sized, S: ProgressSink + ?Sized> {
    client: &'a C,
    config: OrchestratorConfig,
    sink: &'a S,
    cancel: CancelFlag,
}

impl<'a, C, S> LifecycleOrchestrator<'a, C, S>
where
    C: ResourceClient + ?Sized,
    S: ProgressSink + ?Sized,
{
    pub fn new(client: &'a C, config: OrchestratorConfig, sink: &'a S) -> Self {
        Self {
            client,
            config,
            sink,
            cancel: CancelFlag::new(),
        }
    }

    pub fn with_cancellation(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Process every instance in order. Never fails as a whole; per-resource
    /// failures end up in the report.
    pub async fn run(&self, instances: &[Instance]) -> RunReport {
        let started = Instant::now();
        let mut report = RunReport::new();

        for (index, instance) in instances.iter().enumerate() {
            if self.cancel.is_cancelled() {
                report.cancelled = true;
                emit(
                    self.sink,
                    LifecycleEvent::Cancelled {
                        remaining: instances.len() - index,
                    },
                );
                break;
            }
            let outcome = self.process_instance(instance).await;
            report.instances.push(outcome);
        }

        report.duration_ms = started.elapsed().as_millis() as u64;
        emit(
            self.sink,
            LifecycleEvent::Completed {
                summary: report.summary(),
            },
        );
        report
    }

    async fn process_instance(&self, instance: &Instance) -> InstanceOutcome {
        // Evaluate against the live state, not the one seen at selection
        let current = match self.client.describe_instance(&instance.id).await {
            Ok(Some(current)) => Ok(current.state),
            Ok(None) => Err(CloudError::InstanceNotFound(instance.id.clone())),
            Err(source) => Err(source),
        };
        let state = match current {
            Ok(state) => state,
            Err(source) => {
                let mut outcome = InstanceOutcome::new(&instance.id, instance.state);
                let error =
                    ResourceActionError::new(&instance.id, ResourceAction::Describe, source);
                record(self.sink, &mut outcome.failures, error);
                return outcome;
            }
        };
        let mut outcome = InstanceOutcome::new(&instance.id, state);
        let needs_restart = state.needs_restart();

        // MaybeStop
        if needs_restart {
            self.stop(&instance.id, &mut outcome).await;
        } else {
            emit(
                self.sink,
                LifecycleEvent::LeftInState {
                    instance_id: instance.id.clone(),
                    state,
                },
            );
        }

        // SnapshotVolumes
        self.snapshot_volumes(&instance.id, &mut outcome).await;

        // MaybeRestart
        if needs_restart {
            self.start(&instance.id, &mut outcome).await;
        }

        outcome
    }

    async fn stop(&self, instance_id: &str, outcome: &mut InstanceOutcome) {
        emit(
            self.sink,
            LifecycleEvent::Stopping {
                instance_id: instance_id.to_string(),
            },
        );

        if let Err(source) = self.client.stop_instance(instance_id).await {
            let error = ResourceActionError::new(instance_id, ResourceAction::Stop, source);
            record(self.sink, &mut outcome.failures, error);
            return;
        }
        outcome.stopped = true;

        match wait_for_instance_state(
            self.client,
            instance_id,
            InstanceState::Stopped,
            &self.config.wait,
        )
        .await
        {
            Ok(()) => emit(
                self.sink,
                LifecycleEvent::Stopped {
                    instance_id: instance_id.to_string(),
                },
            ),
            Err(source) => {
                let error =
                    ResourceActionError::new(instance_id, ResourceAction::WaitStopped, source);
                record(self.sink, &mut outcome.failures, error);
            }
        }
    }

    async fn start(&self, instance_id: &str, outcome: &mut InstanceOutcome) {
        emit(
            self.sink,
            LifecycleEvent::Starting {
                instance_id: instance_id.to_string(),
            },
        );

        if let Err(source) = self.client.start_instance(instance_id).await {
            let error = ResourceActionError::new(instance_id, ResourceAction::Start, source);
            record(self.sink, &mut outcome.failures, error);
            return;
        }

        match wait_for_instance_state(
            self.client,
            instance_id,
            InstanceState::Running,
            &self.config.wait,
        )
        .await
        {
            Ok(()) => {
                outcome.restarted = true;
                emit(
                    self.sink,
                    LifecycleEvent::Started {
                        instance_id: instance_id.to_string(),
                    },
                );
            }
            Err(source) => {
                let error =
                    ResourceActionError::new(instance_id, ResourceAction::WaitRunning, source);
                record(self.sink, &mut outcome.failures, error);
            }
        }
    }

    async fn snapshot_volumes(&self, instance_id: &str, outcome: &mut InstanceOutcome) {
        let volumes = match self.client.list_volumes(instance_id).await {
            Ok(volumes) => volumes,
            Err(source) => {
                let error =
                    ResourceActionError::new(instance_id, ResourceAction::ListVolumes, source);
                record(self.sink, &mut outcome.failures, error);
                return;
            }
        };

        emit(
            self.sink,
            LifecycleEvent::CheckingVolumes {
                instance_id: instance_id.to_string(),
                volumes: volumes.len(),
            },
        );

        for volume in &volumes {
            match pending_snapshots(self.client, &volume.id).await {
                Ok(pending) if !pending.is_empty() => {
                    let pending_snapshot_ids: Vec<String> =
                        pending.into_iter().map(|s| s.id).collect();
                    emit(
                        self.sink,
                        LifecycleEvent::SkippingVolume {
                            volume_id: volume.id.clone(),
                            pending_snapshot_ids: pending_snapshot_ids.clone(),
                        },
                    );
                    outcome.volumes.push(VolumeOutcome::Skipped {
                        volume_id: volume.id.clone(),
                        pending_snapshot_ids,
                    });
                    continue;
                }
                Ok(_) => {}
                Err(source) => {
                    // an unverified volume is never snapshotted
                    let error = ResourceActionError::new(
                        &volume.id,
                        ResourceAction::CheckSnapshots,
                        source,
                    );
                    record(self.sink, &mut outcome.failures, error);
                    outcome.volumes.push(VolumeOutcome::Failed {
                        volume_id: volume.id.clone(),
                    });
                    continue;
                }
            }

            emit(
                self.sink,
                LifecycleEvent::CreatingSnapshot {
                    volume_id: volume.id.clone(),
                },
            );

            match self
                .client
                .create_snapshot(&volume.id, &self.config.snapshot_description)
                .await
            {
                Ok(snapshot) => {
                    emit(
                        self.sink,
                        LifecycleEvent::SnapshotCreated {
                            volume_id: volume.id.clone(),
                            snapshot_id: snapshot.id.clone(),
                        },
                    );
                    outcome.volumes.push(VolumeOutcome::Created {
                        volume_id: volume.id.clone(),
                        snapshot_id: snapshot.id,
                    });
                }
                Err(source) => {
                    let error = ResourceActionError::new(
                        &volume.id,
                        ResourceAction::CreateSnapshot,
                        source,
                    );
                    record(self.sink, &mut outcome.failures, error);
                    outcome.volumes.push(VolumeOutcome::Failed {
                        volume_id: volume.id.clone(),
                    });
                }
            }
        }
    }
}
