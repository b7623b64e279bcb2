//! Bulk start / stop / reboot of selected instances

use crate::error::{ResourceAction, ResourceActionError};
use crate::model::{Instance, InstanceState};
use crate::orchestrator::{LifecycleEvent, ProgressSink, emit, record};
use crate::provider::ResourceClient;
use crate::waiter::{WaitConfig, wait_for_instance_state};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerAction {
    Start,
    Stop,
    Reboot,
}

impl PowerAction {
    fn resource_action(self) -> ResourceAction {
        match self {
            PowerAction::Start => ResourceAction::Start,
            PowerAction::Stop => ResourceAction::Stop,
            PowerAction::Reboot => ResourceAction::Reboot,
        }
    }

    /// State to wait for after the request; reboot has none
    fn target_state(self) -> Option<(InstanceState, ResourceAction)> {
        match self {
            PowerAction::Start => Some((InstanceState::Running, ResourceAction::WaitRunning)),
            PowerAction::Stop => Some((InstanceState::Stopped, ResourceAction::WaitStopped)),
            PowerAction::Reboot => None,
        }
    }
}

impl std::fmt::Display for PowerAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PowerAction::Start => write!(f, "start"),
            PowerAction::Stop => write!(f, "stop"),
            PowerAction::Reboot => write!(f, "reboot"),
        }
    }
}

/// Per-instance results of a power action
#[derive(Debug, Default)]
pub struct PowerReport {
    pub succeeded: Vec<String>,
    pub failed: Vec<ResourceActionError>,
}

impl PowerReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Apply `action` to each instance in order, continuing past failures.
///
/// With `wait`, start and stop block until the instance reports
/// `running` / `stopped` before moving to the next one.
pub async fn apply_power_action<C, S>(
    client: &C,
    instances: &[Instance],
    action: PowerAction,
    wait: Option<&WaitConfig>,
    sink: &S,
) -> PowerReport
where
    C: ResourceClient + ?Sized,
    S: ProgressSink + ?Sized,
{
    let mut report = PowerReport::default();

    for instance in instances {
        let id = instance.id.clone();
        let announce = match action {
            PowerAction::Start => LifecycleEvent::Starting { instance_id: id },
            PowerAction::Stop => LifecycleEvent::Stopping { instance_id: id },
            PowerAction::Reboot => LifecycleEvent::Rebooting { instance_id: id },
        };
        emit(sink, announce);

        let requested = match action {
            PowerAction::Start => client.start_instance(&instance.id).await,
            PowerAction::Stop => client.stop_instance(&instance.id).await,
            PowerAction::Reboot => client.reboot_instance(&instance.id).await,
        };
        if let Err(source) = requested {
            let error = ResourceActionError::new(&instance.id, action.resource_action(), source);
            record(sink, &mut report.failed, error);
            continue;
        }

        if let (Some(config), Some((target, wait_action))) = (wait, action.target_state()) {
            if let Err(source) = wait_for_instance_state(client, &instance.id, target, config).await
            {
                let error = ResourceActionError::new(&instance.id, wait_action, source);
                record(sink, &mut report.failed, error);
                continue;
            }
            let id = instance.id.clone();
            let reached = match action {
                PowerAction::Start => LifecycleEvent::Started { instance_id: id },
                _ => LifecycleEvent::Stopped { instance_id: id },
            };
            emit(sink, reached);
        }

        report.succeeded.push(instance.id.clone());
    }

    report
}
