//! Error types for provider calls, instance selection and per-resource actions

use thiserror::Error;

/// Faults reported by a `ResourceClient` binding
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Instance not found: {0}")]
    InstanceNotFound(String),

    #[error("Instance {instance_id} reached '{actual}' while waiting for '{expected}'")]
    UnexpectedState {
        instance_id: String,
        expected: String,
        actual: String,
    },

    #[error("Timeout: instance {instance_id} not '{expected}' after {waited_secs}s")]
    Timeout {
        instance_id: String,
        expected: String,
        waited_secs: u64,
    },
}

pub type Result<T> = std::result::Result<T, CloudError>;

/// Errors that abort a whole command before any instance is processed
#[derive(Error, Debug)]
pub enum SelectionError {
    #[error(
        "no project or instance given; set --project or --instance, \
         or pass --force to run against every instance"
    )]
    Precondition,

    #[error("instance selection failed: {0}")]
    Query(#[source] CloudError),
}

/// The single provider action a `ResourceActionError` is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceAction {
    Describe,
    Stop,
    WaitStopped,
    Start,
    WaitRunning,
    Reboot,
    ListVolumes,
    CheckSnapshots,
    CreateSnapshot,
}

impl std::fmt::Display for ResourceAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceAction::Describe => write!(f, "describe"),
            ResourceAction::Stop => write!(f, "stop"),
            ResourceAction::WaitStopped => write!(f, "wait until stopped"),
            ResourceAction::Start => write!(f, "start"),
            ResourceAction::WaitRunning => write!(f, "wait until running"),
            ResourceAction::Reboot => write!(f, "reboot"),
            ResourceAction::ListVolumes => write!(f, "list volumes of"),
            ResourceAction::CheckSnapshots => write!(f, "check snapshots"),
            ResourceAction::CreateSnapshot => write!(f, "create snapshot"),
        }
    }
}

/// A failed stop/start/reboot/snapshot call, recorded against one resource.
///
/// Never fatal: the orchestrator collects these and moves on.
#[derive(Error, Debug)]
#[error("could not {action} {resource_id}: {source}")]
pub struct ResourceActionError {
    pub resource_id: String,
    pub action: ResourceAction,
    #[source]
    pub source: CloudError,
}

impl ResourceActionError {
    pub fn new(resource_id: impl Into<String>, action: ResourceAction, source: CloudError) -> Self {
        Self {
            resource_id: resource_id.into(),
            action,
            source,
        }
    }
}
