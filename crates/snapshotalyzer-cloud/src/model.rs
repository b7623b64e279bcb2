//! Plain data snapshots of provider resources
//!
//! Every value here is fetched fresh from the provider for one command and
//! dropped afterwards. Nothing is cached between calls.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Tag key used to group instances into projects
pub const PROJECT_TAG: &str = "Project";

/// Lifecycle state of a compute instance (provider-defined)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InstanceState {
    Pending,
    Running,
    Stopping,
    Stopped,
    ShuttingDown,
    Terminated,
    Rebooting,
    Unknown,
}

impl InstanceState {
    /// Parse a provider state name
    pub fn parse(s: &str) -> Self {
        match s {
            "pending" => Self::Pending,
            "running" => Self::Running,
            "stopping" => Self::Stopping,
            "stopped" => Self::Stopped,
            "shutting-down" => Self::ShuttingDown,
            "terminated" => Self::Terminated,
            "rebooting" => Self::Rebooting,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
            Self::ShuttingDown => "shutting-down",
            Self::Terminated => "terminated",
            Self::Rebooting => "rebooting",
            Self::Unknown => "unknown",
        }
    }

    /// Whether a snapshot run has to stop this instance and bring it back up afterwards
    pub fn needs_restart(&self) -> bool {
        matches!(self, Self::Running | Self::Pending)
    }

    /// States the instance can never leave
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::ShuttingDown | Self::Terminated)
    }
}

impl std::fmt::Display for InstanceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State of a volume snapshot; transitions are driven by the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SnapshotState {
    Pending,
    Completed,
    Error,
    Unknown,
}

impl SnapshotState {
    pub fn parse(s: &str) -> Self {
        match s {
            "pending" => Self::Pending,
            "completed" => Self::Completed,
            "error" => Self::Error,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Error => "error",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for SnapshotState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A compute instance as seen at query time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    pub id: String,
    pub state: InstanceState,
    pub tags: BTreeMap<String, String>,
    pub instance_type: Option<String>,
    pub availability_zone: Option<String>,
    pub public_ip_address: Option<String>,
    pub public_dns_name: Option<String>,
}

impl Instance {
    pub fn new(id: impl Into<String>, state: InstanceState) -> Self {
        Self {
            id: id.into(),
            state,
            tags: BTreeMap::new(),
            instance_type: None,
            availability_zone: None,
            public_ip_address: None,
            public_dns_name: None,
        }
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// Value of the `Project` tag
    pub fn project(&self) -> Option<&str> {
        self.tag(PROJECT_TAG)
    }
}

/// A block-storage volume attached to an instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Volume {
    pub id: String,
    /// Owning instance (back-reference only)
    pub instance_id: String,
    pub state: String,
    pub size_gib: Option<i32>,
    pub encrypted: bool,
}

impl Volume {
    pub fn new(id: impl Into<String>, instance_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            instance_id: instance_id.into(),
            state: "in-use".to_string(),
            size_gib: None,
            encrypted: false,
        }
    }
}

/// A point-in-time copy of a volume
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: String,
    pub volume_id: String,
    pub state: SnapshotState,
    pub progress: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub description: Option<String>,
}

impl Snapshot {
    pub fn new(id: impl Into<String>, volume_id: impl Into<String>, state: SnapshotState) -> Self {
        Self {
            id: id.into(),
            volume_id: volume_id.into(),
            state,
            progress: None,
            start_time: None,
            description: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.state == SnapshotState::Pending
    }
}

/// Query passed to `ResourceClient::list_instances`
///
/// Both parts are ANDed; an empty filter matches every instance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstanceFilter {
    /// Required value of the `Project` tag
    pub project: Option<String>,
    /// Restrict to these identifiers (empty means no restriction)
    pub instance_ids: Vec<String>,
}

impl InstanceFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    pub fn instance_id(mut self, id: impl Into<String>) -> Self {
        self.instance_ids.push(id.into());
        self
    }

    pub fn matches(&self, instance: &Instance) -> bool {
        if let Some(project) = &self.project {
            if instance.project() != Some(project.as_str()) {
                return false;
            }
        }
        self.instance_ids.is_empty() || self.instance_ids.iter().any(|id| *id == instance.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_state_parse() {
        assert_eq!(InstanceState::parse("running"), InstanceState::Running);
        assert_eq!(
            InstanceState::parse("shutting-down"),
            InstanceState::ShuttingDown
        );
        assert_eq!(InstanceState::parse("hibernating"), InstanceState::Unknown);
        assert_eq!(InstanceState::Stopped.to_string(), "stopped");
    }

    #[test]
    fn test_needs_restart() {
        assert!(InstanceState::Running.needs_restart());
        assert!(InstanceState::Pending.needs_restart());
        assert!(!InstanceState::Stopped.needs_restart());
        assert!(!InstanceState::Stopping.needs_restart());
        assert!(!InstanceState::Terminated.needs_restart());
    }

    #[test]
    fn test_filter_matches() {
        let demo = Instance::new("i-1", InstanceState::Running).with_tag("Project", "demo");
        let other = Instance::new("i-2", InstanceState::Stopped).with_tag("Project", "other");
        let untagged = Instance::new("i-3", InstanceState::Running);

        let all = InstanceFilter::new();
        assert!(all.matches(&demo) && all.matches(&other) && all.matches(&untagged));

        let by_project = InstanceFilter::new().project("demo");
        assert!(by_project.matches(&demo));
        assert!(!by_project.matches(&other));
        assert!(!by_project.matches(&untagged));

        let by_id = InstanceFilter::new().instance_id("i-2");
        assert!(by_id.matches(&other));
        assert!(!by_id.matches(&demo));

        // tag AND id
        let both = InstanceFilter::new().project("demo").instance_id("i-2");
        assert!(!both.matches(&other));
        assert!(!both.matches(&demo));
    }

    #[test]
    fn test_state_serializes_as_provider_name() {
        let json = serde_json::to_string(&InstanceState::ShuttingDown).unwrap();
        assert_eq!(json, "\"shutting-down\"");
    }
}
