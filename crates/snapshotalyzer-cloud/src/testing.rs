//! In-memory `ResourceClient` that records every call
//!
//! Stop and start move an instance into `stopping` / `pending`; the next
//! `describe_instance` completes the transition, so waiters see at least one
//! intermediate state. New snapshots start out `pending`.

use crate::error::{CloudError, Result};
use crate::model::{Instance, InstanceFilter, InstanceState, Snapshot, SnapshotState, Volume};
use crate::provider::ResourceClient;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// One recorded provider call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListInstances(InstanceFilter),
    DescribeInstance(String),
    ListVolumes(String),
    ListSnapshots(String),
    Stop(String),
    Start(String),
    Reboot(String),
    CreateSnapshot(String),
}

impl Call {
    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            Call::Stop(_) | Call::Start(_) | Call::Reboot(_) | Call::CreateSnapshot(_)
        )
    }
}

#[derive(Default)]
struct Inner {
    instances: Vec<Instance>,
    volumes: HashMap<String, Vec<Volume>>,
    snapshots: HashMap<String, Vec<Snapshot>>,
    calls: Vec<Call>,
    failing: HashSet<(&'static str, String)>,
    fail_queries: bool,
    stuck: HashSet<String>,
    next_snapshot: u32,
}

#[derive(Default)]
pub struct FakeClient {
    inner: Mutex<Inner>,
}

impl FakeClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_instance(self, instance: Instance) -> Self {
        self.lock().instances.push(instance);
        self
    }

    pub fn with_volume(self, volume: Volume) -> Self {
        self.lock()
            .volumes
            .entry(volume.instance_id.clone())
            .or_default()
            .push(volume);
        self
    }

    pub fn with_snapshot(self, snapshot: Snapshot) -> Self {
        self.lock()
            .snapshots
            .entry(snapshot.volume_id.clone())
            .or_default()
            .push(snapshot);
        self
    }

    /// Make `op` ("describe", "list_volumes", "list_snapshots", "stop", "start",
    /// "reboot", "create_snapshot") fail for `resource_id`
    pub fn failing(self, op: &'static str, resource_id: impl Into<String>) -> Self {
        self.lock().failing.insert((op, resource_id.into()));
        self
    }

    /// Make every instance query fail
    pub fn failing_queries(self) -> Self {
        self.lock().fail_queries = true;
        self
    }

    /// Instance never finishes a stop/start transition
    pub fn stuck(self, instance_id: impl Into<String>) -> Self {
        self.lock().stuck.insert(instance_id.into());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub fn mutating_calls(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_mutating).collect()
    }

    pub fn count(&self, call: &Call) -> usize {
        self.lock().calls.iter().filter(|c| *c == call).count()
    }

    pub fn instance_state(&self, instance_id: &str) -> Option<InstanceState> {
        self.lock()
            .instances
            .iter()
            .find(|i| i.id == instance_id)
            .map(|i| i.state)
    }

    pub fn snapshots_of(&self, volume_id: &str) -> Vec<Snapshot> {
        self.lock()
            .snapshots
            .get(volume_id)
            .cloned()
            .unwrap_or_default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Inner {
    fn check(&self, op: &'static str, resource_id: &str) -> Result<()> {
        if self.failing.contains(&(op, resource_id.to_string())) {
            return Err(CloudError::ApiError(format!("injected {op} failure")));
        }
        Ok(())
    }

    fn instance_mut(&mut self, instance_id: &str) -> Result<&mut Instance> {
        self.instances
            .iter_mut()
            .find(|i| i.id == instance_id)
            .ok_or_else(|| CloudError::InstanceNotFound(instance_id.to_string()))
    }
}

#[async_trait]
impl ResourceClient for FakeClient {
    fn name(&self) -> &str {
        "fake"
    }

    async fn list_instances(&self, filter: &InstanceFilter) -> Result<Vec<Instance>> {
        let mut inner = self.lock();
        inner.calls.push(Call::ListInstances(filter.clone()));
        if inner.fail_queries {
            return Err(CloudError::AuthenticationFailed("injected".to_string()));
        }
        Ok(inner
            .instances
            .iter()
            .filter(|i| filter.matches(i))
            .cloned()
            .collect())
    }

    async fn describe_instance(&self, instance_id: &str) -> Result<Option<Instance>> {
        let mut inner = self.lock();
        inner
            .calls
            .push(Call::DescribeInstance(instance_id.to_string()));
        inner.check("describe", instance_id)?;
        let stuck = inner.stuck.contains(instance_id);
        let Some(instance) = inner.instances.iter_mut().find(|i| i.id == instance_id) else {
            return Ok(None);
        };
        let seen = instance.clone();
        if !stuck {
            instance.state = match instance.state {
                InstanceState::Stopping => InstanceState::Stopped,
                InstanceState::Pending => InstanceState::Running,
                other => other,
            };
        }
        Ok(Some(seen))
    }

    async fn list_volumes(&self, instance_id: &str) -> Result<Vec<Volume>> {
        let mut inner = self.lock();
        inner.calls.push(Call::ListVolumes(instance_id.to_string()));
        inner.check("list_volumes", instance_id)?;
        Ok(inner.volumes.get(instance_id).cloned().unwrap_or_default())
    }

    async fn list_snapshots(&self, volume_id: &str) -> Result<Vec<Snapshot>> {
        let mut inner = self.lock();
        inner.calls.push(Call::ListSnapshots(volume_id.to_string()));
        inner.check("list_snapshots", volume_id)?;
        Ok(inner.snapshots.get(volume_id).cloned().unwrap_or_default())
    }

    async fn stop_instance(&self, instance_id: &str) -> Result<()> {
        let mut inner = self.lock();
        inner.calls.push(Call::Stop(instance_id.to_string()));
        inner.check("stop", instance_id)?;
        let instance = inner.instance_mut(instance_id)?;
        if instance.state != InstanceState::Stopped {
            instance.state = InstanceState::Stopping;
        }
        Ok(())
    }

    async fn start_instance(&self, instance_id: &str) -> Result<()> {
        let mut inner = self.lock();
        inner.calls.push(Call::Start(instance_id.to_string()));
        inner.check("start", instance_id)?;
        let instance = inner.instance_mut(instance_id)?;
        if instance.state != InstanceState::Running {
            instance.state = InstanceState::Pending;
        }
        Ok(())
    }

    async fn reboot_instance(&self, instance_id: &str) -> Result<()> {
        let mut inner = self.lock();
        inner.calls.push(Call::Reboot(instance_id.to_string()));
        inner.check("reboot", instance_id)?;
        inner.instance_mut(instance_id)?;
        Ok(())
    }

    async fn create_snapshot(&self, volume_id: &str, description: &str) -> Result<Snapshot> {
        let mut inner = self.lock();
        inner
            .calls
            .push(Call::CreateSnapshot(volume_id.to_string()));
        inner.check("create_snapshot", volume_id)?;
        inner.next_snapshot += 1;
        let mut snapshot = Snapshot::new(
            format!("snap-{:04}", inner.next_snapshot),
            volume_id,
            SnapshotState::Pending,
        );
        snapshot.progress = Some("0%".to_string());
        snapshot.description = Some(description.to_string());
        inner
            .snapshots
            .entry(volume_id.to_string())
            .or_default()
            .push(snapshot.clone());
        Ok(snapshot)
    }
}
