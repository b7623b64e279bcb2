//! Resource client trait definition

use crate::error::Result;
use crate::model::{Instance, InstanceFilter, Snapshot, Volume};
use async_trait::async_trait;

/// Cloud resource query interface
///
/// Bindings (EC2, the in-memory fake used by tests) implement this trait and
/// return plain data per call. Mutating calls return as soon as the provider
/// accepts the request; blocking until a state is reached is done by
/// [`crate::waiter::wait_for_instance_state`].
#[async_trait]
pub trait ResourceClient: Send + Sync {
    /// Returns the binding name (e.g., "ec2")
    fn name(&self) -> &str;

    /// List instances matching the filter.
    ///
    /// An identifier that does not exist contributes nothing to the result;
    /// it is not an error.
    async fn list_instances(&self, filter: &InstanceFilter) -> Result<Vec<Instance>>;

    /// Fetch a single instance by identifier
    async fn describe_instance(&self, instance_id: &str) -> Result<Option<Instance>> {
        let filter = InstanceFilter::new().instance_id(instance_id);
        let instances = self.list_instances(&filter).await?;
        Ok(instances.into_iter().find(|i| i.id == instance_id))
    }

    /// List the volumes attached to an instance
    async fn list_volumes(&self, instance_id: &str) -> Result<Vec<Volume>>;

    /// List the snapshots of a volume, always queried live
    async fn list_snapshots(&self, volume_id: &str) -> Result<Vec<Snapshot>>;

    async fn stop_instance(&self, instance_id: &str) -> Result<()>;

    async fn start_instance(&self, instance_id: &str) -> Result<()>;

    async fn reboot_instance(&self, instance_id: &str) -> Result<()>;

    /// Request a new snapshot of a volume and return it as first reported
    async fn create_snapshot(&self, volume_id: &str, description: &str) -> Result<Snapshot>;
}
