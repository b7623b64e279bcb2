//! Target selection by project tag and/or instance identifier

use crate::error::SelectionError;
use crate::model::{Instance, InstanceFilter};
use crate::provider::ResourceClient;

/// What the user asked to operate on
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionCriteria {
    /// Value of the `Project` tag
    pub project: Option<String>,
    /// A single instance identifier
    pub instance_id: Option<String>,
    /// Allow mutating commands to run against every instance
    pub force: bool,
}

impl SelectionCriteria {
    /// Surrounding whitespace is dropped; blank values are treated as absent
    pub fn new(project: Option<String>, instance_id: Option<String>, force: bool) -> Self {
        Self {
            project: trimmed(project),
            instance_id: trimmed(instance_id),
            force,
        }
    }

    /// Whether a project or an instance narrows the selection
    pub fn has_target(&self) -> bool {
        self.project.is_some() || self.instance_id.is_some()
    }

    /// Refuse side effects when nothing narrows the selection and `force` is off
    pub fn ensure_mutation_allowed(&self) -> Result<(), SelectionError> {
        if self.has_target() || self.force {
            Ok(())
        } else {
            Err(SelectionError::Precondition)
        }
    }

    pub fn to_filter(&self) -> InstanceFilter {
        InstanceFilter {
            project: self.project.clone(),
            instance_ids: self.instance_id.iter().cloned().collect(),
        }
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Resolves `SelectionCriteria` into concrete instances
pub struct TargetSelector<'a, C: ResourceClient + ?Sized> {
    client: &'a C,
}

impl<'a, C: ResourceClient + ?Sized> TargetSelector<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self { client }
    }

    /// Instances matching the criteria, ignoring `force`.
    ///
    /// * neither project nor instance: every instance
    /// * project only: instances tagged `Project=<project>`
    /// * instance only: that instance, or nothing if it does not exist
    /// * both: the tagged instances restricted to that identifier
    pub async fn select(
        &self,
        criteria: &SelectionCriteria,
    ) -> Result<Vec<Instance>, SelectionError> {
        let filter = criteria.to_filter();
        let instances = self
            .client
            .list_instances(&filter)
            .await
            .map_err(SelectionError::Query)?;

        tracing::debug!(
            provider = self.client.name(),
            project = ?criteria.project,
            instance = ?criteria.instance_id,
            selected = instances.len(),
            "resolved target instances"
        );
        Ok(instances)
    }

    /// Like [`select`](Self::select), but enforces the mutation precondition
    /// before touching the provider.
    pub async fn select_for_mutation(
        &self,
        criteria: &SelectionCriteria,
    ) -> Result<Vec<Instance>, SelectionError> {
        criteria.ensure_mutation_allowed()?;
        self.select(criteria).await
    }
}
