//! `ResourceClient` implementation over the EC2 API

use crate::convert;
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_ec2::Client;
use aws_sdk_ec2::config::Region;
use aws_sdk_ec2::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_ec2::types::Filter;
use snapshotalyzer_cloud::{
    CloudError, Instance, InstanceFilter, ResourceClient, Result, Snapshot, SnapshotState, Volume,
};

/// Where to load credentials and region from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AwsOptions {
    /// Named profile from `~/.aws/config` / `~/.aws/credentials`
    pub profile: Option<String>,
    /// Region override; otherwise taken from the profile or environment
    pub region: Option<String>,
}

impl AwsOptions {
    pub fn profile(profile: impl Into<String>) -> Self {
        Self {
            profile: Some(profile.into()),
            region: None,
        }
    }

    pub fn with_region(mut self, region: Option<String>) -> Self {
        self.region = region;
        self
    }
}

/// EC2 resource client
pub struct Ec2Client {
    client: Client,
}

impl Ec2Client {
    /// Load the shared AWS configuration and build a client
    pub async fn connect(options: &AwsOptions) -> Result<Self> {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(profile) = &options.profile {
            loader = loader.profile_name(profile);
        }
        if let Some(region) = &options.region {
            loader = loader.region(Region::new(region.clone()));
        }
        let config = loader.load().await;

        let Some(region) = config.region() else {
            return Err(CloudError::InvalidConfig(format!(
                "no region configured for profile '{}'; use --region or AWS_REGION",
                options.profile.as_deref().unwrap_or("default")
            )));
        };
        tracing::debug!(
            profile = ?options.profile,
            region = %region,
            "loaded AWS configuration"
        );

        Ok(Self::from_client(Client::new(&config)))
    }

    /// Wrap an already configured SDK client
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    pub fn region(&self) -> Option<&str> {
        self.client.config().region().map(|r| r.as_ref())
    }
}

/// Convert an SDK failure into a `CloudError`, keeping the full cause chain
fn sdk_error<E, R>(err: SdkError<E, R>) -> CloudError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    R: std::fmt::Debug,
{
    let code = err.as_service_error().and_then(|e| e.code()).map(str::to_string);
    let message = DisplayErrorContext(&err).to_string();
    convert::classify(code.as_deref(), message)
}

fn is_not_found<E, R>(err: &SdkError<E, R>) -> bool
where
    E: ProvideErrorMetadata,
{
    err.as_service_error().and_then(|e| e.code()) == Some(convert::INSTANCE_NOT_FOUND)
}

fn filter(name: &str, value: &str) -> Filter {
    Filter::builder().name(name).values(value).build()
}

#[async_trait]
impl ResourceClient for Ec2Client {
    fn name(&self) -> &str {
        "ec2"
    }

    async fn list_instances(&self, instance_filter: &InstanceFilter) -> Result<Vec<Instance>> {
        let mut request = self.client.describe_instances();
        if let Some(project) = &instance_filter.project {
            request = request.filters(filter("tag:Project", project));
        }
        for id in &instance_filter.instance_ids {
            request = request.instance_ids(id);
        }

        let mut pages = request.into_paginator().send();
        let mut instances = Vec::new();
        while let Some(page) = pages.next().await {
            let page = match page {
                Ok(page) => page,
                // unknown id: empty result, not an error
                Err(err) if is_not_found(&err) => {
                    tracing::debug!(ids = ?instance_filter.instance_ids, "instance id not found");
                    return Ok(Vec::new());
                }
                Err(err) => return Err(sdk_error(err)),
            };
            for reservation in page.reservations() {
                instances.extend(reservation.instances().iter().map(convert::instance));
            }
        }

        tracing::debug!(count = instances.len(), "described instances");
        Ok(instances)
    }

    async fn list_volumes(&self, instance_id: &str) -> Result<Vec<Volume>> {
        let mut pages = self
            .client
            .describe_volumes()
            .filters(filter("attachment.instance-id", instance_id))
            .into_paginator()
            .send();

        let mut volumes = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(sdk_error)?;
            volumes.extend(page.volumes().iter().map(|v| convert::volume(v, instance_id)));
        }
        Ok(volumes)
    }

    async fn list_snapshots(&self, volume_id: &str) -> Result<Vec<Snapshot>> {
        let mut pages = self
            .client
            .describe_snapshots()
            .owner_ids("self")
            .filters(filter("volume-id", volume_id))
            .into_paginator()
            .send();

        let mut snapshots = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(sdk_error)?;
            snapshots.extend(page.snapshots().iter().map(convert::snapshot));
        }
        Ok(snapshots)
    }

    async fn stop_instance(&self, instance_id: &str) -> Result<()> {
        self.client
            .stop_instances()
            .instance_ids(instance_id)
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(())
    }

    async fn start_instance(&self, instance_id: &str) -> Result<()> {
        self.client
            .start_instances()
            .instance_ids(instance_id)
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(())
    }

    async fn reboot_instance(&self, instance_id: &str) -> Result<()> {
        self.client
            .reboot_instances()
            .instance_ids(instance_id)
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(())
    }

    async fn create_snapshot(&self, volume_id: &str, description: &str) -> Result<Snapshot> {
        let output = self
            .client
            .create_snapshot()
            .volume_id(volume_id)
            .description(description)
            .send()
            .await
            .map_err(sdk_error)?;

        Ok(Snapshot {
            id: output.snapshot_id().unwrap_or_default().to_string(),
            volume_id: volume_id.to_string(),
            state: output
                .state()
                .map(|s| SnapshotState::parse(s.as_str()))
                .unwrap_or(SnapshotState::Pending),
            progress: output.progress().map(str::to_string),
            start_time: output.start_time().and_then(convert::timestamp),
            description: Some(description.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_shape() {
        let f = filter("tag:Project", "demo");
        assert_eq!(f.name(), Some("tag:Project"));
        assert_eq!(f.values(), &["demo".to_string()]);
    }

    #[test]
    fn test_options_builder() {
        let options = AwsOptions::profile("snapshotalyzer").with_region(Some("eu-west-1".into()));
        assert_eq!(options.profile.as_deref(), Some("snapshotalyzer"));
        assert_eq!(options.region.as_deref(), Some("eu-west-1"));
    }

    #[tokio::test]
    async fn test_from_client_keeps_region() {
        let config = aws_sdk_ec2::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("ap-northeast-1"))
            .build();
        let client = Ec2Client::from_client(Client::from_conf(config));

        assert_eq!(client.region(), Some("ap-northeast-1"));
        assert_eq!(client.name(), "ec2");
    }
}
