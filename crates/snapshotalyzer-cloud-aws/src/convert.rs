//! Mapping between EC2 API shapes and Snapshotalyzer model types

use aws_sdk_ec2::primitives::DateTime as AwsDateTime;
use aws_sdk_ec2::types as ec2;
use chrono::{DateTime, Utc};
use snapshotalyzer_cloud::{CloudError, Instance, InstanceState, Snapshot, SnapshotState, Volume};
use std::collections::BTreeMap;

/// Error code returned when a requested instance id does not exist
pub(crate) const INSTANCE_NOT_FOUND: &str = "InvalidInstanceID.NotFound";

pub(crate) fn instance(src: &ec2::Instance) -> Instance {
    let state = src
        .state()
        .and_then(|s| s.name())
        .map(|name| InstanceState::parse(name.as_str()))
        .unwrap_or(InstanceState::Unknown);

    Instance {
        id: src.instance_id().unwrap_or_default().to_string(),
        state,
        tags: tags(src.tags()),
        instance_type: src.instance_type().map(|t| t.as_str().to_string()),
        availability_zone: src
            .placement()
            .and_then(|p| p.availability_zone())
            .map(str::to_string),
        public_ip_address: non_empty(src.public_ip_address()),
        public_dns_name: non_empty(src.public_dns_name()),
    }
}

/// Convert the EC2 tag list into a map; tags without a key are dropped
pub(crate) fn tags(src: &[ec2::Tag]) -> BTreeMap<String, String> {
    src.iter()
        .filter_map(|tag| {
            let key = tag.key()?;
            Some((key.to_string(), tag.value().unwrap_or_default().to_string()))
        })
        .collect()
}

pub(crate) fn volume(src: &ec2::Volume, instance_id: &str) -> Volume {
    Volume {
        id: src.volume_id().unwrap_or_default().to_string(),
        instance_id: instance_id.to_string(),
        state: src
            .state()
            .map(|s| s.as_str().to_string())
            .unwrap_or_else(|| "unknown".to_string()),
        size_gib: src.size(),
        encrypted: src.encrypted().unwrap_or(false),
    }
}

pub(crate) fn snapshot(src: &ec2::Snapshot) -> Snapshot {
    Snapshot {
        id: src.snapshot_id().unwrap_or_default().to_string(),
        volume_id: src.volume_id().unwrap_or_default().to_string(),
        state: snapshot_state(src.state()),
        progress: non_empty(src.progress()),
        start_time: src.start_time().and_then(timestamp),
        description: non_empty(src.description()),
    }
}

pub(crate) fn snapshot_state(src: Option<&ec2::SnapshotState>) -> SnapshotState {
    src.map(|s| SnapshotState::parse(s.as_str()))
        .unwrap_or(SnapshotState::Unknown)
}

pub(crate) fn timestamp(src: &AwsDateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(src.secs(), src.subsec_nanos())
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}

/// Classify an EC2 failure by its error code
pub(crate) fn classify(code: Option<&str>, message: String) -> CloudError {
    match code {
        Some(INSTANCE_NOT_FOUND) => CloudError::InstanceNotFound(message),
        Some("InvalidInstanceID.Malformed" | "InvalidParameterValue" | "InvalidFilter") => {
            CloudError::InvalidFilter(message)
        }
        Some(
            "AuthFailure"
            | "UnauthorizedOperation"
            | "InvalidClientTokenId"
            | "ExpiredToken"
            | "RequestExpired",
        ) => CloudError::AuthenticationFailed(message),
        Some(_) => CloudError::ApiError(message),
        None if message.contains("profile") && message.contains("not defined") => {
            CloudError::ProfileNotFound(message)
        }
        None if message.contains("credentials") => CloudError::AuthenticationFailed(message),
        None => CloudError::ApiError(message),
    }
}
