//! Detection of snapshots already in flight for a volume

use crate::error::Result;
use crate::model::{Snapshot, Volume};
use crate::provider::ResourceClient;

/// Snapshots of `volume_id` currently reporting `pending`.
///
/// Queries the provider on every call. The pending snapshot is not always at
/// the same position in the listing, so the whole collection is scanned.
pub async fn pending_snapshots<C>(client: &C, volume_id: &str) -> Result<Vec<Snapshot>>
where
    C: ResourceClient + ?Sized,
{
    let snapshots = client.list_snapshots(volume_id).await?;
    let pending: Vec<Snapshot> = snapshots.into_iter().filter(Snapshot::is_pending).collect();

    tracing::debug!(
        volume = volume_id,
        pending = pending.len(),
        "checked for in-flight snapshots"
    );
    Ok(pending)
}

/// True iff at least one snapshot of the volume is `pending` right now
pub async fn has_pending_snapshot<C>(client: &C, volume: &Volume) -> Result<bool>
where
    C: ResourceClient + ?Sized,
{
    Ok(!pending_snapshots(client, &volume.id).await?.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SnapshotState;
    use crate::testing::{Call, FakeClient};

    #[tokio::test]
    async fn test_no_snapshots() {
        let client = FakeClient::new();
        let volume = Volume::new("vol-1", "i-1");

        assert!(!has_pending_snapshot(&client, &volume).await.unwrap());
    }

    #[tokio::test]
    async fn test_pending_found_at_any_position() {
        let client = FakeClient::new()
            .with_snapshot(Snapshot::new("snap-a", "vol-1", SnapshotState::Completed))
            .with_snapshot(Snapshot::new("snap-b", "vol-1", SnapshotState::Completed))
            .with_snapshot(Snapshot::new("snap-c", "vol-1", SnapshotState::Pending));
        let volume = Volume::new("vol-1", "i-1");

        assert!(has_pending_snapshot(&client, &volume).await.unwrap());
        let pending = pending_snapshots(&client, "vol-1").await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, "snap-c");
    }

    #[tokio::test]
    async fn test_completed_and_error_are_not_conflicts() {
        let client = FakeClient::new()
            .with_snapshot(Snapshot::new("snap-a", "vol-1", SnapshotState::Completed))
            .with_snapshot(Snapshot::new("snap-b", "vol-1", SnapshotState::Error));
        let volume = Volume::new("vol-1", "i-1");

        assert!(!has_pending_snapshot(&client, &volume).await.unwrap());
    }

    #[tokio::test]
    async fn test_queries_live_state_each_time() {
        let client = FakeClient::new();
        let volume = Volume::new("vol-1", "i-1");

        assert!(!has_pending_snapshot(&client, &volume).await.unwrap());
        client.create_snapshot("vol-1", "test").await.unwrap();
        assert!(has_pending_snapshot(&client, &volume).await.unwrap());

        assert_eq!(client.count(&Call::ListSnapshots("vol-1".to_string())), 2);
    }
}
