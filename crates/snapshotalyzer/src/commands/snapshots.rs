use super::or_none;
use anyhow::Context;
use colored::Colorize;
use snapshotalyzer_cloud::{
    ResourceClient, SelectionCriteria, Snapshot, SnapshotState, TargetSelector,
};

pub async fn handle_list<C>(
    client: &C,
    criteria: &SelectionCriteria,
    all: bool,
) -> anyhow::Result<()>
where
    C: ResourceClient + ?Sized,
{
    let rows = list_rows(client, criteria, all).await?;

    if rows.is_empty() {
        println!("{}", "No snapshots found".dimmed());
    }
    for row in rows {
        println!("{}", row);
    }
    Ok(())
}

pub(crate) async fn list_rows<C>(
    client: &C,
    criteria: &SelectionCriteria,
    all: bool,
) -> anyhow::Result<Vec<String>>
where
    C: ResourceClient + ?Sized,
{
    let instances = TargetSelector::new(client).select(criteria).await?;

    let mut rows = Vec::new();
    for instance in &instances {
        let volumes = client
            .list_volumes(&instance.id)
            .await
            .with_context(|| format!("could not list volumes of {}", instance.id))?;

        for volume in &volumes {
            let snapshots = client
                .list_snapshots(&volume.id)
                .await
                .with_context(|| format!("could not list snapshots of {}", volume.id))?;

            rows.extend(
                visible(snapshots, all)
                    .iter()
                    .map(|snapshot| row(snapshot, &instance.id)),
            );
        }
    }
    Ok(rows)
}

/// Newest first; unless `all`, nothing older than the latest completed snapshot
pub(crate) fn visible(mut snapshots: Vec<Snapshot>, all: bool) -> Vec<Snapshot> {
    // None sorts before Some, so snapshots without a start time end up last
    snapshots.sort_by(|a, b| b.start_time.cmp(&a.start_time));

    if !all {
        if let Some(pos) = snapshots
            .iter()
            .position(|s| s.state == SnapshotState::Completed)
        {
            snapshots.truncate(pos + 1);
        }
    }
    snapshots
}

pub(crate) fn row(snapshot: &Snapshot, instance_id: &str) -> String {
    let start_time = snapshot
        .start_time
        .map(|t| t.format("%c").to_string())
        .unwrap_or_else(|| "-".to_string());

    [
        snapshot.id.as_str(),
        snapshot.volume_id.as_str(),
        instance_id,
        snapshot.state.as_str(),
        or_none(snapshot.progress.as_deref()),
        start_time.as_str(),
    ]
    .join(", ")
}
