use anyhow::Context;
use colored::Colorize;
use snapshotalyzer_cloud::{ResourceClient, SelectionCriteria, TargetSelector, Volume};

pub async fn handle_list<C>(client: &C, criteria: &SelectionCriteria) -> anyhow::Result<()>
where
    C: ResourceClient + ?Sized,
{
    let rows = list_rows(client, criteria).await?;

    if rows.is_empty() {
        println!("{}", "No volumes found".dimmed());
    }
    for row in rows {
        println!("{}", row);
    }
    Ok(())
}

pub(crate) async fn list_rows<C>(
    client: &C,
    criteria: &SelectionCriteria,
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
        rows.extend(volumes.iter().map(row));
    }
    Ok(rows)
}

pub(crate) fn row(volume: &Volume) -> String {
    let size = match volume.size_gib {
        Some(size) => format!("{}GiB", size),
        None => "-".to_string(),
    };
    let encryption = if volume.encrypted {
        "Encrypted"
    } else {
        "Not Encrypted"
    };

    [
        volume.id.as_str(),
        volume.instance_id.as_str(),
        volume.state.as_str(),
        size.as_str(),
        encryption,
    ]
    .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use snapshotalyzer_cloud::testing::FakeClient;
    use snapshotalyzer_cloud::{Instance, InstanceState};

    #[test]
    fn test_row_format() {
        let mut volume = Volume::new("vol-1", "i-1");
        volume.size_gib = Some(8);
        assert_eq!(row(&volume), "vol-1, i-1, in-use, 8GiB, Not Encrypted");

        volume.encrypted = true;
        volume.size_gib = None;
        assert_eq!(row(&volume), "vol-1, i-1, in-use, -, Encrypted");
    }

    #[tokio::test]
    async fn test_list_rows_for_instance() {
        let client = FakeClient::new()
            .with_instance(Instance::new("i-1", InstanceState::Running))
            .with_instance(Instance::new("i-2", InstanceState::Running))
            .with_volume(Volume::new("vol-1", "i-1"))
            .with_volume(Volume::new("vol-2", "i-1"))
            .with_volume(Volume::new("vol-3", "i-2"));
        let criteria = SelectionCriteria::new(None, Some("i-1".to_string()), false);

        let rows = list_rows(&client, &criteria).await.unwrap();

        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.contains(", i-1, ")));
    }

    #[tokio::test]
    async fn test_unknown_instance_lists_nothing() {
        let client = FakeClient::new()
            .with_instance(Instance::new("i-1", InstanceState::Running))
            .with_volume(Volume::new("vol-1", "i-1"));
        let criteria = SelectionCriteria::new(None, Some("i-missing".to_string()), false);

        let rows = list_rows(&client, &criteria).await.unwrap();

        assert!(rows.is_empty());
    }
}
