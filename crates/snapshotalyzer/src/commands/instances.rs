use super::{or_none, orchestrator_config, wait_config};
use crate::progress::ConsoleSink;
use colored::Colorize;
use snapshotalyzer_cloud::{
    CancelFlag, Instance, LifecycleOrchestrator, PowerAction, PowerReport, ResourceClient,
    RunReport, SelectionCriteria, TargetSelector, apply_power_action,
};
use snapshotalyzer_config::Settings;

/// Value shown when an instance has no `Project` tag
const NO_PROJECT: &str = "<no project>";

pub async fn handle_list<C>(client: &C, criteria: &SelectionCriteria) -> anyhow::Result<()>
where
    C: ResourceClient + ?Sized,
{
    let instances = TargetSelector::new(client).select(criteria).await?;

    if instances.is_empty() {
        println!("{}", "No instances found".dimmed());
    }
    for instance in &instances {
        println!("{}", row(instance));
    }
    Ok(())
}

pub(crate) fn row(instance: &Instance) -> String {
    [
        instance.id.as_str(),
        or_none(instance.instance_type.as_deref()),
        or_none(instance.public_ip_address.as_deref()),
        or_none(instance.availability_zone.as_deref()),
        instance.state.as_str(),
        or_none(instance.public_dns_name.as_deref()),
        instance.project().unwrap_or(NO_PROJECT),
    ]
    .join(", ")
}

/// Stop, snapshot and restart the selected instances
pub async fn handle_snapshot<C>(
    client: &C,
    criteria: &SelectionCriteria,
    settings: &Settings,
) -> anyhow::Result<()>
where
    C: ResourceClient + ?Sized,
{
    let cancel = CancelFlag::new();
    let flag = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!(
                "{}",
                "Interrupted, finishing the current instance...".yellow()
            );
            flag.cancel();
        }
    });

    let report = run_snapshot(client, criteria, settings, cancel).await?;

    tracing::info!(
        duration_ms = report.duration_ms,
        cancelled = report.cancelled,
        "snapshot run finished"
    );
    Ok(())
}

pub(crate) async fn run_snapshot<C>(
    client: &C,
    criteria: &SelectionCriteria,
    settings: &Settings,
    cancel: CancelFlag,
) -> anyhow::Result<RunReport>
where
    C: ResourceClient + ?Sized,
{
    let instances = TargetSelector::new(client)
        .select_for_mutation(criteria)
        .await?;

    if instances.is_empty() {
        println!("{}", "No matching instances".dimmed());
    }

    let sink = ConsoleSink;
    let report = LifecycleOrchestrator::new(client, orchestrator_config(settings), &sink)
        .with_cancellation(cancel)
        .run(&instances)
        .await;
    Ok(report)
}

/// Start, stop or reboot the selected instances
pub async fn handle_power<C>(
    client: &C,
    criteria: &SelectionCriteria,
    action: PowerAction,
    wait: bool,
    settings: &Settings,
) -> anyhow::Result<()>
where
    C: ResourceClient + ?Sized,
{
    let report = run_power(client, criteria, action, wait, settings).await?;

    if !report.failed.is_empty() {
        eprintln!(
            "{}",
            format!(
                "{} of {} instance(s) could not {}",
                report.failed.len(),
                report.failed.len() + report.succeeded.len(),
                action
            )
            .yellow()
        );
    }
    Ok(())
}

pub(crate) async fn run_power<C>(
    client: &C,
    criteria: &SelectionCriteria,
    action: PowerAction,
    wait: bool,
    settings: &Settings,
) -> anyhow::Result<PowerReport>
where
    C: ResourceClient + ?Sized,
{
    let instances = TargetSelector::new(client)
        .select_for_mutation(criteria)
        .await?;

    if instances.is_empty() {
        println!("{}", "No matching instances".dimmed());
    }

    let wait = wait.then(|| wait_config(settings));
    Ok(apply_power_action(client, &instances, action, wait.as_ref(), &ConsoleSink).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use snapshotalyzer_cloud::testing::{Call, FakeClient};
    use snapshotalyzer_cloud::{InstanceState, SelectionError, Snapshot, SnapshotState, Volume};

    fn fast_settings() -> Settings {
        let mut settings = Settings::default();
        settings.wait.poll_interval_secs = 0;
        settings.wait.max_attempts = 5;
        settings
    }

    fn demo_fleet() -> FakeClient {
        FakeClient::new()
            .with_instance(Instance::new("i-1", InstanceState::Running).with_tag("Project", "demo"))
            .with_instance(Instance::new("i-2", InstanceState::Stopped).with_tag("Project", "demo"))
            .with_instance(Instance::new("i-3", InstanceState::Running))
            .with_volume(Volume::new("vol-1", "i-1"))
            .with_volume(Volume::new("vol-2", "i-2"))
            .with_volume(Volume::new("vol-3", "i-3"))
    }

    #[test]
    fn test_row_format() {
        let mut instance = Instance::new("i-1", InstanceState::Running).with_tag("Project", "demo");
        instance.instance_type = Some("t2.micro".to_string());
        instance.availability_zone = Some("us-east-1a".to_string());
        instance.public_ip_address = Some("203.0.113.10".to_string());
        instance.public_dns_name = Some("ec2-203-0-113-10.compute-1.amazonaws.com".to_string());

        assert_eq!(
            row(&instance),
            "i-1, t2.micro, 203.0.113.10, us-east-1a, running, \
             ec2-203-0-113-10.compute-1.amazonaws.com, demo"
        );
    }

    #[test]
    fn test_row_without_optional_fields() {
        let instance = Instance::new("i-1", InstanceState::Stopped);
        assert_eq!(row(&instance), "i-1, -, -, -, stopped, -, <no project>");
    }

    #[tokio::test]
    async fn test_snapshot_without_target_is_refused() {
        let client = demo_fleet();

        let err = run_snapshot(
            &client,
            &SelectionCriteria::default(),
            &fast_settings(),
            CancelFlag::new(),
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<SelectionError>(),
            Some(SelectionError::Precondition)
        ));
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_snapshot_project() {
        let client = demo_fleet();
        let criteria = SelectionCriteria::new(Some("demo".to_string()), None, false);

        let report = run_snapshot(&client, &criteria, &fast_settings(), CancelFlag::new())
            .await
            .unwrap();

        let summary = report.summary();
        assert_eq!(summary.instances, 2);
        assert_eq!(summary.created, 2);
        assert_eq!(client.count(&Call::CreateSnapshot("vol-3".to_string())), 0);
        assert_eq!(client.instance_state("i-1"), Some(InstanceState::Running));
        assert_eq!(client.instance_state("i-2"), Some(InstanceState::Stopped));

        let created: Vec<Snapshot> = client.snapshots_of("vol-1");
        assert_eq!(created[0].state, SnapshotState::Pending);
        assert_eq!(
            created[0].description.as_deref(),
            Some("Created by Snapshotalyzer")
        );
    }

    #[tokio::test]
    async fn test_snapshot_force_covers_every_instance() {
        let client = demo_fleet();
        let criteria = SelectionCriteria::new(None, None, true);

        let report = run_snapshot(&client, &criteria, &fast_settings(), CancelFlag::new())
            .await
            .unwrap();

        assert_eq!(report.summary().created, 3);
    }

    #[tokio::test]
    async fn test_cancelled_snapshot_touches_nothing() {
        let client = demo_fleet();
        let criteria = SelectionCriteria::new(Some("demo".to_string()), None, false);
        let cancel = CancelFlag::new();
        cancel.cancel();

        let report = run_snapshot(&client, &criteria, &fast_settings(), cancel)
            .await
            .unwrap();

        assert!(report.cancelled);
        assert!(client.mutating_calls().is_empty());
    }

    #[tokio::test]
    async fn test_stop_with_wait() {
        let client = demo_fleet();
        let criteria = SelectionCriteria::new(None, Some("i-1".to_string()), false);

        let report = run_power(&client, &criteria, PowerAction::Stop, true, &fast_settings())
            .await
            .unwrap();

        assert_eq!(report.succeeded, vec!["i-1"]);
        assert_eq!(client.instance_state("i-1"), Some(InstanceState::Stopped));
    }

    #[tokio::test]
    async fn test_reboot_failure_is_reported_not_fatal() {
        let client = demo_fleet().failing("reboot", "i-1");
        let criteria = SelectionCriteria::new(Some("demo".to_string()), None, false);

        let report = run_power(&client, &criteria, PowerAction::Reboot, false, &fast_settings())
            .await
            .unwrap();

        assert_eq!(report.succeeded, vec!["i-2"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].resource_id, "i-1");
    }

    #[tokio::test]
    async fn test_power_without_target_is_refused() {
        let client = demo_fleet();

        let result = run_power(
            &client,
            &SelectionCriteria::default(),
            PowerAction::Start,
            false,
            &fast_settings(),
        )
        .await;

        assert!(result.is_err());
        assert!(client.calls().is_empty());
    }
}
