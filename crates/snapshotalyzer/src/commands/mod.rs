pub mod instances;
pub mod snapshots;
pub mod volumes;

use snapshotalyzer_cloud::{OrchestratorConfig, WaitConfig};
use snapshotalyzer_config::Settings;
use std::time::Duration;

/// Placeholder for absent optional columns
const NONE: &str = "-";

pub(crate) fn wait_config(settings: &Settings) -> WaitConfig {
    WaitConfig::fixed(
        Duration::from_secs(settings.wait.poll_interval_secs),
        settings.wait.max_attempts,
    )
}

pub(crate) fn orchestrator_config(settings: &Settings) -> OrchestratorConfig {
    OrchestratorConfig {
        wait: wait_config(settings),
        snapshot_description: settings.snapshot_description.clone(),
    }
}

pub(crate) fn or_none(value: Option<&str>) -> &str {
    value.unwrap_or(NONE)
}
