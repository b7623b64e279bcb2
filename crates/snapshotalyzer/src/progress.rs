use colored::Colorize;
use snapshotalyzer_cloud::{LifecycleEvent, ProgressSink};

/// Prints lifecycle events to the terminal
pub struct ConsoleSink;

impl ConsoleSink {
    fn line(event: &LifecycleEvent) -> Option<String> {
        let text = event.to_string();
        let line = match event {
            // volume counts are only interesting in the debug log
            LifecycleEvent::CheckingVolumes { .. } => return None,
            LifecycleEvent::Stopping { .. }
            | LifecycleEvent::Starting { .. }
            | LifecycleEvent::Rebooting { .. }
            | LifecycleEvent::CreatingSnapshot { .. } => text.cyan().to_string(),
            LifecycleEvent::Stopped { .. }
            | LifecycleEvent::Started { .. }
            | LifecycleEvent::SnapshotCreated { .. } => format!("  {} {}", "✓".green(), text),
            LifecycleEvent::LeftInState { .. }
            | LifecycleEvent::SkippingVolume { .. }
            | LifecycleEvent::Cancelled { .. } => text.yellow().to_string(),
            LifecycleEvent::ActionFailed { .. } => format!("  {} {}", "✗".red(), text.red()),
            LifecycleEvent::Completed { summary } => {
                format!("{}\n{}", text.green().bold(), summary.to_string().dimmed())
            }
        };
        Some(line)
    }
}

impl ProgressSink for ConsoleSink {
    fn notify(&self, event: &LifecycleEvent) {
        let Some(line) = Self::line(event) else {
            return;
        };
        if matches!(event, LifecycleEvent::ActionFailed { .. }) {
            eprintln!("{}", line);
        } else {
            println!("{}", line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snapshotalyzer_cloud::{ResourceAction, RunSummary};

    fn plain(event: &LifecycleEvent) -> Option<String> {
        colored::control::set_override(false);
        ConsoleSink::line(event)
    }

    #[test]
    fn test_skip_message() {
        let line = plain(&LifecycleEvent::SkippingVolume {
            volume_id: "vol-1".into(),
            pending_snapshot_ids: vec!["snap-1".into()],
        });
        assert_eq!(
            line.as_deref(),
            Some("Skipping vol-1, snapshot already in progress")
        );
    }

    #[test]
    fn test_failure_message() {
        let line = plain(&LifecycleEvent::ActionFailed {
            resource_id: "i-1".into(),
            action: ResourceAction::Start,
            message: "IncorrectInstanceState".into(),
        })
        .unwrap();
        assert!(line.contains("Could not start i-1. IncorrectInstanceState"));
    }

    #[test]
    fn test_completed_prints_summary() {
        let summary = RunSummary {
            instances: 2,
            created: 3,
            skipped: 1,
            failed: 0,
        };
        let line = plain(&LifecycleEvent::Completed { summary }).unwrap();
        assert_eq!(
            line,
            "Job done\n2 instances, 3 snapshots created, 1 skipped, 0 failed"
        );
    }

    #[test]
    fn test_volume_count_is_not_printed() {
        let line = plain(&LifecycleEvent::CheckingVolumes {
            instance_id: "i-1".into(),
            volumes: 2,
        });
        assert!(line.is_none());
    }
}
