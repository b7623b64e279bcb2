mod aws;
mod commands;
mod progress;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use snapshotalyzer_cloud::{PowerAction, SelectionCriteria, SelectionError};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "shotty")]
#[command(about = "Snapshotalyzer: stop, snapshot and restart EC2 instances by project", long_about = None)]
struct Cli {
    /// AWS profile to use
    #[arg(long, global = true, env = "SHOTTY_PROFILE")]
    profile: Option<String>,
    /// AWS region (defaults to the profile's region)
    #[arg(long, global = true, env = "AWS_REGION")]
    region: Option<String>,
    /// Settings file (defaults to SHOTTY_CONFIG_PATH or ~/.config/snapshotalyzer/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Commands for snapshots
    #[command(subcommand)]
    Snapshots(SnapshotCommands),
    /// Commands for volumes
    #[command(subcommand)]
    Volumes(VolumeCommands),
    /// Commands for instances
    #[command(subcommand)]
    Instances(InstanceCommands),
    /// Show version information
    Version,
}

/// Which instances a command applies to
#[derive(Args, Debug, Clone, Default)]
struct TargetArgs {
    /// Only instances tagged Project=<PROJECT>
    #[arg(long)]
    project: Option<String>,
    /// Only this instance id
    #[arg(long)]
    instance: Option<String>,
}

impl TargetArgs {
    fn criteria(&self, force: bool) -> SelectionCriteria {
        SelectionCriteria::new(self.project.clone(), self.instance.clone(), force)
    }
}

#[derive(Subcommand)]
enum SnapshotCommands {
    /// List snapshots of the selected instances' volumes
    List {
        #[command(flatten)]
        target: TargetArgs,
        /// List every snapshot, not just the most recent ones
        #[arg(long)]
        all: bool,
    },
}

#[derive(Subcommand)]
enum VolumeCommands {
    /// List volumes attached to the selected instances
    List {
        #[command(flatten)]
        target: TargetArgs,
    },
}

#[derive(Subcommand)]
enum InstanceCommands {
    /// List instances
    List {
        #[command(flatten)]
        target: TargetArgs,
    },
    /// Stop, snapshot every volume, and restart the selected instances
    Snapshot {
        #[command(flatten)]
        target: TargetArgs,
        /// Run against every instance when no project or instance is given
        #[arg(long)]
        force: bool,
    },
    /// Start the selected instances
    Start {
        #[command(flatten)]
        target: TargetArgs,
        /// Run against every instance when no project or instance is given
        #[arg(long)]
        force: bool,
        /// Wait until each instance is running
        #[arg(long)]
        wait: bool,
    },
    /// Stop the selected instances
    Stop {
        #[command(flatten)]
        target: TargetArgs,
        /// Run against every instance when no project or instance is given
        #[arg(long)]
        force: bool,
        /// Wait until each instance is stopped
        #[arg(long)]
        wait: bool,
    },
    /// Reboot the selected instances
    Reboot {
        #[command(flatten)]
        target: TargetArgs,
        /// Run against every instance when no project or instance is given
        #[arg(long)]
        force: bool,
    },
}

impl InstanceCommands {
    /// Selection for commands with side effects; `None` for read-only ones
    fn mutation_criteria(&self) -> Option<SelectionCriteria> {
        match self {
            InstanceCommands::List { .. } => None,
            InstanceCommands::Snapshot { target, force }
            | InstanceCommands::Start { target, force, .. }
            | InstanceCommands::Stop { target, force, .. }
            | InstanceCommands::Reboot { target, force } => Some(target.criteria(*force)),
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // stdout carries command output, logs go to stderr
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("SHOTTY_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        if let Some(hint) = e.downcast_ref::<SelectionError>().and_then(aws::hint) {
            eprintln!();
            eprintln!("{} {}", "Hint:".yellow(), hint);
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // version needs neither settings nor AWS
    if matches!(cli.command, Commands::Version) {
        println!("snapshotalyzer {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    // Refuse unscoped mutations before anything touches AWS
    if let Commands::Instances(ref instance_cmd) = cli.command {
        if let Some(criteria) = instance_cmd.mutation_criteria() {
            criteria.ensure_mutation_allowed()?;
        }
    }

    let settings = match &cli.config {
        Some(path) => snapshotalyzer_config::load_from(path)?,
        None => snapshotalyzer_config::load()?,
    }
    .with_overrides(cli.profile, cli.region);

    let client = aws::init_client_with_error_handling(&settings).await?;

    match cli.command {
        Commands::Snapshots(SnapshotCommands::List { target, all }) => {
            commands::snapshots::handle_list(&client, &target.criteria(false), all).await?;
        }
        Commands::Volumes(VolumeCommands::List { target }) => {
            commands::volumes::handle_list(&client, &target.criteria(false)).await?;
        }
        Commands::Instances(instance_cmd) => match instance_cmd {
            InstanceCommands::List { target } => {
                commands::instances::handle_list(&client, &target.criteria(false)).await?;
            }
            InstanceCommands::Snapshot { target, force } => {
                commands::instances::handle_snapshot(&client, &target.criteria(force), &settings)
                    .await?;
            }
            InstanceCommands::Start {
                target,
                force,
                wait,
            } => {
                commands::instances::handle_power(
                    &client,
                    &target.criteria(force),
                    PowerAction::Start,
                    wait,
                    &settings,
                )
                .await?;
            }
            InstanceCommands::Stop {
                target,
                force,
                wait,
            } => {
                commands::instances::handle_power(
                    &client,
                    &target.criteria(force),
                    PowerAction::Stop,
                    wait,
                    &settings,
                )
                .await?;
            }
            InstanceCommands::Reboot { target, force } => {
                commands::instances::handle_power(
                    &client,
                    &target.criteria(force),
                    PowerAction::Reboot,
                    false,
                    &settings,
                )
                .await?;
            }
        },
        // handled above
        Commands::Version => {}
    }

    Ok(())
}
