//! Gatekeeper command-line entry point.
//!
//! Every invocation boots the core from configuration (seed, then manifest
//! sync) and runs one command against it.
use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use gatekeeper::app::{Gatekeeper, build_gatekeeper};
use gatekeeper::config::GatekeeperConfig;
use gatekeeper::observability;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "gatekeeper")]
#[command(about = "Capability registry, role resolution and access checks")]
struct Args {
    /// Resource manifest; overrides GATEKEEPER_MANIFEST and the config file
    #[arg(long)]
    manifest: Option<PathBuf>,

    /// Seed file; overrides GATEKEEPER_SEED and the config file
    #[arg(long)]
    seed: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Reconcile the registry with the manifest and print the report
    Sync,
    /// Print the resources a user may access
    Effective {
        #[arg(long)]
        user: String,
    },
    /// Exit 0 when the user may access the resource, 1 otherwise
    Check {
        #[arg(long)]
        user: String,
        #[arg(long)]
        resource: String,
    },
    /// Print a role's full containment tree
    Tree {
        #[arg(long)]
        role: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    observability::init_observability("gatekeeper");
    let args = Args::parse();
    let mut config = GatekeeperConfig::from_env_or_yaml()?;
    if let Some(path) = args.manifest {
        config.manifest_path = Some(path);
    }
    if let Some(path) = args.seed {
        config.seed_path = Some(path);
    }

    let gatekeeper = build_gatekeeper(&config).await?;
    let success = run(&gatekeeper, args.command).await?;
    Ok(if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

async fn run(gatekeeper: &Gatekeeper, command: Command) -> anyhow::Result<bool> {
    let core = &gatekeeper.core;
    match command {
        Command::Sync => {
            let Some(report) = &gatekeeper.sync else {
                bail!("no resource manifest configured");
            };
            println!("{}", serde_json::to_string_pretty(report)?);
            Ok(true)
        }
        Command::Effective { user } => {
            let principal = core
                .principals
                .find_by_user_name(&user)
                .await?
                .with_context(|| format!("unknown user {user:?}"))?;
            let set = core.checker.effective_permissions(principal.id).await?;
            let resources: Vec<&str> = set.resources().collect();
            println!("{}", serde_json::to_string_pretty(&resources)?);
            Ok(true)
        }
        Command::Check { user, resource } => {
            let allowed = match core.principals.find_by_user_name(&user).await? {
                Some(principal) => core.checker.has_access(principal.id, &resource).await?,
                None => false,
            };
            println!("{}", if allowed { "allow" } else { "deny" });
            Ok(allowed)
        }
        Command::Tree { role } => {
            let found = core
                .roles
                .find_by_name(&role)
                .await?
                .with_context(|| format!("unknown role {role:?}"))?;
            let tree = core.roles.tree(found.id).await?;
            println!("{}", serde_json::to_string_pretty(&tree)?);
            Ok(true)
        }
    }
}
