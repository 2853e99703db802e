/// Precheck - Kubernetes pre-install permission checks
///
/// Verifies that the current kubectl identity can deploy and manage the
/// resources a platform install needs, before the install starts.
mod config;
mod k8s;
mod precheck;
mod utils;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::PreCheckConfig;
use crate::k8s::{KubectlClient, ManifestAction};
use crate::precheck::{PermissionChecker, PreCheckUtils};

#[derive(Parser)]
#[command(name = "precheck")]
#[command(about = "Check Kubernetes permissions before installing", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "precheck.yaml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply or delete a manifest from the utils directory
    Deploy {
        #[arg(value_enum)]
        action: ManifestAction,

        /// Manifest file name
        file: String,
    },

    /// Run a kubectl subcommand, e.g. `rollout status deployment/hello-world`
    Run {
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },

    /// Check that Role and RoleBinding API groups are served
    RbacGroups,

    /// Ask whether an action is permitted, e.g. `create pods`
    CanI {
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },

    /// Run every configured permission check
    Check {
        /// Print the report as JSON instead of YAML
        #[arg(long)]
        json: bool,
    },

    /// Generate example configuration file
    Init,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("precheck={}", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let result = match cli.command {
        Commands::Init => init_config(&cli).await.map(|_| 0),
        _ => run(&cli).await,
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            error!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Load the configuration, falling back to defaults when the file is absent
fn load_config(cli: &Cli) -> Result<PreCheckConfig> {
    if !cli.config.exists() {
        debug!(
            "No configuration at {}, using defaults",
            cli.config.display()
        );
        return Ok(PreCheckConfig::default());
    }

    PreCheckConfig::from_file(&cli.config).context("Failed to load configuration")
}

/// Run a cluster subcommand and return the process exit code
async fn run(cli: &Cli) -> Result<i32> {
    let config = load_config(cli)?;

    let client = KubectlClient::new(&config.kubectl);
    client
        .check_kubectl_installed()
        .await
        .context("kubectl is required")?;

    let mut utils = match &config.component_dir {
        Some(dir) => PreCheckUtils::with_component_dir(client, dir),
        None => PreCheckUtils::new(client),
    };

    let code = match &cli.command {
        Commands::Deploy { action, file } => utils.deploy_manifest_file(*action, file).await,
        Commands::Run { command } => utils.do_cmd(&command.join(" ")).await,
        Commands::RbacGroups => exit_code(utils.get_rbac_group_cmd().await),
        Commands::CanI { command } => {
            let command = command.join(" ");
            let allowed = utils.can_i(&command).await;
            println!("{}", if allowed { "yes" } else { "no" });
            exit_code(allowed)
        }
        Commands::Check { json } => {
            let checker =
                PermissionChecker::new(config.checks.clone(), config.kubectl.namespace.clone());
            let report = checker.run(&mut utils).await;

            let rendered = if *json {
                serde_json::to_string_pretty(&report)?
            } else {
                serde_yaml::to_string(&report)?
            };
            println!("{}", rendered);

            exit_code(report.all_passed())
        }
        Commands::Init => unreachable!("init is handled before connecting to the cluster"),
    };

    Ok(code)
}

fn exit_code(passed: bool) -> i32 {
    if passed {
        0
    } else {
        1
    }
}

/// Write an example configuration file
async fn init_config(cli: &Cli) -> Result<()> {
    if cli.config.exists() {
        anyhow::bail!(
            "Configuration file already exists: {}",
            cli.config.display()
        );
    }

    let example_config = PreCheckConfig::example();
    let yaml = serde_yaml::to_string(&example_config)?;

    tokio::fs::write(&cli.config, yaml)
        .await
        .context("Failed to write configuration file")?;

    info!("Example configuration created: {}", cli.config.display());
    info!("");
    info!("Next steps:");
    info!("  1. Edit the configuration file to match your cluster");
    info!("  2. Place the manifests it names in the utils/ directory");
    info!("  3. Run the checks:");
    info!("     precheck check");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_deploy() {
        let cli = Cli::try_parse_from(["precheck", "deploy", "apply", "hello-world.yaml"]).unwrap();
        match cli.command {
            Commands::Deploy { action, file } => {
                assert_eq!(action, ManifestAction::Apply);
                assert_eq!(file, "hello-world.yaml");
            }
            _ => panic!("expected deploy"),
        }
    }

    #[test]
    fn test_cli_keeps_kubectl_flags_in_run() {
        let cli = Cli::try_parse_from([
            "precheck",
            "run",
            "wait",
            "--for=delete",
            "pod",
            "-l",
            "app=hello-world-pod",
        ])
        .unwrap();
        match cli.command {
            Commands::Run { command } => {
                assert_eq!(command.join(" "), "wait --for=delete pod -l app=hello-world-pod");
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_cli_rejects_unknown_action() {
        assert!(Cli::try_parse_from(["precheck", "deploy", "patch", "x.yaml"]).is_err());
    }

    #[test]
    fn test_exit_code() {
        assert_eq!(exit_code(true), 0);
        assert_eq!(exit_code(false), 1);
    }
}
