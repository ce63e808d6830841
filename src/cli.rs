///
/// This module implements the CLI interface for ci-harvest: command parsing, config
/// loading, and wiring the reqwest client and the file store into the core engine.
///
/// All harvesting logic (fetching, merging, checkpointing) lives in the
/// [`ci-harvest-core`] crate. This module is strictly CLI glue.
///
/// ## How To Use
/// - From the command line: `ci-harvest harvest --config harvest.yaml`.
/// - Programmatically / in tests: call [`run`] with a constructed [`Cli`].
///
/// [`ci-harvest-core`]: ../../ci-harvest-core/
use crate::client::CiClient;
use crate::load_config::load_config;
use anyhow::Result;
use ci_harvest_core::harvest::{harvest, ProjectStatus};
use ci_harvest_core::store::JsonFileStore;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

/// CLI for ci-harvest: incrementally harvest CI build metadata.
#[derive(Parser)]
#[clap(
    name = "ci-harvest",
    version,
    about = "Incrementally harvest build versions, artifacts and hashes from a Jenkins-style CI server"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch all builds not yet harvested and update the per-project state files
    Harvest {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
        /// Only harvest this project (repeatable); overrides the config's list
        #[clap(long = "project")]
        projects: Vec<String>,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Harvest { config, projects } => {
            let mut config = load_config(config)?;
            if !projects.is_empty() {
                config.projects = projects;
            }
            tracing::info!(command = "harvest", "Starting harvest");

            let transport = CiClient::new(Duration::from_secs(config.request_timeout_secs))
                .map_err(|e| anyhow::Error::msg(format!("Failed to construct HTTP client: {e}")))?;
            let store = JsonFileStore::new(&config.state_dir);

            let report = harvest(&config, &transport, &store).await.map_err(|e| {
                tracing::error!(command = "harvest", error = %e, "Harvest failed");
                anyhow::Error::new(e)
            })?;

            for project in &report.projects {
                match &project.status {
                    ProjectStatus::Updated { fetched, absent } => println!(
                        "{}: {} new builds, {} absent, checkpoint {}",
                        project.name, fetched, absent, project.prev_build_number
                    ),
                    ProjectStatus::UpToDate => println!(
                        "{}: up to date at {}",
                        project.name, project.prev_build_number
                    ),
                    ProjectStatus::Failed { reason } => {
                        eprintln!("{}: failed: {}", project.name, reason)
                    }
                }
            }

            if report.has_failures() {
                let failed = report.failed().count();
                tracing::error!(command = "harvest", failed, "Harvest finished with failed projects");
                anyhow::bail!("{failed} project(s) failed to harvest");
            }
            tracing::info!(command = "harvest", ?report, "Harvest complete");
            Ok(())
        }
    }
}
