//! High-level run: enumerate projects, bring each one up to date, persist.
//!
//! # Error Handling
//! - Enumeration failure aborts the run before any state is touched.
//! - A project whose latest build cannot be determined is reported as
//!   [`ProjectStatus::Failed`] and the run moves on. Its state file is left
//!   as it was and the export still lists its saved builds.
//! - Corrupt persisted state or a failed save aborts the run. Projects
//!   saved earlier in the run keep their new state.
//!
//! Projects are processed one after another; the build range inside each
//! project is the unit of parallel work.

use std::collections::BTreeMap;
use tracing::{error, info, warn};

use crate::config::HarvestConfig;
use crate::contract::{CiTransport, HarvestError, StateStore};
use crate::project::list_projects;
use crate::schedule;
use crate::store::write_export;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectStatus {
    Updated { fetched: usize, absent: u64 },
    UpToDate,
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectReport {
    pub name: String,
    pub status: ProjectStatus,
    /// Checkpoint after this run (unchanged for failed projects).
    pub prev_build_number: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HarvestReport {
    pub projects: Vec<ProjectReport>,
}

impl HarvestReport {
    pub fn failed(&self) -> impl Iterator<Item = &ProjectReport> {
        self.projects
            .iter()
            .filter(|p| matches!(p.status, ProjectStatus::Failed { .. }))
    }

    pub fn has_failures(&self) -> bool {
        self.failed().next().is_some()
    }

    pub fn total_fetched(&self) -> usize {
        self.projects
            .iter()
            .map(|p| match p.status {
                ProjectStatus::Updated { fetched, .. } => fetched,
                _ => 0,
            })
            .sum()
    }
}

pub async fn harvest<T, S>(
    config: &HarvestConfig,
    transport: &T,
    store: &S,
) -> Result<HarvestReport, HarvestError>
where
    T: CiTransport + ?Sized,
    S: StateStore + ?Sized,
{
    config.validate()?;
    info!(base_url = %config.root_url(), "[HARVEST] Starting harvest");

    let projects = list_projects(transport, config.root_url()).await?;
    let selected: Vec<_> = projects
        .into_iter()
        .filter(|p| config.includes(&p.name))
        .collect();
    for wanted in &config.projects {
        if !selected.iter().any(|p| &p.name == wanted) {
            warn!(project = %wanted, "[HARVEST] Configured project not found on server");
        }
    }

    let mut report = HarvestReport::default();
    let mut export = BTreeMap::new();

    for project in &selected {
        info!(project = %project.name, "[HARVEST] Processing project");
        let state = store.load(&project.name)?;
        let checkpoint = state.prev_build_number;
        // Exported as-is if this project fails below.
        let persisted = config.export_path.as_ref().map(|_| state.builds.clone());

        let outcome = match schedule::run(transport, project, state, config.concurrency).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(project = %project.name, error = %e, "[HARVEST][ERROR] Project skipped");
                report.projects.push(ProjectReport {
                    name: project.name.clone(),
                    status: ProjectStatus::Failed {
                        reason: e.to_string(),
                    },
                    prev_build_number: checkpoint,
                });
                if let Some(builds) = persisted {
                    export.insert(project.name.clone(), builds);
                }
                continue;
            }
        };

        store.save(&project.name, &outcome.state)?;
        let status = if outcome.probed == 0 {
            ProjectStatus::UpToDate
        } else {
            ProjectStatus::Updated {
                fetched: outcome.fetched,
                absent: outcome.absent(),
            }
        };

        report.projects.push(ProjectReport {
            name: project.name.clone(),
            status,
            prev_build_number: outcome.state.prev_build_number,
        });
        if config.export_path.is_some() {
            export.insert(project.name.clone(), outcome.state.builds);
        }
    }

    if let Some(path) = &config.export_path {
        write_export(path, &export)?;
    }

    info!(
        projects = report.projects.len(),
        fetched = report.total_fetched(),
        failed = report.failed().count(),
        "[HARVEST] Harvest complete"
    );
    Ok(report)
}
