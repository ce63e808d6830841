//! Checkpointed range scheduler.
//!
//! Given a project's persisted state, probes every build number above the
//! checkpoint up to the job's latest build, with at most `concurrency`
//! fetches in flight, and merges what was found into the state.
//!
//! Workers share nothing: each fetch returns its own `Option<BuildRecord>`
//! and the merge happens once, after the whole range has completed. The
//! checkpoint advances to `latest` even across absent builds so dead numbers
//! are never probed again.

use futures::stream::{self, StreamExt};
use tracing::{debug, info};

use crate::contract::{BuildRecord, CiTransport, HarvestError, Project, ProjectState};
use crate::fetch::fetch_build;
use crate::project::latest_build_number;

/// Result of scheduling one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleOutcome {
    pub state: ProjectState,
    /// Build numbers dispatched in this run.
    pub probed: u64,
    /// Records produced out of `probed`.
    pub fetched: usize,
}

impl ScheduleOutcome {
    pub fn absent(&self) -> u64 {
        self.probed - self.fetched as u64
    }
}

/// Merge freshly fetched records into `state` and advance its checkpoint.
///
/// Fetched numbers all lie above the old checkpoint, so they cannot collide
/// with existing records.
pub fn merge_builds(mut state: ProjectState, fetched: Vec<BuildRecord>, latest: u64) -> ProjectState {
    state.builds.extend(fetched);
    state.builds.sort_by_key(|b| b.build_number);
    state.prev_build_number = state.prev_build_number.max(latest);
    state
}

/// Bring `state` up to date with the job's latest build.
pub async fn run<T>(
    transport: &T,
    project: &Project,
    state: ProjectState,
    concurrency: usize,
) -> Result<ScheduleOutcome, HarvestError>
where
    T: CiTransport + ?Sized,
{
    let latest = latest_build_number(transport, &project.url).await?;
    let checkpoint = state.prev_build_number;

    if latest <= checkpoint {
        info!(project = %project.name, latest, checkpoint, "Project up to date");
        return Ok(ScheduleOutcome {
            state,
            probed: 0,
            fetched: 0,
        });
    }

    let total = latest - checkpoint;
    info!(
        project = %project.name,
        from = checkpoint + 1,
        to = latest,
        total,
        concurrency,
        "Fetching builds"
    );

    let mut completed: u64 = 0;
    let mut fetched: Vec<BuildRecord> = Vec::new();
    let mut results = stream::iter((checkpoint + 1)..=latest)
        .map(|number| fetch_build(transport, &project.url, number))
        .buffer_unordered(concurrency.max(1));

    while let Some(result) = results.next().await {
        completed += 1;
        debug!(project = %project.name, completed, total, "Build fetch completed");
        if let Some(record) = result {
            fetched.push(record);
        }
    }

    let fetched_count = fetched.len();
    info!(
        project = %project.name,
        fetched = fetched_count,
        absent = total - fetched_count as u64,
        "Finished fetching builds"
    );

    Ok(ScheduleOutcome {
        state: merge_builds(state, fetched, latest),
        probed: total,
        fetched: fetched_count,
    })
}
