//! Project enumeration and per-job latest-build lookup.

use serde::Deserialize;
use tracing::{debug, error, info};

use crate::contract::{CiTransport, HarvestError, Project};

#[derive(Debug, Deserialize)]
struct RootListing {
    jobs: Vec<JobEntry>,
}

#[derive(Debug, Deserialize)]
struct JobEntry {
    name: String,
    url: String,
}

#[derive(Debug, Deserialize)]
struct JobDetail {
    #[serde(rename = "lastBuild", default)]
    last_build: Option<BuildRef>,
    #[serde(rename = "nextBuildNumber", default)]
    next_build_number: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct BuildRef {
    number: u64,
}

/// GET `url` and return the body, treating transport failures and
/// non-success statuses alike as upstream errors.
async fn get_ok<T>(transport: &T, url: &str) -> Result<String, HarvestError>
where
    T: CiTransport + ?Sized,
{
    let response = transport.get(url).await.map_err(|e| {
        error!(error = %e, url = %url, "Request to CI server failed");
        HarvestError::upstream(url, e)
    })?;
    if !response.is_success() {
        error!(status = response.status, url = %url, "CI server returned error status");
        return Err(HarvestError::upstream(
            url,
            format!("HTTP status {}", response.status),
        ));
    }
    Ok(response.body)
}

/// Lists every job on the CI server root.
///
/// There is no retry: without a project list nothing downstream can run,
/// so the caller is expected to abort.
pub async fn list_projects<T>(transport: &T, base_url: &str) -> Result<Vec<Project>, HarvestError>
where
    T: CiTransport + ?Sized,
{
    let url = format!("{}/api/json", base_url.trim_end_matches('/'));
    info!(url = %url, "Listing projects");
    let body = get_ok(transport, &url).await?;
    let listing: RootListing = serde_json::from_str(&body).map_err(|e| {
        error!(error = %e, url = %url, "Root listing has no usable job list");
        HarvestError::upstream(url.as_str(), e)
    })?;

    let projects: Vec<Project> = listing
        .jobs
        .into_iter()
        .map(|job| Project {
            name: job.name,
            url: job.url.trim_end_matches('/').to_string(),
        })
        .collect();
    info!(count = projects.len(), "Listed projects");
    Ok(projects)
}

/// Highest build number the server currently knows for a job.
///
/// Uses `lastBuild.number`; a job that never built has a null `lastBuild`,
/// in which case `nextBuildNumber - 1` is used, falling back to 0.
pub async fn latest_build_number<T>(transport: &T, job_url: &str) -> Result<u64, HarvestError>
where
    T: CiTransport + ?Sized,
{
    let url = format!("{job_url}/api/json");
    let body = get_ok(transport, &url).await?;
    let detail: JobDetail = serde_json::from_str(&body).map_err(|e| {
        error!(error = %e, url = %url, "Job detail could not be parsed");
        HarvestError::upstream(url.as_str(), e)
    })?;

    let latest = match (detail.last_build, detail.next_build_number) {
        (Some(last), _) => last.number,
        (None, Some(next)) => next.saturating_sub(1),
        (None, None) => 0,
    };
    debug!(job_url = %job_url, latest, "Resolved latest build number");
    Ok(latest)
}
