//! Build fetcher: turns one build number into a [`BuildRecord`], or `None`
//! when the build does not exist or its detail cannot be used.
//!
//! Probing a contiguous range of numbers inherently hits deleted or not yet
//! materialised builds, so every failure here is absorbed and reported as
//! `None` for this build number only.

use futures::future::join_all;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::artifact;
use crate::contract::{BuildRecord, CiTransport};
use crate::version::infer_version;

#[derive(Debug, Deserialize)]
struct BuildDetail {
    #[serde(default)]
    artifacts: Vec<ArtifactEntry>,
    #[serde(rename = "changeSet", default)]
    change_set: Option<ChangeSet>,
    #[serde(rename = "changeSets", default)]
    change_sets: Vec<ChangeSet>,
}

#[derive(Debug, Deserialize)]
struct ArtifactEntry {
    #[serde(rename = "relativePath")]
    relative_path: String,
    #[serde(rename = "fileName")]
    file_name: String,
}

#[derive(Debug, Default, Deserialize)]
struct ChangeSet {
    #[serde(default)]
    items: Vec<ChangeSetItem>,
}

#[derive(Debug, Deserialize)]
struct ChangeSetItem {
    #[serde(rename = "commitId", default)]
    commit_id: Option<String>,
}

impl BuildDetail {
    /// Commit ids of every change-set item, oldest first. Freestyle jobs
    /// report `changeSet`, pipeline jobs `changeSets`.
    fn commits(&self) -> Vec<String> {
        self.change_set
            .iter()
            .chain(self.change_sets.iter())
            .flat_map(|set| set.items.iter())
            .filter_map(|item| item.commit_id.clone())
            .collect()
    }
}

pub fn build_detail_url(job_url: &str, build_number: u64) -> String {
    format!("{job_url}/{build_number}/api/json")
}

/// Fetch and assemble the record for `build_number` of the job at `job_url`.
pub async fn fetch_build<T>(transport: &T, job_url: &str, build_number: u64) -> Option<BuildRecord>
where
    T: CiTransport + ?Sized,
{
    let url = build_detail_url(job_url, build_number);
    let response = match transport.get(&url).await {
        Ok(response) => response,
        Err(e) => {
            warn!(error = %e, url = %url, build_number, "Build detail request failed");
            return None;
        }
    };
    if !response.is_success() {
        debug!(status = response.status, build_number, "Build absent");
        return None;
    }

    let detail: BuildDetail = match serde_json::from_str(&response.body) {
        Ok(detail) => detail,
        Err(e) => {
            warn!(error = %e, url = %url, build_number, "Build detail could not be parsed");
            return None;
        }
    };

    let resolutions = detail.artifacts.iter().map(|entry| {
        artifact::resolve(
            transport,
            job_url,
            build_number,
            &entry.relative_path,
            &entry.file_name,
        )
    });
    let mut artifacts = join_all(resolutions).await;
    artifacts.sort_by_key(|a| a.size);

    let version = infer_version(&artifacts, &detail.commits(), &response.body).unwrap_or_default();
    debug!(
        build_number,
        version = %version,
        artifacts = artifacts.len(),
        "Fetched build"
    );

    Some(BuildRecord {
        build_number,
        version,
        artifacts,
    })
}
