use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::contract::HarvestError;

pub const DEFAULT_CONCURRENCY: usize = 24;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Everything a harvest run needs to know, after file and env merging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarvestConfig {
    /// Root URL of the CI server (the `/api/json` suffix is appended).
    pub base_url: String,
    /// Directory holding one state file per project.
    pub state_dir: PathBuf,
    /// Maximum number of builds fetched concurrently per project.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Only process these projects; empty means all.
    #[serde(default)]
    pub projects: Vec<String>,
    /// Where to write the combined export of all processed projects.
    #[serde(default)]
    pub export_path: Option<PathBuf>,
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

impl HarvestConfig {
    pub fn new(base_url: impl Into<String>, state_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_url: base_url.into(),
            state_dir: state_dir.into(),
            concurrency: DEFAULT_CONCURRENCY,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            projects: Vec::new(),
            export_path: None,
        }
    }

    /// Root URL with trailing slashes removed.
    pub fn root_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    pub fn validate(&self) -> Result<(), HarvestError> {
        if self.root_url().is_empty() {
            return Err(HarvestError::InvalidConfig("base_url must not be empty".into()));
        }
        if self.concurrency == 0 {
            return Err(HarvestError::InvalidConfig(
                "concurrency must be at least 1".into(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(HarvestError::InvalidConfig(
                "request_timeout_secs must be at least 1".into(),
            ));
        }
        if !(16..=32).contains(&self.concurrency) {
            warn!(
                concurrency = self.concurrency,
                "Concurrency outside the recommended 16..=32 range"
            );
        }
        Ok(())
    }

    /// Whether `name` passes the configured include-list.
    pub fn includes(&self, name: &str) -> bool {
        self.projects.is_empty() || self.projects.iter().any(|p| p == name)
    }

    pub fn trace_loaded(&self) {
        info!(
            base_url = %self.base_url,
            state_dir = %self.state_dir.display(),
            concurrency = self.concurrency,
            projects_count = self.projects.len(),
            "Loaded HarvestConfig"
        );
        debug!(?self, "HarvestConfig loaded (full debug)");
    }
}
