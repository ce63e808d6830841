//! # contract: shared data model and seams of the harvester
//!
//! This module defines the data carried through a harvest run and the two
//! traits the engine is written against:
//!
//! - [`CiTransport`]: the HTTP side. Every component that talks to the CI
//!   server receives one of these, so tests can substitute a mock.
//! - [`StateStore`]: durable per-project state, loaded once before a project
//!   is processed and saved once after.
//!
//! ## Mocking & Testing
//! Both traits are annotated for `mockall`; the generated `MockCiTransport`
//! and `MockStateStore` are exported when the `test-export-mocks` feature is
//! enabled (default), so integration tests in `tests/` can use them.
//!
//! ## Errors
//! Transport calls return the boxed [`TransportError`]. Engine-level failures
//! that must reach the caller are [`HarvestError`]; everything else is
//! absorbed where it happens (see the fetch and artifact modules).

use async_trait::async_trait;
use mockall::automock;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Error type for [`CiTransport`] calls (simple boxed error).
pub type TransportError = Box<dyn std::error::Error + Send + Sync>;

/// A job on the CI server, as reported by the root listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub name: String,
    /// Job URL without a trailing slash.
    pub url: String,
}

/// One artifact retained by the CI server for a build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRecord {
    pub url: String,
    pub file_name: String,
    /// 32 lowercase hex characters, or empty when unresolved.
    pub hash: String,
    /// Size in bytes, 0 when unresolved.
    pub size: u64,
}

/// Metadata harvested for one existing build number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildRecord {
    pub build_number: u64,
    pub version: String,
    /// Ascending by `size`.
    pub artifacts: Vec<ArtifactRecord>,
}

/// Persisted state of one project.
///
/// `builds` is strictly ascending by `build_number`, and `prev_build_number`
/// is the highest build number already probed (found or absent).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectState {
    pub builds: Vec<BuildRecord>,
    pub prev_build_number: u64,
}

impl ProjectState {
    /// Returns the first build number that breaks the strictly-ascending
    /// ordering of `builds`, if any.
    pub fn ordering_violation(&self) -> Option<u64> {
        self.builds
            .windows(2)
            .find(|pair| pair[0].build_number >= pair[1].build_number)
            .map(|pair| pair[1].build_number)
    }
}

/// Minimal HTTP response as seen by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: String::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Transport used to talk to the CI server.
///
/// Implementations own connection pooling and per-request timeouts; a
/// timeout must surface as an `Err`, never as a hang.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait CiTransport: Send + Sync {
    /// Issue a GET request and return status plus body text.
    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError>;

    /// Issue a HEAD request and return the `Content-Length` header, if the
    /// request succeeded and the header was present and numeric.
    async fn head_content_length(&self, url: &str) -> Result<Option<u64>, TransportError>;
}

/// Durable storage of [`ProjectState`], keyed by project name.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait StateStore: Send + Sync {
    /// Load the state of `project`, or the empty default if none was saved.
    fn load(&self, project: &str) -> Result<ProjectState, HarvestError>;

    /// Replace the persisted state of `project`.
    fn save(&self, project: &str, state: &ProjectState) -> Result<(), HarvestError>;
}

/// Failures that reach the caller of the engine.
#[derive(Debug, thiserror::Error)]
pub enum HarvestError {
    #[error("upstream request failed ({context}): {reason}")]
    Upstream { context: String, reason: String },

    #[error("persisted state for project '{project}' is corrupt: {reason}")]
    CorruptState { project: String, reason: String },

    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl HarvestError {
    pub(crate) fn upstream(context: impl Into<String>, reason: impl ToString) -> Self {
        HarvestError::Upstream {
            context: context.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        HarvestError::Io {
            path: path.into(),
            source,
        }
    }
}
