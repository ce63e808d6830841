//! Artifact resolution: size from a HEAD probe, content hash from the CI
//! server's fingerprint view.
//!
//! Both lookups are soft. A failed lookup leaves the field unresolved and the
//! record falls back to `0` / `""`. The artifact itself is never downloaded.

use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

use crate::contract::{ArtifactRecord, CiTransport};

fn fingerprint_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\b[0-9a-fA-F]{32}\b").expect("static regex is valid"))
}

/// URL of an artifact of build `build_number`.
pub fn artifact_url(job_url: &str, build_number: u64, relative_path: &str) -> String {
    format!("{job_url}/{build_number}/artifact/{}", relative_path.trim())
}

/// URL of the fingerprint view for an artifact URL.
pub fn fingerprint_url(artifact_url: &str) -> String {
    format!("{artifact_url}/*fingerprint*/")
}

/// First standalone 32-hex-character token in a fingerprint page, lowercased.
///
/// Longer hex runs (commit ids, crumbs) are skipped. Heuristic: an unrelated
/// 32-hex token earlier in the page would still be picked.
pub fn extract_fingerprint(body: &str) -> Option<String> {
    fingerprint_pattern()
        .find(body)
        .map(|m| m.as_str().to_ascii_lowercase())
}

/// Outcome of the two lookups for one artifact; `None` means unresolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactLookup {
    pub size: Option<u64>,
    pub hash: Option<String>,
}

impl ArtifactLookup {
    pub fn into_record(self, url: String, file_name: String) -> ArtifactRecord {
        ArtifactRecord {
            url,
            file_name,
            hash: self.hash.unwrap_or_default(),
            size: self.size.unwrap_or(0),
        }
    }
}

async fn probe_size<T>(transport: &T, url: &str) -> Option<u64>
where
    T: CiTransport + ?Sized,
{
    match transport.head_content_length(url).await {
        Ok(size) => {
            if size.is_none() {
                debug!(url = %url, "No Content-Length for artifact");
            }
            size
        }
        Err(e) => {
            debug!(error = %e, url = %url, "Size probe failed");
            None
        }
    }
}

async fn lookup_hash<T>(transport: &T, url: &str) -> Option<String>
where
    T: CiTransport + ?Sized,
{
    let fingerprint = fingerprint_url(url);
    match transport.get(&fingerprint).await {
        Ok(response) if response.is_success() => {
            let hash = extract_fingerprint(&response.body);
            if hash.is_none() {
                debug!(url = %fingerprint, "Fingerprint page has no hash token");
            }
            hash
        }
        Ok(response) => {
            debug!(status = response.status, url = %fingerprint, "Fingerprint view unavailable");
            None
        }
        Err(e) => {
            debug!(error = %e, url = %fingerprint, "Fingerprint lookup failed");
            None
        }
    }
}

/// Run both lookups for the artifact at `url` concurrently.
pub async fn lookup<T>(transport: &T, url: &str) -> ArtifactLookup
where
    T: CiTransport + ?Sized,
{
    let (size, hash) = futures::join!(probe_size(transport, url), lookup_hash(transport, url));
    ArtifactLookup { size, hash }
}

/// Resolve one artifact of a build into its record.
pub async fn resolve<T>(
    transport: &T,
    job_url: &str,
    build_number: u64,
    relative_path: &str,
    file_name: &str,
) -> ArtifactRecord
where
    T: CiTransport + ?Sized,
{
    let url = artifact_url(job_url, build_number, relative_path);
    let lookup = lookup(transport, &url).await;
    lookup.into_record(url, file_name.to_string())
}
