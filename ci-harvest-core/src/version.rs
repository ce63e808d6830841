//! Version label inference for a build.
//!
//! Labels come from, in order:
//! 1. the smallest artifact's file name (`name-1.2.3.jar` gives `1.2.3`),
//!    replaced by a short commit id when the name is a `SNAPSHOT`;
//! 2. with no artifacts, a short commit id scanned out of the raw build
//!    detail text when that text mentions `SNAPSHOT`;
//! 3. nothing.
//!
//! The commit scan is a heuristic against the upstream's response shape: the
//! first 40-hex token anywhere in the text is taken to be the commit.

use regex::Regex;
use std::sync::OnceLock;

use crate::contract::ArtifactRecord;

const SNAPSHOT_MARKER: &str = "SNAPSHOT";
const SHORT_COMMIT_LEN: usize = 7;
const ARCHIVE_SUFFIXES: &[&str] = &[".tar.gz", ".tgz", ".jar", ".war", ".zip"];

fn commit_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[0-9a-f]{40}").expect("static regex is valid"))
}

fn short_commit(commit: &str) -> Option<String> {
    let short: String = commit.chars().take(SHORT_COMMIT_LEN).collect();
    (!short.is_empty()).then_some(short)
}

fn strip_archive_suffix(file_name: &str) -> &str {
    ARCHIVE_SUFFIXES
        .iter()
        .find_map(|suffix| file_name.strip_suffix(suffix))
        .unwrap_or(file_name)
}

/// Label embedded in an artifact file name, if any.
///
/// `commits` are change-set commit ids, oldest first.
pub fn version_from_file_name(file_name: &str, commits: &[String]) -> Option<String> {
    let stem = strip_archive_suffix(file_name);
    let label = stem
        .split('-')
        .nth(1)
        .filter(|segment| !segment.is_empty())
        .map(str::to_string);

    if stem.contains(SNAPSHOT_MARKER) {
        if let Some(short) = commits.last().and_then(|c| short_commit(c)) {
            return Some(short);
        }
    }
    label
}

/// Short commit id found in raw build detail text that mentions `SNAPSHOT`.
pub fn version_from_raw_detail(raw_detail: &str) -> Option<String> {
    if !raw_detail.contains(SNAPSHOT_MARKER) {
        return None;
    }
    commit_pattern()
        .find(raw_detail)
        .and_then(|m| short_commit(m.as_str()))
}

/// Infer the version label of a build.
///
/// `artifacts` must already be ordered by size; only the first one is used.
/// Returns `None` when no label can be derived, which callers store as "".
pub fn infer_version(
    artifacts: &[ArtifactRecord],
    commits: &[String],
    raw_detail: &str,
) -> Option<String> {
    match artifacts.first() {
        Some(primary) => version_from_file_name(&primary.file_name, commits),
        None => version_from_raw_detail(raw_detail),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact(file_name: &str, size: u64) -> ArtifactRecord {
        ArtifactRecord {
            url: format!("https://ci.example.com/job/proj/1/artifact/{file_name}"),
            file_name: file_name.to_string(),
            hash: String::new(),
            size,
        }
    }

    #[test]
    fn release_jar_yields_second_segment() {
        assert_eq!(
            version_from_file_name("proj-1.2.3.jar", &[]).as_deref(),
            Some("1.2.3")
        );
    }

    #[test]
    fn snapshot_jar_uses_latest_commit() {
        let commits = vec![
            "1111111111111111111111111111111111111111".to_string(),
            "abcdef0123456789abcdef0123456789abcdef01".to_string(),
        ];
        assert_eq!(
            version_from_file_name("proj-SNAPSHOT.jar", &commits).as_deref(),
            Some("abcdef0")
        );
    }

    #[test]
    fn snapshot_without_change_set_keeps_file_label() {
        assert_eq!(
            version_from_file_name("proj-4.0.0-SNAPSHOT.jar", &[]).as_deref(),
            Some("4.0.0")
        );
    }

    #[test]
    fn single_segment_name_has_no_label() {
        assert_eq!(version_from_file_name("proj.jar", &[]), None);
        assert_eq!(version_from_file_name("proj-.jar", &[]), None);
    }

    #[test]
    fn unknown_suffix_is_kept() {
        assert_eq!(
            version_from_file_name("proj-2.0.txt", &[]).as_deref(),
            Some("2.0.txt")
        );
    }

    #[test]
    fn raw_detail_scan_requires_snapshot_marker() {
        let sha = "0123456789abcdef0123456789abcdef01234567";
        assert_eq!(version_from_raw_detail(&format!("{{\"commitId\":\"{sha}\"}}")), None);
        assert_eq!(
            version_from_raw_detail(&format!("1.0-SNAPSHOT {sha}")).as_deref(),
            Some("0123456")
        );
        assert_eq!(version_from_raw_detail("1.0-SNAPSHOT no hash here"), None);
    }

    #[test]
    fn infer_prefers_smallest_artifact() {
        let artifacts = vec![artifact("proj-1.0.0.jar", 10), artifact("proj-all-1.0.0.jar", 99)];
        assert_eq!(
            infer_version(&artifacts, &[], "").as_deref(),
            Some("1.0.0")
        );
    }

    #[test]
    fn infer_falls_back_to_raw_detail_without_artifacts() {
        let raw = "{\"displayName\":\"5.0-SNAPSHOT\",\"commitId\":\"fedcba9876543210fedcba9876543210fedcba98\"}";
        assert_eq!(infer_version(&[], &[], raw).as_deref(), Some("fedcba9"));
        assert_eq!(infer_version(&[], &[], "{}"), None);
    }
}
