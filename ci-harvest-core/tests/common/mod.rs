//! In-memory CI server for integration tests, served through `MockCiTransport`.
#![allow(dead_code)]

use ci_harvest_core::contract::{HttpResponse, MockCiTransport};
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

pub const BASE: &str = "https://ci.example.com";

pub fn job_url(name: &str) -> String {
    format!("{BASE}/job/{name}")
}

pub fn sha(prefix: &str) -> String {
    format!("{prefix:0<40}")
}

pub fn md5(prefix: &str) -> String {
    format!("{prefix:0<32}")
}

/// One artifact as served by the fake server.
pub struct FakeArtifact {
    pub file_name: String,
    pub size: u64,
    pub hash: String,
}

pub fn artifact(file_name: &str, size: u64, hash: &str) -> FakeArtifact {
    FakeArtifact {
        file_name: file_name.to_string(),
        size,
        hash: hash.to_string(),
    }
}

/// Builder for the responses of a fake CI server. Unknown GETs answer 404,
/// unknown HEADs answer without a length.
#[derive(Default)]
pub struct FakeCi {
    jobs: Vec<String>,
    gets: HashMap<String, HttpResponse>,
    heads: HashMap<String, u64>,
    failing: HashSet<String>,
}

impl FakeCi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn job(mut self, name: &str, last_build: u64) -> Self {
        self.jobs.push(name.to_string());
        let body = if last_build == 0 {
            json!({ "lastBuild": null, "nextBuildNumber": 1 })
        } else {
            json!({ "lastBuild": { "number": last_build }, "nextBuildNumber": last_build + 1 })
        };
        self.gets
            .insert(format!("{}/api/json", job_url(name)), HttpResponse::ok(body.to_string()));
        self
    }

    pub fn build(mut self, name: &str, number: u64, artifacts: Vec<FakeArtifact>, commits: &[&str]) -> Self {
        let build_url = format!("{}/{number}", job_url(name));
        let entries: Vec<_> = artifacts
            .iter()
            .map(|a| json!({ "relativePath": format!("target/{}", a.file_name), "fileName": a.file_name }))
            .collect();
        let items: Vec<_> = commits.iter().map(|c| json!({ "commitId": c })).collect();
        let body = json!({
            "result": "SUCCESS",
            "artifacts": entries,
            "changeSet": { "items": items },
        });
        self.gets
            .insert(format!("{build_url}/api/json"), HttpResponse::ok(body.to_string()));

        for a in artifacts {
            let artifact_url = format!("{build_url}/artifact/target/{}", a.file_name);
            self.heads.insert(artifact_url.clone(), a.size);
            self.gets.insert(
                format!("{artifact_url}/*fingerprint*/"),
                HttpResponse::ok(format!("<html><td>MD5:</td><td>{}</td></html>", a.hash)),
            );
        }
        self
    }

    /// Serve `body` verbatim for a build's detail endpoint.
    pub fn raw_build(mut self, name: &str, number: u64, body: &str) -> Self {
        self.gets.insert(
            format!("{}/{number}/api/json", job_url(name)),
            HttpResponse::ok(body),
        );
        self
    }

    pub fn respond(mut self, url: &str, response: HttpResponse) -> Self {
        self.gets.insert(url.to_string(), response);
        self
    }

    /// Make every request (GET or HEAD) to `url` fail at the transport level.
    pub fn fail(mut self, url: &str) -> Self {
        self.failing.insert(url.to_string());
        self
    }

    /// Build the mock and a log of every requested URL.
    pub fn into_mock(mut self) -> (MockCiTransport, Arc<Mutex<Vec<String>>>) {
        let jobs: Vec<_> = self
            .jobs
            .iter()
            .map(|name| json!({ "name": name, "url": format!("{}/", job_url(name)) }))
            .collect();
        self.gets.insert(
            format!("{BASE}/api/json"),
            HttpResponse::ok(json!({ "jobs": jobs }).to_string()),
        );

        let log = Arc::new(Mutex::new(Vec::new()));
        let mut transport = MockCiTransport::new();

        let gets = self.gets;
        let failing = Arc::new(self.failing);
        let get_log = log.clone();
        let get_failing = failing.clone();
        transport.expect_get().returning(move |url: &str| {
            get_log.lock().unwrap().push(format!("GET {url}"));
            if get_failing.contains(url) {
                return Err(format!("connection reset: {url}").into());
            }
            Ok(gets.get(url).cloned().unwrap_or_else(|| HttpResponse::status(404)))
        });

        let heads = self.heads;
        let head_log = log.clone();
        transport.expect_head_content_length().returning(move |url: &str| {
            head_log.lock().unwrap().push(format!("HEAD {url}"));
            if failing.contains(url) {
                return Err(format!("timed out: {url}").into());
            }
            Ok(heads.get(url).copied())
        });

        (transport, log)
    }
}

pub fn requested(log: &Arc<Mutex<Vec<String>>>) -> Vec<String> {
    log.lock().unwrap().clone()
}
