#![doc = "HTTP transport for the CLI: implements the core `CiTransport` trait on top of reqwest."]
//
//! # CiClient
//!
//! The engine in `ci-harvest-core` only knows the [`CiTransport`] trait. This
//! module provides the networked implementation used by the binary.
//!
//! - One shared `reqwest::Client` (connection pool) for the whole run.
//! - Every request carries the configured timeout; a timeout is returned as
//!   an error, which the engine absorbs as a soft failure.
//! - HEAD responses are read for their `Content-Length` header directly.

use async_trait::async_trait;
use ci_harvest_core::contract::{CiTransport, HttpResponse, TransportError};
use reqwest::header::CONTENT_LENGTH;
use reqwest::Client;
use std::time::Duration;

pub struct CiClient {
    client: Client,
}

impl CiClient {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("ci-harvest/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                tracing::error!(error = ?e, "Failed to build HTTP client");
                e
            })?;
        tracing::info!(timeout_secs = timeout.as_secs(), "Initialized CiClient");
        Ok(CiClient { client })
    }
}

#[async_trait]
impl CiTransport for CiClient {
    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        tracing::trace!(url = %url, "GET");
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(HttpResponse { status, body })
    }

    async fn head_content_length(&self, url: &str) -> Result<Option<u64>, TransportError> {
        tracing::trace!(url = %url, "HEAD");
        let response = self.client.head(url).send().await?;
        if !response.status().is_success() {
            tracing::debug!(status = %response.status(), url = %url, "HEAD returned error status");
            return Ok(None);
        }
        let length = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u64>().ok());
        Ok(length)
    }
}
