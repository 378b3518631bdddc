// SPDX-License-Identifier: GPL-3.0-only

//! Decode service client
//!
//! Posts a QR payload as raw bytes to the remote decode endpoint and returns
//! the JSON document it answers with.

use crate::config::Config;
use crate::constants::service;
use crate::errors::{AppError, SubmissionError};
use reqwest::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde_json::{Value, json};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Destination for decoded payloads
pub trait Submitter: Send + Sync {
    /// Send a payload and return the service's JSON answer
    fn submit(&self, payload: Vec<u8>) -> impl Future<Output = Result<Value, SubmissionError>> + Send;
}

/// HTTP client for the decode service
#[derive(Debug, Clone)]
pub struct DecodeServiceClient {
    client: Client,
    endpoint: String,
}

impl DecodeServiceClient {
    /// Build a client with the static headers baked in
    pub fn new(endpoint: &str, token: &str, timeout: Duration) -> Result<Self, SubmissionError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(service::ACCEPT));
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static(service::PAYLOAD_CONTENT_TYPE),
        );
        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|e| SubmissionError::Client(format!("Invalid bearer token: {}", e)))?;
        bearer.set_sensitive(true);
        headers.insert(AUTHORIZATION, bearer);

        let mut builder = Client::builder()
            .use_rustls_tls()
            .default_headers(headers)
            .timeout(timeout);
        if is_loopback(endpoint) {
            builder = builder.no_proxy();
        }
        let client = builder
            .build()
            .map_err(|e| SubmissionError::Client(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// POST the payload to the endpoint
    pub async fn post(&self, payload: Vec<u8>) -> Result<Value, SubmissionError> {
        info!(endpoint = %self.endpoint, bytes = payload.len(), "Submitting payload to decode service");

        let response = self
            .client
            .post(&self.endpoint)
            .body(payload)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Decode service request failed");
                SubmissionError::Transport(e.to_string())
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| SubmissionError::Transport(format!("Failed to read response: {}", e)))?;
        debug!(status = status.as_u16(), bytes = text.len(), "Decode service answered");

        if !status.is_success() {
            warn!(status = status.as_u16(), "Decode service returned an error status");
            return Err(SubmissionError::Http {
                status: status.as_u16(),
                body: parse_error_body(&text),
            });
        }

        serde_json::from_str(&text).map_err(|e| SubmissionError::InvalidResponse(e.to_string()))
    }
}

impl Submitter for DecodeServiceClient {
    fn submit(&self, payload: Vec<u8>) -> impl Future<Output = Result<Value, SubmissionError>> + Send {
        self.post(payload)
    }
}

/// Local endpoints never go through a system proxy
fn is_loopback(endpoint: &str) -> bool {
    reqwest::Url::parse(endpoint)
        .ok()
        .and_then(|url| {
            url.host_str().map(|host| {
                host == "localhost"
                    || host
                        .parse::<std::net::IpAddr>()
                        .map(|ip| ip.is_loopback())
                        .unwrap_or(false)
            })
        })
        .unwrap_or(false)
}

/// Error bodies are shown as JSON when they are JSON, as a string otherwise
fn parse_error_body(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

/// Submitter that only describes the payload, for `--dry-run`
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRun;

impl Submitter for DryRun {
    async fn submit(&self, payload: Vec<u8>) -> Result<Value, SubmissionError> {
        let hex: String = payload.iter().map(|b| format!("{:02x}", b)).collect();
        Ok(json!({
            "dry_run": true,
            "bytes": payload.len(),
            "hex": hex,
        }))
    }
}

/// Submitter picked from configuration
#[derive(Debug, Clone)]
pub enum DecodeService {
    Remote(DecodeServiceClient),
    DryRun(DryRun),
    /// The client could not be built; every submission fails with the reason
    Unconfigured(String),
}

impl DecodeService {
    /// Build the remote client, or a dry run when `dry_run` is set
    ///
    /// A dry run needs neither a valid endpoint nor a token.
    pub fn from_config(config: &Config, dry_run: bool) -> Result<Self, AppError> {
        if dry_run {
            return Ok(DecodeService::DryRun(DryRun));
        }
        config.validate()?;
        let token = config.token.resolve()?;
        let client = DecodeServiceClient::new(&config.endpoint, &token, config.request_timeout())?;
        Ok(DecodeService::Remote(client))
    }

    /// Like [`DecodeService::from_config`], but a configuration problem is
    /// deferred to submission time instead of failing up front
    pub fn for_session(config: &Config, dry_run: bool) -> Self {
        Self::from_config(config, dry_run).unwrap_or_else(|e| {
            warn!(error = %e, "Decode service unavailable, submissions will fail");
            DecodeService::Unconfigured(e.to_string())
        })
    }
}

impl Submitter for DecodeService {
    async fn submit(&self, payload: Vec<u8>) -> Result<Value, SubmissionError> {
        match self {
            DecodeService::Remote(client) => client.post(payload).await,
            DecodeService::DryRun(dry_run) => dry_run.submit(payload).await,
            DecodeService::Unconfigured(reason) => Err(SubmissionError::Client(reason.clone())),
        }
    }
}
