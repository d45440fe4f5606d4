//! Completion client: send one prompt to Ollama, get raw text back.
//!
//! The client is deliberately dumb. It knows the `/api/generate` wire format
//! and how to classify failures; everything about *what* to ask and how to
//! read the answer lives in [`crate::prompts`] and
//! [`crate::pipeline::normalize`].
//!
//! ## Failure classes
//!
//! | Situation                                  | Error                              |
//! |--------------------------------------------|------------------------------------|
//! | connection refused, DNS failure, timeout   | [`GuruError::ServiceUnavailable`]  |
//! | non-2xx status                             | [`GuruError::ServiceProtocol`]     |
//! | 2xx with a body that is not the reply JSON | [`GuruError::ServiceProtocol`]     |
//!
//! No retries happen here. A failed call fails the request; callers may
//! retry the whole operation.

use crate::config::GuruConfig;
use crate::error::GuruError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Something that turns a prompt into completion text.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Generate up to `max_tokens` tokens for `prompt`; returns trimmed text.
    async fn complete(&self, prompt: &str, max_tokens: usize) -> Result<String, GuruError>;

    /// Cheap reachability probe. Never errors.
    async fn check_connection(&self) -> bool;

    /// Model identifier, for health reporting.
    fn model(&self) -> &str;
}

/// Body of `POST /api/generate`.
#[derive(Debug, Serialize)]
pub struct GenerateRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub stream: bool,
    pub options: GenerateOptions,
}

/// Sampling options nested in [`GenerateRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GenerateOptions {
    pub num_predict: usize,
    pub temperature: f32,
    pub top_p: f32,
}

/// The part of the `/api/generate` reply we read.
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

/// HTTP client for a local Ollama server.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    temperature: f32,
    top_p: f32,
    request_timeout: Duration,
    health_timeout: Duration,
}

impl OllamaClient {
    /// Build a client from the config's URL, model, sampling and timeouts.
    pub fn new(config: &GuruConfig) -> Result<Self, GuruError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| GuruError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            top_p: config.top_p,
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            health_timeout: Duration::from_secs(config.health_timeout_secs),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn options(&self, max_tokens: usize) -> GenerateOptions {
        GenerateOptions {
            num_predict: max_tokens,
            temperature: self.temperature,
            top_p: self.top_p,
        }
    }

    fn unavailable(&self, err: &reqwest::Error) -> GuruError {
        let reason = if err.is_timeout() {
            format!("timed out after {}s", self.request_timeout.as_secs())
        } else if err.is_connect() {
            format!("connection failed: {}", err)
        } else {
            err.to_string()
        };
        GuruError::ServiceUnavailable {
            url: self.base_url.clone(),
            reason,
        }
    }
}

#[async_trait]
impl CompletionProvider for OllamaClient {
    async fn complete(&self, prompt: &str, max_tokens: usize) -> Result<String, GuruError> {
        let start = Instant::now();
        let body = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: self.options(max_tokens),
        };

        let response = self
            .http
            .post(format!("{}/api/generate", self.base_url))
            .timeout(self.request_timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.unavailable(&e))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            warn!("Ollama returned {}: {}", status, detail);
            return Err(GuruError::ServiceProtocol {
                status: status.as_u16(),
                detail: if detail.is_empty() {
                    status.to_string()
                } else {
                    detail
                },
            });
        }

        let bytes = response.bytes().await.map_err(|e| self.unavailable(&e))?;
        let reply: GenerateResponse =
            serde_json::from_slice(&bytes).map_err(|e| GuruError::ServiceProtocol {
                status: status.as_u16(),
                detail: format!("malformed reply: {}", e),
            })?;

        let text = reply.response.trim().to_string();
        debug!(
            "Completion: {} prompt chars → {} reply chars in {:?}",
            prompt.len(),
            text.len(),
            start.elapsed()
        );
        Ok(text)
    }

    async fn check_connection(&self) -> bool {
        match self
            .http
            .get(format!("{}/api/tags", self.base_url))
            .timeout(self.health_timeout)
            .send()
            .await
        {
            Ok(r) => r.status().is_success(),
            Err(e) => {
                debug!("Ollama probe failed: {}", e);
                false
            }
        }
    }

    fn model(&self) -> &str {
        &self.model
    }
}
