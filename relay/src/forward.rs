//! Forwarding to the downstream application.
//!
//! Exactly one POST per inbound message. The outcome is logged and then
//! dropped: there is no retry and nothing is reported back to Twilio.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::{header, Client, StatusCode};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::message::{ForwardPayload, InboundMessage};
use crate::Config;

/// Why a forward call did not succeed.
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("forward timed out after {0:?}")]
    Timeout(Duration),

    #[error("forward request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("downstream responded with {status}")]
    Status { status: StatusCode, body: String },
}

/// Sends normalized payloads to the downstream webhook endpoint.
///
/// Cheap to clone; the underlying `reqwest::Client` shares its pool.
#[derive(Clone)]
pub struct Forwarder {
    client: Client,
    endpoint: String,
    api_key: String,
    timeout: Duration,
    debug: bool,
}

impl Forwarder {
    /// Create a forwarder for the endpoint described by `config`.
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            endpoint: config.forward_endpoint(),
            api_key: config.main_app_api_key.clone(),
            timeout: config.forward_timeout,
            debug: config.debug,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// POST the payload and return the downstream status on success.
    pub async fn forward(&self, payload: &ForwardPayload) -> Result<StatusCode, ForwardError> {
        let response = self
            .client
            .post(&self.endpoint)
            .timeout(self.timeout)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
            .json(payload)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                warn!(
                    status_code = status.as_u16(),
                    error = %e,
                    "forward_response_body_unreadable"
                );
                String::new()
            }
        };

        if !status.is_success() {
            return Err(ForwardError::Status { status, body });
        }

        if self.debug {
            debug!(
                status_code = status.as_u16(),
                response_body = %body,
                "forward_response"
            );
        }

        Ok(status)
    }

    /// Forward a message in a detached task.
    ///
    /// The caller never awaits the returned handle on the request path; it
    /// exists so tests can wait for the outcome.
    pub fn spawn_forward(&self, message: InboundMessage) -> JoinHandle<()> {
        let forwarder = self.clone();
        tokio::spawn(async move {
            forwarder.forward_and_log(message).await;
        })
    }

    async fn forward_and_log(&self, message: InboundMessage) {
        let payload = message.to_forward_payload();
        let started = Instant::now();

        info!(
            endpoint = %self.endpoint,
            message_id = ?payload.message_id,
            media_count = payload.media_urls.len(),
            "forward_starting"
        );

        match self.forward(&payload).await {
            Ok(status) => {
                info!(
                    message_id = ?payload.message_id,
                    status_code = status.as_u16(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "forward_complete"
                );
            }
            Err(ForwardError::Status { status, body }) if self.debug => {
                error!(
                    message_id = ?payload.message_id,
                    status_code = status.as_u16(),
                    response_body = %body,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "forward_failed"
                );
            }
            Err(ForwardError::Status { status, .. }) => {
                error!(
                    message_id = ?payload.message_id,
                    status_code = status.as_u16(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "forward_failed"
                );
            }
            Err(e) => {
                error!(
                    message_id = ?payload.message_id,
                    error = %e,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "forward_failed"
                );
            }
        }
    }

    fn classify(&self, e: reqwest::Error) -> ForwardError {
        if e.is_timeout() {
            ForwardError::Timeout(self.timeout)
        } else {
            ForwardError::Request(e)
        }
    }
}
