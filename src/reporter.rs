//! Delivery of readings to the realtime webhook.
//!
//! Each reading is posted once. There is no retry and no timeout beyond the
//! HTTP client's defaults; failures are handed back to the caller.

use crate::config::Config;
use crate::sensor::Reading;
use reqwest::StatusCode;
use serde::Deserialize;

/// Acknowledgement returned by the webhook on HTTP 200.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ack {
    /// Optional `message` field of the response body
    pub message: Option<String>,
}

/// Reporter error types.
#[derive(Debug)]
pub enum ReportError {
    /// The endpoint could not be reached
    Transport(String),
    /// The endpoint answered with something other than 200
    Rejected { status: u16, body: String },
    /// The blocking runtime could not be created
    Runtime(String),
}

impl std::fmt::Display for ReportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportError::Transport(msg) => write!(f, "Network error: {msg}"),
            ReportError::Rejected { status, body } => write!(f, "Error {status}: {body}"),
            ReportError::Runtime(msg) => write!(f, "Runtime error: {msg}"),
        }
    }
}

impl std::error::Error for ReportError {}

/// Body of a successful webhook response.
#[derive(Debug, Deserialize)]
struct WebhookResponse {
    #[serde(default)]
    message: Option<String>,
}

/// Anything that can deliver a reading synchronously.
pub trait Deliver {
    fn deliver(&mut self, reading: &Reading) -> Result<Ack, ReportError>;
}

/// Async webhook client.
#[derive(Debug, Clone)]
pub struct Reporter {
    client: reqwest::Client,
    endpoint: String,
    token: String,
    user_id: String,
}

impl Reporter {
    /// Create a reporter for the webhook described by `config`.
    pub fn new(config: &Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: config.webhook_url(),
            token: config.token.clone(),
            user_id: config.user_id.clone(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Post one reading to the webhook.
    pub async fn report(&self, reading: &Reading) -> Result<Ack, ReportError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("X-User-Id", &self.user_id)
            .json(reading)
            .send()
            .await
            .map_err(|e| ReportError::Transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ReportError::Transport(e.to_string()))?;

        if status != StatusCode::OK {
            return Err(ReportError::Rejected {
                status: status.as_u16(),
                body: text,
            });
        }

        // A 200 without a JSON body still counts as delivered.
        let message = serde_json::from_str::<WebhookResponse>(&text)
            .ok()
            .and_then(|r| r.message);

        Ok(Ack { message })
    }
}

/// Blocking reporter for use in the synchronous driver loop.
pub struct BlockingReporter {
    inner: Reporter,
    runtime: tokio::runtime::Runtime,
}

impl BlockingReporter {
    /// Create a new blocking reporter.
    pub fn new(config: &Config) -> Result<Self, ReportError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| ReportError::Runtime(format!("Failed to create runtime: {e}")))?;

        Ok(Self {
            inner: Reporter::new(config),
            runtime,
        })
    }

    /// Post one reading to the webhook.
    pub fn report(&self, reading: &Reading) -> Result<Ack, ReportError> {
        self.runtime.block_on(self.inner.report(reading))
    }

    pub fn endpoint(&self) -> &str {
        self.inner.endpoint()
    }
}

impl Deliver for BlockingReporter {
    fn deliver(&mut self, reading: &Reading) -> Result<Ack, ReportError> {
        self.report(reading)
    }
}
