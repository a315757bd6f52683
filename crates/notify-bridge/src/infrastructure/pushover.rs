//! Pushover push-delivery client.
//!
//! Implements [`DeliveryClient`] against the Pushover messages API:
//!
//! ```text
//! POST {base_url}/1/messages.json
//! Content-Type: application/x-www-form-urlencoded
//!
//! token=<app token>&user=<user key>&message=<body>
//! ```
//!
//! Pushover answers with a small JSON document:
//!
//! ```json
//! {"status": 1, "request": "647d2300-702c-4b38-8b2f-d56326ae460b"}
//! {"status": 0, "errors": ["user identifier is invalid"], "request": "..."}
//! ```
//!
//! A request counts as delivered only when the HTTP status is a success *and*
//! the body says `"status": 1`.
//!
//! Obvious problems (empty tokens, an over-long body) are caught locally
//! before any network traffic so they fail fast with a precise error.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::application::dispatch::{DeliveryClient, DeliveryError};

/// Production API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.pushover.net";

/// Longest message body Pushover accepts, in characters.
pub const MAX_MESSAGE_CHARS: usize = 1024;

/// HTTP request timeout for a single delivery attempt.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection settings for [`PushoverClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushoverConfig {
    /// Scheme and host of the API, without a trailing path.  Tests point this
    /// at a local mock server.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for PushoverConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Body of a Pushover API response.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    status: i64,
    #[serde(default)]
    request: Option<String>,
    #[serde(default)]
    errors: Vec<String>,
}

/// Sends notifications through the Pushover HTTPS API.
///
/// Holds one pooled `reqwest::Client`; share it behind an `Arc`.
pub struct PushoverClient {
    http: reqwest::Client,
    endpoint: String,
}

impl PushoverClient {
    /// Builds a client for `config`.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::Transport`] if the TLS backend cannot be
    /// initialised.
    pub fn new(config: PushoverConfig) -> Result<Self, DeliveryError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;
        let endpoint = format!("{}/1/messages.json", config.base_url.trim_end_matches('/'));
        Ok(Self { http, endpoint })
    }
}

/// Rejects requests Pushover is certain to refuse.
fn validate(body: &str, recipient_token: &str, app_token: &str) -> Result<(), DeliveryError> {
    if app_token.trim().is_empty() || recipient_token.trim().is_empty() {
        return Err(DeliveryError::MissingCredentials);
    }
    let len = body.chars().count();
    if len > MAX_MESSAGE_CHARS {
        return Err(DeliveryError::MessageTooLong {
            len,
            max: MAX_MESSAGE_CHARS,
        });
    }
    Ok(())
}

#[async_trait]
impl DeliveryClient for PushoverClient {
    async fn send(
        &self,
        body: &str,
        recipient_token: &str,
        app_token: &str,
    ) -> Result<(), DeliveryError> {
        validate(body, recipient_token, app_token)?;

        let form = [
            ("token", app_token),
            ("user", recipient_token),
            ("message", body),
        ];
        let response = self
            .http
            .post(&self.endpoint)
            .form(&form)
            .send()
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;

        match serde_json::from_str::<ApiResponse>(&text) {
            Ok(api) if status.is_success() && api.status == 1 => {
                debug!(request = api.request.as_deref().unwrap_or("-"), "pushover accepted message");
                Ok(())
            }
            Ok(api) => Err(DeliveryError::Rejected {
                status: status.as_u16(),
                reason: rejection_reason(&api),
            }),
            Err(_) if !status.is_success() => Err(DeliveryError::Rejected {
                status: status.as_u16(),
                reason: status
                    .canonical_reason()
                    .unwrap_or("unexpected response")
                    .to_string(),
            }),
            Err(e) => Err(DeliveryError::Transport(format!(
                "unreadable response from push service: {e}"
            ))),
        }
    }
}

fn rejection_reason(api: &ApiResponse) -> String {
    if api.errors.is_empty() {
        format!("status {}", api.status)
    } else {
        api.errors.join("; ")
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
