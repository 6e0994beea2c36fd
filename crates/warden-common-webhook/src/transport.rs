// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Bounded webhook delivery.
//!
//! Delivery never returns an error to the caller: every timeout, network
//! failure or non-2xx response is folded into a [`DispatchOutcome`] so the
//! alerting layer can audit it.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::error::{WebhookError, WebhookResult};
use crate::message::{WebhookMessage, WebhookProvider};
use crate::signature::{compute_hmac_sha256, SIGNATURE_HEADER};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
pub const MIN_TIMEOUT: Duration = Duration::from_secs(1);
pub const MAX_TIMEOUT: Duration = Duration::from_secs(30);
pub const MAX_RETRIES: u32 = 1;

const RETRY_BACKOFF_MS: u64 = 250;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
	Sent,
	Failed,
	Skipped,
}

impl DeliveryStatus {
	pub fn as_str(&self) -> &'static str {
		match self {
			DeliveryStatus::Sent => "sent",
			DeliveryStatus::Failed => "failed",
			DeliveryStatus::Skipped => "skipped",
		}
	}
}

/// Result of one `dispatch` call, including retries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchOutcome {
	pub ok: bool,
	pub status: DeliveryStatus,
	/// HTTP status of the last response, when one was received.
	pub status_code: Option<u16>,
	/// Machine-readable failure reason (`timeout`, `network_error`, `http_error`, ...).
	pub code: Option<String>,
	pub attempts: u32,
}

impl DispatchOutcome {
	pub fn sent(status_code: u16, attempts: u32) -> Self {
		Self {
			ok: true,
			status: DeliveryStatus::Sent,
			status_code: Some(status_code),
			code: None,
			attempts,
		}
	}

	pub fn failed(status_code: Option<u16>, code: impl Into<String>, attempts: u32) -> Self {
		Self {
			ok: false,
			status: DeliveryStatus::Failed,
			status_code,
			code: Some(code.into()),
			attempts,
		}
	}

	pub fn skipped(code: impl Into<String>) -> Self {
		Self {
			ok: false,
			status: DeliveryStatus::Skipped,
			status_code: None,
			code: Some(code.into()),
			attempts: 0,
		}
	}
}

/// "Send message, get status" contract used by alert escalation.
#[async_trait]
pub trait WebhookTransport: Send + Sync {
	async fn dispatch(
		&self,
		provider: WebhookProvider,
		url: &str,
		message: &WebhookMessage,
		timeout: Duration,
		retries: u32,
	) -> DispatchOutcome;
}

/// Clamps a requested timeout into `MIN_TIMEOUT..=MAX_TIMEOUT`.
pub fn clamp_timeout(timeout: Duration) -> Duration {
	timeout.clamp(MIN_TIMEOUT, MAX_TIMEOUT)
}

pub fn clamp_retries(retries: u32) -> u32 {
	retries.min(MAX_RETRIES)
}

/// Returns the Warden User-Agent string: `warden/{version}`.
pub fn user_agent() -> String {
	format!("warden/{}", env!("CARGO_PKG_VERSION"))
}

/// reqwest-backed transport.
///
/// The signing secret is never logged; neither is the webhook URL, only its
/// host.
pub struct HttpWebhookTransport {
	client: Client,
	signing_secret: Option<Vec<u8>>,
}

impl HttpWebhookTransport {
	pub fn new() -> WebhookResult<Self> {
		let client = Client::builder().user_agent(user_agent()).build()?;
		Ok(Self {
			client,
			signing_secret: None,
		})
	}

	pub fn with_signing_secret(mut self, secret: impl Into<Vec<u8>>) -> Self {
		self.signing_secret = Some(secret.into());
		self
	}
}

fn validate_url(url: &str) -> WebhookResult<url::Url> {
	let parsed = url::Url::parse(url).map_err(|e| WebhookError::InvalidUrl(e.to_string()))?;
	match parsed.scheme() {
		"http" | "https" => Ok(parsed),
		other => Err(WebhookError::InvalidUrl(format!(
			"unsupported scheme '{other}'"
		))),
	}
}

/// 4xx responses other than 408/429 will not succeed on retry.
fn is_permanent_status(status: StatusCode) -> bool {
	status.is_client_error()
		&& status != StatusCode::REQUEST_TIMEOUT
		&& status != StatusCode::TOO_MANY_REQUESTS
}

#[async_trait]
impl WebhookTransport for HttpWebhookTransport {
	#[instrument(skip_all, fields(provider = %provider))]
	async fn dispatch(
		&self,
		provider: WebhookProvider,
		url: &str,
		message: &WebhookMessage,
		timeout: Duration,
		retries: u32,
	) -> DispatchOutcome {
		let target = match validate_url(url) {
			Ok(parsed) => parsed,
			Err(e) => {
				warn!(error = %e, "webhook url rejected");
				return DispatchOutcome::failed(None, "invalid_url", 0);
			}
		};
		let host = target.host_str().unwrap_or_default().to_string();

		let body = match serde_json::to_vec(&message.render(provider)) {
			Ok(body) => body,
			Err(e) => {
				warn!(error = %e, "failed to serialize webhook payload");
				return DispatchOutcome::failed(None, "serialization_error", 0);
			}
		};
		let signature = self
			.signing_secret
			.as_deref()
			.map(|secret| format!("sha256={}", compute_hmac_sha256(secret, &body)));

		let timeout = clamp_timeout(timeout);
		let max_attempts = clamp_retries(retries) + 1;
		let mut outcome = DispatchOutcome::failed(None, "not_attempted", 0);

		for attempt in 1..=max_attempts {
			if attempt > 1 {
				let jitter_ms = fastrand::u64(0..=RETRY_BACKOFF_MS / 2);
				tokio::time::sleep(Duration::from_millis(RETRY_BACKOFF_MS + jitter_ms)).await;
			}

			let mut request = self
				.client
				.post(target.clone())
				.timeout(timeout)
				.header(CONTENT_TYPE, "application/json");
			if let Some(sig) = &signature {
				request = request.header(SIGNATURE_HEADER, sig);
			}

			match request.body(body.clone()).send().await {
				Ok(response) => {
					let status = response.status();
					if status.is_success() {
						debug!(host = %host, attempt, status = status.as_u16(), "webhook delivered");
						return DispatchOutcome::sent(status.as_u16(), attempt);
					}

					warn!(host = %host, attempt, status = status.as_u16(), "webhook rejected");
					outcome = DispatchOutcome::failed(Some(status.as_u16()), "http_error", attempt);
					if is_permanent_status(status) {
						break;
					}
				}
				Err(e) => {
					let code = if e.is_timeout() {
						"timeout"
					} else {
						"network_error"
					};
					warn!(host = %host, attempt, code, "webhook request failed");
					outcome = DispatchOutcome::failed(None, code, attempt);
				}
			}
		}

		outcome
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::signature::verify_hmac_sha256;
	use wiremock::matchers::{header_exists, method, path};
	use wiremock::{Mock, MockServer, ResponseTemplate};

	fn message() -> WebhookMessage {
		WebhookMessage::new("Critical security event", "owner transfer").event_id("evt-1")
	}

	#[test]
	fn test_clamp_timeout_bounds() {
		assert_eq!(clamp_timeout(Duration::from_millis(10)), MIN_TIMEOUT);
		assert_eq!(clamp_timeout(Duration::from_secs(120)), MAX_TIMEOUT);
		assert_eq!(clamp_timeout(DEFAULT_TIMEOUT), DEFAULT_TIMEOUT);
	}

	#[test]
	fn test_clamp_retries_allows_at_most_one() {
		assert_eq!(clamp_retries(0), 0);
		assert_eq!(clamp_retries(5), 1);
	}

	#[test]
	fn test_permanent_status_classification() {
		assert!(is_permanent_status(StatusCode::BAD_REQUEST));
		assert!(is_permanent_status(StatusCode::NOT_FOUND));
		assert!(!is_permanent_status(StatusCode::TOO_MANY_REQUESTS));
		assert!(!is_permanent_status(StatusCode::REQUEST_TIMEOUT));
		assert!(!is_permanent_status(StatusCode::BAD_GATEWAY));
	}

	#[test]
	fn test_validate_url_rejects_other_schemes() {
		assert!(validate_url("ftp://example.com/hook").is_err());
		assert!(validate_url("not a url").is_err());
		assert!(validate_url("https://hooks.slack.com/services/x").is_ok());
	}

	#[tokio::test]
	async fn test_dispatch_success() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.and(path("/hook"))
			.respond_with(ResponseTemplate::new(200))
			.expect(1)
			.mount(&server)
			.await;

		let transport = HttpWebhookTransport::new().unwrap();
		let outcome = transport
			.dispatch(
				WebhookProvider::Slack,
				&format!("{}/hook", server.uri()),
				&message(),
				DEFAULT_TIMEOUT,
				1,
			)
			.await;

		assert!(outcome.ok);
		assert_eq!(outcome.status, DeliveryStatus::Sent);
		assert_eq!(outcome.status_code, Some(200));
		assert_eq!(outcome.attempts, 1);
	}

	#[tokio::test]
	async fn test_dispatch_retries_once_after_server_error() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.respond_with(ResponseTemplate::new(503))
			.up_to_n_times(1)
			.mount(&server)
			.await;
		Mock::given(method("POST"))
			.respond_with(ResponseTemplate::new(204))
			.mount(&server)
			.await;

		let transport = HttpWebhookTransport::new().unwrap();
		let outcome = transport
			.dispatch(
				WebhookProvider::Generic,
				&server.uri(),
				&message(),
				DEFAULT_TIMEOUT,
				1,
			)
			.await;

		assert!(outcome.ok);
		assert_eq!(outcome.status_code, Some(204));
		assert_eq!(outcome.attempts, 2);
	}

	#[tokio::test]
	async fn test_dispatch_never_exceeds_two_attempts() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.respond_with(ResponseTemplate::new(500))
			.expect(2)
			.mount(&server)
			.await;

		let transport = HttpWebhookTransport::new().unwrap();
		let outcome = transport
			.dispatch(
				WebhookProvider::Discord,
				&server.uri(),
				&message(),
				DEFAULT_TIMEOUT,
				7,
			)
			.await;

		assert!(!outcome.ok);
		assert_eq!(outcome.status, DeliveryStatus::Failed);
		assert_eq!(outcome.status_code, Some(500));
		assert_eq!(outcome.code.as_deref(), Some("http_error"));
		assert_eq!(outcome.attempts, 2);
	}

	#[tokio::test]
	async fn test_dispatch_does_not_retry_permanent_rejection() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.respond_with(ResponseTemplate::new(404))
			.expect(1)
			.mount(&server)
			.await;

		let transport = HttpWebhookTransport::new().unwrap();
		let outcome = transport
			.dispatch(
				WebhookProvider::Slack,
				&server.uri(),
				&message(),
				DEFAULT_TIMEOUT,
				1,
			)
			.await;

		assert_eq!(outcome.status_code, Some(404));
		assert_eq!(outcome.attempts, 1);
	}

	#[tokio::test]
	async fn test_dispatch_timeout_is_reported() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
			.mount(&server)
			.await;

		let transport = HttpWebhookTransport::new().unwrap();
		let outcome = transport
			.dispatch(
				WebhookProvider::Slack,
				&server.uri(),
				&message(),
				Duration::from_millis(1),
				0,
			)
			.await;

		assert!(!outcome.ok);
		assert_eq!(outcome.code.as_deref(), Some("timeout"));
		assert_eq!(outcome.status_code, None);
	}

	#[tokio::test]
	async fn test_dispatch_invalid_url_makes_no_attempt() {
		let transport = HttpWebhookTransport::new().unwrap();
		let outcome = transport
			.dispatch(
				WebhookProvider::Slack,
				"mailto:ops@example.com",
				&message(),
				DEFAULT_TIMEOUT,
				1,
			)
			.await;

		assert_eq!(outcome.code.as_deref(), Some("invalid_url"));
		assert_eq!(outcome.attempts, 0);
	}

	#[tokio::test]
	async fn test_signed_requests_carry_verifiable_signature() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.and(header_exists(SIGNATURE_HEADER))
			.respond_with(ResponseTemplate::new(200))
			.expect(1)
			.mount(&server)
			.await;

		let transport = HttpWebhookTransport::new()
			.unwrap()
			.with_signing_secret("s3cret");
		let outcome = transport
			.dispatch(
				WebhookProvider::Generic,
				&server.uri(),
				&message(),
				DEFAULT_TIMEOUT,
				0,
			)
			.await;
		assert!(outcome.ok);

		let requests = server.received_requests().await.unwrap();
		let request = &requests[0];
		let signature = request
			.headers
			.get(SIGNATURE_HEADER)
			.unwrap()
			.to_str()
			.unwrap();
		assert!(verify_hmac_sha256(b"s3cret", &request.body, signature));
	}
}
