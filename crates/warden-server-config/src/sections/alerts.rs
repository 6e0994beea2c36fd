// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Critical alert escalation configuration section.
//!
//! The signing secret is deliberately excluded from `Debug` output.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use warden_common_webhook::{clamp_retries, clamp_timeout, WebhookProvider};

const DEFAULT_TIMEOUT_MS: u64 = 5000;
const DEFAULT_RETRIES: u32 = 1;

fn default_dashboard_url() -> String {
	"http://localhost:3000/admin".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AlertsConfigLayer {
	pub enabled: Option<bool>,
	pub provider: Option<WebhookProvider>,
	pub webhook_url: Option<String>,
	pub timeout_ms: Option<u64>,
	pub retries: Option<u32>,
	pub dashboard_url: Option<String>,
	pub signing_secret: Option<String>,
}

impl AlertsConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.enabled.is_some() {
			self.enabled = other.enabled;
		}
		if other.provider.is_some() {
			self.provider = other.provider;
		}
		if other.webhook_url.is_some() {
			self.webhook_url = other.webhook_url;
		}
		if other.timeout_ms.is_some() {
			self.timeout_ms = other.timeout_ms;
		}
		if other.retries.is_some() {
			self.retries = other.retries;
		}
		if other.dashboard_url.is_some() {
			self.dashboard_url = other.dashboard_url;
		}
		if other.signing_secret.is_some() {
			self.signing_secret = other.signing_secret;
		}
	}

	/// Resolves the layer, clamping timeout to 1–30 s and retries to at most 1.
	pub fn finalize(self) -> AlertsConfig {
		let timeout = clamp_timeout(Duration::from_millis(
			self.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS),
		));

		AlertsConfig {
			enabled: self.enabled.unwrap_or(true),
			provider: self.provider.unwrap_or_default(),
			webhook_url: self.webhook_url.filter(|u| !u.trim().is_empty()),
			timeout_ms: timeout.as_millis() as u64,
			retries: clamp_retries(self.retries.unwrap_or(DEFAULT_RETRIES)),
			dashboard_url: self
				.dashboard_url
				.unwrap_or_else(default_dashboard_url)
				.trim_end_matches('/')
				.to_string(),
			signing_secret: self.signing_secret.filter(|s| !s.is_empty()),
		}
	}
}

#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct AlertsConfig {
	pub enabled: bool,
	pub provider: WebhookProvider,
	pub webhook_url: Option<String>,
	pub timeout_ms: u64,
	pub retries: u32,
	/// Base URL of the admin dashboard, without trailing slash.
	pub dashboard_url: String,
	#[serde(skip_serializing)]
	pub signing_secret: Option<String>,
}

impl AlertsConfig {
	pub fn timeout(&self) -> Duration {
		Duration::from_millis(self.timeout_ms)
	}

	/// True when critical events should reach the webhook transport.
	pub fn is_configured(&self) -> bool {
		self.enabled && self.webhook_url.is_some()
	}

	pub fn validate(&self) -> Result<(), String> {
		if let Some(url) = &self.webhook_url {
			if !url.starts_with("http://") && !url.starts_with("https://") {
				return Err("alerts.webhook_url must start with http:// or https://".to_string());
			}
		}
		Ok(())
	}
}

impl Default for AlertsConfig {
	fn default() -> Self {
		AlertsConfigLayer::default().finalize()
	}
}

impl fmt::Debug for AlertsConfig {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("AlertsConfig")
			.field("enabled", &self.enabled)
			.field("provider", &self.provider)
			.field("webhook_configured", &self.webhook_url.is_some())
			.field("timeout_ms", &self.timeout_ms)
			.field("retries", &self.retries)
			.field("dashboard_url", &self.dashboard_url)
			.field("signing_secret", &self.signing_secret.as_ref().map(|_| "[REDACTED]"))
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_defaults() {
		let config = AlertsConfig::default();
		assert!(config.enabled);
		assert_eq!(config.provider, WebhookProvider::Slack);
		assert_eq!(config.timeout_ms, 5000);
		assert_eq!(config.retries, 1);
		assert!(!config.is_configured());
	}

	#[test]
	fn test_timeout_and_retries_are_clamped() {
		let config = AlertsConfigLayer {
			timeout_ms: Some(120_000),
			retries: Some(4),
			..Default::default()
		}
		.finalize();
		assert_eq!(config.timeout_ms, 30_000);
		assert_eq!(config.retries, 1);

		let config = AlertsConfigLayer {
			timeout_ms: Some(10),
			..Default::default()
		}
		.finalize();
		assert_eq!(config.timeout_ms, 1000);
	}

	#[test]
	fn test_blank_webhook_url_is_unset() {
		let config = AlertsConfigLayer {
			webhook_url: Some("  ".to_string()),
			..Default::default()
		}
		.finalize();
		assert!(config.webhook_url.is_none());
	}

	#[test]
	fn test_debug_hides_secret_and_url() {
		let config = AlertsConfigLayer {
			webhook_url: Some("https://hooks.slack.com/services/T/B/X".to_string()),
			signing_secret: Some("topsecret".to_string()),
			..Default::default()
		}
		.finalize();
		let rendered = format!("{config:?}");
		assert!(!rendered.contains("topsecret"));
		assert!(!rendered.contains("hooks.slack.com"));
	}

	#[test]
	fn test_validate_rejects_non_http_url() {
		let config = AlertsConfigLayer {
			webhook_url: Some("ftp://example.com".to_string()),
			..Default::default()
		}
		.finalize();
		assert!(config.validate().is_err());
	}

	#[test]
	fn test_dashboard_trailing_slash_trimmed() {
		let config = AlertsConfigLayer {
			dashboard_url: Some("https://cms.example.com/admin/".to_string()),
			..Default::default()
		}
		.finalize();
		assert_eq!(config.dashboard_url, "https://cms.example.com/admin");
	}
}
