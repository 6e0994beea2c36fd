// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use serde_json::json;
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};
use warden_common_webhook::{DeliveryStatus, DispatchOutcome, WebhookMessage, WebhookTransport};
use warden_server_audit::{AuditLog, RequestContext};
use warden_server_config::AlertsConfig;
use warden_server_security_events::SecurityEvent;

use crate::render::{render_event, test_message};

pub const ALERT_RESOURCE: &str = "security_alert";
pub const TEST_ALERT_ACTION: &str = "security.alert.test";

/// Sends critical security events to the configured webhook.
#[derive(Clone)]
pub struct AlertEscalator {
	config: AlertsConfig,
	transport: Arc<dyn WebhookTransport>,
	audit: Arc<AuditLog>,
}

impl AlertEscalator {
	pub fn new(
		config: AlertsConfig,
		transport: Arc<dyn WebhookTransport>,
		audit: Arc<AuditLog>,
	) -> Self {
		Self {
			config,
			transport,
			audit,
		}
	}

	pub fn config(&self) -> &AlertsConfig {
		&self.config
	}

	/// Spawns delivery for a critical event. Returns `None` without doing
	/// anything for other severities.
	pub fn escalate(
		&self,
		event: &SecurityEvent,
		ctx: Option<&RequestContext>,
	) -> Option<JoinHandle<DispatchOutcome>> {
		self.escalate_with(event, ctx, |_| {})
	}

	/// Like [`Self::escalate`], calling `on_outcome` once delivery finishes.
	pub fn escalate_with<F>(
		&self,
		event: &SecurityEvent,
		ctx: Option<&RequestContext>,
		on_outcome: F,
	) -> Option<JoinHandle<DispatchOutcome>>
	where
		F: FnOnce(&DispatchOutcome) + Send + 'static,
	{
		if !event.is_critical() {
			return None;
		}

		let escalator = self.clone();
		let event = event.clone();
		let ctx = ctx.cloned().unwrap_or_else(RequestContext::system);
		Some(tokio::spawn(async move {
			let outcome = escalator.deliver(&event, &ctx).await;
			on_outcome(&outcome);
			outcome
		}))
	}

	/// Dispatches `event` and audits the result as `security.alert.<status>`.
	#[instrument(skip_all, fields(event_id = %event.id, event_type = %event.event_type))]
	pub async fn deliver(&self, event: &SecurityEvent, ctx: &RequestContext) -> DispatchOutcome {
		let message = render_event(event, &self.config.dashboard_url);
		let outcome = self.dispatch(&message).await;

		match outcome.status {
			DeliveryStatus::Sent => info!(attempts = outcome.attempts, "security alert sent"),
			DeliveryStatus::Failed => warn!(
				code = outcome.code.as_deref().unwrap_or(""),
				status_code = outcome.status_code,
				attempts = outcome.attempts,
				"security alert delivery failed"
			),
			DeliveryStatus::Skipped => info!(
				code = outcome.code.as_deref().unwrap_or(""),
				"security alert skipped"
			),
		}

		let action = format!("security.alert.{}", outcome.status.as_str());
		self.audit
			.append(
				ctx,
				&action,
				ALERT_RESOURCE,
				json!({
					"eventId": event.id,
					"type": event.event_type,
					"provider": self.config.provider.to_string(),
					"statusCode": outcome.status_code,
					"code": outcome.code,
					"attempts": outcome.attempts,
				}),
			)
			.await;

		outcome
	}

	/// Sends a synthetic notification and audits it as `security.alert.test`.
	#[instrument(skip_all)]
	pub async fn send_test(&self, ctx: &RequestContext) -> DispatchOutcome {
		let outcome = self
			.dispatch(&test_message(&self.config.dashboard_url))
			.await;

		self.audit
			.append(
				ctx,
				TEST_ALERT_ACTION,
				ALERT_RESOURCE,
				json!({
					"provider": self.config.provider.to_string(),
					"statusCode": outcome.status_code,
					"code": outcome.code,
					"attempts": outcome.attempts,
					"ok": outcome.ok,
				}),
			)
			.await;

		outcome
	}

	async fn dispatch(&self, message: &WebhookMessage) -> DispatchOutcome {
		if !self.config.enabled {
			return DispatchOutcome::skipped("disabled");
		}
		let Some(url) = self.config.webhook_url.as_deref() else {
			return DispatchOutcome::skipped("not_configured");
		};

		self.transport
			.dispatch(
				self.config.provider,
				url,
				message,
				self.config.timeout(),
				self.config.retries,
			)
			.await
	}
}
