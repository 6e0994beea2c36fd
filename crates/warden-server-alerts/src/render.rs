// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use warden_common_webhook::{MessageLevel, WebhookMessage};
use warden_server_security_events::{SecurityEvent, Severity};

pub fn dashboard_link(dashboard_url: &str, event_id: &str) -> String {
	format!(
		"{}/security/events/{event_id}",
		dashboard_url.trim_end_matches('/')
	)
}

fn level_for(severity: Severity) -> MessageLevel {
	match severity {
		Severity::Info => MessageLevel::Info,
		Severity::Warning => MessageLevel::Warning,
		Severity::Critical => MessageLevel::Critical,
	}
}

/// Provider-agnostic notification for `event`.
pub fn render_event(event: &SecurityEvent, dashboard_url: &str) -> WebhookMessage {
	let title = format!(
		"[{}] Security event: {}",
		event.severity.as_str().to_uppercase(),
		event.event_type
	);

	let description = [
		format!("Status: {}", event.status),
		format!("Risk score: {}", event.risk_score),
		format!("Actor: {}", event.actor_user_id.as_deref().unwrap_or("-")),
		format!("Target: {}", event.target_user_id.as_deref().unwrap_or("-")),
		format!("IP: {}", event.ip),
	]
	.join("\n");

	WebhookMessage::new(title, description)
		.level(level_for(event.severity))
		.link(dashboard_link(dashboard_url, &event.id))
		.event_id(event.id.clone())
}

pub fn test_message(dashboard_url: &str) -> WebhookMessage {
	WebhookMessage::new(
		"Warden test alert",
		"Alert delivery is configured correctly. No action is required.",
	)
	.level(MessageLevel::Info)
	.link(dashboard_url.trim_end_matches('/').to_string())
}
