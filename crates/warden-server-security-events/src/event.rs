// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Security event model.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;
use warden_redact::{redact_map, RedactionLimits};
use warden_server_audit::RequestContext;

use crate::error::SecurityEventError;

pub const MAX_USER_AGENT_CHARS: usize = 512;
pub const MAX_RISK_SCORE: u8 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
	#[default]
	Info,
	Warning,
	Critical,
}

impl Severity {
	pub fn as_str(&self) -> &'static str {
		match self {
			Severity::Info => "info",
			Severity::Warning => "warning",
			Severity::Critical => "critical",
		}
	}
}

impl fmt::Display for Severity {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for Severity {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"info" => Ok(Severity::Info),
			"warning" => Ok(Severity::Warning),
			"critical" => Ok(Severity::Critical),
			other => Err(format!("unknown severity '{other}'")),
		}
	}
}

/// Operator triage state. Any state may follow any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
	#[default]
	Open,
	Ack,
	Resolved,
	Ignored,
}

impl EventStatus {
	pub fn as_str(&self) -> &'static str {
		match self {
			EventStatus::Open => "open",
			EventStatus::Ack => "ack",
			EventStatus::Resolved => "resolved",
			EventStatus::Ignored => "ignored",
		}
	}
}

impl fmt::Display for EventStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for EventStatus {
	type Err = SecurityEventError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"open" => Ok(EventStatus::Open),
			"ack" => Ok(EventStatus::Ack),
			"resolved" => Ok(EventStatus::Resolved),
			"ignored" => Ok(EventStatus::Ignored),
			other => Err(SecurityEventError::InvalidStatus(other.to_string())),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityEvent {
	pub id: String,
	pub ts: DateTime<Utc>,
	/// Rule key, e.g. `auth_failed_burst_ip_warning`.
	#[serde(rename = "type")]
	pub event_type: String,
	pub severity: Severity,
	pub risk_score: u8,
	pub status: EventStatus,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub actor_user_id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub target_user_id: Option<String>,
	pub ip: String,
	#[serde(default)]
	pub user_agent: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub session_id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub request_id: Option<String>,
	#[serde(default)]
	pub data: Map<String, Value>,
}

impl SecurityEvent {
	pub fn builder(event_type: impl Into<String>, severity: Severity) -> SecurityEventBuilder {
		SecurityEventBuilder::new(event_type, severity)
	}

	pub fn is_critical(&self) -> bool {
		self.severity == Severity::Critical
	}

	/// Applies storage limits: redacted `data`, bounded `userAgent` and a
	/// risk score of at most 100.
	pub fn sanitized(mut self) -> Self {
		self.data = redact_map(&self.data, &RedactionLimits::EVENT);
		if self.user_agent.chars().count() > MAX_USER_AGENT_CHARS {
			self.user_agent = self.user_agent.chars().take(MAX_USER_AGENT_CHARS).collect();
		}
		self.risk_score = self.risk_score.min(MAX_RISK_SCORE);
		self
	}
}

#[derive(Debug, Clone)]
pub struct SecurityEventBuilder {
	event_type: String,
	severity: Severity,
	risk_score: i64,
	ts: Option<DateTime<Utc>>,
	actor_user_id: Option<String>,
	target_user_id: Option<String>,
	ip: Option<String>,
	user_agent: Option<String>,
	session_id: Option<String>,
	request_id: Option<String>,
	data: Map<String, Value>,
}

impl SecurityEventBuilder {
	pub fn new(event_type: impl Into<String>, severity: Severity) -> Self {
		Self {
			event_type: event_type.into(),
			severity,
			risk_score: 0,
			ts: None,
			actor_user_id: None,
			target_user_id: None,
			ip: None,
			user_agent: None,
			session_id: None,
			request_id: None,
			data: Map::new(),
		}
	}

	/// Clamped to `0..=100`.
	pub fn risk_score(mut self, score: i64) -> Self {
		self.risk_score = score;
		self
	}

	pub fn ts(mut self, ts: DateTime<Utc>) -> Self {
		self.ts = Some(ts);
		self
	}

	pub fn actor_user(mut self, user_id: impl Into<String>) -> Self {
		self.actor_user_id = Some(user_id.into());
		self
	}

	pub fn target_user(mut self, user_id: impl Into<String>) -> Self {
		self.target_user_id = Some(user_id.into());
		self
	}

	pub fn ip(mut self, ip: impl Into<String>) -> Self {
		self.ip = Some(ip.into());
		self
	}

	pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
		self.user_agent = Some(ua.into());
		self
	}

	pub fn session_id(mut self, session_id: impl Into<String>) -> Self {
		self.session_id = Some(session_id.into());
		self
	}

	pub fn request_id(mut self, request_id: impl Into<String>) -> Self {
		self.request_id = Some(request_id.into());
		self
	}

	/// Fills ip, user agent, session and request ids from the request, and
	/// the acting user when none was set.
	pub fn context(mut self, ctx: &RequestContext) -> Self {
		self.ip = Some(ctx.ip_or_unknown().to_string());
		self.user_agent = ctx.user_agent.clone().or(self.user_agent);
		self.session_id = ctx.session_id.clone().or(self.session_id);
		self.request_id = ctx.request_id.clone().or(self.request_id);
		if self.actor_user_id.is_none() {
			self.actor_user_id = ctx.actor_id.clone();
		}
		self
	}

	pub fn data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		self.data.insert(key.into(), value.into());
		self
	}

	pub fn data_map(mut self, data: Map<String, Value>) -> Self {
		self.data.extend(data);
		self
	}

	pub fn build(self) -> SecurityEvent {
		SecurityEvent {
			id: Uuid::new_v4().to_string(),
			ts: self.ts.unwrap_or_else(Utc::now),
			event_type: self.event_type,
			severity: self.severity,
			risk_score: self.risk_score.clamp(0, MAX_RISK_SCORE as i64) as u8,
			status: EventStatus::Open,
			actor_user_id: self.actor_user_id,
			target_user_id: self.target_user_id,
			ip: self.ip.unwrap_or_else(|| warden_server_audit::UNKNOWN_IP.to_string()),
			user_agent: self.user_agent.unwrap_or_default(),
			session_id: self.session_id,
			request_id: self.request_id,
			data: self.data,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn test_builder_defaults() {
		let event = SecurityEvent::builder("owner_transfer_critical", Severity::Critical)
			.risk_score(95)
			.build();
		assert_eq!(event.status, EventStatus::Open);
		assert_eq!(event.ip, "unknown");
		assert_eq!(event.risk_score, 95);
		assert!(event.is_critical());
	}

	#[test]
	fn test_risk_score_clamped() {
		let high = SecurityEvent::builder("x", Severity::Info)
			.risk_score(250)
			.build();
		let low = SecurityEvent::builder("x", Severity::Info)
			.risk_score(-4)
			.build();
		assert_eq!(high.risk_score, 100);
		assert_eq!(low.risk_score, 0);
	}

	#[test]
	fn test_context_fills_request_fields() {
		let ctx = RequestContext::new()
			.actor("u1")
			.ip("10.0.0.5")
			.user_agent("curl/8")
			.request_id("req-9");
		let event = SecurityEvent::builder("new_network_login_warning", Severity::Warning)
			.context(&ctx)
			.build();
		assert_eq!(event.actor_user_id.as_deref(), Some("u1"));
		assert_eq!(event.ip, "10.0.0.5");
		assert_eq!(event.user_agent, "curl/8");
		assert_eq!(event.request_id.as_deref(), Some("req-9"));
	}

	#[test]
	fn test_sanitized_applies_limits() {
		let mut event = SecurityEvent::builder("x", Severity::Warning)
			.user_agent("a".repeat(600))
			.data("accessToken", "abc")
			.data("note", "n".repeat(1200))
			.build();
		event.risk_score = 200;

		let event = event.sanitized();
		assert_eq!(event.user_agent.chars().count(), 512);
		assert_eq!(event.risk_score, 100);
		assert_eq!(event.data["accessToken"], "[REDACTED]");
		assert_eq!(event.data["note"].as_str().unwrap().chars().count(), 1001);
	}

	#[test]
	fn test_serializes_type_field() {
		let event = SecurityEvent::builder("mfa_failed_burst_user", Severity::Warning).build();
		let json = serde_json::to_value(&event).unwrap();
		assert_eq!(json["type"], "mfa_failed_burst_user");
		assert_eq!(json["severity"], "warning");
		assert_eq!(json["status"], "open");
		assert_eq!(json["riskScore"], json!(0));
	}

	#[test]
	fn test_status_parse() {
		assert_eq!("ACK".parse::<EventStatus>().unwrap(), EventStatus::Ack);
		assert!("closed".parse::<EventStatus>().is_err());
	}
}
