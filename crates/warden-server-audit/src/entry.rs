// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Audit log entry model.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::allowlist::sanitize_meta;
use crate::context::RequestContext;

/// Meta keys consulted, in order, when deriving `resourceId`.
pub const RESOURCE_ID_KEYS: &[&str] = &["resourceId", "id", "slug", "projectId", "userId"];

/// Outcome recorded for an action, inferred from its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AuditStatus {
	#[default]
	Success,
	Failed,
	Denied,
}

impl AuditStatus {
	pub fn as_str(&self) -> &'static str {
		match self {
			AuditStatus::Success => "success",
			AuditStatus::Failed => "failed",
			AuditStatus::Denied => "denied",
		}
	}

	/// `denied` wins over `failed`/`rate_limited`; anything else is a success.
	pub fn infer(action: &str) -> Self {
		if action.contains("denied") {
			AuditStatus::Denied
		} else if action.contains("failed") || action.contains("rate_limited") {
			AuditStatus::Failed
		} else {
			AuditStatus::Success
		}
	}
}

impl fmt::Display for AuditStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for AuditStatus {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"success" => Ok(AuditStatus::Success),
			"failed" => Ok(AuditStatus::Failed),
			"denied" => Ok(AuditStatus::Denied),
			other => Err(format!("unknown audit status '{other}'")),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogEntry {
	pub id: String,
	/// RFC 3339 timestamp as stored. Entries whose `ts` does not parse are
	/// dropped on the next compaction.
	pub ts: String,
	pub actor_id: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub actor_name: Option<String>,
	pub ip: String,
	pub action: String,
	pub resource: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub resource_id: Option<String>,
	pub status: AuditStatus,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub request_id: Option<String>,
	#[serde(default)]
	pub meta: Map<String, Value>,
}

impl AuditLogEntry {
	/// Builds a sanitized entry for `action` on `resource` at `now`.
	pub fn new(
		ctx: &RequestContext,
		action: &str,
		resource: &str,
		meta: &Map<String, Value>,
		now: DateTime<Utc>,
	) -> Self {
		Self {
			id: Uuid::new_v4().to_string(),
			ts: format_ts(now),
			actor_id: ctx.actor_id_or_anonymous().to_string(),
			actor_name: ctx.actor_name.clone(),
			ip: ctx.ip_or_unknown().to_string(),
			action: action.to_string(),
			resource: resource.to_string(),
			resource_id: derive_resource_id(meta),
			status: AuditStatus::infer(action),
			request_id: ctx.request_id.clone(),
			meta: sanitize_meta(action, meta),
		}
	}

	pub fn parsed_ts(&self) -> Option<DateTime<Utc>> {
		parse_ts(&self.ts)
	}
}

pub fn format_ts(ts: DateTime<Utc>) -> String {
	ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn parse_ts(raw: &str) -> Option<DateTime<Utc>> {
	DateTime::parse_from_rfc3339(raw)
		.ok()
		.map(|ts| ts.with_timezone(&Utc))
}

/// First present, non-empty value among [`RESOURCE_ID_KEYS`].
pub fn derive_resource_id(meta: &Map<String, Value>) -> Option<String> {
	RESOURCE_ID_KEYS.iter().find_map(|key| match meta.get(*key)? {
		Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
		Value::Number(n) => Some(n.to_string()),
		_ => None,
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	fn map(value: Value) -> Map<String, Value> {
		value.as_object().cloned().unwrap()
	}

	#[test]
	fn test_status_inference() {
		assert_eq!(AuditStatus::infer("auth.login.failed"), AuditStatus::Failed);
		assert_eq!(
			AuditStatus::infer("auth.login.rate_limited"),
			AuditStatus::Failed
		);
		assert_eq!(AuditStatus::infer("media.access.denied"), AuditStatus::Denied);
		assert_eq!(AuditStatus::infer("denied.failed"), AuditStatus::Denied);
		assert_eq!(AuditStatus::infer("users.update"), AuditStatus::Success);
	}

	#[test]
	fn test_resource_id_order_and_types() {
		assert_eq!(
			derive_resource_id(&map(json!({"userId": "u1", "slug": "home"}))),
			Some("home".to_string())
		);
		assert_eq!(
			derive_resource_id(&map(json!({"id": 42}))),
			Some("42".to_string())
		);
		assert_eq!(
			derive_resource_id(&map(json!({"resourceId": "", "projectId": "p9"}))),
			Some("p9".to_string())
		);
		assert_eq!(derive_resource_id(&map(json!({"id": true}))), None);
	}

	#[test]
	fn test_new_entry_applies_context_defaults() {
		let now = Utc::now();
		let entry = AuditLogEntry::new(
			&RequestContext::new().request_id("req-1"),
			"auth.login.failed",
			"auth",
			&map(json!({"email": "a@example.com", "password": "hunter2"})),
			now,
		);
		assert_eq!(entry.actor_id, "anonymous");
		assert_eq!(entry.ip, "unknown");
		assert_eq!(entry.status, AuditStatus::Failed);
		assert_eq!(entry.request_id.as_deref(), Some("req-1"));
		assert_eq!(entry.parsed_ts().unwrap().timestamp_millis(), now.timestamp_millis());
		assert!(!entry.meta.contains_key("password"));
	}

	#[test]
	fn test_serializes_camel_case() {
		let entry = AuditLogEntry::new(
			&RequestContext::new().actor("u1"),
			"users.update",
			"users",
			&map(json!({"userId": "u2"})),
			Utc::now(),
		);
		let json = serde_json::to_value(&entry).unwrap();
		assert_eq!(json["actorId"], "u1");
		assert_eq!(json["resourceId"], "u2");
		assert_eq!(json["status"], "success");
		assert!(json.get("requestId").is_none());
	}
}
