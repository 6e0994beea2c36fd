// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Per-action allowlist of `meta` fields.
//!
//! Only fields named here survive into a stored entry; everything else in the
//! caller's meta map is dropped before redaction runs. Actions absent from
//! [`ACTION_FIELDS`] fall back to [`DEFAULT_FIELDS`].

use serde_json::{Map, Value};
use warden_redact::{redact_map, RedactionLimits};

const ALERT_FIELDS: &[&str] = &["eventId", "type", "provider", "statusCode", "code", "attempts"];
const USER_FIELDS: &[&str] = &["userId", "email", "fields", "changes", "role", "status"];
const LISTING_FIELDS: &[&str] = &["page", "limit", "total", "filters"];

/// Action name to the ordered list of meta fields it may record.
pub static ACTION_FIELDS: &[(&str, &[&str])] = &[
	("auth.login.failed", &["email", "reason", "method", "attempts"]),
	("auth.login.rate_limited", &["email", "retryAfter"]),
	("auth.login.success", &["userId", "method", "network"]),
	("auth.logout", &["userId"]),
	("auth.mfa.failed", &["userId", "method", "reason"]),
	("auth.mfa.success", &["userId", "method"]),
	("users.create", USER_FIELDS),
	("users.update", USER_FIELDS),
	("users.delete", USER_FIELDS),
	("project.owner.transfer", &["projectId", "fromUserId", "toUserId"]),
	(
		"security.event.create",
		&["eventId", "type", "severity", "riskScore"],
	),
	(
		"security.event.update",
		&["eventId", "status", "previousStatus"],
	),
	("security.alert.sent", ALERT_FIELDS),
	("security.alert.failed", ALERT_FIELDS),
	("security.alert.skipped", ALERT_FIELDS),
	(
		"security.alert.test",
		&["provider", "statusCode", "code", "attempts", "ok"],
	),
	("audit.export", &["format", "rows", "truncated", "filters"]),
	("audit.read", LISTING_FIELDS),
	("security.events.read", LISTING_FIELDS),
];

/// Fields kept for actions without a dedicated entry.
pub const DEFAULT_FIELDS: &[&str] = &[
	"id",
	"resourceId",
	"slug",
	"projectId",
	"userId",
	"name",
	"title",
	"status",
	"reason",
	"count",
	"fields",
	"changes",
];

pub fn fields_for(action: &str) -> &'static [&'static str] {
	ACTION_FIELDS
		.iter()
		.find(|(name, _)| *name == action)
		.map(|(_, fields)| *fields)
		.unwrap_or(DEFAULT_FIELDS)
}

/// Selects the allowlisted fields for `action` in table order, then redacts
/// them with audit limits.
pub fn sanitize_meta(action: &str, meta: &Map<String, Value>) -> Map<String, Value> {
	let selected: Map<String, Value> = fields_for(action)
		.iter()
		.filter_map(|field| meta.get(*field).map(|v| (field.to_string(), v.clone())))
		.collect();
	redact_map(&selected, &RedactionLimits::AUDIT)
}
