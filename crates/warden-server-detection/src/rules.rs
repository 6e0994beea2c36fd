// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Detection rule catalogue and the findings rules produce.

use std::fmt;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use warden_server_audit::RequestContext;
use warden_server_security_events::{SecurityEvent, Severity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
	AuthFailedBurstIpWarning,
	AuthFailedBurstIpCritical,
	MfaFailedBurstUser,
	NewNetworkLoginWarning,
	ExcessiveSessionsWarning,
	AdminActionFromNewNetworkWarning,
	PrivilegeEscalationWarning,
	OwnerTransferCritical,
}

impl Rule {
	pub const ALL: [Rule; 8] = [
		Rule::AuthFailedBurstIpWarning,
		Rule::AuthFailedBurstIpCritical,
		Rule::MfaFailedBurstUser,
		Rule::NewNetworkLoginWarning,
		Rule::ExcessiveSessionsWarning,
		Rule::AdminActionFromNewNetworkWarning,
		Rule::PrivilegeEscalationWarning,
		Rule::OwnerTransferCritical,
	];

	/// Event `type` and cooldown rule key.
	pub fn key(&self) -> &'static str {
		match self {
			Rule::AuthFailedBurstIpWarning => "auth_failed_burst_ip_warning",
			Rule::AuthFailedBurstIpCritical => "auth_failed_burst_ip_critical",
			Rule::MfaFailedBurstUser => "mfa_failed_burst_user",
			Rule::NewNetworkLoginWarning => "new_network_login_warning",
			Rule::ExcessiveSessionsWarning => "excessive_sessions_warning",
			Rule::AdminActionFromNewNetworkWarning => "admin_action_from_new_network_warning",
			Rule::PrivilegeEscalationWarning => "privilege_escalation_warning",
			Rule::OwnerTransferCritical => "owner_transfer_critical",
		}
	}

	pub fn severity(&self) -> Severity {
		match self {
			Rule::AuthFailedBurstIpCritical | Rule::OwnerTransferCritical => Severity::Critical,
			_ => Severity::Warning,
		}
	}

	pub fn risk_score(&self) -> i64 {
		match self {
			Rule::AuthFailedBurstIpWarning => 60,
			Rule::AuthFailedBurstIpCritical => 90,
			Rule::MfaFailedBurstUser => 55,
			Rule::NewNetworkLoginWarning => 45,
			Rule::ExcessiveSessionsWarning => 35,
			Rule::AdminActionFromNewNetworkWarning => 50,
			Rule::PrivilegeEscalationWarning => 65,
			Rule::OwnerTransferCritical => 95,
		}
	}
}

impl fmt::Display for Rule {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.key())
	}
}

/// A rule that fired, before it is stored as a security event.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
	pub rule: Rule,
	pub actor_user_id: Option<String>,
	pub target_user_id: Option<String>,
	pub data: Map<String, Value>,
}

impl Detection {
	pub fn new(rule: Rule) -> Self {
		Self {
			rule,
			actor_user_id: None,
			target_user_id: None,
			data: Map::new(),
		}
	}

	pub fn actor(mut self, user_id: impl Into<String>) -> Self {
		self.actor_user_id = Some(user_id.into());
		self
	}

	pub fn target(mut self, user_id: impl Into<String>) -> Self {
		self.target_user_id = Some(user_id.into());
		self
	}

	pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
		self.data.insert(key.to_string(), value.into());
		self
	}

	pub fn into_event(self, ctx: &RequestContext, now: DateTime<Utc>) -> SecurityEvent {
		let mut builder = SecurityEvent::builder(self.rule.key(), self.rule.severity())
			.risk_score(self.rule.risk_score())
			.ts(now)
			.data_map(self.data);
		if let Some(actor) = self.actor_user_id {
			builder = builder.actor_user(actor);
		}
		if let Some(target) = self.target_user_id {
			builder = builder.target_user(target);
		}
		builder.context(ctx).build()
	}
}
