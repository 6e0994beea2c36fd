// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Request-scoped attribution carried into audit entries and security events.

use serde::{Deserialize, Serialize};

pub const ANONYMOUS_ACTOR: &str = "anonymous";
pub const UNKNOWN_IP: &str = "unknown";
pub const SYSTEM_ACTOR_ID: &str = "system";
pub const SYSTEM_ACTOR_NAME: &str = "System";

/// Who is acting, from where, and under which request.
///
/// Every field is optional; accessors apply the defaults used when an entry
/// is written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestContext {
	pub actor_id: Option<String>,
	pub actor_name: Option<String>,
	pub ip: Option<String>,
	pub user_agent: Option<String>,
	pub request_id: Option<String>,
	pub session_id: Option<String>,
}

impl RequestContext {
	pub fn new() -> Self {
		Self::default()
	}

	/// Context used for work not triggered by a request, e.g. background alerts.
	pub fn system() -> Self {
		Self::new()
			.actor(SYSTEM_ACTOR_ID)
			.actor_name(SYSTEM_ACTOR_NAME)
	}

	pub fn actor(mut self, actor_id: impl Into<String>) -> Self {
		self.actor_id = Some(actor_id.into());
		self
	}

	pub fn actor_name(mut self, name: impl Into<String>) -> Self {
		self.actor_name = Some(name.into());
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

	pub fn request_id(mut self, request_id: impl Into<String>) -> Self {
		self.request_id = Some(request_id.into());
		self
	}

	pub fn session_id(mut self, session_id: impl Into<String>) -> Self {
		self.session_id = Some(session_id.into());
		self
	}

	pub fn actor_id_or_anonymous(&self) -> &str {
		non_empty(self.actor_id.as_deref()).unwrap_or(ANONYMOUS_ACTOR)
	}

	pub fn ip_or_unknown(&self) -> &str {
		self.client_ip().unwrap_or(UNKNOWN_IP)
	}

	/// The caller's address, if the request carried a non-blank one.
	pub fn client_ip(&self) -> Option<&str> {
		non_empty(self.ip.as_deref())
	}
}

fn non_empty(value: Option<&str>) -> Option<&str> {
	value.map(str::trim).filter(|v| !v.is_empty())
}
