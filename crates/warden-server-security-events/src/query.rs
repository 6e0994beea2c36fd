// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::event::{EventStatus, SecurityEvent, Severity};

/// Security event filters. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityEventQuery {
	pub severity: Option<Severity>,
	pub status: Option<EventStatus>,
	#[serde(rename = "type")]
	pub event_type: Option<String>,
	pub actor_user_id: Option<String>,
	pub target_user_id: Option<String>,
	pub ip: Option<String>,
	pub from: Option<DateTime<Utc>>,
	pub to: Option<DateTime<Utc>>,
	pub q: Option<String>,
}

impl SecurityEventQuery {
	pub fn severity(mut self, severity: Severity) -> Self {
		self.severity = Some(severity);
		self
	}

	pub fn status(mut self, status: EventStatus) -> Self {
		self.status = Some(status);
		self
	}

	pub fn event_type(mut self, event_type: impl Into<String>) -> Self {
		self.event_type = Some(event_type.into());
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

	pub fn between(mut self, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Self {
		self.from = from;
		self.to = to;
		self
	}

	pub fn text(mut self, q: impl Into<String>) -> Self {
		self.q = Some(q.into());
		self
	}

	pub fn matches(&self, event: &SecurityEvent) -> bool {
		if self.severity.is_some_and(|s| s != event.severity) {
			return false;
		}
		if self.status.is_some_and(|s| s != event.status) {
			return false;
		}
		if !eq_filter(&self.event_type, Some(&event.event_type)) {
			return false;
		}
		if !eq_filter(&self.actor_user_id, event.actor_user_id.as_ref()) {
			return false;
		}
		if !eq_filter(&self.target_user_id, event.target_user_id.as_ref()) {
			return false;
		}
		if !eq_filter(&self.ip, Some(&event.ip)) {
			return false;
		}
		if self.from.is_some_and(|from| event.ts < from) {
			return false;
		}
		if self.to.is_some_and(|to| event.ts > to) {
			return false;
		}
		match self.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
			Some(q) => text_matches(event, &q.to_lowercase()),
			None => true,
		}
	}

	/// Matching events, newest first.
	pub fn apply<'a>(&self, events: &'a [SecurityEvent]) -> Vec<&'a SecurityEvent> {
		let mut matched: Vec<&SecurityEvent> = events.iter().filter(|e| self.matches(e)).collect();
		matched.sort_by(|a, b| b.ts.cmp(&a.ts));
		matched
	}
}

fn eq_filter(filter: &Option<String>, value: Option<&String>) -> bool {
	match filter.as_deref().map(str::trim).filter(|f| !f.is_empty()) {
		Some(f) => value.is_some_and(|v| v == f),
		None => true,
	}
}

fn text_matches(event: &SecurityEvent, needle: &str) -> bool {
	let fields = [
		Some(event.id.as_str()),
		Some(event.event_type.as_str()),
		event.actor_user_id.as_deref(),
		event.target_user_id.as_deref(),
		Some(event.ip.as_str()),
		Some(event.user_agent.as_str()),
		event.request_id.as_deref(),
	];
	if fields
		.into_iter()
		.flatten()
		.any(|f| f.to_lowercase().contains(needle))
	{
		return true;
	}
	serde_json::to_string(&event.data)
		.map(|data| data.to_lowercase().contains(needle))
		.unwrap_or(false)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityEventPage {
	pub items: Vec<SecurityEvent>,
	pub total: usize,
	pub page: usize,
	pub limit: usize,
}

impl SecurityEventPage {
	pub fn from_matches(matched: Vec<&SecurityEvent>, page: usize, limit: usize) -> Self {
		let total = matched.len();
		let items = matched
			.into_iter()
			.skip(page.saturating_sub(1).saturating_mul(limit))
			.take(limit)
			.cloned()
			.collect();
		Self {
			items,
			total,
			page,
			limit,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::{Duration, TimeZone};

	fn at(minutes: i64) -> DateTime<Utc> {
		Utc.with_ymd_and_hms(2025, 5, 1, 8, 0, 0).unwrap() + Duration::minutes(minutes)
	}

	fn fixture() -> Vec<SecurityEvent> {
		vec![
			SecurityEvent::builder("auth_failed_burst_ip_warning", Severity::Warning)
				.ip("10.0.0.1")
				.data("count", 8)
				.ts(at(0))
				.build(),
			SecurityEvent::builder("owner_transfer_critical", Severity::Critical)
				.actor_user("u1")
				.target_user("u2")
				.ts(at(5))
				.build(),
			SecurityEvent::builder("mfa_failed_burst_user", Severity::Warning)
				.actor_user("u2")
				.data("network", "192.168.4.0/24")
				.ts(at(10))
				.build(),
		]
	}

	#[test]
	fn test_page_zero_reads_first_page() {
		let events = fixture();
		let page = SecurityEventPage::from_matches(events.iter().collect(), 0, 2);
		assert_eq!(page.items.len(), 2);
		assert_eq!(page.items[0].id, events[0].id);
	}

	#[test]
	fn test_filters_by_severity_and_type() {
		let events = fixture();
		assert_eq!(
			SecurityEventQuery::default()
				.severity(Severity::Warning)
				.apply(&events)
				.len(),
			2
		);
		assert_eq!(
			SecurityEventQuery::default()
				.event_type("owner_transfer_critical")
				.apply(&events)
				.len(),
			1
		);
	}

	#[test]
	fn test_filters_by_users_and_ip() {
		let events = fixture();
		assert_eq!(
			SecurityEventQuery::default()
				.target_user("u2")
				.apply(&events)
				.len(),
			1
		);
		assert_eq!(
			SecurityEventQuery::default()
				.ip("10.0.0.1")
				.apply(&events)
				.len(),
			1
		);
	}

	#[test]
	fn test_date_range_inclusive() {
		let events = fixture();
		let out = SecurityEventQuery::default()
			.between(Some(at(5)), Some(at(10)))
			.apply(&events);
		assert_eq!(out.len(), 2);
	}

	#[test]
	fn test_free_text_over_data() {
		let events = fixture();
		let out = SecurityEventQuery::default()
			.text("192.168.4")
			.apply(&events);
		assert_eq!(out.len(), 1);
		assert_eq!(out[0].event_type, "mfa_failed_burst_user");
	}

	#[test]
	fn test_newest_first_paging() {
		let events = fixture();
		let page = SecurityEventPage::from_matches(SecurityEventQuery::default().apply(&events), 1, 2);
		assert_eq!(page.total, 3);
		assert_eq!(page.items[0].event_type, "mfa_failed_burst_user");
		assert_eq!(page.items[1].event_type, "owner_transfer_critical");
	}
}
