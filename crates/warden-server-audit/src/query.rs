// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Filtering and pagination over stored audit entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entry::{AuditLogEntry, AuditStatus};

pub const DEFAULT_PAGE_LIMIT: usize = 50;
pub const MAX_PAGE_LIMIT: usize = 200;

/// Resolves a 1-based page number and a limit clamped to `1..=200`.
pub fn normalize_page(page: Option<usize>, limit: Option<usize>) -> (usize, usize) {
	let page = page.unwrap_or(1).max(1);
	let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT);
	(page, limit)
}

/// Audit log filters. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditQuery {
	/// Exact action, or `prefix.*` for a namespace.
	pub action: Option<String>,
	pub resource: Option<String>,
	/// Matches either the actor id or the actor name.
	pub actor: Option<String>,
	pub status: Option<AuditStatus>,
	pub from: Option<DateTime<Utc>>,
	pub to: Option<DateTime<Utc>>,
	/// Case-insensitive free text.
	pub q: Option<String>,
}

impl AuditQuery {
	pub fn action(mut self, action: impl Into<String>) -> Self {
		self.action = Some(action.into());
		self
	}

	pub fn resource(mut self, resource: impl Into<String>) -> Self {
		self.resource = Some(resource.into());
		self
	}

	pub fn actor(mut self, actor: impl Into<String>) -> Self {
		self.actor = Some(actor.into());
		self
	}

	pub fn status(mut self, status: AuditStatus) -> Self {
		self.status = Some(status);
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

	pub fn matches(&self, entry: &AuditLogEntry) -> bool {
		if let Some(action) = non_blank(&self.action) {
			let matched = match action.strip_suffix(".*") {
				Some(prefix) => entry
					.action
					.strip_prefix(prefix)
					.is_some_and(|rest| rest.starts_with('.')),
				None => entry.action == action,
			};
			if !matched {
				return false;
			}
		}

		if let Some(resource) = non_blank(&self.resource) {
			if entry.resource != resource {
				return false;
			}
		}

		if let Some(actor) = non_blank(&self.actor) {
			if entry.actor_id != actor && entry.actor_name.as_deref() != Some(actor) {
				return false;
			}
		}

		if let Some(status) = self.status {
			if entry.status != status {
				return false;
			}
		}

		if self.from.is_some() || self.to.is_some() {
			let Some(ts) = entry.parsed_ts() else {
				return false;
			};
			if self.from.is_some_and(|from| ts < from) || self.to.is_some_and(|to| ts > to) {
				return false;
			}
		}

		if let Some(q) = non_blank(&self.q) {
			return text_matches(entry, &q.to_lowercase());
		}

		true
	}

	/// Matching entries, newest first.
	pub fn apply<'a>(&self, entries: &'a [AuditLogEntry]) -> Vec<&'a AuditLogEntry> {
		let mut matched: Vec<&AuditLogEntry> = entries.iter().filter(|e| self.matches(e)).collect();
		matched.sort_by(|a, b| b.parsed_ts().cmp(&a.parsed_ts()));
		matched
	}
}

fn non_blank(value: &Option<String>) -> Option<&str> {
	value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn text_matches(entry: &AuditLogEntry, needle: &str) -> bool {
	let fields = [
		Some(entry.action.as_str()),
		Some(entry.resource.as_str()),
		entry.resource_id.as_deref(),
		Some(entry.actor_id.as_str()),
		entry.actor_name.as_deref(),
		Some(entry.ip.as_str()),
		entry.request_id.as_deref(),
	];
	if fields
		.into_iter()
		.flatten()
		.any(|f| f.to_lowercase().contains(needle))
	{
		return true;
	}
	serde_json::to_string(&entry.meta)
		.map(|meta| meta.to_lowercase().contains(needle))
		.unwrap_or(false)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditPage {
	pub items: Vec<AuditLogEntry>,
	pub total: usize,
	pub page: usize,
	pub limit: usize,
}

impl AuditPage {
	pub fn from_matches(matched: Vec<&AuditLogEntry>, page: usize, limit: usize) -> Self {
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
