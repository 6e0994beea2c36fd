// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Audit log configuration section.

use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_ENTRIES: usize = 20_000;
pub const DEFAULT_RETENTION_DAYS: i64 = 30;
pub const DEFAULT_EXPORT_MAX_ROWS: usize = 10_000;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AuditConfigLayer {
	pub max_entries: Option<usize>,
	pub retention_days: Option<i64>,
	pub export_max_rows: Option<usize>,
	pub always_enabled_actions: Option<Vec<String>>,
}

impl AuditConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.max_entries.is_some() {
			self.max_entries = other.max_entries;
		}
		if other.retention_days.is_some() {
			self.retention_days = other.retention_days;
		}
		if other.export_max_rows.is_some() {
			self.export_max_rows = other.export_max_rows;
		}
		if other.always_enabled_actions.is_some() {
			self.always_enabled_actions = other.always_enabled_actions;
		}
	}

	pub fn finalize(self) -> AuditConfig {
		AuditConfig {
			max_entries: self.max_entries.unwrap_or(DEFAULT_MAX_ENTRIES),
			retention_days: self.retention_days.unwrap_or(DEFAULT_RETENTION_DAYS),
			export_max_rows: self.export_max_rows.unwrap_or(DEFAULT_EXPORT_MAX_ROWS),
			always_enabled_actions: self.always_enabled_actions.unwrap_or_default(),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditConfig {
	pub max_entries: usize,
	pub retention_days: i64,
	pub export_max_rows: usize,
	/// Extra exact action names persisted regardless of the verb policy.
	pub always_enabled_actions: Vec<String>,
}

impl Default for AuditConfig {
	fn default() -> Self {
		AuditConfigLayer::default().finalize()
	}
}
