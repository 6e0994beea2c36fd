// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Retention enforcement run on every audit write.

use chrono::{DateTime, Duration, Utc};
use warden_server_config::AuditConfig;

use crate::entry::AuditLogEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
	pub max_entries: usize,
	pub retention_days: i64,
}

impl Default for RetentionPolicy {
	fn default() -> Self {
		Self::from(&AuditConfig::default())
	}
}

impl From<&AuditConfig> for RetentionPolicy {
	fn from(config: &AuditConfig) -> Self {
		Self {
			max_entries: config.max_entries,
			retention_days: config.retention_days,
		}
	}
}

/// Drops unparsable and expired entries, sorts the rest oldest first and
/// keeps only the newest `policy.max_entries`.
pub fn compact(
	entries: Vec<AuditLogEntry>,
	now: DateTime<Utc>,
	policy: &RetentionPolicy,
) -> Vec<AuditLogEntry> {
	let cutoff = now - Duration::days(policy.retention_days);

	let mut dated: Vec<(DateTime<Utc>, AuditLogEntry)> = entries
		.into_iter()
		.filter_map(|entry| entry.parsed_ts().map(|ts| (ts, entry)))
		.filter(|(ts, _)| *ts >= cutoff)
		.collect();

	dated.sort_by_key(|(ts, _)| *ts);

	let excess = dated.len().saturating_sub(policy.max_entries);
	dated.into_iter().skip(excess).map(|(_, entry)| entry).collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::context::RequestContext;
	use chrono::TimeZone;
	use serde_json::Map;

	fn fixed_now() -> DateTime<Utc> {
		Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
	}

	fn entry_at(ts: DateTime<Utc>) -> AuditLogEntry {
		AuditLogEntry::new(
			&RequestContext::new(),
			"pages.update",
			"pages",
			&Map::new(),
			ts,
		)
	}

	#[test]
	fn test_drops_unparsable_timestamps() {
		let now = fixed_now();
		let mut bad = entry_at(now);
		bad.ts = "yesterday".to_string();
		let out = compact(vec![bad, entry_at(now)], now, &RetentionPolicy::default());
		assert_eq!(out.len(), 1);
	}

	#[test]
	fn test_drops_expired_entries() {
		let now = fixed_now();
		let old = entry_at(now - Duration::days(31));
		let edge = entry_at(now - Duration::days(30));
		let out = compact(vec![old, edge.clone()], now, &RetentionPolicy::default());
		assert_eq!(out, vec![edge]);
	}

	#[test]
	fn test_keeps_newest_when_over_cap() {
		let now = fixed_now();
		let entries: Vec<_> = (0..5)
			.rev()
			.map(|i| entry_at(now - Duration::minutes(i)))
			.collect();
		let newest_two: Vec<_> = entries[3..].to_vec();
		let policy = RetentionPolicy {
			max_entries: 2,
			retention_days: 30,
		};
		assert_eq!(compact(entries, now, &policy), newest_two);
	}

	#[test]
	fn test_output_sorted_ascending() {
		let now = fixed_now();
		let a = entry_at(now - Duration::hours(2));
		let b = entry_at(now - Duration::hours(1));
		let out = compact(vec![b.clone(), a.clone()], now, &RetentionPolicy::default());
		assert_eq!(out, vec![a, b]);
	}
}
