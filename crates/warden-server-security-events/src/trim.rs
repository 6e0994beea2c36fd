// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use crate::event::SecurityEvent;

/// Caps `events` at `cap`, keeping the newest by timestamp. The result is
/// ordered oldest first.
pub fn trim(mut events: Vec<SecurityEvent>, cap: usize) -> Vec<SecurityEvent> {
	events.sort_by_key(|e| e.ts);
	let excess = events.len().saturating_sub(cap);
	events.drain(..excess);
	events
}

/// Replaces the event with the same id, or appends it, then trims.
pub fn upsert_into(
	mut events: Vec<SecurityEvent>,
	event: SecurityEvent,
	cap: usize,
) -> Vec<SecurityEvent> {
	match events.iter_mut().find(|e| e.id == event.id) {
		Some(existing) => *existing = event,
		None => events.push(event),
	}
	trim(events, cap)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::event::{EventStatus, Severity};
	use chrono::{Duration, TimeZone, Utc};

	fn event(minutes: i64) -> SecurityEvent {
		SecurityEvent::builder("x", Severity::Info)
			.ts(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(minutes))
			.build()
	}

	#[test]
	fn test_trim_keeps_newest() {
		let events = vec![event(3), event(1), event(2)];
		let out = trim(events, 2);
		let minutes: Vec<_> = out.iter().map(|e| e.ts.timestamp() / 60 % 60).collect();
		assert_eq!(minutes, vec![2, 3]);
	}

	#[test]
	fn test_trim_under_cap_is_identity_sorted() {
		let out = trim(vec![event(2), event(1)], 10);
		assert_eq!(out.len(), 2);
		assert!(out[0].ts < out[1].ts);
	}

	#[test]
	fn test_upsert_replaces_by_id() {
		let original = event(1);
		let mut updated = original.clone();
		updated.status = EventStatus::Resolved;

		let out = upsert_into(vec![original, event(2)], updated, 10);
		assert_eq!(out.len(), 2);
		assert_eq!(out[0].status, EventStatus::Resolved);
	}
}

#[cfg(test)]
mod proptests {
	use super::*;
	use crate::event::Severity;
	use chrono::{Duration, TimeZone, Utc};
	use proptest::prelude::*;

	proptest! {
		#[test]
		fn prop_trim_bounded_and_newest(
			offsets in proptest::collection::vec(0i64..100_000, 0..60),
			cap in 0usize..30,
		) {
			let base = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
			let events: Vec<_> = offsets
				.iter()
				.map(|o| SecurityEvent::builder("x", Severity::Info).ts(base + Duration::seconds(*o)).build())
				.collect();

			let out = trim(events, cap);
			prop_assert!(out.len() <= cap);
			prop_assert_eq!(out.len(), offsets.len().min(cap));

			let mut sorted = offsets.clone();
			sorted.sort_unstable();
			let expected: Vec<_> = sorted.iter().rev().take(cap).rev().map(|o| base + Duration::seconds(*o)).collect();
			let kept: Vec<_> = out.iter().map(|e| e.ts).collect();
			prop_assert_eq!(kept, expected);
		}
	}
}
