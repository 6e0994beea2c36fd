// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Multi-horizon sliding window occurrence counter.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

/// Per-key history is capped at this many timestamps.
pub const MAX_TIMESTAMPS_PER_KEY: usize = 10_000;
pub const DEFAULT_SWEEP_THRESHOLD: usize = 5000;

#[derive(Debug, Default)]
struct KeyHistory {
	/// Occurrence times in milliseconds, oldest first.
	times: VecDeque<i64>,
	/// Largest window ever requested for this key.
	retain_ms: i64,
}

impl KeyHistory {
	fn widen(&mut self, window_ms: i64) {
		self.retain_ms = self.retain_ms.max(window_ms);
	}

	fn evict(&mut self, now_ms: i64) {
		while let Some(&front) = self.times.front() {
			if now_ms - front > self.retain_ms {
				self.times.pop_front();
			} else {
				break;
			}
		}
	}

	fn count(&self, window_ms: i64, now_ms: i64) -> usize {
		self.times
			.iter()
			.rev()
			.filter(|&&ts| ts <= now_ms)
			.take_while(|&&ts| now_ms - ts <= window_ms)
			.count()
	}
}

/// Counts occurrences per key within trailing windows.
///
/// A key keeps enough history for the largest window it has been asked
/// about. All operations take a single lock, so concurrent `record` calls on
/// the same key never lose an increment.
#[derive(Debug)]
pub struct SlidingWindowCounter {
	keys: Mutex<HashMap<String, KeyHistory>>,
	sweep_threshold: usize,
}

impl Default for SlidingWindowCounter {
	fn default() -> Self {
		Self::new(DEFAULT_SWEEP_THRESHOLD)
	}
}

impl SlidingWindowCounter {
	pub fn new(sweep_threshold: usize) -> Self {
		Self {
			keys: Mutex::new(HashMap::new()),
			sweep_threshold,
		}
	}

	pub fn record(&self, key: &str, window: Duration) -> usize {
		self.record_at(key, window, Utc::now())
	}

	/// Records an occurrence of `key` at `now` and returns the occurrences
	/// within `window` of `now`, including this one.
	pub fn record_at(&self, key: &str, window: Duration, now: DateTime<Utc>) -> usize {
		let window_ms = window_ms(window);
		let now_ms = now.timestamp_millis();

		let mut keys = self.keys.lock();
		let history = keys.entry(key.to_string()).or_default();
		history.widen(window_ms);
		history.evict(now_ms);
		history.times.push_back(now_ms);
		if history.times.len() > MAX_TIMESTAMPS_PER_KEY {
			history.times.pop_front();
		}
		let count = history.count(window_ms, now_ms);

		if keys.len() > self.sweep_threshold {
			keys.retain(|_, h| {
				h.evict(now_ms);
				!h.times.is_empty()
			});
		}
		count
	}

	pub fn count(&self, key: &str, window: Duration) -> usize {
		self.count_at(key, window, Utc::now())
	}

	/// Occurrences of `key` within `window` of `now`. Asking for a wider
	/// window than before widens the key's retention from now on.
	pub fn count_at(&self, key: &str, window: Duration, now: DateTime<Utc>) -> usize {
		let window_ms = window_ms(window);
		let mut keys = self.keys.lock();
		match keys.get_mut(key) {
			Some(history) => {
				history.widen(window_ms);
				history.count(window_ms, now.timestamp_millis())
			}
			None => 0,
		}
	}

	pub fn len(&self) -> usize {
		self.keys.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

fn window_ms(window: Duration) -> i64 {
	i64::try_from(window.as_millis()).unwrap_or(i64::MAX)
}
