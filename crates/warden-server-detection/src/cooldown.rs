// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Keyed suppression of repeat detections.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;

pub const DEFAULT_COOLDOWN_SECS: i64 = 600;
pub const DEFAULT_SWEEP_THRESHOLD: usize = 5000;

/// Remembers when each `rule:actor` pair last fired.
#[derive(Debug)]
pub struct CooldownRegistry {
	last_emitted: Mutex<HashMap<String, DateTime<Utc>>>,
	window: Duration,
	sweep_threshold: usize,
}

impl Default for CooldownRegistry {
	fn default() -> Self {
		Self::new(Duration::seconds(DEFAULT_COOLDOWN_SECS), DEFAULT_SWEEP_THRESHOLD)
	}
}

impl CooldownRegistry {
	pub fn new(window: Duration, sweep_threshold: usize) -> Self {
		Self {
			last_emitted: Mutex::new(HashMap::new()),
			window,
			sweep_threshold,
		}
	}

	pub fn window(&self) -> Duration {
		self.window
	}

	pub fn should_emit(&self, rule_key: &str, actor_key: &str) -> bool {
		self.should_emit_at(rule_key, actor_key, Utc::now())
	}

	/// Returns false when the pair fired less than one window ago. Otherwise
	/// records `now` and returns true; the check and the update happen under
	/// one lock.
	pub fn should_emit_at(&self, rule_key: &str, actor_key: &str, now: DateTime<Utc>) -> bool {
		let key = format!("{rule_key}:{actor_key}");
		let mut last_emitted = self.last_emitted.lock();

		if let Some(last) = last_emitted.get(&key) {
			if now - *last < self.window {
				return false;
			}
		}
		last_emitted.insert(key, now);

		if last_emitted.len() > self.sweep_threshold {
			let window = self.window;
			last_emitted.retain(|_, last| now - *last < window);
		}
		true
	}

	pub fn len(&self) -> usize {
		self.last_emitted.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}
