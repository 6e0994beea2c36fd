// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Security event store configuration section.

use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_EVENTS: usize = 20_000;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SecurityEventsConfigLayer {
	pub max_events: Option<usize>,
}

impl SecurityEventsConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.max_events.is_some() {
			self.max_events = other.max_events;
		}
	}

	pub fn finalize(self) -> SecurityEventsConfig {
		SecurityEventsConfig {
			max_events: self.max_events.unwrap_or(DEFAULT_MAX_EVENTS),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SecurityEventsConfig {
	pub max_events: usize,
}

impl Default for SecurityEventsConfig {
	fn default() -> Self {
		Self {
			max_events: DEFAULT_MAX_EVENTS,
		}
	}
}
