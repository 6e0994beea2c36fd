// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Which actions are persisted to the audit log.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

/// Actions recorded regardless of the verb rules below.
pub const ALWAYS_ENABLED_ACTIONS: &[&str] = &[
	"audit.export",
	"audit.read",
	"security.events.read",
	"secrets.read",
];

static LIFECYCLE_VERB: Lazy<Regex> = Lazy::new(|| {
	Regex::new(
		r"(?:^|[._])(?:create|update|delete|restore|reorder|login|logout|denied|failed|rate_limited|bootstrap|rebuild|image|rename|success|reorganize|sent|skipped|test)(?:$|[._])",
	)
	.expect("lifecycle verb pattern is valid")
});

/// Decides whether an action is worth persisting.
///
/// Checked in order: the exact allowlist, then exclusion of anything
/// containing `.read` or ending in `_read`, then a segment-anchored
/// lifecycle verb.
#[derive(Debug, Clone)]
pub struct EnablementPolicy {
	always_enabled: HashSet<String>,
}

impl Default for EnablementPolicy {
	fn default() -> Self {
		Self::new(std::iter::empty::<String>())
	}
}

impl EnablementPolicy {
	/// Builds a policy from the built-in allowlist plus `extra` exact actions.
	pub fn new<I, S>(extra: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let always_enabled = ALWAYS_ENABLED_ACTIONS
			.iter()
			.map(|a| a.to_string())
			.chain(extra.into_iter().map(Into::into))
			.collect();
		Self { always_enabled }
	}

	pub fn is_enabled(&self, action: &str) -> bool {
		if self.always_enabled.contains(action) {
			return true;
		}
		if is_read_action(action) {
			return false;
		}
		LIFECYCLE_VERB.is_match(action)
	}
}

fn is_read_action(action: &str) -> bool {
	action.contains(".read") || action.ends_with("_read")
}
