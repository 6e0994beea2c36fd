// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Sanitization of arbitrary JSON value trees before they are persisted.
//!
//! Every value recorded by the audit log or attached to a security event
//! passes through [`redact`]. The walk:
//!
//! - replaces any value whose key looks like a secret with [`REDACTED`]
//! - strips the query string from URLs carrying a signature or token
//! - truncates long strings, appending an ellipsis
//! - caps array length, object width and nesting depth
//!
//! Limits differ between the audit trail and security event payloads, see
//! [`RedactionLimits::AUDIT`] and [`RedactionLimits::EVENT`].

mod signed_url;

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

pub use crate::signed_url::{contains_signed_query, strip_signed_url};

/// Replacement for values stored under a secret-looking key.
pub const REDACTED: &str = "[REDACTED]";

/// Replacement for signed URLs that could not be parsed.
pub const REDACTED_URL: &str = "[REDACTED_URL]";

/// Replacement for values nested deeper than [`RedactionLimits::max_depth`].
pub const MAX_DEPTH_MARKER: &str = "[MAX_DEPTH]";

/// Appended to strings cut at [`RedactionLimits::max_string_chars`].
pub const ELLIPSIS: char = '…';

static SECRET_KEY: Lazy<Regex> = Lazy::new(|| {
	Regex::new(
		r"(?i)token|secret|password|cookie|authorization|session|credential|jwt|signature|sig",
	)
	.expect("secret key pattern is valid")
});

/// Size budgets applied while walking a value tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedactionLimits {
	pub max_string_chars: usize,
	pub max_array_items: usize,
	pub max_object_keys: usize,
	pub max_depth: usize,
}

impl RedactionLimits {
	/// Budgets for audit log `meta`.
	pub const AUDIT: Self = Self {
		max_string_chars: 256,
		max_array_items: 20,
		max_object_keys: 30,
		max_depth: 4,
	};

	/// Budgets for security event `data`.
	pub const EVENT: Self = Self {
		max_string_chars: 1000,
		max_array_items: 20,
		max_object_keys: 50,
		max_depth: 4,
	};
}

impl Default for RedactionLimits {
	fn default() -> Self {
		Self::AUDIT
	}
}

/// Returns true when `key` names something that must never be recorded.
///
/// Matching is a case-insensitive substring test, so `sessionId`,
/// `x-api-token` and `clientSecret` all qualify.
pub fn is_secret_key(key: &str) -> bool {
	SECRET_KEY.is_match(key)
}

/// Redacts `value`, which was found under `key` at nesting level `depth`.
///
/// A secret key wins over everything else: the value is replaced whatever its
/// type. Values reached below `limits.max_depth` collapse into
/// [`MAX_DEPTH_MARKER`]. Numbers, booleans and null are returned unchanged.
pub fn redact(value: &Value, key: Option<&str>, depth: usize, limits: &RedactionLimits) -> Value {
	if key.is_some_and(is_secret_key) {
		return Value::String(REDACTED.to_string());
	}

	if depth > limits.max_depth {
		return Value::String(MAX_DEPTH_MARKER.to_string());
	}

	match value {
		Value::String(s) => Value::String(sanitize_string(s, limits.max_string_chars)),
		Value::Array(items) => Value::Array(
			items
				.iter()
				.take(limits.max_array_items)
				.map(|item| redact(item, None, depth + 1, limits))
				.collect(),
		),
		Value::Object(map) => Value::Object(redact_entries(map, depth + 1, limits)),
		other => other.clone(),
	}
}

/// Redacts the entries of a top-level map (the map itself sits at depth 0).
pub fn redact_map(map: &Map<String, Value>, limits: &RedactionLimits) -> Map<String, Value> {
	redact_entries(map, 1, limits)
}

fn redact_entries(
	map: &Map<String, Value>,
	depth: usize,
	limits: &RedactionLimits,
) -> Map<String, Value> {
	map
		.iter()
		.take(limits.max_object_keys)
		.map(|(k, v)| (k.clone(), redact(v, Some(k), depth, limits)))
		.collect()
}

/// Strips signed URL query strings, then truncates to `max_chars`.
pub fn sanitize_string(s: &str, max_chars: usize) -> String {
	let stripped = strip_signed_url(s);
	truncate(&stripped, max_chars).into_owned()
}

/// Cuts `s` to at most `max_chars` characters followed by [`ELLIPSIS`].
///
/// Borrowed when no cut was needed.
pub fn truncate(s: &str, max_chars: usize) -> Cow<'_, str> {
	match s.char_indices().nth(max_chars) {
		None => Cow::Borrowed(s),
		Some((byte_idx, _)) => {
			let mut out = String::with_capacity(byte_idx + ELLIPSIS.len_utf8());
			out.push_str(&s[..byte_idx]);
			out.push(ELLIPSIS);
			Cow::Owned(out)
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn secret_keys_are_case_insensitive() {
		assert!(is_secret_key("Authorization"));
		assert!(is_secret_key("refreshToken"));
		assert!(is_secret_key("SESSION_ID"));
		assert!(is_secret_key("x-goog-signature"));
		assert!(!is_secret_key("email"));
		assert!(!is_secret_key("title"));
	}

	#[test]
	fn truncate_borrows_short_strings() {
		assert!(matches!(truncate("short", 10), Cow::Borrowed(_)));
		assert_eq!(truncate("exactly", 7), "exactly");
	}

	#[test]
	fn truncate_counts_chars_not_bytes() {
		let s = "ééééé";
		assert_eq!(truncate(s, 3), "ééé…");
	}

	#[test]
	fn depth_zero_string_is_sanitized() {
		let out = redact(&json!("plain"), None, 0, &RedactionLimits::AUDIT);
		assert_eq!(out, json!("plain"));
	}

	#[test]
	fn values_past_max_depth_collapse() {
		let out = redact(&json!({"a": 1}), None, 5, &RedactionLimits::AUDIT);
		assert_eq!(out, json!(MAX_DEPTH_MARKER));
	}

	#[test]
	fn secret_key_beats_depth_marker() {
		let out = redact(&json!("x"), Some("password"), 99, &RedactionLimits::AUDIT);
		assert_eq!(out, json!(REDACTED));
	}
}
