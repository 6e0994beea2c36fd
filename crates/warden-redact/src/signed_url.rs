// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Signed URL stripping.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::{REDACTED, REDACTED_URL};

static SIGNED_QUERY: Lazy<Regex> = Lazy::new(|| {
	Regex::new(r"(?i)[?&](token|signature|sig|x-amz-signature|x-goog-signature)=")
		.expect("signed query pattern is valid")
});

/// Returns true when `s` carries a token or signature query parameter.
pub fn contains_signed_query(s: &str) -> bool {
	SIGNED_QUERY.is_match(s)
}

/// Reduces a signed URL to `scheme://host[:port]/path?[REDACTED]`.
///
/// Strings without a signed query parameter are returned borrowed. When the
/// string cannot be parsed as an absolute URL with a host, the whole value is
/// replaced by [`REDACTED_URL`].
pub fn strip_signed_url(s: &str) -> Cow<'_, str> {
	if !contains_signed_query(s) {
		return Cow::Borrowed(s);
	}

	let Ok(parsed) = Url::parse(s.trim()) else {
		return Cow::Owned(REDACTED_URL.to_string());
	};
	let Some(host) = parsed.host_str() else {
		return Cow::Owned(REDACTED_URL.to_string());
	};

	let authority = match parsed.port() {
		Some(port) => format!("{host}:{port}"),
		None => host.to_string(),
	};

	Cow::Owned(format!(
		"{}://{}{}?{}",
		parsed.scheme(),
		authority,
		parsed.path(),
		REDACTED
	))
}
