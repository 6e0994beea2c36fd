// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! HMAC-SHA256 signing of outbound alert payloads.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying `sha256=<hex>` when a signing secret is configured.
pub const SIGNATURE_HEADER: &str = "x-warden-signature";

/// Compute an HMAC-SHA256 signature for a payload.
///
/// Returns the hex-encoded signature without any prefix.
pub fn compute_hmac_sha256(secret: &[u8], payload: &[u8]) -> String {
	let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
	mac.update(payload);
	hex::encode(mac.finalize().into_bytes())
}

/// Verify a signature produced by [`compute_hmac_sha256`].
///
/// Accepts the raw hex digest or the `sha256=` header form.
pub fn verify_hmac_sha256(secret: &[u8], payload: &[u8], signature: &str) -> bool {
	let hex_part = signature.strip_prefix("sha256=").unwrap_or(signature);
	let Ok(expected) = hex::decode(hex_part) else {
		return false;
	};

	let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
		return false;
	};

	mac.update(payload);
	mac.verify_slice(&expected).is_ok()
}


#[cfg(test)]
mod proptests {
	use super::*;
	use proptest::prelude::*;

	proptest! {
		#[test]
		fn prop_wrong_secret_fails(
			secret1 in proptest::collection::vec(any::<u8>(), 1..64),
			secret2 in proptest::collection::vec(any::<u8>(), 1..64),
			payload in proptest::collection::vec(any::<u8>(), 1..256)
		) {
			prop_assume!(secret1 != secret2);
			let sig = compute_hmac_sha256(&secret1, &payload);
			prop_assert!(!verify_hmac_sha256(&secret2, &payload, &sig));
		}
	}
}
