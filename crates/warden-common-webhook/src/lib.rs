// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Outbound webhook delivery for Warden.
//!
//! This crate provides:
//! - [`WebhookTransport`]: the "send message, get status" contract alerting
//!   depends on, with [`HttpWebhookTransport`] as the reqwest implementation
//! - Provider payload rendering for Slack, Discord and generic receivers
//! - HMAC-SHA256 signing so receivers can authenticate payloads

mod error;
mod message;
mod signature;
mod transport;

pub use error::{WebhookError, WebhookResult};
pub use message::{MessageLevel, WebhookMessage, WebhookProvider};
pub use signature::{compute_hmac_sha256, verify_hmac_sha256, SIGNATURE_HEADER};
pub use transport::{
	clamp_retries, clamp_timeout, user_agent, DeliveryStatus, DispatchOutcome,
	HttpWebhookTransport, WebhookTransport, DEFAULT_TIMEOUT, MAX_RETRIES, MAX_TIMEOUT, MIN_TIMEOUT,
};
