// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use thiserror::Error;
use warden_common_webhook::WebhookError;

pub type TelemetryResult<T> = Result<T, TelemetryError>;

#[derive(Error, Debug)]
pub enum TelemetryError {
	#[error("webhook transport error: {0}")]
	Webhook(#[from] WebhookError),

	#[error("metrics registration error: {0}")]
	Metrics(#[from] prometheus::Error),

	#[error("failed to initialise tracing: {0}")]
	Tracing(String),
}
