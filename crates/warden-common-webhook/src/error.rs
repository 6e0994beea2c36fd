// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use thiserror::Error;

pub type WebhookResult<T> = Result<T, WebhookError>;

#[derive(Error, Debug)]
pub enum WebhookError {
	#[error("failed to build HTTP client: {0}")]
	Client(#[from] reqwest::Error),

	#[error("invalid webhook url: {0}")]
	InvalidUrl(String),

	#[error("unknown webhook provider: {0}")]
	UnknownProvider(String),
}
