// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use thiserror::Error;

pub type SecurityEventResult<T> = Result<T, SecurityEventError>;

#[derive(Error, Debug)]
pub enum SecurityEventError {
	#[error("security event storage error: {0}")]
	Storage(String),

	#[error("security event serialization error: {0}")]
	Serialization(#[from] serde_json::Error),

	#[error("invalid security event status '{0}'")]
	InvalidStatus(String),
}
