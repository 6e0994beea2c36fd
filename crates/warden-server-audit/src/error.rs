// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use thiserror::Error;

pub type AuditResult<T> = Result<T, AuditError>;

#[derive(Error, Debug)]
pub enum AuditError {
	#[error("audit storage error: {0}")]
	Storage(String),

	#[error("audit serialization error: {0}")]
	Serialization(#[from] serde_json::Error),

	#[error("invalid audit timestamp '{0}'")]
	InvalidTimestamp(String),
}
