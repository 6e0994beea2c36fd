// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::path::PathBuf;

use warden_server_audit::AuditError;
use warden_server_security_events::SecurityEventError;

#[derive(Debug, thiserror::Error)]
pub enum DbError {
	#[error("I/O error on {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Serialization error: {0}")]
	Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DbError>;

impl From<DbError> for AuditError {
	fn from(e: DbError) -> Self {
		match e {
			DbError::Serialization(e) => AuditError::Serialization(e),
			other => AuditError::Storage(other.to_string()),
		}
	}
}

impl From<DbError> for SecurityEventError {
	fn from(e: DbError) -> Self {
		match e {
			DbError::Serialization(e) => SecurityEventError::Serialization(e),
			other => SecurityEventError::Storage(other.to_string()),
		}
	}
}
