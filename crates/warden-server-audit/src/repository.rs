// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;

use crate::entry::AuditLogEntry;
use crate::error::AuditResult;

/// Storage collaborator holding the whole audit collection.
///
/// Writes replace the collection; callers compact before writing.
#[async_trait]
pub trait AuditLogRepository: Send + Sync {
	async fn load_audit_log(&self) -> AuditResult<Vec<AuditLogEntry>>;

	async fn write_audit_log(&self, entries: Vec<AuditLogEntry>) -> AuditResult<()>;
}
