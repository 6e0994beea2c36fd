// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tracing::{debug, instrument, warn};
use warden_server_config::AuditConfig;

use crate::compact::{compact, RetentionPolicy};
use crate::context::RequestContext;
use crate::csv::{export_csv, CsvExport};
use crate::entry::AuditLogEntry;
use crate::error::AuditResult;
use crate::policy::EnablementPolicy;
use crate::query::{normalize_page, AuditPage, AuditQuery};
use crate::repository::AuditLogRepository;

/// Append-only audit log over a storage collaborator.
///
/// Every append is a load, push, compact and write cycle. Concurrent appends
/// race with last-write-wins semantics.
pub struct AuditLog {
	repository: Arc<dyn AuditLogRepository>,
	policy: EnablementPolicy,
	retention: RetentionPolicy,
	export_max_rows: usize,
}

impl AuditLog {
	pub fn new(repository: Arc<dyn AuditLogRepository>) -> Self {
		Self::from_config(repository, &AuditConfig::default())
	}

	pub fn from_config(repository: Arc<dyn AuditLogRepository>, config: &AuditConfig) -> Self {
		Self {
			repository,
			policy: EnablementPolicy::new(config.always_enabled_actions.iter().cloned()),
			retention: RetentionPolicy::from(config),
			export_max_rows: config.export_max_rows,
		}
	}

	pub fn policy(&self) -> &EnablementPolicy {
		&self.policy
	}

	/// Records `action` on `resource`. Never fails: storage errors are logged
	/// and swallowed, and disabled actions are skipped.
	///
	/// Returns the stored entry when one was written.
	pub async fn append(
		&self,
		ctx: &RequestContext,
		action: &str,
		resource: &str,
		meta: Value,
	) -> Option<AuditLogEntry> {
		self.append_at(ctx, action, resource, meta, Utc::now()).await
	}

	#[instrument(skip(self, ctx, meta, now), fields(action = %action))]
	pub async fn append_at(
		&self,
		ctx: &RequestContext,
		action: &str,
		resource: &str,
		meta: Value,
		now: DateTime<Utc>,
	) -> Option<AuditLogEntry> {
		if !self.policy.is_enabled(action) {
			debug!("audit action not enabled, skipping");
			return None;
		}

		let meta = match meta {
			Value::Object(map) => map,
			_ => Map::new(),
		};

		match self.try_append(ctx, action, resource, &meta, now).await {
			Ok(entry) => Some(entry),
			Err(e) => {
				warn!(error = %e, "audit append failed");
				None
			}
		}
	}

	async fn try_append(
		&self,
		ctx: &RequestContext,
		action: &str,
		resource: &str,
		meta: &Map<String, Value>,
		now: DateTime<Utc>,
	) -> AuditResult<AuditLogEntry> {
		let entry = AuditLogEntry::new(ctx, action, resource, meta, now);

		let mut entries = self.repository.load_audit_log().await?;
		entries.push(entry.clone());
		let entries = compact(entries, now, &self.retention);
		self.repository.write_audit_log(entries).await?;

		Ok(entry)
	}

	/// One page of matching entries, newest first.
	#[instrument(skip(self, query))]
	pub async fn query(
		&self,
		query: &AuditQuery,
		page: Option<usize>,
		limit: Option<usize>,
	) -> AuditResult<AuditPage> {
		let (page, limit) = normalize_page(page, limit);
		let entries = self.repository.load_audit_log().await?;
		Ok(AuditPage::from_matches(query.apply(&entries), page, limit))
	}

	/// CSV of matching entries, newest first, capped at the export row limit.
	#[instrument(skip(self, query))]
	pub async fn export_csv(&self, query: &AuditQuery) -> AuditResult<CsvExport> {
		let entries = self.repository.load_audit_log().await?;
		let export = export_csv(query.apply(&entries), self.export_max_rows);
		debug!(rows = export.rows, truncated = export.truncated, "audit CSV exported");
		Ok(export)
	}
}
