// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};
use warden_common_webhook::{DispatchOutcome, HttpWebhookTransport, WebhookTransport};
use warden_server_alerts::AlertEscalator;
use warden_server_audit::{
	AuditLog, AuditLogEntry, AuditLogRepository, AuditPage, AuditQuery, AuditResult, CsvExport,
	RequestContext,
};
use warden_server_config::ServerConfig;
use warden_server_db::JsonFileStore;
use warden_server_detection::{Detection, Detector, MemorySessionHistory, SessionHistory};
use warden_server_security_events::{
	EventStatus, SecurityEvent, SecurityEventPage, SecurityEventQuery, SecurityEventRepository,
	SecurityEventResult, SecurityEventStore,
};

use crate::error::TelemetryResult;
use crate::metrics::{MetricsSink, NoopMetrics};

pub const SECURITY_EVENT_RESOURCE: &str = "security_event";
pub const AUDIT_LOG_RESOURCE: &str = "audit_log";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuditFormat {
	#[default]
	Json,
	Csv,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AuditListing {
	Page(AuditPage),
	Csv(CsvExport),
}

/// Wires collaborators into a [`SecurityTelemetry`]. Anything not supplied
/// falls back to the JSON file store under `storage.data_dir`, in-memory
/// session history, the HTTP webhook transport and no metrics.
pub struct SecurityTelemetryBuilder {
	config: ServerConfig,
	audit_repository: Option<Arc<dyn AuditLogRepository>>,
	event_repository: Option<Arc<dyn SecurityEventRepository>>,
	history: Option<Arc<dyn SessionHistory>>,
	transport: Option<Arc<dyn WebhookTransport>>,
	metrics: Option<Arc<dyn MetricsSink>>,
}

impl SecurityTelemetryBuilder {
	/// Uses one store for both the audit log and security events.
	pub fn store<S>(mut self, store: Arc<S>) -> Self
	where
		S: AuditLogRepository + SecurityEventRepository + 'static,
	{
		self.audit_repository = Some(store.clone());
		self.event_repository = Some(store);
		self
	}

	pub fn audit_repository(mut self, repository: Arc<dyn AuditLogRepository>) -> Self {
		self.audit_repository = Some(repository);
		self
	}

	pub fn event_repository(mut self, repository: Arc<dyn SecurityEventRepository>) -> Self {
		self.event_repository = Some(repository);
		self
	}

	pub fn session_history(mut self, history: Arc<dyn SessionHistory>) -> Self {
		self.history = Some(history);
		self
	}

	pub fn transport(mut self, transport: Arc<dyn WebhookTransport>) -> Self {
		self.transport = Some(transport);
		self
	}

	pub fn metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
		self.metrics = Some(metrics);
		self
	}

	pub fn build(self) -> TelemetryResult<SecurityTelemetry> {
		let config = self.config;

		let (audit_repository, event_repository): (
			Arc<dyn AuditLogRepository>,
			Arc<dyn SecurityEventRepository>,
		) = match (self.audit_repository, self.event_repository) {
			(Some(audit), Some(events)) => (audit, events),
			(audit, events) => {
				let store = Arc::new(JsonFileStore::from_config(&config.storage));
				(
					audit.unwrap_or_else(|| store.clone()),
					events.unwrap_or_else(|| store),
				)
			}
		};

		let transport: Arc<dyn WebhookTransport> = match self.transport {
			Some(transport) => transport,
			None => {
				let mut http = HttpWebhookTransport::new()?;
				if let Some(secret) = &config.alerts.signing_secret {
					http = http.with_signing_secret(secret.clone());
				}
				Arc::new(http)
			}
		};

		let history: Arc<dyn SessionHistory> = match self.history {
			Some(history) => history,
			None => Arc::new(MemorySessionHistory::new()),
		};

		let metrics: Arc<dyn MetricsSink> = match self.metrics {
			Some(metrics) => metrics,
			None => Arc::new(NoopMetrics),
		};

		let audit = Arc::new(AuditLog::from_config(audit_repository, &config.audit));

		Ok(SecurityTelemetry {
			events: SecurityEventStore::from_config(event_repository, &config.security_events),
			detector: Detector::new(config.detection.clone(), history),
			escalator: AlertEscalator::new(config.alerts.clone(), transport, audit.clone()),
			audit,
			metrics,
			pending_alerts: Mutex::new(Vec::new()),
		})
	}
}

/// Entry point for hosts: audit recording, detection observers, security
/// event triage and alerting behind one handle.
pub struct SecurityTelemetry {
	audit: Arc<AuditLog>,
	events: SecurityEventStore,
	detector: Detector,
	escalator: AlertEscalator,
	metrics: Arc<dyn MetricsSink>,
	pending_alerts: Mutex<Vec<JoinHandle<DispatchOutcome>>>,
}

impl SecurityTelemetry {
	pub fn builder(config: ServerConfig) -> SecurityTelemetryBuilder {
		SecurityTelemetryBuilder {
			config,
			audit_repository: None,
			event_repository: None,
			history: None,
			transport: None,
			metrics: None,
		}
	}

	pub fn audit_log(&self) -> &AuditLog {
		&self.audit
	}

	pub fn detector(&self) -> &Detector {
		&self.detector
	}

	/// Never fails; see [`AuditLog::append`].
	pub async fn append_audit(
		&self,
		ctx: &RequestContext,
		action: &str,
		resource: &str,
		meta: Value,
	) -> Option<AuditLogEntry> {
		self.audit.append(ctx, action, resource, meta).await
	}

	/// Stores `event`, audits its creation and escalates it when critical.
	///
	/// `None` means the store rejected the write and nothing else happened.
	#[instrument(skip_all, fields(event_type = %event.event_type, severity = %event.severity))]
	pub async fn emit_security_event(
		&self,
		ctx: &RequestContext,
		event: SecurityEvent,
	) -> Option<SecurityEvent> {
		let stored = self.events.upsert(event).await?;

		self.metrics
			.event_emitted(&stored.event_type, stored.severity.as_str());
		self.audit
			.append(
				ctx,
				"security.event.create",
				SECURITY_EVENT_RESOURCE,
				json!({
					"eventId": stored.id,
					"type": stored.event_type,
					"severity": stored.severity.as_str(),
					"riskScore": stored.risk_score,
				}),
			)
			.await;
		info!(event_id = %stored.id, risk_score = stored.risk_score, "security event emitted");

		let metrics = self.metrics.clone();
		if let Some(handle) = self.escalator.escalate_with(&stored, Some(ctx), move |outcome| {
			metrics.alert_dispatched(outcome.status.as_str());
		}) {
			let mut pending = self.pending_alerts.lock();
			pending.retain(|h| !h.is_finished());
			pending.push(handle);
		}

		Some(stored)
	}

	pub async fn emit_detection(
		&self,
		ctx: &RequestContext,
		detection: Detection,
	) -> Option<SecurityEvent> {
		self.emit_detection_at(ctx, Some(detection), Utc::now())
			.await
	}

	async fn emit_detection_at(
		&self,
		ctx: &RequestContext,
		detection: Option<Detection>,
		now: DateTime<Utc>,
	) -> Option<SecurityEvent> {
		let detection = detection?;
		self.emit_security_event(ctx, detection.into_event(ctx, now))
			.await
	}

	/// Waits for every alert delivery spawned so far.
	pub async fn flush_alerts(&self) -> Vec<DispatchOutcome> {
		let handles = std::mem::take(&mut *self.pending_alerts.lock());
		let mut outcomes = Vec::with_capacity(handles.len());
		for handle in handles {
			match handle.await {
				Ok(outcome) => outcomes.push(outcome),
				Err(e) => warn!(error = %e, "alert delivery task failed"),
			}
		}
		outcomes
	}

	#[instrument(skip(self, ctx, query))]
	pub async fn list_security_events(
		&self,
		ctx: &RequestContext,
		query: &SecurityEventQuery,
		page: Option<usize>,
		limit: Option<usize>,
	) -> SecurityEventResult<SecurityEventPage> {
		let result = self.events.list(query, page, limit).await?;
		self.audit
			.append(
				ctx,
				"security.events.read",
				SECURITY_EVENT_RESOURCE,
				json!({
					"page": result.page,
					"limit": result.limit,
					"total": result.total,
					"filters": query,
				}),
			)
			.await;
		Ok(result)
	}

	/// Moves an event to `status` on behalf of the context's actor.
	/// Unknown ids return `Ok(None)` and are not audited.
	#[instrument(skip(self, ctx), fields(status = %status))]
	pub async fn set_security_event_status(
		&self,
		ctx: &RequestContext,
		id: &str,
		status: EventStatus,
	) -> SecurityEventResult<Option<SecurityEvent>> {
		let Some(previous) = self.events.get(id).await? else {
			debug!("security event not found");
			return Ok(None);
		};

		let updated = self
			.events
			.set_status(id, status, ctx.actor_id_or_anonymous())
			.await?;
		if let Some(event) = &updated {
			self.audit
				.append(
					ctx,
					"security.event.update",
					SECURITY_EVENT_RESOURCE,
					json!({
						"eventId": event.id,
						"status": event.status.as_str(),
						"previousStatus": previous.status.as_str(),
					}),
				)
				.await;
		}
		Ok(updated)
	}

	/// A JSON page or a CSV export of the audit log. Reading is itself audited.
	#[instrument(skip(self, ctx, query))]
	pub async fn list_audit_log(
		&self,
		ctx: &RequestContext,
		query: &AuditQuery,
		page: Option<usize>,
		limit: Option<usize>,
		format: AuditFormat,
	) -> AuditResult<AuditListing> {
		match format {
			AuditFormat::Json => {
				let result = self.audit.query(query, page, limit).await?;
				self.audit
					.append(
						ctx,
						"audit.read",
						AUDIT_LOG_RESOURCE,
						json!({
							"page": result.page,
							"limit": result.limit,
							"total": result.total,
							"filters": query,
						}),
					)
					.await;
				Ok(AuditListing::Page(result))
			}
			AuditFormat::Csv => {
				let export = self.audit.export_csv(query).await?;
				self.audit
					.append(
						ctx,
						"audit.export",
						AUDIT_LOG_RESOURCE,
						json!({
							"format": "csv",
							"rows": export.rows,
							"truncated": export.truncated,
							"filters": query,
						}),
					)
					.await;
				Ok(AuditListing::Csv(export))
			}
		}
	}

	/// Failed password login; counted per client IP. Requests without a
	/// client IP are not counted, so they never pool under one key.
	pub async fn on_login_failed(&self, ctx: &RequestContext) -> Option<SecurityEvent> {
		let Some(ip) = ctx.client_ip() else {
			debug!("login failure without client ip, burst rule skipped");
			return None;
		};
		let now = Utc::now();
		let detection = self.detector.login_failed(ip, now);
		self.emit_detection_at(ctx, detection, now).await
	}

	/// Successful login by `user_id`, who now holds `active_sessions`
	/// sessions. Call before the login is recorded in session history.
	pub async fn on_login_succeeded(
		&self,
		ctx: &RequestContext,
		user_id: &str,
		active_sessions: usize,
	) -> Vec<SecurityEvent> {
		let now = Utc::now();
		let mut emitted = Vec::new();

		let new_network = self
			.detector
			.login_from_new_network(user_id, ctx.ip_or_unknown(), now)
			.await;
		emitted.extend(self.emit_detection_at(ctx, new_network, now).await);

		let sessions = self.detector.active_sessions(user_id, active_sessions, now);
		emitted.extend(self.emit_detection_at(ctx, sessions, now).await);

		emitted
	}

	pub async fn on_mfa_failed(&self, ctx: &RequestContext, user_id: &str) -> Option<SecurityEvent> {
		self.metrics.mfa_outcome("failed");
		let now = Utc::now();
		let detection = self.detector.mfa_failed(user_id, now);
		self.emit_detection_at(ctx, detection, now).await
	}

	pub fn on_mfa_succeeded(&self, _ctx: &RequestContext, user_id: &str) {
		debug!(user_id, "mfa verified");
		self.metrics.mfa_outcome("success");
	}

	/// Request to an admin-scoped route by an authenticated user.
	pub async fn on_admin_request(
		&self,
		ctx: &RequestContext,
		user_id: &str,
	) -> Option<SecurityEvent> {
		let now = Utc::now();
		let detection = self
			.detector
			.admin_request_from_new_network(user_id, ctx.ip_or_unknown(), now)
			.await;
		self.emit_detection_at(ctx, detection, now).await
	}

	/// The context's actor changed `changed_fields` on user `target_id`.
	pub async fn on_user_updated(
		&self,
		ctx: &RequestContext,
		target_id: &str,
		changed_fields: &[String],
	) -> Option<SecurityEvent> {
		let now = Utc::now();
		let detection = self.detector.user_updated(
			ctx.actor_id_or_anonymous(),
			target_id,
			changed_fields,
			now,
		);
		self.emit_detection_at(ctx, detection, now).await
	}

	pub async fn on_owner_transferred(
		&self,
		ctx: &RequestContext,
		from_user_id: &str,
		to_user_id: &str,
	) -> Option<SecurityEvent> {
		let now = Utc::now();
		let detection = self
			.detector
			.owner_transferred(from_user_id, to_user_id, now);
		self.emit_detection_at(ctx, detection, now).await
	}

	/// Sends a synthetic alert through the configured webhook.
	pub async fn send_test_alert(&self, ctx: &RequestContext) -> DispatchOutcome {
		self.escalator.send_test(ctx).await
	}
}
