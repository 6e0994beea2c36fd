// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use serde_json::json;
use warden_common_webhook::{
	verify_hmac_sha256, DeliveryStatus, DispatchOutcome, WebhookMessage, WebhookProvider,
	WebhookTransport, SIGNATURE_HEADER,
};
use warden_server_audit::{AuditLogEntry, AuditLogRepository};
use warden_server_config::ServerConfig;
use warden_server_db::{MemoryStore, AUDIT_LOG_FILE};
use warden_server_detection::MemorySessionHistory;
use warden_server_security::{
	AuditFormat, AuditListing, AuditQuery, EventStatus, PrometheusMetrics, RequestContext,
	SecurityEventQuery, SecurityTelemetry, Severity,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Default)]
struct RecordingTransport {
	messages: Mutex<Vec<WebhookMessage>>,
}

#[async_trait]
impl WebhookTransport for RecordingTransport {
	async fn dispatch(
		&self,
		_provider: WebhookProvider,
		_url: &str,
		message: &WebhookMessage,
		_timeout: Duration,
		_retries: u32,
	) -> DispatchOutcome {
		self.messages.lock().push(message.clone());
		DispatchOutcome::sent(200, 1)
	}
}

struct Harness {
	telemetry: SecurityTelemetry,
	store: Arc<MemoryStore>,
	history: Arc<MemorySessionHistory>,
	transport: Arc<RecordingTransport>,
	metrics: Arc<PrometheusMetrics>,
}

fn config_with_webhook() -> ServerConfig {
	let mut config = ServerConfig::default();
	config.alerts.webhook_url = Some("https://hooks.example.com/services/T/B/X".to_string());
	config
}

fn harness(config: ServerConfig) -> Harness {
	let store = Arc::new(MemoryStore::new());
	let history = Arc::new(MemorySessionHistory::new());
	let transport = Arc::new(RecordingTransport::default());
	let metrics = Arc::new(PrometheusMetrics::new().unwrap());

	let telemetry = SecurityTelemetry::builder(config)
		.store(store.clone())
		.session_history(history.clone())
		.transport(transport.clone())
		.metrics(metrics.clone())
		.build()
		.unwrap();

	Harness {
		telemetry,
		store,
		history,
		transport,
		metrics,
	}
}

async fn actions(store: &MemoryStore) -> Vec<String> {
	store
		.load_audit_log()
		.await
		.unwrap()
		.into_iter()
		.map(|e| e.action)
		.collect()
}

async fn entries_for(store: &MemoryStore, action: &str) -> Vec<AuditLogEntry> {
	store
		.load_audit_log()
		.await
		.unwrap()
		.into_iter()
		.filter(|e| e.action == action)
		.collect()
}

#[tokio::test]
async fn login_failure_burst_raises_warning_then_critical() {
	let h = harness(config_with_webhook());
	let ctx = RequestContext::new().ip("10.0.0.1");

	let mut raised = Vec::new();
	for _ in 0..25 {
		if let Some(event) = h.telemetry.on_login_failed(&ctx).await {
			raised.push(event);
		}
	}

	let types: Vec<_> = raised.iter().map(|e| e.event_type.as_str()).collect();
	assert_eq!(
		types,
		vec!["auth_failed_burst_ip_warning", "auth_failed_burst_ip_critical"]
	);
	assert_eq!(raised[0].severity, Severity::Warning);
	assert_eq!(raised[0].data["count"], 8);
	assert_eq!(raised[1].data["count"], 20);

	let outcomes = h.telemetry.flush_alerts().await;
	assert_eq!(outcomes.len(), 1);
	assert_eq!(h.transport.messages.lock().len(), 1);

	assert_eq!(entries_for(&h.store, "security.event.create").await.len(), 2);
	assert_eq!(entries_for(&h.store, "security.alert.sent").await.len(), 1);
	assert_eq!(
		h.metrics
			.events_emitted
			.with_label_values(&["auth_failed_burst_ip_warning", "warning"])
			.get(),
		1.0
	);
	assert_eq!(h.metrics.alerts.with_label_values(&["sent"]).get(), 1.0);
}

#[tokio::test]
async fn login_failures_without_ip_are_not_pooled() {
	let h = harness(config_with_webhook());
	let ctx = RequestContext::new();

	for _ in 0..25 {
		assert!(h.telemetry.on_login_failed(&ctx).await.is_none());
	}

	assert!(h.telemetry.flush_alerts().await.is_empty());
	assert!(h.transport.messages.lock().is_empty());
	assert!(entries_for(&h.store, "security.event.create").await.is_empty());
}

#[tokio::test]
async fn new_network_login_fires_once_per_network() {
	let h = harness(ServerConfig::default());
	h.history
		.record_login("u1", "192.0.2.10", Utc::now() - chrono::Duration::days(2));

	let first = h
		.telemetry
		.on_login_succeeded(&RequestContext::new().actor("u1").ip("10.0.0.5"), "u1", 1)
		.await;
	assert_eq!(first.len(), 1);
	assert_eq!(first[0].event_type, "new_network_login_warning");
	assert_eq!(first[0].data["network"], "10.0.0.0/24");
	assert_eq!(first[0].actor_user_id.as_deref(), Some("u1"));

	let second = h
		.telemetry
		.on_login_succeeded(&RequestContext::new().actor("u1").ip("10.0.0.9"), "u1", 1)
		.await;
	assert!(second.is_empty());

	let known = h
		.telemetry
		.on_login_succeeded(&RequestContext::new().actor("u1").ip("192.0.2.11"), "u1", 8)
		.await;
	assert_eq!(known.len(), 1);
	assert_eq!(known[0].event_type, "excessive_sessions_warning");
	assert_eq!(known[0].data["activeCount"], 8);
}

#[tokio::test]
async fn warning_events_never_reach_transport() {
	let h = harness(config_with_webhook());
	let ctx = RequestContext::new().actor("u7").ip("198.51.100.2");

	let mut raised = Vec::new();
	for _ in 0..5 {
		raised.extend(h.telemetry.on_mfa_failed(&ctx, "u7").await);
	}
	h.telemetry.on_mfa_succeeded(&ctx, "u7");

	assert_eq!(raised.len(), 1);
	assert_eq!(raised[0].event_type, "mfa_failed_burst_user");
	assert!(h.telemetry.flush_alerts().await.is_empty());
	assert!(h.transport.messages.lock().is_empty());
	assert!(!actions(&h.store).await.iter().any(|a| a.starts_with("security.alert")));

	assert_eq!(h.metrics.mfa_outcomes.with_label_values(&["failed"]).get(), 5.0);
	assert_eq!(h.metrics.mfa_outcomes.with_label_values(&["success"]).get(), 1.0);
}

#[tokio::test]
async fn status_lifecycle_is_audited() {
	let h = harness(ServerConfig::default());
	let owner = RequestContext::new().actor("owner-1").ip("203.0.113.8");

	let event = h
		.telemetry
		.on_owner_transferred(&owner, "owner-1", "user-2")
		.await
		.unwrap();
	assert_eq!(event.status, EventStatus::Open);
	assert!(event.is_critical());

	let outcomes = h.telemetry.flush_alerts().await;
	assert_eq!(outcomes[0].status, DeliveryStatus::Skipped);
	assert_eq!(entries_for(&h.store, "security.alert.skipped").await.len(), 1);

	let admin = RequestContext::new().actor("admin-1");
	let updated = h
		.telemetry
		.set_security_event_status(&admin, &event.id, EventStatus::Resolved)
		.await
		.unwrap()
		.unwrap();
	assert_eq!(updated.status, EventStatus::Resolved);
	assert_eq!(updated.data["statusUpdatedBy"], "admin-1");

	let audits = entries_for(&h.store, "security.event.update").await;
	assert_eq!(audits.len(), 1);
	assert_eq!(audits[0].meta["previousStatus"], "open");
	assert_eq!(audits[0].meta["status"], "resolved");

	let before = h.store.load_audit_log().await.unwrap().len();
	assert!(h
		.telemetry
		.set_security_event_status(&admin, "missing", EventStatus::Ack)
		.await
		.unwrap()
		.is_none());
	assert_eq!(h.store.load_audit_log().await.unwrap().len(), before);
}

#[tokio::test]
async fn privilege_change_needs_privileged_field() {
	let h = harness(ServerConfig::default());
	let ctx = RequestContext::new().actor("admin-1");

	assert!(h
		.telemetry
		.on_user_updated(&ctx, "u2", &["displayName".to_string()])
		.await
		.is_none());

	let event = h
		.telemetry
		.on_user_updated(&ctx, "u2", &["role".to_string(), "email".to_string()])
		.await
		.unwrap();
	assert_eq!(event.event_type, "privilege_escalation_warning");
	assert_eq!(event.target_user_id.as_deref(), Some("u2"));
	assert_eq!(event.data["fields"], json!(["role"]));
}

#[tokio::test]
async fn listings_are_filtered_and_audited() {
	let h = harness(ServerConfig::default());
	let admin = RequestContext::new().actor("admin-1");

	h.telemetry
		.on_owner_transferred(&admin, "owner-1", "user-2")
		.await
		.unwrap();
	h.telemetry
		.on_user_updated(&admin, "u3", &["permissions".to_string()])
		.await
		.unwrap();
	h.telemetry.flush_alerts().await;

	let page = h
		.telemetry
		.list_security_events(
			&admin,
			&SecurityEventQuery::default().severity(Severity::Critical),
			None,
			None,
		)
		.await
		.unwrap();
	assert_eq!(page.total, 1);
	assert_eq!(page.items[0].event_type, "owner_transfer_critical");
	assert_eq!(
		entries_for(&h.store, "security.events.read").await[0].meta["total"],
		1
	);

	let listing = h
		.telemetry
		.list_audit_log(
			&admin,
			&AuditQuery::default().action("security.event.create"),
			Some(1),
			Some(10),
			AuditFormat::Json,
		)
		.await
		.unwrap();
	let AuditListing::Page(page) = listing else {
		panic!("expected a JSON page");
	};
	assert_eq!(page.total, 2);

	let listing = h
		.telemetry
		.list_audit_log(&admin, &AuditQuery::default(), None, None, AuditFormat::Csv)
		.await
		.unwrap();
	let AuditListing::Csv(export) = listing else {
		panic!("expected a CSV export");
	};
	assert!(export.rows > 0);
	assert!(!export.truncated);

	let exports = entries_for(&h.store, "audit.export").await;
	assert_eq!(exports[0].meta["format"], "csv");
	assert_eq!(exports[0].meta["rows"], export.rows);
	assert_eq!(entries_for(&h.store, "audit.read").await.len(), 1);
}

#[tokio::test]
async fn append_audit_redacts_secrets() {
	let h = harness(ServerConfig::default());
	let entry = h
		.telemetry
		.append_audit(
			&RequestContext::new().actor("u1"),
			"auth.login.failed",
			"auth",
			json!({"email": "a@example.com", "password": "hunter2", "reason": "bad_password"}),
		)
		.await
		.unwrap();
	assert!(entry.meta.get("password").is_none());
	assert_eq!(entry.meta["email"], "a@example.com");
}

#[tokio::test]
async fn critical_alert_is_signed_over_http() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.and(path("/hook"))
		.respond_with(ResponseTemplate::new(200))
		.expect(1)
		.mount(&server)
		.await;

	let dir = tempfile::tempdir().unwrap();
	let mut config = ServerConfig::default();
	config.storage.data_dir = dir.path().to_path_buf();
	config.alerts.webhook_url = Some(format!("{}/hook", server.uri()));
	config.alerts.signing_secret = Some("alert-secret".to_string());

	let telemetry = SecurityTelemetry::builder(config).build().unwrap();
	let ctx = RequestContext::new().actor("owner-1").request_id("req-42");
	telemetry
		.on_owner_transferred(&ctx, "owner-1", "user-2")
		.await
		.unwrap();

	let outcomes = telemetry.flush_alerts().await;
	assert_eq!(outcomes.len(), 1);
	assert!(outcomes[0].ok);
	assert_eq!(outcomes[0].status_code, Some(200));

	let requests = server.received_requests().await.unwrap();
	let signature = requests[0]
		.headers
		.get(SIGNATURE_HEADER)
		.unwrap()
		.to_str()
		.unwrap();
	assert!(verify_hmac_sha256(b"alert-secret", &requests[0].body, signature));

	let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
	assert!(body["text"]
		.as_str()
		.unwrap()
		.contains("owner_transfer_critical"));

	assert!(dir.path().join(AUDIT_LOG_FILE).exists());
	let sent = telemetry
		.audit_log()
		.query(&AuditQuery::default().action("security.alert.sent"), None, None)
		.await
		.unwrap();
	assert_eq!(sent.total, 1);
	assert_eq!(sent.items[0].actor_id, "owner-1");
	assert_eq!(sent.items[0].request_id.as_deref(), Some("req-42"));
}
