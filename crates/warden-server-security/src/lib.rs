// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Security telemetry for Warden hosts.
//!
//! [`SecurityTelemetry`] is the single handle route handlers use: it records
//! audit entries, runs the detection rules from domain observers, stores the
//! resulting security events and escalates critical ones to the configured
//! webhook.

pub mod error;
pub mod logging;
pub mod metrics;
pub mod telemetry;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::init_tracing;
pub use metrics::{MetricsSink, NoopMetrics, PrometheusMetrics};
pub use telemetry::{
	AuditFormat, AuditListing, SecurityTelemetry, SecurityTelemetryBuilder, AUDIT_LOG_RESOURCE,
	SECURITY_EVENT_RESOURCE,
};

pub use warden_server_audit::{AuditQuery, RequestContext};
pub use warden_server_security_events::{EventStatus, SecurityEventQuery, Severity};
