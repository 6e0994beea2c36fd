// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use prometheus::{CounterVec, Encoder, Opts, Registry, TextEncoder};

/// Counters the telemetry facade reports to.
pub trait MetricsSink: Send + Sync {
	fn event_emitted(&self, event_type: &str, severity: &str);

	/// `outcome` is `success` or `failed`.
	fn mfa_outcome(&self, outcome: &str);

	/// `outcome` is the delivery status: `sent`, `failed` or `skipped`.
	fn alert_dispatched(&self, outcome: &str);
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
	fn event_emitted(&self, _event_type: &str, _severity: &str) {}

	fn mfa_outcome(&self, _outcome: &str) {}

	fn alert_dispatched(&self, _outcome: &str) {}
}

pub struct PrometheusMetrics {
	registry: Registry,

	pub events_emitted: CounterVec,
	pub mfa_outcomes: CounterVec,
	pub alerts: CounterVec,
}

impl PrometheusMetrics {
	pub fn new() -> Result<Self, prometheus::Error> {
		Self::with_registry(Registry::new())
	}

	/// Registers the counters on an existing registry, e.g. the host's.
	pub fn with_registry(registry: Registry) -> Result<Self, prometheus::Error> {
		let events_emitted = CounterVec::new(
			Opts::new(
				"warden_security_events_emitted_total",
				"Security events written by detection rules",
			),
			&["type", "severity"],
		)?;
		registry.register(Box::new(events_emitted.clone()))?;

		let mfa_outcomes = CounterVec::new(
			Opts::new("warden_mfa_outcomes_total", "MFA verification attempts"),
			&["outcome"],
		)?;
		registry.register(Box::new(mfa_outcomes.clone()))?;

		let alerts = CounterVec::new(
			Opts::new(
				"warden_security_alerts_total",
				"Critical event alert deliveries",
			),
			&["outcome"],
		)?;
		registry.register(Box::new(alerts.clone()))?;

		Ok(Self {
			registry,
			events_emitted,
			mfa_outcomes,
			alerts,
		})
	}

	pub fn registry(&self) -> &Registry {
		&self.registry
	}

	/// Text exposition of every registered metric.
	pub fn encode(&self) -> Result<String, prometheus::Error> {
		let encoder = TextEncoder::new();
		let metric_families = self.registry.gather();
		let mut buffer = Vec::new();
		encoder.encode(&metric_families, &mut buffer)?;
		Ok(String::from_utf8_lossy(&buffer).into_owned())
	}
}

impl MetricsSink for PrometheusMetrics {
	fn event_emitted(&self, event_type: &str, severity: &str) {
		self
			.events_emitted
			.with_label_values(&[event_type, severity])
			.inc();
	}

	fn mfa_outcome(&self, outcome: &str) {
		self.mfa_outcomes.with_label_values(&[outcome]).inc();
	}

	fn alert_dispatched(&self, outcome: &str) {
		self.alerts.with_label_values(&[outcome]).inc();
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_counters_are_labelled() {
		let metrics = PrometheusMetrics::new().unwrap();
		metrics.event_emitted("owner_transfer_critical", "critical");
		metrics.event_emitted("owner_transfer_critical", "critical");
		metrics.mfa_outcome("failed");
		metrics.alert_dispatched("skipped");

		assert_eq!(
			metrics
				.events_emitted
				.with_label_values(&["owner_transfer_critical", "critical"])
				.get(),
			2.0
		);
		assert_eq!(metrics.mfa_outcomes.with_label_values(&["failed"]).get(), 1.0);
	}

	#[test]
	fn test_encode_renders_text_exposition() {
		let metrics = PrometheusMetrics::new().unwrap();
		metrics.alert_dispatched("sent");

		let text = metrics.encode().unwrap();
		assert!(text.contains("warden_security_alerts_total{outcome=\"sent\"} 1"));
		assert!(text.contains("# TYPE warden_security_alerts_total counter"));
	}

	#[test]
	fn test_duplicate_registration_is_an_error() {
		let registry = Registry::new();
		PrometheusMetrics::with_registry(registry.clone()).unwrap();
		assert!(PrometheusMetrics::with_registry(registry).is_err());
	}
}
