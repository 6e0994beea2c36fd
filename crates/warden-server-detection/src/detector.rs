// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Evaluates the detection rules against counters, cooldowns and session
//! history.
//!
//! All state lives in the [`Detector`] instance and is local to this
//! process; replicas each keep their own counts.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, instrument, warn};
use warden_server_config::DetectionConfig;

use crate::cooldown::CooldownRegistry;
use crate::counter::SlidingWindowCounter;
use crate::history::SessionHistory;
use crate::network::{network_of, parse_network, NetworkTouchRegistry};
use crate::rules::{Detection, Rule};

/// User record fields whose change counts as a privilege change.
pub const PRIVILEGED_FIELDS: &[&str] = &["permissions", "role", "accessRole", "status"];

pub fn auth_failed_key(ip: &str) -> String {
	format!("auth_failed:ip:{ip}")
}

pub fn mfa_failed_key(user_id: &str) -> String {
	format!("mfa_failed:user:{user_id}")
}

pub struct Detector {
	config: DetectionConfig,
	counter: SlidingWindowCounter,
	cooldown: CooldownRegistry,
	touches: NetworkTouchRegistry,
	history: Arc<dyn SessionHistory>,
}

impl Detector {
	pub fn new(config: DetectionConfig, history: Arc<dyn SessionHistory>) -> Self {
		let counter = SlidingWindowCounter::new(config.cooldown_sweep_threshold);
		let cooldown = CooldownRegistry::new(
			Duration::seconds(secs(config.cooldown_secs)),
			config.cooldown_sweep_threshold,
		);
		let touches =
			NetworkTouchRegistry::new(Duration::days(i64::from(config.network_lookback_days)));
		Self {
			config,
			counter,
			cooldown,
			touches,
			history,
		}
	}

	pub fn config(&self) -> &DetectionConfig {
		&self.config
	}

	pub fn counter(&self) -> &SlidingWindowCounter {
		&self.counter
	}

	pub fn cooldown(&self) -> &CooldownRegistry {
		&self.cooldown
	}

	/// Counts a failed login from `ip`. The critical burst is checked first;
	/// when its threshold holds the warning is not considered.
	#[instrument(skip(self, now))]
	pub fn login_failed(&self, ip: &str, now: DateTime<Utc>) -> Option<Detection> {
		let key = auth_failed_key(ip);
		let critical_window = StdDuration::from_secs(self.config.auth_failed_critical_window_secs);
		let warning_window = StdDuration::from_secs(self.config.auth_failed_warning_window_secs);

		let long_count = self.counter.record_at(&key, critical_window, now);
		if long_count >= self.config.auth_failed_critical_threshold {
			return self
				.gate(Rule::AuthFailedBurstIpCritical, ip, now)
				.then(|| {
					Detection::new(Rule::AuthFailedBurstIpCritical)
						.with("ip", ip)
						.with("count", long_count)
						.with("threshold", self.config.auth_failed_critical_threshold)
						.with("windowSecs", self.config.auth_failed_critical_window_secs)
				});
		}

		let short_count = self.counter.count_at(&key, warning_window, now);
		if short_count >= self.config.auth_failed_warning_threshold
			&& self.gate(Rule::AuthFailedBurstIpWarning, ip, now)
		{
			return Some(
				Detection::new(Rule::AuthFailedBurstIpWarning)
					.with("ip", ip)
					.with("count", short_count)
					.with("threshold", self.config.auth_failed_warning_threshold)
					.with("windowSecs", self.config.auth_failed_warning_window_secs),
			);
		}
		None
	}

	#[instrument(skip(self, now))]
	pub fn mfa_failed(&self, user_id: &str, now: DateTime<Utc>) -> Option<Detection> {
		let window = StdDuration::from_secs(self.config.mfa_failed_window_secs);
		let count = self.counter.record_at(&mfa_failed_key(user_id), window, now);

		(count >= self.config.mfa_failed_threshold
			&& self.gate(Rule::MfaFailedBurstUser, user_id, now))
		.then(|| {
			Detection::new(Rule::MfaFailedBurstUser)
				.actor(user_id)
				.target(user_id)
				.with("count", count)
				.with("threshold", self.config.mfa_failed_threshold)
				.with("windowSecs", self.config.mfa_failed_window_secs)
		})
	}

	/// Login from a /24 the user has not used within the lookback window.
	pub async fn login_from_new_network(
		&self,
		user_id: &str,
		ip: &str,
		now: DateTime<Utc>,
	) -> Option<Detection> {
		self.new_network(Rule::NewNetworkLoginWarning, user_id, ip, now)
			.await
	}

	/// Admin-scoped request from a /24 the user has not used within the
	/// lookback window.
	pub async fn admin_request_from_new_network(
		&self,
		user_id: &str,
		ip: &str,
		now: DateTime<Utc>,
	) -> Option<Detection> {
		self.new_network(Rule::AdminActionFromNewNetworkWarning, user_id, ip, now)
			.await
	}

	#[instrument(skip(self, now), fields(rule = %rule))]
	async fn new_network(
		&self,
		rule: Rule,
		user_id: &str,
		ip: &str,
		now: DateTime<Utc>,
	) -> Option<Detection> {
		let Some(network) = network_of(ip) else {
			debug!("address has no IPv4 network, skipping");
			return None;
		};

		if self.touches.is_touched(rule.key(), user_id, &network, now) {
			return None;
		}

		let known = match self
			.history
			.list_known_networks_for_user(user_id, self.config.network_lookback_days)
			.await
		{
			Ok(known) => known,
			Err(e) => {
				warn!(error = %e, "session history lookup failed");
				return None;
			}
		};

		self.touches.touch(rule.key(), user_id, &network, now);

		let cutoff = now - Duration::days(i64::from(self.config.network_lookback_days));
		let seen = known
			.iter()
			.filter(|k| k.last_seen_at >= cutoff)
			.any(|k| parse_network(&k.network) == Some(network));
		if seen {
			return None;
		}

		let actor_key = format!("{user_id}:{network}");
		self.gate(rule, &actor_key, now).then(|| {
			Detection::new(rule)
				.actor(user_id)
				.with("ip", ip)
				.with("network", network.to_string())
				.with("knownNetworks", known.len())
				.with("lookbackDays", self.config.network_lookback_days)
		})
	}

	/// More active sessions than allowed for one user.
	pub fn active_sessions(
		&self,
		user_id: &str,
		active: usize,
		now: DateTime<Utc>,
	) -> Option<Detection> {
		(active > self.config.max_active_sessions
			&& self.gate(Rule::ExcessiveSessionsWarning, user_id, now))
		.then(|| {
			Detection::new(Rule::ExcessiveSessionsWarning)
				.actor(user_id)
				.with("activeCount", active)
				.with("max", self.config.max_active_sessions)
		})
	}

	/// Fires when any of `changed_fields` is a privileged field.
	pub fn user_updated(
		&self,
		actor_id: &str,
		target_id: &str,
		changed_fields: &[String],
		now: DateTime<Utc>,
	) -> Option<Detection> {
		let privileged: Vec<&str> = changed_fields
			.iter()
			.map(String::as_str)
			.filter(|f| PRIVILEGED_FIELDS.contains(f))
			.collect();
		if privileged.is_empty() {
			return None;
		}

		let actor_key = format!("{actor_id}:{target_id}");
		self.gate(Rule::PrivilegeEscalationWarning, &actor_key, now)
			.then(|| {
				Detection::new(Rule::PrivilegeEscalationWarning)
					.actor(actor_id)
					.target(target_id)
					.with("fields", privileged)
			})
	}

	pub fn owner_transferred(
		&self,
		from_user_id: &str,
		to_user_id: &str,
		now: DateTime<Utc>,
	) -> Option<Detection> {
		let actor_key = format!("{from_user_id}:{to_user_id}");
		self.gate(Rule::OwnerTransferCritical, &actor_key, now)
			.then(|| {
				Detection::new(Rule::OwnerTransferCritical)
					.actor(from_user_id)
					.target(to_user_id)
					.with("fromUserId", from_user_id)
					.with("toUserId", to_user_id)
			})
	}

	fn gate(&self, rule: Rule, actor_key: &str, now: DateTime<Utc>) -> bool {
		let allowed = self.cooldown.should_emit_at(rule.key(), actor_key, now);
		if !allowed {
			debug!(rule = %rule, "detection suppressed by cooldown");
		}
		allowed
	}
}

fn secs(value: u64) -> i64 {
	i64::try_from(value).unwrap_or(i64::MAX)
}
