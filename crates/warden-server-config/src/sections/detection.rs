// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Detection rule thresholds and cooldowns.

use serde::{Deserialize, Serialize};

const DEFAULT_COOLDOWN_SECS: u64 = 600;
const DEFAULT_COOLDOWN_SWEEP_THRESHOLD: usize = 5000;
const DEFAULT_AUTH_FAILED_WARNING_THRESHOLD: usize = 8;
const DEFAULT_AUTH_FAILED_WARNING_WINDOW_SECS: u64 = 300;
const DEFAULT_AUTH_FAILED_CRITICAL_THRESHOLD: usize = 20;
const DEFAULT_AUTH_FAILED_CRITICAL_WINDOW_SECS: u64 = 900;
const DEFAULT_MFA_FAILED_THRESHOLD: usize = 5;
const DEFAULT_MFA_FAILED_WINDOW_SECS: u64 = 600;
const DEFAULT_MAX_ACTIVE_SESSIONS: usize = 7;
const DEFAULT_NETWORK_LOOKBACK_DAYS: u32 = 30;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DetectionConfigLayer {
	pub cooldown_secs: Option<u64>,
	pub cooldown_sweep_threshold: Option<usize>,
	pub auth_failed_warning_threshold: Option<usize>,
	pub auth_failed_warning_window_secs: Option<u64>,
	pub auth_failed_critical_threshold: Option<usize>,
	pub auth_failed_critical_window_secs: Option<u64>,
	pub mfa_failed_threshold: Option<usize>,
	pub mfa_failed_window_secs: Option<u64>,
	pub max_active_sessions: Option<usize>,
	pub network_lookback_days: Option<u32>,
}

impl DetectionConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.cooldown_secs.is_some() {
			self.cooldown_secs = other.cooldown_secs;
		}
		if other.cooldown_sweep_threshold.is_some() {
			self.cooldown_sweep_threshold = other.cooldown_sweep_threshold;
		}
		if other.auth_failed_warning_threshold.is_some() {
			self.auth_failed_warning_threshold = other.auth_failed_warning_threshold;
		}
		if other.auth_failed_warning_window_secs.is_some() {
			self.auth_failed_warning_window_secs = other.auth_failed_warning_window_secs;
		}
		if other.auth_failed_critical_threshold.is_some() {
			self.auth_failed_critical_threshold = other.auth_failed_critical_threshold;
		}
		if other.auth_failed_critical_window_secs.is_some() {
			self.auth_failed_critical_window_secs = other.auth_failed_critical_window_secs;
		}
		if other.mfa_failed_threshold.is_some() {
			self.mfa_failed_threshold = other.mfa_failed_threshold;
		}
		if other.mfa_failed_window_secs.is_some() {
			self.mfa_failed_window_secs = other.mfa_failed_window_secs;
		}
		if other.max_active_sessions.is_some() {
			self.max_active_sessions = other.max_active_sessions;
		}
		if other.network_lookback_days.is_some() {
			self.network_lookback_days = other.network_lookback_days;
		}
	}

	pub fn finalize(self) -> DetectionConfig {
		DetectionConfig {
			cooldown_secs: self.cooldown_secs.unwrap_or(DEFAULT_COOLDOWN_SECS),
			cooldown_sweep_threshold: self
				.cooldown_sweep_threshold
				.unwrap_or(DEFAULT_COOLDOWN_SWEEP_THRESHOLD),
			auth_failed_warning_threshold: self
				.auth_failed_warning_threshold
				.unwrap_or(DEFAULT_AUTH_FAILED_WARNING_THRESHOLD),
			auth_failed_warning_window_secs: self
				.auth_failed_warning_window_secs
				.unwrap_or(DEFAULT_AUTH_FAILED_WARNING_WINDOW_SECS),
			auth_failed_critical_threshold: self
				.auth_failed_critical_threshold
				.unwrap_or(DEFAULT_AUTH_FAILED_CRITICAL_THRESHOLD),
			auth_failed_critical_window_secs: self
				.auth_failed_critical_window_secs
				.unwrap_or(DEFAULT_AUTH_FAILED_CRITICAL_WINDOW_SECS),
			mfa_failed_threshold: self
				.mfa_failed_threshold
				.unwrap_or(DEFAULT_MFA_FAILED_THRESHOLD),
			mfa_failed_window_secs: self
				.mfa_failed_window_secs
				.unwrap_or(DEFAULT_MFA_FAILED_WINDOW_SECS),
			max_active_sessions: self
				.max_active_sessions
				.unwrap_or(DEFAULT_MAX_ACTIVE_SESSIONS),
			network_lookback_days: self
				.network_lookback_days
				.unwrap_or(DEFAULT_NETWORK_LOOKBACK_DAYS),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetectionConfig {
	pub cooldown_secs: u64,
	pub cooldown_sweep_threshold: usize,
	pub auth_failed_warning_threshold: usize,
	pub auth_failed_warning_window_secs: u64,
	pub auth_failed_critical_threshold: usize,
	pub auth_failed_critical_window_secs: u64,
	pub mfa_failed_threshold: usize,
	pub mfa_failed_window_secs: u64,
	/// Sessions above this count raise `excessive_sessions_warning`.
	pub max_active_sessions: usize,
	pub network_lookback_days: u32,
}

impl Default for DetectionConfig {
	fn default() -> Self {
		DetectionConfigLayer::default().finalize()
	}
}

impl DetectionConfig {
	pub fn validate(&self) -> Result<(), String> {
		let checks = [
			("cooldown_secs", self.cooldown_secs as usize),
			(
				"auth_failed_warning_threshold",
				self.auth_failed_warning_threshold,
			),
			(
				"auth_failed_warning_window_secs",
				self.auth_failed_warning_window_secs as usize,
			),
			(
				"auth_failed_critical_threshold",
				self.auth_failed_critical_threshold,
			),
			(
				"auth_failed_critical_window_secs",
				self.auth_failed_critical_window_secs as usize,
			),
			("mfa_failed_threshold", self.mfa_failed_threshold),
			("mfa_failed_window_secs", self.mfa_failed_window_secs as usize),
			("network_lookback_days", self.network_lookback_days as usize),
		];

		for (name, value) in checks {
			if value == 0 {
				return Err(format!("detection.{name} must be greater than 0"));
			}
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_defaults_match_rule_table() {
		let config = DetectionConfig::default();
		assert_eq!(config.cooldown_secs, 600);
		assert_eq!(config.auth_failed_warning_threshold, 8);
		assert_eq!(config.auth_failed_warning_window_secs, 300);
		assert_eq!(config.auth_failed_critical_threshold, 20);
		assert_eq!(config.auth_failed_critical_window_secs, 900);
		assert_eq!(config.mfa_failed_threshold, 5);
		assert_eq!(config.mfa_failed_window_secs, 600);
		assert_eq!(config.max_active_sessions, 7);
		assert_eq!(config.network_lookback_days, 30);
		assert!(config.validate().is_ok());
	}

	#[test]
	fn test_zero_threshold_rejected() {
		let config = DetectionConfigLayer {
			mfa_failed_threshold: Some(0),
			..Default::default()
		}
		.finalize();
		let err = config.validate().unwrap_err();
		assert!(err.contains("mfa_failed_threshold"));
	}
}
