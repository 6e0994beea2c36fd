// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: environment variables and TOML files.

use std::path::PathBuf;
use std::str::FromStr;

use tracing::{debug, trace};
use warden_common_webhook::WebhookProvider;

use crate::error::ConfigError;
use crate::layer::ServerConfigLayer;
use crate::sections::{
	AlertsConfigLayer, AuditConfigLayer, DetectionConfigLayer, LoggingConfigLayer,
	SecurityEventsConfigLayer, StorageConfigLayer,
};

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

/// Trait for configuration sources.
pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<ServerConfigLayer, ConfigError>;
}

/// Built-in defaults source.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(ServerConfigLayer::default())
	}
}

/// TOML file configuration source.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new("/etc/warden/server.toml")
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(ServerConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: ServerConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: WARDEN_SERVER_<SECTION>_<FIELD>
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		debug!("loading environment variables");
		Ok(ServerConfigLayer {
			logging: Some(load_logging_from_env()),
			storage: Some(load_storage_from_env()),
			audit: Some(load_audit_from_env()?),
			security_events: Some(load_security_events_from_env()?),
			detection: Some(load_detection_from_env()?),
			alerts: Some(load_alerts_from_env()?),
		})
	}
}

fn env_var(name: &str) -> Option<String> {
	std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_bool(name: &str) -> Option<bool> {
	env_var(name).map(|v| v.eq_ignore_ascii_case("true") || v == "1")
}

fn env_parse<T: FromStr>(name: &str, kind: &str) -> Result<Option<T>, ConfigError> {
	match env_var(name) {
		Some(v) => v.parse().map(Some).map_err(|_| ConfigError::InvalidValue {
			key: name.to_string(),
			message: format!("invalid {kind} value '{v}'"),
		}),
		None => Ok(None),
	}
}

fn env_u32(name: &str) -> Result<Option<u32>, ConfigError> {
	env_parse(name, "u32")
}

fn env_u64(name: &str) -> Result<Option<u64>, ConfigError> {
	env_parse(name, "u64")
}

fn env_i64(name: &str) -> Result<Option<i64>, ConfigError> {
	env_parse(name, "i64")
}

fn env_usize(name: &str) -> Result<Option<usize>, ConfigError> {
	env_parse(name, "usize")
}

fn env_list(name: &str) -> Option<Vec<String>> {
	env_var(name).map(|s| {
		s.split(',')
			.map(|s| s.trim().to_string())
			.filter(|s| !s.is_empty())
			.collect()
	})
}

fn load_logging_from_env() -> LoggingConfigLayer {
	LoggingConfigLayer {
		level: env_var("WARDEN_SERVER_LOG_LEVEL"),
		json: env_bool("WARDEN_SERVER_LOG_JSON"),
	}
}

fn load_storage_from_env() -> StorageConfigLayer {
	StorageConfigLayer {
		data_dir: env_var("WARDEN_SERVER_DATA_DIR").map(PathBuf::from),
	}
}

fn load_audit_from_env() -> Result<AuditConfigLayer, ConfigError> {
	Ok(AuditConfigLayer {
		max_entries: env_usize("WARDEN_SERVER_AUDIT_MAX_ENTRIES")?,
		retention_days: env_i64("WARDEN_SERVER_AUDIT_RETENTION_DAYS")?,
		export_max_rows: env_usize("WARDEN_SERVER_AUDIT_EXPORT_MAX_ROWS")?,
		always_enabled_actions: env_list("WARDEN_SERVER_AUDIT_ALWAYS_ENABLED_ACTIONS"),
	})
}

fn load_security_events_from_env() -> Result<SecurityEventsConfigLayer, ConfigError> {
	Ok(SecurityEventsConfigLayer {
		max_events: env_usize("WARDEN_SERVER_SECURITY_EVENTS_MAX_EVENTS")?,
	})
}

fn load_detection_from_env() -> Result<DetectionConfigLayer, ConfigError> {
	Ok(DetectionConfigLayer {
		cooldown_secs: env_u64("WARDEN_SERVER_DETECTION_COOLDOWN_SECS")?,
		cooldown_sweep_threshold: env_usize("WARDEN_SERVER_DETECTION_COOLDOWN_SWEEP_THRESHOLD")?,
		auth_failed_warning_threshold: env_usize(
			"WARDEN_SERVER_DETECTION_AUTH_FAILED_WARNING_THRESHOLD",
		)?,
		auth_failed_warning_window_secs: env_u64(
			"WARDEN_SERVER_DETECTION_AUTH_FAILED_WARNING_WINDOW_SECS",
		)?,
		auth_failed_critical_threshold: env_usize(
			"WARDEN_SERVER_DETECTION_AUTH_FAILED_CRITICAL_THRESHOLD",
		)?,
		auth_failed_critical_window_secs: env_u64(
			"WARDEN_SERVER_DETECTION_AUTH_FAILED_CRITICAL_WINDOW_SECS",
		)?,
		mfa_failed_threshold: env_usize("WARDEN_SERVER_DETECTION_MFA_FAILED_THRESHOLD")?,
		mfa_failed_window_secs: env_u64("WARDEN_SERVER_DETECTION_MFA_FAILED_WINDOW_SECS")?,
		max_active_sessions: env_usize("WARDEN_SERVER_DETECTION_MAX_ACTIVE_SESSIONS")?,
		network_lookback_days: env_u32("WARDEN_SERVER_DETECTION_NETWORK_LOOKBACK_DAYS")?,
	})
}

fn load_alerts_from_env() -> Result<AlertsConfigLayer, ConfigError> {
	let provider = match env_var("WARDEN_SERVER_ALERTS_PROVIDER") {
		Some(v) => Some(WebhookProvider::from_str(&v).map_err(|e| {
			ConfigError::InvalidValue {
				key: "WARDEN_SERVER_ALERTS_PROVIDER".to_string(),
				message: e.to_string(),
			}
		})?),
		None => None,
	};

	Ok(AlertsConfigLayer {
		enabled: env_bool("WARDEN_SERVER_ALERTS_ENABLED"),
		provider,
		webhook_url: env_var("WARDEN_SERVER_ALERTS_WEBHOOK_URL"),
		timeout_ms: env_u64("WARDEN_SERVER_ALERTS_TIMEOUT_MS")?,
		retries: env_u32("WARDEN_SERVER_ALERTS_RETRIES")?,
		dashboard_url: env_var("WARDEN_SERVER_ALERTS_DASHBOARD_URL"),
		signing_secret: env_var("WARDEN_SERVER_ALERTS_SIGNING_SECRET"),
	})
}
