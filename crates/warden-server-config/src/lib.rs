// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Centralized configuration management for the Warden security telemetry core.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML file, environment)
//! - Type-safe configuration with validation
//! - Consistent environment variable naming (`WARDEN_SERVER_*`)
//!
//! # Usage
//!
//! ```ignore
//! use warden_server_config::load_config;
//!
//! let config = load_config()?;
//! println!("audit retention: {} days", config.audit.retention_days);
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::ServerConfigLayer;
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use serde::Serialize;
use tracing::{debug, info};

/// Fully resolved server configuration.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ServerConfig {
	pub logging: LoggingConfig,
	pub storage: StorageConfig,
	pub audit: AuditConfig,
	pub security_events: SecurityEventsConfig,
	pub detection: DetectionConfig,
	pub alerts: AlertsConfig,
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`WARDEN_SERVER_*`)
/// 2. Config file (`/etc/warden/server.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	])
}

/// Load configuration from environment only (for testing or simple deployments).
pub fn load_config_from_env() -> Result<ServerConfig, ConfigError> {
	let mut merged = ServerConfigLayer::default();
	merged.merge(EnvSource.load()?);
	finalize(merged)
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	])
}

fn load_from_sources(mut sources: Vec<Box<dyn ConfigSource>>) -> Result<ServerConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = ServerConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	finalize(merged)
}

/// Finalize configuration layer into resolved config.
pub fn finalize(layer: ServerConfigLayer) -> Result<ServerConfig, ConfigError> {
	let config = ServerConfig {
		logging: layer.logging.unwrap_or_default().finalize(),
		storage: layer.storage.unwrap_or_default().finalize(),
		audit: layer.audit.unwrap_or_default().finalize(),
		security_events: layer.security_events.unwrap_or_default().finalize(),
		detection: layer.detection.unwrap_or_default().finalize(),
		alerts: layer.alerts.unwrap_or_default().finalize(),
	};

	validate_config(&config)?;

	info!(
		data_dir = %config.storage.data_dir.display(),
		audit_retention_days = config.audit.retention_days,
		audit_max_entries = config.audit.max_entries,
		max_security_events = config.security_events.max_events,
		cooldown_secs = config.detection.cooldown_secs,
		alerts_provider = %config.alerts.provider,
		alerts_configured = config.alerts.is_configured(),
		alerts_signed = config.alerts.signing_secret.is_some(),
		"Server configuration loaded"
	);

	Ok(config)
}

/// Validate cross-field configuration rules.
fn validate_config(config: &ServerConfig) -> Result<(), ConfigError> {
	if config.audit.max_entries == 0 {
		return Err(ConfigError::Validation(
			"audit.max_entries must be greater than 0".to_string(),
		));
	}
	if config.audit.retention_days <= 0 {
		return Err(ConfigError::Validation(
			"audit.retention_days must be greater than 0".to_string(),
		));
	}
	if config.security_events.max_events == 0 {
		return Err(ConfigError::Validation(
			"security_events.max_events must be greater than 0".to_string(),
		));
	}
	config
		.detection
		.validate()
		.map_err(ConfigError::Validation)?;
	config.alerts.validate().map_err(ConfigError::Validation)?;

	if config.detection.auth_failed_critical_threshold
		< config.detection.auth_failed_warning_threshold
	{
		return Err(ConfigError::Validation(
			"detection.auth_failed_critical_threshold must not be below the warning threshold"
				.to_string(),
		));
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_finalize_defaults() {
		let config = finalize(ServerConfigLayer::default()).unwrap();
		assert_eq!(config.audit.max_entries, 20_000);
		assert_eq!(config.security_events.max_events, 20_000);
		assert_eq!(config.detection.cooldown_secs, 600);
		assert!(!config.alerts.is_configured());
	}

	#[test]
	fn test_zero_retention_rejected() {
		let layer = ServerConfigLayer {
			audit: Some(AuditConfigLayer {
				retention_days: Some(0),
				..Default::default()
			}),
			..Default::default()
		};
		let err = finalize(layer).unwrap_err();
		assert!(err.to_string().contains("retention_days"));
	}

	#[test]
	fn test_bad_webhook_scheme_rejected() {
		let layer = ServerConfigLayer {
			alerts: Some(AlertsConfigLayer {
				webhook_url: Some("javascript:alert(1)".to_string()),
				..Default::default()
			}),
			..Default::default()
		};
		assert!(matches!(finalize(layer), Err(ConfigError::Validation(_))));
	}

	#[test]
	fn test_critical_below_warning_rejected() {
		let layer = ServerConfigLayer {
			detection: Some(DetectionConfigLayer {
				auth_failed_warning_threshold: Some(10),
				auth_failed_critical_threshold: Some(5),
				..Default::default()
			}),
			..Default::default()
		};
		assert!(finalize(layer).is_err());
	}

	#[test]
	fn test_load_with_file_applies_toml() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("server.toml");
		std::fs::write(
			&path,
			r#"
[audit]
retention_days = 90

[alerts]
provider = "generic"
webhook_url = "https://alerts.example.com/hook"
timeout_ms = 60000
"#,
		)
		.unwrap();

		let config = load_config_with_file(&path).unwrap();
		assert_eq!(config.audit.retention_days, 90);
		assert_eq!(
			config.alerts.provider,
			warden_common_webhook::WebhookProvider::Generic
		);
		assert_eq!(config.alerts.timeout_ms, 30_000);
		assert!(config.alerts.is_configured());
	}
}
