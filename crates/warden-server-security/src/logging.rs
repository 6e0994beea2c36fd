// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};
use warden_server_config::LoggingConfig;

use crate::error::{TelemetryError, TelemetryResult};

/// Installs the global subscriber, writing to stderr.
///
/// `RUST_LOG` wins over `config.level` when set.
pub fn init_tracing(config: &LoggingConfig) -> TelemetryResult<()> {
	let filter = EnvFilter::try_from_default_env()
		.or_else(|_| EnvFilter::try_new(&config.level))
		.map_err(|e| TelemetryError::Tracing(e.to_string()))?;

	let registry = tracing_subscriber::registry().with(filter);
	let result = if config.json {
		registry
			.with(fmt::layer().json().with_writer(std::io::stderr))
			.try_init()
	} else {
		registry
			.with(fmt::layer().with_writer(std::io::stderr))
			.try_init()
	};

	result.map_err(|e| TelemetryError::Tracing(e.to_string()))
}
