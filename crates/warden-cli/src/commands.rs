// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use anyhow::{bail, Context};
use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};
use serde::Serialize;
use tracing::{info, instrument};
use warden_redact::REDACTED;
use warden_server_audit::AuditStatus;
use warden_server_config::ServerConfig;
use warden_server_security::{
	AuditFormat, AuditListing, AuditQuery, EventStatus, RequestContext, SecurityEventQuery,
	SecurityTelemetry, Severity,
};

#[derive(Debug, Subcommand)]
pub enum AuditCommand {
	/// List entries, newest first
	List(AuditListArgs),
}

#[derive(Debug, Clone, Args)]
pub struct AuditListArgs {
	/// Exact action, or a `prefix.*` pattern
	#[arg(long)]
	pub action: Option<String>,

	#[arg(long)]
	pub resource: Option<String>,

	/// Actor id or display name
	#[arg(long)]
	pub by: Option<String>,

	/// success, failed or denied
	#[arg(long)]
	pub status: Option<AuditStatus>,

	/// RFC 3339 lower bound
	#[arg(long)]
	pub from: Option<DateTime<Utc>>,

	/// RFC 3339 upper bound
	#[arg(long)]
	pub to: Option<DateTime<Utc>>,

	/// Case-insensitive free-text search
	#[arg(long, short)]
	pub query: Option<String>,

	#[arg(long)]
	pub page: Option<usize>,

	#[arg(long)]
	pub limit: Option<usize>,

	/// Print a CSV export instead of a JSON page
	#[arg(long)]
	pub csv: bool,
}

impl AuditListArgs {
	pub fn to_query(&self) -> AuditQuery {
		let mut query = AuditQuery::default().between(self.from, self.to);
		if let Some(action) = &self.action {
			query = query.action(action);
		}
		if let Some(resource) = &self.resource {
			query = query.resource(resource);
		}
		if let Some(actor) = &self.by {
			query = query.actor(actor);
		}
		if let Some(status) = self.status {
			query = query.status(status);
		}
		if let Some(q) = &self.query {
			query = query.text(q);
		}
		query
	}
}

#[derive(Debug, Subcommand)]
pub enum EventsCommand {
	/// List security events, newest first
	List(EventsListArgs),
	/// Move an event to open, ack, resolved or ignored
	SetStatus {
		id: String,
		status: EventStatus,
	},
}

#[derive(Debug, Clone, Args)]
pub struct EventsListArgs {
	/// info, warning or critical
	#[arg(long)]
	pub severity: Option<Severity>,

	#[arg(long)]
	pub status: Option<EventStatus>,

	/// Rule key, e.g. auth_failed_burst_ip_warning
	#[arg(long = "type")]
	pub event_type: Option<String>,

	#[arg(long)]
	pub actor_user: Option<String>,

	#[arg(long)]
	pub target_user: Option<String>,

	#[arg(long)]
	pub ip: Option<String>,

	#[arg(long)]
	pub from: Option<DateTime<Utc>>,

	#[arg(long)]
	pub to: Option<DateTime<Utc>>,

	#[arg(long, short)]
	pub query: Option<String>,

	#[arg(long)]
	pub page: Option<usize>,

	#[arg(long)]
	pub limit: Option<usize>,
}

impl EventsListArgs {
	pub fn to_query(&self) -> SecurityEventQuery {
		let mut query = SecurityEventQuery::default().between(self.from, self.to);
		if let Some(severity) = self.severity {
			query = query.severity(severity);
		}
		if let Some(status) = self.status {
			query = query.status(status);
		}
		if let Some(event_type) = &self.event_type {
			query = query.event_type(event_type);
		}
		if let Some(user) = &self.actor_user {
			query = query.actor_user(user);
		}
		if let Some(user) = &self.target_user {
			query = query.target_user(user);
		}
		if let Some(ip) = &self.ip {
			query = query.ip(ip);
		}
		if let Some(q) = &self.query {
			query = query.text(q);
		}
		query
	}
}

#[derive(Debug, Subcommand)]
pub enum AlertsCommand {
	/// Send a synthetic alert through the configured webhook
	Test,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
	/// Print the resolved configuration as TOML, secrets masked
	Show,
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
	println!("{}", serde_json::to_string_pretty(value)?);
	Ok(())
}

#[instrument(skip_all)]
pub async fn handle_audit(
	command: AuditCommand,
	telemetry: &SecurityTelemetry,
	ctx: &RequestContext,
) -> anyhow::Result<()> {
	match command {
		AuditCommand::List(args) => {
			let format = if args.csv {
				AuditFormat::Csv
			} else {
				AuditFormat::Json
			};
			let listing = telemetry
				.list_audit_log(ctx, &args.to_query(), args.page, args.limit, format)
				.await
				.context("failed to read audit log")?;

			match listing {
				AuditListing::Page(page) => print_json(&page)?,
				AuditListing::Csv(export) => {
					print!("{}", export.csv);
					if export.truncated {
						eprintln!("export truncated at {} rows", export.rows);
					}
				}
			}
			Ok(())
		}
	}
}

#[instrument(skip_all)]
pub async fn handle_events(
	command: EventsCommand,
	telemetry: &SecurityTelemetry,
	ctx: &RequestContext,
) -> anyhow::Result<()> {
	match command {
		EventsCommand::List(args) => {
			let page = telemetry
				.list_security_events(ctx, &args.to_query(), args.page, args.limit)
				.await
				.context("failed to read security events")?;
			print_json(&page)
		}
		EventsCommand::SetStatus { id, status } => {
			let Some(event) = telemetry
				.set_security_event_status(ctx, &id, status)
				.await
				.context("failed to update security event")?
			else {
				bail!("security event {id} not found");
			};
			info!(event_id = %event.id, status = %event.status, "security event updated");
			print_json(&event)
		}
	}
}

#[instrument(skip_all)]
pub async fn handle_alerts(
	command: AlertsCommand,
	telemetry: &SecurityTelemetry,
	ctx: &RequestContext,
) -> anyhow::Result<()> {
	match command {
		AlertsCommand::Test => {
			let outcome = telemetry.send_test_alert(ctx).await;
			print_json(&outcome)?;
			if !outcome.ok {
				bail!(
					"test alert not delivered ({})",
					outcome.code.as_deref().unwrap_or("unknown")
				);
			}
			Ok(())
		}
	}
}

pub fn handle_config(command: &ConfigCommand, config: &ServerConfig) -> anyhow::Result<()> {
	match command {
		ConfigCommand::Show => {
			println!("{}", render_config(config)?);
			Ok(())
		}
	}
}

/// TOML view of `config` with the webhook URL masked. The signing secret is
/// never serialized.
pub fn render_config(config: &ServerConfig) -> anyhow::Result<String> {
	let mut shown = config.clone();
	if shown.alerts.webhook_url.is_some() {
		shown.alerts.webhook_url = Some(REDACTED.to_string());
	}
	Ok(toml::to_string_pretty(&shown)?)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_audit_args_build_query() {
		let args = AuditListArgs {
			action: Some("auth.*".to_string()),
			resource: None,
			by: Some("admin-1".to_string()),
			status: Some(AuditStatus::Failed),
			from: None,
			to: None,
			query: None,
			page: None,
			limit: None,
			csv: false,
		};
		let query = args.to_query();
		assert_eq!(query.action.as_deref(), Some("auth.*"));
		assert_eq!(query.actor.as_deref(), Some("admin-1"));
		assert_eq!(query.status, Some(AuditStatus::Failed));
		assert!(query.resource.is_none());
	}

	#[test]
	fn test_render_config_masks_webhook() {
		let mut config = ServerConfig::default();
		config.alerts.webhook_url = Some("https://hooks.slack.com/services/T/B/X".to_string());
		config.alerts.signing_secret = Some("topsecret".to_string());

		let rendered = render_config(&config).unwrap();
		assert!(!rendered.contains("hooks.slack.com"));
		assert!(!rendered.contains("topsecret"));
		assert!(rendered.contains("[detection]"));
		assert!(rendered.contains("cooldown_secs = 600"));
	}
}
