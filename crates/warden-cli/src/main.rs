// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! `warden`: inspect the audit log, triage security events and test alerting.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use warden_server_security::{init_tracing, RequestContext, SecurityTelemetry};

mod commands;

use commands::{AlertsCommand, AuditCommand, ConfigCommand, EventsCommand};

#[derive(Parser, Debug)]
#[command(name = "warden", about = "Warden security telemetry operator CLI", version)]
struct Args {
	/// Config file, layered over defaults and under `WARDEN_SERVER_*` variables
	#[arg(long, global = true, env = "WARDEN_CONFIG")]
	config: Option<PathBuf>,

	/// Actor id recorded in the audit log for this invocation
	#[arg(long, global = true, env = "WARDEN_ACTOR", default_value = "cli")]
	actor: String,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Query and export the audit log
	#[command(subcommand)]
	Audit(AuditCommand),
	/// List and triage security events
	#[command(subcommand)]
	Events(EventsCommand),
	/// Exercise the alert webhook
	#[command(subcommand)]
	Alerts(AlertsCommand),
	/// Inspect the resolved configuration
	#[command(subcommand)]
	Config(ConfigCommand),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let args = Args::parse();

	dotenvy::dotenv().ok();

	let config = match &args.config {
		Some(path) => warden_server_config::load_config_with_file(path)?,
		None => warden_server_config::load_config()?,
	};
	init_tracing(&config.logging)?;

	if let Command::Config(command) = &args.command {
		return commands::handle_config(command, &config);
	}

	let ctx = RequestContext::new()
		.actor(args.actor.clone())
		.actor_name("warden-cli");
	let telemetry = SecurityTelemetry::builder(config).build()?;

	match args.command {
		Command::Audit(command) => commands::handle_audit(command, &telemetry, &ctx).await,
		Command::Events(command) => commands::handle_events(command, &telemetry, &ctx).await,
		Command::Alerts(command) => commands::handle_alerts(command, &telemetry, &ctx).await,
		Command::Config(_) => Ok(()),
	}
}
