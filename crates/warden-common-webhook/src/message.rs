// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Provider-agnostic notification and its per-provider JSON rendering.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::WebhookError;

/// Receiver flavour, decides the payload shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WebhookProvider {
	#[default]
	Slack,
	Discord,
	Generic,
}

impl fmt::Display for WebhookProvider {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			WebhookProvider::Slack => "slack",
			WebhookProvider::Discord => "discord",
			WebhookProvider::Generic => "generic",
		};
		write!(f, "{s}")
	}
}

impl FromStr for WebhookProvider {
	type Err = WebhookError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"slack" => Ok(WebhookProvider::Slack),
			"discord" => Ok(WebhookProvider::Discord),
			"generic" | "webhook" => Ok(WebhookProvider::Generic),
			other => Err(WebhookError::UnknownProvider(other.to_string())),
		}
	}
}

/// Visual urgency of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MessageLevel {
	#[default]
	Info,
	Warning,
	Critical,
}

impl MessageLevel {
	fn hex_color(&self) -> &'static str {
		match self {
			MessageLevel::Info => "#439fe0",
			MessageLevel::Warning => "#daa038",
			MessageLevel::Critical => "#d00000",
		}
	}

	fn rgb(&self) -> u32 {
		match self {
			MessageLevel::Info => 0x439fe0,
			MessageLevel::Warning => 0xdaa038,
			MessageLevel::Critical => 0xd00000,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookMessage {
	pub title: String,
	pub description: String,
	pub level: MessageLevel,
	/// Link back to the operator dashboard.
	pub link: Option<String>,
	pub event_id: Option<String>,
}

impl WebhookMessage {
	pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
		Self {
			title: title.into(),
			description: description.into(),
			level: MessageLevel::default(),
			link: None,
			event_id: None,
		}
	}

	pub fn level(mut self, level: MessageLevel) -> Self {
		self.level = level;
		self
	}

	pub fn link(mut self, link: impl Into<String>) -> Self {
		self.link = Some(link.into());
		self
	}

	pub fn event_id(mut self, event_id: impl Into<String>) -> Self {
		self.event_id = Some(event_id.into());
		self
	}

	fn footer(&self) -> Option<String> {
		self.event_id.as_ref().map(|id| format!("event {id}"))
	}

	/// Renders the JSON body expected by `provider`.
	pub fn render(&self, provider: WebhookProvider) -> Value {
		match provider {
			WebhookProvider::Slack => {
				let mut attachment = json!({
					"color": self.level.hex_color(),
					"title": self.title,
					"text": self.description,
				});
				if let Some(link) = &self.link {
					attachment["title_link"] = json!(link);
				}
				if let Some(footer) = self.footer() {
					attachment["footer"] = json!(footer);
				}
				json!({
					"text": self.title,
					"attachments": [attachment],
				})
			}
			WebhookProvider::Discord => {
				let mut embed = json!({
					"title": self.title,
					"description": self.description,
					"color": self.level.rgb(),
				});
				if let Some(link) = &self.link {
					embed["url"] = json!(link);
				}
				if let Some(footer) = self.footer() {
					embed["footer"] = json!({ "text": footer });
				}
				json!({
					"content": self.title,
					"embeds": [embed],
				})
			}
			WebhookProvider::Generic => json!(self),
		}
	}
}
