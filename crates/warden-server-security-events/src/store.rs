// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, instrument, warn};
use warden_server_audit::{format_ts, normalize_page};
use warden_server_config::SecurityEventsConfig;

use crate::error::SecurityEventResult;
use crate::event::{EventStatus, SecurityEvent};
use crate::query::{SecurityEventPage, SecurityEventQuery};
use crate::repository::SecurityEventRepository;

/// Capped security event store over a storage collaborator.
pub struct SecurityEventStore {
	repository: Arc<dyn SecurityEventRepository>,
	max_events: usize,
}

impl SecurityEventStore {
	pub fn new(repository: Arc<dyn SecurityEventRepository>) -> Self {
		Self::from_config(repository, &SecurityEventsConfig::default())
	}

	pub fn from_config(
		repository: Arc<dyn SecurityEventRepository>,
		config: &SecurityEventsConfig,
	) -> Self {
		Self {
			repository,
			max_events: config.max_events,
		}
	}

	/// Sanitizes and persists `event`. `None` means the write failed; the
	/// failure has already been logged.
	#[instrument(skip(self, event), fields(event_id = %event.id, event_type = %event.event_type))]
	pub async fn upsert(&self, event: SecurityEvent) -> Option<SecurityEvent> {
		match self
			.repository
			.upsert_security_event(event.sanitized(), self.max_events)
			.await
		{
			Ok(stored) => Some(stored),
			Err(e) => {
				warn!(error = %e, "security event upsert failed");
				None
			}
		}
	}

	pub async fn get(&self, id: &str) -> SecurityEventResult<Option<SecurityEvent>> {
		let events = self.repository.load_security_events().await?;
		Ok(events.into_iter().find(|e| e.id == id))
	}

	pub async fn set_status(
		&self,
		id: &str,
		status: EventStatus,
		actor_id: &str,
	) -> SecurityEventResult<Option<SecurityEvent>> {
		self.set_status_at(id, status, actor_id, Utc::now()).await
	}

	/// Moves event `id` to `status`, stamping who changed it and when.
	/// Unknown ids return `Ok(None)` without writing anything.
	#[instrument(skip(self, now), fields(status = %status))]
	pub async fn set_status_at(
		&self,
		id: &str,
		status: EventStatus,
		actor_id: &str,
		now: DateTime<Utc>,
	) -> SecurityEventResult<Option<SecurityEvent>> {
		let Some(mut event) = self.get(id).await? else {
			debug!("security event not found");
			return Ok(None);
		};

		event.status = status;
		event
			.data
			.insert("statusUpdatedAt".to_string(), Value::String(format_ts(now)));
		event
			.data
			.insert("statusUpdatedBy".to_string(), Value::String(actor_id.to_string()));

		let stored = self
			.repository
			.upsert_security_event(event.sanitized(), self.max_events)
			.await?;
		Ok(Some(stored))
	}

	#[instrument(skip(self, query))]
	pub async fn list(
		&self,
		query: &SecurityEventQuery,
		page: Option<usize>,
		limit: Option<usize>,
	) -> SecurityEventResult<SecurityEventPage> {
		let (page, limit) = normalize_page(page, limit);
		let events = self.repository.load_security_events().await?;
		Ok(SecurityEventPage::from_matches(
			query.apply(&events),
			page,
			limit,
		))
	}
}
