// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;

use crate::error::SecurityEventResult;
use crate::event::SecurityEvent;

/// Storage collaborator for security events.
///
/// Implementations must apply [`crate::trim`] with `max_events` on every
/// upsert.
#[async_trait]
pub trait SecurityEventRepository: Send + Sync {
	async fn load_security_events(&self) -> SecurityEventResult<Vec<SecurityEvent>>;

	async fn upsert_security_event(
		&self,
		event: SecurityEvent,
		max_events: usize,
	) -> SecurityEventResult<SecurityEvent>;
}
