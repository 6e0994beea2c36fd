// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use parking_lot::RwLock;
use warden_server_audit::{AuditLogEntry, AuditLogRepository, AuditResult};
use warden_server_security_events::{
	upsert_into, SecurityEvent, SecurityEventRepository, SecurityEventResult,
};

/// In-process store. Contents are lost when the process exits.
#[derive(Default)]
pub struct MemoryStore {
	audit_log: RwLock<Vec<AuditLogEntry>>,
	security_events: RwLock<Vec<SecurityEvent>>,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}
}

#[async_trait]
impl AuditLogRepository for MemoryStore {
	async fn load_audit_log(&self) -> AuditResult<Vec<AuditLogEntry>> {
		Ok(self.audit_log.read().clone())
	}

	async fn write_audit_log(&self, entries: Vec<AuditLogEntry>) -> AuditResult<()> {
		*self.audit_log.write() = entries;
		Ok(())
	}
}

#[async_trait]
impl SecurityEventRepository for MemoryStore {
	async fn load_security_events(&self) -> SecurityEventResult<Vec<SecurityEvent>> {
		Ok(self.security_events.read().clone())
	}

	async fn upsert_security_event(
		&self,
		event: SecurityEvent,
		max_events: usize,
	) -> SecurityEventResult<SecurityEvent> {
		let mut events = self.security_events.write();
		let current = std::mem::take(&mut *events);
		*events = upsert_into(current, event.clone(), max_events);
		Ok(event)
	}
}
