// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;
use serde_json::Value;
use tracing::{debug, instrument, warn};
use uuid::Uuid;
use warden_server_audit::{AuditLogEntry, AuditLogRepository, AuditResult};
use warden_server_config::StorageConfig;
use warden_server_security_events::{
	upsert_into, SecurityEvent, SecurityEventRepository, SecurityEventResult,
};

use crate::error::{DbError, Result};

pub const AUDIT_LOG_FILE: &str = "audit-log.json";
pub const SECURITY_EVENTS_FILE: &str = "security-events.json";

/// One JSON array document per collection under `data_dir`.
///
/// Writes go to a temporary sibling first and are renamed into place, so a
/// reader never observes a half-written document.
pub struct JsonFileStore {
	data_dir: PathBuf,
	audit_lock: Mutex<()>,
	events_lock: Mutex<()>,
}

impl JsonFileStore {
	pub fn new(data_dir: impl Into<PathBuf>) -> Self {
		Self {
			data_dir: data_dir.into(),
			audit_lock: Mutex::new(()),
			events_lock: Mutex::new(()),
		}
	}

	pub fn from_config(config: &StorageConfig) -> Self {
		Self::new(config.data_dir.clone())
	}

	pub fn data_dir(&self) -> &Path {
		&self.data_dir
	}

	fn path(&self, file: &str) -> PathBuf {
		self.data_dir.join(file)
	}

	async fn read_collection<T: DeserializeOwned>(&self, file: &str) -> Result<Vec<T>> {
		let path = self.path(file);
		match tokio::fs::read(&path).await {
			Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Vec::new()),
			Ok(bytes) => {
				let raw: Vec<Value> = serde_json::from_slice(&bytes)?;
				Ok(decode_records(file, raw))
			}
			Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
			Err(source) => Err(DbError::Io { path, source }),
		}
	}

	#[instrument(skip(self, items), fields(count = items.len()))]
	async fn write_collection<T: Serialize + Sync>(&self, file: &str, items: &[T]) -> Result<()> {
		let bytes = serde_json::to_vec_pretty(items)?;

		tokio::fs::create_dir_all(&self.data_dir)
			.await
			.map_err(|source| DbError::Io {
				path: self.data_dir.clone(),
				source,
			})?;

		let target = self.path(file);
		let tmp = self.path(&format!(".{file}.{}.tmp", Uuid::new_v4()));
		tokio::fs::write(&tmp, &bytes)
			.await
			.map_err(|source| DbError::Io {
				path: tmp.clone(),
				source,
			})?;
		if let Err(source) = tokio::fs::rename(&tmp, &target).await {
			let _ = tokio::fs::remove_file(&tmp).await;
			return Err(DbError::Io {
				path: target,
				source,
			});
		}

		debug!(file, bytes = bytes.len(), "collection written");
		Ok(())
	}
}

/// Decodes each record on its own; malformed records are skipped so one bad
/// row cannot lock the whole collection.
fn decode_records<T: DeserializeOwned>(file: &str, raw: Vec<Value>) -> Vec<T> {
	let total = raw.len();
	let records: Vec<T> = raw
		.into_iter()
		.filter_map(|value| serde_json::from_value(value).ok())
		.collect();
	let skipped = total - records.len();
	if skipped > 0 {
		warn!(file, skipped, "skipped malformed records");
	}
	records
}

#[async_trait]
impl AuditLogRepository for JsonFileStore {
	async fn load_audit_log(&self) -> AuditResult<Vec<AuditLogEntry>> {
		Ok(self.read_collection(AUDIT_LOG_FILE).await?)
	}

	async fn write_audit_log(&self, entries: Vec<AuditLogEntry>) -> AuditResult<()> {
		let _guard = self.audit_lock.lock().await;
		Ok(self.write_collection(AUDIT_LOG_FILE, &entries).await?)
	}
}

#[async_trait]
impl SecurityEventRepository for JsonFileStore {
	async fn load_security_events(&self) -> SecurityEventResult<Vec<SecurityEvent>> {
		Ok(self.read_collection(SECURITY_EVENTS_FILE).await?)
	}

	async fn upsert_security_event(
		&self,
		event: SecurityEvent,
		max_events: usize,
	) -> SecurityEventResult<SecurityEvent> {
		let _guard = self.events_lock.lock().await;
		let events: Vec<SecurityEvent> = self.read_collection(SECURITY_EVENTS_FILE).await?;
		let events = upsert_into(events, event.clone(), max_events);
		self.write_collection(SECURITY_EVENTS_FILE, &events).await?;
		Ok(event)
	}
}
