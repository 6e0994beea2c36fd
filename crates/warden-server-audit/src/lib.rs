// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Append-only audit trail with per-action field allowlists, redaction,
//! retention compaction, filtered queries and CSV export.

pub mod allowlist;
pub mod compact;
pub mod context;
pub mod csv;
pub mod entry;
pub mod error;
pub mod policy;
pub mod query;
pub mod repository;
pub mod service;

pub use allowlist::{fields_for, sanitize_meta, ACTION_FIELDS, DEFAULT_FIELDS};
pub use compact::{compact, RetentionPolicy};
pub use context::{RequestContext, ANONYMOUS_ACTOR, SYSTEM_ACTOR_ID, SYSTEM_ACTOR_NAME, UNKNOWN_IP};
pub use csv::{escape_cell, export_csv, CsvExport, CSV_HEADER};
pub use entry::{derive_resource_id, format_ts, parse_ts, AuditLogEntry, AuditStatus};
pub use error::{AuditError, AuditResult};
pub use policy::{EnablementPolicy, ALWAYS_ENABLED_ACTIONS};
pub use query::{normalize_page, AuditPage, AuditQuery, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
pub use repository::AuditLogRepository;
pub use service::AuditLog;

pub use warden_server_config::AuditConfig;
