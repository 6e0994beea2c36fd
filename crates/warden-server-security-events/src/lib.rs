// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Security events: structured anomaly findings with severity, risk score and
//! an operator-controlled triage status.

pub mod error;
pub mod event;
pub mod query;
pub mod repository;
pub mod store;
pub mod trim;

pub use error::{SecurityEventError, SecurityEventResult};
pub use event::{
	EventStatus, SecurityEvent, SecurityEventBuilder, Severity, MAX_RISK_SCORE,
	MAX_USER_AGENT_CHARS,
};
pub use query::{SecurityEventPage, SecurityEventQuery};
pub use repository::SecurityEventRepository;
pub use store::SecurityEventStore;
pub use trim::{trim, upsert_into};
