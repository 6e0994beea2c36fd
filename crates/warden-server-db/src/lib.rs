// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Storage collaborators backing the audit log and security event store.

pub mod error;
pub mod json_file;
pub mod memory;

pub use error::{DbError, Result};
pub use json_file::{JsonFileStore, AUDIT_LOG_FILE, SECURITY_EVENTS_FILE};
pub use memory::MemoryStore;
