// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections for the Warden security telemetry core.

pub mod alerts;
pub mod audit;
pub mod detection;
pub mod logging;
pub mod security_events;
pub mod storage;

pub use alerts::{AlertsConfig, AlertsConfigLayer};
pub use audit::{AuditConfig, AuditConfigLayer};
pub use detection::{DetectionConfig, DetectionConfigLayer};
pub use logging::{LoggingConfig, LoggingConfigLayer};
pub use security_events::{SecurityEventsConfig, SecurityEventsConfigLayer};
pub use storage::{StorageConfig, StorageConfigLayer};
