// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Partial configuration produced by a single source.

use serde::{Deserialize, Serialize};

use crate::sections::{
	AlertsConfigLayer, AuditConfigLayer, DetectionConfigLayer, LoggingConfigLayer,
	SecurityEventsConfigLayer, StorageConfigLayer,
};

/// One source's view of the configuration. Absent sections defer to
/// lower-precedence sources.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfigLayer {
	pub logging: Option<LoggingConfigLayer>,
	pub storage: Option<StorageConfigLayer>,
	pub audit: Option<AuditConfigLayer>,
	pub security_events: Option<SecurityEventsConfigLayer>,
	pub detection: Option<DetectionConfigLayer>,
	pub alerts: Option<AlertsConfigLayer>,
}

impl ServerConfigLayer {
	/// Overlay `other` on top of `self`, field by field.
	pub fn merge(&mut self, other: Self) {
		merge_option(&mut self.logging, other.logging, LoggingConfigLayer::merge);
		merge_option(&mut self.storage, other.storage, StorageConfigLayer::merge);
		merge_option(&mut self.audit, other.audit, AuditConfigLayer::merge);
		merge_option(
			&mut self.security_events,
			other.security_events,
			SecurityEventsConfigLayer::merge,
		);
		merge_option(
			&mut self.detection,
			other.detection,
			DetectionConfigLayer::merge,
		);
		merge_option(&mut self.alerts, other.alerts, AlertsConfigLayer::merge);
	}
}

fn merge_option<T>(base: &mut Option<T>, other: Option<T>, merge: fn(&mut T, T)) {
	match (base.as_mut(), other) {
		(Some(existing), Some(incoming)) => merge(existing, incoming),
		(None, Some(incoming)) => *base = Some(incoming),
		(_, None) => {}
	}
}
