// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Session history collaborator used by the network rules.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::DetectionResult;
use crate::network::network_of;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnownNetwork {
	/// `a.b.c.0/24`.
	pub network: String,
	pub last_seen_at: DateTime<Utc>,
}

/// Networks a user has logged in from recently.
#[async_trait]
pub trait SessionHistory: Send + Sync {
	async fn list_known_networks_for_user(
		&self,
		user_id: &str,
		lookback_days: u32,
	) -> DetectionResult<Vec<KnownNetwork>>;
}

/// In-process session history, fed by [`MemorySessionHistory::record_login`].
#[derive(Debug, Default)]
pub struct MemorySessionHistory {
	networks: RwLock<HashMap<String, HashMap<String, DateTime<Utc>>>>,
}

impl MemorySessionHistory {
	pub fn new() -> Self {
		Self::default()
	}

	/// Notes a login for `user_id` from `ip`. Addresses without an IPv4
	/// network are ignored.
	pub fn record_login(&self, user_id: &str, ip: &str, at: DateTime<Utc>) {
		let Some(network) = network_of(ip) else {
			return;
		};
		let mut networks = self.networks.write();
		let seen = networks
			.entry(user_id.to_string())
			.or_default()
			.entry(network.to_string())
			.or_insert(at);
		if at > *seen {
			*seen = at;
		}
	}
}

#[async_trait]
impl SessionHistory for MemorySessionHistory {
	async fn list_known_networks_for_user(
		&self,
		user_id: &str,
		lookback_days: u32,
	) -> DetectionResult<Vec<KnownNetwork>> {
		let cutoff = Utc::now() - Duration::days(i64::from(lookback_days));
		let networks = self.networks.read();
		let Some(user_networks) = networks.get(user_id) else {
			return Ok(Vec::new());
		};

		let mut known: Vec<KnownNetwork> = user_networks
			.iter()
			.filter(|(_, last_seen)| **last_seen >= cutoff)
			.map(|(network, last_seen)| KnownNetwork {
				network: network.clone(),
				last_seen_at: *last_seen,
			})
			.collect();
		known.sort_by(|a, b| b.last_seen_at.cmp(&a.last_seen_at));
		Ok(known)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn test_records_network_not_address() {
		let history = MemorySessionHistory::new();
		history.record_login("u1", "10.0.0.5", Utc::now());
		history.record_login("u1", "10.0.0.9", Utc::now());

		let known = history.list_known_networks_for_user("u1", 30).await.unwrap();
		assert_eq!(known.len(), 1);
		assert_eq!(known[0].network, "10.0.0.0/24");
	}

	#[tokio::test]
	async fn test_lookback_excludes_old_logins() {
		let history = MemorySessionHistory::new();
		history.record_login("u1", "10.0.0.5", Utc::now() - Duration::days(45));
		history.record_login("u1", "172.16.1.5", Utc::now() - Duration::days(2));

		let known = history.list_known_networks_for_user("u1", 30).await.unwrap();
		assert_eq!(known.len(), 1);
		assert_eq!(known[0].network, "172.16.1.0/24");
	}

	#[tokio::test]
	async fn test_unknown_user_has_no_networks() {
		let history = MemorySessionHistory::new();
		history.record_login("u1", "not-an-ip", Utc::now());
		assert!(history
			.list_known_networks_for_user("u1", 30)
			.await
			.unwrap()
			.is_empty());
	}
}
