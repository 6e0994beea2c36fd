// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! /24 network identity and the per-process record of networks already seen.

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};

use chrono::{DateTime, Duration, Utc};
use ipnet::Ipv4Net;
use parking_lot::Mutex;

const NETWORK_PREFIX: u8 = 24;
const TOUCH_SWEEP_THRESHOLD: usize = 5000;

/// The /24 containing `ip`, e.g. `10.0.0.0/24` for `10.0.0.5`.
///
/// IPv4-mapped IPv6 addresses are unwrapped; other IPv6 addresses and
/// unparsable input have no network.
pub fn network_of(ip: &str) -> Option<Ipv4Net> {
	let addr = match ip.trim().parse::<IpAddr>().ok()? {
		IpAddr::V4(v4) => v4,
		IpAddr::V6(v6) => v6.to_ipv4_mapped()?,
	};
	network_of_v4(addr)
}

fn network_of_v4(addr: Ipv4Addr) -> Option<Ipv4Net> {
	Ipv4Net::new(addr, NETWORK_PREFIX).ok().map(|net| net.trunc())
}

/// Normalizes a stored network, accepting `a.b.c.d/n` or a bare address.
pub fn parse_network(raw: &str) -> Option<Ipv4Net> {
	match raw.trim().parse::<Ipv4Net>() {
		Ok(net) => network_of_v4(net.addr()),
		Err(_) => network_of(raw),
	}
}

/// Remembers (rule, user, network) triples already evaluated as new, so a
/// second request from the same /24 does not fire before session history
/// catches up. Entries expire after the lookback window.
#[derive(Debug)]
pub struct NetworkTouchRegistry {
	touched: Mutex<HashMap<String, DateTime<Utc>>>,
	ttl: Duration,
}

impl NetworkTouchRegistry {
	pub fn new(ttl: Duration) -> Self {
		Self {
			touched: Mutex::new(HashMap::new()),
			ttl,
		}
	}

	pub fn is_touched(
		&self,
		rule_key: &str,
		user_id: &str,
		network: &Ipv4Net,
		now: DateTime<Utc>,
	) -> bool {
		let key = touch_key(rule_key, user_id, network);
		self.touched
			.lock()
			.get(&key)
			.is_some_and(|at| now - *at < self.ttl)
	}

	pub fn touch(&self, rule_key: &str, user_id: &str, network: &Ipv4Net, now: DateTime<Utc>) {
		let key = touch_key(rule_key, user_id, network);
		let mut touched = self.touched.lock();
		touched.insert(key, now);
		if touched.len() > TOUCH_SWEEP_THRESHOLD {
			let ttl = self.ttl;
			touched.retain(|_, at| now - *at < ttl);
		}
	}
}

fn touch_key(rule_key: &str, user_id: &str, network: &Ipv4Net) -> String {
	format!("{rule_key}:{user_id}:{network}")
}
