// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Online anomaly detection: sliding window counters, keyed cooldowns,
//! /24 network tracking and the rule set built on them.

pub mod cooldown;
pub mod counter;
pub mod detector;
pub mod error;
pub mod history;
pub mod network;
pub mod rules;

pub use cooldown::CooldownRegistry;
pub use counter::{SlidingWindowCounter, MAX_TIMESTAMPS_PER_KEY};
pub use detector::{auth_failed_key, mfa_failed_key, Detector, PRIVILEGED_FIELDS};
pub use error::{DetectionError, DetectionResult};
pub use history::{KnownNetwork, MemorySessionHistory, SessionHistory};
pub use network::{network_of, parse_network, NetworkTouchRegistry};
pub use rules::{Detection, Rule};
