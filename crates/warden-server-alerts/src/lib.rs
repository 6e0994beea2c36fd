// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Alert escalation for critical security events.
//!
//! Only `critical` events reach the webhook transport. Delivery runs on a
//! spawned task and its outcome, including "not configured", is always
//! written to the audit log.

mod escalator;
mod render;

pub use escalator::{AlertEscalator, ALERT_RESOURCE, TEST_ALERT_ACTION};
pub use render::{dashboard_link, render_event, test_message};
