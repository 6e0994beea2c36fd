// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use thiserror::Error;

pub type DetectionResult<T> = Result<T, DetectionError>;

#[derive(Error, Debug)]
pub enum DetectionError {
	#[error("session history lookup failed: {0}")]
	History(String),
}
