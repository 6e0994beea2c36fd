// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Storage configuration section.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

fn default_data_dir() -> PathBuf {
	PathBuf::from("./data")
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StorageConfigLayer {
	pub data_dir: Option<PathBuf>,
}

impl StorageConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.data_dir.is_some() {
			self.data_dir = other.data_dir;
		}
	}

	pub fn finalize(self) -> StorageConfig {
		StorageConfig {
			data_dir: self.data_dir.unwrap_or_else(default_data_dir),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageConfig {
	/// Directory holding `audit-log.json` and `security-events.json`.
	pub data_dir: PathBuf,
}

impl Default for StorageConfig {
	fn default() -> Self {
		Self {
			data_dir: default_data_dir(),
		}
	}
}
