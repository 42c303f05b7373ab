// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Database configuration.

use serde::Deserialize;

const DEFAULT_NAME: &str = "lngate.db";

/// Database configuration (runtime, fully resolved).
#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseConfig {
	/// File name of the SQLite database inside `paths.db_dir`.
	pub name: String,
}

impl Default for DatabaseConfig {
	fn default() -> Self {
		Self {
			name: DEFAULT_NAME.to_string(),
		}
	}
}

/// Database configuration layer (partial, for merging).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseConfigLayer {
	#[serde(default)]
	pub name: Option<String>,
}

impl DatabaseConfigLayer {
	pub fn merge(&mut self, other: DatabaseConfigLayer) {
		if other.name.is_some() {
			self.name = other.name;
		}
	}

	pub fn finalize(self) -> DatabaseConfig {
		DatabaseConfig {
			name: self.name.unwrap_or_else(|| DEFAULT_NAME.to_string()),
		}
	}
}
