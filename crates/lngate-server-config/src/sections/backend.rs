// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Which Lightning node backend lngate fronts.

use std::path::PathBuf;

use lngate_common_core::Implementation;
use serde::Deserialize;

use crate::error::ConfigError;

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct BackendConfigLayer {
	pub implementation: Option<String>,
	pub lnd_macaroon_path: Option<PathBuf>,
}

impl BackendConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.implementation.is_some() {
			self.implementation = other.implementation;
		}
		if other.lnd_macaroon_path.is_some() {
			self.lnd_macaroon_path = other.lnd_macaroon_path;
		}
	}

	pub fn finalize(self) -> Result<BackendConfig, ConfigError> {
		let raw = self
			.implementation
			.ok_or_else(|| ConfigError::Missing("backend.implementation".to_string()))?;
		let implementation =
			raw.parse::<Implementation>()
				.map_err(|e| ConfigError::InvalidValue {
					key: "backend.implementation".to_string(),
					message: e.to_string(),
				})?;
		Ok(BackendConfig {
			implementation,
			lnd_macaroon_path: self.lnd_macaroon_path,
		})
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct BackendConfig {
	pub implementation: Implementation,
	/// File holding the lnd macaroon to store, if one is being supplied.
	pub lnd_macaroon_path: Option<PathBuf>,
}
