// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration layer for merging from multiple sources.

use serde::Deserialize;

use crate::sections::{
	BackendConfigLayer, DatabaseConfigLayer, LoggingConfigLayer, PathsConfigLayer,
	SecurityConfigLayer,
};

/// lngate configuration layer - all fields are Option for merging.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigLayer {
	#[serde(default)]
	pub paths: Option<PathsConfigLayer>,
	#[serde(default)]
	pub database: Option<DatabaseConfigLayer>,
	#[serde(default)]
	pub security: Option<SecurityConfigLayer>,
	#[serde(default)]
	pub backend: Option<BackendConfigLayer>,
	#[serde(default)]
	pub logging: Option<LoggingConfigLayer>,
}

impl ConfigLayer {
	/// Merge another layer into this one. Other layer takes precedence.
	pub fn merge(&mut self, other: ConfigLayer) {
		merge_option(&mut self.paths, other.paths, PathsConfigLayer::merge);
		merge_option(
			&mut self.database,
			other.database,
			DatabaseConfigLayer::merge,
		);
		merge_option(
			&mut self.security,
			other.security,
			SecurityConfigLayer::merge,
		);
		merge_option(&mut self.backend, other.backend, BackendConfigLayer::merge);
		merge_option(&mut self.logging, other.logging, LoggingConfigLayer::merge);
	}
}

fn merge_option<T, F>(target: &mut Option<T>, source: Option<T>, merge_fn: F)
where
	F: FnOnce(&mut T, T),
{
	match (target.as_mut(), source) {
		(Some(t), Some(s)) => merge_fn(t, s),
		(None, Some(s)) => *target = Some(s),
		_ => {}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_merge_other_overwrites_field_by_field() {
		let mut base = ConfigLayer {
			backend: Some(BackendConfigLayer {
				implementation: Some("eclair".to_string()),
				lnd_macaroon_path: None,
			}),
			..Default::default()
		};
		base.merge(ConfigLayer {
			backend: Some(BackendConfigLayer {
				implementation: Some("lnd".to_string()),
				lnd_macaroon_path: None,
			}),
			security: Some(SecurityConfigLayer {
				entropy_blocking: Some(false),
				..Default::default()
			}),
			..Default::default()
		});

		let backend = base.backend.unwrap();
		assert_eq!(backend.implementation.as_deref(), Some("lnd"));
		assert_eq!(base.security.unwrap().entropy_blocking, Some(false));
	}

	#[test]
	fn test_merge_empty_keeps_base() {
		let mut base = ConfigLayer {
			logging: Some(LoggingConfigLayer {
				level: Some("debug".to_string()),
			}),
			..Default::default()
		};
		base.merge(ConfigLayer::default());
		assert_eq!(base.logging.unwrap().level.as_deref(), Some("debug"));
	}
}
