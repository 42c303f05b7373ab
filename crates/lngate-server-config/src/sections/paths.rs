// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Data directory tree.
//!
//! Relative `db_dir`, `macaroons_dir` and `logs_dir` values are resolved
//! against `data_dir`; a leading `~` expands to the home directory.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;

fn default_data_dir() -> Option<PathBuf> {
	dirs::home_dir().map(|home| home.join(".lngate"))
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct PathsConfigLayer {
	pub data_dir: Option<PathBuf>,
	pub db_dir: Option<PathBuf>,
	pub macaroons_dir: Option<PathBuf>,
	pub logs_dir: Option<PathBuf>,
}

impl PathsConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.data_dir.is_some() {
			self.data_dir = other.data_dir;
		}
		if other.db_dir.is_some() {
			self.db_dir = other.db_dir;
		}
		if other.macaroons_dir.is_some() {
			self.macaroons_dir = other.macaroons_dir;
		}
		if other.logs_dir.is_some() {
			self.logs_dir = other.logs_dir;
		}
	}

	pub fn finalize(self) -> Result<PathsConfig, ConfigError> {
		let data_dir = self
			.data_dir
			.map(|p| expand_home(&p))
			.or_else(default_data_dir)
			.ok_or(ConfigError::NoDataDir)?;

		let resolve = |value: Option<PathBuf>, default: &str| -> PathBuf {
			let raw = value.unwrap_or_else(|| PathBuf::from(default));
			resolve_path(&raw, &data_dir)
		};

		Ok(PathsConfig {
			db_dir: resolve(self.db_dir, "db"),
			macaroons_dir: resolve(self.macaroons_dir, "macaroons"),
			logs_dir: resolve(self.logs_dir, "logs"),
			data_dir,
		})
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct PathsConfig {
	pub data_dir: PathBuf,
	pub db_dir: PathBuf,
	pub macaroons_dir: PathBuf,
	pub logs_dir: PathBuf,
}

impl PathsConfig {
	/// Directories that must exist before the store or artifacts are touched.
	pub fn tree(&self) -> [&Path; 4] {
		[
			&self.data_dir,
			&self.db_dir,
			&self.macaroons_dir,
			&self.logs_dir,
		]
	}
}

fn expand_home(path: &Path) -> PathBuf {
	match path.strip_prefix("~") {
		Ok(rest) => match dirs::home_dir() {
			Some(home) => home.join(rest),
			None => path.to_path_buf(),
		},
		Err(_) => path.to_path_buf(),
	}
}

/// Resolve `path` against `base` unless it is already absolute.
fn resolve_path(path: &Path, base: &Path) -> PathBuf {
	let path = expand_home(path);
	if path.is_absolute() {
		path
	} else {
		base.join(path)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_subdirs_default_under_data_dir() {
		let layer = PathsConfigLayer {
			data_dir: Some(PathBuf::from("/srv/lngate")),
			..Default::default()
		};
		let config = layer.finalize().unwrap();
		assert_eq!(config.db_dir, PathBuf::from("/srv/lngate/db"));
		assert_eq!(config.macaroons_dir, PathBuf::from("/srv/lngate/macaroons"));
		assert_eq!(config.logs_dir, PathBuf::from("/srv/lngate/logs"));
	}

	#[test]
	fn test_absolute_subdir_is_kept() {
		let layer = PathsConfigLayer {
			data_dir: Some(PathBuf::from("/srv/lngate")),
			macaroons_dir: Some(PathBuf::from("/tmp/macs")),
			..Default::default()
		};
		let config = layer.finalize().unwrap();
		assert_eq!(config.macaroons_dir, PathBuf::from("/tmp/macs"));
	}

	#[test]
	fn test_relative_subdir_is_resolved() {
		let layer = PathsConfigLayer {
			data_dir: Some(PathBuf::from("/srv/lngate")),
			db_dir: Some(PathBuf::from("state/db")),
			..Default::default()
		};
		let config = layer.finalize().unwrap();
		assert_eq!(config.db_dir, PathBuf::from("/srv/lngate/state/db"));
	}

	#[test]
	fn test_merge_keeps_unset_fields() {
		let mut base = PathsConfigLayer {
			data_dir: Some(PathBuf::from("/a")),
			db_dir: Some(PathBuf::from("db1")),
			..Default::default()
		};
		base.merge(PathsConfigLayer {
			db_dir: Some(PathBuf::from("db2")),
			..Default::default()
		});
		assert_eq!(base.data_dir, Some(PathBuf::from("/a")));
		assert_eq!(base.db_dir, Some(PathBuf::from("db2")));
	}

	#[test]
	fn test_deserialize_partial() {
		let layer: PathsConfigLayer = toml::from_str(r#"macaroons_dir = "/etc/macs""#).unwrap();
		assert_eq!(layer.macaroons_dir, Some(PathBuf::from("/etc/macs")));
		assert!(layer.data_dir.is_none());
	}
}
