// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: built-in defaults, a TOML file, environment
//! variables and command-line overrides.

use std::path::PathBuf;

use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::ConfigLayer;
use crate::sections::{
	BackendConfigLayer, DatabaseConfigLayer, LoggingConfigLayer, PathsConfigLayer,
	SecurityConfigLayer,
};

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
	CommandLine = 60,
}

/// Trait for configuration sources.
pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<ConfigLayer, ConfigError>;
}

/// Built-in defaults source.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<ConfigLayer, ConfigError> {
		Ok(ConfigLayer::default())
	}
}

/// TOML file configuration source. A missing file is not an error.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<ConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(ConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: ConfigLayer = toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
			path: self.path.clone(),
			source: e,
		})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: `LNGATE_<SECTION>_<FIELD>`. `LND_MAC_PATH` is also honoured
/// for the lnd macaroon path, with the prefixed variable taking priority.
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<ConfigLayer, ConfigError> {
		Ok(ConfigLayer {
			paths: Some(PathsConfigLayer {
				data_dir: env_path("LNGATE_PATHS_DATA_DIR"),
				db_dir: env_path("LNGATE_PATHS_DB_DIR"),
				macaroons_dir: env_path("LNGATE_PATHS_MACAROONS_DIR"),
				logs_dir: env_path("LNGATE_PATHS_LOGS_DIR"),
			}),
			database: Some(DatabaseConfigLayer {
				name: env_var("LNGATE_DATABASE_NAME"),
			}),
			security: Some(SecurityConfigLayer {
				entropy_blocking: env_bool("LNGATE_SECURITY_ENTROPY_BLOCKING")?,
				entropy_source: env_path("LNGATE_SECURITY_ENTROPY_SOURCE"),
				entropy_avail_path: env_path("LNGATE_SECURITY_ENTROPY_AVAIL_PATH"),
				disable_macaroons: env_bool("LNGATE_SECURITY_DISABLE_MACAROONS")?,
				insecure_connection: env_bool("LNGATE_SECURITY_INSECURE_CONNECTION")?,
			}),
			backend: Some(BackendConfigLayer {
				implementation: env_var("LNGATE_BACKEND_IMPLEMENTATION"),
				lnd_macaroon_path: env_path("LNGATE_BACKEND_LND_MACAROON_PATH")
					.or_else(|| env_path("LND_MAC_PATH")),
			}),
			logging: Some(LoggingConfigLayer {
				level: env_var("LNGATE_LOGGING_LEVEL"),
			}),
		})
	}
}

/// Layer built from command-line flags.
pub struct OverrideSource(pub ConfigLayer);

impl ConfigSource for OverrideSource {
	fn name(&self) -> &'static str {
		"command-line"
	}

	fn precedence(&self) -> Precedence {
		Precedence::CommandLine
	}

	fn load(&self) -> Result<ConfigLayer, ConfigError> {
		Ok(self.0.clone())
	}
}

fn env_var(name: &str) -> Option<String> {
	std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_path(name: &str) -> Option<PathBuf> {
	env_var(name).map(PathBuf::from)
}

fn env_bool(name: &str) -> Result<Option<bool>, ConfigError> {
	match env_var(name) {
		None => Ok(None),
		Some(v) => match v.to_ascii_lowercase().as_str() {
			"1" | "true" | "yes" | "y" => Ok(Some(true)),
			"0" | "false" | "no" | "n" => Ok(Some(false)),
			_ => Err(ConfigError::InvalidValue {
				key: name.to_string(),
				message: format!("expected a boolean, got {v:?}"),
			}),
		},
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;
	use tempfile::NamedTempFile;

	#[test]
	fn test_precedence_order() {
		assert!(Precedence::Defaults < Precedence::ConfigFile);
		assert!(Precedence::ConfigFile < Precedence::Environment);
		assert!(Precedence::Environment < Precedence::CommandLine);
	}

	#[test]
	fn test_missing_toml_is_empty_layer() {
		let layer = TomlSource::new("/nonexistent/lngate/config.toml")
			.load()
			.unwrap();
		assert!(layer.backend.is_none());
	}

	#[test]
	fn test_toml_file_is_parsed() {
		let mut file = NamedTempFile::new().unwrap();
		writeln!(
			file,
			r#"
[backend]
implementation = "eclair"

[security]
entropy_blocking = false
"#
		)
		.unwrap();

		let layer = TomlSource::new(file.path()).load().unwrap();
		assert_eq!(
			layer.backend.unwrap().implementation.as_deref(),
			Some("eclair")
		);
		assert_eq!(layer.security.unwrap().entropy_blocking, Some(false));
	}

	#[test]
	fn test_invalid_toml_is_reported_with_path() {
		let mut file = NamedTempFile::new().unwrap();
		writeln!(file, "[backend\nimplementation = ").unwrap();
		let err = TomlSource::new(file.path()).load().unwrap_err();
		assert!(matches!(err, ConfigError::TomlParse { .. }));
	}

	#[test]
	fn test_env_bool_rejects_garbage() {
		let var = "LNGATE_TEST_ENV_BOOL_GARBAGE_4711";
		std::env::set_var(var, "perhaps");
		assert!(env_bool(var).is_err());
		std::env::set_var(var, "YES");
		assert_eq!(env_bool(var).unwrap(), Some(true));
		std::env::remove_var(var);
		assert_eq!(env_bool(var).unwrap(), None);
	}
}
