// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration for lngate.
//!
//! Sources are merged lowest to highest precedence:
//! 1. Built-in defaults
//! 2. TOML file (`<data_dir>/config.toml` unless a path is given)
//! 3. Environment variables (`LNGATE_<SECTION>_<FIELD>`)
//! 4. Command-line overrides
//!
//! ```ignore
//! let config = lngate_server_config::load_config(LoadOptions::default())?;
//! println!("store at {}", config.db_path().display());
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

use std::path::PathBuf;

pub use error::ConfigError;
pub use layer::ConfigLayer;
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, OverrideSource, Precedence, TomlSource};

use tracing::{debug, info, warn};

/// Fully resolved configuration.
#[derive(Debug, Clone)]
pub struct LngateConfig {
	pub paths: PathsConfig,
	pub database: DatabaseConfig,
	pub security: SecurityConfig,
	pub backend: BackendConfig,
	pub logging: LoggingConfig,
}

impl LngateConfig {
	pub fn db_path(&self) -> PathBuf {
		self.paths.db_dir.join(&self.database.name)
	}

	pub fn macaroons_enabled(&self) -> bool {
		!self.security.disable_macaroons
	}
}

/// Where to look for configuration beyond the defaults.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
	/// Explicit TOML file; defaults to `<data_dir>/config.toml`.
	pub config_file: Option<PathBuf>,
	/// Highest-precedence layer, usually built from CLI flags.
	pub overrides: ConfigLayer,
}

/// Load configuration from all sources with standard precedence.
pub fn load_config(options: LoadOptions) -> Result<LngateConfig, ConfigError> {
	let config_file = match options.config_file {
		Some(path) => path,
		None => locate_config_file(&options.overrides)?,
	};

	let mut sources: Vec<Box<dyn ConfigSource>> = vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_file)),
		Box::new(EnvSource),
		Box::new(OverrideSource(options.overrides)),
	];
	sources.sort_by_key(|s| s.precedence());

	let mut merged = ConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		merged.merge(source.load()?);
	}

	finalize(merged)
}

/// Resolve configuration from a single layer, skipping files and environment.
pub fn load_config_from_layer(layer: ConfigLayer) -> Result<LngateConfig, ConfigError> {
	finalize(layer)
}

/// The data directory decides where the TOML file lives, so it is resolved
/// from the non-file sources first.
fn locate_config_file(overrides: &ConfigLayer) -> Result<PathBuf, ConfigError> {
	let mut early = EnvSource.load()?;
	early.merge(overrides.clone());
	let paths = early.paths.unwrap_or_default().finalize()?;
	Ok(paths.data_dir.join("config.toml"))
}

fn finalize(layer: ConfigLayer) -> Result<LngateConfig, ConfigError> {
	let paths = layer.paths.unwrap_or_default().finalize()?;
	let database = layer.database.unwrap_or_default().finalize();
	let security = layer.security.unwrap_or_default().finalize();
	let backend = layer.backend.unwrap_or_default().finalize()?;
	let logging = layer.logging.unwrap_or_default().finalize();

	if security.disable_macaroons {
		warn!("Disabling macaroons is not safe, do not disable them in production");
	}

	info!(
		data_dir = %paths.data_dir.display(),
		implementation = %backend.implementation,
		entropy_blocking = security.entropy_blocking,
		macaroons = !security.disable_macaroons,
		"configuration loaded"
	);

	Ok(LngateConfig {
		paths,
		database,
		security,
		backend,
		logging,
	})
}
