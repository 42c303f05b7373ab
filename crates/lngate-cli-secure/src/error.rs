// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::path::PathBuf;

use lngate_server_config::ConfigError;
use lngate_server_db::{DbError, HealthIssue};
use lngate_server_macaroons::MacaroonError;
use lngate_server_secrets::SecretsError;

#[derive(Debug, thiserror::Error)]
pub enum SecureError {
	#[error("No random number generator available: {0}")]
	EntropyUnavailable(String),

	#[error("Passwords do not match")]
	PasswordMismatch,

	#[error("Wrong password")]
	WrongPassword,

	#[error("No password given")]
	EmptyPassword,

	#[error("Your database is missing. Create it by running lngate-secure --new")]
	MissingStore(PathBuf),

	#[error("A database already exists at {0}. Use --rm-db to replace it")]
	StoreExists(PathBuf),

	#[error("Detected an incomplete configuration ({0}). Delete the database and run lngate-secure --new")]
	StaleStore(HealthIssue),

	#[error("Keyboard interrupt detected. Exiting...")]
	Interrupted,

	#[error("Storage error: {0}")]
	Storage(DbError),

	#[error("Secret handling failed: {0}")]
	Secrets(SecretsError),

	#[error("Configuration error: {0}")]
	Config(#[from] ConfigError),

	#[error("Macaroon error: {0}")]
	Macaroon(#[from] MacaroonError),

	#[error("Failed to access {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Terminal error: {0}")]
	Terminal(#[source] std::io::Error),

	#[error("Entropy seed exhausted: requested {requested} bytes, {remaining} left")]
	SeedExhausted { requested: usize, remaining: usize },
}

impl SecureError {
	/// Clean aborts exit 0; anything needing operator remediation exits 1.
	pub fn exit_code(&self) -> i32 {
		match self {
			SecureError::WrongPassword
			| SecureError::EmptyPassword
			| SecureError::PasswordMismatch
			| SecureError::Interrupted => 0,
			_ => 1,
		}
	}
}

impl From<DbError> for SecureError {
	fn from(err: DbError) -> Self {
		match err {
			DbError::MissingStore(path) => SecureError::MissingStore(path),
			other => SecureError::Storage(other),
		}
	}
}

impl From<SecretsError> for SecureError {
	fn from(err: SecretsError) -> Self {
		match err {
			SecretsError::WrongPassword => SecureError::WrongPassword,
			SecretsError::Storage(db) => db.into(),
			other => SecureError::Secrets(other),
		}
	}
}

pub type Result<T> = std::result::Result<T, SecureError>;
