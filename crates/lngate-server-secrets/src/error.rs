// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use lngate_common_core::{Implementation, SecretType};
use lngate_server_db::DbError;

#[derive(Debug, thiserror::Error)]
pub enum SecretsError {
	/// Authentication failed or the payload is not in a known format. The two
	/// cases are deliberately not distinguished.
	#[error("Wrong password")]
	WrongPassword,

	#[error("Invalid scrypt parameters: {0}")]
	InvalidParams(String),

	#[error("Invalid key size: expected {expected}, got {actual}")]
	InvalidKeySize { expected: usize, actual: usize },

	#[error("Encryption failed: {0}")]
	Encryption(String),

	#[error("Password alphabet of {0} symbols does not divide 256")]
	PasswordAlphabet(usize),

	#[error("Store is not configured: access token is missing")]
	NotConfigured,

	#[error("Macaroon root key parameters are missing")]
	MacRootKeyMissing,

	#[error("Missing {secret_type} for {implementation}, add it by running lngate-secure")]
	MissingSecret {
		implementation: Implementation,
		secret_type: SecretType,
	},

	#[error(transparent)]
	Storage(#[from] DbError),
}

pub type SecretsResult<T> = std::result::Result<T, SecretsError>;
