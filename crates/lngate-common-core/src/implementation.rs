// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Supported Lightning node backends and their secret requirements.
//!
//! Each backend answers the same questions through [`BackendCapability`]; the
//! answers are per-variant policy rather than one unified rule, because lnd
//! treats its macaroon as optional while eclair and electrum cannot run
//! without a password.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Implementation {
	Clightning,
	Eclair,
	Electrum,
	Lnd,
}

/// Kind of credential stored for a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecretType {
	Password,
	Macaroon,
}

/// Where the provisioning workflow obtains a backend credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretSource {
	/// Typed by the operator at a hidden prompt.
	Prompt,
	/// Read from a file path given through configuration or `LND_MAC_PATH`.
	File,
}

/// How a stored secret gates use of the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretPolicy {
	/// The backend never uses a stored secret.
	NotUsed,
	/// A secret must be stored; its absence is a configuration error.
	Required,
	/// A secret is used only if stored and marked active.
	WhenActive,
}

/// Capability interface queried by the provisioning workflow and API layer.
pub trait BackendCapability {
	/// Whether the backend can take a stored secret at all.
	fn requires_secret(&self) -> bool {
		self.secret_policy() != SecretPolicy::NotUsed
	}

	fn secret_type(&self) -> Option<SecretType>;

	fn secret_source(&self) -> Option<SecretSource>;

	fn secret_policy(&self) -> SecretPolicy;
}

impl BackendCapability for Implementation {
	fn secret_type(&self) -> Option<SecretType> {
		match self {
			Implementation::Clightning => None,
			Implementation::Eclair | Implementation::Electrum => Some(SecretType::Password),
			Implementation::Lnd => Some(SecretType::Macaroon),
		}
	}

	fn secret_source(&self) -> Option<SecretSource> {
		match self {
			Implementation::Clightning => None,
			Implementation::Eclair | Implementation::Electrum => Some(SecretSource::Prompt),
			Implementation::Lnd => Some(SecretSource::File),
		}
	}

	fn secret_policy(&self) -> SecretPolicy {
		match self {
			Implementation::Clightning => SecretPolicy::NotUsed,
			Implementation::Eclair | Implementation::Electrum => SecretPolicy::Required,
			Implementation::Lnd => SecretPolicy::WhenActive,
		}
	}
}

impl Implementation {
	pub const ALL: [Implementation; 4] = [
		Implementation::Clightning,
		Implementation::Eclair,
		Implementation::Electrum,
		Implementation::Lnd,
	];

	pub fn as_str(&self) -> &'static str {
		match self {
			Implementation::Clightning => "clightning",
			Implementation::Eclair => "eclair",
			Implementation::Electrum => "electrum",
			Implementation::Lnd => "lnd",
		}
	}
}

impl SecretType {
	pub fn as_str(&self) -> &'static str {
		match self {
			SecretType::Password => "password",
			SecretType::Macaroon => "macaroon",
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported implementation: {0}")]
pub struct ParseImplementationError(pub String);

impl FromStr for Implementation {
	type Err = ParseImplementationError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let lowered = s.trim().to_ascii_lowercase();
		Implementation::ALL
			.into_iter()
			.find(|i| i.as_str() == lowered)
			.ok_or_else(|| ParseImplementationError(s.to_string()))
	}
}

impl FromStr for SecretType {
	type Err = ParseImplementationError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"password" => Ok(SecretType::Password),
			"macaroon" => Ok(SecretType::Macaroon),
			other => Err(ParseImplementationError(other.to_string())),
		}
	}
}

impl fmt::Display for Implementation {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl fmt::Display for SecretType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
