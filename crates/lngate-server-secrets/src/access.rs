// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Password verification and secret storage on top of a store session.
//!
//! Every stored ciphertext carries its own scrypt parameters, so each record
//! is unlocked with a key derived from the operator password and that
//! record's salt.

use lngate_common_core::{
	BackendCapability, Implementation, SecretPolicy, SecretType, ACCESS_TOKEN,
};
use lngate_common_secret::{SecretBytes, SecretString};
use lngate_server_db::{SaveSecretParams, SecretStore};

use crate::encryption::Crypter;
use crate::error::{SecretsError, SecretsResult};
use crate::kdf::ScryptParams;

/// A backend credential decrypted from the store.
#[derive(Debug, Clone)]
pub struct RecoveredSecret {
	pub secret: SecretBytes,
	pub active: bool,
}

/// Encrypt the access-token constant and store it as the password check.
#[tracing::instrument(skip_all)]
pub async fn save_access_token(
	store: &mut dyn SecretStore,
	password: &SecretString,
	params: &ScryptParams,
) -> SecretsResult<()> {
	let payload = Crypter::from_password(password.as_bytes(), params)?.encrypt(ACCESS_TOKEN)?;
	store.save_access_token(&payload, &params.serialize()).await?;
	tracing::info!("encrypted access token stored");
	Ok(())
}

/// Verify `password` against the stored access token.
///
/// Undecodable parameters, a failed decryption and an unexpected plaintext
/// all surface as [`SecretsError::WrongPassword`].
#[tracing::instrument(skip_all)]
pub async fn check_password(
	store: &mut dyn SecretStore,
	password: &SecretString,
) -> SecretsResult<()> {
	let Some(row) = store.get_access_token().await? else {
		return Err(SecretsError::NotConfigured);
	};
	let params =
		ScryptParams::deserialize(&row.scrypt_params).map_err(|_| SecretsError::WrongPassword)?;
	let plaintext = Crypter::from_password(password.as_bytes(), &params)?.decrypt(&row.data)?;
	if plaintext.as_slice() != ACCESS_TOKEN {
		return Err(SecretsError::WrongPassword);
	}
	tracing::debug!("password verified");
	Ok(())
}

/// Encrypt and upsert a backend credential.
#[tracing::instrument(skip(store, password, params, secret), fields(implementation = %implementation, secret_type = %secret_type))]
pub async fn save_secret(
	store: &mut dyn SecretStore,
	password: &SecretString,
	params: &ScryptParams,
	implementation: Implementation,
	secret_type: SecretType,
	secret: &SecretBytes,
	active: bool,
) -> SecretsResult<()> {
	let payload =
		Crypter::from_password(password.as_bytes(), params)?.encrypt(secret.as_slice())?;
	store
		.save_implementation_secret(SaveSecretParams {
			implementation,
			secret_type,
			active,
			secret: &payload,
			scrypt_params: &params.serialize(),
		})
		.await?;
	tracing::info!(active, "implementation secret stored");
	Ok(())
}

/// Decrypt the stored credential for `(implementation, secret_type)`.
///
/// Returns `None` when no row exists or the row holds no data.
#[tracing::instrument(skip(store, password), fields(implementation = %implementation, secret_type = %secret_type))]
pub async fn recover_secret(
	store: &mut dyn SecretStore,
	password: &SecretString,
	implementation: Implementation,
	secret_type: SecretType,
) -> SecretsResult<Option<RecoveredSecret>> {
	let Some(row) = store
		.get_implementation_secret(implementation, secret_type)
		.await?
	else {
		return Ok(None);
	};
	let (Some(data), Some(params)) = (row.secret, row.scrypt_params) else {
		return Ok(None);
	};
	let params = ScryptParams::deserialize(&params).map_err(|_| SecretsError::WrongPassword)?;
	let secret = Crypter::from_password(password.as_bytes(), &params)?.decrypt(&data)?;
	Ok(Some(RecoveredSecret {
		secret,
		active: row.active,
	}))
}

/// Decrypted credential for API use.
///
/// With `active_only` set, an inactive secret is treated as absent.
pub async fn get_secret(
	store: &mut dyn SecretStore,
	password: &SecretString,
	implementation: Implementation,
	secret_type: SecretType,
	active_only: bool,
) -> SecretsResult<Option<SecretBytes>> {
	let recovered = recover_secret(store, password, implementation, secret_type).await?;
	Ok(recovered
		.filter(|r| r.active || !active_only)
		.map(|r| r.secret))
}

/// Whether the backend has a usable stored secret, per its policy.
///
/// Backends that require a secret fail with
/// [`SecretsError::MissingSecret`] when none is stored.
#[tracing::instrument(skip(store), fields(implementation = %implementation))]
pub async fn detect_impl_secret(
	store: &mut dyn SecretStore,
	implementation: Implementation,
) -> SecretsResult<bool> {
	let policy = implementation.secret_policy();
	let Some(secret_type) = implementation.secret_type() else {
		return Ok(false);
	};
	let missing = SecretsError::MissingSecret {
		implementation,
		secret_type,
	};
	match policy {
		SecretPolicy::NotUsed => Ok(false),
		SecretPolicy::Required => {
			let row = store
				.get_implementation_secret(implementation, secret_type)
				.await?;
			match row {
				Some(row) if row.secret.as_deref().is_some_and(|s| !s.is_empty()) => Ok(true),
				_ => Err(missing),
			}
		}
		SecretPolicy::WhenActive => {
			let row = store
				.get_implementation_secret(implementation, secret_type)
				.await?;
			match row {
				Some(row) if row.active => {
					if row.secret.as_deref().is_some_and(|s| !s.is_empty()) {
						Ok(true)
					} else {
						Err(missing)
					}
				}
				_ => Ok(false),
			}
		}
	}
}

/// Derive a new macaroon root key and store its parameters.
#[tracing::instrument(skip_all)]
pub async fn create_mac_root_key(
	store: &mut dyn SecretStore,
	password: &SecretString,
	params: &ScryptParams,
) -> SecretsResult<SecretBytes> {
	let root_key = params.derive(password.as_bytes())?;
	store.save_mac_root_params(&params.serialize()).await?;
	tracing::info!("macaroon root key parameters stored");
	Ok(root_key)
}

/// Re-derive the macaroon root key from the stored parameters.
#[tracing::instrument(skip_all)]
pub async fn derive_mac_root_key(
	store: &mut dyn SecretStore,
	password: &SecretString,
) -> SecretsResult<SecretBytes> {
	let Some(params) = store.get_mac_root_params().await? else {
		return Err(SecretsError::MacRootKeyMissing);
	};
	ScryptParams::deserialize(&params)?.derive(password.as_bytes())
}
