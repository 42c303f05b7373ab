// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Collection of the configured backend's credential.

use std::path::Path;

use lngate_common_core::{BackendCapability, Implementation, SecretSource};
use lngate_common_secret::SecretBytes;
use lngate_server_config::BackendConfig;
use lngate_server_secrets::RecoveredSecret;

use crate::error::{Result, SecureError};
use crate::prompt::Prompter;

/// Credential to encrypt and store in this run.
#[derive(Debug)]
pub struct CollectedSecret {
	pub secret: SecretBytes,
	pub active: bool,
}

/// Ask for (or reuse) the credential of the configured backend.
///
/// `None` means nothing is to be stored: the backend takes no secret, the
/// operator kept the stored one, or nothing was supplied.
#[tracing::instrument(skip_all, fields(implementation = %backend.implementation))]
pub async fn collect_secret(
	prompter: &dyn Prompter,
	backend: &BackendConfig,
	stored: Option<RecoveredSecret>,
) -> Result<Option<CollectedSecret>> {
	let implementation = backend.implementation;
	match implementation.secret_source() {
		None => Ok(None),
		Some(SecretSource::Prompt) => prompt_password(prompter, implementation, stored).await,
		Some(SecretSource::File) => {
			file_token(prompter, implementation, backend.lnd_macaroon_path.as_deref(), stored).await
		}
	}
}

async fn prompt_password(
	prompter: &dyn Prompter,
	implementation: Implementation,
	stored: Option<RecoveredSecret>,
) -> Result<Option<CollectedSecret>> {
	if stored.is_some() {
		let question = format!(
			"A password for {implementation} is already stored, do you want to update it? [y/N] "
		);
		if !prompter.confirm(&question, false).await? {
			return Ok(None);
		}
	}
	let password = prompter
		.ask_hidden(&format!("Insert {implementation} password: "))
		.await?;
	if password.is_empty() {
		tracing::warn!("empty password, nothing stored");
		return Ok(None);
	}
	Ok(Some(CollectedSecret {
		secret: SecretBytes::new(password.as_bytes().to_vec()),
		active: true,
	}))
}

async fn file_token(
	prompter: &dyn Prompter,
	implementation: Implementation,
	path: Option<&Path>,
	stored: Option<RecoveredSecret>,
) -> Result<Option<CollectedSecret>> {
	let secret = match (path, stored) {
		(Some(path), _) => {
			prompter.say(&format!(
				"Reading {implementation} macaroon from the provided path..."
			));
			let data = tokio::fs::read(path).await.map_err(|source| SecureError::Io {
				path: path.to_path_buf(),
				source,
			})?;
			SecretBytes::new(data)
		}
		(None, Some(stored)) => {
			prompter.say(&format!("A macaroon for {implementation} is already stored"));
			stored.secret
		}
		(None, None) => {
			prompter.say(&format!(
				"You have not provided a path and there's no macaroon stored for {implementation}, assuming\nusage of {implementation} without macaroon"
			));
			return Ok(None);
		}
	};
	let active = prompter
		.confirm(
			&format!("Connect to {implementation} using its macaroon (warning: insecure without)? [Y/n] "),
			true,
		)
		.await?;
	Ok(Some(CollectedSecret { secret, active }))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::prompt::ScriptedPrompter;

	fn backend(implementation: Implementation, path: Option<&Path>) -> BackendConfig {
		BackendConfig {
			implementation,
			lnd_macaroon_path: path.map(Path::to_path_buf),
		}
	}

	fn stored(data: &[u8], active: bool) -> Option<RecoveredSecret> {
		Some(RecoveredSecret {
			secret: SecretBytes::new(data.to_vec()),
			active,
		})
	}

	#[tokio::test]
	async fn clightning_takes_nothing() {
		let prompter = ScriptedPrompter::default();
		let got = collect_secret(&prompter, &backend(Implementation::Clightning, None), None)
			.await
			.unwrap();
		assert!(got.is_none());
		assert!(prompter.questions().is_empty());
	}

	#[tokio::test]
	async fn eclair_password_is_prompted() {
		let prompter = ScriptedPrompter::new(["eclairpw"]);
		let got = collect_secret(&prompter, &backend(Implementation::Eclair, None), None)
			.await
			.unwrap()
			.unwrap();
		assert_eq!(got.secret.as_slice(), b"eclairpw");
		assert!(got.active);
	}

	#[tokio::test]
	async fn stored_password_kept_by_default() {
		let prompter = ScriptedPrompter::new([""]);
		let got = collect_secret(
			&prompter,
			&backend(Implementation::Electrum, None),
			stored(b"old", true),
		)
		.await
		.unwrap();
		assert!(got.is_none());
		assert_eq!(prompter.questions().len(), 1);
	}

	#[tokio::test]
	async fn lnd_without_anything_runs_unauthenticated() {
		let prompter = ScriptedPrompter::default();
		let got = collect_secret(&prompter, &backend(Implementation::Lnd, None), None)
			.await
			.unwrap();
		assert!(got.is_none());
		assert!(prompter.output().iter().any(|l| l.contains("without macaroon")));
	}

	#[tokio::test]
	async fn lnd_file_can_be_stored_inactive() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("admin.macaroon");
		std::fs::write(&path, b"lnd-mac").unwrap();

		let prompter = ScriptedPrompter::new(["n"]);
		let got = collect_secret(
			&prompter,
			&backend(Implementation::Lnd, Some(&path)),
			stored(b"older", true),
		)
		.await
		.unwrap()
		.unwrap();
		assert_eq!(got.secret.as_slice(), b"lnd-mac");
		assert!(!got.active);
	}

	#[tokio::test]
	async fn lnd_reuses_stored_macaroon() {
		let prompter = ScriptedPrompter::new([""]);
		let got = collect_secret(
			&prompter,
			&backend(Implementation::Lnd, None),
			stored(b"stored-mac", false),
		)
		.await
		.unwrap()
		.unwrap();
		assert_eq!(got.secret.as_slice(), b"stored-mac");
		assert!(got.active);
	}

	#[tokio::test]
	async fn unreadable_lnd_file_is_an_error() {
		let dir = tempfile::tempdir().unwrap();
		let prompter = ScriptedPrompter::default();
		let err = collect_secret(
			&prompter,
			&backend(Implementation::Lnd, Some(&dir.path().join("absent"))),
			None,
		)
		.await
		.unwrap_err();
		assert!(matches!(err, SecureError::Io { .. }));
	}
}
