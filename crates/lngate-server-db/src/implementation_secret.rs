// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Backend credentials keyed by `(implementation, secret_type)`.
//!
//! Rows are created or replaced when a credential is (re)supplied and can be
//! toggled inactive without being deleted; an inactive secret is kept but
//! must not be used to authenticate against the backend.

use lngate_common_core::{Implementation, SecretType};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::error::{DbError, Result};
use crate::session::Session;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImplementationSecretRow {
	pub implementation: Implementation,
	pub secret_type: SecretType,
	pub active: bool,
	pub secret: Option<Vec<u8>>,
	pub scrypt_params: Option<Vec<u8>>,
}

/// Values written by [`Session::save_implementation_secret`].
#[derive(Debug, Clone, Copy)]
pub struct SaveSecretParams<'a> {
	pub implementation: Implementation,
	pub secret_type: SecretType,
	pub active: bool,
	pub secret: &'a [u8],
	pub scrypt_params: &'a [u8],
}

fn row_to_secret(row: SqliteRow) -> Result<ImplementationSecretRow> {
	let implementation: String = row.get("implementation");
	let secret_type: String = row.get("secret_type");
	Ok(ImplementationSecretRow {
		implementation: implementation
			.parse()
			.map_err(|e| DbError::Internal(format!("stored secret row: {e}")))?,
		secret_type: secret_type
			.parse()
			.map_err(|e| DbError::Internal(format!("stored secret row: {e}")))?,
		active: row.get("active"),
		secret: row.get("secret"),
		scrypt_params: row.get("scrypt_params"),
	})
}

impl Session {
	#[tracing::instrument(skip(self), fields(implementation = %implementation, secret_type = %secret_type))]
	pub async fn get_implementation_secret(
		&mut self,
		implementation: Implementation,
		secret_type: SecretType,
	) -> Result<Option<ImplementationSecretRow>> {
		let row = sqlx::query(
			r#"
			SELECT implementation, secret_type, active, secret, scrypt_params
			FROM implementation_secrets
			WHERE implementation = ? AND secret_type = ?
			"#,
		)
		.bind(implementation.as_str())
		.bind(secret_type.as_str())
		.fetch_optional(self.conn())
		.await?;

		row.map(row_to_secret).transpose()
	}

	/// Insert or replace the row for `(implementation, secret_type)`.
	#[tracing::instrument(skip(self, params), fields(implementation = %params.implementation, secret_type = %params.secret_type, active = params.active))]
	pub async fn save_implementation_secret(&mut self, params: SaveSecretParams<'_>) -> Result<()> {
		sqlx::query(
			r#"
			INSERT OR REPLACE INTO implementation_secrets
				(implementation, secret_type, active, secret, scrypt_params)
			VALUES (?, ?, ?, ?, ?)
			"#,
		)
		.bind(params.implementation.as_str())
		.bind(params.secret_type.as_str())
		.bind(params.active)
		.bind(params.secret)
		.bind(params.scrypt_params)
		.execute(self.conn())
		.await?;

		tracing::debug!("implementation secret stored");
		Ok(())
	}

	/// Flip the active flag of an existing secret.
	///
	/// Returns `DbError::NotFound` when no secret is stored for the key.
	#[tracing::instrument(skip(self), fields(implementation = %implementation, secret_type = %secret_type))]
	pub async fn set_implementation_secret_active(
		&mut self,
		implementation: Implementation,
		secret_type: SecretType,
		active: bool,
	) -> Result<()> {
		let result = sqlx::query(
			"UPDATE implementation_secrets SET active = ? WHERE implementation = ? AND secret_type = ?",
		)
		.bind(active)
		.bind(implementation.as_str())
		.bind(secret_type.as_str())
		.execute(self.conn())
		.await?;

		if result.rows_affected() == 0 {
			return Err(DbError::NotFound(format!(
				"{implementation} {secret_type} secret"
			)));
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::create_test_pool;

	fn lnd_params<'a>(secret: &'a [u8], active: bool) -> SaveSecretParams<'a> {
		SaveSecretParams {
			implementation: Implementation::Lnd,
			secret_type: SecretType::Macaroon,
			active,
			secret,
			scrypt_params: b"params",
		}
	}

	#[tokio::test]
	async fn save_and_get_by_composite_key() {
		let pool = create_test_pool().await;
		let mut session = Session::begin(&pool).await.unwrap();

		session
			.save_implementation_secret(lnd_params(b"mac", true))
			.await
			.unwrap();

		let row = session
			.get_implementation_secret(Implementation::Lnd, SecretType::Macaroon)
			.await
			.unwrap()
			.unwrap();
		assert!(row.active);
		assert_eq!(row.secret.as_deref(), Some(&b"mac"[..]));

		let other = session
			.get_implementation_secret(Implementation::Eclair, SecretType::Password)
			.await
			.unwrap();
		assert!(other.is_none());
	}

	#[tokio::test]
	async fn save_replaces_existing_row() {
		let pool = create_test_pool().await;
		let mut session = Session::begin(&pool).await.unwrap();

		session
			.save_implementation_secret(lnd_params(b"old", true))
			.await
			.unwrap();
		session
			.save_implementation_secret(lnd_params(b"new", false))
			.await
			.unwrap();

		let row = session
			.get_implementation_secret(Implementation::Lnd, SecretType::Macaroon)
			.await
			.unwrap()
			.unwrap();
		assert!(!row.active);
		assert_eq!(row.secret.as_deref(), Some(&b"new"[..]));
	}

	#[tokio::test]
	async fn toggle_active_without_deleting() {
		let pool = create_test_pool().await;
		let mut session = Session::begin(&pool).await.unwrap();

		session
			.save_implementation_secret(lnd_params(b"mac", true))
			.await
			.unwrap();
		session
			.set_implementation_secret_active(Implementation::Lnd, SecretType::Macaroon, false)
			.await
			.unwrap();

		let row = session
			.get_implementation_secret(Implementation::Lnd, SecretType::Macaroon)
			.await
			.unwrap()
			.unwrap();
		assert!(!row.active);
		assert_eq!(row.secret.as_deref(), Some(&b"mac"[..]));
	}

	#[tokio::test]
	async fn toggle_missing_secret_is_not_found() {
		let pool = create_test_pool().await;
		let mut session = Session::begin(&pool).await.unwrap();

		let err = session
			.set_implementation_secret_active(Implementation::Eclair, SecretType::Password, true)
			.await
			.unwrap_err();
		assert!(matches!(err, DbError::NotFound(_)));
	}
}
