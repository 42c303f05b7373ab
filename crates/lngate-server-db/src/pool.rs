// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::path::Path;

use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

use crate::error::{DbError, Result};

/// Embedded schema; the applied set is the schema-version marker.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Open the store at `path`.
///
/// With `create` unset a missing file is reported as
/// [`DbError::MissingStore`] instead of silently creating an empty database.
/// The pool holds a single connection: provisioning is strictly one session
/// at a time. Rollback journaling keeps the store to one file on disk.
#[tracing::instrument(skip(path), fields(path = %path.display()))]
pub async fn open_store(path: &Path, create: bool) -> Result<SqlitePool> {
	if !create && !path.exists() {
		return Err(DbError::MissingStore(path.to_path_buf()));
	}

	let options = SqliteConnectOptions::new()
		.filename(path)
		.journal_mode(SqliteJournalMode::Delete)
		.foreign_keys(true)
		.create_if_missing(create);

	let pool = SqlitePoolOptions::new()
		.max_connections(1)
		.connect_with(options)
		.await?;

	tracing::debug!(create, "secret store opened");
	Ok(pool)
}

/// Apply every pending embedded migration.
#[tracing::instrument(skip(pool))]
pub async fn migrate(pool: &SqlitePool) -> Result<()> {
	MIGRATOR.run(pool).await?;
	tracing::info!("store schema at head");
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn missing_store_is_not_created() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("absent.db");

		let err = open_store(&path, false).await.unwrap_err();
		assert!(matches!(err, DbError::MissingStore(_)));
		assert!(!path.exists());
	}

	#[tokio::test]
	async fn create_then_reopen() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("lngate.db");

		let pool = open_store(&path, true).await.unwrap();
		migrate(&pool).await.unwrap();
		pool.close().await;
		assert!(path.exists());

		let pool = open_store(&path, false).await.unwrap();
		let tables: i64 = sqlx::query_scalar(
			"SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'access_token'",
		)
		.fetch_one(&pool)
		.await
		.unwrap();
		assert_eq!(tables, 1);
	}
}
