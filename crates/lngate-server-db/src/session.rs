// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Transactional session over the secret store.
//!
//! Every read and write happens inside one [`Session`]. The session owns a
//! transaction on the pool's single connection; [`Session::finish`] commits
//! on success and rolls back on any error. Dropping a session without
//! finishing it (panic, cancellation) rolls back as well, so no partial rows
//! survive an interrupted provisioning run.

use sqlx::sqlite::{SqliteConnection, SqlitePool};
use sqlx::{Sqlite, Transaction};

use crate::error::{DbError, Result};

pub struct Session {
	tx: Transaction<'static, Sqlite>,
}

impl Session {
	#[tracing::instrument(skip(pool))]
	pub async fn begin(pool: &SqlitePool) -> Result<Self> {
		let tx = pool.begin().await?;
		Ok(Self { tx })
	}

	pub(crate) fn conn(&mut self) -> &mut SqliteConnection {
		&mut self.tx
	}

	/// Close the session according to `outcome`.
	///
	/// `Ok` commits; a failed commit is returned as a storage error. `Err`
	/// rolls back and hands the original error back unchanged.
	pub async fn finish<T, E>(self, outcome: std::result::Result<T, E>) -> std::result::Result<T, E>
	where
		E: From<DbError>,
	{
		match outcome {
			Ok(value) => {
				self.tx.commit().await.map_err(DbError::from)?;
				tracing::debug!("session committed");
				Ok(value)
			}
			Err(err) => {
				if let Err(rollback) = self.tx.rollback().await {
					tracing::warn!(error = %rollback, "rollback failed");
				} else {
					tracing::debug!("session rolled back");
				}
				Err(err)
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::create_test_pool;

	async fn token_present(pool: &SqlitePool) -> bool {
		let mut session = Session::begin(pool).await.unwrap();
		let present = session.get_access_token().await.unwrap().is_some();
		session.finish(Ok::<_, DbError>(present)).await.unwrap()
	}

	#[tokio::test]
	async fn ok_outcome_commits() {
		let pool = create_test_pool().await;
		let mut session = Session::begin(&pool).await.unwrap();
		session.save_access_token(b"t", b"p").await.unwrap();
		session.finish(Ok::<_, DbError>(())).await.unwrap();

		assert!(token_present(&pool).await);
	}

	#[tokio::test]
	async fn err_outcome_rolls_back_and_returns_error() {
		let pool = create_test_pool().await;
		let mut session = Session::begin(&pool).await.unwrap();
		session.save_access_token(b"t", b"p").await.unwrap();

		let err = session
			.finish::<(), _>(Err(DbError::Internal("boom".into())))
			.await
			.unwrap_err();
		assert!(matches!(err, DbError::Internal(ref m) if m == "boom"));
		assert!(!token_present(&pool).await);
	}

	#[tokio::test]
	async fn dropped_session_rolls_back() {
		let pool = create_test_pool().await;
		{
			let mut session = Session::begin(&pool).await.unwrap();
			session.save_access_token(b"t", b"p").await.unwrap();
		}
		assert!(!token_present(&pool).await);
	}
}
