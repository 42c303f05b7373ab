// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Singleton access-token row: the encrypted constant used to verify the
//! operator password. Absence means the store was never configured.

use sqlx::Row;

use crate::error::Result;
use crate::session::Session;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessTokenRow {
	pub data: Vec<u8>,
	pub scrypt_params: Vec<u8>,
}

impl Session {
	#[tracing::instrument(skip(self))]
	pub async fn get_access_token(&mut self) -> Result<Option<AccessTokenRow>> {
		let row = sqlx::query("SELECT data, scrypt_params FROM access_token WHERE id = 1")
			.fetch_optional(self.conn())
			.await?;

		Ok(row.map(|r| AccessTokenRow {
			data: r.get("data"),
			scrypt_params: r.get("scrypt_params"),
		}))
	}

	/// Insert or replace the singleton row.
	#[tracing::instrument(skip_all)]
	pub async fn save_access_token(&mut self, data: &[u8], scrypt_params: &[u8]) -> Result<()> {
		sqlx::query("INSERT OR REPLACE INTO access_token (id, data, scrypt_params) VALUES (1, ?, ?)")
			.bind(data)
			.bind(scrypt_params)
			.execute(self.conn())
			.await?;

		tracing::debug!("access token stored");
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use crate::testing::create_test_pool;
	use crate::Session;

	#[tokio::test]
	async fn absent_until_saved() {
		let pool = create_test_pool().await;
		let mut session = Session::begin(&pool).await.unwrap();
		assert!(session.get_access_token().await.unwrap().is_none());
	}

	#[tokio::test]
	async fn save_replaces_singleton() {
		let pool = create_test_pool().await;
		let mut session = Session::begin(&pool).await.unwrap();

		session.save_access_token(b"first", b"params-1").await.unwrap();
		session.save_access_token(b"second", b"params-2").await.unwrap();

		let row = session.get_access_token().await.unwrap().unwrap();
		assert_eq!(row.data, b"second");
		assert_eq!(row.scrypt_params, b"params-2");

		let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM access_token")
			.fetch_one(session.conn())
			.await
			.unwrap();
		assert_eq!(count, 1);
	}
}
